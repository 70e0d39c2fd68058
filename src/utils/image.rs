use crate::models::Dimensions;
use image::ImageResult;
use std::io::Cursor;

/// Reads width and height from the image header without decoding pixels.
pub fn probe_dimensions(data: &[u8]) -> ImageResult<Dimensions> {
    let (width, height) = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(Dimensions { width, height })
}

/// Size in megabytes with two decimals, e.g. `1.50`
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

    // 3x2 RGB PNG
    const PNG_3X2: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAMAAAACCAIAAAASFvFNAAAAC0lEQVR4nGNgwAQAABQAAX3+Hu4AAAAASUVORK5CYII=";

    #[test]
    fn test_probe_dimensions() {
        let data = BASE64.decode(PNG_3X2).unwrap();
        let dims = probe_dimensions(&data).unwrap();
        assert_eq!(dims, Dimensions { width: 3, height: 2 });
    }

    #[test]
    fn test_probe_dimensions_rejects_garbage() {
        assert!(probe_dimensions(b"definitely not an image").is_err());
    }

    #[test]
    fn test_format_size_mb() {
        assert_eq!(format_size_mb(0), "0.00");
        assert_eq!(format_size_mb(1024 * 1024 * 3 / 2), "1.50");
    }
}
