use crate::services::error::StagingError;
use std::path::Path;

/// Validates file size against maximum limit
pub fn validate_file_size(
    file_name: &str,
    size: usize,
    max_size: usize,
) -> Result<(), StagingError> {
    if size > max_size {
        return Err(StagingError::FileTooLarge {
            file_name: file_name.to_string(),
            size,
            max: max_size,
        });
    }
    Ok(())
}

/// Sniffs the content type from magic bytes, falling back to the extension.
pub fn detect_content_type(file_name: &str, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}

pub fn validate_content_type(
    file_name: &str,
    content_type: &str,
    allowed: &[String],
) -> Result<(), StagingError> {
    if allowed.iter().any(|t| t.eq_ignore_ascii_case(content_type)) {
        return Ok(());
    }
    Err(StagingError::UnsupportedType {
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["image/jpeg".to_string(), "image/png".to_string()]
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size("a.png", 10, 10).is_ok());
        assert_eq!(
            validate_file_size("a.png", 11, 10),
            Err(StagingError::FileTooLarge {
                file_name: "a.png".to_string(),
                size: 11,
                max: 10
            })
        );
    }

    #[test]
    fn test_detect_content_type() {
        // Magic bytes win over the extension
        assert_eq!(
            detect_content_type("photo.txt", &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            "image/png"
        );
        assert_eq!(
            detect_content_type("photo.jpg", &[0xFF, 0xD8, 0xFF, 0xE0]),
            "image/jpeg"
        );
        assert_eq!(detect_content_type("Photo.JPEG", b"??"), "image/jpeg");
        assert_eq!(detect_content_type("notes", b"hello"), "application/octet-stream");
    }

    #[test]
    fn test_validate_content_type() {
        assert!(validate_content_type("a.png", "image/png", &allowed()).is_ok());
        assert!(validate_content_type("a.jpg", "IMAGE/JPEG", &allowed()).is_ok());
        assert!(validate_content_type("a.gif", "image/gif", &allowed()).is_err());
    }
}
