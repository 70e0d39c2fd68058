pub mod archive;
pub mod error;
pub mod image_api;
pub mod pipeline;
pub mod presign;
pub mod process_store;
pub mod reconcile;
pub mod status;
pub mod transform;
pub mod upload;
