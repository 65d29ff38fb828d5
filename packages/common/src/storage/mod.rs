mod error;
mod upload_root;

pub use error::{StorageError, ValidationError};
pub use upload_root::{BoxReader, UploadRoot, remove_detached, validate_upload};
