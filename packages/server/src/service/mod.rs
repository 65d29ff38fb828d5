mod query;
mod upload;

pub use query::{QueryError, QueryService};
pub use upload::{FilePart, UploadError, UploadRequest, UploadService, UploadStage};
