//! Request-scoped services used by the analysis pipeline

pub mod staged_file;
pub mod upload_policy;

pub use staged_file::StagedFile;
pub use upload_policy::UploadPolicy;
