pub mod http_uploader;

pub use http_uploader::{FILE_FIELD, HttpUploader};
