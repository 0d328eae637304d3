use std::path::PathBuf;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Infrastructure failures. `Configuration` aborts the whole invocation;
/// `Download` and `Upload` escape the pipeline and are contained per record
/// at the batch dispatcher.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to resolve parameter {name}: {source}")]
    Configuration { name: String, source: BoxError },

    #[error("failed to download s3://{bucket}/{key}: {source}")]
    Download {
        bucket: String,
        key: String,
        source: BoxError,
    },

    #[error("failed to upload s3://{bucket}/{key}: {source}")]
    Upload {
        bucket: String,
        key: String,
        source: BoxError,
    },
}

/// Failures confined to the resize step. These mark the input as
/// unprocessable rather than the infrastructure as broken, so the pipeline
/// absorbs them into a skip instead of returning an [`Error`].
#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
