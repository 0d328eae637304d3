use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_lambda_events::event::s3::S3Event;
use aws_sdk_s3 as s3;
use aws_smithy_http::body::SdkBody;
use uuid::Uuid;

use crate::config::{BucketResolver, MaxDimensions, ParameterStore};
use crate::error::Error;
use crate::image::resize_image;

/// The storage dependency of the pipeline. Injected so tests can run against
/// an in-memory store instead of S3.
#[async_trait]
pub trait ObjectStore {
    async fn download_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), Error>;

    async fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<(), Error>;
}

pub struct S3Store {
    client: s3::Client,
}

impl S3Store {
    pub fn new(client: s3::Client) -> Self {
        S3Store { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn download_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), Error> {
        let download_err = |source: Box<dyn std::error::Error + Send + Sync>| Error::Download {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        };

        let res = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| download_err(err.into()))?;
        let data = res
            .body
            .collect()
            .await
            .map_err(|err| download_err(err.into()))?;

        tokio::fs::write(path, data.into_bytes())
            .await
            .map_err(|err| download_err(err.into()))
    }

    async fn upload_file(&self, path: &Path, bucket: &str, key: &str) -> Result<(), Error> {
        let upload_err = |source: Box<dyn std::error::Error + Send + Sync>| Error::Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        };

        let data = tokio::fs::read(path)
            .await
            .map_err(|err| upload_err(err.into()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(s3::types::ByteStream::new(SdkBody::from(data)))
            .send()
            .await
            .map_err(|err| upload_err(err.into()))?;

        Ok(())
    }
}

/// Scope guard for a transient local file. The file is removed when the
/// guard drops, on the success and failure paths alike, so repeated
/// invocations cannot exhaust the shared /tmp space.
struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    fn new(path: PathBuf) -> Self {
        TempArtifact { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[derive(Debug)]
pub enum ProcessResult {
    /// A thumbnail was produced at `path` and uploaded to the destination.
    Resized {
        path: PathBuf,
        dimensions: (u32, u32),
    },
    /// The object did not decode as a processable image; nothing uploaded.
    Skipped { reason: String },
}

pub struct Pipeline<S> {
    store: S,
    max: MaxDimensions,
}

impl<S: ObjectStore> Pipeline<S> {
    pub fn new(store: S, max: MaxDimensions) -> Self {
        Pipeline { store, max }
    }

    /// Downloads (source_bucket, key), resizes it and uploads the thumbnail
    /// to the destination bucket under the same key. Resize failures are
    /// reported as [`ProcessResult::Skipped`]; download and upload failures
    /// propagate to the caller.
    pub async fn process(
        &self,
        source_bucket: &str,
        key: &str,
        destination_bucket: &str,
    ) -> Result<ProcessResult, Error> {
        // The uuid keeps records of one batch, and concurrent invocations
        // sharing local storage, from colliding on the same path.
        let tmpkey = key.replace('/', "");
        let id = Uuid::new_v4();
        let download = TempArtifact::new(env::temp_dir().join(format!("{id}{tmpkey}")));
        let resized = TempArtifact::new(env::temp_dir().join(format!("resized-{id}{tmpkey}")));

        self.store
            .download_file(source_bucket, key, download.path())
            .await?;

        match resize_image(download.path(), resized.path(), self.max) {
            Ok(dimensions) => {
                self.store
                    .upload_file(resized.path(), destination_bucket, key)
                    .await?;

                Ok(ProcessResult::Resized {
                    path: resized.path().to_owned(),
                    dimensions,
                })
            }
            Err(err) => Ok(ProcessResult::Skipped {
                reason: err.to_string(),
            }),
        }
    }
}

/// Decodes a percent-encoded object key from an S3 notification, where a `+`
/// stands for a space.
pub fn decode_object_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Dispatches every record of one notification event through the pipeline.
/// Failures are contained per record: a bad download or upload is logged and
/// the remaining records still run.
pub async fn process_event<S: ObjectStore>(
    event: S3Event,
    pipeline: &Pipeline<S>,
    destination_bucket: &str,
) {
    for record in event.records {
        let (Some(bucket), Some(key)) = (record.s3.bucket.name, record.s3.object.key) else {
            tracing::warn!("record missing bucket name or object key, skipping");
            continue;
        };
        let key = decode_object_key(&key);

        tracing::info!("processing {bucket}/{key}");

        match pipeline.process(&bucket, &key, destination_bucket).await {
            Ok(ProcessResult::Resized { dimensions, .. }) => {
                tracing::info!(
                    "resized {key} to {}x{}, uploaded to {destination_bucket}/{key}",
                    dimensions.0,
                    dimensions.1
                );
            }
            Ok(ProcessResult::Skipped { reason }) => {
                tracing::info!("skipping non-image file {key}: {reason}");
            }
            Err(err) => {
                tracing::error!("error processing {key}: {err}");
            }
        }
    }
}

/// One full invocation: resolve the destination bucket, then dispatch the
/// batch. The destination is required by every record, so a resolution
/// failure aborts before any record is touched.
pub async fn handle_event<S: ObjectStore, P: ParameterStore>(
    event: S3Event,
    pipeline: &Pipeline<S>,
    resolver: &BucketResolver<P>,
) -> Result<(), Error> {
    let destination_bucket = resolver.destination_bucket().await?;

    process_event(event, pipeline, &destination_bucket).await;

    Ok(())
}
