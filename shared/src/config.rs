use async_trait::async_trait;
use aws_sdk_s3 as s3;
use aws_sdk_ssm as ssm;
use aws_smithy_http::endpoint::Endpoint;
use http::Uri;
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::Error;

/// SSM parameter holding the name of the bucket resized images are written to.
pub const RESIZED_BUCKET_PARAMETER: &str = "/localstack-thumbnail-app/buckets/resized";

/// LocalStack edge endpoint, used for every AWS call when `STAGE=local`.
const LOCAL_ENDPOINT: &str = "https://localhost.localstack.cloud:4566";

pub async fn aws_sdk_config() -> aws_config::SdkConfig {
    let mut loader = aws_config::from_env();

    if env::var("STAGE").as_deref() == Ok("local") {
        loader = loader.endpoint_resolver(Endpoint::immutable(Uri::from_static(LOCAL_ENDPOINT)));
    }

    loader.load().await
}

pub fn get_s3_client(cfg: &aws_config::SdkConfig) -> s3::Client {
    s3::Client::new(cfg)
}

pub fn get_ssm_client(cfg: &aws_config::SdkConfig) -> ssm::Client {
    ssm::Client::new(cfg)
}

/// Upper bound on thumbnail width and height. Images already within the cap
/// are kept at their natural size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaxDimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for MaxDimensions {
    fn default() -> Self {
        MaxDimensions {
            width: 400,
            height: 400,
        }
    }
}

impl MaxDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        MaxDimensions { width, height }
    }

    /// Defaults overridable per deployment via `THUMBNAIL_MAX_WIDTH` and
    /// `THUMBNAIL_MAX_HEIGHT`.
    pub fn from_env() -> Self {
        let defaults = MaxDimensions::default();
        let parse = |var: &str, fallback: u32| {
            env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(fallback)
        };

        MaxDimensions {
            width: parse("THUMBNAIL_MAX_WIDTH", defaults.width),
            height: parse("THUMBNAIL_MAX_HEIGHT", defaults.height),
        }
    }
}

/// The configuration dependency of the resolver. Injected so tests can run
/// against a fake store instead of SSM.
#[async_trait]
pub trait ParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, Error>;
}

pub struct SsmParameters {
    client: ssm::Client,
}

impl SsmParameters {
    pub fn new(client: ssm::Client) -> Self {
        SsmParameters { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameters {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>, Error> {
        let res = self
            .client
            .get_parameter()
            .name(name)
            .send()
            .await
            .map_err(|err| Error::Configuration {
                name: name.to_string(),
                source: err.into(),
            })?;

        Ok(res
            .parameter()
            .and_then(|parameter| parameter.value())
            .map(str::to_owned))
    }
}

/// Looks up the destination bucket in the parameter store. Resolved once per
/// invocation, before any record is processed.
pub struct BucketResolver<P> {
    store: P,
}

impl<P: ParameterStore> BucketResolver<P> {
    pub fn new(store: P) -> Self {
        BucketResolver { store }
    }

    pub async fn destination_bucket(&self) -> Result<String, Error> {
        self.store
            .get_parameter(RESIZED_BUCKET_PARAMETER)
            .await?
            .ok_or_else(|| Error::Configuration {
                name: RESIZED_BUCKET_PARAMETER.to_string(),
                source: "parameter has no value".into(),
            })
    }
}
