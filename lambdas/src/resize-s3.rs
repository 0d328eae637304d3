use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use shared::config::{
    aws_sdk_config, get_s3_client, get_ssm_client, BucketResolver, MaxDimensions, SsmParameters,
};
use shared::pipeline::{handle_event, Pipeline, S3Store};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let sdk_config = aws_sdk_config().await;
    let pipeline = Pipeline::new(
        S3Store::new(get_s3_client(&sdk_config)),
        MaxDimensions::from_env(),
    );
    let resolver = BucketResolver::new(SsmParameters::new(get_ssm_client(&sdk_config)));

    run(service_fn(|event| {
        resize_s3(event, &pipeline, &resolver)
    }))
    .await
}

async fn resize_s3(
    event: LambdaEvent<S3Event>,
    pipeline: &Pipeline<S3Store>,
    resolver: &BucketResolver<SsmParameters>,
) -> Result<(), Error> {
    tracing::info!("event received: {} record(s)", event.payload.records.len());

    handle_event(event.payload, pipeline, resolver).await?;

    Ok(())
}
