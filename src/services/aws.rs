//! S3 and CloudFront implementations of the capability traits.
//!
//! Credentials come from the default AWS provider chain (environment,
//! profile, SSO, instance metadata). Transport retries are the SDK's.

use crate::services::{
    cdn::{CdnError, CdnInvalidator, CdnResult},
    store::{HeadObject, ObjectStore, PutObjectRequest, StoreError, StoreResult},
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_s3::{
    config::{Region, http::HttpResponse},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::ObjectCannedAcl,
};
use chrono::Utc;
use tracing::debug;

/// Shared SDK configuration for `region`.
pub async fn sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// Error code, HTTP status and message of a failed SDK call.
fn describe_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> (Option<String>, Option<u16>, String)
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code = err
        .as_service_error()
        .and_then(|e| e.code())
        .map(str::to_string);
    let status = err.raw_response().map(|r| r.status().as_u16());
    let message = err
        .as_service_error()
        .and_then(|e| e.message())
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(err).to_string());
    (code, status, message)
}

fn store_error<E>(err: SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let (code, status, message) = describe_sdk_error(&err);
    StoreError::Service {
        code,
        status,
        message,
    }
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn head_object(&self, bucket: &str, key: &str) -> StoreResult<HeadObject> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(head) => Ok(HeadObject {
                e_tag: head.e_tag().unwrap_or_default().to_string(),
                cache_control: head.cache_control().unwrap_or_default().to_string(),
                metadata: head.metadata().cloned().unwrap_or_default(),
            }),
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|service| service.is_not_found());
                if not_found {
                    return Err(StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    });
                }
                Err(store_error(err))
            }
        }
    }

    async fn put_object(&self, request: PutObjectRequest) -> StoreResult<()> {
        debug!(
            "PutObject s3://{}/{} ({} bytes)",
            request.bucket,
            request.key,
            request.body.len()
        );
        self.client
            .put_object()
            .bucket(request.bucket)
            .key(request.key)
            .body(ByteStream::from(request.body))
            .content_type(request.content_type)
            .cache_control(request.cache_control)
            .acl(ObjectCannedAcl::from(request.acl.as_str()))
            .send()
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

pub struct CloudFrontInvalidator {
    client: aws_sdk_cloudfront::Client,
}

impl CloudFrontInvalidator {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudfront::Client::new(config),
        }
    }
}

#[async_trait]
impl CdnInvalidator for CloudFrontInvalidator {
    async fn create_invalidation(&self, distribution_id: &str, paths: &[String]) -> CdnResult<String> {
        let quantity = i32::try_from(paths.len())
            .map_err(|_| CdnError::InvalidRequest(format!("too many paths: {}", paths.len())))?;
        let paths = Paths::builder()
            .quantity(quantity)
            .set_items(Some(paths.to_vec()))
            .build()
            .map_err(|err| CdnError::InvalidRequest(err.to_string()))?;
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(Utc::now().timestamp_millis().to_string())
            .build()
            .map_err(|err| CdnError::InvalidRequest(err.to_string()))?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|err| {
                let (code, _status, message) = describe_sdk_error(&err);
                CdnError::Service { code, message }
            })?;

        output
            .invalidation()
            .map(|invalidation| invalidation.id().to_string())
            .ok_or(CdnError::MissingInvalidation)
    }
}
