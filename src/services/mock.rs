//! In-memory capability doubles for tests.

use crate::services::{
    cdn::{CdnError, CdnInvalidator, CdnResult},
    store::{HeadObject, ObjectStore, PutObjectRequest, StoreError, StoreResult},
};
use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

/// Records every call and serves HEADs from what was put or inserted.
#[derive(Default)]
pub struct MockStore {
    objects: Mutex<HashMap<String, HeadObject>>,
    puts: Mutex<Vec<PutObjectRequest>>,
    heads: Mutex<Vec<String>>,
    failing_puts: Mutex<HashSet<String>>,
    failing_heads: Mutex<HashSet<String>>,
}

impl MockStore {
    pub fn insert(&self, key: &str, e_tag: &str, cache_control: &str) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            HeadObject {
                e_tag: e_tag.to_string(),
                cache_control: cache_control.to_string(),
                metadata: HashMap::new(),
            },
        );
    }

    pub fn fail_put(&self, key: &str) {
        self.failing_puts.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_head(&self, key: &str) {
        self.failing_heads.lock().unwrap().insert(key.to_string());
    }

    pub fn put_keys(&self) -> Vec<String> {
        self.puts
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.key.clone())
            .collect()
    }

    pub fn puts(&self) -> Vec<PutObjectRequest> {
        self.puts.lock().unwrap().clone()
    }

    pub fn head_keys(&self) -> Vec<String> {
        self.heads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn head_object(&self, bucket: &str, key: &str) -> StoreResult<HeadObject> {
        self.heads.lock().unwrap().push(key.to_string());
        if self.failing_heads.lock().unwrap().contains(key) {
            return Err(StoreError::Service {
                code: Some("AccessDenied".into()),
                status: Some(403),
                message: "Access Denied".into(),
            });
        }
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put_object(&self, request: PutObjectRequest) -> StoreResult<()> {
        self.puts.lock().unwrap().push(request.clone());
        if self.failing_puts.lock().unwrap().contains(&request.key) {
            return Err(StoreError::Service {
                code: Some("InternalError".into()),
                status: Some(500),
                message: "We encountered an internal error".into(),
            });
        }
        let e_tag = format!("\"{:x}\"", md5::compute(&request.body));
        self.insert(&request.key, &e_tag, &request.cache_control);
        Ok(())
    }
}

/// Records invalidation requests.
#[derive(Default)]
pub struct MockCdn {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    fail: bool,
}

impl MockCdn {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CdnInvalidator for MockCdn {
    async fn create_invalidation(&self, distribution_id: &str, paths: &[String]) -> CdnResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((distribution_id.to_string(), paths.to_vec()));
        if self.fail {
            return Err(CdnError::Service {
                code: Some("NoSuchDistribution".into()),
                message: "The specified distribution does not exist".into(),
            });
        }
        Ok("I2J0I21PCUYOIK".to_string())
    }
}
