//! LocalObjectStore: an [`ObjectStore`] that mirrors a deploy onto disk.
//!
//! Payloads land at `root/{bucket}/{key}`, so the mirror browses like the
//! build tree it came from. ETag, Cache-Control and ACL live in a SQLite
//! table under `root/.asset-deploy/`. Used with `--local-store`.

use crate::{
    models::object::StoredObject,
    services::store::{HeadObject, ObjectStore, PutObjectRequest, StoreError, StoreResult},
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info};
use uuid::Uuid;

/// Directory under the store root holding the metadata database.
const META_DIR: &str = ".asset-deploy";

const MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Clone)]
pub struct LocalObjectStore {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Directory the mirror is written under.
    pub root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(db: Arc<SqlitePool>, root: impl Into<PathBuf>) -> Self {
        Self {
            db,
            root: root.into(),
        }
    }

    /// Open (or create) a store rooted at `root` and apply the schema.
    pub async fn open(root: &Path) -> StoreResult<Self> {
        let meta_dir = root.join(META_DIR);
        if !meta_dir.exists() {
            fs::create_dir_all(&meta_dir).await?;
            info!("Created local store at {}", root.display());
        }

        let options = SqliteConnectOptions::new()
            .filename(meta_dir.join("objects.db"))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;
        Ok(Self::new(Arc::new(pool), root))
    }

    /// Disk path for `key` in `bucket`, rejecting anything that would
    /// escape the bucket directory or collide with the metadata directory.
    fn object_path(&self, bucket: &str, key: &str) -> StoreResult<PathBuf> {
        if !is_plain_segment(bucket) || bucket.starts_with('.') {
            return Err(StoreError::InvalidBucketName(bucket.to_string()));
        }
        if !key.split('/').all(is_plain_segment) {
            return Err(StoreError::InvalidObjectKey(key.to_string()));
        }

        let mut path = self.root.join(bucket);
        path.extend(key.split('/'));
        Ok(path)
    }

    async fn fetch_object(&self, bucket: &str, key: &str) -> StoreResult<StoredObject> {
        sqlx::query_as::<_, StoredObject>(
            "SELECT id, bucket, key, content_type, cache_control, acl, size_bytes,
                    etag, last_modified
             FROM objects
             WHERE bucket = ? AND key = ?",
        )
        .bind(bucket)
        .bind(key)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Write `body` next to its final path, fsync it, then rename it over
    /// the previous payload. The temp file is removed on failure.
    async fn write_payload(path: &Path, body: &[u8]) -> StoreResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| std::io::Error::other("object path has no parent directory"))?;
        fs::create_dir_all(parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));

        let written = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(body).await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, path).await
        }
        .await;

        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn head_object(&self, bucket: &str, key: &str) -> StoreResult<HeadObject> {
        self.object_path(bucket, key)?;
        let object = self.fetch_object(bucket, key).await?;
        Ok(HeadObject {
            e_tag: format!("\"{}\"", object.etag),
            cache_control: object.cache_control,
            metadata: HashMap::new(),
        })
    }

    async fn put_object(&self, request: PutObjectRequest) -> StoreResult<()> {
        let path = self.object_path(&request.bucket, &request.key)?;
        Self::write_payload(&path, &request.body).await?;

        let etag = format!("{:x}", md5::compute(&request.body));
        let size_bytes = i64::try_from(request.body.len()).unwrap_or(i64::MAX);
        sqlx::query(
            r#"
            INSERT INTO objects (
                id, bucket, key, content_type, cache_control, acl,
                size_bytes, etag, last_modified
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(bucket, key) DO UPDATE SET
                content_type = excluded.content_type,
                cache_control = excluded.cache_control,
                acl = excluded.acl,
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                last_modified = excluded.last_modified
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.bucket)
        .bind(&request.key)
        .bind(&request.content_type)
        .bind(&request.cache_control)
        .bind(&request.acl)
        .bind(size_bytes)
        .bind(&etag)
        .bind(Utc::now())
        .execute(&*self.db)
        .await?;

        debug!(
            "mirrored {}/{} ({} bytes, etag {}) to {}",
            request.bucket,
            request.key,
            size_bytes,
            etag,
            path.display()
        );
        Ok(())
    }
}

/// Apply the embedded schema, one statement at a time.
pub async fn run_migrations(db: &SqlitePool) -> StoreResult<()> {
    let statements = MIGRATION
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    debug!("Running {} migration statements...", statements.len());
    for stmt in statements {
        sqlx::query(stmt).execute(db).await?;
    }
    Ok(())
}

/// One non-empty path component with no separators, control characters
/// or relative-directory meaning.
fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.chars().any(|c| c == '\\' || c == '/' || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::decision::content_hash;
    use bytes::Bytes;
    use tempfile::TempDir;

    async fn store() -> (LocalObjectStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        (LocalObjectStore::new(Arc::new(pool), dir.path()), dir)
    }

    fn put(key: &str, body: &'static [u8], cache_control: &str) -> PutObjectRequest {
        PutObjectRequest {
            bucket: "my-site".into(),
            key: key.into(),
            body: Bytes::from_static(body),
            content_type: "text/plain; charset=utf-8".into(),
            cache_control: cache_control.into(),
            acl: "public-read".into(),
        }
    }

    #[tokio::test]
    async fn head_of_missing_object_is_not_found() {
        let (store, _dir) = store().await;
        let err = store.head_object("my-site", "index.html").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn put_mirrors_the_key_as_a_plain_path() {
        let (store, dir) = store().await;
        store.put_object(put("static/js/a.js", b"hello", "no-cache")).await.unwrap();

        let on_disk = std::fs::read(dir.path().join("my-site/static/js/a.js")).unwrap();
        assert_eq!(on_disk, b"hello");

        let head = store.head_object("my-site", "static/js/a.js").await.unwrap();
        assert_eq!(head.e_tag, content_hash(b"hello"));
        assert_eq!(head.cache_control, "no-cache");
    }

    #[tokio::test]
    async fn overwrite_replaces_payload_and_metadata() {
        let (store, dir) = store().await;
        store.put_object(put("x.txt", b"one", "no-cache")).await.unwrap();
        store.put_object(put("x.txt", b"two!", "max-age=60")).await.unwrap();

        let meta = store.fetch_object("my-site", "x.txt").await.unwrap();
        assert_eq!(meta.size_bytes, 4);
        assert_eq!(meta.cache_control, "max-age=60");
        assert_eq!(std::fs::read(dir.path().join("my-site/x.txt")).unwrap(), b"two!");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("my-site"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, ["x.txt"]);
    }

    #[tokio::test]
    async fn keys_and_buckets_cannot_escape_the_root() {
        let (store, _dir) = store().await;
        for key in ["../escape", "a//b", "/abs", "a/./b", "dir/"] {
            let err = store.put_object(put(key, b"x", "")).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidObjectKey(_)), "{key}");
        }

        for bucket in ["", "..", ".asset-deploy", "a/b"] {
            let mut request = put("ok.txt", b"x", "");
            request.bucket = bucket.into();
            let err = store.put_object(request).await.unwrap_err();
            assert_eq!(err.code(), Some("InvalidBucketName"), "{bucket}");
        }
    }

    #[tokio::test]
    async fn open_creates_a_persistent_store() {
        let dir = TempDir::new().unwrap();
        {
            let store = LocalObjectStore::open(dir.path()).await.unwrap();
            store.put_object(put("index.html", b"<p>", "no-cache")).await.unwrap();
        }
        let reopened = LocalObjectStore::open(dir.path()).await.unwrap();
        let head = reopened.head_object("my-site", "index.html").await.unwrap();
        assert_eq!(head.e_tag, content_hash(b"<p>"));
    }
}
