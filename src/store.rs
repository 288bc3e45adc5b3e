//! External store seams
//!
//! The engine persists nothing itself: blobs go to a content-addressed
//! blob store and records to the owner's record repository, both behind
//! traits so the transport (repository client, test double) stays out of
//! the core. The blob store's addressing must match [`crate::cid::compute_cid`]
//! exactly; dedup comparisons are only valid under that equality.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::cid::compute_cid;
use crate::error::EngineError;
use crate::fs::BlobRef;

/// Identity of a committed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    /// `at://did/collection/rkey`
    pub uri: String,
    /// Content identifier of the committed record
    pub cid: String,
}

/// Content-addressed blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes, returning the store's reference to them
    async fn put_blob(&self, data: &[u8], mime_type: &str) -> Result<BlobRef, EngineError>;
}

/// The owner's record repository
///
/// Write ordering is the caller's contract: a record must be committed
/// before any record that references it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put_record(
        &self,
        collection: &str,
        rkey: &str,
        record: Value,
    ) -> Result<RecordRef, EngineError>;

    async fn get_record(&self, uri: &str) -> Result<Option<Value>, EngineError>;

    async fn delete_record(&self, collection: &str, rkey: &str) -> Result<(), EngineError>;
}

/// Split a record URI into (did, collection, rkey)
pub fn parse_record_uri(uri: &str) -> Result<(&str, &str, &str), EngineError> {
    let rest = uri
        .strip_prefix("at://")
        .ok_or_else(|| EngineError::InvalidUri(uri.to_string()))?;
    let mut parts = rest.splitn(3, '/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(did), Some(collection), Some(rkey))
            if !did.is_empty() && !collection.is_empty() && !rkey.is_empty() =>
        {
            Ok((did, collection, rkey))
        }
        _ => Err(EngineError::InvalidUri(uri.to_string())),
    }
}

/// In-memory repository implementing both store seams
///
/// For tests and local development; addressing matches the production
/// scheme so dedup behaves identically.
pub struct MemoryRepo {
    did: String,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    records: Mutex<BTreeMap<String, Value>>,
    blob_puts: AtomicUsize,
}

impl MemoryRepo {
    pub fn new(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            blobs: Mutex::new(HashMap::new()),
            records: Mutex::new(BTreeMap::new()),
            blob_puts: AtomicUsize::new(0),
        }
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    fn uri_for(&self, collection: &str, rkey: &str) -> String {
        format!("at://{}/{}/{}", self.did, collection, rkey)
    }

    /// Number of stored blobs
    pub fn blob_count(&self) -> usize {
        self.blobs.lock().expect("blob map poisoned").len()
    }

    /// Number of `put_blob` calls observed, dedup hits included
    pub fn blob_put_count(&self) -> usize {
        self.blob_puts.load(Ordering::Relaxed)
    }

    /// Number of stored records
    pub fn record_count(&self) -> usize {
        self.records.lock().expect("record map poisoned").len()
    }

    /// URIs of all stored records, in insertion-independent (sorted) order
    pub fn record_uris(&self) -> Vec<String> {
        self.records
            .lock()
            .expect("record map poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BlobStore for MemoryRepo {
    async fn put_blob(&self, data: &[u8], mime_type: &str) -> Result<BlobRef, EngineError> {
        self.blob_puts.fetch_add(1, Ordering::Relaxed);
        let cid = compute_cid(data);
        let mut blobs = self.blobs.lock().expect("blob map poisoned");
        blobs.entry(cid.clone()).or_insert_with(|| data.to_vec());
        Ok(BlobRef::new(cid, mime_type, data.len() as u64))
    }
}

#[async_trait]
impl RecordStore for MemoryRepo {
    async fn put_record(
        &self,
        collection: &str,
        rkey: &str,
        record: Value,
    ) -> Result<RecordRef, EngineError> {
        let uri = self.uri_for(collection, rkey);
        let cid = compute_cid(serde_json::to_string(&record)?.as_bytes());
        let mut records = self.records.lock().expect("record map poisoned");
        records.insert(uri.clone(), record);
        Ok(RecordRef { uri, cid })
    }

    async fn get_record(&self, uri: &str) -> Result<Option<Value>, EngineError> {
        parse_record_uri(uri)?;
        let records = self.records.lock().expect("record map poisoned");
        Ok(records.get(uri).cloned())
    }

    async fn delete_record(&self, collection: &str, rkey: &str) -> Result<(), EngineError> {
        let uri = self.uri_for(collection, rkey);
        let mut records = self.records.lock().expect("record map poisoned");
        records.remove(&uri);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_record_uri() {
        let (did, collection, rkey) =
            parse_record_uri("at://did:plc:abc/dev.siteweave.fs/blog").unwrap();
        assert_eq!(did, "did:plc:abc");
        assert_eq!(collection, "dev.siteweave.fs");
        assert_eq!(rkey, "blog");

        assert!(parse_record_uri("https://example.com/x").is_err());
        assert!(parse_record_uri("at://did:plc:abc/only-two").is_err());
        assert!(parse_record_uri("at:///coll/rkey").is_err());
    }

    #[tokio::test]
    async fn test_memory_repo_blob_addressing_matches_local() {
        let repo = MemoryRepo::new("did:plc:test");
        let data = b"some payload";

        let blob = repo.put_blob(data, "application/octet-stream").await.unwrap();

        assert_eq!(blob.cid(), compute_cid(data));
        assert_eq!(blob.size, data.len() as u64);
    }

    #[tokio::test]
    async fn test_memory_repo_record_round_trip() {
        let repo = MemoryRepo::new("did:plc:test");
        let record = json!({"type": "fs", "site": "blog"});

        let rref = repo
            .put_record("dev.siteweave.fs", "blog", record.clone())
            .await
            .unwrap();
        assert_eq!(rref.uri, "at://did:plc:test/dev.siteweave.fs/blog");

        let fetched = repo.get_record(&rref.uri).await.unwrap();
        assert_eq!(fetched, Some(record));

        repo.delete_record("dev.siteweave.fs", "blog").await.unwrap();
        assert_eq!(repo.get_record(&rref.uri).await.unwrap(), None);
    }
}
