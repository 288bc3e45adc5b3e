//! Content identifiers for stored blobs
//!
//! Identifiers computed here must match the external store's own addressing
//! bit for bit: CIDv1, raw codec (0x55), SHA-256, base32lower string form.
//! That equality is what makes a locally computed identifier comparable to
//! one returned by the store, which is the basis for dedup.

use cid::Cid;
use multihash_codetable::{Code, MultihashDigest};
use serde_json::Value;

/// Raw multicodec: un-interpreted bytes
const RAW_CODEC: u64 = 0x55;

/// Compute the content identifier for the exact bytes to be stored.
///
/// Deterministic and pure. Note that for compressed uploads this is called
/// on the encoded payload (base64 of gzip), not the original file content,
/// because that is what the store addresses.
pub fn compute_cid(content: &[u8]) -> String {
    let hash = Code::Sha2_256.digest(content);
    Cid::new_v1(RAW_CODEC, hash).to_string()
}

/// Normalize one of several blob-reference shapes into a bare CID string.
///
/// Accepted shapes:
/// - a bare identifier string
/// - a raw link object `{"$link": <cid>}`
/// - a wrapped reference whose `ref` is either of the above
/// - an object carrying a plain `cid` string
///
/// Fails closed: returns `None` on any unrecognized shape.
pub fn extract_cid(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => {
            if let Some(link) = obj.get("$link").and_then(Value::as_str) {
                if !link.is_empty() {
                    return Some(link.to_string());
                }
                return None;
            }
            if let Some(inner) = obj.get("ref") {
                return extract_cid(inner);
            }
            if let Some(cid) = obj.get("cid").and_then(Value::as_str) {
                if !cid.is_empty() {
                    return Some(cid.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use serde_json::json;

    #[test]
    fn test_compute_cid_is_deterministic() {
        let a = compute_cid(b"hello");
        let b = compute_cid(b"hello");
        assert_eq!(a, b);
        // Raw codec CIDv1 in base32 starts with "baf"
        assert!(a.starts_with("baf"));
    }

    #[test]
    fn test_compute_cid_differs_on_different_bytes() {
        assert_ne!(compute_cid(b"hello"), compute_cid(b"hello!"));
    }

    #[test]
    fn test_compute_cid_on_encoded_payload() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello world").unwrap();
        let gzipped = encoder.finish().unwrap();
        let payload = base64::prelude::BASE64_STANDARD.encode(&gzipped).into_bytes();

        let cid = compute_cid(&payload);
        assert!(cid.starts_with("baf"));
        assert!(cid.len() > 10);
    }

    #[test]
    fn test_extract_cid_bare_string() {
        assert_eq!(
            extract_cid(&json!("bafkreiabc")),
            Some("bafkreiabc".to_string())
        );
    }

    #[test]
    fn test_extract_cid_link_object() {
        assert_eq!(
            extract_cid(&json!({"$link": "bafkreiabc"})),
            Some("bafkreiabc".to_string())
        );
    }

    #[test]
    fn test_extract_cid_wrapped_blob() {
        let blob = json!({
            "$type": "blob",
            "ref": {"$link": "bafkreiabc"},
            "mimeType": "application/octet-stream",
            "size": 12
        });
        assert_eq!(extract_cid(&blob), Some("bafkreiabc".to_string()));

        let legacy = json!({"cid": "bafkreiabc", "mimeType": "text/plain"});
        assert_eq!(extract_cid(&legacy), Some("bafkreiabc".to_string()));

        let string_ref = json!({"ref": "bafkreiabc"});
        assert_eq!(extract_cid(&string_ref), Some("bafkreiabc".to_string()));
    }

    #[test]
    fn test_extract_cid_fails_closed() {
        assert_eq!(extract_cid(&json!("")), None);
        assert_eq!(extract_cid(&json!(42)), None);
        assert_eq!(extract_cid(&json!(null)), None);
        assert_eq!(extract_cid(&json!({"link": "bafkreiabc"})), None);
        assert_eq!(extract_cid(&json!({"ref": {"link": "x"}})), None);
        assert_eq!(extract_cid(&json!(["bafkreiabc"])), None);
    }
}
