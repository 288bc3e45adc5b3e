//! Persisted record shapes for site manifests
//!
//! A site is stored as a `Manifest` record whose `root` is a tree of
//! directories and content-addressed file leaves. Oversized trees are
//! partitioned across additional `SubfsRecord`s, referenced from the tree
//! by `SubfsNode` forward pointers.
//!
//! These shapes are external interop surface: field names and the literal
//! `type` markers must serialize exactly as the record format defines them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Link to a content identifier, the store's `{"$link": <cid>}` shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidLink {
    #[serde(rename = "$link")]
    pub link: String,
}

/// Reference to a stored blob, as returned by the external blob store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    #[serde(rename = "$type")]
    pub blob_type: String,
    pub r#ref: CidLink,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub size: u64,
}

impl BlobRef {
    pub fn new(cid: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            blob_type: "blob".to_string(),
            r#ref: CidLink { link: cid.into() },
            mime_type: mime_type.into(),
            size,
        }
    }

    /// Marker for a tree leaf whose content has not been stored yet.
    /// Replaced during patching; must never reach a committed record.
    pub fn placeholder() -> Self {
        Self::new("", "application/octet-stream", 0)
    }

    pub fn is_placeholder(&self) -> bool {
        self.r#ref.link.is_empty()
    }

    /// Content identifier of the referenced bytes
    pub fn cid(&self) -> &str {
        &self.r#ref.link
    }
}

/// File leaf: `{type:"file", blob, encoding?, mimeType?, base64?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub r#type: String,
    pub blob: BlobRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<bool>,
}

impl FileNode {
    pub fn new(blob: BlobRef) -> Self {
        Self {
            r#type: "file".to_string(),
            blob,
            encoding: None,
            mime_type: None,
            base64: None,
        }
    }

    /// Leaf awaiting its blob reference, carrying the detected mime type
    pub fn placeholder(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            ..Self::new(BlobRef::placeholder())
        }
    }
}

/// Directory: `{type:"directory", entries:[{name, node}]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    pub r#type: String,
    pub entries: Vec<Entry>,
}

impl Directory {
    pub fn new() -> Self {
        Self::with_entries(Vec::new())
    }

    pub fn with_entries(entries: Vec<Entry>) -> Self {
        Self {
            r#type: "directory".to_string(),
            entries,
        }
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward pointer to another record standing in for a subtree:
/// `{type:"subfs", subject, flat?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubfsNode {
    pub r#type: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat: Option<bool>,
}

impl SubfsNode {
    pub fn new(subject: impl Into<String>, flat: bool) -> Self {
        Self {
            r#type: "subfs".to_string(),
            subject: subject.into(),
            flat: Some(flat),
        }
    }

    /// Subfs entries merge flat unless the record says otherwise
    pub fn is_flat(&self) -> bool {
        self.flat.unwrap_or(true)
    }
}

/// A named slot in a directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub node: Node,
}

impl Entry {
    pub fn file(name: impl Into<String>, file: FileNode) -> Self {
        Self {
            name: name.into(),
            node: Node::File(file),
        }
    }

    pub fn directory(name: impl Into<String>, dir: Directory) -> Self {
        Self {
            name: name.into(),
            node: Node::Directory(dir),
        }
    }

    pub fn subfs(name: impl Into<String>, subfs: SubfsNode) -> Self {
        Self {
            name: name.into(),
            node: Node::Subfs(subfs),
        }
    }
}

/// The closed node union. Variants are disambiguated structurally on
/// deserialization: exactly one of `blob`, `entries`, `subject` is required
/// per shape, so the untagged representation round-trips the wire format
/// while keeping match sites exhaustive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    File(FileNode),
    Directory(Directory),
    Subfs(SubfsNode),
}

/// Root manifest record: `{type:"fs", site, root, fileCount, createdAt}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub r#type: String,
    pub site: String,
    pub root: Directory,
    #[serde(rename = "fileCount")]
    pub file_count: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Manifest {
    pub fn new(site: impl Into<String>, root: Directory, file_count: i64) -> Self {
        Self {
            r#type: "fs".to_string(),
            site: site.into(),
            root,
            file_count,
            created_at: Utc::now(),
        }
    }
}

/// Split-out subtree record: `{type:"subfs", root, fileCount, createdAt}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubfsRecord {
    pub r#type: String,
    pub root: Directory,
    #[serde(rename = "fileCount")]
    pub file_count: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl SubfsRecord {
    pub fn new(root: Directory) -> Self {
        let file_count = count_files(&root) as i64;
        Self {
            r#type: "subfs".to_string(),
            root,
            file_count,
            created_at: Utc::now(),
        }
    }
}

/// Count file leaves in a tree. Subfs subtrees are opaque: their files live
/// in a separate record and are counted when that record is built.
pub fn count_files(dir: &Directory) -> usize {
    let mut count = 0;
    for entry in &dir.entries {
        match &entry.node {
            Node::File(_) => count += 1,
            Node::Directory(subdir) => count += count_files(subdir),
            Node::Subfs(_) => {}
        }
    }
    count
}

/// Projected serialized size of a directory tree in bytes
pub fn estimated_json_size(dir: &Directory) -> usize {
    serde_json::to_string(dir).map(|s| s.len()).unwrap_or(0)
}
