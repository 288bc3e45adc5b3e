//! Flattens a tree into path -> content-identifier maps
//!
//! These maps are the dedup index: the pipeline diffs a freshly hashed
//! upload against the map of a previously committed manifest to decide
//! reuse versus re-upload. Subfs subtrees are opaque here: reading them
//! takes a separate fetch, which the resolver handles.

use std::collections::HashMap;
use tracing::debug;

use crate::fs::{BlobRef, Directory, Entry, Node};

/// Blob reference and content identifier for one file leaf
#[derive(Debug, Clone)]
pub struct BlobInfo {
    pub blob: BlobRef,
    pub cid: String,
}

/// Map every file leaf to its blob reference and content identifier.
/// Does not descend into subfs subtrees.
pub fn extract_blob_map(root: &Directory) -> HashMap<String, BlobInfo> {
    let mut map = HashMap::new();
    walk(&root.entries, "", &mut map);
    map
}

fn walk(entries: &[Entry], prefix: &str, out: &mut HashMap<String, BlobInfo>) {
    for entry in entries {
        let path = join(prefix, &entry.name);
        match &entry.node {
            Node::File(file) => {
                if file.blob.is_placeholder() {
                    debug!(path, "Skipping unpatched placeholder leaf");
                    continue;
                }
                out.insert(
                    path,
                    BlobInfo {
                        blob: file.blob.clone(),
                        cid: file.blob.cid().to_string(),
                    },
                );
            }
            Node::Directory(subdir) => walk(&subdir.entries, &path, out),
            Node::Subfs(_) => {}
        }
    }
}

/// Record path -> cid for every file leaf under `entries`, prefixed with
/// `prefix`. Used to build the "what do we already have" index from a
/// previously committed manifest.
pub fn collect_cids(entries: &[Entry], prefix: &str, out: &mut HashMap<String, String>) {
    for entry in entries {
        let path = join(prefix, &entry.name);
        match &entry.node {
            Node::File(file) => {
                if !file.blob.is_placeholder() {
                    out.insert(path, file.blob.cid().to_string());
                }
            }
            Node::Directory(subdir) => collect_cids(&subdir.entries, &path, out),
            Node::Subfs(_) => {}
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileNode, SubfsNode};

    fn file(cid: &str) -> FileNode {
        FileNode::new(BlobRef::new(cid, "application/octet-stream", 4))
    }

    fn sample_tree() -> Directory {
        Directory::with_entries(vec![
            Entry::file("index.html", file("bafkreindex")),
            Entry::directory(
                "assets",
                Directory::with_entries(vec![
                    Entry::file("app.js", file("bafkreijs")),
                    Entry::subfs(
                        "legacy",
                        SubfsNode::new("at://did:plc:x/dev.siteweave.subfs/abc", true),
                    ),
                ]),
            ),
        ])
    }

    #[test]
    fn test_extract_blob_map() {
        let map = extract_blob_map(&sample_tree());

        assert_eq!(map.len(), 2);
        assert_eq!(map["index.html"].cid, "bafkreindex");
        assert_eq!(map["assets/app.js"].cid, "bafkreijs");
        // The subfs subtree is opaque
        assert!(!map.keys().any(|k| k.starts_with("assets/legacy")));
    }

    #[test]
    fn test_collect_cids_with_prefix() {
        let tree = sample_tree();
        let mut out = HashMap::new();
        collect_cids(&tree.entries, "mount", &mut out);

        assert_eq!(out.len(), 2);
        assert_eq!(out["mount/index.html"], "bafkreindex");
        assert_eq!(out["mount/assets/app.js"], "bafkreijs");
    }

    #[test]
    fn test_placeholders_are_not_indexed() {
        let tree = Directory::with_entries(vec![Entry::file(
            "pending.txt",
            FileNode::placeholder("text/plain"),
        )]);

        assert!(extract_blob_map(&tree).is_empty());
        let mut out = HashMap::new();
        collect_cids(&tree.entries, "", &mut out);
        assert!(out.is_empty());
    }
}
