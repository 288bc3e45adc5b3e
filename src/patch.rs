//! Fills placeholder tree leaves with stored blob references
//!
//! A pure transform: the input tree is read-only and the output is a
//! freshly owned tree, so the pre- and post-patch views never alias.
//! Leaves that cannot be matched to an upload result are dropped and
//! reported rather than failing the whole tree.

use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::fs::{BlobRef, Directory, Entry, FileNode, Node};
use crate::tree::normalize_path;

/// Per-file outcome of a successful blob store write
#[derive(Debug, Clone)]
pub struct FileUploadResult {
    /// Content identifier of the stored bytes
    pub hash: String,
    pub blob: BlobRef,
    pub encoding: Option<String>,
    pub mime_type: Option<String>,
    pub base64: Option<bool>,
}

/// Result of patching: the rebuilt tree plus what was left out of it
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub root: Directory,
    pub patched: usize,
    /// Tree paths dropped because no result matched, the upload failed, or
    /// normalization made the match ambiguous
    pub dropped: Vec<String>,
}

/// Replace each placeholder leaf with the blob reference from its upload
/// result.
///
/// A leaf's tree path is matched against `results` exactly first, then by
/// finding the one submitted path in `file_paths` that normalizes to it
/// (the same leading-segment strip the tree builder applied). When two
/// submitted paths normalize to the same tree path the match is ambiguous
/// and the leaf is dropped instead of picking one blindly.
///
/// When `successful` is given, leaves outside it are dropped up front:
/// their upload failed and the caller tracks them separately.
pub fn patch(
    root: &Directory,
    results: &HashMap<String, FileUploadResult>,
    file_paths: &[String],
    successful: Option<&HashSet<String>>,
) -> PatchOutcome {
    // Fallback index: normalized form -> submitted paths that collapse to it
    let mut normalized: HashMap<&str, Vec<&str>> = HashMap::new();
    for path in file_paths {
        normalized
            .entry(normalize_path(path))
            .or_default()
            .push(path.as_str());
    }

    let mut patched = 0;
    let mut dropped = Vec::new();
    let root = patch_directory(
        root,
        String::new(),
        results,
        &normalized,
        successful,
        &mut patched,
        &mut dropped,
    );

    PatchOutcome {
        root,
        patched,
        dropped,
    }
}

fn match_result<'a>(
    path: &str,
    results: &'a HashMap<String, FileUploadResult>,
    normalized: &HashMap<&str, Vec<&str>>,
    dropped: &mut Vec<String>,
) -> Option<&'a FileUploadResult> {
    if let Some(result) = results.get(path) {
        return Some(result);
    }

    match normalized.get(path).map(Vec::as_slice) {
        Some([single]) => {
            let result = results.get(*single);
            if result.is_none() {
                warn!(path, submitted = *single, "Upload result missing for matched path, dropping entry");
                dropped.push(path.to_string());
            }
            result
        }
        Some(candidates) => {
            warn!(
                path,
                candidates = candidates.len(),
                "Multiple submitted paths normalize to the same tree path, dropping entry"
            );
            dropped.push(path.to_string());
            None
        }
        None => {
            warn!(path, "No upload result matches tree path, dropping entry");
            dropped.push(path.to_string());
            None
        }
    }
}

fn patch_directory(
    dir: &Directory,
    prefix: String,
    results: &HashMap<String, FileUploadResult>,
    normalized: &HashMap<&str, Vec<&str>>,
    successful: Option<&HashSet<String>>,
    patched: &mut usize,
    dropped: &mut Vec<String>,
) -> Directory {
    let mut entries = Vec::with_capacity(dir.entries.len());

    for entry in &dir.entries {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", prefix, entry.name)
        };

        match &entry.node {
            Node::File(placeholder) => {
                if let Some(ok) = successful {
                    if !ok.contains(&path) {
                        dropped.push(path);
                        continue;
                    }
                }
                if let Some(result) = match_result(&path, results, normalized, dropped) {
                    let file = FileNode {
                        r#type: "file".to_string(),
                        blob: result.blob.clone(),
                        encoding: result.encoding.clone(),
                        mime_type: result
                            .mime_type
                            .clone()
                            .or_else(|| placeholder.mime_type.clone()),
                        base64: result.base64,
                    };
                    entries.push(Entry::file(entry.name.clone(), file));
                    *patched += 1;
                }
            }
            Node::Directory(subdir) => {
                let rebuilt = patch_directory(
                    subdir, path, results, normalized, successful, patched, dropped,
                );
                entries.push(Entry::directory(entry.name.clone(), rebuilt));
            }
            // Resolved separately; carried through untouched
            Node::Subfs(subfs) => {
                entries.push(Entry::subfs(entry.name.clone(), subfs.clone()));
            }
        }
    }

    Directory::with_entries(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::SubfsNode;
    use crate::tree::{build, UploadedFile};
    use bytes::Bytes;

    fn result_for(cid: &str) -> FileUploadResult {
        FileUploadResult {
            hash: cid.to_string(),
            blob: BlobRef::new(cid, "application/octet-stream", 10),
            encoding: Some("gzip".to_string()),
            mime_type: Some("text/plain".to_string()),
            base64: Some(true),
        }
    }

    fn built_tree(names: &[&str]) -> Directory {
        let files: Vec<UploadedFile> = names
            .iter()
            .map(|n| UploadedFile::new(*n, Bytes::from_static(b"x"), "text/plain"))
            .collect();
        build(&files).root
    }

    #[test]
    fn test_patch_by_exact_path() {
        let root = built_tree(&["site/a.txt"]);
        let results = HashMap::from([("a.txt".to_string(), result_for("bafkreia"))]);

        let outcome = patch(&root, &results, &["a.txt".to_string()], None);

        assert_eq!(outcome.patched, 1);
        assert!(outcome.dropped.is_empty());
        match &outcome.root.entries[0].node {
            Node::File(file) => {
                assert_eq!(file.blob.cid(), "bafkreia");
                assert_eq!(file.encoding.as_deref(), Some("gzip"));
            }
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn test_patch_falls_back_to_normalized_match() {
        let root = built_tree(&["site/a.txt"]);
        // Results are keyed by the submitted path, with the folder segment
        let results = HashMap::from([("site/a.txt".to_string(), result_for("bafkreia"))]);

        let outcome = patch(&root, &results, &["site/a.txt".to_string()], None);

        assert_eq!(outcome.patched, 1);
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn test_drop_on_mismatch() {
        let root = built_tree(&["site/a.txt", "site/b.txt"]);
        let results = HashMap::from([
            ("site/a.txt".to_string(), result_for("bafkreia")),
            ("site/b.txt".to_string(), result_for("bafkreib")),
        ]);
        let paths = vec!["site/a.txt".to_string(), "site/b.txt".to_string()];
        let ok = HashSet::from(["a.txt".to_string()]);

        let outcome = patch(&root, &results, &paths, Some(&ok));

        assert_eq!(outcome.patched, 1);
        assert_eq!(outcome.dropped, vec!["b.txt".to_string()]);
        assert_eq!(outcome.root.entries.len(), 1);
        assert_eq!(outcome.root.entries[0].name, "a.txt");
    }

    #[test]
    fn test_ambiguous_normalization_is_dropped() {
        let root = built_tree(&["one/a.txt"]);
        let results = HashMap::from([
            ("one/a.txt".to_string(), result_for("bafkreia")),
            ("two/a.txt".to_string(), result_for("bafkreib")),
        ]);
        // Two submitted paths collapse onto "a.txt" after normalization
        let paths = vec!["one/a.txt".to_string(), "two/a.txt".to_string()];

        let outcome = patch(&root, &results, &paths, None);

        assert_eq!(outcome.patched, 0);
        assert_eq!(outcome.dropped, vec!["a.txt".to_string()]);
        assert!(outcome.root.entries.is_empty());
    }

    #[test]
    fn test_subfs_entries_pass_through() {
        let root = Directory::with_entries(vec![Entry::subfs(
            "legacy",
            SubfsNode::new("at://did:plc:x/dev.siteweave.subfs/abc", true),
        )]);

        let outcome = patch(&root, &HashMap::new(), &[], None);

        assert_eq!(outcome.root, root);
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn test_input_tree_is_untouched() {
        let root = built_tree(&["site/a.txt"]);
        let before = root.clone();
        let outcome = patch(&root, &HashMap::new(), &[], None);

        assert_eq!(root, before);
        assert_eq!(outcome.patched, 0);
    }
}
