//! Builds a directory tree from a flat upload set
//!
//! Browsers submitting a folder drag include the dragged folder itself as a
//! leading path segment, so every incoming path is normalized by stripping
//! that first segment before the tree is assembled. File leaves come out as
//! placeholders; the patcher fills in blob references after upload.

use bytes::Bytes;
use std::collections::BTreeMap;
use tracing::warn;

use crate::fs::{Directory, Entry, FileNode, Node};

/// Version-control directory excluded from built trees
const VCS_DIR: &str = ".git";

/// Longest entry name the record format accepts
const MAX_NAME_LEN: usize = 255;

/// One file submitted in an upload request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Path as submitted, possibly including the synthetic folder segment
    pub name: String,
    pub content: Bytes,
    pub mime_type: String,
    pub size: u64,
    /// Content is already gzip-compressed by the client
    pub compressed: bool,
    /// Content is already base64-encoded by the client
    pub base64_encoded: bool,
    /// Mime type of the original content when `compressed` is set
    pub original_mime_type: Option<String>,
}

impl UploadedFile {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<Bytes>,
        mime_type: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let size = content.len() as u64;
        Self {
            name: name.into(),
            content,
            mime_type: mime_type.into(),
            size,
            compressed: false,
            base64_encoded: false,
            original_mime_type: None,
        }
    }
}

/// Result of assembling a tree from uploads
#[derive(Debug, Clone)]
pub struct BuiltTree {
    pub root: Directory,
    pub file_count: usize,
    /// Submitted paths that were not placed in the tree, with the reason
    pub skipped: Vec<String>,
}

/// Strip the synthetic leading path segment from a submitted name.
/// `"folder/index.html"` becomes `"index.html"`; a bare name passes through.
pub fn normalize_path(path: &str) -> &str {
    match path.find('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

fn is_vcs_path(path: &str) -> bool {
    path == VCS_DIR || path.starts_with(".git/")
}

/// Reject names the record format cannot hold. Returns the reason.
fn invalid_reason(path: &str) -> Option<&'static str> {
    if path.is_empty() {
        return Some("empty path");
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return Some("empty path segment");
        }
        if segment == "." || segment == ".." {
            return Some("relative path segment");
        }
        if segment.len() > MAX_NAME_LEN {
            return Some("name exceeds 255 characters");
        }
    }
    None
}

/// Intermediate tree keyed by name so repeated prefixes merge into the
/// same node and sibling order comes out deterministic.
#[derive(Default)]
struct Scaffold {
    files: BTreeMap<String, FileNode>,
    dirs: BTreeMap<String, Scaffold>,
}

impl Scaffold {
    /// Returns false when the path cannot be placed (name collides with a
    /// node of the other kind, or the file was already inserted).
    fn insert(&mut self, path: &str, file: FileNode) -> bool {
        match path.split_once('/') {
            None => {
                if self.dirs.contains_key(path) || self.files.contains_key(path) {
                    return false;
                }
                self.files.insert(path.to_string(), file);
                true
            }
            Some((dir, rest)) => {
                if self.files.contains_key(dir) {
                    return false;
                }
                self.dirs.entry(dir.to_string()).or_default().insert(rest, file)
            }
        }
    }

    fn into_directory(self) -> Directory {
        let mut entries: BTreeMap<String, Node> = BTreeMap::new();
        for (name, file) in self.files {
            entries.insert(name, Node::File(file));
        }
        for (name, scaffold) in self.dirs {
            entries.insert(name, Node::Directory(scaffold.into_directory()));
        }
        Directory::with_entries(
            entries
                .into_iter()
                .map(|(name, node)| Entry { name, node })
                .collect(),
        )
    }
}

/// Convert a flat list of uploaded files into a directory tree of
/// placeholder file leaves.
///
/// Unusable paths are skipped and reported, never fatal: the largest
/// possible correct tree is still built.
pub fn build(files: &[UploadedFile]) -> BuiltTree {
    let mut scaffold = Scaffold::default();
    let mut file_count = 0;
    let mut skipped = Vec::new();

    for file in files {
        let path = normalize_path(&file.name);

        if let Some(reason) = invalid_reason(path) {
            warn!(name = %file.name, reason, "Skipping file with unusable path");
            skipped.push(file.name.clone());
            continue;
        }
        if is_vcs_path(path) {
            continue;
        }

        let mime = file
            .original_mime_type
            .clone()
            .unwrap_or_else(|| file.mime_type.clone());

        if scaffold.insert(path, FileNode::placeholder(mime)) {
            file_count += 1;
        } else {
            warn!(name = %file.name, path, "Path collides with an existing entry, skipping");
            skipped.push(file.name.clone());
        }
    }

    BuiltTree {
        root: scaffold.into_directory(),
        file_count,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> UploadedFile {
        UploadedFile::new(name, Bytes::from_static(b"data"), "text/plain")
    }

    fn entry_names(dir: &Directory) -> Vec<&str> {
        dir.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_builds_nested_tree() {
        let built = build(&[upload("folder/a.txt"), upload("folder/sub/b.txt")]);

        assert_eq!(built.file_count, 2);
        assert_eq!(entry_names(&built.root), vec!["a.txt", "sub"]);
        match &built.root.entries[1].node {
            Node::Directory(sub) => assert_eq!(entry_names(sub), vec!["b.txt"]),
            other => panic!("expected directory, got {other:?}"),
        }
    }

    #[test]
    fn test_merges_repeated_prefixes() {
        let built = build(&[
            upload("site/css/main.css"),
            upload("site/css/print.css"),
            upload("site/index.html"),
        ]);

        assert_eq!(built.file_count, 3);
        assert_eq!(entry_names(&built.root), vec!["css", "index.html"]);
        match &built.root.entries[0].node {
            Node::Directory(css) => assert_eq!(entry_names(css), vec!["main.css", "print.css"]),
            other => panic!("expected directory, got {other:?}"),
        }
    }

    #[test]
    fn test_excludes_vcs_paths() {
        let built = build(&[
            upload("site/index.html"),
            upload("site/.git"),
            upload("site/.git/config"),
            upload("site/.git/objects/ab/cdef"),
        ]);

        assert_eq!(built.file_count, 1);
        assert_eq!(entry_names(&built.root), vec!["index.html"]);
        assert!(built.skipped.is_empty());
    }

    #[test]
    fn test_skips_invalid_names() {
        let long = "x".repeat(256);
        let built = build(&[
            upload("site/ok.txt"),
            upload("site/"),
            upload("site//double.txt"),
            upload("site/../escape.txt"),
            upload(&format!("site/{long}")),
        ]);

        assert_eq!(built.file_count, 1);
        assert_eq!(built.skipped.len(), 4);
    }

    #[test]
    fn test_duplicate_path_keeps_first() {
        let built = build(&[upload("a/index.html"), upload("b/index.html")]);

        assert_eq!(built.file_count, 1);
        assert_eq!(built.skipped, vec!["b/index.html".to_string()]);
    }

    #[test]
    fn test_leaves_are_placeholders() {
        let built = build(&[upload("site/index.html")]);
        match &built.root.entries[0].node {
            Node::File(file) => {
                assert!(file.blob.is_placeholder());
                assert_eq!(file.mime_type.as_deref(), Some("text/plain"));
            }
            other => panic!("expected file, got {other:?}"),
        }
    }
}
