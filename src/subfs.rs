//! Discovers and merges linked subtree records
//!
//! The write side leaves forward pointers behind (see `split`); this module
//! is the read side. Discovery walks a tree and reports every pointer with
//! its mount path without fetching anything. Resolution fetches each
//! referenced record and splices its entries back in, giving readers one
//! logical tree again.

use std::future::Future;
use std::pin::Pin;
use tracing::warn;

use crate::error::EngineError;
use crate::fs::{Directory, Entry, Node, SubfsRecord};
use crate::store::{parse_record_uri, RecordStore};

/// References may nest (a split subtree can itself be split); resolution
/// follows at most this many levels before giving up on a cycle.
const MAX_RESOLVE_DEPTH: usize = 10;

/// A forward reference and the path where its entries belong
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubfsMount {
    pub uri: String,
    pub path: String,
}

/// Collect every forward reference in the tree with its mount path.
/// Subfs nodes are leaves here: nothing is fetched.
pub fn extract_subfs_uris(root: &Directory) -> Vec<SubfsMount> {
    let mut mounts = Vec::new();
    collect(root, "", &mut mounts);
    mounts
}

fn collect(dir: &Directory, prefix: &str, out: &mut Vec<SubfsMount>) {
    for entry in &dir.entries {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", prefix, entry.name)
        };
        match &entry.node {
            Node::Subfs(subfs) => out.push(SubfsMount {
                uri: subfs.subject.clone(),
                path,
            }),
            Node::Directory(subdir) => collect(subdir, &path, out),
            Node::File(_) => {}
        }
    }
}

/// Expand every forward reference into the entries of the record it points
/// at, recursively, yielding one logical tree.
///
/// A flat pointer's entries replace it in place; a non-flat pointer's
/// entries become children of a synthetic directory carrying the entry's
/// name. A reference that cannot be fetched is dropped with a warning so
/// the rest of the tree still serves. On a sibling name collision during
/// splicing the existing entry wins.
pub async fn resolve(store: &dyn RecordStore, root: &Directory) -> Result<Directory, EngineError> {
    resolve_directory(store, root.clone(), 0).await
}

fn resolve_directory<'a>(
    store: &'a dyn RecordStore,
    dir: Directory,
    depth: usize,
) -> Pin<Box<dyn Future<Output = Result<Directory, EngineError>> + Send + 'a>> {
    Box::pin(async move {
        if depth >= MAX_RESOLVE_DEPTH {
            return Err(EngineError::Store(format!(
                "Subfs nesting exceeds {MAX_RESOLVE_DEPTH} levels, possible reference cycle"
            )));
        }

        let mut entries: Vec<Entry> = Vec::with_capacity(dir.entries.len());

        for entry in dir.entries {
            match entry.node {
                Node::Subfs(subfs) => {
                    let record = match fetch_subfs(store, &subfs.subject).await {
                        Ok(record) => record,
                        Err(e) => {
                            warn!(uri = %subfs.subject, error = %e, "Dropping unresolvable subfs reference");
                            continue;
                        }
                    };
                    let resolved = resolve_directory(store, record.root, depth + 1).await?;
                    if subfs.is_flat() {
                        for spliced in resolved.entries {
                            push_unique(&mut entries, spliced);
                        }
                    } else {
                        push_unique(&mut entries, Entry::directory(entry.name, resolved));
                    }
                }
                Node::Directory(subdir) => {
                    // Plain nesting is free; only reference hops count
                    // against the depth bound
                    let resolved = resolve_directory(store, subdir, depth).await?;
                    push_unique(&mut entries, Entry::directory(entry.name, resolved));
                }
                Node::File(_) => push_unique(&mut entries, entry),
            }
        }

        Ok(Directory::with_entries(entries))
    })
}

fn push_unique(entries: &mut Vec<Entry>, entry: Entry) {
    if entries.iter().any(|e| e.name == entry.name) {
        warn!(name = %entry.name, "Name collision while splicing subfs entries, keeping existing entry");
        return;
    }
    entries.push(entry);
}

async fn fetch_subfs(store: &dyn RecordStore, uri: &str) -> Result<SubfsRecord, EngineError> {
    parse_record_uri(uri)?;
    let value = store
        .get_record(uri)
        .await?
        .ok_or_else(|| EngineError::Store(format!("Subfs record not found: {uri}")))?;
    Ok(serde_json::from_value(value)?)
}
