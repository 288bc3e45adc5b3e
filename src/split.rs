//! Partitions oversized trees across linked records
//!
//! A committed record has a hard serialized-size budget and a per-directory
//! entry cap. When a built tree exceeds the byte budget, whole
//! subdirectories are extracted (greedily, largest first) into their own
//! records and replaced with forward pointers until the remainder fits.
//! Extracted subtrees are split recursively the same way.
//!
//! Write ordering is leaves-first: a subtree record is committed before
//! the directory that points at it, so a reader never follows a dangling
//! reference.

use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fs::{count_files, estimated_json_size, Directory, Entry, Node, SubfsNode, SubfsRecord};
use crate::store::{RecordRef, RecordStore};

/// Extracting a subtree smaller than this cannot pay for the pointer that
/// replaces it; treat the tree as unsplittable instead of looping.
const MIN_EXTRACT_BYTES: usize = 256;

/// Result of splitting: the (possibly rewritten) root plus every subtree
/// record committed on its behalf, in commit order
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub root: Directory,
    pub subfs_records: Vec<RecordRef>,
}

/// A subdirectory that could be extracted into its own record
#[derive(Debug, Clone)]
struct SplitCandidate {
    path: String,
    directory: Directory,
    size: usize,
    file_count: usize,
}

/// Bring `root` under the record budget, committing subtree records as
/// needed. Returns the tree unchanged (and commits nothing) when it
/// already fits.
pub async fn split_manifest(
    store: &dyn RecordStore,
    config: &EngineConfig,
    root: Directory,
) -> Result<SplitOutcome, EngineError> {
    let mut subfs_records = Vec::new();
    let root = split_directory(store, config, root, "/".to_string(), &mut subfs_records).await?;
    Ok(SplitOutcome {
        root,
        subfs_records,
    })
}

fn split_directory<'a>(
    store: &'a dyn RecordStore,
    config: &'a EngineConfig,
    dir: Directory,
    label: String,
    records: &'a mut Vec<RecordRef>,
) -> Pin<Box<dyn Future<Output = Result<Directory, EngineError>> + Send + 'a>> {
    Box::pin(async move {
        check_entry_limits(&dir, &label, config.max_directory_entries)?;

        let mut dir = dir;
        loop {
            let size = estimated_json_size(&dir);
            if size <= config.max_record_bytes {
                return Ok(dir);
            }

            // Splitting can only move whole subdirectories out; when none
            // is left to extract (or the best one is too small to matter),
            // this single directory exceeds the record format itself.
            let candidate = find_splittable(&dir)
                .into_iter()
                .next()
                .filter(|c| c.size >= MIN_EXTRACT_BYTES)
                .ok_or_else(|| EngineError::SizeLimit {
                    path: label.clone(),
                    size,
                    limit: config.max_record_bytes,
                })?;

            debug!(
                path = %candidate.path,
                size = candidate.size,
                files = candidate.file_count,
                "Extracting subtree into linked record"
            );

            let subtree = split_directory(
                store,
                config,
                candidate.directory,
                candidate.path.clone(),
                records,
            )
            .await?;

            let record = SubfsRecord::new(subtree);
            let rkey = Uuid::new_v4().simple().to_string();
            let rref = store
                .put_record(
                    &config.subfs_collection,
                    &rkey,
                    serde_json::to_value(&record)?,
                )
                .await?;

            info!(uri = %rref.uri, path = %candidate.path, files = record.file_count, "Committed subtree record");

            dir = replace_with_subfs(dir, &candidate.path, &rref.uri, true)?;
            records.push(rref);
        }
    })
}

/// Every subdirectory that could become its own record, largest first
fn find_splittable(dir: &Directory) -> Vec<SplitCandidate> {
    let mut candidates = Vec::new();
    collect_candidates(dir, "", &mut candidates);
    candidates.sort_by(|a, b| b.size.cmp(&a.size));
    candidates
}

fn collect_candidates(dir: &Directory, prefix: &str, out: &mut Vec<SplitCandidate>) {
    for entry in &dir.entries {
        if let Node::Directory(subdir) = &entry.node {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", prefix, entry.name)
            };
            out.push(SplitCandidate {
                path: path.clone(),
                directory: subdir.clone(),
                size: estimated_json_size(subdir),
                file_count: count_files(subdir),
            });
            collect_candidates(subdir, &path, out);
        }
    }
}

/// The entry cap cannot be recovered by extraction (a directory keeps its
/// entry count wherever it lands), so a violation is fatal immediately.
fn check_entry_limits(dir: &Directory, label: &str, limit: usize) -> Result<(), EngineError> {
    if dir.entries.len() > limit {
        return Err(EngineError::EntryLimit {
            path: label.to_string(),
            count: dir.entries.len(),
            limit,
        });
    }
    for entry in &dir.entries {
        if let Node::Directory(subdir) = &entry.node {
            let path = if label == "/" {
                entry.name.clone()
            } else {
                format!("{}/{}", label, entry.name)
            };
            check_entry_limits(subdir, &path, limit)?;
        }
    }
    Ok(())
}

/// Swap the directory at `target` for a forward pointer, rebuilding the
/// spine of the tree above it
fn replace_with_subfs(
    dir: Directory,
    target: &str,
    uri: &str,
    flat: bool,
) -> Result<Directory, EngineError> {
    match target.split_once('/') {
        None => {
            let mut found = false;
            let entries = dir
                .entries
                .into_iter()
                .map(|entry| {
                    if entry.name == target && matches!(entry.node, Node::Directory(_)) {
                        found = true;
                        Entry::subfs(entry.name, SubfsNode::new(uri, flat))
                    } else {
                        entry
                    }
                })
                .collect();
            if !found {
                return Err(EngineError::Validation(format!(
                    "Split target not found in tree: {target}"
                )));
            }
            Ok(Directory::with_entries(entries))
        }
        Some((head, rest)) => {
            let mut found = false;
            let mut entries = Vec::with_capacity(dir.entries.len());
            for entry in dir.entries {
                if entry.name == head {
                    if let Node::Directory(subdir) = entry.node {
                        found = true;
                        let rebuilt = replace_with_subfs(subdir, rest, uri, flat)?;
                        entries.push(Entry::directory(entry.name, rebuilt));
                        continue;
                    }
                    entries.push(entry);
                } else {
                    entries.push(entry);
                }
            }
            if !found {
                return Err(EngineError::Validation(format!(
                    "Split target not found in tree: {head}/{rest}"
                )));
            }
            Ok(Directory::with_entries(entries))
        }
    }
}
