//! Siteweave - manifest engine for content-addressed static site hosting
//!
//! Turns an arbitrary set of uploaded files into a directory-tree manifest
//! inside the owner's size-limited record repository, addressing every
//! file's content by a deterministic identifier.
//!
//! ## Write path
//!
//! ```text
//! UploadPipeline (per job)
//!     │
//!     ├── tree:      uploads → directory tree of placeholder leaves
//!     ├── cid:       hash encoded payloads, compare against the
//!     │              previous manifest for reuse
//!     ├── store:     upload changed blobs (bounded concurrency)
//!     ├── patch:     placeholders → committed blob references
//!     ├── split:     extract oversized subtrees into linked records,
//!     │              committed children-first
//!     │
//!     └── JobRegistry: status, phase, and per-file progress streamed
//!                      to subscribers
//! ```
//!
//! ## Read path
//!
//! `subfs::resolve` expands the forward pointers a split left behind,
//! handing the serving layer one logical tree again.
//!
//! ## What lives elsewhere
//!
//! Authentication, the dashboard, hostname routing, and the wire protocol
//! of the blob/record store are all collaborators behind the `store`
//! seams; the engine persists nothing itself.

pub mod blob_map;
pub mod cid;
pub mod config;
pub mod error;
pub mod fs;
pub mod jobs;
pub mod patch;
pub mod split;
pub mod store;
pub mod subfs;
pub mod tree;
pub mod upload;

// Re-exports
pub use blob_map::{extract_blob_map, collect_cids, BlobInfo};
pub use crate::cid::{compute_cid, extract_cid};
pub use config::EngineConfig;
pub use error::EngineError;
pub use fs::{count_files, BlobRef, Directory, Entry, FileNode, Manifest, Node, SubfsNode, SubfsRecord};
pub use jobs::{
    JobEvent, JobProgress, JobRegistry, JobRegistryConfig, JobStatus, JobUpdate, ProgressUpdate,
    SubscriptionGuard, UploadJob, UploadPhase,
};
pub use patch::{patch, FileUploadResult, PatchOutcome};
pub use split::{split_manifest, SplitOutcome};
pub use store::{BlobStore, MemoryRepo, RecordRef, RecordStore};
pub use subfs::{extract_subfs_uris, resolve, SubfsMount};
pub use tree::{build, BuiltTree, UploadedFile};
pub use upload::{PublishOutcome, UploadPipeline, UploadRequest};
