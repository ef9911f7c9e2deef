//! Local storage for a software-update trust repository.
//!
//! A store holds three things: signed metadata documents, target files, and
//! per-role signing keys. Metadata and targets pass through a staging area
//! before a commit promotes them into the published repository that update
//! clients read.
//!
//! # Backends
//!
//! All backends implement the [`LocalStore`] trait:
//!
//! - [`MemoryStore`] -- map-based store for tests and embedding
//! - [`FileSystemStore`] -- durable directory-tree store with the full
//!   commit engine (publish, garbage-collect, reset staging)
//!
//! # Consistent snapshots
//!
//! With consistent snapshots on, targets and most manifests are published
//! under content-addressed names `<hex-hash>.<file-name>` so clients can fetch
//! a self-consistent set while the repository is being updated. See
//! [`hashed`] for the naming scheme and [`plan`] for the publication and
//! retention rules.
//!
//! # Design Rules
//!
//! 1. Metadata bytes are opaque; the store never parses them.
//! 2. Hashes come from the caller and are never recomputed.
//! 3. Paths handed to the store are validated and cannot escape its root.
//! 4. Publication fails fast; garbage collection is best-effort and reported.
//! 5. One writer per store directory. There is no internal file locking.

pub mod config;
pub mod error;
pub mod fanout;
pub mod filesystem;
pub mod hashed;
pub mod keys;
pub mod memory;
pub mod paths;
pub mod plan;
pub mod report;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use fanout::{fan_out_copy, MultiWriter};
pub use filesystem::FileSystemStore;
pub use memory::MemoryStore;
pub use plan::{PublishOp, PublishPlan};
pub use report::{CommitReport, GcFailure};
pub use traits::LocalStore;
