//! Foundation types for tufstore.
//!
//! This crate provides the data types exchanged between a repository manager
//! and the local store. Every other tufstore crate depends on `tufstore-types`.
//! None of these types interpret metadata: manifests stay opaque bytes and
//! hashes stay opaque `(algorithm, value)` pairs computed by the caller.
//!
//! # Key Types
//!
//! - [`HexBytes`] -- Byte string that serializes as lowercase hex
//! - [`Hashes`] -- Hash values of one file, keyed by algorithm name
//! - [`TargetHashes`] -- Repository path to [`Hashes`], the commit-time hash set
//! - [`Key`] -- Signing key material persisted per role
//! - [`manifest`] -- Names of the top-level role manifests

pub mod error;
pub mod hashes;
pub mod hex_bytes;
pub mod key;
pub mod manifest;

pub use error::TypeError;
pub use hashes::{Hashes, MetaMap, TargetHashes};
pub use hex_bytes::HexBytes;
pub use key::{Key, KeyValue};
