//! Keepsake Storage Library
//!
//! This crate provides the `StorageProvider` contract the enrichment pipeline
//! uses to stage asset bytes on local disk, push derived files to the bucket's
//! remote store and remove obsolete copies. Local buckets are their own staging
//! area; S3 buckets are staged through a per-bucket directory under the worker's
//! staging root.
//!
//! # Storage key format
//!
//! Asset paths are relative keys inside a bucket. Keys must not contain `..` or a
//! leading `/`; validation lives in the `keys` module so all backends agree.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signed_url;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_provider, ProviderResolver, StorageFactory};
pub use keepsake_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signed_url::SignedUrlCache;
pub use traits::{StorageError, StorageProvider, StorageResult};
