//! Cache-gated external data collection.
//!
//! - [`cache`]: [`PayloadCache`] with presence-only semantics, backed by
//!   files ([`FileCache`]) or memory ([`MemoryCache`]).
//! - [`process`]: [`ExternalCollector`] runs a command and returns its stdout.
//! - [`source`]: [`LogSource`] checks the cache before running a collector.

pub mod cache;
pub mod process;
pub mod source;

pub use cache::{CacheError, FileCache, MemoryCache, PayloadCache};
pub use process::{CollectError, DEFAULT_COLLECT_TIMEOUT, ExternalCollector};
pub use source::{LogSource, SourceError};
