//! # arcview
//!
//! Browse ZIP and RAR archives as if they were directories.
//!
//! This library turns the flat member list of a container into a directory
//! tree scoped to a subpath, the way a file browser shows a folder. RAR
//! containers can be listed through a remote helper service; when that
//! helper is slow, down or wrong, listing falls back to the local decoder.
//!
//! ## Features
//!
//! - ZIP listing through a built-in central directory parser (ZIP64 included)
//! - RAR/CBR listing through the unrar library (`local-rar` feature, on by default)
//! - Synthesized parent directories, breadcrumbs, counts and totals
//! - Optional remote RAR helper with health memoization and local fallback
//! - Full extraction with path traversal protection
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use arcview::{BackendResolver, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let resolver = BackendResolver::new(ResolverConfig::default());
//!
//!     let listing = resolver
//!         .list_contents(Path::new("comics/issue-1.cbr"), "pages")
//!         .await?;
//!     for entry in listing.children() {
//!         println!("{}", entry.name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod format;
pub mod io;
pub mod listing;
#[cfg(feature = "local-rar")]
pub mod rar;
pub mod remote;
pub mod resolver;
pub mod zip;

pub use cli::Cli;
pub use config::ResolverConfig;
pub use entry::{EntryStream, RawEntry};
pub use error::{ArchiveError, ErrorCategory, Result};
pub use format::ContainerFormat;
pub use io::{LocalFileReader, ReadAt};
pub use listing::{Breadcrumb, ListingEntry, ListingResult, list_local};
pub use remote::RemoteHelper;
pub use resolver::{BackendHealth, BackendResolver, ExtractOutcome, rar_decoder_available};
pub use zip::{ZipExtractor, ZipFileEntry};
