//! ZIP containers: Central Directory parsing and member extraction.
//!
//! Works on any [`ReadAt`](crate::io::ReadAt) source and understands ZIP64
//! records.
//!
//! - [`structures`]: fixed-layout records (EOCD, ZIP64 locator, member metadata)
//! - [`parser`]: EOCD lookup and the lazy [`CentralDirectory`] iterator that
//!   feeds the listing pipeline
//! - [`extractor`]: member decoding (STORED and DEFLATE) with CRC checks
//!
//! Listing reads only the tail of the file: the EOCD record and the Central
//! Directory it points to. Member data is touched by extraction alone.
//!
//! Encrypted members are detected and refused, multi-disk archives are not
//! supported, and methods other than STORED/DEFLATE fail at extraction time.

mod extractor;
mod parser;
mod structures;

pub use extractor::{ZipExtractor, safe_relative_path};
pub use parser::{CentralDirectory, ZipParser};
pub use structures::*;
