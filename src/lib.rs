//! Read-only browsing of raw FAT12 disk images.
//!
//! The [`fs`] module decodes an image eagerly into an immutable directory
//! tree; [`shell`] drives it from a line-based command loop with `ls` and
//! `cat`.

pub mod error;
pub mod fs;
pub mod shell;

pub use error::FatBrowseError;
