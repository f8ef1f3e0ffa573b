//! FAT12 on-disk format decoding and the in-memory directory tree.

pub mod bpb;
pub mod entry;
pub mod table;
pub mod tree;
pub mod volume;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::FatBrowseError;

pub use tree::{Node, NodeId, NodeKind, Tree, ROOT};
pub use volume::{Fat12Volume, ListingBlock, ListingEntry};

/// Open a disk image file and eagerly decode it as a FAT12 volume.
pub fn open_image(path: &Path) -> Result<Fat12Volume, FatBrowseError> {
    let file = File::open(path)?;
    Fat12Volume::load(BufReader::new(file))
}
