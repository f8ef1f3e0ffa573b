use std::io::{self, Read};

use log::{debug, warn};

use crate::error::FatBrowseError;
use crate::fs::bpb::{BiosParamBlock, BOOT_SECTOR_SIZE};
use crate::fs::entry::{DirEntry, DIR_ENTRY_SIZE};
use crate::fs::table::{FatTable, BAD_CLUSTER};
use crate::fs::tree::{is_alias, NodeId, NodeKind, Tree, ROOT};

/// An eagerly decoded FAT12 volume.
///
/// [`Fat12Volume::load`] consumes the whole image once; every query
/// afterward is a read-only traversal of the tree built at load time.
#[derive(Debug)]
pub struct Fat12Volume {
    bpb: BiosParamBlock,
    table: FatTable,
    /// Data region as whole sectors; cluster N starts at byte
    /// (N - 2) * cluster size.
    data: Vec<u8>,
    tree: Tree,
}

/// One directory's slice of a recursive listing.
#[derive(Debug)]
pub struct ListingBlock {
    /// Display path of the directory, '/'-terminated.
    pub path: String,
    /// Long-format detail for the directory itself:
    /// "<directories> <files>", aliases excluded.
    pub detail: Option<String>,
    pub entries: Vec<ListingEntry>,
}

/// One child line within a [`ListingBlock`].
#[derive(Debug)]
pub struct ListingEntry {
    pub name: String,
    pub is_directory: bool,
    /// True for the "." / ".." navigational aliases.
    pub is_alias: bool,
    /// Long-format detail: declared size for files, immediate child
    /// counts for directories, absent for aliases.
    pub detail: Option<String>,
}

impl Fat12Volume {
    /// Decode a whole FAT12 image: boot sector, FAT copies, root directory
    /// and data region in order, then the directory tree.
    ///
    /// Fails with a typed error on a truncated or inconsistent image and
    /// leaves nothing half-built; the process is never terminated from
    /// here.
    pub fn load<R: Read>(mut reader: R) -> Result<Self, FatBrowseError> {
        let mut boot = [0u8; BOOT_SECTOR_SIZE];
        reader
            .read_exact(&mut boot)
            .map_err(|e| FatBrowseError::CorruptImage(format!("cannot read boot sector: {e}")))?;
        let bpb = BiosParamBlock::parse(&boot)?;

        // Only the first FAT copy is used; the rest are redundant and
        // consumed to keep the stream positioned.
        let fat_bytes = bpb.fat_bytes();
        let mut fat_raw = Vec::new();
        for copy in 0..bpb.fat_copies {
            let mut buf = vec![0u8; fat_bytes];
            reader.read_exact(&mut buf).map_err(|e| {
                FatBrowseError::CorruptImage(format!("FAT copy {copy} is truncated: {e}"))
            })?;
            if copy == 0 {
                fat_raw = buf;
            }
        }
        let table = FatTable::parse(&fat_raw);

        // Fixed root directory table, padded out to a sector boundary.
        let root_bytes = bpb.root_dir_bytes();
        let mut root_raw = vec![0u8; root_bytes];
        reader.read_exact(&mut root_raw).map_err(|e| {
            FatBrowseError::CorruptImage(format!("root directory is truncated: {e}"))
        })?;
        let sector = bpb.bytes_per_sector as usize;
        let padding = (sector - root_bytes % sector) % sector;
        let skipped = io::copy(&mut reader.by_ref().take(padding as u64), &mut io::sink())?;
        if skipped != padding as u64 {
            return Err(FatBrowseError::CorruptImage(
                "image ends inside the root directory padding".into(),
            ));
        }

        // Whole remaining sectors up to the declared total form the data
        // region.
        let consumed =
            BOOT_SECTOR_SIZE + fat_bytes * bpb.fat_copies as usize + root_bytes + padding;
        let total_bytes = bpb.total_sectors as usize * sector;
        let data_sectors = total_bytes.saturating_sub(consumed) / sector;
        let mut data = vec![0u8; data_sectors * sector];
        reader.read_exact(&mut data).map_err(|e| {
            FatBrowseError::CorruptImage(format!("data region is truncated: {e}"))
        })?;

        debug!(
            "FAT12 volume: {} sectors of {} bytes, {} FAT entries, {} data sectors",
            bpb.total_sectors,
            bpb.bytes_per_sector,
            table.len(),
            data_sectors
        );

        let mut volume = Self {
            bpb,
            table,
            data,
            tree: Tree::new(),
        };
        let mut tree = Tree::new();
        volume.build_directory(&mut tree, ROOT, &root_raw)?;
        debug!("directory tree built: {} nodes", tree.len());
        volume.tree = tree;
        Ok(volume)
    }

    /// The decoded directory tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Concatenate the data clusters of the chain starting at `start`.
    ///
    /// The walk ends normally on an end-of-chain marker (>= 0x0FF8); the
    /// bad-cluster marker 0x0FF7 is a [`FatBrowseError::BadCluster`].
    /// Chains that leave the data region or outlive the cluster count are
    /// `CorruptImage`.
    pub fn read_chain(&self, start: u16) -> Result<Vec<u8>, FatBrowseError> {
        let mut content = Vec::new();
        let mut cluster = start;
        let mut hops = 0usize;
        while cluster < BAD_CLUSTER {
            let slice = self.cluster_data(cluster).ok_or_else(|| {
                FatBrowseError::CorruptImage(format!(
                    "cluster {cluster} is outside the data region"
                ))
            })?;
            content.extend_from_slice(slice);
            hops += 1;
            if hops > self.table.len() {
                return Err(FatBrowseError::CorruptImage(format!(
                    "cluster chain starting at {start} does not terminate"
                )));
            }
            cluster = self.table.entry(cluster).ok_or_else(|| {
                FatBrowseError::CorruptImage(format!("cluster {cluster} has no FAT entry"))
            })?;
        }
        if cluster == BAD_CLUSTER {
            return Err(FatBrowseError::BadCluster(start));
        }
        Ok(content)
    }

    /// Data slice for `cluster`, or `None` when it falls outside the
    /// region (including the reserved clusters 0 and 1).
    fn cluster_data(&self, cluster: u16) -> Option<&[u8]> {
        let size = self.bpb.bytes_per_sector as usize;
        let index = (cluster as usize).checked_sub(2)?;
        let start = index * size;
        let end = start + size;
        if end > self.data.len() {
            return None;
        }
        Some(&self.data[start..end])
    }

    /// Recursively materialize `records` (a run of raw 32-byte directory
    /// slots) under `parent`.
    fn build_directory(
        &self,
        tree: &mut Tree,
        parent: NodeId,
        records: &[u8],
    ) -> Result<(), FatBrowseError> {
        for record in records.chunks_exact(DIR_ENTRY_SIZE) {
            let entry = DirEntry::parse(record);
            if !entry.is_valid() || is_alias(&entry.name) {
                continue;
            }
            let content = self.read_chain(entry.start_cluster)?;
            if entry.is_directory() {
                let dir = tree.add_directory(parent, &entry.name);
                self.build_directory(tree, dir, &content)?;
            } else {
                if entry.size as usize > content.len() {
                    warn!(
                        "file {} declares {} bytes but its chain holds {}",
                        entry.name,
                        entry.size,
                        content.len()
                    );
                }
                tree.add_file(parent, &entry.name, &entry.ext, entry.size, content);
            }
        }
        Ok(())
    }

    /// Walk a '/'-separated path to a directory node. Empty components
    /// are skipped; "." and ".." resolve through the aliases.
    pub fn resolve_directory(&self, path: &str) -> Result<NodeId, FatBrowseError> {
        let mut current = ROOT;
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = self
                .tree
                .sub_dir(current, step)
                .ok_or_else(|| FatBrowseError::DirectoryNotFound(path.to_string()))?;
        }
        Ok(current)
    }

    /// Resolve a path whose final component must name a file.
    ///
    /// A missing intermediate directory is `DirectoryNotFound`; a final
    /// component that is absent or a directory is `FileNotFound`.
    pub fn resolve_file(&self, path: &str) -> Result<NodeId, FatBrowseError> {
        let mut steps: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let file_name = steps
            .pop()
            .ok_or_else(|| FatBrowseError::FileNotFound(path.to_string()))?;
        let mut current = ROOT;
        for step in steps {
            current = self
                .tree
                .sub_dir(current, step)
                .ok_or_else(|| FatBrowseError::DirectoryNotFound(path.to_string()))?;
        }
        self.tree
            .sub_file(current, file_name)
            .ok_or_else(|| FatBrowseError::FileNotFound(path.to_string()))
    }

    /// Depth-first listing of the whole subtree rooted at `dir`.
    ///
    /// `path` is the display path of `dir` and should be '/'-terminated;
    /// one block is produced per directory, aliases listed but never
    /// descended into.
    pub fn listing(&self, dir: NodeId, path: &str, long_format: bool) -> Vec<ListingBlock> {
        let mut blocks = Vec::new();
        self.collect_listing(dir, path.to_string(), long_format, &mut blocks);
        blocks
    }

    fn collect_listing(
        &self,
        dir: NodeId,
        path: String,
        long_format: bool,
        out: &mut Vec<ListingBlock>,
    ) {
        let mut entries = Vec::new();
        for (key, id) in self.tree.children(dir) {
            let node = self.tree.node(id);
            let alias = is_alias(key);
            entries.push(ListingEntry {
                name: if alias {
                    key.to_string()
                } else {
                    node.display_name()
                },
                is_directory: node.is_directory(),
                is_alias: alias,
                detail: if long_format && !alias {
                    Some(self.node_detail(id))
                } else {
                    None
                },
            });
        }
        out.push(ListingBlock {
            path: path.clone(),
            detail: long_format.then(|| self.node_detail(dir)),
            entries,
        });

        for (key, id) in self.tree.children(dir) {
            if is_alias(key) || !self.tree.node(id).is_directory() {
                continue;
            }
            let child_path = format!("{path}{}/", self.tree.node(id).name);
            self.collect_listing(id, child_path, long_format, out);
        }
    }

    fn node_detail(&self, id: NodeId) -> String {
        match &self.tree.node(id).kind {
            NodeKind::File { size, .. } => size.to_string(),
            NodeKind::Directory { .. } => {
                let (dirs, files) = self.tree.count_children(id);
                format!("{dirs} {files}")
            }
        }
    }

    /// File content up to (excluding) the first zero byte; the whole
    /// buffer when there is none.
    ///
    /// The declared size is ignored, so binary content with embedded
    /// zeros comes back truncated.
    pub fn contents(&self, file: NodeId) -> &[u8] {
        match &self.tree.node(file).kind {
            NodeKind::File { content, .. } => {
                let end = content.iter().position(|&b| b == 0).unwrap_or(content.len());
                &content[..end]
            }
            NodeKind::Directory { .. } => &[],
        }
    }
}
