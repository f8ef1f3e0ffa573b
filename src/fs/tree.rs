use std::collections::BTreeMap;

use crate::fs::entry::join_name;

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

/// The root directory's id. Always present.
pub const ROOT: NodeId = NodeId(0);

/// A directory or file in the decoded volume.
#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
}

#[derive(Debug)]
pub enum NodeKind {
    Directory {
        /// Children keyed by display name (`name.ext` for files, bare name
        /// for directories). Non-root directories also map "." to
        /// themselves and ".." to their parent; those keys are
        /// navigational aliases, not owned children.
        children: BTreeMap<String, NodeId>,
    },
    File {
        ext: String,
        /// Size declared in the directory record.
        size: u32,
        /// Full cluster-chain content. Always a whole number of clusters,
        /// so it may run past the declared size.
        content: Vec<u8>,
    },
}

impl Node {
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// Display name: `name.ext` for files with an extension, the bare
    /// name otherwise.
    pub fn display_name(&self) -> String {
        match &self.kind {
            NodeKind::File { ext, .. } => join_name(&self.name, ext),
            NodeKind::Directory { .. } => self.name.clone(),
        }
    }
}

/// True for the "." / ".." navigational aliases.
pub fn is_alias(name: &str) -> bool {
    name == "." || name == ".."
}

/// Arena-stored directory tree.
///
/// Nodes refer to each other through `NodeId` indices; the arena owns every
/// node exactly once, so the "." / ".." back-references cannot form an
/// ownership cycle. The tree is immutable once the volume is built.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// A tree holding only the root directory. The root carries no
    /// "." / ".." entries.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "root".into(),
                kind: NodeKind::Directory {
                    children: BTreeMap::new(),
                },
            }],
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add an empty directory under `parent`, wiring its "." / ".."
    /// aliases to itself and to `parent`.
    pub fn add_directory(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut children = BTreeMap::new();
        children.insert(".".to_string(), id);
        children.insert("..".to_string(), parent);
        self.nodes.push(Node {
            name: name.to_string(),
            kind: NodeKind::Directory { children },
        });
        self.link(parent, name.to_string(), id);
        id
    }

    /// Add a file under `parent`, keyed by its display name.
    pub fn add_file(
        &mut self,
        parent: NodeId,
        name: &str,
        ext: &str,
        size: u32,
        content: Vec<u8>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let key = join_name(name, ext);
        self.nodes.push(Node {
            name: name.to_string(),
            kind: NodeKind::File {
                ext: ext.to_string(),
                size,
                content,
            },
        });
        self.link(parent, key, id);
        id
    }

    fn link(&mut self, parent: NodeId, key: String, id: NodeId) {
        debug_assert!(self.nodes[parent.0].is_directory());
        if let NodeKind::Directory { children } = &mut self.nodes[parent.0].kind {
            children.insert(key, id);
        }
    }

    /// Children of `dir` in key order, aliases included. Empty for files.
    pub fn children(&self, dir: NodeId) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        let map = match &self.node(dir).kind {
            NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        };
        map.into_iter().flatten().map(|(key, id)| (key.as_str(), *id))
    }

    /// Child of `dir` under `name`, if any.
    pub fn child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        match &self.node(dir).kind {
            NodeKind::Directory { children } => children.get(name).copied(),
            NodeKind::File { .. } => None,
        }
    }

    /// Resolve `name` to a child that is a directory. Aliases resolve
    /// like any other child.
    pub fn sub_dir(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.child(dir, name)
            .filter(|&id| self.node(id).is_directory())
    }

    /// Resolve `name` to a child that is a file.
    pub fn sub_file(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.child(dir, name).filter(|&id| self.node(id).is_file())
    }

    /// Immediate (directory, file) counts under `dir`, excluding the
    /// "." / ".." aliases.
    pub fn count_children(&self, dir: NodeId) -> (u32, u32) {
        let mut dirs = 0;
        let mut files = 0;
        for (name, id) in self.children(dir) {
            if is_alias(name) {
                continue;
            }
            if self.node(id).is_directory() {
                dirs += 1;
            } else {
                files += 1;
            }
        }
        (dirs, files)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
