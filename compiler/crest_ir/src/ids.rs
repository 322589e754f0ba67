//! File and node identities.

use std::fmt;

/// Identity of one parsed file.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct FileId(u32);

impl FileId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        FileId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

/// Stable identity of an AST node: its file plus its postorder position.
///
/// Ordering is file first, then postorder index, so sorting node ids within
/// one file yields postorder.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId {
    pub file: FileId,
    pub index: u32,
}

impl NodeId {
    #[inline]
    pub const fn new(file: FileId, index: u32) -> Self {
        NodeId { file, index }
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.file.0, self.index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
