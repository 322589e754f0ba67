//! Bindings of generic declarations to concrete qualified types.

use crest_ir::NodeId;
use smallvec::SmallVec;

use crate::QualifiedType;

/// Ordered map from a generic declaration (formal, field or type query) to
/// the qualified type bound to it.
///
/// Entries are kept sorted by declaration id, so two substitutions with the
/// same bindings compare and hash equal regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Substitution {
    entries: SmallVec<[(NodeId, QualifiedType); 4]>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bind `decl`, replacing an existing binding.
    pub fn insert(&mut self, decl: NodeId, qt: QualifiedType) {
        match self.entries.binary_search_by_key(&decl, |(d, _)| *d) {
            Ok(pos) => self.entries[pos].1 = qt,
            Err(pos) => self.entries.insert(pos, (decl, qt)),
        }
    }

    pub fn get(&self, decl: NodeId) -> Option<QualifiedType> {
        self.entries
            .binary_search_by_key(&decl, |(d, _)| *d)
            .ok()
            .map(|pos| self.entries[pos].1)
    }

    pub fn contains(&self, decl: NodeId) -> bool {
        self.get(decl).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, QualifiedType)> + '_ {
        self.entries.iter().copied()
    }

    /// `self` overlaid with `other`; bindings in `other` win.
    #[must_use]
    pub fn merged(&self, other: &Substitution) -> Substitution {
        let mut out = self.clone();
        for (decl, qt) in other.iter() {
            out.insert(decl, qt);
        }
        out
    }

    /// Keep only bindings for which `keep` holds.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(NodeId) -> bool) -> Substitution {
        Substitution {
            entries: self.entries.iter().copied().filter(|(d, _)| keep(*d)).collect(),
        }
    }
}

impl FromIterator<(NodeId, QualifiedType)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (NodeId, QualifiedType)>>(iter: I) -> Self {
        let mut subs = Substitution::empty();
        for (decl, qt) in iter {
            subs.insert(decl, qt);
        }
        subs
    }
}
