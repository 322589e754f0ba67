//! Interned identifier handle.

use std::fmt;

/// Interned string identifier.
///
/// A dense index into a [`StringInterner`](crate::StringInterner). Two names
/// from the same interner are equal iff their text is equal.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Create from a raw index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Get the raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into the interner's string table.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Declares the names every interner pre-interns, at fixed indices.
macro_rules! well_known_names {
    ($($konst:ident => $text:literal,)*) => {
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[repr(u32)]
        enum WellKnownIndex { $($konst,)* }

        impl Name {
            $(
                #[doc = concat!("Pre-interned `", $text, "`.")]
                pub const $konst: Name = Name(WellKnownIndex::$konst as u32);
            )*
        }

        /// Text of the pre-interned names, in index order.
        pub(crate) const WELL_KNOWN: &[&str] = &[$($text,)*];
    };
}

well_known_names! {
    EMPTY => "",
    THIS => "this",
    INIT => "init",
    INT => "int",
    UINT => "uint",
    REAL => "real",
    BOOL => "bool",
    STRING => "string",
    BYTES => "bytes",
    NOTHING => "nothing",
    VOID => "void",
    LOCALE => "locale",
    RANGE => "range",
    DOMAIN => "domain",
    TYPE => "type",
    SIZE => "size",
    ELT_TYPE => "eltType",
    RANK => "rank",
    IDX_TYPE => "idxType",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_indices_are_dense() {
        assert_eq!(Name::EMPTY.raw(), 0);
        assert_eq!(Name::THIS.raw(), 1);
        assert_eq!(WELL_KNOWN[Name::IDX_TYPE.index()], "idxType");
        assert_eq!(WELL_KNOWN.len(), Name::IDX_TYPE.index() + 1);
    }

    #[test]
    fn names_order_by_index() {
        assert!(Name::from_raw(3) < Name::from_raw(9));
        assert_eq!(Name::default(), Name::EMPTY);
    }
}
