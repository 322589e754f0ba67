//! String interner for identifiers and string literals.
//!
//! Interned text is leaked so lookups hand out `&'static str` without holding
//! the lock. Lookups take a read lock; only first-time interning takes the
//! write lock.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::name::WELL_KNOWN;
use crate::Name;

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// More than `u32::MAX` distinct strings.
    Overflow { count: usize },
}

impl fmt::Display for InternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternError::Overflow { count } => {
                write!(f, "string interner overflow: {count} strings exceeds u32::MAX")
            }
        }
    }
}

impl std::error::Error for InternError {}

#[derive(Default)]
struct InternTable {
    map: FxHashMap<&'static str, Name>,
    strings: Vec<&'static str>,
}

impl InternTable {
    fn insert_leaked(&mut self, text: &'static str) -> Result<Name, InternError> {
        let raw = u32::try_from(self.strings.len()).map_err(|_| InternError::Overflow {
            count: self.strings.len(),
        })?;
        let name = Name::from_raw(raw);
        self.strings.push(text);
        self.map.insert(text, name);
        Ok(name)
    }
}

/// Thread-safe string interner.
///
/// The [well-known names](Name::THIS) are interned at construction in a fixed
/// order, so their constants are valid for every interner.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create an interner holding only the well-known names.
    pub fn new() -> Self {
        let mut table = InternTable::default();
        for &text in WELL_KNOWN {
            // WELL_KNOWN is a short static table; it cannot overflow.
            let _ = table.insert_leaked(text);
        }
        StringInterner {
            table: RwLock::new(table),
        }
    }

    /// Intern `text`, returning the existing name if it was seen before.
    pub fn try_intern(&self, text: &str) -> Result<Name, InternError> {
        if let Some(&name) = self.table.read().map.get(text) {
            return Ok(name);
        }

        let mut table = self.table.write();
        // Another thread may have won the race between the two locks.
        if let Some(&name) = table.map.get(text) {
            return Ok(name);
        }
        let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
        table.insert_leaked(leaked)
    }

    /// Intern `text`.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` distinct strings are interned.
    pub fn intern(&self, text: &str) -> Name {
        self.try_intern(text).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Text of an interned name. Unknown names render as the empty string.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table
            .read()
            .strings
            .get(name.index())
            .copied()
            .unwrap_or("")
    }

    /// Look up a name without interning it.
    pub fn get(&self, text: &str) -> Option<Name> {
        self.table.read().map.get(text).copied()
    }

    /// Number of interned strings, well-known names included.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Always false: the well-known names are present from construction.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringInterner")
            .field("len", &self.len())
            .finish()
    }
}

/// Cheaply clonable handle to a shared interner.
#[derive(Clone, Debug, Default)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &StringInterner {
        &self.0
    }
}
