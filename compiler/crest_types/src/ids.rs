use std::fmt;

/// Handle to an interned type in a [`TypePool`](crate::TypePool).
///
/// Primitives have fixed ids, pre-interned by every pool in this order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    /// Not yet known. Never a final answer for a successfully resolved node.
    pub const UNKNOWN: TypeId = TypeId(0);
    /// Result of a failed resolution; absorbs further errors.
    pub const ERRONEOUS: TypeId = TypeId(1);
    /// Generic placeholder bound by instantiation.
    pub const ANY: TypeId = TypeId(2);
    pub const VOID: TypeId = TypeId(3);
    pub const NOTHING: TypeId = TypeId(4);
    pub const BOOL: TypeId = TypeId(5);
    pub const INT: TypeId = TypeId(6);
    pub const UINT: TypeId = TypeId(7);
    pub const REAL: TypeId = TypeId(8);
    pub const STRING: TypeId = TypeId(9);
    pub const BYTES: TypeId = TypeId(10);
    pub const LOCALE: TypeId = TypeId(11);

    /// Number of pre-interned types.
    pub(crate) const PRIMITIVE_COUNT: u32 = 12;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TypeId::UNKNOWN => write!(f, "TypeId(unknown)"),
            TypeId::ERRONEOUS => write!(f, "TypeId(erroneous)"),
            TypeId::ANY => write!(f, "TypeId(any)"),
            TypeId::INT => write!(f, "TypeId(int)"),
            TypeId::BOOL => write!(f, "TypeId(bool)"),
            TypeId::STRING => write!(f, "TypeId(string)"),
            TypeId::REAL => write!(f, "TypeId(real)"),
            _ => write!(f, "TypeId({})", self.0),
        }
    }
}

/// Handle to an interned [`Signature`](crate::Signature).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct SignatureId(u32);

impl SignatureId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        SignatureId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SignatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureId({})", self.0)
    }
}
