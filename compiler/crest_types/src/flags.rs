//! Pre-computed type metadata flags.
//!
//! Computed once when a type is interned, from its own shape and the flags of
//! the types it contains, so genericity checks never walk the structure.

use bitflags::bitflags;

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u32 {
        // Presence flags: propagate from components.

        /// Contains `any`, a generic domain or an uninstantiated aggregate.
        const IS_GENERIC = 1 << 0;
        /// Contains the erroneous type.
        const HAS_ERROR = 1 << 1;

        // Category flags: describe the outermost constructor only.

        const IS_PRIMITIVE = 1 << 8;
        const IS_NUMERIC = 1 << 9;
        const IS_ARRAY = 1 << 10;
        const IS_DOMAIN = 1 << 11;
        const IS_AGGREGATE = 1 << 12;
        const IS_TUPLE = 1 << 13;
        const IS_RANGE = 1 << 14;
    }
}

impl TypeFlags {
    /// Flags inherited by a type that contains a component with these flags.
    pub const PROPAGATE_MASK: TypeFlags =
        TypeFlags::IS_GENERIC.union(TypeFlags::HAS_ERROR);

    #[inline]
    pub fn propagated(self) -> TypeFlags {
        self.intersection(Self::PROPAGATE_MASK)
    }
}
