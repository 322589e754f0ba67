use std::fmt;

/// Position of a storage in its database.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct IngredientIndex(u32);

impl IngredientIndex {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        IngredientIndex(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for IngredientIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ingredient({})", self.0)
    }
}

/// One memo slot: a storage plus the slot of a key inside it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DatabaseKey {
    pub ingredient: IngredientIndex,
    pub slot: u32,
}

impl DatabaseKey {
    #[inline]
    pub const fn new(ingredient: IngredientIndex, slot: u32) -> Self {
        DatabaseKey { ingredient, slot }
    }
}

impl fmt::Debug for DatabaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.ingredient.0, self.slot)
    }
}
