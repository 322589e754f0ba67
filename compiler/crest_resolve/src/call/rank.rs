//! Choosing the most specific applicable candidate.

/// Ordering key of an applicable candidate; smaller is more specific.
///
/// Fields compare in declaration order: a concrete candidate beats a
/// generic one, fewer implicit conversions beat more, explicit intents beat
/// the default intent, and a where clause beats its absence.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct RankKey {
    /// Formals that were generic before instantiation.
    pub generic_bindings: usize,
    pub conversions: usize,
    /// Formals passed with the default intent.
    pub loose_intents: usize,
    pub where_absent: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Selection<T> {
    Best(T),
    Ambiguous(Vec<T>),
    None,
}

pub(crate) fn select<T>(applicable: Vec<T>, key: impl Fn(&T) -> RankKey) -> Selection<T> {
    let Some(best) = applicable.iter().map(&key).min() else {
        return Selection::None;
    };
    let mut tied: Vec<T> = applicable.into_iter().filter(|a| key(a) == best).collect();
    if tied.len() > 1 {
        return Selection::Ambiguous(tied);
    }
    tied.pop().map_or(Selection::None, Selection::Best)
}
