use std::sync::OnceLock;

/// Statements that depend only on the descriptor's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatementKind {
    SelectAll,
    SelectByKey,
    WhereKey,
    Insert,
    Delete,
    DeleteByKey,
    NextSequentialId,
}

const KINDS: usize = 7;

/// Memoized statement text, one slot per [`StatementKind`].
///
/// Each slot is rendered at most once; concurrent first callers block
/// until the winner stores its text.
#[derive(Debug, Default)]
pub struct StatementCache {
    slots: [OnceLock<String>; KINDS],
}

impl StatementCache {
    pub(crate) fn get_or_render(&self, kind: StatementKind, render: impl FnOnce() -> String) -> &str {
        self.slots[kind as usize].get_or_init(|| {
            tracing::trace!("Caching {:?} statement", kind);
            render()
        })
    }

    #[cfg(test)]
    pub(crate) fn is_cached(&self, kind: StatementKind) -> bool {
        self.slots[kind as usize].get().is_some()
    }
}
