//! Global string interner
//!
//! Marker names and node names are compared every frame. Interning turns them
//! into compact [`Symbol`]s that compare and hash as integers.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Interned string identifier.
pub type Symbol = Spur;

/// Interns a string, returning the existing symbol if it was seen before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up a symbol without allocating.
///
/// `None` means the string was never interned, so nothing can match it.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}
