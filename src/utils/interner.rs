//! Global string interner for render-pass names.
//!
//! Pass names are compared and hashed on every `add_mesh`/`meshes_for_pass`
//! call, so they are stored as [`Symbol`]s.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact integer handle for an interned string.
pub type Symbol = Spur;

/// Pass every mesh is bucketed into.
pub const ALL_PASS: &str = "all";

/// Interns `s`, returning the existing symbol if it was seen before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Symbol of an already interned string. Never allocates.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let a = intern("opaque");
        let b = intern("opaque");
        let c = intern("transparent");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(resolve(c), "transparent");
    }

    #[test]
    fn test_get_does_not_intern() {
        assert!(get("never-interned-pass").is_none());
        let sym = intern("never-interned-pass");
        assert_eq!(get("never-interned-pass"), Some(sym));
    }
}
