//! Debug-only reentrancy check.
//!
//! `ChainTable` runs caller-supplied `Hash`/`Eq` code while scanning
//! chains. A hasher or equality impl that re-enters the same table through
//! a stashed shared reference would observe a half-edited structure.
//! Debug builds fail fast on such nesting; release builds compile the
//! check to nothing.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table reentry flag. Entry points take `let _g = self.reentrancy.enter();`.
#[derive(Debug, Default)]
pub(crate) struct ReentryCheck {
    #[cfg(debug_assertions)]
    entered: Cell<bool>,
    // Keep !Sync (but Send) in both profiles, not just when the debug
    // flag field exists.
    _not_sync: PhantomData<Cell<bool>>,
}

impl ReentryCheck {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            entered: Cell::new(false),
            _not_sync: PhantomData,
        }
    }

    /// Flag the table as entered until the returned guard drops.
    ///
    /// The table never legitimately nests its own operations, so a plain
    /// boolean suffices; in debug builds a second `enter` panics.
    #[inline]
    pub(crate) fn enter(&self) -> Entered<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.entered.replace(true),
                "reentrancy detected: table operation started inside another"
            );
            return Entered { check: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return Entered { _check: PhantomData };
        }
    }
}

/// RAII guard clearing the reentry flag.
pub(crate) struct Entered<'a> {
    #[cfg(debug_assertions)]
    check: &'a ReentryCheck,
    #[cfg(not(debug_assertions))]
    _check: PhantomData<&'a ReentryCheck>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.check.entered.set(false);
    }
}
