//! Action bit flags shared by org and user planning/execution.
//!
//! Mirrors the Go source's `1 << 0 .. 1 << 3` encoding on `int`: a task can
//! carry any combination of Create/Rename/Move/Delete, and the executor
//! clears bits one at a time as each sub-action succeeds.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bit position for each action within the flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action(u8);

impl Action {
    pub const NONE: Action = Action(0);
    pub const CREATE: Action = Action(1 << 0);
    pub const RENAME: Action = Action(1 << 1);
    pub const MOVE: Action = Action(1 << 2);
    pub const DELETE: Action = Action(1 << 3);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Action) -> bool {
        self.0 & other.0 == other.0
    }

    /// Clear `other`'s bits, returning the new value.
    pub fn clear(self, other: Action) -> Action {
        Action(self.0 & !other.0)
    }

    pub fn insert(&mut self, other: Action) {
        self.0 |= other.0;
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::NONE
    }
}

impl BitOr for Action {
    type Output = Action;
    fn bitor(self, rhs: Action) -> Action {
        Action(self.0 | rhs.0)
    }
}

impl BitOrAssign for Action {
    fn bitor_assign(&mut self, rhs: Action) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "none");
        }
        let mut parts = Vec::new();
        if self.contains(Action::CREATE) {
            parts.push("create");
        }
        if self.contains(Action::RENAME) {
            parts.push("rename");
        }
        if self.contains(Action::MOVE) {
            parts.push("move");
        }
        if self.contains(Action::DELETE) {
            parts.push("delete");
        }
        write!(f, "{}", parts.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_and_clears_bits_independently() {
        let mut a = Action::RENAME | Action::MOVE;
        assert!(a.contains(Action::RENAME));
        assert!(a.contains(Action::MOVE));
        assert!(!a.contains(Action::CREATE));

        a = a.clear(Action::RENAME);
        assert!(!a.contains(Action::RENAME));
        assert!(a.contains(Action::MOVE));
    }

    #[test]
    fn display_lists_set_bits_in_fixed_order() {
        let a = Action::DELETE | Action::CREATE;
        assert_eq!(a.to_string(), "create|delete");
    }

    #[test]
    fn none_is_falsy_for_every_bit() {
        assert!(Action::NONE.is_none());
        assert!(!Action::NONE.contains(Action::CREATE));
    }
}
