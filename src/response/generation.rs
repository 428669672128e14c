//! Change tracking for handlers whose state feeds cached render output.

/// Mutation counter plus the last committed value.
///
/// A handler is dirty while `current != committed`. Committing never rewinds the counter,
/// so a value read from [`Generation::current`] identifies one state for the handler's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    current: u64,
    committed: u64,
}

impl Default for Generation {
    /// Fresh handlers start dirty: nothing has been rendered for them yet.
    fn default() -> Self {
        Generation {
            current: 1,
            committed: 0,
        }
    }
}

impl Generation {
    pub fn bump(&mut self) {
        self.current = self.current.wrapping_add(1);
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.committed
    }

    pub fn commit(&mut self) {
        self.committed = self.current;
    }
}

#[cfg(test)]
mod tests {
    use super::Generation;

    #[test]
    fn starts_dirty_and_commits() {
        let mut gen = Generation::default();
        assert!(gen.is_dirty());
        gen.commit();
        assert!(!gen.is_dirty());
        let before = gen.current();
        gen.bump();
        assert!(gen.is_dirty());
        assert_eq!(gen.current(), before + 1);
        gen.commit();
        assert!(!gen.is_dirty());
        assert_eq!(gen.current(), before + 1);
    }
}
