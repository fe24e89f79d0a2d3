//! Append-only version history for simulations and test harnesses
//!
//! Records immutable snapshots of a value (typically a [`crate::TwammPool`])
//! with a cursor. Undo and redo move the cursor; recording after an undo
//! discards the redo tail. Production code never rolls back; previews use
//! [`crate::TwammPool::project`] instead.

#[derive(Debug, Clone)]
pub struct VersionHistory<T: Clone> {
    versions: Vec<T>,
    cursor: usize,
}

impl<T: Clone> VersionHistory<T> {
    pub fn new(initial: T) -> Self {
        Self {
            versions: vec![initial],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &T {
        &self.versions[self.cursor]
    }

    /// Append a new version after the cursor, dropping anything undone
    pub fn record(&mut self, version: T) {
        self.versions.truncate(self.cursor + 1);
        self.versions.push(version);
        self.cursor += 1;
    }

    /// Apply `op` to a copy of the current version and record it on success
    pub fn apply<R, E>(&mut self, op: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E> {
        let mut next = self.current().clone();
        let out = op(&mut next)?;
        self.record(next);
        Ok(out)
    }

    pub fn undo(&mut self) -> Option<&T> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<&T> {
        if self.cursor + 1 >= self.versions.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    /// Number of recorded versions, including the initial one
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn position(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_and_truncation() {
        let mut history = VersionHistory::new(0u32);
        history.record(1);
        history.record(2);

        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), Some(&0));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(&1));

        history.record(7);
        assert_eq!(history.len(), 3);
        assert_eq!(history.redo(), None);
        assert_eq!(*history.current(), 7);
    }

    #[test]
    fn test_apply_records_only_on_success() {
        let mut history = VersionHistory::new(vec![1u8]);
        let failed: Result<(), &str> = history.apply(|v| {
            v.push(2);
            Err("rejected")
        });
        assert!(failed.is_err());
        assert_eq!(history.len(), 1);

        history
            .apply(|v| {
                v.push(3);
                Ok::<_, ()>(())
            })
            .unwrap();
        assert_eq!(history.current(), &vec![1, 3]);
        assert_eq!(history.position(), 1);
    }
}
