/// Undo/redo container over deep-comparable values.
///
/// Setting a value equal to the present one is a no-op, so re-applying an
/// identical edit never adds an undo step. `future` is empty after any set
/// that changed state.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: Vec<T>,
    present: T,
    future: Vec<T>,
    limit: Option<usize>,
}

impl<T> History<T>
where
    T: Clone + PartialEq,
{
    /// Creates an unbounded history.
    #[must_use]
    pub fn new(present: T) -> Self {
        Self {
            past: Vec::new(),
            present,
            future: Vec::new(),
            limit: None,
        }
    }

    /// Bounds the number of undo steps; oldest entries are dropped first.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self.trim_past();
        self
    }

    /// Returns the current value.
    #[must_use]
    pub fn present(&self) -> &T {
        &self.present
    }

    /// Replaces the current value and reports whether state changed.
    pub fn set(&mut self, value: T) -> bool {
        if value == self.present {
            return false;
        }

        let previous = std::mem::replace(&mut self.present, value);
        self.past.push(previous);
        self.future.clear();
        self.trim_past();
        true
    }

    /// Derives the next value from the current one.
    pub fn update(&mut self, updater: impl FnOnce(&T) -> T) -> bool {
        let next = updater(&self.present);
        self.set(next)
    }

    /// Steps back one value; no-op when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop() else {
            return false;
        };

        let current = std::mem::replace(&mut self.present, previous);
        self.future.push(current);
        true
    }

    /// Steps forward one value; no-op when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };

        let current = std::mem::replace(&mut self.present, next);
        self.past.push(current);
        true
    }

    /// Returns whether an undo step exists.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Returns whether a redo step exists.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    fn trim_past(&mut self) {
        if let Some(limit) = self.limit
            && self.past.len() > limit
        {
            let overflow = self.past.len() - limit;
            self.past.drain(..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::History;

    #[test]
    fn equal_value_is_a_no_op() {
        let mut history = History::new(vec![1, 2]);
        assert!(!history.set(vec![1, 2]));
        assert!(!history.can_undo());

        assert!(history.set(vec![1, 2, 3]));
        assert!(!history.set(vec![1, 2, 3]));
        assert!(history.can_undo());
        assert!(history.undo());
        assert!(!history.can_undo());
    }

    #[test]
    fn set_clears_future() {
        let mut history = History::new(0);
        history.set(1);
        history.set(2);
        history.undo();
        assert!(history.can_redo());

        history.set(5);
        assert!(!history.can_redo());
        assert_eq!(*history.present(), 5);
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let mut history = History::new("a");
        assert!(!history.undo());
        assert!(!history.redo());
        assert_eq!(*history.present(), "a");
    }

    #[test]
    fn update_derives_from_present() {
        let mut history = History::new(10);
        assert!(history.update(|value| value + 1));
        assert!(!history.update(|value| *value));
        assert_eq!(*history.present(), 11);
    }

    #[test]
    fn limit_drops_oldest_entries() {
        let mut history = History::new(0).with_limit(2);
        for value in 1..=4 {
            history.set(value);
        }
        assert!(history.undo());
        assert!(history.undo());
        assert!(!history.undo());
        assert_eq!(*history.present(), 2);
    }

    proptest! {
        #[test]
        fn undo_then_redo_is_symmetric(values in proptest::collection::vec(0_u8..8, 0..24)) {
            let mut history = History::new(u8::MAX);
            let mut applied = 0_usize;
            for value in &values {
                if history.set(*value) {
                    applied += 1;
                }
            }
            let last = *history.present();

            for _ in 0..applied {
                prop_assert!(history.undo());
            }
            prop_assert_eq!(*history.present(), u8::MAX);
            prop_assert!(!history.can_undo());

            for _ in 0..applied {
                prop_assert!(history.redo());
            }
            prop_assert_eq!(*history.present(), last);
            prop_assert!(!history.can_redo());
        }
    }
}
