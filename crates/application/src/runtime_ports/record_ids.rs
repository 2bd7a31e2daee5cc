use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of ids for records created by actions.
pub trait RecordIdGenerator: Send + Sync {
    /// Returns a fresh record id.
    fn next_id(&self) -> String;
}

/// Random v4 uuid ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRecordIdGenerator;

impl RecordIdGenerator for UuidRecordIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Monotonic counter ids starting at 1.
#[derive(Debug, Default)]
pub struct SequentialRecordIdGenerator {
    last: AtomicU64,
}

impl SequentialRecordIdGenerator {
    /// Creates a generator whose first id is `start + 1`.
    #[must_use]
    pub fn starting_after(start: u64) -> Self {
        Self {
            last: AtomicU64::new(start),
        }
    }
}

impl RecordIdGenerator for SequentialRecordIdGenerator {
    fn next_id(&self) -> String {
        (self.last.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{RecordIdGenerator, SequentialRecordIdGenerator, UuidRecordIdGenerator};

    #[test]
    fn sequential_ids_are_monotonic() {
        let generator = SequentialRecordIdGenerator::default();
        assert_eq!(generator.next_id(), "1");
        assert_eq!(generator.next_id(), "2");

        let offset = SequentialRecordIdGenerator::starting_after(41);
        assert_eq!(offset.next_id(), "42");
    }

    #[test]
    fn uuid_ids_do_not_repeat() {
        let generator = UuidRecordIdGenerator;
        let ids: HashSet<String> = (0..64).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 64);
    }
}
