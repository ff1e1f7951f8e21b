// Process identifier allocation

use std::collections::HashSet;
use std::ops::RangeInclusive;
use uuid::Uuid;

use super::ProcessId;
use crate::error::ProcessError;

/// Draw a uniformly random id from `range` that is not in `existing`.
///
/// Fails up front when the namespace is already full instead of looping forever.
pub fn allocate(
    existing: &HashSet<ProcessId>,
    range: RangeInclusive<ProcessId>,
) -> Result<ProcessId, ProcessError> {
    let (min, max) = (*range.start(), *range.end());
    let span = if max >= min {
        u64::from(max - min) + 1
    } else {
        0
    };

    if existing.len() as u64 >= span {
        return Err(ProcessError::CapacityExceeded {
            limit: span as usize,
        });
    }

    loop {
        let candidate = min + random_below(span) as ProcessId;
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
    }
}

/// Random value in `0..bound`, taken from a v4 UUID's random bits
fn random_below(bound: u64) -> u64 {
    (Uuid::new_v4().as_u128() % u128::from(bound)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_within_range() {
        let existing = HashSet::new();
        for _ in 0..200 {
            let id = allocate(&existing, 1000..=9999).unwrap();
            assert!((1000..=9999).contains(&id));
        }
    }

    #[test]
    fn test_allocate_avoids_existing() {
        let existing: HashSet<ProcessId> = (1..=9).collect();
        for _ in 0..50 {
            assert_eq!(allocate(&existing, 1..=10).unwrap(), 10);
        }
    }

    #[test]
    fn test_allocate_capacity_exceeded() {
        let existing: HashSet<ProcessId> = (1..=10).collect();
        match allocate(&existing, 1..=10) {
            Err(ProcessError::CapacityExceeded { limit }) => assert_eq!(limit, 10),
            other => panic!("expected CapacityExceeded, got {:?}", other),
        }
    }

    #[test]
    fn test_allocate_single_slot_range() {
        assert_eq!(allocate(&HashSet::new(), 42..=42).unwrap(), 42);
    }

    #[test]
    fn test_empty_range_is_full() {
        #[allow(clippy::reversed_empty_ranges)]
        let range = 10..=1;
        assert!(matches!(
            allocate(&HashSet::new(), range),
            Err(ProcessError::CapacityExceeded { limit: 0 })
        ));
    }
}
