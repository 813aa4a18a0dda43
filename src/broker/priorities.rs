//! Priority levels derived from a queue's max message priority. Grounded on
//! `original_source/src/services/priorities.py::PriorityLevels`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityLevels {
    pub min: u8,
    pub avg: u8,
    pub max: u8,
}

impl PriorityLevels {
    pub fn from_max_priority(max_priority: u8) -> Self {
        let min = 1;
        let avg = (max_priority + min) / 2;
        PriorityLevels {
            min,
            avg,
            max: max_priority,
        }
    }
}

/// The broker's queues are declared with `x-max-priority = 5` (§4.E), so every
/// router lookup is relative to the same `PriorityLevels::from_max_priority(5)`.
pub const MAX_PRIORITY: u8 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_min_avg_max() {
        let levels = PriorityLevels::from_max_priority(MAX_PRIORITY);
        assert_eq!(levels.min, 1);
        assert_eq!(levels.avg, 3);
        assert_eq!(levels.max, 5);
    }
}
