use std::fmt;
use crate::cache::Line;

/// Logical clock value used for recency, one clock per set
pub type Timestamp = u32;

/// Raised when a set's logical clock can't be advanced any further
///
/// There is no wraparound handling, the caller is expected to treat this as fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyOverflow;

impl fmt::Display for RecencyOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recency counter reached {}", Timestamp::MAX)
    }
}

/// Least recently used bookkeeping for a single set
///
/// Each way keeps the time it was last used, and the set keeps a logical clock which is advanced
/// on every hit or insertion. The way holding the largest timestamp is the most recently used
#[derive(Debug, Clone)]
pub struct ReplacementTracker {
    last_used_times: Vec<Timestamp>,
    // Largest timestamp handed out in this set
    time: Timestamp,
}

impl ReplacementTracker {
    pub fn new(ways: usize) -> Self {
        Self {
            last_used_times: vec![0; ways],
            time: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn starting_at(ways: usize, time: Timestamp) -> Self {
        Self {
            last_used_times: vec![0; ways],
            time,
        }
    }

    /// Marks a way as the most recently used in its set
    ///
    /// # Arguments
    ///
    /// * `way`: The way which was hit or filled
    ///
    /// returns: Result<(), RecencyOverflow>
    pub fn touch(&mut self, way: usize) -> Result<(), RecencyOverflow> {
        self.time = self.time.checked_add(1).ok_or(RecencyOverflow)?;
        self.last_used_times[way] = self.time;
        Ok(())
    }

    /// Chooses the way to replace in a set
    ///
    /// Ways are scanned in order. The first invalid way is returned straight away, otherwise the
    /// way with the smallest timestamp wins, ties going to the lowest way
    ///
    /// # Arguments
    ///
    /// * `lines`: The lines of the set, indexed by way
    ///
    /// returns: usize
    pub fn victim(&self, lines: &[Line]) -> usize {
        let mut min_value = Timestamp::MAX;
        let mut min_index = 0;
        for (way, line) in lines.iter().enumerate() {
            if !line.is_valid() {
                return way;
            }
            if self.last_used_times[way] < min_value {
                min_value = self.last_used_times[way];
                min_index = way;
            }
        }
        min_index
    }

    /// The last use time of a way
    pub fn last_used(&self, way: usize) -> Timestamp {
        self.last_used_times[way]
    }

    /// The most recent timestamp handed out in this set
    pub fn time(&self) -> Timestamp {
        self.time
    }

    pub fn reset(&mut self) {
        self.last_used_times.iter_mut().for_each(|t| *t = 0);
        self.time = 0;
    }
}
