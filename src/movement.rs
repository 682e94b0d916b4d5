use crate::NUM_DIRECTIONS;

/*----------------------------------------------------------------------------
Direction enum
----------------------------------------------------------------------------*/

/// Movement direction categories, in counter order.
///
/// `None` records a track that retired without clearing the travel threshold
/// on either axis: an object that appeared and vanished in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Left = 0,
    Right = 1,
    Up = 2,
    Down = 3,
    None = 4,
}

impl Direction {
    pub const ALL: [Direction; NUM_DIRECTIONS] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
        Direction::None,
    ];

    /// Position of this direction in the counter array.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The direction seen by a sensor mounted the other way up.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::None => Direction::None,
        }
    }
}

/*----------------------------------------------------------------------------
MovementCounts
----------------------------------------------------------------------------*/

/// Totals of detected movements per direction, with a dirty flag that is set
/// on every increment and cleared when the counts are read out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementCounts {
    counts: [u64; NUM_DIRECTIONS],
    changed_since_last_check: bool,
}

impl MovementCounts {
    pub fn new() -> Self {
        Self {
            counts: [0; NUM_DIRECTIONS],
            changed_since_last_check: false,
        }
    }

    pub fn record(&mut self, direction: Direction) {
        self.counts[direction.index()] += 1;
        self.changed_since_last_check = true;
    }

    /// Copy out all counters and clear the dirty flag. The counters
    /// themselves are preserved.
    pub fn snapshot(&mut self) -> [u64; NUM_DIRECTIONS] {
        self.changed_since_last_check = false;
        self.counts
    }

    /// Read a single counter without touching the dirty flag.
    pub fn get(&self, direction: Direction) -> u64 {
        self.counts[direction.index()]
    }

    pub fn has_new(&self) -> bool {
        self.changed_since_last_check
    }

    /// Zero all counters. The dirty flag is left as-is; only reading clears it.
    pub fn reset(&mut self) {
        self.counts = [0; NUM_DIRECTIONS];
    }
}

impl Default for MovementCounts {
    fn default() -> Self {
        Self::new()
    }
}
