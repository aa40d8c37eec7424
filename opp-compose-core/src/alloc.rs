//! Run number allocation.
//!
//! Container names are derived from run numbers: for a range of runs
//! `[first, last]` and a base name `sim-r`, the fleet consists of
//! `sim-r<first>` through `sim-r<last>`. The allocator is the single
//! source of that mapping, so creation and naming can never drift apart.

/// Inclusive range of run numbers a fleet operates on.
///
/// A range with `first > last` is valid and simply empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRange {
    pub first: i64,
    pub last: i64,
}

impl RunRange {
    pub fn new(first: i64, last: i64) -> Self {
        Self { first, last }
    }

    /// Number of run indices in the range.
    pub fn len(&self) -> usize {
        if self.first > self.last {
            0
        } else {
            (self.last - self.first + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }
}

/// Restartable cursor yielding `(run_number, container_name)` pairs over
/// a [`RunRange`], ascending, one pair per index.
///
/// Exhaustion is signalled through the iterator returning `None`, it is
/// not an error. [`reset`] rewinds the cursor to the first index without
/// forgetting the range or base name, allowing a second identical pass.
///
/// [`reset`]: NameAllocator::reset
#[derive(Debug, Clone)]
pub struct NameAllocator {
    range: RunRange,
    base_name: String,
    idx: i64,
}

impl NameAllocator {
    pub fn new(range: RunRange, base_name: &str) -> Self {
        Self {
            range,
            base_name: base_name.to_string(),
            idx: range.first,
        }
    }

    /// Rewind the cursor to the first index of the range.
    pub fn reset(&mut self) {
        self.idx = self.range.first;
    }
}

impl Iterator for NameAllocator {
    type Item = (i64, String);

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx > self.range.last {
            return None;
        }
        let number = self.idx;
        let name = format!("{}{}", self.base_name, number);
        self.idx += 1;
        Some((number, name))
    }
}

#[test]
fn allocator_yields_whole_range() {
    let alloc = NameAllocator::new(RunRange::new(0, 2), "sim-r");
    let pairs: Vec<(i64, String)> = alloc.collect();
    assert_eq!(
        pairs,
        vec![
            (0, "sim-r0".to_string()),
            (1, "sim-r1".to_string()),
            (2, "sim-r2".to_string()),
        ]
    );
}

#[test]
fn allocator_count_and_order() {
    let range = RunRange::new(3, 11);
    let pairs: Vec<(i64, String)> = NameAllocator::new(range, "n").collect();
    assert_eq!(pairs.len(), range.len());
    assert_eq!(pairs.len(), 9);
    for window in pairs.windows(2) {
        assert!(window[0].0 < window[1].0);
    }
}

#[test]
fn allocator_empty_when_first_past_last() {
    assert!(RunRange::new(5, 4).is_empty());
    assert_eq!(RunRange::new(5, 4).len(), 0);
    let mut alloc = NameAllocator::new(RunRange::new(5, 4), "sim-r");
    assert_eq!(alloc.next(), None);
}

#[test]
fn allocator_reset_reproduces_sequence() {
    let mut alloc = NameAllocator::new(RunRange::new(1, 4), "sim-r");
    let first_pass: Vec<(i64, String)> = alloc.by_ref().collect();
    assert_eq!(alloc.next(), None);
    alloc.reset();
    let second_pass: Vec<(i64, String)> = alloc.collect();
    assert_eq!(first_pass, second_pass);
}
