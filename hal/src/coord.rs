//! Core positions and rectangle sets on the worker mesh.

use std::fmt;

use smallvec::SmallVec;

/// Logical or physical position of a core on the mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoreCoord {
    pub x: u32,
    pub y: u32,
}

impl CoreCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CoreCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inclusive rectangle of cores, `start` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoreRange {
    pub start: CoreCoord,
    pub end: CoreCoord,
}

impl CoreRange {
    pub fn new(start: CoreCoord, end: CoreCoord) -> Self {
        debug_assert!(start.x <= end.x && start.y <= end.y, "inverted core range {start}..{end}");
        Self { start, end }
    }

    /// Rectangle covering a single core.
    pub fn single(core: CoreCoord) -> Self {
        Self { start: core, end: core }
    }

    /// Number of cores covered.
    pub fn size(&self) -> u32 {
        (self.end.x - self.start.x + 1) * (self.end.y - self.start.y + 1)
    }

    pub fn contains(&self, core: CoreCoord) -> bool {
        (self.start.x..=self.end.x).contains(&core.x) && (self.start.y..=self.end.y).contains(&core.y)
    }

    /// Row-major iteration over the covered cores.
    pub fn iter(&self) -> impl Iterator<Item = CoreCoord> + use<> {
        let (xs, xe, ys, ye) = (self.start.x, self.end.x, self.start.y, self.end.y);
        (ys..=ye).flat_map(move |y| (xs..=xe).map(move |x| CoreCoord { x, y }))
    }
}

/// Set of disjoint core rectangles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreRangeSet {
    ranges: SmallVec<[CoreRange; 2]>,
}

impl CoreRangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, range: CoreRange) {
        debug_assert!(
            !self.ranges.iter().any(|r| r.contains(range.start) || range.contains(r.start)),
            "overlapping core ranges"
        );
        self.ranges.push(range);
    }

    pub fn ranges(&self) -> &[CoreRange] {
        &self.ranges
    }

    pub fn num_cores(&self) -> u32 {
        self.ranges.iter().map(CoreRange::size).sum()
    }

    pub fn contains(&self, core: CoreCoord) -> bool {
        self.ranges.iter().any(|r| r.contains(core))
    }

    pub fn iter_cores(&self) -> impl Iterator<Item = CoreCoord> + '_ {
        self.ranges.iter().flat_map(CoreRange::iter)
    }

    /// Coalesce a sorted, de-duplicated list of cores into maximal rectangles.
    ///
    /// Consecutive cores on the same row merge into row spans, then row spans
    /// with identical x-extent on consecutive rows merge vertically. This is
    /// how kernel groups derive their multicast destinations, so the result
    /// must cover exactly the input cores.
    pub fn from_cores(cores: &[CoreCoord]) -> Self {
        debug_assert!(cores.windows(2).all(|w| w[0] < w[1]), "cores must be sorted and unique");

        // Horizontal pass: (y, x_start, x_end) spans per row. Cores sort by
        // (x, y), so regroup by row first.
        let mut rows: SmallVec<[(u32, u32, u32); 8]> = SmallVec::new();
        let mut by_row: SmallVec<[CoreCoord; 16]> = SmallVec::from_slice(cores);
        by_row.sort_by_key(|c| (c.y, c.x));
        for core in by_row {
            match rows.last_mut() {
                Some((y, _, x_end)) if *y == core.y && *x_end + 1 == core.x => *x_end = core.x,
                _ => rows.push((core.y, core.x, core.x)),
            }
        }

        // Vertical pass: merge identical spans on consecutive rows.
        let mut set = CoreRangeSet::new();
        let mut pending: Option<(u32, u32, u32, u32)> = None; // (y_start, y_end, x_start, x_end)
        for (y, x_start, x_end) in rows {
            match &mut pending {
                Some((_, y_end, px_start, px_end)) if *y_end + 1 == y && *px_start == x_start && *px_end == x_end => {
                    *y_end = y;
                }
                _ => {
                    if let Some((ys, ye, xs, xe)) = pending.take() {
                        set.push(CoreRange::new(CoreCoord::new(xs, ys), CoreCoord::new(xe, ye)));
                    }
                    pending = Some((y, y, x_start, x_end));
                }
            }
        }
        if let Some((ys, ye, xs, xe)) = pending {
            set.push(CoreRange::new(CoreCoord::new(xs, ys), CoreCoord::new(xe, ye)));
        }
        set
    }
}

impl From<CoreRange> for CoreRangeSet {
    fn from(range: CoreRange) -> Self {
        let mut set = Self::new();
        set.push(range);
        set
    }
}

impl FromIterator<CoreRange> for CoreRangeSet {
    fn from_iter<I: IntoIterator<Item = CoreRange>>(iter: I) -> Self {
        let mut set = Self::new();
        for range in iter {
            set.push(range);
        }
        set
    }
}
