use std::collections::HashMap;

use crate::range::range_from;
use crate::scores::{Dataset, ScoreRecord, normalize_pair};

pub const HEAT_BUCKETS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    Presence,
    Heatmap,
}

impl CellMode {
    pub fn from_heatmap(heatmap: bool) -> Self {
        if heatmap {
            CellMode::Heatmap
        } else {
            CellMode::Presence
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Column above the diagonal; never looked up.
    Placeholder,
    Empty,
    Occurred { index: usize, count: u32 },
    Heat { index: usize, count: u32, bucket: u8 },
}

impl Cell {
    pub fn index(self) -> Option<usize> {
        match self {
            Cell::Occurred { index, .. } | Cell::Heat { index, .. } => Some(index),
            Cell::Placeholder | Cell::Empty => None,
        }
    }

    pub fn is_hit(self) -> bool {
        self.index().is_some()
    }
}

/// Triangular score grid over one dataset. Rows are the higher score, columns the lower.
#[derive(Debug, Clone, Default)]
pub struct ScoreMatrix {
    pub max_winning: u32,
    pub max_losing: u32,
    pub max_count: u32,
    pub total_matches: u64,
    pub single_occurrences: usize,
    by_pair: HashMap<(u32, u32), usize>,
}

impl ScoreMatrix {
    pub fn build(dataset: &Dataset) -> Self {
        let records = dataset.records();
        let mut matrix = ScoreMatrix {
            by_pair: HashMap::with_capacity(records.len()),
            ..Default::default()
        };
        for (idx, record) in records.iter().enumerate() {
            // Maxima follow the normalized pair so a mislabelled row still lands in the grid.
            let (high, low) = record.pair();
            matrix.max_winning = matrix.max_winning.max(high);
            matrix.max_losing = matrix.max_losing.max(low);
            matrix.max_count = matrix.max_count.max(record.count);
            matrix.total_matches += u64::from(record.count);
            if record.count == 1 {
                matrix.single_occurrences += 1;
            }
            matrix.by_pair.entry((high, low)).or_insert(idx);
        }
        matrix
    }

    pub fn distinct_pairs(&self) -> usize {
        self.by_pair.len()
    }

    /// Row indices `0..=max_winning`.
    pub fn rows(&self) -> Vec<u32> {
        range_from(0, i64::from(self.max_winning) + 1)
            .into_iter()
            .map(|v| v as u32)
            .collect()
    }

    /// Columns that can hold a hit for row `a`: `0..=min(a, max_losing)`.
    pub fn populated_columns(&self, a: u32) -> Vec<u32> {
        range_from(0, i64::from(a.min(self.max_losing)) + 1)
            .into_iter()
            .map(|v| v as u32)
            .collect()
    }

    /// Symmetric lookup: `(a, b)` and `(b, a)` resolve to the same row.
    pub fn lookup(&self, a: u32, b: u32) -> Option<usize> {
        self.by_pair.get(&normalize_pair(a, b)).copied()
    }

    pub fn lookup_record<'a>(&self, dataset: &'a Dataset, a: u32, b: u32) -> Option<&'a ScoreRecord> {
        self.lookup(a, b).and_then(|idx| dataset.records().get(idx))
    }

    pub fn cell(&self, dataset: &Dataset, a: u32, b: u32, mode: CellMode) -> Cell {
        if b > a {
            return Cell::Placeholder;
        }
        if b > self.max_losing {
            return Cell::Empty;
        }
        let Some(index) = self.lookup(a, b) else {
            return Cell::Empty;
        };
        let count = dataset.records().get(index).map(|r| r.count).unwrap_or(0);
        match mode {
            CellMode::Presence => Cell::Occurred { index, count },
            CellMode::Heatmap => match heat_bucket(count, self.max_count) {
                Some(bucket) => Cell::Heat {
                    index,
                    count,
                    bucket,
                },
                None => Cell::Occurred { index, count },
            },
        }
    }

    /// Full grid, row by row, with every row spanning `0..=max_winning` columns. The terminal
    /// only walks the visible window via `rows` and `populated_columns`.
    pub fn grid(&self, dataset: &Dataset, mode: CellMode) -> Vec<Vec<Cell>> {
        let width = self.max_winning;
        self.rows()
            .into_iter()
            .map(|a| {
                (0..=width)
                    .map(|b| self.cell(dataset, a, b, mode))
                    .collect()
            })
            .collect()
    }
}

/// Intensity bucket `ceil(count / max_count * 10)` in `1..=10`.
///
/// Buckets are right-inclusive tenths of `(0, 1]`. Returns `None` when there is nothing to
/// scale against (`max_count == 0`) or the count is zero.
pub fn heat_bucket(count: u32, max_count: u32) -> Option<u8> {
    if max_count == 0 || count == 0 {
        return None;
    }
    let scaled = u64::from(count) * u64::from(HEAT_BUCKETS);
    let max = u64::from(max_count);
    let bucket = scaled.div_ceil(max).clamp(1, u64::from(HEAT_BUCKETS));
    Some(bucket as u8)
}
