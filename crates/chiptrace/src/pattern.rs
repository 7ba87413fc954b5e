//! Fixed-size pattern blocks and the per-subsong dedup pool.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::reconstruct::{EventKind, TrackerEvent};

/// One channel's slot in a row.
pub type Cell = Option<EventKind>;
/// One frame: a cell per channel.
pub type Row = Vec<Cell>;

/// A block of consecutive rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    /// Rows in play order.
    pub rows: Vec<Row>,
}

impl Pattern {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the pattern has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Events in this pattern, as `(row, channel, kind)`.
    pub fn events(&self) -> impl Iterator<Item = (usize, usize, EventKind)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(channel, cell)| cell.map(|kind| (row, channel, kind)))
        })
    }
}

/// Lay `events` out as `frames` rows of `channels` cells.
pub fn rows_from_events(events: &[TrackerEvent], frames: usize, channels: usize) -> Vec<Row> {
    let mut rows = vec![vec![None; channels]; frames];
    for event in events {
        if let Some(cell) = rows
            .get_mut(event.frame)
            .and_then(|row| row.get_mut(event.channel))
        {
            *cell = Some(event.kind);
        }
    }
    rows
}

/// Stores each distinct pattern once, indexed in first-seen order.
#[derive(Debug, Default)]
pub struct PatternPool {
    patterns: Vec<Pattern>,
    index: HashMap<Pattern, usize>,
}

impl PatternPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `pattern`, adding it if it has not been seen yet.
    pub fn intern(&mut self, pattern: Pattern) -> usize {
        if let Some(&idx) = self.index.get(&pattern) {
            return idx;
        }
        let idx = self.patterns.len();
        self.index.insert(pattern.clone(), idx);
        self.patterns.push(pattern);
        idx
    }

    /// Distinct patterns stored.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Patterns in index order.
    pub fn into_patterns(self) -> Vec<Pattern> {
        self.patterns
    }
}

/// Split `rows` into blocks of `frames_per_block` (the last block keeps the
/// remainder) and deduplicate them. Returns the patterns and the order list.
pub fn build_patterns(rows: Vec<Row>, frames_per_block: usize) -> (Vec<Pattern>, Vec<usize>) {
    let block = frames_per_block.max(1);
    let mut pool = PatternPool::new();
    let order = rows
        .chunks(block)
        .map(|chunk| {
            pool.intern(Pattern {
                rows: chunk.to_vec(),
            })
        })
        .collect();
    (pool.into_patterns(), order)
}
