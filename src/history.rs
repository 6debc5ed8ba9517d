// ============================================================================
// HISTORY MANAGER — bounded linear undo/redo log of bitmap snapshots
// ============================================================================
//
// A single ordered list of snapshots plus an index. Committing while the
// index sits before the end discards the redo branch; exceeding the capacity
// evicts the oldest entry and re-clamps the index. Stored bitmaps are never
// mutated — only the index moves on undo/redo.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::bitmap::Bitmap;

/// Default number of snapshots kept per session.
pub const DEFAULT_CAPACITY: usize = 20;

/// One committed snapshot: the bitmap plus bookkeeping about how it came to be.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub id: Uuid,
    /// Milliseconds since the Unix epoch at commit time.
    pub timestamp_ms: u64,
    /// Short machine-readable action label, e.g. `rotate_90`, `crop`, `draw`.
    pub action: String,
    pub bitmap: Bitmap,
    /// Free-form detail, e.g. which effects an enhancement applied.
    pub metadata: Option<String>,
}

pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    index: usize,
    capacity: usize,
}

impl HistoryManager {
    /// Seed the log with the session's initial bitmap as its first entry.
    pub fn new(initial: Bitmap, action: &str) -> Self {
        Self::with_capacity(initial, action, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(initial: Bitmap, action: &str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: vec![make_entry(action, initial, None)],
            index: 0,
            capacity,
        }
    }

    /// Append a new snapshot after the current index.
    ///
    /// Any redo branch past the index is discarded first; once the log grows
    /// beyond capacity the oldest entry is evicted and the index re-clamped.
    pub fn commit(&mut self, action: &str, bitmap: Bitmap, metadata: Option<String>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(make_entry(action, bitmap, metadata));
        self.index = self.entries.len() - 1;

        while self.entries.len() > self.capacity {
            self.entries.remove(0);
            self.index = self.index.saturating_sub(1);
        }
    }

    /// Step back one snapshot. Returns `false` (and does nothing) at the start.
    pub fn undo(&mut self) -> bool {
        if self.can_undo() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward one snapshot. Returns `false` (and does nothing) at the end.
    pub fn redo(&mut self) -> bool {
        if self.can_redo() {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// The entry the session's current bitmap corresponds to.
    pub fn current(&self) -> &HistoryEntry {
        &self.entries[self.index]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        // The log always holds at least the seed entry.
        false
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn make_entry(action: &str, bitmap: Bitmap, metadata: Option<String>) -> HistoryEntry {
    HistoryEntry {
        id: Uuid::new_v4(),
        timestamp_ms: epoch_millis(),
        action: action.to_string(),
        bitmap,
        metadata,
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
