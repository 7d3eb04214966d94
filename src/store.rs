// Ring-buffer store: one bounded history per metric, single writer, many
// readers. The sampler thread is the only writer; the renderer and the HTTP
// worker read slices under the shared lock.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::metrics::MetricBatch;

/// Slice of a series as the renderer consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesWindow {
    /// Exactly the requested number of columns, zero-padded on the left.
    pub values: Vec<f64>,
    /// Maximum over the returned window.
    pub max: f64,
}

/// Current value plus full retained history, for the HTTP outputs.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SeriesExport {
    pub current: f64,
    pub history: Vec<f64>,
}

struct StoreInner {
    /// First-seen order; fixes the vertical layout and the CSV row order.
    order: Vec<String>,
    series: HashMap<String, VecDeque<f64>>,
}

pub struct MetricStore {
    capacity: usize,
    inner: RwLock<StoreInner>,
    /// Bumped once per ingest; observers compare against their last seen
    /// value instead of holding the lock.
    generation: AtomicU64,
}

impl MetricStore {
    pub fn new(capacity: usize) -> Self {
        MetricStore {
            capacity: capacity.max(1),
            inner: RwLock::new(StoreInner {
                order: Vec::new(),
                series: HashMap::new(),
            }),
            generation: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of completed ingests. Monotonic.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Append one tick of readings. Series are created lazily in emission
    /// order and never destroyed.
    pub fn ingest(&self, batch: &MetricBatch) {
        if batch.is_empty() {
            return;
        }
        {
            let mut inner = self.inner.write().expect("store lock poisoned");
            for (name, value) in batch {
                if !inner.series.contains_key(name) {
                    inner.order.push(name.clone());
                    inner
                        .series
                        .insert(name.clone(), VecDeque::with_capacity(self.capacity));
                }
                let ring = inner.series.get_mut(name).expect("series just created");
                if ring.len() == self.capacity {
                    ring.pop_front();
                }
                ring.push_back(*value);
            }
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Read the window of `cols` values ending `offset` elements before the
    /// newest. Shorter histories are zero-padded on the left. Unknown names
    /// yield an all-zero window.
    pub fn snapshot(&self, name: &str, cols: usize, offset: usize) -> SeriesWindow {
        if cols == 0 {
            return SeriesWindow {
                values: Vec::new(),
                max: 0.0,
            };
        }
        let inner = self.inner.read().expect("store lock poisoned");
        let mut values = vec![0.0; cols];
        let mut max = 0.0f64;
        if let Some(ring) = inner.series.get(name) {
            let end = ring.len().saturating_sub(offset);
            let start = end.saturating_sub(cols);
            let window = end - start;
            for (slot, idx) in (cols - window..cols).zip(start..end) {
                let v = ring[idx];
                values[slot] = v;
                if v > max {
                    max = v;
                }
            }
        }
        SeriesWindow { values, max }
    }

    /// Series names in first-seen order.
    pub fn names(&self) -> Vec<String> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.order.clone()
    }

    /// Length of the longest retained history, for scroll clamping.
    pub fn longest_len(&self) -> usize {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.series.values().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Full copy of every series for the HTTP outputs, oldest → newest.
    pub fn export(&self) -> Vec<(String, SeriesExport)> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .order
            .iter()
            .filter_map(|name| {
                let ring = inner.series.get(name)?;
                let current = ring.back().copied()?;
                Some((
                    name.clone(),
                    SeriesExport {
                        current,
                        history: ring.iter().copied().collect(),
                    },
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(pairs: &[(&str, f64)]) -> MetricBatch {
        pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn test_ingest_then_snapshot_single_value() {
        let store = MetricStore::new(500);
        store.ingest(&batch(&[("memory.system.total.used.percent", 78.5)]));
        let window = store.snapshot("memory.system.total.used.percent", 1, 0);
        assert_eq!(window.values, vec![78.5]);
        assert_eq!(window.max, 78.5);
    }

    #[test]
    fn test_capacity_bounds_history() {
        let store = MetricStore::new(3);
        for i in 0..10 {
            store.ingest(&batch(&[("cpu.total.count", i as f64)]));
        }
        let window = store.snapshot("cpu.total.count", 3, 0);
        assert_eq!(window.values, vec![7.0, 8.0, 9.0]);
        assert_eq!(store.longest_len(), 3);
    }

    #[test]
    fn test_capacity_one_keeps_latest() {
        let store = MetricStore::new(1);
        store.ingest(&batch(&[("a.b.c", 1.0)]));
        store.ingest(&batch(&[("a.b.c", 2.0)]));
        assert_eq!(store.snapshot("a.b.c", 1, 0).values, vec![2.0]);
        assert_eq!(store.longest_len(), 1);
    }

    #[test]
    fn test_snapshot_pads_left_with_zeros() {
        let store = MetricStore::new(500);
        store.ingest(&batch(&[("a.b.c", 5.0)]));
        store.ingest(&batch(&[("a.b.c", 6.0)]));
        let window = store.snapshot("a.b.c", 4, 0);
        assert_eq!(window.values, vec![0.0, 0.0, 5.0, 6.0]);
    }

    #[test]
    fn test_snapshot_with_offset_freezes_tail() {
        let store = MetricStore::new(500);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            store.ingest(&batch(&[("a.b.c", v)]));
        }
        let window = store.snapshot("a.b.c", 2, 3);
        assert_eq!(window.values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_snapshot_offset_past_history_is_zero() {
        let store = MetricStore::new(500);
        store.ingest(&batch(&[("a.b.c", 9.0)]));
        let window = store.snapshot("a.b.c", 2, 10);
        assert_eq!(window.values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_zero_cols_returns_empty() {
        let store = MetricStore::new(500);
        let window = store.snapshot("missing", 0, 0);
        assert!(window.values.is_empty());
    }

    #[test]
    fn test_unknown_name_is_zero_window() {
        let store = MetricStore::new(500);
        let window = store.snapshot("never.seen", 3, 0);
        assert_eq!(window.values, vec![0.0, 0.0, 0.0]);
        assert_eq!(window.max, 0.0);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let store = MetricStore::new(500);
        store.ingest(&batch(&[("b.x", 1.0), ("a.x", 2.0)]));
        store.ingest(&batch(&[("c.x", 3.0), ("a.x", 4.0)]));
        assert_eq!(store.names(), vec!["b.x", "a.x", "c.x"]);
    }

    #[test]
    fn test_generation_counts_ingests() {
        let store = MetricStore::new(500);
        assert_eq!(store.generation(), 0);
        store.ingest(&batch(&[("a.x", 1.0)]));
        store.ingest(&batch(&[("a.x", 2.0)]));
        assert_eq!(store.generation(), 2);
        store.ingest(&Vec::new());
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn test_export_oldest_to_newest() {
        let store = MetricStore::new(500);
        store.ingest(&batch(&[("a.x", 1.0)]));
        store.ingest(&batch(&[("a.x", 2.0)]));
        let export = store.export();
        assert_eq!(export.len(), 1);
        assert_eq!(export[0].1.current, 2.0);
        assert_eq!(export[0].1.history, vec![1.0, 2.0]);
    }
}
