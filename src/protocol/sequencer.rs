//! Sequencing buffer restoring strict order from out-of-order arrivals.
//!
//! Envelopes are tagged with a monotonic `sequence_number` by the
//! producer but may arrive in any order. The sequencer releases them
//! strictly in order, holding future arrivals until their predecessors
//! show up, under a bounded memory budget.
//!
//! One instance is owned by one stream task; there is no internal
//! locking.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::warn;

use crate::codec::Envelope;

/// Default capacity of the held-envelope map.
pub const DEFAULT_SEQUENCER_CAPACITY: usize = 100;

/// Buffer reconstructing strict sequence order with bounded memory.
///
/// Invariants:
/// - every held envelope has `sequence_number > next_expected`
/// - the held map never exceeds `capacity`
#[derive(Debug)]
pub struct Sequencer {
    /// Out-of-order arrivals keyed by sequence number.
    held: BTreeMap<u64, Envelope>,
    /// Next sequence number eligible for release.
    next_expected: u64,
    /// Maximum number of held envelopes.
    capacity: usize,
}

impl Sequencer {
    /// Create a sequencer with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SEQUENCER_CAPACITY)
    }

    /// Create a sequencer with a custom capacity (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            held: BTreeMap::new(),
            next_expected: 0,
            capacity: capacity.max(1),
        }
    }

    /// Accept one envelope and return everything now releasable, in
    /// order.
    ///
    /// - the expected sequence number releases immediately, plus any
    ///   contiguous run it unblocks
    /// - a future sequence number is held (evicting the oldest quarter
    ///   of held entries first if at capacity)
    /// - a sequence number already passed is a duplicate and is dropped
    pub fn add(&mut self, envelope: Envelope) -> Vec<Envelope> {
        match envelope.sequence_number.cmp(&self.next_expected) {
            Ordering::Equal => {
                let mut released = vec![envelope];
                self.next_expected += 1;

                // Drain the contiguous run this arrival unblocked.
                while let Some(next) = self.held.remove(&self.next_expected) {
                    released.push(next);
                    self.next_expected += 1;
                }

                released
            }
            Ordering::Greater => {
                if self.held.len() >= self.capacity {
                    self.evict_oldest(envelope.sequence_number);
                }
                self.held.insert(envelope.sequence_number, envelope);
                Vec::new()
            }
            // Duplicate or already-released sequence number.
            Ordering::Less => Vec::new(),
        }
    }

    /// Evict the lowest-sequence quarter of held entries.
    ///
    /// Lossy degradation under sustained extreme reordering: bounded
    /// memory and eventual progress win over perfect reconstruction.
    fn evict_oldest(&mut self, incoming: u64) {
        let evict_count = self.capacity.div_ceil(4);
        warn!(
            next_expected = self.next_expected,
            incoming,
            evict_count,
            "sequencing buffer full, evicting oldest held envelopes"
        );

        let keys: Vec<u64> = self.held.keys().take(evict_count).copied().collect();
        for key in keys {
            self.held.remove(&key);
        }
    }

    /// Drain all remaining held envelopes, sorted by sequence number.
    ///
    /// Called once at clean stream end only. An interrupted stream must
    /// not flush; buffered-but-undelivered envelopes are discarded with
    /// it.
    pub fn flush(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.held).into_values().collect()
    }

    /// Next sequence number eligible for release.
    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    /// Number of held (not yet releasable) envelopes.
    pub fn held_len(&self) -> usize {
        self.held.len()
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{EventPayload, TextChunkData};

    /// Helper to build a text-chunk envelope with the given sequence.
    fn envelope(seq: u64, text: &str) -> Envelope {
        Envelope {
            event_id: format!("evt_{seq}"),
            schema_version: "1.0".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            sequence_number: seq,
            payload: EventPayload::TextChunk(TextChunkData {
                text: text.to_string(),
            }),
        }
    }

    fn seqs(envelopes: &[Envelope]) -> Vec<u64> {
        envelopes.iter().map(|e| e.sequence_number).collect()
    }

    #[test]
    fn test_in_order_arrivals_release_immediately() {
        let mut sequencer = Sequencer::new();

        for seq in 0..3 {
            let released = sequencer.add(envelope(seq, "x"));
            assert_eq!(seqs(&released), vec![seq]);
        }
        assert_eq!(sequencer.next_expected(), 3);
        assert_eq!(sequencer.held_len(), 0);
    }

    #[test]
    fn test_reordered_gap_fill() {
        let mut sequencer = Sequencer::new();

        assert!(sequencer.add(envelope(2, "Third")).is_empty());
        assert_eq!(seqs(&sequencer.add(envelope(0, "First"))), vec![0]);

        // 1 unblocks the held 2 in the same release run.
        let released = sequencer.add(envelope(1, "Second"));
        assert_eq!(seqs(&released), vec![1, 2]);

        let texts: Vec<&str> = released
            .iter()
            .map(|e| match &e.payload {
                EventPayload::TextChunk(data) => data.text.as_str(),
                other => panic!("unexpected payload: {other:?}"),
            })
            .collect();
        assert_eq!(texts, vec!["Second", "Third"]);
    }

    #[test]
    fn test_any_permutation_releases_sorted() {
        let permutations: [&[u64]; 6] = [
            &[0, 1, 2, 3],
            &[3, 2, 1, 0],
            &[2, 0, 3, 1],
            &[1, 3, 0, 2],
            &[0, 2, 1, 3],
            &[3, 0, 2, 1],
        ];

        for permutation in permutations {
            let mut sequencer = Sequencer::new();
            let mut released = Vec::new();
            for &seq in permutation {
                released.extend(sequencer.add(envelope(seq, "x")));
            }
            assert_eq!(seqs(&released), vec![0, 1, 2, 3], "order {permutation:?}");
        }
    }

    #[test]
    fn test_partial_buffering_without_zero() {
        let mut sequencer = Sequencer::new();

        assert!(sequencer.add(envelope(1, "b")).is_empty());
        assert!(sequencer.add(envelope(2, "c")).is_empty());
        assert_eq!(sequencer.held_len(), 2);

        let released = sequencer.add(envelope(0, "a"));
        assert_eq!(seqs(&released), vec![0, 1, 2]);
        assert_eq!(sequencer.held_len(), 0);
    }

    #[test]
    fn test_stale_sequence_is_dropped() {
        let mut sequencer = Sequencer::new();

        sequencer.add(envelope(0, "a"));
        sequencer.add(envelope(1, "b"));

        // Duplicate of an already-released number: silent no-op.
        assert!(sequencer.add(envelope(0, "dup")).is_empty());
        assert_eq!(sequencer.next_expected(), 2);
        assert_eq!(sequencer.held_len(), 0);
    }

    #[test]
    fn test_overflow_evicts_lowest_quarter() {
        let capacity = 8;
        let mut sequencer = Sequencer::with_capacity(capacity);

        // Fill with strictly-future arrivals 1..=8 (0 never arrives).
        for seq in 1..=capacity as u64 {
            assert!(sequencer.add(envelope(seq, "x")).is_empty());
        }
        assert_eq!(sequencer.held_len(), capacity);

        // One more future arrival triggers eviction of ceil(8/4) = 2
        // lowest entries before insertion.
        sequencer.add(envelope(100, "overflow"));
        assert_eq!(sequencer.held_len(), capacity - 2 + 1);

        // The lowest survivors are now 3 and 4; 1 and 2 are gone.
        let released = sequencer.add(envelope(0, "a"));
        assert_eq!(seqs(&released), vec![0]);
        assert_eq!(seqs(&sequencer.add(envelope(1, "late"))), vec![1]);
    }

    #[test]
    fn test_bounded_memory_never_exceeds_capacity() {
        let capacity = 8;
        let mut sequencer = Sequencer::with_capacity(capacity);

        for seq in 1..=(capacity as u64 + 1) {
            sequencer.add(envelope(seq, "x"));
            assert!(sequencer.held_len() <= capacity);
        }
    }

    #[test]
    fn test_flush_returns_sorted_remainder() {
        let mut sequencer = Sequencer::new();

        sequencer.add(envelope(5, "f"));
        sequencer.add(envelope(3, "d"));
        sequencer.add(envelope(9, "j"));

        let flushed = sequencer.flush();
        assert_eq!(seqs(&flushed), vec![3, 5, 9]);
        assert_eq!(sequencer.held_len(), 0);
    }

    #[test]
    fn test_flush_empty_buffer() {
        let mut sequencer = Sequencer::new();
        assert!(sequencer.flush().is_empty());
    }
}
