//! Cross-partition reconciliation of per-worker bitsets.
//!
//! After every worker has finished without a local repeat, a duplicate can
//! still exist with one occurrence in each of two partitions. Such a key is
//! set in two different bitsets. For each word index `w` the merger ORs the
//! pairwise ANDs `bitsets[i][w] & bitsets[j][w]` over all `i < j`; any
//! nonzero result proves a shared key.
//!
//! Cost is `O(words * T^2)` with `T` in the single digits.

use super::bitset::MembershipBitset;

/// Detects keys present in more than one bitset.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitsetMerger;

impl BitsetMerger {
    /// Index of the first word where two bitsets share a set bit.
    ///
    /// Returns `None` when the bitsets are pairwise disjoint, which is
    /// always the case for fewer than two bitsets.
    #[must_use]
    pub fn first_shared_word(bitsets: &[&MembershipBitset]) -> Option<usize> {
        if bitsets.len() < 2 {
            return None;
        }
        let word_count = bitsets[0].word_count();
        debug_assert!(bitsets.iter().all(|b| b.word_count() == word_count));

        (0..word_count).find(|&w| Self::shared_bits(bitsets, w) != 0)
    }

    /// Whether any key is set in two or more of `bitsets`.
    #[must_use]
    pub fn has_shared_bit(bitsets: &[&MembershipBitset]) -> bool {
        Self::first_shared_word(bitsets).is_some()
    }

    /// OR of all pairwise ANDs at word `w`.
    #[inline]
    fn shared_bits(bitsets: &[&MembershipBitset], w: usize) -> u64 {
        let mut shared = 0u64;
        for (i, a) in bitsets.iter().enumerate() {
            let a = a.word(w);
            for b in &bitsets[i + 1..] {
                shared |= a & b.word(w);
            }
        }
        shared
    }
}
