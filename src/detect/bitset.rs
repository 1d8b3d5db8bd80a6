//! Packed membership bitset over the full key space.
//!
//! # Memory Layout
//!
//! Bits are packed into 64-bit words in little-endian bit order, and words
//! are grouped into 64-byte aligned blocks so each block occupies exactly
//! one cache line:
//!
//! ```text
//! Block 0: [word 0][word 1]...[word 7]     bits 0..512
//! Block 1: [word 8][word 9]...[word 15]    bits 512..1024
//! ```
//!
//! `MAX_KEYS` bits need 274,625 words; the final block carries zero padding
//! words that are never set.
//!
//! # Ownership
//!
//! A bitset is owned by exactly one worker and mutated through `&mut self`,
//! so no atomics are involved. Readers (the merge step) only see it after
//! the owning worker has been joined.

use bytesize::ByteSize;

use super::code::MAX_KEYS;
use super::ScanError;

const WORDS_PER_BLOCK: usize = 8;

/// Number of meaningful 64-bit words (`ceil(MAX_KEYS / 64)`).
pub const WORD_COUNT: usize = MAX_KEYS.div_ceil(64);

const BLOCK_COUNT: usize = WORD_COUNT.div_ceil(WORDS_PER_BLOCK);

#[derive(Debug, Clone, Copy)]
#[repr(C, align(64))]
struct Block([u64; WORDS_PER_BLOCK]);

impl Block {
    const ZERO: Self = Self([0; WORDS_PER_BLOCK]);
}

/// Bit array with one bit per possible key.
pub struct MembershipBitset {
    blocks: Box<[Block]>,
}

impl MembershipBitset {
    /// Allocate a zeroed bitset covering every key.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Allocation`] if the storage cannot be reserved.
    pub fn new() -> Result<Self, ScanError> {
        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(BLOCK_COUNT)
            .map_err(|_| ScanError::Allocation {
                bytes: Self::storage_bytes(),
            })?;
        blocks.resize(BLOCK_COUNT, Block::ZERO);

        log::trace!(
            "Allocated membership bitset ({})",
            ByteSize::b(Self::storage_bytes() as u64)
        );

        Ok(Self {
            blocks: blocks.into_boxed_slice(),
        })
    }

    /// Bytes of backing storage per bitset, padding included.
    #[must_use]
    pub const fn storage_bytes() -> usize {
        BLOCK_COUNT * std::mem::size_of::<Block>()
    }

    /// Set bit `key`, returning whether it was already set.
    ///
    /// `true` means this bitset has seen `key` before.
    #[inline]
    pub fn test_and_set(&mut self, key: u32) -> bool {
        let key = key as usize;
        debug_assert!(key < MAX_KEYS, "key {key} out of range");
        let word_index = key >> 6;
        let mask = 1u64 << (key & 63);
        let word = &mut self.blocks[word_index / WORDS_PER_BLOCK].0[word_index % WORDS_PER_BLOCK];
        if *word & mask != 0 {
            return true;
        }
        *word |= mask;
        false
    }

    /// Whether bit `key` is set.
    #[must_use]
    pub fn contains(&self, key: u32) -> bool {
        let key = key as usize;
        debug_assert!(key < MAX_KEYS, "key {key} out of range");
        self.word(key >> 6) & (1u64 << (key & 63)) != 0
    }

    /// Word `index`, for `index < WORD_COUNT`.
    #[inline]
    #[must_use]
    pub fn word(&self, index: usize) -> u64 {
        debug_assert!(index < WORD_COUNT);
        self.blocks[index / WORDS_PER_BLOCK].0[index % WORDS_PER_BLOCK]
    }

    /// Number of meaningful words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        WORD_COUNT
    }

    /// All meaningful words in order.
    pub fn words(&self) -> impl Iterator<Item = u64> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.0.iter().copied())
            .take(WORD_COUNT)
    }

    /// Number of set bits (distinct keys seen).
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words().map(|w| w.count_ones() as usize).sum()
    }

    /// Reset every bit to zero.
    pub fn clear(&mut self) {
        self.blocks.fill(Block::ZERO);
    }
}

impl std::fmt::Debug for MembershipBitset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipBitset")
            .field("words", &WORD_COUNT)
            .field("bytes", &Self::storage_bytes())
            .finish()
    }
}
