//! Dense bitsets over row indices.
//!
//! The face and printing universes are fixed for the life of an index, so
//! match sets are flat arrays of 64-bit words. Boolean composition is
//! word-wise; complement masks the trailing partial word so bits past the
//! universe never leak into results.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitset {
    words: Vec<u64>,
    len: usize,
}

impl Bitset {
    /// Empty set over a universe of `len` rows.
    pub fn new(len: usize) -> Bitset {
        Bitset {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Full set over a universe of `len` rows.
    pub fn full(len: usize) -> Bitset {
        let mut set = Bitset::new(len);
        for word in &mut set.words {
            *word = u64::MAX;
        }
        set.mask_tail();
        set
    }

    pub fn from_indices(len: usize, indices: impl IntoIterator<Item = u32>) -> Bitset {
        let mut set = Bitset::new(len);
        for index in indices {
            set.insert(index);
        }
        set
    }

    /// Universe size, not the number of set bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn insert(&mut self, index: u32) {
        debug_assert!((index as usize) < self.len);
        self.words[index as usize / 64] |= 1 << (index % 64);
    }

    pub fn contains(&self, index: u32) -> bool {
        let word = index as usize / 64;
        word < self.words.len() && self.words[word] & (1 << (index % 64)) != 0
    }

    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn intersect_with(&mut self, other: &Bitset) {
        debug_assert_eq!(self.len, other.len);
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word &= other_word;
        }
    }

    pub fn union_with(&mut self, other: &Bitset) {
        debug_assert_eq!(self.len, other.len);
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word |= other_word;
        }
    }

    pub fn subtract(&mut self, other: &Bitset) {
        debug_assert_eq!(self.len, other.len);
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word &= !other_word;
        }
    }

    /// Complement within the universe.
    pub fn complement(&self) -> Bitset {
        let mut out = Bitset {
            words: self.words.iter().map(|w| !w).collect(),
            len: self.len,
        };
        out.mask_tail();
        out
    }

    /// Set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(word_index, word)| {
            let mut word = *word;
            std::iter::from_fn(move || {
                if word == 0 {
                    return None;
                }
                let bit = word.trailing_zeros();
                word &= word - 1;
                Some(word_index as u32 * 64 + bit)
            })
        })
    }

    /// Flat index array for the result wire format.
    pub fn to_indices(&self) -> Vec<u32> {
        self.iter().collect()
    }

    fn mask_tail(&mut self) {
        let tail_bits = self.len % 64;
        if tail_bits != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1 << tail_bits) - 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut set = Bitset::new(130);
        set.insert(0);
        set.insert(63);
        set.insert(64);
        set.insert(129);
        assert!(set.contains(0));
        assert!(set.contains(63));
        assert!(set.contains(64));
        assert!(set.contains(129));
        assert!(!set.contains(1));
        assert_eq!(set.count(), 4);
        assert_eq!(set.to_indices(), vec![0, 63, 64, 129]);
    }

    #[test]
    fn test_complement_masks_tail() {
        for len in [0, 1, 63, 64, 65, 130] {
            let empty = Bitset::new(len);
            let full = empty.complement();
            assert_eq!(full.count() as usize, len, "universe {len}");
            assert_eq!(full, Bitset::full(len), "universe {len}");
            // Double complement round-trips.
            assert_eq!(full.complement(), empty, "universe {len}");
        }
    }

    #[test]
    fn test_boolean_ops() {
        let a = Bitset::from_indices(10, [1, 3, 5, 7]);
        let b = Bitset::from_indices(10, [3, 4, 5]);

        let mut and = a.clone();
        and.intersect_with(&b);
        assert_eq!(and.to_indices(), vec![3, 5]);

        let mut or = a.clone();
        or.union_with(&b);
        assert_eq!(or.to_indices(), vec![1, 3, 4, 5, 7]);

        let mut diff = a.clone();
        diff.subtract(&b);
        assert_eq!(diff.to_indices(), vec![1, 7]);
    }

    #[test]
    fn test_full_of_zero_universe() {
        let set = Bitset::full(0);
        assert_eq!(set.count(), 0);
        assert!(set.is_empty());
    }
}
