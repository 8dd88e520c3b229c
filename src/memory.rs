use std::convert::TryFrom;

/// Flat, word-addressed data memory. Every cell is a signed 32-bit machine
/// word; `LD`/`ST` address it by register value, not by byte offset.
pub struct DataMemory {
    words: Vec<i32>,
}

impl DataMemory {
    pub fn new(word_count: usize) -> DataMemory {
        DataMemory {
            words: vec![0; word_count],
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn read(&self, index: i32) -> Option<i32> {
        self.words.get(usize::try_from(index).ok()?).copied()
    }

    pub fn write(&mut self, index: i32, value: i32) -> bool {
        match usize::try_from(index).ok().and_then(|i| self.words.get_mut(i)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_what_was_written() {
        let mut mem = DataMemory::new(4);
        assert!(mem.write(2, 42));
        assert_eq!(mem.read(2), Some(42));
    }

    #[test]
    fn rejects_negative_and_out_of_bounds_index() {
        let mut mem = DataMemory::new(4);
        assert_eq!(mem.read(-1), None);
        assert_eq!(mem.read(4), None);
        assert!(!mem.write(4, 1));
    }
}
