//! Bounds-checked reading of configuration regions
//!
//! Plasticity parameters and lookup tables are loaded at startup from a
//! region of 32-bit words. Short regions fail with an error rather than
//! reading past the end.

use crate::{Result, SynrowError};

/// Cursor over a region of configuration words
#[derive(Debug, Clone)]
pub struct RegionReader<'a> {
    words: &'a [u32],
    position: usize,
}

impl<'a> RegionReader<'a> {
    /// Start reading at the first word of `words`
    pub fn new(words: &'a [u32]) -> Self {
        Self { words, position: 0 }
    }

    /// Words consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Words left to read
    pub fn remaining(&self) -> usize {
        self.words.len() - self.position
    }

    /// Read the next `count` words
    pub fn read_words(&mut self, count: usize) -> Result<&'a [u32]> {
        let end = self.position.checked_add(count).filter(|end| *end <= self.words.len());
        match end {
            Some(end) => {
                let words = &self.words[self.position..end];
                self.position = end;
                Ok(words)
            }
            None => Err(SynrowError::RegionTooShort { needed: count, available: self.remaining() }),
        }
    }

    /// Read one word
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_words(1)?[0])
    }

    /// Read one word as a signed value
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Fill `out` from packed half-words, two per word, low half first
    pub fn read_halfwords(&mut self, out: &mut [u16]) -> Result<()> {
        let words = self.read_words((out.len() + 1) / 2)?;
        for (j, value) in out.iter_mut().enumerate() {
            *value = crate::row::read_half(words, j);
        }
        Ok(())
    }
}
