//! Synaptic row format
//!
//! Rows are sequences of little-endian 32-bit words shared bit-exactly between
//! the offline matrix generator and the core.
//!
//! Static row:
//!
//! | word      | content                                   |
//! |-----------|-------------------------------------------|
//! | 0         | synapse count `k`                         |
//! | 1         | delay-extension delay in ticks (0 = none) |
//! | 2         | delay-extension row ([`RowOffsetLength`]) |
//! | 3..3+k    | control words (index, delay, weight)      |
//!
//! Plastic row: the same three header words, then the last update tick, the
//! last pre-synaptic tick, the pre-synaptic trace, `k` 16-bit plastic words and
//! `k` 16-bit control words (index, delay). Each 16-bit segment is packed two
//! per word, element `j` in the low half of word `j / 2` when `j` is even, and
//! padded to a whole word.

use crate::{Result, SynrowConfig, SynrowError};

/// Word holding the synapse count
pub const NUM_SYNAPSES_WORD: usize = 0;
/// Word holding the delay-extension delay
pub const EXTENSION_DELAY_WORD: usize = 1;
/// Word holding the delay-extension row reference
pub const EXTENSION_ROW_WORD: usize = 2;
/// Header words of a static row
pub const STATIC_HEADER_WORDS: usize = 3;
/// Word holding the last update tick of a plastic row
pub const LAST_UPDATE_TICK_WORD: usize = 3;
/// Word holding the last genuine pre-synaptic tick of a plastic row
pub const LAST_PRE_TICK_WORD: usize = 4;
/// Header words of a plastic row, excluding the pre-synaptic trace
pub const PLASTIC_HEADER_WORDS: usize = 5;

/// Bit layout of synapse control words
///
/// Static words are `index | delay << I | weight << (D + I)` in 32 bits.
/// Plastic control words are `index | delay << I` in 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFormat {
    delay_bits: u32,
    index_bits: u32,
}

/// Decoded static control word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticControl {
    /// Post-synaptic neuron index
    pub index: u32,
    /// Dendritic delay in ticks
    pub delay: u32,
    /// Synaptic weight (fixed point)
    pub weight: u32,
}

impl ControlFormat {
    /// Create a format, panicking at compile time when used in a constant
    /// with fields wider than a static word
    pub const fn new(delay_bits: u32, index_bits: u32) -> Self {
        assert!(delay_bits + index_bits < 32, "Control fields must leave room for a weight");
        Self { delay_bits, index_bits }
    }

    /// Create a format whose fields must fit `width` bits
    pub const fn checked(delay_bits: u32, index_bits: u32, width: u32) -> Result<Self> {
        let bits = delay_bits + index_bits;
        if bits > width || bits >= 32 {
            Err(SynrowError::FormatTooWide { bits, width })
        } else {
            Ok(Self { delay_bits, index_bits })
        }
    }

    /// Delay field width
    pub const fn delay_bits(&self) -> u32 {
        self.delay_bits
    }

    /// Index field width
    pub const fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// Mask of the index field
    pub const fn index_mask(&self) -> u32 {
        (1 << self.index_bits) - 1
    }

    /// Mask of the delay field (after shifting)
    pub const fn delay_mask(&self) -> u32 {
        (1 << self.delay_bits) - 1
    }

    /// Largest delay the format can carry
    pub const fn max_delay(&self) -> u32 {
        self.delay_mask()
    }

    /// Largest weight a static word can carry
    pub const fn max_static_weight(&self) -> u32 {
        u32::MAX >> (self.delay_bits + self.index_bits)
    }

    /// Encode a static control word, rejecting unrepresentable fields
    pub fn encode_static(&self, index: u32, delay: u32, weight: u32) -> Result<u32> {
        let base = self.encode_fields(index, delay)?;
        if weight > self.max_static_weight() {
            return Err(SynrowError::WeightOutOfRange {
                weight: weight as i64,
                max: self.max_static_weight() as i64,
            });
        }
        Ok(base | (weight << (self.delay_bits + self.index_bits)))
    }

    /// Encode a 16-bit plastic control word
    pub fn encode_plastic(&self, index: u32, delay: u32) -> Result<u16> {
        let bits = self.delay_bits + self.index_bits;
        if bits > 16 {
            return Err(SynrowError::FormatTooWide { bits, width: 16 });
        }
        Ok(self.encode_fields(index, delay)? as u16)
    }

    fn encode_fields(&self, index: u32, delay: u32) -> Result<u32> {
        if index > self.index_mask() {
            return Err(SynrowError::IndexOutOfRange { index, max: self.index_mask() });
        }
        if delay > self.delay_mask() {
            return Err(SynrowError::DelayOutOfRange { delay, max: self.delay_mask() });
        }
        Ok(index | (delay << self.index_bits))
    }

    /// Post-synaptic index of a control word
    #[inline(always)]
    pub const fn index(&self, word: u32) -> u32 {
        word & self.index_mask()
    }

    /// Dendritic delay of a control word
    #[inline(always)]
    pub const fn delay(&self, word: u32) -> u32 {
        (word >> self.index_bits) & self.delay_mask()
    }

    /// Weight of a static control word
    #[inline(always)]
    pub const fn static_weight(&self, word: u32) -> u32 {
        word >> (self.delay_bits + self.index_bits)
    }

    /// Decode all fields of a static control word
    pub const fn decode_static(&self, word: u32) -> StaticControl {
        StaticControl {
            index: self.index(word),
            delay: self.delay(word),
            weight: self.static_weight(word),
        }
    }
}

/// Packed row reference: `(num_synapses - 1) | word_offset << ROW_SYNAPSES_BITS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowOffsetLength(u32);

impl RowOffsetLength {
    const LENGTH_MASK: u32 = (1 << SynrowConfig::ROW_SYNAPSES_BITS) - 1;

    /// Pack a row of `num_synapses` (1..=1024) starting at `word_offset`
    pub fn new(num_synapses: usize, word_offset: u32) -> Result<Self> {
        if num_synapses == 0 || num_synapses > SynrowConfig::MAX_STATIC_ROW_SYNAPSES {
            return Err(SynrowError::RowTooLong {
                synapses: num_synapses,
                max: SynrowConfig::MAX_STATIC_ROW_SYNAPSES,
            });
        }
        let max_offset = u32::MAX >> SynrowConfig::ROW_SYNAPSES_BITS;
        if word_offset > max_offset {
            return Err(SynrowError::MemoryAccess { offset: word_offset, words: num_synapses });
        }
        Ok(Self((num_synapses as u32 - 1) | (word_offset << SynrowConfig::ROW_SYNAPSES_BITS)))
    }

    /// Wrap a raw word
    pub const fn from_word(word: u32) -> Self {
        Self(word)
    }

    /// Raw word
    pub const fn to_word(self) -> u32 {
        self.0
    }

    /// Number of synapses in the referenced row
    pub const fn num_synapses(self) -> usize {
        (self.0 & Self::LENGTH_MASK) as usize + 1
    }

    /// Word offset of the referenced row
    pub const fn word_offset(self) -> u32 {
        self.0 >> SynrowConfig::ROW_SYNAPSES_BITS
    }
}

/// Reference to a continuation row delivered after a further delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayExtension {
    /// Ticks after the current activation
    pub delay: u32,
    /// Row to re-deliver
    pub row: RowOffsetLength,
}

/// Common header of static and plastic rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHeader {
    /// Synapses in this row
    pub num_synapses: usize,
    /// Delay extension, if any
    pub extension: Option<DelayExtension>,
}

impl RowHeader {
    /// Decode the header of a row buffer
    pub fn read(row: &[u32]) -> Result<Self> {
        if row.len() < STATIC_HEADER_WORDS {
            return Err(SynrowError::BufferTooSmall {
                needed: STATIC_HEADER_WORDS,
                available: row.len(),
            });
        }
        let extension = match row[EXTENSION_DELAY_WORD] {
            0 => None,
            delay => Some(DelayExtension {
                delay,
                row: RowOffsetLength::from_word(row[EXTENSION_ROW_WORD]),
            }),
        };
        Ok(Self { num_synapses: row[NUM_SYNAPSES_WORD] as usize, extension })
    }

    /// Encode this header into the first words of `row`
    pub fn write(&self, row: &mut [u32]) -> Result<()> {
        if row.len() < STATIC_HEADER_WORDS {
            return Err(SynrowError::BufferTooSmall {
                needed: STATIC_HEADER_WORDS,
                available: row.len(),
            });
        }
        row[NUM_SYNAPSES_WORD] = self.num_synapses as u32;
        let (delay, ext_row) = match self.extension {
            Some(ext) => (ext.delay, ext.row.to_word()),
            None => (0, 0),
        };
        row[EXTENSION_DELAY_WORD] = delay;
        row[EXTENSION_ROW_WORD] = ext_row;
        Ok(())
    }
}

/// Words occupied by a static row of `num_synapses`
pub const fn static_row_words(num_synapses: usize) -> usize {
    STATIC_HEADER_WORDS + num_synapses
}

/// Control words of a static row, after checking the declared length
pub fn static_controls(row: &[u32]) -> Result<&[u32]> {
    let header = RowHeader::read(row)?;
    let needed = static_row_words(header.num_synapses);
    row.get(STATIC_HEADER_WORDS..needed)
        .ok_or(SynrowError::BufferTooSmall { needed, available: row.len() })
}

/// Words occupied by `count` 16-bit elements
pub const fn half_words(count: usize) -> usize {
    (count + 1) / 2
}

/// Read 16-bit element `j` of a packed segment
#[inline(always)]
pub fn read_half(segment: &[u32], j: usize) -> u16 {
    (segment[j / 2] >> ((j % 2) * 16)) as u16
}

/// Write 16-bit element `j` of a packed segment
#[inline(always)]
pub fn write_half(segment: &mut [u32], j: usize, value: u16) {
    let shift = (j % 2) * 16;
    let word = &mut segment[j / 2];
    *word = (*word & !(0xFFFF << shift)) | ((value as u32) << shift);
}

/// Layout of a plastic row for a given pre-synaptic trace size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlasticRowLayout {
    pre_trace_words: usize,
}

impl PlasticRowLayout {
    /// Layout with `pre_trace_words` words of pre-synaptic trace
    pub const fn new(pre_trace_words: usize) -> Self {
        Self { pre_trace_words }
    }

    /// Pre-synaptic trace words
    pub const fn pre_trace_words(&self) -> usize {
        self.pre_trace_words
    }

    /// First word of the pre-synaptic trace
    pub const fn pre_trace_start(&self) -> usize {
        PLASTIC_HEADER_WORDS
    }

    /// First word of the plastic segment
    pub const fn plastic_start(&self) -> usize {
        PLASTIC_HEADER_WORDS + self.pre_trace_words
    }

    /// First word of the control segment
    pub const fn control_start(&self, num_synapses: usize) -> usize {
        self.plastic_start() + half_words(num_synapses)
    }

    /// Words occupied by a plastic row of `num_synapses`
    pub const fn row_words(&self, num_synapses: usize) -> usize {
        self.control_start(num_synapses) + half_words(num_synapses)
    }
}
