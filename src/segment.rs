use crate::constants::{DIGITS_PER_DISPLAY, RAM_SIZE, SEGMENT_COUNT};

/// The fourteen segments of a digit, in glyph bit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Segment {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
}

// (common, row offset) per segment. H and I share commons 1 and 0 with B and A on
// the second half of the rows.
const WIRING: [(u8, u8); SEGMENT_COUNT] = [
    (0, 0), // A
    (1, 0), // B
    (2, 0), // C
    (3, 0), // D
    (4, 0), // E
    (5, 0), // F
    (6, 0), // G
    (1, 4), // H
    (0, 4), // I
    (2, 4), // J
    (3, 4), // K
    (4, 4), // L
    (5, 4), // M
    (6, 4), // N
];

impl Segment {
    pub const ALL: [Segment; SEGMENT_COUNT] = [
        Segment::A,
        Segment::B,
        Segment::C,
        Segment::D,
        Segment::E,
        Segment::F,
        Segment::G,
        Segment::H,
        Segment::I,
        Segment::J,
        Segment::K,
        Segment::L,
        Segment::M,
        Segment::N,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        if !letter.is_ascii_uppercase() {
            return None;
        }
        Self::from_index(letter as u8 - b'A')
    }

    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }

    /// Bit of this segment within a glyph mask.
    pub fn bit(self) -> u16 {
        1 << self as u8
    }

    pub fn common(self) -> u8 {
        WIRING[self as usize].0
    }

    fn row_offset(self) -> u8 {
        WIRING[self as usize].1
    }
}

/// A single bit in the flat RAM image of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RamLocation {
    pub offset: usize,
    pub mask: u8,
}

/// Resolves where `segment` of logical `digit` lives in the RAM image.
///
/// Digits are numbered across the whole chain, four per chip, so digit 5 is the
/// second digit of the second chip and lands in the second 16 byte block. No
/// bounds check is done against the chain length.
pub fn locate(segment: Segment, digit: u8) -> RamLocation {
    let row = digit % DIGITS_PER_DISPLAY + segment.row_offset();
    let block = (digit / DIGITS_PER_DISPLAY) as usize * RAM_SIZE;
    let mut offset = segment.common() as usize * 2 + block;
    if row > 7 {
        offset += 1;
    }
    RamLocation {
        offset,
        mask: 1 << (row % 8),
    }
}

/// Lit segments of a glyph mask, lowest bit first.
pub fn segments_of(mask: u16) -> impl Iterator<Item = Segment> {
    Segment::ALL.into_iter().filter(move |s| mask & s.bit() != 0)
}
