//! RAM image and text state for a chain of displays.
//!
//! Nothing here touches the bus. [`HT16K33`](crate::HT16K33) pushes
//! [`DisplayBuffer::ram`] out after every change.

use heapless::Vec;

use crate::constants::{status, DIGITS_PER_DISPLAY, MAX_DIGITS, MAX_DISPLAYS, MAX_RAM, RAM_SIZE};
use crate::glyph::{index_of, Glyphs, COLON_INDEX, DECIMAL_INDEX};
use crate::segment::{locate, segments_of, Segment};

/// Indicators driven by a dedicated RAM bit rather than by glyph segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    Decimal,
    Colon,
}

impl Status {
    fn offset(self) -> usize {
        match self {
            Status::Decimal => status::DECIMAL_OFFSET,
            Status::Colon => status::COLON_OFFSET,
        }
    }

    fn of(ch: u8) -> Option<Self> {
        match index_of(ch) {
            DECIMAL_INDEX => Some(Status::Decimal),
            COLON_INDEX => Some(Status::Colon),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayBuffer {
    ram: Vec<u8, MAX_RAM>,
    shadow: Vec<u8, MAX_DIGITS>,
    cursor: u8,
    glyphs: Glyphs,
}

impl DisplayBuffer {
    /// Creates a blank buffer for `displays` chips, clamped to 1..=4.
    pub fn new(displays: u8) -> Self {
        let displays = (displays as usize).clamp(1, MAX_DISPLAYS);
        Self {
            ram: core::iter::repeat(0).take(displays * RAM_SIZE).collect(),
            shadow: core::iter::repeat(b' ')
                .take(displays * DIGITS_PER_DISPLAY as usize)
                .collect(),
            cursor: 0,
            glyphs: Glyphs::new(),
        }
    }

    pub fn displays(&self) -> u8 {
        (self.ram.len() / RAM_SIZE) as u8
    }

    pub fn digits(&self) -> u8 {
        self.shadow.len() as u8
    }

    pub fn cursor(&self) -> u8 {
        self.cursor
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn chip_ram(&self, display: u8) -> Option<&[u8]> {
        let start = display as usize * RAM_SIZE;
        self.ram.get(start..start + RAM_SIZE)
    }

    /// Last character written at each digit, spaces where nothing was.
    pub fn shadow(&self) -> &[u8] {
        &self.shadow
    }

    pub fn glyphs(&self) -> &Glyphs {
        &self.glyphs
    }

    pub fn glyphs_mut(&mut self) -> &mut Glyphs {
        &mut self.glyphs
    }

    pub fn clear(&mut self) {
        self.ram.fill(0);
        self.shadow.fill(b' ');
        self.cursor = 0;
    }

    /// ORs the glyph for `ch` into `digit` without clearing what is already
    /// lit there. `'.'` and `':'` instead light the status bit of the chip
    /// under the cursor and leave every segment alone, overrides included.
    pub fn write_char(&mut self, ch: u8, digit: u8) {
        if let Some(indicator) = Status::of(ch) {
            let display = self.cursor / DIGITS_PER_DISPLAY;
            self.set_status(display, indicator, true);
            return;
        }

        let digit = digit % self.digits();
        for segment in segments_of(self.glyphs.segments(ch)) {
            let location = locate(segment, digit);
            self.ram[location.offset] |= location.mask;
        }
    }

    /// Writes at the cursor and advances it, wrapping at the end of the chain.
    pub fn write_byte(&mut self, ch: u8) {
        let digit = self.cursor;
        self.write_char(ch, digit);
        if Status::of(ch).is_none() {
            self.shadow[digit as usize] = ch;
            self.cursor = (digit + 1) % self.digits();
        }
    }

    /// Clears everything, then writes `bytes` from the first digit on.
    pub fn write_stream<T>(&mut self, bytes: T)
    where
        T: IntoIterator<Item = u8>,
    {
        self.clear();
        for ch in bytes {
            self.write_byte(ch);
        }
    }

    pub fn shift_left(&mut self, amount: u8) {
        let len = self.shadow.len();
        let amount = (amount as usize).min(len);
        self.shadow.copy_within(amount.., 0);
        self.shadow[len - amount..].fill(b' ');
        self.redraw();
    }

    pub fn shift_right(&mut self, amount: u8) {
        let len = self.shadow.len();
        let amount = (amount as usize).min(len);
        self.shadow.copy_within(..len - amount, amount);
        self.shadow[..amount].fill(b' ');
        self.redraw();
    }

    pub fn set_status(&mut self, display: u8, indicator: Status, on: bool) {
        let offset = display as usize * RAM_SIZE + indicator.offset();
        if let Some(byte) = self.ram.get_mut(offset) {
            if on {
                *byte |= status::BIT;
            } else {
                *byte &= !status::BIT;
            }
        }
    }

    pub fn status(&self, display: u8, indicator: Status) -> bool {
        let offset = display as usize * RAM_SIZE + indicator.offset();
        self.ram
            .get(offset)
            .is_some_and(|byte| byte & status::BIT != 0)
    }

    /// Reads back which segments of `digit` are lit, as a glyph mask.
    pub fn digit_segments(&self, digit: u8) -> u16 {
        Segment::ALL
            .iter()
            .filter(|&&segment| {
                let location = locate(segment, digit);
                self.ram
                    .get(location.offset)
                    .is_some_and(|byte| byte & location.mask != 0)
            })
            .fold(0, |mask, segment| mask | segment.bit())
    }

    fn redraw(&mut self) {
        let content = self.shadow.clone();
        self.write_stream(content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::SEGMENTS;

    fn glyph(ch: u8) -> u16 {
        SEGMENTS[index_of(ch) as usize]
    }

    #[test]
    fn test_sizes() {
        let buffer = DisplayBuffer::new(3);
        assert_eq!(buffer.displays(), 3);
        assert_eq!(buffer.digits(), 12);
        assert_eq!(buffer.ram().len(), 48);
        assert_eq!(buffer.shadow(), b"            ");

        assert_eq!(DisplayBuffer::new(0).displays(), 1);
        assert_eq!(DisplayBuffer::new(9).displays(), 4);
    }

    #[test]
    fn test_writes_accumulate() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.write_char(b'-', 0);
        buffer.write_char(b'|', 0);
        assert_eq!(buffer.digit_segments(0), glyph(b'-') | glyph(b'|'));
    }

    #[test]
    fn test_clear_removes_residue() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.write_char(b'A', 0);
        buffer.clear();
        assert!(buffer.ram().iter().all(|&b| b == 0));
        buffer.write_char(b'B', 0);
        assert_eq!(buffer.digit_segments(0), glyph(b'B'));
    }

    #[test]
    fn test_write_stream() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.write_stream(*b"AB");
        assert_eq!(buffer.digit_segments(0), glyph(b'A'));
        assert_eq!(buffer.digit_segments(1), glyph(b'B'));
        assert_eq!(buffer.digit_segments(2), 0);
        assert_eq!(buffer.digit_segments(3), 0);
        assert_eq!(buffer.cursor(), 2);
        assert_eq!(buffer.shadow(), b"AB  ");
    }

    #[test]
    fn test_write_stream_spans_chips() {
        let mut buffer = DisplayBuffer::new(2);
        buffer.write_stream(*b"HELLO");
        assert_eq!(buffer.digit_segments(4), glyph(b'O'));
        assert_eq!(buffer.chip_ram(1).unwrap()[0] & 0x01, 0x01); // segment A of 'O'
        assert_eq!(buffer.cursor(), 5);
    }

    #[test]
    fn test_cursor_wraps() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.write_stream(*b"ABCDE");
        assert_eq!(buffer.cursor(), 1);
        assert_eq!(buffer.shadow(), b"EBCD");
        assert_eq!(buffer.digit_segments(0), glyph(b'A') | glyph(b'E'));
    }

    #[test]
    fn test_unknown_character() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.write_byte(0x7F);
        assert_eq!(buffer.digit_segments(0), 0x3FFF);
    }

    #[test]
    fn test_decimal_keeps_cursor() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.write_byte(b'A');
        buffer.write_byte(b'.');
        assert_eq!(buffer.cursor(), 1);
        assert_eq!(buffer.digit_segments(0), glyph(b'A'));
        assert!(buffer.status(0, Status::Decimal));
        assert!(!buffer.status(0, Status::Colon));
        assert_eq!(buffer.shadow(), b"A   ");
    }

    #[test]
    fn test_colon_on_cursor_chip() {
        let mut buffer = DisplayBuffer::new(2);
        buffer.write_stream(*b"12345:6");
        assert!(!buffer.status(0, Status::Colon));
        assert!(buffer.status(1, Status::Colon));
        assert_eq!(buffer.cursor(), 6);
    }

    #[test]
    fn test_set_status() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.set_status(0, Status::Colon, true);
        assert_eq!(buffer.ram()[1], 0x01);
        buffer.set_status(0, Status::Colon, false);
        assert_eq!(buffer.ram()[1], 0x00);
        // out of chain
        buffer.set_status(3, Status::Colon, true);
        assert!(buffer.ram().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_shift_left() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.write_stream(*b"TEST");
        buffer.shift_left(1);
        assert_eq!(buffer.shadow(), b"EST ");
        assert_eq!(buffer.digit_segments(0), glyph(b'E'));
        assert_eq!(buffer.digit_segments(3), 0);
    }

    #[test]
    fn test_shift_right() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.write_stream(*b"TEST");
        buffer.shift_right(2);
        assert_eq!(buffer.shadow(), b"  TE");
        assert_eq!(buffer.digit_segments(0), 0);
        assert_eq!(buffer.digit_segments(3), glyph(b'E'));
    }

    #[test]
    fn test_shift_clamps() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.write_stream(*b"TEST");
        buffer.shift_left(200);
        assert_eq!(buffer.shadow(), b"    ");
        buffer.write_stream(*b"TEST");
        buffer.shift_right(4);
        assert_eq!(buffer.shadow(), b"    ");
        assert!(buffer.ram().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_status_override_lights_no_segments() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.glyphs_mut().define(b'.', 0x3FFF);
        buffer.glyphs_mut().define(b':', 0x3FFF);
        buffer.write_byte(b'A');
        buffer.write_byte(b'.');
        buffer.write_byte(b':');
        assert_eq!(buffer.cursor(), 1);
        assert_eq!(buffer.digit_segments(0), glyph(b'A'));
        assert_eq!(buffer.digit_segments(1), 0);
        assert!(buffer.status(0, Status::Decimal));
        assert!(buffer.status(0, Status::Colon));
    }

    #[test]
    fn test_override_renders() {
        let mut buffer = DisplayBuffer::new(1);
        buffer.glyphs_mut().define(b'A', 0x0001);
        buffer.write_byte(b'A');
        assert_eq!(buffer.digit_segments(0), 0x0001);
    }
}
