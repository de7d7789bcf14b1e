//! Driver for up to four chained Holtek HT16K33 controllers, each wired to a
//! four digit, fourteen-segment alphanumeric display.
//!
//! Text is rendered into a RAM image held by [`DisplayBuffer`] and pushed to the
//! chips 16 bytes at a time after every change.
//!
//! ```ignore
//! let mut display = HT16K33::new(i2c, &[0x70, 0x71])?;
//! display.init(&mut delay)?;
//! display.display_string("HELLO")?;
//! display.decimal_on_single(0)?;
//! ```
#![cfg_attr(not(test), no_std)]

pub mod buffer;
pub mod chain;
mod constants;
pub mod glyph;
pub mod segment;

pub use buffer::{DisplayBuffer, Status};
pub use chain::Chain;
pub use constants::*;
pub use glyph::Glyphs;
pub use segment::{RamLocation, Segment};

use core::fmt::Write;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use num_traits::ToPrimitive;

/// Initialization progress of a chain. Only `Ready` accepts display writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChainState {
    Uninitialized,
    ClockEnabled,
    BrightnessSet,
    BlinkSet,
    DisplayOn,
    Ready,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BlinkRate {
    #[default]
    NoBlink = 0,
    Hz2 = 1,
    Hz1 = 2,
    HalfHz = 3,
}

pub struct HT16K33<I2C> {
    pub i2c: I2C,
    chain: Chain,
    buffer: DisplayBuffer,
    state: ChainState,
    blink_rate: BlinkRate,
    display_on: bool,
}

impl<I2C, E> HT16K33<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C, addresses: &[u8]) -> Result<Self, Error<E>> {
        let chain = Chain::new(addresses).ok_or(Error::InvalidChain)?;
        Ok(Self::with_chain(i2c, chain))
    }

    pub fn with_chain(i2c: I2C, chain: Chain) -> Self {
        Self {
            i2c,
            buffer: DisplayBuffer::new(chain.len()),
            chain,
            state: ChainState::Uninitialized,
            blink_rate: BlinkRate::NoBlink,
            display_on: false,
        }
    }

    pub fn destroy(self) -> I2C {
        self.i2c
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn buffer(&self) -> &DisplayBuffer {
        &self.buffer
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Probes every chip, then brings the chain up: oscillator on, full
    /// brightness, no blink, display on and blank RAM.
    ///
    /// On error the state stays at the last step that succeeded and the chain
    /// refuses further writes until `init` is run again.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        self.state = ChainState::Uninitialized;

        for display in 0..self.chain.len() {
            if !self.is_connected(display, delay) {
                let address = self.address(display)?;
                #[cfg(feature = "defmt")]
                defmt::warn!("display {=u8:#x} did not acknowledge", address);
                return Err(Error::NotConnected(address));
            }
        }

        self.each_display(|this, display| this.write_system_setup(display, true, delay))?;
        self.advance(ChainState::ClockEnabled);

        self.each_display(|this, display| this.write_dimming(display, MAX_BRIGHTNESS))?;
        self.advance(ChainState::BrightnessSet);

        self.blink_rate = BlinkRate::NoBlink;
        self.each_display(|this, display| this.write_display_setup(display))?;
        self.advance(ChainState::BlinkSet);

        self.display_on = true;
        self.each_display(|this, display| this.write_display_setup(display))?;
        self.advance(ChainState::DisplayOn);

        self.buffer.clear();
        self.update_display()?;
        self.advance(ChainState::Ready);
        Ok(())
    }

    /// Checks that `display` acknowledges its address, retrying a few times
    /// since the chip occasionally misses one.
    pub fn is_connected<D: DelayNs>(&mut self, display: u8, delay: &mut D) -> bool {
        let Some(address) = self.chain.address(display) else {
            return false;
        };
        for _ in 0..CONNECT_ATTEMPTS {
            if self.i2c.write(address, &[]).is_ok() {
                return true;
            }
            delay.delay_ms(CONNECT_DELAY_MS);
        }
        false
    }

    pub fn clear(&mut self) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.buffer.clear();
        self.update_display()
    }

    /// Pushes the RAM image to every chip.
    pub fn flush(&mut self) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.update_display()
    }

    pub fn display_ascii(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.buffer.write_stream(bytes.iter().copied());
        self.update_display()
    }

    /// Like [`display_ascii`](Self::display_ascii); characters outside ASCII
    /// show as the unknown glyph, one digit each.
    pub fn display_string(&mut self, string: &str) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        let bytes = string
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { 0xFF });
        self.buffer.write_stream(bytes);
        self.update_display()
    }

    /// Shows a whole number. Values with a fractional part are rejected, use
    /// [`display_float`](Self::display_float) for those.
    pub fn display_number<T>(&mut self, number: T) -> Result<(), Error<E>>
    where
        T: ToPrimitive,
    {
        let num = number.to_i64().ok_or(Error::InvalidValue)?;
        if number.to_f64() != Some(num as f64) {
            return Err(Error::InvalidValue);
        }
        let mut text = heapless::String::<24>::new();
        write!(text, "{}", num).map_err(|_| Error::InvalidValue)?;
        self.display_ascii(text.as_bytes())
    }

    pub fn display_hex_number<T>(&mut self, number: T) -> Result<(), Error<E>>
    where
        T: ToPrimitive,
    {
        let num = number.to_u64().ok_or(Error::InvalidValue)?;
        let mut text = heapless::String::<24>::new();
        write!(text, "{:X}", num).map_err(|_| Error::InvalidValue)?;
        self.display_ascii(text.as_bytes())
    }

    /// Shows `value` with `precision` fractional digits. The decimal point is
    /// drawn with the status bit, so it does not take a digit of its own.
    pub fn display_float<T>(&mut self, value: T, precision: u8) -> Result<(), Error<E>>
    where
        T: ToPrimitive,
    {
        let num = value.to_f64().ok_or(Error::InvalidValue)?;
        if !num.is_finite() || precision >= self.buffer.digits() {
            return Err(Error::InvalidValue);
        }
        let mut text = heapless::String::<32>::new();
        write!(text, "{:.*}", precision as usize, num).map_err(|_| Error::InvalidValue)?;
        let width = text.bytes().filter(|&b| b != b'.').count();
        if width > self.buffer.digits() as usize {
            return Err(Error::InvalidValue);
        }
        self.display_ascii(text.as_bytes())
    }

    /// Writes one character at the cursor on top of what is shown.
    pub fn write_byte(&mut self, ch: u8) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.buffer.write_byte(ch);
        self.update_display()
    }

    pub fn shift_left(&mut self, amount: u8) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.check_shift(amount)?;
        self.buffer.shift_left(amount);
        self.update_display()
    }

    pub fn shift_right(&mut self, amount: u8) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.check_shift(amount)?;
        self.buffer.shift_right(amount);
        self.update_display()
    }

    /// Redefines the glyph for a character in `'!'..='~'`. Takes effect on the
    /// next write; what is already shown is left alone.
    pub fn define_char(&mut self, ch: u8, segments: u16) -> Result<(), Error<E>> {
        self.buffer
            .glyphs_mut()
            .define(ch, segments)
            .map(|_| ())
            .ok_or(Error::InvalidCharacter(ch))
    }

    pub fn set_brightness(&mut self, duty: u8) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.each_display(|this, display| this.write_dimming(display, duty))
    }

    /// Duty is 0 to 15, larger values are clamped.
    pub fn set_brightness_single(&mut self, display: u8, duty: u8) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.write_dimming(display, duty)
    }

    pub fn set_blink_rate(&mut self, rate: BlinkRate) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.blink_rate = rate;
        self.each_display(|this, display| this.write_display_setup(display))
    }

    pub fn set_blink_rate_single(&mut self, display: u8, rate: BlinkRate) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.blink_rate = rate;
        self.write_display_setup(display)
    }

    pub fn display_on(&mut self) -> Result<(), Error<E>> {
        self.set_display(true)
    }

    pub fn display_off(&mut self) -> Result<(), Error<E>> {
        self.set_display(false)
    }

    pub fn display_on_single(&mut self, display: u8) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.display_on = true;
        self.write_display_setup(display)
    }

    pub fn display_off_single(&mut self, display: u8) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.display_on = false;
        self.write_display_setup(display)
    }

    pub fn decimal_on(&mut self) -> Result<(), Error<E>> {
        self.set_status_all(Status::Decimal, true)
    }

    pub fn decimal_off(&mut self) -> Result<(), Error<E>> {
        self.set_status_all(Status::Decimal, false)
    }

    pub fn decimal_on_single(&mut self, display: u8) -> Result<(), Error<E>> {
        self.set_status_single(display, Status::Decimal, true)
    }

    pub fn decimal_off_single(&mut self, display: u8) -> Result<(), Error<E>> {
        self.set_status_single(display, Status::Decimal, false)
    }

    pub fn colon_on(&mut self) -> Result<(), Error<E>> {
        self.set_status_all(Status::Colon, true)
    }

    pub fn colon_off(&mut self) -> Result<(), Error<E>> {
        self.set_status_all(Status::Colon, false)
    }

    pub fn colon_on_single(&mut self, display: u8) -> Result<(), Error<E>> {
        self.set_status_single(display, Status::Colon, true)
    }

    pub fn colon_off_single(&mut self, display: u8) -> Result<(), Error<E>> {
        self.set_status_single(display, Status::Colon, false)
    }

    pub fn enable_system_clock<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.each_display(|this, display| this.write_system_setup(display, true, delay))
    }

    /// Puts every chip in standby. The RAM is kept but nothing is shown.
    pub fn disable_system_clock<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.each_display(|this, display| this.write_system_setup(display, false, delay))
    }

    pub fn enable_system_clock_single<D: DelayNs>(
        &mut self,
        display: u8,
        delay: &mut D,
    ) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.write_system_setup(display, true, delay)
    }

    pub fn disable_system_clock_single<D: DelayNs>(
        &mut self,
        display: u8,
        delay: &mut D,
    ) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.write_system_setup(display, false, delay)
    }

    /// Reads chip RAM starting at `register` back into `buffer`, after waiting
    /// for the chip to acknowledge its address.
    pub fn read_ram<D: DelayNs>(
        &mut self,
        display: u8,
        register: u8,
        buffer: &mut [u8],
        delay: &mut D,
    ) -> Result<(), Error<E>> {
        let address = self.address(display)?;
        if !self.is_connected(display, delay) {
            return Err(Error::NotConnected(address));
        }
        self.i2c.write_read(
            address,
            &[command::DISPLAY_DATA | (register & 0x0F)],
            buffer,
        )?;
        Ok(())
    }

    fn set_display(&mut self, on: bool) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.display_on = on;
        self.each_display(|this, display| this.write_display_setup(display))
    }

    fn set_status_single(&mut self, display: u8, status: Status, on: bool) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        self.address(display)?;
        self.buffer.set_status(display, status, on);
        self.update_display()
    }

    fn set_status_all(&mut self, status: Status, on: bool) -> Result<(), Error<E>> {
        self.ensure_ready()?;
        for display in 0..self.chain.len() {
            self.buffer.set_status(display, status, on);
        }
        self.update_display()
    }

    fn check_shift(&self, amount: u8) -> Result<(), Error<E>> {
        if amount >= self.buffer.digits() {
            return Err(Error::InvalidShift(amount));
        }
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), Error<E>> {
        if self.state != ChainState::Ready {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    fn advance(&mut self, state: ChainState) {
        #[cfg(feature = "defmt")]
        defmt::debug!("chain state {}", state);
        self.state = state;
    }

    fn address(&self, display: u8) -> Result<u8, Error<E>> {
        self.chain.address(display).ok_or(Error::InvalidDisplay(display))
    }

    // Runs `op` against every display even if one fails and reports the first
    // failure.
    fn each_display<F>(&mut self, mut op: F) -> Result<(), Error<E>>
    where
        F: FnMut(&mut Self, u8) -> Result<(), Error<E>>,
    {
        let mut result = Ok(());
        for display in 0..self.chain.len() {
            if let Err(error) = op(self, display) {
                #[cfg(feature = "defmt")]
                defmt::warn!("display {=u8} failed", display);
                if result.is_ok() {
                    result = Err(error);
                }
            }
        }
        result
    }

    fn update_display(&mut self) -> Result<(), Error<E>> {
        let mut result = Ok(());
        for display in 0..self.chain.len() {
            let address = self.address(display)?;
            let mut frame = [0; RAM_SIZE + 1];
            frame[0] = command::DISPLAY_DATA;
            if let Some(ram) = self.buffer.chip_ram(display) {
                frame[1..].copy_from_slice(ram);
            }
            if let Err(error) = self.i2c.write(address, &frame) {
                #[cfg(feature = "defmt")]
                defmt::warn!("RAM update failed at display {=u8:#x}", address);
                if result.is_ok() {
                    result = Err(Error::I2cError(error));
                }
            }
        }
        result
    }

    fn write_system_setup<D: DelayNs>(
        &mut self,
        display: u8,
        enable: bool,
        delay: &mut D,
    ) -> Result<(), Error<E>> {
        let value = if enable {
            command::system_setup::OSCILLATOR_ON
        } else {
            command::system_setup::STANDBY
        };
        self.write_command(display, command::SYSTEM_SETUP | value)?;
        if enable {
            // oscillator start-up
            delay.delay_ms(1);
        }
        Ok(())
    }

    fn write_dimming(&mut self, display: u8, duty: u8) -> Result<(), Error<E>> {
        let duty = duty.min(MAX_BRIGHTNESS);
        self.write_command(display, command::DIMMING_SETUP | duty)
    }

    fn write_display_setup(&mut self, display: u8) -> Result<(), Error<E>> {
        let on = if self.display_on {
            command::display_setup::DISPLAY_ON
        } else {
            command::display_setup::DISPLAY_OFF
        };
        let value = ((self.blink_rate as u8) << command::display_setup::BLINK_SHIFT) | on;
        self.write_command(display, command::DISPLAY_SETUP | value)
    }

    fn write_command(&mut self, display: u8, command: u8) -> Result<(), Error<E>> {
        let address = self.address(display)?;
        self.i2c.write(address, &[command])?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    I2cError(E),
    NotConnected(u8),
    NotInitialized,
    InvalidChain,
    InvalidCharacter(u8),
    InvalidDisplay(u8),
    InvalidShift(u8),
    InvalidValue,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Error::I2cError(error)
    }
}
