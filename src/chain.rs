use heapless::Vec;

use crate::constants::{DIGITS_PER_DISPLAY, MAX_DISPLAYS, NOTHING_ATTACHED};

/// Ordered chip addresses, left to right. Fixed once built.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Chain {
    addresses: Vec<u8, MAX_DISPLAYS>,
}

impl Chain {
    /// Builds a chain of one to four chips. Returns `None` for an empty or
    /// oversized list.
    pub fn new(addresses: &[u8]) -> Option<Self> {
        if addresses.is_empty() {
            return None;
        }
        Vec::from_slice(addresses)
            .ok()
            .map(|addresses| Self { addresses })
    }

    /// Builds a chain from the four fixed positions (left, left-center,
    /// right-center, right). The last slot not set to [`NOTHING_ATTACHED`]
    /// decides the length; the left slot is always used.
    pub fn from_slots(slots: [u8; MAX_DISPLAYS]) -> Self {
        let len = slots
            .iter()
            .rposition(|&address| address != NOTHING_ATTACHED)
            .map_or(1, |last| last + 1);
        // capacity matches the slot count, so this never falls back
        let addresses = Vec::from_slice(&slots[..len]).unwrap_or_default();
        Self { addresses }
    }

    pub fn len(&self) -> u8 {
        self.addresses.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn digits(&self) -> u8 {
        self.len() * DIGITS_PER_DISPLAY
    }

    pub fn address(&self, display: u8) -> Option<u8> {
        self.addresses.get(display as usize).copied()
    }

    pub fn position(&self, address: u8) -> Option<u8> {
        self.addresses
            .iter()
            .position(|&a| a == address)
            .map(|p| p as u8)
    }

    pub fn addresses(&self) -> &[u8] {
        &self.addresses
    }
}
