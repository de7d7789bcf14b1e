pub const DEFAULT_ADDRESS: u8 = 0x70;
pub const NOTHING_ATTACHED: u8 = 0xFF;
pub const MAX_DISPLAYS: usize = 4;
pub const DIGITS_PER_DISPLAY: u8 = 4;
pub const MAX_DIGITS: usize = MAX_DISPLAYS * DIGITS_PER_DISPLAY as usize;
pub const RAM_SIZE: usize = 16; // per chip
pub const MAX_RAM: usize = MAX_DISPLAYS * RAM_SIZE;
pub const SEGMENT_COUNT: usize = 14;
pub const SEGMENT_MASK: u16 = 0x3FFF; // 14 bits
pub const MAX_BRIGHTNESS: u8 = 15; // 4 bits
pub const CONNECT_ATTEMPTS: u8 = 20;
pub const CONNECT_DELAY_MS: u32 = 1;

pub mod command {
    pub const DISPLAY_DATA: u8 = 0x00; // RAM pointer, low nibble is the start address
    pub const SYSTEM_SETUP: u8 = 0x20;
    pub const DISPLAY_SETUP: u8 = 0x80;
    pub const DIMMING_SETUP: u8 = 0xE0;

    pub mod system_setup {
        pub const STANDBY: u8 = 0x00; // bit 0 clear: oscillator off
        pub const OSCILLATOR_ON: u8 = 0x01; // bit 0 set: normal operation
    }

    pub mod display_setup {
        pub const DISPLAY_OFF: u8 = 0x00; // bit 0 clear
        pub const DISPLAY_ON: u8 = 0x01; // bit 0 set
        pub const BLINK_SHIFT: u8 = 1; // bits 2:1 select the blink frequency
    }
}

/// Status LEDs that live outside the segment area of a chip's RAM.
pub mod status {
    pub const COLON_OFFSET: usize = 0x01;
    pub const DECIMAL_OFFSET: usize = 0x03;
    pub const BIT: u8 = 0x01;
}
