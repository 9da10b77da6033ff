//! SD card bring-up configurations for the SPI-attached memo card.
//!
//! The card sits on a bus that it may share with other SPI peripherals.
//! Marginal cards (and long flex cables) frequently fail to initialise at
//! the nominal clock or while another device holds the bus, so bring-up
//! walks a fixed, ordered list of configurations and keeps the first one
//! that works.
//!
//! ```text
//! attempt 1: shared bus    @ 400 kHz
//! attempt 2: dedicated bus @ 400 kHz
//! attempt 3: dedicated bus @ 250 kHz
//! ```
//!
//! This is not a backoff policy: adding an attempt means adding a row to
//! [`MOUNT_SEQUENCE`].

/// Whether the SD card shares its SPI bus with other peripherals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusMode {
    /// Chip select is released between transactions so other devices can
    /// use the bus.
    Shared,
    /// The card owns the bus; chip select may stay asserted across a
    /// multi-block transfer.
    Dedicated,
}

impl BusMode {
    /// Short label for logs and status displays.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Dedicated => "dedicated",
        }
    }
}

/// One storage bring-up attempt: bus sharing mode plus SPI clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MountConfig {
    /// Bus sharing mode.
    pub bus: BusMode,
    /// SPI clock in Hz.
    pub clock_hz: u32,
}

impl MountConfig {
    /// Build a configuration descriptor.
    pub const fn new(bus: BusMode, clock_hz: u32) -> Self {
        Self { bus, clock_hz }
    }

    /// Clock in kHz, for log lines.
    pub const fn clock_khz(&self) -> u32 {
        self.clock_hz / 1_000
    }
}

/// SD identification-mode clock ceiling (SD Physical Layer spec §4.4).
pub const SD_INIT_CLOCK_HZ: u32 = 400_000;

/// Fallback clock for cards that are unstable at the identification ceiling.
pub const SD_SLOW_CLOCK_HZ: u32 = 250_000;

/// Ordered bring-up attempts, tried first to last.
pub const MOUNT_SEQUENCE: [MountConfig; 3] = [
    MountConfig::new(BusMode::Shared, SD_INIT_CLOCK_HZ),
    MountConfig::new(BusMode::Dedicated, SD_INIT_CLOCK_HZ),
    MountConfig::new(BusMode::Dedicated, SD_SLOW_CLOCK_HZ),
];
