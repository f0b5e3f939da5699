//! Provides a driver for the ADC Pi board: a pair of Microchip MCP3424 ADCs sharing one
//! logical configuration register, giving eight single-ended channels over I2C.
//!
//! The driver is written against the small [`transport::Transport`] contract. With the
//! `hal` feature (on by default), [`transport::HalBus`] adapts any `embedded-hal` I2C bus.

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

pub mod adc_pi;
pub mod config;
pub mod transport;

pub use adc_pi::{AdcPi, RawSample, POLL_LIMIT, VOLTAGE_SCALE};
pub use config::{Channel, Config, ConversionMode, Gain, Resolution};
pub use transport::{Session, Transport};

#[cfg(feature = "hal")]
pub use transport::HalBus;

/// A value supplied by the caller fell outside the domain the chip supports.
///
/// Each variant carries the rejected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("gain {0} out of range: 1, 2, 4, 8")]
    Gain(u8),
    #[error("resolution {0} out of range: 12, 14, 16, 18")]
    Resolution(u8),
    #[error("conversion mode {0} out of range: 0 or 1")]
    ConversionMode(u8),
    #[error("channel {0} out of range: 1 to 8")]
    Channel(u8),
    #[error("bit value {0} out of range: 0 or 1")]
    BitValue(u8),
    #[error("bit index {0} out of range: 0 to 7")]
    BitIndex(u8),
}

/// Errors returned by [`AdcPi`] operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error<E> {
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    /// The bus failed to open, write or read. The session has already been closed.
    #[error("transport failure: {0:?}")]
    Transport(E),
}

/// Set (`value == 1`) or clear (`value == 0`) bit `bit` of `byte`.
pub fn update_bit(byte: u8, bit: u8, value: u8) -> Result<u8, InvalidArgument> {
    if bit > 7 {
        return Err(InvalidArgument::BitIndex(bit));
    }

    match value {
        0 => Ok(byte & !(1 << bit)),
        1 => Ok(byte | (1 << bit)),
        _ => Err(InvalidArgument::BitValue(value)),
    }
}
