//! The MCP3424 configuration register.
//!
//! ```text
//!   7      6-5       4        3-2         1-0
//! [RDY] [CHANNEL] [MODE] [RESOLUTION] [GAIN]
//! ```
//!
//! Writing `RDY = 1` in one-shot mode starts a conversion. When reading, `RDY = 0` means
//! the result in the frame is fresh.

use crate::{update_bit, InvalidArgument};

pub(crate) const READY_BIT: u8 = 7;
pub(crate) const MODE_BIT: u8 = 4;
pub(crate) const GAIN_BITS: [u8; 2] = [0, 1];
pub(crate) const RESOLUTION_BITS: [u8; 2] = [2, 3];
pub(crate) const CHANNEL_BITS: [u8; 2] = [5, 6];

/// Programmable gain amplifier setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Gain {
    #[default]
    X1 = 0b00,
    X2 = 0b01,
    X4 = 0b10,
    X8 = 0b11,
}

impl Gain {
    /// Two-bit register code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Amplifier multiplier: 1, 2, 4 or 8.
    pub fn multiplier(self) -> u8 {
        1 << self.code()
    }

    /// Divisor applied to the LSB step when converting a code to volts.
    ///
    /// The board's input divider halves the signal, so x1 gain scales by 0.5.
    pub fn scale(self) -> f64 {
        match self {
            Self::X1 => 0.5,
            Self::X2 => 1.0,
            Self::X4 => 2.0,
            Self::X8 => 4.0,
        }
    }

    fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0b00 => Self::X1,
            0b01 => Self::X2,
            0b10 => Self::X4,
            _ => Self::X8,
        }
    }
}

impl TryFrom<u8> for Gain {
    type Error = InvalidArgument;

    fn try_from(gain: u8) -> Result<Self, Self::Error> {
        match gain {
            1 => Ok(Self::X1),
            2 => Ok(Self::X2),
            4 => Ok(Self::X4),
            8 => Ok(Self::X8),
            _ => Err(InvalidArgument::Gain(gain)),
        }
    }
}

/// Sample resolution. Higher resolutions convert more slowly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Resolution {
    /// 240 samples per second.
    Bits12 = 0b00,
    /// 60 samples per second.
    Bits14 = 0b01,
    /// 15 samples per second.
    Bits16 = 0b10,
    /// 3.75 samples per second.
    #[default]
    Bits18 = 0b11,
}

impl Resolution {
    /// Two-bit register code.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn bits(self) -> u8 {
        12 + 2 * self.code()
    }

    /// Volts per count at x1 gain.
    pub fn lsb(self) -> f64 {
        match self {
            Self::Bits12 => 0.0005,
            Self::Bits14 => 0.000125,
            Self::Bits16 => 0.00003125,
            Self::Bits18 => 0.0000078125,
        }
    }

    /// Bytes read per poll: data bytes followed by the status byte.
    pub fn frame_len(self) -> usize {
        match self {
            Self::Bits18 => 4,
            _ => 3,
        }
    }

    /// Index of the bit flagging a negative sample.
    pub fn sign_bit(self) -> u8 {
        self.bits() - 1
    }

    fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0b00 => Self::Bits12,
            0b01 => Self::Bits14,
            0b10 => Self::Bits16,
            _ => Self::Bits18,
        }
    }
}

impl TryFrom<u8> for Resolution {
    type Error = InvalidArgument;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            12 => Ok(Self::Bits12),
            14 => Ok(Self::Bits14),
            16 => Ok(Self::Bits16),
            18 => Ok(Self::Bits18),
            _ => Err(InvalidArgument::Resolution(bits)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ConversionMode {
    /// Each read must trigger its own conversion.
    OneShot = 0,
    /// The chip free-runs, overwriting its result register.
    #[default]
    Continuous = 1,
}

impl TryFrom<u8> for ConversionMode {
    type Error = InvalidArgument;

    fn try_from(mode: u8) -> Result<Self, Self::Error> {
        match mode {
            0 => Ok(Self::OneShot),
            1 => Ok(Self::Continuous),
            _ => Err(InvalidArgument::ConversionMode(mode)),
        }
    }
}

/// One of the eight board inputs, numbered 1 to 8.
///
/// Channels 1-4 live on the chip at the base address, 5-8 on the chip at base + 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel(u8);

impl Channel {
    pub fn number(self) -> u8 {
        self.0
    }

    /// Two-bit channel select code, shared by 1/5, 2/6, 3/7 and 4/8.
    pub fn select_code(self) -> u8 {
        (self.0 - 1) % 4
    }

    /// Whether the channel belongs to the second chip.
    pub fn is_upper(self) -> bool {
        self.0 > 4
    }

    /// Iterate over all channels.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=8).map(Self)
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self(1)
    }
}

impl TryFrom<u8> for Channel {
    type Error = InvalidArgument;

    fn try_from(channel: u8) -> Result<Self, Self::Error> {
        match channel {
            1..=8 => Ok(Self(channel)),
            _ => Err(InvalidArgument::Channel(channel)),
        }
    }
}

/// Named view of the configuration register.
///
/// Only the channel select code is stored in the register, so [`Config::unpack`] reports
/// channels 1-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub gain: Gain,
    pub resolution: Resolution,
    pub mode: ConversionMode,
    pub channel: Channel,
}

impl Config {
    /// Register image for this configuration. The ready bit is always set, matching the
    /// power-on value `0x9C`.
    pub fn pack(&self) -> u8 {
        1 << READY_BIT
            | self.channel.select_code() << CHANNEL_BITS[0]
            | (self.mode as u8) << MODE_BIT
            | self.resolution.code() << RESOLUTION_BITS[0]
            | self.gain.code() << GAIN_BITS[0]
    }

    pub fn unpack(byte: u8) -> Self {
        let mode = if byte & (1 << MODE_BIT) == 0 {
            ConversionMode::OneShot
        } else {
            ConversionMode::Continuous
        };

        Self {
            gain: Gain::from_code(byte >> GAIN_BITS[0]),
            resolution: Resolution::from_code(byte >> RESOLUTION_BITS[0]),
            mode,
            channel: Channel(((byte >> CHANNEL_BITS[0]) & 0b11) + 1),
        }
    }
}

/// Write a two-bit `code` into `byte` at the bit positions in `bits`, low bit first.
pub(crate) fn update_field(byte: u8, bits: [u8; 2], code: u8) -> Result<u8, InvalidArgument> {
    let byte = update_bit(byte, bits[0], code & 1)?;
    update_bit(byte, bits[1], (code >> 1) & 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_power_on_value() {
        assert_eq!(Config::default().pack(), 0x9C);
        assert_eq!(Config::unpack(0x9C), Config::default());
    }

    #[test]
    fn gain_table() {
        let expected = [(1, 0b00, 0.5), (2, 0b01, 1.0), (4, 0b10, 2.0), (8, 0b11, 4.0)];

        for (multiplier, code, scale) in expected {
            let gain = Gain::try_from(multiplier).unwrap();
            assert_eq!(gain.code(), code);
            assert_eq!(gain.scale(), scale);
            assert_eq!(gain.multiplier(), multiplier);
        }

        assert_eq!(Gain::try_from(3), Err(InvalidArgument::Gain(3)));
    }

    #[test]
    fn resolution_table() {
        let expected = [
            (12, 0b00, 0.0005, 3),
            (14, 0b01, 0.000125, 3),
            (16, 0b10, 0.00003125, 3),
            (18, 0b11, 0.0000078125, 4),
        ];

        for (bits, code, lsb, frame_len) in expected {
            let resolution = Resolution::try_from(bits).unwrap();
            assert_eq!(resolution.code(), code);
            assert_eq!(resolution.bits(), bits);
            assert_eq!(resolution.lsb(), lsb);
            assert_eq!(resolution.frame_len(), frame_len);
            assert_eq!(resolution.sign_bit(), bits - 1);
        }

        assert_eq!(Resolution::try_from(13), Err(InvalidArgument::Resolution(13)));
    }

    #[test]
    fn channel_groups() {
        let codes: Vec<_> = Channel::all().map(|ch| ch.select_code()).collect();
        assert_eq!(codes, [0, 1, 2, 3, 0, 1, 2, 3]);

        let upper: Vec<_> = Channel::all().map(|ch| ch.is_upper()).collect();
        assert_eq!(upper, [false, false, false, false, true, true, true, true]);

        assert_eq!(Channel::try_from(0), Err(InvalidArgument::Channel(0)));
        assert_eq!(Channel::try_from(9), Err(InvalidArgument::Channel(9)));
    }

    #[test]
    fn unpack_inverts_pack() {
        for byte in 0x80..=0xFF {
            assert_eq!(Config::unpack(byte).pack(), byte);
        }
    }

    #[test]
    fn pack_layout() {
        let config = Config {
            gain: Gain::X8,
            resolution: Resolution::Bits12,
            mode: ConversionMode::OneShot,
            channel: Channel::try_from(7).unwrap(),
        };

        assert_eq!(config.pack(), 0b1100_0011);
    }
}
