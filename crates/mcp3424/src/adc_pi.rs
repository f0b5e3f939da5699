use tracing::{debug, trace, warn};

use crate::config::{
    update_field, Channel, Config, ConversionMode, Gain, Resolution, CHANNEL_BITS, GAIN_BITS,
    MODE_BIT, READY_BIT, RESOLUTION_BITS,
};
use crate::transport::{with_session, Session, Transport};
use crate::{update_bit, Error, InvalidArgument};

/// Frames read while waiting for a conversion before giving up and reporting zero.
pub const POLL_LIMIT: usize = 1000;

/// Correction for the board's input voltage divider.
pub const VOLTAGE_SCALE: f64 = 2.471;

/// A decoded conversion result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    /// Magnitude bits with the sign bit cleared.
    pub code: i32,
    /// The chip flagged the sample as negative.
    pub negative: bool,
}

/// ADC Pi driver
///
/// Both chips on the board are kept on the same configuration: every setter that changes
/// the register writes it to the base address and to base + 1.
///
/// Reads block until the chip reports a fresh conversion or [`POLL_LIMIT`] frames have
/// been read. A timeout is not an error; the read reports a code of zero, which callers
/// cannot tell apart from a genuine zero-volt sample.
pub struct AdcPi<T> {
    bus: T,
    address: u8,
    config: Config,
    config_byte: u8,
    current_channel: Channel,
    sign_bit: bool,
}

impl<T: Transport> AdcPi<T> {
    /// Creates a driver for the board whose first chip sits at `address`, assuming the
    /// power-on configuration: x1 gain, 18 bit, continuous conversion, channel 1.
    ///
    /// No bus traffic occurs.
    pub fn new(bus: T, address: u8) -> Self {
        Self::with_config(bus, address, Config::default())
    }

    /// Creates a driver assuming the chips already hold `config`.
    ///
    /// No bus traffic occurs; use the setters to push a configuration to the chips.
    pub fn with_config(bus: T, address: u8, config: Config) -> Self {
        Self {
            bus,
            address,
            config,
            config_byte: config.pack(),
            current_channel: config.channel,
            sign_bit: false,
        }
    }

    /// Set the amplifier gain: 1, 2, 4 or 8.
    pub fn set_gain(&mut self, gain: u8) -> Result<(), Error<T::Error>> {
        let gain = Gain::try_from(gain)?;
        let byte = update_field(self.config_byte, GAIN_BITS, gain.code())?;

        self.config.gain = gain;
        self.config_byte = byte;

        self.write_config()
    }

    /// Set the sample resolution: 12, 14, 16 or 18 bits.
    pub fn set_resolution(&mut self, bits: u8) -> Result<(), Error<T::Error>> {
        let resolution = Resolution::try_from(bits)?;
        let byte = update_field(self.config_byte, RESOLUTION_BITS, resolution.code())?;

        self.config.resolution = resolution;
        self.config_byte = byte;

        self.write_config()
    }

    /// Set the conversion mode: 0 for one-shot, 1 for continuous.
    ///
    /// Nothing is written to the bus. The new mode reaches the chip with the next read.
    pub fn set_conversion_mode(&mut self, mode: u8) -> Result<(), InvalidArgument> {
        let mode = ConversionMode::try_from(mode)?;
        let byte = update_bit(self.config_byte, MODE_BIT, mode as u8)?;

        self.config.mode = mode;
        self.config_byte = byte;

        Ok(())
    }

    /// Point the channel select bits at `channel` (1 to 8) and return the bus address of
    /// the chip that owns it.
    pub fn select_channel(&mut self, channel: u8) -> Result<u8, InvalidArgument> {
        let channel = Channel::try_from(channel)?;
        let byte = update_field(self.config_byte, CHANNEL_BITS, channel.select_code())?;

        self.config.channel = channel;
        self.config_byte = byte;
        self.current_channel = channel;

        let address = if channel.is_upper() {
            self.upper_address()
        } else {
            self.address
        };

        debug!(channel = channel.number(), address, "selected channel");

        Ok(address)
    }

    /// Read the raw conversion result of `channel` (1 to 8).
    pub fn read_raw(&mut self, channel: u8) -> Result<RawSample, Error<T::Error>> {
        let address = self.select_channel(channel)?;
        let resolution = self.config.resolution;

        // In one-shot mode the ready bit doubles as the start-conversion command.
        let trigger = match self.config.mode {
            ConversionMode::OneShot => Some(self.config_byte | 1 << READY_BIT),
            ConversionMode::Continuous => None,
        };

        let mut buffer = [0; 4];
        let len = resolution.frame_len();

        self.sign_bit = false;

        let ready = with_session(&mut self.bus, address, |session| {
            if let Some(trigger) = trigger {
                session.write_byte(trigger)?;
            }

            poll(session, &mut buffer[..len])
        })
        .map_err(Error::Transport)?;

        if !ready {
            warn!(channel, address, "conversion not ready after {POLL_LIMIT} reads");
            return Ok(RawSample::default());
        }

        let sample = decode(resolution, &buffer[..len]);
        self.sign_bit = sample.negative;

        Ok(sample)
    }

    /// Read `channel` (1 to 8) and convert the result to volts.
    ///
    /// Samples flagged negative are treated as noise and reported as 0.
    pub fn read_voltage(&mut self, channel: u8) -> Result<f64, Error<T::Error>> {
        let sample = self.read_raw(channel)?;

        if sample.negative {
            return Ok(0.0);
        }

        Ok(sample.code as f64 * (self.lsb() / self.pga()) * VOLTAGE_SCALE)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Address of the chip serving channels 5 to 8.
    pub fn upper_address(&self) -> u8 {
        self.address.wrapping_add(1)
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// The register image last written, or to be written by the next read.
    pub fn config_byte(&self) -> u8 {
        self.config_byte
    }

    pub fn gain(&self) -> Gain {
        self.config.gain
    }

    pub fn pga(&self) -> f64 {
        self.config.gain.scale()
    }

    pub fn resolution(&self) -> Resolution {
        self.config.resolution
    }

    pub fn lsb(&self) -> f64 {
        self.config.resolution.lsb()
    }

    pub fn conversion_mode(&self) -> ConversionMode {
        self.config.mode
    }

    /// Channel targeted by the last select or read.
    pub fn current_channel(&self) -> u8 {
        self.current_channel.number()
    }

    /// Whether the last read returned a sample flagged negative.
    pub fn sign_bit(&self) -> bool {
        self.sign_bit
    }

    pub fn transport(&self) -> &T {
        &self.bus
    }

    /// Recover the transport.
    pub fn release(self) -> T {
        self.bus
    }

    fn write_config(&mut self) -> Result<(), Error<T::Error>> {
        let byte = self.config_byte;

        for address in [self.address, self.upper_address()] {
            with_session(&mut self.bus, address, |session| session.write_byte(byte))
                .map_err(Error::Transport)?;

            debug!(address, config = byte, "wrote configuration");
        }

        Ok(())
    }
}

/// Read frames until the status byte reports a fresh result. Returns `false` on timeout.
fn poll<S: Session>(session: &mut S, frame: &mut [u8]) -> Result<bool, S::Error> {
    let status = frame.len() - 1;

    for attempt in 0..POLL_LIMIT {
        session.read_frame(frame)?;

        if frame[status] & (1 << READY_BIT) == 0 {
            trace!(attempt, "conversion ready");
            return Ok(true);
        }
    }

    Ok(false)
}

fn decode(resolution: Resolution, frame: &[u8]) -> RawSample {
    let high = frame[0] as u32;
    let mid = frame[1] as u32;

    let raw = match resolution {
        Resolution::Bits18 => (high & 0b11) << 16 | mid << 8 | frame[2] as u32,
        Resolution::Bits16 => high << 8 | mid,
        Resolution::Bits14 => (high & 0b11_1111) << 8 | mid,
        Resolution::Bits12 => (high & 0b1111) << 8 | mid,
    };

    let sign = 1 << resolution.sign_bit();

    RawSample {
        code: (raw & !sign) as i32,
        negative: raw & sign != 0,
    }
}
