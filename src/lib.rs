//! Glue between the `mcp3424` driver and a real ADC Pi board.

use anyhow::Context;
use embedded_hal::i2c::I2c;
use mcp3424::{AdcPi, Channel, HalBus, Transport};
use tracing::info;

pub mod logging;
pub mod settings;

pub use settings::Settings;

/// Wrap `i2c` in a driver and push `settings` to both chips.
pub fn open_board<I2C>(i2c: I2C, settings: &Settings) -> anyhow::Result<AdcPi<HalBus<I2C>>>
where
    I2C: I2c,
    I2C::Error: Send + Sync + 'static,
{
    let mut adc = AdcPi::new(HalBus::new(i2c), settings.address);

    adc.set_gain(settings.gain.multiplier())
        .context("failed to set gain")?;
    adc.set_resolution(settings.resolution.bits())
        .context("failed to set resolution")?;
    adc.set_conversion_mode(settings.mode as u8)?;

    info!(
        address = adc.address(),
        config = adc.config_byte(),
        "configured ADC Pi"
    );

    Ok(adc)
}

/// Read the voltage of every channel, in channel order.
pub fn sweep<T>(adc: &mut AdcPi<T>) -> anyhow::Result<[f64; 8]>
where
    T: Transport,
    T::Error: Send + Sync + 'static,
{
    let mut volts = [0.0; 8];

    for (slot, channel) in volts.iter_mut().zip(Channel::all()) {
        *slot = adc
            .read_voltage(channel.number())
            .with_context(|| format!("failed to read channel {}", channel.number()))?;
    }

    Ok(volts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{Error, ErrorKind, ErrorType, Operation};
    use mcp3424::{ConversionMode, Gain, Resolution};

    #[derive(Debug)]
    struct MockError;

    impl Error for MockError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Answers every read with a ready 16-bit frame whose code is the chip address.
    #[derive(Default)]
    struct MockI2c {
        written: Vec<(u8, u8)>,
    }

    impl ErrorType for MockI2c {
        type Error = MockError;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        self.written.extend(bytes.iter().map(|byte| (address, *byte)))
                    }
                    Operation::Read(buffer) => {
                        buffer.fill(0);
                        buffer[1] = address;
                    }
                }
            }

            Ok(())
        }
    }

    #[test]
    fn open_board_configures_both_chips() {
        let settings = Settings {
            gain: Gain::X2,
            resolution: Resolution::Bits16,
            mode: ConversionMode::OneShot,
            ..Settings::default()
        };

        let adc = open_board(MockI2c::default(), &settings).unwrap();

        assert_eq!(adc.gain(), Gain::X2);
        assert_eq!(adc.resolution(), Resolution::Bits16);
        assert_eq!(adc.conversion_mode(), ConversionMode::OneShot);
        assert_eq!(adc.config().pack(), adc.config_byte());

        let written = adc.release().release().written;
        assert_eq!(
            written,
            [(0x68, 0x9D), (0x69, 0x9D), (0x68, 0x99), (0x69, 0x99)]
        );
    }

    #[test]
    fn sweep_reads_every_channel() {
        let settings = Settings {
            resolution: Resolution::Bits16,
            ..Settings::default()
        };

        let mut adc = open_board(MockI2c::default(), &settings).unwrap();
        let volts = sweep(&mut adc).unwrap();

        for (index, volt) in volts.iter().enumerate() {
            let address = if index < 4 { 0x68 } else { 0x69 };
            assert_eq!(*volt, address as f64 * (0.00003125 / 0.5) * 2.471);
        }

        assert_eq!(adc.current_channel(), 8);
    }
}
