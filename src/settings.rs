//! Runtime settings for the board binary, read from `ADCPI_*` environment variables.

use std::time::Duration;

use anyhow::{bail, Context};
use mcp3424::{ConversionMode, Gain, Resolution};

pub const BUS_VAR: &str = "ADCPI_I2C_BUS";
pub const ADDRESS_VAR: &str = "ADCPI_ADDRESS";
pub const GAIN_VAR: &str = "ADCPI_GAIN";
pub const RESOLUTION_VAR: &str = "ADCPI_RESOLUTION";
pub const MODE_VAR: &str = "ADCPI_MODE";
pub const INTERVAL_VAR: &str = "ADCPI_INTERVAL_MS";

/// Highest base address that still leaves room for the second chip at base + 1.
const MAX_BASE_ADDRESS: u8 = 0x7E;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Linux I2C bus number, as in `/dev/i2c-N`.
    pub bus: u8,
    /// 7-bit address of the chip serving channels 1-4.
    pub address: u8,
    pub gain: Gain,
    pub resolution: Resolution,
    pub mode: ConversionMode,
    /// Pause between sweeps of all eight channels.
    pub interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bus: 1,
            address: 0x68,
            gain: Gain::X1,
            resolution: Resolution::Bits18,
            mode: ConversionMode::Continuous,
            interval: Duration::from_millis(500),
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from `lookup`, falling back to the defaults for missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut settings = Self::default();

        if let Some(bus) = lookup(BUS_VAR) {
            settings.bus = parse_u8(&bus).with_context(|| format!("invalid {BUS_VAR}"))?;
        }

        if let Some(address) = lookup(ADDRESS_VAR) {
            let address =
                parse_u8(&address).with_context(|| format!("invalid {ADDRESS_VAR}"))?;

            if address > MAX_BASE_ADDRESS {
                bail!("invalid {ADDRESS_VAR}: {address:#04x} leaves no room for the second chip");
            }

            settings.address = address;
        }

        if let Some(gain) = lookup(GAIN_VAR) {
            settings.gain = parse_u8(&gain)
                .and_then(|gain| Ok(Gain::try_from(gain)?))
                .with_context(|| format!("invalid {GAIN_VAR}"))?;
        }

        if let Some(resolution) = lookup(RESOLUTION_VAR) {
            settings.resolution = parse_u8(&resolution)
                .and_then(|bits| Ok(Resolution::try_from(bits)?))
                .with_context(|| format!("invalid {RESOLUTION_VAR}"))?;
        }

        if let Some(mode) = lookup(MODE_VAR) {
            settings.mode = parse_u8(&mode)
                .and_then(|mode| Ok(ConversionMode::try_from(mode)?))
                .with_context(|| format!("invalid {MODE_VAR}"))?;
        }

        if let Some(interval) = lookup(INTERVAL_VAR) {
            let millis: u64 = interval
                .trim()
                .parse()
                .with_context(|| format!("invalid {INTERVAL_VAR}"))?;
            settings.interval = Duration::from_millis(millis);
        }

        Ok(settings)
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal byte.
fn parse_u8(value: &str) -> anyhow::Result<u8> {
    let value = value.trim();

    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };

    parsed.with_context(|| format!("{value:?} is not a byte"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.address, 0x68);
        assert_eq!(settings.bus, 1);
    }

    #[test]
    fn reads_every_variable() {
        let settings = Settings::from_lookup(lookup(&[
            (BUS_VAR, "0"),
            (ADDRESS_VAR, "0x6A"),
            (GAIN_VAR, "8"),
            (RESOLUTION_VAR, "12"),
            (MODE_VAR, "0"),
            (INTERVAL_VAR, " 250 "),
        ]))
        .unwrap();

        assert_eq!(
            settings,
            Settings {
                bus: 0,
                address: 0x6A,
                gain: Gain::X8,
                resolution: Resolution::Bits12,
                mode: ConversionMode::OneShot,
                interval: Duration::from_millis(250),
            }
        );
    }

    #[test]
    fn accepts_decimal_address() {
        let settings = Settings::from_lookup(lookup(&[(ADDRESS_VAR, "110")])).unwrap();
        assert_eq!(settings.address, 0x6E);
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            (GAIN_VAR, "3"),
            (RESOLUTION_VAR, "13"),
            (MODE_VAR, "2"),
            (ADDRESS_VAR, "0x7F"),
            (ADDRESS_VAR, "sixty"),
            (BUS_VAR, "256"),
            (INTERVAL_VAR, "-1"),
        ];

        for (key, value) in cases {
            let error = Settings::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert!(
                error.to_string().contains(key),
                "{key}={value} gave {error:#}"
            );
        }
    }
}
