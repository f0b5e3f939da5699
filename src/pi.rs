use adcpi::{logging, open_board, sweep, Settings};
use anyhow::Context;
use rppal::i2c::I2c;
use tracing::{info, warn};

fn main() -> Result<(), anyhow::Error> {
    logging::init();

    let settings = Settings::from_env()?;

    let i2c = I2c::with_bus(settings.bus)
        .with_context(|| format!("failed to open /dev/i2c-{}", settings.bus))?;

    let mut adc = open_board(i2c, &settings)?;

    info!(bus = settings.bus, interval = ?settings.interval, "sampling all channels");

    loop {
        match sweep(&mut adc) {
            Ok(volts) => {
                for (index, volt) in volts.iter().enumerate() {
                    info!(channel = index + 1, volts = *volt, "reading");
                }
            }
            Err(error) => warn!("sweep failed: {error:#}"),
        }

        std::thread::sleep(settings.interval);
    }
}
