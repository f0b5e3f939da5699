//! The bus contract the driver needs, and an adapter onto `embedded-hal`.

use core::fmt::Debug;

use tracing::warn;

/// Something that can open sessions to devices on a two-wire bus.
pub trait Transport {
    type Error: Debug;

    type Session<'a>: Session<Error = Self::Error>
    where
        Self: 'a;

    /// Open a session to the device at the 7-bit `address`.
    fn open(&mut self, address: u8) -> Result<Self::Session<'_>, Self::Error>;
}

/// An open connection to a single device.
pub trait Session {
    type Error: Debug;

    fn write_byte(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Fill `frame` with bytes read from the device.
    fn read_frame(&mut self, frame: &mut [u8]) -> Result<(), Self::Error>;

    /// Release the session. Consuming `self` makes a second close impossible.
    fn close(self) -> Result<(), Self::Error>;
}

/// Open a session to `address`, run `body` against it, then close it on every path.
///
/// If both `body` and the close fail, the close failure is logged and the body's error
/// is returned.
pub fn with_session<'t, T, R>(
    transport: &'t mut T,
    address: u8,
    body: impl FnOnce(&mut T::Session<'t>) -> Result<R, T::Error>,
) -> Result<R, T::Error>
where
    T: Transport,
{
    let mut session = transport.open(address)?;
    let result = body(&mut session);
    let closed = session.close();

    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(error)) => Err(error),
        (Err(error), Ok(())) => Err(error),
        (Err(error), Err(close_error)) => {
            warn!(address, ?close_error, "failed to close session after bus error");
            Err(error)
        }
    }
}

#[cfg(feature = "hal")]
pub use hal::{HalBus, HalSession};

#[cfg(feature = "hal")]
mod hal {
    use embedded_hal::i2c::I2c;

    use super::{Session, Transport};

    /// [`Transport`] over an `embedded-hal` I2C bus.
    ///
    /// The bus stays open for the life of the adapter, so sessions only remember the
    /// address they target.
    pub struct HalBus<I2C> {
        i2c: I2C,
    }

    impl<I2C: I2c> HalBus<I2C> {
        pub fn new(i2c: I2C) -> Self {
            i2c.into()
        }

        /// Recover the underlying bus.
        pub fn release(self) -> I2C {
            self.i2c
        }
    }

    impl<I2C: I2c> From<I2C> for HalBus<I2C> {
        fn from(i2c: I2C) -> Self {
            Self { i2c }
        }
    }

    impl<I2C: I2c> Transport for HalBus<I2C> {
        type Error = I2C::Error;

        type Session<'a>
            = HalSession<'a, I2C>
        where
            Self: 'a;

        fn open(&mut self, address: u8) -> Result<Self::Session<'_>, Self::Error> {
            Ok(HalSession {
                i2c: &mut self.i2c,
                address,
            })
        }
    }

    pub struct HalSession<'a, I2C> {
        i2c: &'a mut I2C,
        address: u8,
    }

    impl<I2C: I2c> Session for HalSession<'_, I2C> {
        type Error = I2C::Error;

        fn write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
            self.i2c.write(self.address, &[value])
        }

        fn read_frame(&mut self, frame: &mut [u8]) -> Result<(), Self::Error> {
            self.i2c.read(self.address, frame)
        }

        fn close(self) -> Result<(), Self::Error> {
            Ok(())
        }
    }
}
