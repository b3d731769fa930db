use crate::common::DeviceId;

#[derive(Debug)]
pub enum Error<I2cError>
where
    I2cError: embedded_hal::i2c::Error,
{
    /// The driver has not been initialised with `init`.
    NotInitialized,
    /// The ID register reported a package type this driver does not know.
    ///
    /// The driver is still usable after this error, and lux values are
    /// computed with the T/FN/CL calibration table.
    UnsupportedDevice(DeviceId),
    I2c(I2cError),
}

impl<I2cError> From<I2cError> for Error<I2cError>
where
    I2cError: embedded_hal::i2c::Error,
{
    fn from(value: I2cError) -> Self {
        Error::I2c(value)
    }
}

impl<I2cError> core::fmt::Display for Error<I2cError>
where
    I2cError: embedded_hal::i2c::Error,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::NotInitialized => write!(f, "Driver has not been initialised"),
            Error::UnsupportedDevice(id) => write!(
                f,
                "Unsupported device (package {}, revision {})",
                id.package, id.revision
            ),
            Error::I2c(e) => write!(f, "Received I2C error: {:?}", e),
        }
    }
}

impl<I> core::error::Error for Error<I> where I: embedded_hal::i2c::Error {}
