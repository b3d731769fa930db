use embedded_hal::i2c::SevenBitAddress;

use crate::error::Error;

// Register addresses
pub(crate) const REG_CONTROL: u8 = 0x00;
pub(crate) const REG_TIMING: u8 = 0x01;
pub(crate) const REG_ID: u8 = 0x0A;
pub(crate) const REG_DATA0_LOW: u8 = 0x0C;
pub(crate) const REG_DATA1_LOW: u8 = 0x0E;

// Bits ORed with a register address to form the command byte.
pub(crate) const SMB_WORD: u8 = 0x20;
pub(crate) const SMB_COMMAND: u8 = 0x80;

pub(crate) const CONTROL_POWER_UP: u8 = 0x03;
pub(crate) const CONTROL_POWER_DOWN: u8 = 0x00;

/// I2C address of the sensor, selected by the level of the ADDR SEL pin.
///
/// See the "Serial Bus Device Address" table in the datasheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// ADDR SEL tied to ground: 0x29
    Ground,
    /// ADDR SEL left floating: 0x39
    #[default]
    Float,
    /// ADDR SEL tied to VDD: 0x49
    Vdd,
}

impl From<Address> for SevenBitAddress {
    fn from(value: Address) -> Self {
        match value {
            Address::Ground => 0x29,
            Address::Float => 0x39,
            Address::Vdd => 0x49,
        }
    }
}

/// Length of time the ADC integrates light before a conversion completes.
///
/// These durations assume the default internal oscillator frequency of
/// 735kHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntegrationTime {
    /// 13.7ms
    Ms13,
    /// 101ms
    Ms101,
    /// 402ms
    #[default]
    Ms402,
}

impl IntegrationTime {
    /// INTEG field value of the timing register.
    pub(crate) fn code(&self) -> u8 {
        match self {
            IntegrationTime::Ms13 => 0x00,
            IntegrationTime::Ms101 => 0x01,
            IntegrationTime::Ms402 => 0x02,
        }
    }

    /// Minimum time to wait after power-up before the channel registers
    /// hold a valid conversion.
    ///
    /// Each value is the nominal integration time plus a margin for the
    /// first conversion cycle to complete.
    pub fn min_delay_ms(&self) -> u32 {
        match self {
            IntegrationTime::Ms13 => 15,
            IntegrationTime::Ms101 => 120,
            IntegrationTime::Ms402 => 450,
        }
    }
}

/// Analog gain applied before digitisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// Low gain (1x)
    #[default]
    X1,
    /// High gain (16x)
    X16,
}

impl Gain {
    /// GAIN bit value of the timing register.
    pub(crate) fn code(&self) -> u8 {
        match self {
            Gain::X1 => 0x00,
            Gain::X16 => 0x10,
        }
    }
}

/// Measurement timing settings. Both values are programmed through the
/// timing register, so they are always set together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub integration_time: IntegrationTime,
    pub gain: Gain,
}

impl Config {
    pub fn new(integration_time: IntegrationTime, gain: Gain) -> Self {
        Self {
            integration_time,
            gain,
        }
    }

    /// Value written to the timing register.
    pub fn timing_byte(&self) -> u8 {
        self.integration_time.code() | self.gain.code()
    }
}

/// Package variant reported in the upper nibble of the ID register.
///
/// The package affects the infrared calibration used in lux calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PackageType {
    /// TSL2560CS (chipscale)
    Tsl2560Cs,
    /// TSL2561CS (chipscale)
    Tsl2561Cs,
    /// TSL2560T/FN/CL (TMB-6, dual flat no-lead or ChipLED-6)
    Tsl2560TFnCl,
    /// TSL2561T/FN/CL (TMB-6, dual flat no-lead or ChipLED-6)
    Tsl2561TFnCl,
    /// Any other value of the part number nibble.
    Unrecognized(u8),
}

impl PackageType {
    /// Decode the part number nibble (bits 7:4 of the ID register).
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0F {
            0b0000 => PackageType::Tsl2560Cs,
            0b0001 => PackageType::Tsl2561Cs,
            0b0100 => PackageType::Tsl2560TFnCl,
            0b0101 => PackageType::Tsl2561TFnCl,
            other => PackageType::Unrecognized(other),
        }
    }

    pub fn nibble(&self) -> u8 {
        match self {
            PackageType::Tsl2560Cs => 0b0000,
            PackageType::Tsl2561Cs => 0b0001,
            PackageType::Tsl2560TFnCl => 0b0100,
            PackageType::Tsl2561TFnCl => 0b0101,
            PackageType::Unrecognized(n) => *n,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, PackageType::Unrecognized(_))
    }
}

impl core::fmt::Display for PackageType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PackageType::Tsl2560Cs => write!(f, "TSL2560CS"),
            PackageType::Tsl2561Cs => write!(f, "TSL2561CS"),
            PackageType::Tsl2560TFnCl => write!(f, "TSL2560T/FN/CL"),
            PackageType::Tsl2561TFnCl => write!(f, "TSL2561T/FN/CL"),
            PackageType::Unrecognized(n) => write!(f, "unrecognised ({n:#06b})"),
        }
    }
}

/// Contents of the ID register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceId {
    pub package: PackageType,
    /// Silicon revision number (bits 3:0).
    pub revision: u8,
}

impl DeviceId {
    pub(crate) fn from_register(id: u8) -> Self {
        Self {
            package: PackageType::from_nibble(id >> 4),
            revision: id & 0x0F,
        }
    }
}

/// A pair of raw readings from one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Channel 0 minus channel 1.
    ///
    /// This wraps if channel 1 exceeds channel 0.
    pub visible: u16,
    /// Channel 1, the infrared-only photodiode.
    pub infrared: u16,
}

impl Measurement {
    pub(crate) fn from_channels(channel0: u16, channel1: u16) -> Self {
        Self {
            visible: channel0.wrapping_sub(channel1),
            infrared: channel1,
        }
    }

    /// Channel 0, the visible plus infrared photodiode.
    pub fn channel0(&self) -> u16 {
        self.visible.wrapping_add(self.infrared)
    }

    /// Channel 1, the infrared-only photodiode.
    pub fn channel1(&self) -> u16 {
        self.infrared
    }
}

/// Driver state shared by the blocking and async front-ends.
///
/// The `initialized` flag is checked at runtime by every operation rather
/// than encoded in the type, because a driver that failed identification
/// with an unsupported package is still usable.
#[derive(Debug, Clone, Copy)]
pub(crate) struct State {
    pub(crate) initialized: bool,
    pub(crate) powered: bool,
    pub(crate) package: PackageType,
    pub(crate) config: Config,
}

impl State {
    pub(crate) const fn new() -> Self {
        Self {
            initialized: false,
            powered: false,
            package: PackageType::Unrecognized(0b1111),
            config: Config {
                integration_time: IntegrationTime::Ms402,
                gain: Gain::X1,
            },
        }
    }

    /// Restore the power-on defaults and mark the driver initialised.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            initialized: true,
            ..Self::new()
        };
    }

    pub(crate) fn ensure_initialized<E>(&self) -> Result<(), Error<E>>
    where
        E: embedded_hal::i2c::Error,
    {
        if self.initialized {
            Ok(())
        } else {
            error!("Driver is not initialised");
            Err(Error::NotInitialized)
        }
    }

    /// Record the identified device, returning an error for an
    /// unsupported package. The package is stored either way.
    pub(crate) fn accept_id<E>(&mut self, id: DeviceId) -> Result<(), Error<E>>
    where
        E: embedded_hal::i2c::Error,
    {
        self.package = id.package;
        if id.package.is_recognized() {
            info!("Device is {}, revision {}", id.package, id.revision);
            Ok(())
        } else {
            warn!("Device is not recognised");
            error!("Unsupported device detected");
            Err(Error::UnsupportedDevice(id))
        }
    }
}
