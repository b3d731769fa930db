use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{I2c, SevenBitAddress};

use crate::common::{
    Address, CONTROL_POWER_DOWN, CONTROL_POWER_UP, Config, DeviceId, Gain, IntegrationTime,
    Measurement, PackageType, REG_CONTROL, REG_DATA0_LOW, REG_DATA1_LOW, REG_ID, REG_TIMING,
    SMB_COMMAND, SMB_WORD, State,
};
use crate::conversions::compute_lux;
use crate::error::Error;

pub struct TSL2561<I: I2c> {
    i2c: I,
    address: SevenBitAddress,
    state: State,
}

impl<I: I2c> TSL2561<I> {
    /// Create a driver for the sensor at `address`.
    ///
    /// The driver must be initialised with [`TSL2561::init`] before use.
    pub fn new(i2c: I, address: Address) -> Self {
        let address: SevenBitAddress = address.into();
        debug!("Created TSL2561 driver for address {}", address);
        Self {
            i2c,
            address,
            state: State::new(),
        }
    }

    pub fn destroy(self) -> I {
        debug!("Destroyed TSL2561 driver for address {}", self.address);
        self.i2c
    }

    /// Take the driver out of `slot` and return its I2C bus.
    ///
    /// An empty slot is reported as [`Error::NotInitialized`].
    pub fn release(slot: &mut Option<Self>) -> Result<I, Error<I::Error>> {
        match slot.take() {
            Some(sensor) => Ok(sensor.destroy()),
            None => {
                error!("Cannot release TSL2561 driver: slot is empty");
                Err(Error::NotInitialized)
            }
        }
    }

    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    pub fn is_powered(&self) -> bool {
        self.state.powered
    }

    /// Package detected by [`TSL2561::init`].
    pub fn package(&self) -> PackageType {
        self.state.package
    }

    /// Integration time and gain used for the next reading.
    pub fn config(&self) -> Config {
        self.state.config
    }

    /// Reset the driver to 402ms integration and 1x gain, then read the ID
    /// register to detect the package type.
    ///
    /// If the package is not recognised, [`Error::UnsupportedDevice`] is
    /// returned but the driver remains initialised, and lux values are
    /// computed with the T/FN/CL coefficients.
    pub fn init(&mut self) -> Result<DeviceId, Error<I::Error>> {
        self.state.reset();

        let id = self
            .identify()
            .inspect_err(|_| error!("Failed to read device ID during initialisation"))?;
        info!(
            "Detected device ID {}, revision {} on I2C address {}",
            id.package.nibble(),
            id.revision,
            self.address
        );
        self.state.accept_id::<I::Error>(id)?;
        Ok(id)
    }

    /// Read the package type and silicon revision from the ID register.
    ///
    /// The device does not need to be powered up.
    pub fn identify(&mut self) -> Result<DeviceId, Error<I::Error>> {
        self.state.ensure_initialized::<I::Error>()?;
        let id = self
            .read_byte(REG_ID)
            .inspect_err(|_| error!("Attempt to read ID register failed"))?;
        Ok(DeviceId::from_register(id))
    }

    /// Program the integration time and gain used for subsequent readings.
    ///
    /// The device is powered up for the write and powered down afterwards.
    /// If both the timing write and the power-down fail, the power-down
    /// error is returned.
    pub fn set_integration_time_and_gain(
        &mut self,
        integration_time: IntegrationTime,
        gain: Gain,
    ) -> Result<(), Error<I::Error>> {
        self.set_config(Config::new(integration_time, gain))
    }

    /// Same as [`TSL2561::set_integration_time_and_gain`].
    pub fn set_config(&mut self, config: Config) -> Result<(), Error<I::Error>> {
        self.state.ensure_initialized::<I::Error>()?;
        self.power_up()?;

        let written = self.write_timing(config);
        self.power_down().and(written)
    }

    /// Power up the device, wait for one integration period and read both
    /// channels, then power down.
    ///
    /// If a channel read fails the error is returned immediately and the
    /// device is left powered up.
    pub fn read(&mut self, mut delay: impl DelayNs) -> Result<Measurement, Error<I::Error>> {
        self.state.ensure_initialized::<I::Error>()?;
        self.power_up()?;

        delay.delay_ms(self.state.config.integration_time.min_delay_ms());

        let channel0 = self.read_word(REG_DATA0_LOW)?;
        let channel1 = self.read_word(REG_DATA1_LOW)?;
        self.power_down()?;

        Ok(Measurement::from_channels(channel0, channel1))
    }

    /// Approximate lux for a measurement taken with the current settings.
    pub fn lux(&self, measurement: &Measurement) -> Result<u32, Error<I::Error>> {
        self.state.ensure_initialized::<I::Error>()?;
        Ok(compute_lux(
            self.state.package,
            self.state.config,
            measurement.visible,
            measurement.infrared,
        ))
    }

    /// Take a reading and convert it to lux.
    pub fn measure_lux(&mut self, delay: impl DelayNs) -> Result<u32, Error<I::Error>> {
        let measurement = self.read(delay)?;
        self.lux(&measurement)
    }

    fn power_up(&mut self) -> Result<(), Error<I::Error>> {
        if self.state.powered {
            warn!("Device already powered");
            return Ok(());
        }
        self.write_byte(REG_CONTROL, CONTROL_POWER_UP)?;
        self.state.powered = true;
        Ok(())
    }

    fn power_down(&mut self) -> Result<(), Error<I::Error>> {
        if !self.state.powered {
            warn!("Device not powered");
            return Ok(());
        }
        self.write_byte(REG_CONTROL, CONTROL_POWER_DOWN)?;
        self.state.powered = false;
        Ok(())
    }

    /// Assumes the device is already powered up.
    fn write_timing(&mut self, config: Config) -> Result<(), Error<I::Error>> {
        self.write_byte(REG_TIMING, config.timing_byte())?;
        self.state.config = config;
        Ok(())
    }

    fn read_byte(&mut self, register: u8) -> Result<u8, Error<I::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register | SMB_COMMAND], &mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), Error<I::Error>> {
        self.i2c
            .write(self.address, &[register | SMB_COMMAND, value])?;
        Ok(())
    }

    /// Word reads return the low byte first.
    fn read_word(&mut self, register: u8) -> Result<u16, Error<I::Error>> {
        let mut buf = [0u8; 2];
        self.i2c.write_read(
            self.address,
            &[register | SMB_COMMAND | SMB_WORD],
            &mut buf,
        )?;
        Ok(u16::from_le_bytes(buf))
    }
}
