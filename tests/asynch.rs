#![cfg(feature = "async")]

use embedded_hal::i2c::ErrorKind;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
use tsl2561_rjw::asynch::TSL2561;
use tsl2561_rjw::common::{Address, Config, Gain, IntegrationTime, Measurement, PackageType};
use tsl2561_rjw::error::Error;

const ADDR: u8 = 0x39;

fn id(value: u8) -> Transaction {
    Transaction::write_read(ADDR, vec![0x8A], vec![value])
}

fn power_up() -> Transaction {
    Transaction::write(ADDR, vec![0x80, 0x03])
}

fn power_down() -> Transaction {
    Transaction::write(ADDR, vec![0x80, 0x00])
}

fn timing(value: u8) -> Transaction {
    Transaction::write(ADDR, vec![0x81, value])
}

fn channel(command: u8, value: u16) -> Transaction {
    Transaction::write_read(ADDR, vec![command], value.to_le_bytes().to_vec())
}

#[derive(Default)]
struct RecordingDelay {
    total_ns: u64,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

#[pollster::test]
async fn init_and_identify() -> anyhow::Result<()> {
    let expectations = [id(0x1A), id(0x1A)];
    let mut sensor = TSL2561::new(Mock::new(&expectations), Address::Float);

    let detected = sensor.init().await?;
    assert_eq!(detected.package, PackageType::Tsl2561Cs);
    assert_eq!(detected.revision, 10);
    assert_eq!(sensor.identify().await?, detected);

    sensor.destroy().done();
    Ok(())
}

#[pollster::test]
async fn unsupported_device_leaves_driver_usable() {
    let expectations = [id(0x2A)];
    let mut sensor = TSL2561::new(Mock::new(&expectations), Address::Float);

    assert!(matches!(
        sensor.init().await,
        Err(Error::UnsupportedDevice(_))
    ));
    assert!(sensor.is_initialized());
    let measurement = Measurement {
        visible: 900,
        infrared: 100,
    };
    assert_eq!(sensor.lux(&measurement).ok(), Some(443));

    sensor.destroy().done();
}

#[pollster::test]
async fn operations_require_init() {
    let expectations: [Transaction; 0] = [];
    let mut sensor = TSL2561::new(Mock::new(&expectations), Address::Float);
    let mut delay = RecordingDelay::default();

    assert!(matches!(sensor.identify().await, Err(Error::NotInitialized)));
    assert!(matches!(
        sensor.read(&mut delay).await,
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        sensor.set_config(Config::default()).await,
        Err(Error::NotInitialized)
    ));
    assert_eq!(delay.total_ns, 0);

    sensor.destroy().done();
}

#[pollster::test]
async fn configure_then_read() -> anyhow::Result<()> {
    let expectations = [
        id(0x50),
        power_up(),
        timing(0x00),
        power_down(),
        power_up(),
        channel(0xAC, 1000),
        channel(0xAE, 100),
        power_down(),
    ];
    let mut sensor = TSL2561::new(Mock::new(&expectations), Address::Float);
    let mut delay = RecordingDelay::default();

    sensor.init().await?;
    sensor
        .set_integration_time_and_gain(IntegrationTime::Ms13, Gain::X1)
        .await?;
    let measurement = sensor.read(&mut delay).await?;

    assert!(delay.total_ns >= 15_000_000);
    assert!(!sensor.is_powered());
    assert_eq!(measurement.visible, 900);
    assert_eq!(measurement.infrared, 100);

    sensor.destroy().done();
    Ok(())
}

#[pollster::test]
async fn measure_lux() -> anyhow::Result<()> {
    let expectations = [
        id(0x50),
        power_up(),
        channel(0xAC, 1000),
        channel(0xAE, 100),
        power_down(),
    ];
    let mut sensor = TSL2561::new(Mock::new(&expectations), Address::Float);

    sensor.init().await?;
    assert_eq!(sensor.measure_lux(RecordingDelay::default()).await?, 443);

    sensor.destroy().done();
    Ok(())
}

#[pollster::test]
async fn configure_power_down_error_takes_precedence() -> anyhow::Result<()> {
    let expectations = [
        id(0x50),
        power_up(),
        timing(0x12).with_error(ErrorKind::Bus),
        power_down().with_error(ErrorKind::Other),
    ];
    let mut sensor = TSL2561::new(Mock::new(&expectations), Address::Float);

    sensor.init().await?;
    let result = sensor
        .set_integration_time_and_gain(IntegrationTime::Ms402, Gain::X16)
        .await;

    assert!(matches!(result, Err(Error::I2c(ErrorKind::Other))));
    assert_eq!(sensor.config(), Config::default());

    sensor.destroy().done();
    Ok(())
}

#[pollster::test]
async fn channel_read_failure_leaves_device_powered() -> anyhow::Result<()> {
    let expectations = [
        id(0x50),
        power_up(),
        channel(0xAC, 0).with_error(ErrorKind::Other),
    ];
    let mut sensor = TSL2561::new(Mock::new(&expectations), Address::Float);

    sensor.init().await?;
    let result = sensor.read(RecordingDelay::default()).await;

    assert!(matches!(result, Err(Error::I2c(ErrorKind::Other))));
    assert!(sensor.is_powered());

    sensor.destroy().done();
    Ok(())
}
