//! Raw channel readings to lux.
//!
//! The calculation is the integer procedure given in the "Calculating
//! Lux" section of the TSL2561 datasheet. The channel counts are
//! normalised to 402ms and 16x gain, the ratio of the infrared channel
//! to the combined channel selects a segment of a piecewise-linear
//! approximation, and the segment's coefficients are applied in fixed
//! point.
//!
//! All intermediate values are 32-bit and wrap on overflow, so results
//! are bit-identical to the reference procedure for every input.

use crate::common::{Config, Gain, IntegrationTime, PackageType};

/// Scale channel values by 2^10.
const CH_SCALE: u32 = 10;
/// 322/11 * 2^CH_SCALE
const CH_SCALE_TINT0: u32 = 0x7517;
/// 322/81 * 2^CH_SCALE
const CH_SCALE_TINT1: u32 = 0x0FE7;

/// Scale the channel ratio by 2^9.
const RATIO_SCALE: u32 = 9;
/// Scale the lux coefficients by 2^14.
const LUX_SCALE: u32 = 14;

/// One segment of the piecewise-linear lux approximation.
///
/// The segment applies when the scaled channel ratio is at most
/// `threshold`, and gives `lux = channel0 * intercept - channel1 * slope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub threshold: u32,
    pub intercept: u32,
    pub slope: u32,
}

const fn segment(threshold: u32, intercept: u32, slope: u32) -> Segment {
    Segment {
        threshold,
        intercept,
        slope,
    }
}

/// Coefficients for the T, FN and CL packages.
pub static T_FN_CL_SEGMENTS: [Segment; 8] = [
    segment(0x0040, 0x01F2, 0x01BE),
    segment(0x0080, 0x0214, 0x02D1),
    segment(0x00C0, 0x023F, 0x037B),
    segment(0x0100, 0x0270, 0x03FE),
    segment(0x0138, 0x016F, 0x01FC),
    segment(0x019A, 0x00D2, 0x00FB),
    segment(0x029A, 0x0018, 0x0012),
    segment(0x029A, 0x0000, 0x0000),
];

/// Coefficients for the CS (chipscale) package.
///
/// The thresholds of segments 5 to 7 are those of the T/FN/CL table
/// (0x0138 where the datasheet lists 0x014D for the CS package). This
/// matches the widely used reference code and is kept so that results
/// agree with it.
pub static CS_SEGMENTS: [Segment; 8] = [
    segment(0x0043, 0x0204, 0x01AD),
    segment(0x0085, 0x0228, 0x02C1),
    segment(0x00C8, 0x0253, 0x0363),
    segment(0x010A, 0x0282, 0x03DF),
    segment(0x0138, 0x0177, 0x01DD),
    segment(0x019A, 0x0101, 0x0127),
    segment(0x029A, 0x0037, 0x002B),
    segment(0x029A, 0x0000, 0x0000),
];

/// Calibration table for the given package.
///
/// Only the TSL2561CS part uses the chipscale coefficients. Every other
/// part number, including unrecognised ones, uses the T/FN/CL table.
pub fn segments_for(package: PackageType) -> &'static [Segment; 8] {
    match package {
        PackageType::Tsl2561Cs => &CS_SEGMENTS,
        _ => &T_FN_CL_SEGMENTS,
    }
}

/// Fixed-point factor that normalises counts to 402ms integration and
/// 16x gain.
fn channel_scale(config: Config) -> u32 {
    let scale = match config.integration_time {
        IntegrationTime::Ms13 => CH_SCALE_TINT0,
        IntegrationTime::Ms101 => CH_SCALE_TINT1,
        IntegrationTime::Ms402 => 1 << CH_SCALE,
    };
    match config.gain {
        Gain::X1 => scale << 4,
        Gain::X16 => scale,
    }
}

/// Rounded `channel1 / channel0` with `RATIO_SCALE` fractional bits.
///
/// A zero `channel0` gives a ratio of zero.
pub fn channel_ratio(channel0: u32, channel1: u32) -> u32 {
    let ratio = if channel0 != 0 {
        (channel1 << (RATIO_SCALE + 1)) / channel0
    } else {
        0
    };
    ratio.wrapping_add(1) >> 1
}

/// Intercept and slope for the segment containing `ratio`.
///
/// A ratio past the last threshold takes the final segment; a ratio that
/// matches no segment gives zero coefficients.
fn coefficients(segments: &[Segment; 8], ratio: u32) -> (u32, u32) {
    let (bounded, last) = (&segments[..7], &segments[7]);
    match bounded.iter().find(|s| ratio <= s.threshold) {
        Some(s) => (s.intercept, s.slope),
        None if ratio > last.threshold => (last.intercept, last.slope),
        None => (0, 0),
    }
}

/// Approximate illuminance, in lux, for a reading taken with the given
/// package and timing settings.
pub fn compute_lux(package: PackageType, config: Config, visible: u16, infrared: u16) -> u32 {
    let scale = channel_scale(config);

    // Recover the raw channels, normalised to the nominal settings.
    let combined = u32::from(visible) + u32::from(infrared);
    let channel0 = combined.wrapping_mul(scale) >> CH_SCALE;
    let channel1 = u32::from(infrared).wrapping_mul(scale) >> CH_SCALE;

    let ratio = channel_ratio(channel0, channel1);
    let (intercept, slope) = coefficients(segments_for(package), ratio);

    let positive = channel0.wrapping_mul(intercept);
    let negative = channel1.wrapping_mul(slope);
    // No negative lux.
    let lux = if negative > positive {
        0
    } else {
        positive - negative
    };

    // Round the LSB then strip the fractional part.
    lux.wrapping_add(1 << (LUX_SCALE - 1)) >> LUX_SCALE
}
