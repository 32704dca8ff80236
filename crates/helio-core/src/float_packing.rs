//! Byte packing for light data stored in 8-bit-per-channel textures.
//!
//! Every encoder here has a matching decoder that does exactly what the
//! shader does with the normalized texel values. A texel channel `b` reads
//! back as `b / 255`, so an N-byte value decodes as
//! `dot(bytes / 255, (1, 1/255, 1/255^2, 1/255^3))`.
//!
//! Encoders assume an open upper bound: a normalized value of exactly 1.0
//! wraps to 0. Callers scale inputs slightly below 1 (see the compression
//! limits of the clustered lighting).

use glam::{Quat, Vec3};

const ONE_DIV_255: f64 = 1.0 / 255.0;

#[inline]
fn to_byte(value: f64) -> u8 {
    // NaN saturates to 0, same as a clamped byte array
    value.round().clamp(0.0, 255.0) as u8
}

/// Packs `value` (expected in `[0, 1)`) into `bytes.len()` bytes, 1 to 4.
///
/// Each byte holds the next 8 bits of the cascading remainder, so `N` bytes
/// keep the value to within `1 / 255^N`.
pub fn float_to_bytes(value: f32, bytes: &mut [u8]) {
    let count = bytes.len();
    debug_assert!((1..=4).contains(&count), "1 to 4 bytes supported, got {count}");

    let value = value as f64;
    let enc1 = (255.0 * value) % 1.0;
    bytes[0] = to_byte(((value % 1.0) - ONE_DIV_255 * enc1) * 255.0);

    if count > 1 {
        let enc2 = (65025.0 * value) % 1.0;
        bytes[1] = to_byte((enc1 - ONE_DIV_255 * enc2) * 255.0);

        if count > 2 {
            let enc3 = (16581375.0 * value) % 1.0;
            bytes[2] = to_byte((enc2 - ONE_DIV_255 * enc3) * 255.0);

            if count > 3 {
                bytes[3] = to_byte(enc3 * 255.0);
            }
        }
    }
}

/// Inverse of [`float_to_bytes`].
pub fn bytes_to_float(bytes: &[u8]) -> f32 {
    let mut weight = ONE_DIV_255;
    let mut sum = 0.0f64;
    for &byte in bytes {
        sum += byte as f64 * weight;
        weight *= ONE_DIV_255;
    }
    sum as f32
}

/// Remaps `value` from `[min, max]` to `[0, 1]`, clamps, then packs it.
pub fn float_to_bytes_range(value: f32, min: f32, max: f32, bytes: &mut [u8]) {
    let normalized = ((value as f64 - min as f64) / (max as f64 - min as f64)).clamp(0.0, 1.0);
    float_to_bytes(normalized as f32, bytes);
}

/// Inverse of [`float_to_bytes_range`].
pub fn bytes_to_float_range(bytes: &[u8], min: f32, max: f32) -> f32 {
    let t = bytes_to_float(bytes) as f64;
    (min as f64 + (max as f64 - min as f64) * t) as f32
}

/// Packs an unbounded float as a range-packed mantissa in the first
/// `bytes.len() - 1` bytes and a biased exponent (`exponent + 127`) in the last.
///
/// The exponent is `floor(log2(|v|)) + 1` so the mantissa `v / 2^exponent`
/// lies strictly inside `(-1, 1)`.
pub fn float_to_mantissa_exponent(value: f32, bytes: &mut [u8]) {
    let count = bytes.len();
    debug_assert!((2..=4).contains(&count), "2 to 4 bytes supported, got {count}");

    if value == 0.0 || !value.is_finite() {
        bytes.fill(0);
        return;
    }

    let value = value as f64;
    let exponent = value.abs().log2().floor() + 1.0;
    let mantissa = value / exponent.exp2();

    let (mantissa_bytes, exponent_byte) = bytes.split_at_mut(count - 1);
    float_to_bytes_range(mantissa as f32, -1.0, 1.0, mantissa_bytes);
    exponent_byte[0] = to_byte(exponent + 127.0);
}

/// Inverse of [`float_to_mantissa_exponent`].
pub fn mantissa_exponent_to_float(bytes: &[u8]) -> f32 {
    let (mantissa_bytes, exponent_byte) = bytes.split_at(bytes.len() - 1);
    let mantissa = bytes_to_float_range(mantissa_bytes, -1.0, 1.0) as f64;
    let exponent = exponent_byte[0] as f64 - 127.0;
    (mantissa * exponent.exp2()) as f32
}

// The 32-bit codecs below are not used by the light rows. They belong to the
// packing library the lighting shaders include.

/// Packs a point in the unit cube into 32 bits: 11 bits x, 11 bits y, 10 bits z.
pub fn pack_unorm_11_11_10(v: Vec3) -> u32 {
    let v = v.clamp(Vec3::ZERO, Vec3::ONE);
    let x = (v.x * 2047.0).round() as u32;
    let y = (v.y * 2047.0).round() as u32;
    let z = (v.z * 1023.0).round() as u32;
    (x << 21) | (y << 10) | z
}

pub fn unpack_unorm_11_11_10(packed: u32) -> Vec3 {
    Vec3::new(
        ((packed >> 21) & 0x7ff) as f32 / 2047.0,
        ((packed >> 10) & 0x7ff) as f32 / 2047.0,
        (packed & 0x3ff) as f32 / 1023.0,
    )
}

/// Smallest-three quaternion packing: the top 2 bits select the largest
/// component, which is dropped; the other three are stored in 10 bits each
/// over `[-1/sqrt(2), 1/sqrt(2)]`.
pub fn pack_quat_smallest_three(q: Quat) -> u32 {
    let components = q.normalize().to_array();

    let mut largest = 0;
    for i in 1..4 {
        if components[i].abs() > components[largest].abs() {
            largest = i;
        }
    }

    // q and -q are the same rotation; make the dropped component positive
    let sign = if components[largest] < 0.0 { -1.0 } else { 1.0 };

    let mut packed = largest as u32;
    for (i, &c) in components.iter().enumerate() {
        if i == largest {
            continue;
        }
        let unit = (c * sign * std::f32::consts::SQRT_2 * 0.5 + 0.5).clamp(0.0, 1.0);
        packed = (packed << 10) | (unit * 1023.0).round() as u32;
    }
    packed
}

pub fn unpack_quat_smallest_three(packed: u32) -> Quat {
    let largest = (packed >> 30) as usize;

    let mut components = [0.0f32; 4];
    let mut shift = 20;
    let mut sum_sq = 0.0;
    for (i, component) in components.iter_mut().enumerate() {
        if i == largest {
            continue;
        }
        let unit = ((packed >> shift) & 0x3ff) as f32 / 1023.0;
        *component = (unit - 0.5) * 2.0 / std::f32::consts::SQRT_2;
        sum_sq += *component * *component;
        shift -= 10;
    }
    components[largest] = (1.0 - sum_sq).max(0.0).sqrt();

    Quat::from_array(components)
}
