//! Sample packers for rotation and translation formats
//!
//! All multi-byte values are little-endian. Fixed formats pack into their
//! exact byte width; variable formats pack three N-bit channels MSB-first
//! into a 64-bit word stored in a fixed 8-byte slot.
//!
//! Rotation channels quantize from the canonical `[-1, 1]` range. Translation
//! channels quantize from `[0, 1]` after range reduction; packing trusts that
//! inputs were remapped upstream and clamps rather than detects violations.

use glam::{Quat, Vec3};

// ============================================================================
// Scalar Quantization
// ============================================================================

#[inline]
fn scalar_max(num_bits: u32) -> f32 {
    ((1u32 << num_bits) - 1) as f32
}

/// Quantize a `[-1, 1]` value to an unsigned integer of `num_bits` bits
#[inline]
pub fn pack_scalar_signed(value: f32, num_bits: u32) -> u32 {
    let normalized = (value.clamp(-1.0, 1.0) + 1.0) * 0.5;
    (normalized * scalar_max(num_bits)).round() as u32
}

/// Dequantize an unsigned integer of `num_bits` bits back into `[-1, 1]`
#[inline]
pub fn unpack_scalar_signed(value: u32, num_bits: u32) -> f32 {
    (value as f32 / scalar_max(num_bits)) * 2.0 - 1.0
}

/// Quantize a `[0, 1]` value to an unsigned integer of `num_bits` bits
#[inline]
pub fn pack_scalar_unsigned(value: f32, num_bits: u32) -> u32 {
    (value.clamp(0.0, 1.0) * scalar_max(num_bits)).round() as u32
}

/// Dequantize an unsigned integer of `num_bits` bits back into `[0, 1]`
#[inline]
pub fn unpack_scalar_unsigned(value: u32, num_bits: u32) -> f32 {
    value as f32 / scalar_max(num_bits)
}

// ============================================================================
// Full Precision Packing
// ============================================================================

/// Pack four f32 components into 16 bytes
pub fn pack_vector4_128(value: [f32; 4], out: &mut [u8]) {
    debug_assert!(out.len() >= 16);
    for (i, &component) in value.iter().enumerate() {
        out[i * 4..(i + 1) * 4].copy_from_slice(&component.to_le_bytes());
    }
}

/// Unpack four f32 components from 16 bytes
pub fn unpack_vector4_128(input: &[u8]) -> [f32; 4] {
    debug_assert!(input.len() >= 16);
    let mut value = [0.0f32; 4];
    for (i, component) in value.iter_mut().enumerate() {
        *component = f32::from_le_bytes([
            input[i * 4],
            input[i * 4 + 1],
            input[i * 4 + 2],
            input[i * 4 + 3],
        ]);
    }
    value
}

/// Pack three f32 components into 12 bytes
pub fn pack_vector3_96(value: Vec3, out: &mut [u8]) {
    debug_assert!(out.len() >= 12);
    for (i, component) in value.to_array().into_iter().enumerate() {
        out[i * 4..(i + 1) * 4].copy_from_slice(&component.to_le_bytes());
    }
}

/// Unpack three f32 components from 12 bytes
pub fn unpack_vector3_96(input: &[u8]) -> Vec3 {
    debug_assert!(input.len() >= 12);
    let mut value = [0.0f32; 3];
    for (i, component) in value.iter_mut().enumerate() {
        *component = f32::from_le_bytes([
            input[i * 4],
            input[i * 4 + 1],
            input[i * 4 + 2],
            input[i * 4 + 3],
        ]);
    }
    Vec3::from_array(value)
}

// ============================================================================
// Scalar-Quantized Packing
// ============================================================================

#[inline]
fn quantize_channel(value: f32, num_bits: u32, signed: bool) -> u32 {
    if signed {
        pack_scalar_signed(value, num_bits)
    } else {
        pack_scalar_unsigned(value, num_bits)
    }
}

#[inline]
fn dequantize_channel(value: u32, num_bits: u32, signed: bool) -> f32 {
    if signed {
        unpack_scalar_signed(value, num_bits)
    } else {
        unpack_scalar_unsigned(value, num_bits)
    }
}

/// Pack three channels at 16 bits each into 6 bytes
///
/// `signed` selects the `[-1, 1]` channel domain; unsigned is `[0, 1]`.
pub fn pack_vector3_48(value: Vec3, signed: bool, out: &mut [u8]) {
    debug_assert!(out.len() >= 6);
    for (i, component) in value.to_array().into_iter().enumerate() {
        let quantized = quantize_channel(component, 16, signed) as u16;
        out[i * 2..(i + 1) * 2].copy_from_slice(&quantized.to_le_bytes());
    }
}

/// Unpack three 16-bit channels from 6 bytes
pub fn unpack_vector3_48(input: &[u8], signed: bool) -> Vec3 {
    debug_assert!(input.len() >= 6);
    let mut value = [0.0f32; 3];
    for (i, component) in value.iter_mut().enumerate() {
        let quantized = u16::from_le_bytes([input[i * 2], input[i * 2 + 1]]) as u32;
        *component = dequantize_channel(quantized, 16, signed);
    }
    Vec3::from_array(value)
}

/// Pack three channels at 11/11/10 bits into 4 bytes
///
/// Bit layout within the word: `[x:11][y:11][z:10]`, X in the top bits.
pub fn pack_vector3_32(value: Vec3, signed: bool, out: &mut [u8]) {
    debug_assert!(out.len() >= 4);
    let x = quantize_channel(value.x, 11, signed);
    let y = quantize_channel(value.y, 11, signed);
    let z = quantize_channel(value.z, 10, signed);
    let word = (x << 21) | (y << 10) | z;
    out[0..4].copy_from_slice(&word.to_le_bytes());
}

/// Unpack 11/11/10-bit channels from 4 bytes
pub fn unpack_vector3_32(input: &[u8], signed: bool) -> Vec3 {
    debug_assert!(input.len() >= 4);
    let word = u32::from_le_bytes([input[0], input[1], input[2], input[3]]);
    let x = (word >> 21) & 0x7FF;
    let y = (word >> 10) & 0x7FF;
    let z = word & 0x3FF;
    Vec3::new(
        dequantize_channel(x, 11, signed),
        dequantize_channel(y, 11, signed),
        dequantize_channel(z, 10, signed),
    )
}

/// Pack three channels at `num_bits` bits each, MSB-first in a 64-bit word,
/// into a fixed 8-byte slot
pub fn pack_vector3_n(value: Vec3, num_bits: u32, signed: bool, out: &mut [u8]) {
    debug_assert!(out.len() >= 8);
    debug_assert!((1..=19).contains(&num_bits), "invalid bit width: {num_bits}");
    let x = quantize_channel(value.x, num_bits, signed) as u64;
    let y = quantize_channel(value.y, num_bits, signed) as u64;
    let z = quantize_channel(value.z, num_bits, signed) as u64;
    let word = (x << (64 - num_bits)) | (y << (64 - num_bits * 2)) | (z << (64 - num_bits * 3));
    out[0..8].copy_from_slice(&word.to_le_bytes());
}

/// Unpack three `num_bits`-bit channels from an 8-byte slot
pub fn unpack_vector3_n(input: &[u8], num_bits: u32, signed: bool) -> Vec3 {
    debug_assert!(input.len() >= 8);
    debug_assert!((1..=19).contains(&num_bits), "invalid bit width: {num_bits}");
    let word = u64::from_le_bytes([
        input[0], input[1], input[2], input[3], input[4], input[5], input[6], input[7],
    ]);
    let mask = (1u64 << num_bits) - 1;
    let x = ((word >> (64 - num_bits)) & mask) as u32;
    let y = ((word >> (64 - num_bits * 2)) & mask) as u32;
    let z = ((word >> (64 - num_bits * 3)) & mask) as u32;
    Vec3::new(
        dequantize_channel(x, num_bits, signed),
        dequantize_channel(y, num_bits, signed),
        dequantize_channel(z, num_bits, signed),
    )
}

// ============================================================================
// Drop-W Quaternion Helpers
// ============================================================================

/// Flip a quaternion so its W component is non-negative
///
/// Must be applied before packing any drop-W format; decode assumes W >= 0.
#[inline]
pub fn quat_ensure_positive_w(rotation: Quat) -> Quat {
    if rotation.w < 0.0 {
        -rotation
    } else {
        rotation
    }
}

/// Rebuild a quaternion from its X/Y/Z components, reconstructing W >= 0
#[inline]
pub fn quat_from_positive_w(xyz: Vec3) -> Quat {
    let w_squared = 1.0 - xyz.length_squared();
    let w = w_squared.max(0.0).sqrt();
    Quat::from_xyzw(xyz.x, xyz.y, xyz.z, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quat_error(a: Quat, b: Quat) -> f32 {
        1.0 - a.dot(b).abs()
    }

    #[test]
    fn test_scalar_signed_roundtrip() {
        for num_bits in [8, 11, 16, 19] {
            let step = 2.0 / scalar_max(num_bits);
            for value in [-1.0f32, -0.5, 0.0, 0.25, 1.0] {
                let unpacked = unpack_scalar_signed(pack_scalar_signed(value, num_bits), num_bits);
                assert!(
                    (unpacked - value).abs() <= step * 0.5 + 1e-6,
                    "{} bits, value {}: got {}",
                    num_bits,
                    value,
                    unpacked
                );
            }
        }
    }

    #[test]
    fn test_scalar_signed_bounds() {
        assert_eq!(pack_scalar_signed(-1.0, 16), 0);
        assert_eq!(pack_scalar_signed(1.0, 16), 65535);
        // Out of range input clamps
        assert_eq!(pack_scalar_signed(2.0, 16), 65535);
        assert_eq!(pack_scalar_signed(-2.0, 16), 0);
    }

    #[test]
    fn test_scalar_unsigned_roundtrip() {
        for num_bits in [8, 16, 19] {
            let step = 1.0 / scalar_max(num_bits);
            for value in [0.0f32, 0.25, 0.5, 0.75, 1.0] {
                let unpacked =
                    unpack_scalar_unsigned(pack_scalar_unsigned(value, num_bits), num_bits);
                assert!(
                    (unpacked - value).abs() <= step * 0.5 + 1e-6,
                    "{} bits, value {}: got {}",
                    num_bits,
                    value,
                    unpacked
                );
            }
        }
    }

    #[test]
    fn test_vector4_128_roundtrip() {
        let value = [0.25f32, -1.5, 3.75, 0.962728];
        let mut bytes = [0u8; 16];
        pack_vector4_128(value, &mut bytes);
        assert_eq!(unpack_vector4_128(&bytes), value);
    }

    #[test]
    fn test_vector3_96_roundtrip() {
        let value = Vec3::new(1.5, -2.25, 0.001);
        let mut bytes = [0u8; 12];
        pack_vector3_96(value, &mut bytes);
        assert_eq!(unpack_vector3_96(&bytes), value);
    }

    #[test]
    fn test_vector3_48_roundtrip() {
        let value = Vec3::new(-0.7, 0.0, 0.3);
        let mut bytes = [0u8; 6];
        pack_vector3_48(value, true, &mut bytes);
        let unpacked = unpack_vector3_48(&bytes, true);
        assert!((unpacked - value).length() < 1e-4, "got {unpacked}");
    }

    #[test]
    fn test_vector3_32_roundtrip() {
        let value = Vec3::new(-0.7, 0.0, 0.3);
        let mut bytes = [0u8; 4];
        pack_vector3_32(value, true, &mut bytes);
        let unpacked = unpack_vector3_32(&bytes, true);
        // 10-bit Z is the coarsest channel: half-step is ~0.001
        assert!((unpacked - value).length() < 2e-3, "got {unpacked}");
    }

    #[test]
    fn test_vector3_32_unsigned_roundtrip() {
        let value = Vec3::new(0.1, 0.5, 0.9);
        let mut bytes = [0u8; 4];
        pack_vector3_32(value, false, &mut bytes);
        let unpacked = unpack_vector3_32(&bytes, false);
        assert!((unpacked - value).length() < 1e-3, "got {unpacked}");
    }

    #[test]
    fn test_vector3_n_roundtrip() {
        let value = Vec3::new(-0.7, 0.0, 0.3);
        for num_bits in [4, 8, 11, 16, 19] {
            let mut bytes = [0u8; 8];
            pack_vector3_n(value, num_bits, true, &mut bytes);
            let unpacked = unpack_vector3_n(&bytes, num_bits, true);
            let step = 2.0 / scalar_max(num_bits);
            assert!(
                (unpacked - value).length() <= step,
                "{} bits: got {}",
                num_bits,
                unpacked
            );
        }
    }

    #[test]
    fn test_vector3_n_exact_on_representatives() {
        // Unpack then pack returns the same quantized integers
        let mut bytes = [0u8; 8];
        pack_vector3_n(Vec3::new(0.37, -0.81, 0.04), 10, true, &mut bytes);
        let representative = unpack_vector3_n(&bytes, 10, true);

        let mut bytes2 = [0u8; 8];
        pack_vector3_n(representative, 10, true, &mut bytes2);
        assert_eq!(bytes, bytes2);
    }

    #[test]
    fn test_identity_rotation_all_formats() {
        let identity = Quat::IDENTITY;

        // Quat128
        let mut bytes = [0u8; 16];
        pack_vector4_128(identity.to_array(), &mut bytes);
        let q = Quat::from_array(unpack_vector4_128(&bytes));
        assert!(q.w >= 0.9999);

        // QuatDropW96
        let xyz = Vec3::new(identity.x, identity.y, identity.z);
        let mut bytes = [0u8; 12];
        pack_vector3_96(xyz, &mut bytes);
        let q = quat_from_positive_w(unpack_vector3_96(&bytes));
        assert!(q.w >= 0.9999, "QuatDropW96 w = {}", q.w);

        // QuatDropW48
        let mut bytes = [0u8; 6];
        pack_vector3_48(xyz, true, &mut bytes);
        let q = quat_from_positive_w(unpack_vector3_48(&bytes, true));
        assert!(q.w >= 0.9999, "QuatDropW48 w = {}", q.w);
        assert!(q.x.abs() < 1e-4 && q.y.abs() < 1e-4 && q.z.abs() < 1e-4);

        // QuatDropW32
        let mut bytes = [0u8; 4];
        pack_vector3_32(xyz, true, &mut bytes);
        let q = quat_from_positive_w(unpack_vector3_32(&bytes, true));
        assert!(q.w >= 0.9999, "QuatDropW32 w = {}", q.w);
        assert!(q.x.abs() < 1e-3 && q.y.abs() < 1e-3 && q.z.abs() < 1e-3);

        // Variable at 10 bits
        let mut bytes = [0u8; 8];
        pack_vector3_n(xyz, 10, true, &mut bytes);
        let q = quat_from_positive_w(unpack_vector3_n(&bytes, 10, true));
        assert!(q.w >= 0.9999, "variable w = {}", q.w);
    }

    #[test]
    fn test_drop_w_roundtrip_arbitrary_rotation() {
        // ~31.4 degree X rotation
        let rotation = Quat::from_xyzw(0.270598, 0.0, 0.0, 0.962728);
        let flipped = quat_ensure_positive_w(rotation);
        let xyz = Vec3::new(flipped.x, flipped.y, flipped.z);

        let mut bytes = [0u8; 6];
        pack_vector3_48(xyz, true, &mut bytes);
        let decoded = quat_from_positive_w(unpack_vector3_48(&bytes, true));
        assert!(
            quat_error(rotation, decoded) < 1e-6,
            "dot = {}",
            rotation.dot(decoded)
        );
    }

    #[test]
    fn test_quat_ensure_positive_w() {
        let rotation = Quat::from_xyzw(0.5, 0.5, 0.5, -0.5);
        let flipped = quat_ensure_positive_w(rotation);
        assert!(flipped.w >= 0.0);
        // Same rotation, opposite sign
        assert!(rotation.dot(flipped).abs() > 0.999_999);

        let rotation = Quat::from_xyzw(0.0, 0.0, 0.0, 1.0);
        assert_eq!(quat_ensure_positive_w(rotation), rotation);
    }

    #[test]
    fn test_quat_from_positive_w_degenerate() {
        // Quantization noise can push the XYZ norm slightly past 1
        let q = quat_from_positive_w(Vec3::new(0.8, 0.6, 0.1));
        assert_eq!(q.w, 0.0);
    }
}
