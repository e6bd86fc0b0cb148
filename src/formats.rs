//! Rotation and translation sample formats
//!
//! Formats come in two families: fixed formats with a hard-coded per-sample
//! width, and variable formats whose per-channel bit count is an index into
//! the bit rate schedule. Rotation formats that drop the W component are
//! grouped under the `QuatDropW` variant; the variant's highest-precision
//! member is what constant tracks are stored as.

use serde::{Deserialize, Serialize};

/// Lowest bit rate a variable track can be quantized at
pub const LOWEST_BIT_RATE: u8 = 1;

/// Highest bit rate a variable track can be quantized at
pub const HIGHEST_BIT_RATE: u8 = 19;

/// Bits per channel at a given variable bit rate
///
/// The schedule is currently the identity mapping over `[1, 19]`.
#[inline]
pub fn num_bits_at_bit_rate(bit_rate: u8) -> u32 {
    debug_assert!(
        (LOWEST_BIT_RATE..=HIGHEST_BIT_RATE).contains(&bit_rate),
        "invalid bit rate: {bit_rate}"
    );
    bit_rate as u32
}

/// Rotation sample format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationFormat {
    /// Full precision quaternion, 4x f32
    Quat128,
    /// Quaternion with W dropped, 3x f32
    QuatDropW96,
    /// Quaternion with W dropped, 3x 16 bits
    QuatDropW48,
    /// Quaternion with W dropped, 11/11/10 bits
    QuatDropW32,
    /// Quaternion with W dropped, N/N/N bits at the track's bit rate
    QuatDropWVariable,
}

/// Rotation format family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationVariant {
    Quat,
    QuatDropW,
}

impl RotationFormat {
    /// Whether samples are packed at a per-track bit rate
    #[inline]
    pub fn is_variable(self) -> bool {
        self == RotationFormat::QuatDropWVariable
    }

    /// The format family this format belongs to
    pub fn variant(self) -> RotationVariant {
        match self {
            RotationFormat::Quat128 => RotationVariant::Quat,
            RotationFormat::QuatDropW96
            | RotationFormat::QuatDropW48
            | RotationFormat::QuatDropW32
            | RotationFormat::QuatDropWVariable => RotationVariant::QuatDropW,
        }
    }

    /// Packed sample size in bytes
    ///
    /// Variable samples always occupy a full 8-byte slot.
    pub fn packed_size(self) -> u32 {
        match self {
            RotationFormat::Quat128 => 16,
            RotationFormat::QuatDropW96 => 12,
            RotationFormat::QuatDropW48 => 6,
            RotationFormat::QuatDropW32 => 4,
            RotationFormat::QuatDropWVariable => 8,
        }
    }
}

impl RotationVariant {
    /// The highest-precision fixed format in this family
    pub fn highest_precision(self) -> RotationFormat {
        match self {
            RotationVariant::Quat => RotationFormat::Quat128,
            RotationVariant::QuatDropW => RotationFormat::QuatDropW96,
        }
    }
}

/// Translation sample format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorFormat {
    /// Full precision vector, 3x f32
    Vector96,
    /// 3x 16 bits
    Vector48,
    /// 11/11/10 bits
    Vector32,
    /// N/N/N bits at the track's bit rate
    VectorVariable,
}

impl VectorFormat {
    /// Whether samples are packed at a per-track bit rate
    #[inline]
    pub fn is_variable(self) -> bool {
        self == VectorFormat::VectorVariable
    }

    /// Packed sample size in bytes
    ///
    /// Variable samples always occupy a full 8-byte slot.
    pub fn packed_size(self) -> u32 {
        match self {
            VectorFormat::Vector96 => 12,
            VectorFormat::Vector48 => 6,
            VectorFormat::Vector32 => 4,
            VectorFormat::VectorVariable => 8,
        }
    }
}

/// Which track of a bone a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Rotation,
    Translation,
}
