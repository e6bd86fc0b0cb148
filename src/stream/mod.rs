//! Bone track streams
//!
//! A track stream is an exclusively owned, contiguous array of equally sized
//! packed samples tagged with its format and, for variable formats, its
//! current bit rate. Streams never alias: duplicating one is an explicit,
//! deep copy.

mod convert;
mod sample;


pub use convert::extract_bone_streams;
pub use sample::{get_animated_num_samples, sample_streams};

use glam::{Quat, Vec3};

use crate::formats::{num_bits_at_bit_rate, RotationFormat, VectorFormat};
use crate::packing;

/// Owned storage for one track's packed samples
#[derive(Debug)]
pub struct TrackStream {
    samples: Vec<u8>,
    num_samples: u32,
    sample_size: u32,
    sample_rate: u32,
}

impl TrackStream {
    fn new(num_samples: u32, sample_size: u32, sample_rate: u32) -> Self {
        Self {
            samples: vec![0; num_samples as usize * sample_size as usize],
            num_samples,
            sample_size,
            sample_rate,
        }
    }

    fn duplicate(&self) -> Self {
        Self {
            samples: self.samples.clone(),
            num_samples: self.num_samples,
            sample_size: self.sample_size,
            sample_rate: self.sample_rate,
        }
    }

    fn raw_sample(&self, sample_index: u32) -> &[u8] {
        let offset = sample_index as usize * self.sample_size as usize;
        &self.samples[offset..offset + self.sample_size as usize]
    }

    fn raw_sample_mut(&mut self, sample_index: u32) -> &mut [u8] {
        let offset = sample_index as usize * self.sample_size as usize;
        &mut self.samples[offset..offset + self.sample_size as usize]
    }
}

/// A rotation track stream
#[derive(Debug)]
pub struct RotationTrackStream {
    stream: TrackStream,
    format: RotationFormat,
    bit_rate: Option<u8>,
}

impl RotationTrackStream {
    /// Allocate a zeroed stream
    ///
    /// Variable-format streams are slot aligned: `sample_size` must be 8
    /// regardless of the bit rate, and a bit rate must be provided.
    pub fn new(
        num_samples: u32,
        sample_size: u32,
        sample_rate: u32,
        format: RotationFormat,
        bit_rate: Option<u8>,
    ) -> Self {
        debug_assert!(
            !format.is_variable() || (sample_size == 8 && bit_rate.is_some()),
            "variable rotation streams are 8-byte slots with a bit rate"
        );
        Self {
            stream: TrackStream::new(num_samples, sample_size, sample_rate),
            format,
            bit_rate,
        }
    }

    /// Deep copy
    pub fn duplicate(&self) -> Self {
        Self {
            stream: self.stream.duplicate(),
            format: self.format,
            bit_rate: self.bit_rate,
        }
    }

    pub fn num_samples(&self) -> u32 {
        self.stream.num_samples
    }

    pub fn sample_size(&self) -> u32 {
        self.stream.sample_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.stream.sample_rate
    }

    pub fn format(&self) -> RotationFormat {
        self.format
    }

    /// Current bit rate; `None` for fixed-format streams
    pub fn bit_rate(&self) -> Option<u8> {
        self.bit_rate
    }

    /// The packed sample buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.stream.samples
    }

    pub(crate) fn raw_sample(&self, sample_index: u32) -> &[u8] {
        self.stream.raw_sample(sample_index)
    }

    pub(crate) fn raw_sample_mut(&mut self, sample_index: u32) -> &mut [u8] {
        self.stream.raw_sample_mut(sample_index)
    }

    /// Unpack one sample through the current format
    pub fn sample(&self, sample_index: u32) -> Quat {
        let bytes = self.raw_sample(sample_index);
        match self.format {
            RotationFormat::Quat128 => Quat::from_array(packing::unpack_vector4_128(bytes)),
            RotationFormat::QuatDropW96 => {
                packing::quat_from_positive_w(packing::unpack_vector3_96(bytes))
            }
            RotationFormat::QuatDropW48 => {
                packing::quat_from_positive_w(packing::unpack_vector3_48(bytes, true))
            }
            RotationFormat::QuatDropW32 => {
                packing::quat_from_positive_w(packing::unpack_vector3_32(bytes, true))
            }
            RotationFormat::QuatDropWVariable => {
                let Some(bit_rate) = self.bit_rate else {
                    panic!("variable rotation stream without a bit rate");
                };
                let num_bits = num_bits_at_bit_rate(bit_rate);
                packing::quat_from_positive_w(packing::unpack_vector3_n(bytes, num_bits, true))
            }
        }
    }
}

/// Per-track range reduction data
///
/// Maps a translation channel into the `[0, 1]` packing domain and back.
/// Precomputed upstream of quantization; the identity range leaves values
/// untouched apart from clamping at pack time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackRange {
    pub min: Vec3,
    pub extent: Vec3,
}

impl TrackRange {
    pub const IDENTITY: Self = Self {
        min: Vec3::ZERO,
        extent: Vec3::ONE,
    };

    /// Compute the bounding range of a set of samples
    pub fn from_samples(samples: &[Vec3]) -> Self {
        debug_assert!(!samples.is_empty());
        let mut min = samples[0];
        let mut max = samples[0];
        for &sample in &samples[1..] {
            min = min.min(sample);
            max = max.max(sample);
        }
        Self {
            min,
            extent: max - min,
        }
    }

    /// Map a value into the `[0, 1]` packing domain
    ///
    /// Channels with zero extent map to 0.
    pub fn normalize(&self, value: Vec3) -> Vec3 {
        Vec3::select(
            self.extent.cmpeq(Vec3::ZERO),
            Vec3::ZERO,
            (value - self.min) / self.extent,
        )
    }

    /// Map a `[0, 1]` value back into the track's domain
    pub fn denormalize(&self, value: Vec3) -> Vec3 {
        self.min + value * self.extent
    }
}

/// A translation track stream
#[derive(Debug)]
pub struct TranslationTrackStream {
    stream: TrackStream,
    format: VectorFormat,
    bit_rate: Option<u8>,
    range: TrackRange,
}

impl TranslationTrackStream {
    /// Allocate a zeroed stream
    ///
    /// Variable-format streams are slot aligned: `sample_size` must be 8
    /// regardless of the bit rate, and a bit rate must be provided.
    pub fn new(
        num_samples: u32,
        sample_size: u32,
        sample_rate: u32,
        format: VectorFormat,
        bit_rate: Option<u8>,
        range: TrackRange,
    ) -> Self {
        debug_assert!(
            !format.is_variable() || (sample_size == 8 && bit_rate.is_some()),
            "variable translation streams are 8-byte slots with a bit rate"
        );
        Self {
            stream: TrackStream::new(num_samples, sample_size, sample_rate),
            format,
            bit_rate,
            range,
        }
    }

    /// Deep copy
    pub fn duplicate(&self) -> Self {
        Self {
            stream: self.stream.duplicate(),
            format: self.format,
            bit_rate: self.bit_rate,
            range: self.range,
        }
    }

    pub fn num_samples(&self) -> u32 {
        self.stream.num_samples
    }

    pub fn sample_size(&self) -> u32 {
        self.stream.sample_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.stream.sample_rate
    }

    pub fn format(&self) -> VectorFormat {
        self.format
    }

    /// Current bit rate; `None` for fixed-format streams
    pub fn bit_rate(&self) -> Option<u8> {
        self.bit_rate
    }

    /// Range reduction data carried by this track
    pub fn range(&self) -> TrackRange {
        self.range
    }

    /// The packed sample buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.stream.samples
    }

    pub(crate) fn raw_sample(&self, sample_index: u32) -> &[u8] {
        self.stream.raw_sample(sample_index)
    }

    pub(crate) fn raw_sample_mut(&mut self, sample_index: u32) -> &mut [u8] {
        self.stream.raw_sample_mut(sample_index)
    }

    /// Unpack one sample through the current format and range
    pub fn sample(&self, sample_index: u32) -> Vec3 {
        let bytes = self.raw_sample(sample_index);
        match self.format {
            VectorFormat::Vector96 => packing::unpack_vector3_96(bytes),
            VectorFormat::Vector48 => self
                .range
                .denormalize(packing::unpack_vector3_48(bytes, false)),
            VectorFormat::Vector32 => self
                .range
                .denormalize(packing::unpack_vector3_32(bytes, false)),
            VectorFormat::VectorVariable => {
                let Some(bit_rate) = self.bit_rate else {
                    panic!("variable translation stream without a bit rate");
                };
                let num_bits = num_bits_at_bit_rate(bit_rate);
                self.range
                    .denormalize(packing::unpack_vector3_n(bytes, num_bits, false))
            }
        }
    }
}

/// Rotation and translation streams for one bone, plus track flags
///
/// A default track contributes the identity rotation / zero translation and
/// is never quantized. A constant track holds one logical sample stored at
/// its variant's highest precision.
#[derive(Debug)]
pub struct BoneStreams {
    pub rotations: RotationTrackStream,
    pub translations: TranslationTrackStream,
    pub is_rotation_default: bool,
    pub is_rotation_constant: bool,
    pub is_translation_default: bool,
    pub is_translation_constant: bool,
}

impl BoneStreams {
    /// Deep copy of both streams and flags
    pub fn duplicate(&self) -> Self {
        Self {
            rotations: self.rotations.duplicate(),
            translations: self.translations.duplicate(),
            is_rotation_default: self.is_rotation_default,
            is_rotation_constant: self.is_rotation_constant,
            is_translation_default: self.is_translation_default,
            is_translation_constant: self.is_translation_constant,
        }
    }

    pub fn is_rotation_animated(&self) -> bool {
        !self.is_rotation_default && !self.is_rotation_constant
    }

    pub fn is_translation_animated(&self) -> bool {
        !self.is_translation_default && !self.is_translation_constant
    }
}
