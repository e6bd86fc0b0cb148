//! Compression configuration

use serde::{Deserialize, Serialize};

use crate::formats::{RotationFormat, VectorFormat};

/// Parent compression algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmType {
    UniformlySampled,
}

/// Clip segmenting options
///
/// Segments run the same quantization search over a sub-range of samples;
/// the search itself is unchanged, only its inputs differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentingSettings {
    pub enabled: bool,
}

/// Compression options for a clip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionSettings {
    pub algorithm: AlgorithmType,
    pub rotation_format: RotationFormat,
    pub translation_format: VectorFormat,
    /// Reserved for scale tracks; scale is not compressed
    pub scale_format: VectorFormat,
    /// Remap rotation channel domains per clip before packing
    pub rotation_range_reduction: bool,
    /// Precompute per-track min/extent and pack translations from `[0, 1]`
    pub translation_range_reduction: bool,
    pub segmenting: SegmentingSettings,
    /// Maximum angle in radians between samples of a constant rotation track
    pub constant_rotation_threshold_angle: f32,
    /// Maximum distance in centimeters between samples of a constant
    /// translation track
    pub constant_translation_threshold: f32,
    /// Reserved for scale tracks; scale is not compressed
    pub constant_scale_threshold: f32,
    /// Consumed by regression tooling; not read by the compressor
    pub regression_error_threshold: f32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmType::UniformlySampled,
            rotation_format: RotationFormat::QuatDropWVariable,
            translation_format: VectorFormat::VectorVariable,
            scale_format: VectorFormat::Vector96,
            rotation_range_reduction: false,
            translation_range_reduction: true,
            segmenting: SegmentingSettings { enabled: false },
            constant_rotation_threshold_angle: 0.00284714461,
            constant_translation_threshold: 0.001,
            constant_scale_threshold: 0.00001,
            regression_error_threshold: 0.1,
        }
    }
}
