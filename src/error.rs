//! Error types for animation compression

use thiserror::Error;

/// Errors that can occur when building clips, skeletons or bone streams
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompressError {
    /// Clip contains no bones
    #[error("Clip contains no bones")]
    EmptyClip,

    /// Clip contains no samples
    #[error("Clip contains no samples")]
    EmptySamples,

    /// Sample rate must be non-zero
    #[error("Invalid sample rate: 0 Hz")]
    InvalidSampleRate,

    /// Error threshold must be positive
    #[error("Invalid error threshold: {0} (must be > 0)")]
    InvalidErrorThreshold(f32),

    /// A bone track has the wrong number of samples
    #[error("Bone {bone} has {actual} samples (expected {expected})")]
    SampleCountMismatch {
        bone: u16,
        expected: u32,
        actual: u32,
    },

    /// Too many bones for a 16-bit bone index
    #[error("Too many bones: {0} (max 65535)")]
    TooManyBones(usize),

    /// A bone's parent appears after the bone itself
    #[error("Bone {bone} references parent {parent} which does not precede it")]
    UnsortedHierarchy { bone: u16, parent: u16 },

    /// Bone stream count does not match the skeleton
    #[error("Bone count mismatch: {streams} streams, {skeleton} skeleton bones")]
    BoneCountMismatch { streams: u16, skeleton: u16 },

    /// Variable translation quantization needs per-track ranges
    #[error("Variable translation format requires translation range reduction")]
    MissingRangeReduction,
}
