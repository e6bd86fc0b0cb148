//! Nether-Anim: skeletal animation clip compression for Nethercore
//!
//! This crate compresses uniformly sampled skeletal animation clips by
//! selecting a per-track bit rate that minimizes storage while keeping the
//! reconstructed pose error on the skeleton below an application-supplied
//! threshold.
//!
//! **This is a pure compressor core** - it operates on in-memory bone
//! streams. Clip ingestion from interchange formats and output file encoding
//! are handled by the caller.
//!
//! # How it works
//!
//! 1. [`extract_bone_streams`] samples a clip into full precision per-bone
//!    rotation and translation streams, collapsing constant tracks to one
//!    sample and dropping default (identity) tracks entirely.
//! 2. [`quantize_streams`] packs every track into its target format. For
//!    variable formats it runs an error-driven search: all tracks start at
//!    the lowest bit rate, then the search repeatedly finds the worst bone on
//!    the skeleton, attributes its error along the ancestor chain, and raises
//!    the bit rate of the most guilty track until the whole clip measures
//!    below the error threshold.
//!
//! The error metric is forward kinematic: poses are composed into object
//! space and compared at shell vertices a fixed distance from each bone, so
//! a sloppy root track costs more than a sloppy fingertip.
//!
//! # Sample formats
//!
//! | Format | Size | Layout |
//! |--------|------|--------|
//! | `Quat128` / `Vector96` | 16 / 12 bytes | raw f32, little-endian |
//! | `QuatDropW96` | 12 bytes | X/Y/Z as f32, W reconstructed |
//! | `QuatDropW48` / `Vector48` | 6 bytes | 3x 16-bit quantized channels |
//! | `QuatDropW32` / `Vector32` | 4 bytes | 11/11/10-bit channels |
//! | `QuatDropWVariable` / `VectorVariable` | 8-byte slot | 3x N-bit channels, MSB-first in a 64-bit LE word, N in `[1, 19]` |
//!
//! Drop-W formats reconstruct `w = sqrt(max(0, 1 - x^2 - y^2 - z^2))`;
//! quaternions are flipped onto the `w >= 0` hemisphere before packing.
//! Sub-96-bit translations pack through a per-track range precomputed by
//! range reduction.
//!
//! # Usage
//!
//! ```no_run
//! use glam::{Quat, Vec3};
//! use nether_anim::{
//!     extract_bone_streams, quantize_streams, AnimatedBone, AnimationClip,
//!     CompressionSettings, RigidBone, RigidSkeleton,
//! };
//!
//! let skeleton = RigidSkeleton::new(vec![RigidBone {
//!     parent_index: None,
//!     vertex_distance: 3.0,
//! }])
//! .unwrap();
//!
//! // 30 samples at 30 Hz, 0.01 cm error threshold
//! let clip = AnimationClip::new(
//!     vec![AnimatedBone {
//!         rotations: (0..30).map(|i| Quat::from_rotation_z(i as f32 * 0.02)).collect(),
//!         translations: vec![Vec3::ZERO; 30],
//!     }],
//!     30,
//!     0.01,
//! )
//! .unwrap();
//!
//! let settings = CompressionSettings::default();
//! let mut streams = extract_bone_streams(&clip, &settings).unwrap();
//! quantize_streams(
//!     &mut streams,
//!     settings.rotation_format,
//!     settings.translation_format,
//!     &clip,
//!     &skeleton,
//! )
//! .unwrap();
//! ```

mod bitset;
mod clip;
mod error;
mod error_metric;
mod formats;
mod packing;
mod quantize;
mod settings;
mod skeleton;
mod stream;
mod transform;

pub use clip::{AnimatedBone, AnimationClip};
pub use error::CompressError;
pub use error_metric::{
    calculate_skeleton_error, calculate_skeleton_error_contribution, BoneTrackError,
};
pub use formats::{
    num_bits_at_bit_rate, RotationFormat, RotationVariant, TrackType, VectorFormat,
    HIGHEST_BIT_RATE, LOWEST_BIT_RATE,
};
pub use packing::{
    pack_scalar_signed, pack_scalar_unsigned, pack_vector3_32, pack_vector3_48, pack_vector3_96,
    pack_vector3_n, pack_vector4_128, quat_ensure_positive_w, quat_from_positive_w,
    unpack_scalar_signed, unpack_scalar_unsigned, unpack_vector3_32, unpack_vector3_48,
    unpack_vector3_96, unpack_vector3_n, unpack_vector4_128,
};
pub use quantize::quantize_streams;
pub use settings::{AlgorithmType, CompressionSettings, SegmentingSettings};
pub use skeleton::{RigidBone, RigidSkeleton};
pub use stream::{
    extract_bone_streams, get_animated_num_samples, sample_streams, BoneStreams,
    RotationTrackStream, TrackRange, TranslationTrackStream,
};
pub use transform::Transform;
