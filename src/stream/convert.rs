//! Bone stream extraction from raw clips
//!
//! Populates full precision bone streams from a clip's key arrays, detecting
//! constant and default tracks and computing per-track ranges when range
//! reduction is enabled. Extracted streams are what the quantizer re-reads
//! on every precision bump.

use glam::{Quat, Vec3};
use tracing::debug;

use crate::clip::AnimationClip;
use crate::error::CompressError;
use crate::formats::{RotationFormat, VectorFormat};
use crate::packing;
use crate::settings::CompressionSettings;

use super::{BoneStreams, RotationTrackStream, TrackRange, TranslationTrackStream};

/// Extract full precision bone streams from a clip
///
/// Rotation streams come out as `Quat128`, translation streams as
/// `Vector96`. Constant tracks collapse to a single sample; default tracks
/// to none. Variable translation targets require range reduction so packed
/// channels land in `[0, 1]`.
pub fn extract_bone_streams(
    clip: &AnimationClip,
    settings: &CompressionSettings,
) -> Result<Vec<BoneStreams>, CompressError> {
    if settings.translation_format.is_variable() && !settings.translation_range_reduction {
        return Err(CompressError::MissingRangeReduction);
    }

    let sample_rate = clip.sample_rate();
    let mut bone_streams = Vec::with_capacity(clip.num_bones() as usize);
    let mut num_constant_tracks = 0u32;
    let mut num_default_tracks = 0u32;

    for bone in clip.bones() {
        let is_rotation_constant = is_constant_rotation(
            &bone.rotations,
            settings.constant_rotation_threshold_angle,
        );
        let is_rotation_default = is_rotation_constant
            && quat_near_identity(
                bone.rotations[0],
                settings.constant_rotation_threshold_angle,
            );

        let is_translation_constant = is_constant_translation(
            &bone.translations,
            settings.constant_translation_threshold,
        );
        let is_translation_default = is_translation_constant
            && bone.translations[0].length() <= settings.constant_translation_threshold;

        let rotations = build_rotation_stream(
            &bone.rotations,
            is_rotation_default,
            is_rotation_constant,
            sample_rate,
        );
        let translations = build_translation_stream(
            &bone.translations,
            is_translation_default,
            is_translation_constant,
            sample_rate,
            settings.translation_range_reduction,
        );

        num_constant_tracks +=
            u32::from(is_rotation_constant) + u32::from(is_translation_constant);
        num_default_tracks += u32::from(is_rotation_default) + u32::from(is_translation_default);

        bone_streams.push(BoneStreams {
            rotations,
            translations,
            is_rotation_default,
            is_rotation_constant,
            is_translation_default,
            is_translation_constant,
        });
    }

    debug!(
        num_bones = bone_streams.len(),
        num_constant_tracks, num_default_tracks, "extracted bone streams"
    );

    Ok(bone_streams)
}

fn is_constant_rotation(samples: &[Quat], threshold_angle: f32) -> bool {
    let reference = samples[0];
    let min_dot = (threshold_angle * 0.5).cos();
    samples.iter().all(|q| q.dot(reference).abs() >= min_dot)
}

fn quat_near_identity(rotation: Quat, threshold_angle: f32) -> bool {
    rotation.w.abs() >= (threshold_angle * 0.5).cos()
}

fn is_constant_translation(samples: &[Vec3], threshold: f32) -> bool {
    let reference = samples[0];
    samples.iter().all(|t| t.distance(reference) <= threshold)
}

fn build_rotation_stream(
    rotations: &[Quat],
    is_default: bool,
    is_constant: bool,
    sample_rate: u32,
) -> RotationTrackStream {
    let format = RotationFormat::Quat128;
    if is_default {
        return RotationTrackStream::new(0, format.packed_size(), sample_rate, format, None);
    }

    let samples = if is_constant {
        &rotations[..1]
    } else {
        rotations
    };
    let mut stream = RotationTrackStream::new(
        samples.len() as u32,
        format.packed_size(),
        sample_rate,
        format,
        None,
    );
    for (sample_index, rotation) in samples.iter().enumerate() {
        packing::pack_vector4_128(rotation.to_array(), stream.raw_sample_mut(sample_index as u32));
    }
    stream
}

fn build_translation_stream(
    translations: &[Vec3],
    is_default: bool,
    is_constant: bool,
    sample_rate: u32,
    range_reduction: bool,
) -> TranslationTrackStream {
    let format = VectorFormat::Vector96;
    if is_default {
        return TranslationTrackStream::new(
            0,
            format.packed_size(),
            sample_rate,
            format,
            None,
            TrackRange::IDENTITY,
        );
    }

    let samples = if is_constant {
        &translations[..1]
    } else {
        translations
    };
    let range = if range_reduction && !is_constant {
        TrackRange::from_samples(samples)
    } else {
        TrackRange::IDENTITY
    };

    let mut stream = TranslationTrackStream::new(
        samples.len() as u32,
        format.packed_size(),
        sample_rate,
        format,
        None,
        range,
    );
    for (sample_index, translation) in samples.iter().enumerate() {
        packing::pack_vector3_96(*translation, stream.raw_sample_mut(sample_index as u32));
    }
    stream
}
