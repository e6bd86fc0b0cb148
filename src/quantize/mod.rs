//! Variable bit rate stream quantization
//!
//! The quantizer owns a working duplicate of the bone streams, starts every
//! variable track at the lowest bit rate and iteratively raises the bit rate
//! of whichever ancestor track contributes the most error at the worst bone,
//! until the clip-wide error drops below the clip's threshold.
//!
//! Each precision bump re-reads the original full precision streams rather
//! than the working copy, so quantization loss never compounds.


use glam::Vec3;
use tracing::debug;

use crate::bitset::BoneBitSet;
use crate::clip::AnimationClip;
use crate::error::CompressError;
use crate::error_metric::{
    calculate_skeleton_error, calculate_skeleton_error_contribution, BoneTrackError,
};
use crate::formats::{
    num_bits_at_bit_rate, RotationFormat, RotationVariant, TrackType, VectorFormat,
    HIGHEST_BIT_RATE, LOWEST_BIT_RATE,
};
use crate::packing;
use crate::skeleton::RigidSkeleton;
use crate::stream::{
    get_animated_num_samples, sample_streams, BoneStreams, RotationTrackStream,
    TranslationTrackStream,
};
use crate::transform::Transform;

fn quantize_fixed_rotation_stream(
    raw_stream: &RotationTrackStream,
    rotation_format: RotationFormat,
) -> RotationTrackStream {
    // Raw rotation samples are full width quaternions
    assert_eq!(
        raw_stream.sample_size(),
        16,
        "unexpected rotation sample size: {} != 16",
        raw_stream.sample_size()
    );

    let num_samples = raw_stream.num_samples();
    let mut quantized_stream = RotationTrackStream::new(
        num_samples,
        rotation_format.packed_size(),
        raw_stream.sample_rate(),
        rotation_format,
        None,
    );

    for sample_index in 0..num_samples {
        let rotation = raw_stream.sample(sample_index);
        let out = quantized_stream.raw_sample_mut(sample_index);
        match rotation_format {
            RotationFormat::Quat128 => packing::pack_vector4_128(rotation.to_array(), out),
            RotationFormat::QuatDropW96 => {
                let rotation = packing::quat_ensure_positive_w(rotation);
                packing::pack_vector3_96(Vec3::new(rotation.x, rotation.y, rotation.z), out);
            }
            RotationFormat::QuatDropW48 => {
                let rotation = packing::quat_ensure_positive_w(rotation);
                packing::pack_vector3_48(Vec3::new(rotation.x, rotation.y, rotation.z), true, out);
            }
            RotationFormat::QuatDropW32 => {
                let rotation = packing::quat_ensure_positive_w(rotation);
                packing::pack_vector3_32(Vec3::new(rotation.x, rotation.y, rotation.z), true, out);
            }
            RotationFormat::QuatDropWVariable => {
                panic!("invalid rotation format for fixed quantization: {rotation_format:?}")
            }
        }
    }

    quantized_stream
}

fn quantize_variable_rotation_stream(
    raw_stream: &RotationTrackStream,
    bit_rate: u8,
) -> RotationTrackStream {
    assert_eq!(
        raw_stream.sample_size(),
        16,
        "unexpected rotation sample size: {} != 16",
        raw_stream.sample_size()
    );

    let num_samples = raw_stream.num_samples();
    let num_bits = num_bits_at_bit_rate(bit_rate);
    let mut quantized_stream = RotationTrackStream::new(
        num_samples,
        RotationFormat::QuatDropWVariable.packed_size(),
        raw_stream.sample_rate(),
        RotationFormat::QuatDropWVariable,
        Some(bit_rate),
    );

    for sample_index in 0..num_samples {
        let rotation = packing::quat_ensure_positive_w(raw_stream.sample(sample_index));
        packing::pack_vector3_n(
            Vec3::new(rotation.x, rotation.y, rotation.z),
            num_bits,
            true,
            quantized_stream.raw_sample_mut(sample_index),
        );
    }

    quantized_stream
}

fn quantize_fixed_rotation_streams(
    bone_streams: &mut [BoneStreams],
    rotation_format: RotationFormat,
    is_variable_variant: bool,
) {
    let highest_precision = rotation_format.variant().highest_precision();

    for bone_stream in bone_streams.iter_mut() {
        // Default tracks aren't quantized
        if bone_stream.is_rotation_default {
            continue;
        }

        // Constant tracks in a variable family stay at the variant's highest
        // precision; a fixed family quantizes them like any other track
        let format = if is_variable_variant && bone_stream.is_rotation_constant {
            highest_precision
        } else {
            rotation_format
        };

        bone_stream.rotations = quantize_fixed_rotation_stream(&bone_stream.rotations, format);
    }
}

fn quantize_variable_rotation_streams(bone_streams: &mut [BoneStreams], bit_rate: u8) {
    let highest_precision = RotationVariant::QuatDropW.highest_precision();

    for bone_stream in bone_streams.iter_mut() {
        if bone_stream.is_rotation_default {
            continue;
        }

        bone_stream.rotations = if bone_stream.is_rotation_constant {
            quantize_fixed_rotation_stream(&bone_stream.rotations, highest_precision)
        } else {
            quantize_variable_rotation_stream(&bone_stream.rotations, bit_rate)
        };
    }
}

fn quantize_fixed_translation_stream(
    raw_stream: &TranslationTrackStream,
    translation_format: VectorFormat,
) -> TranslationTrackStream {
    assert_eq!(
        raw_stream.format(),
        VectorFormat::Vector96,
        "expected a Vector96 translation stream, found: {:?}",
        raw_stream.format()
    );

    let num_samples = raw_stream.num_samples();
    let range = raw_stream.range();
    let mut quantized_stream = TranslationTrackStream::new(
        num_samples,
        translation_format.packed_size(),
        raw_stream.sample_rate(),
        translation_format,
        None,
        range,
    );

    for sample_index in 0..num_samples {
        let translation = raw_stream.sample(sample_index);
        let out = quantized_stream.raw_sample_mut(sample_index);
        match translation_format {
            VectorFormat::Vector96 => packing::pack_vector3_96(translation, out),
            VectorFormat::Vector48 => {
                packing::pack_vector3_48(range.normalize(translation), false, out)
            }
            VectorFormat::Vector32 => {
                packing::pack_vector3_32(range.normalize(translation), false, out)
            }
            VectorFormat::VectorVariable => {
                panic!("invalid vector format for fixed quantization: {translation_format:?}")
            }
        }
    }

    quantized_stream
}

fn quantize_variable_translation_stream(
    raw_stream: &TranslationTrackStream,
    bit_rate: u8,
) -> TranslationTrackStream {
    assert_eq!(
        raw_stream.format(),
        VectorFormat::Vector96,
        "expected a Vector96 translation stream, found: {:?}",
        raw_stream.format()
    );

    let num_samples = raw_stream.num_samples();
    let num_bits = num_bits_at_bit_rate(bit_rate);
    let range = raw_stream.range();
    let mut quantized_stream = TranslationTrackStream::new(
        num_samples,
        VectorFormat::VectorVariable.packed_size(),
        raw_stream.sample_rate(),
        VectorFormat::VectorVariable,
        Some(bit_rate),
        range,
    );

    for sample_index in 0..num_samples {
        let translation = raw_stream.sample(sample_index);
        packing::pack_vector3_n(
            range.normalize(translation),
            num_bits,
            false,
            quantized_stream.raw_sample_mut(sample_index),
        );
    }

    quantized_stream
}

fn quantize_fixed_translation_streams(
    bone_streams: &mut [BoneStreams],
    translation_format: VectorFormat,
) {
    for bone_stream in bone_streams.iter_mut() {
        if bone_stream.is_translation_default {
            continue;
        }

        // Constant translation tracks keep the remaining sample at full precision
        let format = if bone_stream.is_translation_constant {
            VectorFormat::Vector96
        } else {
            translation_format
        };

        bone_stream.translations =
            quantize_fixed_translation_stream(&bone_stream.translations, format);
    }
}

fn quantize_variable_translation_streams(bone_streams: &mut [BoneStreams], bit_rate: u8) {
    for bone_stream in bone_streams.iter_mut() {
        if bone_stream.is_translation_default {
            continue;
        }

        bone_stream.translations = if bone_stream.is_translation_constant {
            quantize_fixed_translation_stream(&bone_stream.translations, VectorFormat::Vector96)
        } else {
            quantize_variable_translation_stream(&bone_stream.translations, bit_rate)
        };
    }
}

fn quantize_variable_streams(
    bone_streams: &mut [BoneStreams],
    rotation_format: RotationFormat,
    translation_format: VectorFormat,
    clip: &AnimationClip,
    skeleton: &RigidSkeleton,
) {
    let num_bones = bone_streams.len();

    // Duplicate our streams
    let mut quantized_streams: Vec<BoneStreams> =
        bone_streams.iter().map(BoneStreams::duplicate).collect();

    let is_rotation_variable = rotation_format.is_variable();
    let is_translation_variable = translation_format.is_variable();
    let scan_whole_clip_for_bad_bone = false;

    // Quantize everything to the lowest bit rate of the same variant
    if is_rotation_variable {
        quantize_variable_rotation_streams(&mut quantized_streams, LOWEST_BIT_RATE);
    } else {
        quantize_fixed_rotation_streams(&mut quantized_streams, rotation_format, false);
    }

    if is_translation_variable {
        quantize_variable_translation_streams(&mut quantized_streams, LOWEST_BIT_RATE);
    } else {
        quantize_fixed_translation_streams(&mut quantized_streams, translation_format);
    }

    let num_samples = get_animated_num_samples(bone_streams);
    let sample_rate = bone_streams[0].rotations.sample_rate() as f32;
    let error_threshold = clip.error_threshold();
    let clip_duration = clip.duration();
    let mut error = f32::MAX;

    let mut raw_local_pose = vec![Transform::IDENTITY; num_bones];
    let mut lossy_local_pose = vec![Transform::IDENTITY; num_bones];
    let mut error_per_bone = vec![0.0f32; num_bones];
    let mut error_per_stream = vec![BoneTrackError::default(); num_bones];

    // Bones whose error cannot be improved any further
    let mut low_resolution_bones = BoneBitSet::new(num_bones as u16);

    // While we are above our precision threshold, iterate
    while error > error_threshold {
        error = 0.0;

        // Find the first bone in the hierarchy above the threshold, root
        // first, scanning sample times until one is found
        let mut bad_bone_index: Option<u16> = None;
        let mut worst_clip_error = error_threshold;
        'scan: for sample_index in 0..num_samples {
            let sample_time = (sample_index as f32 / sample_rate).min(clip_duration);

            // The raw clip is the reference, not the input streams: those may
            // already be normalized or converted
            clip.sample_pose(sample_time, &mut raw_local_pose);
            sample_streams(&quantized_streams, sample_time, &mut lossy_local_pose);

            calculate_skeleton_error(
                skeleton,
                &raw_local_pose,
                &lossy_local_pose,
                &mut error_per_bone,
            );

            for (bone_index, &bone_error) in error_per_bone.iter().enumerate() {
                if bone_error > worst_clip_error
                    && !low_resolution_bones.test(bone_index as u16)
                {
                    worst_clip_error = bone_error;
                    error = bone_error;
                    bad_bone_index = Some(bone_index as u16);
                    break;
                }
            }

            if !scan_whole_clip_for_bad_bone && bad_bone_index.is_some() {
                break 'scan;
            }
        }

        let Some(bad_bone_index) = bad_bone_index else {
            // Every offender left is marked low resolution, stop now
            break;
        };

        // Find which track in the chain contributes the most error and can
        // still gain precision
        calculate_skeleton_error_contribution(
            skeleton,
            &raw_local_pose,
            &lossy_local_pose,
            bad_bone_index,
            &mut error_per_stream,
        );

        let mut target: Option<(u16, TrackType, u8)> = None;
        let mut worst_track_error = 0.0f32;

        let mut current_bone_index = Some(bad_bone_index);
        while let Some(bone_index) = current_bone_index {
            let bone = bone_index as usize;

            let rotation_bit_rate = quantized_streams[bone]
                .rotations
                .bit_rate()
                .unwrap_or(HIGHEST_BIT_RATE);
            let can_increase_rotation_precision =
                is_rotation_variable && rotation_bit_rate < HIGHEST_BIT_RATE;
            if can_increase_rotation_precision
                && error_per_stream[bone].rotation > worst_track_error
            {
                target = Some((bone_index, TrackType::Rotation, rotation_bit_rate));
                worst_track_error = error_per_stream[bone].rotation;
            }

            let translation_bit_rate = quantized_streams[bone]
                .translations
                .bit_rate()
                .unwrap_or(HIGHEST_BIT_RATE);
            let can_increase_translation_precision =
                is_translation_variable && translation_bit_rate < HIGHEST_BIT_RATE;
            if can_increase_translation_precision
                && error_per_stream[bone].translation > worst_track_error
            {
                target = Some((bone_index, TrackType::Translation, translation_bit_rate));
                worst_track_error = error_per_stream[bone].translation;
            }

            current_bone_index = skeleton.bone(bone_index).parent_index;
        }

        let Some((target_bone_index, target_track_type, target_bit_rate)) = target else {
            // The bone is above the threshold but every track in its chain is
            // already at its ceiling, typically because the other track family
            // is quantized to a lossy fixed format
            low_resolution_bones.set(bad_bone_index, true);
            debug!(
                bone = bad_bone_index,
                "no ancestor track can gain precision, marking bone low resolution"
            );
            continue;
        };

        // Increase its bit rate a bit, re-reading the original streams
        let new_bit_rate = target_bit_rate + 1;
        let target = target_bone_index as usize;
        match target_track_type {
            TrackType::Rotation => {
                quantized_streams[target].rotations = quantize_variable_rotation_stream(
                    &bone_streams[target].rotations,
                    new_bit_rate,
                );
            }
            TrackType::Translation => {
                quantized_streams[target].translations = quantize_variable_translation_stream(
                    &bone_streams[target].translations,
                    new_bit_rate,
                );
            }
        }

        debug!(
            bone = target_bone_index,
            track = ?target_track_type,
            bit_rate = new_bit_rate,
            error,
            "raised track precision"
        );
    }

    // Swap our streams
    for (bone_stream, mut quantized_stream) in bone_streams.iter_mut().zip(quantized_streams) {
        std::mem::swap(bone_stream, &mut quantized_stream);
    }
}

/// Quantize every bone stream to the requested formats
///
/// Fixed formats quantize each track once. If either format is variable, the
/// error-driven search selects a per-track bit rate that keeps the clip's
/// object space error below `clip.error_threshold()` wherever the hierarchy
/// allows it. On return the streams hold the quantized result; bones whose
/// chain ran out of precision are left with residual error.
pub fn quantize_streams(
    bone_streams: &mut [BoneStreams],
    rotation_format: RotationFormat,
    translation_format: VectorFormat,
    clip: &AnimationClip,
    skeleton: &RigidSkeleton,
) -> Result<(), CompressError> {
    if bone_streams.is_empty() {
        return Err(CompressError::EmptyClip);
    }
    if bone_streams.len() != skeleton.num_bones() as usize {
        return Err(CompressError::BoneCountMismatch {
            streams: bone_streams.len() as u16,
            skeleton: skeleton.num_bones(),
        });
    }
    if clip.num_bones() as usize != bone_streams.len() {
        return Err(CompressError::BoneCountMismatch {
            streams: bone_streams.len() as u16,
            skeleton: clip.num_bones(),
        });
    }

    debug!(
        num_bones = bone_streams.len(),
        ?rotation_format,
        ?translation_format,
        "quantizing bone streams"
    );

    if rotation_format.is_variable() || translation_format.is_variable() {
        quantize_variable_streams(
            bone_streams,
            rotation_format,
            translation_format,
            clip,
            skeleton,
        );
    } else {
        quantize_fixed_rotation_streams(bone_streams, rotation_format, false);
        quantize_fixed_translation_streams(bone_streams, translation_format);
    }

    Ok(())
}
