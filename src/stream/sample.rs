//! Pose sampling from bone streams

use glam::{Quat, Vec3};

use crate::clip::{quat_nlerp, sample_keys};
use crate::transform::Transform;

use super::BoneStreams;

/// Sample every bone stream at `time`, writing one local transform per bone
///
/// Default tracks contribute the identity rotation / zero translation.
/// Constant tracks hold a single sample, so key selection clamps to it.
pub fn sample_streams(bone_streams: &[BoneStreams], time: f32, out_pose: &mut [Transform]) {
    debug_assert_eq!(bone_streams.len(), out_pose.len());

    for (bone, out) in bone_streams.iter().zip(out_pose.iter_mut()) {
        let rotation = if bone.is_rotation_default {
            Quat::IDENTITY
        } else {
            let stream = &bone.rotations;
            let (key0, key1, alpha) =
                sample_keys(stream.num_samples(), stream.sample_rate(), time);
            quat_nlerp(stream.sample(key0), stream.sample(key1), alpha)
        };

        let translation = if bone.is_translation_default {
            Vec3::ZERO
        } else {
            let stream = &bone.translations;
            let (key0, key1, alpha) =
                sample_keys(stream.num_samples(), stream.sample_rate(), time);
            stream.sample(key0).lerp(stream.sample(key1), alpha)
        };

        *out = Transform::new(rotation, translation, Vec3::ONE);
    }
}

/// Number of samples in the longest animated track
pub fn get_animated_num_samples(bone_streams: &[BoneStreams]) -> u32 {
    let mut num_samples = 1;
    for bone in bone_streams {
        if bone.is_rotation_animated() {
            num_samples = num_samples.max(bone.rotations.num_samples());
        }
        if bone.is_translation_animated() {
            num_samples = num_samples.max(bone.translations.num_samples());
        }
    }
    num_samples
}
