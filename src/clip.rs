//! Uniformly sampled animation clips
//!
//! A clip owns the raw, full precision key arrays the compressor measures
//! itself against. Keys are sampled uniformly in time; interpolation between
//! adjacent keys uses linear blending for translations and normalized linear
//! blending (nlerp) for rotations.

use glam::{Quat, Vec3};

use crate::error::CompressError;
use crate::transform::Transform;

/// Raw, full precision key arrays for one bone
#[derive(Debug, Clone)]
pub struct AnimatedBone {
    /// One rotation key per clip sample
    pub rotations: Vec<Quat>,
    /// One translation key per clip sample
    pub translations: Vec<Vec3>,
}

/// A uniformly sampled animation clip at full precision
#[derive(Debug, Clone)]
pub struct AnimationClip {
    bones: Vec<AnimatedBone>,
    num_samples: u32,
    sample_rate: u32,
    error_threshold: f32,
}

impl AnimationClip {
    /// Build a clip from per-bone key arrays
    ///
    /// Every bone must carry exactly the same number of rotation and
    /// translation keys. `error_threshold` is the maximum tolerated object
    /// space error in centimeters.
    pub fn new(
        bones: Vec<AnimatedBone>,
        sample_rate: u32,
        error_threshold: f32,
    ) -> Result<Self, CompressError> {
        if bones.is_empty() {
            return Err(CompressError::EmptyClip);
        }
        if bones.len() > u16::MAX as usize {
            return Err(CompressError::TooManyBones(bones.len()));
        }
        if sample_rate == 0 {
            return Err(CompressError::InvalidSampleRate);
        }
        if !(error_threshold > 0.0) {
            return Err(CompressError::InvalidErrorThreshold(error_threshold));
        }

        let num_samples = bones[0].rotations.len() as u32;
        if num_samples == 0 {
            return Err(CompressError::EmptySamples);
        }

        for (bone_index, bone) in bones.iter().enumerate() {
            if bone.rotations.len() as u32 != num_samples {
                return Err(CompressError::SampleCountMismatch {
                    bone: bone_index as u16,
                    expected: num_samples,
                    actual: bone.rotations.len() as u32,
                });
            }
            if bone.translations.len() as u32 != num_samples {
                return Err(CompressError::SampleCountMismatch {
                    bone: bone_index as u16,
                    expected: num_samples,
                    actual: bone.translations.len() as u32,
                });
            }
        }

        Ok(Self {
            bones,
            num_samples,
            sample_rate,
            error_threshold,
        })
    }

    pub fn num_bones(&self) -> u16 {
        self.bones.len() as u16
    }

    pub fn num_samples(&self) -> u32 {
        self.num_samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Clip duration in seconds
    pub fn duration(&self) -> f32 {
        if self.num_samples <= 1 {
            0.0
        } else {
            (self.num_samples - 1) as f32 / self.sample_rate as f32
        }
    }

    /// Maximum tolerated object space error in centimeters
    pub fn error_threshold(&self) -> f32 {
        self.error_threshold
    }

    pub fn bones(&self) -> &[AnimatedBone] {
        &self.bones
    }

    /// Sample the raw clip at `time`, writing one local transform per bone
    pub fn sample_pose(&self, time: f32, out_pose: &mut [Transform]) {
        debug_assert_eq!(out_pose.len(), self.bones.len());

        let (key0, key1, alpha) = sample_keys(self.num_samples, self.sample_rate, time);
        for (bone, out) in self.bones.iter().zip(out_pose.iter_mut()) {
            let rotation = quat_nlerp(
                bone.rotations[key0 as usize],
                bone.rotations[key1 as usize],
                alpha,
            );
            let translation = bone.translations[key0 as usize]
                .lerp(bone.translations[key1 as usize], alpha);
            *out = Transform::new(rotation, translation, Vec3::ONE);
        }
    }
}

/// Map a sample time to the two adjacent key indices and blend factor
pub(crate) fn sample_keys(num_samples: u32, sample_rate: u32, time: f32) -> (u32, u32, f32) {
    debug_assert!(num_samples > 0);
    let sample_index = time * sample_rate as f32;
    let key0 = (sample_index.floor() as u32).min(num_samples - 1);
    let key1 = (key0 + 1).min(num_samples - 1);
    let alpha = sample_index - sample_index.floor();
    (key0, key1, alpha)
}

/// Normalized linear interpolation between two rotations
///
/// Flips the target onto the same hypersphere hemisphere before blending.
pub(crate) fn quat_nlerp(start: Quat, end: Quat, alpha: f32) -> Quat {
    let end = if start.dot(end) < 0.0 { -end } else { end };
    (start + (end - start) * alpha).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn single_bone_clip(num_samples: usize) -> AnimationClip {
        AnimationClip::new(
            vec![AnimatedBone {
                rotations: vec![Quat::IDENTITY; num_samples],
                translations: vec![Vec3::ZERO; num_samples],
            }],
            30,
            0.01,
        )
        .unwrap()
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            AnimationClip::new(vec![], 30, 0.01).unwrap_err(),
            CompressError::EmptyClip
        );

        let bones = vec![AnimatedBone {
            rotations: vec![Quat::IDENTITY; 4],
            translations: vec![Vec3::ZERO; 4],
        }];
        assert_eq!(
            AnimationClip::new(bones.clone(), 0, 0.01).unwrap_err(),
            CompressError::InvalidSampleRate
        );
        assert_eq!(
            AnimationClip::new(bones.clone(), 30, 0.0).unwrap_err(),
            CompressError::InvalidErrorThreshold(0.0)
        );

        let mismatched = vec![AnimatedBone {
            rotations: vec![Quat::IDENTITY; 4],
            translations: vec![Vec3::ZERO; 3],
        }];
        assert!(matches!(
            AnimationClip::new(mismatched, 30, 0.01).unwrap_err(),
            CompressError::SampleCountMismatch { bone: 0, .. }
        ));
    }

    #[test]
    fn test_duration() {
        assert_eq!(single_bone_clip(31).duration(), 1.0);
        assert_eq!(single_bone_clip(1).duration(), 0.0);
    }

    #[test]
    fn test_sample_keys() {
        // Exact key time
        assert_eq!(sample_keys(30, 30, 0.0), (0, 1, 0.0));
        // Last key clamps
        let (key0, key1, _) = sample_keys(30, 30, 1.0);
        assert_eq!((key0, key1), (29, 29));
        // Midpoint between keys 3 and 4
        let (key0, key1, alpha) = sample_keys(30, 30, 3.5 / 30.0);
        assert_eq!((key0, key1), (3, 4));
        assert!((alpha - 0.5).abs() < 1e-5);
        // Single sample track always reads key 0
        assert_eq!(sample_keys(1, 30, 0.7), (0, 0, 0.0));
    }

    #[test]
    fn test_sample_pose_interpolates() {
        let clip = AnimationClip::new(
            vec![AnimatedBone {
                rotations: vec![Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2)],
                translations: vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)],
            }],
            2,
            0.01,
        )
        .unwrap();

        let mut pose = [Transform::IDENTITY; 1];

        clip.sample_pose(0.0, &mut pose);
        assert!((pose[0].translation - Vec3::ZERO).length() < 1e-6);

        // Halfway between the two keys
        clip.sample_pose(0.25, &mut pose);
        assert!((pose[0].translation - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
        let expected = Quat::from_rotation_z(FRAC_PI_2 * 0.5);
        assert!(
            pose[0].rotation.dot(expected).abs() > 0.999,
            "nlerp of a 90 degree arc stays within a fraction of a degree of slerp"
        );
    }

    #[test]
    fn test_nlerp_takes_shortest_path() {
        let start = Quat::from_rotation_z(0.1);
        let end = -Quat::from_rotation_z(0.3);
        let blended = quat_nlerp(start, end, 0.5);
        let expected = Quat::from_rotation_z(0.2);
        assert!(blended.dot(expected).abs() > 0.999_999);
    }
}
