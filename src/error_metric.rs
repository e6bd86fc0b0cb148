//! Skeletal forward kinematic error metric
//!
//! Scores a lossy pose against a raw pose by composing local transforms into
//! object space and measuring how far the bone's shell vertices move. The
//! attribution variant decomposes a bone's error along its ancestor chain so
//! the quantizer knows which track to spend bits on.

use glam::Vec3;

use crate::skeleton::RigidSkeleton;
use crate::transform::Transform;

/// Per-track error attribution for one bone
#[derive(Debug, Clone, Copy, Default)]
pub struct BoneTrackError {
    pub rotation: f32,
    pub translation: f32,
}

fn local_to_object_space(
    skeleton: &RigidSkeleton,
    local_pose: &[Transform],
    out_object_pose: &mut [Transform],
) {
    for bone_index in 0..local_pose.len() {
        out_object_pose[bone_index] = match skeleton.bone(bone_index as u16).parent_index {
            None => local_pose[bone_index],
            Some(parent_index) => {
                out_object_pose[parent_index as usize].mul(&local_pose[bone_index])
            }
        };
    }
}

fn bone_position_error(raw: &Transform, lossy: &Transform, vertex_distance: f32) -> f32 {
    let vtx0 = Vec3::new(vertex_distance, 0.0, 0.0);
    let vtx1 = Vec3::new(0.0, vertex_distance, 0.0);
    let error0 = raw
        .transform_point(vtx0)
        .distance(lossy.transform_point(vtx0));
    let error1 = raw
        .transform_point(vtx1)
        .distance(lossy.transform_point(vtx1));
    error0.max(error1)
}

/// Maximum shell vertex position error per bone, in object space
///
/// Both poses are local space; errors accumulate down the hierarchy, so a
/// lossy root shows up in every descendant's score.
pub fn calculate_skeleton_error(
    skeleton: &RigidSkeleton,
    raw_local_pose: &[Transform],
    lossy_local_pose: &[Transform],
    out_error_per_bone: &mut [f32],
) {
    let num_bones = raw_local_pose.len();
    debug_assert_eq!(num_bones, lossy_local_pose.len());
    debug_assert_eq!(num_bones, out_error_per_bone.len());
    debug_assert_eq!(num_bones, skeleton.num_bones() as usize);

    let mut raw_object_pose = vec![Transform::IDENTITY; num_bones];
    let mut lossy_object_pose = vec![Transform::IDENTITY; num_bones];
    local_to_object_space(skeleton, raw_local_pose, &mut raw_object_pose);
    local_to_object_space(skeleton, lossy_local_pose, &mut lossy_object_pose);

    for bone_index in 0..num_bones {
        out_error_per_bone[bone_index] = bone_position_error(
            &raw_object_pose[bone_index],
            &lossy_object_pose[bone_index],
            skeleton.bone(bone_index as u16).vertex_distance,
        );
    }
}

/// Decompose the error at `target_bone_index` along its ancestor chain
///
/// For each ancestor (the target bone included), measures the error at the
/// target when only that ancestor's rotation (respectively translation) is
/// taken from the lossy pose and every other transform is raw. Entries off
/// the chain are left zeroed.
pub fn calculate_skeleton_error_contribution(
    skeleton: &RigidSkeleton,
    raw_local_pose: &[Transform],
    lossy_local_pose: &[Transform],
    target_bone_index: u16,
    out_error_per_stream: &mut [BoneTrackError],
) {
    let num_bones = raw_local_pose.len();
    debug_assert_eq!(num_bones, lossy_local_pose.len());
    debug_assert_eq!(num_bones, out_error_per_stream.len());

    for track_error in out_error_per_stream.iter_mut() {
        *track_error = BoneTrackError::default();
    }

    let vertex_distance = skeleton.bone(target_bone_index).vertex_distance;

    let mut raw_object_pose = vec![Transform::IDENTITY; num_bones];
    local_to_object_space(skeleton, raw_local_pose, &mut raw_object_pose);
    let raw_target = raw_object_pose[target_bone_index as usize];

    let mut hybrid_local_pose = raw_local_pose.to_vec();
    let mut hybrid_object_pose = vec![Transform::IDENTITY; num_bones];

    let mut current_bone_index = Some(target_bone_index);
    while let Some(bone_index) = current_bone_index {
        let bone = bone_index as usize;

        hybrid_local_pose[bone].rotation = lossy_local_pose[bone].rotation;
        local_to_object_space(skeleton, &hybrid_local_pose, &mut hybrid_object_pose);
        out_error_per_stream[bone].rotation = bone_position_error(
            &raw_target,
            &hybrid_object_pose[target_bone_index as usize],
            vertex_distance,
        );
        hybrid_local_pose[bone].rotation = raw_local_pose[bone].rotation;

        hybrid_local_pose[bone].translation = lossy_local_pose[bone].translation;
        local_to_object_space(skeleton, &hybrid_local_pose, &mut hybrid_object_pose);
        out_error_per_stream[bone].translation = bone_position_error(
            &raw_target,
            &hybrid_object_pose[target_bone_index as usize],
            vertex_distance,
        );
        hybrid_local_pose[bone].translation = raw_local_pose[bone].translation;

        current_bone_index = skeleton.bone(bone_index).parent_index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::RigidBone;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    fn chain(num_bones: u16, vertex_distance: f32) -> RigidSkeleton {
        let bones = (0..num_bones)
            .map(|i| RigidBone {
                parent_index: if i == 0 { None } else { Some(i - 1) },
                vertex_distance,
            })
            .collect();
        RigidSkeleton::new(bones).unwrap()
    }

    #[test]
    fn test_identical_poses_have_zero_error() {
        let skeleton = chain(3, 5.0);
        let pose = vec![Transform::IDENTITY; 3];
        let mut errors = vec![0.0; 3];
        calculate_skeleton_error(&skeleton, &pose, &pose, &mut errors);
        assert!(errors.iter().all(|&e| e == 0.0));
    }

    #[test]
    fn test_root_rotation_error() {
        let skeleton = chain(1, 10.0);
        let raw = vec![Transform::IDENTITY; 1];
        let lossy = vec![Transform::new(
            Quat::from_rotation_z(FRAC_PI_2),
            Vec3::ZERO,
            Vec3::ONE,
        )];

        let mut errors = vec![0.0; 1];
        calculate_skeleton_error(&skeleton, &raw, &lossy, &mut errors);

        // A 90 degree rotation moves the shell vertex at distance 10 by 10*sqrt(2)
        let expected = 10.0 * std::f32::consts::SQRT_2;
        assert!((errors[0] - expected).abs() < 1e-4, "got {}", errors[0]);
    }

    #[test]
    fn test_error_propagates_to_children() {
        let skeleton = chain(2, 3.0);
        let raw = vec![
            Transform::IDENTITY,
            Transform::new(Quat::IDENTITY, Vec3::new(4.0, 0.0, 0.0), Vec3::ONE),
        ];
        // Lossy root translation shifts the whole chain
        let lossy = vec![
            Transform::new(Quat::IDENTITY, Vec3::new(0.5, 0.0, 0.0), Vec3::ONE),
            raw[1],
        ];

        let mut errors = vec![0.0; 2];
        calculate_skeleton_error(&skeleton, &raw, &lossy, &mut errors);
        assert!((errors[0] - 0.5).abs() < 1e-5);
        assert!((errors[1] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_contribution_pinpoints_lossy_track() {
        let skeleton = chain(2, 3.0);
        let raw = vec![
            Transform::IDENTITY,
            Transform::new(Quat::IDENTITY, Vec3::new(4.0, 0.0, 0.0), Vec3::ONE),
        ];
        // Only the root rotation is lossy
        let lossy = vec![
            Transform::new(Quat::from_rotation_z(0.1), Vec3::ZERO, Vec3::ONE),
            raw[1],
        ];

        let mut contributions = vec![BoneTrackError::default(); 2];
        calculate_skeleton_error_contribution(&skeleton, &raw, &lossy, 1, &mut contributions);

        assert!(contributions[0].rotation > 0.0);
        assert_eq!(contributions[0].translation, 0.0);
        assert_eq!(contributions[1].rotation, 0.0);
        assert_eq!(contributions[1].translation, 0.0);
    }

    #[test]
    fn test_contribution_separates_tracks() {
        let skeleton = chain(2, 3.0);
        let raw = vec![
            Transform::IDENTITY,
            Transform::new(Quat::IDENTITY, Vec3::new(4.0, 0.0, 0.0), Vec3::ONE),
        ];
        let lossy = vec![
            Transform::new(Quat::IDENTITY, Vec3::new(0.25, 0.0, 0.0), Vec3::ONE),
            Transform::new(
                Quat::from_rotation_z(0.2),
                Vec3::new(4.0, 0.0, 0.0),
                Vec3::ONE,
            ),
        ];

        let mut contributions = vec![BoneTrackError::default(); 2];
        calculate_skeleton_error_contribution(&skeleton, &raw, &lossy, 1, &mut contributions);

        // Root contributes only translation error, leaf only rotation error
        assert_eq!(contributions[0].rotation, 0.0);
        assert!((contributions[0].translation - 0.25).abs() < 1e-5);
        assert!(contributions[1].rotation > 0.0);
        assert_eq!(contributions[1].translation, 0.0);
    }
}
