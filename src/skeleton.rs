//! Rigid skeleton hierarchy
//!
//! Bones are stored topologically sorted, roots first, and refer to their
//! parent by index. The compressor only ever walks the hierarchy upward
//! through these back references.

use crate::error::CompressError;

/// A single rigid bone
#[derive(Debug, Clone)]
pub struct RigidBone {
    /// Parent bone index; `None` for roots
    pub parent_index: Option<u16>,
    /// Distance from the bone to the shell vertices used by the error metric
    pub vertex_distance: f32,
}

/// An ordered, topologically sorted array of rigid bones
#[derive(Debug, Clone)]
pub struct RigidSkeleton {
    bones: Vec<RigidBone>,
}

impl RigidSkeleton {
    /// Build a skeleton, validating that every parent precedes its children
    pub fn new(bones: Vec<RigidBone>) -> Result<Self, CompressError> {
        if bones.len() > u16::MAX as usize {
            return Err(CompressError::TooManyBones(bones.len()));
        }

        for (bone_index, bone) in bones.iter().enumerate() {
            if let Some(parent_index) = bone.parent_index {
                if parent_index as usize >= bone_index {
                    return Err(CompressError::UnsortedHierarchy {
                        bone: bone_index as u16,
                        parent: parent_index,
                    });
                }
            }
        }

        Ok(Self { bones })
    }

    pub fn num_bones(&self) -> u16 {
        self.bones.len() as u16
    }

    pub fn bone(&self, bone_index: u16) -> &RigidBone {
        &self.bones[bone_index as usize]
    }

    pub fn bones(&self) -> &[RigidBone] {
        &self.bones
    }
}
