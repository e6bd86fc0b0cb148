//! Local and object space bone transforms

use glam::{Quat, Vec3};

/// A bone transform: rotation, translation and non-uniform scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: Quat,
    pub translation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (no rotation, no translation, unit scale)
    pub const IDENTITY: Self = Self {
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn new(rotation: Quat, translation: Vec3, scale: Vec3) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// Combine with a child local transform, yielding the child's transform
    /// in this transform's space
    pub fn mul(&self, child: &Transform) -> Transform {
        Transform {
            rotation: self.rotation * child.rotation,
            translation: self.transform_point(child.translation),
            scale: self.scale * child.scale,
        }
    }

    /// Transform a point from this transform's local space
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.translation
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
