use glam::{Affine3A, Quat, Vec3};

/// Transform component
///
/// Holds a node's TRS together with cached local/world matrices and a shadow
/// copy of the last TRS used to build them, so unchanged transforms are not
/// recomposed every frame.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,

            last_position: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
            last_scale: Vec3::ONE,
            force_update: true,
        }
    }

    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            ..Self::new()
        }
    }

    /// Recomposes the local matrix if the TRS changed since the last call.
    ///
    /// Returns whether the matrix changed.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix = self.to_affine();

            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    /// Composes the current TRS without touching the cache.
    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Copies position, rotation and scale from another transform.
    pub fn copy_trs_from(&mut self, other: &Transform) {
        self.position = other.position;
        self.rotation = other.rotation;
        self.scale = other.scale;
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    pub fn set_world_matrix(&mut self, mat: Affine3A) {
        self.world_matrix = mat;
    }

    /// Sets the local matrix directly and decomposes it back into TRS.
    ///
    /// Shear is lost in the decomposition.
    pub fn apply_local_matrix(&mut self, mat: Affine3A) {
        self.local_matrix = mat;

        let (scale, rotation, translation) = mat.to_scale_rotation_translation();
        self.scale = scale;
        self.rotation = rotation;
        self.position = translation;

        self.last_scale = scale;
        self.last_rotation = rotation;
        self.last_position = translation;

        self.mark_dirty();
    }

    /// Forces the next [`update_local_matrix`](Self::update_local_matrix) to recompose.
    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Transform {
    /// Two transforms are equal when their TRS match; caches are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
            && self.rotation == other.rotation
            && self.scale == other.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_local_matrix_dirty_check() {
        let mut t = Transform::new();
        assert!(t.update_local_matrix(), "first update always composes");
        assert!(!t.update_local_matrix(), "unchanged TRS is skipped");

        t.position = Vec3::new(1.0, 2.0, 3.0);
        assert!(t.update_local_matrix());
        assert_eq!(Vec3::from(t.local_matrix().translation), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_apply_local_matrix_decomposes() {
        let mut t = Transform::new();
        let m = Affine3A::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::IDENTITY,
            Vec3::new(5.0, 0.0, 0.0),
        );
        t.apply_local_matrix(m);

        assert!((t.scale - Vec3::splat(2.0)).length() < 1e-5);
        assert!((t.position - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
    }
}
