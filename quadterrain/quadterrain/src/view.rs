//! Camera description used for culling and screen-space error.

use glam::{DMat4, DVec3};

use crate::volume::Aabb;

/// How the camera projects the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// A perspective camera.
    Perspective {
        /// Vertical field of view, in radians.
        fov_y: f64,
        /// Width over height.
        aspect: f64,
        /// Near clip distance.
        near: f64,
        /// Far clip distance.
        far: f64,
    },
    /// An orthographic camera.
    Orthographic {
        /// Left edge of the view volume.
        left: f64,
        /// Right edge of the view volume.
        right: f64,
        /// Bottom edge of the view volume.
        bottom: f64,
        /// Top edge of the view volume.
        top: f64,
        /// Near clip distance.
        near: f64,
        /// Far clip distance.
        far: f64,
    },
}

impl Projection {
    fn matrix(self) -> DMat4 {
        match self {
            Self::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => DMat4::perspective_rh_gl(fov_y, aspect, near, far),
            Self::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => DMat4::orthographic_rh_gl(left, right, bottom, top, near, far),
        }
    }
}

/// A camera for one frame.
#[derive(Debug, Clone, Copy)]
pub struct View {
    /// Camera position in world space.
    pub position: DVec3,
    /// World-to-view transform.
    pub view_matrix: DMat4,
    /// Projection parameters.
    pub projection: Projection,
    /// Height of the viewport, in pixels.
    pub viewport_height: f64,
    /// Whether tiles outside the frustum are culled.
    pub culling: bool,
}

impl View {
    /// A camera at `position` looking at `target`.
    #[must_use]
    pub fn look_at(
        position: DVec3,
        target: DVec3,
        up: DVec3,
        projection: Projection,
        viewport_height: f64,
    ) -> Self {
        Self {
            position,
            view_matrix: DMat4::look_at_rh(position, target, up),
            projection,
            viewport_height,
            culling: true,
        }
    }

    /// The same camera with frustum culling turned off.
    #[must_use]
    pub fn without_culling(self) -> Self {
        Self {
            culling: false,
            ..self
        }
    }

    /// Combined view-projection matrix.
    #[must_use]
    pub fn view_projection(&self) -> DMat4 {
        self.projection.matrix() * self.view_matrix
    }

    /// The culling frustum, or `None` when culling is off.
    #[must_use]
    pub fn frustum(&self) -> Option<Frustum> {
        self.culling
            .then(|| Frustum::from_matrix(self.view_projection()))
    }

    /// Pixels spanned by one world unit at distance 1, for perspective
    /// cameras.
    ///
    /// For orthographic cameras the factor is scaled by the near distance so
    /// that the same `pre_sse * error / distance` formula applies.
    #[must_use]
    pub fn pre_sse(&self) -> f64 {
        match self.projection {
            Projection::Perspective { fov_y, .. } => {
                self.viewport_height / (2.0 * (fov_y / 2.0).tan())
            }
            Projection::Orthographic {
                bottom, top, near, ..
            } => self.viewport_height * near / (top - bottom),
        }
    }
}

/// A frustum for culling tiles based on their bounding boxes.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Left, right, bottom, top, near and far planes as (normal, distance).
    planes: [(DVec3, f64); 6],
}

impl Frustum {
    /// Extract the frustum planes from a view-projection matrix with a
    /// `[-1, 1]` depth range.
    #[must_use]
    pub fn from_matrix(vp: DMat4) -> Self {
        let m = vp.to_cols_array_2d();
        let row = |i: usize| [m[0][i], m[1][i], m[2][i], m[3][i]];
        let w = row(3);

        let mut planes = [(DVec3::ZERO, 0.0); 6];
        for (axis, pair) in planes.chunks_exact_mut(2).enumerate() {
            let r = row(axis);
            pair[0] = Self::normalize_plane(
                w[0] + r[0],
                w[1] + r[1],
                w[2] + r[2],
                w[3] + r[3],
            );
            pair[1] = Self::normalize_plane(
                w[0] - r[0],
                w[1] - r[1],
                w[2] - r[2],
                w[3] - r[3],
            );
        }

        Self { planes }
    }

    fn normalize_plane(a: f64, b: f64, c: f64, d: f64) -> (DVec3, f64) {
        let normal = DVec3::new(a, b, c);
        let length = normal.length();
        if length > 0.0 {
            (normal / length, d / length)
        } else {
            (DVec3::ZERO, 0.0)
        }
    }

    /// Test if a bounding box intersects the frustum.
    #[must_use]
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let center = aabb.center();
        let half = aabb.half_extents();
        self.planes.iter().all(|&(normal, distance)| {
            // Projected radius of the box onto the plane normal.
            let r = half.dot(normal.abs());
            normal.dot(center) + distance >= -r
        })
    }
}
