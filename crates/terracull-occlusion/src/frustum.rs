//! Camera frustum snapshots handed from the main thread to the occluder.

use std::sync::Arc;

use glam::{DVec3, Mat4, Vec3};
use parking_lot::Mutex;
use terracull_core::constants::REGION_SIZE;
use terracull_core::math::{Aabb, Frustum};
use terracull_core::RegionOrigin;

use crate::constants::{PIXEL_HEIGHT, PIXEL_WIDTH};

/// Anything that can describe the current camera view.
///
/// `view_version` must change whenever any of the matrices or the camera
/// position change.
pub trait FrustumSource {
    fn projection_matrix(&self) -> Mat4;
    /// Camera-relative model-view matrix: rotation only, camera at the origin.
    fn model_matrix(&self) -> Mat4;
    fn camera_pos(&self) -> DVec3;
    fn view_version(&self) -> u64;

    /// Changes when the camera position changes. Defaults to the view version.
    fn position_version(&self) -> u64 {
        self.view_version()
    }
}

/// Immutable copy of a camera frustum, taken when the source is known consistent.
#[derive(Clone, Debug, PartialEq)]
pub struct FrustumSnapshot {
    projection: Mat4,
    model: Mat4,
    camera_pos: DVec3,
    view_version: u64,
    position_version: u64,
    planes: Frustum,
}

impl Default for FrustumSnapshot {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            camera_pos: DVec3::ZERO,
            view_version: 0,
            position_version: 0,
            planes: Frustum::default(),
        }
    }
}

impl FrustumSnapshot {
    /// Capture the current state of a source.
    pub fn capture(source: &impl FrustumSource) -> Self {
        let projection = source.projection_matrix();
        let model = source.model_matrix();
        Self {
            projection,
            model,
            camera_pos: source.camera_pos(),
            view_version: source.view_version(),
            position_version: source.position_version(),
            planes: Frustum::from_view_projection(projection * model),
        }
    }

    pub fn copy_from(&mut self, other: &Self) {
        self.clone_from(other);
    }

    /// Camera-relative bounds test of a whole region against the view frustum.
    #[must_use]
    pub fn is_region_visible(&self, origin: RegionOrigin) -> bool {
        let min = DVec3::new(
            f64::from(origin.x),
            f64::from(origin.y),
            f64::from(origin.z),
        ) - self.camera_pos;
        let min = min.as_vec3();
        let aabb = Aabb::new(min, min + Vec3::splat(REGION_SIZE as f32));
        self.planes.test_aabb(&aabb)
    }
}

impl FrustumSource for FrustumSnapshot {
    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    fn model_matrix(&self) -> Mat4 {
        self.model
    }

    fn camera_pos(&self) -> DVec3 {
        self.camera_pos
    }

    fn view_version(&self) -> u64 {
        self.view_version
    }

    fn position_version(&self) -> u64 {
        self.position_version
    }
}

/// Camera with version counters, usable as a [`FrustumSource`].
#[derive(Debug, Clone)]
pub struct TerrainCamera {
    position: DVec3,
    direction: Vec3,
    up: Vec3,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    view_version: u64,
    position_version: u64,
}

impl Default for TerrainCamera {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            direction: Vec3::X,
            up: Vec3::Y,
            fov: std::f32::consts::FRAC_PI_2,
            aspect: PIXEL_WIDTH as f32 / PIXEL_HEIGHT as f32,
            near: 0.05,
            far: 1024.0,
            view_version: 1,
            position_version: 1,
        }
    }
}

impl TerrainCamera {
    /// Create a camera at `position` looking along `direction`.
    pub fn new(position: DVec3, direction: Vec3) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            ..Self::default()
        }
    }

    /// Set the vertical field of view in radians.
    #[must_use]
    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self
    }

    /// Set the far clip distance in blocks.
    #[must_use]
    pub fn with_far(mut self, far: f32) -> Self {
        self.far = far;
        self
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Set the camera position. No-op if unchanged.
    pub fn set_position(&mut self, position: DVec3) {
        if position != self.position {
            self.position = position;
            self.position_version += 1;
            self.view_version += 1;
        }
    }

    /// Set the look direction. No-op if unchanged.
    pub fn set_direction(&mut self, direction: Vec3) {
        let direction = direction.normalize();
        if direction != self.direction {
            self.direction = direction;
            self.view_version += 1;
        }
    }

    /// Look at a world-space target.
    pub fn look_at(&mut self, target: DVec3) {
        self.set_direction((target - self.position).as_vec3());
    }

    /// Set the aspect ratio.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect != self.aspect {
            self.aspect = aspect;
            self.view_version += 1;
        }
    }
}

impl FrustumSource for TerrainCamera {
    fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    fn model_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(Vec3::ZERO, self.direction, self.up)
    }

    fn camera_pos(&self) -> DVec3 {
        self.position
    }

    fn view_version(&self) -> u64 {
        self.view_version
    }

    fn position_version(&self) -> u64 {
        self.position_version
    }
}

/// Single-slot mailbox for publishing snapshots across threads.
///
/// The main thread publishes whenever the camera is in a consistent state;
/// the occlusion thread takes the latest one before preparing a scene.
#[derive(Debug, Default, Clone)]
pub struct FrustumExchange {
    latest: Arc<Mutex<Option<FrustumSnapshot>>>,
}

impl FrustumExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any unconsumed snapshot.
    pub fn publish(&self, snapshot: FrustumSnapshot) {
        *self.latest.lock() = Some(snapshot);
    }

    /// Take the newest snapshot, if one was published since the last take.
    pub fn take(&self) -> Option<FrustumSnapshot> {
        self.latest.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_versions_track_changes() {
        let mut camera = TerrainCamera::default();
        let v0 = camera.view_version();
        let p0 = camera.position_version();

        camera.set_direction(Vec3::Z);
        assert_eq!(camera.view_version(), v0 + 1);
        assert_eq!(camera.position_version(), p0);

        camera.set_position(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.view_version(), v0 + 2);
        assert_eq!(camera.position_version(), p0 + 1);

        camera.set_position(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.view_version(), v0 + 2);
    }

    #[test]
    fn snapshot_is_detached_from_source() {
        let mut camera = TerrainCamera::default();
        let snapshot = FrustumSnapshot::capture(&camera);
        camera.set_position(DVec3::splat(50.0));

        assert_eq!(snapshot.camera_pos(), DVec3::ZERO);
        assert_ne!(snapshot.view_version(), camera.view_version());
    }

    #[test]
    fn region_frustum_test_uses_camera_position() {
        let camera = TerrainCamera::new(DVec3::new(1000.0, 64.0, 1000.0), Vec3::X);
        let snapshot = FrustumSnapshot::capture(&camera);

        assert!(snapshot.is_region_visible(RegionOrigin::containing(1100, 60, 995)));
        assert!(!snapshot.is_region_visible(RegionOrigin::containing(900, 60, 995)));
    }

    #[test]
    fn exchange_hands_over_latest() {
        let exchange = FrustumExchange::new();
        assert!(exchange.take().is_none());

        let mut camera = TerrainCamera::default();
        exchange.publish(FrustumSnapshot::capture(&camera));
        camera.set_direction(Vec3::Z);
        exchange.publish(FrustumSnapshot::capture(&camera));

        let taken = exchange.take().map(|s| s.view_version());
        assert_eq!(taken, Some(camera.view_version()));
        assert!(exchange.take().is_none());
    }
}
