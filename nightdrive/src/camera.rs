use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::vehicle::VehicleState;

/// Chase-camera placement and lens, read from the `[camera]` table.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CameraRig {
    /// How far behind the car the eye trails.
    pub distance: f32,
    pub height: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            distance: 10.0,
            height: 5.0,
            fov_degrees: 45.0,
            near: 0.1,
            far: 300.0,
        }
    }
}

impl CameraRig {
    /// Eye behind the car along its heading, looking at the car. No smoothing:
    /// the view snaps to the pose every frame.
    pub fn chase(&self, vehicle: &VehicleState) -> ChaseView {
        let (sin, cos) = vehicle.heading.sin_cos();
        ChaseView {
            eye: Vec3::new(
                vehicle.x - self.distance * sin,
                self.height,
                vehicle.z + self.distance * cos,
            ),
            target: Vec3::new(vehicle.x, 0.0, vehicle.z),
            up: Vec3::Y,
        }
    }

    pub fn perspective(&self) -> PerspectiveProjection {
        PerspectiveProjection {
            fov: self.fov_degrees.to_radians(),
            near: self.near,
            far: self.far,
            ..default()
        }
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect_ratio, self.near, self.far)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaseView {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl ChaseView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye).looking_at(self.target, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_trails_behind_unturned_car() {
        let rig = CameraRig::default();
        let vehicle = VehicleState {
            x: 3.0,
            z: -40.0,
            heading: 0.0,
        };
        let view = rig.chase(&vehicle);
        assert_eq!(view.eye, Vec3::new(3.0, 5.0, -30.0));
        assert_eq!(view.target, Vec3::new(3.0, 0.0, -40.0));
        assert_eq!(view.up, Vec3::Y);
    }

    #[test]
    fn eye_rotates_with_heading() {
        let rig = CameraRig::default();
        let vehicle = VehicleState {
            x: 0.0,
            z: 0.0,
            heading: std::f32::consts::FRAC_PI_2,
        };
        // Facing +x, so the eye sits on -x
        let view = rig.chase(&vehicle);
        assert!((view.eye.x + 10.0).abs() < 1e-5);
        assert!(view.eye.z.abs() < 1e-5);
    }

    #[test]
    fn view_matrix_looks_down_negative_z_at_target() {
        let rig = CameraRig::default();
        let vehicle = VehicleState {
            x: -2.0,
            z: -120.0,
            heading: 0.35,
        };
        let view = rig.chase(&vehicle);
        let matrix = view.view_matrix();

        let eye = matrix.transform_point3(view.eye);
        assert!(eye.length() < 1e-4);

        let target = matrix.transform_point3(view.target);
        let distance = (view.target - view.eye).length();
        assert!(target.x.abs() < 1e-4);
        assert!(target.y.abs() < 1e-4);
        assert!((target.z + distance).abs() < 1e-3);
    }

    #[test]
    fn transform_faces_target() {
        let view = CameraRig::default().chase(&VehicleState::default());
        let transform = view.transform();
        let facing = transform.forward();
        let expected = (view.target - view.eye).normalize();
        assert!(facing.dot(expected) > 0.9999);
    }

    #[test]
    fn projection_uses_configured_lens() {
        let rig = CameraRig::default();
        let perspective = rig.perspective();
        assert!((perspective.fov - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
        assert_eq!(perspective.near, 0.1);
        assert_eq!(perspective.far, 300.0);
        assert!(rig.projection_matrix(800.0 / 600.0).is_finite());
    }
}
