use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::centerline::CurveVariant;

/// Kinematic pose of the player's car. `heading` is in radians, 0 looks down
/// -z and positive values turn towards +x.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleState {
    pub x: f32,
    pub z: f32,
    pub heading: f32,
}

impl VehicleState {
    /// Start of a round: on the centre line at `z = 0`, facing down the track.
    pub fn spawn(variant: CurveVariant) -> Self {
        Self {
            x: variant.center_x(0.0),
            z: 0.0,
            heading: 0.0,
        }
    }

    /// Unit forward vector in the `(x, z)` plane.
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.heading.sin(), -self.heading.cos())
    }

    pub fn translation(&self, y: f32) -> Vec3 {
        Vec3::new(self.x, y, self.z)
    }

    pub fn rotation(&self) -> Quat {
        heading_rotation(self.heading)
    }
}

/// Rotation taking local -Z onto the direction a `heading` points at.
pub fn heading_rotation(heading: f32) -> Quat {
    Quat::from_rotation_y(-heading)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

impl Action {
    fn slot(self) -> usize {
        match self {
            Action::Forward => 0,
            Action::Backward => 1,
            Action::TurnLeft => 2,
            Action::TurnRight => 3,
        }
    }
}

/// Which driving actions are currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputFlags {
    held: [bool; 4],
}

impl InputFlags {
    pub fn set(&mut self, action: Action, pressed: bool) {
        self.held[action.slot()] = pressed;
    }

    pub fn held(&self, action: Action) -> bool {
        self.held[action.slot()]
    }

    pub fn with(mut self, action: Action) -> Self {
        self.set(action, true);
        self
    }

    pub fn clear(&mut self) {
        self.held = [false; 4];
    }
}

/// Per-tick tuning, read from the `[simulation]` table.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DrivingParams {
    pub tick_ms: u64,
    /// Units moved per tick while forward or backward is held.
    pub speed: f32,
    /// Radians turned per tick while a turn is held.
    pub rot_speed: f32,
    pub collision_radius: f32,
}

impl Default for DrivingParams {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            speed: 0.3,
            rot_speed: 0.02,
            collision_radius: 0.5,
        }
    }
}

/// Advance the pose by one tick. Opposite inputs held together cancel out.
/// No bounds are applied here.
pub fn integrate(state: VehicleState, input: &InputFlags, params: &DrivingParams) -> VehicleState {
    let mut next = state;

    if input.held(Action::TurnLeft) {
        next.heading -= params.rot_speed;
    }
    if input.held(Action::TurnRight) {
        next.heading += params.rot_speed;
    }

    let step = next.forward() * params.speed;
    if input.held(Action::Forward) {
        next.x += step.x;
        next.z += step.y;
    }
    if input.held(Action::Backward) {
        next.x -= step.x;
        next.z -= step.y;
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_forward_tick_from_origin() {
        let input = InputFlags::default().with(Action::Forward);
        let next = integrate(VehicleState::default(), &input, &DrivingParams::default());
        assert_eq!(next.x, 0.0);
        assert!((next.z + 0.3).abs() < 1e-7);
        assert_eq!(next.heading, 0.0);
    }

    #[test]
    fn idle_input_keeps_pose() {
        let state = VehicleState {
            x: 1.5,
            z: -20.0,
            heading: 0.4,
        };
        let next = integrate(state, &InputFlags::default(), &DrivingParams::default());
        assert_eq!(next, state);
    }

    #[test]
    fn opposite_inputs_cancel() {
        let params = DrivingParams::default();
        let state = VehicleState {
            x: 2.0,
            z: -5.0,
            heading: 0.3,
        };
        let input = InputFlags::default()
            .with(Action::TurnLeft)
            .with(Action::TurnRight)
            .with(Action::Forward)
            .with(Action::Backward);
        let next = integrate(state, &input, &params);
        assert!((next.heading - state.heading).abs() < 1e-6);
        assert!((next.x - state.x).abs() < 1e-6);
        assert!((next.z - state.z).abs() < 1e-6);
    }

    #[test]
    fn turning_uses_new_heading_for_motion() {
        let params = DrivingParams::default();
        let input = InputFlags::default()
            .with(Action::TurnRight)
            .with(Action::Forward);
        let next = integrate(VehicleState::default(), &input, &params);
        assert_eq!(next.heading, params.rot_speed);
        assert!(next.x > 0.0);
        assert!(next.z < 0.0);
        let travelled = Vec2::new(next.x, next.z).length();
        assert!((travelled - params.speed).abs() < 1e-6);
    }

    #[test]
    fn backward_moves_against_heading() {
        let input = InputFlags::default().with(Action::Backward);
        let next = integrate(VehicleState::default(), &input, &DrivingParams::default());
        assert!((next.z - 0.3).abs() < 1e-7);
    }

    #[test]
    fn flags_are_independent() {
        let mut flags = InputFlags::default();
        flags.set(Action::TurnLeft, true);
        assert!(flags.held(Action::TurnLeft));
        for action in [Action::Forward, Action::Backward, Action::TurnRight] {
            assert!(!flags.held(action));
        }
        flags.set(Action::TurnLeft, false);
        assert_eq!(flags, InputFlags::default());
    }

    #[test]
    fn rotation_points_local_forward_along_heading() {
        let state = VehicleState {
            heading: 0.7,
            ..default()
        };
        let forward = state.rotation() * Vec3::NEG_Z;
        let expected = state.forward();
        assert!((forward.x - expected.x).abs() < 1e-6);
        assert!((forward.z - expected.y).abs() < 1e-6);
    }
}
