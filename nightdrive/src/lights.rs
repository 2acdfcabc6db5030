//! Streetlights: where the poles stand, and which four of them are lit.
//!
//! Only a fixed window of lights around the car is ever active, so the track
//! can be arbitrarily long while each frame still feeds exactly
//! [`WINDOW_SIZE`] point lights to the renderer.

use std::ops::RangeInclusive;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::track::TrackSpec;

pub const WINDOW_SIZE: usize = 4;

/// Streetlight layout and light model, read from the `[lights]` table.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct StreetLights {
    /// Distance between consecutive poles along z.
    pub spacing: f32,
    /// Pole base to bulb, along the arm.
    pub arm_offset: f32,
    pub bulb_height: f32,
    pub color: [f32; 3],
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Luminous power handed to the renderer, in lumens.
    pub intensity: f32,
}

impl Default for StreetLights {
    fn default() -> Self {
        Self {
            spacing: 20.0,
            arm_offset: 1.1,
            bulb_height: 2.7,
            color: [1.0, 0.9, 0.6],
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            intensity: 150_000.0,
        }
    }
}

impl StreetLights {
    pub fn attenuation(&self) -> Attenuation {
        Attenuation {
            constant: self.constant,
            linear: self.linear,
            quadratic: self.quadratic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    /// Fraction of the light left at `distance`.
    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }

    /// Distance at which [`Self::factor`] falls to `cutoff`. Infinite when the
    /// light never fades, zero when it is already dimmer than `cutoff` at its source.
    pub fn effective_range(&self, cutoff: f32) -> f32 {
        let target = 1.0 / cutoff;
        if target <= self.constant {
            return 0.0;
        }
        if self.quadratic == 0.0 {
            if self.linear == 0.0 {
                return f32::INFINITY;
            }
            return (target - self.constant) / self.linear;
        }
        let disc = self.linear * self.linear + 4.0 * self.quadratic * (target - self.constant);
        (disc.sqrt() - self.linear) / (2.0 * self.quadratic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightSample {
    /// Pole index; the pole stands at `z = -index * spacing`.
    pub index: i32,
    pub position: Vec3,
    pub color: Vec3,
    pub attenuation: Attenuation,
}

/// Pole indices lit while the car is at `vehicle_z`: one behind the nearest
/// pole and two ahead of it.
pub fn window_indices(vehicle_z: f32, spacing: f32) -> RangeInclusive<i32> {
    let center = (vehicle_z.abs() / spacing).floor() as i32;
    (center - 1)..=(center + 2)
}

/// The active point lights, in increasing pole index.
pub fn light_window(
    spec: &TrackSpec,
    lights: &StreetLights,
    vehicle_z: f32,
) -> [PointLightSample; WINDOW_SIZE] {
    let first = *window_indices(vehicle_z, lights.spacing).start();
    let color = Vec3::from_array(lights.color);
    let attenuation = lights.attenuation();

    std::array::from_fn(|slot| {
        let index = first + slot as i32;
        let z = -(index as f32) * lights.spacing;
        PointLightSample {
            index,
            position: Vec3::new(
                spec.center_x(z) - spec.half_width() + lights.arm_offset,
                lights.bulb_height,
                z,
            ),
            color,
            attenuation,
        }
    })
}

/// A streetlight prop. `heading` yaws the post the way the road runs there;
/// the arm always reaches straight across x towards the road, so the bulb
/// lands exactly on its window light even on curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreetlightPlacement {
    pub base: Vec3,
    pub heading: f32,
    /// `1.0` when the arm reaches towards +x (left-hand poles), `-1.0` otherwise.
    pub reach: f32,
    /// Left-hand poles carry the window lights; right-hand ones are props only.
    pub lit: bool,
}

impl StreetlightPlacement {
    /// World position of the bulb at the end of the arm.
    pub fn bulb(&self, lights: &StreetLights) -> Vec3 {
        Vec3::new(
            self.base.x + self.reach * lights.arm_offset,
            lights.bulb_height,
            self.base.z,
        )
    }
}

/// Poles along the whole track, one pair per `spacing`, at every
/// `z = -i * spacing` with `i >= 0` inside `[end_z, start_z]`.
pub fn streetlight_placements(spec: &TrackSpec, lights: &StreetLights) -> Vec<StreetlightPlacement> {
    let first = (-spec.start_z / lights.spacing).ceil().max(0.0) as i32;
    let last = (-spec.end_z / lights.spacing).floor() as i32;

    let mut placements = Vec::new();
    for i in first..=last {
        let z = -(i as f32) * lights.spacing;
        let center = spec.center_x(z);
        let heading = spec.variant.tangent_angle(z);
        placements.push(StreetlightPlacement {
            base: Vec3::new(center - spec.half_width(), spec.surface_y, z),
            heading,
            reach: 1.0,
            lit: true,
        });
        placements.push(StreetlightPlacement {
            base: Vec3::new(center + spec.half_width(), spec.surface_y, z),
            heading: heading + std::f32::consts::PI,
            reach: -1.0,
            lit: false,
        });
    }
    placements
}
