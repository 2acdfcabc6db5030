use crate::round::RoundState;
use crate::track::TrackSpec;
use crate::vehicle::VehicleState;

/// Signed distance of the vehicle from the road centre, measured along x.
pub fn lateral_offset(spec: &TrackSpec, vehicle: &VehicleState) -> f32 {
    vehicle.x - spec.center_x(vehicle.z)
}

/// Largest lateral offset the vehicle centre may reach and still be on the road.
pub fn drivable_limit(spec: &TrackSpec, collision_radius: f32) -> f32 {
    spec.half_width() - collision_radius
}

/// Discrete test at the post-integration position only. Touching the limit
/// exactly still counts as on the road.
pub fn is_off_road(spec: &TrackSpec, vehicle: &VehicleState, collision_radius: f32) -> bool {
    lateral_offset(spec, vehicle).abs() > drivable_limit(spec, collision_radius)
}

/// Round state that follows a tick ending at `vehicle`.
pub fn detect(spec: &TrackSpec, vehicle: &VehicleState, collision_radius: f32) -> RoundState {
    if is_off_road(spec, vehicle, collision_radius) {
        RoundState::GameOver
    } else {
        RoundState::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::centerline::CurveVariant;

    const RADIUS: f32 = 0.5;

    fn spec(variant: CurveVariant) -> TrackSpec {
        TrackSpec {
            variant,
            road_width: 5.0,
            sidewalk_width: 1.5,
            curb_height: 0.15,
            surface_y: 0.0,
            step: 1.0,
            start_z: 10.0,
            end_z: -1000.0,
        }
    }

    #[test]
    fn boundary_predicate_on_both_sides() {
        let eps = 1e-3;
        for variant in CurveVariant::ALL {
            let spec = spec(variant);
            for z in [0.0_f32, -13.0, -47.0, -250.5] {
                let center = spec.center_x(z);
                let limit = spec.half_width() - RADIUS;
                for side in [1.0_f32, -1.0] {
                    let inside = VehicleState {
                        x: center + side * (limit - eps),
                        z,
                        heading: 0.0,
                    };
                    let outside = VehicleState {
                        x: center + side * (limit + eps),
                        z,
                        heading: 0.0,
                    };
                    assert_eq!(detect(&spec, &inside, RADIUS), RoundState::Playing);
                    assert_eq!(detect(&spec, &outside, RADIUS), RoundState::GameOver);
                }
            }
        }
    }

    #[test]
    fn centre_of_road_is_safe_everywhere() {
        let spec = spec(CurveVariant::Complex);
        for i in 0..1000 {
            let z = -(i as f32);
            let vehicle = VehicleState {
                x: spec.center_x(z),
                z,
                heading: 1.0,
            };
            assert!(!is_off_road(&spec, &vehicle, RADIUS));
        }
    }

    #[test]
    fn heading_does_not_matter() {
        let spec = spec(CurveVariant::Gentle);
        let base = VehicleState {
            x: spec.center_x(-30.0) + 1.9,
            z: -30.0,
            heading: 0.0,
        };
        let turned = VehicleState {
            heading: 2.5,
            ..base
        };
        assert_eq!(
            detect(&spec, &base, RADIUS),
            detect(&spec, &turned, RADIUS)
        );
    }

    #[test]
    fn limit_shrinks_with_radius() {
        let spec = spec(CurveVariant::Gentle);
        assert_eq!(drivable_limit(&spec, RADIUS), 2.0);
        assert_eq!(drivable_limit(&spec, 0.0), 2.5);
    }
}
