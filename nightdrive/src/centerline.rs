use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Which centre-line formula a round is driven on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CurveVariant {
    Gentle,
    Complex,
}

impl CurveVariant {
    pub const ALL: [CurveVariant; 2] = [CurveVariant::Gentle, CurveVariant::Complex];

    /// Lateral position of the road centre at longitudinal position `z`.
    pub fn center_x(self, z: f32) -> f32 {
        match self {
            CurveVariant::Gentle => 10.0 * (0.05 * z).sin(),
            CurveVariant::Complex => 10.0 * (0.1 * z).sin() + 5.0 * (0.05 * z).cos(),
        }
    }

    /// Closed-form `d(center_x)/dz`.
    pub fn slope(self, z: f32) -> f32 {
        match self {
            CurveVariant::Gentle => 0.5 * (0.05 * z).cos(),
            CurveVariant::Complex => (0.1 * z).cos() - 0.25 * (0.05 * z).sin(),
        }
    }

    /// Sum of the formula's amplitude terms; `|center_x|` never exceeds it.
    pub fn amplitude(self) -> f32 {
        match self {
            CurveVariant::Gentle => 10.0,
            CurveVariant::Complex => 15.0,
        }
    }

    /// Direction of travel along the centre line towards decreasing `z`, as a
    /// heading in the vehicle convention (0 points down -z, positive turns
    /// towards +x). Always within (-PI/2, PI/2), so it never wraps.
    pub fn tangent_angle(self, z: f32) -> f32 {
        (-self.slope(z)).atan2(1.0)
    }

    /// Unit `(x, z)` vector matching [`Self::tangent_angle`].
    pub fn direction(self, z: f32) -> Vec2 {
        Vec2::new(-self.slope(z), -1.0).normalize()
    }

    pub fn label(self) -> &'static str {
        match self {
            CurveVariant::Gentle => "gentle",
            CurveVariant::Complex => "complex",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CurveVariant;

    fn sweep() -> impl Iterator<Item = f32> {
        (-20_000..=20_000).map(|i| i as f32 * 0.25)
    }

    #[test]
    fn center_is_finite_and_bounded() {
        for variant in CurveVariant::ALL {
            for z in sweep() {
                let x = variant.center_x(z);
                assert!(x.is_finite());
                assert!(x.abs() <= variant.amplitude() + 1e-4, "{variant:?} z={z} x={x}");
            }
        }
    }

    #[test]
    fn center_matches_formulas_at_known_points() {
        assert_eq!(CurveVariant::Gentle.center_x(0.0), 0.0);
        assert!((CurveVariant::Complex.center_x(0.0) - 5.0).abs() < 1e-6);

        let z: f32 = -31.4159;
        let expected = 10.0 * (0.05 * z).sin();
        assert!((CurveVariant::Gentle.center_x(z) - expected).abs() < 1e-6);
    }

    #[test]
    fn tangent_is_finite_and_continuous() {
        for variant in CurveVariant::ALL {
            let mut prev = variant.tangent_angle(-5_000.0);
            for z in sweep() {
                let angle = variant.tangent_angle(z);
                assert!(angle.is_finite());
                assert!((angle - prev).abs() < 0.05, "{variant:?} jump at z={z}");
                prev = angle;
            }
        }
    }

    #[test]
    fn tangent_agrees_with_backward_difference() {
        let delta = 0.01;
        for variant in CurveVariant::ALL {
            for z in [-300.0_f32, -47.0, -5.0, 0.0, 12.5] {
                let dx = variant.center_x(z - delta) - variant.center_x(z);
                let approx = dx.atan2(delta);
                assert!((approx - variant.tangent_angle(z)).abs() < 1e-2, "{variant:?} z={z}");

                let dir = variant.direction(z);
                let angle = variant.tangent_angle(z);
                assert!((dir.x - angle.sin()).abs() < 1e-5);
                assert!((dir.y + angle.cos()).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn straight_at_gentle_extremes() {
        // sin(0.05 z) peaks at z = -10 PI, where the curve runs parallel to z
        let z = -10.0 * std::f32::consts::PI;
        assert!(CurveVariant::Gentle.tangent_angle(z).abs() < 1e-5);
    }
}
