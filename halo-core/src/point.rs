use glam::DVec3;

/// A generated 3D point together with the integer seed that identifies it.
///
/// The seed is assigned once, when the base cloud is built, and is used for
/// every reproducible pseudo-random decision made about the point afterwards
/// (mask draws, random phase offsets). Points are copied as they flow through
/// the frame pipeline; they are never mutated in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub seed: i64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, seed: 0 }
    }

    pub fn with_seed(x: f64, y: f64, z: f64, seed: i64) -> Self {
        Self { x, y, z, seed }
    }

    /// Squared distance to the origin.
    #[inline]
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// `true` when all three coordinates are finite numbers.
    ///
    /// Generators drop any point failing this check instead of letting a
    /// NaN/Inf propagate into the frame pipeline.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[inline]
    pub fn to_dvec3(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    pub fn from_dvec3(v: DVec3, seed: i64) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
            seed,
        }
    }
}

/// One projected point, ready to be painted by the host surface.
///
/// Items are produced fresh on every [`crate::engine::Engine::step`] call and
/// never retained across frames. The emitted list may be reordered by depth
/// before it is returned.
#[derive(Clone, Debug)]
pub struct RenderItem {
    /// Screen-space x in pixels.
    pub sx: f64,
    /// Screen-space y in pixels.
    pub sy: f64,
    /// Point radius in pixels.
    pub radius: f64,
    /// Final color, resolved by the palette engine.
    pub color: crate::palette::Rgb,
    /// Final opacity in `[0, 1]`.
    pub alpha: f64,
    /// Camera-space depth, used for sorting and alpha fade.
    pub depth: f64,
    /// Animated world-space position the item was projected from.
    pub world: Point3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_check_rejects_nan_and_inf() {
        assert!(Point3::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Point3::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Point3::new(0.0, f64::INFINITY, 0.0).is_finite());
        assert!(!Point3::new(0.0, 0.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn dvec3_round_trip_keeps_coordinates_and_seed() {
        let p = Point3::with_seed(0.5, -1.5, 2.0, 42);
        let back = Point3::from_dvec3(p.to_dvec3(), p.seed);
        assert_eq!(p, back);
    }
}
