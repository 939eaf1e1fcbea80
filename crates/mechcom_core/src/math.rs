//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation state uses fixed-point arithmetic so the same inputs
//! produce bit-identical results on every platform. Floating point only
//! appears at the configuration boundary, where decimal values are
//! converted once with [`decimal_serde`].

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Human-readable serde for fixed-point numbers.
///
/// Config and catalog files carry values like `1.5`; they are read as
/// decimals and converted to [`Fixed`] exactly once at load time.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a decimal into a fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

/// Decimal serde for [`Vec2Fixed`], written as `(x, y)`.
pub mod decimal_vec_serde {
    use super::{Fixed, Vec2Fixed};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a vector as a decimal pair.
    pub fn serialize<S>(value: &Vec2Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (value.x.to_num::<f64>(), value.y.to_num::<f64>()).serialize(serializer)
    }

    /// Deserialize a vector from a decimal pair.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec2Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (x, y) = <(f64, f64)>::deserialize(deserializer)?;
        match (Fixed::checked_from_num(x), Fixed::checked_from_num(y)) {
            (Some(x), Some(y)) => Ok(Vec2Fixed::new(x, y)),
            _ => Err(serde::de::Error::custom(format!(
                "({x}, {y}) is out of fixed-point range"
            ))),
        }
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates instead of overflowing for points far outside the map.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        (other - self).length()
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Length of the vector.
    ///
    /// The squared length is accumulated in 128 bits, so vectors longer
    /// than `sqrt(Fixed::MAX)` still get their true length.
    #[must_use]
    pub fn length(self) -> Fixed {
        let x = u128::from(self.x.to_bits().unsigned_abs());
        let y = u128::from(self.y.to_bits().unsigned_abs());
        let root = isqrt_u128(x * x + y * y);
        i64::try_from(root).map_or(Fixed::MAX, Fixed::from_bits)
    }

    /// Scale both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(
            self.x.saturating_mul(factor),
            self.y.saturating_mul(factor),
        )
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Step from `self` towards `target` by at most `step` world units.
    #[must_use]
    pub fn step_towards(self, target: Self, step: Fixed) -> Self {
        self + (target - self).normalize().scale(step)
    }

    /// Whether this point lies inside (or on) a circle.
    #[must_use]
    pub fn in_circle(self, center: Self, radius: Fixed) -> bool {
        point_in_circle(self, center, radius)
    }
}

/// Point-in-circle containment, boundary inclusive.
#[must_use]
pub fn point_in_circle(point: Vec2Fixed, center: Vec2Fixed, radius: Fixed) -> bool {
    point.distance_squared(center) <= radius.saturating_mul(radius)
}

/// Integer square root, rounded down.
fn isqrt_u128(value: u128) -> u128 {
    if value < 2 {
        return value;
    }
    let mut root = 1u128 << (128 - value.leading_zeros()).div_ceil(2);
    loop {
        let next = (root + value / root) / 2;
        if next >= root {
            return root;
        }
        root = next;
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_distance_is_exact_for_perfect_squares() {
        let a = Vec2Fixed::from_ints(0, 0);
        let b = Vec2Fixed::from_ints(30, 40);
        assert_eq!(a.distance(b), Fixed::from_num(50));
    }

    #[test]
    fn test_length_of_small_vectors() {
        let half = Vec2Fixed::new(Fixed::from_num(0.3), Fixed::from_num(0.4));
        let epsilon = Fixed::ONE / Fixed::from_num(100_000);
        assert!((half.length() - Fixed::from_num(0.5)).abs() < epsilon);
        assert_eq!(Vec2Fixed::ZERO.length(), Fixed::ZERO);
        assert_eq!(Vec2Fixed::from_ints(-4, 0).length(), Fixed::from_num(4));
    }

    #[test]
    fn test_vec2_normalize() {
        let v = Vec2Fixed::from_ints(3, 4);
        let norm = v.normalize();

        let len_sq = norm.dot(norm);
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!(
            (len_sq - Fixed::ONE).abs() < epsilon,
            "normalized vector length² should be ~1, got {:?}",
            len_sq
        );

        // Direction preserved: norm.x * 4 == norm.y * 3
        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.y * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_step_towards_moves_by_step() {
        let start = Vec2Fixed::ZERO;
        let target = Vec2Fixed::from_ints(100, 0);
        let next = start.step_towards(target, Fixed::from_num(2));
        assert_eq!(next, Vec2Fixed::from_ints(2, 0));
    }

    #[test]
    fn test_point_in_circle_boundary_inclusive() {
        let center = Vec2Fixed::from_ints(10, 10);
        let radius = Fixed::from_num(5);
        assert!(point_in_circle(Vec2Fixed::from_ints(15, 10), center, radius));
        assert!(point_in_circle(Vec2Fixed::from_ints(12, 12), center, radius));
        assert!(!point_in_circle(Vec2Fixed::from_ints(16, 10), center, radius));
    }

    #[test]
    fn test_length_beyond_squared_range() {
        let v = Vec2Fixed::from_ints(1_000_000, 0);
        assert_eq!(v.length(), Fixed::from_num(1_000_000));
        assert_eq!(v.normalize(), Vec2Fixed::from_ints(1, 0));

        let diagonal = Vec2Fixed::from_ints(300_000, 400_000);
        assert_eq!(diagonal.length(), Fixed::from_num(500_000));
    }

    #[test]
    fn test_step_towards_distant_target_keeps_full_step() {
        let step = Fixed::from_num(2);
        let next = Vec2Fixed::ZERO.step_towards(Vec2Fixed::from_ints(1_000_000, 0), step);
        assert_eq!(next, Vec2Fixed::from_ints(2, 0));

        let corner = Vec2Fixed::from_ints(1_000_000_000, 1_000_000_000);
        let next = Vec2Fixed::ZERO.step_towards(corner, step);
        assert!(next.x > Fixed::from_num(1.4) && next.x < Fixed::from_num(1.5));
        assert_eq!(next.x, next.y);
    }

    #[test]
    fn test_far_points_saturate() {
        let a = Vec2Fixed::from_ints(-2_000_000_000, 0);
        let b = Vec2Fixed::from_ints(2_000_000_000, 0);
        assert_eq!(a.distance_squared(b), Fixed::MAX);
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }
}
