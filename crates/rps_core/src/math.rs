//! 2D vector math for agent motion.
//!
//! All simulation math is single-precision and performed in a fixed
//! order, so identical inputs on the same build produce bit-identical
//! positions. Hashing uses the raw bit patterns (see [`Vec2::to_bits`]).

use serde::{Deserialize, Serialize};

/// Floating-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians).
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Squared length (avoids sqrt for comparisons).
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Same direction, rescaled to `length`. The zero vector stays zero.
    #[must_use]
    pub fn scale_to_length(self, length: f32) -> Self {
        self.normalize() * length
    }

    /// Rescale down to `max` if longer than `max`.
    #[must_use]
    pub fn clamp_length(self, max: f32) -> Self {
        if self.length_squared() > max * max {
            self.scale_to_length(max)
        } else {
            self
        }
    }

    /// Raw bit patterns of both components, for hashing.
    #[must_use]
    pub fn to_bits(self) -> (u32, u32) {
        (self.x.to_bits(), self.y.to_bits())
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl std::ops::MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl From<(f32, f32)> for Vec2 {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2::new(3.0, 0.0);
        let b = Vec2::new(0.0, 4.0);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), 25.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn test_vec2_dot() {
        let a = Vec2::new(2.0, 3.0);
        let b = Vec2::new(4.0, -1.0);
        assert_eq!(a.dot(b), 5.0);
    }

    #[test]
    fn test_vec2_normalize() {
        let norm = Vec2::new(3.0, 4.0).normalize();
        assert!((norm.length() - 1.0).abs() < 1e-6);
        assert!((norm.x - 0.6).abs() < 1e-6);
        assert!((norm.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        assert_eq!(Vec2::ZERO.scale_to_length(10.0), Vec2::ZERO);
    }

    #[test]
    fn test_clamp_length() {
        let v = Vec2::new(30.0, 40.0).clamp_length(5.0);
        assert!((v.length() - 5.0).abs() < 1e-5);

        // Shorter vectors are untouched, bit for bit
        let short = Vec2::new(1.0, 1.0);
        assert_eq!(short.clamp_length(5.0), short);
    }
}
