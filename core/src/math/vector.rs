use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Plain 2D vector used for positions, velocities and accelerations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Builds a vector from a magnitude and a heading in degrees (0° = +x).
    pub fn from_polar(magnitude: f64, direction_deg: f64) -> Self {
        let theta = direction_deg.to_radians();
        Self::new(magnitude * theta.cos(), magnitude * theta.sin())
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn normalize(self) -> Option<Vec2> {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Some(self * (1.0 / len))
        } else {
            None
        }
    }

    /// Heading in degrees, in `(-180, 180]`.
    pub fn direction_deg(self) -> f64 {
        self.y.atan2(self.x).to_degrees()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Vec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_zero_is_none() {
        assert!(Vec2::ZERO.normalize().is_none());
    }

    #[test]
    fn normalize_yields_unit_length() {
        let unit = Vec2::new(3.0, 4.0).normalize().unwrap();
        assert!((unit.length() - 1.0).abs() < 1e-12);
        assert!((unit.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn polar_round_trips_heading() {
        let v = Vec2::from_polar(10.0, 90.0);
        assert!(v.x.abs() < 1e-9);
        assert!((v.y - 10.0).abs() < 1e-9);
        assert!((v.direction_deg() - 90.0).abs() < 1e-9);
    }
}
