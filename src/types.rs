//! Common types and traits for integer 3D geometry.
//!
//! The cargo space is a lattice of unit cells, so every extent and position in
//! this crate is integral. Axes follow the truck: `x` is width, `y` is height,
//! `z` is length (front to back).

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Extent of a box along the three truck axes.
///
/// # Examples
/// ```
/// use truck_loader::types::Dims3;
///
/// let dims = Dims3::new(2, 3, 4);
/// assert_eq!(dims.volume(), 24);
/// assert_eq!(dims.swap_width_length(), Dims3::new(4, 3, 2));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dims3 {
    pub width: i64,
    pub height: i64,
    pub length: i64,
}

impl Dims3 {
    #[inline]
    pub const fn new(width: i64, height: i64, length: i64) -> Self {
        Self {
            width,
            height,
            length,
        }
    }

    #[inline]
    pub const fn as_tuple(&self) -> (i64, i64, i64) {
        (self.width, self.height, self.length)
    }

    /// Number of unit cells covered by the extent.
    #[inline]
    pub fn volume(&self) -> i64 {
        self.width * self.height * self.length
    }

    /// Exchanges width and length (a horizontal turn).
    #[inline]
    pub const fn swap_width_length(self) -> Self {
        Self::new(self.length, self.height, self.width)
    }

    /// Exchanges width and height (a vertical turn).
    #[inline]
    pub const fn swap_width_height(self) -> Self {
        Self::new(self.height, self.width, self.length)
    }

    /// Checks if the extent fits within another extent (component-wise <=).
    #[inline]
    pub fn fits_within(&self, container: &Self) -> bool {
        self.width <= container.width
            && self.height <= container.height
            && self.length <= container.length
    }
}

/// A lattice point inside the cargo space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point3 {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Point3 {
    #[inline]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// The origin corner of the cargo space.
    #[inline]
    pub const fn origin() -> Self {
        Self::new(0, 0, 0)
    }
}

impl Add<Dims3> for Point3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Dims3) -> Self::Output {
        Self::new(self.x + rhs.width, self.y + rhs.height, self.z + rhs.length)
    }
}

impl Sub for Point3 {
    type Output = Dims3;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Dims3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Trait for objects with a 3D extent.
pub trait Dimensional {
    /// Returns the extent of the object.
    fn dimensions(&self) -> Dims3;

    /// Calculates the volume in unit cells.
    fn volume(&self) -> i64 {
        self.dimensions().volume()
    }
}

/// Half-open axis-aligned box `[min, max)` over lattice coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    /// Minimum corner (inclusive)
    pub min: Point3,
    /// Maximum corner (exclusive)
    pub max: Point3,
}

impl BoundingBox {
    #[inline]
    pub fn from_position_and_dims(position: Point3, dims: Dims3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Checks if two boxes share at least one cell.
    ///
    /// Boxes that merely touch along a face are disjoint.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y
            || self.max.z <= other.min.z
            || other.max.z <= self.min.z)
    }

    /// Checks if `other` lies completely inside this box.
    #[inline]
    pub fn contains_box(&self, other: &Self) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.min.z >= self.min.z
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
            && other.max.z <= self.max.z
    }

    #[inline]
    pub fn dimensions(&self) -> Dims3 {
        self.max - self.min
    }
}

/// Input validation helpers.
pub mod validation {
    /// Validates a single dimension.
    ///
    /// # Returns
    /// `Ok(())` for strictly positive values, otherwise error text
    pub fn validate_dimension(value: i64, name: &str) -> Result<(), String> {
        if value <= 0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates all three dimensions of a box, named by its owner.
    pub fn validate_dimensions_3d(dims: (i64, i64, i64), owner: &str) -> Result<(), String> {
        validate_dimension(dims.0, &format!("{} width", owner))?;
        validate_dimension(dims.1, &format!("{} height", owner))?;
        validate_dimension(dims.2, &format!("{} length", owner))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dims_turns() {
        let dims = Dims3::new(1, 2, 3);
        assert_eq!(dims.swap_width_length(), Dims3::new(3, 2, 1));
        assert_eq!(dims.swap_width_height(), Dims3::new(2, 1, 3));
        assert_eq!(
            dims.swap_width_length().swap_width_height(),
            Dims3::new(2, 3, 1)
        );
    }

    #[test]
    fn test_dims_fits_within() {
        let small = Dims3::new(1, 1, 2);
        let truck = Dims3::new(2, 1, 1);

        assert!(!small.fits_within(&truck));
        assert!(small.swap_width_length().fits_within(&truck));
    }

    #[test]
    fn test_point_arithmetic() {
        let p = Point3::new(1, 2, 3);
        assert_eq!(p + Dims3::new(1, 1, 1), Point3::new(2, 3, 4));
        assert_eq!(Point3::new(4, 4, 4) - p, Dims3::new(3, 2, 1));
    }

    #[test]
    fn test_bounding_box_intersects() {
        let a = BoundingBox::from_position_and_dims(Point3::origin(), Dims3::new(2, 2, 2));
        let b = BoundingBox::from_position_and_dims(Point3::new(1, 1, 1), Dims3::new(2, 2, 2));
        let touching =
            BoundingBox::from_position_and_dims(Point3::new(0, 0, 2), Dims3::new(2, 2, 2));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&touching));
    }

    #[test]
    fn test_bounding_box_contains() {
        let space = BoundingBox::from_position_and_dims(Point3::origin(), Dims3::new(3, 3, 3));
        let inner = BoundingBox::from_position_and_dims(Point3::new(1, 1, 1), Dims3::new(2, 2, 2));
        let sticking_out =
            BoundingBox::from_position_and_dims(Point3::new(2, 0, 0), Dims3::new(2, 1, 1));

        assert!(space.contains_box(&inner));
        assert!(!space.contains_box(&sticking_out));
        assert_eq!(inner.dimensions(), Dims3::new(2, 2, 2));
    }

    #[test]
    fn test_validation_dimension() {
        assert!(validation::validate_dimension(3, "Width").is_ok());
        assert!(validation::validate_dimension(0, "Width").is_err());
        assert!(validation::validate_dimension(-1, "Width").is_err());
        assert!(validation::validate_dimensions_3d((1, 0, 1), "Truck").is_err());
    }
}
