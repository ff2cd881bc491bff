//! Data models for truck loading.
//!
//! This module defines the plain data consumed and produced by the planner:
//! - `Truck`: the cargo space
//! - `Crate`: a box to be loaded, with identity and base extent
//! - `Orientation`: the four allowed turn combinations of a crate
//! - `PlacedCrate`: a crate with its chosen orientation and position
//! - `LoadingInstruction`: the per-crate output record

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{BoundingBox, Dimensional, Dims3, Point3, validation};

/// Identity of a crate, unique within one planning request.
pub type CrateId = i64;

/// Validation error for truck and crate data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Duplicate crate id: {0}")]
    DuplicateCrateId(CrateId),
    #[error("Cargo space of {cells} cells exceeds the limit of {limit} cells")]
    GridTooLarge { cells: u128, limit: usize },
}

/// The rectangular cargo space `[0,W) × [0,H) × [0,L)`.
///
/// # Examples
/// ```
/// use truck_loader::model::Truck;
///
/// assert!(Truck::new(2, 1, 1).is_ok());
/// assert!(Truck::new(0, 1, 1).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Truck {
    pub width: i64,
    pub height: i64,
    pub length: i64,
}

impl Truck {
    /// Creates a truck after checking that every dimension is positive.
    pub fn new(width: i64, height: i64, length: i64) -> Result<Self, ValidationError> {
        let truck = Self {
            width,
            height,
            length,
        };
        truck.validate()?;
        Ok(truck)
    }

    /// Re-checks a truck that may have been built directly, e.g. by deserialization.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_dimensions_3d((self.width, self.height, self.length), "Truck")
            .map_err(ValidationError::InvalidDimension)
    }

    #[inline]
    pub fn dims(&self) -> Dims3 {
        Dims3::new(self.width, self.height, self.length)
    }

    /// The whole cargo space as a box anchored at the origin.
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(Point3::origin(), self.dims())
    }

    /// Number of unit cells, computed without overflow.
    pub fn cell_count(&self) -> u128 {
        self.width.max(0) as u128 * self.height.max(0) as u128 * self.length.max(0) as u128
    }
}

/// A rectangular box to be loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "id": 1, "width": 1, "height": 1, "length": 2 }))]
pub struct Crate {
    #[schema(value_type = i64)]
    pub id: CrateId,
    pub width: i64,
    pub height: i64,
    pub length: i64,
}

impl Crate {
    /// Creates a crate after checking that every dimension is positive.
    ///
    /// # Examples
    /// ```
    /// use truck_loader::model::Crate;
    ///
    /// assert!(Crate::new(7, 1, 2, 3).is_ok());
    /// assert!(Crate::new(7, 1, -2, 3).is_err());
    /// ```
    pub fn new(id: CrateId, width: i64, height: i64, length: i64) -> Result<Self, ValidationError> {
        let crate_ = Self {
            id,
            width,
            height,
            length,
        };
        crate_.validate()?;
        Ok(crate_)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_dimensions_3d(
            (self.width, self.height, self.length),
            &format!("Crate {}", self.id),
        )
        .map_err(ValidationError::InvalidDimension)
    }

    /// Base extent before any turn.
    #[inline]
    pub fn dims(&self) -> Dims3 {
        Dims3::new(self.width, self.height, self.length)
    }

    /// Extent of the crate in the given orientation. The crate itself is not changed.
    #[inline]
    pub fn oriented_dims(&self, orientation: Orientation) -> Dims3 {
        orientation.apply(self.dims())
    }
}

/// One of the four turn combinations a crate may be loaded in.
///
/// Only two independent flags exist, a horizontal turn (width/length exchange)
/// and a vertical turn (width/height exchange); the remaining two box
/// permutations are never produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Original,
    TurnedHorizontal,
    TurnedVertical,
    TurnedBoth,
}

impl Orientation {
    /// All orientations in the order the planner tries them.
    pub const ALL: [Orientation; 4] = [
        Orientation::Original,
        Orientation::TurnedHorizontal,
        Orientation::TurnedVertical,
        Orientation::TurnedBoth,
    ];

    pub const fn from_flags(turn_horizontal: bool, turn_vertical: bool) -> Self {
        match (turn_horizontal, turn_vertical) {
            (false, false) => Orientation::Original,
            (true, false) => Orientation::TurnedHorizontal,
            (false, true) => Orientation::TurnedVertical,
            (true, true) => Orientation::TurnedBoth,
        }
    }

    pub const fn turn_horizontal(self) -> bool {
        matches!(self, Orientation::TurnedHorizontal | Orientation::TurnedBoth)
    }

    pub const fn turn_vertical(self) -> bool {
        matches!(self, Orientation::TurnedVertical | Orientation::TurnedBoth)
    }

    /// Transforms a base extent.
    ///
    /// `TurnedBoth` applies the horizontal turn first and the vertical turn
    /// second: `(w, h, l) -> (l, h, w) -> (h, l, w)`.
    pub const fn apply(self, dims: Dims3) -> Dims3 {
        let dims = if self.turn_horizontal() {
            dims.swap_width_length()
        } else {
            dims
        };
        if self.turn_vertical() {
            dims.swap_width_height()
        } else {
            dims
        }
    }
}

/// A crate committed to a position in the cargo space.
///
/// Unlike [`LoadingInstruction`] this keeps the depth coordinate and the
/// oriented extent, which is what overlap and bounds audits need.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlacedCrate {
    pub crate_id: CrateId,
    pub orientation: Orientation,
    pub position: Point3,
    pub extent: Dims3,
}

impl PlacedCrate {
    pub fn new(crate_: &Crate, orientation: Orientation, position: Point3) -> Self {
        Self {
            crate_id: crate_.id,
            orientation,
            position,
            extent: crate_.oriented_dims(orientation),
        }
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.position, self.extent)
    }
}

impl Dimensional for PlacedCrate {
    fn dimensions(&self) -> Dims3 {
        self.extent
    }
}

/// Output record for one loaded crate.
///
/// Only the width and height coordinates of the minimum corner are recorded;
/// the depth follows from the loading order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
#[schema(example = json!({
    "LoadingStepNumber": 1,
    "CrateId": 1,
    "TopLeftX": 0,
    "TopLeftY": 0,
    "TurnHorizontal": true,
    "TurnVertical": false
}))]
pub struct LoadingInstruction {
    pub loading_step_number: u64,
    #[schema(value_type = i64)]
    pub crate_id: CrateId,
    pub top_left_x: i64,
    pub top_left_y: i64,
    pub turn_horizontal: bool,
    pub turn_vertical: bool,
}

impl LoadingInstruction {
    pub fn from_placement(step: u64, placed: &PlacedCrate) -> Self {
        Self {
            loading_step_number: step,
            crate_id: placed.crate_id,
            top_left_x: placed.position.x,
            top_left_y: placed.position.y,
            turn_horizontal: placed.orientation.turn_horizontal(),
            turn_vertical: placed.orientation.turn_vertical(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_flags(self.turn_horizontal, self.turn_vertical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_trial_order_and_flags() {
        let flags: Vec<(bool, bool)> = Orientation::ALL
            .iter()
            .map(|o| (o.turn_horizontal(), o.turn_vertical()))
            .collect();
        assert_eq!(
            flags,
            vec![(false, false), (true, false), (false, true), (true, true)]
        );

        for orientation in Orientation::ALL {
            assert_eq!(
                Orientation::from_flags(orientation.turn_horizontal(), orientation.turn_vertical()),
                orientation
            );
        }
    }

    #[test]
    fn orientation_extents() {
        let crate_ = Crate::new(1, 1, 2, 3).unwrap();
        assert_eq!(crate_.oriented_dims(Orientation::Original), Dims3::new(1, 2, 3));
        assert_eq!(
            crate_.oriented_dims(Orientation::TurnedHorizontal),
            Dims3::new(3, 2, 1)
        );
        assert_eq!(
            crate_.oriented_dims(Orientation::TurnedVertical),
            Dims3::new(2, 1, 3)
        );
        assert_eq!(
            crate_.oriented_dims(Orientation::TurnedBoth),
            Dims3::new(2, 3, 1)
        );
        // the crate keeps its base extent
        assert_eq!(crate_.dims(), Dims3::new(1, 2, 3));
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        assert!(matches!(
            Truck::new(1, 0, 1),
            Err(ValidationError::InvalidDimension(_))
        ));
        assert!(matches!(
            Crate::new(4, 1, 1, -3),
            Err(ValidationError::InvalidDimension(msg)) if msg.contains("Crate 4 length")
        ));
    }

    #[test]
    fn truck_cell_count_does_not_overflow() {
        let truck = Truck {
            width: i64::MAX,
            height: 2,
            length: 2,
        };
        assert_eq!(truck.cell_count(), i64::MAX as u128 * 4);
    }

    #[test]
    fn instruction_uses_pascal_case_wire_names() {
        let crate_ = Crate::new(9, 1, 1, 2).unwrap();
        let placed = PlacedCrate::new(&crate_, Orientation::TurnedHorizontal, Point3::new(0, 1, 5));
        let instruction = LoadingInstruction::from_placement(3, &placed);

        let value = serde_json::to_value(instruction).unwrap();
        assert_eq!(
            value,
            json!({
                "LoadingStepNumber": 3,
                "CrateId": 9,
                "TopLeftX": 0,
                "TopLeftY": 1,
                "TurnHorizontal": true,
                "TurnVertical": false
            })
        );
        assert_eq!(instruction.orientation(), Orientation::TurnedHorizontal);
    }
}
