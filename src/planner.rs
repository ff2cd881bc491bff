//! Loading plan computation.
//!
//! Crates are processed strictly in input order. For each crate the four
//! orientations are tried in a fixed order, and for each orientation the
//! candidate corners are scanned with `x` outermost and `z` innermost. The
//! first free box found is claimed. There is no backtracking: a crate that
//! fits nowhere aborts the whole plan.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::geometry::{first_collision, first_out_of_bounds};
use crate::grid::OccupancyGrid;
use crate::model::{
    Crate, CrateId, LoadingInstruction, Orientation, PlacedCrate, Truck, ValidationError,
};
use crate::types::{Dimensional, Dims3, Point3};

const ORIGINAL_ONLY: [Orientation; 1] = [Orientation::Original];

/// Configuration for the loading planner.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Step number given to the first loaded crate
    pub first_step_number: u64,
    /// Whether turned orientations may be tried after the original one
    pub allow_turns: bool,
    /// Largest cargo space (in unit cells) the planner will allocate a grid for
    pub max_grid_cells: usize,
}

impl PlannerConfig {
    pub const DEFAULT_FIRST_STEP_NUMBER: u64 = 1;
    pub const DEFAULT_ALLOW_TURNS: bool = true;
    pub const DEFAULT_MAX_GRID_CELLS: usize = 1 << 24;

    pub fn builder() -> PlannerConfigBuilder {
        PlannerConfigBuilder::default()
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            first_step_number: Self::DEFAULT_FIRST_STEP_NUMBER,
            allow_turns: Self::DEFAULT_ALLOW_TURNS,
            max_grid_cells: Self::DEFAULT_MAX_GRID_CELLS,
        }
    }
}

/// Builder for `PlannerConfig`.
#[derive(Clone, Debug, Default)]
pub struct PlannerConfigBuilder {
    config: PlannerConfig,
}

impl PlannerConfigBuilder {
    pub fn first_step_number(mut self, step: u64) -> Self {
        self.config.first_step_number = step;
        self
    }

    pub fn allow_turns(mut self, allow: bool) -> Self {
        self.config.allow_turns = allow;
        self
    }

    pub fn max_grid_cells(mut self, cells: usize) -> Self {
        self.config.max_grid_cells = cells;
        self
    }

    pub fn build(self) -> PlannerConfig {
        self.config
    }
}

/// Reasons a planning run produced no plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A crate fits in no orientation at any free position. Nothing placed
    /// before it is usable.
    #[error("Crate {crate_id} could not be placed in any orientation")]
    PlacementFailure { crate_id: CrateId },
    /// Truck or crate data was rejected before the search started.
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
}

impl PlanError {
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::PlacementFailure { .. } => "placement_failure",
            PlanError::InvalidInput(_) => "invalid_input",
        }
    }

    /// The crate the error is about, if any.
    pub fn crate_id(&self) -> Option<CrateId> {
        match self {
            PlanError::PlacementFailure { crate_id } => Some(*crate_id),
            PlanError::InvalidInput(ValidationError::DuplicateCrateId(id)) => Some(*id),
            PlanError::InvalidInput(_) => None,
        }
    }
}

/// Progress of a planning run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlannerState {
    Pending,
    /// Searching a position for the crate at this input index.
    Placing(usize),
    Succeeded,
    Failed(CrateId),
    /// The crate list was rejected before any search.
    Rejected,
}

impl PlannerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlannerState::Succeeded | PlannerState::Failed(_) | PlannerState::Rejected
        )
    }
}

/// Events emitted while planning, for live visualisation.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PlanEvent {
    /// A crate was committed to the cargo space.
    CratePlaced {
        step: u64,
        id: CrateId,
        pos: (i64, i64, i64),
        dims: (i64, i64, i64),
        turn_horizontal: bool,
        turn_vertical: bool,
    },
    /// The crate list was invalid; nothing was placed.
    InputRejected {
        reason_code: String,
        reason_text: String,
    },
    /// A crate fits nowhere; the run stops here.
    CrateRejected {
        id: CrateId,
        reason_code: String,
        reason_text: String,
    },
    /// Planning ended, successfully or not.
    Finished { placed: usize, complete: bool },
}

/// A complete loading plan: one instruction per input crate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadingPlan {
    instructions: BTreeMap<CrateId, LoadingInstruction>,
    placements: Vec<PlacedCrate>,
}

impl LoadingPlan {
    /// Instructions keyed by crate id.
    pub fn instructions(&self) -> &BTreeMap<CrateId, LoadingInstruction> {
        &self.instructions
    }

    pub fn into_instructions(self) -> BTreeMap<CrateId, LoadingInstruction> {
        self.instructions
    }

    pub fn get(&self, crate_id: CrateId) -> Option<&LoadingInstruction> {
        self.instructions.get(&crate_id)
    }

    /// Full placements, including depth and oriented extent, in loading order.
    pub fn placements(&self) -> &[PlacedCrate] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instructions sorted by step number.
    pub fn instructions_in_loading_order(&self) -> Vec<LoadingInstruction> {
        let mut steps: Vec<LoadingInstruction> = self.instructions.values().copied().collect();
        steps.sort_by_key(|instruction| instruction.loading_step_number);
        steps
    }

    /// Number of unit cells claimed by the plan.
    pub fn used_volume(&self) -> i64 {
        self.placements.iter().map(|p| p.volume()).sum()
    }

    /// Percentage of the truck volume claimed by the plan (0.0 to 100.0).
    pub fn utilization_percent(&self, truck: &Truck) -> f64 {
        let total = truck.cell_count();
        if total == 0 {
            return 0.0;
        }
        (self.used_volume() as f64 / total as f64) * 100.0
    }
}

/// Greedy first-fit planner for one truck.
///
/// Owns the occupancy grid. Every planning call starts from an empty grid, so
/// one instance can serve several crate lists for the same truck.
#[derive(Debug)]
pub struct LoadingPlanner {
    truck: Truck,
    config: PlannerConfig,
    grid: OccupancyGrid,
    state: PlannerState,
}

impl LoadingPlanner {
    /// Validates the truck and allocates its occupancy grid.
    pub fn new(truck: Truck, config: PlannerConfig) -> Result<Self, PlanError> {
        truck.validate()?;

        let cells = truck.cell_count();
        if cells > config.max_grid_cells as u128 {
            return Err(ValidationError::GridTooLarge {
                cells,
                limit: config.max_grid_cells,
            }
            .into());
        }

        // Bounded by max_grid_cells, so every axis fits in usize.
        let grid = OccupancyGrid::new(
            truck.width as usize,
            truck.height as usize,
            truck.length as usize,
        );

        Ok(Self {
            truck,
            config,
            grid,
            state: PlannerState::Pending,
        })
    }

    pub fn truck(&self) -> &Truck {
        &self.truck
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    /// Computes a plan for the crates in the given order.
    pub fn plan(&mut self, crates: &[Crate]) -> Result<LoadingPlan, PlanError> {
        self.plan_with_progress(crates, |_| {})
    }

    /// Like `plan`, reporting every placement through `on_event`.
    pub fn plan_with_progress(
        &mut self,
        crates: &[Crate],
        mut on_event: impl FnMut(&PlanEvent),
    ) -> Result<LoadingPlan, PlanError> {
        if let Err(err) = validate_crates(crates) {
            let error = PlanError::from(err);
            warn!("Crate list rejected: {}", error);
            self.state = PlannerState::Rejected;
            on_event(&PlanEvent::InputRejected {
                reason_code: error.code().to_string(),
                reason_text: error.to_string(),
            });
            on_event(&PlanEvent::Finished {
                placed: 0,
                complete: false,
            });
            return Err(error);
        }

        self.state = PlannerState::Pending;
        self.grid.clear();

        let mut step = self.config.first_step_number;
        let mut instructions = BTreeMap::new();
        let mut placements = Vec::with_capacity(crates.len());

        for (index, crate_) in crates.iter().enumerate() {
            self.state = PlannerState::Placing(index);

            let Some(placed) = self.place_crate(crate_) else {
                let error = PlanError::PlacementFailure { crate_id: crate_.id };
                warn!(
                    "Crate {} ({}x{}x{}) could not be placed after {} crates",
                    crate_.id,
                    crate_.width,
                    crate_.height,
                    crate_.length,
                    placements.len()
                );
                self.state = PlannerState::Failed(crate_.id);
                on_event(&PlanEvent::CrateRejected {
                    id: crate_.id,
                    reason_code: error.code().to_string(),
                    reason_text: error.to_string(),
                });
                on_event(&PlanEvent::Finished {
                    placed: placements.len(),
                    complete: false,
                });
                return Err(error);
            };

            debug!(
                "Step {}: crate {} at {:?} as {:?}",
                step, placed.crate_id, placed.position, placed.orientation
            );
            on_event(&PlanEvent::CratePlaced {
                step,
                id: placed.crate_id,
                pos: (placed.position.x, placed.position.y, placed.position.z),
                dims: placed.extent.as_tuple(),
                turn_horizontal: placed.orientation.turn_horizontal(),
                turn_vertical: placed.orientation.turn_vertical(),
            });

            instructions.insert(
                placed.crate_id,
                LoadingInstruction::from_placement(step, &placed),
            );
            placements.push(placed);
            step += 1;
        }

        debug_assert!(first_collision(&placements).is_none());
        debug_assert!(first_out_of_bounds(&placements, &self.truck).is_none());

        self.state = PlannerState::Succeeded;
        info!(
            "Loading plan complete: {} crates, {} of {} cells occupied",
            placements.len(),
            self.grid.occupied_cells(),
            self.grid.total_cells()
        );
        on_event(&PlanEvent::Finished {
            placed: placements.len(),
            complete: true,
        });

        Ok(LoadingPlan {
            instructions,
            placements,
        })
    }

    fn orientations(&self) -> &'static [Orientation] {
        if self.config.allow_turns {
            &Orientation::ALL
        } else {
            &ORIGINAL_ONLY
        }
    }

    /// Tries every orientation in order and claims the first fit.
    fn place_crate(&mut self, crate_: &Crate) -> Option<PlacedCrate> {
        for &orientation in self.orientations() {
            let extent = crate_.oriented_dims(orientation);
            let Some(position) = self.find_first_fit(extent) else {
                continue;
            };
            if self.grid.occupy_region(position, extent) {
                return Some(PlacedCrate::new(crate_, orientation, position));
            }
        }
        None
    }

    /// Scans corners with `x` outermost, `y` in the middle and `z` innermost.
    fn find_first_fit(&self, extent: Dims3) -> Option<Point3> {
        let space = self.truck.dims();
        if !extent.fits_within(&space) {
            return None;
        }

        for x in 0..=space.width - extent.width {
            for y in 0..=space.height - extent.height {
                for z in 0..=space.length - extent.length {
                    let position = Point3::new(x, y, z);
                    if self.grid.is_region_free(position, extent) {
                        return Some(position);
                    }
                }
            }
        }
        None
    }
}

/// Plans a single crate list with a fresh planner.
pub fn plan_loading(
    truck: Truck,
    crates: &[Crate],
    config: PlannerConfig,
) -> Result<LoadingPlan, PlanError> {
    LoadingPlanner::new(truck, config)?.plan(crates)
}

fn validate_crates(crates: &[Crate]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(crates.len());
    for crate_ in crates {
        crate_.validate()?;
        if !seen.insert(crate_.id) {
            return Err(ValidationError::DuplicateCrateId(crate_.id));
        }
    }
    Ok(())
}
