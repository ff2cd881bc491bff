//! Greedy first-fit loading plans for crates in a truck.
//!
//! [`planner::LoadingPlanner`] places crates in input order, trying four
//! orientations and scanning an occupancy grid for the first free box. The
//! [`api`] module exposes the planner over HTTP.

pub mod api;
pub mod config;
pub mod geometry;
pub mod grid;
pub mod model;
pub mod planner;
pub mod types;
