pub mod contact;
pub mod contact_solver;
pub mod island;
pub mod joints;
pub mod toi_solver;

use glam::Vec2;

/// Per-step solver parameters.
#[derive(Debug, Clone, Copy)]
pub struct TimeStep {
    pub dt: f32,
    pub inv_dt: f32,
    /// `previous inv_dt * dt`; rescales warm-started impulses across
    /// variable-length steps.
    pub dt_ratio: f32,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub warm_starting: bool,
}

/// Staged center-of-mass pose used while an island is being solved.
#[derive(Debug, Clone, Copy, Default)]
pub struct Position {
    pub c: Vec2,
    pub a: f32,
}

/// Staged velocity used while an island is being solved.
#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub v: Vec2,
    pub w: f32,
}
