//! Global tuning constants for the Planar Dynamics engine.

/// Default gravity vector applied in the physics world (Y-up).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, -9.81];

/// Default number of velocity iterations performed per step.
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 8;

/// Default number of position iterations performed per step.
pub const DEFAULT_POSITION_ITERATIONS: u32 = 3;

/// Collision/constraint tolerance. Overlap is resolved to within this slop.
pub const LINEAR_SLOP: f32 = 0.005;

/// Skin thickness carried by polygon shapes.
pub const POLYGON_RADIUS: f32 = 2.0 * LINEAR_SLOP;

/// Largest position correction applied in a single solver iteration.
pub const MAX_LINEAR_CORRECTION: f32 = 0.2;

/// Baumgarte factor for the discrete position solver.
pub const BAUMGARTE: f32 = 0.2;

/// Baumgarte factor for the time-of-impact position solver.
pub const TOI_BAUMGARTE: f32 = 0.75;

/// Maximum contacts handed to the TOI solver for one body.
pub const MAX_TOI_CONTACTS: usize = 32;

/// Position iterations performed by the TOI solver.
pub const MAX_TOI_POSITION_ITERATIONS: u32 = 20;

/// Scans of a body's contact list while searching for its minimum TOI.
pub const MAX_TOI_SCAN_ITERATIONS: u32 = 50;

/// A contact past this many TOI events in one step stops producing new ones.
pub const MAX_TOI_COUNT: u32 = 10;

/// Iteration bound for the conservative-advancement root finder.
pub const MAX_TOI_ROOT_ITERATIONS: u32 = 64;

/// Relative velocities below this produce no restitution.
pub const VELOCITY_THRESHOLD: f32 = 1.0;

/// A body may not translate further than this in one step.
pub const MAX_TRANSLATION: f32 = 2.0;

/// A body may not rotate further than this in one step (radians).
pub const MAX_ROTATION: f32 = 0.5 * std::f32::consts::PI;

/// Seconds a body must stay under the sleep tolerances before it sleeps.
pub const TIME_TO_SLEEP: f32 = 0.5;

/// Linear speed tolerance for sleeping (m/s).
pub const LINEAR_SLEEP_TOLERANCE: f32 = 0.01;

/// Angular speed tolerance for sleeping (rad/s).
pub const ANGULAR_SLEEP_TOLERANCE: f32 = 2.0 / 180.0 * std::f32::consts::PI;

/// Broad-phase AABBs are fattened by this margin so small motions stay in place.
pub const AABB_EXTENSION: f32 = 0.1;

/// Broad-phase displacement prediction multiplier.
pub const AABB_MULTIPLIER: f32 = 2.0;

/// Cell size for the broad-phase uniform grid.
pub const BROADPHASE_CELL_SIZE: f32 = 4.0;
