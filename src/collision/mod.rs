pub mod broadphase;
pub mod distance;
pub mod narrowphase;
pub mod shapes;
pub mod toi;
