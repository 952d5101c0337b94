pub mod body;
pub mod fixture;
pub mod joint;
pub mod math;
