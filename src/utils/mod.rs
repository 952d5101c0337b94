pub mod handles;
pub mod logging;
