// Input handler module for pointer routing on the desktop
// Handles hit-testing geometry and the single event dispatch entry point

pub mod router;
pub mod spatial;
pub mod types;

pub use types::*;
