//! LED background tasks

pub mod blinker;
pub mod kitt;

pub use blinker::Blinker;
pub use kitt::Kitt;
