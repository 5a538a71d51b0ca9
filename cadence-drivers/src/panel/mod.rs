//! Row-multiplexed LED panel
//!
//! The column drivers are a chain of shift registers fed over SPI; a row
//! port selects which row is lit. [`PanelRefresh`] is a background task
//! that lights one row per due invocation, so a full frame spans `H`
//! invocations and the image only looks steady if the row interval is
//! short enough for persistence of vision.
//!
//! Drawing goes through a [`PanelSurface`], which the refresh task only
//! borrows shared: foreground code keeps drawing into the back buffer
//! and publishes it with [`Surface::flush`].

pub mod refresh;
pub mod surface;

pub use refresh::{PanelConfig, PanelRefresh};
pub use surface::{PanelSurface, Surface, MAX_PANEL_WIDTH};
