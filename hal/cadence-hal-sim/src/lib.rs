//! Host simulation of the Cadence HAL
//!
//! Every type here is a cheap handle onto shared state, so a test can
//! hand a pin to a driver and still inspect the line afterwards:
//!
//! - [`SimClock`] / [`SimDelay`] - virtual time; delays advance the clock
//! - [`Wire`] - one digital line with output and input ends
//! - [`RecordingPort`] / [`RecordingSpi`] - record what was flushed or shifted
//! - [`SwitchMatrixSim`] - key matrix wired between two ports
//! - [`I2cSlaveSim`] - open-drain SCL/SDA pair with an echoing slave

#![deny(unsafe_code)]

pub mod clock;
pub mod i2c;
pub mod pins;
pub mod spi;

pub use clock::{SimClock, SimDelay};
pub use i2c::{I2cSimPin, I2cSlaveSim};
pub use pins::{
    MatrixInputs, MatrixOutputs, RecordingPort, SimInput, SimOutput, SwitchMatrixSim, Wire,
};
pub use spi::RecordingSpi;
