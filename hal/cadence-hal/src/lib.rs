//! Cadence Hardware Abstraction Layer
//!
//! This crate defines the capabilities the scheduler and the bit-banged
//! bus engine consume. Chip support crates implement them on top of
//! memory-mapped registers; `cadence-hal-sim` implements them on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application tasks and drivers          │
//! │  (cadence-core, cadence-drivers)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cadence-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  chip crates  │       │ cadence-hal-  │
//! │ (registers)   │       │     sim       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::PinOut`], [`gpio::PinIn`], [`gpio::PinOc`] - Two-phase digital I/O
//! - [`port::PortOut`], [`port::PortIn`], [`port::PortOc`] - Pin vectors
//! - [`time::Clock`], [`time::DelayNs`] - Monotonic time and delays
//! - [`spi::SpiBus`] - SPI master transfers framed by chip select
//! - [`i2c::I2cPrimitives`], [`i2c::I2cBus`] - I2C bit primitives and transactions

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod port;
pub mod spi;
pub mod time;

// Re-export key traits at crate root for convenience
pub use gpio::{Direction, PinIn, PinInOut, PinOc, PinOut};
pub use i2c::{I2cBus, I2cError, I2cPrimitives, I2cReadTransaction, I2cWriteTransaction};
pub use port::{Port, PortIn, PortOc, PortOut};
pub use spi::{SpiBus, SpiError, SpiTransaction};
pub use time::{Clock, DelayNs};
