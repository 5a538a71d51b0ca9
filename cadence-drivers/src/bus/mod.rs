//! Bit-banged bus masters
//!
//! Both masters build a synchronous serial bus out of plain pins and a
//! delay provider. The delay is the only place where they spin, which is
//! why they belong in foreground code or in bounded task steps, never in
//! a loop waiting on another task.

pub mod i2c;
pub mod spi;

pub use i2c::I2cBitBang;
pub use spi::SpiBitBang;
