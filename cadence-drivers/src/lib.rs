//! Driver implementations on top of the Cadence HAL
//!
//! Everything here is built from pins, ports and a delay provider:
//!
//! - Bit-banged SPI and I2C masters
//! - 74HC595 shift-register output port
//! - PCF8574 I2C port expander
//! - Row-multiplexed LED panel (framebuffer + refresh task)
//! - Switch matrix and keypad
//! - Background tasks: blinker, KITT sweep, servo pulse generator
//!
//! Busy-wait timing only happens inside the bus masters and the switch
//! matrix scan. Everything implementing [`cadence_core::Task`] is
//! deadline driven and returns at once when nothing is due.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod hc595;
pub mod keypad;
pub mod led;
pub mod panel;
pub mod pcf8574;
pub mod servo;
