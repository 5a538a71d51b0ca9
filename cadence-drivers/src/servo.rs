//! Hobby servo
//!
//! A servo expects one pulse per 20 ms frame; the pulse width sets the
//! angle. [`Servo`] generates the pulse train as a background task: the
//! pin goes high when a frame is due and low once the pulse width has
//! passed, so the pulse edge is only as precise as the scheduler pass
//! rate.

use cadence_core::{Periodic, Task};
use cadence_hal::PinOut;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Length of one servo frame (µs)
pub const SERVO_FRAME_US: u64 = 20_000;

/// Pulse range and the angles it maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoProperties {
    /// Pulse width at `min_angle` (µs)
    pub min_pulse_us: u32,
    /// Pulse width at `max_angle` (µs)
    pub max_pulse_us: u32,
    /// Smallest angle (degrees)
    pub min_angle: u16,
    /// Largest angle (degrees)
    pub max_angle: u16,
}

impl Default for ServoProperties {
    fn default() -> Self {
        Self {
            min_pulse_us: 500,
            max_pulse_us: 2_500,
            min_angle: 0,
            max_angle: 180,
        }
    }
}

impl ServoProperties {
    /// Pulse width for `angle`, clamped to the angle range
    pub fn pulse_for_angle(&self, angle: u16) -> u32 {
        let angle = angle.clamp(self.min_angle, self.max_angle.max(self.min_angle));
        let span = u32::from(self.max_angle.saturating_sub(self.min_angle));
        if span == 0 {
            return self.min_pulse_us;
        }

        let pulses = self.max_pulse_us.saturating_sub(self.min_pulse_us);
        let offset = u32::from(angle - self.min_angle);
        self.min_pulse_us + pulses * offset / span
    }
}

/// Servo driven from a single output pin
pub struct Servo<P> {
    pin: P,
    properties: ServoProperties,
    pulse_us: u32,
    frame: Periodic,
    pulse_end_us: Option<u64>,
}

impl<P: PinOut> Servo<P> {
    /// Start centred with the pin low; the first frame is due at
    /// `now_us + SERVO_FRAME_US`
    pub fn new(mut pin: P, properties: ServoProperties, now_us: u64) -> Self {
        pin.write_flush(false);
        let centre = properties.pulse_for_angle(
            properties.min_angle + properties.max_angle.saturating_sub(properties.min_angle) / 2,
        );
        Self {
            pin,
            properties,
            pulse_us: centre,
            frame: Periodic::new(SERVO_FRAME_US, now_us),
            pulse_end_us: None,
        }
    }

    /// Set the pulse width, clamped to the servo's range
    ///
    /// Takes effect at the next frame.
    pub fn write_us(&mut self, pulse_us: u32) {
        let low = self.properties.min_pulse_us;
        self.pulse_us = pulse_us.clamp(low, self.properties.max_pulse_us.max(low));
    }

    /// Set the angle in degrees, clamped to the servo's range
    pub fn write_angle(&mut self, angle: u16) {
        self.pulse_us = self.properties.pulse_for_angle(angle);
    }

    /// Current pulse width (µs)
    pub fn pulse_us(&self) -> u32 {
        self.pulse_us
    }

    /// Pulse range and angle mapping
    pub fn properties(&self) -> &ServoProperties {
        &self.properties
    }

    /// Give back the pin, left low
    pub fn release(mut self) -> P {
        self.pin.write_flush(false);
        self.pin
    }
}

impl<P: PinOut> Task for Servo<P> {
    fn work(&mut self, now_us: u64) {
        if let Some(end) = self.pulse_end_us {
            if now_us >= end {
                self.pin.write_flush(false);
                self.pulse_end_us = None;
            }
        }

        if self.frame.poll(now_us) {
            self.pin.write_flush(true);
            self.pulse_end_us = Some(now_us + u64::from(self.pulse_us));
        }
    }
}
