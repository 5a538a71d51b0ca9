//! Row scan task

use cadence_core::{Periodic, Task};
use cadence_hal::{PinOut, PortOut, SpiBus};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::surface::PanelSurface;

/// Panel timing and wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelConfig {
    /// Time each row stays lit (µs)
    pub row_interval_us: u64,
    /// Column drivers sink current: a lit pixel is a 0 bit
    pub columns_active_low: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            row_interval_us: 1_000, // 125 Hz frame rate on 8 rows
            columns_active_low: false,
        }
    }
}

/// Background task lighting one panel row per due invocation
///
/// Each step shifts the row out over SPI as a big-endian number of
/// `ceil(W / 8)` bytes (highest column first), puts the row index on the
/// row port and pulses the latch so columns and row switch together.
pub struct PanelRefresh<'a, B, L, R, const W: usize, const H: usize> {
    surface: &'a PanelSurface<W, H>,
    bus: B,
    latch: L,
    rows: R,
    config: PanelConfig,
    periodic: Periodic,
    row: usize,
}

impl<'a, B, L, R, const W: usize, const H: usize> PanelRefresh<'a, B, L, R, W, H>
where
    B: SpiBus,
    L: PinOut,
    R: PortOut,
{
    const ROW_BYTES: usize = W.div_ceil(8);

    /// Create the task; the first row is due one interval after `now_us`
    pub fn new(
        surface: &'a PanelSurface<W, H>,
        bus: B,
        mut latch: L,
        rows: R,
        config: PanelConfig,
        now_us: u64,
    ) -> Self {
        latch.write_flush(false);
        Self {
            surface,
            bus,
            latch,
            rows,
            config,
            periodic: Periodic::new(config.row_interval_us, now_us),
            row: 0,
        }
    }

    /// Row shown by the next step
    pub fn next_row(&self) -> usize {
        self.row
    }

    /// Give back the bus, latch and row port
    pub fn release(self) -> (B, L, R) {
        (self.bus, self.latch, self.rows)
    }

    /// Light the next row right away
    pub fn step(&mut self) {
        let mut bits = self.surface.row(self.row);
        if self.config.columns_active_low {
            bits = !bits & PanelSurface::<W, H>::ROW_MASK;
        }

        let bytes = bits.to_be_bytes();
        let row_bytes = &bytes[bytes.len() - Self::ROW_BYTES..];
        if self
            .bus
            .write_and_read(Self::ROW_BYTES, Some(row_bytes), None)
            .is_err()
        {
            #[cfg(feature = "defmt")]
            defmt::warn!("panel: row {} shift failed", self.row);
        }

        self.rows.write(self.row as u16);
        self.rows.flush();
        self.latch.write_flush(true);
        self.latch.write_flush(false);

        self.row = (self.row + 1) % H;
    }
}

impl<B, L, R, const W: usize, const H: usize> Task for PanelRefresh<'_, B, L, R, W, H>
where
    B: SpiBus,
    L: PinOut,
    R: PortOut,
{
    fn work(&mut self, now_us: u64) {
        if self.periodic.poll(now_us) {
            self.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{FnTask, Scheduler};
    use cadence_hal_sim::{RecordingPort, RecordingSpi, SimClock, SimOutput, Wire};

    type Refresh<'a, const W: usize, const H: usize> =
        PanelRefresh<'a, RecordingSpi, SimOutput, RecordingPort, W, H>;

    fn refresh<const W: usize, const H: usize>(
        surface: &PanelSurface<W, H>,
        config: PanelConfig,
    ) -> (Refresh<'_, W, H>, RecordingSpi, RecordingPort, Wire) {
        let spi = RecordingSpi::new();
        let rows = RecordingPort::new(4);
        let latch = Wire::new(true);
        let task = PanelRefresh::new(
            surface,
            spi.clone(),
            latch.output(),
            rows.clone(),
            config,
            0,
        );
        (task, spi, rows, latch)
    }

    fn striped() -> PanelSurface<12, 4> {
        let surface = PanelSurface::new();
        for y in 0..4 {
            // row y lights column y and column 11 - y
            surface.write_pixel(y, y, true);
            surface.write_pixel(11 - y, y, true);
        }
        surface.flush();
        surface
    }

    #[test]
    fn test_full_frame_shifts_every_row_once() {
        let surface = striped();
        let (mut task, spi, rows, _) = refresh(&surface, PanelConfig::default());

        for step in 1..=4 {
            task.work(step * 1_000);
        }

        assert_eq!(
            spi.frames(),
            [
                vec![0x08, 0x01],
                vec![0x04, 0x02],
                vec![0x02, 0x04],
                vec![0x01, 0x08],
            ]
        );
        assert_eq!(rows.values(), [0, 1, 2, 3]);
        assert_eq!(task.next_row(), 0);
    }

    #[test]
    fn test_row_select_cycles_without_gaps() {
        let surface = PanelSurface::<8, 3>::new();
        let (mut task, _, rows, latch) = refresh(&surface, PanelConfig::default());

        for step in 1..=7 {
            task.work(step * 1_000);
        }

        assert_eq!(rows.values(), [0, 1, 2, 0, 1, 2, 0]);
        // one initial low plus a high/low pulse per row
        assert_eq!(latch.history().len(), 1 + 2 * 7);
        assert!(!latch.level());
    }

    #[test]
    fn test_not_due_does_nothing() {
        let surface = striped();
        let (mut task, spi, rows, latch) = refresh(&surface, PanelConfig::default());

        for now in [0, 100, 999] {
            task.work(now);
        }

        assert!(spi.frames().is_empty());
        assert!(rows.values().is_empty());
        assert_eq!(latch.flushes(), 1);
    }

    #[test]
    fn test_active_low_columns() {
        let surface = striped();
        let config = PanelConfig {
            columns_active_low: true,
            ..PanelConfig::default()
        };
        let (mut task, spi, _, _) = refresh(&surface, config);

        task.step();
        // unused high bits stay 0
        assert_eq!(spi.frames(), [vec![0x07, 0xFE]]);
    }

    #[test]
    fn test_drawing_task_and_refresh_share_surface() {
        let clock = SimClock::new();
        let surface = PanelSurface::<8, 2>::new();
        let (mut task, spi, _, _) = refresh(&surface, PanelConfig::default());

        // lights the top-left pixel once time passes 500 µs
        let mut draw = FnTask(|now: u64| {
            if now >= 500 {
                surface.write_pixel(0, 0, true);
                surface.flush();
            }
        });

        let mut scheduler: Scheduler<'_, _> = Scheduler::new(clock.clone());
        scheduler.register(&mut draw).unwrap();
        scheduler.register(&mut task).unwrap();
        for now in (0..=2_000).step_by(250) {
            clock.set(now);
            scheduler.run_once();
        }
        drop(scheduler);

        assert_eq!(spi.frames(), [vec![0x01], vec![0x00]]);
    }
}
