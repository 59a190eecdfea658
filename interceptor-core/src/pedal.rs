//! One iteration of the free-running main loop.
use crate::blend::{blend, Blend, BlendMode};
use crate::cells::SharedCells;
use crate::frame::Pair;
use crate::hal::{AnalogIn, AnalogOut, Channel};
use embedded_hal::watchdog::Watchdog;

pub struct PedalLoop {
    mode: BlendMode,
}

impl PedalLoop {
    pub const fn new(mode: BlendMode) -> Self {
        Self { mode }
    }

    /// Sample both sensors, publish them for telemetry, drive both outputs
    /// and feed the watchdog. There is no path through here that skips an
    /// output write or the feed.
    pub fn step<I, O, W>(&self, cells: &SharedCells, input: &mut I, output: &mut O, watchdog: &mut W) -> Blend
    where
        I: AnalogIn,
        O: AnalogOut,
        W: Watchdog,
    {
        let sensors = Pair::new(input.read(Channel::A), input.read(Channel::B));
        cells.set_sensors(sensors);

        let result = blend(self.mode, cells.state(), cells.setpoints(), sensors);
        output.write(Channel::A, result.outputs.a);
        output.write(Channel::B, result.outputs.b);

        watchdog.feed();
        result
    }
}
