//! State shared between the interrupt handlers and the main loop.
//!
//! Everything is a single lock-free word, so no handler ever waits on
//! another. The two value pairs are packed into one `u32` each; a reader
//! always sees both halves from the same write.
//!
//! | cell       | written by                        | read by               |
//! |------------|-----------------------------------|-----------------------|
//! | state      | validator, monitor, telemetry, bus error | blender, telemetry |
//! | setpoints  | validator                         | blender               |
//! | sequence   | validator                         | validator             |
//! | timeout    | validator (reset), monitor (count)| monitor               |
//! | sensors    | main loop                         | telemetry             |
use crate::frame::{Pair, SensorReadings, SequenceIndex, Setpoints};
use crate::state::{AtomicSafetyState, Event, SafetyState};
use portable_atomic::{AtomicU32, AtomicU8, Ordering::Relaxed};

pub struct SharedCells {
    state: AtomicSafetyState,
    setpoints: AtomicU32,
    sequence: AtomicU8,
    timeout: AtomicU32,
    sensors: AtomicU32,
}

impl SharedCells {
    /// Power-on values: StartupFault, nothing commanded, index 0
    pub const fn new() -> Self {
        Self {
            state: AtomicSafetyState::new(SafetyState::StartupFault),
            setpoints: AtomicU32::new(0),
            sequence: AtomicU8::new(0),
            timeout: AtomicU32::new(0),
            sensors: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn state(&self) -> SafetyState {
        self.state.load(Relaxed)
    }

    /// Apply an event to the state register. Returns the new state.
    ///
    /// Events with a fixed target are a plain store, so a handler
    /// preempting this one can't have its own write undone.
    pub fn raise(&self, event: Event) -> SafetyState {
        match event.target() {
            Some(next) => {
                let prev = self.state.swap(next, Relaxed);
                if prev != next {
                    info!("State {} => {}", prev, next);
                }
                next
            }
            None => self.state(),
        }
    }

    #[inline]
    pub fn setpoints(&self) -> Setpoints {
        Pair::unpack(self.setpoints.load(Relaxed))
    }

    #[inline]
    pub fn set_setpoints(&self, setpoints: Setpoints) {
        self.setpoints.store(setpoints.pack(), Relaxed);
    }

    #[inline]
    pub fn sequence(&self) -> SequenceIndex {
        SequenceIndex::new(self.sequence.load(Relaxed))
    }

    #[inline]
    pub fn set_sequence(&self, index: SequenceIndex) {
        self.sequence.store(index.raw(), Relaxed);
    }

    #[inline]
    pub fn timeout_ticks(&self) -> u32 {
        self.timeout.load(Relaxed)
    }

    #[inline]
    pub fn reset_timeout(&self) {
        self.timeout.store(0, Relaxed);
    }

    /// Count one tick without a valid command, saturating at `limit`.
    /// Returns the new count.
    pub fn count_timeout_tick(&self, limit: u32) -> u32 {
        let bump = |t: u32| t.saturating_add(1).min(limit);
        // CAS loop so a reset from the receive interrupt is never lost
        match self.timeout.fetch_update(Relaxed, Relaxed, |t| Some(bump(t))) {
            Ok(prev) | Err(prev) => bump(prev),
        }
    }

    #[inline]
    pub fn sensors(&self) -> SensorReadings {
        Pair::unpack(self.sensors.load(Relaxed))
    }

    #[inline]
    pub fn set_sensors(&self, sensors: SensorReadings) {
        self.sensors.store(sensors.pack(), Relaxed);
    }
}

impl Default for SharedCells {
    fn default() -> Self {
        Self::new()
    }
}
