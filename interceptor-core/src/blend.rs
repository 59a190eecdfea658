//! Decides what goes out on the two analog outputs.
use crate::frame::{Pair, SensorReadings, Setpoints};
use crate::state::SafetyState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlendMode {
    /// Each output is the larger of commanded and sensed
    Direct,
    /// Outputs are the commanded values (channels swapped) unless the two
    /// sensors differ by more than `threshold`
    Divergence { threshold: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Blend {
    pub outputs: Pair,
    /// True when the sensor values were passed through because the sensors
    /// diverged
    pub diverged: bool,
}

/// Sensor difference, as reported in the debug log
#[inline]
pub fn divergence(sensors: SensorReadings) -> u16 {
    sensors.a.abs_diff(sensors.b)
}

pub fn blend(
    mode: BlendMode,
    state: SafetyState,
    setpoints: Setpoints,
    sensors: SensorReadings,
) -> Blend {
    let passthrough = Blend {
        outputs: sensors,
        diverged: false,
    };

    match mode {
        BlendMode::Direct => {
            if state.permits_override() {
                Blend {
                    outputs: Pair::new(setpoints.a.max(sensors.a), setpoints.b.max(sensors.b)),
                    diverged: false,
                }
            } else {
                passthrough
            }
        }
        BlendMode::Divergence { threshold } => {
            let diverged = divergence(sensors) > threshold;
            if diverged {
                Blend {
                    outputs: sensors,
                    diverged,
                }
            } else if state.permits_override() {
                // Output 0 is driven from setpoint 1 and vice versa
                Blend {
                    outputs: Pair::new(setpoints.b, setpoints.a),
                    diverged,
                }
            } else {
                passthrough
            }
        }
    }
}
