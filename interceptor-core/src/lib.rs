//! Safety logic of the CAN pedal interceptor.
//!
//! Everything here is hardware independent. The firmware crate wires it to
//! the interrupts:
//!
//! - CAN receive: `boot::detect`, then `CommandValidator::on_frame`
//! - CAN error: `SharedCells::raise(Event::BusError)`
//! - control timer: `Telemetry::tick`, then `TimeoutMonitor::tick`
//! - main loop: `PedalLoop::step`
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod blend;
pub mod boot;
pub mod cells;
pub mod config;
pub mod crc;
pub mod frame;
pub mod hal;
pub mod monitor;
pub mod pedal;
pub mod relay;
pub mod state;
pub mod telemetry;
pub mod validator;

#[cfg(test)]
mod mock;

pub use cells::SharedCells;
pub use config::{Config, Mode};
pub use state::{Event, SafetyState};
