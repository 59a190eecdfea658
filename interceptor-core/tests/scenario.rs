//! Whole-system runs: the receive handler, control tick and main loop driven
//! by hand in the order the interrupts would fire.
use embedded_can::StandardId;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::watchdog::Watchdog;
use hex_literal::hex;
use interceptor_core::crc::CRC8_1D;
use interceptor_core::frame::{CommandFrame, Pair, SequenceIndex, TelemetryFrame};
use interceptor_core::hal::{AnalogIn, AnalogOut, Channel, TxSlot};
use interceptor_core::monitor::TimeoutMonitor;
use interceptor_core::pedal::PedalLoop;
use interceptor_core::relay::Relay;
use interceptor_core::telemetry::Telemetry;
use interceptor_core::validator::{CommandValidator, Verdict};
use interceptor_core::{boot, Config, Event, Mode, SafetyState, SharedCells};
use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

#[derive(Clone, Default)]
struct Pin(Rc<Cell<bool>>);

impl OutputPin for Pin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

struct Sensors(u16, u16);

impl AnalogIn for Sensors {
    fn read(&mut self, channel: Channel) -> u16 {
        match channel {
            Channel::A => self.0,
            Channel::B => self.1,
        }
    }
}

#[derive(Default)]
struct Outputs(u16, u16);

impl AnalogOut for Outputs {
    fn write(&mut self, channel: Channel, value: u16) {
        match channel {
            Channel::A => self.0 = value,
            Channel::B => self.1 = value,
        }
    }
}

#[derive(Default)]
struct Dog(usize);

impl Watchdog for Dog {
    fn feed(&mut self) {
        self.0 += 1;
    }
}

#[derive(Default)]
struct Bus {
    frames: Vec<(u16, Vec<u8>)>,
}

impl TxSlot for Bus {
    fn is_free(&self) -> bool {
        true
    }

    fn submit(&mut self, id: StandardId, data: &[u8]) {
        self.frames.push((id.as_raw(), data.to_vec()));
    }
}

struct Interceptor {
    config: Config,
    cells: SharedCells,
    relay: Relay<Pin>,
    relay_pin: Pin,
    validator: CommandValidator,
    monitor: TimeoutMonitor,
    telemetry: Telemetry<Pin>,
    pedal: PedalLoop,
    bus: Bus,
    sensors: Sensors,
    outputs: Outputs,
    dog: Dog,
}

impl Interceptor {
    fn new(mode: Mode) -> Self {
        let config = Config::new(mode);
        let relay_pin = Pin::default();
        Self {
            config,
            cells: SharedCells::new(),
            relay: Relay::new(relay_pin.clone()),
            relay_pin,
            validator: CommandValidator::new(&CRC8_1D),
            monitor: TimeoutMonitor::new(config.timeout_ticks),
            telemetry: Telemetry::new(config.telemetry_id, &CRC8_1D, Pin::default()),
            pedal: PedalLoop::new(config.blend),
            bus: Bus::default(),
            sensors: Sensors(0, 0),
            outputs: Outputs::default(),
            dog: Dog::default(),
        }
    }

    fn receive(&mut self, data: &[u8]) -> Option<Verdict> {
        if boot::detect(data).is_some() {
            return None;
        }
        Some(self.validator.on_frame(data, &self.cells, &mut self.relay))
    }

    fn command(&mut self, index: u8, a: u16, b: u16, enable: bool) -> Verdict {
        let frame = CommandFrame {
            setpoints: Pair::new(a, b),
            enable,
            index: SequenceIndex::new(index),
        }
        .encode(&CRC8_1D);
        self.receive(&frame).unwrap()
    }

    fn control_tick(&mut self) {
        self.telemetry.tick(&self.cells, &mut self.bus);
        self.monitor.tick(&self.cells, &mut self.relay);
    }

    fn main_loop(&mut self) -> (u16, u16) {
        self.pedal
            .step(&self.cells, &mut self.sensors, &mut self.outputs, &mut self.dog);
        (self.outputs.0, self.outputs.1)
    }

    fn last_telemetry(&self) -> TelemetryFrame {
        let (id, data) = self.bus.frames.last().unwrap();
        assert_eq!(*id, self.config.telemetry_id.as_raw());
        TelemetryFrame::decode(data, &CRC8_1D).unwrap().unwrap()
    }
}

#[test]
fn enable_then_timeout() {
    let mut ic = Interceptor::new(Mode::Direct);
    ic.sensors = Sensors(100, 300);

    let verdict = ic.command(1, 1000, 2000, true);

    assert_eq!(verdict, Verdict::Enabled(Pair::new(1000, 2000)));
    assert!(ic.relay.is_closed());
    assert!(ic.relay_pin.0.get());
    assert_eq!(ic.cells.setpoints(), Pair::new(1000, 2000));
    assert_eq!(ic.cells.timeout_ticks(), 0);

    for _ in 0..5 {
        ic.main_loop();
        ic.control_tick();
    }

    assert_eq!(ic.cells.state(), SafetyState::TimeoutFault);
    assert!(!ic.relay.is_closed());
    assert!(!ic.relay_pin.0.get());
    assert_eq!(ic.main_loop(), (100, 300));
}

#[test]
fn clear_then_override_then_timeout() {
    let mut ic = Interceptor::new(Mode::Direct);
    ic.sensors = Sensors(100, 300);

    // Still in StartupFault, outputs follow the sensors
    assert_eq!(ic.main_loop(), (100, 300));

    ic.command(1, 0, 0, false);
    assert_eq!(ic.cells.state(), SafetyState::NoFault);
    ic.command(2, 200, 50, true);
    assert_eq!(ic.main_loop(), (200, 300));

    // Commands keep arriving, no timeout
    for index in 3..20u8 {
        ic.control_tick();
        ic.control_tick();
        ic.command(index, 200, 50, true);
    }
    assert_eq!(ic.cells.state(), SafetyState::NoFault);
    assert!(ic.relay.is_closed());

    for _ in 0..4 {
        ic.control_tick();
    }
    assert_eq!(ic.cells.state(), SafetyState::NoFault);
    ic.control_tick();
    assert_eq!(ic.cells.state(), SafetyState::TimeoutFault);
    assert_eq!(ic.main_loop(), (100, 300));
}

#[test]
fn telemetry_reports_state_changes() {
    let mut ic = Interceptor::new(Mode::Divergence);
    ic.sensors = Sensors(0x400, 0x420);
    ic.main_loop();

    ic.control_tick();
    let frame = ic.last_telemetry();
    assert_eq!(frame.state, SafetyState::StartupFault);
    assert_eq!(frame.sensors, Pair::new(0x400, 0x420));
    assert_eq!(frame.index.raw(), 0);

    ic.command(1, 0, 0, false);
    ic.control_tick();
    let frame = ic.last_telemetry();
    assert_eq!(frame.state, SafetyState::NoFault);
    assert_eq!(frame.index.raw(), 1);
}

#[test]
fn divergence_mode_cross_maps() {
    let mut ic = Interceptor::new(Mode::Divergence);
    ic.sensors = Sensors(0x400, 0x420);
    ic.command(1, 0, 0, false);
    ic.command(2, 0x111, 0x222, true);

    assert_eq!(ic.main_loop(), (0x222, 0x111));

    // Sensors disagree, fall back to them even without a fault
    ic.sensors = Sensors(0x000, 0xA00);
    assert_eq!(ic.main_loop(), (0x000, 0xA00));
    assert_eq!(ic.cells.state(), SafetyState::NoFault);
}

#[test]
fn corrupted_frame_removes_authority() {
    let mut ic = Interceptor::new(Mode::Direct);
    ic.sensors = Sensors(10, 10);
    ic.command(1, 0, 0, false);
    ic.command(2, 500, 500, true);
    assert_eq!(ic.main_loop(), (500, 500));

    let mut frame = CommandFrame {
        setpoints: Pair::new(900, 900),
        enable: true,
        index: SequenceIndex::new(3),
    }
    .encode(&CRC8_1D);
    frame[2] ^= 0x40;
    let verdict = ic.receive(&frame).unwrap();

    assert!(matches!(verdict, Verdict::Rejected(_)));
    assert_eq!(ic.cells.state(), SafetyState::BadChecksumFault);
    assert_eq!(ic.cells.setpoints(), Pair::new(500, 500));
    assert_eq!(ic.main_loop(), (10, 10));
}

#[test]
fn bus_error_is_last_write() {
    let mut ic = Interceptor::new(Mode::Direct);
    ic.command(1, 0, 0, false);
    ic.cells.raise(Event::BusError);
    assert_eq!(ic.cells.state(), SafetyState::BusErrorFault);

    // A clean disable is the way back
    ic.command(2, 0, 0, false);
    assert_eq!(ic.cells.state(), SafetyState::NoFault);
}

#[test]
fn boot_request_bypasses_validator() {
    let mut ic = Interceptor::new(Mode::Divergence);
    assert_eq!(ic.receive(&hex!("CEFAADDE 1E0BB002")), None);
    assert_eq!(ic.cells.state(), SafetyState::StartupFault);

    // Unknown suffix goes on to validation and fails the checksum
    let verdict = ic.receive(&hex!("CEFAADDE 00000000"));
    assert!(matches!(verdict, Some(Verdict::Rejected(_))));
}

#[test]
fn watchdog_fed_every_iteration() {
    let mut ic = Interceptor::new(Mode::Divergence);
    for n in 1..=10 {
        ic.main_loop();
        assert_eq!(ic.dog.0, n);
    }
}
