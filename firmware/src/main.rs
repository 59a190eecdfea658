#![no_main]
#![no_std]

use defmt_brtt as _; // global logger

use hardware::Mono;
use panic_probe as _;

use stm32g4xx_hal as _; // memory layout

use rtic_monotonics::Monotonic;

use interceptor_core::crc::CRC8_1D;
use interceptor_core::validator::CommandValidator;
use interceptor_core::{Config, Mode, SharedCells};

mod analog;
mod boot;
mod can;
mod hardware;

#[cfg(feature = "direct-blend")]
const MODE: Mode = Mode::Direct;
#[cfg(not(feature = "direct-blend"))]
const MODE: Mode = Mode::Divergence;

static CONFIG: Config = Config::new(MODE);

// State shared between the CAN IRQ, the control tick and the main loop
static CELLS: SharedCells = SharedCells::new();

static VALIDATOR: CommandValidator = CommandValidator::new(&CRC8_1D);

#[rtic::app(
    device = stm32g4xx_hal::stm32,
    dispatchers = [USBWAKEUP, COMP1_2_3]
)]
mod app {
    use crate::analog;
    use crate::can;
    use crate::hardware;
    use crate::hardware::Mono;
    use crate::{CELLS, CONFIG, VALIDATOR};
    use fugit::ExtU32;
    use interceptor_core::config::CAN_BITRATE;
    use interceptor_core::monitor::TimeoutMonitor;
    use interceptor_core::pedal::PedalLoop;
    use interceptor_core::relay::Relay;
    use interceptor_core::telemetry::Telemetry;
    use interceptor_core::Event;
    use rtic_monotonics::Monotonic;
    use stm32g4xx_hal::timer::Event as TimerEvent;

    #[shared]
    struct Shared {
        relay: Relay<hardware::RelayOutput>,
        can_tx: can::Tx,
    }

    #[local]
    struct Local {
        can_control: can::Control,
        can_rx: can::Rx,
        telemetry: Telemetry<hardware::LEDStatusOutput>,
        monitor: TimeoutMonitor,
        control_timer: hardware::ControlTimer,
        pedal: PedalLoop,
        sensors: analog::Sensors,
        actuator: analog::Actuator,
        watchdog: hardware::Watchdog,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        defmt::info!("init");

        let hardware::Board {
            pcan_config,
            can_timing_500kbps,
            adc,
            sensor_a,
            sensor_b,
            dac_a,
            dac_b,
            relay,
            led_status,
            watchdog,
            control_timer,
        } = hardware::init(cx.core, cx.device);

        let (can_control, can_rx, can_tx) = can::init(pcan_config, &can_timing_500kbps);

        defmt::info!(
            "{:?} mode, commands on {=u16:#x} telemetry on {=u16:#x} at {} bit/s",
            CONFIG.mode,
            CONFIG.command_id.as_raw(),
            CONFIG.telemetry_id.as_raw(),
            CAN_BITRATE,
        );

        log_info::spawn().unwrap();

        (
            Shared {
                relay: Relay::new(relay),
                can_tx,
            },
            Local {
                can_control,
                can_rx,
                telemetry: Telemetry::new(CONFIG.telemetry_id, &crate::CRC8_1D, led_status),
                monitor: TimeoutMonitor::new(CONFIG.timeout_ticks),
                control_timer,
                pedal: PedalLoop::new(CONFIG.blend),
                sensors: analog::Sensors::new(adc, sensor_a, sensor_b),
                actuator: analog::Actuator::new(dac_a, dac_b),
                watchdog,
            },
        )
    }

    // Free running pedal loop, everything else preempts it
    #[idle(local = [pedal, sensors, actuator, watchdog])]
    fn idle(cx: idle::Context) -> ! {
        let idle::LocalResources {
            pedal,
            sensors,
            actuator,
            watchdog,
            ..
        } = cx.local;
        loop {
            pedal.step(&CELLS, sensors, actuator, watchdog);
        }
    }

    // FDCAN_INTR0_IT and FDCAN_INTR1_IT are swapped, until stm32g4 crate
    // updates to include https://github.com/stm32-rs/stm32-rs/pull/996
    #[task(binds = FDCAN1_INTR1_IT, shared = [relay, can_tx], local = [can_control, can_rx], priority = 3)]
    fn can_irq(cx: can_irq::Context) {
        let mut relay = cx.shared.relay;
        let mut can_tx = cx.shared.can_tx;
        let control = cx.local.can_control;

        if control.take_bus_errors() {
            // Relay is left alone, the command timeout takes care of it if
            // the bus stays down
            CELLS.raise(Event::BusError);
            can_tx.lock(|tx| tx.abort_pending());
        }

        if control.take_rx_pending() {
            cx.local.can_rx.drain(|id, data| {
                if id != CONFIG.command_id.as_raw() {
                    return;
                }
                if let Some(mode) = interceptor_core::boot::detect(data) {
                    crate::boot::reset_into(mode);
                }
                let verdict = relay.lock(|relay| VALIDATOR.on_frame(data, &CELLS, relay));
                defmt::trace!("Command {:?}", verdict);
            });
        }
    }

    #[task(binds = TIM3, shared = [relay, can_tx], local = [control_timer, telemetry, monitor], priority = 2)]
    fn control_tick(cx: control_tick::Context) {
        let mut relay = cx.shared.relay;
        let mut can_tx = cx.shared.can_tx;
        cx.local.control_timer.clear_interrupt(TimerEvent::TimeOut);

        can_tx.lock(|tx| cx.local.telemetry.tick(&CELLS, tx));
        relay.lock(|relay| cx.local.monitor.tick(&CELLS, relay));
    }

    #[task(shared = [relay], priority = 1)]
    async fn log_info(mut cx: log_info::Context) {
        loop {
            Mono::delay(2.secs()).await;

            let relay_closed = cx.shared.relay.lock(|relay| relay.is_closed());
            let setpoints = CELLS.setpoints();
            let sensors = CELLS.sensors();
            defmt::info!(
                "State: {:?} Relay: {} Cmd: {:#x}/{:#x} Sensor: {:#x}/{:#x} Seq: {:?} Timeout: {}",
                CELLS.state(),
                if relay_closed { "closed" } else { "open" },
                setpoints.a,
                setpoints.b,
                sensors.a,
                sensors.b,
                CELLS.sequence(),
                CELLS.timeout_ticks(),
            );
        }
    }
}

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}

defmt::timestamp!("{=u32}", { Mono::now().ticks() });
