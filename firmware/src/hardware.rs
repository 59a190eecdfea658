// "Board level" hardware abstractions, ie pin assignments, etc.

use can_bit_timings;
use cortex_m::delay::Delay;
use defmt::info;
use fdcan::ConfigMode;
use fdcan::FdCan;
use fugit::{ExtU32, RateExtU32};
use hal::adc::config::AdcConfig;
use hal::adc::{Adc, AdcClaim, ClockSource, Configured};
use hal::dac::{Dac1Ch1, Dac1Ch2, DacExt, Enabled, M_EXT_PIN};
use hal::gpio::gpioa;
use hal::gpio::gpiob;
use hal::gpio::Analog;
use hal::gpio::Output;
use hal::gpio::PushPull;
use hal::independent_watchdog::IndependentWatchdog;
use hal::timer::{CountDownTimer, Event, Timer};
use inverted_pin::InvertedPin;
use interceptor_core::config::TICK_RATE_HZ;
use stm32g4xx_hal as hal;
use stm32g4xx_hal::can::CanExt;
use stm32g4xx_hal::gpio::GpioExt;
use stm32g4xx_hal::gpio::Speed;
use stm32g4xx_hal::hal::digital::v2::OutputPin;
use stm32g4xx_hal::pwr::PwrExt;
use stm32g4xx_hal::rcc;
use stm32g4xx_hal::rcc::{PllConfig, RccExt};
use stm32g4xx_hal::stm32;

// Type aliases for hardware peripherals
pub type PCAN = hal::can::Can<hal::stm32::FDCAN1>;

pub type PedalAdc = Adc<stm32::ADC1, Configured>;

pub type DacA = Dac1Ch1<M_EXT_PIN, Enabled>;

pub type DacB = Dac1Ch2<M_EXT_PIN, Enabled>;

pub type ControlTimer = CountDownTimer<stm32::TIM3>;

pub type Watchdog = IndependentWatchdog;

// Type aliases for I/O pins

// Pedal position sensors
pub type PedalSensorA = gpioa::PA0<Analog>;

pub type PedalSensorB = gpioa::PA1<Analog>;

// Relay driver is low side, pin low closes the relay (connects the override path)
pub type RelayOutput = InvertedPin<gpiob::PB0<Output<PushPull>>>;

pub type LEDStatusOutput = gpiob::PB10<Output<PushPull>>;

// Struct to encompass all the board resources, as their functions
pub struct Board {
    pub pcan_config: FdCan<PCAN, ConfigMode>,
    pub can_timing_500kbps: can_bit_timings::CanBitTiming,
    pub adc: PedalAdc,
    pub sensor_a: PedalSensorA,
    pub sensor_b: PedalSensorB,
    pub dac_a: DacA,
    pub dac_b: DacB,
    pub relay: RelayOutput,
    pub led_status: LEDStatusOutput,
    pub watchdog: Watchdog,
    pub control_timer: ControlTimer,
}

// Systick Based Timer
pub const MONOTONIC_FREQUENCY: u32 = 1_000;
rtic_monotonics::systick_monotonic!(Mono, MONOTONIC_FREQUENCY);

// Watchdog period. The main loop feeds it on every pass, so this only
// needs to cover the longest burst of interrupts the loop can be starved by.
const WATCHDOG_TIMEOUT_MS: u32 = 50;

// Hardware init function
pub fn init(core: cortex_m::Peripherals, dp: stm32::Peripherals) -> Board {
    info!("hardware init");

    let rcc = dp.RCC.constrain();

    // Sysclock is based on PLL_R
    let pll_config = PllConfig {
        mux: rcc::PllSrc::HSE(24_u32.MHz()), // Nucleo board X3 OSC
        n: rcc::PllNMul::MUL_32,
        m: rcc::PllMDiv::DIV_3,       // f(vco) = 24MHz*32/3 = 256MHz
        r: Some(rcc::PllRDiv::DIV_2), // f(sysclock) = 256MHz/2 = 128MHz
        q: None,
        p: None,
    };

    let clock_config = rcc::Config::default()
        .pll_cfg(pll_config)
        .clock_src(rcc::SysClockSrc::PLL)
        .ahb_psc(rcc::Prescaler::NotDivided)
        .apb1_psc(rcc::Prescaler::Div2)
        .apb2_psc(rcc::Prescaler::Div2);

    let pwr = dp.PWR.constrain().freeze();
    let mut rcc = rcc.freeze(clock_config, pwr);

    // After clock configuration, the following should be true:
    // Sysclock is 128MHz
    // AHB clock is 128MHz
    // APB1 clock is 64MHz
    // APB2 clock is 64MHz

    unsafe {
        let flash = &(*stm32::FLASH::ptr());
        flash.acr.modify(|_, w| {
            w.latency().bits(0b1000) // 8 wait states
        });
    }

    // Borrow SysTick as a blocking delay for ADC & DAC calibration, then
    // hand it over to the monotonic
    let mut delay = Delay::new(core.SYST, rcc.clocks.sys_clk.to_Hz());

    let gpioa = dp.GPIOA.split(&mut rcc);
    let gpiob = dp.GPIOB.split(&mut rcc);

    assert!(rcc.clocks.apb1_clk.to_MHz() == 64); // Macro requires literal
    let can_timing_500kbps = can_bit_timings::can_timings!(64.mhz(), 500.khz());

    // CAN1
    let can1_config = {
        let rx = gpioa.pa11.into_alternate().set_speed(Speed::VeryHigh);
        let tx = gpioa.pa12.into_alternate().set_speed(Speed::VeryHigh);
        dp.FDCAN1.fdcan(tx, rx, &rcc)
    };

    // Pedal sensor inputs, both on ADC1 (IN1, IN2)
    let sensor_a = gpioa.pa0.into_analog();
    let sensor_b = gpioa.pa1.into_analog();
    let adc = dp.ADC1.claim_and_configure(
        ClockSource::SystemClock,
        &rcc,
        AdcConfig::default(),
        &mut delay,
        false,
    );

    // Actuator outputs, DAC1 OUT1 & OUT2 with buffers
    let (dac1ch1, dac1ch2) = dp.DAC1.constrain((gpioa.pa4, gpioa.pa5), &mut rcc);
    let dac_a = dac1ch1.calibrate_buffer(&mut delay).enable();
    let dac_b = dac1ch2.calibrate_buffer(&mut delay).enable();

    // RELAY => override path relay, starts open (pin high)
    let mut relay_pin = gpiob.pb0.into_push_pull_output();
    relay_pin.set_high().unwrap();
    let relay = InvertedPin::new(relay_pin);

    // LED 1 - status, toggled from the control tick
    let led_status = gpiob.pb10.into_push_pull_output();

    // Fixed-rate control tick
    let mut control_timer = Timer::new(dp.TIM3, &rcc.clocks).start_count_down(TICK_RATE_HZ.Hz());
    control_timer.listen(Event::TimeOut);

    let mut watchdog = IndependentWatchdog::new(dp.IWDG);
    watchdog.start(WATCHDOG_TIMEOUT_MS.millis());

    Mono::start(delay.free(), rcc.clocks.sys_clk.to_Hz());

    Board {
        pcan_config: can1_config,
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
    }
}
