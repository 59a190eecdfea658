// Pedal sensor sampling and actuator drive, on ADC1 and DAC1.
use crate::hardware::{DacA, DacB, PedalAdc, PedalSensorA, PedalSensorB};
use interceptor_core::hal::{AnalogIn, AnalogOut, Channel};
use stm32g4xx_hal::adc::config::SampleTime;
use stm32g4xx_hal::dac::DacOut;

// Sensor lines are high impedance
const SAMPLE_TIME: SampleTime = SampleTime::Cycles_640_5;

pub struct Sensors {
    adc: PedalAdc,
    a: PedalSensorA,
    b: PedalSensorB,
}

impl Sensors {
    pub fn new(adc: PedalAdc, a: PedalSensorA, b: PedalSensorB) -> Self {
        Self { adc, a, b }
    }
}

impl AnalogIn for Sensors {
    fn read(&mut self, channel: Channel) -> u16 {
        match channel {
            Channel::A => self.adc.convert(&self.a, SAMPLE_TIME),
            Channel::B => self.adc.convert(&self.b, SAMPLE_TIME),
        }
    }
}

pub struct Actuator {
    a: DacA,
    b: DacB,
}

impl Actuator {
    pub fn new(a: DacA, b: DacB) -> Self {
        Self { a, b }
    }
}

impl AnalogOut for Actuator {
    fn write(&mut self, channel: Channel, value: u16) {
        match channel {
            Channel::A => self.a.set_value(value),
            Channel::B => self.b.set_value(value),
        }
    }
}
