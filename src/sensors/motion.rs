//! PIR motion sensor (HC-SR501).
//!
//! Output is high for as long as the PIR's retrigger window keeps it
//! high.  Purely digital, edge-latched through [`EdgeSensor`].

use crate::app::ports::{GpioPort, Pin};
use crate::sensors::{EdgeSensor, LatchState};

pub struct MotionSensor<G: GpioPort> {
    sensor: EdgeSensor<G>,
}

impl<G: GpioPort> MotionSensor<G> {
    pub fn new(gpio: G, pin: Pin) -> Self {
        Self {
            sensor: EdgeSensor::new(gpio, pin, "motion"),
        }
    }

    pub fn enable_detection(&mut self) {
        self.sensor.enable_detection();
    }

    pub fn disable_detection(&mut self) {
        self.sensor.disable_detection();
    }

    pub fn is_motion_detected(&mut self) -> bool {
        self.sensor.poll_detected()
    }

    pub fn is_motion_ended(&mut self) -> bool {
        self.sensor.poll_ended()
    }

    pub fn latch_state(&self) -> LatchState {
        self.sensor.latch_state()
    }

    pub fn sensor(&self) -> &EdgeSensor<G> {
        &self.sensor
    }
}
