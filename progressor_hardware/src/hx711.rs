//! HX711 load-cell amplifier bit-banged over two GPIO lines.
use std::time::Duration;

use progressor_traits::{BoxError, LoadCell};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use tracing::{debug, trace};

use crate::error::{HwError, Result};
use crate::util::{sign_extend_24, wait_for_conversion};

/// Channel A, gain 128.
const GAIN_PULSES_A128: u8 = 1;
/// Conversions averaged when capturing the zero reference.
const TARE_SAMPLES: u8 = 8;
/// SCK held high longer than 60 µs puts the chip in power-down.
const POWER_DOWN_HOLD: Duration = Duration::from_micros(80);
const DRDY_POLL: Duration = Duration::from_micros(200);

pub struct Hx711LoadCell {
    dt: InputPin,
    sck: OutputPin,
    gain_pulses: u8,
    kg_per_count: f32,
    zero_counts: f64,
    read_timeout: Duration,
    powered_down: bool,
}

impl Hx711LoadCell {
    pub fn open(dt_pin: u8, sck_pin: u8, kg_per_count: f32, read_timeout: Duration) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let dt = gpio
            .get(dt_pin)
            .map_err(|e| HwError::Gpio(format!("open hx711 dt pin {dt_pin}: {e}")))?
            .into_input();
        let mut sck = gpio
            .get(sck_pin)
            .map_err(|e| HwError::Gpio(format!("open hx711 sck pin {sck_pin}: {e}")))?
            .into_output();
        sck.set_low(); // clock idle low
        Ok(Self {
            dt,
            sck,
            gain_pulses: GAIN_PULSES_A128,
            kg_per_count,
            zero_counts: 0.0,
            read_timeout,
            powered_down: false,
        })
    }

    fn wake(&mut self) {
        if self.powered_down {
            self.sck.set_low();
            self.powered_down = false;
            debug!("hx711 woken from power-down");
        }
    }

    fn read_counts(&mut self) -> Result<i32> {
        self.wake();
        let dt = &self.dt;
        let waited = wait_for_conversion(|| dt.is_high(), self.read_timeout, DRDY_POLL)?;
        trace!(?waited, "hx711 conversion ready");

        // Clock out 24 bits, MSB first
        let mut value: u32 = 0;
        for _ in 0..24 {
            self.sck.set_high();
            spin_delay_100ns();
            value = (value << 1) | u32::from(self.dt.is_high());
            self.sck.set_low();
            spin_delay_100ns();
        }

        // Extra pulses select gain/channel for the next conversion
        for _ in 0..self.gain_pulses {
            self.sck.set_high();
            spin_delay_100ns();
            self.sck.set_low();
            spin_delay_100ns();
        }

        let counts = sign_extend_24(value);
        trace!(raw = counts, "hx711 raw read");
        Ok(counts)
    }

    fn average_counts(&mut self, samples: u8) -> Result<f64> {
        let n = samples.max(1);
        let mut sum = 0.0f64;
        for _ in 0..n {
            sum += f64::from(self.read_counts()?);
        }
        Ok(sum / f64::from(n))
    }
}

impl LoadCell for Hx711LoadCell {
    fn is_ready(&self) -> bool {
        !self.powered_down && self.dt.is_low()
    }

    fn read_raw(&mut self, samples: u8) -> std::result::Result<f32, BoxError> {
        let avg = self.average_counts(samples)?;
        Ok(((avg - self.zero_counts) * f64::from(self.kg_per_count)) as f32)
    }

    fn tare_reference(&mut self) -> std::result::Result<(), BoxError> {
        self.zero_counts = self.average_counts(TARE_SAMPLES)?;
        debug!(zero_counts = self.zero_counts, "hx711 tared");
        Ok(())
    }

    fn power_down(&mut self) -> std::result::Result<(), BoxError> {
        self.sck.set_low();
        self.sck.set_high();
        std::thread::sleep(POWER_DOWN_HOLD);
        self.powered_down = true;
        debug!("hx711 powered down");
        Ok(())
    }
}

#[inline(always)]
fn spin_delay_100ns() {
    // A few CPU cycles; HX711 needs >= 0.1 µs per clock phase.
    std::hint::spin_loop();
}
