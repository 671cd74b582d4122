//! Weight acquisition with a hold-last-valid policy.
//!
//! A read never blocks on an unready sensor: it returns the cached value
//! instead. A fresh exact zero is only accepted while nothing non-zero has
//! been seen yet, or as the first read after a tare, so a glitching
//! converter cannot wipe a real reading.

use eyre::WrapErr;
use progressor_traits::LoadCell;
use tracing::{debug, trace};

use crate::error::Result;
use crate::hw_error::map_boxed;
use crate::state::EngineState;

pub struct SensorSource {
    cell: Box<dyn LoadCell>,
    samples_per_read: u8,
    /// Set by a successful tare; the next finite read becomes the baseline.
    rebase_pending: bool,
}

impl SensorSource {
    pub fn new(cell: Box<dyn LoadCell>, samples_per_read: u8) -> Self {
        Self {
            cell,
            samples_per_read: samples_per_read.max(1),
            rebase_pending: false,
        }
    }

    /// Current weight in kg; updates `state.last_valid_weight` only on an accepted read.
    pub fn sample_weight_kg(&mut self, state: &mut EngineState) -> f32 {
        if !self.cell.is_ready() {
            trace!(
                cached_kg = state.last_valid_weight,
                "load cell not ready; holding last value"
            );
            return state.last_valid_weight;
        }
        match self.cell.read_raw(self.samples_per_read) {
            Ok(kg) if !kg.is_finite() => {
                debug!(kg, "non-finite reading discarded");
            }
            Ok(kg) if self.rebase_pending => {
                debug!(kg, "post-tare baseline accepted");
                self.rebase_pending = false;
                state.last_valid_weight = kg;
            }
            Ok(kg) if kg == 0.0 && state.last_valid_weight != 0.0 => {
                trace!("zero glitch ignored");
            }
            Ok(kg) => state.last_valid_weight = kg,
            Err(e) => {
                debug!(error = %map_boxed(&e), "load cell read failed; holding last value");
            }
        }
        state.last_valid_weight
    }

    /// Zero the driver reference. The cache is left alone; the next finite
    /// read replaces it, zero included.
    pub fn tare(&mut self) -> Result<()> {
        self.cell
            .tare_reference()
            .map_err(|e| eyre::Report::new(map_boxed(&e)))
            .wrap_err("tare")?;
        self.rebase_pending = true;
        Ok(())
    }

    pub fn power_down(&mut self) -> Result<()> {
        self.cell
            .power_down()
            .map_err(|e| eyre::Report::new(map_boxed(&e)))
            .wrap_err("sensor power-down")
    }
}
