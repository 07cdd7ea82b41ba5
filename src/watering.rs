use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin};

use crate::classify::ClassLabel;
use crate::error::PumpError;

/// How long the pump runs for each species, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WateringPlan {
    pub daisy_ms: u32,
    pub dandelion_ms: u32,
    pub rose_ms: u32,
    pub sunflower_ms: u32,
    pub tulip_ms: u32,
}

impl WateringPlan {
    pub const DEFAULT: WateringPlan = WateringPlan {
        daisy_ms: 8_000,
        dandelion_ms: 5_000,
        rose_ms: 15_000,
        sunflower_ms: 10_000,
        tulip_ms: 10_000,
    };

    pub fn duration_ms(&self, label: ClassLabel) -> u32 {
        match label {
            ClassLabel::Daisy => self.daisy_ms,
            ClassLabel::Dandelion => self.dandelion_ms,
            ClassLabel::Rose => self.rose_ms,
            ClassLabel::Sunflower => self.sunflower_ms,
            ClassLabel::Tulip => self.tulip_ms,
        }
    }
}

impl Default for WateringPlan {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pump relay output with its wiring polarity.
pub struct Pump<P> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> Pump<P> {
    /// Wraps the relay pin and switches it off right away
    /// param pin: relay output
    /// param active_low: if a low level turns the pump on
    pub fn new(pin: P, active_low: bool) -> Result<Self, PumpError> {
        let mut pump = Pump { pin, active_low };
        pump.set(false)?;
        Ok(pump)
    }

    fn set(&mut self, on: bool) -> Result<(), PumpError> {
        let result = if on != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|e| PumpError::Pin(e.kind()))
    }

    /// Runs the pump for the planned duration of a species
    /// Blocks for the whole run; nothing else is serviced meanwhile.
    /// param label: detected species
    /// param plan: durations per species
    /// param delay: blocking delay provider
    /// returns the duration the pump ran, in milliseconds
    pub fn water<D: DelayNs>(
        &mut self,
        label: ClassLabel,
        plan: &WateringPlan,
        delay: &mut D,
    ) -> Result<u32, PumpError> {
        let duration_ms = plan.duration_ms(label);
        info!(
            "Watering {} for {} seconds ({} ms)",
            label.name(),
            duration_ms / 1000,
            duration_ms
        );

        if let Err(e) = self.set(true) {
            // Never leave a half-switched relay behind
            let _ = self.set(false);
            return Err(e);
        }
        delay.delay_ms(duration_ms);
        self.set(false)?;

        info!("Done watering.");
        Ok(duration_ms)
    }

    pub fn release(self) -> P {
        self.pin
    }
}
