use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum TriggerState {
    /// Waiting for a press
    Armed,
    /// Fired; waiting for the button to be let go
    Held,
}

/// Debounced push-button trigger.
///
/// A press counts once the input reads active twice, `debounce_ms` apart.
/// After firing it stays quiet until the input has been seen inactive again,
/// so holding the button down never fires twice.
pub struct Trigger<P> {
    pin: P,
    active_low: bool,
    debounce_ms: u32,
    state: TriggerState,
}

impl<P: InputPin> Trigger<P> {
    /// param pin: button input
    /// param active_low: if a pressed button reads low
    /// param debounce_ms: delay between the two confirming reads
    pub fn new(pin: P, active_low: bool, debounce_ms: u32) -> Self {
        Trigger {
            pin,
            active_low,
            debounce_ms,
            state: TriggerState::Armed,
        }
    }

    fn is_active(&mut self) -> Result<bool, P::Error> {
        if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        }
    }

    /// Samples the button once
    /// Blocks for `debounce_ms` when a possible press is seen.
    /// returns true exactly once per press
    pub fn poll<D: DelayNs>(&mut self, delay: &mut D) -> Result<bool, P::Error> {
        match self.state {
            TriggerState::Armed => {
                if !self.is_active()? {
                    return Ok(false);
                }
                delay.delay_ms(self.debounce_ms);
                if !self.is_active()? {
                    debug!("Ignoring button bounce");
                    return Ok(false);
                }
                self.state = TriggerState::Held;
                Ok(true)
            }
            TriggerState::Held => {
                if !self.is_active()? {
                    self.state = TriggerState::Armed;
                }
                Ok(false)
            }
        }
    }
}
