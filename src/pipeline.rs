use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;

use crate::camera::{Camera, FrameGuard};
use crate::classify::{decide, ClassLabel, Classification};
use crate::config::CAPTURE_ATTEMPTS;
use crate::error::PipelineError;
use crate::frame::load_frame;
use crate::inference::Classifier;
use crate::timer::{Monotonic, Stopwatch};
use crate::trigger::Trigger;
use crate::watering::{Pump, WateringPlan};

/// One finished watering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Watering {
    pub label: ClassLabel,
    pub duration_ms: u32,
}

/// What a trigger's capture sequence did.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureReport {
    /// Decisions of every attempt, in order. Only the last one was acted upon.
    pub attempts: Vec<Classification, CAPTURE_ATTEMPTS>,
    pub watering: Watering,
}

/// Everything one trigger needs: camera, model, pump and the status LED.
///
/// Each `run` does `CAPTURE_ATTEMPTS` full capture/classify passes. The first
/// passes warm the sensor and model up and their results are thrown away; only
/// the final pass is logged and drives the pump.
pub struct Pipeline<C, M, P, L, T> {
    camera: C,
    classifier: M,
    pump: Pump<P>,
    status: L,
    clock: T,
    plan: WateringPlan,
}

impl<C, M, P, L, T> Pipeline<C, M, P, L, T>
where
    C: Camera,
    M: Classifier,
    P: OutputPin,
    L: OutputPin,
    T: Monotonic,
{
    /// param camera: initialised camera
    /// param classifier: flower model, owner of the input and output tensors
    /// param pump: pump relay
    /// param status: LED lit while a sequence runs
    /// param clock: time source for stage timing
    /// param plan: watering durations per species
    pub fn new(
        camera: C,
        classifier: M,
        pump: Pump<P>,
        status: L,
        clock: T,
        plan: WateringPlan,
    ) -> Self {
        Pipeline {
            camera,
            classifier,
            pump,
            status,
            clock,
            plan,
        }
    }

    // LED failures are logged, never fatal
    fn set_status(&mut self, busy: bool) {
        let result = if busy {
            self.status.set_high()
        } else {
            self.status.set_low()
        };
        if result.is_err() {
            warn!("Status LED write failed");
        }
    }

    /// One main loop tick: polls the trigger and runs a sequence on a press
    /// param trigger: debounced button
    /// param delay: blocking delay for debouncing and watering
    /// returns the sequence outcome, or None if nothing was triggered
    pub fn service<I, D>(
        &mut self,
        trigger: &mut Trigger<I>,
        delay: &mut D,
    ) -> Option<Result<CaptureReport, PipelineError>>
    where
        I: InputPin,
        D: DelayNs,
    {
        match trigger.poll(delay) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(_) => {
                warn!("Trigger pin read failed");
                return None;
            }
        }

        info!("Button pressed. Capturing image...");
        let result = self.run(delay);
        match &result {
            Ok(report) => debug!(
                "Sequence done: {} attempts, watered {} ms",
                report.attempts.len(),
                report.watering.duration_ms
            ),
            Err(e) => warn!("Capture sequence aborted: {}", e),
        }
        Some(result)
    }

    /// Runs the full capture sequence for one trigger
    /// Blocks until the pump has finished.
    /// param delay: blocking delay used for the watering run
    /// returns the per-attempt decisions and the watering that was done
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> Result<CaptureReport, PipelineError> {
        self.set_status(true);
        let result = self.run_attempts(delay);
        self.set_status(false);
        result
    }

    fn run_attempts<D: DelayNs>(&mut self, delay: &mut D) -> Result<CaptureReport, PipelineError> {
        let mut attempts: Vec<Classification, CAPTURE_ATTEMPTS> = Vec::new();
        for attempt in 1..=CAPTURE_ATTEMPTS {
            let decision = self.classify_once(attempt)?;
            // Capacity equals the attempt count
            let _ = attempts.push(decision);
        }

        let Some(&last) = attempts.last() else {
            return Err(PipelineError::Capture);
        };
        info!(
            "Prediction: {} with probability: {}",
            last.label.name(),
            last.confidence
        );

        let duration_ms = self.pump.water(last.label, &self.plan, delay)?;
        Ok(CaptureReport {
            attempts,
            watering: Watering {
                label: last.label,
                duration_ms,
            },
        })
    }

    /// Capture, preprocess, infer and decide once.
    /// The frame goes back to the camera when this returns, on every path.
    fn classify_once(&mut self, attempt: usize) -> Result<Classification, PipelineError> {
        let Some(guard) = FrameGuard::capture(&mut self.camera) else {
            error!("Camera capture failed");
            return Err(PipelineError::Capture);
        };

        let watch = Stopwatch::start(&self.clock);
        load_frame(guard.frame(), self.classifier.input())?;
        let prep_ms = watch.elapsed_ms(&self.clock);

        let watch = Stopwatch::start(&self.clock);
        self.classifier.predict()?;
        let infer_ms = watch.elapsed_ms(&self.clock);
        debug!(
            "Attempt {}: preprocessing {} ms, inference {} ms",
            attempt,
            prep_ms,
            infer_ms
        );

        let scores = self.classifier.output();
        for (label, score) in ClassLabel::ALL.iter().zip(scores.iter()) {
            debug!("Class {}: {}", label.name(), score);
        }
        decide(scores)
    }

    pub fn release(self) -> (C, M, Pump<P>, L, T) {
        (self.camera, self.classifier, self.pump, self.status, self.clock)
    }
}
