#![no_std]
#![no_main]

use bsp::entry;
use defmt::*;
use defmt_rtt as _;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal_bus::spi::ExclusiveDevice;
use microflow::buffer::Buffer2D;
use microflow::model;
use panic_probe as _;

// Provide an alias for our BSP so we can switch targets quickly.
use rp_pico as bsp;

use bsp::hal::{
    self,
    clocks::{init_clocks_and_plls, Clock},
    fugit::RateExtU32,
    gpio::{FunctionI2C, FunctionSpi, Pin, PullUp},
    pac,
    watchdog::Watchdog,
    Timer,
};
use flora::arducam::ArduCam;
use flora::camera::{Camera, CameraConfig};
use flora::config::{
    CLASS_COUNT, DEBOUNCE_MS, I2C_HZ, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH,
    PUMP_ACTIVE_LOW, RELEASE_POLL_MS, SPI_HZ, TRIGGER_ACTIVE_LOW,
};
use flora::error::InferenceError;
use flora::inference::{Classifier, OutputVector, PixelStage};
use flora::pipeline::Pipeline;
use flora::trigger::Trigger;
use flora::watering::{Pump, WateringPlan};

// Pre-trained flower classifier, compiled into the image
#[model("models/flower_classifier.tflite")]
struct FlowerNet;

/// Holds the staged model window and the last output between captures.
struct FlowerClassifier {
    input: PixelStage,
    output: OutputVector,
}

impl FlowerClassifier {
    const fn new() -> Self {
        FlowerClassifier {
            input: PixelStage::new(),
            output: [0.0; CLASS_COUNT],
        }
    }
}

impl Classifier for FlowerClassifier {
    type Input = PixelStage;

    fn input(&mut self) -> &mut PixelStage {
        &mut self.input
    }

    fn predict(&mut self) -> Result<(), InferenceError> {
        // microflow takes its input by value: this is the only float copy
        let image = Buffer2D::<[f32; INPUT_CHANNELS], INPUT_HEIGHT, INPUT_WIDTH>::from_fn(
            |row, col| self.input.get(row, col),
        );
        let scores = FlowerNet::predict([image]);
        for (slot, score) in self.output.iter_mut().zip(scores.iter()) {
            *slot = *score;
        }
        Ok(())
    }

    fn output(&self) -> &OutputVector {
        &self.output
    }
}

// Zero-initialised in .bss, never built on the stack
static mut CLASSIFIER: FlowerClassifier = FlowerClassifier::new();

#[entry]
fn main() -> ! {
    info!("Flora Starting");
    // Grab our singleton objects
    let mut pac = pac::Peripherals::take().unwrap();

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = Watchdog::new(pac.WATCHDOG);

    // Configure the clocks
    //
    // The default is to generate a 125 MHz system clock
    let clocks = init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    // The single-cycle I/O block controls our GPIO pins
    let sio = hal::Sio::new(pac.SIO);

    // Set the pins up according to their function on this particular board
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mut delay = Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    // Set up pump, off before anything else happens
    let pump = Pump::new(pins.gpio14.into_push_pull_output(), PUMP_ACTIVE_LOW).unwrap();

    // Set up status LED
    let mut led = pins.led.into_push_pull_output();

    // Set up trigger button
    let mut trigger = Trigger::new(
        pins.gpio15.into_pull_up_input(),
        TRIGGER_ACTIVE_LOW,
        DEBOUNCE_MS,
    );

    // Set up camera: SPI0 to the ArduChip FIFO, I2C0 to the sensor
    let spi_mosi = pins.gpio19.into_function::<FunctionSpi>();
    let spi_miso = pins.gpio16.into_function::<FunctionSpi>();
    let spi_sclk = pins.gpio18.into_function::<FunctionSpi>();
    let spi_cs = pins.gpio17.into_push_pull_output();
    let spi_bus = hal::spi::Spi::<_, _, _, 8>::new(pac.SPI0, (spi_mosi, spi_miso, spi_sclk)).init(
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
        SPI_HZ.Hz(),
        embedded_hal::spi::MODE_0,
    );
    let spi = ExclusiveDevice::new(spi_bus, spi_cs, delay).unwrap();

    let sda_pin: Pin<_, FunctionI2C, PullUp> = pins.gpio4.reconfigure();
    let scl_pin: Pin<_, FunctionI2C, PullUp> = pins.gpio5.reconfigure();
    let i2c = hal::I2C::i2c0(
        pac.I2C0,
        sda_pin,
        scl_pin,
        I2C_HZ.Hz(),
        &mut pac.RESETS,
        &clocks.system_clock,
    );

    let frame_buf = cortex_m::singleton!(: [u16; INPUT_WIDTH * INPUT_HEIGHT] = [0; INPUT_WIDTH * INPUT_HEIGHT]).unwrap();
    let mut camera = ArduCam::new(spi, i2c, delay, frame_buf);

    if let Err(e) = camera.init(&CameraConfig::default()) {
        error!("Camera init failed: {}", e);
        loop {
            led.set_high().unwrap();
            delay.delay_ms(500);
            led.set_low().unwrap();
            delay.delay_ms(1000);
        }
    }
    info!("Camera initialized successfully.");

    info!("Initializing neural network...");
    // SAFETY: the only reference to CLASSIFIER, taken once before the main loop
    let classifier = unsafe { &mut *core::ptr::addr_of_mut!(CLASSIFIER) };

    let mut pipeline = Pipeline::new(
        camera,
        classifier,
        pump,
        led,
        delay,
        WateringPlan::default(),
    );

    info!("Flora Ready");

    loop {
        // Outcomes are logged by the pipeline itself
        let _ = pipeline.service(&mut trigger, &mut delay);

        delay.delay_ms(RELEASE_POLL_MS);
    }
}
