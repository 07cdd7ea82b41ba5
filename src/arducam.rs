//! ArduCAM-style SPI camera: an OV2640 sensor configured over I2C (SCCB)
//! feeding a frame FIFO that is drained over SPI.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use embedded_hal::spi::{Operation, SpiDevice};

use crate::camera::{Camera, CameraConfig, GrabMode};
use crate::config::CAPTURE_TIMEOUT_MS;
use crate::error::CameraError;
use crate::frame::{PixelFormat, RawFrame};

// ArduChip registers
const REG_TEST: u8 = 0x00;
const REG_FIFO: u8 = 0x04;
const REG_STATUS: u8 = 0x41;
const REG_FIFO_SIZE: [u8; 3] = [0x42, 0x43, 0x44];
const BURST_FIFO_READ: u8 = 0x3C;
const WRITE_FLAG: u8 = 0x80;

const FIFO_CLEAR: u8 = 0x01;
const FIFO_START: u8 = 0x02;
const CAPTURE_DONE: u8 = 0x08;
const TEST_PATTERN: u8 = 0x55;

// OV2640 over SCCB
const SENSOR_ADDR: u8 = 0x30;
const BANK_SELECT: u8 = 0xFF;
const BANK_DSP: u8 = 0x00;
const BANK_SENSOR: u8 = 0x01;
const COM7: u8 = 0x12;
const COM7_RESET: u8 = 0x80;
const PID: u8 = 0x0A;
const VER: u8 = 0x0B;
const SENSOR_PID: u8 = 0x26;

// DSP bank
const R_BYPASS: u8 = 0x05;
const IMAGE_MODE: u8 = 0xDA;
const IMAGE_MODE_RGB565: u8 = 0x08;
const ZMOW: u8 = 0x5A;
const ZMOH: u8 = 0x5B;
const ZMHH: u8 = 0x5C;
const DSP_RESET: u8 = 0xE0;

/// Samples pulled from the FIFO per SPI burst
const BURST_SAMPLES: usize = 32;

fn spi_err<E: embedded_hal::spi::Error>(e: E) -> CameraError {
    CameraError::Spi(e.kind())
}

fn i2c_err<E: embedded_hal::i2c::Error>(e: E) -> CameraError {
    CameraError::I2c(e.kind())
}

pub struct ArduCam<SPI, I2C, D> {
    spi: SPI,
    i2c: I2C,
    delay: D,
    buffer: Option<&'static mut [u16]>,
    config: CameraConfig,
}

impl<SPI, I2C, D> ArduCam<SPI, I2C, D>
where
    SPI: SpiDevice,
    I2C: I2c,
    D: DelayNs,
{
    /// param spi: chip-selected SPI link to the ArduChip
    /// param i2c: SCCB link to the sensor
    /// param delay: delay used while resetting and polling
    /// param buffer: the single frame buffer, lent out on every capture
    pub fn new(spi: SPI, i2c: I2C, delay: D, buffer: &'static mut [u16]) -> Self {
        ArduCam {
            spi,
            i2c,
            delay,
            buffer: Some(buffer),
            config: CameraConfig::default(),
        }
    }

    fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), CameraError> {
        self.spi.write(&[addr | WRITE_FLAG, value]).map_err(spi_err)
    }

    fn read_reg(&mut self, addr: u8) -> Result<u8, CameraError> {
        let mut value = [0u8];
        self.spi
            .transaction(&mut [
                Operation::Write(&[addr & !WRITE_FLAG]),
                Operation::Read(&mut value),
            ])
            .map_err(spi_err)?;
        Ok(value[0])
    }

    fn write_sensor(&mut self, reg: u8, value: u8) -> Result<(), CameraError> {
        self.i2c.write(SENSOR_ADDR, &[reg, value]).map_err(i2c_err)
    }

    fn read_sensor(&mut self, reg: u8) -> Result<u8, CameraError> {
        let mut value = [0u8];
        self.i2c
            .write_read(SENSOR_ADDR, &[reg], &mut value)
            .map_err(i2c_err)?;
        Ok(value[0])
    }

    fn check_sensor(&mut self) -> Result<(), CameraError> {
        self.write_sensor(BANK_SELECT, BANK_SENSOR)?;
        let pid = self.read_sensor(PID)?;
        let ver = self.read_sensor(VER)?;
        let id = u16::from_be_bytes([pid, ver]);
        info!("Camera sensor id {}", id);
        if pid != SENSOR_PID {
            return Err(CameraError::SensorId { id });
        }
        Ok(())
    }

    fn configure_output(&mut self, config: &CameraConfig) -> Result<(), CameraError> {
        let out_w = config.width / 4;
        let out_h = config.height / 4;
        let regs = [
            (BANK_SELECT, BANK_DSP),
            (R_BYPASS, 0x01),
            (DSP_RESET, 0x04),
            (IMAGE_MODE, IMAGE_MODE_RGB565),
            (ZMOW, out_w as u8),
            (ZMOH, out_h as u8),
            (ZMHH, (((out_w >> 8) & 0x03) | (((out_h >> 8) & 0x01) << 2)) as u8),
            (DSP_RESET, 0x00),
            (R_BYPASS, 0x00),
        ];
        for (reg, value) in regs {
            self.write_sensor(reg, value)?;
        }
        Ok(())
    }

    fn fifo_len(&mut self) -> Result<usize, CameraError> {
        let b0 = self.read_reg(REG_FIFO_SIZE[0])?;
        let b1 = self.read_reg(REG_FIFO_SIZE[1])?;
        let b2 = self.read_reg(REG_FIFO_SIZE[2])? & 0x7F;
        Ok(usize::from(b0) | usize::from(b1) << 8 | usize::from(b2) << 16)
    }

    /// Runs one capture and drains the FIFO into `samples`
    fn grab(&mut self, samples: &mut [u16]) -> Result<(), CameraError> {
        self.write_reg(REG_FIFO, FIFO_CLEAR)?;
        self.write_reg(REG_FIFO, FIFO_START)?;

        let mut waited_ms = 0;
        while self.read_reg(REG_STATUS)? & CAPTURE_DONE == 0 {
            if waited_ms >= CAPTURE_TIMEOUT_MS {
                return Err(CameraError::CaptureTimeout);
            }
            self.delay.delay_ms(1);
            waited_ms += 1;
        }

        let expected = samples.len() * 2;
        let actual = self.fifo_len()?;
        if actual < expected {
            return Err(CameraError::ShortFrame { expected, actual });
        }

        let mut bytes = [0u8; BURST_SAMPLES * 2];
        for chunk in samples.chunks_mut(BURST_SAMPLES) {
            let bytes = &mut bytes[..chunk.len() * 2];
            self.spi
                .transaction(&mut [
                    Operation::Write(&[BURST_FIFO_READ]),
                    Operation::Read(&mut *bytes),
                ])
                .map_err(spi_err)?;
            // Keep the camera's byte order; the pixel converter undoes it
            for (sample, pair) in chunk.iter_mut().zip(bytes.chunks_exact(2)) {
                *sample = u16::from_le_bytes([pair[0], pair[1]]);
            }
        }

        self.write_reg(REG_FIFO, FIFO_CLEAR)
    }
}

impl<SPI, I2C, D> Camera for ArduCam<SPI, I2C, D>
where
    SPI: SpiDevice,
    I2C: I2c,
    D: DelayNs,
{
    fn init(&mut self, config: &CameraConfig) -> Result<(), CameraError> {
        let capacity = self.buffer.as_ref().map_or(0, |b| b.len());
        if config.format != PixelFormat::Rgb565
            || config.fb_count != 1
            || config.grab_mode != GrabMode::WhenEmpty
            || config.width * config.height > capacity
            || config.width % 4 != 0
            || config.height % 4 != 0
        {
            return Err(CameraError::UnsupportedConfig);
        }

        self.write_reg(REG_TEST, TEST_PATTERN)?;
        let read = self.read_reg(REG_TEST)?;
        if read != TEST_PATTERN {
            return Err(CameraError::LinkTest { read });
        }

        self.write_sensor(BANK_SELECT, BANK_SENSOR)?;
        self.write_sensor(COM7, COM7_RESET)?;
        self.delay.delay_ms(100);
        self.check_sensor()?;
        self.configure_output(config)?;

        self.write_reg(REG_FIFO, FIFO_CLEAR)?;
        self.config = *config;
        Ok(())
    }

    fn capture_frame(&mut self) -> Option<RawFrame> {
        let Some(buf) = self.buffer.take() else {
            warn!("Frame buffer is still lent out");
            return None;
        };

        let len = self.config.width * self.config.height;
        if len > buf.len() {
            warn!("Frame buffer too small for {} samples", len);
            self.buffer = Some(buf);
            return None;
        }
        match self.grab(&mut buf[..len]) {
            Ok(()) => Some(RawFrame {
                width: self.config.width,
                height: self.config.height,
                format: self.config.format,
                buf,
            }),
            Err(e) => {
                warn!("Frame grab failed: {}", e);
                self.buffer = Some(buf);
                None
            }
        }
    }

    fn release_frame(&mut self, frame: RawFrame) {
        self.buffer = Some(frame.buf);
    }
}
