//! STTS22H digital temperature sensor.
//!
//! The device free-runs at 1 Hz once configured; every reading waits for the
//! busy flag to clear and then fetches the two temperature bytes.

use crate::bus::RegisterBus;
use spectrum_core::{Result, Sampler, SpectrumError};
use std::time::Duration;
use tracing::{debug, trace};

/// Default 7-bit bus address.
pub const DEVICE_ADDRESS: u16 = 0x3C;

pub const CTRL: u8 = 0x04;
pub const STATUS: u8 = 0x05;
pub const TEMP_L_OUT: u8 = 0x06;
pub const TEMP_H_OUT: u8 = 0x07;

/// `CTRL` bit 0: one-shot acquisition.
pub const CTRL_ONE_SHOT: u8 = 0x01;
/// `CTRL` bit 3: register address auto-increment.
pub const CTRL_IF_ADD_INC: u8 = 0x08;
/// `CTRL` bit 7: continuous 1 Hz conversion.
pub const CTRL_FREERUN_1HZ: u8 = 0x80;
/// `STATUS` bit 0: conversion in progress.
pub const STATUS_BUSY: u8 = 0x01;

/// Time allowed for the device to reach power-down.
const POWER_DOWN_SETTLE: Duration = Duration::from_millis(1);

/// Bounds the busy-flag wait for a single reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub max_polls: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_polls: 1000,
            interval: Duration::from_millis(10),
        }
    }
}

#[derive(Debug)]
pub struct Stts22h<B> {
    bus: B,
    poll: PollPolicy,
}

impl<B: RegisterBus> Stts22h<B> {
    pub fn new(bus: B, poll: PollPolicy) -> Self {
        Self { bus, poll }
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Power down, then enable 1 Hz free-run and address auto-increment.
    pub fn configure(&mut self) -> Result<()> {
        self.bus.modify_register(CTRL, 0, CTRL_ONE_SHOT)?;
        std::thread::sleep(POWER_DOWN_SETTLE);
        self.bus.modify_register(CTRL, CTRL_FREERUN_1HZ, 0)?;
        let ctrl = self.bus.modify_register(CTRL, CTRL_IF_ADD_INC, 0)?;
        debug!("STTS22H configured, CTRL={ctrl:#04x}");
        Ok(())
    }

    fn wait_ready(&mut self) -> Result<()> {
        for attempt in 1..=self.poll.max_polls {
            let status = self.bus.read_register(STATUS)?;
            if status & STATUS_BUSY == 0 {
                trace!(attempt, "STTS22H ready");
                return Ok(());
            }
            if !self.poll.interval.is_zero() {
                std::thread::sleep(self.poll.interval);
            }
        }
        Err(SpectrumError::DeviceTimeout {
            attempts: self.poll.max_polls,
        })
    }

    /// Wait for a finished conversion and return it in °C.
    pub fn read_celsius(&mut self) -> Result<f64> {
        self.wait_ready()?;
        let mut raw = [0u8; 2];
        self.bus.read_registers(TEMP_L_OUT, &mut raw)?;
        Ok(convert_raw(u16::from_le_bytes(raw)))
    }
}

impl<B: RegisterBus> Sampler for Stts22h<B> {
    fn name(&self) -> &str {
        "stts22h"
    }

    fn prepare(&mut self) -> Result<()> {
        self.configure()
    }

    fn read(&mut self) -> Result<f64> {
        self.read_celsius()
    }
}

/// Two's-complement register value in hundredths of a degree to °C.
pub fn convert_raw(raw: u16) -> f64 {
    f64::from(raw as i16) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory device: reports busy for the first `busy_polls` status reads.
    #[derive(Debug, Default)]
    struct FakeBus {
        regs: [u8; 8],
        busy_polls: u32,
        status_reads: u32,
        writes: Vec<(u8, u8)>,
        broken: bool,
    }

    impl RegisterBus for FakeBus {
        fn read_register(&mut self, reg: u8) -> Result<u8> {
            if self.broken {
                return Err(SpectrumError::Bus("arbitration lost".into()));
            }
            if reg == STATUS {
                self.status_reads += 1;
                if self.busy_polls > 0 {
                    self.busy_polls -= 1;
                    return Ok(self.regs[STATUS as usize] | STATUS_BUSY);
                }
                return Ok(self.regs[STATUS as usize] & !STATUS_BUSY);
            }
            Ok(self.regs[reg as usize])
        }

        fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
            self.writes.push((reg, value));
            self.regs[reg as usize] = value;
            Ok(())
        }

        fn read_registers(&mut self, start: u8, buf: &mut [u8]) -> Result<()> {
            let start = start as usize;
            buf.copy_from_slice(&self.regs[start..start + buf.len()]);
            Ok(())
        }
    }

    fn quick_poll(max_polls: u32) -> PollPolicy {
        PollPolicy {
            max_polls,
            interval: Duration::ZERO,
        }
    }

    fn with_temperature(raw: u16) -> FakeBus {
        let mut bus = FakeBus::default();
        let [lo, hi] = raw.to_le_bytes();
        bus.regs[TEMP_L_OUT as usize] = lo;
        bus.regs[TEMP_H_OUT as usize] = hi;
        bus
    }

    #[test]
    fn converts_signed_hundredths() {
        assert_eq!(convert_raw(0x7FFF), 327.67);
        assert_eq!(convert_raw(0x8000), -327.68);
        assert_eq!(convert_raw(0x0000), 0.0);
        assert_eq!(convert_raw(0xFFFF), -0.01);
    }

    #[test]
    fn configure_runs_three_read_modify_writes() {
        let mut bus = FakeBus::default();
        bus.regs[CTRL as usize] = CTRL_ONE_SHOT;
        let mut sensor = Stts22h::new(bus, quick_poll(1));
        sensor.prepare().unwrap();
        let bus = sensor.into_inner();
        assert_eq!(bus.writes, vec![(CTRL, 0x00), (CTRL, 0x80), (CTRL, 0x88)]);
    }

    #[test]
    fn reads_after_busy_clears() {
        let mut bus = with_temperature(2100);
        bus.busy_polls = 3;
        let mut sensor = Stts22h::new(bus, quick_poll(10));
        assert_eq!(sensor.read().unwrap(), 21.0);
        assert_eq!(sensor.into_inner().status_reads, 4);
    }

    #[test]
    fn negative_temperature_reading() {
        let mut sensor = Stts22h::new(with_temperature((-550i16) as u16), quick_poll(1));
        assert_eq!(sensor.read().unwrap(), -5.5);
    }

    #[test]
    fn stuck_busy_flag_times_out() {
        let mut bus = with_temperature(2100);
        bus.busy_polls = u32::MAX;
        let mut sensor = Stts22h::new(bus, quick_poll(5));
        let err = sensor.read().unwrap_err();
        assert!(matches!(err, SpectrumError::DeviceTimeout { attempts: 5 }));
        assert_eq!(sensor.into_inner().status_reads, 5);
    }

    #[test]
    fn bus_failure_is_not_a_timeout() {
        let bus = FakeBus {
            broken: true,
            ..FakeBus::default()
        };
        let mut sensor = Stts22h::new(bus, quick_poll(5));
        let err = sensor.read().unwrap_err();
        assert!(matches!(err, SpectrumError::Bus(_)));
        assert!(err.is_transient());
    }
}
