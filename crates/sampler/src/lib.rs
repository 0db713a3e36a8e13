pub mod bus;
pub mod host;
pub mod stts22h;
pub mod synthetic;

pub use bus::{LinuxI2c, RegisterBus};
pub use host::HostSensorSampler;
pub use stts22h::{convert_raw, PollPolicy, Stts22h};
pub use synthetic::SyntheticSampler;

use spectrum_core::{Result, Sampler};
use std::time::Duration;
use tracing::{debug, warn};

/// How many readings to take and how to pace them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclePlan {
    pub cycles: u32,
    /// Blocking sleep after every reading.
    pub delay: Duration,
    /// Extra attempts per cycle when a read fails with a transient error.
    pub read_retries: u32,
}

/// Drive `sampler` for `plan.cycles` readings and return them in order.
///
/// `on_progress` is called with the 1-based cycle number and the value after
/// each cycle's delay has elapsed. Non-transient errors, or transient ones
/// that outlast the retry budget, abort the run.
pub fn run_cycles<F>(sampler: &mut dyn Sampler, plan: &CyclePlan, mut on_progress: F) -> Result<Vec<f64>>
where
    F: FnMut(u32, f64),
{
    let mut readings = Vec::with_capacity(plan.cycles as usize);

    for cycle in 1..=plan.cycles {
        let value = read_with_retry(sampler, plan.read_retries)?;
        debug!(cycle, value, "{} reading", sampler.name());
        readings.push(value);

        if !plan.delay.is_zero() {
            std::thread::sleep(plan.delay);
        }
        on_progress(cycle, value);
    }

    Ok(readings)
}

fn read_with_retry(sampler: &mut dyn Sampler, retries: u32) -> Result<f64> {
    let mut attempt = 0;
    loop {
        match sampler.read() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < retries => {
                attempt += 1;
                warn!("{} read failed: {e}; retry {attempt}/{retries}", sampler.name());
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectrum_core::SpectrumError;
    use std::collections::VecDeque;

    /// Replays a fixed script of read outcomes.
    #[derive(Debug)]
    struct Scripted {
        script: VecDeque<Result<f64>>,
        reads: u32,
    }

    impl Scripted {
        fn new(script: Vec<Result<f64>>) -> Self {
            Self {
                script: script.into(),
                reads: 0,
            }
        }
    }

    impl Sampler for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn read(&mut self) -> Result<f64> {
            self.reads += 1;
            self.script.pop_front().unwrap_or(Ok(0.0))
        }
    }

    fn plan(cycles: u32, read_retries: u32) -> CyclePlan {
        CyclePlan {
            cycles,
            delay: Duration::ZERO,
            read_retries,
        }
    }

    #[test]
    fn collects_exactly_n_readings_in_order() {
        let mut sampler = Scripted::new(vec![Ok(1.0), Ok(2.5), Ok(-3.0)]);
        let mut progress = Vec::new();
        let readings = run_cycles(&mut sampler, &plan(3, 0), |n, v| progress.push((n, v))).unwrap();
        assert_eq!(readings, vec![1.0, 2.5, -3.0]);
        assert_eq!(progress, vec![(1, 1.0), (2, 2.5), (3, -3.0)]);
    }

    #[test]
    fn transient_errors_are_retried_within_budget() {
        let mut sampler = Scripted::new(vec![
            Err(SpectrumError::Bus("nack".into())),
            Err(SpectrumError::Bus("nack".into())),
            Ok(4.0),
        ]);
        let readings = run_cycles(&mut sampler, &plan(1, 2), |_, _| {}).unwrap();
        assert_eq!(readings, vec![4.0]);
        assert_eq!(sampler.reads, 3);
    }

    #[test]
    fn retry_budget_is_bounded() {
        let mut sampler = Scripted::new(vec![
            Err(SpectrumError::Bus("nack".into())),
            Err(SpectrumError::Bus("nack".into())),
            Ok(4.0),
        ]);
        let err = run_cycles(&mut sampler, &plan(1, 1), |_, _| {}).unwrap_err();
        assert!(matches!(err, SpectrumError::Bus(_)));
        assert_eq!(sampler.reads, 2);
    }

    #[test]
    fn timeouts_abort_without_retry() {
        let mut sampler = Scripted::new(vec![
            Ok(1.0),
            Err(SpectrumError::DeviceTimeout { attempts: 10 }),
        ]);
        let mut progress = 0;
        let err = run_cycles(&mut sampler, &plan(5, 3), |_, _| progress += 1).unwrap_err();
        assert!(matches!(err, SpectrumError::DeviceTimeout { attempts: 10 }));
        assert_eq!(sampler.reads, 2);
        assert_eq!(progress, 1);
    }
}
