//! spectrum: sample a sensor for a fixed number of cycles and print an
//! adaptive histogram of the readings.
//!
//! Run with:  `RUST_LOG=info spectrum`  (config from `$SPECTRUM_CONFIG` or `./SpecConfig`)

use anyhow::{Context, Result};
use spectrum_config::{SamplerKind, SpectrumConfig};
use spectrum_core::{build_spectrum, report, Sampler};
use spectrum_sampler::{
    run_cycles, CyclePlan, HostSensorSampler, LinuxI2c, PollPolicy, Stts22h, SyntheticSampler,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Structured logging, RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("spectrum v{} starting", env!("CARGO_PKG_VERSION"));

    let path = spectrum_config::default_path();
    let config = spectrum_config::load(&path)
        .with_context(|| format!("loading configuration from '{}'", path.display()))?;

    println!(
        "{}",
        report::format_config_echo(
            config.cycles,
            config.cycle_wait,
            config.min_interval_weight,
            config.split_factor,
        )
    );

    let mut sampler = build_sampler(&config)?;
    sampler
        .prepare()
        .with_context(|| format!("preparing {} sampler", sampler.name()))?;

    let plan = CyclePlan {
        cycles: config.cycles,
        delay: config.cycle_wait()?,
        read_retries: config.read_retries,
    };
    let readings = run_cycles(sampler.as_mut(), &plan, |cycle, _| {
        tracing::info!("Did reading {cycle}");
    })
    .context("sampling aborted")?;

    let spectrum = build_spectrum(&readings, &config.spectrum_params())
        .context("building spectrum")?;

    for line in report::report_lines(&spectrum) {
        println!("{line}");
    }

    Ok(())
}

/// Construct the sampler variant named by the configuration.
fn build_sampler(config: &SpectrumConfig) -> Result<Box<dyn Sampler>> {
    let sampler: Box<dyn Sampler> = match config.sampler {
        SamplerKind::Synthetic => Box::new(match config.seed {
            Some(seed) => SyntheticSampler::with_seed(config.cycles, seed),
            None => SyntheticSampler::new(config.cycles),
        }),
        SamplerKind::Stts22h => {
            let bus = LinuxI2c::open(&config.i2c_device, config.i2c_address)
                .context("opening sensor bus")?;
            let poll = PollPolicy {
                max_polls: config.poll_max,
                interval: config.poll_wait()?,
            };
            Box::new(Stts22h::new(bus, poll))
        }
        SamplerKind::Host => Box::new(HostSensorSampler::new(config.sensor_label.clone())),
    };
    Ok(sampler)
}
