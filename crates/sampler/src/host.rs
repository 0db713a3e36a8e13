use spectrum_core::{Result, Sampler, SpectrumError};
use sysinfo::Components;

/// Reads one of the host's own temperature sensors (CPU package, NVMe, …).
pub struct HostSensorSampler {
    components: Components,
    label_filter: Option<String>,
    label: Option<String>,
}

impl std::fmt::Debug for HostSensorSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSensorSampler")
            .field("label_filter", &self.label_filter)
            .field("label", &self.label)
            .finish()
    }
}

impl HostSensorSampler {
    /// `label_filter` picks the first sensor with a reading whose label
    /// contains it, ignoring case. Without a filter the first sensor with a reading wins.
    pub fn new(label_filter: Option<String>) -> Self {
        Self {
            components: Components::new_with_refreshed_list(),
            label_filter,
            label: None,
        }
    }

    /// Label of the sensor chosen by [`Sampler::prepare`].
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl Sampler for HostSensorSampler {
    fn name(&self) -> &str {
        "host"
    }

    fn prepare(&mut self) -> Result<()> {
        let chosen = pick_label(
            self.components.iter().map(|c| (c.label(), c.temperature())),
            self.label_filter.as_deref(),
        )
        .map(str::to_string)
        .ok_or_else(|| {
            SpectrumError::System(match &self.label_filter {
                Some(filter) => format!("no temperature sensor matching '{filter}'"),
                None => "no temperature sensor with a reading found".to_string(),
            })
        })?;

        tracing::info!("Sampling host sensor '{chosen}'");
        self.label = Some(chosen);
        Ok(())
    }

    fn read(&mut self) -> Result<f64> {
        let Some(label) = self.label.as_deref() else {
            return Err(SpectrumError::System("host sensor read before prepare".into()));
        };

        self.components.refresh(false);
        self.components
            .iter()
            .find(|c| c.label() == label)
            .and_then(|c| c.temperature())
            .map(f64::from)
            .ok_or_else(|| SpectrumError::System(format!("sensor '{label}' returned no reading")))
    }
}

/// Choose a sensor label from `(label, current temperature)` pairs.
fn pick_label<'a>(
    sensors: impl Iterator<Item = (&'a str, Option<f32>)>,
    filter: Option<&str>,
) -> Option<&'a str> {
    let mut sensors = sensors;
    match filter {
        Some(filter) => {
            let needle = filter.to_lowercase();
            sensors
                .find(|(label, temp)| {
                    label.to_lowercase().contains(&needle) && temp.is_some_and(f32::is_finite)
                })
                .map(|(label, _)| label)
        }
        None => sensors
            .find(|(_, temp)| temp.is_some_and(f32::is_finite))
            .map(|(label, _)| label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENSORS: &[(&str, Option<f32>)] = &[
        ("acpitz temp1", None),
        ("coretemp Package id 0", Some(48.0)),
        ("nvme Composite", Some(39.5)),
    ];

    #[test]
    fn filter_matches_case_insensitively() {
        let label = pick_label(SENSORS.iter().copied(), Some("NVME"));
        assert_eq!(label, Some("nvme Composite"));
    }

    #[test]
    fn without_filter_first_live_sensor_wins() {
        let label = pick_label(SENSORS.iter().copied(), None);
        assert_eq!(label, Some("coretemp Package id 0"));
    }

    #[test]
    fn filter_skips_sensors_without_a_reading() {
        assert_eq!(pick_label(SENSORS.iter().copied(), Some("acpitz")), None);
        let label = pick_label(SENSORS.iter().copied(), Some("temp"));
        assert_eq!(label, Some("coretemp Package id 0"));
    }

    #[test]
    fn unmatched_filter_finds_nothing() {
        assert_eq!(pick_label(SENSORS.iter().copied(), Some("gpu")), None);
    }

    #[test]
    fn read_before_prepare_is_an_error() {
        let mut sampler = HostSensorSampler::new(None);
        assert!(matches!(sampler.read(), Err(SpectrumError::System(_))));
    }
}
