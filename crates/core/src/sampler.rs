use crate::error::Result;

/// Anything that can produce one scalar reading per sampling cycle.
///
/// Implementations are chosen when the configuration is loaded and driven
/// strictly sequentially: `prepare` once, then `read` once per cycle.
pub trait Sampler: std::fmt::Debug {
    /// Short identifier used in log lines, e.g. `"synthetic"`.
    fn name(&self) -> &str;

    /// One-time device setup before the first reading.
    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    /// Take a single reading.
    fn read(&mut self) -> Result<f64>;
}
