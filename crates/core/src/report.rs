use crate::spectrum::{Bucket, Spectrum};

/// Round `value` to `places` decimal digits.
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

/// Startup line echoing the four run parameters, e.g. `"100,0.5,0.025,2.0"`.
pub fn format_config_echo(cycles: u32, cycle_wait_secs: f64, weight: f64, split: f64) -> String {
    format!("{cycles},{cycle_wait_secs:?},{weight:?},{split:?}")
}

/// One console line per bucket: `"3: [1.0, 2.5] ( 1.5 ) > 4"`.
///
/// Bounds and width keep their float form, like the config echo.
pub fn format_bucket(index: usize, bucket: &Bucket) -> String {
    format!(
        "{index}: [{:?}, {:?}] ( {:?} ) > {}",
        round_to(bucket.lo, 3),
        round_to(bucket.hi, 3),
        round_to(bucket.width(), 3),
        bucket.normalized,
    )
}

/// All bucket lines of a spectrum, in bucket order.
pub fn report_lines(spectrum: &Spectrum) -> impl Iterator<Item = String> + '_ {
    spectrum
        .iter()
        .enumerate()
        .map(|(i, bucket)| format_bucket(i, bucket))
}
