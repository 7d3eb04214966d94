// Value formatting and scale policy helpers shared by the presenters.

/// `78.5` → `"78.5%"`.
pub fn percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// `3.75` → `"3.8W"`.
pub fn watts(value: f64) -> String {
    format!("{value:.1}W")
}

/// SI-decimal byte rate: `[0, 1e3)` B/s, `[1e3, 1e6)` KB/s, and so on.
pub fn bytes_per_sec(value: f64) -> String {
    let (scaled, unit) = si_split(value);
    format!("{scaled:.1}{unit}B/s")
}

/// Absolute SI-decimal bytes, for memory and swap gauges.
pub fn bytes(value: f64) -> String {
    let (scaled, unit) = si_split(value);
    format!("{scaled:.1}{unit}B")
}

fn si_split(value: f64) -> (f64, &'static str) {
    const UNITS: [&str; 5] = ["", "K", "M", "G", "T"];
    let mut scaled = value.max(0.0);
    let mut idx = 0;
    while scaled >= 1e3 && idx < UNITS.len() - 1 {
        scaled /= 1e3;
        idx += 1;
    }
    (scaled, UNITS[idx])
}

/// Renderer denominator for rate-like series: the power-of-10 ceiling of
/// the window maximum, never below 1.
pub fn power_of_ten_ceiling(max: f64) -> f64 {
    if max <= 1.0 {
        return 1.0;
    }
    10f64.powf(max.log10().ceil())
}
