use indicatif::{ProgressBar, ProgressState, ProgressStyle};

/// tqdm-like bar, `unit` is what one tick counts
pub fn get_progress_style(unit: &'static str) -> ProgressStyle {
    ProgressStyle::with_template(
        "{percent:>3}% |{wide_bar}| {pos}/{len} [{elapsed_precise}<{eta_precise}, {custom_per_sec}] {msg}",
    )
    .unwrap()
    .with_key(
        "custom_per_sec",
        move |s: &ProgressState, w: &mut dyn std::fmt::Write| {
            write!(w, "{:.2} {unit}/s", s.per_sec()).unwrap()
        },
    )
    .progress_chars("██ ")
}

pub fn new_progress_bar(len: usize, unit: &'static str) -> ProgressBar {
    ProgressBar::new(len as u64).with_style(get_progress_style(unit))
}

/// Render a metric value: integral values keep one decimal (`2.0`), others
/// print in full
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Mean of the values that are present, `None` when there are none
pub fn mean_of_present<I: IntoIterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .filter(|value| value.is_finite())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}
