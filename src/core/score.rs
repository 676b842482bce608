use crate::core::readings::ImpurityReading;

/// Inverse of the mean impurity value, rounded. An empty reading set is a
/// perfect 100.
pub fn compute_skin_score(readings: &[ImpurityReading], clamp: bool) -> i32 {
    if readings.is_empty() {
        return 100;
    }

    let total: f64 = readings.iter().map(|reading| reading.value).sum();
    let mean = total / readings.len() as f64;
    let score = (100.0 - mean).round() as i32;

    if clamp { score.clamp(0, 100) } else { score }
}

pub fn label_for_score(score: i32) -> &'static str {
    match score {
        90.. => "Excellent",
        75..=89 => "Good",
        50..=74 => "Fair",
        _ => "Needs Care",
    }
}
