use serde::Serialize;

/// Round half up on the fractional part; anything below one half takes the floor.
pub fn round_score(value: f64) -> f64 {
    let floor = value.floor();
    if (value - floor).abs() >= 0.5 {
        value.round()
    } else {
        floor
    }
}

/// Arithmetic mean, or zero for an empty set.
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = u32>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + f64::from(value), count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Weighted combination of self and other averages, weights given as percentages.
pub fn weighted_score(self_average: f64, self_weight: f64, other_average: f64, other_weight: f64) -> f64 {
    self_average * self_weight / 100.0 + other_average * other_weight / 100.0
}

/// Shortfall of an achieved rating against its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompetencyGap {
    pub gap: f64,
    pub has_gap: bool,
}

impl CompetencyGap {
    pub fn between(expected: f64, average: f64) -> Self {
        Self {
            gap: (expected - average).max(0.0),
            has_gap: expected > average,
        }
    }
}
