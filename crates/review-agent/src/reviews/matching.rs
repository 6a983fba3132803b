//! Fuzzy comparison of dot-delimited job-role descriptors.

use std::collections::BTreeSet;

use serde::Serialize;

const MIDDLE_SEGMENT_THRESHOLD: f64 = 20.0;
const LAST_SEGMENT_THRESHOLD: f64 = 10.0;

/// Segment overlap scores for a pair of descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PartialMatch {
    pub middle_score: f64,
    pub last_score: f64,
    pub matched: bool,
}

/// Whether two descriptors such as `"Finance.Treasury.Senior Accountant"` refer to the same role.
pub fn is_partial_match(left: &str, right: &str) -> bool {
    score_partial_match(left, right).matched
}

pub fn score_partial_match(left: &str, right: &str) -> PartialMatch {
    let left = Segments::parse(left);
    let right = Segments::parse(right);

    let middle_score = overlap_score(&left.middle, &right.middle);
    let last_score = overlap_score(&left.last, &right.last);

    PartialMatch {
        middle_score,
        last_score,
        matched: middle_score >= MIDDLE_SEGMENT_THRESHOLD && last_score >= LAST_SEGMENT_THRESHOLD,
    }
}

struct Segments {
    middle: BTreeSet<String>,
    last: BTreeSet<String>,
}

impl Segments {
    fn parse(descriptor: &str) -> Self {
        let parts: Vec<&str> = descriptor.split('.').filter(|part| !part.is_empty()).collect();

        let (middle, last) = match parts.as_slice() {
            [] => ("", ""),
            [only] => (*only, *only),
            [first, second] => (*first, *second),
            [_, middle, .., last] => (*middle, *last),
        };

        Self {
            middle: words(middle),
            last: words(last),
        }
    }
}

fn words(segment: &str) -> BTreeSet<String> {
    segment.split_whitespace().map(str::to_uppercase).collect()
}

/// Mean of the shared-word fraction seen from each side, as a percentage.
fn overlap_score(left: &BTreeSet<String>, right: &BTreeSet<String>) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(right).count() as f64;
    let from_left = shared * 100.0 / left.len() as f64;
    let from_right = shared * 100.0 / right.len() as f64;
    (from_left + from_right) / 2.0
}
