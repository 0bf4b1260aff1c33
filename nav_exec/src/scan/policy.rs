//! # Detection aggregation policy
//!
//! Turns the samples of a sweep, or a single lateral observation, into a [`ScanResult`] the
//! mission stages branch on.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use eqpt_if::{cam::LateralBucket, imu::Heading};
use serde::Serialize;
use util::maths::circular_mean_deg;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One vision observation and the heading it was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectionSample {
    pub heading: Heading,
    pub percentage: f64,

    /// Clock time at which the percentage was captured.
    pub time_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanResult {
    NoDetection,

    SingleDetection(Heading),

    /// Several detections, `centroid` is their circular mean.
    MultipleDetections { centroid: Heading, count: usize },

    /// A single reading above the high confidence threshold.
    HighConfidenceOverall(Heading),

    /// The target is visible in the given part of the frame.
    DirectionalBucket(LateralBucket),
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Returns true if the sample triggers the high confidence override.
pub fn is_high_confidence(sample: &DetectionSample, high_confidence_threshold: f64) -> bool {
    sample.percentage >= high_confidence_threshold
}

/// Aggregate the samples of a sweep.
///
/// When `high_confidence_threshold` is given the first sample reaching it wins over any count
/// of ordinary detections.
pub fn aggregate(
    samples: &[DetectionSample],
    threshold: f64,
    high_confidence_threshold: Option<f64>,
) -> ScanResult {
    if let Some(hc) = high_confidence_threshold {
        if let Some(s) = samples.iter().find(|s| is_high_confidence(s, hc)) {
            return ScanResult::HighConfidenceOverall(s.heading);
        }
    }

    let matches: Vec<&DetectionSample> =
        samples.iter().filter(|s| s.percentage >= threshold).collect();

    match matches.len() {
        0 => ScanResult::NoDetection,
        1 => ScanResult::SingleDetection(matches[0].heading),
        count => {
            let headings: Vec<f64> = matches.iter().map(|s| s.heading.deg()).collect();

            // Detections spread evenly around the rover have no mean direction, fall back on
            // the strongest one
            let centroid = match circular_mean_deg(&headings) {
                Some(m) => Heading::new(m),
                None => strongest_of(matches.iter().copied())
                    .map(|s| s.heading)
                    .unwrap_or(matches[0].heading),
            };

            ScanResult::MultipleDetections { centroid, count }
        }
    }
}

/// The sample with the highest percentage. Ties go to the earliest sample.
pub fn strongest(samples: &[DetectionSample]) -> Option<&DetectionSample> {
    strongest_of(samples.iter())
}

/// The strongest sample lying more than `min_separation_deg` away from `from`.
pub fn strongest_away_from(
    samples: &[DetectionSample],
    from: Heading,
    min_separation_deg: f64,
) -> Option<&DetectionSample> {
    strongest_of(
        samples
            .iter()
            .filter(|s| from.delta_to(s.heading).abs() > min_separation_deg),
    )
}

/// Classify a single lateral observation.
///
/// A capture error, a percentage below `acquire_threshold` or a missing bucket all mean the
/// target is not in view.
pub fn locate(
    percentage: Option<f64>,
    bucket: Option<LateralBucket>,
    acquire_threshold: f64,
) -> ScanResult {
    match (percentage, bucket) {
        (Some(p), Some(b)) if p >= acquire_threshold => ScanResult::DirectionalBucket(b),
        _ => ScanResult::NoDetection,
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn strongest_of<'a, I>(samples: I) -> Option<&'a DetectionSample>
where
    I: Iterator<Item = &'a DetectionSample>,
{
    samples.fold(None, |best, s| match best {
        Some(b) if b.percentage >= s.percentage => Some(b),
        _ => Some(s),
    })
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DetectionSample {
    pub fn new(heading_deg: f64, percentage: f64) -> Self {
        Self {
            heading: Heading::new(heading_deg),
            percentage,
            time_s: 0.0,
        }
    }
}

impl ScanResult {
    /// Number of detections this result accounts for.
    pub fn count(&self) -> usize {
        match self {
            ScanResult::NoDetection => 0,
            ScanResult::MultipleDetections { count, .. } => *count,
            _ => 1,
        }
    }
}
