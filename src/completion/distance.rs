use std::time::Duration;
use strum::{AsRefStr, Display, EnumIter};

/// Coarse travel distance used when the camera cannot be observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum DistanceBucket {
    Nearby,
    Medium,
    Far,
    VeryFar,
    Unknown,
}

impl DistanceBucket {
    pub fn classify(entity: &str) -> Self {
        match entity.trim().to_lowercase().as_str() {
            "moon" | "luna" | "earth" => Self::Nearby,
            "mars" | "venus" | "mercury" => Self::Medium,
            "jupiter" | "saturn" => Self::Far,
            "uranus" | "neptune" | "pluto" => Self::VeryFar,
            _ => Self::Unknown,
        }
    }
}

/// Blind wait per distance bucket. Tuned against Gaia Sky's default
/// camera speed; recalibrate for other renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackTimings {
    pub nearby: Duration,
    pub medium: Duration,
    pub far: Duration,
    pub very_far: Duration,
    pub unknown: Duration,
}

impl Default for FallbackTimings {
    fn default() -> Self {
        Self {
            nearby: Duration::from_secs(2),
            medium: Duration::from_secs(4),
            far: Duration::from_secs(6),
            very_far: Duration::from_secs(8),
            unknown: Duration::from_secs(5),
        }
    }
}

impl FallbackTimings {
    pub fn for_bucket(&self, bucket: DistanceBucket) -> Duration {
        match bucket {
            DistanceBucket::Nearby => self.nearby,
            DistanceBucket::Medium => self.medium,
            DistanceBucket::Far => self.far,
            DistanceBucket::VeryFar => self.very_far,
            DistanceBucket::Unknown => self.unknown,
        }
    }

    /// Every timing divided by `factor`, for tests and dry runs
    pub fn scaled(&self, factor: u32) -> Self {
        let factor = factor.max(1);
        Self {
            nearby: self.nearby / factor,
            medium: self.medium / factor,
            far: self.far / factor,
            very_far: self.very_far / factor,
            unknown: self.unknown / factor,
        }
    }
}
