use std::time::{Duration, Instant};

use crate::remote::Vector3;

/// Sum of absolute per-axis deltas
pub fn movement(a: &Vector3, b: &Vector3) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

/// What a single position sample told us
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// First sample, nothing to compare against yet
    First,
    Moving { movement: f64 },
    Stable { count: u32, movement: f64 },
    /// Enough consecutive stable samples
    Settled,
}

/// Per-call state of a navigation wait
#[derive(Debug, Clone)]
pub struct NavigationCompletionState {
    pub target_entity: String,
    pub start_time: Instant,
    previous_position: Option<Vector3>,
    stable_reading_count: u32,
    threshold: f64,
    required: u32,
}

impl NavigationCompletionState {
    pub fn new(target_entity: &str, threshold: f64, required: u32) -> Self {
        Self {
            target_entity: target_entity.to_string(),
            start_time: Instant::now(),
            previous_position: None,
            stable_reading_count: 0,
            threshold,
            required: required.max(1),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn stable_reading_count(&self) -> u32 {
        self.stable_reading_count
    }

    pub fn observe(&mut self, position: Vector3) -> Reading {
        let Some(previous) = self.previous_position.replace(position) else {
            return Reading::First;
        };

        let movement = movement(&position, &previous);
        if movement < self.threshold {
            self.stable_reading_count += 1;
            if self.stable_reading_count >= self.required {
                Reading::Settled
            } else {
                Reading::Stable {
                    count: self.stable_reading_count,
                    movement,
                }
            }
        } else {
            self.stable_reading_count = 0;
            Reading::Moving { movement }
        }
    }
}
