//! Turning fire-and-forget renderer calls into blocking waits.
//!
//! Gaia Sky's navigation calls return as soon as the request is queued, long
//! before the camera arrives. [`CompletionDetector`] watches the camera (or
//! falls back to distance-based timing) so callers only continue once the
//! effect is visible.

mod distance;
mod stability;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use strum::{AsRefStr, Display};

use crate::llm::Params;
use crate::remote::{CapabilityRegistry, RemoteEndpoint, RemoteError, Renderer};

pub use distance::{DistanceBucket, FallbackTimings};
pub use stability::{movement, NavigationCompletionState, Reading};

/// Hard upper bound on position monitoring regardless of configuration
pub const NAVIGATION_CEILING: Duration = Duration::from_secs(20);

/// How an action's completion is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum CommandCategory {
    Navigation,
    MultiStep,
    Fast,
    CameraMovement,
}

impl CommandCategory {
    /// Classify an action name; unknown actions are treated as fast
    pub fn of(action: &str) -> Self {
        match action {
            "go_to" | "land_on" | "track" | "explore" | "orbit" => Self::Navigation,
            "tour" | "cinematic_journey" | "multi_step" | "stream_tour" => Self::MultiStep,
            "back_to_space" | "free_camera" | "stop_camera" => Self::CameraMovement,
            _ => Self::Fast,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Delay between camera position samples
    pub poll_interval: Duration,
    /// Consecutive stable samples needed to declare arrival
    pub stable_readings: u32,
    /// Largest summed per-axis movement still counted as "not moving".
    /// Depends on the renderer's coordinate units.
    pub stability_threshold: f64,
    /// Configured limit for position monitoring, capped at [`NAVIGATION_CEILING`]
    pub max_navigation_wait: Duration,
    pub camera_settle: Duration,
    pub camera_unsettled_wait: Duration,
    pub quick_verification: Duration,
    pub instant_cap: Duration,
    /// Assumed transition time when a smooth move gives no duration
    pub default_transition: Duration,
    pub transition_margin: Duration,
    /// Longest transition a caller can ask the blind wait to cover
    pub max_transition: Duration,
    pub fallback: FallbackTimings,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            stable_readings: 3,
            stability_threshold: 1000.0,
            max_navigation_wait: Duration::from_secs(30),
            camera_settle: Duration::from_millis(300),
            camera_unsettled_wait: Duration::from_secs(1),
            quick_verification: Duration::from_millis(200),
            instant_cap: Duration::from_secs(1),
            default_transition: Duration::from_secs(5),
            transition_margin: Duration::from_secs(1),
            max_transition: Duration::from_secs(60),
            fallback: FallbackTimings::default(),
        }
    }
}

impl CompletionConfig {
    pub fn navigation_ceiling(&self) -> Duration {
        self.max_navigation_wait.min(NAVIGATION_CEILING)
    }
}

/// Caller hints about how the camera was asked to move.
/// Navigation handlers fly smoothly unless told otherwise, so a missing
/// `smooth` reads as `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransitionHints {
    pub smooth: Option<bool>,
    pub instant: bool,
    pub duration: Option<f64>,
}

impl TransitionHints {
    pub fn from_params(params: &Params) -> Self {
        Self {
            smooth: Some(params.get_bool("smooth").unwrap_or(true)),
            instant: params.get_bool("instant").unwrap_or(false),
            duration: params.get_f64("duration").filter(|d| *d >= 0.0),
        }
    }
}

/// Why position monitoring gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorOutcome {
    Settled,
    Unavailable,
    InvalidFormat,
    TimedOut,
}

pub struct CompletionDetector {
    config: CompletionConfig,
    capabilities: Arc<CapabilityRegistry>,
}

impl CompletionDetector {
    pub fn new(config: CompletionConfig, capabilities: Arc<CapabilityRegistry>) -> Self {
        Self {
            config,
            capabilities,
        }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Block until the effect of `action` is observably done.
    ///
    /// Always returns `true`: detection problems are logged and replaced by
    /// the short fixed verification delay.
    pub fn wait_for_completion(
        &self,
        action: &str,
        endpoint: &dyn RemoteEndpoint,
        entity: &str,
        params: &Params,
    ) -> bool {
        let category = CommandCategory::of(action);
        log::debug!("🎯 Waiting for completion: {} ({})", action, category);

        let renderer = Renderer::new(endpoint, &self.capabilities);
        let detected = catch_unwind(AssertUnwindSafe(|| match category {
            CommandCategory::Navigation => {
                self.wait_navigation(&renderer, entity, &TransitionHints::from_params(params));
                Ok(())
            }
            // Orchestrating handlers wait between their own sub-steps
            CommandCategory::MultiStep => Ok(()),
            CommandCategory::CameraMovement => self.wait_camera(&renderer),
            CommandCategory::Fast => {
                self.quick_verification();
                Ok(())
            }
        }));

        match detected {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::error!("❌ Completion detection error for {}: {}", action, e);
                self.quick_verification();
            }
            Err(_) => {
                log::error!("❌ Completion detection panicked for {}", action);
                self.quick_verification();
            }
        }
        true
    }

    fn wait_navigation(&self, renderer: &Renderer<'_>, entity: &str, hints: &TransitionHints) {
        log::debug!("🚀 Waiting for navigation completion to: {}", entity);
        let started = Instant::now();

        let outcome = self.monitor_camera_position(renderer, entity);
        if outcome == MonitorOutcome::Settled {
            return;
        }

        let spent = started.elapsed();
        let mut wait = self.fallback_wait(entity, hints).saturating_sub(spent);
        if outcome != MonitorOutcome::Unavailable {
            // Time spent polling counts against the same ceiling
            wait = wait.min(self.config.navigation_ceiling().saturating_sub(spent));
        }

        log::debug!(
            "⏳ Using distance-based fallback timing: {:.1}s for '{}' ({})",
            wait.as_secs_f64(),
            entity,
            DistanceBucket::classify(entity)
        );
        thread::sleep(wait);
        log::info!("✅ Navigation fallback timing completed for {}", entity);
    }

    fn monitor_camera_position(&self, renderer: &Renderer<'_>, entity: &str) -> MonitorOutcome {
        if !renderer.supports("getCameraPosition") {
            log::debug!("📍 getCameraPosition not available, falling back");
            return MonitorOutcome::Unavailable;
        }

        let ceiling = self.config.navigation_ceiling();
        let mut state = NavigationCompletionState::new(
            entity,
            self.config.stability_threshold,
            self.config.stable_readings,
        );
        log::debug!("⏱️ Starting position monitoring (max wait: {:?})", ceiling);

        while state.elapsed() < ceiling {
            match renderer.camera_position() {
                Ok(position) => match state.observe(position) {
                    Reading::Settled => {
                        log::info!(
                            "✅ Navigation completed via position monitoring in {:.1}s",
                            state.elapsed().as_secs_f64()
                        );
                        self.verify_target_reached(renderer, &state.target_entity);
                        return MonitorOutcome::Settled;
                    }
                    Reading::Stable { count, movement } => log::debug!(
                        "📍 Stable reading {}/{} (movement: {:.1})",
                        count,
                        self.config.stable_readings,
                        movement
                    ),
                    Reading::Moving { movement } => {
                        log::debug!("📍 Camera moving: {:.1}", movement)
                    }
                    Reading::First => {}
                },
                Err(RemoteError::InvalidResponse { message, .. }) => {
                    log::warn!("⚠️ Invalid camera position format: {}", message);
                    return MonitorOutcome::InvalidFormat;
                }
                Err(e) => log::warn!("⚠️ Position monitoring error: {}", e),
            }

            let remaining = ceiling.saturating_sub(state.elapsed());
            thread::sleep(self.config.poll_interval.min(remaining));
        }

        log::warn!(
            "⏰ Position monitoring timeout after {:.1}s",
            state.elapsed().as_secs_f64()
        );
        MonitorOutcome::TimedOut
    }

    /// Best-effort confirmation; never changes the outcome of the wait
    fn verify_target_reached(&self, renderer: &Renderer<'_>, entity: &str) {
        if entity.is_empty() || !renderer.supports("getClosestObjectToCamera") {
            return;
        }
        match renderer.closest_object_to_camera() {
            Ok(closest) if closest.to_lowercase().contains(&entity.to_lowercase()) => {
                log::debug!("🎯 Target verification: closest object is '{}'", closest)
            }
            Ok(closest) => log::debug!(
                "⚠️ Closest object is '{}', not '{}', but position is stable",
                closest,
                entity
            ),
            Err(e) => log::debug!("⚠️ Target verification skipped: {}", e),
        }
    }

    fn wait_camera(&self, renderer: &Renderer<'_>) -> Result<(), RemoteError> {
        log::debug!("📹 Waiting for camera operation completion");

        if !renderer.supports("getCameraPosition") {
            thread::sleep(self.config.camera_unsettled_wait);
            log::info!("✅ Camera operation completed (fallback timing)");
            return Ok(());
        }

        let first = renderer.camera_position()?;
        thread::sleep(self.config.camera_settle);
        let second = renderer.camera_position()?;

        if movement(&first, &second) < self.config.stability_threshold {
            log::debug!("📹 Camera appears stable");
            return Ok(());
        }

        thread::sleep(self.config.camera_unsettled_wait);
        log::info!("✅ Camera operation completed (with movement)");
        Ok(())
    }

    fn quick_verification(&self) {
        log::debug!("⚡ Quick verification for fast command");
        thread::sleep(self.config.quick_verification);
    }

    /// Blind wait used when the camera cannot be observed
    pub fn fallback_wait(&self, entity: &str, hints: &TransitionHints) -> Duration {
        let bucket = DistanceBucket::classify(entity);
        let base = self.config.fallback.for_bucket(bucket);

        if hints.instant || hints.smooth == Some(false) {
            return base.min(self.config.instant_cap);
        }

        if hints.smooth == Some(true) || hints.duration.is_some() {
            let transition = hints
                .duration
                .map(|secs| {
                    Duration::try_from_secs_f64(secs).unwrap_or(self.config.max_transition)
                })
                .unwrap_or(self.config.default_transition)
                .min(self.config.max_transition);
            return base.max(transition.saturating_add(self.config.transition_margin));
        }

        base
    }
}
