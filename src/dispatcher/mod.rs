//! Maps parsed commands onto renderer operations.
//!
//! Every handler returns a `Result<String, ActionFailure>`; the single place
//! a failure becomes user-facing text is [`ActionOutcome::into_message`].

mod handlers;
mod tours;
pub mod validation;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

use crate::completion::CompletionDetector;
use crate::llm::{CommandParser, Params};
use crate::remote::{CapabilityRegistry, ConnectionManager, RemoteError, Renderer};

pub use tours::{tour_names, tour_route, TOUR_ROUTES};
pub use validation::{resolve_entity, Decision, SituationalState, CELESTIAL_OBJECTS};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    GoTo,
    LandOn,
    Track,
    Explore,
    Orbit,
    TakeScreenshot,
    SetTime,
    FreeCamera,
    StopCamera,
    BackToSpace,
    ZoomIn,
    ZoomOut,
    SpeedUp,
    SlowDown,
    Tour,
    CinematicJourney,
    MultiStep,
    StreamTour,
}

impl Action {
    /// Every supported action name, in prompt order
    pub fn names() -> Vec<&'static str> {
        Action::iter().map(<&'static str>::from).collect()
    }

    /// Actions whose entity names a single object
    fn is_targeted(self) -> bool {
        matches!(
            self,
            Action::GoTo
                | Action::LandOn
                | Action::Track
                | Action::Explore
                | Action::Orbit
                | Action::CinematicJourney
        )
    }

    /// Actions whose entity becomes the new last target
    fn sets_last_target(self) -> bool {
        matches!(self, Action::GoTo | Action::LandOn | Action::Explore)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionFailure {
    /// Missing or malformed input
    #[error("{0}")]
    Invalid(String),

    /// The renderer lacks what this action needs
    #[error("{0}")]
    Unsupported(String),

    #[error("{0}")]
    Failed(String),

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

impl ActionFailure {
    fn is_connection_lost(&self) -> bool {
        matches!(self, ActionFailure::Remote(RemoteError::Connection(_)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Done(String),
    /// Deliberately not executed; not an error
    Skipped(String),
    Failed(ActionFailure),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Done(_))
    }

    pub fn into_message(self) -> String {
        match self {
            ActionOutcome::Done(message) => message,
            ActionOutcome::Skipped(reason) => format!("🧠 Smart Agent: {}", reason),
            ActionOutcome::Failed(failure) => format!("❌ {}", failure),
        }
    }
}

/// Fixed waits inside orchestrated actions
#[derive(Debug, Clone)]
pub struct Pacing {
    /// Slow-motion period of a cinematic journey
    pub effects_pause: Duration,
    /// Time between updates of a single-target stream tour
    pub stream_interval: Duration,
    /// Ceiling on any delay or duration taken from command parameters
    pub max_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            effects_pause: Duration::from_secs(3),
            stream_interval: Duration::from_secs(3),
            max_delay: Duration::from_secs(120),
        }
    }
}

pub struct Dispatcher {
    connection: Arc<ConnectionManager>,
    capabilities: Arc<CapabilityRegistry>,
    completion: Arc<CompletionDetector>,
    parser: Box<dyn CommandParser>,
    last_target: Mutex<Option<String>>,
    pacing: Pacing,
}

impl Dispatcher {
    pub fn new(
        connection: Arc<ConnectionManager>,
        capabilities: Arc<CapabilityRegistry>,
        completion: Arc<CompletionDetector>,
        parser: Box<dyn CommandParser>,
    ) -> Self {
        Self {
            connection,
            capabilities,
            completion,
            parser,
            last_target: Mutex::new(None),
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn last_target(&self) -> Option<String> {
        self.last_target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_last_target(&self, entity: &str) {
        *self.last_target.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(entity.to_string());
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Connection status, camera position and last target
    pub fn current_state(&self) -> SituationalState {
        let last_target = self.last_target();
        let endpoint = match self.connection.endpoint() {
            Ok(endpoint) => endpoint,
            Err(e) => return SituationalState::unavailable(e.to_string(), last_target),
        };

        let renderer = Renderer::new(endpoint.as_ref(), &self.capabilities);
        let camera_position = if renderer.supports("getCameraPosition") {
            renderer
                .camera_position()
                .map_err(|e| log::debug!("📍 Camera position unavailable: {}", e))
                .ok()
        } else {
            None
        };

        SituationalState {
            connected: true,
            camera_position,
            last_target,
            error: None,
        }
    }

    /// Parse, validate and run a free-text command. Never fails: every
    /// problem comes back as the result text.
    pub fn execute_command(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return "❌ Empty command. Please provide a valid space navigation command.".to_string();
        }
        if text.chars().count() < 3 {
            return "❌ Command too short. Please provide a more detailed instruction.".to_string();
        }

        let state = self.current_state();
        log::info!(
            "🎯 Current state: position={}, target={}",
            state
                .camera_position
                .map(|p| format!("{:?}", p))
                .unwrap_or_else(|| "unknown".to_string()),
            state.last_target.as_deref().unwrap_or("none")
        );

        let command = match self.parser.parse(text) {
            Ok(command) => command,
            Err(e) => {
                log::warn!("⚠️ Could not parse '{}': {}", text, e);
                return format!("❌ Could not understand command: '{}'", text);
            }
        };

        let outcome = match validation::should_execute(&command.action, &command.entity, &state) {
            Decision::Skip(reason) => {
                log::info!("🧠 Skipping: {}", reason);
                ActionOutcome::Skipped(reason)
            }
            Decision::Reject(reason) => ActionOutcome::Failed(ActionFailure::Invalid(reason)),
            Decision::Proceed(reason) => {
                log::info!(
                    "✅ Executing: {} {} - {}",
                    command.action,
                    command.entity,
                    reason
                );
                let run = catch_unwind(AssertUnwindSafe(|| {
                    self.execute_action(&command.action, &command.entity, &command.parameters)
                }));
                run.unwrap_or_else(|_| {
                    log::error!("❌ Handler for {} panicked", command.action);
                    ActionOutcome::Failed(ActionFailure::Failed(format!(
                        "Command failed: {}",
                        command.action
                    )))
                })
            }
        };

        outcome.into_message()
    }

    /// Run one named action against the renderer, waiting for its effect
    pub fn execute_action(&self, action: &str, entity: &str, params: &Params) -> ActionOutcome {
        let Ok(action) = action.parse::<Action>() else {
            return ActionOutcome::Failed(ActionFailure::UnknownAction(action.to_string()));
        };

        let endpoint = match self.connection.endpoint() {
            Ok(endpoint) => endpoint,
            Err(e) => return ActionOutcome::Failed(e.into()),
        };

        let renderer = Renderer::new(endpoint.as_ref(), &self.capabilities);
        let outcome = self.run_action(&renderer, action, entity, params);

        if let ActionOutcome::Failed(failure) = &outcome {
            log::error!("❌ {} failed: {}", action, failure);
            if failure.is_connection_lost() {
                self.connection.disconnect();
            }
        }
        outcome
    }

    /// Handler plus completion wait; also used for the sub-steps of tours
    /// and sequences
    fn run_action(
        &self,
        renderer: &Renderer<'_>,
        action: Action,
        entity: &str,
        params: &Params,
    ) -> ActionOutcome {
        let entity = match resolve_entity(entity) {
            Some(name) if action.is_targeted() => name,
            _ => entity.trim(),
        };
        match self.handle(renderer, action, entity, params) {
            Ok(message) => {
                if action.sets_last_target() && !entity.is_empty() {
                    self.set_last_target(entity);
                }
                self.completion.wait_for_completion(
                    action.as_ref(),
                    renderer.endpoint(),
                    entity,
                    params,
                );
                ActionOutcome::Done(message)
            }
            Err(failure) => ActionOutcome::Failed(failure),
        }
    }

    fn handle(
        &self,
        renderer: &Renderer<'_>,
        action: Action,
        entity: &str,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        match action {
            Action::GoTo => self.go_to(renderer, entity, params),
            Action::LandOn => self.land_on(renderer, entity, params),
            Action::Track => self.track(renderer, entity),
            Action::Explore => self.explore(renderer, entity, params),
            Action::Orbit => self.orbit(renderer, entity, params),
            Action::TakeScreenshot => self.take_screenshot(renderer, params),
            Action::SetTime => self.set_time(renderer, params),
            Action::FreeCamera => self.free_camera(renderer),
            Action::StopCamera => self.stop_camera(renderer),
            Action::BackToSpace => self.back_to_space(renderer),
            Action::ZoomIn => self.zoom(renderer, params, true),
            Action::ZoomOut => self.zoom(renderer, params, false),
            Action::SpeedUp => self.change_speed(renderer, params, true),
            Action::SlowDown => self.change_speed(renderer, params, false),
            Action::Tour => self.tour(renderer, entity, params),
            Action::CinematicJourney => self.cinematic_journey(renderer, entity, params),
            Action::MultiStep => self.multi_step(renderer, entity, params),
            Action::StreamTour => self.stream_tour(renderer, entity, params),
        }
    }

    fn seconds(&self, params: &Params, key: &str, default: f64) -> Duration {
        seconds(params, key, default, self.pacing.max_delay)
    }

    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

/// Seconds parameter, ignoring negative or absent values and capped at `max`
fn seconds(params: &Params, key: &str, default: f64, max: Duration) -> Duration {
    params
        .get_f64(key)
        .filter(|s| *s >= 0.0)
        .map(|s| Duration::try_from_secs_f64(s).unwrap_or(max))
        .unwrap_or_else(|| Duration::from_secs_f64(default))
        .min(max)
}

fn require_entity<'a>(entity: &'a str, hint: &str) -> Result<&'a str, ActionFailure> {
    if entity.is_empty() {
        Err(ActionFailure::Invalid(hint.to_string()))
    } else {
        Ok(entity)
    }
}
