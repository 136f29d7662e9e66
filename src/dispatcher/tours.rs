//! Orchestrated actions made of several navigation steps.
//!
//! Every stop goes through `run_action`, so each one gets its own
//! completion wait before the next starts.

use serde_json::Value;

use super::{require_entity, Action, ActionFailure, ActionOutcome, Dispatcher};
use crate::llm::{Command, Params};
use crate::remote::Renderer;

/// Named multi-destination routes
pub const TOUR_ROUTES: &[(&str, &[&str])] = &[
    (
        "solar system",
        &["Sun", "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune"],
    ),
    (
        "planets",
        &["Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune"],
    ),
    ("inner planets", &["Mercury", "Venus", "Earth", "Mars"]),
    ("outer planets", &["Jupiter", "Saturn", "Uranus", "Neptune"]),
    ("gas giants", &["Jupiter", "Saturn", "Uranus", "Neptune"]),
    ("terrestrial planets", &["Mercury", "Venus", "Earth", "Mars"]),
    ("jupiter moons", &["Io", "Europa", "Ganymede", "Callisto"]),
    ("saturn moons", &["Titan", "Enceladus", "Mimas", "Iapetus"]),
];

const DEFAULT_TOUR: &str = "solar system";
const CINEMATIC_ORBIT: (f64, f64) = (5.0, 0.3);
const SLOW_MOTION_SPEED: f64 = 0.2;
const STREAM_ORBIT_DISTANCE: f64 = 8.0;

pub fn tour_route(name: &str) -> Option<&'static [&'static str]> {
    let name = name.trim().to_lowercase();
    TOUR_ROUTES
        .iter()
        .find(|(route, _)| *route == name)
        .map(|(_, stops)| *stops)
}

pub fn tour_names() -> Vec<&'static str> {
    TOUR_ROUTES.iter().map(|(name, _)| *name).collect()
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn slug(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("_")
}

fn navigation_params(smooth: bool, duration: f64) -> Params {
    Params::new()
        .with("smooth", smooth)
        .with("duration", duration)
        .with("angle", 0.0)
}

/// One step of a multi-step sequence, before it runs
enum Step {
    Run(Command),
    Invalid(String),
}

fn parse_step(step: &Value, default_entity: &str) -> Step {
    match step {
        Value::Object(_) => match Command::from_value(step) {
            Ok(command) => Step::Run(command),
            Err(e) => Step::Invalid(format!("Invalid step format: {}", e)),
        },
        Value::String(text) => {
            let text = text.trim();
            if text.parse::<Action>().is_ok() {
                return Step::Run(Command::new(text, default_entity));
            }
            match text.split_once(char::is_whitespace) {
                Some((action, entity)) if !entity.trim().is_empty() => {
                    Step::Run(Command::new(action, entity.trim()))
                }
                _ => Step::Invalid(format!("Invalid step format: {}", text)),
            }
        }
        other => Step::Invalid(format!("Invalid step type: {}", json_type(other))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Dispatcher {
    pub(super) fn tour(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let name = if entity.is_empty() { DEFAULT_TOUR } else { entity };
        let Some(route) = tour_route(name) else {
            return Err(ActionFailure::Invalid(format!(
                "No tour route defined for '{}'. Available tours: {}",
                name,
                tour_names().join(", ")
            )));
        };

        let delay = self.seconds(params, "delay", 3.0);
        let stop_params = navigation_params(params.get_bool("smooth").unwrap_or(true), 4.0);
        let total = route.len();
        log::info!("🎬 Starting {} tour ({} stops)", name, total);

        let mut lines = vec![format!(
            "🎬 Starting {} tour with {} destinations...",
            name, total
        )];
        for (index, stop) in route.iter().enumerate() {
            let number = index + 1;
            match self.run_action(renderer, Action::GoTo, stop, &stop_params) {
                ActionOutcome::Done(_) => {
                    lines.push(format!("✅ Tour Stop {}/{}: {}", number, total, stop));
                }
                outcome => {
                    log::warn!("⚠️ Tour stop {} failed: {:?}", stop, outcome);
                    lines.push(format!(
                        "⚠️ Tour Stop {}/{}: Failed to reach {}",
                        number, total, stop
                    ));
                    continue;
                }
            }
            if number < total {
                self.pause(delay);
            }
        }

        lines.push(format!(
            "🎉 {} tour completed! Visited {} destinations.",
            title_case(name),
            total
        ));
        Ok(lines.join("\n"))
    }

    pub(super) fn cinematic_journey(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let entity = require_entity(
            entity,
            "Please specify destination for cinematic journey (e.g., 'Mars', 'Jupiter')",
        )?;
        let duration = params
            .get_f64("duration")
            .filter(|d| *d > 0.0)
            .unwrap_or(8.0)
            .min(self.pacing.max_delay.as_secs_f64());
        let track_after = params.get_bool("track_after").unwrap_or(true);
        let effects = params.get_bool("effects").unwrap_or(true);

        let mut lines = vec![format!("🎬 Starting cinematic journey to {}...", entity)];
        let approach = navigation_params(true, duration);
        if !self
            .run_action(renderer, Action::GoTo, entity, &approach)
            .is_success()
        {
            return Err(ActionFailure::Failed(format!(
                "Cinematic journey to {} failed: Could not navigate there",
                entity
            )));
        }
        lines.push(format!("✅ Approaching {} cinematically...", entity));

        let on_failure = || super::handlers::failed(format!("Cinematic journey to {} failed", entity));
        if track_after {
            if renderer.supports("setCameraFocus") {
                renderer.set_camera_focus(entity).map_err(on_failure())?;
                lines.push(format!(
                    "📹 Camera locked on {} for cinematic tracking",
                    entity
                ));
            }
            if renderer.supports("setCameraOrbitObject") {
                let (distance, speed) = CINEMATIC_ORBIT;
                renderer
                    .set_camera_orbit_object(entity, distance, speed)
                    .map_err(on_failure())?;
                lines.push("🌌 Gentle orbital motion activated for cinematic effect".to_string());
            }
        }

        if effects && renderer.supports("setSimulationSpeed") {
            // Slow motion is decoration; a failure here does not fail the journey
            match renderer.set_simulation_speed(SLOW_MOTION_SPEED) {
                Ok(()) => {
                    lines.push("⏰ Time slowed for dramatic cinematic effect".to_string());
                    self.pause(self.pacing.effects_pause);
                    match renderer.set_simulation_speed(1.0) {
                        Ok(()) => lines.push("⏰ Time restored to normal".to_string()),
                        Err(e) => log::warn!("⚠️ Could not restore simulation speed: {}", e),
                    }
                }
                Err(e) => log::warn!("⚠️ Slow motion unavailable: {}", e),
            }
        }

        self.set_last_target(entity);
        lines.push(format!(
            "🎭 Cinematic journey to {} completed! Enjoy the spectacular view!",
            entity
        ));
        Ok(lines.join("\n"))
    }

    pub(super) fn multi_step(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let steps = match params.get_array("steps") {
            Some(steps) if !steps.is_empty() => steps,
            _ => {
                return Err(ActionFailure::Invalid(
                    "No steps provided for multi-step command".to_string(),
                ))
            }
        };

        let delay = self.seconds(params, "delay", 2.0);
        let stop_on_error = params.get_bool("stop_on_error").unwrap_or(false);
        let show_progress = params.get_bool("show_progress").unwrap_or(true);
        let total = steps.len();

        let mut lines = vec![format!(
            "🔄 Executing multi-step sequence ({} steps)...",
            total
        )];
        if show_progress {
            lines.push(format!(
                "⚙️ Settings: {:.1}s delay, {} on error",
                delay.as_secs_f64(),
                if stop_on_error { "stop" } else { "continue" }
            ));
        }

        let (mut succeeded, mut failed) = (0usize, 0usize);
        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            if show_progress {
                lines.push(format!("🎯 Step {}/{}: Processing...", number, total));
            }

            let failure = match parse_step(step, entity) {
                Step::Invalid(reason) => Some(format!("❌ Step {}: {}", number, reason)),
                Step::Run(command) => match command.action.parse::<Action>() {
                    Err(_) => Some(format!(
                        "❌ Step {}: Unknown action '{}'",
                        number, command.action
                    )),
                    Ok(action) => {
                        match self.run_action(renderer, action, &command.entity, &command.parameters)
                        {
                            ActionOutcome::Done(message) => {
                                lines.push(format!("✅ Step {}: {}", number, message));
                                None
                            }
                            outcome => {
                                Some(format!("⚠️ Step {}: {}", number, outcome.into_message()))
                            }
                        }
                    }
                },
            };

            match failure {
                Some(line) => {
                    lines.push(line);
                    failed += 1;
                    if stop_on_error {
                        lines.push("🛑 Stopping multi-step sequence due to step failure".to_string());
                        break;
                    }
                }
                None => succeeded += 1,
            }

            if number < total && !delay.is_zero() {
                if show_progress {
                    lines.push(format!(
                        "⏰ Waiting {:.1}s before next step...",
                        delay.as_secs_f64()
                    ));
                }
                self.pause(delay);
            }
        }

        let attempted = succeeded + failed;
        lines.push("📊 Multi-step sequence completed!".to_string());
        lines.push(format!(
            "✅ Successful: {}/{}, ❌ Failed: {}/{}",
            succeeded, attempted, failed, attempted
        ));
        lines.push(
            if succeeded == total {
                "🎉 All steps completed successfully!"
            } else if succeeded > 0 {
                "⚠️ Partial success - some steps failed"
            } else {
                "💥 All steps failed"
            }
            .to_string(),
        );
        Ok(lines.join("\n"))
    }

    pub(super) fn stream_tour(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let entity = require_entity(
            entity,
            "Please specify destination for stream tour (e.g., 'Jupiter', 'solar system')",
        )?;
        match tour_route(entity) {
            Some(route) => Ok(self.stream_route(renderer, entity, route, params)),
            None => self.stream_single(renderer, entity, params),
        }
    }

    fn capture(&self, renderer: &Renderer<'_>, filename: String) -> bool {
        match self.take_screenshot(renderer, &Params::new().with("filename", filename)) {
            Ok(message) => message.starts_with('📸'),
            Err(e) => {
                log::warn!("⚠️ Stream screenshot failed: {}", e);
                false
            }
        }
    }

    fn stream_route(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        route: &[&str],
        params: &Params,
    ) -> String {
        let delay = self.seconds(params, "delay", 4.0);
        let screenshot_each = params.get_bool("screenshot_each").unwrap_or(true);
        let stop_params = navigation_params(true, 3.0);
        let total = route.len();

        let mut lines = vec![
            format!(
                "📺 Starting live stream tour of {} ({} destinations)...",
                entity, total
            ),
            "🔴 LIVE - Broadcasting cosmic exploration!".to_string(),
        ];

        for (index, stop) in route.iter().enumerate() {
            let number = index + 1;
            lines.push(format!(
                "📡 STREAM UPDATE {}/{}: Approaching {}...",
                number, total, stop
            ));
            if !self
                .run_action(renderer, Action::GoTo, stop, &stop_params)
                .is_success()
            {
                lines.push(format!("⚠️ STREAM: Failed to reach {}, continuing...", stop));
                continue;
            }

            if screenshot_each {
                let filename = format!(
                    "stream_tour_{}_{}_{}.jpg",
                    slug(entity),
                    number,
                    slug(stop)
                );
                if self.capture(renderer, filename) {
                    lines.push(format!(
                        "📸 CAPTURED: {} screenshot for stream archive",
                        stop
                    ));
                }
            }

            lines.push(format!("🌟 LIVE from {}: Spectacular cosmic views!", stop));
            lines.push(format!(
                "👀 Viewers are now experiencing the beauty of {}",
                stop
            ));
            if number < total {
                lines.push(format!(
                    "⏰ Next destination in {:.1} seconds...",
                    delay.as_secs_f64()
                ));
                self.pause(delay);
            }
        }

        lines.push(format!(
            "🎬 STREAM COMPLETE: {} tour finished! Thanks for watching!",
            entity
        ));
        lines.push("📊 Stream archived for replay - cosmic memories preserved!".to_string());
        lines.join("\n")
    }

    fn stream_single(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let duration = self.seconds(params, "duration", 15.0);
        let orbit_speed = params.get_f64("orbit_speed").unwrap_or(0.5);

        let mut lines = vec![
            format!("📺 Starting live stream tour of {}...", entity),
            "🔴 LIVE - Single destination streaming experience!".to_string(),
            format!("📡 STREAM: Approaching {}...", entity),
        ];

        let approach = Params::new().with("smooth", true);
        if !self
            .run_action(renderer, Action::GoTo, entity, &approach)
            .is_success()
        {
            return Err(ActionFailure::Failed(format!(
                "Stream tour failed: Could not reach {}",
                entity
            )));
        }
        lines.push(format!(
            "🌟 LIVE from {}: Welcome to our cosmic destination!",
            entity
        ));

        let on_failure = || super::handlers::failed("Stream tour failed".to_string());
        if renderer.supports("setCameraOrbitObject") {
            renderer
                .set_camera_orbit_object(entity, STREAM_ORBIT_DISTANCE, orbit_speed)
                .map_err(on_failure())?;
            lines.push(format!(
                "🌌 STREAM: Orbital camera activated - 360° views of {}",
                entity
            ));

            let interval = self.pacing.stream_interval;
            let updates = if interval.is_zero() {
                0
            } else {
                (duration.as_secs_f64() / interval.as_secs_f64()) as usize
            };
            for update in 0..updates {
                self.pause(interval);
                lines.push(format!(
                    "📺 STREAM UPDATE {}/{}: Still orbiting {}...",
                    update + 1,
                    updates,
                    entity
                ));
                lines.push(format!(
                    "✨ Discovering new angles and cosmic details of {}",
                    entity
                ));
                if update % 2 == 0 {
                    let filename = format!("stream_{}_angle_{}.jpg", slug(entity), update + 1);
                    if self.capture(renderer, filename) {
                        lines.push(format!(
                            "📸 CAPTURED: Orbital view #{} for stream archive",
                            update + 1
                        ));
                    }
                }
            }
        } else {
            if renderer.supports("setCameraFocus") {
                renderer.set_camera_focus(entity).map_err(on_failure())?;
                lines.push(format!(
                    "📹 STREAM: Camera locked on {} - detailed observation mode",
                    entity
                ));
            }
            self.pause(duration);
            lines.push(format!(
                "🔍 STREAM: Extended observation of {} completed",
                entity
            ));
        }

        self.set_last_target(entity);
        lines.push(format!("🎭 STREAM FINALE: {} tour completed!", entity));
        lines.push("📊 Stream archived - cosmic adventure recorded for posterity!".to_string());
        Ok(lines.join("\n"))
    }
}
