use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use std::time::Duration;

use super::{require_entity, ActionFailure, Dispatcher};
use crate::llm::Params;
use crate::remote::{RemoteError, Renderer};

const SMOOTH_DURATION: f64 = 5.0;
const BACK_TO_SPACE_DISTANCE: f64 = 10_000.0;
const ORBIT_DISTANCE: f64 = 10.0;
const ORBIT_SPEED: f64 = 1.0;
const ZOOM_STEP_DISTANCE: f64 = 1000.0;

/// Keep connection losses intact so the dispatcher can drop the handle;
/// everything else becomes a failure described in the user's terms.
pub(super) fn failed(context: String) -> impl FnOnce(RemoteError) -> ActionFailure {
    move |error| match error {
        RemoteError::Connection(_) => ActionFailure::Remote(error),
        other => ActionFailure::Failed(format!("{}: {}", context, other)),
    }
}

/// How to fly to a target
#[derive(Debug, Clone, Copy)]
pub(super) struct Approach {
    pub smooth: bool,
    pub angle: f64,
    pub duration: f64,
}

impl Approach {
    /// Flight settings from parameters; the transition time is capped at `max`
    pub fn from_params(params: &Params, max: Duration) -> Self {
        Self {
            smooth: params.get_bool("smooth").unwrap_or(true),
            angle: params.get_f64("angle").unwrap_or(0.0),
            duration: params
                .get_f64("duration")
                .filter(|d| *d >= 0.0)
                .unwrap_or(SMOOTH_DURATION)
                .min(max.as_secs_f64()),
        }
    }
}

impl Dispatcher {
    /// Start a flight without waiting for it. Each preferred operation
    /// falls back to `goToObject`; a lost connection stops the attempt.
    pub(super) fn navigate(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        approach: Approach,
    ) -> Result<String, ActionFailure> {
        let first = if approach.smooth {
            renderer
                .go_to_object_smooth(entity, approach.angle, approach.duration)
                .map(|_| {
                    log::info!(
                        "✈️ Smooth navigation to {} initiated (angle={}, duration={})",
                        entity,
                        approach.angle,
                        approach.duration
                    );
                    format!("✈️ Successfully navigated to {} (smooth)!", entity)
                })
        } else {
            renderer.go_to_object_instant(entity).map(|_| {
                log::info!("✈️ Instant navigation to {} completed", entity);
                format!("✈️ Instantly navigated to {}!", entity)
            })
        };

        match first {
            Ok(message) => return Ok(message),
            Err(e @ RemoteError::Connection(_)) => return Err(e.into()),
            Err(e) => log::warn!("⚠️ Preferred navigation failed: {}, trying fallback...", e),
        }

        match renderer.go_to_object(entity) {
            Ok(()) => {
                log::info!("✈️ Navigation to {} initiated (basic)", entity);
                Ok(format!("✈️ Successfully navigated to {}!", entity))
            }
            Err(e @ RemoteError::Connection(_)) => Err(e.into()),
            Err(e) => {
                log::warn!("⚠️ goToObject failed: {}", e);
                Err(ActionFailure::Failed(format!(
                    "All navigation methods failed for {}",
                    entity
                )))
            }
        }
    }

    pub(super) fn go_to(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let entity = require_entity(entity, "Please specify where to go (e.g., 'Mars', 'Jupiter')")?;
        self.navigate(
            renderer,
            entity,
            Approach::from_params(params, self.pacing.max_delay),
        )
    }

    pub(super) fn land_on(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let entity = require_entity(entity, "Please specify where to land (e.g., 'Moon', 'Mars')")?;
        let on_failure = || failed(format!("Landing on {} failed", entity));

        let location = match (params.get_f64("latitude"), params.get_f64("longitude")) {
            (Some(latitude), Some(longitude)) => {
                if !renderer.supports("landAtObjectLocation") {
                    return Err(ActionFailure::Unsupported(format!(
                        "Landing at coordinates not supported for {}",
                        entity
                    )));
                }
                renderer
                    .land_at_object_location(entity, latitude, longitude)
                    .map_err(on_failure())?;
                log::info!("🛬 Landing on {} at ({}, {})", entity, latitude, longitude);
                format!(" at coordinates ({:.2}, {:.2})", latitude, longitude)
            }
            _ => {
                if !renderer.supports("landOnObject") {
                    return Err(ActionFailure::Unsupported(format!(
                        "Landing not supported for {}",
                        entity
                    )));
                }
                renderer.land_on_object(entity).map_err(on_failure())?;
                log::info!("🛬 Landing on {} at default location", entity);
                String::new()
            }
        };

        Ok(format!("🛬 Successfully landed on {}{}!", entity, location))
    }

    pub(super) fn track(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
    ) -> Result<String, ActionFailure> {
        let entity =
            require_entity(entity, "Please specify what to track (e.g., 'Saturn', 'Jupiter')")?;
        if !renderer.supports("setCameraFocus") {
            return Err(ActionFailure::Unsupported(format!(
                "Tracking not supported for {}",
                entity
            )));
        }

        let on_failure = || failed(format!("Tracking {} failed", entity));
        renderer.set_camera_focus(entity).map_err(on_failure())?;
        if renderer.supports("setCameraTrackingObject") {
            renderer
                .set_camera_tracking_object(entity)
                .map_err(on_failure())?;
            log::info!("👁️ Camera tracking mode activated for {}", entity);
        }

        Ok(format!(
            "👁️ Now tracking {}... Camera will follow its movement!",
            entity
        ))
    }

    pub(super) fn explore(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let entity =
            require_entity(entity, "Please specify what to explore (e.g., 'Venus', 'Saturn')")?;
        let on_failure = || failed(format!("Exploration of {} failed", entity));
        let approach = Approach::from_params(params, self.pacing.max_delay);

        if renderer.supports("goToObjectSmooth") {
            renderer
                .go_to_object_smooth(entity, approach.angle, approach.duration)
                .map_err(on_failure())?;
            if renderer.supports("waitFocus") {
                renderer.wait_focus().map_err(on_failure())?;
            }
        }
        if renderer.supports("setCameraFocus") {
            renderer.set_camera_focus(entity).map_err(on_failure())?;
        }
        if renderer.supports("cameraTransition") {
            renderer.camera_transition(entity).map_err(on_failure())?;
        }

        Ok(format!(
            "🌌 Exploring {} in cinematic mode... Discovering cosmic wonders!",
            entity
        ))
    }

    pub(super) fn orbit(
        &self,
        renderer: &Renderer<'_>,
        entity: &str,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let entity =
            require_entity(entity, "Please specify what to orbit (e.g., 'Earth', 'Jupiter')")?;
        let distance = params.get_f64("distance").unwrap_or(ORBIT_DISTANCE);
        let speed = params.get_f64("speed").unwrap_or(ORBIT_SPEED);

        let approach = Approach {
            smooth: true,
            angle: 0.0,
            duration: SMOOTH_DURATION,
        };
        match self.navigate(renderer, entity, approach) {
            Ok(_) => {}
            Err(failure @ ActionFailure::Remote(RemoteError::Connection(_))) => return Err(failure),
            Err(_) => {
                return Err(ActionFailure::Failed(format!(
                    "Cannot orbit {}: Failed to navigate there first",
                    entity
                )))
            }
        }
        self.set_last_target(entity);

        let on_failure = || failed(format!("Orbiting {} failed", entity));
        if renderer.supports("setCameraOrbitObject") {
            renderer
                .set_camera_orbit_object(entity, distance, speed)
                .map_err(on_failure())?;
            log::info!(
                "🌌 Orbital camera set for {} (distance={}, speed={})",
                entity,
                distance,
                speed
            );
            Ok(format!(
                "🌌 Now orbiting {} at distance {:.1}x with speed {:.1}x!",
                entity, distance, speed
            ))
        } else if renderer.supports("setCameraFocus") {
            renderer.set_camera_focus(entity).map_err(on_failure())?;
            Ok(format!(
                "🌌 Tracking {} (orbit mode not available, using focus tracking)",
                entity
            ))
        } else {
            Err(ActionFailure::Unsupported(format!(
                "Orbit functionality not available for {}",
                entity
            )))
        }
    }

    pub(super) fn take_screenshot(
        &self,
        renderer: &Renderer<'_>,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let on_failure = || failed("Screenshot failed".to_string());
        let width = dimension(params, "width", 1920);
        let height = dimension(params, "height", 1080);
        let quality = dimension(params, "quality", 95);

        if renderer.supports("configureScreenshots") {
            renderer
                .configure_screenshots(width, height, quality)
                .map_err(on_failure())?;
            log::info!(
                "📸 Screenshot configured: {}x{} at {}% quality",
                width,
                height,
                quality
            );
        }

        if !renderer.supports("takeScreenshot") {
            return Err(ActionFailure::Unsupported(
                "Screenshot functionality not available".to_string(),
            ));
        }
        renderer.take_screenshot().map_err(on_failure())?;
        log::info!("📸 Screenshot captured");

        match params.get_str("filename") {
            Some(filename) if renderer.supports("saveScreenshot") => {
                renderer.save_screenshot(filename).map_err(on_failure())?;
                Ok(format!("📸 Screenshot saved as '{}'!", filename))
            }
            _ => Ok("📸 Screenshot captured and saved to default directory!".to_string()),
        }
    }

    pub(super) fn set_time(
        &self,
        renderer: &Renderer<'_>,
        params: &Params,
    ) -> Result<String, ActionFailure> {
        let field = |key: &str, default: i64| params.get_i64(key).unwrap_or(default);
        let year = field("year", i64::from(Local::now().year()));
        let (month, day) = (field("month", 1), field("day", 1));
        let (hour, minute, second) = (field("hour", 12), field("minute", 0), field("second", 0));

        let date = i32::try_from(year)
            .ok()
            .zip(u32::try_from(month).ok())
            .zip(u32::try_from(day).ok())
            .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d));
        let time = u32::try_from(hour)
            .ok()
            .zip(u32::try_from(minute).ok())
            .zip(u32::try_from(second).ok())
            .and_then(|((h, mi), s)| NaiveTime::from_hms_opt(h, mi, s));
        let (Some(date), Some(time)) = (date, time) else {
            return Err(ActionFailure::Invalid(format!(
                "Invalid date or time: {}-{}-{} {}:{}:{}",
                year, month, day, hour, minute, second
            )));
        };

        if !renderer.supports("setSimulationTime") {
            return Err(ActionFailure::Unsupported(
                "Time control not available".to_string(),
            ));
        }
        renderer
            .set_simulation_time([year, month, day, hour, minute, second])
            .map_err(failed("Time setting failed".to_string()))?;

        let stamp = date.and_time(time).format("%Y-%m-%d %H:%M:%S");
        log::info!("⏰ Time set to {}", stamp);
        Ok(format!("⏰ Time set to {}", stamp))
    }

    pub(super) fn free_camera(&self, renderer: &Renderer<'_>) -> Result<String, ActionFailure> {
        let on_failure = || failed("Camera free failed".to_string());
        if renderer.supports("cameraStop") {
            renderer.camera_stop().map_err(on_failure())?;
        }
        if renderer.supports("setCameraFree") {
            renderer.set_camera_free().map_err(on_failure())?;
            log::info!("🔓 Camera set to free mode");
        }
        if renderer.supports("enableInput") {
            renderer.enable_input().map_err(on_failure())?;
        }
        Ok("🔓 Camera freed! You can now navigate freely again.".to_string())
    }

    pub(super) fn stop_camera(&self, renderer: &Renderer<'_>) -> Result<String, ActionFailure> {
        if !renderer.supports("cameraStop") {
            return Err(ActionFailure::Unsupported(
                "Camera stop functionality not available".to_string(),
            ));
        }
        renderer
            .camera_stop()
            .map_err(failed("Camera stop failed".to_string()))?;
        Ok("⏹️ Camera movement stopped!".to_string())
    }

    pub(super) fn back_to_space(&self, renderer: &Renderer<'_>) -> Result<String, ActionFailure> {
        let on_failure = || failed("Back to space failed".to_string());
        if renderer.supports("cameraStop") {
            renderer.camera_stop().map_err(on_failure())?;
        }
        if renderer.supports("setCameraFree") {
            renderer.set_camera_free().map_err(on_failure())?;
        }
        if let Some(target) = self.last_target() {
            if renderer.supports("cameraForward") {
                renderer
                    .camera_forward(BACK_TO_SPACE_DISTANCE)
                    .map_err(on_failure())?;
                log::info!("🚀 Camera moved away from {}", target);
            }
        }
        Ok("🚀 Back to space! Camera moved away from surface.".to_string())
    }

    pub(super) fn zoom(
        &self,
        renderer: &Renderer<'_>,
        params: &Params,
        zoom_in: bool,
    ) -> Result<String, ActionFailure> {
        let direction = if zoom_in { "in" } else { "out" };
        let on_failure = || failed(format!("Zoom {} failed", direction));
        let factor = params
            .get_f64("factor")
            .filter(|f| *f > 0.0)
            .unwrap_or(if zoom_in { 2.0 } else { 0.5 });

        if renderer.supports("setCameraZoom") {
            let current = if renderer.supports("getCameraZoom") {
                renderer.camera_zoom().unwrap_or(1.0)
            } else {
                1.0
            };
            let zoom = current * factor;
            renderer.set_camera_zoom(zoom).map_err(on_failure())?;
            log::info!("🔍 Camera zoomed by factor {} (new zoom: {})", factor, zoom);
            let shown = if zoom_in { factor } else { 1.0 / factor };
            return Ok(format!(
                "🔍 Zoomed {} by {:.1}x (total zoom: {:.1}x)",
                direction, shown, zoom
            ));
        }

        let distance = params.get_f64("distance").unwrap_or(ZOOM_STEP_DISTANCE);
        if zoom_in && renderer.supports("cameraForward") {
            renderer.camera_forward(distance).map_err(on_failure())?;
            Ok(format!("🔍 Moved camera forward {} units", distance))
        } else if !zoom_in && renderer.supports("cameraBackward") {
            renderer.camera_backward(distance).map_err(on_failure())?;
            Ok(format!("🔍 Moved camera backward {} units", distance))
        } else {
            Err(ActionFailure::Unsupported(
                "Zoom functionality not available".to_string(),
            ))
        }
    }

    pub(super) fn change_speed(
        &self,
        renderer: &Renderer<'_>,
        params: &Params,
        faster: bool,
    ) -> Result<String, ActionFailure> {
        let on_failure = || {
            failed(if faster { "Speed up failed" } else { "Slow down failed" }.to_string())
        };
        let factor = params
            .get_f64("factor")
            .filter(|f| *f > 0.0)
            .unwrap_or(if faster { 2.0 } else { 0.5 });

        if renderer.supports("setSimulationSpeed") {
            let current = if renderer.supports("getSimulationSpeed") {
                renderer.simulation_speed()
            } else {
                Ok(1.0)
            };
            return match current {
                Ok(current) => {
                    let speed = current * factor;
                    renderer.set_simulation_speed(speed).map_err(on_failure())?;
                    log::info!("⚡ Simulation speed changed by {}x (new speed: {})", factor, speed);
                    Ok(if faster {
                        format!("⚡ Simulation speed increased to {:.1}x!", speed)
                    } else {
                        format!("🐌 Simulation speed decreased to {:.1}x", speed)
                    })
                }
                Err(e) => {
                    log::warn!("⚠️ Could not read simulation speed: {}", e);
                    renderer.set_simulation_speed(factor).map_err(on_failure())?;
                    Ok(if faster {
                        format!("⚡ Simulation speed set to {:.1}x!", factor)
                    } else {
                        format!("🐌 Simulation speed set to {:.1}x", factor)
                    })
                }
            };
        }

        if faster && renderer.supports("accelerateTime") {
            renderer.accelerate_time().map_err(on_failure())?;
            Ok("⚡ Time acceleration activated!".to_string())
        } else if !faster && renderer.supports("decelerateTime") {
            renderer.decelerate_time().map_err(on_failure())?;
            Ok("🐌 Time deceleration activated!".to_string())
        } else {
            Err(ActionFailure::Unsupported(
                "Speed control not available".to_string(),
            ))
        }
    }
}

fn dimension(params: &Params, key: &str, default: u32) -> u32 {
    params
        .get_i64(key)
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(default)
}
