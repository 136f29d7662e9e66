mod common;

use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use astro_remote::completion::CompletionConfig;
use astro_remote::dispatcher::Pacing;
use astro_remote::llm::Params;
use astro_remote::remote::RemoteError;
use common::{
    dispatcher_for, dispatcher_timed, dispatcher_with, MockConnector, MockRenderer, ScriptedParser,
    UnreachableConnector,
};

fn mars_parser() -> ScriptedParser {
    ScriptedParser::new().with("take me to mars", "go_to", "Mars", Params::new())
}

#[test_log::test]
fn test_go_to_flies_smoothly_and_remembers_target() {
    let renderer = Arc::new(MockRenderer::new());
    let dispatcher = dispatcher_for(&renderer, mars_parser());

    let result = dispatcher.execute_command("take me to mars");
    assert_eq!(result, "✈️ Successfully navigated to Mars (smooth)!");
    assert_eq!(
        renderer.args_of("goToObjectSmooth"),
        Some(vec![json!("Mars"), json!(0.0), json!(5.0)])
    );
    assert_eq!(renderer.count("goToObject"), 0);
    assert_eq!(dispatcher.last_target().as_deref(), Some("Mars"));
}

#[test_log::test]
fn test_repeated_go_to_is_skipped() {
    let renderer = Arc::new(MockRenderer::new());
    let dispatcher = dispatcher_for(&renderer, mars_parser());

    dispatcher.execute_command("take me to mars");
    let result = dispatcher.execute_command("take me to mars");
    assert_eq!(result, "🧠 Smart Agent: Already at Mars - no navigation needed");
    assert_eq!(renderer.count("goToObjectSmooth"), 1);
}

#[test_log::test]
fn test_go_to_falls_back_to_basic_navigation() {
    let renderer = Arc::new(MockRenderer::new().without(&["goToObjectSmooth"]));
    let dispatcher = dispatcher_for(&renderer, mars_parser());

    let result = dispatcher.execute_command("take me to mars");
    assert_eq!(result, "✈️ Successfully navigated to Mars!");
    assert_eq!(renderer.args_of("goToObject"), Some(vec![json!("Mars")]));
    assert_eq!(renderer.count("goToObjectSmooth"), 0);
}

#[test_log::test]
fn test_all_navigation_methods_failing() {
    let broken = RemoteError::Call {
        name: "goToObject".to_string(),
        message: "object not found".to_string(),
    };
    let renderer = Arc::new(
        MockRenderer::new()
            .without(&["goToObjectSmooth"])
            .with_response("goToObject", Err(broken)),
    );
    let dispatcher = dispatcher_for(&renderer, mars_parser());

    let result = dispatcher.execute_command("take me to mars");
    assert_eq!(result, "❌ All navigation methods failed for Mars");
    assert_eq!(dispatcher.last_target(), None);
}

#[test_log::test]
fn test_alias_resolves_to_catalogue_name() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with("visit the red planet", "go_to", "red planet", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("visit the red planet");
    assert_eq!(result, "✈️ Successfully navigated to Mars (smooth)!");
    assert_eq!(
        renderer.args_of("goToObjectSmooth").map(|args| args[0].clone()),
        Some(json!("Mars"))
    );
    assert_eq!(dispatcher.last_target().as_deref(), Some("Mars"));
}

#[test_log::test]
fn test_unknown_object_is_rejected_before_any_call() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with("fly to zorgon", "go_to", "Zorgon-7", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("fly to zorgon");
    assert!(result.starts_with("❌ Unknown celestial object: 'Zorgon-7'"), "{}", result);
    assert!(renderer.actions().is_empty());
}

#[test_log::test]
fn test_unusable_input_never_reaches_renderer() {
    let renderer = Arc::new(MockRenderer::new());
    let dispatcher = dispatcher_for(&renderer, ScriptedParser::new());

    assert_eq!(
        dispatcher.execute_command("   "),
        "❌ Empty command. Please provide a valid space navigation command."
    );
    assert_eq!(
        dispatcher.execute_command("go"),
        "❌ Command too short. Please provide a more detailed instruction."
    );
    assert_eq!(
        dispatcher.execute_command("make me a sandwich"),
        "❌ Could not understand command: 'make me a sandwich'"
    );
    assert!(renderer.actions().is_empty());
}

#[test_log::test]
fn test_unknown_action_from_parser() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with("engage warp", "warp_drive", "", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    assert_eq!(dispatcher.execute_command("engage warp"), "❌ Unknown action: warp_drive");
}

#[test_log::test]
fn test_unreachable_renderer_reports_connection_error() {
    let dispatcher = dispatcher_with(Box::new(UnreachableConnector), mars_parser());

    let state = dispatcher.current_state();
    assert!(!state.connected);
    assert!(state.error.is_some());

    assert_eq!(
        dispatcher.execute_command("take me to mars"),
        "❌ No connection to Gaia Sky: connection refused"
    );
}

#[test_log::test]
fn test_lost_connection_is_reestablished_on_next_command() {
    let renderer = Arc::new(MockRenderer::new().with_response(
        "goToObjectSmooth",
        Err(RemoteError::Connection("connection reset".to_string())),
    ));
    let connector = MockConnector::new(Arc::clone(&renderer));
    let connects = connector.connect_counter();
    let parser = mars_parser().with("stop the camera", "stop_camera", "", Params::new());
    let dispatcher = dispatcher_with(Box::new(connector), parser);

    let result = dispatcher.execute_command("take me to mars");
    assert_eq!(result, "❌ No connection to Gaia Sky: connection reset");
    assert!(!dispatcher.connection().is_connected());
    assert_eq!(connects.load(Ordering::SeqCst), 1);

    let result = dispatcher.execute_command("stop the camera");
    assert_eq!(result, "⏹️ Camera movement stopped!");
    assert_eq!(connects.load(Ordering::SeqCst), 2);
}

#[test_log::test]
fn test_capabilities_are_probed_once_per_operation() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = mars_parser().with("go to jupiter", "go_to", "Jupiter", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    dispatcher.execute_command("take me to mars");
    let probes = renderer.probe_count();
    assert!(probes > 0);

    dispatcher.execute_command("go to jupiter");
    assert_eq!(renderer.probe_count(), probes);
    assert_eq!(renderer.count("goToObjectSmooth"), 2);
}

#[test_log::test]
fn test_land_on_with_coordinates() {
    let renderer = Arc::new(MockRenderer::new());
    let params = Params::new().with("latitude", 10.5).with("longitude", -20.0);
    let parser = ScriptedParser::new().with("land on the moon near the crater", "land_on", "Moon", params);
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("land on the moon near the crater");
    assert_eq!(
        result,
        "🛬 Successfully landed on Moon at coordinates (10.50, -20.00)!"
    );
    assert_eq!(
        renderer.args_of("landAtObjectLocation"),
        Some(vec![json!("Moon"), json!(10.5), json!(-20.0)])
    );
    assert_eq!(dispatcher.last_target().as_deref(), Some("Moon"));
}

#[test_log::test]
fn test_land_on_unsupported() {
    let renderer = Arc::new(MockRenderer::new().without(&["landOnObject", "landAtObjectLocation"]));
    let parser = ScriptedParser::new()
        .with("land on the moon", "land_on", "Moon", Params::new())
        .with(
            "land on the moon at the pole",
            "land_on",
            "Moon",
            Params::new().with("latitude", 90.0).with("longitude", 0.0),
        );
    let dispatcher = dispatcher_for(&renderer, parser);

    assert_eq!(
        dispatcher.execute_command("land on the moon"),
        "❌ Landing not supported for Moon"
    );
    assert_eq!(
        dispatcher.execute_command("land on the moon at the pole"),
        "❌ Landing at coordinates not supported for Moon"
    );
    assert_eq!(dispatcher.last_target(), None);
}

#[test_log::test]
fn test_track_focuses_and_follows() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with("follow saturn", "track", "Saturn", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("follow saturn");
    assert_eq!(result, "👁️ Now tracking Saturn... Camera will follow its movement!");
    assert_eq!(
        renderer.actions(),
        vec!["setCameraFocus", "setCameraTrackingObject"]
    );
    // Tracking does not move the camera to the object
    assert_eq!(dispatcher.last_target(), None);
}

#[test_log::test]
fn test_orbit_navigates_then_orbits() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with("orbit jupiter", "orbit", "Jupiter", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("orbit jupiter");
    assert_eq!(result, "🌌 Now orbiting Jupiter at distance 10.0x with speed 1.0x!");
    assert_eq!(renderer.actions(), vec!["goToObjectSmooth", "setCameraOrbitObject"]);
    assert_eq!(
        renderer.args_of("setCameraOrbitObject"),
        Some(vec![json!("Jupiter"), json!(10.0), json!(1.0)])
    );
    assert_eq!(dispatcher.last_target().as_deref(), Some("Jupiter"));
}

#[test_log::test]
fn test_orbit_falls_back_to_focus() {
    let renderer = Arc::new(MockRenderer::new().without(&["setCameraOrbitObject"]));
    let parser = ScriptedParser::new().with("orbit jupiter", "orbit", "Jupiter", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    assert_eq!(
        dispatcher.execute_command("orbit jupiter"),
        "🌌 Tracking Jupiter (orbit mode not available, using focus tracking)"
    );
}

#[test_log::test]
fn test_screenshot_configures_and_saves() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new()
        .with(
            "take a picture",
            "take_screenshot",
            "",
            Params::new().with("filename", "mars.png"),
        )
        .with("snap", "take_screenshot", "", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    assert_eq!(
        dispatcher.execute_command("take a picture"),
        "📸 Screenshot saved as 'mars.png'!"
    );
    assert_eq!(
        renderer.args_of("configureScreenshots"),
        Some(vec![json!(1920), json!(1080), json!(95)])
    );
    assert_eq!(renderer.args_of("saveScreenshot"), Some(vec![json!("mars.png")]));

    assert_eq!(
        dispatcher.execute_command("snap"),
        "📸 Screenshot captured and saved to default directory!"
    );
    assert_eq!(renderer.count("saveScreenshot"), 1);
}

#[test_log::test]
fn test_set_time_validates_calendar() {
    let renderer = Arc::new(MockRenderer::new());
    let landing = Params::new()
        .with("year", 1969)
        .with("month", 7)
        .with("day", 20)
        .with("hour", 20)
        .with("minute", 17);
    let parser = ScriptedParser::new()
        .with("show the moon landing", "set_time", "", landing)
        .with("set the date to month thirteen", "set_time", "", Params::new().with("month", 13));
    let dispatcher = dispatcher_for(&renderer, parser);

    assert_eq!(
        dispatcher.execute_command("show the moon landing"),
        "⏰ Time set to 1969-07-20 20:17:00"
    );
    assert_eq!(
        renderer.args_of("setSimulationTime"),
        Some(vec![json!(1969), json!(7), json!(20), json!(20), json!(17), json!(0)])
    );

    let result = dispatcher.execute_command("set the date to month thirteen");
    assert!(result.starts_with("❌ Invalid date or time:"), "{}", result);
    assert_eq!(renderer.count("setSimulationTime"), 1);
}

#[test_log::test]
fn test_zoom_uses_zoom_factor_or_camera_distance() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new()
        .with("zoom in", "zoom_in", "", Params::new())
        .with("zoom out", "zoom_out", "", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    assert_eq!(
        dispatcher.execute_command("zoom in"),
        "🔍 Zoomed in by 2.0x (total zoom: 2.0x)"
    );
    assert_eq!(
        dispatcher.execute_command("zoom out"),
        "🔍 Zoomed out by 2.0x (total zoom: 0.5x)"
    );

    let renderer = Arc::new(MockRenderer::new().without(&["setCameraZoom"]));
    let parser = ScriptedParser::new().with("zoom out", "zoom_out", "", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);
    assert_eq!(
        dispatcher.execute_command("zoom out"),
        "🔍 Moved camera backward 1000 units"
    );
    assert_eq!(renderer.args_of("cameraBackward"), Some(vec![json!(1000.0)]));
}

#[test_log::test]
fn test_speed_changes_relative_to_current_speed() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with("faster", "speed_up", "", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);
    assert_eq!(
        dispatcher.execute_command("faster"),
        "⚡ Simulation speed increased to 2.0x!"
    );

    let renderer = Arc::new(MockRenderer::new().with_response(
        "getSimulationSpeed",
        Err(RemoteError::Call {
            name: "getSimulationSpeed".to_string(),
            message: "not ready".to_string(),
        }),
    ));
    let parser = ScriptedParser::new().with("slower", "slow_down", "", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);
    assert_eq!(
        dispatcher.execute_command("slower"),
        "🐌 Simulation speed set to 0.5x"
    );
    assert_eq!(renderer.args_of("setSimulationSpeed"), Some(vec![json!(0.5)]));
}

#[test_log::test]
fn test_free_camera_skipped_when_far_out() {
    let renderer = Arc::new(MockRenderer::new().with_positions(vec![[150_000.0, 0.0, 0.0]]));
    let parser = ScriptedParser::new().with("free the camera", "free_camera", "", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    assert_eq!(
        dispatcher.execute_command("free the camera"),
        "🧠 Smart Agent: Camera already appears to be free in space"
    );
    assert!(renderer.actions().is_empty());
}

#[test_log::test]
fn test_back_to_space_moves_away_from_last_target() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = mars_parser().with("back to space", "back_to_space", "", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    dispatcher.execute_command("take me to mars");
    let result = dispatcher.execute_command("back to space");
    assert_eq!(result, "🚀 Back to space! Camera moved away from surface.");
    assert_eq!(renderer.args_of("cameraForward"), Some(vec![json!(10_000.0)]));
}

#[test_log::test]
fn test_tour_visits_every_stop_in_order() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with(
        "show me the gas giants",
        "tour",
        "gas giants",
        Params::new().with("delay", 0.0),
    );
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("show me the gas giants");
    let lines: Vec<&str> = result.lines().collect();
    assert_eq!(lines[0], "🎬 Starting gas giants tour with 4 destinations...");
    assert_eq!(lines[1], "✅ Tour Stop 1/4: Jupiter");
    assert_eq!(lines[4], "✅ Tour Stop 4/4: Neptune");
    assert_eq!(
        lines.last().copied(),
        Some("🎉 Gas Giants tour completed! Visited 4 destinations.")
    );

    let visited: Vec<String> = renderer
        .calls()
        .into_iter()
        .filter(|(name, _)| name == "goToObjectSmooth")
        .map(|(_, args)| args[0].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(visited, vec!["Jupiter", "Saturn", "Uranus", "Neptune"]);
}

#[test_log::test]
fn test_tour_continues_past_unreachable_stop() {
    let renderer = Arc::new(MockRenderer::new().without(&["goToObjectSmooth", "goToObject"]));
    let parser = ScriptedParser::new().with(
        "tour the inner planets",
        "tour",
        "inner planets",
        Params::new().with("delay", 0.0),
    );
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("tour the inner planets");
    assert!(result.contains("⚠️ Tour Stop 1/4: Failed to reach Mercury"));
    assert!(result.contains("⚠️ Tour Stop 4/4: Failed to reach Mars"));
    assert!(result.ends_with("Visited 4 destinations."));
}

#[test_log::test]
fn test_unknown_tour_lists_available_routes() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with("tour andromeda", "tour", "andromeda", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("tour andromeda");
    assert!(
        result.starts_with("❌ No tour route defined for 'andromeda'. Available tours: solar system, planets"),
        "{}",
        result
    );
}

#[test_log::test]
fn test_multi_step_reports_partial_success() {
    let renderer = Arc::new(MockRenderer::new());
    let steps = json!([
        {"action": "go_to", "entity": "Mars"},
        "take_screenshot",
        "hover"
    ]);
    let parser = ScriptedParser::new().with(
        "go to mars, take a picture, then hover",
        "multi_step",
        "",
        Params::new().with("steps", steps).with("delay", 0.0),
    );
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("go to mars, take a picture, then hover");
    assert!(result.contains("✅ Step 1: ✈️ Successfully navigated to Mars (smooth)!"));
    assert!(result.contains("✅ Step 2: 📸"));
    assert!(result.contains("❌ Step 3: Invalid step format: hover"));
    assert!(result.contains("✅ Successful: 2/3, ❌ Failed: 1/3"));
    assert!(result.ends_with("⚠️ Partial success - some steps failed"));
    assert_eq!(dispatcher.last_target().as_deref(), Some("Mars"));
}

#[test_log::test]
fn test_multi_step_stops_on_first_error() {
    let renderer = Arc::new(MockRenderer::new());
    let steps = json!(["warp_drive Mars", "go_to Mars"]);
    let parser = ScriptedParser::new().with(
        "warp then fly",
        "multi_step",
        "",
        Params::new()
            .with("steps", steps)
            .with("delay", 0.0)
            .with("stop_on_error", true),
    );
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("warp then fly");
    assert!(result.contains("❌ Step 1: Unknown action 'warp_drive'"));
    assert!(result.contains("🛑 Stopping multi-step sequence due to step failure"));
    assert!(result.contains("✅ Successful: 0/1, ❌ Failed: 1/1"));
    assert!(result.ends_with("💥 All steps failed"));
    assert_eq!(renderer.count("goToObjectSmooth"), 0);
}

#[test_log::test]
fn test_multi_step_without_steps() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with("do several things", "multi_step", "", Params::new());
    let dispatcher = dispatcher_for(&renderer, parser);

    assert_eq!(
        dispatcher.execute_command("do several things"),
        "❌ No steps provided for multi-step command"
    );
}

#[test_log::test]
fn test_cinematic_journey_sequence() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with(
        "take me on a cinematic journey to mars",
        "cinematic_journey",
        "Mars",
        Params::new(),
    );
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("take me on a cinematic journey to mars");
    assert!(result.starts_with("🎬 Starting cinematic journey to Mars..."));
    assert!(result.ends_with("🎭 Cinematic journey to Mars completed! Enjoy the spectacular view!"));
    assert_eq!(
        renderer.actions(),
        vec![
            "goToObjectSmooth",
            "setCameraFocus",
            "setCameraOrbitObject",
            "setSimulationSpeed",
            "setSimulationSpeed",
        ]
    );
    assert_eq!(
        renderer.args_of("goToObjectSmooth"),
        Some(vec![json!("Mars"), json!(0.0), json!(8.0)])
    );
    assert_eq!(
        renderer.args_of("setCameraOrbitObject"),
        Some(vec![json!("Mars"), json!(5.0), json!(0.3)])
    );
    assert_eq!(dispatcher.last_target().as_deref(), Some("Mars"));
}

#[test_log::test]
fn test_stream_tour_of_single_target_captures_alternate_updates() {
    let renderer = Arc::new(MockRenderer::new());
    // 22ms of streaming at 5ms per update gives four updates
    let parser = ScriptedParser::new().with(
        "stream saturn",
        "stream_tour",
        "Saturn",
        Params::new().with("duration", 0.022),
    );
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("stream saturn");
    assert!(result.contains("📺 STREAM UPDATE 4/4: Still orbiting Saturn..."));
    assert!(result.ends_with("📊 Stream archived - cosmic adventure recorded for posterity!"));

    let saved: Vec<String> = renderer
        .calls()
        .into_iter()
        .filter(|(name, _)| name == "saveScreenshot")
        .map(|(_, args)| args[0].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(saved, vec!["stream_saturn_angle_1.jpg", "stream_saturn_angle_3.jpg"]);
    assert_eq!(
        renderer.args_of("setCameraOrbitObject"),
        Some(vec![json!("Saturn"), json!(8.0), json!(0.5)])
    );
    assert_eq!(dispatcher.last_target().as_deref(), Some("Saturn"));
}

#[test_log::test]
fn test_stream_tour_of_route_captures_each_stop() {
    let renderer = Arc::new(MockRenderer::new());
    let parser = ScriptedParser::new().with(
        "stream the gas giants",
        "stream_tour",
        "gas giants",
        Params::new().with("delay", 0.0),
    );
    let dispatcher = dispatcher_for(&renderer, parser);

    let result = dispatcher.execute_command("stream the gas giants");
    assert!(result.contains("📡 STREAM UPDATE 1/4: Approaching Jupiter..."));
    assert!(result.contains("🎬 STREAM COMPLETE: gas giants tour finished! Thanks for watching!"));
    assert_eq!(renderer.count("saveScreenshot"), 4);
    assert_eq!(
        renderer.args_of("saveScreenshot"),
        Some(vec![json!("stream_tour_gas_giants_1_jupiter.jpg")])
    );
}

#[test_log::test]
fn test_blind_wait_covers_default_smooth_flight() {
    let renderer = Arc::new(MockRenderer::new().without(&["getCameraPosition"]));
    let dispatcher = dispatcher_timed(
        Box::new(MockConnector::new(Arc::clone(&renderer))),
        ScriptedParser::new(),
        CompletionConfig::default(),
    );

    let started = Instant::now();
    let outcome = dispatcher.execute_action("go_to", "Moon", &Params::new());
    let elapsed = started.elapsed();

    assert!(outcome.is_success());
    assert_eq!(
        renderer.args_of("goToObjectSmooth"),
        Some(vec![json!("Moon"), json!(0.0), json!(5.0)])
    );
    // Five second flight plus margin, not the Moon's two second bucket
    assert!(elapsed >= Duration::from_secs(5), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(8), "returned after {:?}", elapsed);
}

fn capped_pacing() -> Pacing {
    Pacing {
        effects_pause: Duration::ZERO,
        stream_interval: Duration::from_millis(5),
        max_delay: Duration::from_millis(32),
    }
}

#[test_log::test]
fn test_huge_tour_delay_is_capped() {
    let renderer = Arc::new(MockRenderer::new());
    let dispatcher = dispatcher_for(&renderer, ScriptedParser::new()).with_pacing(capped_pacing());

    let started = Instant::now();
    let outcome = dispatcher.execute_action("tour", "gas giants", &Params::new().with("delay", 1e300));

    assert!(outcome.is_success());
    assert_eq!(renderer.count("goToObjectSmooth"), 4);
    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
}

#[test_log::test]
fn test_huge_stream_duration_is_capped() {
    let renderer = Arc::new(MockRenderer::new());
    let dispatcher = dispatcher_for(&renderer, ScriptedParser::new()).with_pacing(capped_pacing());

    let started = Instant::now();
    let outcome =
        dispatcher.execute_action("stream_tour", "Saturn", &Params::new().with("duration", 1e300));

    assert!(outcome.is_success());
    // 32ms cap at 5ms per update
    assert!(outcome.into_message().contains("📺 STREAM UPDATE 6/6: Still orbiting Saturn..."));
    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
}

#[test_log::test]
fn test_huge_flight_duration_is_capped() {
    let renderer = Arc::new(MockRenderer::new().without(&["getCameraPosition"]));
    let dispatcher = dispatcher_for(&renderer, ScriptedParser::new()).with_pacing(capped_pacing());

    let started = Instant::now();
    let outcome = dispatcher.execute_action("go_to", "Mars", &Params::new().with("duration", 1e300));

    assert!(outcome.is_success());
    assert_eq!(
        renderer.args_of("goToObjectSmooth"),
        Some(vec![json!("Mars"), json!(0.0), json!(0.032)])
    );
    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
}
