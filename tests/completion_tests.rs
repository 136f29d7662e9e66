mod common;

use serial_test::serial;
use std::sync::Arc;
use std::time::{Duration, Instant};

use astro_remote::completion::{
    CompletionConfig, CompletionDetector, DistanceBucket, FallbackTimings, TransitionHints,
};
use astro_remote::llm::Params;
use astro_remote::remote::CapabilityRegistry;
use common::{fast_completion, MockRenderer};

fn detector(config: CompletionConfig) -> CompletionDetector {
    CompletionDetector::new(config, Arc::new(CapabilityRegistry::new()))
}

#[test_log::test]
#[serial]
fn test_navigation_returns_after_third_stable_reading() {
    let renderer = MockRenderer::new().with_positions(vec![[0.0, 0.0, 0.0]; 4]);
    let detector = detector(CompletionConfig::default());

    let started = Instant::now();
    assert!(detector.wait_for_completion("go_to", &renderer, "Mars", &Params::new()));
    let elapsed = started.elapsed();

    // Four samples, 200ms apart
    assert!(elapsed >= Duration::from_millis(550), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1500), "returned after {:?}", elapsed);
    assert_eq!(renderer.count("getCameraPosition"), 4);
}

#[test_log::test]
#[serial]
fn test_movement_resets_the_stable_count() {
    let renderer = MockRenderer::new().with_positions(vec![
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [50_000.0, 0.0, 0.0],
        [50_000.0, 0.0, 0.0],
        [50_000.0, 0.0, 0.0],
        [50_000.0, 0.0, 0.0],
    ]);
    let detector = detector(fast_completion());

    assert!(detector.wait_for_completion("go_to", &renderer, "Jupiter", &Params::new()));
    assert_eq!(renderer.count("getCameraPosition"), 6);
}

#[test_log::test]
#[serial]
fn test_never_stable_camera_hits_the_ceiling() {
    let renderer = MockRenderer::new().with_moving_camera(10_000.0);
    let config = CompletionConfig {
        max_navigation_wait: Duration::from_millis(300),
        poll_interval: Duration::from_millis(20),
        ..fast_completion()
    };
    let ceiling = config.navigation_ceiling();
    let poll = config.poll_interval;
    let detector = detector(config);

    let started = Instant::now();
    assert!(detector.wait_for_completion("go_to", &renderer, "Neptune", &Params::new()));
    let elapsed = started.elapsed();

    assert!(elapsed >= ceiling);
    assert!(
        elapsed < ceiling + poll + Duration::from_millis(250),
        "returned after {:?}",
        elapsed
    );
}

#[test]
fn test_ceiling_caps_configured_wait() {
    let config = CompletionConfig {
        max_navigation_wait: Duration::from_secs(90),
        ..CompletionConfig::default()
    };
    assert_eq!(config.navigation_ceiling(), Duration::from_secs(20));
}

#[test]
fn test_unknown_target_uses_default_bucket() {
    let detector = detector(CompletionConfig::default());
    assert_eq!(DistanceBucket::classify("Zorgon-7"), DistanceBucket::Unknown);
    assert_eq!(
        detector.fallback_wait("Zorgon-7", &TransitionHints::default()),
        Duration::from_secs(5)
    );

    // No parameters means a default smooth flight
    let plain = TransitionHints::from_params(&Params::new());
    assert_eq!(detector.fallback_wait("Zorgon-7", &plain), Duration::from_secs(6));

    let slow = TransitionHints::from_params(&Params::new().with("smooth", true).with("duration", 8.0));
    assert_eq!(detector.fallback_wait("Zorgon-7", &slow), Duration::from_secs(9));

    let instant = TransitionHints::from_params(&Params::new().with("smooth", false));
    assert_eq!(detector.fallback_wait("Zorgon-7", &instant), Duration::from_secs(1));
}

#[test_log::test]
#[serial]
fn test_fallback_timing_without_position_query() {
    let renderer = MockRenderer::new().without(&["getCameraPosition"]);
    let config = CompletionConfig {
        fallback: FallbackTimings::default().scaled(20),
        ..fast_completion()
    };
    let detector = detector(config);

    let started = Instant::now();
    assert!(detector.wait_for_completion("go_to", &renderer, "Zorgon-7", &Params::new()));
    let elapsed = started.elapsed();

    // 5s default bucket scaled down to 250ms
    assert!(elapsed >= Duration::from_millis(240), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1000), "returned after {:?}", elapsed);
    assert_eq!(renderer.count("getCameraPosition"), 0);
}

#[test]
fn test_bucket_waits_are_monotonic() {
    let timings = FallbackTimings::default();
    let ordered = [
        DistanceBucket::Nearby,
        DistanceBucket::Medium,
        DistanceBucket::Far,
        DistanceBucket::VeryFar,
    ];
    for pair in ordered.windows(2) {
        assert!(timings.for_bucket(pair[0]) <= timings.for_bucket(pair[1]));
    }
}

#[test_log::test]
#[serial]
fn test_multi_step_actions_return_immediately() {
    let renderer = MockRenderer::new();
    let detector = detector(CompletionConfig::default());

    let started = Instant::now();
    assert!(detector.wait_for_completion("tour", &renderer, "solar system", &Params::new()));
    assert!(started.elapsed() < Duration::from_millis(100));
    assert!(renderer.calls().is_empty());
}

#[test_log::test]
#[serial]
fn test_fast_actions_wait_for_quick_verification() {
    let renderer = MockRenderer::new();
    let detector = detector(CompletionConfig::default());

    let started = Instant::now();
    assert!(detector.wait_for_completion("take_screenshot", &renderer, "", &Params::new()));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(190));
    assert!(elapsed < Duration::from_millis(800));
}

#[test_log::test]
#[serial]
fn test_camera_moves_settle_quickly_when_still() {
    let renderer = MockRenderer::new();
    let detector = detector(fast_completion());

    assert!(detector.wait_for_completion("free_camera", &renderer, "", &Params::new()));
    assert_eq!(renderer.count("getCameraPosition"), 2);
}

#[test_log::test]
fn test_failed_position_query_is_not_fatal() {
    let renderer = MockRenderer::new().with_response(
        "getCameraPosition",
        Ok(serde_json::json!("not a position")),
    );
    let config = CompletionConfig {
        fallback: FallbackTimings::default().scaled(1000),
        ..fast_completion()
    };
    let detector = detector(config);

    assert!(detector.wait_for_completion("go_to", &renderer, "Mars", &Params::new()));
    assert!(detector.wait_for_completion("stop_camera", &renderer, "", &Params::new()));
}

#[test]
fn test_huge_transition_durations_are_capped() {
    let config = CompletionConfig {
        max_transition: Duration::from_secs(30),
        ..CompletionConfig::default()
    };
    let detector = detector(config);

    let hints = TransitionHints::from_params(&Params::new().with("duration", 1e300));
    assert_eq!(detector.fallback_wait("Mars", &hints), Duration::from_secs(31));

    let hints = TransitionHints::from_params(&Params::new().with("duration", 1e6));
    assert_eq!(detector.fallback_wait("Mars", &hints), Duration::from_secs(31));
}
