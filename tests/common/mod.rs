#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use astro_remote::completion::{CompletionConfig, CompletionDetector};
use astro_remote::dispatcher::{Dispatcher, Pacing};
use astro_remote::llm::{Command, CommandParser, ParseError, Params};
use astro_remote::remote::{
    next_session_id, CapabilityRegistry, ConnectionManager, Connector, RemoteEndpoint,
    RemoteError, Vector3,
};

/// Where the mock camera reports itself
enum Camera {
    /// Pop one sample per query; the last one repeats
    Scripted(VecDeque<Vector3>),
    /// Move `step` units along x on every query
    Moving { step: f64, queries: u64 },
}

/// In-process stand-in for a Gaia Sky bridge.
///
/// Every catalogued operation is available unless removed with [`without`];
/// calls are recorded in order.
pub struct MockRenderer {
    session: u64,
    missing: HashSet<String>,
    camera: Mutex<Camera>,
    responses: Mutex<HashMap<String, Result<Value, RemoteError>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    probes: AtomicUsize,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            session: next_session_id(),
            missing: HashSet::new(),
            camera: Mutex::new(Camera::Scripted(VecDeque::from(vec![[0.0, 0.0, 0.0]]))),
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn without(mut self, operations: &[&str]) -> Self {
        self.missing
            .extend(operations.iter().map(|op| op.to_string()));
        self
    }

    pub fn with_positions(self, positions: Vec<Vector3>) -> Self {
        *self.camera.lock().unwrap() = Camera::Scripted(positions.into());
        self
    }

    pub fn with_moving_camera(self, step: f64) -> Self {
        *self.camera.lock().unwrap() = Camera::Moving { step, queries: 0 };
        self
    }

    pub fn with_response(self, operation: &str, response: Result<Value, RemoteError>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(operation.to_string(), response);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Names of invoked operations, in order, without the queries made
    /// while waiting for completion
    pub fn actions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| name != "getCameraPosition" && name != "getClosestObjectToCamera")
            .collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(name, _)| name == operation)
            .count()
    }

    pub fn args_of(&self, operation: &str) -> Option<Vec<Value>> {
        self.calls()
            .into_iter()
            .find(|(name, _)| name == operation)
            .map(|(_, args)| args)
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn next_position(&self) -> Vector3 {
        let mut camera = self.camera.lock().unwrap();
        match &mut *camera {
            Camera::Scripted(samples) => {
                if samples.len() > 1 {
                    samples.pop_front().unwrap_or_default()
                } else {
                    samples.front().copied().unwrap_or_default()
                }
            }
            Camera::Moving { step, queries } => {
                *queries += 1;
                [*step * *queries as f64, 0.0, 0.0]
            }
        }
    }
}

impl RemoteEndpoint for MockRenderer {
    fn session_id(&self) -> u64 {
        self.session
    }

    fn probe(&self, operation: &str) -> Result<bool, RemoteError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(!self.missing.contains(operation))
    }

    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, RemoteError> {
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), args.to_vec()));

        if let Some(response) = self.responses.lock().unwrap().get(operation) {
            return response.clone();
        }

        Ok(match operation {
            "getCameraPosition" => json!(self.next_position()),
            "getCameraZoom" => json!(1.0),
            "getSimulationSpeed" => json!(1.0),
            "getClosestObjectToCamera" => json!("Mars"),
            _ => Value::Null,
        })
    }
}

/// Hands out the same mock renderer on every connect
pub struct MockConnector {
    renderer: Arc<MockRenderer>,
    connects: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new(renderer: Arc<MockRenderer>) -> Self {
        Self {
            renderer,
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn connect_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connects)
    }
}

impl Connector for MockConnector {
    fn connect(&self) -> Result<Arc<dyn RemoteEndpoint>, RemoteError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let endpoint: Arc<dyn RemoteEndpoint> = self.renderer.clone();
        Ok(endpoint)
    }

    fn describe(&self) -> String {
        "mock://gaia-sky".to_string()
    }
}

/// Never reaches a renderer
pub struct UnreachableConnector;

impl Connector for UnreachableConnector {
    fn connect(&self) -> Result<Arc<dyn RemoteEndpoint>, RemoteError> {
        Err(RemoteError::Connection("connection refused".to_string()))
    }

    fn describe(&self) -> String {
        "mock://nowhere".to_string()
    }
}

/// Maps exact utterances to commands
pub struct ScriptedParser {
    commands: HashMap<String, Command>,
}

impl ScriptedParser {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, action: &str, entity: &str, parameters: Params) -> Self {
        self.commands.insert(
            text.to_string(),
            Command::new(action, entity).with_parameters(parameters),
        );
        self
    }
}

impl CommandParser for ScriptedParser {
    fn parse(&self, text: &str) -> Result<Command, ParseError> {
        self.commands
            .get(text)
            .cloned()
            .ok_or_else(|| ParseError::NoJson(text.to_string()))
    }
}

/// Completion timings shrunk so whole command flows run in milliseconds
pub fn fast_completion() -> CompletionConfig {
    let defaults = CompletionConfig::default();
    CompletionConfig {
        poll_interval: Duration::from_millis(5),
        stable_readings: 3,
        stability_threshold: 1000.0,
        max_navigation_wait: Duration::from_millis(500),
        camera_settle: Duration::from_millis(5),
        camera_unsettled_wait: Duration::from_millis(10),
        quick_verification: Duration::from_millis(1),
        instant_cap: Duration::from_millis(10),
        default_transition: Duration::from_millis(10),
        transition_margin: Duration::from_millis(1),
        max_transition: Duration::from_millis(100),
        fallback: defaults.fallback.scaled(1000),
    }
}

pub fn no_pauses() -> Pacing {
    Pacing {
        effects_pause: Duration::ZERO,
        stream_interval: Duration::from_millis(5),
        max_delay: Duration::from_secs(60),
    }
}

pub fn dispatcher_with(connector: Box<dyn Connector>, parser: ScriptedParser) -> Dispatcher {
    dispatcher_timed(connector, parser, fast_completion())
}

pub fn dispatcher_timed(
    connector: Box<dyn Connector>,
    parser: ScriptedParser,
    completion: CompletionConfig,
) -> Dispatcher {
    let capabilities = Arc::new(CapabilityRegistry::new());
    let completion = Arc::new(CompletionDetector::new(
        completion,
        Arc::clone(&capabilities),
    ));
    let connection = Arc::new(ConnectionManager::new(connector, 1, Duration::ZERO));
    Dispatcher::new(connection, capabilities, completion, Box::new(parser)).with_pacing(no_pauses())
}

pub fn dispatcher_for(renderer: &Arc<MockRenderer>, parser: ScriptedParser) -> Dispatcher {
    dispatcher_with(Box::new(MockConnector::new(Arc::clone(renderer))), parser)
}
