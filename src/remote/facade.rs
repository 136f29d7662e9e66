use serde_json::{json, Value};

use super::catalogue;
use super::{CapabilityRegistry, RemoteEndpoint, RemoteError, Vector3};

/// Typed, capability-checked view of a renderer connection.
///
/// Every method checks the registry before touching the endpoint and fails
/// with [`RemoteError::Unsupported`] when the operation is absent.
#[derive(Clone, Copy)]
pub struct Renderer<'a> {
    endpoint: &'a dyn RemoteEndpoint,
    capabilities: &'a CapabilityRegistry,
}

impl<'a> Renderer<'a> {
    pub fn new(endpoint: &'a dyn RemoteEndpoint, capabilities: &'a CapabilityRegistry) -> Self {
        Self {
            endpoint,
            capabilities,
        }
    }

    pub fn endpoint(&self) -> &'a dyn RemoteEndpoint {
        self.endpoint
    }

    pub fn supports(&self, operation: &str) -> bool {
        self.capabilities.has_capability(self.endpoint, operation)
    }

    /// Invoke a catalogued operation after checking availability and arity
    pub fn call(&self, operation: &str, args: Vec<Value>) -> Result<Value, RemoteError> {
        let descriptor = catalogue::descriptor(operation)
            .ok_or_else(|| RemoteError::Unsupported(operation.to_string()))?;

        if !self.supports(descriptor.name) {
            return Err(RemoteError::Unsupported(descriptor.name.to_string()));
        }

        if args.len() != descriptor.arity() {
            return Err(RemoteError::Call {
                name: descriptor.name.to_string(),
                message: format!(
                    "expected {} argument(s) ({}), got {}",
                    descriptor.arity(),
                    descriptor.parameter_names.join(", "),
                    args.len()
                ),
            });
        }

        log::debug!("📡 {}({:?})", descriptor.name, args);
        self.endpoint.invoke(descriptor.name, &args)
    }

    fn call_unit(&self, operation: &str, args: Vec<Value>) -> Result<(), RemoteError> {
        self.call(operation, args).map(|_| ())
    }

    // Navigation

    pub fn go_to_object(&self, name: &str) -> Result<(), RemoteError> {
        self.call_unit("goToObject", vec![json!(name)])
    }

    pub fn go_to_object_instant(&self, name: &str) -> Result<(), RemoteError> {
        self.call_unit("goToObjectInstant", vec![json!(name)])
    }

    pub fn go_to_object_smooth(
        &self,
        name: &str,
        angle: f64,
        duration: f64,
    ) -> Result<(), RemoteError> {
        self.call_unit(
            "goToObjectSmooth",
            vec![json!(name), json!(angle), json!(duration)],
        )
    }

    pub fn set_camera_focus(&self, name: &str) -> Result<(), RemoteError> {
        self.call_unit("setCameraFocus", vec![json!(name)])
    }

    pub fn set_camera_tracking_object(&self, name: &str) -> Result<(), RemoteError> {
        self.call_unit("setCameraTrackingObject", vec![json!(name)])
    }

    pub fn set_camera_orbit_object(
        &self,
        name: &str,
        distance: f64,
        speed: f64,
    ) -> Result<(), RemoteError> {
        self.call_unit(
            "setCameraOrbitObject",
            vec![json!(name), json!(distance), json!(speed)],
        )
    }

    pub fn land_on_object(&self, name: &str) -> Result<(), RemoteError> {
        self.call_unit("landOnObject", vec![json!(name)])
    }

    pub fn land_at_object_location(
        &self,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), RemoteError> {
        self.call_unit(
            "landAtObjectLocation",
            vec![json!(name), json!(latitude), json!(longitude)],
        )
    }

    pub fn wait_focus(&self) -> Result<(), RemoteError> {
        self.call_unit("waitFocus", Vec::new())
    }

    pub fn closest_object_to_camera(&self) -> Result<String, RemoteError> {
        let value = self.call("getClosestObjectToCamera", Vec::new())?;
        Ok(match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    // Camera

    pub fn camera_stop(&self) -> Result<(), RemoteError> {
        self.call_unit("cameraStop", Vec::new())
    }

    pub fn set_camera_free(&self) -> Result<(), RemoteError> {
        self.call_unit("setCameraFree", Vec::new())
    }

    pub fn camera_position(&self) -> Result<Vector3, RemoteError> {
        let value = self.call("getCameraPosition", Vec::new())?;
        parse_vector("getCameraPosition", &value)
    }

    pub fn camera_forward(&self, distance: f64) -> Result<(), RemoteError> {
        self.call_unit("cameraForward", vec![json!(distance)])
    }

    pub fn camera_backward(&self, distance: f64) -> Result<(), RemoteError> {
        self.call_unit("cameraBackward", vec![json!(distance)])
    }

    pub fn camera_transition(&self, target: &str) -> Result<(), RemoteError> {
        self.call_unit("cameraTransition", vec![json!(target)])
    }

    pub fn camera_zoom(&self) -> Result<f64, RemoteError> {
        let value = self.call("getCameraZoom", Vec::new())?;
        parse_number("getCameraZoom", &value)
    }

    pub fn set_camera_zoom(&self, zoom: f64) -> Result<(), RemoteError> {
        self.call_unit("setCameraZoom", vec![json!(zoom)])
    }

    // Screenshots

    pub fn configure_screenshots(
        &self,
        width: u32,
        height: u32,
        quality: u32,
    ) -> Result<(), RemoteError> {
        self.call_unit(
            "configureScreenshots",
            vec![json!(width), json!(height), json!(quality)],
        )
    }

    pub fn take_screenshot(&self) -> Result<(), RemoteError> {
        self.call_unit("takeScreenshot", Vec::new())
    }

    pub fn save_screenshot(&self, filename: &str) -> Result<(), RemoteError> {
        self.call_unit("saveScreenshot", vec![json!(filename)])
    }

    // Time

    pub fn set_simulation_time(&self, time: [i64; 6]) -> Result<(), RemoteError> {
        self.call_unit("setSimulationTime", time.iter().map(|v| json!(v)).collect())
    }

    pub fn simulation_speed(&self) -> Result<f64, RemoteError> {
        let value = self.call("getSimulationSpeed", Vec::new())?;
        parse_number("getSimulationSpeed", &value)
    }

    pub fn set_simulation_speed(&self, speed: f64) -> Result<(), RemoteError> {
        self.call_unit("setSimulationSpeed", vec![json!(speed)])
    }

    pub fn accelerate_time(&self) -> Result<(), RemoteError> {
        self.call_unit("accelerateTime", Vec::new())
    }

    pub fn decelerate_time(&self) -> Result<(), RemoteError> {
        self.call_unit("decelerateTime", Vec::new())
    }

    // Utility

    pub fn enable_input(&self) -> Result<(), RemoteError> {
        self.call_unit("enableInput", Vec::new())
    }
}

fn invalid(name: &str, message: impl Into<String>) -> RemoteError {
    RemoteError::InvalidResponse {
        name: name.to_string(),
        message: message.into(),
    }
}

fn parse_number(name: &str, value: &Value) -> Result<f64, RemoteError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(name, "number out of range")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid(name, format!("expected a number, got '{}'", s))),
        other => Err(invalid(name, format!("expected a number, got {}", other))),
    }
}

/// Parse a position triple; longer arrays are truncated to the first three axes
pub fn parse_vector(name: &str, value: &Value) -> Result<Vector3, RemoteError> {
    let items = match value {
        Value::Array(items) => items.clone(),
        // Some bridges stringify arrays
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            _ => return Err(invalid(name, format!("expected a position, got '{}'", s))),
        },
        other => return Err(invalid(name, format!("expected a position, got {}", other))),
    };

    if items.len() < 3 {
        return Err(invalid(
            name,
            format!("expected 3 coordinates, got {}", items.len()),
        ));
    }

    let mut position = [0.0; 3];
    for (axis, item) in position.iter_mut().zip(items.iter()) {
        *axis = parse_number(name, item)?;
    }
    Ok(position)
}
