use crate::remote::Vector3;

/// Objects the command parser is told about and navigation commands accept
pub const CELESTIAL_OBJECTS: &[&str] = &[
    "Mars",
    "Earth",
    "Moon",
    "Jupiter",
    "Saturn",
    "Sun",
    "Venus",
    "Mercury",
    "Neptune",
    "Uranus",
    "Pluto",
    "Alpha Centauri",
    "Betelgeuse",
    "Vega",
    "Sirius",
    "ISS",
    "Hubble",
];

const ALIASES: &[(&str, &str)] = &[
    ("red planet", "Mars"),
    ("gas giant", "Jupiter"),
    ("ringed planet", "Saturn"),
];

/// Actions that must name a known object
const TARGETED_ACTIONS: &[&str] = &["go_to", "land_on", "track", "explore", "orbit"];

/// Camera further than this from the origin on any axis is already free
const FREE_CAMERA_DISTANCE: f64 = 100_000.0;
/// Camera further than this on any axis is already out in space
const IN_SPACE_DISTANCE: f64 = 50_000.0;

/// What the dispatcher knows before running a command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SituationalState {
    pub connected: bool,
    pub camera_position: Option<Vector3>,
    pub last_target: Option<String>,
    /// Why the state could not be read, if it could not
    pub error: Option<String>,
}

impl SituationalState {
    pub fn unavailable(error: impl Into<String>, last_target: Option<String>) -> Self {
        Self {
            connected: false,
            camera_position: None,
            last_target,
            error: Some(error.into()),
        }
    }

    fn beyond(&self, distance: f64) -> bool {
        self.camera_position
            .is_some_and(|position| position.iter().any(|coord| coord.abs() > distance))
    }
}

/// Canonical catalogue name for an object or one of its nicknames
pub fn resolve_entity(entity: &str) -> Option<&'static str> {
    let wanted = entity.trim().to_lowercase();
    CELESTIAL_OBJECTS
        .iter()
        .copied()
        .find(|object| object.to_lowercase() == wanted)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == wanted)
                .map(|(_, object)| *object)
        })
}

pub fn validate_entity(action: &str, entity: &str) -> Result<(), String> {
    if !TARGETED_ACTIONS.contains(&action) || entity.trim().is_empty() {
        return Ok(());
    }
    match resolve_entity(entity) {
        Some(_) => Ok(()),
        None => Err(format!(
            "Unknown celestial object: '{}'. Try: {}...",
            entity,
            CELESTIAL_OBJECTS[..8].join(", ")
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed(String),
    /// Nothing to do; not a failure
    Skip(String),
    Reject(String),
}

/// Decide whether a parsed command is worth sending to the renderer
pub fn should_execute(action: &str, entity: &str, state: &SituationalState) -> Decision {
    if state.error.is_some() {
        return Decision::Proceed("Cannot check state - will attempt execution".to_string());
    }

    if let Err(reason) = validate_entity(action, entity) {
        return Decision::Reject(reason);
    }

    let at_last_target = state
        .last_target
        .as_deref()
        .is_some_and(|target| !entity.is_empty() && target.eq_ignore_ascii_case(entity));

    match action {
        "go_to" if at_last_target => {
            Decision::Skip(format!("Already at {} - no navigation needed", entity))
        }
        "free_camera" if state.beyond(FREE_CAMERA_DISTANCE) => {
            Decision::Skip("Camera already appears to be free in space".to_string())
        }
        "back_to_space" if state.beyond(IN_SPACE_DISTANCE) => {
            Decision::Skip("Already in space - no need to go back to space".to_string())
        }
        _ => Decision::Proceed("Command validation passed".to_string()),
    }
}
