//! Fixed catalogue of the renderer operations this controller knows about.

use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum OperationCategory {
    Navigation,
    Camera,
    Screenshot,
    Time,
    Object,
    Utility,
}

/// A named remote operation and its positional parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteOperationDescriptor {
    pub name: &'static str,
    pub category: OperationCategory,
    pub parameter_names: &'static [&'static str],
}

impl RemoteOperationDescriptor {
    pub fn arity(&self) -> usize {
        self.parameter_names.len()
    }
}

const fn op(
    name: &'static str,
    category: OperationCategory,
    parameter_names: &'static [&'static str],
) -> RemoteOperationDescriptor {
    RemoteOperationDescriptor {
        name,
        category,
        parameter_names,
    }
}

use OperationCategory::{Camera, Navigation, Object, Screenshot, Time, Utility};

static CATALOGUE: &[RemoteOperationDescriptor] = &[
    // Navigation
    op("goToObject", Navigation, &["objectName"]),
    op("goToObjectInstant", Navigation, &["objectName"]),
    op("goToObjectSmooth", Navigation, &["objectName", "angle", "duration"]),
    op("setCameraFocus", Navigation, &["objectName"]),
    op("setCameraFocusInstant", Navigation, &["objectName"]),
    op("setCameraFocusInstantAndGo", Navigation, &["objectName"]),
    op("landOnObject", Navigation, &["objectName"]),
    op(
        "landAtObjectLocation",
        Navigation,
        &["objectName", "latitude", "longitude"],
    ),
    op("waitFocus", Navigation, &[]),
    op("getClosestObjectToCamera", Navigation, &[]),
    op("setObjectVisibility", Navigation, &["objectName", "visible"]),
    op("addShapeAroundObject", Navigation, &["objectName", "shape"]),
    op("setCameraTrackingObject", Navigation, &["objectName"]),
    op("setCameraOrbitObject", Navigation, &["objectName", "distance", "speed"]),
    // Camera
    op("cameraStop", Camera, &[]),
    op("setCameraFree", Camera, &[]),
    op("getCameraPosition", Camera, &[]),
    op("setCameraPosition", Camera, &["x", "y", "z"]),
    op("cameraCenter", Camera, &[]),
    op("cameraForward", Camera, &["distance"]),
    op("cameraBackward", Camera, &["distance"]),
    op("cameraRotate", Camera, &["angle"]),
    op("cameraTurn", Camera, &["angle"]),
    op("cameraYaw", Camera, &["angle"]),
    op("cameraPitch", Camera, &["angle"]),
    op("cameraRoll", Camera, &["angle"]),
    op("cameraTransition", Camera, &["target"]),
    op("cameraTransitionKm", Camera, &["distance"]),
    op("cameraOrientationTransition", Camera, &["orientation"]),
    op("cameraPositionTransition", Camera, &["x", "y", "z"]),
    op("setCameraZoom", Camera, &["zoom"]),
    op("getCameraZoom", Camera, &[]),
    // Screenshot
    op("takeScreenshot", Screenshot, &[]),
    op("configureScreenshots", Screenshot, &["width", "height", "quality"]),
    op("saveScreenshot", Screenshot, &["filename"]),
    op("configureFrameOutput", Screenshot, &["settings"]),
    op("configureRenderOutput", Screenshot, &["settings"]),
    // Time
    op(
        "setSimulationTime",
        Time,
        &["year", "month", "day", "hour", "minute", "second"],
    ),
    op("getSimulationTime", Time, &[]),
    op("getSimulationTimeArr", Time, &[]),
    op("setSimulationPace", Time, &["pace"]),
    op("activateRealTimeFrame", Time, &[]),
    op("activateSimulationTimeFrame", Time, &[]),
    op("setSimulationSpeed", Time, &["speed"]),
    op("getSimulationSpeed", Time, &[]),
    op("accelerateTime", Time, &[]),
    op("decelerateTime", Time, &[]),
    // Object information
    op("getObject", Object, &["objectName"]),
    op("getObjectPosition", Object, &["objectName"]),
    op("getObjectPredictedPosition", Object, &["objectName", "time"]),
    op("getObjectRadius", Object, &["objectName"]),
    op("getObjectScreenCoordinates", Object, &["objectName"]),
    op("getObjectVisibility", Object, &["objectName"]),
    op("setObjectPosition", Object, &["objectName", "x", "y", "z"]),
    op("setObjectSizeScaling", Object, &["objectName", "scale"]),
    // Utility
    op("enableInput", Utility, &[]),
    op("disableInput", Utility, &[]),
    op("enableGui", Utility, &[]),
    op("disableGui", Utility, &[]),
];

/// Look up an operation by its exact name
pub fn descriptor(name: &str) -> Option<&'static RemoteOperationDescriptor> {
    CATALOGUE.iter().find(|d| d.name == name)
}

pub fn contains(name: &str) -> bool {
    descriptor(name).is_some()
}

pub fn all() -> &'static [RemoteOperationDescriptor] {
    CATALOGUE
}

pub fn all_names() -> Vec<&'static str> {
    CATALOGUE.iter().map(|d| d.name).collect()
}

pub fn by_category(category: OperationCategory) -> Vec<&'static RemoteOperationDescriptor> {
    CATALOGUE.iter().filter(|d| d.category == category).collect()
}

/// Essential navigation operations
pub fn navigation_operation_names() -> &'static [&'static str] {
    &[
        "goToObject",
        "goToObjectSmooth",
        "goToObjectInstant",
        "setCameraFocus",
        "setCameraFocusInstant",
        "landOnObject",
        "landAtObjectLocation",
        "waitFocus",
    ]
}

/// Essential camera control operations
pub fn camera_operation_names() -> &'static [&'static str] {
    &[
        "cameraStop",
        "setCameraFree",
        "getCameraPosition",
        "setCameraPosition",
        "cameraCenter",
    ]
}

pub fn screenshot_operation_names() -> &'static [&'static str] {
    &["takeScreenshot", "configureScreenshots", "saveScreenshot"]
}
