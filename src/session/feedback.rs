use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Short canned phrases spoken to report status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Cue {
    Connecting,
    Connected,
    Ready,
    Listening,
    Processing,
    Executing,
    Complete,
    Done,
    Failed,
    Error,
    Unclear,
    GotIt,
    NavigationFailed,
    ConnectionFailed,
    ScreenshotTaken,
    LocationNotFound,
    CourseSet,
    OrbitEstablished,
    LandingSequence,
    SystemOnline,
}

impl Cue {
    pub fn phrase(self) -> &'static str {
        match self {
            Cue::Connecting => "Connecting to Gaia Sky navigation system",
            Cue::Connected => "Navigation system connected and ready",
            Cue::Ready => "Navigation system ready for voice commands",
            Cue::Listening => "Listening for voice commands",
            Cue::Processing => "Processing your navigation request",
            Cue::Executing => "Executing navigation command",
            Cue::Complete => "Navigation command completed successfully",
            Cue::Done => "Operation completed",
            Cue::Failed => "Unable to execute command, please try again",
            Cue::Error => "System error encountered",
            Cue::Unclear => "Command unclear, please speak again",
            Cue::GotIt => "Command received and understood",
            Cue::NavigationFailed => "Navigation failed, please try again",
            Cue::ConnectionFailed => "Unable to connect to Gaia Sky",
            Cue::ScreenshotTaken => {
                "Screenshot captured of current view, saved to navigation database"
            }
            Cue::LocationNotFound => "Unable to locate that celestial body, please try again",
            Cue::CourseSet => "Course successfully set, engaging autopilot systems",
            Cue::OrbitEstablished => "Orbital trajectory established around target body",
            Cue::LandingSequence => "Initiating landing sequence, stand by for surface contact",
            Cue::SystemOnline => "All navigation systems are online and operational",
        }
    }
}

/// Pick the cue to speak for a dispatcher result string
pub fn classify_result(result: &str) -> Cue {
    let result = result.trim();
    let lower = result.to_lowercase();

    if let Some(error) = result.strip_prefix('❌') {
        let error = error.trim().to_lowercase();
        if error.contains("connection") {
            Cue::ConnectionFailed
        } else if error.contains("navigation") && error.contains("failed") {
            Cue::NavigationFailed
        } else {
            Cue::Error
        }
    } else if result.starts_with('✈') || lower.contains("successfully") {
        Cue::Complete
    } else if result.starts_with('📸') {
        Cue::ScreenshotTaken
    } else {
        Cue::Done
    }
}
