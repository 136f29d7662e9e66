use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use super::{SpeechError, SpeechOutput};
use crate::audio::AudioCoordinator;

const SPEAK_PERMISSION_TIMEOUT: Duration = Duration::from_secs(3);

/// Signals speaking finished on drop, so a failed or panicking engine never
/// leaves the microphone locked out
struct SpeakingGuard<'a>(&'a AudioCoordinator);

impl<'a> SpeakingGuard<'a> {
    fn start(coordinator: &'a AudioCoordinator) -> Self {
        coordinator.request_speak_permission(SPEAK_PERMISSION_TIMEOUT);
        coordinator.signal_speaking_started();
        Self(coordinator)
    }
}

impl Drop for SpeakingGuard<'_> {
    fn drop(&mut self) {
        self.0.signal_speaking_finished();
    }
}

/// Speaks through an external program (`say`, `espeak`, ...) that takes the
/// text as its last argument and exits when done
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    coordinator: Arc<AudioCoordinator>,
}

impl CommandSpeaker {
    /// `command_line` is split on whitespace; the first word is the program
    pub fn new(command_line: &str, coordinator: Arc<AudioCoordinator>) -> Result<Self, SpeechError> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| SpeechError::Output("empty TTS command".to_string()))?;

        Ok(Self {
            program,
            args: words.collect(),
            coordinator,
        })
    }
}

impl SpeechOutput for CommandSpeaker {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        log::info!("🔊 Speaking text: '{}'", text);
        let _speaking = SpeakingGuard::start(&self.coordinator);

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .status()
            .map_err(|e| SpeechError::Output(format!("failed to run {}: {}", self.program, e)))?;

        if !status.success() {
            return Err(SpeechError::Output(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        log::debug!("✅ Speech completed");
        Ok(())
    }
}

/// Prints phrases instead of speaking them
pub struct ConsoleSpeaker {
    coordinator: Arc<AudioCoordinator>,
}

impl ConsoleSpeaker {
    pub fn new(coordinator: Arc<AudioCoordinator>) -> Self {
        Self { coordinator }
    }
}

impl SpeechOutput for ConsoleSpeaker {
    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let _speaking = SpeakingGuard::start(&self.coordinator);
        println!("🔊 {}", text);
        Ok(())
    }
}

/// External program when configured, console otherwise
pub fn speaker_from_command(
    command_line: Option<&str>,
    coordinator: Arc<AudioCoordinator>,
) -> Result<Box<dyn SpeechOutput>, SpeechError> {
    match command_line {
        Some(command_line) => {
            log::info!("🔊 Using TTS command: {}", command_line);
            Ok(Box::new(CommandSpeaker::new(command_line, coordinator)?))
        }
        None => {
            log::info!("🔊 No TTS command configured, printing cues to the console");
            Ok(Box::new(ConsoleSpeaker::new(coordinator)))
        }
    }
}
