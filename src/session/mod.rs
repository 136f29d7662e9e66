//! The sequential voice loop.
//!
//! Exactly one phase runs at a time: speak, listen, execute, give feedback.
//! A phase never starts before the previous phase's blocking call has
//! returned, so the speaker is never heard by the microphone and camera
//! commands never overlap.

pub mod feedback;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;
use strum::{AsRefStr, Display};

use crate::audio::AudioCoordinator;
use crate::services::{SpeechError, SpeechInput, SpeechOutput};

pub use feedback::{classify_result, Cue};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub listen_timeout: Duration,
    pub listen_permission_timeout: Duration,
    pub pause_between_commands: Duration,
    pub error_backoff: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            listen_timeout: Duration::from_secs(30),
            listen_permission_timeout: Duration::from_secs(2),
            pause_between_commands: Duration::from_millis(500),
            error_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum VoiceSessionState {
    Idle,
    Speaking,
    Listening,
    Processing,
    Executing,
    Feedback,
}

/// Runs one command to completion and describes the outcome.
/// Must not block forever; failures are reported in the returned text.
pub trait CommandExecutor: Send {
    fn execute(&mut self, command: &str) -> String;
}

impl<F> CommandExecutor for F
where
    F: FnMut(&str) -> String + Send,
{
    fn execute(&mut self, command: &str) -> String {
        self(command)
    }
}

/// Clonable stop signal. Stopping ends the loop at the next phase boundary
/// and cuts the pause between commands short.
#[derive(Clone, Default)]
pub struct StopHandle {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (stopped, wake) = &*self.inner;
        *stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep up to `timeout`. Returns `true` if stopped.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (stopped, wake) = &*self.inner;
        let guard = stopped.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = wake
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

pub struct VoiceSession<I, O, E> {
    input: I,
    output: O,
    executor: E,
    coordinator: Arc<AudioCoordinator>,
    config: SessionConfig,
    state: VoiceSessionState,
    stop: StopHandle,
}

impl<I, O, E> VoiceSession<I, O, E>
where
    I: SpeechInput,
    O: SpeechOutput,
    E: CommandExecutor,
{
    pub fn new(
        input: I,
        output: O,
        executor: E,
        coordinator: Arc<AudioCoordinator>,
        config: SessionConfig,
    ) -> Self {
        log::info!("🎤 Sequential voice session initialized");
        Self {
            input,
            output,
            executor,
            coordinator,
            config,
            state: VoiceSessionState::Idle,
            stop: StopHandle::new(),
        }
    }

    pub fn state(&self) -> VoiceSessionState {
        self.state
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    fn change_state(&mut self, state: VoiceSessionState) {
        log::debug!("State: {} → {}", self.state, state);
        self.state = state;
    }

    /// Speak and block until the output reports completion
    pub fn speak_and_wait(&mut self, text: &str) {
        self.change_state(VoiceSessionState::Speaking);
        log::debug!("🔊 Speaking: {}", text);
        if let Err(e) = self.output.speak(text) {
            log::error!("❌ Speech output failed: {}", e);
        }
        self.change_state(VoiceSessionState::Idle);
    }

    pub fn speak_cue(&mut self, cue: Cue) {
        self.speak_and_wait(cue.phrase());
    }

    /// Capture one utterance. `None` on timeout or input error.
    pub fn listen_for_command(&mut self, timeout: Duration) -> Option<String> {
        self.change_state(VoiceSessionState::Listening);
        self.coordinator
            .request_listen_permission(self.config.listen_permission_timeout);
        log::debug!("🎧 Listening for command...");

        let heard = match self.input.listen_once(timeout) {
            Ok(Some(command)) if !command.trim().is_empty() => {
                log::info!("🎤 Command received: '{}'", command);
                Some(command)
            }
            Ok(_) => {
                log::debug!("🔇 No command received");
                None
            }
            Err(SpeechError::Closed) => {
                log::info!("🔚 Speech input closed, ending session");
                self.stop.stop();
                None
            }
            Err(e) => {
                log::error!("❌ Listening error: {}", e);
                None
            }
        };

        self.change_state(VoiceSessionState::Idle);
        heard
    }

    /// Run the executor; a panicking executor becomes a failure result
    pub fn process_and_execute(&mut self, command: &str) -> String {
        self.change_state(VoiceSessionState::Processing);
        log::debug!("⚙️ Processing command: {}", command);
        self.coordinator.signal_processing_started();

        self.change_state(VoiceSessionState::Executing);
        let executor = &mut self.executor;
        let result = match catch_unwind(AssertUnwindSafe(|| executor.execute(command))) {
            Ok(result) => {
                log::info!("✅ Command result: {}", result);
                result
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                log::error!("❌ Command execution error: {}", message);
                format!("❌ Command failed: {}", message)
            }
        };

        self.coordinator.signal_processing_finished();
        self.change_state(VoiceSessionState::Idle);
        result
    }

    pub fn give_feedback(&mut self, result: &str) {
        self.change_state(VoiceSessionState::Feedback);
        let cue = classify_result(result);
        log::debug!("📢 Feedback {} for: {}", cue, result);
        self.speak_cue(cue);
        self.change_state(VoiceSessionState::Idle);
    }

    /// One listen → execute → feedback cycle. Returns `false` when nothing
    /// was heard.
    pub fn run_once(&mut self) -> bool {
        let Some(command) = self.listen_for_command(self.config.listen_timeout) else {
            return false;
        };
        if self.stop.is_stopped() {
            log::warn!("🛑 Session stopped, discarding command: '{}'", command);
            return false;
        }

        let result = self.process_and_execute(&command);
        self.give_feedback(&result);
        true
    }

    /// Speak the ready cue, then cycle until stopped or the input closes
    pub fn run_loop(&mut self) {
        log::info!("🚀 Starting sequential voice control loop");
        self.speak_cue(Cue::Ready);

        while !self.stop.is_stopped() {
            match catch_unwind(AssertUnwindSafe(|| self.run_once())) {
                Ok(true) => {
                    self.stop.wait(self.config.pause_between_commands);
                }
                Ok(false) => {}
                Err(panic) => {
                    log::error!(
                        "❌ Voice control loop error: {}",
                        panic_message(panic.as_ref())
                    );
                    self.state = VoiceSessionState::Idle;
                    self.coordinator.force_reset();
                    self.speak_cue(Cue::Error);
                    self.stop.wait(self.config.error_backoff);
                }
            }
        }

        self.change_state(VoiceSessionState::Idle);
        log::info!("🔚 Sequential voice control loop ended");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown error".to_string()
    }
}
