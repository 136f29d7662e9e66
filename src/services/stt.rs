use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{SpeechError, SpeechInput};
use crate::audio::AudioCoordinator;

/// Utterances shorter than this many words are ignored
pub const MIN_SPEECH_WORDS: usize = 1;

/// Phrases speech engines tend to loop on when fed silence or noise
const HALLUCINATION_PATTERNS: &[&str] = &[
    "and then the",
    "the sound of the sound",
    "and the next one",
    "and then and then",
    "the the the",
];

const NAVIGATION_KEYWORDS: &[&str] = &[
    "mars", "jupiter", "saturn", "venus", "earth", "moon", "sun", "mercury", "neptune", "uranus",
    "pluto", "go", "take", "land", "fly", "travel", "navigate", "screenshot", "photo", "camera",
    "free", "stop", "back", "space", "track", "follow", "explore", "tour", "visit", "show",
];

/// Repetitive transcripts: one word making up over 40% of the text, or a
/// known loop phrase. Short texts are never flagged.
pub fn is_hallucination(text: &str) -> bool {
    if text.len() < 20 {
        return false;
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 4 {
        return false;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in words.iter().copied() {
        *counts.entry(word).or_default() += 1;
    }
    let max_repeats = counts.values().copied().max().unwrap_or(0);
    if max_repeats as f64 / words.len() as f64 > 0.4 {
        return true;
    }

    let lower = text.to_lowercase();
    HALLUCINATION_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// Does the text mention anything a navigation command could be about
pub fn is_valid_command(text: &str) -> bool {
    let lower = text.to_lowercase();
    NAVIGATION_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// Apply every utterance filter, returning the trimmed text when accepted
pub fn accept_utterance(text: &str) -> Option<String> {
    let text = text.trim();
    if text.split_whitespace().count() < MIN_SPEECH_WORDS {
        return None;
    }
    if is_hallucination(text) {
        log::warn!("🚫 Ignoring repetitive transcript: '{}'", text);
        return None;
    }
    if !is_valid_command(text) {
        log::info!("🤷 Ignoring non-navigation speech: '{}'", text);
        return None;
    }
    Some(text.to_string())
}

/// Reads utterances line by line, standing in for a speech recogniser.
///
/// The reader runs on its own thread so `listen_once` can time out. That
/// thread is detached: a blocked stdin read cannot be interrupted.
pub struct ConsoleListener {
    lines: Receiver<String>,
    coordinator: Arc<AudioCoordinator>,
    permission_timeout: Duration,
}

impl ConsoleListener {
    pub fn new<R>(reader: R, coordinator: Arc<AudioCoordinator>) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (sender, lines) = unbounded();

        thread::spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if sender.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::error!("❌ Failed to read input: {}", e);
                        break;
                    }
                }
            }
            log::debug!("🔚 Input reader finished");
        });

        Self {
            lines,
            coordinator,
            permission_timeout: Duration::from_secs(2),
        }
    }

    pub fn stdin(coordinator: Arc<AudioCoordinator>) -> Self {
        Self::new(BufReader::new(io::stdin()), coordinator)
    }

    pub fn with_permission_timeout(mut self, timeout: Duration) -> Self {
        self.permission_timeout = timeout;
        self
    }

    fn next_accepted(&self, timeout: Duration) -> Result<Option<String>, SpeechError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.lines.recv_timeout(remaining) {
                Ok(line) => {
                    if let Some(text) = accept_utterance(&line) {
                        log::info!("🎧 Heard: '{}'", text);
                        return Ok(Some(text));
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => return Err(SpeechError::Closed),
            }
        }
    }
}

impl SpeechInput for ConsoleListener {
    fn listen_once(&mut self, timeout: Duration) -> Result<Option<String>, SpeechError> {
        self.coordinator
            .request_listen_permission(self.permission_timeout);
        let result = self.next_accepted(timeout);
        // Capture is over either way; hand the microphone back
        self.coordinator.signal_listening_paused();
        result
    }
}

#[derive(Debug)]
enum ControlMessage {
    Shutdown,
}

/// Listen window per iteration; bounds how long shutdown can take
const LISTEN_WINDOW: Duration = Duration::from_secs(1);
const PAUSED_POLL: Duration = Duration::from_millis(100);

/// Background worker that keeps listening and runs every accepted utterance
/// through `executor`, pausing whenever the coordinator gives the audio
/// channel to the speaker.
pub struct ContinuousListener {
    control: Sender<ControlMessage>,
    worker: Option<JoinHandle<()>>,
}

impl ContinuousListener {
    pub fn start<I, F>(input: I, coordinator: Arc<AudioCoordinator>, executor: F) -> Self
    where
        I: SpeechInput + 'static,
        F: FnMut(&str) -> String + Send + 'static,
    {
        let (control, control_receiver) = bounded(8);

        let worker = thread::spawn(move || {
            Self::run_loop(input, coordinator, executor, control_receiver);
        });

        Self {
            control,
            worker: Some(worker),
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Ask the worker to stop after its current iteration and wait for it
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Wait for the worker to end on its own (input closed)
    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    fn shutdown(&mut self) {
        let _ = self.control.send(ControlMessage::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    fn run_loop<I, F>(
        mut input: I,
        coordinator: Arc<AudioCoordinator>,
        mut executor: F,
        control: Receiver<ControlMessage>,
    ) where
        I: SpeechInput,
        F: FnMut(&str) -> String,
    {
        log::info!("🎧 Continuous listening started");

        loop {
            match control.try_recv() {
                Ok(ControlMessage::Shutdown) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            if !coordinator.is_listening_allowed() {
                if coordinator.pause_requested() {
                    coordinator.signal_listening_paused();
                }
                thread::sleep(PAUSED_POLL);
                continue;
            }

            match input.listen_once(LISTEN_WINDOW) {
                Ok(Some(text)) => {
                    coordinator.signal_processing_started();
                    match catch_unwind(AssertUnwindSafe(|| executor(&text))) {
                        Ok(result) => log::info!("📋 {}", result),
                        Err(_) => log::error!("❌ Command handler panicked on '{}'", text),
                    }
                    coordinator.signal_processing_finished();
                }
                Ok(None) => {}
                Err(SpeechError::Closed) => {
                    log::info!("🔚 Speech input closed");
                    break;
                }
                Err(e) => {
                    log::warn!("⚠️ Listening failed: {}", e);
                    thread::sleep(PAUSED_POLL);
                }
            }
        }

        log::info!("🔚 Continuous listening stopped");
    }
}

impl Drop for ContinuousListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}
