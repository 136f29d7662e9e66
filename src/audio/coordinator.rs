use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use strum::{AsRefStr, Display};

/// Default pause between asking a listener to stop and starting to speak
const DEFAULT_HANDOFF_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AudioState {
    Idle,
    Listening,
    Speaking,
    Processing,
}

/// A single transition, numbered in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: AudioState,
    pub to: AudioState,
    pub sequence: u64,
}

/// Snapshot for status output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorStatus {
    pub state: AudioState,
    pub pause_requested: bool,
    pub speaking_finished: bool,
    pub transitions: u64,
    pub listeners: usize,
}

type StateListener = Arc<dyn Fn(StateChange) + Send + Sync>;

#[derive(Debug)]
struct Inner {
    state: AudioState,
    speaking_finished: bool,
    pause_requested: bool,
    pause_acknowledged: bool,
    transitions: u64,
    /// Bumped by `force_reset` so every waiter gives up
    reset_epoch: u64,
    pending: VecDeque<StateChange>,
    dispatching: bool,
}

/// Arbitrates the microphone and the speaker so they are never active at
/// the same time.
///
/// Permission requests never deny: the timeout only decides between a
/// graceful handoff and a forced one. State listeners are delivered in
/// transition order by whichever thread is currently dispatching, outside
/// the state lock, so a listener may call back into the coordinator.
pub struct AudioCoordinator {
    inner: Mutex<Inner>,
    changed: Condvar,
    listeners: Mutex<Vec<StateListener>>,
    handoff_delay: Duration,
}

impl Default for AudioCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCoordinator {
    pub fn new() -> Self {
        Self::with_handoff_delay(DEFAULT_HANDOFF_DELAY)
    }

    pub fn with_handoff_delay(handoff_delay: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: AudioState::Idle,
                speaking_finished: true,
                pause_requested: false,
                pause_acknowledged: true,
                transitions: 0,
                reset_epoch: 0,
                pending: VecDeque::new(),
                dispatching: false,
            }),
            changed: Condvar::new(),
            listeners: Mutex::new(Vec::new()),
            handoff_delay,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> AudioState {
        self.lock().state
    }

    pub fn is_listening_allowed(&self) -> bool {
        matches!(self.state(), AudioState::Listening | AudioState::Idle)
    }

    pub fn is_speaking_allowed(&self) -> bool {
        matches!(self.state(), AudioState::Speaking | AudioState::Idle)
    }

    pub fn pause_requested(&self) -> bool {
        self.lock().pause_requested
    }

    /// Register a callback for every state transition
    pub fn add_state_listener<F>(&self, listener: F)
    where
        F: Fn(StateChange) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Ask for the speaker. Always returns `true`; a listening session is told
    /// to pause and given at most the handoff delay (bounded by `timeout`) to
    /// acknowledge before speech starts anyway.
    pub fn request_speak_permission(&self, timeout: Duration) -> bool {
        let mut inner = self.lock();
        let from = inner.state;

        let dispatch = match from {
            AudioState::Speaking => return true,
            AudioState::Idle | AudioState::Processing => {
                self.set_state(&mut inner, AudioState::Speaking)
            }
            AudioState::Listening => {
                log::debug!("⏸️ Asking listener to pause for speech");
                inner.pause_requested = true;
                inner.pause_acknowledged = false;
                let dispatch = self.set_state(&mut inner, AudioState::Speaking);

                let deadline = Instant::now() + self.handoff_delay.min(timeout);
                let epoch = inner.reset_epoch;
                while !inner.pause_acknowledged && inner.reset_epoch == epoch {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    inner = self
                        .changed
                        .wait_timeout(inner, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
                if !inner.pause_acknowledged {
                    log::debug!("⏩ Listener did not acknowledge pause, speaking anyway");
                }
                dispatch
            }
        };

        drop(inner);
        if dispatch {
            self.dispatch();
        }
        true
    }

    /// Ask for the microphone. Always returns `true`; while speech is playing
    /// this waits up to `timeout` for it to finish, then takes over anyway.
    pub fn request_listen_permission(&self, timeout: Duration) -> bool {
        let mut inner = self.lock();

        if inner.state == AudioState::Speaking {
            let deadline = Instant::now() + timeout;
            let epoch = inner.reset_epoch;
            while inner.state == AudioState::Speaking
                && !inner.speaking_finished
                && inner.reset_epoch == epoch
            {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                inner = self
                    .changed
                    .wait_timeout(inner, remaining)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }

            if inner.state == AudioState::Speaking && !inner.speaking_finished {
                log::warn!(
                    "⏰ Speech still running after {:?}, taking the microphone anyway",
                    timeout
                );
            }
        }

        let dispatch = self.set_state(&mut inner, AudioState::Listening);
        drop(inner);
        if dispatch {
            self.dispatch();
        }
        true
    }

    /// Called by speech output right before audio starts
    pub fn signal_speaking_started(&self) {
        let mut inner = self.lock();
        inner.speaking_finished = false;
        let dispatch = self.set_state(&mut inner, AudioState::Speaking);
        drop(inner);
        if dispatch {
            self.dispatch();
        }
    }

    /// Called by speech output once audio has finished; wakes listen waiters
    pub fn signal_speaking_finished(&self) {
        let mut inner = self.lock();
        inner.speaking_finished = true;
        let dispatch = if inner.state == AudioState::Speaking {
            self.set_state(&mut inner, AudioState::Idle)
        } else {
            false
        };
        self.changed.notify_all();
        drop(inner);
        if dispatch {
            self.dispatch();
        }
    }

    /// Called by a listener once it has stopped capturing after a pause request
    pub fn signal_listening_paused(&self) {
        let mut inner = self.lock();
        inner.pause_acknowledged = true;
        let dispatch = if inner.state == AudioState::Listening {
            self.set_state(&mut inner, AudioState::Idle)
        } else {
            false
        };
        self.changed.notify_all();
        drop(inner);
        if dispatch {
            self.dispatch();
        }
    }

    /// Called by a listener resuming capture. Refused while speech is playing.
    pub fn signal_listening_resumed(&self) -> bool {
        let mut inner = self.lock();
        if inner.state == AudioState::Speaking {
            log::debug!("🔇 Not resuming listening while speaking");
            return false;
        }
        let dispatch = self.set_state(&mut inner, AudioState::Listening);
        drop(inner);
        if dispatch {
            self.dispatch();
        }
        true
    }

    pub fn signal_processing_started(&self) {
        let mut inner = self.lock();
        let dispatch = self.set_state(&mut inner, AudioState::Processing);
        drop(inner);
        if dispatch {
            self.dispatch();
        }
    }

    pub fn signal_processing_finished(&self) {
        let mut inner = self.lock();
        let dispatch = if inner.state == AudioState::Processing {
            self.set_state(&mut inner, AudioState::Idle)
        } else {
            false
        };
        drop(inner);
        if dispatch {
            self.dispatch();
        }
    }

    /// Emergency return to `Idle`, releasing every waiter immediately
    pub fn force_reset(&self) {
        log::warn!("🚨 Forcing audio coordinator back to idle");
        let mut inner = self.lock();
        inner.speaking_finished = true;
        inner.pause_requested = false;
        inner.pause_acknowledged = true;
        inner.reset_epoch += 1;
        let dispatch = self.set_state(&mut inner, AudioState::Idle);
        self.changed.notify_all();
        drop(inner);
        if dispatch {
            self.dispatch();
        }
    }

    /// Block until a pause is requested or `timeout` passes
    pub fn wait_for_pause_request(&self, timeout: Duration) -> bool {
        let inner = self.lock();
        let (inner, _) = self
            .changed
            .wait_timeout_while(inner, timeout, |inner| !inner.pause_requested)
            .unwrap_or_else(PoisonError::into_inner);
        inner.pause_requested
    }

    pub fn status(&self) -> CoordinatorStatus {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        let inner = self.lock();
        CoordinatorStatus {
            state: inner.state,
            pause_requested: inner.pause_requested,
            speaking_finished: inner.speaking_finished,
            transitions: inner.transitions,
            listeners,
        }
    }

    /// Apply a transition under the lock. Returns `true` when the caller has
    /// become responsible for dispatching queued notifications.
    fn set_state(&self, inner: &mut Inner, to: AudioState) -> bool {
        let from = inner.state;
        if from == to {
            return false;
        }

        inner.state = to;
        inner.transitions += 1;
        match to {
            AudioState::Speaking => inner.speaking_finished = false,
            AudioState::Listening => inner.pause_requested = false,
            _ => {}
        }
        log::debug!("🔄 Audio state: {} → {}", from, to);

        inner.pending.push_back(StateChange {
            from,
            to,
            sequence: inner.transitions,
        });
        self.changed.notify_all();

        if inner.dispatching {
            false
        } else {
            inner.dispatching = true;
            true
        }
    }

    fn dispatch(&self) {
        loop {
            let change = {
                let mut inner = self.lock();
                match inner.pending.pop_front() {
                    Some(change) => change,
                    None => {
                        inner.dispatching = false;
                        return;
                    }
                }
            };

            let listeners: Vec<StateListener> = self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();

            for listener in listeners {
                if catch_unwind(AssertUnwindSafe(|| listener(change))).is_err() {
                    log::error!(
                        "❌ Audio state listener panicked on {} → {}",
                        change.from,
                        change.to
                    );
                }
            }
        }
    }
}
