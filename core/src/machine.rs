// Crowd control machine: queues, processing loops and retry policy
//
// Single authoritative dispatcher for crowd control actions and their
// resulting chat messages. Owns two bounded queues and, once started, two
// background loops:
// - action loop: dequeues one action per cycle, applies the TTL / attempt /
//   enabled policy, fires optional sound alerts and dispatches to the
//   installed `ActionHandler`
// - message loop: drains derived `CrowdControlMessage`s to the installed
//   `MessageListener`
//
// All failures are contained here; nothing propagates to submitters.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

use crate::action::{CrowdControlAction, CrowdControlActionKind};
use crate::handler::{ActionHandler, ActionHandlerError, HandleOutcome};
use crate::ids::IdGenerator;
use crate::listener::MessageListener;
use crate::message::CrowdControlMessage;
use crate::settings::CrowdControlSettings;
use crate::sound::{SoundAlert, SoundPlayer};

/// Queue sizing and submit-timeout knobs, fixed at construction
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub action_queue_capacity: usize,
    pub message_queue_capacity: usize,
    /// How long `submit_action` may wait for queue capacity before dropping
    pub submit_timeout_seconds: f64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            action_queue_capacity: env_or("CROWDPAD_ACTION_QUEUE_CAPACITY", 64),
            message_queue_capacity: env_or("CROWDPAD_MESSAGE_QUEUE_CAPACITY", 64),
            submit_timeout_seconds: env_or("CROWDPAD_SUBMIT_TIMEOUT_SECONDS", 3.0),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Machine statistics snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrowdControlMachineStats {
    pub total_submitted: u64,
    pub dropped_submissions: u64,
    pub total_dispatched: u64,
    pub total_retried: u64,
    pub total_abandoned: u64,
    pub messages_enqueued: u64,
    pub messages_dropped: u64,
    pub messages_delivered: u64,
}

#[derive(Default)]
struct StatsCells {
    submitted: AtomicU64,
    dropped_submissions: AtomicU64,
    dispatched: AtomicU64,
    retried: AtomicU64,
    abandoned: AtomicU64,
    messages_enqueued: AtomicU64,
    messages_dropped: AtomicU64,
    messages_delivered: AtomicU64,
}

impl StatsCells {
    fn snapshot(&self) -> CrowdControlMachineStats {
        CrowdControlMachineStats {
            total_submitted: self.submitted.load(Ordering::Relaxed),
            dropped_submissions: self.dropped_submissions.load(Ordering::Relaxed),
            total_dispatched: self.dispatched.load(Ordering::Relaxed),
            total_retried: self.retried.load(Ordering::Relaxed),
            total_abandoned: self.abandoned.load(Ordering::Relaxed),
            messages_enqueued: self.messages_enqueued.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
        }
    }
}

/// Crowd control machine core.
///
/// Cheap to clone; clones share all state. Only one machine should exist per
/// process: the loops assume they are the sole consumers of the queues.
#[derive(Clone)]
pub struct CrowdControlMachine {
    settings: Arc<dyn CrowdControlSettings>,
    sound_player: Option<Arc<dyn SoundPlayer>>,
    ids: IdGenerator,

    action_tx: mpsc::Sender<Arc<CrowdControlAction>>,
    action_rx: Arc<Mutex<Option<mpsc::Receiver<Arc<CrowdControlAction>>>>>,
    message_tx: mpsc::Sender<CrowdControlMessage>,
    message_rx: Arc<Mutex<Option<mpsc::Receiver<CrowdControlMessage>>>>,

    handler: Arc<RwLock<Option<Arc<dyn ActionHandler>>>>,
    listener: Arc<RwLock<Option<Arc<dyn MessageListener>>>>,

    paused: Arc<AtomicBool>,
    started: Arc<AtomicBool>,
    submit_timeout: Duration,
    stats: Arc<StatsCells>,
}

impl CrowdControlMachine {
    pub fn new(
        config: MachineConfig,
        settings: Arc<dyn CrowdControlSettings>,
        sound_player: Option<Arc<dyn SoundPlayer>>,
    ) -> Self {
        let (action_tx, action_rx) = mpsc::channel(config.action_queue_capacity.max(1));
        let (message_tx, message_rx) = mpsc::channel(config.message_queue_capacity.max(1));

        Self {
            settings,
            sound_player,
            ids: IdGenerator::new(),
            action_tx,
            action_rx: Arc::new(Mutex::new(Some(action_rx))),
            message_tx,
            message_rx: Arc::new(Mutex::new(Some(message_rx))),
            handler: Arc::new(RwLock::new(None)),
            listener: Arc::new(RwLock::new(None)),
            paused: Arc::new(AtomicBool::new(false)),
            started: Arc::new(AtomicBool::new(false)),
            submit_timeout: Duration::from_secs_f64(config.submit_timeout_seconds.max(0.0)),
            stats: Arc::new(StatsCells::default()),
        }
    }

    /// Launch the action and message loops.
    ///
    /// Idempotent: the first call spawns exactly two background loops and
    /// returns `true`; later calls log and return `false`. There is no stop
    /// API; the loops run until process exit.
    pub fn start(&self) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!(target: "crowd_control", "Machine already started");
            return false;
        }

        info!(target: "crowd_control", "Starting crowd control machine");

        let machine = self.clone();
        tokio::spawn(async move { machine.action_loop().await });

        let machine = self.clone();
        tokio::spawn(async move { machine.message_loop().await });

        true
    }

    /// Enqueue an action, waiting up to the submit timeout for capacity.
    ///
    /// Fire-and-forget: a full queue past the timeout drops the action with a
    /// log entry; no error reaches the caller.
    pub async fn submit_action(&self, action: CrowdControlAction) {
        let action = Arc::new(action);
        let action_id = action.action_id().to_string();

        match timeout(self.submit_timeout, self.action_tx.send(action)).await {
            Ok(Ok(())) => {
                self.stats.submitted.fetch_add(1, Ordering::Relaxed);
                debug!(target: "crowd_control", action_id = %action_id, "Action submitted");
            }
            Ok(Err(_)) => {
                self.stats.dropped_submissions.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target: "crowd_control",
                    action_id = %action_id,
                    "Action queue closed, dropping action"
                );
            }
            Err(_) => {
                self.stats.dropped_submissions.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target: "crowd_control",
                    action_id = %action_id,
                    timeout_s = self.submit_timeout.as_secs_f64(),
                    "Action queue full past submit timeout, dropping action"
                );
            }
        }
    }

    /// Install or remove the active action handler; `None` idles the loop
    pub async fn set_action_handler(&self, handler: Option<Arc<dyn ActionHandler>>) {
        let installed = handler.is_some();
        *self.handler.write().await = handler;
        info!(target: "crowd_control", installed, "Action handler updated");
    }

    /// Install or remove the active message listener; `None` idles the loop
    pub async fn set_message_listener(&self, listener: Option<Arc<dyn MessageListener>>) {
        let installed = listener.is_some();
        *self.listener.write().await = listener;
        info!(target: "crowd_control", installed, "Message listener updated");
    }

    /// Returns whether the call transitioned the machine into the paused state
    pub fn pause(&self) -> bool {
        let changed = self
            .paused
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if changed {
            info!(target: "crowd_control", "Machine paused");
        } else {
            debug!(target: "crowd_control", "Machine was already paused");
        }
        changed
    }

    /// Returns whether the call transitioned the machine out of the paused state
    pub fn resume(&self) -> bool {
        let changed = self
            .paused
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if changed {
            info!(target: "crowd_control", "Machine resumed");
        } else {
            debug!(target: "crowd_control", "Machine was already resumed");
        }
        changed
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Actions currently queued (submitted, not yet dequeued)
    pub fn pending_actions(&self) -> usize {
        self.action_tx.max_capacity() - self.action_tx.capacity()
    }

    /// Messages currently queued for delivery
    pub fn pending_messages(&self) -> usize {
        self.message_tx.max_capacity() - self.message_tx.capacity()
    }

    pub fn stats(&self) -> CrowdControlMachineStats {
        self.stats.snapshot()
    }

    async fn action_loop(self) {
        let mut rx = match self.action_rx.lock().await.take() {
            Some(rx) => rx,
            None => {
                warn!(target: "crowd_control", "Action queue receiver already claimed");
                return;
            }
        };

        loop {
            self.handle_action_cycle(&mut rx).await;
            let cooldown = self.settings.action_loop_cooldown_seconds().await;
            sleep(Duration::from_secs_f64(cooldown.max(0.0))).await;
        }
    }

    async fn handle_action_cycle(&self, rx: &mut mpsc::Receiver<Arc<CrowdControlAction>>) {
        let handler = match self.handler.read().await.clone() {
            Some(handler) => handler,
            None => return,
        };

        if self.paused.load(Ordering::SeqCst) {
            return;
        }

        let action = match rx.try_recv() {
            Ok(action) => action,
            Err(_) => return,
        };

        let attempts = action.increment_handle_attempts();

        let ttl = self.settings.seconds_to_live().await;
        if Utc::now() > action.date_time() + ChronoDuration::seconds(i64::from(ttl)) {
            self.abandon(&action, "time to live exceeded");
            return;
        }

        if !self.settings.is_enabled().await {
            // Crowd control is globally off: spin the action back through the
            // queue until re-enablement, TTL expiry or the attempt ceiling.
            debug!(
                target: "crowd_control",
                action_id = %action.action_id(),
                attempts,
                "Crowd control disabled, re-queueing action"
            );
            self.retry(&action, attempts).await;
            return;
        }

        if self.settings.are_sounds_enabled().await {
            if let (Some(player), Some(alert)) = (&self.sound_player, sound_alert_for(&action)) {
                let player = Arc::clone(player);
                let volume = self.settings.media_player_volume().await;
                tokio::spawn(async move {
                    player.play(alert, volume).await;
                });
            }
        }

        let result = match action.kind() {
            CrowdControlActionKind::ButtonPress { .. } => {
                handler.handle_button_press(Arc::clone(&action)).await
            }
            CrowdControlActionKind::GameShuffle { .. } => {
                handler.handle_game_shuffle(Arc::clone(&action)).await
            }
        };
        self.stats.dispatched.fetch_add(1, Ordering::Relaxed);

        match result {
            Ok(HandleOutcome::Ok) => {
                debug!(
                    target: "crowd_control",
                    action_id = %action.action_id(),
                    attempts,
                    "Action handled"
                );
                self.emit_message(&action).await;
            }
            Ok(HandleOutcome::Retry) => {
                warn!(
                    target: "crowd_control",
                    action_id = %action.action_id(),
                    attempts,
                    "Handler requested retry"
                );
                self.retry(&action, attempts).await;
            }
            Ok(HandleOutcome::Abandon) => {
                self.abandon(&action, "handler requested abandon");
            }
            Err(
                error @ (ActionHandlerError::ProcessNotFound(_)
                | ActionHandlerError::CannotConnect(_)
                | ActionHandlerError::PermissionDenied(_)),
            ) => {
                self.abandon(&action, &error.to_string());
            }
            Err(ActionHandlerError::Other(error)) => {
                warn!(
                    target: "crowd_control",
                    action_id = %action.action_id(),
                    attempts,
                    error = %error,
                    "Handler failed unexpectedly, retrying"
                );
                self.retry(&action, attempts).await;
            }
        }
    }

    /// Re-queue the action unless its attempt budget is spent.
    ///
    /// The ceiling is enforced here, after dispatch, so the final permitted
    /// attempt still reaches the handler.
    async fn retry(&self, action: &Arc<CrowdControlAction>, attempts: u32) {
        let max_attempts = self.settings.max_handle_attempts().await;
        if attempts >= max_attempts {
            self.abandon(action, "handle attempt ceiling reached");
            return;
        }

        // Non-blocking: a retry must never stall the loop
        match self.action_tx.try_send(Arc::clone(action)) {
            Ok(()) => {
                self.stats.retried.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.abandon(action, "action queue full on re-queue");
            }
        }
    }

    fn abandon(&self, action: &Arc<CrowdControlAction>, reason: &str) {
        self.stats.abandoned.fetch_add(1, Ordering::Relaxed);
        warn!(
            target: "crowd_control",
            action_id = %action.action_id(),
            attempts = action.handle_attempts(),
            reason,
            "Abandoning action"
        );
    }

    /// Enqueue a giga shuffle announcement when the action calls for one
    async fn emit_message(&self, action: &Arc<CrowdControlAction>) {
        let giga_size = match action.kind() {
            CrowdControlActionKind::GameShuffle {
                start_of_giga_shuffle_size: Some(size),
                ..
            } => *size,
            _ => return,
        };
        if giga_size <= 1 {
            return;
        }

        let message =
            CrowdControlMessage::new(self.ids.generate_message_id(), Arc::clone(action));

        match self.message_tx.try_send(message) {
            Ok(()) => {
                self.stats.messages_enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.stats.messages_dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    target: "crowd_control",
                    action_id = %action.action_id(),
                    "Message queue full, dropping giga shuffle announcement"
                );
            }
        }
    }

    async fn message_loop(self) {
        let mut rx = match self.message_rx.lock().await.take() {
            Some(rx) => rx,
            None => {
                warn!(target: "crowd_control", "Message queue receiver already claimed");
                return;
            }
        };

        loop {
            self.handle_message_cycle(&mut rx).await;
            let cooldown = self.settings.message_cooldown_seconds().await;
            sleep(Duration::from_secs_f64(cooldown.max(0.0))).await;
        }
    }

    async fn handle_message_cycle(&self, rx: &mut mpsc::Receiver<CrowdControlMessage>) {
        let listener = match self.listener.read().await.clone() {
            Some(listener) => listener,
            None => return,
        };

        let message = match rx.try_recv() {
            Ok(message) => message,
            Err(_) => return,
        };

        debug!(
            target: "crowd_control",
            message_id = %message.message_id(),
            twitch_channel = %message.twitch_channel(),
            "Delivering message"
        );
        listener.on_new_message(message).await;
        self.stats.messages_delivered.fetch_add(1, Ordering::Relaxed);
    }
}

/// Which sound, if any, accompanies the dispatch of this action
fn sound_alert_for(action: &CrowdControlAction) -> Option<SoundAlert> {
    match action.kind() {
        CrowdControlActionKind::ButtonPress { .. } => Some(SoundAlert::Press),
        CrowdControlActionKind::GameShuffle {
            entry_within_giga_shuffle,
            start_of_giga_shuffle_size,
        } => match start_of_giga_shuffle_size {
            Some(size) if *size >= 2 && !entry_within_giga_shuffle => Some(SoundAlert::Jackpot),
            _ => None,
        },
    }
}
