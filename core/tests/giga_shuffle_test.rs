use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

use crowdpad_core::{
    ActionHandler, ActionHandlerError, CrowdControlAction, CrowdControlActionKind,
    CrowdControlButton, CrowdControlMachine, CrowdControlMessage, CrowdControlSettings,
    HandleOutcome, MachineConfig, MessageListener, Result,
};

type HandlerResult = std::result::Result<HandleOutcome, ActionHandlerError>;

struct TestSettings;

#[async_trait]
impl CrowdControlSettings for TestSettings {
    async fn is_enabled(&self) -> bool {
        true
    }

    async fn are_sounds_enabled(&self) -> bool {
        false
    }

    async fn max_handle_attempts(&self) -> u32 {
        3
    }

    async fn seconds_to_live(&self) -> u32 {
        9999
    }

    async fn action_loop_cooldown_seconds(&self) -> f64 {
        0.005
    }

    async fn message_cooldown_seconds(&self) -> f64 {
        0.005
    }

    async fn media_player_volume(&self) -> u8 {
        50
    }
}

// Handler that always succeeds
struct OkHandler;

#[async_trait]
impl ActionHandler for OkHandler {
    async fn handle_button_press(&self, _action: Arc<CrowdControlAction>) -> HandlerResult {
        Ok(HandleOutcome::Ok)
    }

    async fn handle_game_shuffle(&self, _action: Arc<CrowdControlAction>) -> HandlerResult {
        Ok(HandleOutcome::Ok)
    }
}

// Listener capturing every delivered message
struct CapturingListener {
    messages: Mutex<Vec<CrowdControlMessage>>,
}

impl CapturingListener {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
        })
    }

    async fn messages(&self) -> Vec<CrowdControlMessage> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl MessageListener for CapturingListener {
    async fn on_new_message(&self, message: CrowdControlMessage) {
        self.messages.lock().await.push(message);
    }
}

fn make_machine(message_queue_capacity: usize) -> CrowdControlMachine {
    let config = MachineConfig {
        action_queue_capacity: 8,
        message_queue_capacity,
        submit_timeout_seconds: 0.2,
    };
    CrowdControlMachine::new(config, Arc::new(TestSettings), None)
}

fn make_shuffle_action(
    action_id: &str,
    start_of_giga_shuffle_size: Option<u32>,
) -> CrowdControlAction {
    CrowdControlAction::new(
        CrowdControlActionKind::GameShuffle {
            entry_within_giga_shuffle: false,
            start_of_giga_shuffle_size,
        },
        action_id.to_string(),
        "chatter1".to_string(),
        "somechatter".to_string(),
        "somestreamer".to_string(),
        "channel1".to_string(),
        None,
        Utc::now(),
    )
    .unwrap()
}

fn make_button_action(action_id: &str) -> CrowdControlAction {
    CrowdControlAction::new(
        CrowdControlActionKind::ButtonPress {
            button: CrowdControlButton::B,
        },
        action_id.to_string(),
        "chatter1".to_string(),
        "somechatter".to_string(),
        "somestreamer".to_string(),
        "channel1".to_string(),
        None,
        Utc::now(),
    )
    .unwrap()
}

#[tokio::test]
async fn non_giga_successes_produce_no_message() -> Result<()> {
    let machine = make_machine(8);
    machine
        .set_action_handler(Some(Arc::new(OkHandler) as Arc<dyn ActionHandler>))
        .await;
    let listener = CapturingListener::new();
    machine
        .set_message_listener(Some(Arc::clone(&listener) as Arc<dyn MessageListener>))
        .await;
    machine.start();

    machine.submit_action(make_button_action("press1")).await;
    machine.submit_action(make_shuffle_action("plain1", None)).await;
    machine.submit_action(make_shuffle_action("solo1", Some(1))).await;
    sleep(Duration::from_millis(200)).await;

    assert_eq!(machine.stats().total_dispatched, 3);
    assert_eq!(machine.stats().messages_enqueued, 0);
    assert!(listener.messages().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn giga_start_delivers_exactly_one_message() -> Result<()> {
    let machine = make_machine(8);
    machine
        .set_action_handler(Some(Arc::new(OkHandler) as Arc<dyn ActionHandler>))
        .await;
    let listener = CapturingListener::new();
    machine
        .set_message_listener(Some(Arc::clone(&listener) as Arc<dyn MessageListener>))
        .await;
    machine.start();

    machine.submit_action(make_shuffle_action("giga1", Some(5))).await;
    sleep(Duration::from_millis(200)).await;

    let messages = listener.messages().await;
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.action().action_id(), "giga1");
    assert!(!message.message_id().is_empty());
    assert_ne!(message.message_id(), message.action().action_id());
    assert_eq!(message.twitch_channel(), "somestreamer");

    let stats = machine.stats();
    assert_eq!(stats.messages_enqueued, 1);
    assert_eq!(stats.messages_delivered, 1);
    assert_eq!(machine.pending_messages(), 0);
    Ok(())
}

#[tokio::test]
async fn each_message_gets_a_distinct_id() -> Result<()> {
    let machine = make_machine(8);
    machine
        .set_action_handler(Some(Arc::new(OkHandler) as Arc<dyn ActionHandler>))
        .await;
    let listener = CapturingListener::new();
    machine
        .set_message_listener(Some(Arc::clone(&listener) as Arc<dyn MessageListener>))
        .await;
    machine.start();

    machine.submit_action(make_shuffle_action("giga1", Some(3))).await;
    machine.submit_action(make_shuffle_action("giga2", Some(4))).await;
    sleep(Duration::from_millis(300)).await;

    let messages = listener.messages().await;
    assert_eq!(messages.len(), 2);
    assert_ne!(messages[0].message_id(), messages[1].message_id());
    Ok(())
}

#[tokio::test]
async fn full_message_queue_drops_announcement_without_failing_the_action() -> Result<()> {
    // No listener installed: the message loop idles and the queue stays full
    let machine = make_machine(1);
    machine
        .set_action_handler(Some(Arc::new(OkHandler) as Arc<dyn ActionHandler>))
        .await;
    machine.start();

    machine.submit_action(make_shuffle_action("giga1", Some(5))).await;
    machine.submit_action(make_shuffle_action("giga2", Some(5))).await;
    sleep(Duration::from_millis(200)).await;

    let stats = machine.stats();
    assert_eq!(stats.total_dispatched, 2, "both actions still succeed");
    assert_eq!(stats.total_abandoned, 0);
    assert_eq!(stats.messages_enqueued, 1);
    assert_eq!(stats.messages_dropped, 1);
    assert_eq!(machine.pending_messages(), 1);
    Ok(())
}
