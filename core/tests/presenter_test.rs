use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crowdpad_core::{
    ChatSender, CrowdControlAction, CrowdControlActionKind, CrowdControlButton,
    CrowdControlMessage, CrowdControlMessageHandler, EmoteLookup, GigaShufflePresenter,
    MessageListener, Result,
};
use crowdpad_core::presenter::DEFAULT_CELEBRATORY_EMOTE;

struct StaticEmotes {
    emote: Option<String>,
}

#[async_trait]
impl EmoteLookup for StaticEmotes {
    async fn celebratory_emote(&self, _twitch_channel_id: &str) -> Option<String> {
        self.emote.clone()
    }
}

// Chat sender capturing (channel, text, reply_to)
struct CapturingChat {
    sent: Mutex<Vec<(String, String, Option<String>)>>,
}

impl CapturingChat {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
        })
    }

    async fn sent(&self) -> Vec<(String, String, Option<String>)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ChatSender for CapturingChat {
    async fn send_message(
        &self,
        twitch_channel: &str,
        text: &str,
        reply_to_message_id: Option<&str>,
    ) -> Result<()> {
        self.sent.lock().await.push((
            twitch_channel.to_string(),
            text.to_string(),
            reply_to_message_id.map(str::to_string),
        ));
        Ok(())
    }
}

fn make_message(kind: CrowdControlActionKind, chat_message_id: Option<&str>) -> CrowdControlMessage {
    let action = CrowdControlAction::new(
        kind,
        "action1".to_string(),
        "chatter1".to_string(),
        "somechatter".to_string(),
        "somestreamer".to_string(),
        "channel1".to_string(),
        chat_message_id.map(str::to_string),
        Utc::now(),
    )
    .unwrap();
    CrowdControlMessage::new("message1".to_string(), Arc::new(action))
}

fn giga_shuffle(size: Option<u32>) -> CrowdControlActionKind {
    CrowdControlActionKind::GameShuffle {
        entry_within_giga_shuffle: false,
        start_of_giga_shuffle_size: size,
    }
}

fn presenter(emote: Option<&str>) -> GigaShufflePresenter {
    GigaShufflePresenter::new(Arc::new(StaticEmotes {
        emote: emote.map(str::to_string),
    }))
}

#[tokio::test]
async fn only_giga_starts_are_presented() -> Result<()> {
    let presenter = presenter(Some("PogChamp"));

    let press = make_message(
        CrowdControlActionKind::ButtonPress {
            button: CrowdControlButton::Start,
        },
        None,
    );
    assert!(presenter.present(&press).await.is_none());

    assert!(presenter.present(&make_message(giga_shuffle(None), None)).await.is_none());
    assert!(presenter.present(&make_message(giga_shuffle(Some(1)), None)).await.is_none());
    assert!(presenter.present(&make_message(giga_shuffle(Some(2)), None)).await.is_some());
    Ok(())
}

#[tokio::test]
async fn announcement_embeds_grouped_size_and_emote() -> Result<()> {
    let presenter = presenter(Some("PogChamp"));
    let message = make_message(giga_shuffle(Some(1234)), None);

    let text = presenter.present(&message).await.expect("giga start");
    assert!(text.contains("1,234"), "grouped size missing: {}", text);
    assert!(text.contains("PogChamp"), "emote missing: {}", text);
    Ok(())
}

#[tokio::test]
async fn missing_emote_falls_back_to_default() -> Result<()> {
    let presenter = presenter(None);
    let message = make_message(giga_shuffle(Some(3)), None);

    let text = presenter.present(&message).await.expect("giga start");
    assert!(text.contains(DEFAULT_CELEBRATORY_EMOTE));
    Ok(())
}

#[tokio::test]
async fn handler_sends_announcement_as_a_reply() -> Result<()> {
    let chat = CapturingChat::new();
    let handler = CrowdControlMessageHandler::new(
        presenter(Some("PogChamp")),
        Arc::clone(&chat) as Arc<dyn ChatSender>,
    );

    handler
        .on_new_message(make_message(giga_shuffle(Some(5)), Some("chatmsg1")))
        .await;

    let sent = chat.sent().await;
    assert_eq!(sent.len(), 1);
    let (channel, text, reply_to) = &sent[0];
    assert_eq!(channel, "somestreamer");
    assert!(text.contains('5'));
    assert_eq!(reply_to.as_deref(), Some("chatmsg1"));
    Ok(())
}

#[tokio::test]
async fn handler_sends_nothing_for_non_giga_messages() -> Result<()> {
    let chat = CapturingChat::new();
    let handler = CrowdControlMessageHandler::new(
        presenter(Some("PogChamp")),
        Arc::clone(&chat) as Arc<dyn ChatSender>,
    );

    handler
        .on_new_message(make_message(giga_shuffle(None), None))
        .await;

    assert!(chat.sent().await.is_empty());
    Ok(())
}
