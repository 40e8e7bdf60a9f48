//! Bot behaviour against an in-memory Bot API double.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::RgbaImage;
use serde_json::json;
use tokio::task::JoinSet;

use super::capabilities::{AvatarSource, Replier, StickerPackApi, StickerSender, UpdateSource};
use super::handlers::{APOLOGY, NO_LAST_STICKER, NO_TARGET, NO_TEXT, PREVIEW_TEXT};
use super::{Bot, BotState, CommandKind};
use crate::model::{ChatId, PackError, RenderError, TransportError, Update};
use crate::render::{BubbleLayout, Rasterizer};
use crate::services::PackOutcome;

const CHAT: i64 = -100;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sent {
    Text {
        chat: ChatId,
        text: String,
        reply_to: Option<i64>,
    },
    Sticker {
        chat: ChatId,
        bytes: Vec<u8>,
        reply_to: Option<i64>,
    },
}

#[derive(Default)]
struct FakeApi {
    sent: Mutex<Vec<Sent>>,
    avatar_requests: Mutex<Vec<i64>>,
    updates: Mutex<VecDeque<Vec<Update>>>,
    offsets: Mutex<Vec<Option<i64>>>,
    fail_next_reply: AtomicBool,
    fail_stickers: bool,
    pack_rejects: bool,
}

impl FakeApi {
    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { text, .. } => Some(text),
                Sent::Sticker { .. } => None,
            })
            .collect()
    }

    fn stickers(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Sticker { bytes, .. } => Some(String::from_utf8(bytes).unwrap()),
                Sent::Text { .. } => None,
            })
            .collect()
    }
}

impl UpdateSource for FakeApi {
    async fn get_updates(&self, offset: Option<i64>, _timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.updates.lock().unwrap().pop_front();
        match next {
            Some(batch) => Ok(batch),
            None => {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(Vec::new())
            }
        }
    }
}

impl Replier for FakeApi {
    async fn reply(&self, chat_id: &ChatId, text: &str, reply_to: Option<i64>) -> Result<(), TransportError> {
        if self.fail_next_reply.swap(false, Ordering::SeqCst) {
            return Err(TransportError::Download { status: 500 });
        }
        self.sent.lock().unwrap().push(Sent::Text {
            chat: chat_id.clone(),
            text: text.to_string(),
            reply_to,
        });
        Ok(())
    }
}

impl StickerSender for FakeApi {
    async fn send_sticker(&self, chat_id: &ChatId, sticker: Vec<u8>, reply_to: Option<i64>) -> Result<(), TransportError> {
        if self.fail_stickers {
            return Err(TransportError::Download { status: 502 });
        }
        self.sent.lock().unwrap().push(Sent::Sticker {
            chat: chat_id.clone(),
            bytes: sticker,
            reply_to,
        });
        Ok(())
    }
}

impl AvatarSource for FakeApi {
    async fn fetch_avatar(&self, user_id: i64) -> Option<Vec<u8>> {
        self.avatar_requests.lock().unwrap().push(user_id);
        None
    }
}

impl StickerPackApi for FakeApi {
    async fn add_to_pack(&self, user_id: i64, _display_name: &str, _sticker: &[u8]) -> Result<PackOutcome, PackError> {
        if self.pack_rejects {
            return Err(PackError::Transport(TransportError::Api {
                method: "createNewStickerSet".to_string(),
                code: Some(400),
                description: "Bad Request: STICKERSET_OWNER_ANONYMOUS".to_string(),
            }));
        }
        Ok(PackOutcome {
            name: format!("reply_memories_{user_id}_by_testbot"),
            created: true,
        })
    }
}

/// Encodes "speaker|line/line" instead of pixels.
struct TextRasterizer;

impl Rasterizer for TextRasterizer {
    fn rasterize(&self, layout: &BubbleLayout, _avatar: Option<&RgbaImage>) -> Result<Vec<u8>, RenderError> {
        let body: Vec<&str> = layout.body.iter().map(|line| line.text.as_str()).collect();
        Ok(format!("{}|{}", layout.speaker.text, body.join("/")).into_bytes())
    }
}

struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn rasterize(&self, _layout: &BubbleLayout, _avatar: Option<&RgbaImage>) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::FontSystemPoisoned)
    }
}

fn bot_with(api: FakeApi, rasterizer: Arc<dyn Rasterizer>) -> Bot<FakeApi> {
    Bot::new(api, BotState::new(200, 300, rasterizer), Some("testbot".to_string()))
}

fn bot(api: FakeApi) -> Bot<FakeApi> {
    bot_with(api, Arc::new(TextRasterizer))
}

fn update(update_id: i64, message: serde_json::Value) -> Update {
    serde_json::from_value(json!({ "update_id": update_id, "message": message })).unwrap()
}

fn text_message(id: i64, user: i64, name: &str, text: &str) -> serde_json::Value {
    json!({
        "message_id": id,
        "date": 1_000 + id,
        "chat": { "id": CHAT, "type": "group" },
        "from": { "id": user, "is_bot": false, "first_name": name },
        "text": text
    })
}

async fn feed(bot: &Bot<FakeApi>, updates: Vec<Update>) {
    let mut tasks = JoinSet::new();
    for update in updates {
        bot.handle_update(update, &mut tasks);
    }
    while let Some(result) = tasks.join_next().await {
        result.expect("update task should not panic");
    }
}

// ===== Command routing Tests =====

#[test]
fn command_kind_recognises_known_names_only() {
    assert_eq!(CommandKind::from_name("sticker"), Some(CommandKind::Sticker));
    assert_eq!(CommandKind::from_name("pack"), Some(CommandKind::Pack));
    assert_eq!(CommandKind::from_name("stickers"), None);
}

#[tokio::test]
async fn help_replies_with_usage() {
    let bot = bot(FakeApi::default());
    feed(&bot, vec![update(1, text_message(1, 5, "Alice", "/help"))]).await;

    let texts = bot.api.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("/sticker"), "Usage should mention /sticker");
}

#[tokio::test]
async fn command_for_another_bot_is_ignored() {
    let bot = bot(FakeApi::default());
    feed(&bot, vec![update(1, text_message(1, 5, "Alice", "/help@otherbot"))]).await;
    assert!(bot.api.sent().is_empty());
}

#[tokio::test]
async fn command_addressed_to_this_bot_is_handled() {
    let bot = bot(FakeApi::default());
    feed(&bot, vec![update(1, text_message(1, 5, "Alice", "/HELP@TestBot"))]).await;
    assert_eq!(bot.api.texts().len(), 1);
}

#[tokio::test]
async fn updates_without_message_are_skipped() {
    let bot = bot(FakeApi::default());
    let bare: Update = serde_json::from_value(json!({ "update_id": 3 })).unwrap();
    feed(&bot, vec![bare]).await;
    assert!(bot.api.sent().is_empty());
}

// ===== /sticker Tests =====

#[tokio::test]
async fn sticker_renders_direct_reply() {
    let bot = bot(FakeApi::default());
    let mut command = text_message(20, 5, "Bob", "/sticker");
    command["reply_to_message"] = text_message(10, 7, "Alice", "see you");
    feed(&bot, vec![update(1, command)]).await;

    assert_eq!(
        bot.api.sent(),
        vec![Sent::Sticker {
            chat: ChatId::Id(CHAT),
            bytes: b"Alice|see you".to_vec(),
            reply_to: Some(20),
        }]
    );
    assert_eq!(*bot.api.avatar_requests.lock().unwrap(), vec![7], "Avatar is the author's");
    assert!(
        bot.state().stickers.lock().unwrap().get(5).is_some(),
        "Sticker is cached for the requester, not the author"
    );
}

#[tokio::test]
async fn sticker_without_reply_uses_preceding_message() {
    let bot = bot(FakeApi::default());
    feed(
        &bot,
        vec![
            update(1, text_message(9, 7, "Alice", "hello")),
            update(2, text_message(10, 5, "Bob", "/sticker")),
        ],
    )
    .await;

    assert_eq!(bot.api.stickers(), vec!["Alice|hello"]);
}

#[tokio::test]
async fn sticker_merge_joins_recent_messages_in_order() {
    let bot = bot(FakeApi::default());
    feed(
        &bot,
        vec![
            update(1, text_message(1, 1, "User1", "a")),
            update(2, text_message(2, 2, "User2", "b")),
            update(3, text_message(3, 3, "User3", "c")),
            update(4, text_message(4, 5, "Bob", "/sticker 3")),
        ],
    )
    .await;

    assert_eq!(bot.api.stickers(), vec!["User3|a/b/c"]);
}

#[tokio::test]
async fn sticker_with_out_of_range_count_renders_single_message() {
    let bot = bot(FakeApi::default());
    feed(
        &bot,
        vec![
            update(1, text_message(1, 1, "User1", "a")),
            update(2, text_message(2, 2, "User2", "b")),
            update(3, text_message(3, 3, "User3", "c")),
            update(4, text_message(4, 5, "Bob", "/sticker 9")),
        ],
    )
    .await;

    assert_eq!(
        bot.api.stickers(),
        vec!["User3|c"],
        "A count above the merge limit falls back to one message"
    );
}

#[tokio::test]
async fn sticker_without_any_target_explains() {
    let bot = bot(FakeApi::default());
    feed(&bot, vec![update(1, text_message(1, 5, "Bob", "/sticker"))]).await;

    assert_eq!(
        bot.api.sent(),
        vec![Sent::Text {
            chat: ChatId::Id(CHAT),
            text: NO_TARGET.to_string(),
            reply_to: Some(1),
        }]
    );
}

#[tokio::test]
async fn sticker_for_textless_reply_explains() {
    let bot = bot(FakeApi::default());
    let mut command = text_message(20, 5, "Bob", "/sticker");
    command["reply_to_message"] = json!({
        "message_id": 10,
        "chat": { "id": CHAT, "type": "group" },
        "from": { "id": 7, "first_name": "Alice" },
        "photo": [{ "file_id": "p" }]
    });
    feed(&bot, vec![update(1, command)]).await;

    assert_eq!(bot.api.texts(), vec![NO_TEXT.to_string()]);
}

#[tokio::test]
async fn render_failure_is_reported_to_user() {
    let bot = bot_with(FakeApi::default(), Arc::new(FailingRasterizer));
    feed(
        &bot,
        vec![
            update(1, text_message(9, 7, "Alice", "hello")),
            update(2, text_message(10, 5, "Bob", "/sticker")),
        ],
    )
    .await;

    let texts = bot.api.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("Failed to generate sticker"));
    assert!(bot.state().stickers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn send_failure_is_reported_to_user() {
    let api = FakeApi {
        fail_stickers: true,
        ..FakeApi::default()
    };
    let bot = bot(api);
    feed(
        &bot,
        vec![
            update(1, text_message(9, 7, "Alice", "hello")),
            update(2, text_message(10, 5, "Bob", "/sticker")),
        ],
    )
    .await;

    assert!(bot.api.texts()[0].starts_with("Failed to generate sticker"));
}

// ===== /preview Tests =====

#[tokio::test]
async fn preview_renders_sample_as_requester() {
    let bot = bot(FakeApi::default());
    feed(&bot, vec![update(1, text_message(3, 5, "Bob", "/preview"))]).await;

    let stickers = bot.api.stickers();
    assert_eq!(stickers.len(), 1);
    assert!(stickers[0].starts_with("Bob|Hi, this is"));
    assert!(PREVIEW_TEXT.starts_with("Hi, this is"));
    assert_eq!(*bot.api.avatar_requests.lock().unwrap(), vec![5]);
    assert!(bot.state().stickers.lock().unwrap().get(5).is_some());
}

// ===== /pack Tests =====

#[tokio::test]
async fn pack_without_sticker_explains() {
    let bot = bot(FakeApi::default());
    feed(&bot, vec![update(1, text_message(3, 5, "Bob", "/pack"))]).await;
    assert_eq!(bot.api.texts(), vec![NO_LAST_STICKER.to_string()]);
}

#[tokio::test]
async fn pack_after_preview_links_pack() {
    let bot = bot(FakeApi::default());
    feed(&bot, vec![update(1, text_message(3, 5, "Bob", "/preview"))]).await;
    feed(&bot, vec![update(2, text_message(4, 5, "Bob", "/pack"))]).await;

    let texts = bot.api.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("https://t.me/addstickers/reply_memories_5_by_testbot"));
}

#[tokio::test]
async fn pack_error_is_translated() {
    let api = FakeApi {
        pack_rejects: true,
        ..FakeApi::default()
    };
    let bot = bot(api);
    feed(&bot, vec![update(1, text_message(3, 5, "Bob", "/preview"))]).await;
    feed(&bot, vec![update(2, text_message(4, 5, "Bob", "/pack"))]).await;

    assert!(bot.api.texts()[0].contains("anonymously"));
}

// ===== Task boundary Tests =====

#[tokio::test]
async fn unanswered_failure_gets_apology() {
    let api = FakeApi::default();
    api.fail_next_reply.store(true, Ordering::SeqCst);
    let bot = bot(api);
    feed(&bot, vec![update(1, text_message(1, 5, "Alice", "/start"))]).await;

    assert_eq!(
        bot.api.sent(),
        vec![Sent::Text {
            chat: ChatId::Id(CHAT),
            text: APOLOGY.to_string(),
            reply_to: None,
        }]
    );
}

// ===== Polling Tests =====

#[tokio::test]
async fn polling_advances_offset_and_stops_on_shutdown() {
    let api = FakeApi::default();
    api.updates.lock().unwrap().push_back(vec![
        update(40, text_message(9, 7, "Alice", "hello")),
        update(41, text_message(10, 5, "Bob", "/sticker")),
    ]);
    let bot = bot(api);

    bot.run_polling(0, tokio::time::sleep(Duration::from_millis(100))).await;

    let offsets = bot.api.offsets.lock().unwrap().clone();
    assert_eq!(offsets[0], None);
    assert_eq!(offsets[1], Some(42), "Next poll should acknowledge both updates");
    assert_eq!(bot.api.stickers(), vec!["Alice|hello"], "In-flight commands finish before shutdown");
}
