//! Minimal Telegram Bot API client over `reqwest`.
//!
//! Only the methods the bot uses are implemented. Every call is a `POST` to
//! `<api_url>/bot<token>/<method>`; Telegram answers with an
//! `{ok, result, description, error_code}` envelope, also on HTTP 4xx, so
//! the envelope is decoded regardless of status.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, trace};

use crate::model::{ChatId, File, Message, StickerSet, TransportError, Update, User, UserProfilePhotos};

/// Default Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Timeout for ordinary calls; long polls add their own poll timeout on top.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra slack given to `getUpdates` beyond the server-side poll timeout.
const POLL_SLACK: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T, TransportError> {
        if !self.ok {
            return Err(TransportError::Api {
                method: method.to_string(),
                code: self.error_code,
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        self.result.ok_or_else(|| TransportError::MissingResult {
            method: method.to_string(),
        })
    }
}

/// A sticker to upload as part of a set operation.
#[derive(Debug, Clone)]
pub struct InputSticker<'a> {
    /// Encoded WebP image.
    pub bytes: &'a [u8],
    /// Emoji associated with the sticker.
    pub emoji: &'a str,
}

impl InputSticker<'_> {
    const ATTACH_NAME: &'static str = "sticker_file";

    fn descriptor(&self) -> serde_json::Value {
        json!({
            "sticker": format!("attach://{}", Self::ATTACH_NAME),
            "format": "static",
            "emoji_list": [self.emoji],
        })
    }

    fn part(&self) -> Result<Part, TransportError> {
        Ok(Part::bytes(self.bytes.to_vec())
            .file_name("sticker.webp")
            .mime_str("image/webp")?)
    }
}

#[derive(Debug, Serialize)]
struct ReplyParameters {
    message_id: i64,
    allow_sending_without_reply: bool,
}

impl ReplyParameters {
    fn to(message_id: Option<i64>) -> Option<Self> {
        message_id.map(|message_id| Self {
            message_id,
            allow_sending_without_reply: true,
        })
    }
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a ChatId,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_parameters: Option<ReplyParameters>,
}

/// Bot API client. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramClient {
    /// Client for `api_url` with `token`; fails only if the HTTP client cannot be built.
    pub fn new(api_url: &str, token: &str) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("replysticker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_url, self.token, file_path)
    }

    /// Call `method` with a JSON body.
    pub async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, TransportError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        trace!(method, "Bot API call");
        let response: ApiResponse<T> = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await?
            .json()
            .await?;
        response.into_result(method)
    }

    async fn call_multipart<T: DeserializeOwned>(&self, method: &str, form: Form) -> Result<T, TransportError> {
        trace!(method, "Bot API multipart call");
        let response: ApiResponse<T> = self
            .http
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;
        response.into_result(method)
    }

    /// Long-poll for message updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
        let params = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message"],
        };
        let response: ApiResponse<Vec<Update>> = self
            .http
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs) + POLL_SLACK)
            .json(&params)
            .send()
            .await?
            .json()
            .await?;
        response.into_result("getUpdates")
    }

    /// `getMe`
    pub async fn get_me(&self) -> Result<User, TransportError> {
        self.call("getMe", &json!({})).await
    }

    /// `deleteWebhook`, so long polling can take over.
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<bool, TransportError> {
        self.call(
            "deleteWebhook",
            &json!({ "drop_pending_updates": drop_pending_updates }),
        )
        .await
    }

    /// `sendMessage`
    pub async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<Message, TransportError> {
        let params = SendMessage {
            chat_id,
            text,
            reply_parameters: ReplyParameters::to(reply_to),
        };
        self.call("sendMessage", &params).await
    }

    /// Upload `sticker` (WebP bytes) as a new sticker message.
    pub async fn send_sticker(
        &self,
        chat_id: &ChatId,
        sticker: Vec<u8>,
        reply_to: Option<i64>,
    ) -> Result<Message, TransportError> {
        let part = Part::bytes(sticker)
            .file_name("sticker.webp")
            .mime_str("image/webp")?;
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("sticker", part);
        if let Some(reply) = ReplyParameters::to(reply_to) {
            form = form.text("reply_parameters", json!(reply).to_string());
        }
        self.call_multipart("sendSticker", form).await
    }

    /// `getUserProfilePhotos`
    pub async fn get_user_profile_photos(
        &self,
        user_id: i64,
        offset: u32,
        limit: u32,
    ) -> Result<UserProfilePhotos, TransportError> {
        self.call(
            "getUserProfilePhotos",
            &json!({ "user_id": user_id, "offset": offset, "limit": limit }),
        )
        .await
    }

    /// `getFile`
    pub async fn get_file(&self, file_id: &str) -> Result<File, TransportError> {
        self.call("getFile", &json!({ "file_id": file_id })).await
    }

    /// Download a file previously resolved with [`get_file`](Self::get_file).
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.http.get(self.file_url(file_path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Download {
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        debug!(size = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }

    /// `getStickerSet`
    pub async fn get_sticker_set(&self, name: &str) -> Result<StickerSet, TransportError> {
        self.call("getStickerSet", &json!({ "name": name })).await
    }

    /// `addStickerToSet`
    pub async fn add_sticker_to_set(
        &self,
        user_id: i64,
        name: &str,
        sticker: &InputSticker<'_>,
    ) -> Result<bool, TransportError> {
        let form = Form::new()
            .text("user_id", user_id.to_string())
            .text("name", name.to_string())
            .text("sticker", sticker.descriptor().to_string())
            .part(InputSticker::ATTACH_NAME, sticker.part()?);
        self.call_multipart("addStickerToSet", form).await
    }

    /// `createNewStickerSet`
    pub async fn create_new_sticker_set(
        &self,
        user_id: i64,
        name: &str,
        title: &str,
        sticker: &InputSticker<'_>,
    ) -> Result<bool, TransportError> {
        let form = Form::new()
            .text("user_id", user_id.to_string())
            .text("name", name.to_string())
            .text("title", title.to_string())
            .text("sticker_type", "regular")
            .text("stickers", json!([sticker.descriptor()]).to_string())
            .part(InputSticker::ATTACH_NAME, sticker.part()?);
        self.call_multipart("createNewStickerSet", form).await
    }
}
