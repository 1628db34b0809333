use std::fmt;
use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SendError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

const ERROR_PREFIX: &str = "[Error]:";

/// Options accepted by [`Settings::configure`].
#[derive(Debug, Clone, Default)]
pub struct SettingsOptions {
    pub token: Option<String>,
    pub api_base: Option<String>,
}

/// Process-scoped sender settings. Built once at startup, read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    default_token: Option<String>,
    api_base: String,
}

impl Settings {
    pub fn configure(opts: SettingsOptions) -> Self {
        Self {
            default_token: opts.token,
            api_base: opts
                .api_base
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    pub fn default_token(&self) -> Option<&str> {
        self.default_token.as_deref()
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::configure(SettingsOptions::default())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("default_token", &self.default_token.as_deref().map(mask_token))
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Mask a bot token for logging.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}

/// A message recipient: numeric chat id or `@username`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl ChatId {
    fn is_empty(&self) -> bool {
        matches!(self, ChatId::Username(name) if name.trim().is_empty())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => write!(f, "{}", name),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(name: &str) -> Self {
        ChatId::Username(name.to_string())
    }
}

impl From<String> for ChatId {
    fn from(name: String) -> Self {
        ChatId::Username(name)
    }
}

/// One Bot API call to make for every recipient of a [`SendRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub method: String,
    pub data: Value,
}

impl OutgoingMessage {
    pub fn new(method: impl Into<String>, data: Value) -> Self {
        Self {
            method: method.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SendRequest {
    pub token: Option<String>,
    pub to: Vec<ChatId>,
    pub messages: Vec<OutgoingMessage>,
}

/// Outcome of every (recipient, message) pair: outer index follows `to`,
/// inner index follows `messages`.
pub type SendResults = Vec<Vec<Result<Value, SendError>>>;

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

/// What came back from one POST, before interpretation.
#[derive(Debug, Default)]
struct Outcome {
    body: Option<ApiResponse>,
    transport_error: Option<String>,
}

/// Request body of one Bot API call.
enum Payload {
    Form(Vec<(String, String)>),
    Multipart(Form),
}

/// Issues Bot API calls. Cheap to clone; clones share the HTTP client.
#[derive(Clone)]
pub struct Sender {
    client: reqwest::Client,
    settings: Arc<Settings>,
}

impl Sender {
    pub fn new(settings: Settings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    /// Use a preconfigured client, e.g. one with timeouts set.
    pub fn with_client(client: reqwest::Client, settings: Settings) -> Self {
        Self {
            client,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Send one message to one chat.
    ///
    /// `fields` must be a JSON object; `chat_id` is added to it. Falls back to
    /// the default token when `token` is `None`.
    pub async fn send(
        &self,
        token: Option<&str>,
        chat_id: impl Into<ChatId>,
        method: &str,
        fields: Value,
    ) -> Result<Value, SendError> {
        let token = self.resolve_token(token)?;
        let chat_id = chat_id.into();
        if chat_id.is_empty() {
            return Err(SendError::MissingRecipient);
        }
        check_method(method, false)?;
        let form = form_fields(&fields, Some(&chat_id), false)?;

        self.post(token, method, Payload::Form(form)).await
    }

    /// Call a method that has no recipient, such as `setWebhook`.
    pub async fn call(
        &self,
        token: Option<&str>,
        method: &str,
        fields: Value,
    ) -> Result<Value, SendError> {
        let token = self.resolve_token(token)?;
        check_method(method, false)?;
        let form = form_fields(&fields, None, false)?;

        self.post(token, method, Payload::Form(form)).await
    }

    /// Like [`Sender::call`], but uploads the file at `path` as the `field`
    /// part of a multipart body.
    pub async fn call_with_file(
        &self,
        token: Option<&str>,
        method: &str,
        fields: Value,
        field: &str,
        path: &Path,
    ) -> Result<Value, SendError> {
        let token = self.resolve_token(token)?;
        check_method(method, false)?;
        let form = form_fields(&fields, None, false)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SendError::File(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(field)
            .to_string();

        let multipart = form
            .into_iter()
            .fold(Form::new(), |multipart, (key, value)| multipart.text(key, value))
            .part(field.to_string(), Part::bytes(bytes).file_name(file_name));

        self.post(token, method, Payload::Multipart(multipart)).await
    }

    /// Send every message to every recipient concurrently.
    ///
    /// Input problems fail the whole request before any call is made. After
    /// that, each call's outcome is collected independently; one failure
    /// never stops the others.
    pub async fn send_all(&self, request: SendRequest) -> Result<SendResults, SendError> {
        let token = self.resolve_token(request.token.as_deref())?;
        if request.to.is_empty() || request.to.iter().any(ChatId::is_empty) {
            return Err(SendError::MissingRecipient);
        }

        let multi = request.messages.len() > 1;
        if request.messages.is_empty() {
            return Err(SendError::MissingMethod { multi });
        }
        for message in &request.messages {
            check_method(&message.method, multi)?;
            if !message.data.is_object() {
                return Err(SendError::MissingData { multi });
            }
        }

        debug!(
            "Sending {} message(s) to {} recipient(s)",
            request.messages.len(),
            request.to.len()
        );

        let per_recipient = request.to.iter().map(|chat_id| {
            let calls = request.messages.iter().map(move |message| async move {
                let form = form_fields(&message.data, Some(chat_id), multi)?;
                self.post(token, &message.method, Payload::Form(form)).await
            });
            join_all(calls)
        });

        Ok(join_all(per_recipient).await)
    }

    fn resolve_token<'a>(&'a self, token: Option<&'a str>) -> Result<&'a str, SendError> {
        token
            .or(self.settings.default_token())
            .filter(|t| !t.trim().is_empty())
            .ok_or(SendError::MissingToken)
    }

    async fn post(&self, token: &str, method: &str, payload: Payload) -> Result<Value, SendError> {
        let url = format!("{}/bot{}/{}", self.settings.api_base, token, method);

        debug!("Calling Telegram method {} ({})", method, mask_token(token));

        let request = self.client.post(&url).header(ACCEPT, "application/json");
        let request = match payload {
            Payload::Form(form) => request.form(&form),
            Payload::Multipart(multipart) => request.multipart(multipart),
        };

        let outcome = match request.send().await {
            Ok(response) => match response.json::<ApiResponse>().await {
                Ok(body) => Outcome {
                    body: Some(body),
                    transport_error: None,
                },
                Err(e) => Outcome {
                    body: None,
                    transport_error: Some(e.without_url().to_string()),
                },
            },
            Err(e) => Outcome {
                body: None,
                transport_error: Some(e.without_url().to_string()),
            },
        };

        let result = interpret(outcome);
        if let Err(e) = &result {
            warn!("Telegram method {} failed: {}", method, e);
        }
        result
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn check_method(method: &str, multi: bool) -> Result<(), SendError> {
    if method.trim().is_empty() {
        Err(SendError::MissingMethod { multi })
    } else {
        Ok(())
    }
}

/// Flatten message fields into form pairs. Strings go as-is, nested values as
/// JSON text, nulls are dropped. `chat_id` always wins over a field of the
/// same name.
fn form_fields(
    fields: &Value,
    chat_id: Option<&ChatId>,
    multi: bool,
) -> Result<Vec<(String, String)>, SendError> {
    let map = fields
        .as_object()
        .ok_or(SendError::MissingData { multi })?;

    let mut form: Vec<(String, String)> = map
        .iter()
        .filter(|(key, value)| !value.is_null() && (chat_id.is_none() || *key != "chat_id"))
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect();

    if let Some(chat_id) = chat_id {
        form.push(("chat_id".to_string(), chat_id.to_string()));
    }
    Ok(form)
}

/// Body-level signalling wins over transport success: Telegram can answer
/// HTTP 200 with `ok: false`.
fn interpret(outcome: Outcome) -> Result<Value, SendError> {
    let Outcome {
        body,
        transport_error,
    } = outcome;

    if transport_error.is_none() {
        if let Some(ApiResponse {
            ok: true,
            result: Some(result),
            ..
        }) = &body
        {
            if !result.is_null() {
                return Ok(result.clone());
            }
        }
    }

    if let Some(description) = body.and_then(|b| b.description) {
        return Err(SendError::Api(
            description.replacen(ERROR_PREFIX, "", 1).trim().to_string(),
        ));
    }

    match transport_error {
        Some(message) if !message.is_empty() => Err(SendError::Transport(message)),
        _ => Err(SendError::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn sender_for(url: &str, token: Option<&str>) -> Sender {
        Sender::new(Settings::configure(SettingsOptions {
            token: token.map(str::to_string),
            api_base: Some(url.to_string()),
        }))
    }

    fn body(ok: bool, result: Option<Value>, description: Option<&str>) -> Option<ApiResponse> {
        Some(ApiResponse {
            ok,
            result,
            description: description.map(str::to_string),
        })
    }

    #[test]
    fn test_configure_empty_leaves_token_unset() {
        let settings = Settings::configure(SettingsOptions::default());
        assert_eq!(settings.default_token(), None);
        assert_eq!(settings.api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn test_configure_sets_token() {
        let token = "123456:hehePRETENDauthenticationTOKEN";
        let settings = Settings::configure(SettingsOptions {
            token: Some(token.to_string()),
            api_base: None,
        });
        assert_eq!(settings.default_token(), Some(token));
    }

    #[test]
    fn test_debug_masks_token() {
        let settings = Settings::configure(SettingsOptions {
            token: Some("abcd1234efgh5678".to_string()),
            api_base: None,
        });
        let printed = format!("{:?}", settings);
        assert!(printed.contains("abcd...5678"));
        assert!(!printed.contains("1234efgh"));
    }

    #[test]
    fn test_mask_token_non_ascii() {
        assert_eq!(mask_token("aéééé-token"), "aééé...oken");
        assert_eq!(mask_token("ééééééééé"), "éééé...éééé");
        assert_eq!(mask_token("éééé"), "****");

        let settings = Settings::configure(SettingsOptions {
            token: Some("aéééé-token".to_string()),
            api_base: None,
        });
        assert!(format!("{:?}", settings).contains("aééé...oken"));
    }

    #[test]
    fn test_interpret_success() {
        let outcome = Outcome {
            body: body(true, Some(json!({"message_id": 1})), None),
            transport_error: None,
        };
        assert_eq!(interpret(outcome), Ok(json!({"message_id": 1})));
    }

    #[test]
    fn test_interpret_strips_error_prefix() {
        let outcome = Outcome {
            body: body(false, None, Some("[Error]: X ")),
            transport_error: None,
        };
        assert_eq!(interpret(outcome), Err(SendError::Api("X".to_string())));
    }

    #[test]
    fn test_interpret_description_beats_transport_error() {
        let outcome = Outcome {
            body: body(false, None, Some("Bad Request: chat not found")),
            transport_error: Some("connection reset".to_string()),
        };
        assert_eq!(
            interpret(outcome),
            Err(SendError::Api("Bad Request: chat not found".to_string()))
        );
    }

    #[test]
    fn test_interpret_transport_error() {
        let outcome = Outcome {
            body: None,
            transport_error: Some("connection refused".to_string()),
        };
        assert_eq!(
            interpret(outcome),
            Err(SendError::Transport("connection refused".to_string()))
        );
    }

    #[test]
    fn test_interpret_fallback() {
        let outcome = Outcome {
            body: body(true, None, None),
            transport_error: None,
        };
        assert_eq!(interpret(outcome), Err(SendError::Unknown));
        assert_eq!(interpret(Outcome::default()), Err(SendError::Unknown));
    }

    #[test]
    fn test_form_fields_chat_id_wins() {
        let form = form_fields(
            &json!({"text": "hi", "chat_id": 1, "reply_markup": {"k": 1}, "skip": null}),
            Some(&ChatId::Id(42)),
            false,
        )
        .unwrap();
        assert!(form.contains(&("text".to_string(), "hi".to_string())));
        assert!(form.contains(&("reply_markup".to_string(), r#"{"k":1}"#.to_string())));
        assert!(form.contains(&("chat_id".to_string(), "42".to_string())));
        assert!(!form.contains(&("chat_id".to_string(), "1".to_string())));
        assert!(!form.iter().any(|(k, _)| k == "skip"));
    }

    #[tokio::test]
    async fn test_send_without_token_makes_no_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let sender = sender_for(&server.url(), None);
        let result = sender
            .send(None, 42_i64, "sendMessage", json!({"text": "hi"}))
            .await;

        assert_eq!(result, Err(SendError::MissingToken));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_validates_inputs() {
        let sender = sender_for("http://127.0.0.1:9", Some("tok"));

        assert_eq!(
            sender.send(None, "", "sendMessage", json!({})).await,
            Err(SendError::MissingRecipient)
        );
        assert_eq!(
            sender.send(None, 1_i64, "", json!({})).await,
            Err(SendError::MissingMethod { multi: false })
        );
        assert_eq!(
            sender.send(None, 1_i64, "sendMessage", json!("text")).await,
            Err(SendError::MissingData { multi: false })
        );
    }

    #[tokio::test]
    async fn test_send_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_header("accept", "application/json")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("chat_id".into(), "42".into()),
                Matcher::UrlEncoded("text".into(), "hello".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "result": {"message_id": 99}}"#)
            .create_async()
            .await;

        let sender = sender_for(&server.url(), Some("TOKEN"));
        let result = sender
            .send(None, 42_i64, "sendMessage", json!({"text": "hello"}))
            .await;

        assert_eq!(result, Ok(json!({"message_id": 99})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_explicit_token_overrides_default() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botOTHER/sendMessage")
            .with_status(200)
            .with_body(r#"{"ok": true, "result": true}"#)
            .create_async()
            .await;

        let sender = sender_for(&server.url(), Some("DEFAULT"));
        let result = sender
            .send(Some("OTHER"), 1_i64, "sendMessage", json!({"text": "x"}))
            .await;

        assert_eq!(result, Ok(json!(true)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_api_error_in_200_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .with_status(200)
            .with_body(r#"{"ok": false, "description": "[Error]: X "}"#)
            .create_async()
            .await;

        let sender = sender_for(&server.url(), Some("TOKEN"));
        let err = sender
            .send(None, 42_i64, "sendMessage", json!({"text": "hello"}))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "X");
    }

    #[tokio::test]
    async fn test_send_undecodable_body_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/botTOKEN/sendMessage")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let sender = sender_for(&server.url(), Some("TOKEN"));
        let result = sender
            .send(None, 42_i64, "sendMessage", json!({"text": "hello"}))
            .await;

        assert!(matches!(result, Err(SendError::Transport(_))));
    }

    #[tokio::test]
    async fn test_send_all_collects_every_outcome() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_body(Matcher::UrlEncoded("chat_id".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": {"message_id": 1}}"#)
            .expect(2)
            .create_async()
            .await;
        let _blocked = server
            .mock("POST", "/botTOKEN/sendMessage")
            .match_body(Matcher::UrlEncoded("chat_id".into(), "2".into()))
            .with_status(403)
            .with_body(r#"{"ok": false, "description": "Forbidden: bot was blocked by the user"}"#)
            .expect(2)
            .create_async()
            .await;

        let sender = sender_for(&server.url(), Some("TOKEN"));
        let results = sender
            .send_all(SendRequest {
                token: None,
                to: vec![ChatId::Id(1), ChatId::Id(2)],
                messages: vec![
                    OutgoingMessage::new("sendMessage", json!({"text": "one"})),
                    OutgoingMessage::new("sendMessage", json!({"text": "two"})),
                ],
            })
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].iter().all(|r| r.is_ok()));
        assert_eq!(
            results[1],
            vec![
                Err(SendError::Api("Forbidden: bot was blocked by the user".to_string())),
                Err(SendError::Api("Forbidden: bot was blocked by the user".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_send_all_rejects_bad_multi_message() {
        let sender = sender_for("http://127.0.0.1:9", Some("TOKEN"));
        let err = sender
            .send_all(SendRequest {
                token: None,
                to: vec![ChatId::Id(1)],
                messages: vec![
                    OutgoingMessage::new("sendMessage", json!({"text": "one"})),
                    OutgoingMessage::new("", json!({"text": "two"})),
                ],
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing `method` for multi message");
    }

    #[tokio::test]
    async fn test_send_all_rejects_bad_multi_data() {
        let sender = sender_for("http://127.0.0.1:9", Some("TOKEN"));
        let err = sender
            .send_all(SendRequest {
                token: None,
                to: vec![ChatId::Id(1)],
                messages: vec![
                    OutgoingMessage::new("sendMessage", json!({"text": "one"})),
                    OutgoingMessage::new("sendMessage", json!("two")),
                ],
            })
            .await
            .unwrap_err();

        assert_eq!(err, SendError::MissingData { multi: true });
        assert_eq!(err.to_string(), "Missing `data` for multi message");
    }

    #[tokio::test]
    async fn test_send_all_requires_recipients() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let sender = sender_for(&server.url(), Some("TOKEN"));
        let messages = vec![OutgoingMessage::new("sendMessage", json!({"text": "one"}))];

        let err = sender
            .send_all(SendRequest {
                token: None,
                to: Vec::new(),
                messages: messages.clone(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, SendError::MissingRecipient);

        let err = sender
            .send_all(SendRequest {
                token: None,
                to: vec![ChatId::Id(1), ChatId::from("  ")],
                messages,
            })
            .await
            .unwrap_err();
        assert_eq!(err, SendError::MissingRecipient);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_with_non_ascii_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"ok": true, "result": true}"#)
            .create_async()
            .await;

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let sender = sender_for(&server.url(), Some("aéééé-token"));
        let result = sender
            .send(None, 1_i64, "sendMessage", json!({"text": "hi"}))
            .await;
        assert_eq!(result, Ok(json!(true)));
    }

    #[tokio::test]
    async fn test_call_with_file_uploads_multipart() {
        let mut certificate = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut certificate, b"-----BEGIN CERTIFICATE-----").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTOKEN/setWebhook")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="url"\r\n\r\nhttps://example.com/hook"#.to_string()),
                Matcher::Regex(r#"name="certificate"; filename="#.to_string()),
                Matcher::Regex("-----BEGIN CERTIFICATE-----".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": true}"#)
            .create_async()
            .await;

        let sender = sender_for(&server.url(), Some("TOKEN"));
        let result = sender
            .call_with_file(
                None,
                "setWebhook",
                json!({"url": "https://example.com/hook"}),
                "certificate",
                certificate.path(),
            )
            .await;

        assert_eq!(result, Ok(json!(true)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_with_missing_file_makes_no_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let sender = sender_for(&server.url(), Some("TOKEN"));
        let result = sender
            .call_with_file(
                None,
                "setWebhook",
                json!({"url": "https://example.com/hook"}),
                "certificate",
                Path::new("/nonexistent/cert.pem"),
            )
            .await;

        assert!(matches!(result, Err(SendError::File(_))));
        mock.assert_async().await;
    }
}
