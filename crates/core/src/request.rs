use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::NegotiationError;
use crate::types::*;

/// Raw option map as received on the query boundary
pub type RawOptions = Map<String, Value>;

const DEFAULT_WEB_TITLE: &str = "Web authentication";

/// Validated negotiation request. Built once by [`parse`] and never mutated.
#[derive(Clone, Default, PartialEq)]
pub struct Request {
    pub open_url: Option<Url>,
    /// Kept verbatim: completion is a byte-level prefix match on this text
    pub final_url: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
    pub query_username: bool,
    pub query_password: bool,
    pub query_message: Option<String>,
    pub message_id: Option<MessageId>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub captcha_url: Option<Url>,
    pub request_id: Option<String>,
    pub client_data: ClientData,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("open_url", &self.open_url.as_ref().map(Url::as_str))
            .field("final_url", &self.final_url)
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("query_username", &self.query_username)
            .field("query_password", &self.query_password)
            .field("query_message", &self.query_message)
            .field("message_id", &self.message_id)
            .field("title", &self.title)
            .field("caption", &self.caption)
            .field("captcha_url", &self.captcha_url.as_ref().map(Url::as_str))
            .field("request_id", &self.request_id)
            .field("client_data", &self.client_data)
            .finish()
    }
}

impl Request {
    /// Text for the dialog's message label, if any
    pub fn message(&self) -> Option<String> {
        match &self.query_message {
            Some(msg) if !msg.is_empty() => Some(msg.clone()),
            _ => self
                .message_id
                .and_then(|id| id.text())
                .map(|s| s.to_string()),
        }
    }

    pub fn dialog_title(&self, default_title: &str) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| default_title.to_string())
    }

    pub fn web_title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        match &self.caption {
            Some(caption) => format!("{} for {}", DEFAULT_WEB_TITLE, caption),
            None => DEFAULT_WEB_TITLE.to_string(),
        }
    }

    /// Both credentials are known, so a web login form may be submitted silently
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.secret.is_some()
    }

    pub fn window_id(&self) -> u64 {
        self.client_data.window_id
    }
}

/// Validate an option map into a [`Request`].
///
/// Unknown keys are dropped. A recognized key holding the wrong type fails the
/// whole request, as does a request with nothing to negotiate.
pub fn parse(raw: &RawOptions) -> Result<Request, NegotiationError> {
    let request = Request {
        open_url: url_opt(raw, KEY_OPEN_URL)?,
        final_url: final_url_opt(raw)?,
        username: string_opt(raw, KEY_USERNAME)?,
        secret: string_opt(raw, KEY_SECRET)?,
        query_username: bool_opt(raw, KEY_QUERY_USERNAME)?.unwrap_or(false),
        query_password: bool_opt(raw, KEY_QUERY_PASSWORD)?.unwrap_or(false),
        query_message: string_opt(raw, KEY_QUERY_MESSAGE)?,
        message_id: int_opt(raw, KEY_QUERY_MESSAGE_ID)?.map(MessageId::from_code),
        title: string_opt(raw, KEY_TITLE)?,
        caption: string_opt(raw, KEY_CAPTION)?,
        captcha_url: url_opt(raw, KEY_CAPTCHA_URL)?,
        request_id: string_opt(raw, KEY_REQUEST_ID)?,
        client_data: client_data_opt(raw)?,
    };

    if request.open_url.is_none() && !request.query_username && !request.query_password {
        return Err(NegotiationError::invalid(format!(
            "nothing to negotiate: one of {}, {} or {} is required",
            KEY_OPEN_URL, KEY_QUERY_USERNAME, KEY_QUERY_PASSWORD
        )));
    }

    let ignored: Vec<&str> = raw
        .keys()
        .map(|k| k.as_str())
        .filter(|k| !is_known_key(k))
        .collect();
    if !ignored.is_empty() {
        debug!(keys = ?ignored, "ignoring unrecognized options");
    }

    Ok(request)
}

fn is_known_key(key: &str) -> bool {
    matches!(
        key,
        KEY_OPEN_URL
            | KEY_FINAL_URL
            | KEY_USERNAME
            | KEY_SECRET
            | KEY_QUERY_USERNAME
            | KEY_QUERY_PASSWORD
            | KEY_QUERY_MESSAGE
            | KEY_QUERY_MESSAGE_ID
            | KEY_TITLE
            | KEY_CAPTION
            | KEY_CAPTCHA_URL
            | KEY_REQUEST_ID
            | KEY_CLIENT_DATA
    )
}

fn string_opt(raw: &RawOptions, key: &str) -> Result<Option<String>, NegotiationError> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(type_error(key, "string", other)),
    }
}

fn bool_opt(raw: &RawOptions, key: &str) -> Result<Option<bool>, NegotiationError> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(type_error(key, "bool", other)),
    }
}

fn int_opt(raw: &RawOptions, key: &str) -> Result<Option<i64>, NegotiationError> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| NegotiationError::invalid(format!("{} must be an integer", key))),
        Some(other) => Err(type_error(key, "integer", other)),
    }
}

fn url_opt(raw: &RawOptions, key: &str) -> Result<Option<Url>, NegotiationError> {
    match string_opt(raw, key)? {
        None => Ok(None),
        Some(text) => Url::parse(&text)
            .map(Some)
            .map_err(|e| NegotiationError::invalid(format!("{} is not a valid URL: {}", key, e))),
    }
}

fn final_url_opt(raw: &RawOptions) -> Result<Option<String>, NegotiationError> {
    let text = string_opt(raw, KEY_FINAL_URL)?;
    if let Some(ref t) = text {
        Url::parse(t).map_err(|e| {
            NegotiationError::invalid(format!("{} is not a valid URL: {}", KEY_FINAL_URL, e))
        })?;
    }
    Ok(text)
}

fn client_data_opt(raw: &RawOptions) -> Result<ClientData, NegotiationError> {
    let map = match raw.get(KEY_CLIENT_DATA) {
        None | Some(Value::Null) => return Ok(ClientData::default()),
        Some(Value::Object(map)) => map,
        Some(other) => return Err(type_error(KEY_CLIENT_DATA, "map", other)),
    };

    let window_id = match map.get(KEY_WINDOW_ID) {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
            NegotiationError::invalid(format!("{} must be an unsigned integer", KEY_WINDOW_ID))
        })?,
        Some(other) => return Err(type_error(KEY_WINDOW_ID, "unsigned integer", other)),
    };
    let embedded = bool_opt(map, KEY_EMBEDDED)?.unwrap_or(false);

    Ok(ClientData {
        window_id,
        embedded,
    })
}

fn type_error(key: &str, expected: &str, got: &Value) -> NegotiationError {
    let got = match got {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    };
    NegotiationError::invalid(format!("{} must be a {}, got {}", key, expected, got))
}
