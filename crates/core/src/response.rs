use serde_json::{Map, Value};

use crate::error::NegotiationError;
use crate::types::*;

/// Terminal result of a successful negotiation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub username: Option<String>,
    pub secret: Option<String>,
    pub captcha_response: Option<String>,
    pub url_response: Option<String>,
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    /// Wire form: only the keys that were set are present
    pub fn into_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        let entries = [
            (KEY_USERNAME, self.username),
            (KEY_SECRET, self.secret),
            (KEY_CAPTCHA_RESPONSE, self.captcha_response),
            (KEY_URL_RESPONSE, self.url_response),
        ];
        for (key, value) in entries {
            if let Some(v) = value {
                map.insert(key.to_string(), Value::String(v));
            }
        }
        map
    }
}

/// Incrementally filled by whichever component handles the session
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    inner: Response,
}

impl ResponseBuilder {
    pub fn username(mut self, value: impl Into<String>) -> Self {
        self.inner.username = Some(value.into());
        self
    }

    pub fn secret(mut self, value: impl Into<String>) -> Self {
        self.inner.secret = Some(value.into());
        self
    }

    pub fn captcha_response(mut self, value: impl Into<String>) -> Self {
        self.inner.captcha_response = Some(value.into());
        self
    }

    pub fn url_response(mut self, value: impl Into<String>) -> Self {
        self.inner.url_response = Some(value.into());
        self
    }

    pub fn build(self) -> Response {
        self.inner
    }
}

/// Error descriptor delivered through the same reply channel as a response
pub fn error_map(err: &NegotiationError) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(KEY_ERROR_CODE.to_string(), Value::from(err.code()));
    map.insert(KEY_ERROR_MESSAGE.to_string(), Value::String(err.to_string()));
    map
}

pub fn reply_map(outcome: Result<Response, NegotiationError>) -> Map<String, Value> {
    match outcome {
        Ok(response) => response.into_map(),
        Err(err) => error_map(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_set_keys_are_present() {
        let map = Response::builder().username("joe").secret("pwd").build().into_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map[KEY_USERNAME], "joe");
        assert_eq!(map[KEY_SECRET], "pwd");
        assert!(!map.contains_key(KEY_CAPTCHA_RESPONSE));
        assert!(!map.contains_key(KEY_URL_RESPONSE));
    }

    #[test]
    fn test_error_marker() {
        let map = reply_map(Err(NegotiationError::UserCanceled));
        assert_eq!(map[KEY_ERROR_CODE], 4);
        assert!(!map.contains_key(KEY_USERNAME));
    }
}
