//! Option and response key names used on the query boundary.

pub const KEY_OPEN_URL: &str = "OpenUrl";
pub const KEY_FINAL_URL: &str = "FinalUrl";
pub const KEY_USERNAME: &str = "UserName";
pub const KEY_SECRET: &str = "Secret";
pub const KEY_QUERY_USERNAME: &str = "QueryUserName";
pub const KEY_QUERY_PASSWORD: &str = "QueryPassword";
pub const KEY_QUERY_MESSAGE: &str = "QueryMessage";
pub const KEY_QUERY_MESSAGE_ID: &str = "QueryMessageId";
pub const KEY_TITLE: &str = "Title";
pub const KEY_CAPTION: &str = "Caption";
pub const KEY_CAPTCHA_URL: &str = "CaptchaUrl";
pub const KEY_REQUEST_ID: &str = "RequestId";
pub const KEY_CLIENT_DATA: &str = "ClientData";

// ClientData entries
pub const KEY_WINDOW_ID: &str = "WindowId";
pub const KEY_EMBEDDED: &str = "Embedded";

// Response-only keys
pub const KEY_CAPTCHA_RESPONSE: &str = "CaptchaResponse";
pub const KEY_URL_RESPONSE: &str = "UrlResponse";
pub const KEY_ERROR_CODE: &str = "QueryErrorCode";
pub const KEY_ERROR_MESSAGE: &str = "QueryErrorMessage";

/// Predefined prompt messages selectable with `QueryMessageId`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageId {
    Empty,
    Login,
    NotAuthorized,
}

impl MessageId {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MessageId::Login,
            2 => MessageId::NotAuthorized,
            _ => MessageId::Empty,
        }
    }

    pub fn text(&self) -> Option<&'static str> {
        match self {
            MessageId::Login => Some("Enter your credentials to login"),
            MessageId::NotAuthorized => {
                Some("Previous authentication attempt failed. Please try again.")
            }
            MessageId::Empty => None,
        }
    }
}

/// Caller window information carried in `ClientData`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientData {
    pub window_id: u64,
    pub embedded: bool,
}
