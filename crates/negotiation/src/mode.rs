use signon_core::Request;

/// Strategy for obtaining the credentials of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Known credentials are returned as-is, no UI
    AutoComplete,
    /// Embedded web login driven to the final URL
    WebFlow,
    /// Native username/password/captcha prompt
    NativeQuery,
}

/// Pick the negotiation mode. First match wins:
/// a web flow needs both OpenUrl and FinalUrl, then any query flag asks for
/// the native prompt, anything else completes silently.
pub fn select(request: &Request) -> Mode {
    if request.open_url.is_some() && request.final_url.is_some() {
        Mode::WebFlow
    } else if request.query_username || request.query_password {
        Mode::NativeQuery
    } else {
        Mode::AutoComplete
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::AutoComplete => "auto-complete",
            Mode::WebFlow => "web-flow",
            Mode::NativeQuery => "native-query",
        };
        f.write_str(name)
    }
}
