use signon_core::Response;

use crate::dialog::SubmittedValues;
use crate::session::Session;

/// What the session's handler produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// No UI ran; the request's own credentials are the answer
    AutoComplete,
    Dialog(SubmittedValues),
    Web { url_response: String },
}

/// Build the response for a finished session. Only keys a handler set are
/// present; auto-complete echoes the supplied credentials unchanged.
pub fn assemble(session: &Session, completion: Completion) -> Response {
    let mut builder = Response::builder();

    match completion {
        Completion::AutoComplete => {
            let request = session.request();
            if let Some(username) = &request.username {
                builder = builder.username(username.as_str());
            }
            if let Some(secret) = &request.secret {
                builder = builder.secret(secret.as_str());
            }
        }
        Completion::Dialog(values) => {
            if let Some(username) = values.username {
                builder = builder.username(username);
            }
            if let Some(password) = values.password {
                builder = builder.secret(password);
            }
            if let Some(captcha) = values.captcha {
                builder = builder.captcha_response(captcha);
            }
        }
        Completion::Web { url_response } => {
            builder = builder.url_response(url_response);
        }
    }

    builder.build()
}
