use std::marker::PhantomData;

use tracing::debug;
use url::Url;

use signon_core::{NegotiationError, Request};

use crate::surface::{DialogEvent, DialogField, DialogInput, DialogSurface};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub value: String,
    pub enabled: bool,
}

/// What a native prompt shows. Absent fields are hidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogForm {
    pub title: String,
    pub message: Option<String>,
    pub username: Option<FieldSpec>,
    pub password: Option<FieldSpec>,
    pub captcha_url: Option<Url>,
}

impl DialogForm {
    pub fn from_request(request: &Request, default_title: &str) -> Self {
        // a pre-supplied username is shown but cannot be edited
        let username = match (&request.username, request.query_username) {
            (Some(name), _) => Some(FieldSpec {
                value: name.clone(),
                enabled: false,
            }),
            (None, true) => Some(FieldSpec {
                value: String::new(),
                enabled: true,
            }),
            (None, false) => None,
        };
        let password = request.query_password.then(|| FieldSpec {
            value: String::new(),
            enabled: true,
        });

        Self {
            title: request.dialog_title(default_title),
            message: request.message(),
            username,
            password,
            captcha_url: request.captcha_url.clone(),
        }
    }
}

/// Values accepted from a submitted prompt, one per shown field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmittedValues {
    pub username: Option<String>,
    pub password: Option<String>,
    pub captcha: Option<String>,
}

pub struct Created;
pub struct Shown;

/// Native prompt lifecycle: Created -> Shown -> (Submitted | Cancelled).
/// The terminal states consume the dialog.
pub struct NativeDialog<S> {
    form: DialogForm,
    _state: PhantomData<S>,
}

pub struct Submitted {
    pub values: SubmittedValues,
}

pub struct Cancelled;

/// A submit that left a required field empty; the dialog stays shown
pub struct Rejected {
    pub dialog: NativeDialog<Shown>,
    pub field: DialogField,
}

impl<S> NativeDialog<S> {
    pub fn form(&self) -> &DialogForm {
        &self.form
    }
}

impl NativeDialog<Created> {
    pub fn new(request: &Request, default_title: &str) -> Self {
        Self {
            form: DialogForm::from_request(request, default_title),
            _state: PhantomData,
        }
    }

    pub fn show(self) -> NativeDialog<Shown> {
        NativeDialog {
            form: self.form,
            _state: PhantomData,
        }
    }
}

impl NativeDialog<Shown> {
    pub fn submit(self, input: DialogInput) -> Result<Submitted, Rejected> {
        if self.form.password.is_some() && input.password.is_empty() {
            return Err(self.reject(DialogField::Password));
        }
        if self.form.captcha_url.is_some() && input.captcha.is_empty() {
            return Err(self.reject(DialogField::Captcha));
        }

        let username = self.form.username.map(|field| {
            if field.enabled {
                input.username
            } else {
                field.value
            }
        });
        let password = self.form.password.map(|_| input.password);
        let captcha = self.form.captcha_url.map(|_| input.captcha);

        Ok(Submitted {
            values: SubmittedValues {
                username,
                password,
                captcha,
            },
        })
    }

    pub fn cancel(self) -> Cancelled {
        Cancelled
    }

    fn reject(self, field: DialogField) -> Rejected {
        Rejected {
            dialog: self,
            field,
        }
    }
}

/// Drive a prompt on `surface` until it is submitted or cancelled
pub async fn run_dialog(
    dialog: NativeDialog<Created>,
    surface: &mut dyn DialogSurface,
) -> Result<SubmittedValues, NegotiationError> {
    surface.show(dialog.form()).await?;
    let mut dialog = dialog.show();

    loop {
        match surface.next_event().await {
            Some(DialogEvent::Submit(input)) => match dialog.submit(input) {
                Ok(submitted) => {
                    surface.hide().await;
                    return Ok(submitted.values);
                }
                Err(rejected) => {
                    debug!(field = ?rejected.field, "required field left empty");
                    surface.reject(rejected.field).await?;
                    dialog = rejected.dialog;
                }
            },
            Some(DialogEvent::Cancel) | None => {
                let Cancelled = dialog.cancel();
                surface.hide().await;
                return Err(NegotiationError::UserCanceled);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{ScriptedDialog, SurfaceLog};
    use std::sync::{Arc, Mutex};

    fn input(username: &str, password: &str, captcha: &str) -> DialogInput {
        DialogInput {
            username: username.into(),
            password: password.into(),
            captcha: captcha.into(),
        }
    }

    #[test]
    fn test_form_fields_follow_request() {
        let request = Request {
            query_password: true,
            username: Some("Average Joe".into()),
            ..Default::default()
        };
        let form = DialogForm::from_request(&request, "Enter your credentials");
        assert_eq!(form.title, "Enter your credentials");
        assert_eq!(
            form.username,
            Some(FieldSpec {
                value: "Average Joe".into(),
                enabled: false
            })
        );
        assert!(form.password.as_ref().unwrap().enabled);
        assert!(form.captcha_url.is_none());

        let request = Request {
            query_username: true,
            title: Some("Enter your username".into()),
            ..Default::default()
        };
        let form = DialogForm::from_request(&request, "unused");
        assert_eq!(form.title, "Enter your username");
        assert!(form.username.as_ref().unwrap().enabled);
        assert!(form.password.is_none());
    }

    #[test]
    fn test_submit_requires_password_and_captcha() {
        let request = Request {
            query_password: true,
            captcha_url: Some(Url::parse("https://example.com/captcha.png").unwrap()),
            ..Default::default()
        };
        let dialog = NativeDialog::new(&request, "t").show();

        let rejected = dialog.submit(input("", "", "abc")).err().unwrap();
        assert_eq!(rejected.field, DialogField::Password);

        let rejected = rejected.dialog.submit(input("", "pwd", "")).err().unwrap();
        assert_eq!(rejected.field, DialogField::Captcha);

        let submitted = rejected.dialog.submit(input("ignored", "pwd", "abc")).ok().unwrap();
        assert_eq!(
            submitted.values,
            SubmittedValues {
                username: None,
                password: Some("pwd".into()),
                captcha: Some("abc".into()),
            }
        );
    }

    #[test]
    fn test_disabled_username_keeps_supplied_value() {
        let request = Request {
            query_username: true,
            query_password: true,
            username: Some("joe".into()),
            ..Default::default()
        };
        let dialog = NativeDialog::new(&request, "t").show();
        let submitted = dialog.submit(input("mallory", "pwd", "")).ok().unwrap();
        assert_eq!(submitted.values.username.as_deref(), Some("joe"));
    }

    #[tokio::test]
    async fn test_run_dialog_retries_after_rejection() {
        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        let mut surface = ScriptedDialog::new(
            vec![
                DialogEvent::Submit(input("", "", "")),
                DialogEvent::Submit(input("", "secret", "")),
            ],
            log.clone(),
        );
        let request = Request {
            query_password: true,
            ..Default::default()
        };

        let values = run_dialog(NativeDialog::new(&request, "t"), &mut surface)
            .await
            .unwrap();
        assert_eq!(values.password.as_deref(), Some("secret"));

        let log = log.lock().unwrap();
        assert_eq!(log.dialog_forms.len(), 1);
        assert_eq!(log.rejected, vec![DialogField::Password]);
        assert!(log.dialog_hidden);
    }

    #[tokio::test]
    async fn test_run_dialog_cancel_and_dismiss() {
        let request = Request {
            query_username: true,
            ..Default::default()
        };

        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        let mut surface = ScriptedDialog::new(vec![DialogEvent::Cancel], log.clone());
        let err = run_dialog(NativeDialog::new(&request, "t"), &mut surface)
            .await
            .unwrap_err();
        assert_eq!(err, NegotiationError::UserCanceled);

        // a prompt that goes away without an answer is a cancel too
        let mut surface = ScriptedDialog::new(Vec::new(), log);
        let err = run_dialog(NativeDialog::new(&request, "t"), &mut surface)
            .await
            .unwrap_err();
        assert!(err.is_canceled());
    }
}
