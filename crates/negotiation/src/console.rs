use async_trait::async_trait;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stderr, Stdin,
};
use tracing::debug;

use signon_core::NegotiationError;

use crate::dialog::DialogForm;
use crate::surface::{DialogEvent, DialogField, DialogInput, DialogSurface};

const CANCEL_WORD: &str = ":cancel";

/// Terminal prompt. Answers are read line by line from stdin; `:cancel` or
/// end of input dismisses the prompt.
pub struct ConsoleDialog<R = BufReader<Stdin>, W = Stderr> {
    input: Lines<R>,
    output: W,
    form: Option<DialogForm>,
}

impl ConsoleDialog {
    pub fn new() -> Self {
        Self::with_io(BufReader::new(tokio::io::stdin()), tokio::io::stderr())
    }
}

impl<R, W> ConsoleDialog<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn with_io(input: R, output: W) -> Self {
        Self {
            input: input.lines(),
            output,
            form: None,
        }
    }

    async fn say(&mut self, text: &str) -> Result<(), NegotiationError> {
        self.output
            .write_all(text.as_bytes())
            .await
            .map_err(|e| NegotiationError::Surface(e.to_string()))?;
        self.output
            .flush()
            .await
            .map_err(|e| NegotiationError::Surface(e.to_string()))
    }

    /// `None` when the user cancelled or input ended
    async fn ask(&mut self, label: &str) -> Option<String> {
        self.say(&format!("{}: ", label)).await.ok()?;
        let line = self.input.next_line().await.ok()??;
        let line = line.trim_end_matches('\r').to_string();
        (line.trim() != CANCEL_WORD).then_some(line)
    }
}

impl Default for ConsoleDialog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R, W> DialogSurface for ConsoleDialog<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn show(&mut self, form: &DialogForm) -> Result<(), NegotiationError> {
        let mut text = format!("\n== {} ==\n", form.title);
        if let Some(message) = &form.message {
            text.push_str(message);
            text.push('\n');
        }
        if let Some(url) = &form.captcha_url {
            text.push_str(&format!("Captcha image: {}\n", url));
        }
        text.push_str(&format!("(type {} to cancel)\n", CANCEL_WORD));
        self.say(&text).await?;
        self.form = Some(form.clone());
        Ok(())
    }

    async fn reject(&mut self, field: DialogField) -> Result<(), NegotiationError> {
        let name = match field {
            DialogField::Username => "Username",
            DialogField::Password => "Password",
            DialogField::Captcha => "Captcha",
        };
        self.say(&format!("{} must not be empty\n", name)).await
    }

    async fn next_event(&mut self) -> Option<DialogEvent> {
        let form = self.form.clone()?;
        let mut input = DialogInput::default();

        match &form.username {
            Some(field) if field.enabled => match self.ask("Username").await {
                Some(value) => input.username = value,
                None => return Some(DialogEvent::Cancel),
            },
            Some(field) => {
                if let Err(e) = self.say(&format!("Username: {}\n", field.value)).await {
                    debug!(error = %e, "could not echo username");
                }
            }
            None => {}
        }
        if form.password.is_some() {
            match self.ask("Password").await {
                Some(value) => input.password = value,
                None => return Some(DialogEvent::Cancel),
            }
        }
        if form.captcha_url.is_some() {
            match self.ask("Captcha").await {
                Some(value) => input.captcha = value,
                None => return Some(DialogEvent::Cancel),
            }
        }

        Some(DialogEvent::Submit(input))
    }

    async fn hide(&mut self) {
        self.form = None;
        if let Err(e) = self.say("\n").await {
            debug!(error = %e, "could not close prompt");
        }
    }
}
