use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use signon_core::{parse, reply_map, NegotiationError, RawOptions};

use crate::assembler::{assemble, Completion};
use crate::dialog::{run_dialog, NativeDialog};
use crate::mode::{select, Mode};
use crate::session::{Outcome, Session};
use crate::surface::SurfaceProvider;
use crate::web_flow::{run_web_flow, WebFlow};
use crate::NegotiationConfig;

/// Accepts queries and runs each one as an independent session.
///
/// Sessions for the same caller window run one at a time in arrival order;
/// different windows proceed concurrently.
#[derive(Clone)]
pub struct Service {
    inner: Arc<Inner>,
}

struct Inner {
    config: NegotiationConfig,
    surfaces: Arc<dyn SurfaceProvider>,
    windows: Mutex<HashMap<u64, WindowQueue>>,
    cancels: Mutex<HashMap<String, Vec<oneshot::Sender<()>>>>,
    in_flight: AtomicUsize,
}

impl Service {
    pub fn new(config: NegotiationConfig, surfaces: Arc<dyn SurfaceProvider>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                surfaces,
                windows: Mutex::new(HashMap::new()),
                cancels: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Negotiate credentials for one request. Invalid requests fail here,
    /// before any session or UI exists.
    pub async fn query(&self, raw: &RawOptions) -> Outcome {
        let request = match parse(raw) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "rejecting request");
                return Err(e);
            }
        };
        let mode = select(&request);
        let (session, reply) = Session::new(request, mode);
        info!(session = %session.id(), %mode, window = session.request().window_id(), "new session");

        self.spawn(session);

        reply
            .await
            .unwrap_or_else(|_| Err(NegotiationError::Surface("session ended without a reply".into())))
    }

    /// Map-in/map-out form of [`Service::query`]. Failures come back as an
    /// error descriptor map.
    pub async fn query_dialog(&self, raw: &RawOptions) -> Map<String, Value> {
        reply_map(self.query(raw).await)
    }

    /// Cancel every queued or running session carrying `request_id`.
    /// Returns whether any was found.
    pub fn cancel_ui_request(&self, request_id: &str) -> bool {
        let senders = lock(&self.inner.cancels).remove(request_id);
        let Some(senders) = senders else {
            debug!(request_id, "no session to cancel");
            return false;
        };
        info!(request_id, count = senders.len(), "canceling sessions");
        for tx in senders {
            let _ = tx.send(());
        }
        true
    }

    /// No session is queued or running
    pub fn is_idle(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) == 0
    }

    fn spawn(&self, session: Session) {
        let inner = self.inner.clone();
        let window_id = session.request().window_id();
        let request_id = session.request().request_id.clone();
        let mut cancel = CancelSignal(request_id.as_deref().map(|id| inner.register_cancel(id)));
        // the window turn is queued here, in call order, not when the task first runs
        let mut turn = inner.enqueue(window_id);
        inner.in_flight.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let mut session = session;
            let mut has_turn = false;

            let outcome = inner
                .run_in_window(&mut session, &mut turn, &mut has_turn, &mut cancel)
                .await;
            if outcome.as_ref().is_err_and(NegotiationError::is_canceled) {
                info!(session = %session.id(), "session canceled");
            }

            if let Some(request_id) = &request_id {
                inner.forget_cancel(request_id);
            }
            inner.leave_window(window_id, turn, has_turn);
            inner.in_flight.fetch_sub(1, Ordering::SeqCst);
            session.complete(outcome);
        });
    }
}

/// Sessions waiting on one caller window
#[derive(Default)]
struct WindowQueue {
    busy: bool,
    waiting: VecDeque<oneshot::Sender<()>>,
}

/// Fires once `cancel_ui_request` names the session's request id
struct CancelSignal(Option<oneshot::Receiver<()>>);

impl CancelSignal {
    async fn triggered(&mut self) {
        if let Some(rx) = self.0.as_mut() {
            if rx.await.is_ok() {
                return;
            }
            // service side dropped without canceling
            self.0 = None;
        }
        std::future::pending::<()>().await
    }
}

impl Inner {
    async fn run_in_window(
        &self,
        session: &mut Session,
        turn: &mut oneshot::Receiver<()>,
        has_turn: &mut bool,
        cancel: &mut CancelSignal,
    ) -> Outcome {
        tokio::select! {
            _ = turn => {}
            _ = cancel.triggered() => return Err(NegotiationError::UserCanceled),
        }
        *has_turn = true;

        session.activate();
        debug!(session = %session.id(), "session active");
        self.drive(session, cancel).await
    }

    async fn drive(&self, session: &Session, cancel: &mut CancelSignal) -> Outcome {
        let info = session.info();
        let request = session.request();

        match session.mode() {
            Mode::AutoComplete => Ok(assemble(session, Completion::AutoComplete)),
            Mode::NativeQuery => {
                let dialog = NativeDialog::new(request, &self.config.dialog_title);
                let mut surface = self.surfaces.dialog(&info).await?;
                let finished = tokio::select! {
                    values = run_dialog(dialog, surface.as_mut()) => Some(values),
                    _ = cancel.triggered() => None,
                };
                match finished {
                    Some(values) => Ok(assemble(session, Completion::Dialog(values?))),
                    None => {
                        surface.hide().await;
                        Err(NegotiationError::UserCanceled)
                    }
                }
            }
            Mode::WebFlow => {
                let flow = WebFlow::new(request, &self.config)?;
                let mut surface = self.surfaces.web_view(&info).await?;
                let grace = self.config.load_failure_grace;
                let finished = tokio::select! {
                    url = run_web_flow(flow, surface.as_mut(), grace) => Some(url),
                    _ = cancel.triggered() => None,
                };
                match finished {
                    Some(url) => {
                        let url_response = url?;
                        Ok(assemble(session, Completion::Web { url_response }))
                    }
                    None => {
                        surface.close().await;
                        Err(NegotiationError::UserCanceled)
                    }
                }
            }
        }
    }

    fn register_cancel(&self, request_id: &str) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.cancels)
            .entry(request_id.to_string())
            .or_default()
            .push(tx);
        rx
    }

    fn forget_cancel(&self, request_id: &str) {
        let mut cancels = lock(&self.cancels);
        if let Some(senders) = cancels.get_mut(request_id) {
            senders.retain(|tx| !tx.is_closed());
            if senders.is_empty() {
                cancels.remove(request_id);
            }
        }
    }

    /// Join the back of `window_id`'s queue. The receiver fires when the
    /// session may use the window; an idle window grants it at once.
    fn enqueue(&self, window_id: u64) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut windows = lock(&self.windows);
        let queue = windows.entry(window_id).or_default();
        if queue.busy {
            queue.waiting.push_back(tx);
        } else {
            queue.busy = true;
            let _ = tx.send(());
        }
        rx
    }

    /// Give up a place in `window_id`'s queue. A turn granted but never
    /// observed still counts as held and is passed on.
    fn leave_window(&self, window_id: u64, mut turn: oneshot::Receiver<()>, has_turn: bool) {
        let mut windows = lock(&self.windows);
        let held = has_turn || turn.try_recv().is_ok();
        drop(turn);
        if !held {
            return;
        }

        let Some(queue) = windows.get_mut(&window_id) else {
            return;
        };
        // waiters canceled while queued have dropped their receiver
        while let Some(next) = queue.waiting.pop_front() {
            if next.send(()).is_ok() {
                return;
            }
        }
        windows.remove(&window_id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
