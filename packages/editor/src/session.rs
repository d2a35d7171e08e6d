//! # Editor Session
//!
//! Async host loop around an [`Editor`]. The editor itself stays a plain
//! `&mut self` state machine; the session owns it inside one tokio task and
//! drives everything that involves time or the network:
//!
//! ```text
//! SessionHandle ──commands──► EditorSession task ──events──► UnboundedReceiver<SessionEvent>
//!                              │  autosave deadline (sleep_until → flush)
//!                              │  mirror outbox → one ordered push task (timeout)
//!                              └─ one AI request at a time (abortable)
//! ```
//!
//! Mirror and AI failures never touch the document; they surface as
//! [`SessionEvent::Status`].

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, info, warn};

use crate::ai::{AiAssistant, AiError, AiResponse};
use crate::editor::Editor;
use crate::errors::SessionError;
use crate::events::EditorEvent;
use crate::merge::SelectionContext;
use crate::sync::{DraftMirror, MirrorOp, SyncError};

const COMMAND_BUFFER: usize = 64;

/// What a session reports to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Forwarded from the editor's event bus
    Editor(EditorEvent),
    /// Suggestions returned with an AI response
    AiSuggestions(Vec<String>),
    /// The AI draft missed the selection or changed nothing
    AiNoEdits,
    /// User-visible notice (mirror or AI failure)
    Status(String),
}

type EditorFn = Box<dyn FnOnce(&mut Editor) + Send>;

enum Command {
    WithEditor(EditorFn),
    Chat {
        prompt: String,
        selection: Option<SelectionContext>,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    CancelChat,
    Pull {
        reply: oneshot::Sender<Result<usize, SessionError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct AiOutcome {
    request_id: u64,
    selection: Option<SelectionContext>,
    result: Result<AiResponse, AiError>,
}

enum PushJob {
    Op(MirrorOp),
    /// Answered once every earlier op has been sent
    Barrier(oneshot::Sender<()>),
}

struct InFlight {
    request_id: u64,
    task: JoinHandle<()>,
}

/// Cheap, cloneable front end to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Run `f` against the editor inside the session task.
    pub async fn with_editor<R, F>(&self, f: F) -> Result<R, SessionError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Editor) -> R + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job: EditorFn = Box::new(move |editor| {
            let _ = reply.send(f(editor));
        });
        self.send(Command::WithEditor(job)).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Start an AI request for the live document. Fails with `AiBusy` while
    /// another request is in flight.
    pub async fn chat(
        &self,
        prompt: impl Into<String>,
        selection: Option<SelectionContext>,
    ) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Chat {
            prompt: prompt.into(),
            selection,
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Abort the in-flight AI request, if any. Nothing is reported.
    pub async fn cancel_chat(&self) -> Result<(), SessionError> {
        self.send(Command::CancelChat).await
    }

    /// Merge drafts from the mirror that are missing locally or newer.
    /// Returns how many were stored.
    pub async fn pull_from_mirror(&self) -> Result<usize, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Pull { reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Flush the pending autosave and stop the session.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

pub struct EditorSession {
    editor: Editor,
    ai: Option<Arc<dyn AiAssistant>>,
    mirror: Option<Arc<dyn DraftMirror>>,
}

impl EditorSession {
    pub fn new(editor: Editor) -> Self {
        Self {
            editor,
            ai: None,
            mirror: None,
        }
    }

    pub fn with_ai(mut self, ai: Arc<dyn AiAssistant>) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn DraftMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    /// Move the editor into a tokio task. Must be called within a runtime.
    pub fn spawn(self) -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (ai_tx, ai_rx) = mpsc::unbounded_channel();

        let mut editor = self.editor;
        let forward = event_tx.clone();
        editor.subscribe(move |event| {
            let _ = forward.send(SessionEvent::Editor(event.clone()));
        });
        let mirror_tx = self.mirror.clone().map(|mirror| {
            editor.enable_mirror_outbox();
            let (tx, rx) = mpsc::unbounded_channel();
            let limit = editor.context().config.mirror_timeout();
            tokio::spawn(push_to_mirror(mirror, rx, limit, event_tx.clone()));
            tx
        });

        let worker = SessionWorker {
            editor,
            ai: self.ai,
            mirror: self.mirror,
            mirror_tx,
            commands: command_rx,
            events: event_tx,
            ai_tx,
            ai_rx,
            in_flight: None,
            next_request_id: 0,
            autosave_timer: None,
        };
        tokio::spawn(worker.run());

        info!("[Session] Started");
        (SessionHandle { commands: command_tx }, event_rx)
    }
}

struct SessionWorker {
    editor: Editor,
    ai: Option<Arc<dyn AiAssistant>>,
    mirror: Option<Arc<dyn DraftMirror>>,
    /// Feeds the push task; ops reach the mirror in the order they were queued
    mirror_tx: Option<mpsc::UnboundedSender<PushJob>>,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
    ai_tx: mpsc::UnboundedSender<AiOutcome>,
    ai_rx: mpsc::UnboundedReceiver<AiOutcome>,
    in_flight: Option<InFlight>,
    next_request_id: u64,
    /// Autosave generation the timer was armed for, and when it fires
    autosave_timer: Option<(u64, Instant)>,
}

impl SessionWorker {
    async fn run(mut self) {
        loop {
            let deadline = self.autosave_timer.map(|(_, at)| at);

            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("[Session] All handles dropped");
                        break;
                    };
                    if let Some(reply) = self.handle(command).await {
                        self.stop();
                        let _ = reply.send(());
                        return;
                    }
                }
                Some(outcome) = self.ai_rx.recv() => {
                    self.on_ai_outcome(outcome);
                }
                _ = wait_until(deadline) => {
                    debug!("[Session] Autosave deadline reached");
                    self.editor.flush_autosave();
                }
            }

            self.arm_autosave_timer();
            self.drain_outbox();
        }

        self.stop();
    }

    /// Handle one command. Returns the reply channel when the session should stop.
    async fn handle(&mut self, command: Command) -> Option<oneshot::Sender<()>> {
        match command {
            Command::WithEditor(job) => job(&mut self.editor),
            Command::Chat {
                prompt,
                selection,
                reply,
            } => {
                let _ = reply.send(self.start_chat(prompt, selection));
            }
            Command::CancelChat => {
                if let Some(in_flight) = self.in_flight.take() {
                    debug!("[Session] AI request {} aborted", in_flight.request_id);
                    in_flight.task.abort();
                }
            }
            Command::Pull { reply } => {
                let _ = reply.send(self.pull().await);
            }
            Command::Shutdown { reply } => return Some(reply),
        }
        None
    }

    fn start_chat(
        &mut self,
        prompt: String,
        selection: Option<SelectionContext>,
    ) -> Result<(), SessionError> {
        let ai = self.ai.clone().ok_or(SessionError::AiUnavailable)?;
        if self.in_flight.is_some() {
            return Err(SessionError::AiBusy);
        }

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let request = self.editor.ai_request(prompt, selection.clone());
        let limit = self.editor.context().config.ai_timeout();
        let tx = self.ai_tx.clone();

        let task = tokio::spawn(async move {
            let result = match timeout(limit, ai.suggest(request)).await {
                Ok(result) => result,
                Err(_) => Err(AiError::Timeout),
            };
            let _ = tx.send(AiOutcome {
                request_id,
                selection,
                result,
            });
        });

        debug!("[Session] AI request {} started", request_id);
        self.in_flight = Some(InFlight { request_id, task });
        Ok(())
    }

    fn on_ai_outcome(&mut self, outcome: AiOutcome) {
        match &self.in_flight {
            Some(in_flight) if in_flight.request_id == outcome.request_id => {
                self.in_flight = None;
            }
            // Cancelled or superseded
            _ => return,
        }

        match outcome.result {
            Ok(response) => {
                if !response.suggestions.is_empty() {
                    self.emit(SessionEvent::AiSuggestions(response.suggestions));
                }
                if let Some(draft) = response.draft {
                    if !self.editor.apply_ai_edits(&draft, outcome.selection.as_ref()) {
                        self.emit(SessionEvent::AiNoEdits);
                    }
                }
            }
            Err(AiError::Aborted) => {
                debug!("[Session] AI request {} aborted remotely", outcome.request_id);
            }
            Err(e) => {
                warn!("[Session] AI request {} failed: {}", outcome.request_id, e);
                self.emit(SessionEvent::Status(e.to_string()));
            }
        }
    }

    async fn pull(&mut self) -> Result<usize, SessionError> {
        let mirror = self.mirror.clone().ok_or(SessionError::MirrorUnavailable)?;
        let limit = self.editor.context().config.mirror_timeout();

        // Local deletes must land remotely before we look for missing drafts
        self.drain_outbox();
        self.wait_for_pushes().await;

        let remote = bounded(limit, mirror.list()).await?;
        let mut merged = 0;

        for summary in remote {
            let local_updated = self
                .editor
                .drafts()
                .get(&summary.id)
                .ok()
                .flatten()
                .map(|d| d.updated_at);
            if local_updated.is_some_and(|local| summary.last_modified() <= local) {
                continue;
            }

            match bounded(limit, mirror.get(summary.id.clone())).await {
                Ok(draft) => {
                    if self.editor.merge_remote_draft(&draft) {
                        merged += 1;
                    }
                }
                Err(e) => {
                    warn!("[Session] Failed to pull draft {}: {}", summary.id, e);
                    self.emit(SessionEvent::Status(e.to_string()));
                }
            }
        }

        info!("[Session] Pulled {} drafts from mirror", merged);
        Ok(merged)
    }

    /// Arm the timer for the editor's pending autosave, keeping an existing
    /// deadline while the same autosave is pending.
    fn arm_autosave_timer(&mut self) {
        if !self.editor.autosave_pending() {
            self.autosave_timer = None;
            return;
        }

        let generation = self.editor.autosave_generation();
        if self.autosave_timer.map(|(g, _)| g) != Some(generation) {
            let delay = self.editor.context().config.autosave_delay();
            self.autosave_timer = Some((generation, Instant::now() + delay));
        }
    }

    fn drain_outbox(&mut self) {
        let ops = self.editor.take_mirror_ops();
        let Some(tx) = &self.mirror_tx else {
            return;
        };
        for op in ops {
            if tx.send(PushJob::Op(op)).is_err() {
                warn!("[Session] Mirror push task is gone");
                return;
            }
        }
    }

    fn wait_for_pushes(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let tx = self.mirror_tx.clone();
        async move {
            let Some(tx) = tx else {
                return;
            };
            let (done, rx) = oneshot::channel();
            if tx.send(PushJob::Barrier(done)).is_ok() {
                let _ = rx.await;
            }
        }
    }

    fn stop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
        self.editor.flush_autosave();
        self.drain_outbox();
        info!("[Session] Stopped");
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// Send queued ops one at a time so a delete never overtakes an earlier put.
async fn push_to_mirror(
    mirror: Arc<dyn DraftMirror>,
    mut jobs: mpsc::UnboundedReceiver<PushJob>,
    limit: std::time::Duration,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    while let Some(job) = jobs.recv().await {
        let op = match job {
            PushJob::Op(op) => op,
            PushJob::Barrier(done) => {
                let _ = done.send(());
                continue;
            }
        };
        let id = op.draft_id().to_string();
        match bounded(limit, op.send(mirror.as_ref())).await {
            Ok(()) => debug!("[Session] Mirrored draft {}", id),
            Err(e) => {
                warn!("[Session] Mirror push for {} failed: {}", id, e);
                let _ = events.send(SessionEvent::Status(e.to_string()));
            }
        }
    }
    debug!("[Session] Mirror push task finished");
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn bounded<T>(
    limit: std::time::Duration,
    request: impl std::future::Future<Output = Result<T, SyncError>>,
) -> Result<T, SyncError> {
    match timeout(limit, request).await {
        Ok(result) => result,
        Err(_) => Err(SyncError::Timeout),
    }
}
