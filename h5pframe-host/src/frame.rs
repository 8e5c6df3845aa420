//! Lifecycle of one embedded frame: synthesize, publish, listen, lay out.
//!
//! [`FrameCore`] is the synchronous state machine; [`FrameHandle`] drives it
//! from a single tokio task so message events and timer deadlines interleave
//! on one queue.

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::layout::{LayoutChange, LayoutController};
use crate::message::RawMessage;
use crate::publisher::{Address, AddressBackend, Publisher};
use crate::relay::{push_token, GuestWindow};
use crate::router::{Routed, RoutedEvent, Router};
use h5pframe_doc::{synthesize, Mode, Settings};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Host-side receivers for guest outcomes. Every method defaults to a no-op.
pub trait HostCallbacks: Send + Sync {
    fn on_submit(&self, content: Value, id: Option<String>) {
        let _ = (content, id);
    }

    fn on_error(&self, error: BridgeError) {
        let _ = error;
    }

    fn on_telemetry(&self, statement: Value) {
        let _ = statement;
    }
}

/// Inputs the host supplies when mounting a frame
#[derive(Debug, Clone)]
pub struct FrameProps {
    pub settings: Settings,
    pub mode: Mode,
    pub locale: String,
    /// Handed back with every submit so the host can match it to its request.
    pub correlation_id: Option<String>,
    /// Origin of the host page; guest messages must carry it unless the check is skipped.
    pub host_origin: String,
}

/// What the host container renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub generation: u64,
    pub address: Option<Address>,
    pub height: f64,
    pub ready: bool,
    pub mounted: bool,
}

pub struct FrameCore {
    props: FrameProps,
    config: BridgeConfig,
    callbacks: Arc<dyn HostCallbacks>,
    publisher: Publisher,
    router: Router,
    layout: LayoutController,
    generation: u64,
    guest: Option<Arc<dyn GuestWindow>>,
    mounted: bool,
}

impl FrameCore {
    /// Mount generation 1: synthesize and publish the first document.
    pub fn mount(
        props: FrameProps,
        config: BridgeConfig,
        backend: Arc<dyn AddressBackend>,
        callbacks: Arc<dyn HostCallbacks>,
        now: Instant,
    ) -> Self {
        let router = router_for(&props, &config);
        let layout = LayoutController::new(config.layout_policy(), now);
        let mut core = Self {
            props,
            config,
            callbacks,
            publisher: Publisher::new(backend),
            router,
            layout,
            generation: 1,
            guest: None,
            mounted: true,
        };
        core.render();
        core
    }

    fn render(&mut self) {
        match synthesize(&self.props.settings, self.props.mode, &self.props.locale) {
            Ok(doc) => {
                if let Err(e) = self.publisher.publish(&doc.html) {
                    self.callbacks.on_error(e);
                }
            }
            Err(e) => {
                tracing::warn!(generation = self.generation, error = %e, "guest document not synthesized");
                self.publisher.revoke();
                self.callbacks.on_error(BridgeError::Document(e));
            }
        }
    }

    /// Replace the settings wholesale. Starts a new generation: the old guest
    /// window is detached and its late messages are dropped.
    pub fn update_settings(&mut self, settings: Settings, now: Instant) {
        if !self.mounted {
            return;
        }
        self.props.settings = settings;
        self.generation += 1;
        self.guest = None;
        self.router = router_for(&self.props, &self.config);
        self.layout.remount(now);
        tracing::info!(generation = self.generation, "remounting guest");
        self.render();
    }

    /// Register the window of the guest loaded for `generation`. Returns false
    /// for a stale generation.
    pub fn attach_guest(&mut self, generation: u64, window: Arc<dyn GuestWindow>) -> bool {
        if !self.mounted || generation != self.generation {
            return false;
        }
        self.guest = Some(window);
        true
    }

    /// Relay a refreshed token to the attached guest. Returns false when there
    /// is no guest to deliver to; the token is not kept for later.
    pub fn push_token(&self, token: Option<&str>) -> bool {
        match (&self.guest, self.mounted) {
            (Some(window), true) => {
                push_token(window.as_ref(), token);
                true
            }
            _ => {
                tracing::debug!(generation = self.generation, "no guest attached, token dropped");
                false
            }
        }
    }

    pub fn handle_message(&mut self, generation: u64, message: &RawMessage, now: Instant) {
        if !self.mounted {
            tracing::trace!("message after unmount ignored");
            return;
        }
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "message from detached guest ignored"
            );
            return;
        }
        if let Routed::Dispatched(events) = self.router.route(message) {
            for event in events {
                self.dispatch(event, now);
            }
        }
    }

    fn dispatch(&mut self, event: RoutedEvent, now: Instant) {
        match event {
            RoutedEvent::Height(h) => self.layout.offer(h, now),
            RoutedEvent::Telemetry(statement) => self.callbacks.on_telemetry(statement),
            RoutedEvent::Submit { content, id } => self.callbacks.on_submit(content, id),
            RoutedEvent::GuestError(error) => {
                self.callbacks.on_error(BridgeError::GuestReported(error))
            }
        }
    }

    /// Fire due layout timers.
    pub fn tick(&mut self, now: Instant) -> Vec<LayoutChange> {
        if !self.mounted {
            return Vec::new();
        }
        let changes = self.layout.poll(now);
        for change in &changes {
            tracing::debug!(generation = self.generation, ?change, "layout changed");
        }
        changes
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.mounted {
            self.layout.next_deadline()
        } else {
            None
        }
    }

    /// Revoke the address and stop reacting to anything.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.guest = None;
        self.publisher.revoke();
        tracing::info!(generation = self.generation, "frame unmounted");
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn address(&self) -> Option<&Address> {
        self.publisher.current()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            generation: self.generation,
            address: self.publisher.current().cloned(),
            height: self.layout.rendered_height(),
            ready: self.layout.is_ready(),
            mounted: self.mounted,
        }
    }
}

fn router_for(props: &FrameProps, config: &BridgeConfig) -> Router {
    Router::new(
        config.origin_policy(&props.host_origin),
        config.min_accepted_height,
        props.settings.nonce.clone(),
        props.correlation_id.clone(),
    )
}

enum Command {
    Message {
        generation: u64,
        message: RawMessage,
    },
    AttachGuest {
        generation: u64,
        window: Arc<dyn GuestWindow>,
    },
    UpdateSettings(Settings),
    PushToken(Option<String>),
    Unmount,
}

/// The host's window-message listener for one guest generation.
#[derive(Clone)]
pub struct MessageListener {
    generation: u64,
    commands: mpsc::UnboundedSender<Command>,
}

impl MessageListener {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Hand a received window message to the frame. Never blocks.
    pub fn deliver(&self, message: RawMessage) {
        let _ = self.commands.send(Command::Message {
            generation: self.generation,
            message,
        });
    }

    /// Register the guest's window once it has bootstrapped.
    pub fn attach(&self, window: Arc<dyn GuestWindow>) {
        let _ = self.commands.send(Command::AttachGuest {
            generation: self.generation,
            window,
        });
    }
}

/// A frame running on its own tokio task. Dropping the handle unmounts the frame.
pub struct FrameHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<FrameSnapshot>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl FrameHandle {
    /// Mount and start driving a frame. Must be called inside a tokio runtime.
    pub fn spawn(
        props: FrameProps,
        config: BridgeConfig,
        backend: Arc<dyn AddressBackend>,
        callbacks: Arc<dyn HostCallbacks>,
    ) -> Self {
        let core = FrameCore::mount(props, config, backend, callbacks, now());
        let generation = core.generation();
        let (state_tx, state_rx) = watch::channel(core.snapshot());
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(core, rx, state_tx));
        Self {
            commands: tx,
            state: state_rx,
            generation,
            task: Some(task),
        }
    }

    /// Listener bound to the latest generation, including one whose settings
    /// change the driver has not processed yet.
    pub fn listener(&self) -> MessageListener {
        MessageListener {
            generation: self.generation,
            commands: self.commands.clone(),
        }
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<FrameSnapshot> {
        self.state.clone()
    }

    /// Replace the settings and return the listener for the guest that will
    /// load them. Listeners from earlier generations go stale.
    pub fn update_settings(&mut self, settings: Settings) -> BridgeResult<MessageListener> {
        self.send(Command::UpdateSettings(settings))?;
        self.generation += 1;
        Ok(self.listener())
    }

    pub fn push_token(&self, token: Option<String>) -> BridgeResult<()> {
        self.send(Command::PushToken(token))
    }

    /// Stop the frame and wait for its task to finish.
    pub async fn unmount(mut self) {
        let _ = self.commands.send(Command::Unmount);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "frame task ended abnormally");
            }
        }
    }

    fn send(&self, command: Command) -> BridgeResult<()> {
        self.commands.send(command).map_err(|_| BridgeError::Closed)
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.commands.send(Command::Unmount);
        }
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
        None => std::future::pending().await,
    }
}

async fn drive(
    mut core: FrameCore,
    mut commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<FrameSnapshot>,
) {
    loop {
        let deadline = core.next_deadline();
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Message { generation, message }) => {
                    core.handle_message(generation, &message, now());
                }
                Some(Command::AttachGuest { generation, window }) => {
                    core.attach_guest(generation, window);
                }
                Some(Command::UpdateSettings(settings)) => {
                    core.update_settings(settings, now());
                }
                Some(Command::PushToken(token)) => {
                    core.push_token(token.as_deref());
                }
                Some(Command::Unmount) | None => {
                    core.unmount();
                    state.send_replace(core.snapshot());
                    break;
                }
            },
            _ = sleep_until(deadline) => {
                core.tick(now());
            }
        }

        let next = core.snapshot();
        state.send_if_modified(|current| {
            if *current != next {
                *current = next;
                true
            } else {
                false
            }
        });
    }
}
