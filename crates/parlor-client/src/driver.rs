//! Session driver: the async loop around the [`Coordinator`].
//!
//! One task owns the coordinator and multiplexes four sources with
//! `tokio::select!`: realtime events, user actions, REST completions and a
//! notification prune tick. REST calls run on spawned tasks and only their
//! [`BackendResponse`] comes back into the loop, so all state mutation stays
//! on this task.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use parlor_shared::{ClientEvent, RoomId, UserId};

use crate::backend::{Backend, BackendRequest, BackendResponse, LocalFile};
use crate::coordinator::{Coordinator, Effect};
use crate::error::{ClientError, Result};
use crate::notify::{Notification, NotificationCenter};
use crate::realtime::RealtimeLink;
use crate::state::SessionState;

const PRUNE_INTERVAL: Duration = Duration::from_millis(100);

/// Something the user did in the frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    OpenRoom(RoomId),
    OpenDirectPeer(UserId),
    LeaveActive,
    SetDraft(String),
    /// Send the current draft.
    SendDraft,
    SendMessage(String),
    /// Upload a file from disk to the open conversation.
    UploadFile { path: PathBuf },
    CreateRoom { name: String, is_private: bool },
    RefreshRooms,
    SetUploadMenu(bool),
    Shutdown,
}

/// Presentation layer fed by the driver.
pub trait Frontend: Send {
    /// Session state changed.
    fn render(&mut self, state: &SessionState);

    /// The set of live notifications changed.
    fn notifications(&mut self, center: &NotificationCenter);
}

struct SessionDriver<B: Backend, F: Frontend> {
    coordinator: Coordinator,
    backend: Arc<B>,
    outbound: mpsc::Sender<ClientEvent>,
    completions: mpsc::Sender<BackendResponse>,
    center: NotificationCenter,
    frontend: F,
}

/// Run a session until the user shuts it down or the realtime channel goes
/// away. Returns the coordinator so callers can inspect the final state.
pub async fn run_session<B: Backend, F: Frontend>(
    coordinator: Coordinator,
    backend: Arc<B>,
    link: RealtimeLink,
    mut actions: mpsc::Receiver<UserAction>,
    frontend: F,
) -> Result<Coordinator> {
    let RealtimeLink {
        outbound,
        mut inbound,
    } = link;
    let (completions, mut done_rx) = mpsc::channel::<BackendResponse>(outbound.max_capacity());

    let mut driver = SessionDriver {
        coordinator,
        backend,
        outbound,
        completions,
        center: NotificationCenter::default(),
        frontend,
    };

    let mut prune = tokio::time::interval(PRUNE_INTERVAL);
    prune.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(username = %driver.coordinator.state().username, "Session started");
    driver.frontend.render(driver.coordinator.state());

    loop {
        let effects = tokio::select! {
            event = inbound.recv() => match event {
                Some(event) => driver.coordinator.handle(event),
                None => {
                    info!("Realtime channel closed, ending session");
                    break;
                }
            },

            action = actions.recv() => match action {
                Some(UserAction::Shutdown) | None => {
                    info!("Session shut down");
                    break;
                }
                Some(action) => driver.dispatch(action).await,
            },

            Some(response) = done_rx.recv() => driver.coordinator.apply(response),

            _ = prune.tick() => {
                if driver.center.prune(Instant::now()) > 0 {
                    driver.frontend.notifications(&driver.center);
                }
                continue;
            }
        };

        driver.execute(effects)?;
    }

    Ok(driver.coordinator)
}

impl<B: Backend, F: Frontend> SessionDriver<B, F> {
    async fn dispatch(&mut self, action: UserAction) -> Vec<Effect> {
        debug!(action = ?action, "User action");
        let c = &mut self.coordinator;
        match action {
            UserAction::OpenRoom(room_id) => c.open_room(&room_id),
            UserAction::OpenDirectPeer(user_id) => c.open_direct_peer(&user_id),
            UserAction::LeaveActive => c.leave_active(),
            UserAction::SetDraft(text) => {
                c.set_draft(text);
                Vec::new()
            }
            UserAction::SendDraft => c.send_draft(),
            UserAction::SendMessage(text) => c.send_message(&text),
            UserAction::UploadFile { path } => match LocalFile::read(&path).await {
                Ok(file) => c.upload_to_active(file),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not read upload");
                    vec![Effect::Notify(Notification::error(format!(
                        "Could not read {}",
                        path.display()
                    )))]
                }
            },
            UserAction::CreateRoom { name, is_private } => c.create_room(&name, is_private),
            UserAction::RefreshRooms => c.refresh_rooms(),
            UserAction::SetUploadMenu(open) => c.set_upload_menu(open),
            // Handled by the loop.
            UserAction::Shutdown => Vec::new(),
        }
    }

    /// Carry out effects in order. Renders are coalesced into one call.
    ///
    /// Emits never wait for queue space: this task also drains the inbound
    /// queue, so blocking here could stall a transport that services both
    /// directions from one task.
    fn execute(&mut self, effects: Vec<Effect>) -> Result<()> {
        let mut render = false;
        let mut notified = false;

        for effect in effects {
            match effect {
                Effect::Emit(event) => {
                    debug!(event = event.name(), "Emit");
                    match self.outbound.try_send(event) {
                        Ok(()) => {}
                        Err(TrySendError::Full(event)) => {
                            warn!(event = event.name(), "Realtime outbound queue full, dropping");
                            self.center
                                .push(Notification::error("Message could not be sent, try again"));
                            notified = true;
                        }
                        Err(TrySendError::Closed(_)) => return Err(ClientError::ChannelClosed),
                    }
                }
                Effect::Request(request) => self.spawn_request(request),
                Effect::Notify(notification) => {
                    self.center.push(notification);
                    notified = true;
                }
                Effect::Render => render = true,
            }
        }

        if render {
            self.frontend.render(self.coordinator.state());
        }
        if notified {
            self.frontend.notifications(&self.center);
        }
        Ok(())
    }

    fn spawn_request(&self, request: BackendRequest) {
        let backend = Arc::clone(&self.backend);
        let completions = self.completions.clone();
        let name = request.name();
        debug!(request = name, "REST request");

        tokio::spawn(async move {
            let response = request.execute(backend.as_ref()).await;
            if completions.send(response).await.is_err() {
                debug!(request = name, "Session ended before the request completed");
            }
        });
    }
}
