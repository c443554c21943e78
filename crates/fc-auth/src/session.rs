//! Session Store
//!
//! Single source of truth for who is signed in. One worker task owns the
//! [`SessionState`] and is its only writer; commands, provider events and
//! resolution results are applied one at a time in arrival order.
//!
//! Profile resolution runs in a spawned task tagged with an epoch. Sign-out,
//! `clear()` and any newer resolution bump the epoch and abort the previous
//! task, so a late result for a superseded identity is never applied.
//!
//! ```text
//!   commands ──┐
//!   provider ──┼──► worker ──► watch<SessionState> ──► guard / UI
//!   results  ──┘       │
//!                      └──► resolution task (epoch n) ──► results
//! ```

use fc_common::{AuthSession, Company, Identity, Profile, Role};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{LoadError, SessionError};
use crate::profile_loader::{LoadedProfile, ProfileLoader};
use crate::provider::{AuthEventKind, IdentityProvider, ProviderEvent};

/// Snapshot of the session as seen by the rest of the portal.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub auth: Option<AuthSession>,
    pub profile: Option<Profile>,
    pub company: Option<Company>,
    pub loading: bool,
    pub initialized: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            auth: None,
            profile: None,
            company: None,
            loading: true,
            initialized: false,
        }
    }
}

impl SessionState {
    /// Settled state with no one signed in.
    pub fn signed_out() -> Self {
        Self {
            loading: false,
            initialized: true,
            ..Self::default()
        }
    }

    /// Settled state for a resolved identity.
    pub fn signed_in(identity: Identity, profile: Profile, company: Option<Company>) -> Self {
        Self {
            identity: Some(identity),
            auth: None,
            profile: Some(profile),
            company,
            loading: false,
            initialized: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some() && self.profile.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    /// A company admin must always carry its company.
    pub fn company_invariant_holds(&self) -> bool {
        match self.role() {
            Some(role) if role.requires_company() => self.company.is_some(),
            _ => true,
        }
    }

    fn clear_fields(&mut self) {
        self.identity = None;
        self.auth = None;
        self.profile = None;
        self.company = None;
    }
}

// ============================================================================
// Worker messages
// ============================================================================

enum Command {
    Initialize { ack: oneshot::Sender<()> },
    Event { event: ProviderEvent, ack: oneshot::Sender<()> },
    Clear { ack: oneshot::Sender<()> },
    RefreshProfile { ack: oneshot::Sender<()> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    Initialize,
    SignIn,
    Refresh,
}

enum Outcome {
    NoSession,
    Loaded {
        auth: Option<AuthSession>,
        loaded: LoadedProfile,
    },
    Failed(String),
}

struct Resolution {
    epoch: u64,
    outcome: Outcome,
}

struct InFlight {
    epoch: u64,
    purpose: Purpose,
    task: JoinHandle<()>,
    acks: Vec<oneshot::Sender<()>>,
}

// ============================================================================
// Public handle
// ============================================================================

/// Handle to the session worker. Shared by reference (`Arc`) with the parts
/// of the portal that read or change the session.
pub struct SessionStore {
    commands: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<SessionState>,
    shutdown_tx: broadcast::Sender<()>,
    initialize_called: AtomicBool,
}

impl SessionStore {
    /// Start the worker. Must be called from within a tokio runtime.
    pub fn spawn(provider: Arc<dyn IdentityProvider>, loader: Arc<ProfileLoader>) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (resolved_tx, resolved_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let events_rx = provider.subscribe();

        let worker = SessionWorker {
            state: SessionState::default(),
            state_tx,
            provider,
            loader,
            epoch: 0,
            in_flight: None,
            resolved_tx,
        };
        tokio::spawn(worker.run(commands_rx, resolved_rx, events_rx, shutdown_rx));

        Self {
            commands: commands_tx,
            state_rx,
            shutdown_tx,
            initialize_called: AtomicBool::new(false),
        }
    }

    /// Resolve the provider's existing session. Allowed once per store.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        if self.initialize_called.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyInitialized);
        }
        self.request(|ack| Command::Initialize { ack }).await
    }

    /// Feed a provider event. Resolves once the event is fully applied
    /// (for `SIGNED_IN`: once its profile resolution finished or was superseded).
    pub async fn on_provider_event(&self, event: ProviderEvent) -> Result<(), SessionError> {
        self.request(|ack| Command::Event { event, ack }).await
    }

    /// Drop identity, profile and company. Idempotent.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.request(|ack| Command::Clear { ack }).await
    }

    /// Reload profile and company for the current identity.
    pub async fn refresh_profile(&self) -> Result<(), SessionError> {
        self.request(|ack| Command::RefreshProfile { ack }).await
    }

    pub fn snapshot(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Stop the worker. Pending resolutions are dropped without touching state.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    async fn request<F>(&self, build: F) -> Result<(), SessionError>
    where
        F: FnOnce(oneshot::Sender<()>) -> Command,
    {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands
            .send(build(ack_tx))
            .map_err(|_| SessionError::Closed)?;
        ack_rx.await.map_err(|_| SessionError::Closed)
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

// ============================================================================
// Worker
// ============================================================================

struct SessionWorker {
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    provider: Arc<dyn IdentityProvider>,
    loader: Arc<ProfileLoader>,
    epoch: u64,
    in_flight: Option<InFlight>,
    resolved_tx: mpsc::UnboundedSender<Resolution>,
}

impl SessionWorker {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut resolved: mpsc::UnboundedReceiver<Resolution>,
        mut events: broadcast::Receiver<ProviderEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut events_open = true;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    debug!("Session worker shutting down");
                    break;
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(resolution) = resolved.recv() => {
                    self.apply_resolution(resolution);
                }
                event = events.recv(), if events_open => match event {
                    Ok(event) => self.handle_event(event, None),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session worker lagged behind provider events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Provider event stream closed");
                        events_open = false;
                    }
                },
            }
        }

        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Initialize { ack } => {
                info!("Initializing session from provider");
                let provider = self.provider.clone();
                let loader = self.loader.clone();
                self.start_resolution(Purpose::Initialize, ack, async move {
                    resolve_existing_session(provider, loader).await
                });
            }
            Command::Event { event, ack } => self.handle_event(event, Some(ack)),
            Command::Clear { ack } => {
                self.supersede();
                self.state.clear_fields();
                self.publish();
                let _ = ack.send(());
            }
            Command::RefreshProfile { ack } => {
                let Some(identity) = self.state.identity.clone() else {
                    let _ = ack.send(());
                    return;
                };
                let provider = self.provider.clone();
                let loader = self.loader.clone();
                self.start_resolution(Purpose::Refresh, ack, async move {
                    resolve_identity(provider, loader, identity).await
                });
            }
        }
    }

    fn handle_event(&mut self, event: ProviderEvent, ack: Option<oneshot::Sender<()>>) {
        debug!(kind = %event.kind, "Provider event");

        match event.kind {
            AuthEventKind::SignedIn => {
                let Some(session) = event.session else {
                    warn!("SIGNED_IN event without session payload");
                    ack_opt(ack);
                    return;
                };

                let identity = session.user.clone();
                let same_identity = self.state.identity.as_ref().map(|i| &i.id) == Some(&identity.id);
                if !same_identity {
                    self.state.profile = None;
                    self.state.company = None;
                }
                self.state.identity = Some(identity.clone());
                self.state.auth = Some(session);

                let provider = self.provider.clone();
                let loader = self.loader.clone();
                let ack = ack.unwrap_or_else(|| oneshot::channel().0);
                self.start_resolution(Purpose::SignIn, ack, async move {
                    resolve_identity(provider, loader, identity).await
                });
            }
            AuthEventKind::SignedOut => {
                self.supersede();
                self.state.clear_fields();
                self.publish();
                ack_opt(ack);
            }
            AuthEventKind::TokenRefreshed => {
                match (event.session, self.state.identity.as_ref()) {
                    (Some(session), Some(current)) if current.id == session.user.id => {
                        self.state.identity = Some(session.user.clone());
                        self.state.auth = Some(session);
                        self.publish();
                    }
                    _ => {
                        debug!("Ignoring token refresh for an identity that is not signed in");
                    }
                }
                ack_opt(ack);
            }
        }
    }

    /// Abort whatever resolution is running and start a new one.
    fn start_resolution<F>(&mut self, purpose: Purpose, ack: oneshot::Sender<()>, work: F)
    where
        F: std::future::Future<Output = Outcome> + Send + 'static,
    {
        self.supersede();
        self.epoch += 1;

        let epoch = self.epoch;
        let resolved_tx = self.resolved_tx.clone();
        let task = tokio::spawn(async move {
            let outcome = work.await;
            let _ = resolved_tx.send(Resolution { epoch, outcome });
        });

        self.in_flight = Some(InFlight {
            epoch,
            purpose,
            task,
            acks: vec![ack],
        });
        self.publish();
    }

    /// Cancel the running resolution, if any. Its result can no longer apply.
    fn supersede(&mut self) {
        self.epoch += 1;

        if let Some(in_flight) = self.in_flight.take() {
            debug!(epoch = in_flight.epoch, purpose = ?in_flight.purpose, "Superseding resolution");
            in_flight.task.abort();
            // Whatever replaces an interrupted initialization is authoritative.
            if in_flight.purpose == Purpose::Initialize {
                self.state.initialized = true;
            }
            for ack in in_flight.acks {
                let _ = ack.send(());
            }
        }
    }

    fn apply_resolution(&mut self, resolution: Resolution) {
        let current = match &self.in_flight {
            Some(in_flight) if in_flight.epoch == resolution.epoch => self.in_flight.take(),
            _ => None,
        };
        let Some(in_flight) = current else {
            debug!(epoch = resolution.epoch, "Discarding stale resolution");
            return;
        };

        match resolution.outcome {
            Outcome::NoSession => {
                self.state.clear_fields();
            }
            Outcome::Loaded { auth, loaded } => {
                if let Some(auth) = auth {
                    self.state.identity = Some(auth.user.clone());
                    self.state.auth = Some(auth);
                }
                info!(
                    identity_id = %loaded.profile.id,
                    role = %loaded.profile.role,
                    "Session resolved"
                );
                self.state.profile = Some(loaded.profile);
                self.state.company = loaded.company;
            }
            Outcome::Failed(reason) => {
                warn!(reason = %reason, "Session invalidated");
                self.state.clear_fields();
            }
        }

        if in_flight.purpose == Purpose::Initialize {
            self.state.initialized = true;
        }
        self.publish();

        for ack in in_flight.acks {
            let _ = ack.send(());
        }
    }

    fn publish(&mut self) {
        let resolving = matches!(
            &self.in_flight,
            Some(in_flight) if in_flight.purpose != Purpose::Refresh
        );
        self.state.loading = !self.state.initialized || resolving;
        debug_assert!(
            self.state.loading || self.state.company_invariant_holds(),
            "company admin published without company"
        );
        self.state_tx.send_replace(self.state.clone());
    }
}

fn ack_opt(ack: Option<oneshot::Sender<()>>) {
    if let Some(ack) = ack {
        let _ = ack.send(());
    }
}

// ============================================================================
// Resolution tasks
// ============================================================================

async fn resolve_existing_session(
    provider: Arc<dyn IdentityProvider>,
    loader: Arc<ProfileLoader>,
) -> Outcome {
    let session = match provider.current_session().await {
        Ok(Some(session)) => session,
        Ok(None) => {
            debug!("No existing provider session");
            return Outcome::NoSession;
        }
        Err(e) => {
            warn!(error = %e, "Failed to read existing provider session");
            force_sign_out(provider.as_ref()).await;
            return Outcome::Failed(e.to_string());
        }
    };

    match loader.load(&session.user.id).await {
        Ok(loaded) => Outcome::Loaded {
            auth: Some(session),
            loaded,
        },
        Err(e) => invalidate(provider.as_ref(), e).await,
    }
}

async fn resolve_identity(
    provider: Arc<dyn IdentityProvider>,
    loader: Arc<ProfileLoader>,
    identity: Identity,
) -> Outcome {
    match loader.load(&identity.id).await {
        Ok(loaded) => Outcome::Loaded { auth: None, loaded },
        Err(e) => invalidate(provider.as_ref(), e).await,
    }
}

/// A session whose profile cannot be resolved is not a valid signed-in state.
async fn invalidate(provider: &dyn IdentityProvider, error: LoadError) -> Outcome {
    warn!(error = %error, "Profile resolution failed, forcing sign-out");
    force_sign_out(provider).await;
    Outcome::Failed(error.to_string())
}

async fn force_sign_out(provider: &dyn IdentityProvider) {
    if let Err(e) = provider.sign_out().await {
        warn!(error = %e, "Forced provider sign-out failed");
    }
}
