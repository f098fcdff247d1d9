// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session resolver actor.
//!
//! The resolver consumes identity events (sign-in, sign-out) and maps each signed-in identity to
//! a role by querying the role store. All resolution state is owned by the actor; consumers only
//! ever see read-only [`SessionState`] snapshots over a watch channel.
//!
//! Three guarantees hold on every event sequence:
//!
//! - `loading` always terminates: every resolution path (stored role, missing role, lookup
//!   error, timeout) clears it within the configured timeout bound.
//! - At most one lookup runs per identity. Re-delivery of the identity currently signed in does
//!   not trigger a second lookup.
//! - A lookup which completes after its identity has been superseded (a different sign-in or a
//!   sign-out arrived in the meantime) is discarded and never overwrites newer state.


use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Duration, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::identity::{Identity, IdentityId};
use crate::role::Role;
use crate::store::{RoleStore, UserDocument};

const IDENTITY_EVENT_CHANNEL_SIZE: usize = 64;

/// Read-only snapshot of the current session.
///
/// `loading` is `true` from the moment an identity signs in until its role resolution completes,
/// and also before the very first identity event arrives (cold start, where the provider has not
/// yet reported whether a session exists).
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub role: Option<Role>,
    pub loading: bool,
}

impl SessionState {
    fn cold_start() -> Self {
        Self {
            identity: None,
            role: None,
            loading: true,
        }
    }

    fn signed_out() -> Self {
        Self {
            identity: None,
            role: None,
            loading: false,
        }
    }
}

/// Failures observed while resolving a role.
///
/// None of these are ever surfaced to consumers; each one is absorbed into the default-role
/// fallback and logged. The variants exist so adapters and operators can tell a degraded store
/// from a slow one.
#[derive(Debug, Error)]
pub enum ResolveFailure {
    /// Role lookup exceeded the configured bound.
    #[error("role lookup timed out after {0:?}")]
    LookupTimeout(Duration),

    /// The store failed the lookup (permission, network, unavailable).
    #[error("role lookup failed: {0}")]
    LookupFailed(String),

    /// Best-effort creation of the default role document failed.
    #[error("default role document write failed: {0}")]
    DefaultRoleWrite(String),
}

/// Error returned by the session handle.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session resolver task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

/// Completed role resolution, reported back into the actor loop by the lookup task.
#[derive(Debug)]
struct Resolved {
    identity: Identity,
    role: Role,
    /// Generation the lookup was started under; results from earlier generations are stale.
    generation: u64,
}

/// Actor resolving a role for every identity announced on the identity stream.
///
/// Constructed with [`SessionResolver::new`] which returns the actor along with the sender half
/// of the identity event channel. Sign-in flows send `Some(identity)` on it, sign-out sends
/// `None`; events are processed strictly in delivery order.
#[derive(Debug)]
pub struct SessionResolver<S> {
    config: ResolverConfig,
    store: Arc<S>,
    identity_rx: mpsc::Receiver<Option<Identity>>,
    resolved_tx: mpsc::Sender<Resolved>,
    resolved_rx: mpsc::Receiver<Resolved>,
    state_tx: watch::Sender<SessionState>,
    /// Identity for which a role has most recently been resolved or is being resolved.
    current: Option<IdentityId>,
    /// Identity with an outstanding lookup, if any.
    in_flight: Option<IdentityId>,
    /// Bumped on every started lookup and on sign-out, so a result from before a sign-out is
    /// stale even when the same identity signs in again.
    generation: u64,
}

impl<S> SessionResolver<S>
where
    S: RoleStore + Send + Sync + 'static,
{
    /// Create a new instance of the `SessionResolver` and return it along with the producer half
    /// of the identity event channel.
    pub fn new(store: S, config: ResolverConfig) -> (Self, mpsc::Sender<Option<Identity>>) {
        let (identity_tx, identity_rx) = mpsc::channel(IDENTITY_EVENT_CHANNEL_SIZE);
        let (resolved_tx, resolved_rx) = mpsc::channel(IDENTITY_EVENT_CHANNEL_SIZE);
        let (state_tx, _) = watch::channel(SessionState::cold_start());

        let resolver = Self {
            config,
            store: Arc::new(store),
            identity_rx,
            resolved_tx,
            resolved_rx,
            state_tx,
            current: None,
            in_flight: None,
            generation: 0,
        };

        (resolver, identity_tx)
    }

    /// Subscribe to session state updates.
    ///
    /// The receiver immediately holds the current state; before the first identity event this is
    /// the cold-start state with `loading` set.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Spawn the resolver onto the runtime and return a handle to it.
    ///
    /// Consumes the resolver, so a second event loop over the same subscription can never be
    /// started.
    pub fn start(self) -> Session {
        let state_rx = self.state_tx.subscribe();
        let cancel_token = CancellationToken::new();
        let task = tokio::spawn(self.run(cancel_token.clone()));

        Session {
            state_rx,
            cancel_token,
            task,
        }
    }

    /// The session resolution event loop.
    ///
    /// Listens and responds to three kinds of events:
    ///
    /// - A shutdown signal from the session handle
    /// - An identity event (sign-in or sign-out) from the identity stream
    /// - A completed role lookup reported back by a resolution task
    async fn run(mut self, token: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    debug!("session resolver received shutdown signal");
                    break;
                }
                event = self.identity_rx.recv() => {
                    match event {
                        Some(identity) => self.on_identity_event(identity),
                        // All producers dropped their sender; no further session changes can
                        // ever arrive.
                        None => {
                            debug!("identity stream closed, stopping session resolver");
                            break;
                        }
                    }
                }
                Some(resolved) = self.resolved_rx.recv() => {
                    self.on_resolved(resolved);
                }
            }
        }
    }

    /// Handle a sign-in or sign-out announcement from the identity stream.
    fn on_identity_event(&mut self, identity: Option<Identity>) {
        let Some(identity) = identity else {
            debug!("identity signed out, clearing session state");
            self.current = None;
            self.in_flight = None;
            self.generation += 1;
            self.state_tx.send_replace(SessionState::signed_out());
            return;
        };

        // Duplicate stream event for the session already being tracked; re-announce the cached
        // state without triggering another lookup.
        if self.current.as_ref() == Some(&identity.id) {
            let state = self.state_tx.borrow().clone();
            self.state_tx.send_replace(state);
            return;
        }

        debug!(identity = %identity.id, "new identity signed in, resolving role");
        self.current = Some(identity.id.clone());
        self.state_tx.send_replace(SessionState {
            identity: Some(identity.clone()),
            role: None,
            loading: true,
        });
        self.resolve_role(identity);
    }

    /// Start a role lookup for the given identity unless one is already outstanding for it.
    ///
    /// The lookup runs as a detached task racing the store against the configured timeout, so the
    /// event loop stays responsive to further identity events while it is pending. Every outcome
    /// is converted into a [`Resolved`] message; failures degrade to the default role.
    fn resolve_role(&mut self, identity: Identity) {
        if self.in_flight.as_ref() == Some(&identity.id) {
            debug!(identity = %identity.id, "role lookup already in flight");
            return;
        }
        self.in_flight = Some(identity.id.clone());
        self.generation += 1;

        let store = self.store.clone();
        let resolved_tx = self.resolved_tx.clone();
        let resolve_timeout = self.config.resolve_timeout;
        let generation = self.generation;

        tokio::spawn(async move {
            let result = timeout(resolve_timeout, store.role(&identity.id)).await;
            let role = match result {
                Ok(Ok(Some(role))) => role,
                Ok(Ok(None)) => {
                    debug!(identity = %identity.id, "no stored role, assigning default");
                    create_default_document(store, &identity);
                    Role::default()
                }
                Ok(Err(err)) => {
                    let failure = ResolveFailure::LookupFailed(err.to_string());
                    warn!(identity = %identity.id, %failure, "falling back to default role");
                    Role::default()
                }
                Err(_) => {
                    let failure = ResolveFailure::LookupTimeout(resolve_timeout);
                    warn!(identity = %identity.id, %failure, "falling back to default role");
                    Role::default()
                }
            };

            // Fails only when the actor has already shut down.
            let _ = resolved_tx
                .send(Resolved {
                    identity,
                    role,
                    generation,
                })
                .await;
        });
    }

    /// Apply a completed resolution, unless it has been superseded in the meantime.
    ///
    /// The generation check also covers results for the *same* identity from before a sign-out:
    /// after a sign-out/sign-in cycle only the lookup started by the newer sign-in may apply.
    fn on_resolved(&mut self, resolved: Resolved) {
        let superseded = resolved.generation != self.generation
            || self.current.as_ref() != Some(&resolved.identity.id);
        if superseded {
            debug!(
                identity = %resolved.identity.id,
                "discarding stale role resolution for superseded identity"
            );
            return;
        }

        self.in_flight = None;
        debug!(identity = %resolved.identity.id, role = %resolved.role, "role resolved");
        self.state_tx.send_replace(SessionState {
            identity: Some(resolved.identity),
            role: Some(resolved.role),
            loading: false,
        });
    }
}

/// Write the default role document for a new user as a detached, best-effort task.
///
/// The critical path never waits on this write; its failure is logged and the user keeps the
/// default role for the session either way.
fn create_default_document<S>(store: Arc<S>, identity: &Identity)
where
    S: RoleStore + Send + Sync + 'static,
{
    let document = UserDocument::new(identity, Role::default());
    let uid = identity.id.clone();

    tokio::spawn(async move {
        if let Err(err) = store.create_user_document(document).await {
            let failure = ResolveFailure::DefaultRoleWrite(err.to_string());
            warn!(identity = %uid, %failure, "keeping default role for this session");
        }
    });
}

/// Handle onto a running session resolver.
#[derive(Debug)]
pub struct Session {
    state_rx: watch::Receiver<SessionState>,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl Session {
    /// Snapshot of the current session state.
    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to session state updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Shut down the resolver.
    ///
    /// Any still-pending role lookup is left to complete in the background but its result is
    /// discarded; no state update is emitted after this returns.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        self.cancel_token.cancel();
        self.task.await?;
        Ok(())
    }
}
