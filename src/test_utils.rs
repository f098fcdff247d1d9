// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::time::Duration;

use crate::identity::IdentityId;
use crate::role::Role;
use crate::store::{RoleStore, UserDocument};

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

/// Scripted behaviour of the test store for one identity.
#[derive(Clone, Debug)]
pub enum Lookup {
    /// Respond with the given role after the given delay.
    Found(Role, Duration),

    /// Respond that no document exists (new user).
    Missing,

    /// Fail the lookup.
    Fail,

    /// Never respond.
    Hang,
}

#[derive(Debug, Error)]
#[error("test store failure")]
pub struct TestStoreError;

#[derive(Debug, Default)]
struct TestStoreInner {
    lookups: HashMap<IdentityId, VecDeque<Lookup>>,
    lookup_log: Vec<IdentityId>,
    created: Vec<UserDocument>,
    updated: Vec<(IdentityId, Role)>,
    fail_writes: bool,
}

/// Role store double with scriptable per-identity lookup behaviour.
///
/// Records every lookup, document creation and role update so tests can assert on how often and
/// with what arguments the store was hit. Identities without a script behave like new users
/// (no stored document).
#[derive(Clone, Debug, Default)]
pub struct TestRoleStore {
    inner: Arc<Mutex<TestStoreInner>>,
}

impl TestRoleStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Script the lookup behaviour for one identity.
    ///
    /// Scripting the same identity again appends to its queue: each lookup consumes the next
    /// entry, and the last entry is repeated once the queue runs dry.
    pub fn script(self, id: impl Into<IdentityId>, lookup: Lookup) -> Self {
        self.inner
            .lock()
            .expect("test store lock poisoned")
            .lookups
            .entry(id.into())
            .or_default()
            .push_back(lookup);
        self
    }

    /// Make all document writes fail.
    pub fn failing_writes(self) -> Self {
        self.inner
            .lock()
            .expect("test store lock poisoned")
            .fail_writes = true;
        self
    }

    /// Identities looked up so far, in call order.
    pub fn lookup_log(&self) -> Vec<IdentityId> {
        self.inner
            .lock()
            .expect("test store lock poisoned")
            .lookup_log
            .clone()
    }

    /// Documents created so far.
    pub fn created(&self) -> Vec<UserDocument> {
        self.inner
            .lock()
            .expect("test store lock poisoned")
            .created
            .clone()
    }

    /// Role updates applied so far.
    pub fn updated(&self) -> Vec<(IdentityId, Role)> {
        self.inner
            .lock()
            .expect("test store lock poisoned")
            .updated
            .clone()
    }
}

impl RoleStore for TestRoleStore {
    type Error = TestStoreError;

    fn role(
        &self,
        id: &IdentityId,
    ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send {
        let lookup = {
            let mut inner = self.inner.lock().expect("test store lock poisoned");
            inner.lookup_log.push(id.clone());
            match inner.lookups.get_mut(id) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        async move {
            match lookup {
                Some(Lookup::Found(role, delay)) => {
                    tokio::time::sleep(delay).await;
                    Ok(Some(role))
                }
                Some(Lookup::Missing) | None => Ok(None),
                Some(Lookup::Fail) => Err(TestStoreError),
                Some(Lookup::Hang) => std::future::pending().await,
            }
        }
    }

    fn create_user_document(
        &self,
        document: UserDocument,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let result = {
            let mut inner = self.inner.lock().expect("test store lock poisoned");
            if inner.fail_writes {
                Err(TestStoreError)
            } else {
                inner.created.push(document);
                Ok(())
            }
        };

        async move { result }
    }

    fn update_role(
        &self,
        id: &IdentityId,
        role: Role,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let result = {
            let mut inner = self.inner.lock().expect("test store lock poisoned");
            if inner.fail_writes {
                Err(TestStoreError)
            } else {
                inner.updated.push((id.clone(), role));
                Ok(())
            }
        };

        async move { result }
    }
}
