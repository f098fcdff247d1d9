// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role store boundary.
//!
//! The role store is an external document database keyed by identity id. It is assumed to be
//! slow, sometimes unavailable and eventually consistent with writes; the resolver wraps every
//! lookup with a timeout and treats every failure as non-fatal. Adapters for concrete providers
//! implement [`RoleStore`] and translate provider-specific errors into their associated error
//! type.

mod memory;

use std::error::Error;
use std::time::SystemTime;

use crate::identity::{Identity, IdentityId};
use crate::role::Role;

pub use memory::MemoryRoleStore;

/// Document holding the role attribute for one identity.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserDocument {
    pub uid: IdentityId,
    pub email: String,
    pub role: Role,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl UserDocument {
    /// Build a fresh document for the given identity with both timestamps set to now.
    pub fn new(identity: &Identity, role: Role) -> Self {
        let now = SystemTime::now();

        Self {
            uid: identity.id.clone(),
            email: identity.email.clone(),
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persistence interface for identity roles.
pub trait RoleStore {
    type Error: Error + Send + Sync + 'static;

    /// One-shot lookup of the stored role for an identity.
    ///
    /// `Ok(None)` means no document exists yet (new user) and is a valid outcome, not an error.
    /// Implementations may fail or hang; callers are expected to bound the call with a timeout.
    fn role(
        &self,
        id: &IdentityId,
    ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send;

    /// Create the role document for a new user.
    ///
    /// Invoked as a best-effort, detached side effect when a lookup finds no document.
    fn create_user_document(
        &self,
        document: UserDocument,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Change the stored role for an existing identity.
    fn update_role(
        &self,
        id: &IdentityId,
        role: Role,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
