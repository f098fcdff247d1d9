// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::identity::IdentityId;
use crate::role::Role;
use crate::store::{RoleStore, UserDocument};

/// In-process role store backed by a hash map.
///
/// Useful for local development and as a stand-in when no remote document database is
/// configured. Cloning is cheap and clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct MemoryRoleStore {
    documents: Arc<Mutex<HashMap<IdentityId, UserDocument>>>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Retrieve the full document for an identity.
    pub fn document(&self, id: &IdentityId) -> Option<UserDocument> {
        self.documents
            .lock()
            .expect("role store lock poisoned")
            .get(id)
            .cloned()
    }
}

impl RoleStore for MemoryRoleStore {
    type Error = Infallible;

    fn role(
        &self,
        id: &IdentityId,
    ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send {
        let role = self
            .documents
            .lock()
            .expect("role store lock poisoned")
            .get(id)
            .map(|document| document.role);

        async move { Ok(role) }
    }

    fn create_user_document(
        &self,
        document: UserDocument,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.documents
            .lock()
            .expect("role store lock poisoned")
            .insert(document.uid.clone(), document);

        async move { Ok(()) }
    }

    fn update_role(
        &self,
        id: &IdentityId,
        role: Role,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let mut documents = self.documents.lock().expect("role store lock poisoned");
        if let Some(document) = documents.get_mut(id) {
            document.role = role;
            document.updated_at = SystemTime::now();
        }
        drop(documents);

        async move { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    #[tokio::test]
    async fn missing_document_resolves_to_no_role() {
        let store = MemoryRoleStore::new();
        let role = store.role(&"unknown".into()).await.unwrap();
        assert_eq!(role, None);
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = MemoryRoleStore::new();
        let identity = Identity::new("u1", "u1@example.org");

        store
            .create_user_document(UserDocument::new(&identity, Role::Editor))
            .await
            .unwrap();

        let role = store.role(&identity.id).await.unwrap();
        assert_eq!(role, Some(Role::Editor));
    }

    #[tokio::test]
    async fn update_changes_role_and_timestamp() {
        let store = MemoryRoleStore::new();
        let identity = Identity::new("u1", "u1@example.org");

        store
            .create_user_document(UserDocument::new(&identity, Role::Viewer))
            .await
            .unwrap();
        let created = store.document(&identity.id).unwrap();

        store.update_role(&identity.id, Role::Editor).await.unwrap();

        let updated = store.document(&identity.id).unwrap();
        assert_eq!(updated.role, Role::Editor);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_of_missing_identity_is_a_no_op() {
        let store = MemoryRoleStore::new();
        store.update_role(&"ghost".into(), Role::Editor).await.unwrap();
        assert!(store.document(&"ghost".into()).is_none());
    }
}
