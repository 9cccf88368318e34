use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::ports::IdentityRepository;
use crate::identity::errors::RepositoryError;

/// Process-local identity store keyed by id, with a unique email index.
#[derive(Default)]
pub struct InMemoryIdentityRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    identities: HashMap<IdentityId, Identity>,
    by_email: HashMap<EmailAddress, IdentityId>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored identity with the same id, keeping the email index intact.
    ///
    /// Used to toggle `active` or change scopes outside of registration.
    pub async fn save(&self, identity: Identity) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;

        let Some(existing) = state.identities.get(&identity.id) else {
            return Err(RepositoryError::NotFound(identity.id.to_string()));
        };

        if existing.email != identity.email {
            if state.by_email.contains_key(&identity.email) {
                return Err(RepositoryError::EmailAlreadyExists(
                    identity.email.to_string(),
                ));
            }
            let previous = existing.email.clone();
            state.by_email.remove(&previous);
            state.by_email.insert(identity.email.clone(), identity.id);
        }

        state.identities.insert(identity.id, identity);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.identities.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn create(&self, identity: Identity) -> Result<Identity, RepositoryError> {
        let mut state = self.state.write().await;

        if state.by_email.contains_key(&identity.email) {
            return Err(RepositoryError::EmailAlreadyExists(
                identity.email.to_string(),
            ));
        }

        state.by_email.insert(identity.email.clone(), identity.id);
        state.identities.insert(identity.id, identity.clone());

        Ok(identity)
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, RepositoryError> {
        Ok(self.state.read().await.identities.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Identity>, RepositoryError> {
        let state = self.state.read().await;

        Ok(state
            .by_email
            .get(email)
            .and_then(|id| state.identities.get(id))
            .cloned())
    }

    async fn update_last_login(
        &self,
        id: &IdentityId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;

        match state.identities.get_mut(id) {
            Some(identity) => {
                identity.last_login_at = Some(at);
                Ok(())
            }
            None => Err(RepositoryError::NotFound(id.to_string())),
        }
    }
}
