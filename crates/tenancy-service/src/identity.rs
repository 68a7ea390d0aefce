//! In-process identity directory.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use tenancy_org::{IdentityResolver, OrgError, OrgResult, PersonId, ProfileDetails};

/// People known to the identity context, keyed by id and by e-mail.
///
/// E-mail matching ignores case and surrounding whitespace.
#[derive(Debug, Default)]
pub struct InMemoryIdentityDirectory {
    state: RwLock<DirectoryState>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    profiles: HashMap<PersonId, ProfileDetails>,
    by_email: HashMap<String, PersonId>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl InMemoryIdentityDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a person and return the id assigned to them.
    ///
    /// # Errors
    ///
    /// - [`OrgError::Validation`] if the e-mail is blank
    /// - [`OrgError::Conflict`] if the e-mail is already registered
    pub async fn register(
        &self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> OrgResult<PersonId> {
        let email = email.into();
        let key = normalize_email(&email);
        if key.is_empty() {
            return Err(OrgError::Validation("email cannot be blank".to_string()));
        }

        let mut state = self.state.write().await;
        if state.by_email.contains_key(&key) {
            return Err(OrgError::Conflict(format!(
                "a person with email {key} is already registered"
            )));
        }

        let person_id = PersonId::new();
        state.by_email.insert(key, person_id);
        state.profiles.insert(
            person_id,
            ProfileDetails::new(first_name, last_name, email.trim()),
        );

        tracing::debug!(person_id = %person_id, "Person registered");
        Ok(person_id)
    }

    /// Number of registered people.
    pub async fn len(&self) -> usize {
        self.state.read().await.profiles.len()
    }

    /// Whether nobody is registered.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.profiles.is_empty()
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityDirectory {
    async fn resolve_person_id_by_email(&self, email: &str) -> OrgResult<PersonId> {
        let key = normalize_email(email);
        self.state
            .read()
            .await
            .by_email
            .get(&key)
            .copied()
            .ok_or_else(|| OrgError::not_found("Person", key))
    }

    async fn resolve_profile(&self, person_id: PersonId) -> OrgResult<ProfileDetails> {
        self.state
            .read()
            .await
            .profiles
            .get(&person_id)
            .cloned()
            .ok_or_else(|| OrgError::not_found("Person", person_id))
    }
}
