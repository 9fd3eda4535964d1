use async_trait::async_trait;
use medrec_auth::{User, UserStorage};
use medrec_storage::{StorageError, StorageResult};
use uuid::Uuid;

use crate::storage::InMemoryStorage;

#[async_trait]
impl UserStorage for InMemoryStorage {
    async fn create_user(&self, user: &User) -> StorageResult<()> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StorageError::conflict("User already exists"));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_reset_token(&self, token_hash: &str) -> StorageResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.reset_token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn update_user(&self, user: &User) -> StorageResult<()> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StorageError::conflict("User already exists"));
        }
        match state.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(StorageError::not_found("User", user.id)),
        }
    }
}
