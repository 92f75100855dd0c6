use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::data::follow_repository::FollowRepository;
use crate::domain::error::DomainError;
use crate::domain::follow::Follow;
use crate::domain::user::User;

#[derive(Clone)]
pub struct FollowService {
    repo: Arc<dyn FollowRepository>,
}

impl FollowService {
    pub fn new(repo: Arc<dyn FollowRepository>) -> Self {
        Self { repo }
    }

    pub async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, DomainError> {
        if user_id == author_id {
            return Ok(false);
        }
        self.repo.exists(user_id, author_id).await
    }

    /// Subscribes `user` to `author`. Following yourself or following twice
    /// is a no-op; the return value tells whether an edge was added.
    #[instrument(skip(self, user, author), fields(user = %user.username, author = %author.username))]
    pub async fn follow(&self, user: &User, author: &User) -> Result<bool, DomainError> {
        if user.id == author.id {
            debug!("ignoring self-follow");
            return Ok(false);
        }
        if self.repo.exists(user.id, author.id).await? {
            return Ok(false);
        }
        self.repo.create(Follow::new(user.id, author.id)).await
    }

    #[instrument(skip(self, user, author), fields(user = %user.username, author = %author.username))]
    pub async fn unfollow(&self, user: &User, author: &User) -> Result<(), DomainError> {
        if self.repo.delete(user.id, author.id).await? {
            Ok(())
        } else {
            Err(DomainError::FollowNotFound(author.username.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;

    #[actix_web::test]
    async fn following_twice_keeps_one_edge() {
        let store = MemoryStore::new();
        let reader = store.add_user("reader");
        let author = store.add_user("author");
        let follows = FollowService::new(Arc::new(store.clone()));

        assert!(follows.follow(&reader, &author).await.unwrap());
        assert!(!follows.follow(&reader, &author).await.unwrap());
        assert_eq!(store.follows().len(), 1);
        assert!(follows.is_following(reader.id, author.id).await.unwrap());
        assert!(!follows.is_following(author.id, reader.id).await.unwrap());
    }

    #[actix_web::test]
    async fn self_follow_is_ignored() {
        let store = MemoryStore::new();
        let user = store.add_user("narcissus");
        let follows = FollowService::new(Arc::new(store.clone()));

        assert!(!follows.follow(&user, &user).await.unwrap());
        assert!(store.follows().is_empty());
    }

    #[actix_web::test]
    async fn unfollow_without_edge_is_not_found() {
        let store = MemoryStore::new();
        let reader = store.add_user("reader");
        let author = store.add_user("author");
        let follows = FollowService::new(Arc::new(store.clone()));

        assert!(matches!(
            follows.unfollow(&reader, &author).await,
            Err(DomainError::FollowNotFound(_))
        ));
        follows.follow(&reader, &author).await.unwrap();
        follows.unfollow(&reader, &author).await.unwrap();
        assert!(store.follows().is_empty());
    }
}
