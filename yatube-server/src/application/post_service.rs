use std::sync::Arc;

use crate::data::comment_repository::CommentRepository;
use crate::data::group_repository::GroupRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::Comment;
use crate::domain::group::Group;
use crate::domain::page::{POSTS_PER_PAGE, Page, Paginator};
use crate::domain::post::{Post, PostChanges, PostFilter};
use crate::domain::{error::DomainError, user::User};
use tracing::instrument;
use uuid::Uuid;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        groups: Arc<dyn GroupRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            posts,
            groups,
            comments,
        }
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    /// One page of posts matching `filter`, newest first.
    pub async fn get_posts(
        &self,
        filter: PostFilter,
        page: Option<&str>,
    ) -> Result<Page<Post>, DomainError> {
        let total = self.posts.count_posts(filter).await?;
        let window = Paginator::new(total, POSTS_PER_PAGE).resolve(page);
        let items = self
            .posts
            .get_posts(filter, window.limit, window.offset)
            .await?;
        Ok(window.with_items(items))
    }

    pub async fn count_posts(&self, filter: PostFilter) -> Result<usize, DomainError> {
        self.posts.count_posts(filter).await
    }

    pub async fn get_group(&self, slug: &str) -> Result<Group, DomainError> {
        self.groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::GroupNotFound(slug.to_string()))
    }

    pub async fn find_group(&self, id: Uuid) -> Result<Option<Group>, DomainError> {
        self.groups.find_by_id(id).await
    }

    pub async fn groups(&self) -> Result<Vec<Group>, DomainError> {
        self.groups.list_all().await
    }

    #[instrument(skip(self, author), fields(author = %author.username))]
    pub async fn create_post(
        &self,
        author: &User,
        text: String,
        group: Option<Group>,
        image: Option<String>,
    ) -> Result<Post, DomainError> {
        let post = Post::new(author.id, author.username.clone(), text, group.as_ref(), image);
        self.posts.create(post).await
    }

    #[instrument(skip(self, changes))]
    pub async fn update_post(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        changes: PostChanges,
    ) -> Result<Post, DomainError> {
        match self.posts.update_post(post_id, author_id, changes).await {
            Ok(Some(post)) => Ok(post),
            Ok(None) => Err(DomainError::PostNotFound(post_id)),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, author_id: Uuid, post_id: Uuid) -> Result<(), DomainError> {
        self.posts.delete_post(post_id, author_id).await
    }

    pub async fn comments(&self, post_id: Uuid) -> Result<Vec<Comment>, DomainError> {
        self.comments.list_for_post(post_id).await
    }

    #[instrument(skip(self, author, text), fields(author = %author.username))]
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author: &User,
        text: String,
    ) -> Result<Comment, DomainError> {
        let post = self.get_post(post_id).await?;
        let comment = Comment::new(post.id, author.id, author.username.clone(), text);
        self.comments.create(comment).await
    }
}
