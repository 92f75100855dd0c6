use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::group::Group;

/// Number of characters a post shows when rendered as a short label.
const SHORT_LABEL_CHARS: usize = 15;

/// A post joined with the author's username and its group's slug and title,
/// which is what every listing needs to render.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub author_username: String,
    pub group_id: Option<Uuid>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

impl Post {
    pub fn new(
        author_id: Uuid,
        author_username: String,
        text: String,
        group: Option<&Group>,
        image: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            created_at: Utc::now(),
            image,
            author_id,
            author_username,
            group_id: group.map(|g| g.id),
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: String = self.text.chars().take(SHORT_LABEL_CHARS).collect();
        f.write_str(&label)
    }
}

/// Edit-form result applied to an existing post. `image: None` keeps the
/// stored image.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group: Option<Group>,
    pub image: Option<String>,
}

/// Which slice of posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts by every author the given user follows.
    FollowedBy(Uuid),
}

impl PostFilter {
    /// Splits the filter into the optional `(group, author, follower)` binds
    /// used by the SQL listing query.
    pub fn binds(&self) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>) {
        match *self {
            PostFilter::All => (None, None, None),
            PostFilter::Group(id) => (Some(id), None, None),
            PostFilter::Author(id) => (None, Some(id), None),
            PostFilter::FollowedBy(id) => (None, None, Some(id)),
        }
    }
}
