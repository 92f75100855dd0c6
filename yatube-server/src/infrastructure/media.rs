use std::path::{Path, PathBuf};

use tracing::{error, info};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Sub-directory of the media root that post images are written to.
pub const POST_IMAGES_DIR: &str = "posts";
pub const MEDIA_URL: &str = "/media";

/// Writes uploaded files below the media root and hands back the path
/// relative to it, which is what gets stored on the post.
#[derive(Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save_post_image(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, DomainError> {
        let dir = self.root.join(POST_IMAGES_DIR);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            error!("failed to create media dir {}: {}", dir.display(), e);
            DomainError::Internal(e.to_string())
        })?;

        let name = format!("{}_{}", &Uuid::new_v4().simple().to_string()[..8], sanitize(filename));
        tokio::fs::write(dir.join(&name), bytes).await.map_err(|e| {
            error!("failed to store image {}: {}", name, e);
            DomainError::Internal(e.to_string())
        })?;

        let relative = format!("{POST_IMAGES_DIR}/{name}");
        info!(path = %relative, size = bytes.len(), "image stored");
        Ok(relative)
    }
}

fn sanitize(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("C:\\pics\\my cat.gif"), "my_cat.gif");
        assert_eq!(sanitize(".."), "image");
    }

    #[actix_web::test]
    async fn saves_under_posts_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        let storage = MediaStorage::new(root);
        let path = storage.save_post_image("small.gif", b"GIF89a").await.unwrap();
        assert!(path.starts_with("posts/"));
        assert!(path.ends_with("_small.gif"));
        let stored = tokio::fs::read(root.join(&path)).await.unwrap();
        assert_eq!(stored, b"GIF89a");
    }
}
