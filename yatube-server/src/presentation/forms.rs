//! Form parsing and validation. Each form turns raw input into either the
//! cleaned values a service call needs or a set of per-field messages for
//! re-rendering.

use std::collections::BTreeMap;

use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::domain::error::DomainError;
use crate::presentation::dto::{CommentRequest, PostFormValues, SignupRequest};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_TEXT_BYTES: usize = 1024 * 1024;

const REQUIRED: &str = "This field is required.";
const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
const INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
const IMAGE_TOO_LARGE: &str = "The image may not be larger than 5 MB.";
const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

fn messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let texts = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), texts)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Raw multipart submission of the post create/edit form.
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: String,
    pub group: String,
    pub image: Option<UploadedFile>,
    image_too_large: bool,
    text_too_long: bool,
    group_too_long: bool,
}

/// Post form after the synchronous checks; the group still has to be looked up.
#[derive(Debug)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<UploadedFile>,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PostFormErrors {
    pub text: Vec<String>,
    pub group: Vec<String>,
    pub image: Vec<String>,
}

impl PostFormErrors {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.group.is_empty() && self.image.is_empty()
    }

    pub fn invalid_group() -> Self {
        Self {
            group: vec![INVALID_CHOICE.to_string()],
            ..Self::default()
        }
    }
}

impl PostForm {
    pub async fn from_multipart(mut payload: Multipart) -> Result<Self, DomainError> {
        let mut form = Self::default();

        while let Some(mut field) = payload.try_next().await.map_err(|e| {
            warn!("malformed multipart body: {}", e);
            DomainError::BadRequest(e.to_string())
        })? {
            let name = field.name().map(str::to_owned).unwrap_or_default();
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_owned);

            let limit = if name == "image" {
                MAX_IMAGE_BYTES
            } else {
                MAX_TEXT_BYTES
            };
            let mut bytes = Vec::new();
            let mut oversized = false;
            // The rest of an oversized field is drained, never appended.
            while let Some(chunk) = field
                .try_next()
                .await
                .map_err(|e| DomainError::BadRequest(e.to_string()))?
            {
                if oversized {
                    continue;
                }
                if bytes.len() + chunk.len() > limit {
                    oversized = true;
                    bytes = Vec::new();
                    continue;
                }
                bytes.extend_from_slice(&chunk);
            }

            match name.as_str() {
                "text" if oversized => form.text_too_long = true,
                "text" => form.text = String::from_utf8_lossy(&bytes).into_owned(),
                "group" if oversized => form.group_too_long = true,
                "group" => form.group = String::from_utf8_lossy(&bytes).trim().to_string(),
                "image" if oversized => form.image_too_large = true,
                "image" => {
                    if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                        if !bytes.is_empty() {
                            form.image = Some(UploadedFile { filename, bytes });
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn values(&self) -> PostFormValues {
        PostFormValues {
            text: self.text.clone(),
            group: self.group.clone(),
        }
    }

    pub fn validate(self) -> Result<CleanedPost, PostFormErrors> {
        let mut errors = PostFormErrors::default();

        let text = self.text.trim().to_string();
        if self.text_too_long {
            errors
                .text
                .push(format!("Ensure this value has at most {MAX_TEXT_BYTES} bytes."));
        } else if text.is_empty() {
            errors.text.push(REQUIRED.to_string());
        }

        let group_id = if self.group_too_long {
            errors.group.push(INVALID_CHOICE.to_string());
            None
        } else if self.group.is_empty() {
            None
        } else {
            match Uuid::parse_str(&self.group) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.group.push(INVALID_CHOICE.to_string());
                    None
                }
            }
        };

        if self.image_too_large {
            errors.image.push(IMAGE_TOO_LARGE.to_string());
        } else if let Some(image) = &self.image {
            if !is_image(&image.bytes) {
                errors.image.push(INVALID_IMAGE.to_string());
            }
        }

        if errors.is_empty() {
            Ok(CleanedPost {
                text,
                group_id,
                image: self.image,
            })
        } else {
            Err(errors)
        }
    }
}

/// Recognises the image formats browsers display by their leading bytes.
pub fn is_image(bytes: &[u8]) -> bool {
    bytes.starts_with(b"GIF87a")
        || bytes.starts_with(b"GIF89a")
        || bytes.starts_with(b"\x89PNG\r\n\x1a\n")
        || bytes.starts_with(&[0xFF, 0xD8, 0xFF])
        || (bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP")
}

impl CommentRequest {
    /// Trimmed comment text, or `None` when there is nothing to save.
    pub fn cleaned(&self) -> Option<String> {
        let form = CommentRequest {
            text: self.text.trim().to_string(),
        };
        form.validate().ok().map(|_| form.text)
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SignupErrors {
    pub username: Vec<String>,
    pub email: Vec<String>,
    pub password: Vec<String>,
}

impl SignupErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.email.is_empty() && self.password.is_empty()
    }
}

impl SignupRequest {
    pub fn cleaned(&self) -> Result<SignupRequest, SignupErrors> {
        let form = SignupRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };

        let mut errors = match form.validate() {
            Ok(()) => SignupErrors::default(),
            Err(e) => {
                let mut by_field = messages(&e);
                SignupErrors {
                    username: by_field.remove("username").unwrap_or_default(),
                    email: by_field.remove("email").unwrap_or_default(),
                    password: by_field.remove("password").unwrap_or_default(),
                }
            }
        };

        if !form.username.is_empty()
            && !form
                .username
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.username.push(INVALID_USERNAME.to_string());
        }

        if errors.is_empty() {
            Ok(form)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

    fn post_form(text: &str, group: &str, image: Option<&[u8]>) -> PostForm {
        PostForm {
            text: text.into(),
            group: group.into(),
            image: image.map(|bytes| UploadedFile {
                filename: "small.gif".into(),
                bytes: bytes.to_vec(),
            }),
            image_too_large: false,
            text_too_long: false,
            group_too_long: false,
        }
    }

    #[test]
    fn blank_text_is_required() {
        let errors = post_form("   \n", "", None).validate().unwrap_err();
        assert_eq!(errors.text, vec![REQUIRED.to_string()]);
        assert!(errors.group.is_empty());
    }

    #[test]
    fn valid_post_is_trimmed() {
        let group = Uuid::new_v4();
        let cleaned = post_form("  hello  ", &group.to_string(), Some(SMALL_GIF))
            .validate()
            .unwrap();
        assert_eq!(cleaned.text, "hello");
        assert_eq!(cleaned.group_id, Some(group));
        assert!(cleaned.image.is_some());
    }

    #[test]
    fn garbage_group_and_non_image_are_rejected() {
        let errors = post_form("hello", "not-a-uuid", Some(b"plain text"))
            .validate()
            .unwrap_err();
        assert_eq!(errors.group.len(), 1);
        assert_eq!(errors.image, vec![INVALID_IMAGE.to_string()]);
    }

    #[test]
    fn oversized_image_is_rejected() {
        let mut form = post_form("hello", "", None);
        form.image_too_large = true;
        assert_eq!(form.validate().unwrap_err().image, vec![IMAGE_TOO_LARGE.to_string()]);
    }

    #[test]
    fn overlong_text_is_reported_not_required() {
        let mut form = post_form("", "", None);
        form.text_too_long = true;
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.text.len(), 1);
        assert!(errors.text[0].starts_with("Ensure this value has at most"));

        let mut form = post_form("hello", "", None);
        form.group_too_long = true;
        assert_eq!(form.validate().unwrap_err().group, vec![INVALID_CHOICE.to_string()]);
    }

    #[test]
    fn recognises_image_signatures() {
        assert!(is_image(SMALL_GIF));
        assert!(is_image(b"\x89PNG\r\n\x1a\nrest"));
        assert!(is_image(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(is_image(b"RIFF\x00\x00\x00\x00WEBPVP8 "));
        assert!(!is_image(b"<svg></svg>"));
    }

    #[test]
    fn blank_comment_is_dropped() {
        assert_eq!(CommentRequest { text: "  ".into() }.cleaned(), None);
        assert_eq!(
            CommentRequest { text: " nice ".into() }.cleaned().as_deref(),
            Some("nice")
        );
    }

    #[test]
    fn signup_reports_each_field() {
        let errors = SignupRequest {
            username: "bad name!".into(),
            email: "nope".into(),
            password: "short".into(),
        }
        .cleaned()
        .unwrap_err();
        assert_eq!(errors.username, vec![INVALID_USERNAME.to_string()]);
        assert_eq!(errors.email.len(), 1);
        assert_eq!(errors.password.len(), 1);
    }

    #[test]
    fn signup_accepts_valid_input() {
        let form = SignupRequest {
            username: " leo.t ".into(),
            email: "leo@example.com".into(),
            password: "war-and-peace".into(),
        }
        .cleaned()
        .unwrap();
        assert_eq!(form.username, "leo.t");
    }
}
