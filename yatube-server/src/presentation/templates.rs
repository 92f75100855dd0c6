use std::sync::Arc;

use actix_web::HttpResponse;
use actix_web::http::header::ContentType;
use tera::{Context, Tera};
use tracing::error;

use crate::domain::error::DomainError;
use crate::infrastructure::media::MEDIA_URL;
use crate::presentation::utils::AuthenticatedUser;

pub const NOT_FOUND_TEMPLATE: &str = "core/404.html";

/// Shared tera instance; every page gets the viewer and a title in its
/// context.
#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    pub fn load(dir: &str) -> Result<Self, tera::Error> {
        let tera = Tera::new(&format!("{}/**/*.html", dir.trim_end_matches('/')))?;
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn context(user: Option<&AuthenticatedUser>, title: &str) -> Context {
        let mut ctx = Context::new();
        ctx.insert("user", &user.map(|u| &u.0));
        ctx.insert("title", title);
        ctx.insert("media_url", MEDIA_URL);
        ctx
    }

    pub fn render(&self, name: &str, ctx: &Context) -> Result<String, DomainError> {
        self.tera.render(name, ctx).map_err(|e| {
            error!(template = name, "template rendering failed: {:?}", e);
            DomainError::Internal(format!("template error: {}", e))
        })
    }

    pub fn page(&self, name: &str, ctx: &Context) -> Result<HttpResponse, DomainError> {
        let body = self.render(name, ctx)?;
        Ok(HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(body))
    }

    pub fn not_found(&self, path: &str) -> String {
        let mut ctx = Self::context(None, "Page not found");
        ctx.insert("path", path);
        self.render(NOT_FOUND_TEMPLATE, &ctx)
            .unwrap_or_else(|_| format!("<h1>Page {path} not found</h1>"))
    }
}
