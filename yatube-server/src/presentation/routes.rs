use actix_web::body::EitherBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::ContentType;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::auth_service::AuthService;
use crate::application::follow_service::FollowService;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::infrastructure::cache::PageCache;
use crate::infrastructure::media::{MEDIA_URL, MediaStorage};
use crate::presentation::handlers;
use crate::presentation::templates::Templates;

/// Everything the handlers pull out of `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub posts: PostService,
    pub follows: FollowService,
    pub templates: Templates,
    pub cache: PageCache,
    pub media: MediaStorage,
}

impl AppState {
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.auth.clone()))
            .app_data(web::Data::new(self.posts.clone()))
            .app_data(web::Data::new(self.follows.clone()))
            .app_data(web::Data::new(self.templates.clone()))
            .app_data(web::Data::new(self.cache.clone()))
            .app_data(web::Data::new(self.media.clone()))
            .route("/health", web::get().to(health))
            .service(actix_files::Files::new(MEDIA_URL, self.media.root()))
            .service(handlers::auth::scope())
            .service(handlers::post::index)
            .service(handlers::group::group_posts)
            .service(handlers::profile::profile)
            .service(handlers::profile::profile_follow)
            .service(handlers::profile::profile_unfollow)
            .service(handlers::profile::follow_index)
            .service(handlers::post::post_detail)
            .service(handlers::post::create_post_form)
            .service(handlers::post::create_post)
            .service(handlers::post::edit_post_form)
            .service(handlers::post::update_post)
            .service(handlers::post::delete_post)
            .service(handlers::post::add_comment);
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

/// Fallback for unmatched routes.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, DomainError> {
    Err(DomainError::PageNotFound(req.path().to_string()))
}

/// Replaces the body of every 404 with the custom not-found page.
pub fn render_not_found<B>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, _) = res.into_parts();
    let body = match req.app_data::<web::Data<Templates>>() {
        Some(templates) => templates.not_found(req.path()),
        None => format!("<h1>Page {} not found</h1>", req.path()),
    };
    let response = HttpResponse::NotFound()
        .content_type(ContentType::html())
        .body(body);
    let res: ServiceResponse<EitherBody<B>> =
        ServiceResponse::new(req, response).map_into_right_body();
    Ok(ErrorHandlerResponse::Response(res))
}
