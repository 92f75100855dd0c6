mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use application::auth_service::AuthService;
use application::follow_service::FollowService;
use application::post_service::PostService;
use data::comment_repository::PostgresCommentRepository;
use data::follow_repository::PostgresFollowRepository;
use data::group_repository::PostgresGroupRepository;
use data::post_repository::PostgresPostRepository;
use data::user_repository::PostgresUserRepository;
use infrastructure::cache::PageCache;
use infrastructure::config::AppConfig;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::logging::init_logging;
use infrastructure::media::MediaStorage;
use infrastructure::security::JwtKeys;
use presentation::routes::AppState;
use presentation::templates::Templates;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let group_repo = Arc::new(PostgresGroupRepository::new(pool.clone()));
    let post_repo = Arc::new(PostgresPostRepository::new(pool.clone()));
    let comment_repo = Arc::new(PostgresCommentRepository::new(pool.clone()));
    let follow_repo = Arc::new(PostgresFollowRepository::new(pool.clone()));

    let state = AppState {
        auth: AuthService::new(
            user_repo,
            JwtKeys::new(config.jwt_secret.clone(), config.session_hours),
        ),
        posts: PostService::new(post_repo, group_repo, comment_repo),
        follows: FollowService::new(follow_repo),
        templates: Templates::load(&config.templates_dir)?,
        cache: PageCache::new(Duration::from_secs(config.index_cache_seconds)),
        media: MediaStorage::new(&config.media_root),
    };

    utils::start_http_server(config, state).await
}
