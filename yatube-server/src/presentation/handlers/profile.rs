use actix_web::{HttpRequest, HttpResponse, get, web};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::follow_service::FollowService;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::post::PostFilter;
use crate::presentation::dto::PageQuery;
use crate::presentation::templates::Templates;
use crate::presentation::utils::{AuthenticatedUser, profile_url, redirect, request_id};

#[get("/profile/{username}/")]
async fn profile(
    user: Option<AuthenticatedUser>,
    auth: web::Data<AuthService>,
    posts: web::Data<PostService>,
    follows: web::Data<FollowService>,
    templates: web::Data<Templates>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let author = auth.get_by_username(&path.into_inner()).await?;
    let page = posts
        .get_posts(PostFilter::Author(author.id), query.page.as_deref())
        .await?;
    let following = match &user {
        Some(viewer) => follows.is_following(viewer.id, author.id).await?,
        None => false,
    };
    let is_self = user.as_ref().is_some_and(|viewer| viewer.id == author.id);

    let mut ctx = Templates::context(user.as_ref(), &format!("Profile of {}", author));
    ctx.insert("author", &author);
    ctx.insert("page", &page);
    ctx.insert("following", &following);
    ctx.insert("is_self", &is_self);
    templates.page("posts/profile.html", &ctx)
}

#[get("/follow/")]
async fn follow_index(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    templates: web::Data<Templates>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = posts
        .get_posts(PostFilter::FollowedBy(user.id), query.page.as_deref())
        .await?;

    let mut ctx = Templates::context(Some(&user), "Latest updates from your subscriptions");
    ctx.insert("page", &page);
    ctx.insert("follow", &true);
    templates.page("posts/follow.html", &ctx)
}

#[get("/profile/{username}/follow/")]
async fn profile_follow(
    req: HttpRequest,
    user: AuthenticatedUser,
    auth: web::Data<AuthService>,
    follows: web::Data<FollowService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let author = auth.get_by_username(&path.into_inner()).await?;
    if follows.follow(&user, &author).await? {
        info!(
            request_id = %request_id(&req),
            username = %user.username,
            author = %author.username,
            "subscribed"
        );
    }
    Ok(redirect(&profile_url(&author.username)))
}

#[get("/profile/{username}/unfollow/")]
async fn profile_unfollow(
    req: HttpRequest,
    user: AuthenticatedUser,
    auth: web::Data<AuthService>,
    follows: web::Data<FollowService>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let author = auth.get_by_username(&path.into_inner()).await?;
    follows.unfollow(&user, &author).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        author = %author.username,
        "unsubscribed"
    );

    Ok(redirect(&profile_url(&author.username)))
}
