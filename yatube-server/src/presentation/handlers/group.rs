use actix_web::{HttpResponse, get, web};

use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::post::PostFilter;
use crate::presentation::dto::PageQuery;
use crate::presentation::templates::Templates;
use crate::presentation::utils::AuthenticatedUser;

#[get("/group/{slug}/")]
async fn group_posts(
    user: Option<AuthenticatedUser>,
    posts: web::Data<PostService>,
    templates: web::Data<Templates>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let group = posts.get_group(&path.into_inner()).await?;
    let page = posts
        .get_posts(PostFilter::Group(group.id), query.page.as_deref())
        .await?;

    let mut ctx = Templates::context(user.as_ref(), &format!("Posts of the {} community", group));
    ctx.insert("group", &group);
    ctx.insert("page", &page);
    templates.page("posts/group_list.html", &ctx)
}
