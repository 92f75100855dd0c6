use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::domain::group::Group;
use crate::domain::post::{Post, PostChanges, PostFilter};
use crate::infrastructure::cache::PageCache;
use crate::infrastructure::media::MediaStorage;
use crate::presentation::dto::{CommentRequest, PageQuery, PostFormValues};
use crate::presentation::forms::{PostForm, PostFormErrors};
use crate::presentation::templates::Templates;
use crate::presentation::utils::{
    AuthenticatedUser, html, is_owner, post_url, profile_url, redirect, request_id,
};

const POST_FORM_TEMPLATE: &str = "posts/create_post.html";

#[get("/")]
async fn index(
    req: HttpRequest,
    user: Option<AuthenticatedUser>,
    posts: web::Data<PostService>,
    templates: web::Data<Templates>,
    cache: web::Data<PageCache>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let viewer = user.as_ref().map(|u| u.username.as_str()).unwrap_or("");
    let key = format!("{}|{}", req.uri(), viewer);
    if let Some(body) = cache.get(&key).await {
        return Ok(html(body));
    }

    let page = posts
        .get_posts(PostFilter::All, query.page.as_deref())
        .await?;
    let mut ctx = Templates::context(user.as_ref(), "Latest updates");
    ctx.insert("page", &page);
    ctx.insert("index", &true);
    let body = templates.render("posts/index.html", &ctx)?;
    cache.insert(key, body.clone()).await;

    info!(
        request_id = %request_id(&req),
        page = page.number,
        "index rendered"
    );

    Ok(html(body))
}

#[get("/posts/{id}/")]
async fn post_detail(
    user: Option<AuthenticatedUser>,
    posts: web::Data<PostService>,
    templates: web::Data<Templates>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(path.into_inner()).await?;
    let comments = posts.comments(post.id).await?;
    let author_posts = posts.count_posts(PostFilter::Author(post.author_id)).await?;
    let is_author = user
        .as_ref()
        .is_some_and(|u| is_owner(&post.author_id, &u.id));

    let title: String = post.text.chars().take(30).collect();
    let mut ctx = Templates::context(user.as_ref(), &format!("Post {title}"));
    ctx.insert("post", &post);
    ctx.insert("comments", &comments);
    ctx.insert("author_posts", &author_posts);
    ctx.insert("is_author", &is_author);
    ctx.insert("form_title", "Add a comment:");
    templates.page("posts/post_detail.html", &ctx)
}

fn post_form_page(
    templates: &Templates,
    user: &AuthenticatedUser,
    groups: &[Group],
    values: &PostFormValues,
    errors: &PostFormErrors,
    editing: Option<&Post>,
) -> Result<HttpResponse, DomainError> {
    let title = if editing.is_some() { "Edit post" } else { "New post" };
    let mut ctx = Templates::context(Some(user), title);
    ctx.insert("groups", groups);
    ctx.insert("form", values);
    ctx.insert("errors", errors);
    ctx.insert("is_edit", &editing.is_some());
    if let Some(post) = editing {
        ctx.insert("post", post);
    }
    templates.page(POST_FORM_TEMPLATE, &ctx)
}

/// Validated post form with the group resolved and the image written to disk.
struct ValidPost {
    text: String,
    group: Option<Group>,
    image: Option<String>,
}

async fn clean_post_form(
    posts: &PostService,
    media: &MediaStorage,
    form: PostForm,
) -> Result<Result<ValidPost, PostFormErrors>, DomainError> {
    let cleaned = match form.validate() {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(Err(errors)),
    };

    let group = match cleaned.group_id {
        Some(id) => match posts.find_group(id).await? {
            Some(group) => Some(group),
            None => return Ok(Err(PostFormErrors::invalid_group())),
        },
        None => None,
    };

    let image = match cleaned.image {
        Some(file) => Some(media.save_post_image(&file.filename, &file.bytes).await?),
        None => None,
    };

    Ok(Ok(ValidPost {
        text: cleaned.text,
        group,
        image,
    }))
}

#[get("/create/")]
async fn create_post_form(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    templates: web::Data<Templates>,
) -> Result<HttpResponse, DomainError> {
    let groups = posts.groups().await?;
    post_form_page(
        &templates,
        &user,
        &groups,
        &PostFormValues::default(),
        &PostFormErrors::default(),
        None,
    )
}

#[post("/create/")]
async fn create_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    media: web::Data<MediaStorage>,
    templates: web::Data<Templates>,
    payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    let form = PostForm::from_multipart(payload).await?;
    let values = form.values();

    match clean_post_form(&posts, &media, form).await? {
        Ok(valid) => {
            let post = posts
                .create_post(&user, valid.text, valid.group, valid.image)
                .await?;

            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = %post.id,
                "post created"
            );

            Ok(redirect(&profile_url(&user.username)))
        }
        Err(errors) => {
            let groups = posts.groups().await?;
            post_form_page(&templates, &user, &groups, &values, &errors, None)
        }
    }
}

#[get("/posts/{id}/edit/")]
async fn edit_post_form(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    templates: web::Data<Templates>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(path.into_inner()).await?;
    if !is_owner(&post.author_id, &user.id) {
        return Ok(redirect(&post_url(&post.id)));
    }

    let groups = posts.groups().await?;
    let values = PostFormValues {
        text: post.text.clone(),
        group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
    };
    post_form_page(
        &templates,
        &user,
        &groups,
        &values,
        &PostFormErrors::default(),
        Some(&post),
    )
}

#[post("/posts/{id}/edit/")]
async fn update_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    media: web::Data<MediaStorage>,
    templates: web::Data<Templates>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(path.into_inner()).await?;
    if !is_owner(&post.author_id, &user.id) {
        debug!(post_id = %post.id, username = %user.username, "edit by non-author ignored");
        return Ok(redirect(&post_url(&post.id)));
    }

    let form = PostForm::from_multipart(payload).await?;
    let values = form.values();

    match clean_post_form(&posts, &media, form).await? {
        Ok(valid) => {
            let changes = PostChanges {
                text: valid.text,
                group: valid.group,
                image: valid.image,
            };
            let updated = posts.update_post(user.id, post.id, changes).await?;

            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = %updated.id,
                "post updated"
            );

            Ok(redirect(&post_url(&updated.id)))
        }
        Err(errors) => {
            let groups = posts.groups().await?;
            post_form_page(&templates, &user, &groups, &values, &errors, Some(&post))
        }
    }
}

#[post("/posts/{id}/delete/")]
async fn delete_post(
    req: HttpRequest,
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(path.into_inner()).await?;
    if !is_owner(&post.author_id, &user.id) {
        return Ok(redirect(&post_url(&post.id)));
    }

    posts.delete_post(user.id, post.id).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = %post.id,
        "post deleted"
    );

    Ok(redirect(&profile_url(&user.username)))
}

#[post("/posts/{id}/comment/")]
async fn add_comment(
    user: AuthenticatedUser,
    posts: web::Data<PostService>,
    path: web::Path<Uuid>,
    payload: web::Form<CommentRequest>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(path.into_inner()).await?;

    match payload.cleaned() {
        Some(text) => {
            posts.add_comment(post.id, &user, text).await?;
        }
        None => debug!(post_id = %post.id, "empty comment dropped"),
    }

    Ok(redirect(&post_url(&post.id)))
}
