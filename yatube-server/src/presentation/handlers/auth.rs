use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, Scope, get, post, web};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::infrastructure::security::SESSION_COOKIE;
use crate::presentation::dto::{LoginRequest, NextQuery, SignupRequest};
use crate::presentation::forms::SignupErrors;
use crate::presentation::templates::Templates;
use crate::presentation::utils::{AuthenticatedUser, redirect, request_id, safe_next};

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(signup_form)
        .service(signup)
        .service(login_form)
        .service(login)
        .service(logout)
}

fn session_cookie(token: String, auth: &AuthService) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(auth.keys().ttl_seconds()))
        .finish()
}

fn logged_in(location: &str, cookie: Cookie<'static>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish()
}

fn signup_page(
    templates: &Templates,
    form: &SignupRequest,
    errors: &SignupErrors,
) -> Result<HttpResponse, DomainError> {
    let mut ctx = Templates::context(None, "Sign up");
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    templates.page("users/signup.html", &ctx)
}

fn login_page(
    templates: &Templates,
    form: &LoginRequest,
    error: Option<&str>,
) -> Result<HttpResponse, DomainError> {
    let mut ctx = Templates::context(None, "Log in");
    ctx.insert("form", form);
    ctx.insert("next", safe_next(form.next.as_deref()));
    ctx.insert("error", &error);
    templates.page("users/login.html", &ctx)
}

#[get("/signup/")]
async fn signup_form(templates: web::Data<Templates>) -> Result<HttpResponse, DomainError> {
    signup_page(&templates, &SignupRequest::default(), &SignupErrors::default())
}

#[post("/signup/")]
async fn signup(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    templates: web::Data<Templates>,
    payload: web::Form<SignupRequest>,
) -> Result<HttpResponse, DomainError> {
    let form = match payload.cleaned() {
        Ok(form) => form,
        Err(errors) => return signup_page(&templates, &payload, &errors),
    };

    let mut errors = SignupErrors::default();
    if auth.username_taken(&form.username).await? {
        errors
            .username
            .push("A user with that username already exists.".to_string());
    }
    if auth.email_taken(&form.email).await? {
        errors
            .email
            .push("A user with that email already exists.".to_string());
    }
    if !errors.is_empty() {
        return signup_page(&templates, &form, &errors);
    }

    let user = match auth
        .register(form.username.clone(), form.email.clone(), form.password.clone())
        .await
    {
        Ok(user) => user,
        Err(DomainError::UserAlreadyExists(message)) => {
            errors.username.push(message);
            return signup_page(&templates, &form, &errors);
        }
        Err(e) => return Err(e),
    };

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        username = %user.username,
        "user registered"
    );

    let token = auth.issue_token(&user)?;
    Ok(logged_in("/", session_cookie(token, &auth)))
}

#[get("/login/")]
async fn login_form(
    user: Option<AuthenticatedUser>,
    templates: web::Data<Templates>,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, DomainError> {
    if user.is_some() {
        return Ok(redirect(safe_next(query.next.as_deref())));
    }
    let form = LoginRequest {
        next: query.into_inner().next,
        ..LoginRequest::default()
    };
    login_page(&templates, &form, None)
}

#[post("/login/")]
async fn login(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    templates: web::Data<Templates>,
    payload: web::Form<LoginRequest>,
) -> Result<HttpResponse, DomainError> {
    let form = payload.into_inner();
    match auth.login(form.username.trim(), &form.password).await {
        Ok(token) => {
            info!(
                request_id = %request_id(&req),
                username = %form.username,
                "user logged in"
            );
            let location = safe_next(form.next.as_deref());
            Ok(logged_in(location, session_cookie(token, &auth)))
        }
        Err(DomainError::Unauthorized) => login_page(&templates, &form, Some(BAD_CREDENTIALS)),
        Err(e) => Err(e),
    }
}

#[get("/logout/")]
async fn logout(user: Option<AuthenticatedUser>) -> HttpResponse {
    if let Some(user) = user {
        info!(username = %user.username, "user logged out");
    }
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(cookie)
        .finish()
}
