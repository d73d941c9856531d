use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    response::{Html, Response},
};
use axum_extra::extract::cookie::CookieJar;

use flashweb_auth::{JwtClaims, LOGIN_PATH, Role};

use crate::app::{
    dto::UserView,
    errors,
    html,
    services::{AppServices, ServiceError},
};
use crate::browser::Visit;

/// Run the guard for `required`, then render with the session's claims.
async fn guarded_page<F>(
    services: &AppServices,
    jar: CookieJar,
    required: &[Role],
    title: &str,
    render: F,
) -> Response
where
    F: FnOnce(&JwtClaims) -> String,
{
    let visit = Visit::begin(services, jar);
    if !visit.authenticate(required).await {
        return visit.finish(());
    }
    match visit.claims(services).await {
        Some(claims) => {
            let body = render(&claims);
            visit.finish(Html(html::layout(title, &body)))
        }
        None => visit.redirect(LOGIN_PATH),
    }
}

pub async fn home(Extension(services): Extension<Arc<AppServices>>, jar: CookieJar) -> Response {
    guarded_page(&services, jar, &[], "Home", |claims| html::signed_in("Welcome", claims)).await
}

pub async fn user_area(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
) -> Response {
    guarded_page(&services, jar, &[Role::User, Role::Admin], "User", |claims| {
        html::signed_in("User area", claims)
    })
    .await
}

pub async fn admin_area(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
) -> Response {
    guarded_page(&services, jar, &[Role::Admin], "Admin", |claims| {
        html::signed_in("Administration", claims)
    })
    .await
}

pub async fn admin_users(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
) -> Response {
    let visit = Visit::begin(&services, jar);
    if !visit.authenticate(&[Role::Admin]).await {
        return visit.finish(());
    }
    match services.users.list().await {
        Ok(users) => {
            let views: Vec<UserView> = users.into_iter().map(UserView::from).collect();
            visit.finish(Json(views))
        }
        Err(e) => errors::service_error_to_response(ServiceError::Store(e)),
    }
}
