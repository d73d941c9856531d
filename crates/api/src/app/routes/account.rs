use std::sync::Arc;

use axum::{
    Form, Json,
    extract::Extension,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use crate::app::{
    dto::{CredentialsForm, TokenResponse, UserView},
    errors::{self, json_error},
    html,
    services::AppServices,
};
use crate::browser::Visit;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub async fn login_form(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
) -> Response {
    Visit::begin(&services, jar).finish(Html(html::login_page(None)))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Response {
    let visit = Visit::begin(&services, jar);

    let (user, token) = match services.login(&form.username, &form.password).await {
        Ok(Some(issued)) => issued,
        Ok(None) => {
            return visit.finish((
                StatusCode::UNAUTHORIZED,
                Html(html::login_page(Some(INVALID_CREDENTIALS))),
            ));
        }
        Err(e) => return errors::service_error_to_response(e),
    };

    if let Err(e) = visit.sign_in(&token).await {
        error!(error = %e, "could not persist token");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error");
    }

    info!(user_id = %user.user_id, session_id = %visit.session_id(), "signed in");
    visit.redirect("/")
}

pub async fn logout(Extension(services): Extension<Arc<AppServices>>, jar: CookieJar) -> Response {
    let visit = Visit::begin(&services, jar);
    visit.sign_out().await;
    visit.finish(StatusCode::NO_CONTENT)
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match services.register(&form.username, &form.password).await {
        Ok(user) => (StatusCode::CREATED, Json(UserView::from(user))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Token issuance for non-browser clients.
pub async fn issue_token(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CredentialsForm>,
) -> Response {
    match services.login(&body.username, &body.password).await {
        Ok(Some((_, token))) => Json(TokenResponse::bearer(
            token,
            services.jwt.options().expire_minutes,
        ))
        .into_response(),
        Ok(None) => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            INVALID_CREDENTIALS,
        ),
        Err(e) => errors::service_error_to_response(e),
    }
}
