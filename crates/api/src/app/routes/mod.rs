use axum::{
    Router,
    routing::{get, post},
};

pub mod account;
pub mod pages;
pub mod system;

/// Browser-facing routes; each page runs the auth guard itself.
pub fn router() -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/user", get(pages::user_area))
        .route("/admin", get(pages::admin_area))
        .route("/admin/users", get(pages::admin_users))
        .route("/login", get(account::login_form).post(account::login))
        .route("/logout", post(account::logout))
        .route("/register", post(account::register))
}
