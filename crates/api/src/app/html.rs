//! Server-rendered markup for the page routes.

use flashweb_auth::JwtClaims;

/// Minimal HTML escaping for text and attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} - FlashWeb</title></head>
<body>
<nav><a href="/">Home</a> | <a href="/user">User</a> | <a href="/admin">Admin</a></nav>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

pub fn login_page(error: Option<&str>) -> String {
    let error = error
        .map(|e| format!("<p class=\"error\">{}</p>\n", escape(e)))
        .unwrap_or_default();
    layout(
        "Login",
        &format!(
            r#"<h1>Login</h1>
{error}<form method="post" action="/login">
<label>Username <input name="username" autocomplete="username"></label>
<label>Password <input name="password" type="password" autocomplete="current-password"></label>
<button type="submit">Sign in</button>
</form>"#
        ),
    )
}

/// Greeting plus a sign-out button for an authenticated page.
pub fn signed_in(heading: &str, claims: &JwtClaims) -> String {
    let roles = if claims.role.is_empty() {
        "none".to_owned()
    } else {
        claims.role.join(", ")
    };
    format!(
        r#"<h1>{heading}</h1>
<p>Signed in as <strong>{name}</strong> (roles: {roles}).</p>
<form method="post" action="/logout"><button type="submit">Sign out</button></form>"#,
        heading = escape(heading),
        name = escape(&claims.unique_name),
        roles = escape(&roles),
    )
}
