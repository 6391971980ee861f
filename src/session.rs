// ABOUTME: Session-cookie helpers around the platform session secret
// ABOUTME: The cookie's presence is the only session-validity signal this app consumes

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const SESSION_COOKIE_NAME: &str = "appwrite-session";

/// Cookie carrying the platform session secret. HttpOnly keeps it away from
/// client-side scripts; SameSite=Strict keeps it off cross-site requests.
pub fn create_session_cookie(secret: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, secret))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

/// Removal cookie; path must match the one the session cookie was set with.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

pub fn session_secret(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string())
}
