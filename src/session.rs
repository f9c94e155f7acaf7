use actix_web::{
    cookie::{Cookie, SameSite},
    HttpRequest,
};

/// Cookie carrying the remote API's session token.
pub const SESSION_COOKIE: &str = "payload-token";

/// Session token sent by the browser, if any.
pub fn session_token(req: &HttpRequest) -> Option<String> {
    req
        .cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .finish()
}

/// Cookie that makes the browser forget the session.
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), secure);
    cookie.make_removal();
    cookie
}
