//! Role redirect middleware.
//!
//! Runs before every page handler. The decision itself is [`decide`], a pure
//! function of the request path and the session state; the middleware only
//! gathers that state (cookie present, `/api/users/me` answer) and turns the
//! decision into a `302`.

use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::LOCATION,
    middleware::Next,
    web::Data,
    Error, HttpMessage, HttpResponse,
};

use crate::{guard::CurrentUser, session::session_token, structs::Role, AppState};

pub const ROOT: &str = "/";
pub const SIGN_IN: &str = "/sign-in";
pub const SIGN_UP: &str = "/sign-up";
pub const UNAUTHORIZED: &str = "/unauthorized";
pub const LOGOUT: &str = "/logout";

pub const ADMIN_AREA: &[Role] = &[Role::Admin];
pub const CATALOG_AREA: &[Role] = &[Role::Admin, Role::CatalogEditor];
pub const ENVIRONMENT_AREA: &[Role] = &[Role::Admin, Role::EnvironmentEditor];

/// Path prefixes and the roles allowed below them.
const RESTRICTED: &[(&str, &[Role])] = &[
    ("/admin", ADMIN_AREA),
    ("/editor-catalogo", CATALOG_AREA),
    ("/editor-ambiente", ENVIRONMENT_AREA),
];

/// What the middleware knows about the caller's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session cookie.
    Missing,
    /// Cookie present but the identity check failed, for any reason.
    Invalid,
    Authenticated(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Pass,
    Redirect(&'static str),
}

pub fn is_public(path: &str) -> bool {
    path == SIGN_IN || path == SIGN_UP
}

/// Assets and logout never go through the role check. Logout must be able to
/// clear a cookie the API no longer accepts.
pub fn is_exempt(path: &str) -> bool {
    path.starts_with("/static/") || path == "/favicon.ico" || path == LOGOUT
}

pub fn decide(path: &str, session: SessionState) -> Decision {
    if is_public(path) {
        return Decision::Pass;
    }
    let role = match session {
        SessionState::Missing | SessionState::Invalid => return Decision::Redirect(SIGN_IN),
        SessionState::Authenticated(role) => role,
    };

    if path == ROOT {
        return Decision::Redirect(role.dashboard().unwrap_or(UNAUTHORIZED));
    }

    match RESTRICTED
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
    {
        Some((_, allowed)) if !allowed.contains(&role) => Decision::Redirect(UNAUTHORIZED),
        _ => Decision::Pass,
    }
}

pub async fn role_redirect(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let path = req.path().to_owned();
    if is_exempt(&path) || is_public(&path) {
        return next.call(req).await.map(|res| res.map_into_left_body());
    }

    let session = match session_token(req.request()) {
        None => SessionState::Missing,
        Some(token) => match req.app_data::<Data<AppState>>().cloned() {
            Some(state) => match state.api.me(&token).await {
                Ok(user) => {
                    let role = user.role;
                    req.extensions_mut().insert(CurrentUser(user));
                    SessionState::Authenticated(role)
                }
                Err(e) => {
                    log::warn!("Auth check failed for {}: {}", path, e);
                    SessionState::Invalid
                }
            },
            None => {
                log::error!("Application state is not registered");
                SessionState::Invalid
            }
        },
    };

    match decide(&path, session) {
        Decision::Pass => next.call(req).await.map(|res| res.map_into_left_body()),
        Decision::Redirect(location) => {
            log::debug!("Redirecting {} to {}", path, location);
            let response = HttpResponse::Found()
                .insert_header((LOCATION, location))
                .finish();
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_app;
    use actix_web::{cookie::Cookie, test as actix_test};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PATHS: &[&str] = &[
        "/",
        "/sign-in",
        "/sign-up",
        "/admin",
        "/editor-catalogo",
        "/editor-catalogo/tabla",
        "/editor-ambiente",
        "/unauthorized",
    ];

    fn roles() -> Vec<Role> {
        vec![
            Role::Admin,
            Role::CatalogEditor,
            Role::EnvironmentEditor,
            Role::Unrecognized,
        ]
    }

    fn expected(path: &str, session: SessionState) -> Decision {
        use Decision::*;
        match (path, session) {
            ("/sign-in" | "/sign-up", _) => Pass,
            (_, SessionState::Missing | SessionState::Invalid) => Redirect(SIGN_IN),
            ("/", SessionState::Authenticated(Role::Admin)) => Redirect("/admin"),
            ("/", SessionState::Authenticated(Role::CatalogEditor)) => Redirect("/editor-catalogo"),
            ("/", SessionState::Authenticated(Role::EnvironmentEditor)) => {
                Redirect("/editor-ambiente")
            }
            ("/", SessionState::Authenticated(Role::Unrecognized)) => Redirect(UNAUTHORIZED),
            ("/admin", SessionState::Authenticated(Role::Admin)) => Pass,
            ("/admin", _) => Redirect(UNAUTHORIZED),
            (
                "/editor-catalogo" | "/editor-catalogo/tabla",
                SessionState::Authenticated(Role::Admin | Role::CatalogEditor),
            ) => Pass,
            ("/editor-catalogo" | "/editor-catalogo/tabla", _) => Redirect(UNAUTHORIZED),
            (
                "/editor-ambiente",
                SessionState::Authenticated(Role::Admin | Role::EnvironmentEditor),
            ) => Pass,
            ("/editor-ambiente", _) => Redirect(UNAUTHORIZED),
            _ => Pass,
        }
    }

    #[test]
    fn decision_table_is_exhaustive() {
        let mut sessions = vec![SessionState::Missing, SessionState::Invalid];
        sessions.extend(roles().into_iter().map(SessionState::Authenticated));

        for path in PATHS {
            for session in &sessions {
                assert_eq!(
                    decide(path, *session),
                    expected(path, *session),
                    "path {path} with {session:?}"
                );
            }
        }
    }

    #[test]
    fn catalog_editor_cannot_enter_environment_area() {
        assert_eq!(
            decide(
                "/editor-ambiente",
                SessionState::Authenticated(Role::CatalogEditor)
            ),
            Decision::Redirect("/unauthorized")
        );
    }

    #[test]
    fn assets_are_exempt() {
        assert!(is_exempt("/static/app.js"));
        assert!(is_exempt("/favicon.ico"));
        assert!(is_exempt("/logout"));
        assert!(!is_exempt("/admin"));
    }

    #[actix_web::test]
    async fn missing_cookie_redirects_to_sign_in() {
        let server = MockServer::start().await;
        let app = test_app!(server.uri());

        let req = actix_test::TestRequest::get().uri("/editor-catalogo").to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), 302);
        assert_eq!(res.headers().get(LOCATION).unwrap(), "/sign-in");
    }

    #[actix_web::test]
    async fn rejected_session_redirects_to_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "x"})))
            .mount(&server)
            .await;
        let app = test_app!(server.uri());

        let req = actix_test::TestRequest::get()
            .uri("/")
            .cookie(Cookie::new("payload-token", "stale"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.headers().get(LOCATION).unwrap(), "/sign-in");
    }

    #[actix_web::test]
    async fn catalog_editor_visiting_environment_page_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": "1", "name": "Ana", "email": "ana@x.pe", "role": "editorCatalogo"}
            })))
            .mount(&server)
            .await;
        let app = test_app!(server.uri());

        let req = actix_test::TestRequest::get()
            .uri("/editor-ambiente")
            .cookie(Cookie::new("payload-token", "tok"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), 302);
        assert_eq!(res.headers().get(LOCATION).unwrap(), "/unauthorized");
    }

    #[actix_web::test]
    async fn public_pages_skip_identity_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let app = test_app!(server.uri());

        let req = actix_test::TestRequest::get()
            .uri("/sign-in")
            .cookie(Cookie::new("payload-token", "tok"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), 200);
    }
}
