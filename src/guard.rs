use actix_web::{http::header::LOCATION, HttpMessage, HttpRequest, HttpResponse};

use crate::{
    redirect::{SIGN_IN, UNAUTHORIZED},
    session::session_token,
    structs::{Role, User},
    AppState,
};

/// User resolved by the redirect middleware for the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Authenticated caller of a protected view.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Why a protected view refused to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    SignIn,
    Unauthorized,
}

impl Denied {
    pub fn location(self) -> &'static str {
        match self {
            Denied::SignIn => SIGN_IN,
            Denied::Unauthorized => UNAUTHORIZED,
        }
    }

    pub fn redirect(self) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((LOCATION, self.location()))
            .finish()
    }
}

/// Resolves the caller, reusing the middleware's lookup when there was one.
/// A single failed lookup is final.
pub async fn current_session(req: &HttpRequest, state: &AppState) -> Result<Session, Denied> {
    let token = session_token(req).ok_or(Denied::SignIn)?;
    let known = req.extensions().get::<CurrentUser>().cloned();
    let user = match known {
        Some(CurrentUser(user)) => user,
        None => state.api.me(&token).await.map_err(|e| {
            log::warn!("Auth check failed: {}", e);
            Denied::SignIn
        })?,
    };
    Ok(Session { user, token })
}

/// Guard for a protected view: the caller must hold one of `allowed`.
pub async fn require_roles(
    req: &HttpRequest,
    state: &AppState,
    allowed: &[Role],
) -> Result<Session, Denied> {
    let session = current_session(req, state).await?;
    if !allowed.contains(&session.user.role) {
        log::info!(
            "User {} with role {:?} denied access to {}",
            session.user.email,
            session.user.role,
            req.path()
        );
        return Err(Denied::Unauthorized);
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RemoteApi;
    use actix_web::{cookie::Cookie, test::TestRequest};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state(uri: &str) -> AppState {
        AppState {
            api: RemoteApi::new(uri, None).unwrap(),
            secure_cookies: false,
        }
    }

    async fn server_with_role(role: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": "9", "name": "Luz", "email": "luz@x.pe", "role": role}
            })))
            .mount(&server)
            .await;
        server
    }

    #[actix_web::test]
    async fn no_cookie_goes_to_sign_in() {
        let server = MockServer::start().await;
        let req = TestRequest::default().to_http_request();
        let result = require_roles(&req, &state(&server.uri()), &[Role::Admin]).await;
        assert_eq!(result.unwrap_err(), Denied::SignIn);
    }

    #[actix_web::test]
    async fn failed_lookup_goes_to_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        let req = TestRequest::default()
            .cookie(Cookie::new("payload-token", "tok"))
            .to_http_request();
        let result = require_roles(&req, &state(&server.uri()), &[Role::Admin]).await;
        assert_eq!(result.unwrap_err(), Denied::SignIn);
    }

    #[actix_web::test]
    async fn wrong_role_goes_to_unauthorized() {
        let server = server_with_role("editorAmbiente").await;
        let req = TestRequest::default()
            .cookie(Cookie::new("payload-token", "tok"))
            .to_http_request();
        let result = require_roles(&req, &state(&server.uri()), &[Role::Admin]).await;
        assert_eq!(result.unwrap_err(), Denied::Unauthorized);
        assert_eq!(Denied::Unauthorized.redirect().status(), 302);
    }

    #[actix_web::test]
    async fn allowed_role_renders() {
        let server = server_with_role("editorCatalogo").await;
        let req = TestRequest::default()
            .cookie(Cookie::new("payload-token", "tok"))
            .to_http_request();
        let session = require_roles(
            &req,
            &state(&server.uri()),
            &[Role::Admin, Role::CatalogEditor],
        )
        .await
        .unwrap();
        assert_eq!(session.token, "tok");
        assert_eq!(session.user.name, "Luz");
    }

    #[actix_web::test]
    async fn reuses_user_resolved_by_middleware() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let req = TestRequest::default()
            .cookie(Cookie::new("payload-token", "tok"))
            .to_http_request();
        req.extensions_mut().insert(CurrentUser(User {
            id: "1".into(),
            name: "Ana".into(),
            email: "ana@x.pe".into(),
            role: Role::Admin,
            last_login: None,
            created_at: None,
        }));
        let session = require_roles(&req, &state(&server.uri()), &[Role::Admin])
            .await
            .unwrap();
        assert_eq!(session.user.role, Role::Admin);
    }
}
