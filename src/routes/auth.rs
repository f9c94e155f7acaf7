use actix_web::{
    get,
    http::{header::LOCATION, StatusCode},
    post,
    web::{self, Data},
    HttpRequest, HttpResponse, Responder,
};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::{page_context, see_other};
use crate::{
    api::ApiError,
    errors::AppError,
    redirect::{ROOT, SIGN_IN},
    session::{cleared_session_cookie, session_cookie, session_token},
    structs::{Credentials, Registration, Role},
    templates::html,
    AppState,
};

const SIGN_IN_ERROR: &str = "Error al iniciar sesión";
const ROLE_UNKNOWN: &str = "No se pudo determinar el rol del usuario";
const SIGN_UP_ERROR: &str = "Error al registrar usuario";
const ROLE_REQUIRED: &str = "Por favor, selecciona un rol";
const PASSWORD_MISMATCH: &str = "Las contraseñas no coinciden";

#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    success: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(rename = "confirmPassword", default)]
    confirm_password: String,
    #[serde(default)]
    role: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct Strength {
    score: usize,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct RoleOption {
    value: &'static str,
    label: &'static str,
}

const STRENGTH_LABELS: [&str; 5] = ["Muy débil", "Débil", "Media", "Fuerte", "Muy fuerte"];

/// One point each for length, an uppercase letter, a digit and a symbol.
fn password_strength(password: &str) -> Strength {
    let score = [
        password.chars().count() >= 8,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ]
    .iter()
    .filter(|&&point| point)
    .count();
    Strength {
        score,
        label: STRENGTH_LABELS[score],
    }
}

fn sign_in_view(
    email: &str,
    notice: Option<&str>,
    error: Option<&str>,
    status: StatusCode,
) -> Result<HttpResponse, AppError> {
    let mut context = page_context("Iniciar Sesión", None, SIGN_IN);
    context.insert("email", email);
    if let Some(notice) = notice {
        context.insert("notice", notice);
    }
    if let Some(error) = error {
        context.insert("error", error);
    }
    html(status, "sign_in.html", &context)
}

fn sign_up_view(
    form: Option<&SignUpForm>,
    error: Option<&str>,
    status: StatusCode,
) -> Result<HttpResponse, AppError> {
    let mut context = page_context("Crear Cuenta", None, "");
    let roles: Vec<RoleOption> = Role::ALL
        .iter()
        .map(|role| RoleOption {
            value: role.as_str(),
            label: role.label(),
        })
        .collect();
    context.insert("roles", &roles);
    if let Some(form) = form {
        context.insert("name", &form.name);
        context.insert("email", &form.email);
        context.insert("role", &form.role);
        if !form.password.is_empty() {
            context.insert("strength", &password_strength(&form.password));
        }
    }
    if let Some(error) = error {
        context.insert("error", error);
    }
    html(status, "sign_up.html", &context)
}

#[get("/sign-in")]
pub async fn sign_in_page(query: web::Query<SignInQuery>) -> Result<impl Responder, AppError> {
    let notice = (query.success.as_deref() == Some("true"))
        .then_some("Registro exitoso. Ahora puedes iniciar sesión.");
    sign_in_view(
        query.email.as_deref().unwrap_or_default(),
        notice,
        None,
        StatusCode::OK,
    )
}

#[post("/sign-in")]
pub async fn sign_in_handler(
    web::Form(form): web::Form<SignInForm>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let credentials = Credentials {
        email: form.email.trim().to_owned(),
        password: form.password,
    };

    let login = match state.api.login(&credentials).await {
        Ok(login) => login,
        Err(e) => {
            log::warn!("Login failed for {}: {}", credentials.email, e);
            let status = match &e {
                ApiError::Status { .. } | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            };
            return sign_in_view(
                &credentials.email,
                None,
                Some(&e.user_message(SIGN_IN_ERROR)),
                status,
            );
        }
    };

    let Some(user) = login.user else {
        log::warn!("Login reply for {} carried no user role", credentials.email);
        return sign_in_view(
            &credentials.email,
            None,
            Some(ROLE_UNKNOWN),
            StatusCode::BAD_GATEWAY,
        );
    };
    let Some(token) = login.token else {
        log::error!("Login reply for {} carried no session token", credentials.email);
        return sign_in_view(
            &credentials.email,
            None,
            Some(SIGN_IN_ERROR),
            StatusCode::BAD_GATEWAY,
        );
    };

    log::info!("User {} signed in as {:?}", user.email, user.role);
    let landing = user.role.dashboard().unwrap_or(ROOT);
    Ok(HttpResponse::SeeOther()
        .cookie(session_cookie(token, state.secure_cookies))
        .insert_header((LOCATION, landing))
        .finish())
}

#[get("/sign-up")]
pub async fn sign_up_page() -> Result<impl Responder, AppError> {
    sign_up_view(None, None, StatusCode::OK)
}

#[post("/sign-up")]
pub async fn sign_up_handler(
    web::Form(form): web::Form<SignUpForm>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let role = Role::parse(&form.role);
    if role == Role::Unrecognized {
        return sign_up_view(Some(&form), Some(ROLE_REQUIRED), StatusCode::UNPROCESSABLE_ENTITY);
    }
    if form.password != form.confirm_password {
        return sign_up_view(
            Some(&form),
            Some(PASSWORD_MISMATCH),
            StatusCode::UNPROCESSABLE_ENTITY,
        );
    }

    let registration = Registration {
        name: form.name.trim().to_owned(),
        email: form.email.trim().to_owned(),
        password: form.password.clone(),
        role,
    };
    if let Err(e) = state.api.register(&registration).await {
        log::warn!("Registration failed for {}: {}", registration.email, e);
        return sign_up_view(
            Some(&form),
            Some(&e.user_message(SIGN_UP_ERROR)),
            StatusCode::BAD_GATEWAY,
        );
    }

    log::info!("Registered {} as {:?}", registration.email, role);
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("success", "true")
        .append_pair("email", &registration.email)
        .finish();
    Ok(see_other(&format!("{SIGN_IN}?{query}")))
}

/// Ends the remote session when there is one. The local cookie is cleared
/// even if the API call fails.
#[post("/logout")]
pub async fn logout_handler(
    req: HttpRequest,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if let Some(token) = session_token(&req) {
        if let Err(e) = state.api.logout(&token).await {
            log::warn!("Remote logout failed: {}", e);
        }
    }
    Ok(HttpResponse::SeeOther()
        .cookie(cleared_session_cookie(state.secure_cookies))
        .insert_header((LOCATION, SIGN_IN))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::body_text;
    use crate::test_app;
    use actix_web::{cookie::Cookie, test as actix_test};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn strength_points() {
        assert_eq!(password_strength("abc").label, "Muy débil");
        assert_eq!(password_strength("abcdefgh").label, "Débil");
        assert_eq!(password_strength("Abcdefgh").label, "Media");
        assert_eq!(password_strength("Abcdefg1").label, "Fuerte");
        assert_eq!(password_strength("Abcdef1!").score, 4);
        assert_eq!(password_strength("Abcdef1!").label, "Muy fuerte");
    }

    #[test]
    fn strength_counts_only_ascii_classes() {
        // Accented letters count as symbols, never as uppercase.
        assert_eq!(password_strength("contraseña").label, "Media");
        assert_eq!(password_strength("Éxito").score, 1);
    }

    #[actix_web::test]
    async fn sign_in_sets_cookie_and_lands_on_dashboard() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .and(body_json(json!({"email": "ana@x.pe", "password": "secreto"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "abc",
                "user": {"id": "1", "email": "ana@x.pe", "role": "editorCatalogo"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let app = test_app!(server.uri());
        let req = actix_test::TestRequest::post()
            .uri("/sign-in")
            .set_form([("email", " ana@x.pe "), ("password", "secreto")])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 303);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/editor-catalogo");
        let cookie = resp
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "payload-token")
            .unwrap();
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[actix_web::test]
    async fn sign_in_failure_shows_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({
                    "errors": [{"message": "Credenciales inválidas"}]
                })),
            )
            .mount(&server)
            .await;

        let app = test_app!(server.uri());
        let req = actix_test::TestRequest::post()
            .uri("/sign-in")
            .set_form([("email", "ana@x.pe"), ("password", "mal")])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body = body_text(&actix_test::read_body(resp).await);
        assert!(body.contains("Credenciales inválidas"));
        assert!(body.contains("ana@x.pe"));
    }

    #[actix_web::test]
    async fn sign_in_without_user_reports_unknown_role() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
            .mount(&server)
            .await;

        let app = test_app!(server.uri());
        let req = actix_test::TestRequest::post()
            .uri("/sign-in")
            .set_form([("email", "ana@x.pe"), ("password", "secreto")])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        let body = body_text(&actix_test::read_body(resp).await);
        assert!(body.contains(ROLE_UNKNOWN));
    }

    #[actix_web::test]
    async fn sign_in_without_role_keeps_user_on_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": "abc",
                "user": {"id": "1", "email": "ana@x.pe"}
            })))
            .mount(&server)
            .await;

        let app = test_app!(server.uri());
        let req = actix_test::TestRequest::post()
            .uri("/sign-in")
            .set_form([("email", "ana@x.pe"), ("password", "secreto")])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 502);
        assert!(resp.headers().get(LOCATION).is_none());
        assert!(resp
            .response()
            .cookies()
            .all(|cookie| cookie.name() != "payload-token"));
        let body = body_text(&actix_test::read_body(resp).await);
        assert!(body.contains(ROLE_UNKNOWN));
    }

    #[actix_web::test]
    async fn sign_up_checks_run_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        let app = test_app!(server.uri());

        let req = actix_test::TestRequest::post()
            .uri("/sign-up")
            .set_form([
                ("name", "Ana"),
                ("email", "ana@x.pe"),
                ("password", "uno"),
                ("confirmPassword", "dos"),
                ("role", ""),
            ])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422);
        let body = body_text(&actix_test::read_body(resp).await);
        assert!(body.contains(ROLE_REQUIRED));

        let req = actix_test::TestRequest::post()
            .uri("/sign-up")
            .set_form([
                ("name", "Ana"),
                ("email", "ana@x.pe"),
                ("password", "uno"),
                ("confirmPassword", "dos"),
                ("role", "admin"),
            ])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422);
        let body = body_text(&actix_test::read_body(resp).await);
        assert!(body.contains(PASSWORD_MISMATCH));
    }

    #[actix_web::test]
    async fn sign_up_success_returns_to_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .and(body_json(json!({
                "name": "Ana",
                "email": "ana+1@x.pe",
                "password": "Secreto1!",
                "role": "editorAmbiente"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let app = test_app!(server.uri());
        let req = actix_test::TestRequest::post()
            .uri("/sign-up")
            .set_form([
                ("name", "Ana"),
                ("email", "ana+1@x.pe"),
                ("password", "Secreto1!"),
                ("confirmPassword", "Secreto1!"),
                ("role", "editorAmbiente"),
            ])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 303);
        assert_eq!(
            resp.headers().get(LOCATION).unwrap(),
            "/sign-in?success=true&email=ana%2B1%40x.pe"
        );
    }

    #[actix_web::test]
    async fn sign_in_page_shows_registration_notice() {
        let server = MockServer::start().await;
        let app = test_app!(server.uri());
        let req = actix_test::TestRequest::get()
            .uri("/sign-in?success=true&email=ana%40x.pe")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body = body_text(&actix_test::read_body(resp).await);
        assert!(body.contains("Registro exitoso"));
        assert!(body.contains(r#"value="ana@x.pe""#));
    }

    #[actix_web::test]
    async fn logout_clears_cookie_even_when_api_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/logout"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let app = test_app!(server.uri());
        let req = actix_test::TestRequest::post()
            .uri("/logout")
            .cookie(Cookie::new("payload-token", "tok"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 303);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/sign-in");
        let cookie = resp
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "payload-token")
            .unwrap();
        assert_eq!(cookie.value(), "");
    }
}
