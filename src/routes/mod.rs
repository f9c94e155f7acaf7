use actix_web::{http::header::LOCATION, web, HttpResponse};
use serde::Serialize;
use tera::Context;

use crate::guard::Session;

pub mod ambiente;
pub mod auth;
pub mod catalogo;
pub mod pages;
pub mod resource;

use ambiente::WaterPage;
use catalogo::CatalogPage;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(pages::favicon_handler)
        .service(pages::root_handler)
        .service(pages::unauthorized_handler)
        .service(pages::admin_handler)
        .service(auth::sign_in_page)
        .service(auth::sign_in_handler)
        .service(auth::sign_up_page)
        .service(auth::sign_up_handler)
        .service(auth::logout_handler);
    resource::register::<WaterPage>(cfg);
    resource::register::<CatalogPage>(cfg);
}

#[derive(Serialize)]
struct NavLink {
    path: &'static str,
    label: &'static str,
    active: bool,
}

const NAV: [(&str, &str); 3] = [
    ("/admin", "Admin"),
    ("/editor-catalogo", "Editor Catálogo"),
    ("/editor-ambiente", "Editor Ambiente"),
];

/// Context shared by every page: title, and the toolbar when signed in.
pub(crate) fn page_context(title: &str, session: Option<&Session>, active: &str) -> Context {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("version", env!("CARGO_PKG_VERSION"));
    if let Some(session) = session {
        let nav: Vec<NavLink> = NAV
            .iter()
            .map(|&(path, label)| NavLink {
                path,
                label,
                active: path == active,
            })
            .collect();
        context.insert("nav", &nav);
        context.insert("user", &session.user);
    }
    context
}

/// `303` to `location`; after a write this is the full reload of the view.
pub(crate) fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

#[cfg(test)]
#[macro_export]
macro_rules! test_app {
    ($backend:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_web::middleware::from_fn($crate::redirect::role_redirect))
                .app_data(actix_web::web::Data::new($crate::AppState {
                    api: $crate::api::RemoteApi::new(&$backend, None).unwrap(),
                    secure_cookies: false,
                }))
                .configure($crate::routes::configure),
        )
        .await
    };
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Mock API that recognizes the session as a user holding `role`.
    pub async fn api_with_role(role: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": "1", "name": "Ana", "email": "ana@x.pe", "role": role}
            })))
            .mount(&server)
            .await;
        server
    }

    pub fn body_text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
