use actix_files::NamedFile;
use actix_web::{get, http::StatusCode, web::Data, HttpRequest, Responder};
use serde::Serialize;

use crate::{
    errors::AppError,
    guard::{current_session, require_roles},
    redirect::{ADMIN_AREA, SIGN_IN, UNAUTHORIZED},
    structs::Role,
    templates::html,
    AppState,
};

use super::page_context;

#[get("/favicon.ico")]
pub async fn favicon_handler() -> Result<impl Responder, AppError> {
    Ok(NamedFile::open("static/favicon.svg")?)
}

/// Same routing as the middleware applies to `/`, for when it is bypassed.
#[get("/")]
pub async fn root_handler(req: HttpRequest, state: Data<AppState>) -> impl Responder {
    let location = match current_session(&req, &state).await {
        Ok(session) => session.user.role.dashboard().unwrap_or(UNAUTHORIZED),
        Err(_) => SIGN_IN,
    };
    super::see_other(location)
}

#[derive(Debug, Serialize, PartialEq)]
struct AreaLink {
    path: &'static str,
    label: &'static str,
}

/// Dashboards the role may open: every one for admins, their own otherwise.
fn reachable_areas(role: Role) -> Vec<AreaLink> {
    let roles: &[Role] = match role {
        Role::Admin => &Role::ALL,
        Role::CatalogEditor => &[Role::CatalogEditor],
        Role::EnvironmentEditor => &[Role::EnvironmentEditor],
        Role::Unrecognized => &[],
    };
    roles
        .iter()
        .filter_map(|role| {
            role.dashboard().map(|path| AreaLink {
                path,
                label: role.label(),
            })
        })
        .collect()
}

#[get("/unauthorized")]
pub async fn unauthorized_handler(
    req: HttpRequest,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let session = current_session(&req, &state).await.ok();
    let mut context = page_context("Acceso no autorizado", session.as_ref(), UNAUTHORIZED);
    if let Some(session) = &session {
        context.insert("areas", &reachable_areas(session.user.role));
    }
    html(StatusCode::FORBIDDEN, "unauthorized.html", &context)
}

#[get("/admin")]
pub async fn admin_handler(
    req: HttpRequest,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let session = match require_roles(&req, &state, ADMIN_AREA).await {
        Ok(session) => session,
        Err(denied) => return Ok(denied.redirect()),
    };
    let mut context = page_context("Panel de Administración", Some(&session), "/admin");
    context.insert("areas", &reachable_areas(Role::Admin)[1..]);
    html(StatusCode::OK, "admin.html", &context)
}
