//! Page container shared by the two record types. It owns the create, update
//! and delete handlers, the dialog and delete-confirmation state, and the
//! top-level error banner. A successful write answers `303` to the bare page
//! path, so the browser reloads the whole view and every bit of search, sort
//! and dialog state is dropped.

use actix_web::{
    http::StatusCode,
    web::{self, Data},
    HttpRequest, HttpResponse,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tera::Context;

use super::{page_context, see_other};
use crate::{
    api::{ApiError, Resource},
    dialog::{Draft, EditDialog},
    errors::AppError,
    guard::{require_roles, Session},
    structs::Role,
    table::{find_record, load_records, visible, Column, TableQuery, TableRecord, TableState},
    templates::html,
    utils::now_display,
    AppState,
};

pub const INVALID_ID: &str = "ID del item no válido";

type ColumnOf<P> = <<P as ResourcePage>::Record as TableRecord>::Column;

/// One record type's page: where it lives, who may see it, and how its rows
/// are presented.
pub trait ResourcePage: 'static {
    type Record: TableRecord + 'static;
    type Draft: Draft<Record = Self::Record> + 'static;
    type Form: DeserializeOwned + Into<Self::Draft> + 'static;

    const RESOURCE: Resource;
    const PATH: &'static str;
    /// Path segment for writes, below [`Self::PATH`].
    const ITEMS: &'static str;
    const ROLES: &'static [Role];
    const TITLE: &'static str;
    /// Singular noun for one record, used in dialog headings.
    const ENTITY: &'static str;
    /// Partial holding the dialog's form fields.
    const FIELDS_TEMPLATE: &'static str;
    const TABLE_TEMPLATE: &'static str;

    const LOAD_ERROR: &'static str;
    const ADD_ERROR: &'static str;
    const EDIT_ERROR: &'static str;
    const DELETE_ERROR: &'static str;

    /// Text naming the record in the delete confirmation.
    fn describe(record: &Self::Record) -> String;

    /// Inserts rows, headers and summary figures for the table fragment.
    fn table_context(
        rows: &[&Self::Record],
        state: &TableState<ColumnOf<Self>>,
        context: &mut Context,
    );
}

pub fn register<P: ResourcePage>(cfg: &mut web::ServiceConfig) {
    let items = items_path::<P>();
    cfg.route(P::PATH, web::get().to(page::<P>))
        .route(&format!("{}/tabla", P::PATH), web::get().to(table::<P>))
        .route(&items, web::post().to(create::<P>))
        .route(&format!("{items}/{{id}}"), web::post().to(update::<P>))
        .route(
            &format!("{items}/{{id}}/eliminar"),
            web::post().to(delete::<P>),
        );
}

fn items_path<P: ResourcePage>() -> String {
    format!("{}/{}", P::PATH, P::ITEMS)
}

/// Record ids come from the remote API and end up inside form actions.
fn id_segment(id: &str) -> String {
    utf8_percent_encode(id, NON_ALPHANUMERIC).to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub nuevo: Option<String>,
    pub editar: Option<String>,
    pub eliminar: Option<String>,
}

impl PageQuery {
    fn table(&self) -> TableQuery {
        TableQuery {
            q: self.q.clone(),
            sort: self.sort.clone(),
            dir: self.dir.clone(),
        }
    }
}

/// Pending destructive action, shown as a modal until confirmed or cancelled.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteConfirm {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteForm {
    pub descripcion: Option<String>,
}

struct PageView<'a, D> {
    query: TableQuery,
    dialog: Option<&'a EditDialog<D>>,
    confirm: Option<&'a DeleteConfirm>,
    banner: Option<&'a str>,
}

impl<D> Default for PageView<'_, D> {
    fn default() -> Self {
        Self {
            query: TableQuery::default(),
            dialog: None,
            confirm: None,
            banner: None,
        }
    }
}

fn render_page<P: ResourcePage>(
    session: &Session,
    view: PageView<'_, P::Draft>,
    status: StatusCode,
) -> Result<HttpResponse, AppError> {
    let state = TableState::from_query(&view.query, <P::Record as TableRecord>::DEFAULT_SORT);
    let items = items_path::<P>();

    let mut context = page_context(P::TITLE, Some(session), P::PATH);
    context.insert("page_path", P::PATH);
    context.insert("entity", P::ENTITY);
    context.insert("fields", P::FIELDS_TEMPLATE);
    context.insert(
        "table_src",
        &format!("{}/tabla?{}", P::PATH, state.query_string()),
    );
    context.insert("search", &state.search);
    context.insert("sort", state.sort.key());
    context.insert("dir", state.direction.as_str());
    if let Some(dialog) = view.dialog {
        let action = match &dialog.editing {
            Some(id) => format!("{items}/{}", id_segment(id)),
            None => items.clone(),
        };
        context.insert("dialog", dialog);
        context.insert("dialog_action", &action);
    }
    if let Some(confirm) = view.confirm {
        context.insert("confirm", confirm);
        context.insert(
            "confirm_action",
            &format!("{items}/{}/eliminar", id_segment(&confirm.id)),
        );
    }
    if let Some(banner) = view.banner {
        context.insert("banner", banner);
    }
    html(status, "resource.html", &context)
}

async fn load<P: ResourcePage>(
    state: &AppState,
    session: &Session,
) -> Result<Vec<P::Record>, ApiError> {
    let body = state.api.list(P::RESOURCE, &session.token).await?;
    Ok(load_records(body))
}

async fn page<P: ResourcePage>(
    req: HttpRequest,
    state: Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let session = match require_roles(&req, &state, P::ROLES).await {
        Ok(session) => session,
        Err(denied) => return Ok(denied.redirect()),
    };
    let query = query.into_inner();

    let mut dialog: Option<EditDialog<P::Draft>> = None;
    let mut confirm = None;
    let mut banner = None;

    if query.nuevo.is_some() {
        dialog = Some(EditDialog::create());
    } else if let Some(target) = query.editar.as_deref().or(query.eliminar.as_deref()) {
        match load::<P>(&state, &session).await {
            Ok(records) => match find_record(&records, target) {
                Some(record) if query.editar.is_some() => {
                    dialog = Some(EditDialog::edit(target, record));
                }
                Some(record) => {
                    confirm = Some(DeleteConfirm {
                        id: target.to_owned(),
                        description: P::describe(record),
                    });
                }
                None => banner = Some(INVALID_ID.to_owned()),
            },
            Err(e) => {
                log::error!("Failed to load {}: {}", P::RESOURCE.path(), e);
                banner = Some(e.read_message(P::LOAD_ERROR));
            }
        }
    }

    render_page::<P>(
        &session,
        PageView {
            query: query.table(),
            dialog: dialog.as_ref(),
            confirm: confirm.as_ref(),
            banner: banner.as_deref(),
        },
        StatusCode::OK,
    )
}

/// Table fragment: error panel, empty state, or rows.
async fn table<P: ResourcePage>(
    req: HttpRequest,
    state: Data<AppState>,
    query: web::Query<TableQuery>,
) -> Result<HttpResponse, AppError> {
    let session = match require_roles(&req, &state, P::ROLES).await {
        Ok(session) => session,
        Err(denied) => return Ok(denied.redirect()),
    };
    let table_state = TableState::from_query(&query, <P::Record as TableRecord>::DEFAULT_SORT);

    let mut context = Context::new();
    context.insert(
        "retry_src",
        &format!("{}/tabla?{}", P::PATH, table_state.query_string()),
    );

    let records = match load::<P>(&state, &session).await {
        Ok(records) => records,
        Err(e) => {
            log::error!("Failed to load {}: {}", P::RESOURCE.path(), e);
            context.insert("error", &e.read_message(P::LOAD_ERROR));
            return html(StatusCode::BAD_GATEWAY, "table_error.html", &context);
        }
    };

    let rows = visible(&records, &table_state);
    context.insert("page_path", P::PATH);
    context.insert("search", &table_state.search);
    context.insert("row_query", &table_state.query_string());
    context.insert(
        "clear_href",
        &format!("{}?{}", P::PATH, table_state.cleared().query_string()),
    );
    context.insert("updated_at", &now_display());
    P::table_context(&rows, &table_state, &mut context);
    html(StatusCode::OK, P::TABLE_TEMPLATE, &context)
}

async fn create<P: ResourcePage>(
    req: HttpRequest,
    state: Data<AppState>,
    form: web::Form<P::Form>,
) -> Result<HttpResponse, AppError> {
    let session = match require_roles(&req, &state, P::ROLES).await {
        Ok(session) => session,
        Err(denied) => return Ok(denied.redirect()),
    };
    let mut dialog = EditDialog::<P::Draft>::with_draft(None, form.into_inner().into());

    let Some(request) =
        dialog.submit(|payload| state.api.create(P::RESOURCE, &session.token, payload))
    else {
        return render_page::<P>(
            &session,
            PageView {
                dialog: Some(&dialog),
                ..PageView::default()
            },
            StatusCode::UNPROCESSABLE_ENTITY,
        );
    };

    match request.await {
        Ok(()) => {
            log::info!("{} created a record in {}", session.user.email, P::RESOURCE.path());
            Ok(see_other(P::PATH))
        }
        Err(e) => {
            log::error!("Failed to create record in {}: {}", P::RESOURCE.path(), e);
            let banner = e.user_message(P::ADD_ERROR);
            render_page::<P>(
                &session,
                PageView {
                    dialog: Some(&dialog),
                    banner: Some(&banner),
                    ..PageView::default()
                },
                StatusCode::BAD_GATEWAY,
            )
        }
    }
}

async fn update<P: ResourcePage>(
    req: HttpRequest,
    state: Data<AppState>,
    id: web::Path<String>,
    form: web::Form<P::Form>,
) -> Result<HttpResponse, AppError> {
    let session = match require_roles(&req, &state, P::ROLES).await {
        Ok(session) => session,
        Err(denied) => return Ok(denied.redirect()),
    };
    let id = id.into_inner();
    let mut dialog =
        EditDialog::<P::Draft>::with_draft(Some(id.clone()), form.into_inner().into());

    let Some(request) =
        dialog.submit(|payload| state.api.update(P::RESOURCE, &id, &session.token, payload))
    else {
        return render_page::<P>(
            &session,
            PageView {
                dialog: Some(&dialog),
                ..PageView::default()
            },
            StatusCode::UNPROCESSABLE_ENTITY,
        );
    };

    match request.await {
        Ok(()) => {
            log::info!("{} updated {}/{}", session.user.email, P::RESOURCE.path(), id);
            Ok(see_other(P::PATH))
        }
        Err(e) => {
            log::error!("Failed to update {}/{}: {}", P::RESOURCE.path(), id, e);
            let banner = e.user_message(P::EDIT_ERROR);
            render_page::<P>(
                &session,
                PageView {
                    dialog: Some(&dialog),
                    banner: Some(&banner),
                    ..PageView::default()
                },
                StatusCode::BAD_GATEWAY,
            )
        }
    }
}

async fn delete<P: ResourcePage>(
    req: HttpRequest,
    state: Data<AppState>,
    id: web::Path<String>,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse, AppError> {
    let session = match require_roles(&req, &state, P::ROLES).await {
        Ok(session) => session,
        Err(denied) => return Ok(denied.redirect()),
    };
    let id = id.into_inner();

    match state.api.delete(P::RESOURCE, &id, &session.token).await {
        Ok(()) => {
            log::info!("{} deleted {}/{}", session.user.email, P::RESOURCE.path(), id);
            Ok(see_other(P::PATH))
        }
        Err(e) => {
            log::error!("Failed to delete {}/{}: {}", P::RESOURCE.path(), id, e);
            let banner = e.user_message(P::DELETE_ERROR);
            let confirm = DeleteConfirm {
                id,
                description: form.into_inner().descripcion.unwrap_or_default(),
            };
            render_page::<P>(
                &session,
                PageView {
                    confirm: Some(&confirm),
                    banner: Some(&banner),
                    ..PageView::default()
                },
                StatusCode::BAD_GATEWAY,
            )
        }
    }
}
