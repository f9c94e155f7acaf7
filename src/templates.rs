use actix_web::{http::StatusCode, HttpResponse};
use tera::{Context, Tera};

use crate::errors::AppError;

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        if let Err(e) = tera.add_raw_templates(vec![
            ("base.html", include_str!("../templates/base.html")),
            ("error.html", include_str!("../templates/error.html")),
            ("sign_in.html", include_str!("../templates/sign_in.html")),
            ("sign_up.html", include_str!("../templates/sign_up.html")),
            ("unauthorized.html", include_str!("../templates/unauthorized.html")),
            ("admin.html", include_str!("../templates/admin.html")),
            ("resource.html", include_str!("../templates/resource.html")),
            ("ambiente.html", include_str!("../templates/ambiente.html")),
            ("catalogo.html", include_str!("../templates/catalogo.html")),
            ("table_error.html", include_str!("../templates/table_error.html")),
            ("ambiente_tabla.html", include_str!("../templates/ambiente_tabla.html")),
            ("catalogo_tabla.html", include_str!("../templates/catalogo_tabla.html")),
        ]) {
            log::error!("Parsing error(s): {}", e);
            ::std::process::exit(1);
        }
        tera.autoescape_on(vec![".html"]);
        tera
    };
}

pub fn render(name: &str, context: &Context) -> Result<String, AppError> {
    TEMPLATES.render(name, context).map_err(|e| {
        log::error!("Failed to render template {}: {}", name, e);
        AppError::TemplateError(e)
    })
}

pub fn html(status: StatusCode, name: &str, context: &Context) -> Result<HttpResponse, AppError> {
    let rendered = render(name, context)?;
    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}
