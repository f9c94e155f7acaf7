//! Catalog page (`/editor-catalogo`).

use serde::Serialize;
use serde_json::Value;
use tera::Context;

use super::resource::ResourcePage;
use crate::{
    api::Resource,
    dialog::{CatalogDraft, CatalogForm},
    redirect::CATALOG_AREA,
    structs::{CatalogItem, Role},
    table::{headers, Column, Direction, SortValue, TableRecord, TableState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogColumn {
    Name,
    Price,
}

impl Column for CatalogColumn {
    const ALL: &'static [Self] = &[CatalogColumn::Name, CatalogColumn::Price];

    fn key(self) -> &'static str {
        match self {
            CatalogColumn::Name => "nombreItem",
            CatalogColumn::Price => "precio",
        }
    }
}

impl TableRecord for CatalogItem {
    type Column = CatalogColumn;

    const DEFAULT_SORT: (CatalogColumn, Direction) = (CatalogColumn::Name, Direction::Ascending);

    fn from_json(value: &Value) -> Option<Self> {
        CatalogItem::from_json(value)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
            || self.price.to_string().contains(term)
    }

    fn sort_value(&self, column: CatalogColumn) -> SortValue<'_> {
        match column {
            CatalogColumn::Name => SortValue::Text(&self.name),
            CatalogColumn::Price => SortValue::Number(self.price),
        }
    }
}

fn soles(amount: f64) -> String {
    format!("S/. {:.2}", amount)
}

#[derive(Debug, Serialize)]
struct CatalogRow {
    id: String,
    name: String,
    price: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct PriceStats {
    average: String,
    min: String,
    max: String,
}

impl PriceStats {
    fn of(items: &[&CatalogItem]) -> Option<PriceStats> {
        let first = items.first()?.price;
        let (sum, min, max) = items.iter().fold((0.0, first, first), |(sum, min, max), item| {
            (sum + item.price, min.min(item.price), max.max(item.price))
        });
        Some(PriceStats {
            average: soles(sum / items.len() as f64),
            min: soles(min),
            max: soles(max),
        })
    }
}

pub struct CatalogPage;

impl ResourcePage for CatalogPage {
    type Record = CatalogItem;
    type Draft = CatalogDraft;
    type Form = CatalogForm;

    const RESOURCE: Resource = Resource::Catalog;
    const PATH: &'static str = "/editor-catalogo";
    const ITEMS: &'static str = "items";
    const ROLES: &'static [Role] = CATALOG_AREA;
    const TITLE: &'static str = "Editor Catálogo";
    const ENTITY: &'static str = "item";
    const FIELDS_TEMPLATE: &'static str = "catalogo.html";
    const TABLE_TEMPLATE: &'static str = "catalogo_tabla.html";

    const LOAD_ERROR: &'static str = "Error al cargar los datos del catálogo";
    const ADD_ERROR: &'static str = "Error al agregar el item";
    const EDIT_ERROR: &'static str = "Error al editar el item";
    const DELETE_ERROR: &'static str = "Error al eliminar el item";

    fn describe(item: &CatalogItem) -> String {
        item.name.clone()
    }

    fn table_context(
        rows: &[&CatalogItem],
        state: &TableState<CatalogColumn>,
        context: &mut Context,
    ) {
        let stats = PriceStats::of(rows);
        let count_label = if rows.len() == 1 { "item" } else { "items" };
        let rows: Vec<CatalogRow> = rows
            .iter()
            .map(|item| CatalogRow {
                id: item.id.clone(),
                name: item.name.clone(),
                price: soles(item.price),
            })
            .collect();

        context.insert(
            "headers",
            &headers(
                state,
                Self::PATH,
                &[(CatalogColumn::Name, "Nombre"), (CatalogColumn::Price, "Precio")],
            ),
        );
        context.insert("count", &rows.len());
        context.insert("count_label", count_label);
        context.insert("stats", &stats);
        context.insert("rows", &rows);
    }
}
