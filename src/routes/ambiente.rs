//! Water-consumption page (`/editor-ambiente`).

use serde::Serialize;
use serde_json::Value;
use tera::Context;

use super::resource::ResourcePage;
use crate::{
    api::Resource,
    dialog::{WaterDraft, WaterForm},
    redirect::ENVIRONMENT_AREA,
    structs::{Role, WaterRecord},
    table::{headers, Column, Direction, SortValue, TableRecord, TableState},
    utils::{format_date, format_date_time, parse_timestamp},
};

/// Quantities above this many cubic meters are flagged in the table.
const HIGH_CONSUMPTION: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterColumn {
    RegisteredOn,
    Quantity,
    Notes,
    CreatedAt,
}

impl Column for WaterColumn {
    const ALL: &'static [Self] = &[
        WaterColumn::RegisteredOn,
        WaterColumn::Quantity,
        WaterColumn::Notes,
        WaterColumn::CreatedAt,
    ];

    fn key(self) -> &'static str {
        match self {
            WaterColumn::RegisteredOn => "diaRegistro",
            WaterColumn::Quantity => "cantidad",
            WaterColumn::Notes => "observaciones",
            WaterColumn::CreatedAt => "createdAt",
        }
    }
}

impl TableRecord for WaterRecord {
    type Column = WaterColumn;

    const DEFAULT_SORT: (WaterColumn, Direction) = (WaterColumn::RegisteredOn, Direction::Descending);

    fn from_json(value: &Value) -> Option<Self> {
        WaterRecord::from_json(value)
    }

    fn id(&self) -> &str {
        &self.id
    }

    /// Notes (case-insensitive) or the date as displayed.
    fn matches(&self, term: &str) -> bool {
        self.notes.to_lowercase().contains(&term.to_lowercase())
            || format_date(&self.registered_on).contains(term)
    }

    fn sort_value(&self, column: WaterColumn) -> SortValue<'_> {
        match column {
            WaterColumn::RegisteredOn => SortValue::Timestamp(parse_timestamp(&self.registered_on)),
            WaterColumn::Quantity => SortValue::Number(self.quantity),
            WaterColumn::Notes => SortValue::Text(&self.notes),
            WaterColumn::CreatedAt => {
                SortValue::Timestamp(self.created_at.as_deref().and_then(parse_timestamp))
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct WaterRow {
    id: String,
    date: String,
    quantity: String,
    high: bool,
    notes: String,
    created: String,
    creator: Option<String>,
}

impl From<&WaterRecord> for WaterRow {
    fn from(record: &WaterRecord) -> Self {
        let notes = if record.notes.trim().is_empty() {
            "-".to_owned()
        } else {
            record.notes.clone()
        };
        Self {
            id: record.id.clone(),
            date: format_date(&record.registered_on),
            quantity: format!("{:.2} m³", record.quantity),
            high: record.quantity > HIGH_CONSUMPTION,
            notes,
            created: record
                .created_at
                .as_deref()
                .map(format_date_time)
                .unwrap_or_else(|| "-".to_owned()),
            creator: record.created_by.as_ref().map(|creator| {
                let role = Role::parse(&creator.role);
                if role == Role::Unrecognized {
                    creator.name.clone()
                } else {
                    format!("{} ({})", creator.name, role.label())
                }
            }),
        }
    }
}

pub struct WaterPage;

impl ResourcePage for WaterPage {
    type Record = WaterRecord;
    type Draft = WaterDraft;
    type Form = WaterForm;

    const RESOURCE: Resource = Resource::WaterConsumption;
    const PATH: &'static str = "/editor-ambiente";
    const ITEMS: &'static str = "registros";
    const ROLES: &'static [Role] = ENVIRONMENT_AREA;
    const TITLE: &'static str = "Editor Ambiente";
    const ENTITY: &'static str = "registro";
    const FIELDS_TEMPLATE: &'static str = "ambiente.html";
    const TABLE_TEMPLATE: &'static str = "ambiente_tabla.html";

    const LOAD_ERROR: &'static str = "Error al cargar los datos de consumo de agua";
    const ADD_ERROR: &'static str = "Error al agregar el registro";
    const EDIT_ERROR: &'static str = "Error al editar el registro";
    const DELETE_ERROR: &'static str = "Error al eliminar el registro";

    fn describe(record: &WaterRecord) -> String {
        format!(
            "{:.2} m³ del {}",
            record.quantity,
            format_date(&record.registered_on)
        )
    }

    fn table_context(
        rows: &[&WaterRecord],
        state: &TableState<WaterColumn>,
        context: &mut Context,
    ) {
        let total: f64 = rows.iter().map(|record| record.quantity).sum();
        let rows: Vec<WaterRow> = rows.iter().copied().map(WaterRow::from).collect();
        let count_label = if rows.len() == 1 { "registro" } else { "registros" };

        context.insert(
            "headers",
            &headers(
                state,
                Self::PATH,
                &[
                    (WaterColumn::RegisteredOn, "Día de Registro"),
                    (WaterColumn::Quantity, "Cantidad"),
                    (WaterColumn::Notes, "Observaciones"),
                    (WaterColumn::CreatedAt, "Creado"),
                ],
            ),
        );
        context.insert("count", &rows.len());
        context.insert("count_label", count_label);
        context.insert("total", &format!("{:.2} m³", total));
        context.insert("rows", &rows);
    }
}
