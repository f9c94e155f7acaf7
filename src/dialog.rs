//! Create/edit dialogs. A dialog owns a draft, validates it on submit and
//! hands the resulting payload to the caller; it never talks to the API.

use serde::{Deserialize, Serialize};

use crate::{
    structs::{CatalogItem, CatalogPayload, WaterPayload, WaterRecord},
    utils::{date_input_value, today_input_value},
};

pub const DATE_REQUIRED: &str = "El día de registro es requerido";
pub const QUANTITY_NOT_POSITIVE: &str = "La cantidad debe ser mayor que 0";
pub const NOTES_REQUIRED: &str = "Las observaciones son requeridas";
pub const NAME_REQUIRED: &str = "El nombre del item es requerido";
pub const PRICE_NOT_POSITIVE: &str = "El precio debe ser mayor que 0";

pub trait Draft: Clone + Serialize {
    type Record;
    type Payload: Serialize;

    /// Draft for create mode.
    fn blank() -> Self;

    fn from_record(record: &Self::Record) -> Self;

    /// First failing rule wins.
    fn validate(&self) -> Result<Self::Payload, &'static str>;
}

#[derive(Debug, Clone, Serialize)]
pub struct EditDialog<D> {
    pub open: bool,
    /// Id of the record being edited; `None` in create mode.
    pub editing: Option<String>,
    pub draft: D,
    pub error: Option<String>,
}

impl<D: Draft> EditDialog<D> {
    pub fn closed() -> Self {
        Self {
            open: false,
            editing: None,
            draft: D::blank(),
            error: None,
        }
    }

    /// Seeds the draft from `initial` (edit mode) or defaults (create mode)
    /// and clears any previous error.
    pub fn reseed(&mut self, initial: Option<(&str, &D::Record)>, open: bool) {
        self.open = open;
        self.error = None;
        match initial {
            Some((id, record)) => {
                self.editing = Some(id.to_owned());
                self.draft = D::from_record(record);
            }
            None => {
                self.editing = None;
                self.draft = D::blank();
            }
        }
    }

    pub fn create() -> Self {
        let mut dialog = Self::closed();
        dialog.reseed(None, true);
        dialog
    }

    pub fn edit(id: &str, record: &D::Record) -> Self {
        let mut dialog = Self::closed();
        dialog.reseed(Some((id, record)), true);
        dialog
    }

    /// Open dialog holding a draft the user already typed.
    pub fn with_draft(editing: Option<String>, draft: D) -> Self {
        Self {
            open: true,
            editing,
            draft,
            error: None,
        }
    }

    /// Validates the draft. On success `on_submit` receives the payload and
    /// its result is returned; on failure the error is recorded and
    /// `on_submit` is never called.
    pub fn submit<R>(&mut self, on_submit: impl FnOnce(D::Payload) -> R) -> Option<R> {
        match self.draft.validate() {
            Ok(payload) => {
                self.error = None;
                Some(on_submit(payload))
            }
            Err(message) => {
                self.error = Some(message.to_owned());
                None
            }
        }
    }
}

/// Mirrors a numeric input: anything unparseable counts as zero.
pub fn parse_amount(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WaterDraft {
    pub registered_on: String,
    pub quantity: f64,
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct WaterForm {
    #[serde(rename = "diaRegistro", default)]
    pub registered_on: String,
    #[serde(rename = "cantidad", default)]
    pub quantity: String,
    #[serde(rename = "observaciones", default)]
    pub notes: String,
}

impl From<WaterForm> for WaterDraft {
    fn from(form: WaterForm) -> Self {
        Self {
            registered_on: form.registered_on.trim().to_owned(),
            quantity: parse_amount(&form.quantity),
            notes: form.notes,
        }
    }
}

impl Draft for WaterDraft {
    type Record = WaterRecord;
    type Payload = WaterPayload;

    fn blank() -> Self {
        Self {
            registered_on: today_input_value(),
            quantity: 0.0,
            notes: String::new(),
        }
    }

    fn from_record(record: &WaterRecord) -> Self {
        Self {
            registered_on: date_input_value(&record.registered_on),
            quantity: record.quantity,
            notes: record.notes.clone(),
        }
    }

    fn validate(&self) -> Result<WaterPayload, &'static str> {
        if self.registered_on.is_empty() {
            return Err(DATE_REQUIRED);
        }
        if self.quantity <= 0.0 {
            return Err(QUANTITY_NOT_POSITIVE);
        }
        if self.notes.trim().is_empty() {
            return Err(NOTES_REQUIRED);
        }
        Ok(WaterPayload {
            registered_on: self.registered_on.clone(),
            quantity: self.quantity,
            notes: self.notes.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CatalogDraft {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct CatalogForm {
    #[serde(rename = "nombreItem", default)]
    pub name: String,
    #[serde(rename = "precio", default)]
    pub price: String,
}

impl From<CatalogForm> for CatalogDraft {
    fn from(form: CatalogForm) -> Self {
        Self {
            name: form.name,
            price: parse_amount(&form.price),
        }
    }
}

impl Draft for CatalogDraft {
    type Record = CatalogItem;
    type Payload = CatalogPayload;

    fn blank() -> Self {
        Self {
            name: String::new(),
            price: 0.0,
        }
    }

    fn from_record(record: &CatalogItem) -> Self {
        Self {
            name: record.name.clone(),
            price: record.price,
        }
    }

    fn validate(&self) -> Result<CatalogPayload, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(NAME_REQUIRED);
        }
        if self.price <= 0.0 {
            return Err(PRICE_NOT_POSITIVE);
        }
        Ok(CatalogPayload {
            name: name.to_owned(),
            price: self.price,
        })
    }
}
