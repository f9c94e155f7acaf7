use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Identity categories known to the remote API.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "editorCatalogo")]
    CatalogEditor,
    #[serde(rename = "editorAmbiente")]
    EnvironmentEditor,
    /// Any role string outside the closed set. Never part of an allow-list.
    #[default]
    #[serde(other)]
    Unrecognized,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::CatalogEditor, Role::EnvironmentEditor];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::CatalogEditor => "editorCatalogo",
            Role::EnvironmentEditor => "editorAmbiente",
            Role::Unrecognized => "",
        }
    }

    pub fn parse(value: &str) -> Role {
        match value {
            "admin" => Role::Admin,
            "editorCatalogo" => Role::CatalogEditor,
            "editorAmbiente" => Role::EnvironmentEditor,
            _ => Role::Unrecognized,
        }
    }

    /// Landing page for the role, `None` when the role is not recognized.
    pub fn dashboard(self) -> Option<&'static str> {
        match self {
            Role::Admin => Some("/admin"),
            Role::CatalogEditor => Some("/editor-catalogo"),
            Role::EnvironmentEditor => Some("/editor-ambiente"),
            Role::Unrecognized => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::CatalogEditor => "Editor Catálogo",
            Role::EnvironmentEditor => "Editor Ambiente",
            Role::Unrecognized => "Sin rol",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// Extracts the user from a `/api/users/me` or login body.
    ///
    /// Accepts both `{"user": {...}}` and a bare user object. `{"user": null}`
    /// and objects carrying no identity field yield `None`.
    pub fn from_body(body: &Value) -> Option<User> {
        let candidate = match body.get("user") {
            Some(Value::Null) => return None,
            Some(user) => user,
            None => body,
        };
        let object = candidate.as_object()?;
        if !["id", "_id", "email", "role"]
            .iter()
            .any(|key| object.contains_key(*key))
        {
            return None;
        }
        serde_json::from_value(candidate.clone()).ok()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Creator {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

/// One water-consumption entry as listed by `/api/consumo-agua`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WaterRecord {
    pub id: String,
    pub registered_on: String,
    pub quantity: f64,
    pub notes: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub created_by: Option<Creator>,
}

impl WaterRecord {
    /// Builds a record from loosely-typed JSON, `None` when a required field
    /// is missing or has the wrong shape.
    pub fn from_json(value: &Value) -> Option<WaterRecord> {
        let object = value.as_object()?;
        Some(WaterRecord {
            id: json_id(object.get("id").or_else(|| object.get("_id"))?)?,
            registered_on: object.get("diaRegistro")?.as_str()?.to_owned(),
            quantity: json_number(object.get("cantidad")?)?,
            notes: object.get("observaciones")?.as_str()?.to_owned(),
            created_at: optional_string(object.get("createdAt")),
            updated_at: optional_string(object.get("updatedAt")),
            created_by: object
                .get("creadoPor")
                .filter(|creator| creator.is_object())
                .and_then(|creator| serde_json::from_value(creator.clone()).ok()),
        })
    }
}

/// One catalog entry as listed by `/api/catalogo`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl CatalogItem {
    pub fn from_json(value: &Value) -> Option<CatalogItem> {
        let object = value.as_object()?;
        Some(CatalogItem {
            id: json_id(object.get("id").or_else(|| object.get("_id"))?)?,
            name: object.get("nombreItem")?.as_str()?.to_owned(),
            price: json_number(object.get("precio")?)?,
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WaterPayload {
    #[serde(rename = "diaRegistro")]
    pub registered_on: String,
    #[serde(rename = "cantidad")]
    pub quantity: f64,
    #[serde(rename = "observaciones")]
    pub notes: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CatalogPayload {
    #[serde(rename = "nombreItem")]
    pub name: String,
    #[serde(rename = "precio")]
    pub price: f64,
}

#[derive(Serialize, Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(json_id(&value).unwrap_or_default())
}

fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn json_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) if text.trim().is_empty() => 0.0,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_owned)
}
