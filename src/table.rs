//! List-table mechanics shared by the water and catalog views: response shape
//! coercion, malformed-row filtering, search, and sorting.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }

    pub fn parse(value: &str) -> Option<Direction> {
        match value {
            "ascending" => Some(Direction::Ascending),
            "descending" => Some(Direction::Descending),
            _ => None,
        }
    }

    fn indicator(self) -> &'static str {
        match self {
            Direction::Ascending => "▲",
            Direction::Descending => "▼",
        }
    }
}

/// A sortable column of a record type.
pub trait Column: Copy + Eq + Sized + 'static {
    const ALL: &'static [Self];

    fn key(self) -> &'static str;

    fn parse(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|column| column.key() == key)
    }
}

/// How a column compares: numerically, by parsed timestamp, or as text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    Number(f64),
    Timestamp(Option<i64>),
    Text(&'a str),
}

pub trait TableRecord: Sized {
    type Column: Column;

    const DEFAULT_SORT: (Self::Column, Direction);

    /// `None` drops the row.
    fn from_json(value: &Value) -> Option<Self>;

    fn id(&self) -> &str;

    fn matches(&self, term: &str) -> bool;

    fn sort_value(&self, column: Self::Column) -> SortValue<'_>;
}

/// Search and sort parameters as they appear in a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableState<C> {
    pub search: String,
    pub sort: C,
    pub direction: Direction,
}

impl<C: Column> TableState<C> {
    /// Unknown keys and directions fall back to `default`.
    pub fn from_query(query: &TableQuery, default: (C, Direction)) -> Self {
        let sort = query.sort.as_deref().and_then(C::parse);
        let direction = query.dir.as_deref().and_then(Direction::parse);
        let (sort, direction) = match (sort, direction) {
            (Some(sort), Some(direction)) => (sort, direction),
            (Some(sort), None) => (sort, Direction::Ascending),
            (None, _) => default,
        };
        Self {
            search: query.q.clone().unwrap_or_default(),
            sort,
            direction,
        }
    }

    /// State after clicking the header of `column`.
    pub fn toggled(&self, column: C) -> Self {
        let direction = if self.sort == column && self.direction == Direction::Ascending {
            Direction::Descending
        } else {
            Direction::Ascending
        };
        Self {
            search: self.search.clone(),
            sort: column,
            direction,
        }
    }

    pub fn cleared(&self) -> Self {
        Self {
            search: String::new(),
            ..self.clone()
        }
    }

    pub fn query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            serializer.append_pair("q", &self.search);
        }
        serializer
            .append_pair("sort", self.sort.key())
            .append_pair("dir", self.direction.as_str())
            .finish()
    }
}

/// Clickable column header.
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub label: &'static str,
    pub href: String,
    pub indicator: Option<&'static str>,
}

pub fn headers<C: Column>(
    state: &TableState<C>,
    base: &str,
    columns: &[(C, &'static str)],
) -> Vec<Header> {
    columns
        .iter()
        .map(|&(column, label)| Header {
            label,
            href: format!("{}?{}", base, state.toggled(column).query_string()),
            indicator: (state.sort == column).then(|| state.direction.indicator()),
        })
        .collect()
}

/// Accepts a bare array, a `{docs: [...]}` page, or a single object.
pub fn coerce_collection(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("docs") {
            Some(Value::Array(items)) => items,
            Some(docs) => {
                object.insert("docs".to_owned(), docs);
                vec![Value::Object(object)]
            }
            None => vec![Value::Object(object)],
        },
        _ => Vec::new(),
    }
}

/// Decodes every well-formed row and drops the rest.
pub fn load_records<R: TableRecord>(body: Value) -> Vec<R> {
    coerce_collection(body)
        .into_iter()
        .filter_map(|value| {
            let record = R::from_json(&value);
            if record.is_none() {
                log::debug!("Skipping malformed record: {}", value);
            }
            record
        })
        .collect()
}

pub fn compare_values(a: SortValue<'_>, b: SortValue<'_>) -> Ordering {
    match (a, b) {
        (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(&b),
        (SortValue::Timestamp(a), SortValue::Timestamp(b)) => a.cmp(&b),
        (SortValue::Text(a), SortValue::Text(b)) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
        _ => Ordering::Equal,
    }
}

/// Rows to display: matching the search term, ordered by the active column.
/// The sort is stable, so equal keys keep their source order.
pub fn visible<'a, R: TableRecord>(records: &'a [R], state: &TableState<R::Column>) -> Vec<&'a R> {
    let mut rows: Vec<&R> = records
        .iter()
        .filter(|record| record.matches(&state.search))
        .collect();
    rows.sort_by(|a, b| {
        let ordering = compare_values(a.sort_value(state.sort), b.sort_value(state.sort));
        match state.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });
    rows
}

pub fn find_record<'a, R: TableRecord>(records: &'a [R], id: &str) -> Option<&'a R> {
    records.iter().find(|record| record.id() == id)
}
