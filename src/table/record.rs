use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column values of one remote row, keyed by the table's field display names.
pub type Fields = Map<String, Value>;

/// One row of a remote table: `{id, fields}`.
///
/// `id` stays empty until the row has been persisted by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            created_time: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortParam {
    pub field: String,
    pub direction: SortDirection,
}

/// Query options for listing a table: view, server-side filter formula, sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub view: Option<String>,
    pub filter_by_formula: Option<String>,
    pub sort: Vec<SortParam>,
}

impl ListParams {
    pub fn filter(formula: impl Into<String>) -> Self {
        Self {
            filter_by_formula: Some(formula.into()),
            ..Default::default()
        }
    }

    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortParam {
            field: field.into(),
            direction,
        });
        self
    }

    /// Query-string pairs in the remote service's encoding (`sort[0][field]=...`).
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(view) = &self.view {
            pairs.push(("view".to_string(), view.clone()));
        }
        if let Some(formula) = &self.filter_by_formula {
            pairs.push(("filterByFormula".to_string(), formula.clone()));
        }
        for (i, sort) in self.sort.iter().enumerate() {
            pairs.push((format!("sort[{i}][field]"), sort.field.clone()));
            pairs.push((format!("sort[{i}][direction]"), sort.direction.as_str().to_string()));
        }
        pairs
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListPage {
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FieldsBody<'a> {
    pub fields: &'a Fields,
}

/// Reads a scalar field as text. Numbers and booleans are rendered, everything else is `None`.
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
