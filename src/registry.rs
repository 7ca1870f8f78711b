use crate::model::{Field, FieldConfig, FieldKind, NodeId};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

/// Template offered for insertion into a column.
///
/// Unset values fall back to per-kind defaults when the field is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteField {
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_column_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Derived from a table column rather than the static catalog.
    #[serde(default)]
    pub from_database: bool,
}

impl PaletteField {
    pub fn new(kind: FieldKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: Some(label.into()),
            placeholder: None,
            required: false,
            options: None,
            db_column_name: None,
            data_type: None,
            max_length: None,
            from_database: false,
        }
    }

    pub fn of_kind(kind: FieldKind) -> Self {
        Self {
            label: None,
            ..Self::new(kind, "")
        }
    }

    /// Builds a placed field from this template.
    ///
    /// `column` is the server id of the target column, if it has one.
    pub fn instantiate(&self, id: NodeId, column: Option<i64>) -> Field {
        let kind = self.kind.clone();
        let db_column_name = self
            .db_column_name
            .clone()
            .unwrap_or_else(|| id.to_string().replace('-', "_"));
        let config = FieldConfig {
            label: self
                .label
                .clone()
                .unwrap_or_else(|| format!("{} Label", kind)),
            placeholder: self
                .placeholder
                .clone()
                .unwrap_or_else(|| format!("Enter {}", kind)),
            required: self.required,
            options: self.options.clone(),
            field_type: kind.clone(),
        };
        Field {
            id,
            db_column_name,
            data_type: self
                .data_type
                .clone()
                .unwrap_or_else(|| default_data_type(&kind).to_string()),
            max_length: self.max_length.unwrap_or_else(|| default_max_length(&kind)),
            config,
            column,
        }
    }
}

/// The static toolbox entries.
pub fn builtin_palette() -> Vec<PaletteField> {
    vec![
        PaletteField::new(FieldKind::Label, "Label"),
        PaletteField::new(FieldKind::Text, "Text Input"),
        PaletteField::new(FieldKind::Checkbox, "Checkbox"),
        PaletteField::new(FieldKind::Date, "Date Picker"),
    ]
}

pub fn default_data_type(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Textarea => "text",
        FieldKind::Number => "int",
        FieldKind::Date => "date",
        FieldKind::Datetime => "datetime",
        FieldKind::Time => "time",
        FieldKind::Radio => "tinyint",
        FieldKind::File | FieldKind::Url => "varchar(500)",
        FieldKind::Phone => "varchar(20)",
        _ => "varchar(255)",
    }
}

pub fn default_max_length(kind: &FieldKind) -> u32 {
    match kind {
        FieldKind::Textarea => 1000,
        FieldKind::Phone => 20,
        FieldKind::Url | FieldKind::File => 500,
        FieldKind::Radio => 100,
        _ => 255,
    }
}

/// Maps a SQL column type to the input kind used to edit it.
///
/// Rules are substring checks applied in order, so `tinyint` wins over
/// `int` and `datetime` never matches the plain date rule.
pub fn kind_for_db_type(db_type: &str) -> FieldKind {
    let t = db_type.to_lowercase();
    let has = |needle: &str| t.contains(needle);

    if has("tinyint") || has("boolean") {
        FieldKind::Radio
    } else if has("decimal") || has("float") || has("double") {
        FieldKind::Number
    } else if has("varchar") || has("char") {
        FieldKind::Text
    } else if has("text") {
        FieldKind::Textarea
    } else if has("int") {
        FieldKind::Number
    } else if has("date") && !has("time") {
        FieldKind::Date
    } else if has("datetime") || has("timestamp") {
        FieldKind::Datetime
    } else if has("time") {
        FieldKind::Time
    } else if has("email") {
        FieldKind::Email
    } else {
        FieldKind::Text
    }
}

/// Column descriptor returned by `GET /tables/{table}/fields/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_required")]
    pub required: bool,
}

// The API reports nullability as "YES"/"NO"; plain booleans are accepted too.
fn deserialize_required<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("yes"),
        _ => false,
    })
}

fn word_start_regex() -> &'static Regex {
    static WORD_START_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_START_REGEX.get_or_init(|| Regex::new(r"\b\w").expect("word start regex must compile"))
}

/// `first_name` -> `First Name`.
pub fn humanize_column_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    word_start_regex()
        .replace_all(&spaced, |caps: &regex::Captures| caps[0].to_uppercase())
        .into_owned()
}

/// `product_product` -> `Product`: the last underscore segment, title-cased.
pub fn table_display_label(table_name: &str) -> String {
    let last = table_name.rsplit('_').next().unwrap_or(table_name);
    humanize_column_name(last)
}

pub fn palette_from_table(columns: &[TableColumn]) -> Vec<PaletteField> {
    columns
        .iter()
        .filter_map(|column| {
            if column.name.trim().is_empty() {
                warn!(?column, "skipping table column without a name");
                return None;
            }
            let data_type = column
                .data_type
                .clone()
                .unwrap_or_else(|| "varchar(255)".to_string());
            let kind = kind_for_db_type(&data_type);
            Some(PaletteField {
                label: Some(humanize_column_name(&column.name)),
                required: column.required,
                db_column_name: Some(column.name.clone()),
                data_type: Some(data_type),
                from_database: true,
                ..PaletteField::of_kind(kind)
            })
        })
        .collect()
}

/// Static catalog followed by the fields derived from a table schema.
pub fn palette_with_table_fields(columns: &[TableColumn]) -> Vec<PaletteField> {
    let mut palette = builtin_palette();
    palette.extend(palette_from_table(columns));
    palette
}
