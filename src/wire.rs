//! Conversion between the in-memory [`Form`] and the API's JSON records.

use crate::error::FormError;
use crate::ids::IdGenerator;
use crate::model::{
    null_as_default, Column, Field, FieldConfig, FieldKind, Form, NodeId, Row, Section,
};
use crate::preview::FieldValues;
use crate::registry::{default_data_type, default_max_length};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub form_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub table_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub submit_api_route: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<WireSection>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub section_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_collapsable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_order: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rows: Vec<WireRow>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub row_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_order: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<WireColumn>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireColumn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_order: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<WireField>,
}

/// Field record. Older records put `type`/`label`/`placeholder`/`required`
/// at the top level instead of under `config`; both are read, only the
/// nested shape is written.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub db_column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<FieldConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<i64>,

    #[serde(rename = "type", alias = "field_type", default, skip_serializing)]
    pub flat_type: Option<String>,
    #[serde(default, skip_serializing)]
    pub label: Option<String>,
    #[serde(default, skip_serializing)]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing)]
    pub required: Option<bool>,
}

/// Body of `field-values-submission`: entered values keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValuesSubmission {
    pub table_name: String,
    pub field_values: Map<String, Value>,
}

impl FieldValuesSubmission {
    /// The linked record id, present when the submission updates a row.
    pub fn record_id(&self) -> Option<&Value> {
        self.field_values.get("id")
    }
}

fn server_only(id: &NodeId) -> Option<NodeId> {
    id.is_server().then(|| id.clone())
}

fn position(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn field_to_wire(field: &Field) -> WireField {
    WireField {
        id: server_only(&field.id),
        db_column_name: field.db_column_name.clone(),
        config: Some(field.config.clone()),
        data_type: Some(field.data_type.clone()),
        max_length: Some(field.max_length),
        column: field.column,
        ..WireField::default()
    }
}

/// Builds the payload for create/update. Orders are 1-based positions and
/// editor-generated ids are left out for the backend to assign.
pub fn to_wire(form: &Form) -> WireForm {
    let sections = form
        .sections
        .iter()
        .enumerate()
        .map(|(s, section)| WireSection {
            id: server_only(&section.id),
            section_name: section.name.clone(),
            is_collapsable: section.collapsed,
            section_order: Some(position(s)),
            rows: section
                .rows
                .iter()
                .enumerate()
                .map(|(r, row)| WireRow {
                    id: server_only(&row.id),
                    row_name: row.name.clone(),
                    row_order: Some(position(r)),
                    columns: row
                        .columns
                        .iter()
                        .enumerate()
                        .map(|(c, column)| WireColumn {
                            id: server_only(&column.id),
                            column_name: column.name.clone(),
                            column_order: Some(position(c)),
                            fields: column.fields.iter().map(|f| field_to_wire(f)).collect(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    WireForm {
        id: form.id,
        form_name: form.name.clone(),
        table_name: form.table_name.clone(),
        submit_api_route: form.submit_route.clone(),
        sections,
    }
}

pub fn to_wire_json(form: &Form) -> Result<Value, FormError> {
    Ok(serde_json::to_value(to_wire(form))?)
}

/// Pretty JSON for the "show JSON" view.
pub fn to_wire_json_pretty(form: &Form) -> Result<String, FormError> {
    Ok(serde_json::to_string_pretty(&to_wire(form))?)
}

/// Sorts by `*_order`. A record without one keeps its arrival position,
/// counted from 1 like the written orders. The sort is stable.
fn sorted_by_order<T>(items: &[T], order: impl Fn(&T) -> Option<u32>) -> Vec<&T> {
    let mut keyed: Vec<(u32, &T)> = items
        .iter()
        .enumerate()
        .map(|(index, item)| (order(item).unwrap_or_else(|| position(index)), item))
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, item)| item).collect()
}

fn id_or_new(id: &Option<NodeId>, prefix: &str, ids: &mut dyn IdGenerator) -> NodeId {
    match id {
        Some(id) => id.clone(),
        None => ids.next_id(prefix),
    }
}

fn field_from_wire(raw: &WireField, ids: &mut dyn IdGenerator) -> Field {
    let config = match &raw.config {
        Some(config) => config.clone(),
        None => FieldConfig {
            field_type: raw
                .flat_type
                .as_deref()
                .map(FieldKind::from)
                .unwrap_or_default(),
            label: raw.label.clone().unwrap_or_default(),
            placeholder: raw.placeholder.clone().unwrap_or_default(),
            required: raw.required.unwrap_or(false),
            options: None,
        },
    };
    let kind = config.field_type.clone();
    Field {
        id: id_or_new(&raw.id, kind.as_str(), ids),
        db_column_name: raw.db_column_name.clone(),
        data_type: raw
            .data_type
            .clone()
            .unwrap_or_else(|| default_data_type(&kind).to_string()),
        max_length: raw.max_length.unwrap_or_else(|| default_max_length(&kind)),
        column: raw.column,
        config,
    }
}

/// Hydrates a fetched record. Missing ids are generated, sequences are put
/// in `*_order` order and absent optional values take their defaults.
pub fn from_wire(wire: &WireForm, ids: &mut dyn IdGenerator) -> Form {
    let mut sections = Vec::with_capacity(wire.sections.len());
    for raw_section in sorted_by_order(&wire.sections, |s| s.section_order) {
        let section_id = id_or_new(&raw_section.id, "section", ids);
        let mut rows = Vec::with_capacity(raw_section.rows.len());
        for (r, raw_row) in sorted_by_order(&raw_section.rows, |r| r.row_order)
            .into_iter()
            .enumerate()
        {
            let row_id = id_or_new(&raw_row.id, "row", ids);
            let mut columns = Vec::with_capacity(raw_row.columns.len());
            for (c, raw_column) in sorted_by_order(&raw_row.columns, |c| c.column_order)
                .into_iter()
                .enumerate()
            {
                let column_id = id_or_new(&raw_column.id, "col", ids);
                let fields = raw_column
                    .fields
                    .iter()
                    .map(|raw| Arc::new(field_from_wire(raw, ids)))
                    .collect();
                columns.push(Arc::new(Column {
                    id: column_id,
                    name: non_empty_or(&raw_column.column_name, || format!("Column {}", c + 1)),
                    fields,
                }));
            }
            rows.push(Arc::new(Row {
                id: row_id,
                name: non_empty_or(&raw_row.row_name, || format!("Row {}", r + 1)),
                columns,
            }));
        }
        sections.push(Arc::new(Section {
            id: section_id,
            name: raw_section.section_name.clone(),
            collapsed: raw_section.is_collapsable,
            rows,
        }));
    }

    Form {
        id: wire.id,
        name: wire.form_name.clone(),
        table_name: wire.table_name.clone(),
        submit_route: wire.submit_api_route.clone(),
        sections,
    }
}

pub fn from_wire_json(value: &Value, ids: &mut dyn IdGenerator) -> Result<Form, FormError> {
    let wire = WireForm::deserialize(value)?;
    Ok(from_wire(&wire, ids))
}

fn non_empty_or(value: &str, fallback: impl FnOnce() -> String) -> String {
    if value.is_empty() {
        fallback()
    } else {
        value.to_string()
    }
}

/// Checks run before a form may be saved.
pub fn validate_for_save(form: &Form) -> Result<(), FormError> {
    if form.name.trim().is_empty() {
        return Err(FormError::Validation("Form name cannot be empty.".to_string()));
    }
    if form.table_name.trim().is_empty() {
        return Err(FormError::Validation("Table name cannot be empty.".to_string()));
    }
    Ok(())
}

/// Projects entered values onto the form's table columns.
///
/// Returns `None` when nothing was entered. `record_id` links the
/// submission to an existing row, turning it into an update.
pub fn submission_payload(
    form: &Form,
    values: &FieldValues,
    record_id: Option<Value>,
) -> Option<FieldValuesSubmission> {
    let mut field_values = values.to_column_values(form);
    if field_values.is_empty() {
        return None;
    }
    if let Some(id) = record_id {
        field_values.insert("id".to_string(), id);
    }
    Some(FieldValuesSubmission {
        table_name: form.table_name.clone(),
        field_values,
    })
}
