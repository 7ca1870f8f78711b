//! Read-only projection of a form into input controls, plus the values a
//! user enters while filling it in.

use crate::model::{Field, FieldKind, Form, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Values entered in preview, keyed by field id. Lives for one preview
/// session and is never written back into the form.
///
/// Serialized as a list of `{field_id, value}` entries: a JSON object key
/// cannot tell the server id `41` from the client id `"41"`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FieldValueEntry>", into = "Vec<FieldValueEntry>")]
pub struct FieldValues {
    values: BTreeMap<NodeId, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValueEntry {
    pub field_id: NodeId,
    #[serde(default)]
    pub value: Value,
}

impl From<Vec<FieldValueEntry>> for FieldValues {
    fn from(entries: Vec<FieldValueEntry>) -> Self {
        Self {
            values: entries
                .into_iter()
                .map(|entry| (entry.field_id, entry.value))
                .collect(),
        }
    }
}

impl From<FieldValues> for Vec<FieldValueEntry> {
    fn from(values: FieldValues) -> Self {
        values
            .values
            .into_iter()
            .map(|(field_id, value)| FieldValueEntry { field_id, value })
            .collect()
    }
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field_id: &NodeId) -> Option<&Value> {
        self.values.get(field_id)
    }

    pub fn set(&mut self, field_id: &NodeId, value: Value) {
        self.values.insert(field_id.clone(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Seeds values from an existing table row, matching fields by column name.
    pub fn prefill_from_record(form: &Form, record: &Map<String, Value>) -> Self {
        let mut values = Self::new();
        for field in form.fields() {
            if let Some(value) = record.get(&field.db_column_name) {
                values.set(&field.id, value.clone());
            }
        }
        values
    }

    /// Re-keys values by the owning field's column name. Values for fields
    /// no longer in the form, or without a column name, are dropped.
    pub fn to_column_values(&self, form: &Form) -> Map<String, Value> {
        let mut columns = Map::new();
        for field in form.fields() {
            if field.db_column_name.is_empty() {
                continue;
            }
            if let Some(value) = self.get(&field.id) {
                columns.insert(field.db_column_name.clone(), value.clone());
            }
        }
        columns
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnWidth {
    Full,
    Half,
    Third,
}

/// Width is derived from the column count at render time; it is not stored.
pub fn column_width(columns: usize, mobile: bool) -> ColumnWidth {
    if mobile {
        return ColumnWidth::Full;
    }
    match columns {
        2 => ColumnWidth::Half,
        3 => ColumnWidth::Third,
        _ => ColumnWidth::Full,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    Text,
    Email,
    Password,
    Number,
    Date,
    DatetimeLocal,
    Time,
    File,
    Tel,
    Url,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    Input { input_type: InputType },
    TextArea,
    Checkbox { checked: bool },
    Radio { options: Vec<String> },
    Select { options: Vec<String> },
    /// Static text; also the fallback for kinds without a control.
    Label,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Control {
    pub field_id: NodeId,
    pub label: String,
    pub placeholder: String,
    pub required: bool,
    pub widget: Widget,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedColumn {
    pub id: NodeId,
    pub width: ColumnWidth,
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedRow {
    pub id: NodeId,
    pub columns: Vec<RenderedColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSection {
    pub id: NodeId,
    pub title: String,
    pub collapsed: bool,
    pub rows: Vec<RenderedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedForm {
    pub title: String,
    pub sections: Vec<RenderedSection>,
}

fn widget_for(field: &Field, value: &Value) -> Widget {
    let options = || field.config.options.clone().unwrap_or_default();
    let input = |input_type| Widget::Input { input_type };
    match field.kind() {
        FieldKind::Text => input(InputType::Text),
        FieldKind::Email => input(InputType::Email),
        FieldKind::Password => input(InputType::Password),
        FieldKind::Number => input(InputType::Number),
        FieldKind::Date => input(InputType::Date),
        FieldKind::Datetime => input(InputType::DatetimeLocal),
        FieldKind::Time => input(InputType::Time),
        FieldKind::File => input(InputType::File),
        FieldKind::Phone => input(InputType::Tel),
        FieldKind::Url => input(InputType::Url),
        FieldKind::Textarea => Widget::TextArea,
        FieldKind::Checkbox => Widget::Checkbox {
            checked: value.as_bool().unwrap_or(false),
        },
        FieldKind::Radio => Widget::Radio { options: options() },
        FieldKind::Select => Widget::Select { options: options() },
        FieldKind::Label | FieldKind::Other(_) => Widget::Label,
    }
}

fn control_for(field: &Field, values: &FieldValues) -> Control {
    let value = values.get(&field.id).cloned().unwrap_or(Value::Null);
    Control {
        field_id: field.id.clone(),
        label: field.config.label.clone(),
        placeholder: field.config.placeholder.clone(),
        required: field.config.required,
        widget: widget_for(field, &value),
        value,
    }
}

/// Renders every section; collapsed sections keep their title but no rows.
pub fn render(form: &Form, values: &FieldValues, mobile: bool) -> RenderedForm {
    let sections = form
        .sections
        .iter()
        .map(|section| RenderedSection {
            id: section.id.clone(),
            title: section.name.clone(),
            collapsed: section.collapsed,
            rows: if section.collapsed {
                Vec::new()
            } else {
                section
                    .rows
                    .iter()
                    .map(|row| RenderedRow {
                        id: row.id.clone(),
                        columns: row
                            .columns
                            .iter()
                            .map(|column| RenderedColumn {
                                id: column.id.clone(),
                                width: column_width(row.columns.len(), mobile),
                                controls: column
                                    .fields
                                    .iter()
                                    .map(|field| control_for(field, values))
                                    .collect(),
                            })
                            .collect(),
                    })
                    .collect()
            },
        })
        .collect();

    RenderedForm {
        title: form.name.clone(),
        sections,
    }
}

/// State of one fill-in session over a form.
#[derive(Debug, Clone, Default)]
pub struct PreviewSession {
    values: FieldValues,
}

impl PreviewSession {
    pub fn new(values: FieldValues) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    /// Records an edit. Ids that are not fields of `form` are ignored.
    pub fn on_change(&mut self, form: &Form, field_id: &NodeId, value: Value) -> bool {
        if form.field(field_id).is_none() {
            return false;
        }
        self.values.set(field_id, value);
        true
    }

    pub fn render(&self, form: &Form, mobile: bool) -> RenderedForm {
        render(form, &self.values, mobile)
    }

    pub fn into_values(self) -> FieldValues {
        self.values
    }
}
