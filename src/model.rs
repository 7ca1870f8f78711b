use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

/// Upper bound on columns per row. Enforced by the editor, not the type.
pub const MAX_COLUMNS: usize = 3;

pub const DEFAULT_TABLE_NAME: &str = "product_product";
pub const DEFAULT_SUBMIT_ROUTE: &str = "https://submit.com/form/";

/// Reads an explicit `null` as the type's default, as REST backends send
/// `null` for empty columns.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifier shared by sections, rows, columns and fields.
///
/// Records hydrated from the API carry numeric ids; nodes created in the
/// editor carry generated string ids until the backend assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Server(i64),
    Client(String),
}

impl NodeId {
    pub fn client(value: impl Into<String>) -> Self {
        NodeId::Client(value.into())
    }

    pub fn is_server(&self) -> bool {
        matches!(self, NodeId::Server(_))
    }

    pub fn server_id(&self) -> Option<i64> {
        match self {
            NodeId::Server(id) => Some(*id),
            NodeId::Client(_) => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Server(id) => write!(f, "{}", id),
            NodeId::Client(id) => f.write_str(id),
        }
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::Client(value.to_string())
    }
}

impl From<i64> for NodeId {
    fn from(value: i64) -> Self {
        NodeId::Server(value)
    }
}

/// Input kind of a field. Unrecognised kinds are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Label,
    #[default]
    Text,
    Checkbox,
    Date,
    Datetime,
    Time,
    Number,
    Textarea,
    Radio,
    Select,
    Email,
    Password,
    File,
    Phone,
    Url,
    Other(String),
}

impl FieldKind {
    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Label => "label",
            FieldKind::Text => "text",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Date => "date",
            FieldKind::Datetime => "datetime",
            FieldKind::Time => "time",
            FieldKind::Number => "number",
            FieldKind::Textarea => "textarea",
            FieldKind::Radio => "radio",
            FieldKind::Select => "select",
            FieldKind::Email => "email",
            FieldKind::Password => "password",
            FieldKind::File => "file",
            FieldKind::Phone => "phone",
            FieldKind::Url => "url",
            FieldKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for FieldKind {
    fn from(value: &str) -> Self {
        match value {
            "label" => FieldKind::Label,
            "text" => FieldKind::Text,
            "checkbox" => FieldKind::Checkbox,
            "date" => FieldKind::Date,
            "datetime" => FieldKind::Datetime,
            "time" => FieldKind::Time,
            "number" => FieldKind::Number,
            "textarea" => FieldKind::Textarea,
            "radio" => FieldKind::Radio,
            "select" => FieldKind::Select,
            "email" => FieldKind::Email,
            "password" => FieldKind::Password,
            "file" => FieldKind::File,
            "phone" => FieldKind::Phone,
            "url" => FieldKind::Url,
            other => FieldKind::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldKind {
    fn from(value: String) -> Self {
        FieldKind::from(value.as_str())
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub field_type: FieldKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub placeholder: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: NodeId,
    pub db_column_name: String,
    pub config: FieldConfig,
    pub data_type: String,
    pub max_length: u32,
    /// Server id of the owning column, set when placed into a persisted column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<i64>,
}

impl Field {
    pub fn kind(&self) -> &FieldKind {
        &self.config.field_type
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Arc<Field>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Arc<Column>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub rows: Vec<Arc<Row>>,
}

/// Root aggregate. Subtrees are reference counted so that an edit only
/// copies the path from the root to the node it touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub submit_route: String,
    #[serde(default)]
    pub sections: Vec<Arc<Section>>,
}

impl Default for Form {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            submit_route: DEFAULT_SUBMIT_ROUTE.to_string(),
            sections: Vec::new(),
        }
    }
}

/// Position of a field inside the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLocation {
    pub section_id: NodeId,
    pub row_id: NodeId,
    pub column_id: NodeId,
    pub index: usize,
}

impl Form {
    pub fn section(&self, section_id: &NodeId) -> Option<&Section> {
        self.sections
            .iter()
            .map(|s| s.as_ref())
            .find(|s| &s.id == section_id)
    }

    pub fn row(&self, row_id: &NodeId) -> Option<&Row> {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .map(|r| r.as_ref())
            .find(|r| &r.id == row_id)
    }

    pub fn column(&self, column_id: &NodeId) -> Option<&Column> {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .flat_map(|r| r.columns.iter())
            .map(|c| c.as_ref())
            .find(|c| &c.id == column_id)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .flat_map(|r| r.columns.iter())
            .flat_map(|c| c.fields.iter())
            .map(|f| f.as_ref())
    }

    pub fn field(&self, field_id: &NodeId) -> Option<&Field> {
        self.fields().find(|f| &f.id == field_id)
    }

    pub fn field_ids(&self) -> Vec<NodeId> {
        self.fields().map(|f| f.id.clone()).collect()
    }

    /// Every id in the tree, sections first, in document order.
    pub fn all_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for section in &self.sections {
            ids.push(section.id.clone());
            for row in &section.rows {
                ids.push(row.id.clone());
                for column in &row.columns {
                    ids.push(column.id.clone());
                    ids.extend(column.fields.iter().map(|f| f.id.clone()));
                }
            }
        }
        ids
    }

    pub fn locate_field(&self, field_id: &NodeId) -> Option<FieldLocation> {
        for section in &self.sections {
            for row in &section.rows {
                for column in &row.columns {
                    if let Some(index) = column.fields.iter().position(|f| &f.id == field_id) {
                        return Some(FieldLocation {
                            section_id: section.id.clone(),
                            row_id: row.id.clone(),
                            column_id: column.id.clone(),
                            index,
                        });
                    }
                }
            }
        }
        None
    }

    /// Equality with editor-generated ids ignored.
    ///
    /// Client ids never reach the wire, so a form read back from its own
    /// payload carries fresh ones; server ids still have to match.
    pub fn same_structure(&self, other: &Form) -> bool {
        self.without_client_ids() == other.without_client_ids()
    }

    fn without_client_ids(&self) -> Form {
        fn erase(id: &NodeId) -> NodeId {
            match id {
                NodeId::Server(id) => NodeId::Server(*id),
                NodeId::Client(_) => NodeId::Client(String::new()),
            }
        }

        let sections = self
            .sections
            .iter()
            .map(|section| {
                let rows = section
                    .rows
                    .iter()
                    .map(|row| {
                        let columns = row
                            .columns
                            .iter()
                            .map(|column| {
                                let fields = column
                                    .fields
                                    .iter()
                                    .map(|field| {
                                        Arc::new(Field {
                                            id: erase(&field.id),
                                            ..field.as_ref().clone()
                                        })
                                    })
                                    .collect();
                                Arc::new(Column {
                                    id: erase(&column.id),
                                    name: column.name.clone(),
                                    fields,
                                })
                            })
                            .collect();
                        Arc::new(Row {
                            id: erase(&row.id),
                            name: row.name.clone(),
                            columns,
                        })
                    })
                    .collect();
                Arc::new(Section {
                    id: erase(&section.id),
                    name: section.name.clone(),
                    collapsed: section.collapsed,
                    rows,
                })
            })
            .collect();

        Form {
            sections,
            ..self.clone()
        }
    }
}

/// Editor state that is not part of the persisted document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UiState {
    #[serde(default)]
    pub active_section: Option<NodeId>,
}

/// A form together with the UI state the editor operations consult.
///
/// Deserializing repairs an active-section pointer that names no section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "DocumentRecord")]
pub struct Document {
    pub form: Form,
    pub ui: UiState,
}

#[derive(Deserialize)]
struct DocumentRecord {
    form: Form,
    #[serde(default)]
    ui: UiState,
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        let mut doc = Document {
            form: record.form,
            ui: record.ui,
        };
        doc.ensure_active_section();
        doc
    }
}

impl Document {
    /// Wraps a hydrated form, selecting its first section.
    pub fn new(form: Form) -> Self {
        let active_section = form.sections.first().map(|s| s.id.clone());
        Self {
            form,
            ui: UiState { active_section },
        }
    }

    pub fn active_section(&self) -> Option<&Section> {
        self.ui
            .active_section
            .as_ref()
            .and_then(|id| self.form.section(id))
    }

    /// Repairs the active-section pointer after sections were removed.
    pub(crate) fn ensure_active_section(&mut self) {
        let valid = self
            .ui
            .active_section
            .as_ref()
            .is_some_and(|id| self.form.section(id).is_some());
        if !valid {
            self.ui.active_section = self.form.sections.first().map(|s| s.id.clone());
        }
    }
}
