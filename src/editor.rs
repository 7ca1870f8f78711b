//! Structural edits over a [`Document`].
//!
//! Every operation borrows the current document and returns the next one.
//! The input is never touched; untouched subtrees are shared with the result
//! through their `Arc`s. Ids that do not resolve turn an operation into a
//! no-op that returns an equal document.

use crate::ids::IdGenerator;
use crate::model::{Column, Document, Field, Form, NodeId, Row, Section, MAX_COLUMNS};
use crate::registry::PaletteField;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Partial update merged into a field's config. `None` leaves a value as is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_column_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl FieldPatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    fn apply(&self, field: &mut Field) {
        if let Some(label) = &self.label {
            field.config.label = label.clone();
        }
        if let Some(placeholder) = &self.placeholder {
            field.config.placeholder = placeholder.clone();
        }
        if let Some(required) = self.required {
            field.config.required = required;
        }
        if let Some(options) = &self.options {
            field.config.options = Some(options.clone());
        }
        if let Some(name) = &self.db_column_name {
            field.db_column_name = name.clone();
        }
        if let Some(max_length) = self.max_length {
            field.max_length = max_length;
        }
    }
}

/// A single edit, in a shape a host UI can send as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    AddSection,
    DeleteSection {
        section_id: NodeId,
    },
    RenameSection {
        section_id: NodeId,
        name: String,
    },
    ToggleCollapse {
        section_id: NodeId,
    },
    SelectSection {
        section_id: NodeId,
    },
    AddRow,
    DeleteRow {
        row_id: NodeId,
    },
    AddColumn {
        row_id: NodeId,
    },
    DeleteColumn {
        row_id: NodeId,
        column_id: NodeId,
    },
    AddField {
        field: PaletteField,
        row_id: NodeId,
        column_id: NodeId,
    },
    MoveField {
        column_id: NodeId,
        from: usize,
        to: usize,
    },
    DeleteField {
        field_id: NodeId,
        row_id: NodeId,
        column_id: NodeId,
    },
    UpdateField {
        field_id: NodeId,
        patch: FieldPatch,
    },
}

pub fn apply(doc: &Document, edit: &Edit, ids: &mut dyn IdGenerator) -> Document {
    match edit {
        Edit::AddSection => add_section(doc, ids),
        Edit::DeleteSection { section_id } => delete_section(doc, section_id),
        Edit::RenameSection { section_id, name } => rename_section(doc, section_id, name),
        Edit::ToggleCollapse { section_id } => toggle_collapse(doc, section_id),
        Edit::SelectSection { section_id } => select_section(doc, section_id),
        Edit::AddRow => add_row(doc, ids),
        Edit::DeleteRow { row_id } => delete_row(doc, row_id),
        Edit::AddColumn { row_id } => add_column(doc, row_id, ids),
        Edit::DeleteColumn { row_id, column_id } => delete_column(doc, row_id, column_id),
        Edit::AddField {
            field,
            row_id,
            column_id,
        } => add_field(doc, field, row_id, column_id, ids).0,
        Edit::MoveField {
            column_id,
            from,
            to,
        } => move_field(doc, column_id, *from, *to),
        Edit::DeleteField {
            field_id,
            row_id,
            column_id,
        } => delete_field(doc, field_id, row_id, column_id),
        Edit::UpdateField { field_id, patch } => update_field(doc, field_id, patch),
    }
}

/// Draws from the injected generator, skipping ids the form already holds.
///
/// A generator restarted over a rehydrated document would otherwise hand
/// out ids that are in use. The generator must eventually yield a new id.
struct UnusedIds<'a> {
    inner: &'a mut dyn IdGenerator,
    taken: HashSet<NodeId>,
}

impl<'a> UnusedIds<'a> {
    fn new(form: &Form, inner: &'a mut dyn IdGenerator) -> Self {
        Self {
            inner,
            taken: form.all_ids().into_iter().collect(),
        }
    }
}

impl IdGenerator for UnusedIds<'_> {
    fn next_id(&mut self, prefix: &str) -> NodeId {
        loop {
            let id = self.inner.next_id(prefix);
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }
}

fn new_column(position: usize, ids: &mut dyn IdGenerator) -> Column {
    Column {
        id: ids.next_id("col"),
        name: format!("Column {}", position),
        fields: Vec::new(),
    }
}

fn new_row(position: usize, ids: &mut dyn IdGenerator) -> Row {
    Row {
        id: ids.next_id("row"),
        name: format!("Row {}", position),
        columns: vec![Arc::new(new_column(1, ids))],
    }
}

fn new_section(position: usize, ids: &mut dyn IdGenerator) -> Section {
    Section {
        id: ids.next_id("section"),
        name: format!("Section {}", position),
        collapsed: false,
        rows: vec![Arc::new(new_row(1, ids))],
    }
}

// Index paths into the tree. Only the nodes on a path are copied when
// mutated through `Arc::make_mut`.

fn section_index(doc: &Document, section_id: &NodeId) -> Option<usize> {
    doc.form.sections.iter().position(|s| &s.id == section_id)
}

fn row_path(doc: &Document, row_id: &NodeId) -> Option<(usize, usize)> {
    doc.form.sections.iter().enumerate().find_map(|(s, section)| {
        section
            .rows
            .iter()
            .position(|r| &r.id == row_id)
            .map(|r| (s, r))
    })
}

fn column_path_in_row(
    doc: &Document,
    row_id: &NodeId,
    column_id: &NodeId,
) -> Option<(usize, usize, usize)> {
    let (s, r) = row_path(doc, row_id)?;
    let c = doc.form.sections[s].rows[r]
        .columns
        .iter()
        .position(|c| &c.id == column_id)?;
    Some((s, r, c))
}

fn column_path(doc: &Document, column_id: &NodeId) -> Option<(usize, usize, usize)> {
    for (s, section) in doc.form.sections.iter().enumerate() {
        for (r, row) in section.rows.iter().enumerate() {
            if let Some(c) = row.columns.iter().position(|c| &c.id == column_id) {
                return Some((s, r, c));
            }
        }
    }
    None
}

fn section_mut(doc: &mut Document, s: usize) -> &mut Section {
    Arc::make_mut(&mut doc.form.sections[s])
}

fn row_mut(doc: &mut Document, (s, r): (usize, usize)) -> &mut Row {
    Arc::make_mut(&mut section_mut(doc, s).rows[r])
}

fn column_mut(doc: &mut Document, (s, r, c): (usize, usize, usize)) -> &mut Column {
    Arc::make_mut(&mut row_mut(doc, (s, r)).columns[c])
}

/// A document with a single empty section, selected.
pub fn new_document(ids: &mut dyn IdGenerator) -> Document {
    add_section(&Document::default(), ids)
}

/// Appends `Section N` with one row and column and makes it active.
pub fn add_section(doc: &Document, ids: &mut dyn IdGenerator) -> Document {
    let mut next = doc.clone();
    let mut ids = UnusedIds::new(&doc.form, ids);
    let section = new_section(doc.form.sections.len() + 1, &mut ids);
    next.ui.active_section = Some(section.id.clone());
    next.form.sections.push(Arc::new(section));
    next
}

/// Removes a section and everything below it. When the active section goes,
/// the first remaining one takes over (or none, if the form is empty).
pub fn delete_section(doc: &Document, section_id: &NodeId) -> Document {
    let mut next = doc.clone();
    let Some(s) = section_index(doc, section_id) else {
        return next;
    };
    next.form.sections.remove(s);
    next.ensure_active_section();
    next
}

pub fn rename_section(doc: &Document, section_id: &NodeId, name: &str) -> Document {
    let mut next = doc.clone();
    if let Some(s) = section_index(doc, section_id) {
        section_mut(&mut next, s).name = name.to_string();
    }
    next
}

pub fn toggle_collapse(doc: &Document, section_id: &NodeId) -> Document {
    let mut next = doc.clone();
    if let Some(s) = section_index(doc, section_id) {
        let section = section_mut(&mut next, s);
        section.collapsed = !section.collapsed;
    }
    next
}

pub fn select_section(doc: &Document, section_id: &NodeId) -> Document {
    let mut next = doc.clone();
    if section_index(doc, section_id).is_some() {
        next.ui.active_section = Some(section_id.clone());
    }
    next
}

/// Appends a row to the active section. No-op without one.
pub fn add_row(doc: &Document, ids: &mut dyn IdGenerator) -> Document {
    let mut next = doc.clone();
    let Some(s) = doc
        .ui
        .active_section
        .as_ref()
        .and_then(|id| section_index(doc, id))
    else {
        return next;
    };
    let mut ids = UnusedIds::new(&doc.form, ids);
    let section = section_mut(&mut next, s);
    let row = new_row(section.rows.len() + 1, &mut ids);
    section.rows.push(Arc::new(row));
    next
}

pub fn delete_row(doc: &Document, row_id: &NodeId) -> Document {
    let mut next = doc.clone();
    if let Some((s, r)) = row_path(doc, row_id) {
        section_mut(&mut next, s).rows.remove(r);
    }
    next
}

/// Adds a column unless the row already holds [`MAX_COLUMNS`].
pub fn add_column(doc: &Document, row_id: &NodeId, ids: &mut dyn IdGenerator) -> Document {
    let mut next = doc.clone();
    let Some(path) = row_path(doc, row_id) else {
        return next;
    };
    let mut ids = UnusedIds::new(&doc.form, ids);
    let row = row_mut(&mut next, path);
    if row.columns.len() >= MAX_COLUMNS {
        return doc.clone();
    }
    let column = new_column(row.columns.len() + 1, &mut ids);
    row.columns.push(Arc::new(column));
    next
}

/// Removes a column with its fields. A row's last column is kept.
pub fn delete_column(doc: &Document, row_id: &NodeId, column_id: &NodeId) -> Document {
    let mut next = doc.clone();
    let Some((s, r, c)) = column_path_in_row(doc, row_id, column_id) else {
        return next;
    };
    if doc.form.sections[s].rows[r].columns.len() <= 1 {
        return next;
    }
    row_mut(&mut next, (s, r)).columns.remove(c);
    next
}

/// Appends a new field built from `template` to the end of a column.
///
/// Returns the new field's id alongside the document, or `None` when the
/// row/column pair does not exist.
pub fn add_field(
    doc: &Document,
    template: &PaletteField,
    row_id: &NodeId,
    column_id: &NodeId,
    ids: &mut dyn IdGenerator,
) -> (Document, Option<NodeId>) {
    let mut next = doc.clone();
    let Some(path) = column_path_in_row(doc, row_id, column_id) else {
        return (next, None);
    };
    let id = UnusedIds::new(&doc.form, ids).next_id(template.kind.as_str());
    let field = template.instantiate(id.clone(), column_id.server_id());
    column_mut(&mut next, path).fields.push(Arc::new(field));
    (next, Some(id))
}

/// Moves the field at `from` to `to` within one column.
pub fn move_field(doc: &Document, column_id: &NodeId, from: usize, to: usize) -> Document {
    let mut next = doc.clone();
    let Some(path) = column_path(doc, column_id) else {
        return next;
    };
    let len = doc.form.sections[path.0].rows[path.1].columns[path.2]
        .fields
        .len();
    if from == to || from >= len || to >= len {
        return next;
    }
    let fields = &mut column_mut(&mut next, path).fields;
    let field = fields.remove(from);
    fields.insert(to, field);
    next
}

pub fn delete_field(
    doc: &Document,
    field_id: &NodeId,
    row_id: &NodeId,
    column_id: &NodeId,
) -> Document {
    let mut next = doc.clone();
    let Some((s, r, c)) = column_path_in_row(doc, row_id, column_id) else {
        return next;
    };
    let Some(index) = doc.form.sections[s].rows[r].columns[c]
        .fields
        .iter()
        .position(|f| &f.id == field_id)
    else {
        return next;
    };
    column_mut(&mut next, (s, r, c)).fields.remove(index);
    next
}

pub fn update_field(doc: &Document, field_id: &NodeId, patch: &FieldPatch) -> Document {
    let mut next = doc.clone();
    let Some(location) = doc.form.locate_field(field_id) else {
        return next;
    };
    let Some(path) = column_path(doc, &location.column_id) else {
        return next;
    };
    let field = Arc::make_mut(&mut column_mut(&mut next, path).fields[location.index]);
    patch.apply(field);
    next
}
