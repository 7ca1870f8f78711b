//! Turns completed drag gestures into editor operations.

use crate::editor;
use crate::error::FormError;
use crate::ids::IdGenerator;
use crate::model::{Document, NodeId};
use crate::registry::PaletteField;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    FromPalette(PaletteField),
    ExistingField {
        field_id: NodeId,
        column_id: NodeId,
    },
}

/// Column a payload was released over. `over_field` is the placed field
/// under the pointer, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget {
    pub row_id: NodeId,
    pub column_id: NodeId,
    pub over_field: Option<NodeId>,
}

impl DropTarget {
    pub fn column(row_id: NodeId, column_id: NodeId) -> Self {
        Self {
            row_id,
            column_id,
            over_field: None,
        }
    }

    pub fn over(mut self, field_id: NodeId) -> Self {
        self.over_field = Some(field_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Inserted { document: Document, field_id: NodeId },
    Moved(Document),
    /// Valid drop that changes nothing, e.g. a field released onto itself.
    Unchanged,
    /// Payload thrown away without touching the document.
    Discarded,
}

impl DropOutcome {
    /// The document to continue with: the edited one, or `current`.
    pub fn into_document(self, current: &Document) -> Document {
        match self {
            DropOutcome::Inserted { document, .. } | DropOutcome::Moved(document) => document,
            DropOutcome::Unchanged | DropOutcome::Discarded => current.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Starting a new drag replaces any payload still held.
    pub fn begin_palette(&mut self, field: PaletteField) {
        self.state = DragState::FromPalette(field);
    }

    pub fn begin_existing(&mut self, doc: &Document, field_id: &NodeId) -> Result<(), FormError> {
        let location = doc
            .form
            .locate_field(field_id)
            .ok_or_else(|| FormError::NotFound {
                kind: "field",
                id: field_id.to_string(),
            })?;
        self.state = DragState::ExistingField {
            field_id: field_id.clone(),
            column_id: location.column_id,
        };
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Ends the gesture. The controller is idle afterwards whatever happens.
    pub fn drop_on(
        &mut self,
        doc: &Document,
        target: Option<&DropTarget>,
        ids: &mut dyn IdGenerator,
    ) -> DropOutcome {
        let state = std::mem::take(&mut self.state);
        let Some(target) = target else {
            debug!("drop outside any column, discarding payload");
            return DropOutcome::Discarded;
        };

        match state {
            DragState::Idle => DropOutcome::Discarded,
            DragState::FromPalette(template) => {
                match editor::add_field(doc, &template, &target.row_id, &target.column_id, ids) {
                    (document, Some(field_id)) => DropOutcome::Inserted { document, field_id },
                    (_, None) => {
                        debug!(column = %target.column_id, "drop target not found");
                        DropOutcome::Discarded
                    }
                }
            }
            DragState::ExistingField {
                field_id,
                column_id,
            } => {
                if target.column_id != column_id {
                    debug!(
                        field = %field_id,
                        from = %column_id,
                        to = %target.column_id,
                        "moving fields across columns is not supported"
                    );
                    return DropOutcome::Discarded;
                }
                let Some(column) = doc.form.column(&column_id) else {
                    return DropOutcome::Discarded;
                };
                let Some(from) = column.fields.iter().position(|f| f.id == field_id) else {
                    return DropOutcome::Discarded;
                };
                let to = target
                    .over_field
                    .as_ref()
                    .and_then(|over| column.fields.iter().position(|f| &f.id == over));
                match to {
                    Some(to) if to != from => {
                        DropOutcome::Moved(editor::move_field(doc, &column_id, from, to))
                    }
                    _ => DropOutcome::Unchanged,
                }
            }
        }
    }
}
