mod common;
use _formcraft_core::editor::{self, Edit, FieldPatch};
use _formcraft_core::ids::SequentialIds;
use _formcraft_core::model::{Document, FieldKind, NodeId, MAX_COLUMNS};
use _formcraft_core::registry::PaletteField;
use common::{first_slot, setup_document};
use std::sync::Arc;

#[test]
fn test_editor_new_document_has_one_selected_section() -> anyhow::Result<()> {
    let (doc, _) = setup_document();

    assert_eq!(doc.form.sections.len(), 1);
    let section = &doc.form.sections[0];
    assert_eq!(section.name, "Section 1");
    assert_eq!(section.rows.len(), 1);
    assert_eq!(section.rows[0].name, "Row 1");
    assert_eq!(section.rows[0].columns.len(), 1);
    assert_eq!(section.rows[0].columns[0].name, "Column 1");
    assert_eq!(doc.ui.active_section, Some(section.id.clone()));
    assert_eq!(doc.form.table_name, "product_product");
    Ok(())
}

#[test]
fn test_editor_add_section_selects_new_section() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let next = editor::add_section(&doc, &mut ids);

    assert_eq!(doc.form.sections.len(), 1);
    assert_eq!(next.form.sections.len(), 2);
    assert_eq!(next.form.sections[1].name, "Section 2");
    assert_eq!(next.active_section().map(|s| s.name.as_str()), Some("Section 2"));
    assert!(Arc::ptr_eq(&doc.form.sections[0], &next.form.sections[0]));
    Ok(())
}

#[test]
fn test_editor_delete_active_section_selects_first_remaining() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let doc = editor::add_section(&doc, &mut ids);
    let doc = editor::add_section(&doc, &mut ids);
    let first = doc.form.sections[0].id.clone();
    let active = doc.form.sections[2].id.clone();
    assert_eq!(doc.ui.active_section, Some(active.clone()));

    let next = editor::delete_section(&doc, &active);
    assert_eq!(next.form.sections.len(), 2);
    assert_eq!(next.ui.active_section, Some(first));
    Ok(())
}

#[test]
fn test_editor_delete_inactive_section_keeps_selection() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let doc = editor::add_section(&doc, &mut ids);
    let first = doc.form.sections[0].id.clone();
    let active = doc.ui.active_section.clone();

    let next = editor::delete_section(&doc, &first);
    assert_eq!(next.form.sections.len(), 1);
    assert_eq!(next.ui.active_section, active);
    Ok(())
}

#[test]
fn test_editor_delete_last_section_clears_selection() -> anyhow::Result<()> {
    let (doc, _) = setup_document();
    let only = doc.form.sections[0].id.clone();

    let next = editor::delete_section(&doc, &only);
    assert!(next.form.sections.is_empty());
    assert_eq!(next.ui.active_section, None);
    Ok(())
}

#[test]
fn test_editor_unknown_ids_are_no_ops() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let missing = NodeId::from("missing");

    assert_eq!(editor::delete_section(&doc, &missing), doc);
    assert_eq!(editor::rename_section(&doc, &missing, "x"), doc);
    assert_eq!(editor::toggle_collapse(&doc, &missing), doc);
    assert_eq!(editor::select_section(&doc, &missing), doc);
    assert_eq!(editor::delete_row(&doc, &missing), doc);
    assert_eq!(editor::add_column(&doc, &missing, &mut ids), doc);
    assert_eq!(editor::delete_column(&doc, &missing, &missing), doc);
    assert_eq!(editor::move_field(&doc, &missing, 0, 1), doc);
    assert_eq!(editor::update_field(&doc, &missing, &FieldPatch::label("x")), doc);

    let template = PaletteField::of_kind(FieldKind::Text);
    let (next, id) = editor::add_field(&doc, &template, &missing, &missing, &mut ids);
    assert_eq!(next, doc);
    assert_eq!(id, None);
    Ok(())
}

#[test]
fn test_editor_rename_and_toggle_section() -> anyhow::Result<()> {
    let (doc, _) = setup_document();
    let id = doc.form.sections[0].id.clone();

    let doc = editor::rename_section(&doc, &id, "Contact details");
    let doc = editor::toggle_collapse(&doc, &id);
    assert_eq!(doc.form.sections[0].name, "Contact details");
    assert!(doc.form.sections[0].collapsed);

    let doc = editor::toggle_collapse(&doc, &id);
    assert!(!doc.form.sections[0].collapsed);
    Ok(())
}

#[test]
fn test_editor_add_row_targets_active_section() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let doc = editor::add_section(&doc, &mut ids);
    let first = doc.form.sections[0].id.clone();
    let doc = editor::select_section(&doc, &first);

    let next = editor::add_row(&doc, &mut ids);
    assert_eq!(next.form.sections[0].rows.len(), 2);
    assert_eq!(next.form.sections[0].rows[1].name, "Row 2");
    assert_eq!(next.form.sections[0].rows[1].columns.len(), 1);
    assert_eq!(next.form.sections[1].rows.len(), 1);
    Ok(())
}

#[test]
fn test_editor_add_row_without_sections_is_no_op() -> anyhow::Result<()> {
    let mut ids = SequentialIds::new();
    let doc = Document::default();
    assert_eq!(editor::add_row(&doc, &mut ids), doc);
    Ok(())
}

#[test]
fn test_editor_add_column_is_capped() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let (row_id, _) = first_slot(&doc)?;

    let mut current = doc;
    for _ in 0..5 {
        current = editor::add_column(&current, &row_id, &mut ids);
    }
    let columns = &current.form.sections[0].rows[0].columns;
    assert_eq!(columns.len(), MAX_COLUMNS);
    assert_eq!(columns[2].name, "Column 3");

    let again = editor::add_column(&current, &row_id, &mut ids);
    assert_eq!(again, current);
    Ok(())
}

#[test]
fn test_editor_delete_column_drops_its_fields() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let (row_id, first_col) = first_slot(&doc)?;
    let doc = editor::add_column(&doc, &row_id, &mut ids);
    let second_col = doc.form.sections[0].rows[0].columns[1].id.clone();

    let text = PaletteField::of_kind(FieldKind::Text);
    let (doc, kept) = editor::add_field(&doc, &text, &row_id, &first_col, &mut ids);
    let (doc, dropped) = editor::add_field(&doc, &text, &row_id, &second_col, &mut ids);
    let kept = kept.ok_or_else(|| anyhow::anyhow!("field not added"))?;
    let dropped = dropped.ok_or_else(|| anyhow::anyhow!("field not added"))?;

    let next = editor::delete_column(&doc, &row_id, &second_col);
    assert_eq!(next.form.sections[0].rows[0].columns.len(), 1);
    assert!(next.form.field(&kept).is_some());
    assert!(next.form.field(&dropped).is_none());
    assert!(!next.form.all_ids().contains(&second_col));
    Ok(())
}

#[test]
fn test_editor_delete_column_keeps_last_column() -> anyhow::Result<()> {
    let (doc, _) = setup_document();
    let (row_id, col_id) = first_slot(&doc)?;
    assert_eq!(editor::delete_column(&doc, &row_id, &col_id), doc);
    Ok(())
}

#[test]
fn test_editor_delete_row_removes_subtree() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let (row_id, col_id) = first_slot(&doc)?;
    let (doc, field) = editor::add_field(
        &doc,
        &PaletteField::of_kind(FieldKind::Checkbox),
        &row_id,
        &col_id,
        &mut ids,
    );
    let field = field.ok_or_else(|| anyhow::anyhow!("field not added"))?;

    let next = editor::delete_row(&doc, &row_id);
    assert!(next.form.sections[0].rows.is_empty());
    assert!(next.form.field(&field).is_none());
    Ok(())
}

#[test]
fn test_editor_add_field_applies_kind_defaults() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let (row_id, col_id) = first_slot(&doc)?;

    let (next, id) = editor::add_field(
        &doc,
        &PaletteField::of_kind(FieldKind::Date),
        &row_id,
        &col_id,
        &mut ids,
    );
    let id = id.ok_or_else(|| anyhow::anyhow!("field not added"))?;
    let field = next
        .form
        .field(&id)
        .ok_or_else(|| anyhow::anyhow!("field missing"))?;

    assert_eq!(field.kind(), &FieldKind::Date);
    assert_eq!(field.label(), "date Label");
    assert_eq!(field.config.placeholder, "Enter date");
    assert_eq!(field.data_type, "date");
    assert_eq!(field.max_length, 255);
    assert_eq!(field.db_column_name, id.to_string().replace('-', "_"));
    assert_eq!(field.column, None);
    assert!(doc.form.fields().next().is_none());
    Ok(())
}

#[test]
fn test_editor_added_field_ids_are_unique() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let (row_id, col_id) = first_slot(&doc)?;

    let mut current = doc;
    for kind in [FieldKind::Text, FieldKind::Text, FieldKind::Date, FieldKind::Label] {
        let template = PaletteField::of_kind(kind);
        current = editor::add_field(&current, &template, &row_id, &col_id, &mut ids).0;
    }
    let mut all = current.form.all_ids();
    let total = all.len();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), total);
    Ok(())
}

#[test]
fn test_editor_move_field_reorders_within_column() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let (row_id, col_id) = first_slot(&doc)?;
    let mut current = doc;
    for label in ["A", "B", "C"] {
        let template = PaletteField::new(FieldKind::Text, label);
        current = editor::add_field(&current, &template, &row_id, &col_id, &mut ids).0;
    }

    let moved = editor::move_field(&current, &col_id, 0, 2);
    let labels: Vec<&str> = moved.form.fields().map(|f| f.label()).collect();
    assert_eq!(labels, vec!["B", "C", "A"]);

    assert_eq!(editor::move_field(&current, &col_id, 1, 1), current);
    assert_eq!(editor::move_field(&current, &col_id, 0, 3), current);
    assert_eq!(editor::move_field(&current, &col_id, 5, 0), current);
    Ok(())
}

#[test]
fn test_editor_update_field_then_delete() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let (row_id, col_id) = first_slot(&doc)?;
    let (doc, id) = editor::add_field(
        &doc,
        &PaletteField::of_kind(FieldKind::Text),
        &row_id,
        &col_id,
        &mut ids,
    );
    let id = id.ok_or_else(|| anyhow::anyhow!("field not added"))?;

    let patch = FieldPatch {
        required: Some(true),
        max_length: Some(40),
        ..FieldPatch::label("Name")
    };
    let updated = editor::update_field(&doc, &id, &patch);
    let field = updated
        .form
        .field(&id)
        .ok_or_else(|| anyhow::anyhow!("field missing"))?;
    assert_eq!(field.label(), "Name");
    assert!(field.config.required);
    assert_eq!(field.max_length, 40);
    assert_eq!(field.config.placeholder, "Enter text");

    let original = doc
        .form
        .field(&id)
        .ok_or_else(|| anyhow::anyhow!("field missing"))?;
    assert_eq!(original.label(), "text Label");

    let deleted = editor::delete_field(&updated, &id, &row_id, &col_id);
    assert!(deleted.form.field(&id).is_none());
    Ok(())
}

#[test]
fn test_editor_apply_dispatches_json_edits() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let section_id = doc.form.sections[0].id.clone();

    let edit: Edit = serde_json::from_value(serde_json::json!({
        "op": "rename_section",
        "section_id": section_id,
        "name": "Shipping"
    }))?;
    let doc = editor::apply(&doc, &edit, &mut ids);
    assert_eq!(doc.form.sections[0].name, "Shipping");

    let doc = editor::apply(&doc, &Edit::AddRow, &mut ids);
    assert_eq!(doc.form.sections[0].rows.len(), 2);
    Ok(())
}

#[test]
fn test_editor_restarted_generator_does_not_reuse_ids() -> anyhow::Result<()> {
    let doc = editor::new_document(&mut SequentialIds::new());
    let stored = serde_json::to_string(&doc)?;
    let restored: Document = serde_json::from_str(&stored)?;

    let mut ids = SequentialIds::new();
    let next = editor::add_section(&restored, &mut ids);
    let (row_id, col_id) = first_slot(&next)?;
    let next = editor::add_row(&next, &mut ids);
    let next = editor::add_column(&next, &row_id, &mut ids);
    let (next, field_id) = editor::add_field(
        &next,
        &PaletteField::of_kind(FieldKind::Text),
        &row_id,
        &col_id,
        &mut ids,
    );
    assert!(field_id.is_some());

    let mut all = next.form.all_ids();
    let total = all.len();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), total);

    let first = next.form.sections[0].id.clone();
    let added = next.form.sections[1].id.clone();
    assert_ne!(first, added);
    let after_delete = editor::delete_section(&next, &added);
    assert_eq!(after_delete.form.sections.len(), 1);
    assert_eq!(after_delete.form.sections[0].id, first);
    assert_eq!(after_delete.ui.active_section, Some(first));
    Ok(())
}

#[test]
fn test_editor_deserialized_stale_selection_is_repaired() -> anyhow::Result<()> {
    let (doc, mut ids) = setup_document();
    let mut stored = serde_json::to_value(&doc)?;
    stored["ui"]["active_section"] = serde_json::json!("section-gone");

    let restored: Document = serde_json::from_value(stored)?;
    assert_eq!(restored.ui.active_section, Some(doc.form.sections[0].id.clone()));

    let next = editor::add_row(&restored, &mut ids);
    assert_eq!(next.form.sections[0].rows.len(), 2);
    Ok(())
}
