use crate::config::ApiConfig;
use crate::editor::{self, Edit};
use crate::gateway::{FormsApi, ReqwestTransport};
use crate::ids::UuidIds;
use crate::model::Document;
use crate::preview::{self, FieldValues};
use crate::registry;
use crate::wire::{self, WireForm};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

// --- Helpers ---

fn get_api(config: &Bound<'_, PyDict>) -> PyResult<FormsApi<ReqwestTransport>> {
    let base_url = config
        .get_item("base_url")?
        .ok_or_else(|| PyValueError::new_err("Missing 'base_url' in api config"))?
        .extract::<String>()?;

    let config = ApiConfig::from_uri(&base_url).map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(FormsApi::new(config, ReqwestTransport::new()))
}

fn parse_json<T: DeserializeOwned>(what: &str, raw: &str) -> PyResult<T> {
    serde_json::from_str(raw).map_err(|e| PyValueError::new_err(format!("Invalid {}: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

/// Hands a serialisable value to Python as native dicts and lists.
fn to_py<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    let raw = to_json(value)?;
    let obj = py.import("json")?.call_method1("loads", (raw,))?;
    Ok(obj.unbind())
}

// --- Editor ---

#[pyfunction]
fn new_document() -> PyResult<String> {
    to_json(&editor::new_document(&mut UuidIds))
}

#[pyfunction]
fn apply_edit(document: String, edit: String) -> PyResult<String> {
    let doc: Document = parse_json("document", &document)?;
    let edit: Edit = parse_json("edit", &edit)?;
    to_json(&editor::apply(&doc, &edit, &mut UuidIds))
}

#[pyfunction]
fn builtin_palette() -> PyResult<String> {
    to_json(&registry::builtin_palette())
}

#[pyfunction]
#[pyo3(signature = (document, values=None, mobile=false))]
fn render_preview(document: String, values: Option<String>, mobile: bool) -> PyResult<String> {
    let doc: Document = parse_json("document", &document)?;
    let values: FieldValues = match values {
        Some(raw) => parse_json("values", &raw)?,
        None => FieldValues::new(),
    };
    to_json(&preview::render(&doc.form, &values, mobile))
}

// --- Wire format ---

#[pyfunction]
fn document_to_wire(document: String) -> PyResult<String> {
    let doc: Document = parse_json("document", &document)?;
    wire::to_wire_json_pretty(&doc.form).map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

#[pyfunction]
fn document_from_wire(record: String) -> PyResult<String> {
    let record: WireForm = parse_json("form record", &record)?;
    let form = wire::from_wire(&record, &mut UuidIds);
    to_json(&Document::new(form))
}

// --- Gateway ---

#[pyfunction]
fn list_forms<'a>(py: Python<'a>, api_config: Bound<'a, PyDict>) -> PyResult<Bound<'a, PyAny>> {
    let api = get_api(&api_config)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let forms = api
            .list_forms()
            .await
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Python::with_gil(|py| to_py(py, &forms))
    })
}

#[pyfunction]
fn save_form<'a>(
    py: Python<'a>,
    api_config: Bound<'a, PyDict>,
    document: String,
) -> PyResult<Bound<'a, PyAny>> {
    let api = get_api(&api_config)?;
    let doc: Document = parse_json("document", &document)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let saved = api
            .save(&doc.form)
            .await
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Python::with_gil(|py| to_py(py, &saved))
    })
}

#[pyfunction]
fn delete_form<'a>(
    py: Python<'a>,
    api_config: Bound<'a, PyDict>,
    form_id: i64,
) -> PyResult<Bound<'a, PyAny>> {
    let api = get_api(&api_config)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let outcome = api
            .soft_delete_form(form_id)
            .await
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Ok(outcome.success)
    })
}

#[pyfunction]
fn list_tables<'a>(py: Python<'a>, api_config: Bound<'a, PyDict>) -> PyResult<Bound<'a, PyAny>> {
    let api = get_api(&api_config)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let tables = api
            .fetch_table_names()
            .await
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Ok(tables)
    })
}

#[pyfunction]
fn table_palette<'a>(
    py: Python<'a>,
    api_config: Bound<'a, PyDict>,
    table_name: String,
) -> PyResult<Bound<'a, PyAny>> {
    let api = get_api(&api_config)?;
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let columns = api
            .fetch_table_fields(&table_name)
            .await
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        let palette = registry::palette_with_table_fields(&columns);
        Python::with_gil(|py| to_py(py, &palette))
    })
}

#[pyfunction]
#[pyo3(signature = (api_config, document, values, record_id=None))]
fn submit_field_values<'a>(
    py: Python<'a>,
    api_config: Bound<'a, PyDict>,
    document: String,
    values: String,
    record_id: Option<i64>,
) -> PyResult<Bound<'a, PyAny>> {
    let api = get_api(&api_config)?;
    let doc: Document = parse_json("document", &document)?;
    let values: FieldValues = parse_json("values", &values)?;
    let payload = wire::submission_payload(&doc.form, &values, record_id.map(Value::from));
    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let Some(payload) = payload else {
            return Python::with_gil(|py| Ok(py.None()));
        };
        let val = api
            .submit_field_values(&payload)
            .await
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Python::with_gil(|py| to_py(py, &val))
    })
}

/// A Python module implemented in Rust.
#[pymodule]
fn _formcraft_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(new_document, m)?)?;
    m.add_function(wrap_pyfunction!(apply_edit, m)?)?;
    m.add_function(wrap_pyfunction!(builtin_palette, m)?)?;
    m.add_function(wrap_pyfunction!(render_preview, m)?)?;

    m.add_function(wrap_pyfunction!(document_to_wire, m)?)?;
    m.add_function(wrap_pyfunction!(document_from_wire, m)?)?;

    m.add_function(wrap_pyfunction!(list_forms, m)?)?;
    m.add_function(wrap_pyfunction!(save_form, m)?)?;
    m.add_function(wrap_pyfunction!(delete_form, m)?)?;
    m.add_function(wrap_pyfunction!(list_tables, m)?)?;
    m.add_function(wrap_pyfunction!(table_palette, m)?)?;
    m.add_function(wrap_pyfunction!(submit_field_values, m)?)?;

    Ok(())
}
