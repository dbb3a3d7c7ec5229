//! Web form routes

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::AppState;
use storage::Record;

/// Record table plus entry form
#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    records: &'a [Record],
}

/// Entry form fields, from the urlencoded body or the query string
#[derive(Debug, Default, Deserialize)]
pub struct RecordForm {
    #[serde(rename = "deviceName")]
    pub device_name: Option<String>,
    pub voltage: Option<String>,
    pub date: Option<String>,
}

impl RecordForm {
    /// Body values win over query values; a field missing from both is empty.
    fn merge(body: RecordForm, query: RecordForm) -> (String, String, String) {
        (
            body.device_name.or(query.device_name).unwrap_or_default(),
            body.voltage.or(query.voltage).unwrap_or_default(),
            body.date.or(query.date).unwrap_or_default(),
        )
    }
}

/// Render all records
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let records = state.store.list_records().await.map_err(AppError::List)?;
    let page = IndexTemplate { records: &records }.render()?;

    Ok(Html(page))
}

/// Store a submitted record and send the browser back to the list
///
/// A body that is not a urlencoded form is treated as empty rather than
/// rejected.
pub async fn create_record(
    State(state): State<AppState>,
    query: Option<Query<RecordForm>>,
    body: Option<Form<RecordForm>>,
) -> Result<Redirect, AppError> {
    let (device_name, voltage, date) = RecordForm::merge(
        body.map(|Form(form)| form).unwrap_or_default(),
        query.map(|Query(form)| form).unwrap_or_default(),
    );

    state
        .store
        .append_record(&device_name, &voltage, &date)
        .await
        .map_err(AppError::Save)?;

    Ok(Redirect::to("/"))
}
