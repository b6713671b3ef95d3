use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::admin::response::{success, ApiError};
use crate::admin::AppState;
use crate::config::validation::coerce_number;
use crate::config::Section;

#[derive(Debug, Deserialize)]
pub struct SetRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct GetRequest {
    #[serde(rename = "type", default)]
    pub kind: String,
}

pub async fn ping() -> &'static str {
    "pong"
}

/// `POST /api/v1/config/get`
pub async fn get_config(
    State(state): State<AppState>,
    payload: Result<Json<GetRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let section: Section = req.kind.parse().map_err(ApiError::UnknownType)?;

    let value = state.settings.section(section, true)?;
    Ok(success(&*value))
}

/// `POST /api/v1/config/set`
///
/// Object sections are shallow-merged over their current value before the
/// whole file is rewritten. `groups` and `privates` replace the list.
pub async fn set_config(
    State(state): State<AppState>,
    payload: Result<Json<SetRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let data = match req.data {
        Some(Value::Object(map)) => map,
        _ => return Err(ApiError::Validation("invalid config data".to_string())),
    };
    let section: Section = req.kind.parse().map_err(ApiError::UnknownType)?;

    let payload = match section {
        Section::Config | Section::Adapter | Section::Render | Section::Pm2 | Section::Redis => {
            let current = state.settings.section(section, true)?;
            shallow_merge(&current, data)
        }
        Section::Env => Value::Object(data),
        Section::Groups => coerce_entries(&data, "groups", &["cd", "userCD"])?,
        Section::Privates => coerce_entries(&data, "privates", &["cd"])?,
    };

    if !state.settings.set(section, &payload)? {
        return Err(ApiError::NotFound(format!("config file for {} does not exist", section)));
    }

    if section == Section::Env {
        state.log_level.update(None);
    }

    tracing::info!(section = %section, "Config saved via admin API");
    Ok(success(json!({ "message": "config saved" })))
}

fn shallow_merge(current: &Value, data: Map<String, Value>) -> Value {
    let mut merged = current.as_object().cloned().unwrap_or_default();
    merged.extend(data);
    Value::Object(merged)
}

/// Pull `data[key]`, require a list of objects and coerce `fields` to numbers.
fn coerce_entries(data: &Map<String, Value>, key: &str, fields: &[&str]) -> Result<Value, ApiError> {
    let entries = data
        .get(key)
        .and_then(Value::as_array)
        .filter(|items| items.iter().all(Value::is_object))
        .ok_or_else(|| ApiError::Validation(format!("{} must be a list of objects", key)))?;

    let coerced = entries
        .iter()
        .filter_map(Value::as_object)
        .map(|entry| {
            let mut entry = entry.clone();
            for field in fields {
                let number = coerce_number(entry.get(*field));
                entry.insert(field.to_string(), number);
            }
            Value::Object(entry)
        })
        .collect();

    Ok(Value::Array(coerced))
}
