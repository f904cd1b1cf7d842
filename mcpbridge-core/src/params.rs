//! Small helpers for pulling typed values out of a request's `params`
//! map, with the default-handling the handler contract in §4.5 spells
//! out per-field.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::FacadeError;

pub fn i64_param(params: &HashMap<String, Value>, key: &str, default: i64) -> i64 {
    params.get(key).and_then(Value::as_i64).unwrap_or(default)
}

pub fn f64_param(params: &HashMap<String, Value>, key: &str, default: f64) -> f64 {
    params.get(key).and_then(Value::as_f64).unwrap_or(default)
}

pub fn bool_param(params: &HashMap<String, Value>, key: &str, default: bool) -> bool {
    params.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub fn str_param(params: &HashMap<String, Value>, key: &str, default: &str) -> String {
    params
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

pub fn opt_str_param(params: &HashMap<String, Value>, key: &str) -> Option<String> {
    params.get(key).and_then(Value::as_str).map(str::to_string)
}

pub fn required_i64(params: &HashMap<String, Value>, key: &str) -> Result<i64, FacadeError> {
    params
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| FacadeError::bad_value(format!("missing or non-integer '{}'", key)))
}

pub fn required_f64(params: &HashMap<String, Value>, key: &str) -> Result<f64, FacadeError> {
    params
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| FacadeError::bad_value(format!("missing or non-numeric '{}'", key)))
}

pub fn required_bool(params: &HashMap<String, Value>, key: &str) -> Result<bool, FacadeError> {
    params
        .get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| FacadeError::bad_value(format!("missing or non-boolean '{}'", key)))
}

pub fn required_str(params: &HashMap<String, Value>, key: &str) -> Result<String, FacadeError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FacadeError::bad_value(format!("missing or non-string '{}'", key)))
}

pub fn required_value<'a>(
    params: &'a HashMap<String, Value>,
    key: &str,
) -> Result<&'a Value, FacadeError> {
    params
        .get(key)
        .ok_or_else(|| FacadeError::bad_value(format!("missing '{}'", key)))
}
