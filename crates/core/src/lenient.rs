// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Lenient deserializers for server fields with loose JSON typing.
//!
//! The server is not consistent about ids: the same mailbox id may arrive as
//! `42` in one message and `"42"` in another.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn value_to_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Deserializes an id given as a JSON number or a numeric string.
pub fn id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_id(&value).ok_or_else(|| D::Error::custom(format!("invalid id: {}", value)))
}

/// Deserializes a list of ids; entries that are not ids are rejected.
pub fn ids<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .iter()
        .map(|v| value_to_id(v).ok_or_else(|| D::Error::custom(format!("invalid id: {}", v))))
        .collect()
}

/// Deserializes a read flag given as a bool or as 0/1; null means absent.
pub fn read_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|f| f != 0.0))),
        Some(Value::String(s)) => Ok(Some(!matches!(s.as_str(), "" | "0" | "false"))),
        Some(other) => Err(D::Error::custom(format!("invalid read flag: {}", other))),
    }
}

/// Deserializes an array, treating anything else (including null) as empty.
pub fn vec_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}
