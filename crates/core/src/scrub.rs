//! Normalization applied to semi-structured payloads before they are stored.
//!
//! Applied on write only; payloads restored from storage are left as-is.

use serde_json::{Map, Value};

/// Keys managed by the server that must never be stored inside `Brief.data`.
pub const BRIEF_FOREIGN_FIELDS: &[&str] = &[
    "id",
    "frameworkSlug",
    "frameworkName",
    "frameworkFramework",
    "frameworkStatus",
    "lot",
    "lotSlug",
    "lotName",
    "status",
    "users",
    "isACopy",
    "createdAt",
    "updatedAt",
    "publishedAt",
];

/// Keys managed by the server that must never be stored inside `BriefResponse.data`.
pub const BRIEF_RESPONSE_FOREIGN_FIELDS: &[&str] = &[
    "id",
    "supplierId",
    "supplierName",
    "briefId",
    "status",
    "createdAt",
    "submittedAt",
];

/// Trim every string value recursively.
///
/// Strings directly inside sequences that end up empty are removed from the
/// sequence; empty strings held by mapping keys are kept.
pub fn strip_whitespace(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(strip_whitespace)
                .filter(|item| !matches!(item, Value::String(s) if s.is_empty()))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (key, strip_whitespace(item)))
                .collect(),
        ),
        other => other,
    }
}

/// Drop null-valued keys and null sequence items, recursively.
pub fn purge_nulls(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(purge_nulls)
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, item)| !item.is_null())
                .map(|(key, item)| (key, purge_nulls(item)))
                .collect(),
        ),
        other => other,
    }
}

/// Remove top-level keys listed in `fields`.
pub fn drop_foreign_fields(value: Value, fields: &[&str]) -> Value {
    match value {
        Value::Object(mut map) => {
            for field in fields {
                map.remove(*field);
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Whitespace trim plus null purge, coercing non-mapping input to an empty mapping.
pub fn scrub_payload(value: Value) -> Value {
    match purge_nulls(strip_whitespace(value)) {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    }
}

/// [`scrub_payload`] followed by removal of server-managed keys.
pub fn scrub_payload_without(value: Value, foreign_fields: &[&str]) -> Value {
    drop_foreign_fields(scrub_payload(value), foreign_fields)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn nulls_are_dropped() {
        assert_eq!(
            scrub_payload(json!({"foo": "bar", "bar": null})),
            json!({"foo": "bar"})
        );
    }

    #[test]
    fn top_level_whitespace_is_trimmed_and_empty_strings_kept() {
        assert_eq!(
            scrub_payload(json!({"foo": " bar ", "bar": "", "other": "  "})),
            json!({"foo": "bar", "bar": "", "other": ""})
        );
    }

    #[test]
    fn nested_sequences_and_mappings_are_trimmed() {
        assert_eq!(
            scrub_payload(json!({"foo": " bar ", "bar": ["", "  foo", {"evidence": " some "}]})),
            json!({"foo": "bar", "bar": ["foo", {"evidence": "some"}]})
        );
    }

    #[test]
    fn nested_nulls_are_dropped() {
        assert_eq!(
            scrub_payload(json!({"a": {"b": null, "c": 1}, "d": [null, false, 0]})),
            json!({"a": {"c": 1}, "d": [false, 0]})
        );
    }

    #[test]
    fn foreign_fields_are_removed() {
        let scrubbed = scrub_payload_without(
            json!({
                "frameworkSlug": "test",
                "frameworkName": "test",
                "lot": "test",
                "lotName": "test",
                "title": "test",
            }),
            BRIEF_FOREIGN_FIELDS,
        );
        assert_eq!(scrubbed, json!({"title": "test"}));

        let scrubbed = scrub_payload_without(
            json!({"foo": "bar", "briefId": 5, "supplierId": 100}),
            BRIEF_RESPONSE_FOREIGN_FIELDS,
        );
        assert_eq!(scrubbed, json!({"foo": "bar"}));
    }

    #[test]
    fn non_mapping_payload_becomes_empty_mapping() {
        assert_eq!(scrub_payload(json!(null)), json!({}));
        assert_eq!(scrub_payload(json!(["a"])), json!({}));
    }
}
