//! Conversion of raw result nodes into canonical activity events.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ActivityError;
use super::queries::QueryDescriptor;

/// Source tag recorded on every event produced from GitHub.
pub const GITHUB_SOURCE: &str = "github";

/// One unit of organisation activity.
///
/// Serialises as
/// `{ eventTime, eventType, contributor, amount, details: { source, data } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    /// When the activity happened, if the node carried a timestamp.
    pub event_time: Option<String>,
    /// Activity label from the query descriptor.
    pub event_type: String,
    /// Login credited with the activity, if resolvable.
    pub contributor: Option<String>,
    /// Always 1; aggregation happens downstream.
    pub amount: u32,
    /// Flattened source node.
    pub details: EventDetails,
}

/// Source payload preserved alongside the promoted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Where the event came from.
    pub source: String,
    /// The raw node, flattened to dotted keys.
    pub data: Map<String, Value>,
}

/// Flattens a result node into dotted-path keys.
///
/// Nested objects contribute `parent.child` keys and arrays contribute
/// `parent.0`, `parent.1`, ... keys; array elements that are themselves
/// objects or arrays are flattened further. Empty objects and arrays vanish.
///
/// # Errors
///
/// Returns [`ActivityError::MalformedNode`] when `node` is not a JSON object.
pub fn flatten_node(node: &Value) -> Result<Map<String, Value>, ActivityError> {
    let object = node.as_object().ok_or_else(|| ActivityError::MalformedNode {
        message: format!("expected an object, found {}", json_kind(node)),
    })?;

    let mut flattened = Map::new();
    for (key, value) in object {
        flatten_into(key, value, &mut flattened);
    }
    Ok(flattened)
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Map<String, Value>) {
    match value {
        Value::Object(object) => {
            for (key, child) in object {
                flatten_into(&format!("{prefix}.{key}"), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(&format!("{prefix}.{index}"), child, out);
            }
        }
        scalar => {
            out.insert(prefix.to_owned(), scalar.clone());
        }
    }
}

/// Builds a canonical event from a raw result node.
///
/// Timestamp and contributor are looked up in the flattened node using the
/// descriptor's field paths. Missing, null, or empty values become `None`.
///
/// # Errors
///
/// Returns [`ActivityError::MalformedNode`] when `node` is not a JSON object.
pub fn normalize(
    descriptor: &QueryDescriptor,
    node: &Value,
) -> Result<CanonicalEvent, ActivityError> {
    let data = flatten_node(node)?;
    let event_time = scalar_text(data.get(descriptor.timestamp_field()));
    let contributor = scalar_text(data.get(descriptor.contributor_field()));

    Ok(CanonicalEvent {
        event_time,
        event_type: descriptor.name().to_owned(),
        contributor,
        amount: 1,
        details: EventDetails {
            source: GITHUB_SOURCE.to_owned(),
            data,
        },
    })
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::{GITHUB_SOURCE, flatten_node, normalize};
    use crate::github::error::ActivityError;
    use crate::github::queries::{ISSUES, MERGED_PULL_REQUESTS};

    #[test]
    fn flattens_nested_objects_and_lists() {
        let flattened = flatten_node(&json!({ "a": { "b": 1, "c": [10, 20] } }))
            .expect("object should flatten");

        assert_eq!(
            Value::Object(flattened),
            json!({ "a.b": 1, "a.c.0": 10, "a.c.1": 20 })
        );
    }

    #[test]
    fn flattens_objects_inside_lists() {
        let flattened = flatten_node(&json!({
            "fundingRounds": ["gr15", "gr16"],
            "labels": [{ "name": "bug" }],
            "empty": {},
            "none": []
        }))
        .expect("object should flatten");

        assert_eq!(
            Value::Object(flattened),
            json!({
                "fundingRounds.0": "gr15",
                "fundingRounds.1": "gr16",
                "labels.0.name": "bug"
            })
        );
    }

    #[test]
    fn flatten_keeps_explicit_nulls() {
        let flattened =
            flatten_node(&json!({ "mergedBy": null })).expect("object should flatten");
        assert_eq!(flattened.get("mergedBy"), Some(&Value::Null));
    }

    #[test]
    fn normalize_promotes_descriptor_fields() {
        let node = json!({
            "createdAt": "2023-01-02T00:00:00Z",
            "mergedAt": "2023-01-03T00:00:00Z",
            "mergedBy": { "login": "maintainer" },
            "author": { "login": "contributor" },
            "title": "Fix things",
            "repository": { "name": "widgets" }
        });

        let event = normalize(&MERGED_PULL_REQUESTS, &node).expect("node should normalise");

        assert_eq!(event.event_time.as_deref(), Some("2023-01-03T00:00:00Z"));
        assert_eq!(event.event_type, "merged PR");
        assert_eq!(event.contributor.as_deref(), Some("maintainer"));
        assert_eq!(event.amount, 1);
        assert_eq!(event.details.source, GITHUB_SOURCE);
        assert_eq!(
            event.details.data.get("repository.name"),
            Some(&json!("widgets"))
        );
    }

    #[rstest]
    #[case::absent_path(json!({ "createdAt": "2023-01-02T00:00:00Z" }))]
    #[case::null_author(json!({ "createdAt": "2023-01-02T00:00:00Z", "author": null }))]
    #[case::empty_login(json!({ "createdAt": "2023-01-02T00:00:00Z", "author": { "login": "" } }))]
    fn missing_contributor_becomes_none(#[case] node: Value) {
        let event = normalize(&ISSUES, &node).expect("node should normalise");

        assert_eq!(event.contributor, None);
        assert_eq!(event.event_time.as_deref(), Some("2023-01-02T00:00:00Z"));
    }

    #[test]
    fn missing_timestamp_becomes_none() {
        let event = normalize(&ISSUES, &json!({ "title": "partial" }))
            .expect("node should normalise");
        assert_eq!(event.event_time, None);
    }

    #[rstest]
    #[case::null(Value::Null)]
    #[case::string(json!("oops"))]
    #[case::array(json!([1, 2]))]
    fn non_object_nodes_are_malformed(#[case] node: Value) {
        let error = normalize(&ISSUES, &node).expect_err("node should be rejected");
        assert!(
            matches!(error, ActivityError::MalformedNode { .. }),
            "expected MalformedNode, got {error:?}"
        );
    }

    #[test]
    fn events_serialise_with_camel_case_keys() {
        let event = normalize(&ISSUES, &json!({ "createdAt": "2023-01-02T00:00:00Z" }))
            .expect("node should normalise");

        let value = serde_json::to_value(&event).expect("event should serialise");

        assert_eq!(
            value,
            json!({
                "eventTime": "2023-01-02T00:00:00Z",
                "eventType": "issue",
                "contributor": null,
                "amount": 1,
                "details": {
                    "source": "github",
                    "data": { "createdAt": "2023-01-02T00:00:00Z" }
                }
            })
        );
    }
}
