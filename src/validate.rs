//! Configuration validation
//!
//! A proposed configuration document is accepted in full or rejected with the
//! first violated property; nothing is ever partially applied. Rules run in a
//! fixed order: display name, neighbor list, node connectivity, public
//! address.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::config::{
    DEFAULT_DISPLAY_NAME, DEFAULT_PUBLIC_ADDRESS, MAX_NEIGHBORS, PROP_NAME, PROP_NEIGHBORS,
    PROP_PUBLIC_ADDRESS, PROP_REST_PASSWORD, PROP_REST_PORT,
};
use crate::node_client::NodeApi;
use crate::types::NeighborEntry;

static NAME_PATTERN: OnceLock<Regex> = OnceLock::new();
static ADDRESS_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Rejection of a proposed configuration, naming the violated property
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid property '{field}': {reason}.")]
pub struct InvalidProperty {
    pub field: String,
    pub reason: String,
}

impl InvalidProperty {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Run all rules against a proposed configuration document
///
/// The connectivity rule probes the node with the proposed port and password,
/// so a reachable node (or a stub) is required for acceptance.
pub async fn validate(
    proposed: &serde_json::Value,
    client: &dyn NodeApi,
) -> Result<(), InvalidProperty> {
    validate_name(proposed)?;
    validate_neighbors(proposed)?;
    validate_connectivity(proposed, client).await?;
    validate_public_address(proposed)?;
    Ok(())
}

fn validate_name(proposed: &serde_json::Value) -> Result<(), InvalidProperty> {
    let value = proposed
        .get(PROP_NAME)
        .ok_or_else(|| InvalidProperty::new(PROP_NAME, "not defined"))?;
    let name = value
        .as_str()
        .ok_or_else(|| InvalidProperty::new(PROP_NAME, "not a string"))?;

    let pattern =
        NAME_PATTERN.get_or_init(|| Regex::new(r"^.+\s\(ict-\d+\)$").unwrap());
    if !pattern.is_match(name) {
        return Err(InvalidProperty::new(
            PROP_NAME,
            "please follow the naming convention: \"<name> (ict-<number>)\"",
        ));
    }

    if name == DEFAULT_DISPLAY_NAME {
        return Err(InvalidProperty::new(
            PROP_NAME,
            format!("please assign your personal ict name instead of '{DEFAULT_DISPLAY_NAME}'"),
        ));
    }

    Ok(())
}

fn validate_neighbors(proposed: &serde_json::Value) -> Result<(), InvalidProperty> {
    let elements = neighbor_array(proposed)?;

    if elements.len() > MAX_NEIGHBORS {
        return Err(InvalidProperty::new(
            PROP_NEIGHBORS,
            format!("maximum {MAX_NEIGHBORS} neighbors allowed"),
        ));
    }

    for (i, element) in elements.iter().enumerate() {
        let object = match element.as_object() {
            Some(object) => object,
            None => {
                return Err(InvalidProperty::new(
                    PROP_NEIGHBORS,
                    format!("array element at index {i} is not an object"),
                ));
            }
        };

        if !object.get("address").map_or(false, |a| a.is_string()) {
            return Err(InvalidProperty::new(
                PROP_NEIGHBORS,
                format!("array element at index {i} does not specify an address"),
            ));
        }
    }

    Ok(())
}

async fn validate_connectivity(
    proposed: &serde_json::Value,
    client: &dyn NodeApi,
) -> Result<(), InvalidProperty> {
    let password = proposed
        .get(PROP_REST_PASSWORD)
        .ok_or_else(|| InvalidProperty::new(PROP_REST_PASSWORD, "not defined"))?
        .as_str()
        .ok_or_else(|| InvalidProperty::new(PROP_REST_PASSWORD, "not a string"))?;

    let port = proposed
        .get(PROP_REST_PORT)
        .ok_or_else(|| InvalidProperty::new(PROP_REST_PORT, "not defined"))?
        .as_u64()
        .and_then(|port| u16::try_from(port).ok())
        .filter(|port| *port != 0)
        .ok_or_else(|| InvalidProperty::new(PROP_REST_PORT, "not a valid port number"))?;

    if client.get_info(port, password).await.is_none() {
        return Err(InvalidProperty::new(
            "Ict REST API port/password",
            "Connectivity check with Ict REST API failed",
        ));
    }

    Ok(())
}

fn validate_public_address(proposed: &serde_json::Value) -> Result<(), InvalidProperty> {
    // The public address is optional; all other rules only apply once set
    let value = match proposed.get(PROP_PUBLIC_ADDRESS) {
        Some(value) => value,
        None => return Ok(()),
    };
    let address = value
        .as_str()
        .ok_or_else(|| InvalidProperty::new(PROP_PUBLIC_ADDRESS, "not a string"))?;

    if address.is_empty() {
        return Err(InvalidProperty::new(
            PROP_PUBLIC_ADDRESS,
            "the public ict \"address:port\" must be specified",
        ));
    }

    if address == DEFAULT_PUBLIC_ADDRESS {
        return Err(InvalidProperty::new(
            PROP_PUBLIC_ADDRESS,
            "set your own ict public address \"address:port\"",
        ));
    }

    let pattern =
        ADDRESS_PATTERN.get_or_init(|| Regex::new(r"^.{4,253}:.{1,5}$").unwrap());
    if !pattern.is_match(address) {
        return Err(InvalidProperty::new(
            PROP_PUBLIC_ADDRESS,
            "public address incorrectly formatted, expected format: \"address:port\"",
        ));
    }

    Ok(())
}

/// Decode the neighbor property into raw array elements
///
/// The GUI sends the list string-encoded; a plain array is accepted too.
fn neighbor_array(proposed: &serde_json::Value) -> Result<Vec<serde_json::Value>, InvalidProperty> {
    let value = proposed
        .get(PROP_NEIGHBORS)
        .ok_or_else(|| InvalidProperty::new(PROP_NEIGHBORS, "not defined"))?;

    let decoded = match value {
        serde_json::Value::String(encoded) => serde_json::from_str(encoded)
            .map_err(|_| InvalidProperty::new(PROP_NEIGHBORS, "not a valid JSON array"))?,
        other => other.clone(),
    };

    match decoded {
        serde_json::Value::Array(elements) => Ok(elements),
        _ => Err(InvalidProperty::new(PROP_NEIGHBORS, "not a valid JSON array")),
    }
}

/// Decode the neighbor property into typed entries
///
/// Used by the apply path once validation has passed.
pub(crate) fn neighbor_entries(
    proposed: &serde_json::Value,
) -> Result<Vec<NeighborEntry>, InvalidProperty> {
    let elements = neighbor_array(proposed)?;

    let mut entries = Vec::with_capacity(elements.len());
    for (i, element) in elements.into_iter().enumerate() {
        let entry: NeighborEntry = serde_json::from_value(element).map_err(|_| {
            InvalidProperty::new(
                PROP_NEIGHBORS,
                format!("array element at index {i} is not an object"),
            )
        })?;
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeConfigInfo, NodeInfo, RemoteNeighbor};

    struct StubNode {
        reachable: bool,
    }

    #[async_trait::async_trait]
    impl NodeApi for StubNode {
        async fn get_info(&self, _port: u16, _password: &str) -> Option<NodeInfo> {
            self.reachable.then(|| NodeInfo {
                version: "0.6".to_string(),
            })
        }

        async fn get_config(&self, _port: u16, _password: &str) -> Option<NodeConfigInfo> {
            None
        }

        async fn get_neighbors(&self, _port: u16, _password: &str) -> Option<Vec<RemoteNeighbor>> {
            None
        }
    }

    fn reachable() -> StubNode {
        StubNode { reachable: true }
    }

    fn valid_document() -> serde_json::Value {
        serde_json::json!({
            (PROP_REST_PORT): 2187,
            (PROP_REST_PASSWORD): "secret",
            (PROP_NAME): "alice (ict-1)",
            (PROP_NEIGHBORS): r#"[{"address":"10.0.0.1:1337"}]"#,
            (PROP_PUBLIC_ADDRESS): "node.example.org:1337",
        })
    }

    #[tokio::test]
    async fn test_valid_configuration_accepted() {
        assert!(validate(&valid_document(), &reachable()).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_neighbors_rejected() {
        let mut document = valid_document();
        document.as_object_mut().unwrap().remove(PROP_NEIGHBORS);

        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err, InvalidProperty::new(PROP_NEIGHBORS, "not defined"));
        assert_eq!(err.to_string(), "Invalid property 'Neighbors': not defined.");
    }

    #[tokio::test]
    async fn test_too_many_neighbors_rejected() {
        let mut document = valid_document();
        document[PROP_NEIGHBORS] = serde_json::json!(
            r#"[{"address":"a:1"},{"address":"b:1"},{"address":"c:1"},{"address":"d:1"}]"#
        );

        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err.reason, "maximum 3 neighbors allowed");
    }

    #[tokio::test]
    async fn test_scalar_neighbor_entry_rejected() {
        let mut document = valid_document();
        document[PROP_NEIGHBORS] = serde_json::json!("[17]");

        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err.reason, "array element at index 0 is not an object");
    }

    #[tokio::test]
    async fn test_entry_without_address_rejected() {
        let mut document = valid_document();
        document[PROP_NEIGHBORS] = serde_json::json!(r#"[{"publicAddress":"a.example:1"}]"#);

        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err.reason, "array element at index 0 does not specify an address");
    }

    #[tokio::test]
    async fn test_garbled_neighbors_rejected() {
        let mut document = valid_document();
        document[PROP_NEIGHBORS] = serde_json::json!("this is not json");

        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err.reason, "not a valid JSON array");
    }

    #[tokio::test]
    async fn test_plain_array_neighbors_accepted() {
        let mut document = valid_document();
        document[PROP_NEIGHBORS] = serde_json::json!([{"address": "10.0.0.1:1337"}]);

        assert!(validate(&document, &reachable()).await.is_ok());
    }

    #[tokio::test]
    async fn test_default_name_rejected() {
        let mut document = valid_document();
        document[PROP_NAME] = serde_json::json!(DEFAULT_DISPLAY_NAME);

        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err.field, PROP_NAME);
        assert!(err.reason.contains("personal ict name"));
    }

    #[tokio::test]
    async fn test_name_convention_enforced() {
        let mut document = valid_document();
        document[PROP_NAME] = serde_json::json!("alice");
        let err = validate(&document, &reachable()).await.unwrap_err();
        assert!(err.reason.contains("naming convention"));

        document[PROP_NAME] = serde_json::json!(42);
        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err.reason, "not a string");

        document[PROP_NAME] = serde_json::json!("bob the builder (ict-12)");
        assert!(validate(&document, &reachable()).await.is_ok());
    }

    #[tokio::test]
    async fn test_placeholder_public_address_rejected() {
        let mut document = valid_document();
        document[PROP_PUBLIC_ADDRESS] = serde_json::json!(DEFAULT_PUBLIC_ADDRESS);

        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(
            err,
            InvalidProperty::new(
                PROP_PUBLIC_ADDRESS,
                "set your own ict public address \"address:port\""
            )
        );
    }

    #[tokio::test]
    async fn test_public_address_format_enforced() {
        let mut document = valid_document();

        // Host must be at least 4 characters, port at most 5
        document[PROP_PUBLIC_ADDRESS] = serde_json::json!("ab:1");
        assert!(validate(&document, &reachable()).await.is_err());

        document[PROP_PUBLIC_ADDRESS] = serde_json::json!("abcd.example:123456");
        assert!(validate(&document, &reachable()).await.is_err());

        document[PROP_PUBLIC_ADDRESS] = serde_json::json!("no-port-here");
        let err = validate(&document, &reachable()).await.unwrap_err();
        assert!(err.reason.contains("incorrectly formatted"));
    }

    #[tokio::test]
    async fn test_empty_public_address_rejected() {
        let mut document = valid_document();
        document[PROP_PUBLIC_ADDRESS] = serde_json::json!("");

        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err.reason, "the public ict \"address:port\" must be specified");
    }

    #[tokio::test]
    async fn test_absent_public_address_accepted() {
        let mut document = valid_document();
        document.as_object_mut().unwrap().remove(PROP_PUBLIC_ADDRESS);

        assert!(validate(&document, &reachable()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_node_rejected() {
        let err = validate(&valid_document(), &StubNode { reachable: false })
            .await
            .unwrap_err();
        assert_eq!(err.field, "Ict REST API port/password");
        assert_eq!(err.reason, "Connectivity check with Ict REST API failed");
    }

    #[tokio::test]
    async fn test_bad_port_rejected() {
        let mut document = valid_document();
        document[PROP_REST_PORT] = serde_json::json!("not a number");
        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err, InvalidProperty::new(PROP_REST_PORT, "not a valid port number"));

        document[PROP_REST_PORT] = serde_json::json!(70000);
        assert!(validate(&document, &reachable()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_password_rejected() {
        let mut document = valid_document();
        document.as_object_mut().unwrap().remove(PROP_REST_PASSWORD);

        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err, InvalidProperty::new(PROP_REST_PASSWORD, "not defined"));
    }

    #[tokio::test]
    async fn test_rules_run_in_order() {
        // Both the name and the neighbor list are bad; the name rule fires first
        let mut document = valid_document();
        document[PROP_NAME] = serde_json::json!("nameless");
        document.as_object_mut().unwrap().remove(PROP_NEIGHBORS);

        let err = validate(&document, &reachable()).await.unwrap_err();
        assert_eq!(err.field, PROP_NAME);
    }

    #[test]
    fn test_neighbor_entries_decode() {
        let document = valid_document();
        let entries = neighbor_entries(&document).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address, "10.0.0.1:1337");
        assert!(entries[0].public_address.is_empty());
    }
}
