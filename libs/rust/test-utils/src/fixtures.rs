//! Test fixtures with sample contracts.
//!
//! A small animal-shelter style contract: one provider listing users,
//! plus a message the provider publishes when a user is created.

use pact_verifier::{ContractDocument, ProducedMessage, ProviderResponse};
use serde_json::{Value, json};

/// A v3 contract with a user listing interaction, a lookup that may be
/// missing, and a `user created` message.
pub const USERS_V3: &str = r#"{
  "consumer": {"name": "web-app"},
  "provider": {"name": "user-service"},
  "interactions": [
    {
      "description": "a request for all users",
      "providerStates": [{"name": "users exist", "params": {"count": 2}}],
      "request": {
        "method": "GET",
        "path": "/users",
        "headers": {"Accept": "application/json"}
      },
      "response": {
        "status": 200,
        "headers": {"Content-Type": "application/json; charset=UTF-8"},
        "body": [
          {"dob": "07/19/2016", "id": 1234567890, "name": "Rogger the Dogger", "timestamp": "2016-07-19T12:14:39"}
        ],
        "matchingRules": {
          "header": {
            "Content-Type": {"matchers": [{"match": "regex", "regex": "application/json.*"}]}
          },
          "body": {
            "$": {"matchers": [{"match": "type", "min": 1}]},
            "$[*].dob": {"matchers": [{"match": "regex", "regex": "\\d{2}/\\d{2}/\\d{4}"}]},
            "$[*].id": {"matchers": [{"match": "integer"}]},
            "$[*].timestamp": {"matchers": [{"match": "regex", "regex": "\\d{4}-\\d{2}-\\d{2}T\\d{2}:\\d{2}:\\d{2}"}]}
          }
        },
        "generators": {
          "body": {"$[*].id": {"type": "RandomInt", "min": 1, "max": 999999999}}
        }
      }
    },
    {
      "description": "a request for a missing user",
      "providerState": "user 404 does not exist",
      "request": {"method": "GET", "path": "/users/404"},
      "response": {"status": 404}
    }
  ],
  "messages": [
    {
      "description": "a user created event",
      "metaData": {"contentType": "application/json"},
      "contents": {"event": "user.created", "user": {"id": 1, "name": "Cat in the Hat"}},
      "matchingRules": {
        "body": {
          "$.user.id": {"matchers": [{"match": "integer"}]},
          "$.user.name": {"matchers": [{"match": "type"}]}
        }
      }
    }
  ],
  "metadata": {"pactSpecification": {"version": "3.0.0"}}
}"#;

/// [`USERS_V3`] decoded.
///
/// # Panics
///
/// Never in practice: the fixture is a valid document.
#[must_use]
#[allow(clippy::expect_used)]
pub fn users_contract() -> ContractDocument {
    ContractDocument::from_json(USERS_V3).expect("users fixture is a valid contract")
}

/// The user listing a healthy provider returns.
#[must_use]
pub fn users_body() -> Value {
    json!([
        {"dob": "07/19/2016", "id": 8_958_464_620_u64, "name": "Rogger the Dogger", "timestamp": "2016-07-19T12:14:39"},
        {"dob": "07/19/2016", "id": 4_143_398_442_u64, "name": "Cat in the Hat", "timestamp": "2016-07-19T12:14:39"}
    ])
}

/// A provider response satisfying the user listing interaction.
#[must_use]
pub fn users_response() -> ProviderResponse {
    ProviderResponse::new(200)
        .with_json(&users_body())
        .with_header("Content-Type", "application/json; charset=UTF-8")
        .with_header("X-Request-Id", "abc-123")
}

/// A produced message satisfying the `user created` message.
#[must_use]
pub fn user_created_message() -> ProducedMessage {
    ProducedMessage::new(json!({
        "event": "user.created",
        "user": {"id": 8_958_464_620_u64, "name": "Rogger the Dogger"},
        "source": "signup"
    }))
    .with_metadata("contentType", json!("application/json"))
    .with_metadata("partition", json!(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_fixture_decodes() {
        let contract = users_contract();
        assert_eq!(contract.consumer.name, "web-app");
        assert_eq!(contract.interactions.len(), 2);
        assert_eq!(contract.messages.len(), 1);
        assert_eq!(
            contract.interactions[1].state_names(),
            vec!["user 404 does not exist".to_string()]
        );
        assert_eq!(contract.spec_version(), Some("3.0.0"));
    }
}
