//! Shared proptest generators.
//!
//! Values, rule expressions and whole contract documents for the
//! verifier crates' property tests.

use pact_verifier::{
    ContractDocument, Interaction, Matcher, MatchingRule, Participant, ProviderState, Request, Response,
};
use proptest::prelude::*;
use serde_json::Value;

/// Generate JSON scalars (no floats, so values compare exactly).
pub fn json_scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 _-]{0,16}".prop_map(Value::from),
    ]
}

/// Generate nested JSON values up to a few levels deep.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    json_scalar_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                .prop_map(|members| Value::Object(members.into_iter().collect())),
        ]
    })
}

/// Generate valid HTTP methods.
pub fn http_method_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("GET".to_string()),
        Just("POST".to_string()),
        Just("PUT".to_string()),
        Just("DELETE".to_string()),
        Just("PATCH".to_string()),
    ]
}

/// Generate request paths.
pub fn request_path_strategy() -> impl Strategy<Value = String> {
    "/[a-z][a-z0-9/-]{0,24}"
}

/// Generate participant names.
pub fn participant_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{2,20}"
}

/// Generate well-formed rule path expressions.
pub fn path_expression_strategy() -> impl Strategy<Value = String> {
    let segment = prop_oneof![
        "[a-z]{1,8}".prop_map(|name| format!(".{name}")),
        "[a-z]{1,4} [a-z]{1,4}".prop_map(|name| format!("['{name}']")),
        (0usize..5).prop_map(|index| format!("[{index}]")),
        Just("[*]".to_string()),
        Just(".*".to_string()),
    ];
    prop::collection::vec(segment, 0..5).prop_map(|segments| format!("${}", segments.concat()))
}

/// Generate matchers that never fail to compile.
pub fn matcher_strategy() -> impl Strategy<Value = Matcher> {
    prop_oneof![
        Just(Matcher::Equality),
        Just(Matcher::of_type()),
        (0usize..3, 3usize..6).prop_map(|(min, max)| Matcher::Type {
            min: Some(min),
            max: Some(max),
        }),
        Just(Matcher::regex("[a-z0-9]+")),
        "[a-z]{1,3}".prop_map(|value| Matcher::Include { value }),
        Just(Matcher::Integer),
        Just(Matcher::Number),
        Just(Matcher::Boolean),
        Just(Matcher::Null),
    ]
}

/// Generate rules of one to three matchers with either combine mode.
pub fn matching_rule_strategy() -> impl Strategy<Value = MatchingRule> {
    (prop::collection::vec(matcher_strategy(), 1..4), any::<bool>()).prop_map(|(matchers, any)| {
        if any {
            MatchingRule::any(matchers)
        } else {
            MatchingRule::all(matchers)
        }
    })
}

/// Generate interactions with body rules.
pub fn interaction_strategy() -> impl Strategy<Value = Interaction> {
    (
        "[a-z ]{3,30}",
        prop::option::of("[a-z ]{3,20}"),
        http_method_strategy(),
        request_path_strategy(),
        100u16..600,
        prop::option::of(json_value_strategy()),
        prop::collection::btree_map(path_expression_strategy(), matching_rule_strategy(), 0..3),
    )
        .prop_map(|(description, state, method, path, status, body, rules)| {
            let mut response = Response::with_status(status);
            response.body = body.filter(|body| !body.is_null());
            response.matching_rules.body = rules;
            Interaction {
                description,
                provider_states: state.into_iter().map(ProviderState::new).collect(),
                request: Request::new(method, path),
                response,
            }
        })
}

/// Generate valid contract documents.
pub fn contract_document_strategy() -> impl Strategy<Value = ContractDocument> {
    (
        participant_name_strategy(),
        participant_name_strategy(),
        prop::collection::vec(interaction_strategy(), 0..4),
    )
        .prop_map(|(consumer, provider, interactions)| ContractDocument {
            consumer: Participant::new(consumer),
            provider: Participant::new(provider),
            interactions,
            ..ContractDocument::default()
        })
}
