//! Pact v3 contract document types.
//!
//! Decoding is lenient about shape (older `providerState` strings, raw query
//! strings, header arrays) but strict about rules: a document whose matching
//! rules do not compile is rejected as a whole, with every offending rule
//! reported.

use crate::error::ContractError;
use crate::matching::CompiledRules;
use crate::rules::{Generators, MatchingRules};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A consumer contract with one provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContractDocument {
    /// Provider participant
    #[serde(default)]
    pub provider: Participant,
    /// Consumer participant
    #[serde(default)]
    pub consumer: Participant,
    /// HTTP interactions, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<Interaction>,
    /// Asynchronous messages, in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    /// Free-form document metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl ContractDocument {
    /// Decode and validate a document from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::DocumentDecode`] for invalid JSON, or any
    /// error from [`ContractDocument::validate`].
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        let document: Self = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// Decode and validate a document from a reader.
    ///
    /// # Errors
    ///
    /// Same as [`ContractDocument::from_json`].
    pub fn from_reader(reader: impl Read) -> Result<Self, ContractError> {
        let document: Self = serde_json::from_reader(reader)?;
        document.validate()?;
        Ok(document)
    }

    /// Decode and validate a document from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Io`] if the file cannot be opened, otherwise
    /// the same as [`ContractDocument::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Encode as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::DocumentDecode`] if encoding fails.
    pub fn to_json(&self) -> Result<String, ContractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check participant names and compile every matching rule.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::MissingParticipant`] for an empty name, or
    /// every malformed rule in the document folded into one error.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.provider.name.trim().is_empty() {
            return Err(ContractError::MissingParticipant("provider"));
        }
        if self.consumer.name.trim().is_empty() {
            return Err(ContractError::MissingParticipant("consumer"));
        }

        let mut errors = Vec::new();
        let mut check = |rules: &MatchingRules, location: String| {
            if let Err(err) = CompiledRules::compile(rules, &location) {
                errors.extend(err.into_rule_errors());
            }
        };
        for interaction in &self.interactions {
            let label = format!("interaction '{}'", interaction.description);
            check(&interaction.request.matching_rules, format!("{label} request"));
            check(&interaction.response.matching_rules, format!("{label} response"));
        }
        for message in &self.messages {
            check(&message.matching_rules, format!("message '{}'", message.description));
        }

        ContractError::from_rule_errors(errors).map_or(Ok(()), Err)
    }

    /// The `pactSpecification.version` recorded in the metadata, if any.
    #[must_use]
    pub fn spec_version(&self) -> Option<&str> {
        self.metadata
            .get("pactSpecification")
            .or_else(|| self.metadata.get("pact-specification"))
            .and_then(|spec| spec.get("version"))
            .and_then(Value::as_str)
    }
}

/// A party to a contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    /// Participant name
    #[serde(default)]
    pub name: String,
}

impl Participant {
    /// Create a new participant.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A precondition the provider must be put in before an interaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderState {
    /// State name, e.g. `user 42 exists`
    #[serde(default)]
    pub name: String,
    /// State parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
}

impl ProviderState {
    /// A state without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }
}

/// One expected request/response exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", from = "InteractionWire")]
pub struct Interaction {
    /// Label used in reports
    pub description: String,
    /// Provider states, in declaration order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_states: Vec<ProviderState>,
    /// Canonical request
    pub request: Request,
    /// Expected response
    pub response: Response,
}

impl Interaction {
    /// Names of the provider states this interaction needs.
    #[must_use]
    pub fn state_names(&self) -> Vec<String> {
        state_names(&self.provider_states)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionWire {
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "provider_states")]
    provider_states: Vec<ProviderState>,
    #[serde(default)]
    provider_state: Option<String>,
    request: Request,
    response: Response,
}

impl From<InteractionWire> for Interaction {
    fn from(wire: InteractionWire) -> Self {
        let mut provider_states = wire.provider_states;
        if let Some(legacy) = wire.provider_state.filter(|name| !name.is_empty()) {
            if !provider_states.iter().any(|state| state.name == legacy) {
                provider_states.push(ProviderState::new(legacy));
            }
        }
        Self {
            description: wire.description,
            provider_states,
            request: wire.request,
            response: wire.response,
        }
    }
}

/// The request a consumer sends.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// HTTP method; compared case-insensitively
    pub method: String,
    /// Request path, e.g. `/users/42`
    pub path: String,
    /// Query parameters; order within one parameter is significant
    #[serde(default, deserialize_with = "query", skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, Vec<String>>,
    /// Request headers
    #[serde(default, deserialize_with = "headers", skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Matching rules
    #[serde(default, skip_serializing_if = "MatchingRules::is_empty")]
    pub matching_rules: MatchingRules,
    /// Value generators; carried, never executed
    #[serde(default, skip_serializing_if = "Generators::is_empty")]
    pub generators: Generators,
}

impl Request {
    /// A request with the given method and path.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// The response a consumer expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Status code
    #[serde(default = "default_status")]
    pub status: u16,
    /// Expected headers; matched case-insensitively by name
    #[serde(default, deserialize_with = "headers", skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Expected body; absent or `null` accepts any body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Matching rules
    #[serde(default, skip_serializing_if = "MatchingRules::is_empty")]
    pub matching_rules: MatchingRules,
    /// Value generators; carried, never executed
    #[serde(default, skip_serializing_if = "Generators::is_empty")]
    pub generators: Generators,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: default_status(),
            headers: BTreeMap::new(),
            body: None,
            matching_rules: MatchingRules::default(),
            generators: Generators::default(),
        }
    }
}

impl Response {
    /// A response with the given status and nothing else.
    #[must_use]
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

const fn default_status() -> u16 {
    200
}

/// An asynchronous message a consumer expects to receive.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Label used in reports
    #[serde(default)]
    pub description: String,
    /// Provider states, in declaration order
    #[serde(default, deserialize_with = "provider_states", skip_serializing_if = "Vec::is_empty")]
    pub provider_states: Vec<ProviderState>,
    /// Message metadata, e.g. `contentType`
    #[serde(rename = "metaData", alias = "metadata", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    /// Expected payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Value>,
    /// Matching rules; `body` rules apply to `contents`
    #[serde(default, skip_serializing_if = "MatchingRules::is_empty")]
    pub matching_rules: MatchingRules,
    /// Value generators; carried, never executed
    #[serde(default, skip_serializing_if = "Generators::is_empty")]
    pub generators: Generators,
}

impl Message {
    /// Names of the provider states this message needs.
    #[must_use]
    pub fn state_names(&self) -> Vec<String> {
        state_names(&self.provider_states)
    }
}

fn state_names(states: &[ProviderState]) -> Vec<String> {
    states.iter().map(|state| state.name.clone()).collect()
}

pub(crate) fn find_header<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatesWire {
    List(Vec<ProviderState>),
    Map(BTreeMap<String, ProviderState>),
}

/// Accepts `[{"name", "params"}]` or `{"<name>": {"params": ...}}`.
fn provider_states<'de, D>(deserializer: D) -> Result<Vec<ProviderState>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StatesWire>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(StatesWire::List(states)) => states,
        Some(StatesWire::Map(states)) => states
            .into_iter()
            .map(|(key, mut state)| {
                if state.name.is_empty() {
                    state.name = key;
                }
                state
            })
            .collect(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryWire {
    Raw(String),
    Map(BTreeMap<String, OneOrMany>),
}

/// Accepts the v3 map form or a raw `a=1&b=2` string.
fn query<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<QueryWire>::deserialize(deserializer)? {
        None => BTreeMap::new(),
        Some(QueryWire::Map(params)) => params
            .into_iter()
            .map(|(name, values)| (name, values.into_vec()))
            .collect(),
        Some(QueryWire::Raw(raw)) => {
            let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (name, value) in url::form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()) {
                params.entry(name.into_owned()).or_default().push(value.into_owned());
            }
            params
        }
    })
}

/// Accepts single values or arrays, which are joined with `, `.
fn headers<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, OneOrMany>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, values)| (name, values.into_vec().join(", ")))
        .collect())
}
