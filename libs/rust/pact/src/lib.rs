//! Provider-side verification of Pact v3 consumer contracts.
//!
//! Loads a contract document, calls the provider for every interaction and
//! checks the answer against the contract's matching rules.
//!
//! - [`contract`]: the document model and its JSON decoding
//! - [`path`]: rule path expressions such as `$.items[*].id`
//! - [`matching`]: the matching rule evaluator
//! - [`verification`]: the interaction and document verifier
//! - [`provider`] and [`in_process`]: calling the provider over HTTP or
//!   through an in-process `tower` service
//!
//! ```
//! use pact_verifier::{RuleIndex, all_passed, evaluate};
//! use serde_json::json;
//!
//! let results = evaluate(&json!({"id": 1}), &json!({"id": 1, "extra": true}), &RuleIndex::empty());
//! assert!(all_passed(&results));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod error;
pub mod in_process;
pub mod matching;
pub mod message;
pub mod path;
pub mod provider;
pub mod report;
pub mod rules;
pub mod verification;

pub use contract::{ContractDocument, Interaction, Message, Participant, ProviderState, Request, Response};
pub use error::{ContractError, InteractionError};
pub use in_process::ServiceInvoker;
pub use matching::{CompiledRules, FieldResult, Mismatch, MismatchKind, RuleIndex, all_passed, evaluate};
pub use message::{MessageProducer, ProducedMessage};
pub use path::{DocPath, PathExpression};
pub use provider::{HttpProviderInvoker, ProviderInvoker, ProviderRequest, ProviderResponse};
pub use report::{
    CheckReport, DocumentReport, InteractionOutcome, InteractionReport, MessageOutcome, MessageReport,
    VerificationSummary,
};
pub use rules::{Combine, Generator, Generators, Matcher, MatchingRule, MatchingRules};
pub use verification::{Verifier, VerifierConfig};
