//! Participant input data for one allocation request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A participant's response for one attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// A numeric response, classified by range groups.
    Numeric(f64),
    /// A discrete response, classified by exact-value groups.
    Discrete(String),
}

/// An incoming trial participant.
///
/// Created once per allocation request and immutable thereafter; the
/// assigned arm is recorded by the persistence collaborator, not on this
/// type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    id: u64,
    responses: BTreeMap<String, Response>,
}

impl Participant {
    /// Creates a participant with no responses.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            responses: BTreeMap::new(),
        }
    }

    /// Adds a response for the named attribute.
    pub fn with_response(mut self, attribute: impl Into<String>, response: Response) -> Self {
        self.responses.insert(attribute.into(), response);
        self
    }

    /// Adds a numeric response for the named attribute.
    pub fn with_numeric(self, attribute: impl Into<String>, value: f64) -> Self {
        self.with_response(attribute, Response::Numeric(value))
    }

    /// Returns the participant identifier.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the response for the named attribute, if present.
    #[inline]
    pub fn response(&self, attribute: &str) -> Option<&Response> {
        self.responses.get(attribute)
    }

    /// Returns all responses keyed by attribute name.
    #[inline]
    pub fn responses(&self) -> &BTreeMap<String, Response> {
        &self.responses
    }
}
