use thiserror::Error as ThisError;

///
/// ConfigError
///
/// Programming mistakes by the embedding application, surfaced at startup.
/// These are never produced in response to request input and are expected to
/// fail loudly during assembler or registry construction.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("filter '{context}' must declare a non-empty title")]
    MissingFilterTitle { context: String },

    #[error("filter '{title}' must declare a non-empty parameter name")]
    MissingParameterName { title: String },

    #[error("unknown model '{model}'")]
    UnknownModel { model: String },

    #[error("duplicate model '{model}' in schema")]
    DuplicateModel { model: String },

    #[error("model '{model}' declares unknown primary key field '{field}'")]
    UnknownPrimaryKey { model: String, field: String },

    #[error("model '{model}' references unknown field '{field}'")]
    UnknownField { model: String, field: String },

    #[error("field '{field}' on model '{model}' relates to unknown model '{target}'")]
    UnknownRelationTarget {
        model: String,
        field: String,
        target: String,
    },

    #[error("no registered filter matches field '{field}' on model '{model}'")]
    NoMatchingFilter { model: String, field: String },

    #[error("invalid lookup path '{path}' on model '{model}': {source}")]
    InvalidPath {
        model: String,
        path: String,
        source: LookupPathError,
    },
}

///
/// LookupPathError
///
/// Structural failure while walking a `a__b__c` field path against the
/// schema. Dedicated variants, so callers can distinguish "not a field"
/// from "not traversable" without matching on message text.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum LookupPathError {
    #[error("model '{model}' has no field '{field}'")]
    UnknownField { model: String, field: String },

    #[error("field '{field}' on model '{model}' is not a relation and cannot be traversed")]
    NotARelation { model: String, field: String },
}

///
/// BadLookupReason
///
/// Why one lookup parameter was rejected. Carried inside
/// [`LookupError::BadParameters`] so the request boundary can log a precise
/// cause while still mapping the whole class to one client error.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum BadLookupReason {
    #[error("{0}")]
    Path(#[from] LookupPathError),

    #[error("value '{found}' is not a valid {expected}")]
    BadValue {
        expected: &'static str,
        found: String,
    },
}

///
/// LookupError
///
/// The single per-request error class this subsystem raises on bad user
/// input. The request boundary is expected to catch exactly this type and
/// translate it into a 4xx-style response; nothing here may crash the host.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum LookupError {
    /// The allow-list predicate rejected a query-string key. Fatal for the
    /// request: it may indicate an attempt to probe fields the caller should
    /// not see.
    #[error("lookup parameter '{key}' is not allowed")]
    Disallowed { key: String },

    #[error("incorrect lookup parameter '{key}': {reason}")]
    BadParameters { key: String, reason: BadLookupReason },

    #[error("page '{page}' is out of range (1..={pages})")]
    InvalidPage { page: String, pages: u64 },
}

impl LookupError {
    /// Construct a bad-parameters error from a path resolution failure.
    #[must_use]
    pub fn bad_path(key: impl Into<String>, err: LookupPathError) -> Self {
        Self::BadParameters {
            key: key.into(),
            reason: BadLookupReason::Path(err),
        }
    }

    /// Construct a bad-parameters error from a failed value coercion.
    #[must_use]
    pub fn bad_value(key: impl Into<String>, expected: &'static str, found: &str) -> Self {
        Self::BadParameters {
            key: key.into(),
            reason: BadLookupReason::BadValue {
                expected,
                found: found.to_string(),
            },
        }
    }

    /// True when the condition was a policy rejection rather than malformed
    /// input.
    #[must_use]
    pub const fn is_disallowed(&self) -> bool {
        matches!(self, Self::Disallowed { .. })
    }
}
