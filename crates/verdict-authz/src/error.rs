//! Authorization error types.
//!
//! Build-time DSL misuse and per-decision evaluation failures are kept
//! apart: the former must abort startup, the latter must propagate to the
//! caller instead of being masked as a denial.

use std::fmt;

/// Errors that can occur while declaring policies or deciding access.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthzError {
    /// The authorize-or-fail wrapper rejected the request.
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Human-readable denial message.
        message: String,
        /// The action that was attempted.
        action: String,
        /// The subject (instance or type) the action targeted.
        subject: String,
    },

    /// A condition clause kind the evaluator does not recognize.
    #[error("Unsupported condition: {key}")]
    UnsupportedCondition {
        /// The unrecognized combinator key.
        key: String,
    },

    /// `can`/`cannot` was called outside an open role body.
    #[error("No open role body for `{operation}`")]
    NoBlock {
        /// The DSL call that was misplaced.
        operation: String,
    },

    /// Inline rule sets were declared but never assigned to roles.
    #[error("Role assignment missing: {pending} pending rule set(s)")]
    RoleAssignmentMissing {
        /// Number of unconsumed inline rule sets.
        pending: usize,
    },

    /// A predicate touched the subject while the decision was preloading.
    #[error("Subject is not accessible while preloading")]
    SubjectInaccessible,

    /// A named predicate is not implemented by the policy behavior.
    #[error("Unknown predicate: {name}")]
    UnknownPredicate {
        /// The predicate name that failed to resolve.
        name: String,
    },

    /// The policy declarations are invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthzError {
    /// Creates a new `AccessDenied` error with the default message.
    #[must_use]
    pub fn access_denied(action: impl Into<String>, subject: impl Into<String>) -> Self {
        let action = action.into();
        let subject = subject.into();
        Self::AccessDenied {
            message: format!("not permitted to {action} {subject}"),
            action,
            subject,
        }
    }

    /// Creates a new `AccessDenied` error with an explicit message.
    #[must_use]
    pub fn access_denied_with_message(
        message: impl Into<String>,
        action: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self::AccessDenied {
            message: message.into(),
            action: action.into(),
            subject: subject.into(),
        }
    }

    /// Creates a new `UnsupportedCondition` error.
    #[must_use]
    pub fn unsupported_condition(key: impl Into<String>) -> Self {
        Self::UnsupportedCondition { key: key.into() }
    }

    /// Creates a new `NoBlock` error.
    #[must_use]
    pub fn no_block(operation: impl Into<String>) -> Self {
        Self::NoBlock {
            operation: operation.into(),
        }
    }

    /// Creates a new `RoleAssignmentMissing` error.
    #[must_use]
    pub fn role_assignment_missing(pending: usize) -> Self {
        Self::RoleAssignmentMissing { pending }
    }

    /// Creates a new `UnknownPredicate` error.
    #[must_use]
    pub fn unknown_predicate(name: impl Into<String>) -> Self {
        Self::UnknownPredicate { name: name.into() }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if this error reports a denied request rather than a
    /// defect in declarations or predicates.
    #[must_use]
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// Returns `true` if this error should fail startup (DSL misuse or
    /// invalid declarations).
    #[must_use]
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::NoBlock { .. } | Self::RoleAssignmentMissing { .. } | Self::Configuration { .. }
        )
    }

    /// Returns `true` if this error surfaced while evaluating conditions.
    #[must_use]
    pub fn is_evaluation_error(&self) -> bool {
        matches!(
            self,
            Self::SubjectInaccessible
                | Self::UnknownPredicate { .. }
                | Self::UnsupportedCondition { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AccessDenied { .. } => ErrorCategory::Denial,
            Self::UnsupportedCondition { .. } => ErrorCategory::Condition,
            Self::NoBlock { .. } => ErrorCategory::Dsl,
            Self::RoleAssignmentMissing { .. } => ErrorCategory::Dsl,
            Self::SubjectInaccessible => ErrorCategory::Evaluation,
            Self::UnknownPredicate { .. } => ErrorCategory::Evaluation,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Categories of authorization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A request was denied by policy.
    Denial,
    /// A condition clause could not be interpreted.
    Condition,
    /// Declaration-time DSL misuse.
    Dsl,
    /// A predicate failed during evaluation.
    Evaluation,
    /// Invalid policy configuration.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denial => write!(f, "denial"),
            Self::Condition => write!(f, "condition"),
            Self::Dsl => write!(f, "dsl"),
            Self::Evaluation => write!(f, "evaluation"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}
