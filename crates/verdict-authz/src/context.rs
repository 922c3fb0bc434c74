//! Per-decision evaluation context.

use verdict_core::{Principal, Subject, TypeId};

use crate::action::Action;
use crate::error::AuthzError;

/// Immutable bundle of everything a single decision may reference.
///
/// Contexts are created fresh per call and discarded afterwards; nothing in
/// them outlives the decision. Host predicates receive the context and may
/// read the actor, action, target type, subject and parent through the
/// accessors below.
pub struct EvaluationContext<'a> {
    actor: Option<&'a dyn Principal>,
    action: Action,
    target: TypeId,
    subject: Option<&'a dyn Subject>,
    parent: Option<&'a dyn Subject>,
    preloading: bool,
}

impl<'a> EvaluationContext<'a> {
    /// Creates a context for a regular decision.
    #[must_use]
    pub fn new(
        actor: Option<&'a dyn Principal>,
        action: Action,
        target: TypeId,
        subject: Option<&'a dyn Subject>,
        parent: Option<&'a dyn Subject>,
    ) -> Self {
        Self {
            actor,
            action,
            target,
            subject,
            parent,
            preloading: false,
        }
    }

    /// Creates a preloading context. No subject exists yet; any predicate
    /// that reaches for it fails with [`AuthzError::SubjectInaccessible`].
    #[must_use]
    pub fn preloading(
        actor: Option<&'a dyn Principal>,
        action: Action,
        target: TypeId,
        parent: Option<&'a dyn Subject>,
    ) -> Self {
        Self {
            actor,
            action,
            target,
            subject: None,
            parent,
            preloading: true,
        }
    }

    /// The acting principal, if any.
    #[must_use]
    pub fn actor(&self) -> Option<&'a dyn Principal> {
        self.actor
    }

    /// The action being authorized.
    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// The target type the action applies to.
    #[must_use]
    pub fn target(&self) -> &TypeId {
        &self.target
    }

    /// The subject instance, when one has been resolved.
    ///
    /// Fails while preloading: new/create flows evaluate conditions before
    /// an instance exists, and defaulting the subject there would let
    /// predicates silently authorize against nothing.
    pub fn subject(&self) -> Result<Option<&'a dyn Subject>, AuthzError> {
        if self.preloading {
            return Err(AuthzError::SubjectInaccessible);
        }
        Ok(self.subject)
    }

    /// The parent instance supplied by the host, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&'a dyn Subject> {
        self.parent
    }

    /// Returns `true` while deciding in preload mode, so predicates can
    /// branch instead of touching the subject.
    #[must_use]
    pub fn is_preloading(&self) -> bool {
        self.preloading
    }
}
