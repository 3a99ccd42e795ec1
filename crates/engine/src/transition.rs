// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use haul_core::TransitionError;

/// Result of a state machine command.
///
/// A rejected command left the record untouched and has already been logged.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<T = ()> {
    Applied(T),
    Rejected(TransitionError),
}

impl<T> Transition<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Transition::Applied(value) => Some(value),
            Transition::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&TransitionError> {
        match self {
            Transition::Applied(_) => None,
            Transition::Rejected(e) => Some(e),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Transition<U> {
        match self {
            Transition::Applied(value) => Transition::Applied(f(value)),
            Transition::Rejected(e) => Transition::Rejected(e),
        }
    }
}
