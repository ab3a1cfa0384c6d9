use crate::comparison::ComparisonResult;
use crate::error::Error;

/// Where a comparison run stands after a step.
///
/// Once a step is `Finished` all following steps are skipped; they're
/// passed as closures so that skipped work is never done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComparisonState {
    /// Keep comparing. Carries the outcome of the last step.
    Ongoing(ComparisonResult),
    /// The controller asked to stop. Carries the outcome that stopped it.
    Finished(ComparisonResult),
}

impl Default for ComparisonState {
    fn default() -> Self {
        ComparisonState::Ongoing(ComparisonResult::Equal)
    }
}

impl ComparisonState {
    pub(crate) fn is_finished(&self) -> bool {
        matches!(self, ComparisonState::Finished(_))
    }

    pub(crate) fn result(&self) -> ComparisonResult {
        match self {
            ComparisonState::Ongoing(result) | ComparisonState::Finished(result) => *result,
        }
    }

    /// Run a step that compares a single value.
    pub(crate) fn and_compare<F>(self, step: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        if self.is_finished() {
            self
        } else {
            step()
        }
    }

    /// Run a step that may descend into the trees and fail.
    pub(crate) fn and_then<F>(self, step: F) -> Result<Self, Error>
    where
        F: FnOnce() -> Result<Self, Error>,
    {
        if self.is_finished() {
            Ok(self)
        } else {
            step()
        }
    }

    pub(crate) fn and_if_true_compare<F>(self, predicate: bool, step: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        if predicate {
            self.and_compare(step)
        } else {
            self
        }
    }

    pub(crate) fn and_if_true_then<F>(self, predicate: bool, step: F) -> Result<Self, Error>
    where
        F: FnOnce() -> Result<Self, Error>,
    {
        if predicate {
            self.and_then(step)
        } else {
            Ok(self)
        }
    }
}
