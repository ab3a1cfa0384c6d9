//! Comparison controllers decide whether a difference ends the comparison.
//!
//! The engine consults the controller only for outcomes other than
//! `Equal`.

use std::sync::Arc;

use crate::comparison::{ComparisonResult, Difference};

/// Returns `true` if the comparison should stop after this difference.
pub type ComparisonController = Arc<dyn Fn(&Difference) -> bool + Send + Sync>;

/// Never stop; report every difference.
pub fn never_stop() -> ComparisonController {
    Arc::new(|_: &Difference| false)
}

/// Stop as soon as a `Different` outcome is seen.
pub fn stop_when_different() -> ComparisonController {
    Arc::new(|difference: &Difference| difference.result() == ComparisonResult::Different)
}

/// Stop at the first outcome that isn't `Equal`.
pub fn stop_when_similar() -> ComparisonController {
    Arc::new(|_: &Difference| true)
}
