//! Difference evaluators decide how severe the outcome of a comparison is.
//!
//! The engine computes a raw outcome (equal or different) and hands it to
//! the evaluator, which may downgrade or upgrade it. Evaluators must be
//! free of side effects; combine them with [`chain`] and [`first`].

use std::sync::Arc;

use ahash::HashSet;

use crate::comparison::{Comparison, ComparisonResult, ComparisonType, ComparisonValue};
use crate::xmlvalue::NodeType;

/// Maps a comparison and its current outcome to a (possibly) new outcome.
pub type DifferenceEvaluator =
    Arc<dyn Fn(&Comparison, ComparisonResult) -> ComparisonResult + Send + Sync>;

const SIMILAR_TYPES: &[ComparisonType] = &[
    ComparisonType::XmlEncoding,
    ComparisonType::HasDoctypeDeclaration,
    ComparisonType::DoctypeSystemId,
    ComparisonType::SchemaLocation,
    ComparisonType::NoNamespaceSchemaLocation,
    ComparisonType::NamespacePrefix,
    ComparisonType::AttrValueExplicitlySpecified,
    ComparisonType::ChildNodelistSequence,
];

fn is_text_cdata_mismatch(comparison: &Comparison) -> bool {
    matches!(
        (comparison.control().value(), comparison.test().value()),
        (
            ComparisonValue::NodeType(NodeType::Text),
            ComparisonValue::NodeType(NodeType::CData)
        ) | (
            ComparisonValue::NodeType(NodeType::CData),
            ComparisonValue::NodeType(NodeType::Text)
        )
    )
}

/// The default evaluator.
///
/// Turns `Different` into `Similar` for differences that don't change
/// the information content: encoding, doctype presence and system id,
/// schema locations, namespace prefixes, explicitness of attribute values,
/// the order of children and text vs. CDATA.
pub fn default() -> DifferenceEvaluator {
    Arc::new(|comparison: &Comparison, outcome: ComparisonResult| {
        if outcome != ComparisonResult::Different {
            return outcome;
        }
        let comparison_type = comparison.comparison_type();
        if SIMILAR_TYPES.contains(&comparison_type)
            || (comparison_type == ComparisonType::NodeType && is_text_cdata_mismatch(comparison))
        {
            ComparisonResult::Similar
        } else {
            outcome
        }
    })
}

/// Leave every outcome as it is.
pub fn identity() -> DifferenceEvaluator {
    Arc::new(|_: &Comparison, outcome: ComparisonResult| outcome)
}

/// Run evaluators in sequence; each sees the outcome of the one before.
pub fn chain(evaluators: impl IntoIterator<Item = DifferenceEvaluator>) -> DifferenceEvaluator {
    let evaluators = evaluators.into_iter().collect::<Vec<_>>();
    Arc::new(move |comparison: &Comparison, outcome: ComparisonResult| {
        evaluators
            .iter()
            .fold(outcome, |outcome, evaluator| evaluator(comparison, outcome))
    })
}

/// Use the first evaluator that changes the outcome.
///
/// If none of them does, the original outcome stands.
pub fn first(evaluators: impl IntoIterator<Item = DifferenceEvaluator>) -> DifferenceEvaluator {
    let evaluators = evaluators.into_iter().collect::<Vec<_>>();
    Arc::new(move |comparison: &Comparison, outcome: ComparisonResult| {
        evaluators
            .iter()
            .map(|evaluator| evaluator(comparison, outcome))
            .find(|evaluated| *evaluated != outcome)
            .unwrap_or(outcome)
    })
}

fn recolor(
    types: impl IntoIterator<Item = ComparisonType>,
    applies_to: fn(ComparisonResult) -> bool,
    to: ComparisonResult,
) -> DifferenceEvaluator {
    let types = types.into_iter().collect::<HashSet<_>>();
    Arc::new(move |comparison: &Comparison, outcome: ComparisonResult| {
        if applies_to(outcome) && types.contains(&comparison.comparison_type()) {
            to
        } else {
            outcome
        }
    })
}

/// Treat `Different` outcomes of the given kinds as `Similar`.
pub fn downgrade_differences_to_similar(
    types: impl IntoIterator<Item = ComparisonType>,
) -> DifferenceEvaluator {
    recolor(
        types,
        |outcome| outcome == ComparisonResult::Different,
        ComparisonResult::Similar,
    )
}

/// Treat non-equal outcomes of the given kinds as `Equal`.
pub fn downgrade_differences_to_equal(
    types: impl IntoIterator<Item = ComparisonType>,
) -> DifferenceEvaluator {
    recolor(
        types,
        |outcome| outcome != ComparisonResult::Equal,
        ComparisonResult::Equal,
    )
}

/// Treat `Similar` outcomes of the given kinds as `Different`.
pub fn upgrade_differences_to_different(
    types: impl IntoIterator<Item = ComparisonType>,
) -> DifferenceEvaluator {
    recolor(
        types,
        |outcome| outcome == ComparisonResult::Similar,
        ComparisonResult::Different,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::Detail;

    fn comparison(
        comparison_type: ComparisonType,
        control: impl Into<ComparisonValue>,
        test: impl Into<ComparisonValue>,
    ) -> Comparison {
        Comparison::new(
            comparison_type,
            Detail::new(None, None, control, None),
            Detail::new(None, None, test, None),
        )
    }

    #[test]
    fn test_default_downgrades_cosmetic_types() {
        let evaluator = default();
        for comparison_type in SIMILAR_TYPES {
            let c = comparison(*comparison_type, "a", "b");
            assert_eq!(
                evaluator(&c, ComparisonResult::Different),
                ComparisonResult::Similar
            );
        }
    }

    #[test]
    fn test_default_leaves_others_alone() {
        let evaluator = default();
        let c = comparison(ComparisonType::AttrValue, "a", "b");
        assert_eq!(
            evaluator(&c, ComparisonResult::Different),
            ComparisonResult::Different
        );
        assert_eq!(
            evaluator(&c, ComparisonResult::Equal),
            ComparisonResult::Equal
        );
    }

    #[test]
    fn test_default_text_vs_cdata() {
        let evaluator = default();
        let c = comparison(ComparisonType::NodeType, NodeType::Text, NodeType::CData);
        assert_eq!(
            evaluator(&c, ComparisonResult::Different),
            ComparisonResult::Similar
        );
        let c = comparison(ComparisonType::NodeType, NodeType::CData, NodeType::Text);
        assert_eq!(
            evaluator(&c, ComparisonResult::Different),
            ComparisonResult::Similar
        );
        let c = comparison(ComparisonType::NodeType, NodeType::Text, NodeType::Comment);
        assert_eq!(
            evaluator(&c, ComparisonResult::Different),
            ComparisonResult::Different
        );
    }

    #[test]
    fn test_chain_feeds_results_through() {
        let to_similar = downgrade_differences_to_similar([ComparisonType::AttrValue]);
        let to_equal: DifferenceEvaluator = Arc::new(|_: &Comparison, outcome: ComparisonResult| {
            if outcome == ComparisonResult::Similar {
                ComparisonResult::Equal
            } else {
                outcome
            }
        });
        let c = comparison(ComparisonType::AttrValue, "a", "b");
        assert_eq!(
            chain([to_similar.clone(), to_equal.clone()])(&c, ComparisonResult::Different),
            ComparisonResult::Equal
        );
        // the other way around to_equal sees Different and does nothing
        assert_eq!(
            chain([to_equal, to_similar])(&c, ComparisonResult::Different),
            ComparisonResult::Similar
        );
    }

    #[test]
    fn test_first_picks_first_change() {
        let c = comparison(ComparisonType::AttrValue, "a", "b");
        let evaluator = first([
            identity(),
            downgrade_differences_to_equal([ComparisonType::AttrValue]),
            downgrade_differences_to_similar([ComparisonType::AttrValue]),
        ]);
        assert_eq!(
            evaluator(&c, ComparisonResult::Different),
            ComparisonResult::Equal
        );
        let evaluator = first([identity()]);
        assert_eq!(
            evaluator(&c, ComparisonResult::Different),
            ComparisonResult::Different
        );
    }

    #[test]
    fn test_upgrade() {
        let c = comparison(ComparisonType::NamespacePrefix, "a", "b");
        let evaluator = chain([
            default(),
            upgrade_differences_to_different([ComparisonType::NamespacePrefix]),
        ]);
        assert_eq!(
            evaluator(&c, ComparisonResult::Different),
            ComparisonResult::Different
        );
    }
}
