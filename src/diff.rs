use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;
use std::sync::Arc;

use ahash::HashMap;

use crate::comparison::{Comparison, ComparisonResult, Difference};
use crate::controller::ComparisonController;
use crate::engine::{AttributeFilter, ComparisonListener, DomDifferenceEngine, NodeFilter};
use crate::error::Error;
use crate::evaluator::DifferenceEvaluator;
use crate::format::{ComparisonFormatter, DefaultComparisonFormatter};
use crate::input::Input;
use crate::matcher::NodeMatcher;
use crate::transform;
use crate::xmldata::{Node, XmlData};

const CHECK_FOR_SIMILAR: &[ComparisonResult] = &[ComparisonResult::Different];
const CHECK_FOR_IDENTICAL: &[ComparisonResult] =
    &[ComparisonResult::Similar, ComparisonResult::Different];

/// The outcome of comparing two documents.
///
/// Holds the parsed (and transformed) documents together with the
/// differences that were retained.
pub struct Diff {
    data: XmlData,
    control: Node,
    test: Node,
    differences: Vec<Difference>,
    formatter: Arc<dyn ComparisonFormatter>,
}

impl Diff {
    /// Were any differences retained?
    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }

    /// The retained differences, in the order they were found.
    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    /// The tree the documents live in.
    pub fn data(&self) -> &XmlData {
        &self.data
    }

    /// The control document, as compared.
    pub fn control(&self) -> Node {
        self.control
    }

    /// The test document, as compared.
    pub fn test(&self) -> Node {
        self.test
    }

    /// Describe a single difference with this diff's formatter.
    pub fn describe(&self, difference: &Difference) -> String {
        format!(
            "{} ({})",
            self.formatter
                .description(&self.data, difference.comparison()),
            difference.result()
        )
    }

    /// Describe all differences, one per line.
    pub fn full_description(&self) -> String {
        self.differences
            .iter()
            .map(|difference| self.describe(difference))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Debug for Diff {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diff")
            .field("differences", &self.differences)
            .finish()
    }
}

/// Shows the first difference, or `[identical]`.
impl Display for Diff {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.differences.first() {
            None => write!(f, "[identical]"),
            Some(difference) => write!(f, "{}", self.describe(difference)),
        }
    }
}

/// Configures and runs a comparison of two documents.
///
/// ```rust
/// use xmlcompare::DiffBuilder;
///
/// let diff = DiffBuilder::compare("<a><b>Test Value</b></a>")
///     .with_test("<a>\n <b>\n  Test Value\n </b>\n</a>")
///     .ignore_whitespace()
///     .build()?;
/// assert!(!diff.has_differences());
/// # Ok::<(), xmlcompare::Error>(())
/// ```
pub struct DiffBuilder {
    control: Input,
    test: Option<Input>,
    ignore_whitespace: bool,
    normalize_whitespace: bool,
    ignore_element_content_whitespace: bool,
    ignore_comments: bool,
    node_matcher: Option<Arc<dyn NodeMatcher>>,
    difference_evaluator: Option<DifferenceEvaluator>,
    comparison_controller: Option<ComparisonController>,
    namespace_context: Option<HashMap<String, String>>,
    attribute_filter: Option<AttributeFilter>,
    node_filter: Option<NodeFilter>,
    results_to_check: &'static [ComparisonResult],
    comparison_listeners: Vec<ComparisonListener>,
    difference_listeners: Vec<ComparisonListener>,
    formatter: Arc<dyn ComparisonFormatter>,
}

impl DiffBuilder {
    /// Start with the control document.
    pub fn compare(control: impl Into<Input>) -> Self {
        DiffBuilder {
            control: control.into(),
            test: None,
            ignore_whitespace: false,
            normalize_whitespace: false,
            ignore_element_content_whitespace: false,
            ignore_comments: false,
            node_matcher: None,
            difference_evaluator: None,
            comparison_controller: None,
            namespace_context: None,
            attribute_filter: None,
            node_filter: None,
            results_to_check: CHECK_FOR_IDENTICAL,
            comparison_listeners: Vec::new(),
            difference_listeners: Vec::new(),
            formatter: Arc::new(DefaultComparisonFormatter),
        }
    }

    /// The document to compare against the control.
    pub fn with_test(mut self, test: impl Into<Input>) -> Self {
        self.test = Some(test.into());
        self
    }

    /// Trim text and drop whitespace-only text before comparing.
    pub fn ignore_whitespace(mut self) -> Self {
        self.ignore_whitespace = true;
        self
    }

    /// Trim text, collapse whitespace runs and drop empty text before
    /// comparing.
    pub fn normalize_whitespace(mut self) -> Self {
        self.normalize_whitespace = true;
        self
    }

    /// Drop whitespace-only text before comparing.
    pub fn ignore_element_content_whitespace(mut self) -> Self {
        self.ignore_element_content_whitespace = true;
        self
    }

    /// Drop comments before comparing.
    pub fn ignore_comments(mut self) -> Self {
        self.ignore_comments = true;
        self
    }

    /// Use a different node matcher.
    pub fn with_node_matcher(mut self, node_matcher: impl NodeMatcher + 'static) -> Self {
        self.node_matcher = Some(Arc::new(node_matcher));
        self
    }

    /// Use a different difference evaluator.
    pub fn with_difference_evaluator(mut self, difference_evaluator: DifferenceEvaluator) -> Self {
        self.difference_evaluator = Some(difference_evaluator);
        self
    }

    /// Use a different comparison controller.
    pub fn with_comparison_controller(
        mut self,
        comparison_controller: ComparisonController,
    ) -> Self {
        self.comparison_controller = Some(comparison_controller);
        self
    }

    /// Prefixes to use in XPaths, mapped to namespace URIs.
    pub fn with_namespace_context(mut self, prefix_to_uri: HashMap<String, String>) -> Self {
        self.namespace_context = Some(prefix_to_uri);
        self
    }

    /// Only compare attributes accepted by `attribute_filter`.
    pub fn with_attribute_filter(mut self, attribute_filter: AttributeFilter) -> Self {
        self.attribute_filter = Some(attribute_filter);
        self
    }

    /// Only compare nodes accepted by `node_filter`.
    pub fn with_node_filter(mut self, node_filter: NodeFilter) -> Self {
        self.node_filter = Some(node_filter);
        self
    }

    /// Only retain `Different` outcomes.
    pub fn check_for_similar(mut self) -> Self {
        self.results_to_check = CHECK_FOR_SIMILAR;
        self
    }

    /// Retain `Similar` and `Different` outcomes. This is the default.
    pub fn check_for_identical(mut self) -> Self {
        self.results_to_check = CHECK_FOR_IDENTICAL;
        self
    }

    /// Also report every comparison to `listener`.
    pub fn with_comparison_listener(
        mut self,
        listener: impl FnMut(&Comparison, ComparisonResult) + 'static,
    ) -> Self {
        self.comparison_listeners.push(Box::new(listener));
        self
    }

    /// Also report every non-equal comparison to `listener`.
    pub fn with_difference_listener(
        mut self,
        listener: impl FnMut(&Comparison, ComparisonResult) + 'static,
    ) -> Self {
        self.difference_listeners.push(Box::new(listener));
        self
    }

    /// Use a different formatter for the diff's descriptions.
    pub fn with_comparison_formatter(
        mut self,
        formatter: impl ComparisonFormatter + 'static,
    ) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    fn prepare(&self, data: &mut XmlData, input: &Input) -> Result<Node, Error> {
        let document = input.parse(data)?;
        if self.ignore_comments {
            transform::strip_comments(data, document);
        }
        if self.normalize_whitespace {
            transform::normalize_whitespace(data, document);
        } else if self.ignore_whitespace {
            transform::strip_whitespace(data, document);
        } else if self.ignore_element_content_whitespace {
            transform::strip_element_content_whitespace(data, document);
        }
        Ok(document)
    }

    /// Parse both documents, compare them and collect the differences.
    pub fn build(mut self) -> Result<Diff, Error> {
        let test_input = self.test.take().ok_or_else(|| {
            Error::InvalidConfiguration("no test document to compare with".to_string())
        })?;
        let mut data = XmlData::new();
        let control = self.prepare(&mut data, &self.control)?;
        let test = self.prepare(&mut data, &test_input)?;

        let mut engine = DomDifferenceEngine::new();
        let collected = Rc::new(RefCell::new(Vec::new()));
        let sink = collected.clone();
        let results_to_check = self.results_to_check;
        engine.add_difference_listener(move |comparison: &Comparison, outcome: ComparisonResult| {
            if results_to_check.contains(&outcome) {
                sink.borrow_mut()
                    .push(Difference::new(comparison.clone(), outcome));
            }
        });
        if let Some(node_matcher) = self.node_matcher {
            engine.set_node_matcher(node_matcher);
        }
        if let Some(difference_evaluator) = self.difference_evaluator {
            engine.set_difference_evaluator(difference_evaluator);
        }
        if let Some(comparison_controller) = self.comparison_controller {
            engine.set_comparison_controller(comparison_controller);
        }
        if let Some(namespace_context) = self.namespace_context {
            engine.set_namespace_context(namespace_context);
        }
        if let Some(attribute_filter) = self.attribute_filter {
            engine.set_attribute_filter(attribute_filter);
        }
        if let Some(node_filter) = self.node_filter {
            engine.set_node_filter(node_filter);
        }
        for listener in self.comparison_listeners {
            engine.add_comparison_listener(listener);
        }
        for listener in self.difference_listeners {
            engine.add_difference_listener(listener);
        }

        engine.compare(&data, control, test)?;
        drop(engine);
        let differences = collected.take();
        Ok(Diff {
            data,
            control,
            test,
            differences,
            formatter: self.formatter,
        })
    }
}
