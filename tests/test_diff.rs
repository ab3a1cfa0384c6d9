use std::sync::Arc;

use rstest::rstest;

use xmlcompare::{
    default_node_filter, selector, ComparisonResult, ComparisonType, DefaultNodeMatcher,
    DiffBuilder, Error, Node, NodeFilter, XmlData,
};

fn kinds(diff: &xmlcompare::Diff) -> Vec<(ComparisonType, ComparisonResult)> {
    diff.differences()
        .iter()
        .map(|d| (d.comparison().comparison_type(), d.result()))
        .collect()
}

#[test]
fn test_whitespace_matters_unless_ignored() {
    let control = "<a><b>Test Value</b></a>";
    let test = "<a>\n <b>\n  Test Value\n </b>\n</a>";
    let diff = DiffBuilder::compare(control)
        .with_test(test)
        .build()
        .unwrap();
    assert!(diff.has_differences());

    let diff = DiffBuilder::compare(control)
        .with_test(test)
        .ignore_whitespace()
        .build()
        .unwrap();
    assert!(!diff.has_differences());
}

#[test]
fn test_normalize_whitespace() {
    let diff = DiffBuilder::compare("<a><b>Test Value</b></a>")
        .with_test("<a>\n <b>\n  Test\n\t Value\n </b>\n</a>")
        .normalize_whitespace()
        .build()
        .unwrap();
    assert!(!diff.has_differences());
}

#[test]
fn test_element_content_whitespace() {
    let diff = DiffBuilder::compare("<a><b>x</b></a>")
        .with_test("<a>\n <b>x</b>\n</a>")
        .ignore_element_content_whitespace()
        .build()
        .unwrap();
    assert!(!diff.has_differences());

    let diff = DiffBuilder::compare("<a><b>x</b></a>")
        .with_test("<a>\n <b> x </b>\n</a>")
        .ignore_element_content_whitespace()
        .build()
        .unwrap();
    assert_eq!(
        kinds(&diff),
        vec![(ComparisonType::TextValue, ComparisonResult::Different)]
    );
}

#[test]
fn test_ignore_comments() {
    let control = "<a><!-- note --><b/></a>";
    let test = "<a><b/></a>";
    assert!(DiffBuilder::compare(control)
        .with_test(test)
        .build()
        .unwrap()
        .has_differences());
    assert!(!DiffBuilder::compare(control)
        .with_test(test)
        .ignore_comments()
        .build()
        .unwrap()
        .has_differences());
}

#[test]
fn test_ignore_comments_inside_text() {
    let diff = DiffBuilder::compare("<a>foo<!--c-->bar</a>")
        .with_test("<a>foobar</a>")
        .ignore_comments()
        .build()
        .unwrap();
    assert!(!diff.has_differences());
}

#[test]
fn test_cdata_is_similar_to_text() {
    let control = "<a>Test Value</a>";
    let test = "<a><![CDATA[Test Value]]></a>";
    let similar = DiffBuilder::compare(control)
        .with_test(test)
        .check_for_similar()
        .build()
        .unwrap();
    assert!(!similar.has_differences());

    let identical = DiffBuilder::compare(control)
        .with_test(test)
        .check_for_identical()
        .build()
        .unwrap();
    assert_eq!(
        kinds(&identical),
        vec![(ComparisonType::NodeType, ComparisonResult::Similar)]
    );
}

#[test]
fn test_attribute_values() {
    let diff = DiffBuilder::compare(r#"<a attr1="abc" attr2="def"></a>"#)
        .with_test(r#"<a attr1="uvw" attr2="xyz"></a>"#)
        .build()
        .unwrap();
    assert_eq!(
        kinds(&diff),
        vec![
            (ComparisonType::AttrValue, ComparisonResult::Different),
            (ComparisonType::AttrValue, ComparisonResult::Different),
        ]
    );
}

#[test]
fn test_order_insensitive_by_name() {
    let diff = DiffBuilder::compare("<a><c/><b/></a>")
        .with_test("<a><b/><c/></a>")
        .with_node_matcher(DefaultNodeMatcher::new([selector::by_name()]))
        .check_for_similar()
        .build()
        .unwrap();
    assert!(!diff.has_differences());
}

#[test]
fn test_document_order_by_default() {
    let diff = DiffBuilder::compare("<a><c/><b/></a>")
        .with_test("<a><b/><c/></a>")
        .build()
        .unwrap();
    assert!(kinds(&diff).contains(&(ComparisonType::ElementTagName, ComparisonResult::Different)));
}

#[test]
fn test_extra_child() {
    let diff = DiffBuilder::compare("<a><b></b><c/></a>")
        .with_test("<a><b></b><c/><d/></a>")
        .build()
        .unwrap();
    assert_eq!(
        kinds(&diff),
        vec![
            (ComparisonType::ChildNodelistLength, ComparisonResult::Different),
            (ComparisonType::ChildLookup, ComparisonResult::Different),
        ]
    );
    let lookup = diff.differences()[1].comparison();
    assert_eq!(lookup.control().target(), None);
    assert_eq!(lookup.control().xpath(), None);
    assert_eq!(lookup.test().xpath(), Some("/a[1]/d[1]"));
}

#[test]
fn test_node_filter_hides_child() {
    let default = default_node_filter();
    let without_d: NodeFilter = Arc::new(move |data: &XmlData, node: Node| {
        default(data, node) && data.node_name(node).local_name() != "d"
    });
    let diff = DiffBuilder::compare("<a><b></b><c/></a>")
        .with_test("<a><b></b><c/><d/></a>")
        .with_node_filter(without_d)
        .build()
        .unwrap();
    assert!(!diff.has_differences());
}

#[rstest]
#[case(
    "<fruits><fruit/><fruit/><fruit>apple</fruit></fruits>",
    "<fruits><fruit/><fruit/><fruit>pear</fruit></fruits>",
    "/fruits[1]/fruit[3]/text()[1]"
)]
#[case(
    "<fruits><fruit/><fruit/><fruit n='1'/></fruits>",
    "<fruits><fruit/><fruit/><fruit n='2'/></fruits>",
    "/fruits[1]/fruit[3]/@n"
)]
#[case("<b>x<!--c-->y</b>", "<b>x<!--c-->z</b>", "/b[1]/text()[2]")]
#[case("<b>x<?pi?>y</b>", "<b>x<?pi?>z</b>", "/b[1]/text()[2]")]
fn test_xpath_of_difference(#[case] control: &str, #[case] test: &str, #[case] xpath: &str) {
    let diff = DiffBuilder::compare(control)
        .with_test(test)
        .build()
        .unwrap();
    assert_eq!(diff.differences().len(), 1);
    let comparison = diff.differences()[0].comparison();
    assert_eq!(comparison.control().xpath(), Some(xpath));
    assert_eq!(comparison.test().xpath(), Some(xpath));
}

#[rstest]
#[case(r#"<a x="1"/>"#, "<a/>")]
#[case("<a><b/></a>", "<a><b/><c/></a>")]
#[case("<a>x</a>", "<a>y</a>")]
#[case("<a><c/><b/></a>", "<a><b/><c/></a>")]
fn test_swapping_finds_as_many_differences(#[case] left: &str, #[case] right: &str) {
    let forward = DiffBuilder::compare(left).with_test(right).build().unwrap();
    let backward = DiffBuilder::compare(right).with_test(left).build().unwrap();
    assert_eq!(
        forward.differences().len(),
        backward.differences().len()
    );
}

#[test]
fn test_bytes_and_text_compare_equal() {
    let diff = DiffBuilder::compare("<a>x</a>".as_bytes())
        .with_test("<a>x</a>".to_string())
        .build()
        .unwrap();
    assert!(!diff.has_differences());
}

#[test]
fn test_missing_test_is_configuration_error() {
    let result = DiffBuilder::compare("<a/>").build();
    assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
}

#[test]
fn test_display() {
    let identical = DiffBuilder::compare("<a/>").with_test("<a/>").build().unwrap();
    assert_eq!(identical.to_string(), "[identical]");

    let diff = DiffBuilder::compare(r#"<a attr1="abc" attr2="def"></a>"#)
        .with_test(r#"<a attr1="uvw" attr2="xyz"></a>"#)
        .build()
        .unwrap();
    insta::assert_snapshot!(
        diff.to_string(),
        @r###"Expected attribute value 'abc' but was 'uvw' - comparing <a attr1="abc"...> at /a[1]/@attr1 to <a attr1="uvw"...> at /a[1]/@attr1 (DIFFERENT)"###
    );
    insta::assert_snapshot!(diff.full_description(), @r###"
    Expected attribute value 'abc' but was 'uvw' - comparing <a attr1="abc"...> at /a[1]/@attr1 to <a attr1="uvw"...> at /a[1]/@attr1 (DIFFERENT)
    Expected attribute value 'def' but was 'xyz' - comparing <a attr2="def"...> at /a[1]/@attr2 to <a attr2="xyz"...> at /a[1]/@attr2 (DIFFERENT)
    "###);
}
