use ahash::HashMap;
use rstest::rstest;

use xmlcompare::{selector, DefaultNodeMatcher, DiffBuilder, ElementSelector, Error, QName};

fn differs(control: &str, test: &str, selectors: Vec<ElementSelector>) -> bool {
    DiffBuilder::compare(control)
        .with_test(test)
        .with_node_matcher(DefaultNodeMatcher::new(selectors))
        .check_for_similar()
        .build()
        .unwrap()
        .has_differences()
}

const TABLE: &str = "<table><tbody>\
    <tr><th>a</th><td>1</td></tr>\
    <tr><th>b</th><td>2</td></tr>\
    </tbody></table>";

const SWAPPED_TABLE: &str = "<table><tbody>\
    <tr><th>b</th><td>2</td></tr>\
    <tr><th>a</th><td>1</td></tr>\
    </tbody></table>";

#[rstest]
#[case::by_name_and_text(
    "<a><b>1</b><b>2</b></a>",
    "<a><b>2</b><b>1</b></a>",
    selector::by_name_and_text()
)]
#[case::by_name_and_attributes(
    r#"<r><i id="1" v="a"/><i id="2" v="b"/></r>"#,
    r#"<r><i id="2" v="b"/><i id="1" v="a"/></r>"#,
    selector::by_name_and_attributes(["id"])
)]
#[case::by_name_and_all_attributes(
    r#"<r><i id="1" v="a"/><i id="1" v="b"/></r>"#,
    r#"<r><i id="1" v="b"/><i id="1" v="a"/></r>"#,
    selector::by_name_and_all_attributes()
)]
#[case::by_name_and_text_recursive(
    "<r><i><n>1</n></i><i><n>2</n></i></r>",
    "<r><i><n>2</n></i><i><n>1</n></i></r>",
    selector::or([
        selector::selector_for_element_named(QName::local("r"), selector::by_name()),
        selector::by_name_and_text_recursive(),
    ])
)]
fn test_reordered_siblings_match(
    #[case] control: &str,
    #[case] test: &str,
    #[case] selector: ElementSelector,
) {
    assert!(differs(control, test, vec![selector::by_name()]));
    assert!(!differs(control, test, vec![selector]));
}

#[test]
fn test_conditional_table_rows() {
    let prefixes = HashMap::default();
    let rows = selector::when_element_is_named(QName::local("tr"))
        .then_use(selector::by_xpath("./th", &prefixes, selector::by_name_and_text()).unwrap())
        .else_use(selector::by_name())
        .unwrap()
        .build()
        .unwrap();
    assert!(!differs(TABLE, SWAPPED_TABLE, vec![rows]));
    assert!(differs(TABLE, SWAPPED_TABLE, vec![selector::by_name()]));
}

fn for_rows(row_selector: ElementSelector) -> ElementSelector {
    selector::when_element_is_named(QName::local("row"))
        .then_use(row_selector)
        .else_use(selector::by_name())
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn test_multi_level_by_name_and_text() {
    let control = "<r><row><cell>a</cell></row><row><cell>b</cell></row></r>";
    let test = "<r><row><cell>b</cell></row><row><cell>a</cell></row></r>";
    let two_levels = selector::multi_level_by_name_and_text(2, false).unwrap();
    assert!(differs(control, test, vec![selector::by_name()]));
    assert!(!differs(control, test, vec![for_rows(two_levels)]));
}

#[test]
fn test_multi_level_ignoring_empty_texts() {
    let control = "<r><row> <cell>a</cell></row><row> <cell>b</cell></row></r>";
    let test = "<r><row> <cell>b</cell></row><row> <cell>a</cell></row></r>";
    let strict = selector::multi_level_by_name_and_text(2, false).unwrap();
    assert!(differs(control, test, vec![for_rows(strict)]));
    let lenient = selector::multi_level_by_name_and_text(2, true).unwrap();
    assert!(!differs(control, test, vec![for_rows(lenient)]));
}

#[test]
fn test_multiple_selectors() {
    let control = r#"<r><i id="1"/><i id="2"/><j>x</j><j>y</j></r>"#;
    let test = r#"<r><i id="2"/><i id="1"/><j>y</j><j>x</j></r>"#;
    assert!(differs(control, test, vec![selector::by_name()]));
    assert!(!differs(
        control,
        test,
        vec![
            selector::selector_for_element_named(QName::local("r"), selector::by_name()),
            selector::selector_for_element_named(
                QName::local("i"),
                selector::by_name_and_attributes(["id"]),
            ),
            selector::selector_for_element_named(
                QName::local("j"),
                selector::by_name_and_text(),
            ),
        ],
    ));
}

#[test]
fn test_configuration_errors() {
    assert!(matches!(
        selector::multi_level_by_name_and_text(0, false),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(matches!(
        selector::by_xpath("./p:x", &HashMap::default(), selector::by_name()),
        Err(Error::XPath { .. })
    ));
    assert!(matches!(
        selector::when_element_is_named(QName::local("a"))
            .then_use(selector::by_name())
            .else_use(selector::by_name())
            .and_then(|builder| builder.else_use(selector::by_name())),
        Err(Error::InvalidConfiguration(_))
    ));
}
