use gradegate::parsers::{Node, parse_document};

#[test]
fn parses_prolog_attributes_and_nesting() {
    let doc = parse_document(
        "<?xml version=\"1.0\"?>\n<!-- generated -->\n<suite name='s' n=\"2\">\n  <case \
         name=\"a\"/>\n  <case name=\"b\"><failure>boom</failure></case>\n</suite>\n",
    )
    .expect("parse document");

    assert_eq!(doc.name, "suite");
    assert_eq!(doc.attr("name"), Some("s"));
    assert_eq!(doc.attr("n"), Some("2"));
    assert_eq!(doc.attr("missing"), None);
    assert_eq!(doc.elements().count(), 2);
    assert_eq!(doc.descendants("case").len(), 2);
    assert_eq!(doc.descendants("failure")[0].text_content(), "boom");
}

#[test]
fn decodes_entities_in_text_and_attributes() {
    let doc = parse_document(
        "<m text=\"&lt;-3&gt; &amp; &quot;x&quot; &apos;y&apos;\">&#65;&#x42;&unknown;</m>",
    )
    .unwrap();
    assert_eq!(doc.attr("text"), Some("<-3> & \"x\" 'y'"));
    assert_eq!(doc.text_content(), "AB&unknown;");
}

#[test]
fn keeps_cdata_verbatim() {
    let doc = parse_document("<out><![CDATA[a < b && <tag>]]></out>").unwrap();
    assert_eq!(doc.children, vec![Node::Text("a < b && <tag>".to_string())]);
}

#[test]
fn counts_include_the_root() {
    let doc = parse_document("<error><error/><x><error/></x></error>").unwrap();
    assert_eq!(doc.count("error"), 3);
    assert_eq!(doc.descendants("error").len(), 2);
    assert_eq!(doc.count("missing"), 0);
}

#[test]
fn rejects_mismatched_and_truncated_documents() {
    assert!(parse_document("<a><b></a></b>").is_err());
    assert!(parse_document("<a><b/>").is_err());
    assert!(parse_document("").is_err());
    assert!(parse_document("not xml").is_err());
}
