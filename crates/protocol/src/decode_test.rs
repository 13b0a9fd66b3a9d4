//! Tests for the bracket notation decoder

use crate::{FormatError, Node, has_partial_node, next_node, parse_block};

fn v(s: &str) -> Node {
    Node::Value(s.to_string())
}

fn t(s: &str) -> Node {
    Node::Text(s.to_string())
}

// =============================================================================
// parse_block
// =============================================================================

#[test]
fn test_parse_flat_list() {
    let node = parse_block("{1,\"Alice\",7}").unwrap();
    assert_eq!(node, Node::List(vec![v("1"), t("Alice"), v("7")]));
}

#[test]
fn test_parse_nested_lists() {
    let node = parse_block("{20240315103000,U,{0,0},{\"P\",{6,{\"S\",\"x\"}}}}").unwrap();
    assert_eq!(node.len(), 4);
    assert_eq!(node.get(2), Some(&Node::List(vec![v("0"), v("0")])));

    let data = node.list_field(3).unwrap();
    assert_eq!(data.str_field(0).unwrap(), "P");
    let inner = data.list_field(1).unwrap();
    assert_eq!(inner.int_field::<i32>(0).unwrap(), 6);
}

#[test]
fn test_parse_doubled_quote_escape() {
    let node = parse_block(r#"{"say ""hi"" twice"}"#).unwrap();
    assert_eq!(node.get(0), Some(&t("say \"hi\" twice")));
}

#[test]
fn test_parse_braces_inside_string_are_text() {
    let node = parse_block(r#"{"{not a list}",1}"#).unwrap();
    assert_eq!(node.get(0), Some(&t("{not a list}")));
    assert_eq!(node.get(1), Some(&v("1")));
}

#[test]
fn test_parse_multiline_with_trailing_separator() {
    let node = parse_block("{1,\r\n{2,3},\r\n\"a\r\nb\"},\r\n").unwrap();
    assert_eq!(node.len(), 3);
    assert_eq!(node.get(2), Some(&t("a\r\nb")));
}

#[test]
fn test_parse_empty_list() {
    assert_eq!(parse_block("{}").unwrap(), Node::List(vec![]));
    assert_eq!(parse_block("{ }").unwrap(), Node::List(vec![]));
}

#[test]
fn test_parse_empty_input() {
    assert_eq!(parse_block("  \r\n"), Err(FormatError::Empty));
}

#[test]
fn test_parse_unbalanced() {
    let err = parse_block("{1,{2,3}").unwrap_err();
    assert_eq!(err, FormatError::Unbalanced { offset: 0 });
}

#[test]
fn test_parse_extra_close_brace() {
    let err = parse_block("{1}}").unwrap_err();
    assert!(matches!(err, FormatError::Unexpected { offset: 3, found: '}' }));
}

#[test]
fn test_parse_unterminated_string() {
    let err = parse_block("{\"abc}").unwrap_err();
    assert_eq!(err, FormatError::UnterminatedString { offset: 1 });
}

#[test]
fn test_roundtrip_serialize() {
    let source = r#"{20240315103000,U,{2440afb1f2e00,1c4},1,"say ""hi""",{"P",{1,{"S","x"},{"B","1"}}},{}}"#;
    let node = parse_block(source).unwrap();

    let text = node.to_string();
    assert_eq!(text, source);
    assert_eq!(parse_block(&text).unwrap(), node);
}

#[test]
fn test_to_notation_rejects_lone_empty_value() {
    let lone = Node::List(vec![v("")]);
    assert!(matches!(
        lone.to_notation(),
        Err(FormatError::Unrepresentable { .. })
    ));

    let pair = Node::List(vec![v(""), v("")]);
    let text = pair.to_notation().unwrap();
    assert_eq!(text, "{,}");
    assert_eq!(parse_block(&text).unwrap(), pair);
}

/// Small deterministic generator for tree shapes
struct Lcg(u64);

impl Lcg {
    fn below(&mut self, n: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) % n as u64) as usize
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }

    fn node(&mut self, depth: usize) -> Node {
        const VALUES: [&str; 9] = ["0", "1", "20240315103000", "U", "I", "2440afb1f2e00", "1c4", "", "a b"];
        const BAD_VALUES: [&str; 6] = [" a", "a,b", "x{", "q}", "a\"b", "  "];
        const TEXTS: [&str; 7] = ["", "Alice", "say \"hi\"", "{not a list}", "a,b", "line\r\nbreak", "\""];

        if depth == 0 || self.below(3) == 0 {
            return match self.below(20) {
                0 => v(self.pick(&BAD_VALUES)),
                1..=10 => v(self.pick(&VALUES)),
                _ => t(self.pick(&TEXTS)),
            };
        }
        let len = self.below(5);
        Node::List((0..len).map(|_| self.node(depth - 1)).collect())
    }
}

#[test]
fn test_roundtrip_generated_trees() {
    let mut rng = Lcg(0x1c8);
    let (mut written, mut rejected) = (0, 0);

    for _ in 0..2000 {
        let node = rng.node(4);
        match node.to_notation() {
            Ok(text) => {
                assert_eq!(parse_block(&text), Ok(node.clone()), "text: {text}");
                written += 1;
            }
            Err(_) => {
                // Rejected trees are exactly the ones plain writing loses
                assert_ne!(parse_block(&node.to_string()), Ok(node.clone()), "tree: {node:?}");
                rejected += 1;
            }
        }
    }

    assert!(written > 200, "only {written} trees written");
    assert!(rejected > 20, "only {rejected} trees rejected");
}

#[test]
fn test_field_errors_carry_index() {
    let node = parse_block("{1,{2},x}").unwrap();

    assert_eq!(node.field(5).unwrap_err(), FormatError::MissingField { index: 5 });
    assert!(matches!(
        node.str_field(1),
        Err(FormatError::InvalidField { index: 1, .. })
    ));
    assert!(matches!(
        node.int_field::<i64>(2),
        Err(FormatError::InvalidField { index: 2, .. })
    ));
    assert!(matches!(
        node.list_field(0),
        Err(FormatError::InvalidField { index: 0, .. })
    ));
}

// =============================================================================
// next_node
// =============================================================================

#[test]
fn test_next_node_skips_header() {
    let buf = b"\xEF\xBB\xBF1CV8LOG(ver 2.0)\r\n0b2c4d5e-0000\r\n\r\n{1,2},\r\n{3,4},\r\n";

    let (node, consumed) = next_node(buf).unwrap().unwrap();
    assert_eq!(node, Node::List(vec![v("1"), v("2")]));
    assert_eq!(&buf[consumed..consumed + 1], b"{");

    let (node, rest) = next_node(&buf[consumed..]).unwrap().unwrap();
    assert_eq!(node, Node::List(vec![v("3"), v("4")]));
    assert_eq!(consumed + rest, buf.len());
}

#[test]
fn test_next_node_partial_returns_none() {
    assert!(next_node(b"{1,{2,").unwrap().is_none());
    assert!(next_node(b"{1,\"open } string").unwrap().is_none());
    assert!(next_node(b"header only\r\n").unwrap().is_none());
    assert!(next_node(b"").unwrap().is_none());
}

#[test]
fn test_next_node_completes_after_append() {
    let mut buf = b"{1,\"a".to_vec();
    assert!(next_node(&buf).unwrap().is_none());

    buf.extend_from_slice(b"}\"},\r\n");
    let (node, consumed) = next_node(&buf).unwrap().unwrap();
    assert_eq!(node, Node::List(vec![v("1"), t("a}")]));
    assert_eq!(consumed, buf.len());
}

#[test]
fn test_next_node_separator_not_yet_written() {
    let (_, consumed) = next_node(b"{1}").unwrap().unwrap();
    assert_eq!(consumed, 3);
}

#[test]
fn test_next_node_multibyte_text() {
    let buf = "{\"Пользователь\",1},\r\n".as_bytes();
    let (node, consumed) = next_node(buf).unwrap().unwrap();
    assert_eq!(node.get(0), Some(&t("Пользователь")));
    assert_eq!(consumed, buf.len());
}

#[test]
fn test_next_node_invalid_utf8() {
    let buf = b"{\"\xFF\xFE\"}";
    assert_eq!(next_node(buf).unwrap_err(), FormatError::InvalidUtf8);
}

#[test]
fn test_has_partial_node() {
    assert!(has_partial_node(b"\r\n{1,"));
    assert!(!has_partial_node(b",\r\n"));
}
