//! JSON encodings used inside embed URLs.
//!
//! Two flavours are needed and they must not be unified:
//!
//! - [`to_compact_string`]: keys sorted, no whitespace. Used for every
//!   structured embed parameter (custom theme, roles, groups, UI settings,
//!   user attributes).
//! - [`to_spaced_string`]: fields in declaration order, `", "` and `": "`
//!   separators. Used for filter values inside `filterSearchParam`.
//!
//! Both escape everything outside printable ASCII as `\uXXXX`, which is what
//! the verifying server's encoder produces.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Value};

/// Serialize `value` with sorted keys and no insignificant whitespace.
pub fn to_compact_string(value: &Value) -> String {
    write_with(&sort_keys(value), AsciiFormatter::COMPACT)
}

/// Serialize `value` in field declaration order with spaced separators.
pub fn to_spaced_string<T: Serialize + ?Sized>(value: &T) -> String {
    write_with(value, AsciiFormatter::SPACED)
}

fn write_with<T: Serialize + ?Sized>(value: &T, formatter: AsciiFormatter) -> String {
    let mut out = Vec::with_capacity(64);
    let mut ser = Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut ser)
        .expect("JSON serialization into memory cannot fail");
    // The formatter only ever writes ASCII.
    String::from_utf8(out).expect("ASCII output is valid UTF-8")
}

/// Rebuild `value` with every object's keys inserted in sorted order.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

struct AsciiFormatter {
    item_separator: &'static [u8],
    key_separator: &'static [u8],
}

impl AsciiFormatter {
    const COMPACT: Self = Self {
        item_separator: b",",
        key_separator: b":",
    };
    const SPACED: Self = Self {
        item_separator: b", ",
        key_separator: b": ",
    };
}

impl Formatter for AsciiFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(self.item_separator)
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(self.item_separator)
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.key_separator)
    }

    // serde_json has already escaped quotes, backslashes and control
    // characters; fragments hold everything else verbatim.
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compact_sorts_keys_recursively() {
        let value = json!({"b": 1, "a": {"z": true, "y": [3, {"d": null, "c": "x"}]}});
        assert_eq!(
            to_compact_string(&value),
            r#"{"a":{"y":[3,{"c":"x","d":null}],"z":true},"b":1}"#
        );
    }

    #[test]
    fn compact_is_independent_of_insertion_order() {
        let mut first = Map::new();
        first.insert("country".into(), json!("USA"));
        first.insert("tier".into(), json!(2));
        let mut second = Map::new();
        second.insert("tier".into(), json!(2));
        second.insert("country".into(), json!("USA"));
        assert_eq!(
            to_compact_string(&Value::Object(first)),
            to_compact_string(&Value::Object(second))
        );
    }

    #[test]
    fn compact_list_has_no_spaces() {
        assert_eq!(
            to_compact_string(&json!(["group1", "group2"])),
            r#"["group1","group2"]"#
        );
    }

    #[test]
    fn escapes_non_ascii_as_utf16_units() {
        assert_eq!(to_compact_string(&json!("café")), r#""caf\u00e9""#);
        assert_eq!(to_compact_string(&json!("😀")), r#""\ud83d\ude00""#);
        assert_eq!(to_compact_string(&json!("a\u{7f}b")), r#""a\u007fb""#);
    }

    #[test]
    fn keeps_standard_escapes() {
        assert_eq!(
            to_compact_string(&json!("line\n\"quoted\"\\")),
            r#""line\n\"quoted\"\\""#
        );
        assert_eq!(to_compact_string(&json!("\u{1}")), r#""\u0001""#);
    }

    #[test]
    fn spaced_keeps_declaration_order() {
        #[derive(Serialize)]
        struct Sample {
            zulu: bool,
            alpha: Vec<i32>,
        }
        assert_eq!(
            to_spaced_string(&Sample {
                zulu: false,
                alpha: vec![10, 25],
            }),
            r#"{"zulu": false, "alpha": [10, 25]}"#
        );
    }

    #[test]
    fn empty_containers() {
        assert_eq!(to_compact_string(&json!({})), "{}");
        assert_eq!(to_spaced_string(&json!([])), "[]");
    }
}
