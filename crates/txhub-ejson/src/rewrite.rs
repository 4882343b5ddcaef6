//! MongoDB Shell literal rewriting
//!
//! Turns constructor calls such as `ObjectId("...")` or `ISODate("...")`
//! into Extended JSON wrapper objects so the text becomes parseable JSON.
//! Purely syntactic and best effort: a rule without matches is a no-op and
//! nothing here ever fails.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A string argument in either quote style, as two alternative groups.
macro_rules! quoted {
    () => {
        r#"(?:"([^"]*)"|'([^']*)')"#
    };
}

/// Optional `new` keyword in front of a constructor name.
macro_rules! ctor {
    ($name:literal) => {
        concat!(r"\b(?:new\s+)?", $name, r"\s*\(\s*")
    };
}

/// One pattern-and-substitute rule
struct Rule {
    name: &'static str,
    pattern: Regex,
    render: fn(&Captures<'_>) -> String,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, render: fn(&Captures<'_>) -> String) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("rewrite rule pattern is a valid regex"),
            render,
        }
    }
}

/// First participating group among `groups`.
fn pick<'t>(caps: &Captures<'t>, groups: &[usize]) -> &'t str {
    groups
        .iter()
        .find_map(|&i| caps.get(i))
        .map_or("", |m| m.as_str())
}

/// Decode the escapes of a Shell string literal body.
///
/// Unknown escapes keep the escaped character, as Shell strings do.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    _ => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// JSON string literal holding `text`
fn json_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Captured string argument, re-encoded as a JSON string literal.
fn arg(caps: &Captures<'_>, groups: &[usize]) -> String {
    json_string(&unescape(pick(caps, groups)))
}

/// `DBRef` comes first so a nested `ObjectId` argument is consumed with it.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(
            "DBRef",
            concat!(
                ctor!("DBRef"),
                quoted!(),
                r"\s*,\s*(?:",
                quoted!(),
                "|",
                ctor!("ObjectId"),
                quoted!(),
                r"\s*\))\s*\)"
            ),
            |c| {
                format!(
                    r#"{{"$ref": {}, "$id": {}}}"#,
                    arg(c, &[1, 2]),
                    arg(c, &[3, 4, 5, 6])
                )
            },
        ),
        Rule::new(
            "ObjectId",
            concat!(ctor!("ObjectId"), quoted!(), r"\s*\)"),
            |c| format!(r#"{{"$oid": {}}}"#, arg(c, &[1, 2])),
        ),
        Rule::new(
            "ISODate",
            concat!(r"\b(?:new\s+)?(?:ISODate|Date)\s*\(\s*", quoted!(), r"\s*\)"),
            |c| format!(r#"{{"$date": {}}}"#, arg(c, &[1, 2])),
        ),
        Rule::new(
            "NumberLong",
            concat!(ctor!("NumberLong"), r#"(?:"(-?\d+)"|'(-?\d+)'|(-?\d+))\s*\)"#),
            |c| format!(r#"{{"$numberLong": "{}"}}"#, pick(c, &[1, 2, 3])),
        ),
        Rule::new(
            "NumberInt",
            concat!(ctor!("NumberInt"), r#"(?:"(-?\d+)"|'(-?\d+)'|(-?\d+))\s*\)"#),
            |c| {
                let digits = pick(c, &[1, 2, 3]);
                match digits.parse::<i64>() {
                    Ok(n) => format!(r#"{{"$numberInt": {n}}}"#),
                    Err(_) => c[0].to_string(),
                }
            },
        ),
        Rule::new(
            "NumberDouble",
            concat!(
                ctor!("NumberDouble"),
                r#"(?:"([^"]*)"|'([^']*)'|([-+]?(?:\d+\.?\d*(?:[eE][-+]?\d+)?|\.\d+)))\s*\)"#
            ),
            |c| format!(r#"{{"$numberDouble": {}}}"#, arg(c, &[1, 2, 3])),
        ),
        Rule::new("Timestamp", concat!(ctor!("Timestamp"), r"([^)]*)\)"), |c| {
            let expr = pick(c, &[1]).trim();
            format!(r#"{{"$timestamp": {}}}"#, json_string(expr))
        }),
        Rule::new(
            "BinData",
            concat!(ctor!("BinData"), r"\d+\s*,\s*", quoted!(), r"\s*\)"),
            |c| format!(r#"{{"$binary": {}}}"#, arg(c, &[1, 2])),
        ),
        Rule::new(
            "RegExp",
            concat!(
                ctor!("RegExp"),
                quoted!(),
                r"(?:\s*,\s*",
                quoted!(),
                r")?\s*\)"
            ),
            |c| {
                let pattern = unescape(pick(c, &[1, 2]));
                let flags = unescape(pick(c, &[3, 4]));
                format!(r#"{{"$regex": {}}}"#, json_string(&format!("/{pattern}/{flags}")))
            },
        ),
        // Bare words match anywhere, including inside strings and keys.
        Rule::new("undefined", r"undefined", |_| r#"{"$undefined": true}"#.to_string()),
        Rule::new("MinKey", r"MinKey(?:\s*\(\s*\))?", |_| r#"{"$minKey": 1}"#.to_string()),
        Rule::new("MaxKey", r"MaxKey(?:\s*\(\s*\))?", |_| r#"{"$maxKey": 1}"#.to_string()),
    ]
});

/// Outcome of a rewrite pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// Rewritten text
    pub text: String,
    /// Names of the rules that matched at least once, in application order
    pub applied: Vec<&'static str>,
}

impl Rewritten {
    /// Whether any rule changed the input
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Shell literal rewriter over the built-in rule table
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralRewriter;

impl LiteralRewriter {
    /// Create new rewriter
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Apply every rule to `input`
    #[must_use]
    pub fn rewrite(&self, input: &str) -> Rewritten {
        let mut text = input.to_string();
        let mut applied = Vec::new();

        for rule in RULES.iter() {
            if !rule.pattern.is_match(&text) {
                continue;
            }
            text = rule
                .pattern
                .replace_all(&text, |caps: &Captures<'_>| (rule.render)(caps))
                .into_owned();
            applied.push(rule.name);
        }

        Rewritten { text, applied }
    }

    /// Names of the rules, in application order
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        RULES.iter().map(|r| r.name).collect()
    }
}

/// Rewrite Shell literals in `input` with the default rule table
#[must_use]
pub fn rewrite_shell_literals(input: &str) -> String {
    LiteralRewriter::new().rewrite(input).text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_table() {
        let cases = [
            (r#"ObjectId("507f1f77bcf86cd799439011")"#, r#"{"$oid": "507f1f77bcf86cd799439011"}"#),
            (r#"ISODate("2024-01-01T00:00:00Z")"#, r#"{"$date": "2024-01-01T00:00:00Z"}"#),
            (r#"NumberLong("500")"#, r#"{"$numberLong": "500"}"#),
            (r"NumberInt(42)", r#"{"$numberInt": 42}"#),
            (r#"NumberDouble("1.25")"#, r#"{"$numberDouble": "1.25"}"#),
            (r"Timestamp(1700000000, 1)", r#"{"$timestamp": "1700000000, 1"}"#),
            (r#"BinData(0, "aGVsbG8=")"#, r#"{"$binary": "aGVsbG8="}"#),
            (r#"RegExp("ab+c")"#, r#"{"$regex": "/ab+c/"}"#),
            ("undefined", r#"{"$undefined": true}"#),
            ("MinKey", r#"{"$minKey": 1}"#),
            ("MaxKey", r#"{"$maxKey": 1}"#),
            (r#"DBRef("users", "abc")"#, r#"{"$ref": "users", "$id": "abc"}"#),
        ];
        for (input, expected) in cases {
            assert_eq!(rewrite_shell_literals(input), expected, "input: {input}");
        }
    }

    #[test]
    fn quoting_and_new_variants() {
        assert_eq!(
            rewrite_shell_literals("new ObjectId('65a0')"),
            r#"{"$oid": "65a0"}"#
        );
        assert_eq!(
            rewrite_shell_literals(r#"new Date("2024-01-01")"#),
            r#"{"$date": "2024-01-01"}"#
        );
        assert_eq!(rewrite_shell_literals("NumberLong(7)"), r#"{"$numberLong": "7"}"#);
        assert_eq!(rewrite_shell_literals(r#"NumberInt("007")"#), r#"{"$numberInt": 7}"#);
        assert_eq!(rewrite_shell_literals("MinKey()"), r#"{"$minKey": 1}"#);
        assert_eq!(
            rewrite_shell_literals(r#"RegExp("^a", "i")"#),
            r#"{"$regex": "/^a/i"}"#
        );
    }

    #[test]
    fn db_ref_with_object_id_argument() {
        assert_eq!(
            rewrite_shell_literals(r#"DBRef("users", ObjectId("65a0"))"#),
            r#"{"$ref": "users", "$id": "65a0"}"#
        );
    }

    #[test]
    fn embedded_in_document() {
        let input = r#"{"_id": ObjectId("65a0"), "n": NumberInt(3), "when": ISODate("2024-01-01T00:00:00Z")}"#;
        let out = LiteralRewriter::new().rewrite(input);
        assert_eq!(
            out.text,
            r#"{"_id": {"$oid": "65a0"}, "n": {"$numberInt": 3}, "when": {"$date": "2024-01-01T00:00:00Z"}}"#
        );
        assert_eq!(out.applied, vec!["ObjectId", "ISODate", "NumberInt"]);
        assert!(out.changed());
    }

    #[test]
    fn plain_text_is_untouched() {
        let input = r#"{"a": 1, "b": "text"}"#;
        let out = LiteralRewriter::new().rewrite(input);
        assert_eq!(out.text, input);
        assert!(!out.changed());
    }

    #[test]
    fn bare_words_rewrite_inside_strings() {
        // Accepted limitation of substring substitution.
        assert_eq!(
            rewrite_shell_literals(r#"{"note": "was undefined"}"#),
            r#"{"note": "was {"$undefined": true}"}"#
        );
    }

    #[test]
    fn timestamp_expression_is_escaped() {
        assert_eq!(
            rewrite_shell_literals(r#"Timestamp({"t": 1, "i": 2})"#),
            r#"{"$timestamp": "{\"t\": 1, \"i\": 2}"}"#
        );
    }

    #[test]
    fn quoted_arguments_are_reencoded() {
        assert_eq!(
            rewrite_shell_literals(r#"RegExp('say "hi"', 'i')"#),
            r#"{"$regex": "/say \"hi\"/i"}"#
        );
        assert_eq!(
            rewrite_shell_literals(r"ObjectId('a\'b')"),
            r"ObjectId('a\'b')"
        );
        assert_eq!(
            rewrite_shell_literals(r#"BinData(0, 'x"y')"#),
            r#"{"$binary": "x\"y"}"#
        );
        assert_eq!(
            rewrite_shell_literals(r#"DBRef('a"b', 'c\\d')"#),
            r#"{"$ref": "a\"b", "$id": "c\\d"}"#
        );
        assert_eq!(
            rewrite_shell_literals(r#"RegExp("a\\d+")"#),
            r#"{"$regex": "/a\\d+/"}"#
        );
        assert_eq!(unescape(r"tab\there \u0041"), "tab\there A");
    }

    #[test]
    fn rule_table_names() {
        let names = LiteralRewriter::new().rule_names();
        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "DBRef");
    }
}
