use std::{borrow::Cow, fmt::Display};

use serde::{Deserialize, Serialize};

/// Chapter and verse labels arrive either as JSON numbers or as strings
/// (`"front"`, `"3-5"`); this is the untyped form before validation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(u64),
    Text(String),
}

impl Display for NumberOrString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberOrString::Number(number) => write!(f, "{number}"),
            NumberOrString::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<u64> for NumberOrString {
    fn from(value: u64) -> Self { NumberOrString::Number(value) }
}

impl From<String> for NumberOrString {
    fn from(value: String) -> Self { NumberOrString::Text(value) }
}

impl From<&str> for NumberOrString {
    fn from(value: &str) -> Self { NumberOrString::Text(value.to_owned()) }
}

impl<'a> From<Cow<'a, str>> for NumberOrString {
    fn from(value: Cow<'a, str>) -> Self { NumberOrString::Text(value.into_owned()) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_deserialises_numbers_and_strings() {
        let parsed: Vec<NumberOrString> = serde_json::from_str(r#"[3, "front", "3-5"]"#).unwrap();

        assert_eq!(
            parsed,
            vec![
                NumberOrString::Number(3),
                NumberOrString::Text("front".to_owned()),
                NumberOrString::Text("3-5".to_owned()),
            ]
        );
        assert_eq!(parsed[2].to_string(), "3-5");
    }
}
