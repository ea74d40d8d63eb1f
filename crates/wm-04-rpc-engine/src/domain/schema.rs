//! Declarative parameter schemas.
//!
//! A method declares the shape of its params once; the pipeline validates
//! before the handler runs and reports the first violation with its path.

use serde_json::{json, Value};
use std::fmt;

/// Block and epoch tags accepted wherever a reference parameter is expected.
pub const BLOCK_TAGS: &[&str] = &[
    "latest_state",
    "latest_mined",
    "latest_confirmed",
    "latest_checkpoint",
    "latest_finalized",
    "earliest",
    "latest",
    "pending",
    "safe",
    "finalized",
];

/// Shape of a params value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSchema {
    Any,
    Null,
    Bool,
    Str,
    /// `0x`-prefixed hex string, possibly empty after the prefix.
    Hex,
    /// `0x` + 40 hex digits, or a `prefix:payload` base32 address.
    Address,
    /// Non-negative integer.
    Uint,
    /// Block/epoch tag or hex number. Omitted positional references are
    /// defaulted by the pipeline.
    BlockRef,
    /// One of a closed set of strings.
    OneOf(Vec<&'static str>),
    /// Positional array. Missing trailing items must be [`ParamSchema::Optional`].
    Tuple(Vec<ParamSchema>),
    ArrayOf(Box<ParamSchema>),
    /// Object with named fields. Unknown fields are allowed.
    Object(Vec<Field>),
    /// Non-empty object whose keys come from a closed set.
    Keys {
        allowed: Vec<&'static str>,
        value: Box<ParamSchema>,
    },
    /// Absent or null, or matching the inner schema.
    Optional(Box<ParamSchema>),
    /// Matches when any alternative matches.
    Or(Vec<ParamSchema>),
}

/// Named member of an [`ParamSchema::Object`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub schema: ParamSchema,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, schema: ParamSchema) -> Self {
        Self {
            name,
            schema,
            required: true,
        }
    }

    pub fn optional(name: &'static str, schema: ParamSchema) -> Self {
        Self {
            name,
            schema,
            required: false,
        }
    }
}

/// First mismatch found while validating.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    /// Location such as `params[0].wallet_accounts`.
    pub path: String,
    pub expected: String,
    pub actual: Value,
}

impl SchemaViolation {
    fn new(path: &str, expected: impl Into<String>, actual: &Value) -> Self {
        Self {
            path: path.to_string(),
            expected: expected.into(),
            actual: actual.clone(),
        }
    }

    /// Structured explanation attached to InvalidParams errors.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "path": self.path,
            "expected": self.expected,
            "actual": self.actual,
        })
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}", self.path, self.expected)
    }
}

impl ParamSchema {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    #[must_use]
    pub fn optional(self) -> Self {
        Self::Optional(Box::new(self))
    }

    pub fn tuple(items: impl IntoIterator<Item = ParamSchema>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    pub fn array_of(item: ParamSchema) -> Self {
        Self::ArrayOf(Box::new(item))
    }

    pub fn object(fields: impl IntoIterator<Item = Field>) -> Self {
        Self::Object(fields.into_iter().collect())
    }

    pub fn one_of(values: &[&'static str]) -> Self {
        Self::OneOf(values.to_vec())
    }

    pub fn keys(allowed: &[&'static str], value: ParamSchema) -> Self {
        Self::Keys {
            allowed: allowed.to_vec(),
            value: Box::new(value),
        }
    }

    pub fn or(alternatives: impl IntoIterator<Item = ParamSchema>) -> Self {
        Self::Or(alternatives.into_iter().collect())
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_) | Self::Any)
    }

    /// Position of the block/epoch reference in a positional schema.
    #[must_use]
    pub fn block_ref_position(&self) -> Option<usize> {
        let Self::Tuple(items) = self else {
            return None;
        };
        items.iter().position(|item| match item {
            Self::BlockRef => true,
            Self::Optional(inner) => **inner == Self::BlockRef,
            _ => false,
        })
    }

    /// Human readable form used in violation reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Any => "any".into(),
            Self::Null => "null".into(),
            Self::Bool => "boolean".into(),
            Self::Str => "string".into(),
            Self::Hex => "0x-prefixed hex string".into(),
            Self::Address => "address".into(),
            Self::Uint => "unsigned integer".into(),
            Self::BlockRef => "block or epoch reference".into(),
            Self::OneOf(values) => format!("one of {}", values.join(", ")),
            Self::Tuple(items) => format!(
                "[{}]",
                items.iter().map(Self::describe).collect::<Vec<_>>().join(", ")
            ),
            Self::ArrayOf(item) => format!("array of {}", item.describe()),
            Self::Object(fields) => format!(
                "object with {}",
                fields
                    .iter()
                    .map(|f| if f.required { f.name.to_string() } else { format!("{}?", f.name) })
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Keys { allowed, .. } => format!("object keyed by {}", allowed.join(", ")),
            Self::Optional(inner) => format!("{}?", inner.describe()),
            Self::Or(alternatives) => alternatives
                .iter()
                .map(Self::describe)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Validate a whole params value.
    pub fn validate(&self, params: &Value) -> Result<(), SchemaViolation> {
        self.check(params, "params")
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let mismatch = || Err(SchemaViolation::new(path, self.describe(), value));
        match self {
            Self::Any => Ok(()),
            Self::Null if value.is_null() => Ok(()),
            Self::Bool if value.is_boolean() => Ok(()),
            Self::Str if value.is_string() => Ok(()),
            Self::Hex if value.as_str().is_some_and(is_hex) => Ok(()),
            Self::Address if value.as_str().is_some_and(is_address) => Ok(()),
            Self::Uint if value.as_u64().is_some() => Ok(()),
            Self::BlockRef if value.as_str().is_some_and(is_block_ref) => Ok(()),
            Self::OneOf(values) if value.as_str().is_some_and(|s| values.contains(&s)) => Ok(()),
            Self::Tuple(items) => {
                let values: &[Value] = match value {
                    Value::Array(values) => values,
                    Value::Null => &[],
                    _ => return mismatch(),
                };
                if values.len() > items.len() {
                    return Err(SchemaViolation::new(
                        path,
                        format!("at most {} params", items.len()),
                        value,
                    ));
                }
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    match values.get(i) {
                        Some(v) => item.check(v, &item_path)?,
                        None if item.is_optional() => {}
                        None => {
                            return Err(SchemaViolation::new(
                                &item_path,
                                item.describe(),
                                &Value::Null,
                            ))
                        }
                    }
                }
                Ok(())
            }
            Self::ArrayOf(item) => {
                let Value::Array(values) = value else {
                    return mismatch();
                };
                values
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, v)| item.check(v, &format!("{path}[{i}]")))
            }
            Self::Object(fields) => {
                let Value::Object(map) = value else {
                    return mismatch();
                };
                for field in fields {
                    let field_path = format!("{path}.{}", field.name);
                    match map.get(field.name) {
                        Some(v) => field.schema.check(v, &field_path)?,
                        None if !field.required => {}
                        None => {
                            return Err(SchemaViolation::new(
                                &field_path,
                                field.schema.describe(),
                                &Value::Null,
                            ))
                        }
                    }
                }
                Ok(())
            }
            Self::Keys { allowed, value: inner } => {
                let Value::Object(map) = value else {
                    return mismatch();
                };
                if map.is_empty() {
                    return mismatch();
                }
                for (key, v) in map {
                    let key_path = format!("{path}.{key}");
                    if !allowed.contains(&key.as_str()) {
                        return Err(SchemaViolation::new(
                            &key_path,
                            format!("key in {}", allowed.join(", ")),
                            v,
                        ));
                    }
                    inner.check(v, &key_path)?;
                }
                Ok(())
            }
            Self::Optional(inner) => {
                if value.is_null() {
                    Ok(())
                } else {
                    inner.check(value, path)
                }
            }
            Self::Or(alternatives) => {
                if alternatives.iter().any(|alt| alt.check(value, path).is_ok()) {
                    Ok(())
                } else {
                    mismatch()
                }
            }
            _ => mismatch(),
        }
    }
}

fn is_hex(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|digits| digits.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_address(s: &str) -> bool {
    if let Some(digits) = s.strip_prefix("0x") {
        return digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit());
    }
    match s.split_once(':') {
        Some((prefix, payload)) => {
            !prefix.is_empty()
                && !payload.is_empty()
                && prefix.chars().all(|c| c.is_ascii_alphanumeric())
                && payload.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

fn is_block_ref(s: &str) -> bool {
    BLOCK_TAGS.contains(&s) || (s.len() > 2 && is_hex(s))
}
