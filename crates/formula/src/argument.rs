//! Argument types declared by formula functions.
//!
//! An [`ArgumentType`] answers two questions about a value flowing into a function: can it
//! be used ([`ArgumentType::test`], which never fails) and what does it look like once
//! coerced ([`ArgumentType::parse`]).

use std::fmt;

use chrono_tz::Tz;

use crate::error::TypeCoercionError;
use crate::value::{
    Value, ensure_array, ensure_boolean, ensure_datetime, ensure_numeric, ensure_object,
    ensure_string,
};

/// How a number argument is normalised after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberCast {
    #[default]
    None,
    /// Truncate towards zero.
    Int,
    Float,
}

/// The closed set of argument kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Number { cast: NumberCast },
    Text,
    DateTime,
    Object,
    Array,
    /// `strict` rejects the text forms `"true"`/`"false"`.
    Boolean { strict: bool },
    /// An IANA timezone name.
    Timezone,
    Any,
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgumentKind::Number { .. } => "number",
            ArgumentKind::Text => "text",
            ArgumentKind::DateTime => "date",
            ArgumentKind::Object => "object",
            ArgumentKind::Array => "array",
            ArgumentKind::Boolean { .. } => "boolean",
            ArgumentKind::Timezone => "timezone",
            ArgumentKind::Any => "any",
        };
        f.write_str(name)
    }
}

/// A declared argument: its kind and whether it may be left off the end of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentType {
    pub kind: ArgumentKind,
    pub optional: bool,
}

impl ArgumentType {
    pub const fn new(kind: ArgumentKind) -> Self {
        Self {
            kind,
            optional: false,
        }
    }

    pub const fn number() -> Self {
        Self::new(ArgumentKind::Number {
            cast: NumberCast::None,
        })
    }

    pub const fn int() -> Self {
        Self::new(ArgumentKind::Number {
            cast: NumberCast::Int,
        })
    }

    pub const fn float() -> Self {
        Self::new(ArgumentKind::Number {
            cast: NumberCast::Float,
        })
    }

    pub const fn text() -> Self {
        Self::new(ArgumentKind::Text)
    }

    pub const fn datetime() -> Self {
        Self::new(ArgumentKind::DateTime)
    }

    pub const fn object() -> Self {
        Self::new(ArgumentKind::Object)
    }

    pub const fn array() -> Self {
        Self::new(ArgumentKind::Array)
    }

    pub const fn boolean() -> Self {
        Self::new(ArgumentKind::Boolean { strict: false })
    }

    pub const fn strict_boolean() -> Self {
        Self::new(ArgumentKind::Boolean { strict: true })
    }

    pub const fn timezone() -> Self {
        Self::new(ArgumentKind::Timezone)
    }

    pub const fn any() -> Self {
        Self::new(ArgumentKind::Any)
    }

    /// Marks the argument as optional.
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Whether `value` can be used for this argument. Never fails.
    pub fn test(&self, value: &Value) -> bool {
        match self.kind {
            ArgumentKind::Number { .. } => ensure_numeric(value).is_some(),
            // Everything has a string form
            ArgumentKind::Text => true,
            ArgumentKind::DateTime => ensure_datetime(value).is_some(),
            ArgumentKind::Object => ensure_object(value).is_some(),
            ArgumentKind::Array => ensure_array(value).is_some(),
            ArgumentKind::Boolean { strict } => ensure_boolean(value, strict).is_some(),
            ArgumentKind::Timezone => value.as_str().and_then(parse_timezone).is_some(),
            ArgumentKind::Any => true,
        }
    }

    /// Coerce `value` into the shape the function expects.
    ///
    /// Numbers accept `Null` and keep it as `Null`.
    pub fn parse(&self, value: Value) -> Result<Value, TypeCoercionError> {
        let fail = |value: Value| TypeCoercionError::new(self.kind, value);

        match self.kind {
            ArgumentKind::Number { .. } if value == Value::Null => Ok(Value::Null),
            ArgumentKind::Number { cast } => {
                let number = ensure_numeric(&value).ok_or_else(|| fail(value))?;
                let number = match cast {
                    NumberCast::Int => number.trunc(),
                    NumberCast::None | NumberCast::Float => number,
                };
                Ok(Value::Number(number))
            }
            ArgumentKind::Text => Ok(Value::String(ensure_string(&value))),
            ArgumentKind::DateTime => ensure_datetime(&value)
                .map(Value::DateTime)
                .ok_or_else(|| fail(value)),
            ArgumentKind::Object => ensure_object(&value)
                .map(Value::Object)
                .ok_or_else(|| fail(value)),
            ArgumentKind::Array => ensure_array(&value)
                .map(Value::Array)
                .ok_or_else(|| fail(value)),
            ArgumentKind::Boolean { strict } => ensure_boolean(&value, strict)
                .map(Value::Boolean)
                .ok_or_else(|| fail(value)),
            ArgumentKind::Timezone => match value.as_str().and_then(parse_timezone) {
                Some(tz) => Ok(Value::String(tz.name().to_string())),
                None => Err(fail(value)),
            },
            ArgumentKind::Any => Ok(value),
        }
    }
}

/// Looks a name up in the IANA timezone database.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_test_and_parse() {
        let number = ArgumentType::number();
        assert!(number.test(&Value::from("23.34")));
        assert!(!number.test(&Value::from("foo")));
        assert!(!number.test(&Value::Boolean(true)));
        assert!(!number.test(&Value::Null));
        assert_eq!(number.parse(Value::from("2.5")).unwrap(), Value::from(2.5));
        assert_eq!(number.parse(Value::Null).unwrap(), Value::Null);
        assert!(number.parse(Value::from("foo")).is_err());
    }

    #[test]
    fn int_cast_truncates() {
        assert_eq!(
            ArgumentType::int().parse(Value::from(-2.7)).unwrap(),
            Value::from(-2.0)
        );
    }

    #[test]
    fn text_stringifies_everything() {
        let text = ArgumentType::text();
        assert!(text.test(&Value::Null));
        assert_eq!(text.parse(Value::from(12.0)).unwrap(), Value::from("12"));
        assert_eq!(text.parse(Value::Null).unwrap(), Value::from(""));
    }

    #[test]
    fn timezone_names_are_validated() {
        let tz = ArgumentType::timezone();
        assert!(tz.test(&Value::from("Europe/Amsterdam")));
        assert!(tz.test(&Value::from("UTC")));
        assert!(!tz.test(&Value::from("Mars/Olympus")));
        assert!(!tz.test(&Value::from(1.0)));
    }

    #[test]
    fn boolean_variants() {
        assert!(ArgumentType::boolean().test(&Value::from("True")));
        assert!(!ArgumentType::strict_boolean().test(&Value::from("True")));
        assert_eq!(
            ArgumentType::boolean().parse(Value::from("false")).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn optional_flag_is_kept() {
        let arg = ArgumentType::number().optional();
        assert!(arg.optional);
        assert_eq!(arg.kind, ArgumentKind::Number { cast: NumberCast::None });
    }
}
