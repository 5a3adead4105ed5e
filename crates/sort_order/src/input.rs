use command_core::CommandError;
use serde_json::Value;

/// Requested sort order. `None` fields are resolved from the current settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortOrderInput {
    #[default]
    Unspecified,
    Explicit {
        field: Option<String>,
        reverse: Option<bool>,
    },
}

impl SortOrderInput {
    pub fn field(field: impl Into<String>) -> Self {
        Self::Explicit {
            field: Some(field.into()),
            reverse: None,
        }
    }

    pub fn reverse(reverse: bool) -> Self {
        Self::Explicit {
            field: None,
            reverse: Some(reverse),
        }
    }

    pub fn new(field: Option<String>, reverse: Option<bool>) -> Self {
        if field.is_none() && reverse.is_none() {
            Self::Unspecified
        } else {
            Self::Explicit { field, reverse }
        }
    }

    /// Decodes command arguments: `[]`, `[field]`, `[field, reverse]`, or the single bundle
    /// `[[field, reverse]]` used by deferred execution. `null` means unspecified.
    pub fn from_args(args: &[Value]) -> Result<Self, CommandError> {
        match args {
            [] => Ok(Self::Unspecified),
            [Value::Array(bundle)] => match bundle.as_slice() {
                [] => Ok(Self::Unspecified),
                [field] => Ok(Self::new(field_arg(field)?, None)),
                [field, reverse] => Ok(Self::new(field_arg(field)?, reverse_arg(reverse)?)),
                _ => Err(CommandError::InvalidArgument(format!(
                    "sort order bundle takes [field, reverse], got {} items",
                    bundle.len()
                ))),
            },
            [field] => Ok(Self::new(field_arg(field)?, None)),
            [field, reverse] => Ok(Self::new(field_arg(field)?, reverse_arg(reverse)?)),
            _ => Err(CommandError::InvalidArgument(format!(
                "sort order takes at most two arguments, got {}",
                args.len()
            ))),
        }
    }
}

fn field_arg(value: &Value) -> Result<Option<String>, CommandError> {
    match value {
        Value::Null => Ok(None),
        Value::String(field) => Ok(Some(field.clone())),
        other => Err(CommandError::InvalidArgument(format!(
            "sort field must be a string, got {other}"
        ))),
    }
}

fn reverse_arg(value: &Value) -> Result<Option<bool>, CommandError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(reverse) => Ok(Some(*reverse)),
        other => Err(CommandError::InvalidArgument(format!(
            "sort reverse flag must be a boolean, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_positional_and_bundled_arguments() {
        assert_eq!(
            SortOrderInput::from_args(&[]).expect("empty"),
            SortOrderInput::Unspecified
        );
        assert_eq!(
            SortOrderInput::from_args(&[json!("title")]).expect("field"),
            SortOrderInput::field("title")
        );
        assert_eq!(
            SortOrderInput::from_args(&[Value::Null, json!(true)]).expect("reverse"),
            SortOrderInput::reverse(true)
        );
        assert_eq!(
            SortOrderInput::from_args(&[json!(["order", false])]).expect("bundle"),
            SortOrderInput::Explicit {
                field: Some("order".into()),
                reverse: Some(false),
            }
        );
        assert_eq!(
            SortOrderInput::from_args(&[json!([null, null])]).expect("empty bundle"),
            SortOrderInput::Unspecified
        );
    }

    #[test]
    fn rejects_mistyped_or_extra_arguments() {
        for args in [
            vec![json!(3)],
            vec![json!("title"), json!("yes")],
            vec![json!("title"), json!(true), json!(1)],
            vec![json!(["title", true, false])],
            vec![json!([1, true])],
        ] {
            let err = SortOrderInput::from_args(&args).expect_err("invalid");
            assert!(
                matches!(err, CommandError::InvalidArgument(_)),
                "{args:?} gave {err:?}"
            );
        }
    }
}
