//! Batch validation.

use serde_json::Value;

use crate::fanout::error::FanoutError;

/// Prefix of the message returned when the body is not an array.
pub const INVALID_INPUT_PREFIX: &str = "No array is passed in. Was given: ";

/// An ordered, validated sequence of items. Items are identified only by position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    items: Vec<Value>,
}

impl Batch {
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    /// Accept a request body only if it is a JSON array.
    ///
    /// An absent body is reported the same way as an explicit `null`.
    pub fn from_body(body: Option<Value>) -> Result<Self, FanoutError> {
        match body {
            Some(Value::Array(items)) => Ok(Self { items }),
            Some(other) => Err(invalid_input(&other)),
            None => Err(invalid_input(&Value::Null)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the batch, yielding each item with its fixed position.
    pub fn into_items(self) -> impl Iterator<Item = (usize, Value)> {
        self.items.into_iter().enumerate()
    }
}

fn invalid_input(received: &Value) -> FanoutError {
    FanoutError::InvalidInput(format!("{INVALID_INPUT_PREFIX}{received}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_is_accepted() {
        let batch = Batch::from_body(Some(json!([1, "two", {"three": 3}]))).unwrap();
        assert_eq!(batch.len(), 3);
        let positions: Vec<usize> = batch.into_items().map(|(i, _)| i).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_non_arrays_are_rejected_with_their_json() {
        let cases = [
            (Some(json!({"post": 1})), r#"{"post":1}"#),
            (Some(json!(42)), "42"),
            (Some(json!("hello")), r#""hello""#),
            (Some(json!(true)), "true"),
            (Some(Value::Null), "null"),
            (None, "null"),
        ];

        for (body, rendered) in cases {
            let err = Batch::from_body(body).unwrap_err();
            assert_eq!(
                err,
                FanoutError::InvalidInput(format!("{INVALID_INPUT_PREFIX}{rendered}"))
            );
        }
    }
}
