// Interpretation output shared by both tiers.

use serde::{Deserialize, Serialize};

use crate::ops::Operation;

/// Outcome of interpreting one utterance: an explanation for the user and
/// an ordered (possibly empty) operation batch. Zero operations is a valid
/// result and represents a pure answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretationResult {
    pub explanation: String,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl InterpretationResult {
    pub fn new(explanation: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self { explanation: explanation.into(), operations }
    }

    /// A pure answer with no operations.
    pub fn answer(explanation: impl Into<String>) -> Self {
        Self { explanation: explanation.into(), operations: Vec::new() }
    }

    pub fn is_pure_answer(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_has_no_operations() {
        let r = InterpretationResult::answer("the sum is 12");
        assert!(r.is_pure_answer());
        assert_eq!(r.explanation, "the sum is 12");
    }

    #[test]
    fn test_operations_default_when_absent() {
        let r: InterpretationResult =
            serde_json::from_str(r#"{"explanation": "hello"}"#).unwrap();
        assert!(r.is_pure_answer());
    }
}
