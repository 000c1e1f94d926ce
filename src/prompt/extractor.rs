//! Response extraction
//!
//! Splits an agent reply into its explanation and payload around the agreed
//! delimiter. The payload is not interpreted here.

use serde::Serialize;

use crate::core::{CrewError, Result};

/// A reply split around the delimiter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extracted {
    /// Text before the delimiter, trimmed
    pub explanation: String,
    /// Text after the delimiter, trimmed
    pub payload: String,
}

/// Split `text` on `delimiter`.
///
/// Fails with `MalformedResponse` unless the delimiter occurs exactly once.
pub fn extract(text: &str, delimiter: &str) -> Result<Extracted> {
    if delimiter.is_empty() {
        return Err(CrewError::MalformedResponse {
            delimiter: String::new(),
            occurrences: 0,
        });
    }

    let occurrences = text.matches(delimiter).count();
    if occurrences != 1 {
        return Err(CrewError::MalformedResponse {
            delimiter: delimiter.to_string(),
            occurrences,
        });
    }

    match text.split_once(delimiter) {
        Some((explanation, payload)) => Ok(Extracted {
            explanation: explanation.trim().to_string(),
            payload: payload.trim().to_string(),
        }),
        None => Err(CrewError::MalformedResponse {
            delimiter: delimiter.to_string(),
            occurrences: 0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELIM: &str = "--------";

    #[test]
    fn test_extract_explanation_and_sql() {
        let out = extract("Here is the query\n--------\nSELECT 1;", DELIM).unwrap();
        assert_eq!(out.explanation, "Here is the query");
        assert_eq!(out.payload, "SELECT 1;");
    }

    #[test]
    fn test_extract_trims_both_sides() {
        let explanation = "  Counts orders per customer. \n";
        let payload = "\n SELECT customer_id, count(*) FROM orders GROUP BY 1;  ";
        let out = extract(&format!("{explanation}{DELIM}{payload}"), DELIM).unwrap();
        assert_eq!(out.explanation, explanation.trim());
        assert_eq!(out.payload, payload.trim());
    }

    #[test]
    fn test_missing_delimiter_is_malformed() {
        match extract("SELECT 1;", DELIM) {
            Err(CrewError::MalformedResponse { occurrences, .. }) => assert_eq!(occurrences, 0),
            other => panic!("expected malformed response, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_delimiter_is_malformed() {
        let text = "a\n--------\nb\n--------\nc";
        match extract(text, DELIM) {
            Err(CrewError::MalformedResponse { occurrences, .. }) => assert_eq!(occurrences, 2),
            other => panic!("expected malformed response, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_delimiter_is_malformed() {
        assert!(matches!(
            extract("anything", ""),
            Err(CrewError::MalformedResponse { .. })
        ));
    }
}
