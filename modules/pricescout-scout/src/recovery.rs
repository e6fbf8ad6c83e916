// Structured-result recovery from free-form model output.
//
// Candidates, in order:
//   1. fenced code blocks (first one that parses)
//   2. the span from the first `{` to the last `}`
//   3. the whole text with fence markers stripped
// The first syntactically valid JSON wins; it must then have the result shape.

use ai_client::{fenced_blocks, strip_code_blocks};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use pricescout_common::AnalysisResult;

fn parse(candidate: &str) -> Option<Value> {
    serde_json::from_str(candidate.trim()).ok()
}

fn from_fences(text: &str) -> Option<Value> {
    fenced_blocks(text).into_iter().find_map(parse)
}

fn from_brace_span(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    parse(&text[start..=end])
}

fn from_stripped(text: &str) -> Option<Value> {
    parse(strip_code_blocks(text))
}

/// Recover the first well-formed JSON payload in `text`.
pub fn recover_json(text: &str) -> Option<Value> {
    if let Some(value) = from_fences(text) {
        debug!("Recovered payload from fenced block");
        return Some(value);
    }
    if let Some(value) = from_brace_span(text) {
        debug!("Recovered payload from brace span");
        return Some(value);
    }
    from_stripped(text)
}

pub fn recover<T: DeserializeOwned>(text: &str) -> Option<T> {
    let value = recover_json(text)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!(error = %e, "Recovered payload has the wrong shape");
            None
        }
    }
}

pub fn recover_analysis(text: &str) -> Option<AnalysisResult> {
    recover(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"top_recommendation":"x","comparison_table":[]}"#;

    #[test]
    fn fenced_json_is_recovered() {
        let text = format!("```json\n{PAYLOAD}\n```");
        let result = recover_analysis(&text).unwrap();
        assert_eq!(result.top_recommendation, "x");
        assert!(result.comparison_table.is_empty());
    }

    #[test]
    fn leading_prose_without_fences_is_recovered() {
        let text = format!("Here is the comparison you asked for:\n{PAYLOAD}\nHope this helps.");
        assert_eq!(recover_analysis(&text).unwrap().top_recommendation, "x");
    }

    #[test]
    fn first_parseable_fence_wins() {
        let text = format!(
            "```\nnot json\n```\nthen\n```json\n{PAYLOAD}\n```\n```json\n{{\"top_recommendation\":\"y\",\"comparison_table\":[]}}\n```"
        );
        assert_eq!(recover_analysis(&text).unwrap().top_recommendation, "x");
    }

    #[test]
    fn bare_payload_is_recovered() {
        assert!(recover_analysis(PAYLOAD).is_some());
    }

    #[test]
    fn rows_are_parsed() {
        let text = r#"```json
{"comparison_table":[{"website":"takealot.com","brand":"Defy","product":"Kettle","original_price":"R 399","sale_price":"R 299","extra_discounts":"None","product_url":"https://www.takealot.com/kettle/PLID1","comment":"Best"}],"top_recommendation":"Defy at Takealot"}
```"#;
        let result = recover_analysis(text).unwrap();
        assert_eq!(result.comparison_table[0].sale_price, "R 299");
    }

    #[test]
    fn nothing_recoverable() {
        assert!(recover_analysis("").is_none());
        assert!(recover_analysis("I could not find any prices.").is_none());
        assert!(recover_analysis("} backwards {").is_none());
    }

    #[test]
    fn wrong_shape_is_not_a_result() {
        assert!(recover_json(r#"{"answer": 42}"#).is_some());
        assert!(recover_analysis(r#"{"answer": 42}"#).is_none());
    }
}
