/// Strip markdown code fences from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Bodies of every fenced code block (```lang ... ```) in order of appearance.
/// An unterminated trailing fence is ignored.
pub fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_fence = &rest[open + 3..];
        let line_end = after_fence.find('\n').unwrap_or(after_fence.len());

        // Single-line block: ```{...}```
        if let Some(close) = after_fence[..line_end].find("```") {
            blocks.push(after_fence[..close].trim());
            rest = &after_fence[close + 3..];
            continue;
        }

        // Skip the info string (e.g. "json") up to the end of the line.
        let body_start = (line_end + 1).min(after_fence.len());
        let body = &after_fence[body_start..];
        let Some(close) = body.find("```") else {
            break;
        };
        blocks.push(body[..close].trim());
        rest = &body[close + 3..];
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
    }

    #[test]
    fn test_fenced_blocks_in_order() {
        let text = "intro\n```json\n{\"a\":1}\n```\nmiddle\n```\n[2]\n```\n";
        assert_eq!(fenced_blocks(text), vec!["{\"a\":1}", "[2]"]);
    }

    #[test]
    fn test_fenced_blocks_ignores_unterminated() {
        assert_eq!(fenced_blocks("```json\n{\"a\":1}"), Vec::<&str>::new());
    }

    #[test]
    fn test_fenced_blocks_single_line() {
        assert_eq!(fenced_blocks("see ```{\"a\":1}``` above"), vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_fenced_blocks_none() {
        assert!(fenced_blocks("no fences at all").is_empty());
    }
}
