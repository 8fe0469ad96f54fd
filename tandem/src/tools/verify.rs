//! `verify_citations`: check every tail-list citation of a draft against the
//! session's citation cache. Performs no external calls.
//!
//! Failure reasons are exact strings the worker prompt steers on:
//! `URL not found in session` and `Quote not found in source content`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::cache::CitationCache;
use crate::citation::{inline_list_mismatches, parse_inline_citations, parse_source_list};

use super::{required_str, Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

/// Tool name for citation verification.
pub const TOOL_VERIFY_CITATIONS: &str = "verify_citations";

pub struct VerifyCitationsTool {
    cache: Arc<dyn CitationCache>,
}

impl VerifyCitationsTool {
    pub fn new(cache: Arc<dyn CitationCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Tool for VerifyCitationsTool {
    fn name(&self) -> &str {
        TOOL_VERIFY_CITATIONS
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_VERIFY_CITATIONS.to_string(),
            description: Some(
                "Verify every citation in a draft against the session's cached sources. \
                 Run this before any final reply; fix failures and re-verify."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "response_text": { "type": "string", "description": "Full draft including the ## Sources list" }
                },
                "required": ["response_text"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let response_text = required_str(&args, "response_text")?;
        let citations = parse_source_list(response_text)
            .map_err(|e| ToolSourceError::InvalidInput(format!("malformed citation block: {e}")))?;

        let mut failed = Vec::new();
        for citation in &citations {
            let record = self
                .cache
                .get(&ctx.session_id, &citation.url)
                .await
                .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
            match record {
                None => failed.push(json!({
                    "ref_num": citation.ref_num,
                    "quote": citation.quote,
                    "url": citation.url,
                    "reason": "URL not found in session",
                })),
                Some(record) if !record.matches_quote(&citation.quote) => failed.push(json!({
                    "ref_num": citation.ref_num,
                    "quote": citation.quote,
                    "url": citation.url,
                    "reason": "Quote not found in source content",
                })),
                Some(_) => {}
            }
        }

        // Inline markers must agree with the tail list after whitespace collapse.
        let inline = parse_inline_citations(response_text);
        for ref_num in inline_list_mismatches(&inline, &citations) {
            failed.push(json!({
                "ref_num": ref_num,
                "quote": "",
                "url": "",
                "reason": "Inline quote does not match source list entry",
            }));
        }

        let total = citations.len();
        let verified_count = total.saturating_sub(
            failed
                .iter()
                .filter(|f| f["reason"] != "Inline quote does not match source list entry")
                .count(),
        );
        let report = json!({
            "all_verified": failed.is_empty(),
            "total": total,
            "verified_count": verified_count,
            "failed": failed,
        });
        Ok(ToolCallContent {
            text: serde_json::to_string_pretty(&report)
                .map_err(|e| ToolSourceError::Transport(e.to_string()))?,
        })
    }
}
