//! `get_cached_source`: fetch one cached record so a worker can re-read the
//! exact stored text when repairing a failed citation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::cache::CitationCache;

use super::{required_str, Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

/// Tool name for cached-source lookup.
pub const TOOL_GET_CACHED_SOURCE: &str = "get_cached_source";

pub struct GetCachedSourceTool {
    cache: Arc<dyn CitationCache>,
}

impl GetCachedSourceTool {
    pub fn new(cache: Arc<dyn CitationCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Tool for GetCachedSourceTool {
    fn name(&self) -> &str {
        TOOL_GET_CACHED_SOURCE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GET_CACHED_SOURCE.to_string(),
            description: Some(
                "Fetch the cached text of a previously searched URL. Use this to copy \
                 exact quotes when fixing a failed citation."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "URL from an earlier search_cached result" }
                },
                "required": ["url"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let url = required_str(&args, "url")?;
        let record = self
            .cache
            .get(&ctx.session_id, url)
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?
            .ok_or_else(|| {
                ToolSourceError::InvalidInput(format!("URL not found in session: {url}"))
            })?;

        let mut text = format!(
            "Title: {}\nURL: {}\nQuery: {}\nScore: {:.2}\n",
            record.title, record.url, record.query, record.score
        );
        if let Some(date) = &record.published_date {
            text.push_str(&format!("Published: {date}\n"));
        }
        text.push_str(&format!("\nContent:\n{}\n", record.content));
        if !record.raw_content.is_empty() {
            text.push_str(&format!("\nRaw content:\n{}\n", record.raw_content));
        }
        Ok(ToolCallContent { text })
    }
}
