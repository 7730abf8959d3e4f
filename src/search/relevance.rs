use crate::llm::CompletionClient;
use serde::Deserialize;

/// A page the model judged relevant to a query
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelevantPage {
    pub url: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
struct Selection {
    #[serde(default)]
    relevant_pages: Vec<RelevantPage>,
}

pub fn build_selection_prompt(tree_markdown: &str, query: &str) -> String {
    format!(
        r#"Given the following website hierarchy and a user's query, identify which pages are most likely to contain relevant information.
Only return pages that you think are highly relevant to answering the query.

Query: {query}

Website Hierarchy:
{tree_markdown}

Return your response in the following JSON format:
{{
    "relevant_pages": [
        {{
            "url": "page_url",
            "reason": "brief explanation of why this page is relevant"
        }}
    ]
}}

Analyze the hierarchy and select pages that are most likely to contain information relevant to the query."#
    )
}

/// Reads the JSON object spanning the first `{` to the last `}` of a reply
pub fn parse_selection(reply: &str) -> Result<Vec<RelevantPage>, serde_json::Error> {
    let json = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => reply,
    };
    let selection: Selection = serde_json::from_str(json)?;
    Ok(selection.relevant_pages)
}

/// Asks the model which pages of a site hierarchy answer a query
///
/// Any failure is logged and yields an empty selection.
pub async fn select_relevant_pages(
    client: &dyn CompletionClient,
    tree_markdown: &str,
    query: &str,
) -> Vec<RelevantPage> {
    let prompt = build_selection_prompt(tree_markdown, query);
    let reply = match client.complete(&prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!("Page selection request failed: {}", e);
            return Vec::new();
        }
    };

    match parse_selection(&reply) {
        Ok(pages) => {
            tracing::info!("Model selected {} pages for '{}'", pages.len(), query);
            pages
        }
        Err(e) => {
            tracing::warn!("Could not parse page selection: {}", e);
            Vec::new()
        }
    }
}
