use tracing::info;

use super::client::ApiClient;
use super::types::{AnalyzeRequest, ConversationalKeywordsResponse, TopicInput, TopicResult};
use crate::error::ApiError;

pub const DEFAULT_ENDPOINT: &str = "/analyze";

/// Anything that can answer a conversational keywords request.
pub trait KeywordBackend {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<ConversationalKeywordsResponse, ApiError>;
}

/// The HTTP backend: one POST of `{domain, topics}` to a configurable path.
pub struct KeywordService {
    client: ApiClient,
    endpoint: String,
}

impl KeywordService {
    pub fn new(client: ApiClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl KeywordBackend for KeywordService {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<ConversationalKeywordsResponse, ApiError> {
        info!(
            action = "request",
            component = "keyword_service",
            domain = %request.domain,
            topic_count = request.topics.len(),
            endpoint = %self.endpoint,
            "Requesting conversational keywords"
        );
        self.client.post_json(&self.endpoint, request)
    }
}

/// Request body for a first submission: every topic as a bare label.
pub fn initial_request(domain: &str, topics: &[String]) -> AnalyzeRequest {
    AnalyzeRequest {
        domain: domain.to_string(),
        topics: topics.iter().cloned().map(TopicInput::Label).collect(),
    }
}

/// Request body for a refresh: topics that already have a stored result are
/// sent back as that result so their keywords are reused.
pub fn refresh_request(domain: &str, topics: &[String], prior: &[TopicResult]) -> AnalyzeRequest {
    let topics = topics
        .iter()
        .map(|label| match prior.iter().find(|r| &r.topic == label) {
            Some(result) => TopicInput::Prior(result.clone()),
            None => TopicInput::Label(label.clone()),
        })
        .collect();

    AnalyzeRequest {
        domain: domain.to_string(),
        topics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::KeywordEntry;

    #[test]
    fn test_initial_request_sends_labels() {
        let request = initial_request("example.com", &["pricing".into(), "support".into()]);
        assert_eq!(request.domain, "example.com");
        assert_eq!(
            request.topics,
            vec![
                TopicInput::Label("pricing".into()),
                TopicInput::Label("support".into())
            ]
        );
    }

    #[test]
    fn test_refresh_request_merges_prior_results() {
        let prior = vec![TopicResult {
            topic: "support".into(),
            conversational_keywords: vec![KeywordEntry::Plain("help desk".into())],
            search_engines: None,
        }];

        let request = refresh_request(
            "example.com",
            &["pricing".into(), "support".into()],
            &prior,
        );

        assert_eq!(request.topics[0], TopicInput::Label("pricing".into()));
        assert_eq!(request.topics[1], TopicInput::Prior(prior[0].clone()));
        assert_eq!(request.topics[1].label(), "support");
    }
}
