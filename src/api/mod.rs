pub mod client;
pub mod service;
pub mod types;

pub use client::ApiClient;
pub use service::{KeywordBackend, KeywordService};
pub use types::{
    AnalyzeRequest, ConversationalKeywordsResponse, KeywordEntry, KeywordWithIntent, TopicInput,
    TopicResult,
};
