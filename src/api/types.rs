use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A generated keyword tagged with the search intent it was written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordWithIntent {
    pub keyword: String,
    pub intent: String,
}

/// Older backends return bare strings instead of `{keyword, intent}` objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeywordEntry {
    WithIntent(KeywordWithIntent),
    Plain(String),
}

impl KeywordEntry {
    pub fn keyword(&self) -> &str {
        match self {
            KeywordEntry::WithIntent(k) => &k.keyword,
            KeywordEntry::Plain(k) => k,
        }
    }
}

/// One topic as the backend returns it.
///
/// `search_engines` is kept as raw JSON so that the record we persist is exactly
/// what the backend sent. Repairing missing or malformed engine stats is the
/// transformer's job, not the decoder's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicResult {
    #[serde(rename = "Topic", alias = "topic", default)]
    pub topic: String,
    #[serde(
        rename = "ConversationalKeywords",
        alias = "conversationalKeywords",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub conversational_keywords: Vec<KeywordEntry>,
    #[serde(
        rename = "searchEngines",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub search_engines: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationalKeywordsResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<TopicResult>,
}

/// A topic sent to the backend: a bare label on first submission, or the
/// previously returned result on refresh so existing keywords are reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TopicInput {
    Label(String),
    Prior(TopicResult),
}

impl TopicInput {
    pub fn label(&self) -> &str {
        match self {
            TopicInput::Label(label) => label,
            TopicInput::Prior(result) => &result.topic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub domain: String,
    pub topics: Vec<TopicInput>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
