use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api::types::{ConversationalKeywordsResponse, TopicResult};

/// Engines preferred for the headline numbers, in priority order.
pub const PRIMARY_ENGINES: [&str; 2] = ["ChatGPT", "GoogleAI"];

/// Field names from the weekly schema the backend used to emit.
const LEGACY_HISTORY_FIELDS: [&str; 2] = ["weeklyHistory", "week"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub timepoint: String,
    pub appearances: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub total_appearances: u64,
    pub distinct_brands: u64,
    pub total_links: u64,
    pub avg_visibility_position: f64,
    pub user_link_appearances: u64,
    pub history: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEntry {
    pub engine: String,
    pub stats: EngineStats,
}

/// One table row: a topic with its per-engine stats and the headline stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModelItem {
    pub id: String,
    pub name: String,
    /// Engines in the order the backend listed them.
    pub search_engines: Vec<EngineEntry>,
    pub aggregated: EngineStats,
}

impl ViewModelItem {
    pub fn engine(&self, name: &str) -> Option<&EngineStats> {
        self.search_engines
            .iter()
            .find(|e| e.engine == name)
            .map(|e| &e.stats)
    }
}

/// Reshape a backend response into view-model rows.
///
/// Ids are the zero-based input position, so they are only meaningful within
/// one response. Missing or malformed numbers become 0 and missing history
/// becomes empty; nothing in here fails.
pub fn transform(response: &ConversationalKeywordsResponse) -> Vec<ViewModelItem> {
    if response.results.is_empty() {
        debug!(action = "skip", component = "transformer", "No results in response");
        return Vec::new();
    }

    debug!(
        action = "start",
        component = "transformer",
        topic_count = response.results.len(),
        "Transforming response"
    );

    transform_results(&response.results)
}

pub fn transform_results(results: &[TopicResult]) -> Vec<ViewModelItem> {
    results
        .iter()
        .enumerate()
        .map(|(index, topic)| transform_topic(index, topic))
        .collect()
}

fn transform_topic(index: usize, topic: &TopicResult) -> ViewModelItem {
    let search_engines: Vec<EngineEntry> = topic
        .search_engines
        .iter()
        .flat_map(|engines| engines.iter())
        .map(|(engine, raw)| EngineEntry {
            engine: engine.clone(),
            stats: engine_stats(&topic.topic, engine, raw),
        })
        .collect();

    let aggregated = select_aggregated(&search_engines);

    debug!(
        action = "transform",
        component = "transformer",
        topic = %topic.topic,
        engine_count = search_engines.len(),
        "Transformed topic"
    );

    ViewModelItem {
        id: index.to_string(),
        name: topic.topic.clone(),
        search_engines,
        aggregated,
    }
}

/// `ChatGPT`, then `GoogleAI`, then the first engine listed, then zeros.
pub fn select_aggregated(engines: &[EngineEntry]) -> EngineStats {
    PRIMARY_ENGINES
        .iter()
        .find_map(|name| engines.iter().find(|e| e.engine == *name))
        .or_else(|| engines.first())
        .map(|e| e.stats.clone())
        .unwrap_or_default()
}

fn engine_stats(topic: &str, engine: &str, raw: &Value) -> EngineStats {
    let Some(fields) = raw.as_object() else {
        warn!(action = "repair", component = "transformer", topic, engine, "Engine stats are not an object, using defaults");
        return EngineStats::default();
    };

    EngineStats {
        total_appearances: count(fields.get("totalAppearances")),
        distinct_brands: count(fields.get("distinctBrands")),
        total_links: count(fields.get("totalLinks")),
        avg_visibility_position: position(fields.get("avgVisibilityPosition")),
        user_link_appearances: count(fields.get("userLinkAppearances")),
        history: history(topic, engine, fields),
    }
}

fn history(topic: &str, engine: &str, fields: &Map<String, Value>) -> Vec<HistoryPoint> {
    match fields.get("history") {
        Some(Value::Array(points)) => points
            .iter()
            .map(|point| HistoryPoint {
                timepoint: point
                    .get("timepoint")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                appearances: count(point.get("appearances")),
            })
            .collect(),
        _ if fields.contains_key(LEGACY_HISTORY_FIELDS[0]) => {
            warn!(
                action = "repair",
                component = "transformer",
                topic,
                engine,
                legacy_field = LEGACY_HISTORY_FIELDS[0],
                "Engine uses the retired weekly history schema, treating history as empty"
            );
            Vec::new()
        }
        _ => {
            warn!(action = "repair", component = "transformer", topic, engine, "Missing or invalid history array, treating as empty");
            Vec::new()
        }
    }
}

fn count(value: Option<&Value>) -> u64 {
    match value {
        Some(v) => v
            .as_u64()
            .or_else(|| {
                v.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        None => 0,
    }
}

fn position(value: Option<&Value>) -> f64 {
    value
        .and_then(Value::as_f64)
        .filter(|f| f.is_finite() && *f >= 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> ConversationalKeywordsResponse {
        serde_json::from_value(value).unwrap()
    }

    fn engine(total: u64, history: &[(&str, u64)]) -> Value {
        json!({
            "totalAppearances": total,
            "distinctBrands": 4,
            "totalLinks": 9,
            "avgVisibilityPosition": 2.5,
            "userLinkAppearances": 1,
            "history": history
                .iter()
                .map(|(t, a)| json!({"timepoint": t, "appearances": a}))
                .collect::<Vec<_>>(),
        })
    }

    #[test]
    fn test_empty_response_yields_no_items() {
        assert!(transform(&ConversationalKeywordsResponse::default()).is_empty());
    }

    #[test]
    fn test_ids_follow_input_position() {
        let items = transform(&response(json!({"results": [
            {"Topic": "c"}, {"Topic": "a"}, {"Topic": "b"}
        ]})));

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2"]);
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_chatgpt_wins_over_other_engines() {
        let items = transform(&response(json!({"results": [{
            "Topic": "pricing",
            "searchEngines": {
                "Perplexity": engine(1, &[]),
                "GoogleAI": engine(2, &[]),
                "ChatGPT": engine(3, &[("2024-01-01", 7)]),
            }
        }]})));

        let item = &items[0];
        assert_eq!(&item.aggregated, item.engine("ChatGPT").unwrap());
        assert_eq!(item.aggregated.total_appearances, 3);
        assert_eq!(item.search_engines.len(), 3);
    }

    #[test]
    fn test_google_ai_used_without_chatgpt() {
        let items = transform(&response(json!({"results": [{
            "Topic": "pricing",
            "searchEngines": {
                "Perplexity": engine(1, &[]),
                "GoogleAI": engine(2, &[]),
            }
        }]})));

        assert_eq!(items[0].aggregated.total_appearances, 2);
    }

    #[test]
    fn test_first_engine_used_as_last_resort() {
        let items = transform(&response(json!({"results": [{
            "Topic": "pricing",
            "searchEngines": {
                "Perplexity": engine(5, &[]),
                "Copilot": engine(6, &[]),
            }
        }]})));

        assert_eq!(items[0].aggregated.total_appearances, 5);
        assert_eq!(items[0].search_engines[1].engine, "Copilot");
    }

    #[test]
    fn test_no_engines_gives_zero_aggregate() {
        let items = transform(&response(json!({"results": [
            {"Topic": "a"},
            {"Topic": "b", "searchEngines": {}}
        ]})));

        for item in &items {
            assert_eq!(item.aggregated, EngineStats::default());
            assert!(item.aggregated.history.is_empty());
        }
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let items = transform(&response(json!({"results": [{
            "Topic": "a",
            "searchEngines": {
                "ChatGPT": {"totalAppearances": 4, "history": [{"timepoint": "t1"}, {"appearances": 2}, 17]},
                "GoogleAI": {"history": "not a list"},
                "Broken": null,
            }
        }]})));

        let item = &items[0];
        let chatgpt = item.engine("ChatGPT").unwrap();
        assert_eq!(chatgpt.total_appearances, 4);
        assert_eq!(chatgpt.distinct_brands, 0);
        assert_eq!(chatgpt.avg_visibility_position, 0.0);
        assert_eq!(
            chatgpt.history,
            vec![
                HistoryPoint { timepoint: "t1".into(), appearances: 0 },
                HistoryPoint { timepoint: "".into(), appearances: 2 },
                HistoryPoint::default(),
            ]
        );
        assert!(item.engine("GoogleAI").unwrap().history.is_empty());
        assert_eq!(item.engine("Broken").unwrap(), &EngineStats::default());
    }

    #[test]
    fn test_legacy_weekly_history_is_not_converted() {
        let items = transform(&response(json!({"results": [{
            "Topic": "a",
            "searchEngines": {
                "ChatGPT": {"totalAppearances": 1, "weeklyHistory": [{"week": "2024-01-01", "appearances": 3}]}
            }
        }]})));

        assert_eq!(items[0].aggregated.total_appearances, 1);
        assert!(items[0].aggregated.history.is_empty());
    }

    #[test]
    fn test_negative_and_fractional_numbers_are_repaired() {
        let items = transform(&response(json!({"results": [{
            "Topic": "a",
            "searchEngines": {"ChatGPT": {
                "totalAppearances": -3,
                "distinctBrands": 2.9,
                "avgVisibilityPosition": -1.0,
                "history": []
            }}
        }]})));

        let stats = &items[0].aggregated;
        assert_eq!(stats.total_appearances, 0);
        assert_eq!(stats.distinct_brands, 2);
        assert_eq!(stats.avg_visibility_position, 0.0);
    }
}
