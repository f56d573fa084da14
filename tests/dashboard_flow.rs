use std::cell::RefCell;

use serde_json::json;
use tempfile::TempDir;

use brandwatch::api::{AnalyzeRequest, ConversationalKeywordsResponse, KeywordBackend};
use brandwatch::session::{MemorySessionStore, SqliteSessionStore};
use brandwatch::transform::transform_results;
use brandwatch::view::{toggle_selection, DashboardView, PALETTE};
use brandwatch::{ApiError, Dashboard, Outcome};

/// Answers every topic with a single ChatGPT engine and a short history.
struct ChatGptOnly {
    requests: RefCell<Vec<AnalyzeRequest>>,
}

impl ChatGptOnly {
    fn new() -> Self {
        Self {
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl KeywordBackend for ChatGptOnly {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<ConversationalKeywordsResponse, ApiError> {
        self.requests.borrow_mut().push(request.clone());

        let results: Vec<_> = request
            .topics
            .iter()
            .enumerate()
            .map(|(i, topic)| {
                json!({
                    "Topic": topic.label(),
                    "ConversationalKeywords": [{"keyword": format!("best {}", topic.label()), "intent": "commercial"}],
                    "searchEngines": {
                        "ChatGPT": {
                            "totalAppearances": 10 + i,
                            "distinctBrands": 3,
                            "totalLinks": 7,
                            "avgVisibilityPosition": 2.0,
                            "userLinkAppearances": 1,
                            "history": [
                                {"timepoint": "2024-01-01", "appearances": 1 + i},
                                {"timepoint": "2024-01-08", "appearances": 2 + i}
                            ]
                        }
                    }
                })
            })
            .collect();

        Ok(serde_json::from_value(json!({ "results": results })).expect("fixture decodes"))
    }
}

#[test]
fn submit_persists_and_auto_selects_small_result_sets() {
    let dir = TempDir::new().unwrap();
    let store = SqliteSessionStore::open(&dir.path().join("session.db")).unwrap();
    let dashboard = Dashboard::new(ChatGptOnly::new(), store);

    let topics = vec!["pricing".to_string(), "support".to_string()];
    let outcome = dashboard.submit("example.com", &topics).unwrap();
    assert!(matches!(outcome, Outcome::Applied(_)));

    let record = dashboard.load().unwrap().expect("record saved");
    assert_eq!(record.domain, "example.com");
    assert_eq!(record.topics, topics);
    assert_eq!(record.results.len(), 2);

    let items = transform_results(&record.results);
    let view = DashboardView::derive(&items, "", 1, &[]);

    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.selection, vec!["0", "1"]);
    assert_eq!(view.legend.len(), 2);
    assert_eq!(view.legend[0].color, PALETTE[0]);

    assert_eq!(view.chart.len(), 2);
    assert_eq!(view.chart[0]["timepoint"], "2024-01-01");
    assert_eq!(view.chart[0]["pricing"], 1);
    assert_eq!(view.chart[0]["support"], 2);
    assert_eq!(view.chart[1]["pricing"], 2);
    assert_eq!(view.chart[1]["support"], 3);
}

#[test]
fn small_lists_override_manual_deselection_on_rederive() {
    let dashboard = Dashboard::new(ChatGptOnly::new(), MemorySessionStore::new());
    dashboard
        .submit("example.com", &["pricing".to_string(), "support".to_string()])
        .unwrap();

    let items = dashboard.items().unwrap().unwrap();
    let mut selection = DashboardView::derive(&items, "", 1, &[]).selection;
    toggle_selection(&mut selection, "0");
    assert_eq!(selection, vec!["1"]);

    let view = DashboardView::derive(&items, "", 1, &selection);
    assert_eq!(view.selection, vec!["0", "1"]);
}

#[test]
fn large_result_sets_select_five_from_the_first_page() {
    let dashboard = Dashboard::new(ChatGptOnly::new(), MemorySessionStore::new());
    let topics: Vec<String> = (0..23).map(|i| format!("topic {}", i)).collect();
    dashboard.submit("example.com", &topics).unwrap();

    let items = dashboard.items().unwrap().unwrap();
    let view = DashboardView::derive(&items, "", 1, &[]);
    assert_eq!(view.total_pages, 3);
    assert_eq!(view.selection, vec!["0", "1", "2", "3", "4"]);

    let search = DashboardView::derive(&items, "TOPIC 1", 1, &view.selection);
    assert_eq!(search.filtered_count, 11);
    assert_eq!(search.selection, view.selection);

    let past_end = DashboardView::derive(&items, "", 4, &view.selection);
    assert!(past_end.rows.is_empty());
}

#[test]
fn refresh_overwrites_record_and_reset_clears_it() {
    let dir = TempDir::new().unwrap();
    let store = SqliteSessionStore::open(&dir.path().join("session.db")).unwrap();
    let dashboard = Dashboard::new(ChatGptOnly::new(), store);

    dashboard.submit("example.com", &["pricing".to_string()]).unwrap();
    let first = dashboard.load().unwrap().unwrap();

    dashboard.refresh().unwrap();
    let second = dashboard.load().unwrap().unwrap();
    assert_eq!(second.topics, first.topics);
    assert!(second.saved_at >= first.saved_at);

    dashboard.reset().unwrap();
    assert!(dashboard.load().unwrap().is_none());
}

#[test]
fn late_response_from_another_handle_does_not_overwrite_newer_results() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.db");
    let slow = Dashboard::new(ChatGptOnly::new(), SqliteSessionStore::open(&path).unwrap());
    let fast = Dashboard::new(ChatGptOnly::new(), SqliteSessionStore::open(&path).unwrap());

    let slow_token = slow.begin_request().unwrap();
    let outcome = fast.submit("new.com", &["pricing".to_string()]).unwrap();
    assert!(matches!(outcome, Outcome::Applied(_)));

    let late = slow
        .finish(slow_token, "old.com", &["support".to_string()], Ok(ConversationalKeywordsResponse::default()))
        .unwrap();
    assert!(matches!(late, Outcome::Stale));
    assert_eq!(slow.load().unwrap().unwrap().domain, "new.com");
}

#[test]
fn reset_from_another_handle_drops_in_flight_response() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.db");
    let refreshing = Dashboard::new(ChatGptOnly::new(), SqliteSessionStore::open(&path).unwrap());
    let resetting = Dashboard::new(ChatGptOnly::new(), SqliteSessionStore::open(&path).unwrap());

    refreshing.submit("example.com", &["pricing".to_string()]).unwrap();
    let token = refreshing.begin_request().unwrap();
    resetting.reset().unwrap();

    let late = refreshing
        .finish(token, "ghost.com", &["pricing".to_string()], Ok(ConversationalKeywordsResponse::default()))
        .unwrap();
    assert!(matches!(late, Outcome::Stale));
    assert!(resetting.load().unwrap().is_none());
}
