use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::transform::ViewModelItem;

pub const PAGE_SIZE: usize = 10;

/// Lists this small are always charted in full.
pub const AUTO_SELECT_ALL_MAX: usize = 5;

/// Minimum number of charted items when the list is larger.
pub const MIN_SELECTED: usize = 5;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

pub const PALETTE: [&str; 10] = [
    "#3B82F6", // blue-500
    "#10B981", // emerald-500
    "#F59E0B", // amber-500
    "#EF4444", // red-500
    "#8B5CF6", // violet-500
    "#EC4899", // pink-500
    "#14B8A6", // teal-500
    "#F97316", // orange-500
    "#6366F1", // indigo-500
    "#06B6D4", // cyan-500
];

/// Case-insensitive substring match on the item name. An empty query keeps everything.
pub fn filter_items<'a>(items: &'a [ViewModelItem], query: &str) -> Vec<&'a ViewModelItem> {
    if query.is_empty() {
        return items.iter().collect();
    }

    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .collect()
}

/// Never less than one page, even for an empty list.
pub fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE).max(1)
}

/// The 1-based `page` of `items`; pages past the end are empty.
pub fn paginate<T: Copy>(items: &[T], page: usize) -> Vec<T> {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    items.iter().skip(start).take(PAGE_SIZE).copied().collect()
}

/// Recompute the chart selection after the list or page changed.
///
/// Stale ids are dropped first. Lists of at most five items select
/// everything, overriding any manual choice. Otherwise a selection with fewer
/// than five ids is topped up from the current page, in page order.
pub fn derive_selection(
    previous: &[String],
    items: &[ViewModelItem],
    current_page: &[&ViewModelItem],
) -> Vec<String> {
    if items.len() <= AUTO_SELECT_ALL_MAX {
        return items.iter().map(|item| item.id.clone()).collect();
    }

    let mut selection: Vec<String> = previous
        .iter()
        .filter(|id| items.iter().any(|item| &item.id == *id))
        .fold(Vec::new(), |mut acc, id| {
            if !acc.contains(id) {
                acc.push(id.clone());
            }
            acc
        });

    for item in current_page {
        if selection.len() >= MIN_SELECTED {
            break;
        }
        if !selection.contains(&item.id) {
            selection.push(item.id.clone());
        }
    }

    selection
}

/// Add `id` if absent, remove it if present.
pub fn toggle_selection(selection: &mut Vec<String>, id: &str) {
    if let Some(pos) = selection.iter().position(|s| s == id) {
        selection.remove(pos);
    } else {
        selection.push(id.to_string());
    }
}

/// Selected items in list order.
pub fn selected_items<'a>(items: &'a [ViewModelItem], selection: &[String]) -> Vec<&'a ViewModelItem> {
    items
        .iter()
        .filter(|item| selection.contains(&item.id))
        .collect()
}

/// One chart row per distinct timepoint, sorted, with a value for every
/// selected item (0 where it has no point at that timepoint).
pub fn chart_series(selected: &[&ViewModelItem]) -> Vec<Map<String, Value>> {
    let timepoints: BTreeSet<&str> = selected
        .iter()
        .flat_map(|item| item.aggregated.history.iter())
        .map(|point| point.timepoint.as_str())
        .collect();

    timepoints
        .into_iter()
        .map(|timepoint| {
            let mut row = Map::new();
            row.insert("timepoint".to_string(), Value::from(timepoint));
            for item in selected {
                let appearances = item
                    .aggregated
                    .history
                    .iter()
                    .find(|point| point.timepoint == timepoint)
                    .map(|point| point.appearances)
                    .unwrap_or(0);
                row.insert(item.name.clone(), Value::from(appearances));
            }
            row
        })
        .collect()
}

pub fn item_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Lags the query used for filtering behind the raw keystrokes.
///
/// The CLI receives its query in one piece and does not need this; it is for
/// embedders that feed the view from live input.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    raw: String,
    settled: String,
    changed_at: Option<Instant>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&mut self, query: &str, now: Instant) {
        self.raw = query.to_string();
        self.changed_at = Some(now);
    }

    /// The query filtering should use at `now`.
    pub fn settled(&mut self, now: Instant) -> &str {
        if let Some(changed_at) = self.changed_at {
            if now.duration_since(changed_at) >= SEARCH_DEBOUNCE {
                self.settled = self.raw.clone();
                self.changed_at = None;
            }
        }
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.changed_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesLegend {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Everything a render pass needs, derived from the item list and the UI controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub query: String,
    pub page: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
    pub rows: Vec<ViewModelItem>,
    pub selection: Vec<String>,
    pub legend: Vec<SeriesLegend>,
    pub chart: Vec<Map<String, Value>>,
}

impl DashboardView {
    pub fn derive(
        items: &[ViewModelItem],
        query: &str,
        page: usize,
        previous_selection: &[String],
    ) -> Self {
        let page = page.max(1);
        let filtered = filter_items(items, query);
        let rows = paginate(&filtered, page);
        let selection = derive_selection(previous_selection, items, &rows);

        Self::with_selection(items, query, page, selection)
    }

    /// Build the view for an explicit selection, e.g. after manual toggles.
    pub fn with_selection(
        items: &[ViewModelItem],
        query: &str,
        page: usize,
        selection: Vec<String>,
    ) -> Self {
        let page = page.max(1);
        let filtered = filter_items(items, query);
        let rows: Vec<ViewModelItem> = paginate(&filtered, page).into_iter().cloned().collect();

        let selected = selected_items(items, &selection);
        let legend = selected
            .iter()
            .enumerate()
            .map(|(index, item)| SeriesLegend {
                id: item.id.clone(),
                name: item.name.clone(),
                color: item_color(index).to_string(),
            })
            .collect();
        let chart = chart_series(&selected);

        Self {
            query: query.to_string(),
            page,
            total_pages: total_pages(filtered.len()),
            filtered_count: filtered.len(),
            rows,
            selection,
            legend,
            chart,
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.iter().any(|s| s == id)
    }
}
