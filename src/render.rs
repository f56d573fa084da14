use crate::session::SessionRecord;
use crate::utils::format_number;
use crate::view::DashboardView;

pub fn render_dashboard(record: &SessionRecord, view: &DashboardView) -> String {
    let mut out = String::new();

    out.push_str(&format!("\n--- Brand Watch: {} ---\n", record.domain));
    if let Some(saved_at) = record.saved_at {
        out.push_str(&format!("Last updated: {}\n", saved_at.format("%B %-d, %Y %H:%M UTC")));
    }

    if view.filtered_count == 0 && view.query.is_empty() {
        out.push_str("No topics found. Submit some topics to see their performance here.\n");
        return out;
    }

    if view.query.is_empty() {
        out.push_str(&format!("Topics: {}\n", format_number(view.filtered_count as u64)));
    } else {
        out.push_str(&format!(
            "Topics matching '{}': {}\n",
            view.query,
            format_number(view.filtered_count as u64)
        ));
    }
    out.push_str(&format!("Page {}/{}\n", view.page, view.total_pages));

    out.push_str(&format!(
        "\n{:>4}  {:1}  {:<32} {:>12} {:>9} {:>8} {:>8} {:>10}\n",
        "ID", "", "Topic", "Appearances", "Avg pos", "Brands", "Links", "Your links"
    ));
    for row in &view.rows {
        let marker = if view.is_selected(&row.id) { "*" } else { " " };
        out.push_str(&format!(
            "{:>4}  {:1}  {:<32} {:>12} {:>9.1} {:>8} {:>8} {:>10}\n",
            row.id,
            marker,
            truncate(&row.name, 32),
            format_number(row.aggregated.total_appearances),
            row.aggregated.avg_visibility_position,
            format_number(row.aggregated.distinct_brands),
            format_number(row.aggregated.total_links),
            format_number(row.aggregated.user_link_appearances),
        ));
    }
    if view.rows.is_empty() {
        out.push_str("  (no topics on this page)\n");
    }

    if view.legend.is_empty() {
        out.push_str("\nSelect topics with --toggle <id> to chart their performance.\n");
        return out;
    }

    out.push_str("\nChart series:\n");
    for entry in &view.legend {
        out.push_str(&format!("  {} {} (id {})\n", entry.color, entry.name, entry.id));
    }
    for point in &view.chart {
        let timepoint = point
            .get("timepoint")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let values: Vec<String> = view
            .legend
            .iter()
            .map(|entry| {
                let value = point.get(&entry.name).and_then(|v| v.as_u64()).unwrap_or(0);
                format!("{}={}", entry.name, format_number(value))
            })
            .collect();
        out.push_str(&format!("  {}: {}\n", timepoint, values.join(", ")));
    }
    if view.chart.is_empty() {
        out.push_str("  (no history yet)\n");
    }

    out
}

fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let mut cut: String = name.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
