use serde_json::{Value, json};

use crate::core::{ChartData, MetricWindow, SiteMetrics, ZeroProductionAlert};

const BORDER_WIDTH: u32 = 2;
const TENSION: f64 = 0.4;

/// Chart-ready structure: a shared label axis plus one dataset per site
pub(crate) fn output_chart_json(data: &ChartData) -> String {
    let datasets: Vec<Value> = data
        .series
        .iter()
        .map(|series| {
            json!({
                "label": series.site_id,
                "data": series.points,
                "borderColor": series.color,
                "borderWidth": BORDER_WIDTH,
                "tension": TENSION,
                "fill": true,
            })
        })
        .collect();

    let output = json!({
        "labels": data.labels,
        "datasets": datasets,
    });
    format!("{output:#}")
}

fn window_key(window: MetricWindow) -> &'static str {
    match window {
        MetricWindow::Last7Days => "last_7_days",
        MetricWindow::MonthToDate => "month_to_date",
        MetricWindow::LastMonth => "last_month",
        MetricWindow::ThreeMonth => "three_month",
        MetricWindow::SixMonth => "six_month",
        MetricWindow::LastYear => "last_year",
        MetricWindow::YearToDate => "ytd",
    }
}

pub(crate) fn output_metrics_json(metrics: &[SiteMetrics]) -> String {
    let output: Vec<Value> = metrics
        .iter()
        .map(|m| {
            let mut entry = serde_json::Map::new();
            entry.insert("site".to_string(), json!(m.site));
            for (window, total) in &m.totals {
                entry.insert(window_key(*window).to_string(), json!(total));
            }
            entry.insert("size_kw".to_string(), json!(m.size_kw));
            entry.insert("efficiency".to_string(), json!(m.efficiency));
            Value::Object(entry)
        })
        .collect();
    format!("{:#}", Value::Array(output))
}

pub(crate) fn output_alerts_json(alerts: &[ZeroProductionAlert]) -> String {
    let output: Vec<Value> = alerts
        .iter()
        .map(|a| json!({ "site": a.site, "zero_days": a.zero_days }))
        .collect();
    format!("{:#}", Value::Array(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{IntervalMode, ProductionRecord, Selection, SiteDataset, build_series};
    use crate::utils::Timezone;

    fn chart(sites: &[&str]) -> Value {
        let mut ds = SiteDataset::new();
        ds.insert(
            "SiteA",
            vec![
                ProductionRecord::new("2024-01-01 10:15:00", 1.5),
                ProductionRecord::new("2024-01-01 10:00:00", 1.0),
            ],
        );
        let mut sel = Selection::new(IntervalMode::FifteenMin);
        sel.add_sites(sites.iter().copied());
        let data = build_series(&ds, &sel, Timezone::Named(chrono_tz::UTC));
        serde_json::from_str(&output_chart_json(&data)).unwrap()
    }

    #[test]
    fn chart_json_shape() {
        let v = chart(&["SiteA"]);
        assert_eq!(
            v["labels"],
            json!(["2024-01-01 10:00:00", "2024-01-01 10:15:00"])
        );
        let ds = &v["datasets"][0];
        assert_eq!(ds["label"], "SiteA");
        assert_eq!(ds["borderWidth"], 2);
        assert_eq!(ds["tension"], 0.4);
        assert_eq!(ds["fill"], true);
        assert!(ds["borderColor"].as_str().unwrap().starts_with('#'));
        assert_eq!(ds["data"][0], json!({"x": "2024-01-01 10:15:00", "y": 1.5}));
    }

    #[test]
    fn empty_selection_chart_json() {
        assert_eq!(chart(&[]), json!({"labels": [], "datasets": []}));
    }

    #[test]
    fn metrics_json_uses_window_keys() {
        let metrics = vec![SiteMetrics {
            site: "Barn".to_string(),
            totals: MetricWindow::ALL.iter().map(|w| (*w, 1.0)).collect(),
            size_kw: None,
            efficiency: None,
        }];
        let v: Value = serde_json::from_str(&output_metrics_json(&metrics)).unwrap();
        assert_eq!(v[0]["site"], "Barn");
        assert_eq!(v[0]["ytd"], 1.0);
        assert_eq!(v[0]["last_7_days"], 1.0);
        assert!(v[0]["efficiency"].is_null());
    }

    #[test]
    fn alerts_json() {
        let alerts = vec![ZeroProductionAlert {
            site: "Barn".to_string(),
            zero_days: 3,
        }];
        let v: Value = serde_json::from_str(&output_alerts_json(&alerts)).unwrap();
        assert_eq!(v, json!([{"site": "Barn", "zero_days": 3}]));
    }
}
