use comfy_table::{Cell, Color, Table};

use crate::core::{ChartData, MetricWindow, SiteMetrics, ZeroProductionAlert};
use crate::output::format::{
    create_styled_table, format_efficiency, format_kw, format_kwh, header_cell, right_cell,
};
use crate::refresh::{Phase, Snapshot};
use crate::source::SiteDirectory;

pub(crate) fn metrics_table(metrics: &[SiteMetrics], use_color: bool) -> Table {
    let mut table = create_styled_table();

    let mut header = vec![header_cell("Site", use_color)];
    header.extend(
        MetricWindow::ALL
            .iter()
            .map(|w| header_cell(w.label(), use_color)),
    );
    header.extend([
        header_cell("Size", use_color),
        header_cell("Efficiency", use_color),
    ]);
    table.set_header(header);

    for m in metrics {
        let mut row = vec![Cell::new(&m.site)];
        row.extend(
            MetricWindow::ALL
                .iter()
                .map(|w| right_cell(&format_kwh(m.total(*w)), None, false)),
        );
        row.push(right_cell(
            &m.size_kw.map(format_kw).unwrap_or_else(|| "-".to_string()),
            None,
            false,
        ));
        let color = use_color.then_some(Color::Green);
        row.push(right_cell(
            &m.efficiency
                .map(format_efficiency)
                .unwrap_or_else(|| "-".to_string()),
            color,
            false,
        ));
        table.add_row(row);
    }
    table
}

pub(crate) fn alerts_table(alerts: &[ZeroProductionAlert], use_color: bool) -> Table {
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Site", use_color),
        header_cell("Zero Production Days", use_color),
    ]);
    let color = use_color.then_some(Color::Red);
    for alert in alerts {
        table.add_row(vec![
            Cell::new(&alert.site),
            right_cell(&alert.zero_days.to_string(), color, true),
        ]);
    }
    table
}

pub(crate) fn sites_table(directory: &SiteDirectory, use_color: bool) -> Table {
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Manufacturer", use_color),
        header_cell("Sites", use_color),
        header_cell("Count", use_color),
    ]);
    for entry in directory.entries() {
        table.add_row(vec![
            Cell::new(&entry.manufacturer_name),
            Cell::new(entry.sites.join(", ")),
            right_cell(&entry.sites.len().to_string(), None, false),
        ]);
    }
    table
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Fetching => "fetching",
        Phase::Ready => "ready",
        Phase::Error => "error",
    }
}

/// Latest sample per selected site after a refresh
pub(crate) fn refresh_table(snapshot: &Snapshot, chart: &ChartData, use_color: bool) -> Table {
    let mut table = create_styled_table();
    let status = format!(
        "{} {} #{}",
        snapshot.interval.label(),
        phase_label(snapshot.phase),
        snapshot.applied
    );
    table.set_header(vec![
        header_cell("Site", use_color),
        header_cell("Latest", use_color),
        header_cell("Production", use_color),
        header_cell(&status, use_color),
    ]);

    for series in &chart.series {
        let latest = series.points.iter().max_by_key(|p| p.x);
        let (at, value) = match latest {
            Some(p) => (p.x.to_string(), format_kwh(p.y)),
            None => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(&series.site_id),
            Cell::new(at),
            right_cell(&value, None, false),
            Cell::new(""),
        ]);
    }

    if let Some(error) = &snapshot.last_error {
        let mut message = Cell::new(error);
        if use_color {
            message = message.fg(Color::Red);
        }
        table.add_row(vec![Cell::new("error"), message, Cell::new(""), Cell::new("")]);
    }
    table
}
