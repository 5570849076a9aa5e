//! Trailing zero-production detection

use chrono::NaiveDateTime;
use std::cmp::Reverse;

use crate::core::timekey::parse_timestamp;
use crate::core::types::SiteDataset;
use crate::utils::Timezone;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ZeroProductionAlert {
    pub(crate) site: String,
    /// Most recent consecutive samples reporting exactly zero
    pub(crate) zero_days: usize,
}

/// Count the trailing run of zero-production samples for one site's records
fn trailing_zeros(mut samples: Vec<(NaiveDateTime, f64)>) -> usize {
    samples.sort_by_key(|(at, _)| *at);
    samples
        .iter()
        .rev()
        .take_while(|(_, kwh)| *kwh == 0.0)
        .count()
}

/// Sites whose latest samples are all zero, worst first.
///
/// `sites` limits the check; an empty slice checks every site in the dataset.
pub(crate) fn zero_production_alerts(
    dataset: &SiteDataset,
    sites: &[String],
    tz: Timezone,
) -> Vec<ZeroProductionAlert> {
    let candidates: Vec<&str> = if sites.is_empty() {
        dataset.site_ids()
    } else {
        sites.iter().map(String::as_str).collect()
    };

    let mut alerts: Vec<ZeroProductionAlert> = candidates
        .into_iter()
        .filter_map(|site| {
            let samples: Vec<(NaiveDateTime, f64)> = dataset
                .records(site)?
                .iter()
                .filter_map(|r| Some((parse_timestamp(&r.timestamp, tz)?, r.production_kwh)))
                .collect();
            let zero_days = trailing_zeros(samples);
            (zero_days > 0).then(|| ZeroProductionAlert {
                site: site.to_string(),
                zero_days,
            })
        })
        .collect();

    alerts.sort_by(|a, b| {
        Reverse(a.zero_days)
            .cmp(&Reverse(b.zero_days))
            .then_with(|| a.site.cmp(&b.site))
    });
    alerts
}
