use std::path::PathBuf;

use crate::limits::*;

/// Runtime knobs for a chart session. Read from `TAPECHART_*` env vars by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartConfig {
    pub day_count: u32,
    pub page_step: i64,
    pub history_limit: usize,
    pub metrics_port: Option<u16>,
    /// JSON snapshot of resources and bookings loaded by the demo binary.
    pub fixture_path: Option<PathBuf>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            day_count: DEFAULT_DAY_COUNT,
            page_step: DEFAULT_PAGE_STEP,
            history_limit: DEFAULT_HISTORY_LIMIT,
            metrics_port: None,
            fixture_path: None,
        }
    }
}

impl ChartConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults;
    /// out-of-range values are clamped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let day_count: u32 = lookup("TAPECHART_DAY_COUNT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.day_count);
        let page_step: i64 = lookup("TAPECHART_PAGE_STEP")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.page_step);
        let history_limit: usize = lookup("TAPECHART_HISTORY_LIMIT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.history_limit);
        let metrics_port: Option<u16> = lookup("TAPECHART_METRICS_PORT").and_then(|s| s.parse().ok());
        let fixture_path = lookup("TAPECHART_FIXTURE").map(PathBuf::from);

        Self {
            day_count: day_count.clamp(1, MAX_DAY_COUNT),
            page_step: page_step.max(1),
            history_limit: history_limit.clamp(1, MAX_HISTORY_LIMIT),
            metrics_port,
            fixture_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_env_gives_defaults() {
        let cfg = ChartConfig::from_lookup(|_| None);
        assert_eq!(cfg, ChartConfig::default());
        assert_eq!(cfg.day_count, 60);
        assert_eq!(cfg.history_limit, 5);
    }

    #[test]
    fn values_are_parsed() {
        let cfg = ChartConfig::from_lookup(lookup_from(&[
            ("TAPECHART_DAY_COUNT", "30"),
            ("TAPECHART_PAGE_STEP", "14"),
            ("TAPECHART_HISTORY_LIMIT", "20"),
            ("TAPECHART_METRICS_PORT", "9100"),
            ("TAPECHART_FIXTURE", "/tmp/chart.json"),
        ]));
        assert_eq!(cfg.day_count, 30);
        assert_eq!(cfg.page_step, 14);
        assert_eq!(cfg.history_limit, 20);
        assert_eq!(cfg.metrics_port, Some(9100));
        assert_eq!(cfg.fixture_path, Some(PathBuf::from("/tmp/chart.json")));
    }

    #[test]
    fn garbage_and_out_of_range_values() {
        let cfg = ChartConfig::from_lookup(lookup_from(&[
            ("TAPECHART_DAY_COUNT", "100000"),
            ("TAPECHART_PAGE_STEP", "abc"),
            ("TAPECHART_HISTORY_LIMIT", "0"),
        ]));
        assert_eq!(cfg.day_count, MAX_DAY_COUNT);
        assert_eq!(cfg.page_step, DEFAULT_PAGE_STEP);
        assert_eq!(cfg.history_limit, 1);
    }
}
