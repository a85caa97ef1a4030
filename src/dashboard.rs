//! Console front end: one status line per change in telemetry.

use crate::governor::TelemetrySnapshot;

#[derive(Debug, Default)]
pub struct Dashboard {
    last: Option<(TelemetrySnapshot, i64)>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a line to print when anything differs from the last tick.
    pub fn observe(&mut self, snapshot: &TelemetrySnapshot, current: i64) -> Option<String> {
        if let Some((last, last_current)) = &self.last {
            if last == snapshot && *last_current == current {
                return None;
            }
        }
        self.last = Some((snapshot.clone(), current));
        Some(render_line(snapshot, current))
    }
}

fn render_line(snapshot: &TelemetrySnapshot, current: i64) -> String {
    let level = match snapshot.capacity_raw {
        Some(raw) => format!("{}.{:02}%", raw / 100, raw % 100),
        None => "-".to_owned(),
    };
    format!(
        "status: {:<12} level: {:>7}  input: {:>8} µA  limit: {:>8} µA",
        snapshot.status, level, snapshot.input_current, current
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(raw: Option<i64>, input: i64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            status: "Charging".to_owned(),
            capacity_raw: raw,
            input_current: input,
        }
    }

    #[test]
    fn prints_only_on_change() {
        let mut dashboard = Dashboard::new();
        let first = dashboard.observe(&snapshot(Some(7970), 500), 50_000);
        assert!(first.is_some());
        assert!(dashboard.observe(&snapshot(Some(7970), 500), 50_000).is_none());
        assert!(dashboard.observe(&snapshot(Some(7970), 500), 1_000).is_some());
        assert!(dashboard.observe(&snapshot(Some(7971), 500), 1_000).is_some());
    }

    #[test]
    fn line_shows_fixed_point_level() {
        let line = render_line(&snapshot(Some(8005), 450_000), 1_000);
        assert!(line.contains("80.05%"), "{line}");
        assert!(line.contains("450000"), "{line}");

        let line = render_line(&snapshot(None, 0), 3_000_000);
        assert!(!line.contains('%'), "{line}");
        assert!(line.ends_with("limit:  3000000 µA"), "{line}");
    }
}
