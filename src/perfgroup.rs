//! LIKWID performance group parsing.
//!
//! A group file has free-form sections introduced by marker lines. Only two
//! of them carry data for the collector:
//!
//! ```text
//! SHORT Instructions per cycle
//!
//! EVENTSET
//! FIXC0 INSTR_RETIRED_ANY
//!
//! METRICS
//! IPC FIXC0/FIXC1
//!
//! LONG
//! ...
//! ```
//!
//! `EVENTSET` lines map an event to a counter register. `METRICS` lines are a
//! label followed by a single formula token. An empty line, a `SHORT` line or
//! `LONG` closes whichever section is open.

use crate::error::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

static EVENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w\d]+)\s+([\w\d_]+)").unwrap());

/// Measurement granularity of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scope {
    #[serde(rename = "hwthread")]
    HwThread,
    #[serde(rename = "socket")]
    Socket,
}

impl Scope {
    /// Uncore (`BOX`) and energy (`PWR`) counters are only readable per socket.
    pub fn classify(calc: &str) -> Self {
        if calc.contains("BOX") || calc.contains("PWR") {
            Scope::Socket
        } else {
            Scope::HwThread
        }
    }
}

/// A derived metric. Fields are declared in the order they serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub calc: String,
    pub name: String,
    pub publish: bool,
    #[serde(rename = "type")]
    pub scope: Scope,
}

/// Events and metrics of one performance group, as emitted on stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupDocument {
    pub events: BTreeMap<String, String>,
    pub metrics: Vec<Metric>,
}

impl GroupDocument {
    /// Pretty JSON with two-space indentation, sorted keys and ASCII-only text.
    pub fn to_json(&self) -> serde_json::Result<String> {
        crate::output::to_ascii_pretty(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Events,
    Metrics,
}

/// Read and parse a group file.
pub fn parse_file(path: &Path) -> Result<GroupDocument> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse(&content))
}

/// Parse the text of a group file.
pub fn parse(content: &str) -> GroupDocument {
    let mut doc = GroupDocument::default();
    let mut section = Section::None;

    for (idx, line) in content.trim().lines().enumerate() {
        if line == "EVENTSET" {
            section = Section::Events;
            continue;
        }
        if line == "METRICS" {
            section = Section::Metrics;
            continue;
        }
        if line.is_empty() || line.starts_with("SHORT") || line == "LONG" {
            section = Section::None;
            continue;
        }

        match section {
            Section::Events => {
                if let Some(caps) = EVENT_LINE.captures(line) {
                    doc.events.insert(caps[1].to_string(), caps[2].to_string());
                } else {
                    tracing::debug!(line = idx + 1, text = line, "ignoring event line");
                }
            }
            Section::Metrics => match parse_metric(line) {
                Some(metric) => doc.metrics.push(metric),
                None => {
                    tracing::warn!(
                        line = idx + 1,
                        text = line,
                        "skipping metric line without a formula"
                    );
                }
            },
            Section::None => {}
        }
    }

    doc
}

/// Split a metric line into label and formula. Needs at least two tokens.
fn parse_metric(line: &str) -> Option<Metric> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    let calc = tokens.pop()?.to_string();
    Some(Metric {
        name: tokens.join(" "),
        scope: Scope::classify(&calc),
        calc,
        publish: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPC_GROUP: &str = "\
EVENTSET
INSTR_RETIRED_ANY FIXC0
CPU_CLK_UNHALTED_CORE FIXC1

METRICS
IPC INSTR_RETIRED_ANY/CPU_CLK_UNHALTED_CORE
Power PWR0
SHORT Instructions per cycle
";

    fn metric(name: &str, calc: &str, scope: Scope) -> Metric {
        Metric {
            calc: calc.to_string(),
            name: name.to_string(),
            publish: true,
            scope,
        }
    }

    #[test]
    fn parses_events_and_metrics() {
        let doc = parse(IPC_GROUP);

        assert_eq!(doc.events.len(), 2);
        assert_eq!(doc.events["INSTR_RETIRED_ANY"], "FIXC0");
        assert_eq!(doc.events["CPU_CLK_UNHALTED_CORE"], "FIXC1");
        assert_eq!(
            doc.metrics,
            vec![
                metric(
                    "IPC",
                    "INSTR_RETIRED_ANY/CPU_CLK_UNHALTED_CORE",
                    Scope::HwThread
                ),
                metric("Power", "PWR0", Scope::Socket),
            ]
        );
    }

    #[test]
    fn json_matches_collector_layout() {
        let json = parse(IPC_GROUP).to_json().unwrap();
        let expected = r#"{
  "events": {
    "CPU_CLK_UNHALTED_CORE": "FIXC1",
    "INSTR_RETIRED_ANY": "FIXC0"
  },
  "metrics": [
    {
      "calc": "INSTR_RETIRED_ANY/CPU_CLK_UNHALTED_CORE",
      "name": "IPC",
      "publish": true,
      "type": "hwthread"
    },
    {
      "calc": "PWR0",
      "name": "Power",
      "publish": true,
      "type": "socket"
    }
  ]
}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn empty_input_serializes_empty_collections() {
        let json = parse("").to_json().unwrap();
        assert_eq!(json, "{\n  \"events\": {},\n  \"metrics\": []\n}");
    }

    #[test]
    fn scope_classification() {
        assert_eq!(Scope::classify("MBOX0C0+MBOX1C0"), Scope::Socket);
        assert_eq!(Scope::classify("BOX0C0"), Scope::Socket);
        assert_eq!(Scope::classify("PWR0"), Scope::Socket);
        assert_eq!(Scope::classify("1.0E-06*PWR1/time"), Scope::Socket);
        assert_eq!(Scope::classify("SUM0"), Scope::HwThread);
        assert_eq!(Scope::classify("FIXC0/FIXC1"), Scope::HwThread);
    }

    #[test]
    fn metric_name_joins_words_with_single_spaces() {
        let doc = parse("METRICS\nMemory   bandwidth [MBytes/s]\t1.0E-06*(MBOX0C0)*64.0/time");
        assert_eq!(doc.metrics.len(), 1);
        assert_eq!(doc.metrics[0].name, "Memory bandwidth [MBytes/s]");
        assert_eq!(doc.metrics[0].calc, "1.0E-06*(MBOX0C0)*64.0/time");
        assert_eq!(doc.metrics[0].scope, Scope::Socket);
    }

    #[test]
    fn duplicate_events_overwrite_duplicate_metrics_kept() {
        let doc = parse("EVENTSET\nFOO PMC0\nFOO PMC1\n\nMETRICS\nA X\nA X\n");
        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.events["FOO"], "PMC1");
        assert_eq!(doc.metrics.len(), 2);
        assert_eq!(doc.metrics[0], doc.metrics[1]);
    }

    #[test]
    fn section_terminators_stop_parsing() {
        let doc = parse(
            "EVENTSET\nA PMC0\nSHORT text\nB PMC1\nEVENTSET\nC PMC2\nLONG\nD PMC3\n",
        );
        let keys: Vec<&str> = doc.events.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["A", "C"]);

        let doc = parse("METRICS\nm1 X\n\nm2 Y\n");
        assert_eq!(doc.metrics.len(), 1);
        assert_eq!(doc.metrics[0].name, "m1");
    }

    #[test]
    fn lines_outside_sections_are_ignored() {
        let doc = parse("SHORT Branch prediction\nsome text here\nLONG\nFormulas:\nIPC = a/b\n");
        assert!(doc.events.is_empty());
        assert!(doc.metrics.is_empty());
    }

    #[test]
    fn long_section_prose_is_not_a_metric() {
        let group = "\
METRICS
Runtime (RDTSC) [s] time

LONG
Formulas:
Runtime = time
";
        let doc = parse(group);
        assert_eq!(doc.metrics.len(), 1);
        assert_eq!(doc.metrics[0].name, "Runtime (RDTSC) [s]");
    }

    #[test]
    fn unmatched_event_lines_are_skipped() {
        let doc = parse("EVENTSET\n-broken line\nFIXC0\nPMC0 L1D_REPLACEMENT extra\n");
        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.events["PMC0"], "L1D_REPLACEMENT");
    }

    #[test]
    fn single_token_metric_line_is_skipped() {
        let doc = parse("METRICS\nlonely\nIPC FIXC0/FIXC1\n");
        assert_eq!(doc.metrics.len(), 1);
        assert_eq!(doc.metrics[0].name, "IPC");
    }

    #[test]
    fn surrounding_whitespace_and_crlf() {
        let doc = parse("\n\n  EVENTSET\r\nPMC0 X\r\n\r\nMETRICS\r\nIPC  PMC0 \r\n\n");
        // Leading whitespace is trimmed from the whole file, not per line.
        assert_eq!(doc.events["PMC0"], "X");
        assert_eq!(doc.metrics.len(), 1);
        assert_eq!(doc.metrics[0].calc, "PMC0");
    }

    #[test]
    fn blank_metric_line_is_skipped_without_closing_section() {
        let doc = parse("METRICS\n   \nIPC X\n\t\nCPI Y\n");
        assert_eq!(doc.metrics.len(), 2);
        assert_eq!(doc.metrics[0].name, "IPC");
        assert_eq!(doc.metrics[1].name, "CPI");
    }

    #[test]
    fn non_ascii_labels_are_escaped_in_json() {
        let doc = parse("METRICS\nTemperature [°C] TMP0\n");
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"name\": \"Temperature [\\u00b0C]\""));
        assert!(json.is_ascii());
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse(IPC_GROUP), parse(IPC_GROUP));
        assert_eq!(
            parse(IPC_GROUP).to_json().unwrap(),
            parse(IPC_GROUP).to_json().unwrap()
        );
    }

    #[test]
    fn parse_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_file(&dir.path().join("NOPE.txt")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
