//! # Result Renderer
//!
//! Merges a [`CorrelatedResult`] into a [`UnifiedOutput`] and renders it as a one-line summary,
//! compact JSON or indented JSON. Rendering is a pure function of the output and the format;
//! printing is left to the caller.

use std::time::Instant;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::correlate::CorrelatedResult;
use crate::models::{Gist, SlackFileResponse};
use crate::options::RenderFormat;

/// Timestamp layout used by every human-readable line gislack prints.
pub const DISPLAY_TIME_FORMAT: &str = "%Y%m%d_%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedOutput {
    #[serde(rename = "gist_response")]
    pub gist: Gist,
    #[serde(rename = "slack_response")]
    pub slack: SlackFileResponse,
    /// Seconds since the job started, truncated to milliseconds. Absent for simple output.
    #[serde(rename = "TotalElapsedTime", skip_serializing_if = "Option::is_none")]
    pub total_elapsed: Option<f64>,
}

pub fn elapsed_seconds(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 1000.0).trunc() / 1000.0
}

pub fn display_time(time: Option<&DateTime<Local>>) -> String {
    time.map(|t| t.format(DISPLAY_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// Simple output skips the elapsed-time computation entirely.
pub fn unify(result: CorrelatedResult, started: Instant, format: RenderFormat) -> UnifiedOutput {
    let total_elapsed = match format {
        RenderFormat::Simple => None,
        RenderFormat::Pretty | RenderFormat::Compact => Some(elapsed_seconds(started)),
    };
    UnifiedOutput {
        gist: result.gist,
        slack: result.slack,
        total_elapsed,
    }
}

/// One-line JSON object with `": "` and `", "` separators, keys in the given order.
pub fn simple_line(fields: &[(&str, &str)]) -> Result<String, serde_json::Error> {
    let pairs = fields
        .iter()
        .map(|(key, value)| {
            Ok(format!(
                "{}: {}",
                serde_json::to_string(key)?,
                serde_json::to_string(value)?
            ))
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;
    Ok(format!("{{{}}}", pairs.join(", ")))
}

pub fn render(output: &UnifiedOutput, format: RenderFormat) -> Result<String, serde_json::Error> {
    match format {
        RenderFormat::Simple => {
            let gist_created = display_time(output.gist.created_at.as_ref());
            let slack_created = display_time(output.slack.file.created_time.as_ref());
            simple_line(&[
                ("gist_created_at", gist_created.as_str()),
                ("gist_id", output.gist.id.as_str()),
                ("slack_created_at", slack_created.as_str()),
                ("slack_id", output.slack.file.id.as_str()),
            ])
        }
        RenderFormat::Pretty => serde_json::to_string_pretty(output),
        RenderFormat::Compact => serde_json::to_string(output),
    }
}

/// JSON for any other result, indented when `pretty`.
pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlackFile;
    use std::time::Duration;

    fn sample() -> CorrelatedResult {
        CorrelatedResult {
            gist: Gist {
                id: "g1".into(),
                ..Default::default()
            },
            slack: SlackFileResponse {
                ok: true,
                error: None,
                file: SlackFile {
                    id: "F1".into(),
                    created: 1_501_545_600,
                    ..Default::default()
                }
                .with_local_time(),
            },
        }
    }

    #[test]
    fn simple_line_escapes_values() {
        let line = simple_line(&[("gist_id", r#"a"b\c"#), ("slack_id", "F1")]).unwrap();
        assert_eq!(line, r#"{"gist_id": "a\"b\\c", "slack_id": "F1"}"#);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["gist_id"], r#"a"b\c"#);
    }

    #[test]
    fn simple_has_four_fields_and_no_elapsed_time() {
        let output = unify(sample(), Instant::now(), RenderFormat::Simple);
        assert_eq!(output.total_elapsed, None);
        let line = render(&output, RenderFormat::Simple).unwrap();
        assert!(!line.contains('\n'));
        assert!(!line.contains("TotalElapsedTime"));
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        let keys: Vec<_> = parsed.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(parsed["gist_id"], "g1");
        assert_eq!(parsed["slack_id"], "F1");
    }

    #[test]
    fn full_output_reports_elapsed_time() {
        let started = Instant::now() - Duration::from_millis(250);
        let output = unify(sample(), started, RenderFormat::Compact);
        let elapsed = output.total_elapsed.expect("computed for full output");
        assert!(elapsed >= 0.25, "elapsed was {elapsed}");

        let json = render(&output, RenderFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"gist_response\""));
        assert!(json.contains("\"slack_response\""));
        assert!(json.contains("\"TotalElapsedTime\""));
    }

    #[test]
    fn rendering_is_repeatable() {
        let output = unify(sample(), Instant::now(), RenderFormat::Pretty);
        let first = render(&output, RenderFormat::Pretty).unwrap();
        let second = render(&output, RenderFormat::Pretty).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\n  \"gist_response\""));
    }
}
