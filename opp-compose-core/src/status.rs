//! Tabular status rendering.
//!
//! Renders container records into the overview table printed by `ps` and
//! `up`. An empty fleet renders as `[]` so "no containers" stays
//! distinguishable from "no output".

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::runtime::ContainerRecord;

const HEADER: &str = "CONTAINER ID\tNAME\tSTATUS (RC)\tUPTIME\t\n";

/// Format records into the status table. The "now" reference used for
/// uptime is captured once for the whole call, so rows rendered together
/// are measured against the same instant.
pub fn status(containers: &[ContainerRecord], add_header: bool) -> Result<String> {
    status_at(containers, add_header, Utc::now())
}

/// Same as [`status`] with an explicit "now" reference.
pub fn status_at(
    containers: &[ContainerRecord],
    add_header: bool,
    now: DateTime<Utc>,
) -> Result<String> {
    if containers.is_empty() {
        return Ok("[]".to_string());
    }

    let mut result = String::new();
    if add_header {
        result.push_str(HEADER);
    }

    for container in containers {
        // a container that never started has no meaningful StartedAt;
        // one that hasn't finished has no meaningful FinishedAt
        let started_at = if container.status == "created" {
            now
        } else {
            parse_timestamp(&container.started_at)?
        };
        let finished_at = if container.status == "exited" {
            parse_timestamp(&container.finished_at)?
        } else {
            now
        };
        let uptime = finished_at - started_at;

        result.push_str(&format!(
            "{}\t{}\t{} ({})\t{}\t{}\n",
            container.short_id(),
            container.name,
            container.status,
            container.exit_code,
            format_duration(uptime),
            container.error
        ));
    }
    Ok(result)
}

/// Truncate fractional seconds to 6 digits, keeping any timezone suffix.
/// The daemon reports nanosecond precision with a varying digit count.
fn normalize_timestamp(raw: &str) -> String {
    match raw.find('.') {
        Some(dot) => {
            let (head, tail) = raw.split_at(dot + 1);
            let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
            let suffix = &tail[digits.len()..];
            let mut digits = digits;
            digits.truncate(6);
            format!("{}{}{}", head, digits, suffix)
        }
        None => raw.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(&normalize_timestamp(raw))?;
    Ok(parsed.with_timezone(&Utc))
}

fn format_duration(duration: Duration) -> String {
    let mut secs = duration.num_seconds();
    let sign = if secs < 0 { "-" } else { "" };
    secs = secs.abs();
    format!("{}{}:{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
fn record(id: &str, name: &str, status: &str) -> ContainerRecord {
    ContainerRecord {
        id: id.to_string(),
        name: name.to_string(),
        status: status.to_string(),
        ..Default::default()
    }
}

#[test]
fn empty_fleet_renders_empty_marker() {
    assert_eq!(status(&[], true).unwrap(), "[]");
    assert_eq!(status(&[], false).unwrap(), "[]");
}

#[test]
fn exited_container_uses_recorded_timestamps() {
    let mut rec = record("aabbccddeeff00112233", "sim-r0", "exited");
    rec.exit_code = 1;
    rec.started_at = "2024-01-02T10:00:00.500000000Z".to_string();
    rec.finished_at = "2024-01-02T10:01:05.500000000Z".to_string();
    let now = Utc::now();
    let out = status_at(&[rec], true, now).unwrap();
    assert!(out.starts_with("CONTAINER ID\tNAME\tSTATUS (RC)\tUPTIME\t\n"));
    assert!(out.contains("aabbccddeeff\tsim-r0\texited (1)\t0:01:05\t\n"));
}

#[test]
fn running_containers_share_one_now_reference() {
    let started = "2024-03-01T12:00:00Z";
    let mut first = record("1111111111111111", "sim-r0", "running");
    first.started_at = started.to_string();
    let mut second = record("2222222222222222", "sim-r1", "running");
    second.started_at = started.to_string();

    let now = DateTime::parse_from_rfc3339("2024-03-01T12:01:30Z")
        .unwrap()
        .with_timezone(&Utc);
    let out = status_at(&[first, second], false, now).unwrap();
    let rows: Vec<&str> = out.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains("\t0:01:30\t"));
    assert!(rows[1].contains("\t0:01:30\t"));
}

#[test]
fn created_container_measures_against_now_itself() {
    // never-started containers report the zero timestamp; it must not be
    // parsed, the row measures now against now
    let mut rec = record("3333333333333333", "sim-r0", "created");
    rec.started_at = "0001-01-01T00:00:00Z".to_string();
    rec.finished_at = "0001-01-01T00:00:00Z".to_string();
    let out = status(&[rec], false).unwrap();
    assert!(out.contains("\t0:00:00\t"));
}

#[test]
fn timestamp_normalization_truncates_excess_precision() {
    assert_eq!(
        normalize_timestamp("2024-01-02T03:04:05.123456789Z"),
        "2024-01-02T03:04:05.123456Z"
    );
    assert_eq!(
        normalize_timestamp("2024-01-02T03:04:05.12Z"),
        "2024-01-02T03:04:05.12Z"
    );
    assert_eq!(
        normalize_timestamp("2024-01-02T03:04:05Z"),
        "2024-01-02T03:04:05Z"
    );
    assert!(parse_timestamp("2024-01-02T03:04:05.123456789Z").is_ok());
    assert!(parse_timestamp("not-a-timestamp").is_err());
}

#[test]
fn durations_render_with_sign_and_padding() {
    assert_eq!(format_duration(Duration::seconds(0)), "0:00:00");
    assert_eq!(format_duration(Duration::seconds(65)), "0:01:05");
    assert_eq!(format_duration(Duration::seconds(3661)), "1:01:01");
    assert_eq!(format_duration(Duration::seconds(-5)), "-0:00:05");
}
