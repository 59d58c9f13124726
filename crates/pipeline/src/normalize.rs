//! Mapping from the provider's run shape to the `pipeline_runs` row shape.
//!
//! Pure functions: nothing here does I/O. Bad input never fails the
//! mapping; it turns into `None` fields and a `warn!` line.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use db::NormalizedRun;
use github::RawWorkflowRun;

/// Layouts with an explicit offset that RFC 3339 does not cover: a space
/// separator, a colon-less offset, minute precision.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Naive layouts tried when the string carries no UTC offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Map one raw run into its normalized row.
pub fn normalize(raw: &RawWorkflowRun) -> NormalizedRun {
    let run_started_at = parse_timestamp(raw.run_started_at.as_deref());
    let created_at = parse_timestamp(raw.created_at.as_deref());
    let updated_at = parse_timestamp(raw.updated_at.as_deref());

    NormalizedRun {
        run_id: raw.id,
        workflow_id: raw.workflow_id,
        workflow_name: raw.name.clone(),
        status: raw.status.clone(),
        conclusion: raw.conclusion.clone(),
        event: raw.event.clone(),
        branch: raw.head_branch.clone(),
        commit_sha: raw.head_sha.clone(),
        actor: raw.actor.as_ref().map(|a| a.login.clone()),
        run_number: raw.run_number,
        run_attempt: raw.run_attempt,
        run_started_at,
        created_at,
        updated_at,
        duration_ms: duration_ms(raw.id, run_started_at, updated_at),
        html_url: raw.html_url.clone(),
    }
}

/// Parse an ISO-8601 timestamp into UTC.
///
/// A trailing `Z` means `+00:00`; a string without any offset is taken as
/// UTC; a bare date is midnight UTC. Absent or empty input is `None` without
/// a diagnostic, malformed input is `None` with one.
pub fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty())?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let value = expand_shorthand(raw);
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&value, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    warn!("Could not parse datetime string: {raw}");
    None
}

/// Rewrite the ISO-8601 shorthands chrono's layouts cannot express: a `Z`
/// suffix becomes `+00:00`, and an hour-only time (`T12`) gains `:00`.
fn expand_shorthand(value: &str) -> String {
    let mut out = match value.strip_suffix(['Z', 'z']) {
        Some(body) => format!("{body}+00:00"),
        None => value.to_string(),
    };

    // `YYYY-MM-DD`, separator, `HH`, then the end or an offset sign.
    let bytes = out.as_bytes();
    let hour_only = bytes.len() >= 13
        && matches!(bytes[10], b'T' | b' ')
        && bytes[11..13].iter().all(u8::is_ascii_digit)
        && matches!(bytes.get(13), None | Some(b'+' | b'-'));
    if hour_only {
        out.insert_str(13, ":00");
    }
    out
}

/// Wall-clock length of a run, `updated_at - run_started_at`, in whole
/// milliseconds.
///
/// `None` unless both ends are known. A negative span (clock skew on the
/// provider side) is clamped to `0`.
pub fn duration_ms(
    run_id: Option<i64>,
    run_started_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
) -> Option<i64> {
    let (started, updated) = (run_started_at?, updated_at?);

    if updated < started {
        warn!(
            "updated_at ({updated}) is before run_started_at ({started}) for run ID {}. \
             Duration will be 0.",
            run_id.map_or_else(|| "<none>".to_string(), |id| id.to_string())
        );
        return Some(0);
    }
    Some((updated - started).num_milliseconds())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawWorkflowRun {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn reference_run_normalizes() {
        let run = normalize(&raw(json!({
            "id": 42,
            "run_started_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:05Z",
            "head_branch": "main",
            "head_sha": "abc123",
            "actor": { "login": "alice" }
        })));

        assert_eq!(run.run_id, Some(42));
        assert_eq!(run.branch.as_deref(), Some("main"));
        assert_eq!(run.commit_sha.as_deref(), Some("abc123"));
        assert_eq!(run.actor.as_deref(), Some("alice"));
        assert_eq!(run.duration_ms, Some(5000));
    }

    #[test]
    fn every_field_is_carried_over() {
        let run = normalize(&raw(json!({
            "id": 7001,
            "workflow_id": 161335,
            "name": "CI",
            "status": "completed",
            "conclusion": "failure",
            "event": "pull_request",
            "head_branch": "feature/x",
            "head_sha": "deadbeef",
            "actor": { "login": "bob", "id": 3 },
            "run_number": 562,
            "run_attempt": 2,
            "run_started_at": "2024-03-05T10:00:00Z",
            "created_at": "2024-03-05T09:59:58Z",
            "updated_at": "2024-03-05T10:02:30.250Z",
            "html_url": "https://github.com/octo/hello/actions/runs/7001"
        })));

        assert_eq!(
            run,
            NormalizedRun {
                run_id: Some(7001),
                workflow_id: Some(161335),
                workflow_name: Some("CI".into()),
                status: Some("completed".into()),
                conclusion: Some("failure".into()),
                event: Some("pull_request".into()),
                branch: Some("feature/x".into()),
                commit_sha: Some("deadbeef".into()),
                actor: Some("bob".into()),
                run_number: Some(562),
                run_attempt: Some(2),
                run_started_at: Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()),
                created_at: Some(Utc.with_ymd_and_hms(2024, 3, 5, 9, 59, 58).unwrap()),
                updated_at: Some(
                    Utc.with_ymd_and_hms(2024, 3, 5, 10, 2, 30).unwrap()
                        + chrono::Duration::milliseconds(250)
                ),
                duration_ms: Some(150_250),
                html_url: Some("https://github.com/octo/hello/actions/runs/7001".into()),
            }
        );
    }

    #[test]
    fn negative_span_clamps_to_zero() {
        let run = normalize(&raw(json!({
            "id": 1,
            "run_started_at": "2024-01-01T00:00:10Z",
            "updated_at": "2024-01-01T00:00:05Z"
        })));
        assert_eq!(run.duration_ms, Some(0));
    }

    #[test]
    fn missing_or_bad_timestamp_gives_no_duration() {
        let only_start = normalize(&raw(json!({
            "id": 1,
            "run_started_at": "2024-01-01T00:00:00Z"
        })));
        assert_eq!(only_start.duration_ms, None);

        let garbage = normalize(&raw(json!({
            "id": 1,
            "run_started_at": "yesterday",
            "updated_at": "2024-01-01T00:00:05Z"
        })));
        assert_eq!(garbage.run_started_at, None);
        assert_eq!(garbage.duration_ms, None);
        assert!(garbage.updated_at.is_some());
    }

    #[test]
    fn sub_millisecond_span_truncates() {
        let started = parse_timestamp(Some("2024-01-01T00:00:00.000000Z"));
        let updated = parse_timestamp(Some("2024-01-01T00:00:01.999999Z"));
        assert_eq!(duration_ms(Some(1), started, updated), Some(1999));
    }

    #[test]
    fn offsets_are_converted_to_utc() {
        assert_eq!(
            parse_timestamp(Some("2024-01-01T02:00:00+02:00")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp(Some("2024-01-01 02:00:00+02:00")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp(Some("2024-01-01T00:00:00+0000")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp(Some("2024-01-01T05:30:00.5-0130")),
            Some(
                Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap()
                    + chrono::Duration::milliseconds(500)
            )
        );
        assert_eq!(
            parse_timestamp(Some("2024-01-01T12:30+02:00")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp(Some("2024-01-01T12:30Z")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp(Some("2024-01-01T12+02:00")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let expected = Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap());
        assert_eq!(parse_timestamp(Some("2024-01-01T12:30:00")), expected);
        assert_eq!(parse_timestamp(Some("2024-01-01 12:30:00")), expected);
        assert_eq!(parse_timestamp(Some("2024-01-01T12:30")), expected);
        assert_eq!(
            parse_timestamp(Some("2024-01-01T12")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp(Some("2024-01-01")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn absent_and_malformed_timestamps_are_none() {
        assert_eq!(parse_timestamp(None), None);
        assert_eq!(parse_timestamp(Some("")), None);
        assert_eq!(parse_timestamp(Some("2024-13-45T99:00:00Z")), None);
        assert_eq!(parse_timestamp(Some("not a date")), None);
    }

    #[test]
    fn malformed_actor_is_none() {
        let run = normalize(&raw(json!({ "id": 1, "actor": ["alice"] })));
        assert_eq!(run.actor, None);
        let run = normalize(&raw(json!({ "id": 1 })));
        assert_eq!(run.actor, None);
    }

    #[test]
    fn missing_id_stays_none() {
        let run = normalize(&raw(json!({ "head_branch": "main" })));
        assert_eq!(run.run_id, None);
        assert_eq!(run.branch.as_deref(), Some("main"));
    }
}
