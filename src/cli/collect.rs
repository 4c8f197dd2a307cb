//! Activity collection and JSONL export.

use chrono::Utc;
use org_activity::export::ExportedEvent;
use org_activity::{ActivityError, ActivityIntake, GraphQlGateway, OrgActivityConfig};
use tracing::info;

use super::output::write_output;

/// Collects every configured activity kind and writes the events as JSONL.
///
/// # Errors
///
/// Returns an error if:
/// - The organisation, kind, range, or window settings are invalid
/// - A GitHub request fails or windowing cannot converge
/// - Writing to the output fails
pub fn run<G: GraphQlGateway>(
    config: &OrgActivityConfig,
    gateway: &G,
) -> Result<(), ActivityError> {
    let org = config.organisation()?;
    let kinds = config.activity_kinds()?;
    let range = config.date_range(Utc::now())?;
    let intake = ActivityIntake::new(gateway)
        .with_page_size(config.page_size)
        .with_window_policy(config.window_policy()?);

    let mut events = Vec::new();
    let mut requests = 0;
    let mut skipped = 0;
    for kind in kinds {
        let report = intake.collect(&org, kind, &range)?;
        requests += report.stats.requests;
        skipped += report.stats.skipped_nodes;
        events.extend(
            report
                .events
                .into_iter()
                .map(|event| ExportedEvent::new(event, config.project_id.clone())),
        );
    }

    write_output(config.output_path().as_deref(), &events)?;
    info!(
        org = org.as_str(),
        %range,
        events = events.len(),
        requests,
        skipped,
        "run complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use org_activity::DateRange;
    use org_activity::github::test_support::{FakeSearchGateway, spaced_timestamps};
    use rstest::rstest;
    use serde_json::Value;

    use super::*;

    #[rstest]
    fn writes_events_for_the_selected_kind_to_file() {
        let range = DateRange::parse("2023-01-01", "2023-01-10").expect("range should parse");
        let timestamps = spaced_timestamps(range.since(), TimeDelta::days(1), 5);
        let gateway = FakeSearchGateway::from_timestamps(timestamps);
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("events.jsonl");
        let config = OrgActivityConfig {
            org: Some("octo-org".to_owned()),
            kind: Some("merged-pr".to_owned()),
            since: Some("2023-01-01".to_owned()),
            until: Some("2023-01-10".to_owned()),
            project_id: Some("7".to_owned()),
            output: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        };

        run(&config, &gateway).expect("collection should succeed");

        let written = std::fs::read_to_string(&path).expect("output should exist");
        let lines: Vec<Value> = written
            .lines()
            .map(|line| serde_json::from_str(line).expect("line should be JSON"))
            .collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|line| {
            line.get("project_id") == Some(&Value::from("7"))
                && line.get("eventType") == Some(&Value::from("merged PR"))
        }));
    }

    #[rstest]
    fn missing_since_is_a_configuration_error() {
        let gateway = FakeSearchGateway::from_timestamps(Vec::new());
        let config = OrgActivityConfig {
            org: Some("octo-org".to_owned()),
            ..Default::default()
        };

        let error = run(&config, &gateway).expect_err("since should be required");

        assert!(matches!(error, ActivityError::Configuration { .. }));
        assert_eq!(gateway.request_count(), 0);
    }
}
