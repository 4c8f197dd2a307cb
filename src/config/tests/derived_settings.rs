//! Tests for settings derived from the raw configuration fields.

use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use rstest::rstest;

use crate::OrgActivityConfig;
use crate::github::{ActivityError, ActivityKind};

#[rstest]
#[case::unset(None)]
#[case::keyword(Some("all"))]
#[case::uppercase_keyword(Some("ALL"))]
fn all_kinds_are_selected_by_default(#[case] kind: Option<&str>) {
    let config = OrgActivityConfig {
        kind: kind.map(str::to_owned),
        ..Default::default()
    };

    let kinds = config.activity_kinds().expect("kinds should resolve");
    assert_eq!(kinds, ActivityKind::ALL.to_vec());
}

#[rstest]
#[case::slug("merged-pr", ActivityKind::MergedPullRequest)]
#[case::label("issue", ActivityKind::Issue)]
#[case::index("2", ActivityKind::CreatedPullRequest)]
fn single_kind_is_selected(#[case] name: &str, #[case] expected: ActivityKind) {
    let config = OrgActivityConfig {
        kind: Some(name.to_owned()),
        ..Default::default()
    };

    assert_eq!(config.activity_kinds(), Ok(vec![expected]));
}

#[rstest]
fn unknown_kind_is_rejected() {
    let config = OrgActivityConfig {
        kind: Some("stars".to_owned()),
        ..Default::default()
    };

    assert!(matches!(
        config.activity_kinds(),
        Err(ActivityError::UnknownActivityKind { name }) if name == "stars"
    ));
}

#[rstest]
fn date_range_defaults_until_to_now() {
    let now = Utc
        .with_ymd_and_hms(2023, 3, 1, 12, 0, 0)
        .single()
        .expect("timestamp should be valid");
    let config = OrgActivityConfig {
        since: Some("2023-01-01".to_owned()),
        ..Default::default()
    };

    let range = config.date_range(now).expect("range should resolve");
    assert_eq!(range.until(), now);
    assert_eq!(range.to_string(), "2023-01-01T00:00:00Z..2023-03-01T12:00:00Z");
}

#[rstest]
fn date_range_uses_explicit_until() {
    let config = OrgActivityConfig {
        since: Some("2023-01-01".to_owned()),
        until: Some("2023-01-10T06:30:00Z".to_owned()),
        ..Default::default()
    };

    let range = config.date_range(Utc::now()).expect("range should resolve");
    assert_eq!(range.to_string(), "2023-01-01T00:00:00Z..2023-01-10T06:30:00Z");
}

#[rstest]
fn date_range_requires_since() {
    let config = OrgActivityConfig::default();

    assert!(matches!(
        config.date_range(Utc::now()),
        Err(ActivityError::Configuration { .. })
    ));
}

#[rstest]
fn inverted_date_range_is_rejected() {
    let config = OrgActivityConfig {
        since: Some("2023-02-01".to_owned()),
        until: Some("2023-01-01".to_owned()),
        ..Default::default()
    };

    assert!(matches!(
        config.date_range(Utc::now()),
        Err(ActivityError::InvalidDateRange { .. })
    ));
}

#[rstest]
#[case::disabled(None, None)]
#[case::zero_disables(Some(0), None)]
#[case::enabled(Some(4), Some(4))]
fn window_policy_reflects_settings(#[case] regrow_after: Option<u32>, #[case] expected: Option<u32>) {
    let config = OrgActivityConfig {
        initial_window_days: 30,
        min_window_hours: 6,
        regrow_after,
        ..Default::default()
    };

    let policy = config.window_policy().expect("policy should be valid");
    assert_eq!(policy.initial(), TimeDelta::days(30));
    assert_eq!(policy.minimum(), TimeDelta::hours(6));
    assert_eq!(policy.regrow_after().map(std::num::NonZeroU32::get), expected);
}

#[rstest]
#[case::initial_below_minimum(1, 48)]
#[case::zero_minimum(30, 0)]
fn inconsistent_window_sizes_are_rejected(#[case] days: u32, #[case] hours: u32) {
    let config = OrgActivityConfig {
        initial_window_days: days,
        min_window_hours: hours,
        ..Default::default()
    };

    assert!(matches!(
        config.window_policy(),
        Err(ActivityError::InvalidPagination { .. })
    ));
}

#[rstest]
fn retry_policy_reflects_settings() {
    let config = OrgActivityConfig {
        max_retries: 2,
        backoff_base_ms: 250,
        ..Default::default()
    };

    let policy = config.retry_policy();
    assert_eq!(policy.max_retries, 2);
    assert_eq!(policy.base_delay, Duration::from_millis(250));
}

#[rstest]
#[case::public("https://api.github.com", "https://api.github.com/graphql")]
#[case::enterprise_host("https://ghe.example.com", "https://ghe.example.com/api/graphql")]
#[case::enterprise_rest_base("https://ghe.example.com/api/v3", "https://ghe.example.com/api/graphql")]
fn gateway_config_resolves_endpoint(#[case] api_url: &str, #[case] expected: &str) {
    let config = OrgActivityConfig {
        api_url: api_url.to_owned(),
        timeout_secs: 5,
        ..Default::default()
    };

    let gateway = config.gateway_config().expect("endpoint should resolve");
    assert_eq!(gateway.endpoint.as_str(), expected);
    assert_eq!(gateway.timeout, Duration::from_secs(5));
}

#[rstest]
fn gateway_config_rejects_unparseable_url() {
    let config = OrgActivityConfig {
        api_url: "not a url".to_owned(),
        ..Default::default()
    };

    assert!(matches!(
        config.gateway_config(),
        Err(ActivityError::InvalidUrl(_))
    ));
}

#[rstest]
#[case::unset(None, None)]
#[case::blank(Some("  "), None)]
#[case::file(Some("events.jsonl"), Some("events.jsonl"))]
fn output_path_ignores_blank_values(#[case] output: Option<&str>, #[case] expected: Option<&str>) {
    let config = OrgActivityConfig {
        output: output.map(str::to_owned),
        ..Default::default()
    };

    assert_eq!(config.output_path().as_deref().map(camino::Utf8Path::as_str), expected);
}

#[rstest]
fn organisation_is_required() {
    let config = OrgActivityConfig::default();

    assert_eq!(config.organisation(), Err(ActivityError::MissingOrganisation));
}

#[rstest]
fn malformed_organisation_is_rejected() {
    let config = OrgActivityConfig {
        org: Some("-bad-".to_owned()),
        ..Default::default()
    };

    assert!(matches!(
        config.organisation(),
        Err(ActivityError::InvalidOrganisation { .. })
    ));
}
