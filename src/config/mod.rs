//! Application configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.org-activity.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `ORG_ACTIVITY_ORG`, `ORG_ACTIVITY_TOKEN`, or
//!    legacy `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--org`/`-o`, `--token`/`-t`, and so on
//!
//! # Configuration File
//!
//! ```toml
//! org = "octo-org"
//! token = "ghp_example"
//! kind = "merged-pr"
//! since = "2023-01-01"
//! until = "2023-06-30"
//! project_id = "42"
//! initial_window_days = 90
//! ```

use std::env;
use std::num::NonZeroU32;
use std::time::Duration;

use camino::Utf8PathBuf;
use chrono::{DateTime, TimeDelta, Utc};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::github::{
    ActivityError, ActivityKind, DateRange, GraphQlEndpoint, HttpGatewayConfig,
    OrganisationLogin, PersonalAccessToken, RetryPolicy, WindowPolicy,
};

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_PAGE_SIZE: u8 = 100;
const DEFAULT_INITIAL_WINDOW_DAYS: u32 = 180;
const DEFAULT_MIN_WINDOW_HOURS: u32 = 24;
const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Keyword selecting every catalog activity kind.
pub const ALL_KINDS: &str = "all";

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `ORG_ACTIVITY_ORG` or `--org`: Organisation login
/// - `ORG_ACTIVITY_TOKEN`, `GITHUB_TOKEN`, or `--token`: Authentication token
/// - `ORG_ACTIVITY_KIND` or `--kind`: Activity kind name, slug, index, or `all`
/// - `ORG_ACTIVITY_SINCE` / `ORG_ACTIVITY_UNTIL`: Date range endpoints
/// - `ORG_ACTIVITY_API_URL` or `--api-url`: GitHub or GitHub Enterprise base
///
/// # Example
///
/// ```no_run
/// use org_activity::OrgActivityConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = OrgActivityConfig::load().expect("failed to load configuration");
/// let org = config.organisation().expect("organisation required");
/// let token = config.resolve_token().expect("token required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "ORG_ACTIVITY",
    discovery(
        dotfile_name = ".org-activity.toml",
        config_file_name = "org-activity.toml",
        app_name = "org-activity"
    )
)]
pub struct OrgActivityConfig {
    /// GitHub organisation login whose activity is collected.
    ///
    /// Can be provided via:
    /// - CLI: `--org <LOGIN>` or `-o <LOGIN>`
    /// - Environment: `ORG_ACTIVITY_ORG`
    /// - Config file: `org = "..."`
    #[ortho_config(cli_short = 'o')]
    pub org: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `ORG_ACTIVITY_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Activity kind to collect: a label (`merged PR`), slug (`merged-pr`),
    /// catalog index (`0`), or `all`. Defaults to `all`.
    #[ortho_config(cli_short = 'k')]
    pub kind: Option<String>,

    /// Inclusive start of the range, RFC 3339 or `YYYY-MM-DD`.
    #[ortho_config(cli_short = 's')]
    pub since: Option<String>,

    /// Inclusive end of the range; defaults to the current time.
    #[ortho_config(cli_short = 'u')]
    pub until: Option<String>,

    /// GitHub API base URL. GitHub Enterprise hosts are accepted and mapped to
    /// their `/api/graphql` endpoint.
    #[ortho_config(cli_short = 'a')]
    pub api_url: String,

    /// Nodes requested per page, `1..=100`.
    #[ortho_config(cli_short = 'P')]
    pub page_size: u8,

    /// First window size, in days, used once the full range is truncated.
    #[ortho_config(cli_short = 'i')]
    pub initial_window_days: u32,

    /// Narrowest window, in hours, before truncation is treated as fatal.
    #[ortho_config(cli_short = 'm')]
    pub min_window_hours: u32,

    /// Untruncated windows in a row after which a shrunk window grows back.
    /// Unset keeps shrunk windows for the rest of the walk.
    #[ortho_config(cli_short = 'r')]
    pub regrow_after: Option<u32>,

    /// Retries for a rate-limited request before giving up.
    #[ortho_config(cli_short = 'R')]
    pub max_retries: u32,

    /// Delay before the first rate-limit retry, in milliseconds.
    #[ortho_config(cli_short = 'b')]
    pub backoff_base_ms: u64,

    /// HTTP timeout per request, in seconds.
    #[ortho_config(cli_short = 'T')]
    pub timeout_secs: u64,

    /// Project identifier attached to every exported event.
    #[ortho_config(cli_short = 'p')]
    pub project_id: Option<String>,

    /// File to write JSONL events to; stdout when unset.
    #[ortho_config(cli_short = 'O')]
    pub output: Option<String>,

    /// Only check that the organisation exists, then exit.
    ///
    /// Note: Environment variable `ORG_ACTIVITY_VALIDATE_ONLY` is not
    /// supported because `ortho_config` does not load boolean values from the
    /// environment.
    #[ortho_config(cli_short = 'v')]
    pub validate_only: bool,
}

impl Default for OrgActivityConfig {
    fn default() -> Self {
        Self {
            org: None,
            token: None,
            kind: None,
            since: None,
            until: None,
            api_url: DEFAULT_API_URL.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            initial_window_days: DEFAULT_INITIAL_WINDOW_DAYS,
            min_window_hours: DEFAULT_MIN_WINDOW_HOURS,
            regrow_after: None,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            project_id: None,
            output: None,
            validate_only: false,
        }
    }
}

impl OrgActivityConfig {
    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::MissingToken`] when no token source provides a
    /// non-blank value.
    pub fn resolve_token(&self) -> Result<PersonalAccessToken, ActivityError> {
        let value = self
            .token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(ActivityError::MissingToken)?;
        PersonalAccessToken::new(value)
    }

    /// Returns the validated organisation login.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::MissingOrganisation`] when unset and
    /// [`ActivityError::InvalidOrganisation`] when malformed.
    pub fn organisation(&self) -> Result<OrganisationLogin, ActivityError> {
        let raw = self
            .org
            .as_deref()
            .ok_or(ActivityError::MissingOrganisation)?;
        OrganisationLogin::new(raw)
    }

    /// Activity kinds selected by `kind`, in catalog order for `all`.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::UnknownActivityKind`] for an unrecognised
    /// name.
    pub fn activity_kinds(&self) -> Result<Vec<ActivityKind>, ActivityError> {
        match self.kind.as_deref().map(str::trim) {
            None => Ok(ActivityKind::ALL.to_vec()),
            Some(name) if name.eq_ignore_ascii_case(ALL_KINDS) => Ok(ActivityKind::ALL.to_vec()),
            Some(name) => Ok(vec![name.parse()?]),
        }
    }

    /// Builds the collection range, using `now` when `until` is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::Configuration`] when `since` is missing and
    /// [`ActivityError::InvalidDateRange`] when either endpoint is unusable.
    pub fn date_range(&self, now: DateTime<Utc>) -> Result<DateRange, ActivityError> {
        let since = self
            .since
            .as_deref()
            .ok_or_else(|| ActivityError::Configuration {
                message: "start of the range is required (use --since or -s)".to_owned(),
            })?;
        match self.until.as_deref() {
            Some(until) => DateRange::parse(since, until),
            None => DateRange::parse(since, &now.to_rfc3339()),
        }
    }

    /// Window sizing derived from `initial_window_days`, `min_window_hours`,
    /// and `regrow_after`.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidPagination`] when the sizes are
    /// inconsistent.
    pub fn window_policy(&self) -> Result<WindowPolicy, ActivityError> {
        let policy = WindowPolicy::new(
            TimeDelta::days(i64::from(self.initial_window_days)),
            TimeDelta::hours(i64::from(self.min_window_hours)),
        )?;
        Ok(policy.with_regrow_after(self.regrow_after.and_then(NonZeroU32::new)))
    }

    /// Rate-limit retry settings.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.backoff_base_ms),
            ..RetryPolicy::default()
        }
    }

    /// HTTP gateway settings for the configured API URL.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidUrl`] when `api_url` does not parse.
    pub fn gateway_config(&self) -> Result<HttpGatewayConfig, ActivityError> {
        let endpoint = GraphQlEndpoint::parse(&self.api_url)?;
        Ok(HttpGatewayConfig::new(endpoint)
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }

    /// Output file, if one is configured.
    #[must_use]
    pub fn output_path(&self) -> Option<Utf8PathBuf> {
        self.output
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(Utf8PathBuf::from)
    }
}

#[cfg(test)]
mod tests;
