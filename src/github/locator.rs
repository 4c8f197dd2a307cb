//! Identity wrappers and endpoint resolution for activity queries.

use url::Url;

use super::error::ActivityError;

/// Longest login GitHub accepts for users and organisations.
const MAX_LOGIN_LENGTH: usize = 39;

/// Organisation login wrapper to avoid stringly typed parameters.
///
/// GitHub logins are ASCII alphanumerics and single hyphens, never leading or
/// trailing. Validating up front keeps the value safe to splice into a search
/// qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrganisationLogin(String);

impl OrganisationLogin {
    /// Validates and wraps an organisation login.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::MissingOrganisation`] for a blank value and
    /// [`ActivityError::InvalidOrganisation`] when the login contains
    /// characters GitHub does not allow.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ActivityError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ActivityError::MissingOrganisation);
        }

        let well_formed = trimmed.len() <= MAX_LOGIN_LENGTH
            && !trimmed.starts_with('-')
            && !trimmed.ends_with('-')
            && !trimmed.contains("--")
            && trimmed
                .chars()
                .all(|character| character.is_ascii_alphanumeric() || character == '-');

        if !well_formed {
            return Err(ActivityError::InvalidOrganisation {
                login: trimmed.to_owned(),
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the login value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for OrganisationLogin {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError::MissingToken` when the supplied string is blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, ActivityError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ActivityError::MissingToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("token {}", self.0)
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl std::fmt::Debug for PersonalAccessToken {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("PersonalAccessToken(***)")
    }
}

/// GraphQL endpoint derived from an API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQlEndpoint(Url);

impl GraphQlEndpoint {
    /// Public GitHub GraphQL endpoint.
    pub const GITHUB_DOT_COM: &'static str = "https://api.github.com/graphql";

    /// Resolves the GraphQL endpoint for an API base or host URL.
    ///
    /// `github.com` and `api.github.com` map to the public endpoint. GitHub
    /// Enterprise hosts use `/api/graphql`, so a bare host or a REST base
    /// ending in `/api/v3` is rewritten to that path. A URL that already ends
    /// in `/graphql` is used as given.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidUrl`] when the input does not parse or
    /// has no host.
    pub fn parse(api_base: &str) -> Result<Self, ActivityError> {
        let mut parsed =
            Url::parse(api_base).map_err(|error| ActivityError::InvalidUrl(error.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| ActivityError::InvalidUrl("URL must include a host".to_owned()))?;

        if host.eq_ignore_ascii_case("github.com") || host.eq_ignore_ascii_case("api.github.com")
        {
            return Url::parse(Self::GITHUB_DOT_COM)
                .map(Self)
                .map_err(|error| ActivityError::InvalidUrl(error.to_string()));
        }

        let path = parsed.path().trim_end_matches('/').to_owned();
        if path.ends_with("/graphql") {
            return Ok(Self(parsed));
        }

        let rewritten = match path.strip_suffix("/api/v3") {
            Some(prefix) => format!("{prefix}/api/graphql"),
            None if path.is_empty() => "/api/graphql".to_owned(),
            None => format!("{path}/graphql"),
        };
        parsed.set_path(&rewritten);
        parsed.set_query(None);
        Ok(Self(parsed))
    }

    /// Borrow the endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.0
    }

    /// Endpoint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}
