//! Organisation existence check.

use org_activity::{ActivityError, ActivityIntake, GraphQlGateway, OrgActivityConfig};
use tracing::info;

/// Looks the configured organisation up and fails when GitHub does not know
/// it.
///
/// # Errors
///
/// Returns [`ActivityError::OrganisationNotFound`] for an unknown
/// organisation, or the gateway error that prevented the lookup.
pub fn run<G: GraphQlGateway>(
    config: &OrgActivityConfig,
    gateway: &G,
) -> Result<(), ActivityError> {
    let org = config.organisation()?;
    if ActivityIntake::new(gateway).validate_organisation(&org)? {
        info!(org = org.as_str(), "organisation exists");
        Ok(())
    } else {
        Err(ActivityError::OrganisationNotFound {
            login: org.as_str().to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use org_activity::{GraphQlResponse, OrgActivityConfig};
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    struct StaticGateway(GraphQlResponse);

    impl GraphQlGateway for StaticGateway {
        fn execute(&self, _query: &str) -> Result<GraphQlResponse, ActivityError> {
            Ok(self.0.clone())
        }
    }

    fn config() -> OrgActivityConfig {
        OrgActivityConfig {
            org: Some("octo-org".to_owned()),
            ..Default::default()
        }
    }

    #[rstest]
    fn known_organisation_passes() {
        let gateway = StaticGateway(GraphQlResponse::from_data(
            json!({ "organization": { "login": "octo-org" } }),
        ));

        assert_eq!(run(&config(), &gateway), Ok(()));
    }

    #[rstest]
    fn unknown_organisation_fails() {
        let gateway = StaticGateway(GraphQlResponse::default());

        assert_eq!(
            run(&config(), &gateway),
            Err(ActivityError::OrganisationNotFound {
                login: "octo-org".to_owned()
            })
        );
    }
}
