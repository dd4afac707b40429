//! Endpoint catalog - one endpoint per route known to a route provider.

use serde::Serialize;
use tracing::warn;

use crate::capability::{RouteProvider, SchemaSource};
use crate::endpoint::{Endpoint, EndpointBuilder};
use crate::error::ExtractError;
use crate::types::{sort_verbs, RouteErrorPolicy, Settings};

/// All endpoints of an application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    pub endpoints: Vec<Endpoint>,
    /// Every verb permitted by at least one endpoint.
    pub all_verbs: Vec<String>,
}

impl Catalog {
    /// Build one endpoint per route of `provider`.
    ///
    /// Routes that fail extraction are dropped with a warning, or abort the
    /// build when `Settings::on_route_error` is `abort`.
    ///
    /// # Errors
    ///
    /// Returns the first per-route error under the `abort` policy.
    pub fn build<P>(provider: &P, settings: &Settings) -> Result<Self, ExtractError>
    where
        P: RouteProvider + SchemaSource,
    {
        let builder = EndpointBuilder::new(provider, settings).router(provider.router());

        let mut endpoints = Vec::with_capacity(provider.routes().len());
        for route in provider.routes() {
            let built = match provider.view(&route.view) {
                Some(view) => builder.build(route, view),
                None => Err(ExtractError::UnknownView {
                    route: route.pattern.clone(),
                    view: route.view.clone(),
                }),
            };

            match built {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(err) if settings.on_route_error == RouteErrorPolicy::Skip => {
                    warn!(route = %route.pattern, error = %err, "skipping route");
                }
                Err(err) => return Err(err),
            }
        }

        let all_verbs = sort_verbs(
            endpoints
                .iter()
                .flat_map(|endpoint| endpoint.permitted_verbs.iter().cloned()),
        );

        Ok(Self {
            endpoints,
            all_verbs,
        })
    }

    /// Endpoints whose path contains `query`; all of them when it is empty.
    pub fn filter(&self, query: &str) -> Vec<&Endpoint> {
        self.endpoints
            .iter()
            .filter(|endpoint| query.is_empty() || endpoint.path.contains(query))
            .collect()
    }

    /// Endpoint with exactly this path.
    pub fn find(&self, path: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|endpoint| endpoint.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ApiDefinition;
    use serde_json::json;

    fn definition() -> ApiDefinition {
        serde_json::from_value(json!({
            "routes": [
                { "pattern": "^users/$", "view": "Users" },
                { "pattern": "^users/(?P<pk>[^/.]+)/$", "view": "User" },
                { "pattern": "^ghost/$", "view": "Ghost" }
            ],
            "views": {
                "Users": { "handlers": { "get": {}, "post": {} } },
                "User": { "handlers": { "get": {}, "delete": {} } }
            }
        }))
        .unwrap()
    }

    #[test]
    fn build_skips_routes_with_unknown_views() {
        let catalog = Catalog::build(&definition(), &Settings::default()).unwrap();
        let paths: Vec<&str> = catalog.endpoints.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/users/", "/users/<pk>/"]);
    }

    #[test]
    fn build_aborts_when_configured() {
        let settings = Settings::default().on_route_error(RouteErrorPolicy::Abort);
        let result = Catalog::build(&definition(), &settings);
        assert!(matches!(
            result,
            Err(ExtractError::UnknownView { view, .. }) if view == "Ghost"
        ));
    }

    #[test]
    fn all_verbs_is_union_with_delete_last() {
        let catalog = Catalog::build(&definition(), &Settings::default()).unwrap();
        assert_eq!(catalog.all_verbs, vec!["GET", "POST", "DELETE"]);
    }

    #[test]
    fn filter_and_find() {
        let catalog = Catalog::build(&definition(), &Settings::default()).unwrap();
        assert_eq!(catalog.filter("").len(), 2);
        assert_eq!(catalog.filter("<pk>").len(), 1);
        assert!(catalog.filter("orders").is_empty());
        assert!(catalog.find("/users/").is_some());
        assert!(catalog.find("/users").is_none());
    }
}
