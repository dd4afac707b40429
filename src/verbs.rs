//! Verb resolution - reconciles what a view can handle with what a router
//! actually registered for the route.

use tracing::debug;

use crate::capability::VerbCapable;
use crate::definition::{RouteDef, RouterDef};
use crate::types::sort_verbs;

/// Verbs a model viewset route accepts, by route suffix.
pub const VIEWSET_METHODS: &[(&str, &[&str])] = &[
    ("List", &["get", "post"]),
    ("Instance", &["get", "put", "patch", "delete"]),
];

/// Outcome of verb resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerbResolution {
    /// Uppercase verbs, ascending with `DELETE` last.
    pub verbs: Vec<String>,
    /// Docstring replacing the route's when every router verb maps to one handler.
    pub docstring: Option<String>,
}

/// Resolve the permitted verbs of `route` bound to `view`.
///
/// Without a router, or when no registration reproduces the route's pattern,
/// the view's own verbs are used.
pub fn resolve_verbs<V>(route: &RouteDef, view: &V, router: Option<&RouterDef>) -> VerbResolution
where
    V: VerbCapable + ?Sized,
{
    let method_names = view.http_method_names();
    let mut verbs: Vec<String> = method_names
        .iter()
        .filter(|name| is_method_allowed(route, view, name))
        .map(|name| name.to_uppercase())
        .collect();

    let mut docstring = None;

    if let Some(router) = router {
        for registration in router
            .registrations
            .iter()
            .filter(|r| r.viewset == route.view)
        {
            let pattern = registration.url_pattern(&router.lookup_regex, &router.trailing_slash);
            if pattern != route.pattern {
                continue;
            }

            // (handler identity, handler name, verb) for verbs the view really serves
            let bound: Vec<(&str, &str, String)> = method_names
                .iter()
                .filter_map(|name| {
                    let handler = registration.verb_to_handler.get(name)?;
                    let identity = view.handler_identity(handler)?;
                    Some((identity, handler.as_str(), name.to_uppercase()))
                })
                .collect();

            if bound.is_empty() {
                debug!(
                    route = %route.pattern,
                    prefix = %registration.prefix,
                    "router registration binds no handlers, skipping"
                );
                continue;
            }

            // one underlying handler: its doc replaces the route's, even when empty
            let (first_identity, first_handler, _) = &bound[0];
            if bound.iter().all(|(identity, _, _)| identity == first_identity) {
                let doc = view
                    .handler_doc(first_identity)
                    .or_else(|| view.handler_doc(first_handler))
                    .unwrap_or_default();
                docstring = Some(doc.to_string());
            }

            verbs.extend(bound.into_iter().map(|(_, _, verb)| verb));
        }
    }

    VerbResolution {
        verbs: sort_verbs(verbs),
        docstring,
    }
}

fn is_method_allowed<V: VerbCapable + ?Sized>(route: &RouteDef, view: &V, name: &str) -> bool {
    if view.has_handler(name) {
        return true;
    }
    if !view.is_model_viewset() {
        return false;
    }
    let Some(suffix) = route.suffix.as_deref() else {
        return false;
    };
    VIEWSET_METHODS
        .iter()
        .find(|(s, _)| *s == suffix)
        .map(|(_, methods)| methods.contains(&name))
        .unwrap_or(false)
}
