//! Endpoint Schema Extraction
//!
//! Builds a catalog of API endpoints from a declarative application
//! definition: routes, views, schemas and an optional router.
//!
//! Each endpoint gets its canonical path, permitted verbs, documentation,
//! the first permission requirement, and an input and output field tree per
//! permitted verb.
//!
//! # Example
//!
//! ```
//! use endpoint_schema::{load_definition_str, Catalog, Direction, Settings};
//!
//! let definition = load_definition_str(r#"{
//!     "routes": [{ "pattern": "^users/(?P<pk>[^/.]+)/$", "view": "User" }],
//!     "views": {
//!         "User": {
//!             "docstring": "A single user.",
//!             "handlers": { "get": {}, "put": {} },
//!             "serializer_class": "UserSchema"
//!         }
//!     },
//!     "schemas": {
//!         "UserSchema": { "fields": [{ "name": "id", "kind": "integer" }] }
//!     }
//! }"#).unwrap();
//!
//! let catalog = Catalog::build(&definition, &Settings::default()).unwrap();
//! let endpoint = catalog.find("/users/<pk>/").unwrap();
//!
//! assert_eq!(endpoint.permitted_verbs, vec!["GET", "PUT"]);
//! // GET is output-bearing, PUT is input-bearing
//! assert_eq!(endpoint.fields_for(Direction::Out, "GET").unwrap()[0].name, "id");
//! assert_eq!(endpoint.fields_for(Direction::In, "PUT").unwrap()[0].name, "id");
//! ```
//!
//! # Schema Declarations
//!
//! | Declaration | Effect |
//! |-------------|--------|
//! | none | Empty field lists for every verb |
//! | `serializer_class` | Output for `GET`, input for `POST`/`PUT`/`PATCH`/`DELETE` |
//! | `{ "VERB": "Schema" }` | Same heuristic, per verb; `ALL` covers undeclared verbs |
//! | `{ "VERB": { "in": "A", "out": "B" } }` | Explicit direction per verb |

mod assignment;
mod capability;
mod catalog;
mod conformance;
mod definition;
mod endpoint;
mod error;
mod loader;
mod path;
mod types;
mod verbs;
mod walker;

pub use assignment::{
    resolve_assignments, Assignments, ExclusionDeclaration, SchemaAssignment, SchemaDeclaration,
    VerbExclusion, VerbSchemas,
};
pub use capability::{
    ChoiceCapable, RouteProvider, SchemaCapable, SchemaSource, VerbCapable, ViewCapable,
};
pub use catalog::Catalog;
pub use conformance::{
    check_payload, request_fields, sample_payload, sample_payload_with, to_json_schema, SampleMode,
};
pub use definition::{
    ApiDefinition, FieldDecl, HandlerDef, RouteDef, RouteRegistration, RouterDef, SchemaDef,
    ViewDef,
};
pub use endpoint::{clean_docstring, Endpoint, EndpointBuilder, EndpointFields};
pub use error::{ConformanceError, ExtractError, LoadError, PayloadError};
pub use loader::{
    is_url, load_definition, load_definition_auto, load_definition_str, load_payload,
    load_settings,
};
pub use path::{compose_path, simplify_pattern};
pub use types::{sort_verbs, Direction, ExclusionSet, RouteErrorPolicy, Settings};
pub use verbs::{resolve_verbs, VerbResolution};
pub use walker::{FieldNode, Walker};

#[cfg(feature = "remote")]
pub use loader::load_definition_url;
