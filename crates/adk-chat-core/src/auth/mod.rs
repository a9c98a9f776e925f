//! Authentication for adk-chat
//!
//! - TokenSource capability trait with metadata-server and gcloud providers
//! - inline service-account credential materialization

pub mod credentials;
pub mod token;

pub use credentials::materialize_inline_credentials;
pub use token::{
    default_source, GcloudTokenSource, MetadataTokenSource, StaticTokenSource, TokenSource,
};
