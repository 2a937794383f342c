//! HTTP access to the catalyst backend API
//!
//! [`ApiClient`] performs the individual requests, [`RecordApi`] binds one to a
//! resource descriptor, and a [`TokenProvider`] supplies the bearer token each
//! request carries.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod auth;
pub mod http;
pub mod records;

pub use auth::{
    ClientCredentialsProvider, StaticTokenProvider, TokenProvider, provider_from_config,
};
pub use http::ApiClient;
pub use records::{ListQuery, RecordApi};
