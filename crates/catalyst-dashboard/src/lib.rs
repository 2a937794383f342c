//! Administrative records console
//!
//! Lists backend records, opens a detail view for one of them and edits its
//! status optimistically: the change shows up immediately and is rolled back
//! if the backend rejects it.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod notify;
pub mod render;
pub mod screen;

pub use notify::{ConsoleNotifier, NotificationCenter, Notifier, Toast, ToastId, ToastKind};
pub use render::OutputFormat;
pub use screen::{RecordScreen, SaveOutcome, ScreenModel, ScreenState, SkipReason};

use catalyst_client::{ApiClient, RecordApi, TokenProvider};
use catalyst_core::{Config, Error, ResourceDescriptor, Result};
use std::sync::Arc;

/// Shared wiring for every screen: one HTTP client, one token provider and
/// one notification sink
#[derive(Debug, Clone)]
pub struct Console {
    client: ApiClient,
    resources: Vec<ResourceDescriptor>,
    tokens: Arc<dyn TokenProvider>,
    notifier: Arc<dyn Notifier>,
}

impl Console {
    /// Wire a console from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: &Config,
        tokens: Arc<dyn TokenProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        Ok(Self {
            client: ApiClient::from_config(&config.api)?,
            resources: config.resource_descriptors(),
            tokens,
            notifier,
        })
    }

    /// Known resources
    #[must_use]
    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    /// Create an unmounted screen for a resource
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown resource name.
    pub fn screen(&self, resource: &str) -> Result<RecordScreen> {
        let descriptor = self
            .resources
            .iter()
            .find(|d| d.name == resource)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("resource '{resource}'")))?;

        Ok(RecordScreen::new(
            RecordApi::new(self.client.clone(), descriptor),
            Arc::clone(&self.tokens),
            Arc::clone(&self.notifier),
        ))
    }
}
