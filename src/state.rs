use std::sync::Arc;

use crate::{auth::Authenticator, catalog::MovieCatalog, notify::EventNotifier, store::Store};

/// Everything a request handler needs, shared through an `Extension` layer.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub catalog: Arc<dyn MovieCatalog>,
    pub auth: Arc<dyn Authenticator>,
    pub notifier: Arc<dyn EventNotifier>,
    pub stripe_webhook_secret: String,
    pub currency: String,
    pub app_url: Option<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        catalog: Arc<dyn MovieCatalog>,
        auth: Arc<dyn Authenticator>,
        notifier: Arc<dyn EventNotifier>,
    ) -> Self {
        AppState {
            store,
            catalog,
            auth,
            notifier,
            stripe_webhook_secret: String::new(),
            currency: "$".to_string(),
            app_url: None,
        }
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.stripe_webhook_secret = secret.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_app_url(mut self, app_url: Option<String>) -> Self {
        self.app_url = app_url;
        self
    }
}
