use anyhow::anyhow;
use shuttle_runtime::SecretStore;

const DEFAULT_DATABASE: &str = "cinema-booking";
const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_CURRENCY: &str = "$";

#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub database: String,
    pub app_url: Option<String>,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub jwt_secret: String,
    pub stripe_webhook_secret: String,
    pub inngest_event_key: Option<String>,
    pub currency: String,
}

impl Config {
    /// Reads the deployment's secrets (`Secrets.toml` locally).
    pub fn from_secrets(secret_store: &SecretStore) -> anyhow::Result<Self> {
        Self::from_lookup(|key| secret_store.get(key))
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("secret {key} was not found"))
        };
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Config {
            mongodb_uri: required("MONGODB_URI")?,
            database: optional("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            app_url: optional("APP_URL"),
            tmdb_api_key: required("TMDB_API_KEY")?,
            tmdb_base_url: optional("TMDB_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string()),
            jwt_secret: required("JWT_SECRET")?,
            stripe_webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            inngest_event_key: optional("INNGEST_EVENT_KEY"),
            currency: optional("CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        })
    }
}
