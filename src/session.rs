// 🧭 App Session - The one context object UI code holds on to
//
// Owns everything that used to be process-wide: the token store, the
// cookie jar (inside the HTTP client) and the seeding flags. Build one per
// application session; tests build one each.

use crate::api::FinAppApi;
use crate::config::ClientConfig;
use crate::error::ApiResult;
use crate::fetch::AuthenticatedClient;
use crate::seeding::{CategorySeeder, SeedOutcome};
use crate::token_store::TokenStore;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AppSession {
    config: ClientConfig,
    tokens: TokenStore,
    api: FinAppApi,
    seeder: CategorySeeder,
}

impl AppSession {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let tokens = TokenStore::new();
        let client = AuthenticatedClient::new(&config, tokens.clone())?;
        let api = FinAppApi::new(client);
        let seeder = CategorySeeder::new(api.clone());

        info!(base_url = %api.client().base_url(), "session created");

        Ok(AppSession {
            config,
            tokens,
            api,
            seeder,
        })
    }

    /// Session that starts with a known access token
    pub fn with_token(config: ClientConfig, token: impl Into<String>) -> ApiResult<Self> {
        let session = Self::new(config)?;
        session.tokens.set_token(Some(token.into()));
        Ok(session)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn api(&self) -> &FinAppApi {
        &self.api
    }

    pub fn seeder(&self) -> &CategorySeeder {
        &self.seeder
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.has_token()
    }

    /// Log in, then make sure the default categories exist
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<SeedOutcome> {
        self.api.login(email, password).await?;
        self.seeder.ensure_predefined_categories().await
    }

    pub async fn logout(&self) -> ApiResult<()> {
        self.api.logout().await
    }
}

// ============================================================================
// TESTS
// ============================================================================
