// 🌐 FinApp API - Typed endpoints on top of the authenticated client
//
// Endpoints:
// - GET/POST /categorias
// - GET/POST /transacoes
// - POST /usuario/login, POST /usuario/logout
//
// Non-2xx answers become ApiError::Status, carrying the backend's `erro`
// message when it sent one.

use crate::entities::{Category, CategoryKey, NewCategory, NewTransaction, Transaction};
use crate::error::{ApiError, ApiResult};
use crate::fetch::{ApiRequest, AuthenticatedClient};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const CATEGORIES_PATH: &str = "/categorias";
pub const TRANSACTIONS_PATH: &str = "/transacoes";
pub const LOGIN_PATH: &str = "/usuario/login";
pub const LOGOUT_PATH: &str = "/usuario/logout";

/// Marker the backend puts in `erro` when a category already exists
pub const DUPLICATE_MARKER: &str = "já existe";

/// Error payload: `{"erro": "..."}`
#[derive(Debug, Clone, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    erro: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    senha: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken", default)]
    access_token: Option<String>,
}

/// Whether an error is the backend saying "this category already exists"
pub fn is_duplicate_error(err: &ApiError) -> bool {
    match err {
        ApiError::Status { message, .. } => message.to_lowercase().contains(DUPLICATE_MARKER),
        _ => false,
    }
}

/// Turn a non-2xx response into `ApiError::Status`
pub async fn status_error(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = parsed
        .erro
        .or(parsed.message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body.trim().to_string()
            }
        });

    ApiError::Status { status, message }
}

/// Decode a 2xx JSON body, or map the failure
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    if !response.status().is_success() {
        return Err(status_error(response).await);
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

// ============================================================================
// API CLIENT
// ============================================================================

#[derive(Debug, Clone)]
pub struct FinAppApi {
    client: AuthenticatedClient,
}

impl FinAppApi {
    pub fn new(client: AuthenticatedClient) -> Self {
        FinAppApi { client }
    }

    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    // ------------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------------

    pub async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        let response = self.client.send(&ApiRequest::get(CATEGORIES_PATH)).await?;
        let categories: Vec<Category> = decode_json(response).await?;
        debug!(count = categories.len(), "listed categories");
        Ok(categories)
    }

    /// Seeding keys of the listed categories
    ///
    /// Rows that do not map to a known (name, type) pair are skipped, so one
    /// odd row never blocks reconciliation.
    pub async fn list_category_keys(&self) -> ApiResult<Vec<CategoryKey>> {
        let response = self.client.send(&ApiRequest::get(CATEGORIES_PATH)).await?;
        let rows: Vec<serde_json::Value> = decode_json(response).await?;
        let total = rows.len();

        let keys: Vec<CategoryKey> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<Category>(row) {
                Ok(category) => Some(category.key()),
                Err(err) => {
                    debug!(error = %err, "skipping category row");
                    None
                }
            })
            .collect();

        debug!(total, usable = keys.len(), "listed category keys");
        Ok(keys)
    }

    /// Create one category
    ///
    /// When the backend's echo is not a full category, the payload plus the
    /// returned `id` is used instead.
    pub async fn create_category(&self, category: &NewCategory) -> ApiResult<Category> {
        let request = ApiRequest::post(CATEGORIES_PATH).json(category)?;
        let response = self.client.send(&request).await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        // A 2xx is a creation whatever the body says (empty, plain text, JSON)
        let bytes = response.bytes().await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            debug!(len = bytes.len(), "create reply is not JSON, using the payload");
            serde_json::Value::Null
        });

        let created = serde_json::from_value::<Category>(body.clone()).unwrap_or_else(|_| {
            #[derive(Deserialize)]
            struct IdOnly {
                #[serde(default, deserialize_with = "crate::entities::opt_string_or_number")]
                id: Option<String>,
            }

            let id = serde_json::from_value::<IdOnly>(body)
                .ok()
                .and_then(|parsed| parsed.id);
            Category {
                id,
                name: category.name.clone(),
                category_type: category.category_type,
                color: category.color.clone(),
            }
        });

        debug!(name = %created.name, id = ?created.id, "created category");
        Ok(created)
    }

    // ------------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------------

    pub async fn list_transactions(&self) -> ApiResult<Vec<Transaction>> {
        let response = self.client.send(&ApiRequest::get(TRANSACTIONS_PATH)).await?;
        let transactions: Vec<Transaction> = decode_json(response).await?;
        debug!(count = transactions.len(), "listed transactions");
        Ok(transactions)
    }

    pub async fn create_transaction(&self, transaction: &NewTransaction) -> ApiResult<Transaction> {
        let request = ApiRequest::post(TRANSACTIONS_PATH).json(transaction)?;
        let response = self.client.send(&request).await?;
        decode_json(response).await
    }

    // ------------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------------

    /// Log in and keep the returned access token
    ///
    /// The backend also sets the long-lived refresh cookie, which lands in
    /// the client's cookie jar.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<()> {
        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest {
            email,
            senha: password,
        })?;
        let response = self.client.send_without_refresh(&request).await?;
        let body: TokenResponse = decode_json(response).await?;

        let token = body
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(ApiError::MissingToken)?;
        self.client.tokens().set_token(Some(token));

        info!(email, "logged in");
        Ok(())
    }

    /// End the server session; the local token is dropped whatever happens
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self
            .client
            .send_without_refresh(&ApiRequest::post(LOGOUT_PATH))
            .await;
        self.client.tokens().clear_token();

        let response = result?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        info!("logged out");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
