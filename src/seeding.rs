// 🌱 Category Seeding - Make sure every account has the default catalog
//
// State machine (per session):
//
//   Idle ──▶ InProgress ──▶ Done        (sticky, later calls are no-ops)
//                 │
//                 └──────▶ Idle          (no listing -> try again later)
//
// - Entry: Done -> no-op, InProgress -> no-op, no token -> no-op (stays Idle)
// - The InProgress flag is taken synchronously BEFORE the first await, so
//   two simultaneous calls run a single pass
// - "já existe" on creation = soft success (the category is there)
// - Other creation failures are recorded and skipped; the pass still ends
//   in Done, a failed category waits for the next session
//
// Not a distributed lock: two processes / tabs can still seed in parallel.

use crate::api::{is_duplicate_error, FinAppApi};
use crate::entities::{CategoryKey, CategoryType, PredefinedCategory, PREDEFINED_CATEGORIES};
use crate::error::{ApiError, ApiResult};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

// ============================================================================
// SEEDING STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedingPhase {
    Idle,
    InProgress,
    Done,
}

#[derive(Debug, Default)]
struct SeedingState {
    /// Sticky once a pass finished
    initialized: bool,

    /// True only while a pass runs
    in_progress: bool,
}

/// Clears `in_progress` when the pass ends, however it ends
struct InProgressGuard {
    state: Arc<Mutex<SeedingState>>,
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.in_progress = false;
    }
}

// ============================================================================
// SEED RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CreationStatus {
    /// Backend answered 2xx
    Created,

    /// Backend said "já existe" - desired end state already holds
    AlreadyExisted,

    /// Anything else; logged and skipped
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationResult {
    pub name: String,
    pub category_type: CategoryType,
    pub status: CreationStatus,
}

impl CreationResult {
    /// Created or already existing
    pub fn is_processed(&self) -> bool {
        !matches!(self.status, CreationStatus::Failed { .. })
    }
}

/// What one reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedReport {
    /// Categories the user already had, matched by (name, type)
    pub already_present: usize,

    /// One entry per missing category, in catalog order
    pub results: Vec<CreationResult>,
}

impl SeedReport {
    pub fn created(&self) -> usize {
        self.count(|s| matches!(s, CreationStatus::Created))
    }

    pub fn already_existed(&self) -> usize {
        self.count(|s| matches!(s, CreationStatus::AlreadyExisted))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, CreationStatus::Failed { .. }))
    }

    /// Created + soft successes
    pub fn processed(&self) -> usize {
        self.results.iter().filter(|r| r.is_processed()).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "Seeding: {} already present, {} created, {} already existed, {} failed",
            self.already_present,
            self.created(),
            self.already_existed(),
            self.failed()
        )
    }

    fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CreationStatus) -> bool,
    {
        self.results.iter().filter(|r| predicate(&r.status)).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeedOutcome {
    /// A previous pass finished; nothing was sent
    AlreadyInitialized,

    /// Another pass is running; nothing was sent
    AlreadyRunning,

    /// Token store empty; nothing was sent, state stays Idle
    NoCredential,

    /// Listing existing categories failed; state back to Idle
    ListingFailed(StatusCode),

    /// Pass finished; state is Done
    Completed(SeedReport),
}

impl SeedOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SeedOutcome::Completed(_))
    }
}

enum Entry {
    Skip(SeedOutcome),
    Start(InProgressGuard),
}

// ============================================================================
// CATEGORY SEEDER
// ============================================================================

/// Reconciles a catalog of default categories against the backend
///
/// Clones share the same state, so a seeder handed to several UI
/// components still runs at most one pass at a time.
#[derive(Debug, Clone)]
pub struct CategorySeeder {
    api: FinAppApi,
    catalog: Arc<Vec<PredefinedCategory>>,
    state: Arc<Mutex<SeedingState>>,
}

impl CategorySeeder {
    /// Seeder for the built-in catalog
    pub fn new(api: FinAppApi) -> Self {
        Self::with_catalog(api, PREDEFINED_CATEGORIES.to_vec())
    }

    pub fn with_catalog(api: FinAppApi, catalog: Vec<PredefinedCategory>) -> Self {
        CategorySeeder {
            api,
            catalog: Arc::new(catalog),
            state: Arc::new(Mutex::new(SeedingState::default())),
        }
    }

    pub fn phase(&self) -> SeedingPhase {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.initialized {
            SeedingPhase::Done
        } else if state.in_progress {
            SeedingPhase::InProgress
        } else {
            SeedingPhase::Idle
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.phase() == SeedingPhase::Done
    }

    /// Run one reconciliation pass, unless one already ran or is running
    pub async fn ensure_predefined_categories(&self) -> ApiResult<SeedOutcome> {
        let _guard = match self.enter() {
            Entry::Skip(outcome) => {
                debug!(?outcome, "seeding skipped");
                return Ok(outcome);
            }
            Entry::Start(guard) => guard,
        };

        info!(catalog = self.catalog.len(), "checking predefined categories");

        let existing = match self.api.list_category_keys().await {
            Ok(keys) => keys,
            Err(ApiError::Status { status, message }) => {
                warn!(%status, %message, "could not list categories, seeding aborted");
                return Ok(SeedOutcome::ListingFailed(status));
            }
            Err(err) => return Err(err),
        };

        let present: HashSet<CategoryKey> = existing.into_iter().collect();
        let missing: Vec<&PredefinedCategory> = self
            .catalog
            .iter()
            .filter(|template| !present.contains(&template.key()))
            .collect();

        let mut report = SeedReport {
            already_present: self.catalog.len() - missing.len(),
            results: Vec::with_capacity(missing.len()),
        };

        for template in missing {
            let status = match self.api.create_category(&template.to_new_category()).await {
                Ok(_) => {
                    info!(name = template.name, "created predefined category");
                    CreationStatus::Created
                }
                Err(err) if is_duplicate_error(&err) => {
                    debug!(name = template.name, "predefined category already exists");
                    CreationStatus::AlreadyExisted
                }
                Err(err) => {
                    warn!(name = template.name, error = %err, "could not create predefined category");
                    CreationStatus::Failed {
                        reason: err.to_string(),
                    }
                }
            };

            report.results.push(CreationResult {
                name: template.name.to_string(),
                category_type: template.category_type,
                status,
            });
        }

        self.mark_initialized();
        info!("{}", report.summary());

        Ok(SeedOutcome::Completed(report))
    }

    /// Synchronous check-and-set; never awaits
    fn enter(&self) -> Entry {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.initialized {
            return Entry::Skip(SeedOutcome::AlreadyInitialized);
        }
        if state.in_progress {
            return Entry::Skip(SeedOutcome::AlreadyRunning);
        }
        if !self.api.client().tokens().has_token() {
            return Entry::Skip(SeedOutcome::NoCredential);
        }

        state.in_progress = true;
        Entry::Start(InProgressGuard {
            state: self.state.clone(),
        })
    }

    fn mark_initialized(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.initialized = true;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::fetch::AuthenticatedClient;
    use crate::token_store::TokenStore;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn seeder_for(base_url: &str, tokens: TokenStore, catalog: Vec<PredefinedCategory>) -> CategorySeeder {
        let config = ClientConfig::default().with_base_url(base_url);
        let client = AuthenticatedClient::new(&config, tokens).unwrap();
        CategorySeeder::with_catalog(FinAppApi::new(client), catalog)
    }

    fn income_catalog() -> Vec<PredefinedCategory> {
        vec![
            PredefinedCategory::new("Salário", CategoryType::Income, "#2ECC71"),
            PredefinedCategory::new("Bônus", CategoryType::Income, "#F1C40F"),
        ]
    }

    async fn mock_listing(server: &MockServer, body: serde_json::Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path("/categorias"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_no_credential_is_a_noop() {
        let server = MockServer::start().await;
        let seeder = seeder_for(&server.uri(), TokenStore::new(), income_catalog());

        let outcome = seeder.ensure_predefined_categories().await.unwrap();

        assert_eq!(outcome, SeedOutcome::NoCredential);
        assert_eq!(seeder.phase(), SeedingPhase::Idle);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_creates_only_missing_categories() {
        let server = MockServer::start().await;
        mock_listing(&server, json!([{"id": 1, "nome": "Salário", "tipo": "receita"}]), 1).await;
        Mock::given(method("POST"))
            .and(path("/categorias"))
            .and(body_partial_json(json!({"nome": "Bônus", "tipo": "receita"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 2, "nome": "Bônus", "tipo": "receita", "cor": "#F1C40F"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let seeder = seeder_for(&server.uri(), TokenStore::with_token("T1"), income_catalog());
        let outcome = seeder.ensure_predefined_categories().await.unwrap();

        let SeedOutcome::Completed(report) = outcome else {
            panic!("expected a completed pass, got {:?}", outcome);
        };
        assert_eq!(report.already_present, 1);
        assert_eq!(report.created(), 1);
        assert_eq!(report.results[0].name, "Bônus");
        assert_eq!(seeder.phase(), SeedingPhase::Done);

        let posts = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.method.as_str() == "POST")
            .count();
        assert_eq!(posts, 1);
    }

    #[tokio::test]
    async fn test_matching_ignores_case_and_whitespace() {
        let server = MockServer::start().await;
        mock_listing(
            &server,
            json!([
                {"id": 1, "nome": "  SALÁRIO ", "tipo": "receita"},
                {"id": 2, "nome": "bônus", "tipo": "receita"}
            ]),
            1,
        )
        .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let seeder = seeder_for(&server.uri(), TokenStore::with_token("T1"), income_catalog());
        let outcome = seeder.ensure_predefined_categories().await.unwrap();

        assert_eq!(
            outcome,
            SeedOutcome::Completed(SeedReport {
                already_present: 2,
                results: vec![],
            })
        );
        assert!(seeder.is_initialized());
    }

    #[tokio::test]
    async fn test_same_name_other_type_is_still_missing() {
        let server = MockServer::start().await;
        mock_listing(&server, json!([{"id": 1, "nome": "Salário", "tipo": "despesa"}]), 1).await;
        Mock::given(method("POST"))
            .and(path("/categorias"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5})))
            .expect(2)
            .mount(&server)
            .await;

        let seeder = seeder_for(&server.uri(), TokenStore::with_token("T1"), income_catalog());
        let outcome = seeder.ensure_predefined_categories().await.unwrap();

        let SeedOutcome::Completed(report) = outcome else {
            panic!("expected a completed pass");
        };
        assert_eq!(report.created(), 2);
    }

    #[tokio::test]
    async fn test_plain_text_create_reply_counts_as_created() {
        let server = MockServer::start().await;
        mock_listing(&server, json!([]), 1).await;
        Mock::given(method("POST"))
            .and(path("/categorias"))
            .respond_with(ResponseTemplate::new(201).set_body_string("Created"))
            .expect(1)
            .mount(&server)
            .await;

        let catalog = vec![PredefinedCategory::new("Bônus", CategoryType::Income, "#F1C40F")];
        let seeder = seeder_for(&server.uri(), TokenStore::with_token("T1"), catalog);
        let outcome = seeder.ensure_predefined_categories().await.unwrap();

        let SeedOutcome::Completed(report) = outcome else {
            panic!("expected a completed pass, got {:?}", outcome);
        };
        assert_eq!(report.created(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.results[0].status, CreationStatus::Created);
    }

    #[tokio::test]
    async fn test_unknown_listing_rows_do_not_block_seeding() {
        let server = MockServer::start().await;
        mock_listing(
            &server,
            json!([
                {"id": 1, "nome": "Bônus", "tipo": "receita"},
                {"id": 2, "nome": "Pix", "tipo": "transferencia"},
                {"id": 3, "nome": null, "tipo": "despesa"}
            ]),
            1,
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/categorias"))
            .and(body_partial_json(json!({"nome": "Salário", "tipo": "receita"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
            .expect(1)
            .mount(&server)
            .await;

        let seeder = seeder_for(&server.uri(), TokenStore::with_token("T1"), income_catalog());
        let outcome = seeder.ensure_predefined_categories().await.unwrap();

        let SeedOutcome::Completed(report) = outcome else {
            panic!("expected a completed pass, got {:?}", outcome);
        };
        assert_eq!(report.already_present, 1);
        assert_eq!(report.created(), 1);
        assert_eq!(report.results[0].name, "Salário");
        assert_eq!(seeder.phase(), SeedingPhase::Done);
    }

    #[tokio::test]
    async fn test_second_call_after_done_sends_nothing() {
        let server = MockServer::start().await;
        mock_listing(
            &server,
            json!([
                {"id": 1, "nome": "Salário", "tipo": "receita"},
                {"id": 2, "nome": "Bônus", "tipo": "receita"}
            ]),
            1,
        )
        .await;

        let seeder = seeder_for(&server.uri(), TokenStore::with_token("T1"), income_catalog());
        assert!(seeder.ensure_predefined_categories().await.unwrap().is_completed());

        let before = server.received_requests().await.unwrap().len();
        let second = seeder.ensure_predefined_categories().await.unwrap();
        let after = server.received_requests().await.unwrap().len();

        assert_eq!(second, SeedOutcome::AlreadyInitialized);
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_simultaneous_calls_run_one_pass() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/categorias"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/categorias"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(2)
            .mount(&server)
            .await;

        let seeder = seeder_for(&server.uri(), TokenStore::with_token("T1"), income_catalog());
        let other = seeder.clone();

        let (first, second) = tokio::join!(
            seeder.ensure_predefined_categories(),
            other.ensure_predefined_categories()
        );

        assert!(first.unwrap().is_completed());
        assert_eq!(second.unwrap(), SeedOutcome::AlreadyRunning);
        assert_eq!(seeder.phase(), SeedingPhase::Done);
    }

    #[tokio::test]
    async fn test_duplicate_and_failed_creations_do_not_abort_batch() {
        let server = MockServer::start().await;
        mock_listing(&server, json!([]), 1).await;

        Mock::given(method("POST"))
            .and(path("/categorias"))
            .and(body_partial_json(json!({"nome": "Alimentação"})))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"erro": "Categoria já existe"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/categorias"))
            .and(body_partial_json(json!({"nome": "Transporte"})))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"erro": "Erro interno"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/categorias"))
            .and(body_partial_json(json!({"nome": "Moradia"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let catalog = vec![
            PredefinedCategory::new("Alimentação", CategoryType::Expense, "#FF6B6B"),
            PredefinedCategory::new("Transporte", CategoryType::Expense, "#4ECDC4"),
            PredefinedCategory::new("Moradia", CategoryType::Expense, "#45B7D1"),
        ];
        let seeder = seeder_for(&server.uri(), TokenStore::with_token("T1"), catalog);
        let outcome = seeder.ensure_predefined_categories().await.unwrap();

        let SeedOutcome::Completed(report) = outcome else {
            panic!("expected a completed pass");
        };
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.already_existed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.created(), 1);
        assert_eq!(report.processed(), 2);
        assert_eq!(report.results[0].status, CreationStatus::AlreadyExisted);
        assert!(matches!(report.results[1].status, CreationStatus::Failed { .. }));

        // Done even though one category failed
        assert_eq!(seeder.phase(), SeedingPhase::Done);
    }

    #[tokio::test]
    async fn test_listing_failure_returns_to_idle() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/categorias"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let seeder = seeder_for(&server.uri(), TokenStore::with_token("T1"), income_catalog());

        let outcome = seeder.ensure_predefined_categories().await.unwrap();
        assert_eq!(outcome, SeedOutcome::ListingFailed(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(seeder.phase(), SeedingPhase::Idle);

        // Not sticky: the next call tries again
        let again = seeder.ensure_predefined_categories().await.unwrap();
        assert_eq!(again, SeedOutcome::ListingFailed(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_listing_unauthorized_after_failed_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/categorias"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/usuario/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = TokenStore::with_token("expired");
        let seeder = seeder_for(&server.uri(), tokens.clone(), income_catalog());
        let outcome = seeder.ensure_predefined_categories().await.unwrap();

        assert_eq!(outcome, SeedOutcome::ListingFailed(StatusCode::UNAUTHORIZED));
        assert_eq!(seeder.phase(), SeedingPhase::Idle);
        assert!(!tokens.has_token());

        // Token gone: next call does not even try
        assert_eq!(
            seeder.ensure_predefined_categories().await.unwrap(),
            SeedOutcome::NoCredential
        );
    }

    #[tokio::test]
    async fn test_transport_failure_clears_in_progress() {
        let seeder = seeder_for("http://127.0.0.1:9", TokenStore::with_token("T1"), income_catalog());

        let result = seeder.ensure_predefined_categories().await;

        assert!(matches!(result, Err(ApiError::Transport(_))));
        assert_eq!(seeder.phase(), SeedingPhase::Idle);
    }

    #[test]
    fn test_report_summary() {
        let report = SeedReport {
            already_present: 10,
            results: vec![
                CreationResult {
                    name: "Bônus".to_string(),
                    category_type: CategoryType::Income,
                    status: CreationStatus::Created,
                },
                CreationResult {
                    name: "Lazer".to_string(),
                    category_type: CategoryType::Expense,
                    status: CreationStatus::Failed {
                        reason: "boom".to_string(),
                    },
                },
            ],
        };

        assert_eq!(
            report.summary(),
            "Seeding: 10 already present, 1 created, 0 already existed, 1 failed"
        );
    }

    #[test]
    fn test_default_seeder_uses_builtin_catalog() {
        let config = ClientConfig::default();
        let client = AuthenticatedClient::new(&config, TokenStore::new()).unwrap();
        let seeder = CategorySeeder::new(FinAppApi::new(client));

        assert_eq!(seeder.catalog.len(), PREDEFINED_CATEGORIES.len());
        assert_eq!(seeder.phase(), SeedingPhase::Idle);
    }
}
