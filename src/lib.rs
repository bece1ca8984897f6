// FinApp Analytics - Client Core Library
// Authenticated HTTP pipeline + category seeding, used by the UI and the CLI

pub mod api;
pub mod config;
pub mod entities;
pub mod environment;
pub mod error;
pub mod fetch;
pub mod seeding;
pub mod session;
pub mod token_store;

// Re-export commonly used types
pub use api::{is_duplicate_error, FinAppApi, DUPLICATE_MARKER};
pub use config::ClientConfig;
pub use entities::{
    Category, CategoryKey, CategoryType, NewCategory, NewTransaction, PredefinedCategory,
    Transaction, PREDEFINED_CATEGORIES,
};
pub use environment::{is_loopback_host, resolve_base_url};
pub use error::{ApiError, ApiResult};
pub use fetch::{
    ApiRequest, AuthenticatedClient, CredentialsMode, FetchOutcome, FetchState, REFRESH_PATH,
};
pub use seeding::{
    CategorySeeder, CreationResult, CreationStatus, SeedOutcome, SeedReport, SeedingPhase,
};
pub use session::AppSession;
pub use token_store::TokenStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
