// 💸 Transaction Entity - Money movements recorded by the backend
//
// Wire format: {id, descricao, valor, data, tipo, categoria_id}
// - valor may arrive as a JSON number or as a decimal string ("45.90")
// - data may arrive as a plain date or a full ISO timestamp

use super::category::CategoryType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Transaction as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, deserialize_with = "super::opt_string_or_number")]
    pub id: Option<String>,

    #[serde(rename = "descricao")]
    pub description: String,

    #[serde(rename = "valor", deserialize_with = "super::decimal_amount")]
    pub amount: f64,

    #[serde(rename = "data", deserialize_with = "super::lenient_date")]
    pub date: NaiveDate,

    #[serde(rename = "tipo")]
    pub transaction_type: CategoryType,

    #[serde(
        rename = "categoria_id",
        default,
        deserialize_with = "super::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<String>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.transaction_type == CategoryType::Expense
    }

    /// Amount with sign: expenses negative, income positive
    pub fn signed_amount(&self) -> f64 {
        match self.transaction_type {
            CategoryType::Expense => -self.amount.abs(),
            CategoryType::Income => self.amount.abs(),
        }
    }
}

/// Payload for `POST /transacoes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    #[serde(rename = "descricao")]
    pub description: String,

    #[serde(rename = "valor")]
    pub amount: f64,

    #[serde(rename = "data")]
    pub date: NaiveDate,

    #[serde(rename = "tipo")]
    pub transaction_type: CategoryType,

    #[serde(rename = "categoria_id", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl NewTransaction {
    /// Create a payload; amount must be a positive finite number
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        date: NaiveDate,
        transaction_type: CategoryType,
    ) -> Result<Self, String> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err("Transaction description must not be empty".to_string());
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(format!("Invalid transaction amount: {}", amount));
        }

        Ok(NewTransaction {
            description,
            amount,
            date,
            transaction_type,
            category_id: None,
        })
    }

    /// Builder pattern: attach to a category
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================
