// 🏷️ Category Entity - Expense / income buckets stored by the backend
//
// "Category id is IDENTITY for the backend, (name, type) is IDENTITY for seeding"
//
// Problem solved:
// - The backend assigns ids, the client only ever sees them after creation
// - Seeding must not duplicate a category the user already has, even if
//   its casing or surrounding whitespace differ ("  salário " == "Salário")
// - Wire format is Portuguese: {id, nome, tipo, cor}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CATEGORY TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryType {
    /// Expense category (money going out) - wire value "despesa"
    Expense,

    /// Income category (money coming in) - wire value "receita"
    Income,
}

impl CategoryType {
    /// Value the backend stores in `tipo`
    pub fn as_wire(&self) -> &'static str {
        match self {
            CategoryType::Expense => "despesa",
            CategoryType::Income => "receita",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Expense => "Expense",
            CategoryType::Income => "Income",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for CategoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "despesa" | "expense" => Ok(CategoryType::Expense),
            "receita" | "income" => Ok(CategoryType::Income),
            other => Err(format!("Unknown category type: {}", other)),
        }
    }
}

impl TryFrom<String> for CategoryType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CategoryType> for String {
    fn from(value: CategoryType) -> Self {
        value.as_wire().to_string()
    }
}

// ============================================================================
// CATEGORY ENTITY
// ============================================================================

/// Category as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Backend-assigned identity (numeric or string ids are both accepted)
    #[serde(default, deserialize_with = "super::opt_string_or_number")]
    pub id: Option<String>,

    #[serde(rename = "nome")]
    pub name: String,

    #[serde(rename = "tipo")]
    pub category_type: CategoryType,

    /// Optional color for UI (e.g., "#FF5733")
    #[serde(rename = "cor", default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Category {
    /// Deduplication key for this category
    pub fn key(&self) -> CategoryKey {
        CategoryKey::new(&self.name, self.category_type)
    }
}

/// Payload for `POST /categorias`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    #[serde(rename = "nome")]
    pub name: String,

    #[serde(rename = "tipo")]
    pub category_type: CategoryType,

    #[serde(rename = "cor", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewCategory {
    /// Create a payload, rejecting blank names
    pub fn new(name: impl Into<String>, category_type: CategoryType) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Category name must not be empty".to_string());
        }

        Ok(NewCategory {
            name,
            category_type,
            color: None,
        })
    }

    /// Builder pattern: add display color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

// ============================================================================
// DEDUPLICATION KEY
// ============================================================================

/// Normalized (lowercased-trimmed name, type) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryKey {
    pub name: String,
    pub category_type: CategoryType,
}

impl CategoryKey {
    pub fn new(name: &str, category_type: CategoryType) -> Self {
        CategoryKey {
            name: name.trim().to_lowercase(),
            category_type,
        }
    }
}

// ============================================================================
// PREDEFINED CATEGORIES
// ============================================================================

/// Template of a category every account should end up with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredefinedCategory {
    pub name: &'static str,
    pub category_type: CategoryType,
    pub color: &'static str,
}

impl PredefinedCategory {
    pub const fn new(name: &'static str, category_type: CategoryType, color: &'static str) -> Self {
        PredefinedCategory {
            name,
            category_type,
            color,
        }
    }

    pub fn key(&self) -> CategoryKey {
        CategoryKey::new(self.name, self.category_type)
    }

    pub fn to_new_category(&self) -> NewCategory {
        NewCategory {
            name: self.name.to_string(),
            category_type: self.category_type,
            color: Some(self.color.to_string()),
        }
    }
}

/// Default catalog, in creation order
///
/// Structure:
/// - Expenses: Alimentação, Transporte, Moradia, Saúde, Educação, Lazer,
///   Compras, Contas, Outros
/// - Income: Salário, Freelance, Investimentos, Bônus, Outros
pub const PREDEFINED_CATEGORIES: &[PredefinedCategory] = &[
    // ====================================================================
    // EXPENSE CATEGORIES
    // ====================================================================
    PredefinedCategory::new("Alimentação", CategoryType::Expense, "#FF6B6B"),
    PredefinedCategory::new("Transporte", CategoryType::Expense, "#4ECDC4"),
    PredefinedCategory::new("Moradia", CategoryType::Expense, "#45B7D1"),
    PredefinedCategory::new("Saúde", CategoryType::Expense, "#96CEB4"),
    PredefinedCategory::new("Educação", CategoryType::Expense, "#FFEAA7"),
    PredefinedCategory::new("Lazer", CategoryType::Expense, "#DDA0DD"),
    PredefinedCategory::new("Compras", CategoryType::Expense, "#F7DC6F"),
    PredefinedCategory::new("Contas", CategoryType::Expense, "#98D8C8"),
    PredefinedCategory::new("Outros", CategoryType::Expense, "#BDC3C7"),
    // ====================================================================
    // INCOME CATEGORIES
    // ====================================================================
    PredefinedCategory::new("Salário", CategoryType::Income, "#2ECC71"),
    PredefinedCategory::new("Freelance", CategoryType::Income, "#3498DB"),
    PredefinedCategory::new("Investimentos", CategoryType::Income, "#9B59B6"),
    PredefinedCategory::new("Bônus", CategoryType::Income, "#F1C40F"),
    PredefinedCategory::new("Outros", CategoryType::Income, "#95A5A6"),
];

// ============================================================================
// TESTS
// ============================================================================
