//! Typed assistant tool requests and their resolution plan.
//!
//! Each tool the assistant can call (expense, budget, invoice) is a tagged
//! variant with its own typed fields, so every filter combination is
//! handled by an exhaustive `match` instead of optional-field checks on a
//! loose JSON object.
//!
//! [`plan_tool_request`] runs the date and name resolution that has to
//! happen before any persistence call and returns one of:
//!
//! - [`ToolPlan::Ready`]: every reference resolved to a record id or date;
//! - [`ToolPlan::Clarify`]: a name was ambiguous and the user must choose;
//! - [`ToolPlan::OfferCreate`]: a name matched nothing.
//!
//! ```
//! use chrono::NaiveDate;
//! use ledger_engine::tools::{plan_tool_request, Catalog, ToolPlan, ToolRequest};
//!
//! let request: ToolRequest = serde_json::from_str(
//!     r#"{"tool":"expense","action":"list","period":"last month"}"#,
//! ).unwrap();
//! let anchor = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let plan = plan_tool_request(&request, &Catalog::default(), anchor).unwrap();
//! let ToolPlan::Ready(ready) = plan else { panic!("expected ready") };
//! assert_eq!(ready.refs.start_date.as_deref(), Some("2023-12-01"));
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::date_query::resolve_date_query;
use crate::entities::{
    scoped_to, Category, CategoryKind, Client, Identified, Named, Owned, TaxRate, Vendor,
};
use crate::entity_match::{
    match_category, match_client, match_tax_rate, match_vendor, MatchOutcome, MatchResult,
};
use crate::error::{EngineError, Result};
use crate::relative_date::parse_relative_date;

// ── Requests ────────────────────────────────────────────────────────────────

/// A tool call from the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolRequest {
    Expense(ExpenseAction),
    Budget(BudgetAction),
    Invoice(InvoiceQuery),
}

impl ToolRequest {
    /// `"<tool>.<action>"`, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Expense(ExpenseAction::Create { .. }) => "expense.create",
            Self::Expense(ExpenseAction::Update { .. }) => "expense.update",
            Self::Expense(ExpenseAction::Delete { .. }) => "expense.delete",
            Self::Expense(ExpenseAction::List { .. }) => "expense.list",
            Self::Budget(BudgetAction::Create { .. }) => "budget.create",
            Self::Budget(BudgetAction::Update { .. }) => "budget.update",
            Self::Budget(BudgetAction::Delete { .. }) => "budget.delete",
            Self::Budget(BudgetAction::List { .. }) => "budget.list",
            Self::Invoice(_) => "invoice.query",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ExpenseAction {
    Create {
        amount: f64,
        #[serde(default)]
        description: Option<String>,
        /// Single date phrase; defaults to the anchor.
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        vendor: Option<String>,
        #[serde(default)]
        tax_rate: Option<String>,
    },
    Update {
        id: String,
        #[serde(default)]
        amount: Option<f64>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        vendor: Option<String>,
    },
    Delete {
        id: String,
    },
    List {
        /// Date-range phrase ("last month", "from jan to march").
        #[serde(default)]
        period: Option<String>,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        vendor: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BudgetAction {
    Create {
        category: String,
        amount: f64,
        /// Date-range phrase; defaults to "this month".
        #[serde(default)]
        period: Option<String>,
    },
    Update {
        id: String,
        #[serde(default)]
        amount: Option<f64>,
        #[serde(default)]
        period: Option<String>,
    },
    Delete {
        id: String,
    },
    List {
        #[serde(default)]
        period: Option<String>,
        #[serde(default)]
        category: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvoiceQuery {
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}

// ── Catalog ─────────────────────────────────────────────────────────────────

/// The lookup records of one account, fetched by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub tax_rates: Vec<TaxRate>,
}

impl Catalog {
    /// A copy holding only the records owned by `account_id`.
    pub fn scoped(&self, account_id: &str) -> Catalog {
        Catalog {
            categories: owned_by(&self.categories, account_id),
            vendors: owned_by(&self.vendors, account_id),
            clients: owned_by(&self.clients, account_id),
            tax_rates: owned_by(&self.tax_rates, account_id),
        }
    }
}

fn owned_by<T: Owned + Clone>(items: &[T], account_id: &str) -> Vec<T> {
    scoped_to(items, account_id).into_iter().cloned().collect()
}

// ── Plans ───────────────────────────────────────────────────────────────────

/// Which reference a clarification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Category,
    Vendor,
    Client,
    TaxRate,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Category => "category",
            Field::Vendor => "vendor",
            Field::Client => "client",
            Field::TaxRate => "tax rate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
}

/// Ids and dates resolved from a request's free-text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedRefs {
    /// Single date (`YYYY-MM-DD`) for create/update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// How the period phrase was read, including "could not parse".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTool {
    pub request: ToolRequest,
    pub refs: ResolvedRefs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolPlan {
    Ready(ResolvedTool),
    Clarify {
        field: Field,
        question: String,
        candidates: Vec<Candidate>,
    },
    OfferCreate {
        field: Field,
        name: String,
    },
}

// ── Planning ────────────────────────────────────────────────────────────────

/// Stop planning and hand back a clarification or create offer.
macro_rules! resolve_or_halt {
    ($lookup:expr) => {
        match $lookup {
            Ok(id) => id,
            Err(plan) => return Ok(plan),
        }
    };
}

/// Resolve a tool request's dates and names against `catalog`.
///
/// References are resolved in field order (category, vendor, client, tax
/// rate); the first one that is ambiguous or missing decides the plan.
///
/// # Errors
///
/// [`EngineError::InvalidRequest`] for a non-positive amount, a blank id or
/// category, or an update that changes nothing. Single-date fields that
/// cannot be read fail with the error from
/// [`parse_relative_date`](crate::relative_date::parse_relative_date).
pub fn plan_tool_request(
    request: &ToolRequest,
    catalog: &Catalog,
    anchor: NaiveDate,
) -> Result<ToolPlan> {
    debug!(tool = request.name(), "planning tool request");
    let mut refs = ResolvedRefs::default();

    match request {
        ToolRequest::Expense(ExpenseAction::Create {
            amount,
            date,
            category,
            vendor,
            tax_rate,
            ..
        }) => {
            require_amount(*amount)?;
            let date = single_date(date.as_deref(), anchor)?.unwrap_or(anchor);
            refs.date = Some(date.to_string());
            if let Some(name) = category {
                refs.category_id = Some(resolve_or_halt!(expense_category(catalog, name)));
            }
            if let Some(name) = vendor {
                refs.vendor_id = Some(resolve_or_halt!(vendor_ref(catalog, name)));
            }
            if let Some(text) = tax_rate {
                refs.tax_rate_id = Some(resolve_or_halt!(resolve_ref(
                    Field::TaxRate,
                    text,
                    match_tax_rate(&catalog.tax_rates, text),
                )));
            }
        }
        ToolRequest::Expense(ExpenseAction::Update {
            id,
            amount,
            description,
            date,
            category,
            vendor,
        }) => {
            require_id(id)?;
            if amount.is_none()
                && description.is_none()
                && date.is_none()
                && category.is_none()
                && vendor.is_none()
            {
                return Err(EngineError::InvalidRequest(format!(
                    "update of expense '{id}' changes nothing"
                )));
            }
            if let Some(amount) = amount {
                require_amount(*amount)?;
            }
            refs.date = single_date(date.as_deref(), anchor)?.map(|d| d.to_string());
            if let Some(name) = category {
                refs.category_id = Some(resolve_or_halt!(expense_category(catalog, name)));
            }
            if let Some(name) = vendor {
                refs.vendor_id = Some(resolve_or_halt!(vendor_ref(catalog, name)));
            }
        }
        ToolRequest::Expense(ExpenseAction::Delete { id })
        | ToolRequest::Budget(BudgetAction::Delete { id }) => {
            require_id(id)?;
        }
        ToolRequest::Expense(ExpenseAction::List {
            period,
            category,
            vendor,
        }) => {
            if let Some(text) = period {
                apply_period(&mut refs, text, anchor)?;
            }
            if let Some(name) = category {
                refs.category_id = Some(resolve_or_halt!(expense_category(catalog, name)));
            }
            if let Some(name) = vendor {
                refs.vendor_id = Some(resolve_or_halt!(vendor_ref(catalog, name)));
            }
        }
        ToolRequest::Budget(BudgetAction::Create {
            category,
            amount,
            period,
        }) => {
            require_amount(*amount)?;
            if category.trim().is_empty() {
                return Err(EngineError::InvalidRequest(
                    "budget needs a category".to_string(),
                ));
            }
            apply_period(&mut refs, period.as_deref().unwrap_or("this month"), anchor)?;
            refs.category_id = Some(resolve_or_halt!(expense_category(catalog, category)));
        }
        ToolRequest::Budget(BudgetAction::Update { id, amount, period }) => {
            require_id(id)?;
            if amount.is_none() && period.is_none() {
                return Err(EngineError::InvalidRequest(format!(
                    "update of budget '{id}' changes nothing"
                )));
            }
            if let Some(amount) = amount {
                require_amount(*amount)?;
            }
            if let Some(text) = period {
                apply_period(&mut refs, text, anchor)?;
            }
        }
        ToolRequest::Budget(BudgetAction::List { period, category }) => {
            if let Some(text) = period {
                apply_period(&mut refs, text, anchor)?;
            }
            if let Some(name) = category {
                refs.category_id = Some(resolve_or_halt!(expense_category(catalog, name)));
            }
        }
        ToolRequest::Invoice(InvoiceQuery { client, period, .. }) => {
            if let Some(text) = period {
                apply_period(&mut refs, text, anchor)?;
            }
            if let Some(name) = client {
                refs.client_id = Some(resolve_or_halt!(resolve_ref(
                    Field::Client,
                    name,
                    match_client(&catalog.clients, name),
                )));
            }
        }
    }

    Ok(ToolPlan::Ready(ResolvedTool {
        request: request.clone(),
        refs,
    }))
}

fn expense_category(catalog: &Catalog, name: &str) -> std::result::Result<String, ToolPlan> {
    resolve_ref(
        Field::Category,
        name,
        match_category(&catalog.categories, CategoryKind::Expense, name),
    )
}

fn vendor_ref(catalog: &Catalog, name: &str) -> std::result::Result<String, ToolPlan> {
    resolve_ref(Field::Vendor, name, match_vendor(&catalog.vendors, name))
}

/// The matched id, or the plan that has to go back to the user.
fn resolve_ref<T: Named + Identified>(
    field: Field,
    search: &str,
    result: MatchResult<'_, T>,
) -> std::result::Result<String, ToolPlan> {
    match result.outcome() {
        MatchOutcome::Unambiguous => result
            .exact_match
            .map(|found| found.id().to_string())
            .ok_or_else(|| ToolPlan::OfferCreate {
                field,
                name: search.trim().to_string(),
            }),
        MatchOutcome::Ambiguous => {
            let candidates: Vec<Candidate> = result
                .similar_candidates
                .iter()
                .map(|c| Candidate {
                    id: c.id().to_string(),
                    name: c.name().to_string(),
                })
                .collect();
            debug!(field = field.label(), count = candidates.len(), "reference needs clarification");
            Err(ToolPlan::Clarify {
                field,
                question: clarify_question(field, search, &candidates),
                candidates,
            })
        }
        MatchOutcome::NotFound => {
            debug!(field = field.label(), search = search.trim(), "reference not found");
            Err(ToolPlan::OfferCreate {
                field,
                name: search.trim().to_string(),
            })
        }
    }
}

fn clarify_question(field: Field, search: &str, candidates: &[Candidate]) -> String {
    let duplicates = candidates
        .windows(2)
        .all(|pair| pair[0].name.trim().eq_ignore_ascii_case(pair[1].name.trim()));
    let options: Vec<String> = if duplicates {
        candidates
            .iter()
            .map(|c| format!("\"{}\" (id {})", c.name, c.id))
            .collect()
    } else {
        candidates.iter().map(|c| format!("\"{}\"", c.name)).collect()
    };
    format!(
        "Which {} did you mean by \"{}\"? Options: {}",
        field.label(),
        search.trim(),
        options.join(", ")
    )
}

fn apply_period(refs: &mut ResolvedRefs, text: &str, anchor: NaiveDate) -> Result<()> {
    let query = resolve_date_query(text, anchor);
    if !query.success {
        return Err(EngineError::InvalidExpression(
            query.error.unwrap_or(query.description),
        ));
    }
    refs.start_date = query.start_date;
    refs.end_date = query.end_date;
    refs.period_description = Some(query.description);
    Ok(())
}

fn single_date(text: Option<&str>, anchor: NaiveDate) -> Result<Option<NaiveDate>> {
    text.map(|t| parse_relative_date(t, anchor)).transpose()
}

fn require_amount(amount: f64) -> Result<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidRequest(format!(
            "amount must be a positive number, got {amount}"
        )))
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(EngineError::InvalidRequest("record id is empty".to_string()));
    }
    Ok(())
}
