//! Name-based entity resolution with explicit ambiguity.
//!
//! Given a user-supplied name and a list of same-typed candidates, decide
//! whether the name identifies exactly one record, several, or none. The
//! matcher never picks for the caller: duplicates and fuzzy hits come back
//! as `similar_candidates` for the assistant to turn into a question.
//!
//! Matching is two-pass:
//!
//! 1. **Exact**: case-insensitive equality of trimmed names. One hit is an
//!    exact match. Several hits are duplicates and are returned as
//!    candidates without running the fuzzy pass.
//! 2. **Fuzzy** (only with zero exact hits): either name contains the other,
//!    or either is a prefix of the other.

use serde::Serialize;
use tracing::debug;

use crate::entities::{Category, CategoryKind, Client, Named, TaxRate, Vendor};

/// How a lookup resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Exactly one exact match.
    Unambiguous,
    /// No single exact match, but candidates to choose from.
    Ambiguous,
    /// Nothing matched; the caller may offer to create the entity.
    NotFound,
}

/// The result of matching a name against candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct MatchResult<'a, T> {
    pub exact_match: Option<&'a T>,
    pub similar_candidates: Vec<&'a T>,
}

impl<'a, T> MatchResult<'a, T> {
    fn not_found() -> Self {
        Self {
            exact_match: None,
            similar_candidates: Vec::new(),
        }
    }

    pub fn outcome(&self) -> MatchOutcome {
        match (self.exact_match, self.similar_candidates.is_empty()) {
            (Some(_), _) => MatchOutcome::Unambiguous,
            (None, false) => MatchOutcome::Ambiguous,
            (None, true) => MatchOutcome::NotFound,
        }
    }
}

/// Match `search` against a slice of candidates.
///
/// # Examples
///
/// ```
/// use ledger_engine::entities::Vendor;
/// use ledger_engine::entity_match::{match_entity_by_name, MatchOutcome};
///
/// let vendors = vec![
///     Vendor { id: "v1".into(), account_id: "a".into(), name: "Office".into() },
///     Vendor { id: "v2".into(), account_id: "a".into(), name: "Office Supplies".into() },
/// ];
/// let result = match_entity_by_name(&vendors, "office");
/// assert_eq!(result.outcome(), MatchOutcome::Unambiguous);
/// assert_eq!(result.exact_match.unwrap().id, "v1");
/// assert!(result.similar_candidates.is_empty());
/// ```
pub fn match_entity_by_name<'a, T: Named>(candidates: &'a [T], search: &str) -> MatchResult<'a, T> {
    match_entities(candidates.iter(), search)
}

/// Match `search` against any iterator of borrowed candidates.
///
/// Candidate order is preserved in `similar_candidates`.
pub fn match_entities<'a, T, I>(candidates: I, search: &str) -> MatchResult<'a, T>
where
    T: Named + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let needle = fold(search);
    if needle.is_empty() {
        return MatchResult::not_found();
    }

    let candidates: Vec<&'a T> = candidates.into_iter().collect();
    let exact: Vec<&'a T> = candidates
        .iter()
        .copied()
        .filter(|c| fold(c.name()) == needle)
        .collect();

    match exact.len() {
        1 => {
            debug!(search = %needle, "exact entity match");
            MatchResult {
                exact_match: exact.first().copied(),
                similar_candidates: Vec::new(),
            }
        }
        0 => {
            let similar: Vec<&'a T> = candidates
                .into_iter()
                .filter(|c| is_similar(&fold(c.name()), &needle))
                .collect();
            debug!(search = %needle, candidates = similar.len(), "fuzzy entity match");
            MatchResult {
                exact_match: None,
                similar_candidates: similar,
            }
        }
        n => {
            debug!(search = %needle, duplicates = n, "duplicate exact names");
            MatchResult {
                exact_match: None,
                similar_candidates: exact,
            }
        }
    }
}

/// Match a category name among categories of one kind only.
pub fn match_category<'a>(
    categories: &'a [Category],
    kind: CategoryKind,
    search: &str,
) -> MatchResult<'a, Category> {
    match_entities(categories.iter().filter(|c| c.kind == kind), search)
}

pub fn match_vendor<'a>(vendors: &'a [Vendor], search: &str) -> MatchResult<'a, Vendor> {
    match_entity_by_name(vendors, search)
}

pub fn match_client<'a>(clients: &'a [Client], search: &str) -> MatchResult<'a, Client> {
    match_entity_by_name(clients, search)
}

/// Match a tax rate by percentage ("10", "10%", "7.5 %") or by name.
///
/// A percentage that equals one or more rates takes the exact pass, with the
/// same duplicate rule as names. Otherwise the search falls back to name
/// matching, so "VAT 10%" still finds a rate named that way.
pub fn match_tax_rate<'a>(rates: &'a [TaxRate], search: &str) -> MatchResult<'a, TaxRate> {
    if let Some(percent) = parse_percentage(search) {
        let by_rate: Vec<&'a TaxRate> = rates
            .iter()
            .filter(|r| (r.rate - percent).abs() < 1e-9)
            .collect();
        match by_rate.len() {
            0 => {}
            1 => {
                return MatchResult {
                    exact_match: by_rate.first().copied(),
                    similar_candidates: Vec::new(),
                }
            }
            _ => {
                return MatchResult {
                    exact_match: None,
                    similar_candidates: by_rate,
                }
            }
        }
    }
    match_entity_by_name(rates, search)
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Either string contains the other, or either is a prefix of the other.
fn is_similar(name: &str, needle: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    name.contains(needle)
        || needle.contains(name)
        || name.starts_with(needle)
        || needle.starts_with(name)
}

fn parse_percentage(s: &str) -> Option<f64> {
    let s = s.trim();
    let s = s.strip_suffix('%').unwrap_or(s).trim_end();
    let value: f64 = s.parse().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor(id: &str, name: &str) -> Vendor {
        Vendor {
            id: id.into(),
            account_id: "acct".into(),
            name: name.into(),
        }
    }

    fn category(id: &str, name: &str, kind: CategoryKind) -> Category {
        Category {
            id: id.into(),
            account_id: "acct".into(),
            name: name.into(),
            kind,
        }
    }

    fn tax(id: &str, name: &str, rate: f64) -> TaxRate {
        TaxRate {
            id: id.into(),
            account_id: "acct".into(),
            name: name.into(),
            rate,
        }
    }

    fn ids<T>(items: &[&T], id: impl Fn(&T) -> &str) -> Vec<String> {
        items.iter().map(|i| id(*i).to_string()).collect()
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let vendors = vec![vendor("v1", "Office Supplies")];
        let result = match_entity_by_name(&vendors, "office supplies");
        assert_eq!(result.exact_match.map(|v| v.id.as_str()), Some("v1"));
        assert!(result.similar_candidates.is_empty());
        assert_eq!(result.outcome(), MatchOutcome::Unambiguous);
    }

    #[test]
    fn test_exact_match_trims_whitespace() {
        let vendors = vec![vendor("v1", " Acme ")];
        let result = match_entity_by_name(&vendors, "  ACME");
        assert_eq!(result.outcome(), MatchOutcome::Unambiguous);
    }

    #[test]
    fn test_exact_beats_substring() {
        let vendors = vec![vendor("v1", "Office"), vendor("v2", "Office Supplies")];
        let result = match_entity_by_name(&vendors, "office");
        assert_eq!(result.exact_match.map(|v| v.id.as_str()), Some("v1"));
        assert!(result.similar_candidates.is_empty());
    }

    #[test]
    fn test_duplicate_names_are_ambiguous() {
        let vendors = vec![
            vendor("v1", "Acme"),
            vendor("v2", "ACME"),
            vendor("v3", "Acme Holdings"),
        ];
        let result = match_entity_by_name(&vendors, "acme");
        assert!(result.exact_match.is_none());
        // Only the duplicates; the fuzzy pass does not run
        assert_eq!(ids(&result.similar_candidates, |v| v.id.as_str()), vec!["v1", "v2"]);
        assert_eq!(result.outcome(), MatchOutcome::Ambiguous);
    }

    #[test]
    fn test_prefix_is_similar() {
        let vendors = vec![vendor("v1", "Consulting Fees")];
        let result = match_entity_by_name(&vendors, "consult");
        assert!(result.exact_match.is_none());
        assert_eq!(ids(&result.similar_candidates, |v| v.id.as_str()), vec!["v1"]);
    }

    #[test]
    fn test_long_query_contains_short_name() {
        let vendors = vec![vendor("v1", "Uber"), vendor("v2", "Lyft")];
        let result = match_entity_by_name(&vendors, "uber rides to airport");
        assert_eq!(ids(&result.similar_candidates, |v| v.id.as_str()), vec!["v1"]);
    }

    #[test]
    fn test_multiple_fuzzy_candidates_keep_order() {
        let vendors = vec![
            vendor("v1", "Travel - Flights"),
            vendor("v2", "Meals"),
            vendor("v3", "Travel - Hotels"),
        ];
        let result = match_entity_by_name(&vendors, "travel");
        assert_eq!(ids(&result.similar_candidates, |v| v.id.as_str()), vec!["v1", "v3"]);
    }

    #[test]
    fn test_no_match() {
        let vendors = vec![vendor("v1", "Acme")];
        let result = match_entity_by_name(&vendors, "Globex");
        assert_eq!(result.outcome(), MatchOutcome::NotFound);
    }

    #[test]
    fn test_empty_search_matches_nothing() {
        let vendors = vec![vendor("v1", "Acme")];
        let result = match_entity_by_name(&vendors, "   ");
        assert_eq!(result.outcome(), MatchOutcome::NotFound);
    }

    #[test]
    fn test_empty_candidate_name_is_never_similar() {
        let vendors = vec![vendor("v1", "")];
        let result = match_entity_by_name(&vendors, "acme");
        assert_eq!(result.outcome(), MatchOutcome::NotFound);
    }

    #[test]
    fn test_category_never_matches_other_kind() {
        let categories = vec![
            category("c1", "Consulting", CategoryKind::Income),
            category("c2", "Consulting Costs", CategoryKind::Expense),
        ];
        let result = match_category(&categories, CategoryKind::Expense, "consulting");
        assert!(result.exact_match.is_none());
        assert_eq!(ids(&result.similar_candidates, |c| c.id.as_str()), vec!["c2"]);

        let result = match_category(&categories, CategoryKind::Income, "consulting");
        assert_eq!(result.exact_match.map(|c| c.id.as_str()), Some("c1"));
    }

    #[test]
    fn test_tax_rate_by_percentage() {
        let rates = vec![tax("t1", "Reduced", 5.0), tax("t2", "Standard", 10.0)];
        let result = match_tax_rate(&rates, "10%");
        assert_eq!(result.exact_match.map(|t| t.id.as_str()), Some("t2"));

        let result = match_tax_rate(&rates, "5");
        assert_eq!(result.exact_match.map(|t| t.id.as_str()), Some("t1"));
    }

    #[test]
    fn test_tax_rate_duplicate_percentages_are_ambiguous() {
        let rates = vec![tax("t1", "GST", 7.5), tax("t2", "Service tax", 7.5)];
        let result = match_tax_rate(&rates, "7.5 %");
        assert!(result.exact_match.is_none());
        assert_eq!(result.similar_candidates.len(), 2);
    }

    #[test]
    fn test_tax_rate_falls_back_to_name() {
        let rates = vec![tax("t1", "VAT 20%", 20.0), tax("t2", "Zero rated", 0.0)];
        let result = match_tax_rate(&rates, "vat");
        assert_eq!(ids(&result.similar_candidates, |t| t.id.as_str()), vec!["t1"]);

        // Unknown percentage and no name contains it
        let result = match_tax_rate(&rates, "12%");
        assert_eq!(result.outcome(), MatchOutcome::NotFound);
    }

    #[test]
    fn test_match_result_serializes() {
        let vendors = vec![vendor("v1", "Acme")];
        let result = match_entity_by_name(&vendors, "acme");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["exact_match"]["id"], "v1");
        assert_eq!(json["similar_candidates"], serde_json::json!([]));
    }
}
