//! Account-scoped lookup records: categories, vendors, clients, tax rates.
//!
//! These are the candidate lists the assistant's tools fetch before asking
//! [`crate::entity_match`] to classify a user-supplied name.

use serde::{Deserialize, Serialize};

/// Anything the matcher can compare by display name.
pub trait Named {
    fn name(&self) -> &str;
}

impl<T: Named + ?Sized> Named for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A record with a stable identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

/// A record owned by a single account.
pub trait Owned {
    fn account_id(&self) -> &str;
}

/// Keep only the records belonging to `account_id`.
pub fn scoped_to<'a, T: Owned>(items: &'a [T], account_id: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| item.account_id() == account_id)
        .collect()
}

/// Whether a category books money in or out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub kind: CategoryKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: String,
    pub account_id: String,
    pub name: String,
}

/// A customer that invoices are addressed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub account_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A named tax rate; `rate` is a percentage (`10.0` means 10 %).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub rate: f64,
}

macro_rules! impl_record {
    ($($ty:ty),+) => {
        $(
            impl Named for $ty {
                fn name(&self) -> &str {
                    &self.name
                }
            }

            impl Identified for $ty {
                fn id(&self) -> &str {
                    &self.id
                }
            }

            impl Owned for $ty {
                fn account_id(&self) -> &str {
                    &self.account_id
                }
            }
        )+
    };
}

impl_record!(Category, Vendor, Client, TaxRate);
