//! Domain models for the storefront.
//!
//! These types represent validated records separate from the JSON documents
//! the store persists. Conversion happens in the repositories.

pub mod category;
pub mod product;
pub mod session;
pub mod user;

use chrono::NaiveDate;

pub use category::{Category, CategoryPatch, NewCategory};
pub use product::{NewProduct, Product, ProductPatch};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User, UserPatch};

/// Addition date label stored on products (`dd-MM-yyyy`).
#[must_use]
pub fn product_date_label(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Registration date label stored on users (`dd/MM/yyyy`).
#[must_use]
pub fn user_date_label(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Today's date in the server's local time zone.
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_date_labels_use_distinct_separators() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(product_date_label(date), "07-03-2024");
        assert_eq!(user_date_label(date), "07/03/2024");
    }
}
