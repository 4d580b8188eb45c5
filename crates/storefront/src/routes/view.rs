//! Shared page chrome and flash messages.
//!
//! Every full-page template carries a [`Layout`] (signed-in user and footer
//! links) and a [`Flash`] resolved from `?success=` / `?error=` codes set by
//! the form handler that redirected here.

use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::db::RepositoryError;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Footer link to a content page.
#[derive(Debug, Clone)]
pub struct NavLink {
    pub slug: String,
    pub title: String,
}

/// Data the base template needs on every page.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub user: Option<CurrentUser>,
    pub nav: Vec<NavLink>,
}

impl Layout {
    #[must_use]
    pub fn new(state: &AppState, user: Option<CurrentUser>) -> Self {
        let nav = state
            .content()
            .nav_pages()
            .into_iter()
            .map(|page| NavLink {
                slug: page.slug.clone(),
                title: page.meta.title.clone(),
            })
            .collect();
        Self { user, nav }
    }

    /// Whether the admin link should be shown.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

/// Raw flash codes from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Flash messages ready for display.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    pub success: Option<&'static str>,
    pub error: Option<&'static str>,
}

impl From<FlashQuery> for Flash {
    fn from(query: FlashQuery) -> Self {
        Self {
            success: query.success.as_deref().map(success_message),
            error: query.error.as_deref().map(error_message),
        }
    }
}

fn success_message(code: &str) -> &'static str {
    match code {
        "product_created" => "Product created.",
        "product_updated" => "Product updated.",
        "product_deleted" => "Product deleted.",
        "category_created" => "Category created.",
        "category_updated" => "Category updated.",
        "category_deleted" => "Category deleted.",
        "user_created" => "User created.",
        "user_updated" => "User updated.",
        "user_deleted" => "User deleted.",
        "registered" => "Welcome! Your account is ready.",
        "logged_out" => "You have been signed out.",
        _ => "Done.",
    }
}

fn error_message(code: &str) -> &'static str {
    match code {
        "invalid_credentials" => "Invalid email or password.",
        "invalid_email" => "Please enter a valid email address.",
        "email_taken" => "An account with this email already exists.",
        "missing_name" => "Name is required.",
        "weak_password" => "Password must be at least 8 characters.",
        "password_mismatch" => "Passwords do not match.",
        "invalid_price" => "Price must be a non-negative number.",
        "invalid_stock" => "Stock must be a whole number of units.",
        "invalid_category" => "Choose a category.",
        "duplicate_id" => "Another record took this id at the same time. Please try again.",
        "not_found" => "That record no longer exists.",
        "self_delete" => "You cannot delete your own account.",
        "oauth_denied" => "Sign-in was cancelled.",
        "oauth_state" => "Sign-in expired. Please try again.",
        "oauth_failed" => "Could not sign in with that provider.",
        "session" => "Your session could not be saved. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Flash code for a failed repository write.
#[must_use]
pub fn repository_error_code(err: &RepositoryError) -> &'static str {
    match err {
        RepositoryError::EmailTaken => "email_taken",
        RepositoryError::Conflict(_) => "duplicate_id",
        RepositoryError::NotFound => "not_found",
        _ => "server",
    }
}

/// Redirect to `path` carrying a flash code.
#[must_use]
pub fn redirect_with(path: &str, kind: FlashKind, code: &str) -> Response {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{path}{separator}{}={code}", kind.param())).into_response()
}

/// Which flash slot a redirect fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    const fn param(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header::LOCATION};

    use super::*;

    #[test]
    fn test_known_and_unknown_codes() {
        let flash = Flash::from(FlashQuery {
            success: Some("product_created".to_owned()),
            error: Some("<script>".to_owned()),
        });
        assert_eq!(flash.success, Some("Product created."));
        assert_eq!(flash.error, Some("Something went wrong. Please try again."));
    }

    #[test]
    fn test_repository_error_codes() {
        assert_eq!(
            repository_error_code(&RepositoryError::EmailTaken),
            "email_taken"
        );
        assert_eq!(
            repository_error_code(&RepositoryError::Conflict("productos already has a document with id 3".to_owned())),
            "duplicate_id"
        );
        // Conflict text never decides the code.
        assert_eq!(
            repository_error_code(&RepositoryError::Conflict("usuarios already has a document with id \"email\"".to_owned())),
            "duplicate_id"
        );
        assert_eq!(repository_error_code(&RepositoryError::NotFound), "not_found");
    }

    #[test]
    fn test_redirect_appends_code() {
        let response = redirect_with("/admin/products?q=mesa", FlashKind::Error, "not_found");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/admin/products?q=mesa&error=not_found")
        );
    }
}
