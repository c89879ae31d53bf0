//! Shared helpers for Diesel repository implementations.

use diesel::result::Error as DieselError;
use tracing::debug;

use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub(super) fn pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Emit debug context for a failed Diesel operation.
pub(super) fn log_diesel_error(error: &DieselError, operation: &str) {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = ?info.constraint_name(),
                %operation,
                "diesel operation failed",
            );
        }
        other => debug!(error = %other, %operation, "diesel operation failed"),
    }
}

/// The column a unique-constraint violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum UniqueViolationTarget {
    Username,
    Email,
    Other,
}

/// Classify a unique violation by inspecting the constraint (or index)
/// name, falling back to the error message when PostgreSQL omits it.
pub(super) fn classify_unique_violation(
    message: &str,
    constraint_name: Option<&str>,
) -> UniqueViolationTarget {
    let haystack = constraint_name.map_or_else(|| message.to_lowercase(), str::to_lowercase);
    if haystack.contains("username") {
        UniqueViolationTarget::Username
    } else if haystack.contains("email") {
        UniqueViolationTarget::Email
    } else {
        UniqueViolationTarget::Other
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("identities_username_lower_idx"), UniqueViolationTarget::Username)]
    #[case(Some("identities_email_key"), UniqueViolationTarget::Email)]
    #[case(Some("some_other_key"), UniqueViolationTarget::Other)]
    fn classifies_by_constraint_name(
        #[case] constraint: Option<&str>,
        #[case] expected: UniqueViolationTarget,
    ) {
        assert_eq!(classify_unique_violation("duplicate key", constraint), expected);
    }

    #[rstest]
    #[case(
        "duplicate key value violates unique constraint \"identities_username_lower_idx\"",
        UniqueViolationTarget::Username
    )]
    #[case(
        "duplicate key value violates unique constraint \"identities_email_key\"",
        UniqueViolationTarget::Email
    )]
    #[case("duplicate key value", UniqueViolationTarget::Other)]
    fn falls_back_to_the_message(#[case] message: &str, #[case] expected: UniqueViolationTarget) {
        assert_eq!(classify_unique_violation(message, None), expected);
    }
}
