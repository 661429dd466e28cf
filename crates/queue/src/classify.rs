use crate::intent::IntentKind;

/// Backoff base applied to MintBadge retries after a shared-object version
/// mismatch; everything else uses the configured retry delay.
const MINT_VERSION_MISMATCH_BASE_MS: u64 = 2000;

const VERSION_MISMATCH_NEEDLES: &[&str] = &[
    "is not available for consumption",
    "current version",
    "non-retriable",
];

const DUPLICATE_NEEDLES: &[&str] = &[
    "already exists",
    "already minted",
    "duplicate",
    "already locked",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Shared object referenced at a stale version; retried with backoff,
    /// never surfaced to the user.
    VersionMismatch,
    /// A badge already granted or in flight.
    Duplicate,
    /// MintBadge aborted with code 1: the sponsor is not the authorized
    /// minter on the registry.
    Authorization,
    Transient,
}

/// The single classifier every worker consults. Matches on the upstream
/// error message; the chain gateway passes those through verbatim.
pub fn classify(kind: IntentKind, message: &str) -> ErrorClass {
    let message = message.to_lowercase();

    if VERSION_MISMATCH_NEEDLES.iter().any(|n| message.contains(n)) {
        return ErrorClass::VersionMismatch;
    }
    if DUPLICATE_NEEDLES.iter().any(|n| message.contains(n)) {
        return ErrorClass::Duplicate;
    }
    if kind == IntentKind::MintNft && message.contains("moveabort") && message.contains("}, 1)") {
        return ErrorClass::Authorization;
    }
    ErrorClass::Transient
}

/// Whether the failure should reach the user as an error event.
pub fn suppressed(kind: IntentKind, class: ErrorClass) -> bool {
    match class {
        ErrorClass::VersionMismatch => true,
        ErrorClass::Duplicate => kind == IntentKind::MintNft,
        _ => false,
    }
}

/// Linear backoff: `base * attempt`, with a shorter base for MintBadge
/// version mismatches.
pub fn backoff_delay_ms(
    kind: IntentKind,
    class: ErrorClass,
    attempt: u32,
    configured_base_ms: u64,
) -> u64 {
    let base = if class == ErrorClass::VersionMismatch && kind == IntentKind::MintNft {
        MINT_VERSION_MISMATCH_BASE_MS
    } else {
        configured_base_ms
    };
    base * u64::from(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_mismatch_needles() {
        for message in [
            "Object 0x1 is not available for consumption, current version 5",
            "shared object at current version 9",
            "execution marked non-retriable",
        ] {
            assert_eq!(
                classify(IntentKind::MakeMove, message),
                ErrorClass::VersionMismatch
            );
        }
    }

    #[test]
    fn duplicate_needles() {
        assert_eq!(
            classify(IntentKind::MintNft, "badge already minted for player"),
            ErrorClass::Duplicate
        );
        assert_eq!(
            classify(IntentKind::MintNft, "row already locked"),
            ErrorClass::Duplicate
        );
    }

    #[test]
    fn mint_abort_code_one_is_authorization() {
        let message = "MoveAbort(MoveLocation { module: badge, function: 2 }, 1) in command 0";
        assert_eq!(
            classify(IntentKind::MintNft, message),
            ErrorClass::Authorization
        );
        // Same abort on a game call is just a transient chain error.
        assert_eq!(
            classify(IntentKind::MakeMove, message),
            ErrorClass::Transient
        );
    }

    #[test]
    fn suppression_policy() {
        assert!(suppressed(IntentKind::MakeMove, ErrorClass::VersionMismatch));
        assert!(suppressed(IntentKind::MintNft, ErrorClass::Duplicate));
        assert!(!suppressed(IntentKind::MakeMove, ErrorClass::Duplicate));
        assert!(!suppressed(IntentKind::MintNft, ErrorClass::Transient));
    }

    #[test]
    fn backoff_is_linear_with_kind_sensitive_base() {
        assert_eq!(
            backoff_delay_ms(IntentKind::MakeMove, ErrorClass::Transient, 1, 5000),
            5000
        );
        assert_eq!(
            backoff_delay_ms(IntentKind::MakeMove, ErrorClass::Transient, 2, 5000),
            10000
        );
        assert_eq!(
            backoff_delay_ms(IntentKind::MintNft, ErrorClass::VersionMismatch, 2, 5000),
            4000
        );
        assert_eq!(
            backoff_delay_ms(IntentKind::MakeMove, ErrorClass::VersionMismatch, 2, 5000),
            10000
        );
    }
}
