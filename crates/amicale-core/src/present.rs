// ── Error presentation mapping ──
//
// Pure data: message keys and icon identifiers per failure class. The UI
// layer resolves keys to localized strings; nothing here depends on a
// view framework.

use amicale_api::{ApiCode, ApiRejection, RequestStatus};

/// What an error view should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDisplay {
    pub status: RequestStatus,
    pub code: Option<ApiCode>,
    /// Localization key for the main message.
    pub message_key: String,
    /// Icon identifier (Material names, matching the app's icon set).
    pub icon: String,
    /// Server-supplied detail, when present.
    pub detail: Option<String>,
    /// Whether a retry action makes sense. Always false for the
    /// critical credential case -- that one gets "log in again".
    pub show_retry: bool,
}

/// Caller-supplied replacement presentation for one domain code, letting
/// a screen special-case known conditions ("not a member yet") without
/// re-implementing the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorOverride {
    pub code: ApiCode,
    pub message_key: String,
    pub icon: String,
    pub show_retry: bool,
}

/// Generic message key and icon for a rejection. The domain code takes
/// precedence over the transport status when both are present.
pub fn describe(rejection: &ApiRejection) -> (&'static str, &'static str) {
    if let Some(code) = rejection.code {
        match code {
            ApiCode::BadCredentials => ("errors.badCredentials", "account-alert-outline"),
            ApiCode::BadToken => ("errors.badToken", "account-alert-outline"),
            ApiCode::NoConsent => ("errors.noConsent", "account-remove-outline"),
            ApiCode::BadInput => ("errors.badInput", "alert-circle-outline"),
            ApiCode::Forbidden => ("errors.forbidden", "lock"),
            ApiCode::ServerError => ("errors.serverError", "server-network-off"),
            _ => ("errors.unknown", "alert-circle-outline"),
        }
    } else {
        match rejection.status {
            RequestStatus::BadInput => ("errors.badInput", "alert-circle-outline"),
            RequestStatus::Forbidden => ("errors.forbidden", "lock"),
            RequestStatus::ConnectionError => {
                ("errors.connectionError", "access-point-network-off")
            }
            RequestStatus::ServerError => ("errors.serverError", "server-network-off"),
            _ => ("errors.unknown", "alert-circle-outline"),
        }
    }
}

/// Resolve the display for a rejection, applying caller overrides first.
pub fn display_for(rejection: &ApiRejection, overrides: &[ErrorOverride]) -> ErrorDisplay {
    if let Some(code) = rejection.code {
        if let Some(over) = overrides.iter().find(|o| o.code == code) {
            return ErrorDisplay {
                status: rejection.status,
                code: rejection.code,
                message_key: over.message_key.clone(),
                icon: over.icon.clone(),
                detail: rejection.message.clone(),
                show_retry: over.show_retry,
            };
        }
    }
    let (message_key, icon) = describe(rejection);
    ErrorDisplay {
        status: rejection.status,
        code: rejection.code,
        message_key: message_key.to_owned(),
        icon: icon.to_owned(),
        detail: rejection.message.clone(),
        show_retry: !rejection.is_critical(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejection(status: RequestStatus, code: Option<ApiCode>) -> ApiRejection {
        ApiRejection {
            status,
            code,
            message: None,
        }
    }

    #[test]
    fn code_takes_precedence_over_status() {
        let rej = rejection(RequestStatus::Success, Some(ApiCode::NoConsent));
        let (key, icon) = describe(&rej);
        assert_eq!(key, "errors.noConsent");
        assert_eq!(icon, "account-remove-outline");
    }

    #[test]
    fn connection_error_has_network_icon() {
        let rej = rejection(RequestStatus::ConnectionError, None);
        assert_eq!(describe(&rej).1, "access-point-network-off");
    }

    #[test]
    fn critical_error_suppresses_retry() {
        let rej = rejection(RequestStatus::Success, Some(ApiCode::BadToken));
        assert!(!display_for(&rej, &[]).show_retry);

        let rej = rejection(RequestStatus::ConnectionError, None);
        assert!(display_for(&rej, &[]).show_retry);
    }

    #[test]
    fn override_replaces_generic_presentation() {
        let overrides = [ErrorOverride {
            code: ApiCode::NoConsent,
            message_key: "profile.notAMember".into(),
            icon: "account-clock".into(),
            show_retry: false,
        }];
        let rej = rejection(RequestStatus::Success, Some(ApiCode::NoConsent));
        let display = display_for(&rej, &overrides);
        assert_eq!(display.message_key, "profile.notAMember");
        assert_eq!(display.icon, "account-clock");
        assert!(!display.show_retry);

        // other codes keep the generic presentation
        let rej = rejection(RequestStatus::Success, Some(ApiCode::Forbidden));
        assert_eq!(display_for(&rej, &overrides).message_key, "errors.forbidden");
    }
}
