//! Tools the model may call during a conversation.
//!
//! Tool results are computed from the customer's own data. Arguments the
//! model supplies are logged but never trusted for the outcome.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use voicebot_types::CustomerProfile;

pub const CHECK_PAYMENT_STATUS: &str = "check_payment_status";

pub const PAYMENT_COMPLETED: &str = "payment completed";
pub const PAYMENT_NOT_COMPLETED: &str = "payment not completed";
pub const PAYMENT_STATUS_UNKNOWN: &str = "payment status unknown";
pub const UNKNOWN_TOOL: &str = "Unknown tool";

/// A function tool as declared in the session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        kind: "function".to_string(),
        name: CHECK_PAYMENT_STATUS.to_string(),
        description: "Checks whether the customer's latest EMI payment has been received, \
                      based on days past due."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "DPD": {
                    "type": "integer",
                    "description": "Days past due for the customer's loan"
                }
            },
            "required": ["DPD"]
        }),
    }]
}

/// `0` days past due means the last instalment was paid.
pub fn check_payment_status(dpd: Option<i64>) -> &'static str {
    match dpd {
        Some(0) => PAYMENT_COMPLETED,
        Some(_) => PAYMENT_NOT_COMPLETED,
        None => PAYMENT_STATUS_UNKNOWN,
    }
}

/// Runs the named tool for `profile` and returns the JSON-encoded output
/// string expected by `function_call_output`.
pub fn dispatch(name: &str, arguments: &str, profile: &CustomerProfile) -> String {
    let result = match name {
        CHECK_PAYMENT_STATUS => {
            tracing::debug!(arguments, dpd = ?profile.dpd, "check_payment_status called");
            check_payment_status(profile.dpd)
        }
        other => {
            tracing::warn!(tool = other, "model called an unknown tool");
            UNKNOWN_TOOL
        }
    };
    Value::String(result.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(dpd: Option<i64>) -> CustomerProfile {
        CustomerProfile {
            name: "Asha Rao".into(),
            gender: Some("Female".into()),
            emi_amount: 3500.5,
            due_date: "2025-06-03".into(),
            product: "TW".into(),
            dpd,
        }
    }

    #[test]
    fn payment_status_by_dpd() {
        assert_eq!(check_payment_status(Some(0)), "payment completed");
        assert_eq!(check_payment_status(Some(2)), "payment not completed");
        assert_eq!(check_payment_status(None), "payment status unknown");
    }

    #[test]
    fn dispatch_uses_customer_dpd_not_arguments() {
        let output = dispatch(CHECK_PAYMENT_STATUS, r#"{"DPD":0}"#, &profile(Some(17)));
        assert_eq!(output, "\"payment not completed\"");
    }

    #[test]
    fn fractional_dpd_in_customer_data_is_unknown() {
        let mut record = voicebot_types::CustomerRecord::new();
        record.insert(voicebot_types::customer::DPD, json!(0.9));
        let resolved = CustomerProfile::resolve(
            voicebot_types::ProfileFallback {
                name: "Asha",
                due_amount: 3500.5,
                due_date: "2025-06-03",
                product: "TW",
            },
            &record,
        );
        assert_eq!(
            dispatch(CHECK_PAYMENT_STATUS, "{}", &resolved),
            "\"payment status unknown\""
        );
    }

    #[test]
    fn dispatch_unknown_tool() {
        assert_eq!(dispatch("transfer_funds", "{}", &profile(Some(0))), "\"Unknown tool\"");
    }

    #[test]
    fn definitions_declare_dpd_parameter() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].kind, "function");
        assert_eq!(defs[0].parameters["required"][0], "DPD");
    }
}
