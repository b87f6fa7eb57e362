//! Customer data as seen by the conversation.
//!
//! Collekto (and the mock dataset) return loosely-typed business data. It is
//! kept as a [`CustomerRecord`], an ordered JSON object, so unknown fields
//! survive the round trip to `GET /calls/{id}`. The handful of fields the
//! conversation actually needs are resolved into a [`CustomerProfile`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Column holding the customer's full name.
pub const DEBTOR_NAME: &str = "Debtor_Name";
/// Column holding the customer's gender ("Male" / "Female").
pub const GENDER: &str = "Gender";
/// Column holding the monthly instalment amount.
pub const EMI_AMOUNT: &str = "EMI_Amount";
/// Column holding the instalment due date.
pub const PAYMENT_DUE_DATE: &str = "Payment_Due_Date";
/// Column holding the loan product code.
pub const PRODUCT: &str = "Product";
/// Column holding the days-past-due counter.
pub const DPD: &str = "DPD";
/// Column holding the loan number.
pub const LOAN_ID: &str = "Loan_ID";
/// Column holding the Collekto system identifier.
pub const SYSTEM_ID: &str = "system_id";

/// Business data for one customer, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerRecord(BTreeMap<String, Value>);

impl CustomerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from string cells, inferring JSON types.
    ///
    /// Empty cells and `NaN` become `null`, integers and floats become
    /// numbers, everything else is kept as a trimmed string.
    pub fn from_flat_strings<I, K, V>(columns: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        Self(
            columns
                .into_iter()
                .map(|(k, v)| (k.into(), parse_cell(v.as_ref())))
                .collect(),
        )
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copies every field of a JSON object into the record, overwriting
    /// existing keys.
    pub fn extend_object(&mut self, object: &Map<String, Value>) {
        for (k, v) in object {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn debtor_name(&self) -> Option<&str> {
        self.str_field(DEBTOR_NAME)
    }

    pub fn gender(&self) -> Option<&str> {
        self.str_field(GENDER)
    }

    pub fn due_date(&self) -> Option<&str> {
        self.str_field(PAYMENT_DUE_DATE)
    }

    pub fn product(&self) -> Option<&str> {
        self.str_field(PRODUCT)
    }

    pub fn emi_amount(&self) -> Option<f64> {
        self.number_field(EMI_AMOUNT)
    }

    /// Days past due. Only whole numbers of days count; anything else is
    /// treated as unreported.
    pub fn dpd(&self) -> Option<i64> {
        self.number_field(DPD)
            .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
            .map(|v| v as i64)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    fn number_field(&self, key: &str) -> Option<f64> {
        let value = match self.0.get(key)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl FromIterator<(String, Value)> for CustomerRecord {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(trimmed.to_string())
}

/// Values supplied by the caller of `POST /start-call`, used when the
/// customer record lacks a field.
#[derive(Debug, Clone, Copy)]
pub struct ProfileFallback<'a> {
    pub name: &'a str,
    pub due_amount: f64,
    pub due_date: &'a str,
    pub product: &'a str,
}

/// The customer facts the conversation is built around.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerProfile {
    pub name: String,
    pub gender: Option<String>,
    pub emi_amount: f64,
    pub due_date: String,
    pub product: String,
    /// Days past due, when the backend reported it.
    pub dpd: Option<i64>,
}

impl CustomerProfile {
    /// Resolves a profile, preferring backend data over request data.
    pub fn resolve(fallback: ProfileFallback<'_>, record: &CustomerRecord) -> Self {
        Self {
            name: record.debtor_name().unwrap_or(fallback.name).to_string(),
            gender: record.gender().map(str::to_string),
            emi_amount: record.emi_amount().unwrap_or(fallback.due_amount),
            due_date: record.due_date().unwrap_or(fallback.due_date).to_string(),
            product: record.product().unwrap_or(fallback.product).to_string(),
            dpd: record.dpd(),
        }
    }

    /// Honorific used when addressing the customer.
    pub fn salutation(&self) -> &'static str {
        match &self.gender {
            Some(g) if g.trim().eq_ignore_ascii_case("male") => "Mr.",
            _ => "Ms.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fallback() -> ProfileFallback<'static> {
        ProfileFallback {
            name: "Harish",
            due_amount: 5175.0,
            due_date: "2025-06-03",
            product: "CL",
        }
    }

    #[test]
    fn flat_strings_infer_types_and_null_out_blanks() {
        let record = CustomerRecord::from_flat_strings([
            ("Debtor_Name", " Asha Rao "),
            ("EMI_Amount", "3500.50"),
            ("DPD", "4"),
            ("Remarks", "NaN"),
            ("Branch", ""),
        ]);

        assert_eq!(record.get("Debtor_Name"), Some(&json!("Asha Rao")));
        assert_eq!(record.get("EMI_Amount"), Some(&json!(3500.5)));
        assert_eq!(record.get("DPD"), Some(&json!(4)));
        assert_eq!(record.get("Remarks"), Some(&Value::Null));
        assert_eq!(record.get("Branch"), Some(&Value::Null));
    }

    #[test]
    fn numeric_accessors_accept_numeric_strings() {
        let mut record = CustomerRecord::new();
        record.insert(EMI_AMOUNT, json!("12,400"));
        record.insert(DPD, json!("0"));

        assert_eq!(record.emi_amount(), Some(12400.0));
        assert_eq!(record.dpd(), Some(0));
    }

    #[test]
    fn fractional_dpd_is_unreported() {
        let mut record = CustomerRecord::new();
        record.insert(DPD, json!(0.9));
        assert_eq!(record.dpd(), None);

        record.insert(DPD, json!("2.5"));
        assert_eq!(record.dpd(), None);

        record.insert(DPD, json!(3.0));
        assert_eq!(record.dpd(), Some(3));

        record.insert(DPD, json!(1e300));
        assert_eq!(record.dpd(), None);
    }

    #[test]
    fn resolve_prefers_record_fields() {
        let mut record = CustomerRecord::new();
        record.insert(DEBTOR_NAME, json!("Asha Rao"));
        record.insert(GENDER, json!("Female"));
        record.insert(EMI_AMOUNT, json!(3500));

        let profile = CustomerProfile::resolve(fallback(), &record);
        assert_eq!(profile.name, "Asha Rao");
        assert_eq!(profile.emi_amount, 3500.0);
        assert_eq!(profile.due_date, "2025-06-03");
        assert_eq!(profile.product, "CL");
        assert_eq!(profile.dpd, None);
    }

    #[test]
    fn resolve_falls_back_to_request_for_empty_record() {
        let profile = CustomerProfile::resolve(fallback(), &CustomerRecord::new());
        assert_eq!(profile.name, "Harish");
        assert_eq!(profile.emi_amount, 5175.0);
        assert_eq!(profile.gender, None);
    }

    #[test]
    fn salutation_depends_on_gender() {
        let mut record = CustomerRecord::new();
        record.insert(GENDER, json!("MALE"));
        let male = CustomerProfile::resolve(fallback(), &record);
        assert_eq!(male.salutation(), "Mr.");

        let unknown = CustomerProfile::resolve(fallback(), &CustomerRecord::new());
        assert_eq!(unknown.salutation(), "Ms.");
    }
}
