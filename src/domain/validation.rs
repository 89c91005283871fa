//! Field-format and cross-field validation.
//!
//! All checks here run before persistence and report violations as
//! field-level errors. Database constraints back up uniqueness, but the
//! consistency rules (hex colors, semver strings, gas price exclusivity)
//! are enforced in code so every violated field of a write can be reported
//! in one pass.

use std::fmt;

use serde::Serialize;

use super::types::GasPriceRecord;

const INVALID_HEX_COLOR: &str = "Invalid hex color";
const INVALID_SEM_VER: &str = "Invalid version (semver)";
const GAS_PRICE_EXCLUSIVITY: &str =
    "An oracle uri or fixed gas price should be provided (but not both)";
const ORACLE_PARAMETER_REQUIRED: &str = "The oracle parameter should be set";

/// True iff `value` is a `#RRGGBB` color: a `#` followed by exactly six hex
/// digits.
pub fn validate_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

/// True iff `value` satisfies the full SemVer 2.0 grammar: numeric core
/// triplet, optional pre-release identifiers, optional build metadata.
/// Leading zeros in numeric identifiers are rejected (`"1.02.0"` fails).
pub fn validate_semver(value: &str) -> bool {
    semver::Version::parse(value).is_ok()
}

/// Enforces the gas price source invariants:
/// exactly one of `{oracle_uri, fixed_wei_value}` must be set, and a set
/// oracle uri requires an oracle parameter. Violations of the exclusivity
/// rule are reported on both fields together.
pub fn validate_gas_price(record: &GasPriceRecord) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    if record.fixed_wei_value.is_some() == record.oracle_uri.is_some() {
        errors.push("oracle_uri", GAS_PRICE_EXCLUSIVITY);
        errors.push("fixed_wei_value", GAS_PRICE_EXCLUSIVITY);
    }
    if record.oracle_uri.is_some() && record.oracle_parameter.is_none() {
        errors.push("oracle_parameter", ORACLE_PARAMETER_REQUIRED);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// `validator`-compatible wrapper around [`validate_hex_color`] for use in
/// `#[validate(custom(...))]` attributes.
pub fn hex_color(value: &str) -> Result<(), validator::ValidationError> {
    if validate_hex_color(value) {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new("invalid");
        error.message = Some(INVALID_HEX_COLOR.into());
        Err(error)
    }
}

/// `validator`-compatible wrapper around [`validate_semver`].
pub fn sem_ver(value: &str) -> Result<(), validator::ValidationError> {
    if validate_semver(value) {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new("invalid");
        error.message = Some(INVALID_SEM_VER.into());
        Err(error)
    }
}

/// One failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All field errors of a single rejected write, in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut collected = Vec::new();
        collect_validator_errors("", &errors, &mut collected);
        // validator hands back a HashMap; sort for a stable report order
        collected.sort_by(|a, b| a.field.cmp(&b.field));
        FieldErrors(collected)
    }
}

fn collect_validator_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<FieldError>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.push(FieldError {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_validator_errors(&path, nested, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validator_errors(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::U256;
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::types::GasPriceRecord;

    #[test]
    fn test_hex_color_accepts_six_hex_digits() {
        assert!(validate_hex_color("#000000"));
        assert!(validate_hex_color("#ffffff"));
        assert!(validate_hex_color("#AbC123"));
    }

    #[test]
    fn test_hex_color_rejects_bad_shapes() {
        assert!(!validate_hex_color(""));
        assert!(!validate_hex_color("000000"));
        assert!(!validate_hex_color("#00000"));
        assert!(!validate_hex_color("#0000000"));
        assert!(!validate_hex_color("#00gg00"));
        assert!(!validate_hex_color("#00 000"));
        // multi-byte characters must not satisfy the digit count
        assert!(!validate_hex_color("#äää"));
    }

    #[test]
    fn test_semver_accepts_official_grammar() {
        assert!(validate_semver("0.0.1"));
        assert!(validate_semver("1.2.3"));
        assert!(validate_semver("1.0.0-alpha"));
        assert!(validate_semver("1.0.0-alpha.1"));
        assert!(validate_semver("1.0.0-0.3.7"));
        assert!(validate_semver("1.0.0+20130313144700"));
        assert!(validate_semver("1.0.0-beta+exp.sha.5114f85"));
    }

    #[test]
    fn test_semver_rejects_leading_zeros_and_partials() {
        assert!(!validate_semver("1.02.0"));
        assert!(!validate_semver("01.0.0"));
        assert!(!validate_semver("1.0.0-01"));
        assert!(!validate_semver("1.0"));
        assert!(!validate_semver("v1.0.0"));
        assert!(!validate_semver(""));
    }

    #[test]
    fn test_gas_price_oracle_only_passes() {
        let record = GasPriceRecord::oracle(1, "https://oracle.example", "fast");
        assert!(validate_gas_price(&record).is_ok());
    }

    #[test]
    fn test_gas_price_fixed_only_passes() {
        let record = GasPriceRecord::fixed(1, U256::from(1_000_000_000u64));
        assert!(validate_gas_price(&record).is_ok());
    }

    #[test]
    fn test_gas_price_both_set_reports_both_fields() {
        let record = GasPriceRecord {
            chain_id: 1,
            oracle_uri: Some("https://oracle.example".to_string()),
            oracle_parameter: Some("fast".to_string()),
            gwei_factor: Decimal::ONE,
            fixed_wei_value: Some(U256::from(1u64)),
            rank: 100,
        };
        let errors = validate_gas_price(&record).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_field("oracle_uri"));
        assert!(errors.contains_field("fixed_wei_value"));
    }

    #[test]
    fn test_gas_price_neither_set_reports_both_fields() {
        let record = GasPriceRecord {
            chain_id: 1,
            oracle_uri: None,
            oracle_parameter: None,
            gwei_factor: Decimal::ONE,
            fixed_wei_value: None,
            rank: 100,
        };
        let errors = validate_gas_price(&record).unwrap_err();
        assert!(errors.contains_field("oracle_uri"));
        assert!(errors.contains_field("fixed_wei_value"));
    }

    #[test]
    fn test_gas_price_oracle_without_parameter_rejected() {
        let record = GasPriceRecord {
            chain_id: 1,
            oracle_uri: Some("https://oracle.example".to_string()),
            oracle_parameter: None,
            gwei_factor: Decimal::ONE,
            fixed_wei_value: None,
            rank: 100,
        };
        let errors = validate_gas_price(&record).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_field("oracle_parameter"));
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::default();
        errors.push("a", "first");
        errors.push("b", "second");
        assert_eq!(errors.to_string(), "a: first; b: second");
    }
}
