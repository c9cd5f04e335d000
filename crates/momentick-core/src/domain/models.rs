use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError};

/// One index constituent as supplied by the universe loader.
///
/// Immutable once loaded; `code` identifies the row within its index, but
/// duplicates are allowed and each produces its own snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstituentRecord {
    code: String,
    name: String,
    weight: f64,
}

impl ConstituentRecord {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        weight: f64,
    ) -> Result<Self, ValidationError> {
        let code = code.into().trim().to_owned();
        if code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ValidationError::InvalidWeight {
                value: weight.to_string(),
            });
        }

        Ok(Self {
            code,
            name: name.into(),
            weight,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// One trading session as returned by the quote gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: UtcDateTime,
    pub open: f64,
    pub close: f64,
    pub volume: u64,
}

impl DailyBar {
    pub fn new(date: UtcDateTime, open: f64, close: f64, volume: u64) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("close", close)?;

        Ok(Self {
            date,
            open,
            close,
            volume,
        })
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_code_and_rejects_empty() {
        let record = ConstituentRecord::new(" 700 ", "Tencent", 8.1).expect("valid record");
        assert_eq!(record.code(), "700");

        assert!(matches!(
            ConstituentRecord::new("  ", "Blank", 1.0),
            Err(ValidationError::EmptyCode)
        ));
    }

    #[test]
    fn rejects_non_positive_weight() {
        assert!(matches!(
            ConstituentRecord::new("5", "HSBC", 0.0),
            Err(ValidationError::InvalidWeight { .. })
        ));
        assert!(ConstituentRecord::new("5", "HSBC", f64::NAN).is_err());
    }

    #[test]
    fn rejects_negative_close() {
        let ts = UtcDateTime::parse("2024-01-02T00:00:00Z").expect("timestamp");
        let err = DailyBar::new(ts, 10.0, -1.0, 100).expect_err("must fail");
        assert!(matches!(err, ValidationError::NegativeValue { field: "close" }));
    }
}
