use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a recurring deduction's Rand amount is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmountType {
    Fixed,
    Percentage,
    Calculated,
}

impl AmountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "Fixed",
            Self::Percentage => "Percentage",
            Self::Calculated => "Calculated",
        }
    }

    /// Accepts any casing plus the short `percent` spelling used by older
    /// company default records.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Some(Self::Fixed),
            "percentage" | "percent" => Some(Self::Percentage),
            "calculated" => Some(Self::Calculated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeneficiaryType {
    MedicalAid,
    PensionFund,
    Union,
    GarnisheeOrder,
    Other,
}

impl BeneficiaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MedicalAid => "Medical Aid",
            Self::PensionFund => "Pension Fund",
            Self::Union => "Union",
            Self::GarnisheeOrder => "Garnishee Order",
            Self::Other => "Other",
        }
    }

    /// Maps a stored label to a beneficiary type. Unknown labels are `Other`.
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "medical aid" => Self::MedicalAid,
            "pension fund" => Self::PensionFund,
            "union" => Self::Union,
            "garnishee order" => Self::GarnisheeOrder,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: i64,
    pub company_id: i64,
    pub kind: BeneficiaryType,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBeneficiary {
    pub company_id: i64,
    pub kind: BeneficiaryType,
    pub name: String,
}

/// A standing deduction against one employee, paid to one beneficiary.
///
/// `beneficiary_kind` and `beneficiary_name` are copied from the
/// beneficiary when the record is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringDeduction {
    pub id: i64,
    pub employee_id: i64,
    pub beneficiary_id: i64,
    pub beneficiary_kind: BeneficiaryType,
    pub beneficiary_name: String,
    pub amount_type: AmountType,
    pub value: Option<Decimal>,
    pub is_active: bool,
    pub effective_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl RecurringDeduction {
    /// True for an active Calculated deduction paid to a medical aid scheme.
    pub fn is_calculated_medical_aid(&self) -> bool {
        self.is_active
            && self.amount_type == AmountType::Calculated
            && self.beneficiary_kind == BeneficiaryType::MedicalAid
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeductionValidationError {
    #[error("calculated deductions are only allowed for Medical Aid beneficiaries, not '{0}'")]
    CalculatedRequiresMedicalAid(String),

    #[error("calculated deductions must not carry a value")]
    CalculatedValueNotAllowed,

    #[error("deduction value must not be negative: {0}")]
    NegativeValue(Decimal),

    #[error("percentage deduction must be at most 100: {0}")]
    PercentageOutOfRange(Decimal),

    #[error("end date {end} is before effective date {start}")]
    EndBeforeEffective { start: NaiveDate, end: NaiveDate },
}

/// For creating new recurring deductions (no id, no denormalised beneficiary fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecurringDeduction {
    pub employee_id: i64,
    pub beneficiary_id: i64,
    pub amount_type: AmountType,
    pub value: Option<Decimal>,
    pub is_active: bool,
    pub effective_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewRecurringDeduction {
    /// Checks the record against the beneficiary it will be paid to.
    ///
    /// # Errors
    ///
    /// Returns [`DeductionValidationError`] if a Calculated deduction targets
    /// a non-medical beneficiary or carries a value, if the value is
    /// negative, if a percentage exceeds 100, or if the end date precedes the
    /// effective date.
    pub fn validate(
        &self,
        beneficiary: BeneficiaryType,
    ) -> Result<(), DeductionValidationError> {
        match self.amount_type {
            AmountType::Calculated => {
                if beneficiary != BeneficiaryType::MedicalAid {
                    return Err(DeductionValidationError::CalculatedRequiresMedicalAid(
                        beneficiary.as_str().to_string(),
                    ));
                }
                if self.value.is_some() {
                    return Err(DeductionValidationError::CalculatedValueNotAllowed);
                }
            }
            AmountType::Fixed | AmountType::Percentage => {
                if let Some(value) = self.value {
                    if value < Decimal::ZERO {
                        return Err(DeductionValidationError::NegativeValue(value));
                    }
                    if self.amount_type == AmountType::Percentage && value > Decimal::ONE_HUNDRED {
                        return Err(DeductionValidationError::PercentageOutOfRange(value));
                    }
                }
            }
        }

        if let (Some(start), Some(end)) = (self.effective_date, self.end_date) {
            if end < start {
                return Err(DeductionValidationError::EndBeforeEffective { start, end });
            }
        }

        Ok(())
    }
}
