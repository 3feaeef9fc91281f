use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{instrument, warn};
use validator::Validate;

use crate::error::AppError;
use crate::normalize::EnrollmentFields;

pub const TVL_STRAND: &str = "TVL";
pub const GRADE_LEVEL_PLACEHOLDER: &str = "N/A";

static ELEVEN_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{11}$").expect("eleven-digit pattern compiles"));
static DIGITS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("digits-only pattern compiles"));

/// Format rules in reporting order: (struct field, wire name, rule).
const FORMAT_RULES: [(&str, &str, &str); 3] = [
    ("contact", "contact number", "must be exactly 11 digits"),
    (
        "guardian_cellphone",
        "guardian cellphone number",
        "must be exactly 11 digits",
    ),
    (
        "guardian_telephone",
        "guardian telephone number",
        "must contain digits only",
    ),
];

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid {field}: {rule}")]
    InvalidFormat {
        field: &'static str,
        rule: &'static str,
    },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// A submission that passed validation and is ready to be persisted.
#[derive(Debug, Clone, Validate)]
pub struct EnrollmentRecord {
    pub lrn: String,
    pub full_name: String,
    pub email: Option<String>,
    #[validate(regex(path = *ELEVEN_DIGITS))]
    pub contact: Option<String>,
    pub address: Option<String>,
    pub dob: Option<String>,
    pub pob: Option<String>,
    pub sex: Option<String>,
    pub nationality: Option<String>,
    pub grade_level: String,
    pub strand: Option<String>,
    pub tvl_spec: Option<String>,
    pub general_average: Option<String>,
    pub medical_conditions: Vec<String>,
    pub medical_other: Option<String>,
    pub how_supported: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_relationship: Option<String>,
    pub guardian_occupation: Option<String>,
    #[validate(regex(path = *DIGITS_ONLY))]
    pub guardian_telephone: Option<String>,
    #[validate(regex(path = *ELEVEN_DIGITS))]
    pub guardian_cellphone: Option<String>,
    pub jhs_graduated: Option<String>,
    pub graduation_date: Option<String>,
    pub credentials_submitted: Option<String>,
    pub signature: Option<String>,
}

fn missing_fields(fields: &EnrollmentFields) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if fields.lrn.is_none() {
        missing.push("lrn");
    }
    if fields.full_name.is_none() {
        missing.push("fullName");
    }
    if fields.strand.as_deref() == Some(TVL_STRAND) && fields.tvl_spec.is_none() {
        missing.push("tvlSpec");
    }
    missing
}

/// Checks required fields (all reported together), then the phone number
/// formats (first failure wins).
#[instrument(skip_all, fields(lrn = fields.lrn.as_deref().unwrap_or_default()))]
pub fn validate_enrollment(fields: EnrollmentFields) -> Result<EnrollmentRecord, ValidationError> {
    let missing = missing_fields(&fields);
    if !missing.is_empty() {
        warn!(missing = ?missing, "Enrollment is missing required fields");
        return Err(ValidationError::MissingFields(missing));
    }

    let EnrollmentFields {
        lrn,
        full_name,
        email,
        contact,
        address,
        dob,
        pob,
        sex,
        nationality,
        grade_level,
        strand,
        tvl_spec,
        general_average,
        medical_conditions,
        medical_other,
        how_supported,
        guardian_name,
        guardian_relationship,
        guardian_occupation,
        guardian_telephone,
        guardian_cellphone,
        jhs_graduated,
        graduation_date,
        credentials_submitted,
        signature,
    } = fields;

    let record = EnrollmentRecord {
        lrn: lrn.unwrap_or_default(),
        full_name: full_name.unwrap_or_default(),
        email,
        contact,
        address,
        dob,
        pob,
        sex,
        nationality,
        grade_level: grade_level.unwrap_or_else(|| GRADE_LEVEL_PLACEHOLDER.to_string()),
        strand,
        tvl_spec,
        general_average,
        medical_conditions,
        medical_other,
        how_supported,
        guardian_name,
        guardian_relationship,
        guardian_occupation,
        guardian_telephone,
        guardian_cellphone,
        jhs_graduated,
        graduation_date,
        credentials_submitted,
        signature,
    };

    if let Err(errors) = record.validate() {
        let field_errors = errors.field_errors();
        if let Some(&(_, field, rule)) = FORMAT_RULES
            .iter()
            .find(|(key, _, _)| field_errors.contains_key(*key))
        {
            warn!(field = %field, "Enrollment field has an invalid format");
            return Err(ValidationError::InvalidFormat { field, rule });
        }
    }

    Ok(record)
}
