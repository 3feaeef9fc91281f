use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Allowed values in alphabetical order, for error messages.
    pub fn allowed_list() -> String {
        let mut names: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names.join(", ")
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid status. Allowed: {}", ApplicationStatus::allowed_list())]
pub struct InvalidStatus;

impl FromStr for ApplicationStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(ApplicationStatus::Submitted),
            "under_review" => Ok(ApplicationStatus::UnderReview),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(InvalidStatus),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn to_utc(dt: Option<NaiveDateTime>) -> DateTime<Utc> {
    dt.map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
        .unwrap_or_else(Utc::now)
}

/// One row of the admin application list.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApplicationListing {
    pub id: i64,
    pub student_id: i64,
    pub lrn: String,
    pub full_name: String,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub grade_level: String,
    pub strand: Option<String>,
    pub tvl_spec: Option<String>,
    pub general_average: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub medical_conditions: Vec<String>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbApplicationListing {
    pub id: Option<i64>,
    pub student_id: Option<i64>,
    pub lrn: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub grade_level: Option<String>,
    pub strand: Option<String>,
    pub tvl_spec: Option<String>,
    pub general_average: Option<String>,
    pub status: Option<String>,
    pub submitted_at: Option<NaiveDateTime>,
}

impl From<DbApplicationListing> for ApplicationListing {
    fn from(db: DbApplicationListing) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            student_id: db.student_id.unwrap_or_default(),
            lrn: db.lrn.unwrap_or_default(),
            full_name: db.full_name.unwrap_or_default(),
            email: db.email,
            contact: db.contact,
            grade_level: db.grade_level.unwrap_or_default(),
            strand: db.strand,
            tvl_spec: db.tvl_spec,
            general_average: db.general_average,
            status: db
                .status
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            submitted_at: to_utc(db.submitted_at),
            medical_conditions: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Student {
    pub id: i64,
    pub lrn: String,
    pub full_name: String,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub dob: Option<String>,
    pub pob: Option<String>,
    pub sex: Option<String>,
    pub nationality: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Guardian {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub occupation: Option<String>,
    pub telephone: Option<String>,
    pub cellphone: Option<String>,
}

/// Full application record with its student, for the detail view.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApplicationDetail {
    pub id: i64,
    pub student: Student,
    pub grade_level: String,
    pub strand: Option<String>,
    pub tvl_spec: Option<String>,
    pub general_average: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub jhs_graduated: Option<String>,
    pub graduation_date: Option<String>,
    pub medical_conditions: Vec<String>,
    pub medical_other: Option<String>,
    pub how_supported: Option<String>,
    pub guardian: Guardian,
    pub credentials_submitted: Option<String>,
    pub signature: Option<String>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbApplicationDetail {
    pub id: Option<i64>,
    pub student_id: Option<i64>,
    pub lrn: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub dob: Option<String>,
    pub pob: Option<String>,
    pub sex: Option<String>,
    pub nationality: Option<String>,
    pub grade_level: Option<String>,
    pub strand: Option<String>,
    pub tvl_spec: Option<String>,
    pub general_average: Option<String>,
    pub status: Option<String>,
    pub submitted_at: Option<NaiveDateTime>,
    pub jhs_graduated: Option<String>,
    pub graduation_date: Option<String>,
    pub medical_other: Option<String>,
    pub how_supported: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_relationship: Option<String>,
    pub guardian_occupation: Option<String>,
    pub guardian_telephone: Option<String>,
    pub guardian_cellphone: Option<String>,
    pub credentials_submitted: Option<String>,
    pub signature: Option<String>,
}

impl From<DbApplicationDetail> for ApplicationDetail {
    fn from(db: DbApplicationDetail) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            student: Student {
                id: db.student_id.unwrap_or_default(),
                lrn: db.lrn.unwrap_or_default(),
                full_name: db.full_name.unwrap_or_default(),
                email: db.email,
                contact: db.contact,
                address: db.address,
                dob: db.dob,
                pob: db.pob,
                sex: db.sex,
                nationality: db.nationality,
            },
            grade_level: db.grade_level.unwrap_or_default(),
            strand: db.strand,
            tvl_spec: db.tvl_spec,
            general_average: db.general_average,
            status: db
                .status
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            submitted_at: to_utc(db.submitted_at),
            jhs_graduated: db.jhs_graduated,
            graduation_date: db.graduation_date,
            medical_conditions: Vec::new(),
            medical_other: db.medical_other,
            how_supported: db.how_supported,
            guardian: Guardian {
                name: db.guardian_name,
                relationship: db.guardian_relationship,
                occupation: db.guardian_occupation,
                telephone: db.guardian_telephone,
                cellphone: db.guardian_cellphone,
            },
            credentials_submitted: db.credentials_submitted,
            signature: db.signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_every_wire_value() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), status);
        }
        assert!("Approved".parse::<ApplicationStatus>().is_err());
        assert!("pending".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn invalid_status_message_lists_allowed_values_sorted() {
        assert_eq!(
            InvalidStatus.to_string(),
            "Invalid status. Allowed: approved, rejected, submitted, under_review"
        );
    }

    #[test]
    fn unknown_stored_status_falls_back_to_submitted() {
        let listing = ApplicationListing::from(DbApplicationListing {
            status: Some("archived".into()),
            ..Default::default()
        });
        assert_eq!(listing.status, ApplicationStatus::Submitted);
    }
}
