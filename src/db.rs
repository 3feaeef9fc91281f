use std::collections::HashMap;

use sqlx::{Pool, QueryBuilder, Sqlite};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::models::{
    ApplicationDetail, ApplicationListing, ApplicationStatus, DbApplicationDetail,
    DbApplicationListing,
};
use crate::validation::EnrollmentRecord;

pub const LIST_LIMIT: i64 = 200;

#[derive(Debug, Default, Clone)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub strand: Option<String>,
}

/// Inserts the student, the application and its medical conditions in one
/// transaction and returns the new application id.
#[instrument(skip_all, fields(lrn = %record.lrn))]
pub async fn create_enrollment(
    pool: &Pool<Sqlite>,
    record: &EnrollmentRecord,
) -> Result<i64, AppError> {
    info!("Creating enrollment");
    let mut tx = pool.begin().await?;

    let student_id = sqlx::query(
        "INSERT INTO students
         (lrn, full_name, email, contact, address, dob, pob, sex, nationality)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.lrn)
    .bind(&record.full_name)
    .bind(&record.email)
    .bind(&record.contact)
    .bind(&record.address)
    .bind(&record.dob)
    .bind(&record.pob)
    .bind(&record.sex)
    .bind(&record.nationality)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let application_id = sqlx::query(
        "INSERT INTO applications
         (student_id, grade_level, strand, tvl_spec, general_average, status,
          jhs_graduated, graduation_date, medical_other, how_supported,
          guardian_name, guardian_relationship, guardian_occupation,
          guardian_telephone, guardian_cellphone, credentials_submitted, signature)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(student_id)
    .bind(&record.grade_level)
    .bind(&record.strand)
    .bind(&record.tvl_spec)
    .bind(&record.general_average)
    .bind(ApplicationStatus::Submitted.as_str())
    .bind(&record.jhs_graduated)
    .bind(&record.graduation_date)
    .bind(&record.medical_other)
    .bind(&record.how_supported)
    .bind(&record.guardian_name)
    .bind(&record.guardian_relationship)
    .bind(&record.guardian_occupation)
    .bind(&record.guardian_telephone)
    .bind(&record.guardian_cellphone)
    .bind(&record.credentials_submitted)
    .bind(&record.signature)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for (position, condition) in record.medical_conditions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO application_medical_conditions (application_id, position, condition)
             VALUES (?, ?, ?)",
        )
        .bind(application_id)
        .bind(position as i64)
        .bind(condition)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(student_id, application_id, "Enrollment stored");
    Ok(application_id)
}

async fn medical_conditions_for(
    pool: &Pool<Sqlite>,
    application_ids: &[i64],
) -> Result<HashMap<i64, Vec<String>>, AppError> {
    let mut conditions: HashMap<i64, Vec<String>> = HashMap::new();
    if application_ids.is_empty() {
        return Ok(conditions);
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT application_id, condition FROM application_medical_conditions
         WHERE application_id IN (",
    );
    let mut ids = query.separated(", ");
    for id in application_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY application_id, position");

    let rows: Vec<(i64, String)> = query.build_query_as().fetch_all(pool).await?;
    for (application_id, condition) in rows {
        conditions.entry(application_id).or_default().push(condition);
    }

    Ok(conditions)
}

/// Most recent applications first, filtered by exact status and strand.
#[instrument(skip(pool))]
pub async fn list_applications(
    pool: &Pool<Sqlite>,
    filter: &ApplicationFilter,
) -> Result<Vec<ApplicationListing>, AppError> {
    info!("Listing applications");
    let status = filter.status.map(|s| s.as_str());

    let rows = sqlx::query_as::<_, DbApplicationListing>(
        "SELECT a.id, a.student_id, s.lrn, s.full_name, s.email, s.contact,
                a.grade_level, a.strand, a.tvl_spec, a.general_average,
                a.status, a.submitted_at
         FROM applications a
         JOIN students s ON s.id = a.student_id
         WHERE (?1 IS NULL OR a.status = ?1)
           AND (?2 IS NULL OR a.strand = ?2)
         ORDER BY a.id DESC
         LIMIT ?3",
    )
    .bind(status)
    .bind(filter.strand.as_deref())
    .bind(LIST_LIMIT)
    .fetch_all(pool)
    .await?;

    let mut listings: Vec<ApplicationListing> =
        rows.into_iter().map(ApplicationListing::from).collect();

    let ids: Vec<i64> = listings.iter().map(|l| l.id).collect();
    let mut conditions = medical_conditions_for(pool, &ids).await?;
    for listing in &mut listings {
        listing.medical_conditions = conditions.remove(&listing.id).unwrap_or_default();
    }

    Ok(listings)
}

#[instrument(skip(pool))]
pub async fn get_application(pool: &Pool<Sqlite>, id: i64) -> Result<ApplicationDetail, AppError> {
    info!("Fetching application by ID");
    let row = sqlx::query_as::<_, DbApplicationDetail>(
        "SELECT a.id, a.student_id, s.lrn, s.full_name, s.email, s.contact, s.address,
                s.dob, s.pob, s.sex, s.nationality,
                a.grade_level, a.strand, a.tvl_spec, a.general_average, a.status,
                a.submitted_at, a.jhs_graduated, a.graduation_date, a.medical_other,
                a.how_supported, a.guardian_name, a.guardian_relationship,
                a.guardian_occupation, a.guardian_telephone, a.guardian_cellphone,
                a.credentials_submitted, a.signature
         FROM applications a
         JOIN students s ON s.id = a.student_id
         WHERE a.id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let mut detail = ApplicationDetail::from(row);
            detail.medical_conditions = medical_conditions_for(pool, &[id])
                .await?
                .remove(&id)
                .unwrap_or_default();
            Ok(detail)
        }
        _ => Err(AppError::NotFound(format!("Application {} not found", id))),
    }
}

#[instrument(skip(pool))]
pub async fn update_application_status(
    pool: &Pool<Sqlite>,
    id: i64,
    status: ApplicationStatus,
) -> Result<(), AppError> {
    info!("Updating application status");
    let result = sqlx::query("UPDATE applications SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        warn!("Status update matched no application");
        return Err(AppError::NotFound(format!("Application {} not found", id)));
    }

    Ok(())
}
