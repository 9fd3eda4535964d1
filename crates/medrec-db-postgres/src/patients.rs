//! Patient records.

use std::str::FromStr;

use async_trait::async_trait;
use medrec_core::text::escape_like;
use medrec_core::{Age, AgeCategory, BloodType, Patient, PatientChanges};
use medrec_storage::{Page, PageRequest, PatientQuery, PatientStorage, StorageError, StorageResult};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::PostgresError;
use crate::storage::PostgresStorage;

// =============================================================================
// Row mapping
// =============================================================================

type PatientTuple = (
    Uuid,
    Uuid,
    String,
    Vec<String>,
    String,
    String,
    i16,
    String,
    String,
    OffsetDateTime,
    OffsetDateTime,
);

const PATIENT_COLUMNS: &str = "id, owner_id, fullname, diseases, email, phone, age, \
    age_category, blood_type, created_at, updated_at";

/// Shared by the list and count queries.
///
/// $1 owner, $2 escaped ILIKE pattern or NULL, $3 age band or NULL,
/// $4 blood types (empty means any).
const PATIENT_FILTER: &str = r#"
    WHERE owner_id = $1
      AND ($2::text IS NULL
           OR fullname ILIKE $2 ESCAPE '\'
           OR email ILIKE $2 ESCAPE '\'
           OR phone ILIKE $2 ESCAPE '\')
      AND ($3::text IS NULL OR age_category = $3)
      AND (cardinality($4::text[]) = 0 OR blood_type = ANY($4))
"#;

fn from_tuple(row: PatientTuple) -> Result<Patient, PostgresError> {
    let age = Age::new(i64::from(row.6))
        .map_err(|e| PostgresError::corrupt_row(format!("patient {}: {e}", row.0)))?;
    let age_category = AgeCategory::from_str(&row.7)
        .map_err(|e| PostgresError::corrupt_row(format!("patient {}: {e}", row.0)))?;
    let bloodtype = BloodType::from_str(&row.8)
        .map_err(|e| PostgresError::corrupt_row(format!("patient {}: {e}", row.0)))?;

    Ok(Patient {
        id: row.0,
        owner_id: row.1,
        fullname: row.2,
        diseases: row.3,
        email: row.4,
        phone: row.5,
        age,
        age_category,
        bloodtype,
        created_at: row.9,
        updated_at: row.10,
    })
}

// =============================================================================
// Patient Storage
// =============================================================================

#[async_trait]
impl PatientStorage for PostgresStorage {
    async fn create_patient(&self, patient: &Patient) -> StorageResult<()> {
        query(
            r#"
            INSERT INTO patients (id, owner_id, fullname, diseases, email, phone, age,
                                  age_category, blood_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(patient.id)
        .bind(patient.owner_id)
        .bind(&patient.fullname)
        .bind(&patient.diseases)
        .bind(&patient.email)
        .bind(&patient.phone)
        .bind(i16::from(patient.age.years()))
        .bind(patient.age_category.as_str())
        .bind(patient.bloodtype.as_str())
        .bind(patient.created_at)
        .bind(patient.updated_at)
        .execute(&self.pool)
        .await
        .map_err(PostgresError::from)?;
        Ok(())
    }

    async fn get_patient(&self, owner_id: Uuid, id: Uuid) -> StorageResult<Option<Patient>> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1 AND owner_id = $2");
        let row: Option<PatientTuple> = query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;
        Ok(row.map(from_tuple).transpose()?)
    }

    async fn patient_exists(&self, owner_id: Uuid, id: Uuid) -> StorageResult<bool> {
        let exists: bool = query_scalar(
            "SELECT EXISTS (SELECT 1 FROM patients WHERE id = $1 AND owner_id = $2)",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(PostgresError::from)?;
        Ok(exists)
    }

    async fn update_patient(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &PatientChanges,
        now: OffsetDateTime,
    ) -> StorageResult<Patient> {
        let mut tx = self.pool.begin().await.map_err(PostgresError::from)?;

        let sql = format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        );
        let row: Option<PatientTuple> = query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(PostgresError::from)?;
        let mut patient = match row {
            Some(row) => from_tuple(row)?,
            None => return Err(StorageError::not_found("Patient", id)),
        };

        patient.apply(changes.clone(), now);

        query(
            r#"
            UPDATE patients
            SET fullname = $3,
                diseases = $4,
                email = $5,
                phone = $6,
                age = $7,
                age_category = $8,
                blood_type = $9,
                updated_at = $10
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&patient.fullname)
        .bind(&patient.diseases)
        .bind(&patient.email)
        .bind(&patient.phone)
        .bind(i16::from(patient.age.years()))
        .bind(patient.age_category.as_str())
        .bind(patient.bloodtype.as_str())
        .bind(patient.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(PostgresError::from)?;

        tx.commit().await.map_err(PostgresError::from)?;
        Ok(patient)
    }

    async fn delete_patient(&self, owner_id: Uuid, id: Uuid) -> StorageResult<u64> {
        let mut tx = self.pool.begin().await.map_err(PostgresError::from)?;

        let diagnoses = query("DELETE FROM diagnoses WHERE patient_id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(PostgresError::from)?
            .rows_affected();

        let patients = query("DELETE FROM patients WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(PostgresError::from)?
            .rows_affected();

        if patients == 0 {
            // Dropping the transaction rolls it back.
            return Err(StorageError::not_found("Patient", id));
        }

        tx.commit().await.map_err(PostgresError::from)?;
        tracing::debug!(patient_id = %id, diagnoses, "Deleted patient");
        Ok(diagnoses)
    }

    async fn search_patients(
        &self,
        owner_id: Uuid,
        query_params: &PatientQuery,
        page: PageRequest,
    ) -> StorageResult<Page<Patient>> {
        let pattern = query_params
            .search_term()
            .map(|term| format!("%{}%", escape_like(term)));
        let category = query_params.category.map(AgeCategory::as_str);
        let blood_types: Vec<&str> = query_params
            .blood_types
            .iter()
            .map(|b| b.as_str())
            .collect();

        let count_sql = format!("SELECT COUNT(*) FROM patients {PATIENT_FILTER}");
        let total: i64 = query_scalar(&count_sql)
            .bind(owner_id)
            .bind(pattern.as_deref())
            .bind(category)
            .bind(&blood_types)
            .fetch_one(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        let list_sql = format!(
            "SELECT {PATIENT_COLUMNS} FROM patients {PATIENT_FILTER} \
             ORDER BY created_at DESC, id DESC LIMIT $5 OFFSET $6"
        );
        let rows: Vec<PatientTuple> = query_as(&list_sql)
            .bind(owner_id)
            .bind(pattern.as_deref())
            .bind(category)
            .bind(&blood_types)
            .bind(i64::from(page.limit()))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(PostgresError::from)?;

        let items = rows
            .into_iter()
            .map(from_tuple)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }
}
