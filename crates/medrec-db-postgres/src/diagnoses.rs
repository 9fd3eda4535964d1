//! Diagnosis records and full-text search.

use async_trait::async_trait;
use medrec_core::{Diagnosis, DiagnosisChanges};
use medrec_storage::{
    DiagnosisQuery, DiagnosisStorage, Page, PageRequest, StorageError, StorageResult,
};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::PostgresError;
use crate::storage::PostgresStorage;

type DiagnosisTuple = (
    Uuid,
    Uuid,
    Uuid,
    String,
    String,
    Vec<String>,
    OffsetDateTime,
    OffsetDateTime,
);

const DIAGNOSIS_COLUMNS: &str =
    "id, owner_id, patient_id, title, description, medicine, created_at, updated_at";

fn from_tuple(row: DiagnosisTuple) -> Diagnosis {
    Diagnosis {
        id: row.0,
        owner_id: row.1,
        patient_id: row.2,
        title: row.3,
        description: row.4,
        medicine: row.5,
        created_at: row.6,
        updated_at: row.7,
    }
}

/// Builds a `to_tsquery` expression matching any of the terms, each as a prefix.
///
/// Terms are alphanumeric words, so no tsquery operators can leak in.
fn tsquery(terms: &[String]) -> String {
    terms
        .iter()
        .map(|term| format!("{term}:*"))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[async_trait]
impl DiagnosisStorage for PostgresStorage {
    async fn create_diagnosis(&self, diagnosis: &Diagnosis) -> StorageResult<()> {
        query(
            r#"
            INSERT INTO diagnoses (id, owner_id, patient_id, title, description, medicine,
                                   created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(diagnosis.id)
        .bind(diagnosis.owner_id)
        .bind(diagnosis.patient_id)
        .bind(&diagnosis.title)
        .bind(&diagnosis.description)
        .bind(&diagnosis.medicine)
        .bind(diagnosis.created_at)
        .bind(diagnosis.updated_at)
        .execute(&self.pool)
        .await
        .map_err(PostgresError::from)
        .map_err(|e| match StorageError::from(e) {
            StorageError::NotFound { .. } => {
                StorageError::not_found("Patient", diagnosis.patient_id)
            }
            other => other,
        })?;
        Ok(())
    }

    async fn get_diagnosis(&self, owner_id: Uuid, id: Uuid) -> StorageResult<Option<Diagnosis>> {
        let sql =
            format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE id = $1 AND owner_id = $2");
        let row: Option<DiagnosisTuple> = query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;
        Ok(row.map(from_tuple))
    }

    async fn update_diagnosis(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &DiagnosisChanges,
        now: OffsetDateTime,
    ) -> StorageResult<Diagnosis> {
        let mut tx = self.pool.begin().await.map_err(PostgresError::from)?;

        let sql = format!(
            "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE id = $1 AND owner_id = $2 FOR UPDATE"
        );
        let row: Option<DiagnosisTuple> = query_as(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(PostgresError::from)?;
        let Some(row) = row else {
            return Err(StorageError::not_found("Diagnosis", id));
        };

        let mut diagnosis = from_tuple(row);
        diagnosis.apply(changes.clone(), now);

        query(
            r#"
            UPDATE diagnoses
            SET title = $3,
                description = $4,
                medicine = $5,
                updated_at = $6
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&diagnosis.title)
        .bind(&diagnosis.description)
        .bind(&diagnosis.medicine)
        .bind(diagnosis.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(PostgresError::from)?;

        tx.commit().await.map_err(PostgresError::from)?;
        Ok(diagnosis)
    }

    async fn delete_diagnosis(&self, owner_id: Uuid, id: Uuid) -> StorageResult<()> {
        let deleted = query("DELETE FROM diagnoses WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(PostgresError::from)?
            .rows_affected();

        if deleted == 0 {
            return Err(StorageError::not_found("Diagnosis", id));
        }
        Ok(())
    }

    async fn search_diagnoses(
        &self,
        owner_id: Uuid,
        patient_id: Uuid,
        query_params: &DiagnosisQuery,
        page: PageRequest,
    ) -> StorageResult<Page<Diagnosis>> {
        let terms = query_params.terms();
        // Punctuation alone still counts as a search, one that matches nothing.
        if query_params.search_term().is_some() && terms.is_empty() {
            return Ok(Page::new(Vec::new(), 0, page));
        }
        let limit = i64::from(page.limit());
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

        let (total, rows): (i64, Vec<DiagnosisTuple>) = if terms.is_empty() {
            let total: i64 = query_scalar(
                "SELECT COUNT(*) FROM diagnoses WHERE owner_id = $1 AND patient_id = $2",
            )
            .bind(owner_id)
            .bind(patient_id)
            .fetch_one(&self.pool)
            .await
            .map_err(PostgresError::from)?;

            let sql = format!(
                "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses \
                 WHERE owner_id = $1 AND patient_id = $2 \
                 ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
            );
            let rows: Vec<DiagnosisTuple> = query_as(&sql)
                .bind(owner_id)
                .bind(patient_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .map_err(PostgresError::from)?;
            (total, rows)
        } else {
            let ts = tsquery(&terms);
            let total: i64 = query_scalar(
                r#"
                SELECT COUNT(*) FROM diagnoses
                WHERE owner_id = $1 AND patient_id = $2
                  AND search @@ to_tsquery('simple', $3)
                "#,
            )
            .bind(owner_id)
            .bind(patient_id)
            .bind(&ts)
            .fetch_one(&self.pool)
            .await
            .map_err(PostgresError::from)?;

            let sql = format!(
                "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses \
                 WHERE owner_id = $1 AND patient_id = $2 \
                   AND search @@ to_tsquery('simple', $3) \
                 ORDER BY ts_rank(search, to_tsquery('simple', $3)) DESC, \
                          created_at DESC, id DESC \
                 LIMIT $4 OFFSET $5"
            );
            let rows: Vec<DiagnosisTuple> = query_as(&sql)
                .bind(owner_id)
                .bind(patient_id)
                .bind(&ts)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .map_err(PostgresError::from)?;
            (total, rows)
        };

        let items = rows.into_iter().map(from_tuple).collect();
        Ok(Page::new(items, total.max(0) as u64, page))
    }
}
