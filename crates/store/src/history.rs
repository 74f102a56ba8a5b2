// Reconciliation history

use chrono::Utc;
use ledgerlink_recon::normalize::normalize_dataset;
use ledgerlink_recon::{Dataset, ReconReport};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::error::StoreError;
use crate::{timestamp, Store};

/// History listing entry. The input datasets stay in the database.
#[derive(Debug, Clone, Serialize)]
pub struct StoredReconciliation {
    pub id: String,
    pub created_at: String,
    pub result: ReconReport,
}

/// A saved run including both input datasets.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationRecord {
    pub id: String,
    pub created_at: String,
    pub dataset_a: Dataset,
    pub dataset_b: Dataset,
    pub result: ReconReport,
}

impl Store {
    /// Persist a finished run. Both datasets are stored date-normalized so
    /// they read back in the same form as the records inside `report`.
    pub fn save_reconciliation(
        &self,
        user_id: &str,
        dataset_a: &Dataset,
        dataset_b: &Dataset,
        report: &ReconReport,
    ) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();

        self.conn.execute(
            "INSERT INTO reconciliations (id, user_id, created_at, dataset_a, dataset_b, result)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                user_id,
                timestamp(Utc::now()),
                serde_json::to_string(&normalize_dataset(dataset_a))?,
                serde_json::to_string(&normalize_dataset(dataset_b))?,
                serde_json::to_string(report)?,
            ],
        )?;

        log::debug!("saved reconciliation {} for user {}", id, user_id);
        Ok(id)
    }

    /// The user's reconciliations, newest first.
    pub fn list_reconciliations(&self, user_id: &str) -> Result<Vec<StoredReconciliation>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at, result FROM reconciliations
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, created_at, result) = row?;
            out.push(StoredReconciliation {
                id,
                created_at,
                result: serde_json::from_str(&result)?,
            });
        }
        Ok(out)
    }

    /// One saved run. Another user's id reads as absent.
    pub fn get_reconciliation(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<ReconciliationRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, created_at, dataset_a, dataset_b, result FROM reconciliations
                 WHERE user_id = ?1 AND id = ?2",
                params![user_id, id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, created_at, dataset_a, dataset_b, result)) = row else {
            return Ok(None);
        };

        Ok(Some(ReconciliationRecord {
            id,
            created_at,
            dataset_a: serde_json::from_str(&dataset_a)?,
            dataset_b: serde_json::from_str(&dataset_b)?,
            result: serde_json::from_str(&result)?,
        }))
    }
}
