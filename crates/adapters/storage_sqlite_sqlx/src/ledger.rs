//! `SQLite` implementation of [`FiringLedger`].

use std::future::Future;

use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use twilight_app::ports::FiringLedger;
use twilight_domain::command::Selector;
use twilight_domain::error::TwilightError;
use twilight_domain::time::Timestamp;

use crate::error::StorageError;

const SELECT_FIRED_ON: &str = "SELECT fired_on FROM firing_markers WHERE selector = ?";
// The conditional upsert writes nothing when the stored date already equals
// the claimed one, which `rows_affected` then reports as zero.
const CLAIM: &str = "INSERT INTO firing_markers (selector, fired_on, fired_at) VALUES (?, ?, ?) \
     ON CONFLICT(selector) DO UPDATE SET fired_on = excluded.fired_on, fired_at = excluded.fired_at \
     WHERE firing_markers.fired_on <> excluded.fired_on";

/// `SQLite`-backed firing ledger.
pub struct SqliteFiringLedger {
    pool: SqlitePool,
}

impl SqliteFiringLedger {
    /// Create a new ledger using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl FiringLedger for SqliteFiringLedger {
    fn last_fired(
        &self,
        device: &Selector,
    ) -> impl Future<Output = Result<Option<NaiveDate>, TwilightError>> + Send {
        let pool = self.pool.clone();
        let selector = device.to_string();
        async move {
            let row = sqlx::query(SELECT_FIRED_ON)
                .bind(&selector)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let Some(row) = row else {
                return Ok(None);
            };
            let value: String = row.try_get("fired_on").map_err(StorageError::from)?;
            let date = value
                .parse::<NaiveDate>()
                .map_err(|source| StorageError::InvalidDate {
                    selector,
                    value: value.clone(),
                    source,
                })?;
            Ok(Some(date))
        }
    }

    fn claim(
        &self,
        device: &Selector,
        date: NaiveDate,
        at: Timestamp,
    ) -> impl Future<Output = Result<bool, TwilightError>> + Send {
        let pool = self.pool.clone();
        let selector = device.to_string();
        async move {
            let result = sqlx::query(CLAIM)
                .bind(&selector)
                .bind(date.to_string())
                .bind(at.to_rfc3339())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() > 0)
        }
    }
}
