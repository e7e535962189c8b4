//! Firing ledger port: the persisted "last fired date" per device.

use std::future::Future;

use chrono::NaiveDate;

use twilight_domain::command::Selector;
use twilight_domain::error::TwilightError;
use twilight_domain::time::Timestamp;

/// Remembers on which local date each device last fired.
pub trait FiringLedger: Send + Sync {
    /// The local date `device` last fired on, if it ever did.
    fn last_fired(
        &self,
        device: &Selector,
    ) -> impl Future<Output = Result<Option<NaiveDate>, TwilightError>> + Send;

    /// Record that `device` fires on `date`.
    ///
    /// Returns `false` when a marker for `date` already exists, in which case
    /// nothing is written. Check and write happen atomically so two callers
    /// racing for the same day cannot both get `true`.
    fn claim(
        &self,
        device: &Selector,
        date: NaiveDate,
        at: Timestamp,
    ) -> impl Future<Output = Result<bool, TwilightError>> + Send;
}
