use common::events::{CompletionEvent, EventBus, ItemKind};
use db::gateway::{GatewayError, PersistenceGateway};
use log::debug;
use sea_orm::DatabaseConnection;

/// Records playlist item completions.
///
/// Both completion sources converge here: a finished test session and the
/// explicit "mark lesson complete" action call the same
/// [`record_completion`](ProgressService::record_completion). Nothing else
/// writes progress rows.
#[derive(Clone)]
pub struct ProgressService {
    gateway: PersistenceGateway,
    events: EventBus,
}

impl ProgressService {
    pub fn new(db: DatabaseConnection, events: EventBus) -> Self {
        Self {
            gateway: PersistenceGateway::new(db),
            events,
        }
    }

    /// Appends `item_id` to the student's completion set for a playlist and
    /// returns the updated set.
    ///
    /// Read-modify-write over the single progress row: the current set is
    /// read (an absent row reads as the empty set), the item unioned in and
    /// the row written back. Re-recording an already completed item skips
    /// the write entirely. The completion event is published only after the
    /// write has been acknowledged, never before.
    ///
    /// Two interleaved calls for the same (playlist, student) pair run
    /// independent read-modify-write cycles; the store offers no atomic
    /// array-append, so the later writer can overwrite the earlier one.
    /// Documented limitation, see DESIGN.md.
    pub async fn record_completion(
        &self,
        playlist_id: i64,
        student_id: i64,
        item_id: i64,
        kind: ItemKind,
    ) -> Result<Vec<i64>, GatewayError> {
        let existing = self.gateway.get_progress(playlist_id, student_id).await?;
        let mut completed = existing
            .map(|row| row.completed_ids())
            .unwrap_or_default();

        if completed.contains(&item_id) {
            debug!(
                "{} {} already recorded for student {} in playlist {}",
                kind, item_id, student_id, playlist_id
            );
        } else {
            completed.push(item_id);
            self.gateway
                .upsert_progress(playlist_id, student_id, &completed, Some(item_id))
                .await?;
        }

        self.events
            .publish(CompletionEvent::new(playlist_id, student_id, item_id, kind));

        Ok(completed)
    }
}
