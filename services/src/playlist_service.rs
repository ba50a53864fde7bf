use common::events::{CompletionEvent, EventBus, ItemKind};
use db::gateway::{GatewayError, PersistenceGateway};
use db::models::playlist::AccessMode as StoredAccessMode;
use engine::access;
use engine::types::{AccessMode, ItemAvailability, PlaylistEntry};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::HashSet;
use tokio::sync::broadcast;

/// The ordered items of a playlist, with the kind inferred from which
/// junction table held rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItems {
    pub kind: ItemKind,
    pub entries: Vec<PlaylistEntry>,
}

/// Availability of every item of one playlist for one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityView {
    pub playlist_id: i64,
    pub kind: ItemKind,
    pub items: Vec<ItemAvailability>,
}

/// Read side of playlists: ordered items and derived availability.
///
/// Availability is recomputed from the stored completion set on every call;
/// consumers subscribe to the event bus and call
/// [`availability_view`](PlaylistService::availability_view) again whenever
/// a completion event for their playlist arrives.
#[derive(Clone)]
pub struct PlaylistService {
    gateway: PersistenceGateway,
    events: EventBus,
}

impl PlaylistService {
    pub fn new(db: DatabaseConnection, events: EventBus) -> Self {
        Self {
            gateway: PersistenceGateway::new(db),
            events,
        }
    }

    /// Loads a playlist's ordered items.
    ///
    /// The test junction is consulted first, then the course junction;
    /// whichever is non-empty decides the kind. A playlist with no items
    /// at all comes back as an empty test playlist.
    pub async fn load_items(&self, playlist_id: i64) -> Result<PlaylistItems, GatewayError> {
        let test_rows = self.gateway.get_playlist_test_items(playlist_id).await?;
        if !test_rows.is_empty() {
            return Ok(PlaylistItems {
                kind: ItemKind::Test,
                entries: test_rows
                    .into_iter()
                    .map(|row| PlaylistEntry { id: row.test_id })
                    .collect(),
            });
        }

        let course_rows = self.gateway.get_playlist_course_items(playlist_id).await?;
        let kind = if course_rows.is_empty() {
            ItemKind::Test
        } else {
            ItemKind::Course
        };
        Ok(PlaylistItems {
            kind,
            entries: course_rows
                .into_iter()
                .map(|row| PlaylistEntry { id: row.course_id })
                .collect(),
        })
    }

    /// Computes which items the viewer may open right now.
    ///
    /// Reads the playlist, its items and the viewer's progress row, then
    /// delegates to the access policy. The playlist owner sees everything
    /// unlocked.
    pub async fn availability_view(
        &self,
        playlist_id: i64,
        viewer_id: i64,
    ) -> Result<AvailabilityView, GatewayError> {
        let playlist = self.gateway.get_playlist(playlist_id).await?;
        let viewer_is_owner = playlist.teacher_id == viewer_id;

        let items = self.load_items(playlist_id).await?;
        let progress = self.gateway.get_progress(playlist_id, viewer_id).await?;
        let completed: HashSet<i64> = progress
            .map(|row| row.completed_ids().into_iter().collect())
            .unwrap_or_default();

        let mode = match playlist.access_mode {
            StoredAccessMode::Any => AccessMode::Any,
            StoredAccessMode::Sequential => AccessMode::Sequential,
        };

        Ok(AvailabilityView {
            playlist_id,
            kind: items.kind,
            items: access::compute_availability(&items.entries, mode, &completed, viewer_is_owner),
        })
    }

    /// Subscribes to completion events so a displayed view can recompute.
    pub fn subscribe(&self) -> broadcast::Receiver<CompletionEvent> {
        self.events.subscribe()
    }
}
