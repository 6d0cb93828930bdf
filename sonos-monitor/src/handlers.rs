//! Handler traits called by the dispatch loop, and the stock handlers.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::HandlerError;
use crate::event::{StateChangeEvent, UnknownEvent};
use crate::position::{query_with_timeout, PositionQuery};
use crate::types::Device;

/// Receives every state change whose device could be resolved.
///
/// Calls are sequential and in arrival order. A call that outlives the
/// configured handler timeout is abandoned and reported.
#[async_trait]
pub trait StateChangeHandler: Send + Sync {
    async fn on_state_change(
        &self,
        device: Arc<Device>,
        event: &StateChangeEvent,
    ) -> Result<(), HandlerError>;
}

/// Receives events of types the decoder does not understand.
#[async_trait]
pub trait UnknownEventHandler: Send + Sync {
    async fn on_unknown_event(
        &self,
        device: Arc<Device>,
        event: &UnknownEvent,
    ) -> Result<(), HandlerError>;
}

/// Default unknown-event handler: log and move on.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogUnknownEvents;

#[async_trait]
impl UnknownEventHandler for LogUnknownEvents {
    async fn on_unknown_event(
        &self,
        device: Arc<Device>,
        event: &UnknownEvent,
    ) -> Result<(), HandlerError> {
        info!(
            room = %device.room_name,
            event_type = %event.event_type,
            bytes = event.body.len(),
            "Ignoring unrecognised event"
        );
        Ok(())
    }
}

/// Logs each state change and, when a position query is configured, where
/// the device is in its current track.
pub struct LoggingHandler {
    position: Option<(Arc<dyn PositionQuery>, Duration)>,
}

impl LoggingHandler {
    /// Log events only.
    pub fn new() -> Self {
        Self { position: None }
    }

    /// Also query and log the position after every change, bounded by `timeout`.
    pub fn with_position_query(query: Arc<dyn PositionQuery>, timeout: Duration) -> Self {
        Self {
            position: Some((query, timeout)),
        }
    }
}

impl Default for LoggingHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateChangeHandler for LoggingHandler {
    async fn on_state_change(
        &self,
        device: Arc<Device>,
        event: &StateChangeEvent,
    ) -> Result<(), HandlerError> {
        info!(
            room = %device.room_name,
            state = %event.transport_state,
            uri = %event.current_track_uri,
            "Transport state changed"
        );

        match &event.track_metadata {
            Some(track) => info!(
                room = %device.room_name,
                title = track.title.as_deref().unwrap_or("-"),
                artist = track.artist.as_deref().unwrap_or("-"),
                album = track.album.as_deref().unwrap_or("-"),
                "Track metadata"
            ),
            None => debug!(room = %device.room_name, "No track metadata"),
        }

        if let Some((query, timeout)) = &self.position {
            let room = device.room_name.clone();
            let position = query_with_timeout(query.clone(), device, *timeout).await?;
            info!(
                room = %room,
                track_uri = %position.track_uri,
                duration = %position.track_duration,
                rel_time = %position.rel_time,
                "Position"
            );
        }

        Ok(())
    }
}
