// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-sent change events for the caller's rows.

use crate::db::REALTIME_TABLES;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::realtime::{ChangePayload, EventFilter};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures_util::stream::{self, Stream};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/realtime/{table}", get(subscribe))
}

#[derive(Deserialize)]
pub struct SubscribeQuery {
    #[serde(default)]
    event: EventFilter,
}

struct Feed {
    rx: broadcast::Receiver<ChangePayload>,
    user_id: String,
    filter: EventFilter,
}

impl Feed {
    /// Next change owned by the subscriber that passes the filter.
    async fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(payload) => {
                    if payload.user_id != self.user_id || !self.filter.matches(payload.event_type) {
                        continue;
                    }
                    match Event::default().event("change").json_data(&payload) {
                        Ok(event) => return Some(event),
                        Err(e) => {
                            tracing::warn!(table = %payload.table, error = %e, "Dropping unencodable change");
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %self.user_id, skipped, "Realtime stream lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

async fn subscribe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(table): Path<String>,
    Query(params): Query<SubscribeQuery>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    if !REALTIME_TABLES.contains(&table.as_str()) {
        return Err(AppError::NotFound(format!("Unknown table: {}", table)));
    }

    tracing::debug!(user_id = %user.user_id, table = %table, filter = ?params.event, "Realtime stream opened");

    let feed = Feed {
        rx: state.db.realtime().receiver(&table),
        user_id: user.user_id,
        filter: params.event,
    };

    let events = stream::unfold(feed, |mut feed| async move {
        let event = feed.next_event().await?;
        Some((Ok(event), feed))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
