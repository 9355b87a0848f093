// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event counting and ranking.
//!
//! Events authored by account users are left out: the report is about
//! activity triggered from outside (clients, integrations).

use crate::models::{CrmEvent, CrmUser, EventCounts, EventType, RankedEvent};
use std::collections::HashSet;

/// Count events of counted kinds not authored by any of `users`.
pub fn aggregate(users: &[CrmUser], events: &[CrmEvent]) -> EventCounts {
    let user_ids: HashSet<i64> = users.iter().map(|u| u.id).collect();
    let mut counts = EventCounts::default();

    for event in events {
        if event.created_by.is_some_and(|id| user_ids.contains(&id)) {
            continue;
        }

        if let Some(event_type) = event.event_type.as_deref().and_then(EventType::from_wire) {
            counts.increment(event_type);
        }
    }

    counts
}

/// The `n` most frequent kinds, count descending. Equal counts keep table
/// order.
pub fn top_n(counts: &EventCounts, n: usize) -> Vec<RankedEvent> {
    let mut ranked: Vec<RankedEvent> = counts
        .iter()
        .map(|(event_type, count)| RankedEvent { event_type, count })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(n);
    ranked
}
