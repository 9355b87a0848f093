// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! The fixed table of CRM event kinds with their localized labels, and the
//! subset the report counts.
//!
//! Order matters: [`EventType::COUNTED`] order breaks ties when ranking.

use serde::{Deserialize, Serialize};

/// A recognized CRM event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    LeadAdded,
    LeadUpdated,
    LeadDeleted,
    LeadResponsibleChanged,
    LeadStatusChanged,
    LeadPipelineChanged,
    ContactAdded,
    ContactUpdated,
    ContactDeleted,
    ContactResponsibleChanged,
    CompanyAdded,
    CompanyUpdated,
    CompanyDeleted,
    CompanyResponsibleChanged,
    NoteAdded,
    NoteUpdated,
    NoteDeleted,
    TaskCreated,
    TaskAdded,
    TaskUpdated,
    TaskDeleted,
    EmailSent,
}

impl EventType {
    /// Every kind, in table order.
    pub const ALL: [EventType; 22] = [
        EventType::LeadAdded,
        EventType::LeadUpdated,
        EventType::LeadDeleted,
        EventType::LeadResponsibleChanged,
        EventType::LeadStatusChanged,
        EventType::LeadPipelineChanged,
        EventType::ContactAdded,
        EventType::ContactUpdated,
        EventType::ContactDeleted,
        EventType::ContactResponsibleChanged,
        EventType::CompanyAdded,
        EventType::CompanyUpdated,
        EventType::CompanyDeleted,
        EventType::CompanyResponsibleChanged,
        EventType::NoteAdded,
        EventType::NoteUpdated,
        EventType::NoteDeleted,
        EventType::TaskCreated,
        EventType::TaskAdded,
        EventType::TaskUpdated,
        EventType::TaskDeleted,
        EventType::EmailSent,
    ];

    /// Kinds the report counts, in ranking tie-break order.
    /// `task_added` has a label but is never counted.
    pub const COUNTED: [EventType; 21] = [
        EventType::LeadAdded,
        EventType::LeadUpdated,
        EventType::LeadDeleted,
        EventType::LeadResponsibleChanged,
        EventType::LeadStatusChanged,
        EventType::LeadPipelineChanged,
        EventType::ContactAdded,
        EventType::ContactUpdated,
        EventType::ContactDeleted,
        EventType::ContactResponsibleChanged,
        EventType::CompanyAdded,
        EventType::CompanyUpdated,
        EventType::CompanyDeleted,
        EventType::CompanyResponsibleChanged,
        EventType::NoteAdded,
        EventType::NoteUpdated,
        EventType::NoteDeleted,
        EventType::TaskCreated,
        EventType::TaskUpdated,
        EventType::TaskDeleted,
        EventType::EmailSent,
    ];

    /// Wire name used by the CRM.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::LeadAdded => "lead_added",
            EventType::LeadUpdated => "lead_updated",
            EventType::LeadDeleted => "lead_deleted",
            EventType::LeadResponsibleChanged => "lead_responsible_changed",
            EventType::LeadStatusChanged => "lead_status_changed",
            EventType::LeadPipelineChanged => "lead_pipeline_changed",
            EventType::ContactAdded => "contact_added",
            EventType::ContactUpdated => "contact_updated",
            EventType::ContactDeleted => "contact_deleted",
            EventType::ContactResponsibleChanged => "contact_responsible_changed",
            EventType::CompanyAdded => "company_added",
            EventType::CompanyUpdated => "company_updated",
            EventType::CompanyDeleted => "company_deleted",
            EventType::CompanyResponsibleChanged => "company_responsible_changed",
            EventType::NoteAdded => "note_added",
            EventType::NoteUpdated => "note_updated",
            EventType::NoteDeleted => "note_deleted",
            EventType::TaskCreated => "task_created",
            EventType::TaskAdded => "task_added",
            EventType::TaskUpdated => "task_updated",
            EventType::TaskDeleted => "task_deleted",
            EventType::EmailSent => "email_sent",
        }
    }

    /// Russian label written to the spreadsheet.
    pub fn label(self) -> &'static str {
        match self {
            EventType::LeadAdded => "Сделка добавлена",
            EventType::LeadUpdated => "Сделка обновлена",
            EventType::LeadDeleted => "Сделка удалена",
            EventType::LeadResponsibleChanged => "Ответственный за сделку изменен",
            EventType::LeadStatusChanged => "Статус сделки изменен",
            EventType::LeadPipelineChanged => "Воронка сделки изменена",
            EventType::ContactAdded => "Добавлен контакт",
            EventType::ContactUpdated => "Обновлен контакт",
            EventType::ContactDeleted => "Удален контакт",
            EventType::ContactResponsibleChanged => "Ответственный за контакт изменен",
            EventType::CompanyAdded => "Добавлена компания",
            EventType::CompanyUpdated => "Обновлена компания",
            EventType::CompanyDeleted => "Удалена компания",
            EventType::CompanyResponsibleChanged => "Ответственный за компанию изменен",
            EventType::NoteAdded => "Добавлена заметка",
            EventType::NoteUpdated => "Обновлена заметка",
            EventType::NoteDeleted => "Удалена заметка",
            EventType::TaskCreated => "Создано задание",
            EventType::TaskAdded => "Добавлено задание",
            EventType::TaskUpdated => "Обновлено задание",
            EventType::TaskDeleted => "Удалено задание",
            EventType::EmailSent => "Отправлено письмо",
        }
    }

    /// Look up a CRM wire name. Unknown kinds return `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Whether events of this kind contribute to the report.
    pub fn is_counted(self) -> bool {
        self.slot().is_some()
    }

    fn slot(self) -> Option<usize> {
        Self::COUNTED.iter().position(|t| *t == self)
    }
}

/// Per-kind counters, one slot per counted kind, all starting at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCounts {
    counts: [u64; EventType::COUNTED.len()],
}

impl EventCounts {
    /// Count one event. Kinds outside [`EventType::COUNTED`] are ignored.
    pub fn increment(&mut self, event_type: EventType) {
        if let Some(slot) = event_type.slot() {
            self.counts[slot] += 1;
        }
    }

    /// Count for `event_type`; always zero for uncounted kinds.
    pub fn get(&self, event_type: EventType) -> u64 {
        event_type.slot().map_or(0, |slot| self.counts[slot])
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(kind, count)` pairs in counted-table order.
    pub fn iter(&self) -> impl Iterator<Item = (EventType, u64)> + '_ {
        EventType::COUNTED.into_iter().zip(self.counts.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_discriminants() {
        for (i, t) in EventType::ALL.iter().enumerate() {
            assert_eq!(*t as usize, i, "{} out of order", t.as_str());
        }
    }

    #[test]
    fn test_wire_names_roundtrip_through_serde() {
        for t in EventType::ALL {
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, t.as_str());
            assert_eq!(EventType::from_wire(t.as_str()), Some(t));
        }
        assert_eq!(EventType::from_wire("unknown_type"), None);
    }

    #[test]
    fn test_task_added_is_labeled_but_not_counted() {
        assert_eq!(EventType::from_wire("task_added"), Some(EventType::TaskAdded));
        assert_eq!(EventType::TaskAdded.label(), "Добавлено задание");
        assert!(!EventType::TaskAdded.is_counted());
        assert_eq!(
            EventType::ALL.iter().filter(|t| t.is_counted()).count(),
            EventType::COUNTED.len()
        );

        let mut counts = EventCounts::default();
        counts.increment(EventType::TaskAdded);
        counts.increment(EventType::TaskCreated);
        assert_eq!(counts.get(EventType::TaskAdded), 0);
        assert_eq!(counts.total(), 1);
        assert!(counts.iter().all(|(t, _)| t != EventType::TaskAdded));
    }
}
