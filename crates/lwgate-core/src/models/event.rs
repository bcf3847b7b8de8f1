//! Journal events

use serde::Serialize;

use super::CompletedOperation;

/// Device lifecycle notification as reported to REST clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceNotification {
    pub name: String,
}

impl DeviceNotification {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Event appended to the notification journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEvent {
    Registered(DeviceNotification),
    Updated(DeviceNotification),
    Deregistered(DeviceNotification),
    TimedOut(DeviceNotification),
    Completed(CompletedOperation),
}

impl JournalEvent {
    pub fn registered(name: impl Into<String>) -> Self {
        JournalEvent::Registered(DeviceNotification::new(name))
    }

    pub fn updated(name: impl Into<String>) -> Self {
        JournalEvent::Updated(DeviceNotification::new(name))
    }

    pub fn deregistered(name: impl Into<String>) -> Self {
        JournalEvent::Deregistered(DeviceNotification::new(name))
    }

    pub fn timed_out(name: impl Into<String>) -> Self {
        JournalEvent::TimedOut(DeviceNotification::new(name))
    }
}
