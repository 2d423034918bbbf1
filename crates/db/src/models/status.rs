//! Enums mapping to the SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data id in the
//! corresponding lookup table (`recurrence_types`, `notification_priorities`,
//! `recipient_statuses`).

/// Lookup id type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database lookup id.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Resolve a lookup id read from the database.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// Wire name, as seeded in the lookup table.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// How often a program requirement produces schedules.
    RecurrenceType {
        Once = 1 => "once",
        Annual = 2 => "annual",
    }
}

define_status_enum! {
    /// Notification urgency.
    NotificationPriority {
        Low = 1 => "low",
        Medium = 2 => "medium",
        High = 3 => "high",
        Urgent = 4 => "urgent",
    }
}

define_status_enum! {
    /// Delivery state of a notification for one recipient.
    RecipientStatus {
        Pending = 1 => "pending",
        Delivered = 2 => "delivered",
        Read = 3 => "read",
        Failed = 4 => "failed",
        Expired = 5 => "expired",
    }
}

impl Default for RecurrenceType {
    fn default() -> Self {
        Self::Annual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_lookup() {
        assert_eq!(RecurrenceType::from_id(RecurrenceType::Once.id()), Some(RecurrenceType::Once));
        assert_eq!(RecipientStatus::from_id(5), Some(RecipientStatus::Expired));
        assert_eq!(RecipientStatus::from_id(9), None);
    }

    #[test]
    fn wire_names_match_seed_data() {
        assert_eq!(RecurrenceType::Annual.as_str(), "annual");
        assert_eq!(NotificationPriority::Urgent.as_str(), "urgent");
        assert_eq!(RecipientStatus::Read.as_str(), "read");
    }
}
