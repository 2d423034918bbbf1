//! Well-known notification channel name constants.
//!
//! These must match the channel values recorded in
//! `notification_recipients` and referenced by the notification router and
//! the push delivery service.

/// In-app notification stored for the notification list in the student portal.
pub const CHANNEL_IN_APP: &str = "in_app";

/// LINE messenger push message.
pub const CHANNEL_LINE: &str = "line_app";
