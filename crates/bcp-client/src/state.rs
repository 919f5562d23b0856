//! Runtime lifecycle states.
//!
//! ## Connection
//!
//! ```text
//! Connected -> Disconnected (via disconnect())
//! Connected -> Poisoned     (fatal transport or server error)
//! ```
//!
//! ## Bulk-copy session
//!
//! ```text
//! Uninitialized -> Bound     (columns resolved)
//! Bound         -> Sending   (first row appended)
//! Bound/Sending -> Finalized (via done())
//! ```
//!
//! No transitions leave `Finalized`, `Disconnected` or `Poisoned`.

/// State of a [`Connection`](crate::Connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// The transport is open and usable.
    #[default]
    Connected,
    /// The transport was released by the caller.
    Disconnected,
    /// A fatal error left the transport unusable.
    Poisoned,
}

impl ConnectionState {
    /// Check if the connection is in a usable state.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// State of a [`BulkCopySession`](crate::BulkCopySession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No destination table bound yet.
    #[default]
    Uninitialized,
    /// Columns are bound; no row has reached the transport.
    Bound,
    /// At least one row has been appended.
    Sending,
    /// The session has been finalized.
    Finalized,
}

impl SessionState {
    /// Check if rows may still be sent.
    #[must_use]
    pub fn accepts_rows(&self) -> bool {
        matches!(self, Self::Bound | Self::Sending)
    }

    /// Check if the transport holds an open bulk-copy operation.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Sending)
    }
}
