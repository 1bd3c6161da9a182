//! Outcomes reported by the session machine

use mycel_util::ClientId;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// A minute ping left no time
    TimeExhausted,
    /// The patron pressed logout
    LoggedOut,
    /// The channel pump stopped delivering signals
    ChannelLost,
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub client_id: ClientId,
    pub user: String,
    pub granted: i64,
    pub extra: i64,
    /// Last remaining-minutes value shown to the patron
    pub last_remaining: i64,
    pub reason: EndReason,
    /// Log-on handshakes completed, reconnects included
    pub activations: u64,
}
