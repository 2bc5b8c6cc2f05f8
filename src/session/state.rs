//! Wallet session state
//!
//! `connected` is derived from `address`, and the contract handle can only
//! be installed together with an address, so the session can't disagree
//! with itself.

use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected,
}

pub struct WalletSession<C> {
    address: Option<String>,
    contract: Option<Arc<C>>,
    connecting: bool,
}

impl<C> Default for WalletSession<C> {
    fn default() -> Self {
        Self {
            address: None,
            contract: None,
            connecting: false,
        }
    }
}

impl<C> WalletSession<C> {
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn contract(&self) -> Option<Arc<C>> {
        self.contract.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.address.is_some() {
            SessionPhase::Connected
        } else if self.connecting {
            SessionPhase::Connecting
        } else {
            SessionPhase::Disconnected
        }
    }

    pub fn begin_connect(&mut self) {
        self.connecting = true;
    }

    /// Connection attempt failed; a prior connection (if any) is kept
    pub fn abort_connect(&mut self) {
        self.connecting = false;
    }

    pub fn establish(&mut self, address: String, contract: Option<Arc<C>>) {
        self.address = Some(address);
        self.contract = contract;
        self.connecting = false;
    }

    pub fn reset(&mut self) {
        self.address = None;
        self.contract = None;
        self.connecting = false;
    }

    /// Whether `address` is the connected account (addresses compare case-insensitively)
    pub fn is_current(&self, address: &str) -> bool {
        self.address
            .as_deref()
            .is_some_and(|current| current.eq_ignore_ascii_case(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariant(session: &WalletSession<()>) {
        assert_eq!(session.is_connected(), session.address().is_some());
        if session.contract().is_some() {
            assert!(session.is_connected());
        }
    }

    #[test]
    fn test_phase_transitions_hold_invariant() {
        let mut session = WalletSession::<()>::default();
        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert_invariant(&session);

        session.begin_connect();
        assert_eq!(session.phase(), SessionPhase::Connecting);
        assert!(!session.is_connected());
        assert_invariant(&session);

        session.establish("0xAbC".to_string(), Some(Arc::new(())));
        assert_eq!(session.phase(), SessionPhase::Connected);
        assert_invariant(&session);
        assert!(session.is_current("0xabc"));

        session.reset();
        assert_eq!(session.phase(), SessionPhase::Disconnected);
        assert!(session.contract().is_none());
        assert_invariant(&session);
    }

    #[test]
    fn test_abort_keeps_previous_connection() {
        let mut session = WalletSession::<()>::default();
        session.establish("0x1".to_string(), None);
        session.begin_connect();
        session.abort_connect();
        assert_eq!(session.phase(), SessionPhase::Connected);
        assert_eq!(session.address(), Some("0x1"));
    }
}
