//! Session state per account
//!
//! While a session is active, operations on the owner's behalf only record
//! ledger deltas and settlement waits for the session to end. At most one
//! session per account is active at a time.

use crate::error::{ExchangeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use types::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Active,
}

#[derive(Debug, Default)]
pub struct SessionManager {
    active: HashSet<AccountId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle -> Active
    pub fn start(&mut self, account: AccountId) -> Result<()> {
        if !self.active.insert(account) {
            return Err(ExchangeError::SessionAlreadyActive(account));
        }
        Ok(())
    }

    /// Active -> Idle
    pub fn end(&mut self, account: AccountId) -> Result<()> {
        if !self.active.remove(&account) {
            return Err(ExchangeError::NoActiveSession(account));
        }
        Ok(())
    }

    pub fn is_active(&self, account: AccountId) -> bool {
        self.active.contains(&account)
    }

    pub fn state(&self, account: AccountId) -> SessionState {
        if self.is_active(account) {
            SessionState::Active
        } else {
            SessionState::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        let alice = AccountId::from_low_u64_be(1);
        let bob = AccountId::from_low_u64_be(2);
        let mut sessions = SessionManager::new();

        assert_eq!(sessions.state(alice), SessionState::Idle);
        sessions.start(alice).unwrap();
        assert_eq!(sessions.state(alice), SessionState::Active);
        assert!(!sessions.is_active(bob));

        assert!(matches!(
            sessions.start(alice),
            Err(ExchangeError::SessionAlreadyActive(a)) if a == alice
        ));

        sessions.end(alice).unwrap();
        assert!(matches!(sessions.end(alice), Err(ExchangeError::NoActiveSession(_))));
    }
}
