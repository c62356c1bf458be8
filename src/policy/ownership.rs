//! Per-record ownership rules
//!
//! | Record       | Read                 | Update                               | Delete |
//! |--------------|----------------------|--------------------------------------|--------|
//! | User         | self                 | self                                 | never  |
//! | Profile      | any principal        | owner                                | never  |
//! | Connection   | requester, recipient | recipient                            | never  |
//! | Referral     | any principal        | any principal (parties if restricted)| never  |
//! | Meeting      | owner                | owner                                | owner  |
//! | Notification | owner                | owner                                | never  |

use std::fmt;

use super::AccessPolicy;
use crate::auth::Principal;
use crate::db::{ConnectionRecord, Meeting, Notification, Profile, Record, Referral, User};

/// Operation a principal attempts on a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A record whose access depends on who is asking
pub trait Guarded: Record {
    fn permits(&self, principal: Principal, action: Action, policy: &AccessPolicy) -> bool;
}

impl Guarded for User {
    fn permits(&self, principal: Principal, action: Action, _: &AccessPolicy) -> bool {
        action != Action::Delete && self.id == principal.user_id()
    }
}

impl Guarded for Profile {
    fn permits(&self, principal: Principal, action: Action, _: &AccessPolicy) -> bool {
        match action {
            Action::Read => true,
            Action::Update => self.user_id == principal.user_id(),
            Action::Delete => false,
        }
    }
}

impl Guarded for ConnectionRecord {
    fn permits(&self, principal: Principal, action: Action, _: &AccessPolicy) -> bool {
        match action {
            Action::Read => self.involves(principal.user_id()),
            Action::Update => self.connection_id == principal.user_id(),
            Action::Delete => false,
        }
    }
}

impl Guarded for Referral {
    fn permits(&self, principal: Principal, action: Action, policy: &AccessPolicy) -> bool {
        match action {
            Action::Read => true,
            Action::Update if policy.restrict_referral_updates => {
                self.involves(principal.user_id())
            }
            Action::Update => true,
            Action::Delete => false,
        }
    }
}

impl Guarded for Meeting {
    fn permits(&self, principal: Principal, _: Action, _: &AccessPolicy) -> bool {
        self.user_id == principal.user_id()
    }
}

impl Guarded for Notification {
    fn permits(&self, principal: Principal, action: Action, _: &AccessPolicy) -> bool {
        action != Action::Delete && self.user_id == principal.user_id()
    }
}
