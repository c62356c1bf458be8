//! SQLite persistence for memberhub
//!
//! ## Tables
//!
//! - `users` - Registered identities (email unique, Argon2 hash)
//! - `profiles` - At most one per user
//! - `connections` - Directed requests, unique per (requester, recipient)
//! - `referrals` - Business referrals between two users
//! - `meetings` - Owner-scoped meetings
//! - `notifications` - Owner-scoped messages with a read flag
//!
//! All access goes through [`Database::unit_of_work`], which hands the
//! caller a transaction-scoped [`UnitOfWork`].

pub mod models;
pub mod schema;
pub mod store;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::types::MemberError;

pub use models::{
    Connection as ConnectionRecord, Meeting, NewConnection, NewMeeting, NewNotification,
    NewProfile, NewReferral, NewUser, Notification, Profile, Referral, User,
};
pub use store::{FieldMap, Filter, Insertable, OrderBy, Record, UnitOfWork};

/// Path value that selects an in-memory database
pub const IN_MEMORY: &str = ":memory:";

/// SQLite database shared by every service
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database at `path` (`:memory:` for a private
    /// in-memory database)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MemberError> {
        let path = path.as_ref();
        if path.as_os_str() == IN_MEMORY {
            return Self::open_in_memory();
        }

        info!("Opening SQLite database at {:?}", path);
        let conn = Connection::open(path)
            .map_err(|e| MemberError::Database(format!("Failed to open SQLite: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| MemberError::Database(format!("Failed to set PRAGMA: {e}")))?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, MemberError> {
        debug!("Opening in-memory SQLite database");
        let conn = Connection::open_in_memory()
            .map_err(|e| MemberError::Database(format!("Failed to open in-memory SQLite: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, MemberError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| MemberError::Database(format!("Failed to enable foreign keys: {e}")))?;
        schema::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls back every write `f`
    /// made.
    pub fn unit_of_work<F, T>(&self, f: F) -> Result<T, MemberError>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, MemberError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| MemberError::Internal(format!("Lock poisoned: {e}")))?;

        let uow = UnitOfWork::new(conn.transaction()?);
        let value = f(&uow)?;
        uow.commit()?;
        Ok(value)
    }

    /// Row counts per table; also serves as the liveness probe
    pub fn stats(&self) -> Result<DbStats, MemberError> {
        self.unit_of_work(|uow| {
            Ok(DbStats {
                users: uow.count::<User>(&Filter::All)?,
                profiles: uow.count::<Profile>(&Filter::All)?,
                connections: uow.count::<ConnectionRecord>(&Filter::All)?,
                referrals: uow.count::<Referral>(&Filter::All)?,
                meetings: uow.count::<Meeting>(&Filter::All)?,
                notifications: uow.count::<Notification>(&Filter::All)?,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DbStats {
    pub users: u64,
    pub profiles: u64,
    pub connections: u64,
    pub referrals: u64,
    pub meetings: u64,
    pub notifications: u64,
}
