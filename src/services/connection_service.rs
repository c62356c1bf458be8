//! Connection service - directed requests answered by the recipient

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::auth::Principal;
use crate::db::{ConnectionRecord, Database, FieldMap, Filter, NewConnection, OrderBy};
use crate::policy::{AccessPolicy, Action};
use crate::types::MemberError;

use super::StatusUpdate;

/// Connection request body
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionRequest {
    /// Recipient user id
    pub connection_id: i64,
}

pub struct ConnectionService {
    db: Arc<Database>,
    policy: AccessPolicy,
}

impl ConnectionService {
    pub fn new(db: Arc<Database>, policy: AccessPolicy) -> Self {
        Self { db, policy }
    }

    /// Connections where the principal is requester or recipient
    pub fn list(&self, principal: Principal) -> Result<Vec<ConnectionRecord>, MemberError> {
        let me = principal.user_id();
        let filter = Filter::Any(vec![
            Filter::eq("user_id", me),
            Filter::eq("connection_id", me),
        ]);
        self.db
            .unit_of_work(|uow| uow.find(&filter, &OrderBy::asc("id")))
    }

    /// Send a pending request from the principal to `connection_id`.
    ///
    /// The (requester, recipient) pair is unique whatever its status; the
    /// reverse direction is a separate pair.
    pub fn create(
        &self,
        principal: Principal,
        input: ConnectionRequest,
    ) -> Result<ConnectionRecord, MemberError> {
        let connection = self
            .db
            .unit_of_work(|uow| {
                uow.insert(&NewConnection {
                    user_id: principal.user_id(),
                    connection_id: input.connection_id,
                })
            })
            .map_err(|e| match e {
                MemberError::Conflict(_) => {
                    MemberError::Conflict("Already requested or connected.".into())
                }
                MemberError::NotFound(_) => MemberError::NotFound(format!(
                    "User {} not found",
                    input.connection_id
                )),
                other => other,
            })?;

        info!(
            connection_id = connection.id,
            requester = connection.user_id,
            recipient = connection.connection_id,
            "Connection requested"
        );
        Ok(connection)
    }

    /// Get one connection; visible to its two parties only
    pub fn get(&self, principal: Principal, id: i64) -> Result<ConnectionRecord, MemberError> {
        self.db
            .unit_of_work(|uow| self.policy.load(uow, principal, id, Action::Read))
    }

    /// Recipient accepts or rejects a pending request
    pub fn answer(
        &self,
        principal: Principal,
        id: i64,
        input: StatusUpdate,
    ) -> Result<ConnectionRecord, MemberError> {
        self.db.unit_of_work(|uow| {
            let connection: ConnectionRecord =
                self.policy.load(uow, principal, id, Action::Update)?;
            let next = connection.status.answer(&input.status)?;

            let updated: ConnectionRecord =
                uow.update(id, &FieldMap::new().set("status", next))?;
            info!(
                connection_id = id,
                recipient = principal.user_id(),
                status = %next,
                "Connection answered"
            );
            Ok(updated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ConnectionStatus;
    use crate::services::testing::{member, services};

    fn status(value: &str) -> StatusUpdate {
        StatusUpdate {
            status: value.into(),
        }
    }

    #[test]
    fn test_request_and_accept() {
        let services = services();
        let p1 = member(&services, "p1@test.com");
        let p2 = member(&services, "p2@test.com");

        let conn = services
            .connections
            .create(p1, ConnectionRequest { connection_id: p2.user_id() })
            .unwrap();
        assert_eq!(conn.status, ConnectionStatus::Pending);

        // Requester cannot answer their own request
        let err = services
            .connections
            .answer(p1, conn.id, status("accepted"))
            .unwrap_err();
        assert!(matches!(err, MemberError::Forbidden(_)));

        let accepted = services
            .connections
            .answer(p2, conn.id, status("accepted"))
            .unwrap();
        assert_eq!(accepted.status, ConnectionStatus::Accepted);
        assert_eq!(accepted.created_at, conn.created_at);

        let err = services
            .connections
            .answer(p1, conn.id, status("rejected"))
            .unwrap_err();
        assert!(matches!(err, MemberError::Forbidden(_)));
    }

    #[test]
    fn test_answer_is_final() {
        let services = services();
        let p1 = member(&services, "p1@test.com");
        let p2 = member(&services, "p2@test.com");
        let conn = services
            .connections
            .create(p1, ConnectionRequest { connection_id: p2.user_id() })
            .unwrap();

        services.connections.answer(p2, conn.id, status("rejected")).unwrap();
        let err = services
            .connections
            .answer(p2, conn.id, status("accepted"))
            .unwrap_err();
        assert!(matches!(err, MemberError::InvalidArgument(_)));
        assert_eq!(
            services.connections.get(p2, conn.id).unwrap().status,
            ConnectionStatus::Rejected
        );
    }

    #[test]
    fn test_invalid_answer_value() {
        let services = services();
        let p1 = member(&services, "p1@test.com");
        let p2 = member(&services, "p2@test.com");
        let conn = services
            .connections
            .create(p1, ConnectionRequest { connection_id: p2.user_id() })
            .unwrap();

        for value in ["pending", "maybe"] {
            assert!(matches!(
                services.connections.answer(p2, conn.id, status(value)),
                Err(MemberError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_duplicate_request_conflicts_but_reverse_allowed() {
        let services = services();
        let p1 = member(&services, "p1@test.com");
        let p2 = member(&services, "p2@test.com");

        services
            .connections
            .create(p1, ConnectionRequest { connection_id: p2.user_id() })
            .unwrap();
        let err = services
            .connections
            .create(p1, ConnectionRequest { connection_id: p2.user_id() })
            .unwrap_err();
        assert!(matches!(err, MemberError::Conflict(_)));
        assert_eq!(err.message(), "Already requested or connected.");

        services
            .connections
            .create(p2, ConnectionRequest { connection_id: p1.user_id() })
            .unwrap();
        assert_eq!(services.db.stats().unwrap().connections, 2);
    }

    #[test]
    fn test_unknown_recipient() {
        let services = services();
        let p1 = member(&services, "p1@test.com");
        let err = services
            .connections
            .create(p1, ConnectionRequest { connection_id: 999 })
            .unwrap_err();
        assert!(matches!(err, MemberError::NotFound(_)));
    }

    #[test]
    fn test_list_and_get_scoped_to_parties() {
        let services = services();
        let p1 = member(&services, "p1@test.com");
        let p2 = member(&services, "p2@test.com");
        let p3 = member(&services, "p3@test.com");

        let a = services
            .connections
            .create(p1, ConnectionRequest { connection_id: p2.user_id() })
            .unwrap();
        let b = services
            .connections
            .create(p3, ConnectionRequest { connection_id: p1.user_id() })
            .unwrap();
        services
            .connections
            .create(p2, ConnectionRequest { connection_id: p3.user_id() })
            .unwrap();

        let ids: Vec<i64> = services
            .connections
            .list(p1)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![a.id, b.id]);

        assert!(services.connections.get(p2, a.id).is_ok());
        assert!(matches!(
            services.connections.get(p3, a.id),
            Err(MemberError::Forbidden(_))
        ));
        assert!(matches!(
            services.connections.get(p3, 999),
            Err(MemberError::NotFound(_))
        ));
    }
}
