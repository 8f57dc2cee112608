use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Admin decisions allowed from `self`. Approving is repeatable so a
    /// retried approval is harmless; nothing leaves `Approved` otherwise.
    pub fn can_become(self, next: ApprovalStatus) -> bool {
        use ApprovalStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Rejected, Approved) | (Approved, Approved)
        )
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ApprovalRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: ApprovalStatus,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct ApprovalRequestUserRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: ApprovalStatus,
    pub created_at: OffsetDateTime,
    pub email: String,
    pub name: String,
    pub approved: bool,
}

/// Requester embedded under `userId` in the admin listing of requests.
#[derive(Debug, Serialize)]
pub struct RequesterSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub approved: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequestWithUser {
    pub id: Uuid,
    pub status: ApprovalStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user_id: RequesterSummary,
}

impl From<ApprovalRequestUserRow> for ApprovalRequestWithUser {
    fn from(r: ApprovalRequestUserRow) -> Self {
        Self {
            id: r.id,
            status: r.status,
            created_at: r.created_at,
            user_id: RequesterSummary {
                id: r.user_id,
                email: r.email,
                name: r.name,
                approved: r.approved,
            },
        }
    }
}
