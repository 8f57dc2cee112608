use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{
    ApprovalRequest, ApprovalRequestUserRow, ApprovalRequestWithUser, ApprovalStatus,
};

pub async fn find_pending_for_user(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Option<ApprovalRequest>, sqlx::Error> {
    sqlx::query_as::<_, ApprovalRequest>(
        r#"
        SELECT id, user_id, status, created_at
          FROM approval_requests
         WHERE user_id = $1 AND status = 'pending'
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Fails with a unique violation if the user already has a pending request.
pub async fn insert_pending(db: &PgPool, user_id: Uuid) -> Result<ApprovalRequest, sqlx::Error> {
    sqlx::query_as::<_, ApprovalRequest>(
        r#"
        INSERT INTO approval_requests (user_id)
        VALUES ($1)
        RETURNING id, user_id, status, created_at
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

pub async fn list_with_users(db: &PgPool) -> Result<Vec<ApprovalRequestWithUser>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ApprovalRequestUserRow>(
        r#"
        SELECT r.id, r.user_id, r.status, r.created_at, u.email, u.name, u.approved
          FROM approval_requests r
          JOIN users u ON u.id = r.user_id
         ORDER BY r.created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(ApprovalRequestWithUser::from).collect())
}

async fn lock_request_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<ApprovalRequest>> {
    sqlx::query_as::<_, ApprovalRequest>(
        r#"
        SELECT id, user_id, status, created_at
          FROM approval_requests
         WHERE id = $1
           FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock approval request")
}

async fn set_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: ApprovalStatus,
) -> anyhow::Result<ApprovalRequest> {
    sqlx::query_as::<_, ApprovalRequest>(
        r#"
        UPDATE approval_requests
           SET status = $2
         WHERE id = $1
        RETURNING id, user_id, status, created_at
        "#,
    )
    .bind(id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await
    .context("update approval request status")
}

/// Result of an admin decision on a request.
#[derive(Debug)]
pub enum Decision {
    Applied(ApprovalRequest),
    Missing,
    NotAllowed(ApprovalStatus),
}

/// Moves a request to `next`. Approval also flags the requester as approved;
/// both writes commit together.
pub async fn decide(db: &PgPool, id: Uuid, next: ApprovalStatus) -> anyhow::Result<Decision> {
    let mut tx = db.begin().await.context("begin tx")?;

    let Some(current) = lock_request_tx(&mut tx, id).await? else {
        return Ok(Decision::Missing);
    };
    if !current.status.can_become(next) {
        return Ok(Decision::NotAllowed(current.status));
    }

    let updated = set_status_tx(&mut tx, id, next).await?;
    if next == ApprovalStatus::Approved {
        sqlx::query("UPDATE users SET approved = TRUE, updated_at = now() WHERE id = $1")
            .bind(updated.user_id)
            .execute(&mut *tx)
            .await
            .context("flag user approved")?;
    }

    tx.commit().await.context("commit tx")?;
    Ok(Decision::Applied(updated))
}
