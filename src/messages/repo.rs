use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Conversation, ConversationRow, Message};

/// Conversations the user takes part in, most recent activity first.
pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Conversation>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT id, participant_a, participant_b, created_at, updated_at
          FROM conversations
         WHERE participant_a = $1 OR participant_b = $1
         ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(Conversation::from).collect())
}

pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<ConversationRow>, sqlx::Error> {
    sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT id, participant_a, participant_b, created_at, updated_at
          FROM conversations
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Returns the conversation for an ordered pair, creating it first if needed.
/// Concurrent callers converge on the row guarded by the pair's unique index.
pub async fn get_or_create(db: &PgPool, pair: (Uuid, Uuid)) -> anyhow::Result<ConversationRow> {
    sqlx::query(
        r#"
        INSERT INTO conversations (participant_a, participant_b)
        VALUES ($1, $2)
        ON CONFLICT (participant_a, participant_b) DO NOTHING
        "#,
    )
    .bind(pair.0)
    .bind(pair.1)
    .execute(db)
    .await
    .context("insert conversation")?;

    sqlx::query_as::<_, ConversationRow>(
        r#"
        SELECT id, participant_a, participant_b, created_at, updated_at
          FROM conversations
         WHERE participant_a = $1 AND participant_b = $2
        "#,
    )
    .bind(pair.0)
    .bind(pair.1)
    .fetch_one(db)
    .await
    .context("load conversation")
}

/// Messages oldest first.
pub async fn list_messages(db: &PgPool, conversation_id: Uuid) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, sender_id, content, created_at
          FROM messages
         WHERE conversation_id = $1
         ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(db)
    .await
}

/// Appends a message and bumps the conversation's activity time in one
/// transaction.
pub async fn append_message(
    db: &PgPool,
    conversation_id: Uuid,
    sender_id: Uuid,
    content: &str,
) -> anyhow::Result<Message> {
    let mut tx = db.begin().await.context("begin tx")?;

    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (conversation_id, sender_id, content)
        VALUES ($1, $2, $3)
        RETURNING id, conversation_id, sender_id, content, created_at
        "#,
    )
    .bind(conversation_id)
    .bind(sender_id)
    .bind(content)
    .fetch_one(&mut *tx)
    .await
    .context("insert message")?;

    sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
        .bind(conversation_id)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .context("bump conversation")?;

    tx.commit().await.context("commit tx")?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use tokio::task::JoinSet;

    use super::*;
    use crate::{
        auth::repo_types::Role,
        messages::services::participant_pair,
        test_support::{live_state, seed_user},
    };

    #[tokio::test]
    async fn either_order_resolves_to_one_conversation() {
        let Some(state) = live_state().await else { return };
        let (a, _) = seed_user(&state, Role::User).await;
        let (b, _) = seed_user(&state, Role::User).await;

        let ab = get_or_create(&state.db, participant_pair(a, b).unwrap())
            .await
            .unwrap();
        let ba = get_or_create(&state.db, participant_pair(b, a).unwrap())
            .await
            .unwrap();
        assert_eq!(ab.id, ba.id);
        assert!(ab.has_participant(a) && ab.has_participant(b));
    }

    #[tokio::test]
    async fn concurrent_first_contact_converges() {
        let Some(state) = live_state().await else { return };
        let (a, _) = seed_user(&state, Role::User).await;
        let (b, _) = seed_user(&state, Role::User).await;

        let mut opens = JoinSet::new();
        for i in 0..8 {
            let db = state.db.clone();
            let pair = if i % 2 == 0 { (a, b) } else { (b, a) };
            opens.spawn(async move {
                let pair = participant_pair(pair.0, pair.1).unwrap();
                get_or_create(&db, pair).await.unwrap().id
            });
        }
        let mut ids = Vec::new();
        while let Some(id) = opens.join_next().await {
            ids.push(id.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(list_for_user(&state.db, a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn messages_come_back_oldest_first() {
        let Some(state) = live_state().await else { return };
        let (a, _) = seed_user(&state, Role::User).await;
        let (b, _) = seed_user(&state, Role::User).await;
        let conversation = get_or_create(&state.db, participant_pair(a, b).unwrap())
            .await
            .unwrap();

        let first = append_message(&state.db, conversation.id, a, "Is it free?")
            .await
            .unwrap();
        let second = append_message(&state.db, conversation.id, b, "Yes")
            .await
            .unwrap();

        let messages = list_messages(&state.db, conversation.id).await.unwrap();
        let ids: Vec<Uuid> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, [first.id, second.id]);

        let bumped = find(&state.db, conversation.id).await.unwrap().unwrap();
        assert_eq!(bumped.updated_at, second.created_at);
    }
}
