use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Deck {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub private: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Deck row joined with its category label, creator username and card count.
/// Input to the view composer; never serialized as-is.
#[derive(Debug, Clone, FromRow)]
pub struct DeckSummary {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub creator_id: Uuid,
    pub private: bool,
    pub category: Option<String>,
    pub creator: String,
    pub num_cards: i64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Score {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub user_id: Uuid,
    pub hits: i32,
    pub total: i32,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub label: String,
}

const DECK_SUMMARY_SELECT: &str = r#"
    SELECT d.id, d.name, d.category_id, d.creator_id, d.private,
           d.created_at, d.updated_at,
           c.label AS category,
           u.username AS creator,
           (SELECT COUNT(*) FROM cards WHERE cards.deck_id = d.id) AS num_cards
    FROM decks d
    JOIN users u ON u.id = d.creator_id
    LEFT JOIN categories c ON c.id = d.category_id
"#;

impl Deck {
    pub async fn find(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Deck>> {
        sqlx::query_as::<_, Deck>(
            r#"
            SELECT id, name, category_id, creator_id, private, created_at, updated_at
            FROM decks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Public decks whose name contains `q` case-insensitively (empty matches
    /// all), newest first.
    pub async fn list_public(
        db: &PgPool,
        q: &str,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<DeckSummary>> {
        let sql = format!(
            "{DECK_SUMMARY_SELECT}
            WHERE d.private = FALSE AND d.name ILIKE '%' || $1 || '%'
            ORDER BY d.created_at DESC, d.id
            LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, DeckSummary>(&sql)
            .bind(q)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
    }

    /// Every deck the owner created, private ones included.
    pub async fn list_owned(
        db: &PgPool,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<DeckSummary>> {
        let sql = format!(
            "{DECK_SUMMARY_SELECT}
            WHERE d.creator_id = $1
            ORDER BY d.created_at DESC, d.id
            LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, DeckSummary>(&sql)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await
    }

    pub async fn summarize(db: &PgPool, id: Uuid) -> sqlx::Result<Option<DeckSummary>> {
        let sql = format!("{DECK_SUMMARY_SELECT} WHERE d.id = $1");
        sqlx::query_as::<_, DeckSummary>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn insert(
        db: &PgPool,
        name: &str,
        category_id: Option<Uuid>,
        private: bool,
        creator_id: Uuid,
    ) -> sqlx::Result<Deck> {
        sqlx::query_as::<_, Deck>(
            r#"
            INSERT INTO decks (name, category_id, creator_id, private)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, category_id, creator_id, private, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(category_id)
        .bind(creator_id)
        .bind(private)
        .fetch_one(db)
        .await
    }

    /// Overwrites the three mutable fields; `creator_id` never changes.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: &str,
        category_id: Option<Uuid>,
        private: bool,
    ) -> sqlx::Result<Deck> {
        sqlx::query_as::<_, Deck>(
            r#"
            UPDATE decks
            SET name = $2, category_id = $3, private = $4, updated_at = now()
            WHERE id = $1
            RETURNING id, name, category_id, creator_id, private, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(category_id)
        .bind(private)
        .fetch_one(db)
        .await
    }

    /// Deletes the deck together with its cards and score history in one
    /// transaction, so the cascade commits atomically or not at all.
    pub async fn delete_with_children(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM scores WHERE deck_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM cards WHERE deck_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM decks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }
}

impl Card {
    pub async fn find(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Card>> {
        sqlx::query_as::<_, Card>(
            r#"
            SELECT id, deck_id, front, back, created_at
            FROM cards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn for_deck(db: &PgPool, deck_id: Uuid) -> sqlx::Result<Vec<Card>> {
        sqlx::query_as::<_, Card>(
            r#"
            SELECT id, deck_id, front, back, created_at
            FROM cards
            WHERE deck_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(deck_id)
        .fetch_all(db)
        .await
    }

    pub async fn insert(db: &PgPool, deck_id: Uuid, front: &str, back: &str) -> sqlx::Result<Card> {
        sqlx::query_as::<_, Card>(
            r#"
            INSERT INTO cards (deck_id, front, back)
            VALUES ($1, $2, $3)
            RETURNING id, deck_id, front, back, created_at
            "#,
        )
        .bind(deck_id)
        .bind(front)
        .bind(back)
        .fetch_one(db)
        .await
    }

    pub async fn update(db: &PgPool, id: Uuid, front: &str, back: &str) -> sqlx::Result<Card> {
        sqlx::query_as::<_, Card>(
            r#"
            UPDATE cards
            SET front = $2, back = $3
            WHERE id = $1
            RETURNING id, deck_id, front, back, created_at
            "#,
        )
        .bind(id)
        .bind(front)
        .bind(back)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

impl Score {
    /// Append-only: scores are only ever inserted, never updated or deleted.
    pub async fn insert(
        db: &PgPool,
        deck_id: Uuid,
        user_id: Uuid,
        hits: i32,
        total: i32,
    ) -> sqlx::Result<Score> {
        sqlx::query_as::<_, Score>(
            r#"
            INSERT INTO scores (deck_id, user_id, hits, total)
            VALUES ($1, $2, $3, $4)
            RETURNING id, deck_id, user_id, hits, total, created_at
            "#,
        )
        .bind(deck_id)
        .bind(user_id)
        .bind(hits)
        .bind(total)
        .fetch_one(db)
        .await
    }

    /// One user's full score history for one deck.
    pub async fn for_user_deck(
        db: &PgPool,
        user_id: Uuid,
        deck_id: Uuid,
    ) -> sqlx::Result<Vec<Score>> {
        sqlx::query_as::<_, Score>(
            r#"
            SELECT id, deck_id, user_id, hits, total, created_at
            FROM scores
            WHERE user_id = $1 AND deck_id = $2
            "#,
        )
        .bind(user_id)
        .bind(deck_id)
        .fetch_all(db)
        .await
    }

    /// Batch variant for list composition: the caller's scores across a page
    /// of decks.
    pub async fn for_user_decks(
        db: &PgPool,
        user_id: Uuid,
        deck_ids: Vec<Uuid>,
    ) -> sqlx::Result<Vec<Score>> {
        sqlx::query_as::<_, Score>(
            r#"
            SELECT id, deck_id, user_id, hits, total, created_at
            FROM scores
            WHERE user_id = $1 AND deck_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(deck_ids)
        .fetch_all(db)
        .await
    }
}

impl Category {
    pub async fn list(db: &PgPool) -> sqlx::Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, label
            FROM categories
            ORDER BY label
            "#,
        )
        .fetch_all(db)
        .await
    }
}
