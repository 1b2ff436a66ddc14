use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::services::{AuthUser, MaybeUser},
    error::ApiError,
    state::AppState,
};

use super::dto::{
    CardPayload, DeckPayload, DeckSearch, DeckView, DeleteConfirmation, MaxScoreResponse,
    Pagination, ScorePayload,
};
use super::repo::{Card, Category, Deck, DeckSummary, Score};
use super::services;

pub fn deck_routes() -> Router<AppState> {
    Router::new()
        .route("/decks", get(list_decks).post(create_deck))
        .route(
            "/decks/:id",
            get(get_deck).put(update_deck).delete(delete_deck),
        )
        .route("/decks/:id/cards", get(list_cards).post(create_card))
        .route("/cards/:id", put(update_card).delete(delete_card))
        .route("/categories", get(list_categories))
}

pub fn study_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me/decks", get(list_owned_decks))
        .route("/users/me/decks/:id/scores", post(record_score))
}

/// Fetches the caller's scores for a page of decks in one query and runs each
/// summary through the composer.
async fn compose_views(
    db: &PgPool,
    summaries: Vec<DeckSummary>,
    caller: Option<Uuid>,
) -> Result<Vec<DeckView>, ApiError> {
    let scores = match caller {
        Some(user_id) if !summaries.is_empty() => {
            let deck_ids: Vec<Uuid> = summaries.iter().map(|s| s.id).collect();
            Score::for_user_decks(db, user_id, deck_ids).await?
        }
        _ => Vec::new(),
    };

    let mut by_deck: HashMap<Uuid, Vec<Score>> = HashMap::new();
    for score in scores {
        by_deck.entry(score.deck_id).or_default().push(score);
    }

    Ok(summaries
        .into_iter()
        .map(|summary| {
            let scores = by_deck.remove(&summary.id).unwrap_or_default();
            services::deck_view(summary, &scores)
        })
        .collect())
}

/// Loads a deck or reports it missing. Invisible private decks take the same
/// branch: read denials never reveal that the deck exists.
async fn visible_deck(db: &PgPool, id: Uuid, caller: Option<Uuid>) -> Result<Deck, ApiError> {
    let deck = Deck::find(db, id)
        .await?
        .ok_or_else(|| ApiError::deck_not_found(id))?;
    if !services::can_read(caller, deck.creator_id, deck.private) {
        return Err(ApiError::deck_not_found(id));
    }
    Ok(deck)
}

// --- decks ---

#[instrument(skip(state))]
pub async fn list_decks(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Query(search): Query<DeckSearch>,
) -> Result<Json<Vec<DeckView>>, ApiError> {
    let summaries =
        Deck::list_public(&state.db, &search.q, search.limit, search.offset).await?;
    let views = compose_views(&state.db, summaries, caller).await?;
    Ok(Json(views))
}

#[instrument(skip(state, payload))]
pub async fn create_deck(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<DeckPayload>,
) -> Result<(StatusCode, Json<Deck>), ApiError> {
    payload.validate()?;
    let deck = Deck::insert(
        &state.db,
        payload.name.trim(),
        payload.category_id,
        payload.private,
        user_id,
    )
    .await?;
    info!(deck_id = %deck.id, creator_id = %user_id, "deck created");
    Ok((StatusCode::CREATED, Json(deck)))
}

#[instrument(skip(state))]
pub async fn get_deck(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeckView>, ApiError> {
    let summary = Deck::summarize(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::deck_not_found(id))?;
    if !services::can_read(caller, summary.creator_id, summary.private) {
        return Err(ApiError::deck_not_found(id));
    }

    let scores = match caller {
        Some(user_id) => Score::for_user_deck(&state.db, user_id, id).await?,
        None => Vec::new(),
    };
    Ok(Json(services::deck_view(summary, &scores)))
}

#[instrument(skip(state, payload))]
pub async fn update_deck(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeckPayload>,
) -> Result<Json<Deck>, ApiError> {
    let deck = Deck::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::deck_not_found(id))?;
    if !services::can_write(Some(user_id), deck.creator_id) {
        return Err(ApiError::unauthorized(
            "You are not authorized to edit this deck.",
        ));
    }
    payload.validate()?;

    let deck = Deck::update(
        &state.db,
        id,
        payload.name.trim(),
        payload.category_id,
        payload.private,
    )
    .await?;
    info!(deck_id = %deck.id, "deck updated");
    Ok(Json(deck))
}

#[instrument(skip(state))]
pub async fn delete_deck(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteConfirmation>, ApiError> {
    let deck = Deck::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::deck_not_found(id))?;
    if !services::can_write(Some(user_id), deck.creator_id) {
        return Err(ApiError::unauthorized(
            "You are not authorized to delete this deck.",
        ));
    }

    Deck::delete_with_children(&state.db, id).await?;
    info!(deck_id = %id, "deck deleted");
    Ok(Json(DeleteConfirmation {
        message: format!("Deleted deck with id of {id}."),
    }))
}

// --- cards ---

#[instrument(skip(state))]
pub async fn list_cards(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<HashMap<Uuid, Card>>, ApiError> {
    visible_deck(&state.db, id, caller).await?;
    let cards = Card::for_deck(&state.db, id).await?;
    Ok(Json(cards.into_iter().map(|c| (c.id, c)).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_card(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CardPayload>,
) -> Result<(StatusCode, Json<Card>), ApiError> {
    payload.validate()?;
    let deck = Deck::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::deck_not_found(id))?;
    if !services::can_write(Some(user_id), deck.creator_id) {
        return Err(ApiError::unauthorized(
            "You are not authorized to add cards to this deck.",
        ));
    }

    let card = Card::insert(&state.db, id, payload.front.trim(), payload.back.trim()).await?;
    info!(card_id = %card.id, deck_id = %id, "card created");
    Ok((StatusCode::CREATED, Json(card)))
}

/// Resolves a card and checks write access on its owning deck.
async fn owned_card(db: &PgPool, card_id: Uuid, user_id: Uuid) -> Result<Card, ApiError> {
    let card = Card::find(db, card_id)
        .await?
        .ok_or_else(|| ApiError::card_not_found(card_id))?;
    let deck = Deck::find(db, card.deck_id)
        .await?
        .ok_or_else(|| ApiError::deck_not_found(card.deck_id))?;
    if !services::can_write(Some(user_id), deck.creator_id) {
        return Err(ApiError::unauthorized(
            "You are not authorized to edit cards in this deck.",
        ));
    }
    Ok(card)
}

#[instrument(skip(state, payload))]
pub async fn update_card(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CardPayload>,
) -> Result<Json<Card>, ApiError> {
    payload.validate()?;
    owned_card(&state.db, id, user_id).await?;
    let card = Card::update(&state.db, id, payload.front.trim(), payload.back.trim()).await?;
    info!(card_id = %card.id, "card updated");
    Ok(Json(card))
}

#[instrument(skip(state))]
pub async fn delete_card(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteConfirmation>, ApiError> {
    owned_card(&state.db, id, user_id).await?;
    Card::delete(&state.db, id).await?;
    info!(card_id = %id, "card deleted");
    Ok(Json(DeleteConfirmation {
        message: format!("Deleted card with id of {id}."),
    }))
}

// --- own collection & scores ---

#[instrument(skip(state))]
pub async fn list_owned_decks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<DeckView>>, ApiError> {
    let summaries = Deck::list_owned(&state.db, user_id, page.limit, page.offset).await?;
    let views = compose_views(&state.db, summaries, Some(user_id)).await?;
    Ok(Json(views))
}

#[instrument(skip(state, payload))]
pub async fn record_score(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScorePayload>,
) -> Result<(StatusCode, Json<MaxScoreResponse>), ApiError> {
    payload.validate()?;
    visible_deck(&state.db, id, Some(user_id)).await?;

    let score = Score::insert(&state.db, id, user_id, payload.hits, payload.total).await?;
    info!(deck_id = %id, user_id = %user_id, hits = score.hits, total = score.total, "score recorded");

    // Best score over the caller's own history, the just-inserted row included.
    let history = Score::for_user_deck(&state.db, user_id, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(MaxScoreResponse {
            max_score: services::max_hits(&history),
        }),
    ))
}

// --- categories ---

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = Category::list(&state.db).await?;
    Ok(Json(categories))
}
