use uuid::Uuid;

use crate::decks::dto::DeckView;
use crate::decks::repo::{DeckSummary, Score};

/// Label shown when a deck has no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Whether `caller` may see the deck: public decks are world-readable,
/// private ones only exist for their creator.
pub fn can_read(caller: Option<Uuid>, creator_id: Uuid, private: bool) -> bool {
    !private || caller == Some(creator_id)
}

/// Whether `caller` may mutate the deck or its cards. An anonymous caller
/// never can.
pub fn can_write(caller: Option<Uuid>, creator_id: Uuid) -> bool {
    caller == Some(creator_id)
}

/// Best score in a history. `None` on an empty history: never having played
/// is not the same as scoring zero.
pub fn max_hits(scores: &[Score]) -> Option<i32> {
    scores.iter().map(|s| s.hits).max()
}

/// Assembles the response view from a joined summary row and the calling
/// user's scores for that deck (already filtered by the repository). Pure;
/// fetches nothing.
pub fn deck_view(summary: DeckSummary, scores: &[Score]) -> DeckView {
    DeckView {
        id: summary.id,
        name: summary.name,
        category_id: summary.category_id,
        creator_id: summary.creator_id,
        privacy: summary.private,
        num_cards: summary.num_cards,
        category: summary.category.unwrap_or_else(|| UNCATEGORIZED.to_string()),
        creator: summary.creator,
        max_score: max_hits(scores),
        created_at: summary.created_at,
        updated_at: summary.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn summary(creator_id: Uuid, private: bool) -> DeckSummary {
        let now = OffsetDateTime::now_utc();
        DeckSummary {
            id: Uuid::new_v4(),
            name: "Spanish Verbs".into(),
            category_id: Some(Uuid::new_v4()),
            creator_id,
            private,
            category: Some("Languages".into()),
            creator: "maria".into(),
            num_cards: 12,
            created_at: now,
            updated_at: now,
        }
    }

    fn score(deck_id: Uuid, user_id: Uuid, hits: i32) -> Score {
        Score {
            id: Uuid::new_v4(),
            deck_id,
            user_id,
            hits,
            total: 10,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn public_decks_are_readable_by_anyone() {
        let creator = Uuid::new_v4();
        assert!(can_read(None, creator, false));
        assert!(can_read(Some(Uuid::new_v4()), creator, false));
        assert!(can_read(Some(creator), creator, false));
    }

    #[test]
    fn private_decks_are_readable_only_by_creator() {
        let creator = Uuid::new_v4();
        assert!(can_read(Some(creator), creator, true));
        assert!(!can_read(Some(Uuid::new_v4()), creator, true));
        assert!(!can_read(None, creator, true));
    }

    #[test]
    fn only_creator_can_write() {
        let creator = Uuid::new_v4();
        assert!(can_write(Some(creator), creator));
        assert!(!can_write(Some(Uuid::new_v4()), creator));
        assert!(!can_write(None, creator));
    }

    #[test]
    fn max_hits_of_empty_history_is_none() {
        assert_eq!(max_hits(&[]), None);
    }

    #[test]
    fn max_hits_picks_the_maximum() {
        let deck = Uuid::new_v4();
        let user = Uuid::new_v4();
        let scores = [
            score(deck, user, 3),
            score(deck, user, 7),
            score(deck, user, 5),
        ];
        assert_eq!(max_hits(&scores), Some(7));
    }

    #[test]
    fn max_hits_of_zero_hit_attempt_is_zero_not_none() {
        let scores = [score(Uuid::new_v4(), Uuid::new_v4(), 0)];
        assert_eq!(max_hits(&scores), Some(0));
    }

    #[test]
    fn view_carries_joined_fields_through() {
        let creator = Uuid::new_v4();
        let s = summary(creator, false);
        let deck_id = s.id;
        let user = Uuid::new_v4();
        let scores = [score(deck_id, user, 8), score(deck_id, user, 4)];

        let view = deck_view(s, &scores);
        assert_eq!(view.creator_id, creator);
        assert_eq!(view.category, "Languages");
        assert_eq!(view.creator, "maria");
        assert_eq!(view.num_cards, 12);
        assert_eq!(view.max_score, Some(8));
        assert!(!view.privacy);
    }

    #[test]
    fn view_without_scores_has_no_max_score() {
        let view = deck_view(summary(Uuid::new_v4(), true), &[]);
        assert_eq!(view.max_score, None);
        assert!(view.privacy);
    }

    #[test]
    fn view_falls_back_to_uncategorized() {
        let mut s = summary(Uuid::new_v4(), false);
        s.category = None;
        s.category_id = None;
        let view = deck_view(s, &[]);
        assert_eq!(view.category, UNCATEGORIZED);
        assert_eq!(view.category_id, None);
    }
}
