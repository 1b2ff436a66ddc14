use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Wire shape of every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub title: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation { errors: Vec<String> },

    #[error("{title}")]
    NotFound { title: String, errors: Vec<String> },

    #[error("unauthorized")]
    Unauthorized { errors: Vec<String> },

    #[error("conflict")]
    Conflict { errors: Vec<String> },

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            errors: vec![message.into()],
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            errors: vec![message.into()],
        }
    }

    pub fn deck_not_found(id: Uuid) -> Self {
        Self::NotFound {
            title: "Deck not found.".into(),
            errors: vec![format!("Deck with id of {id} could not be found.")],
        }
    }

    pub fn card_not_found(id: Uuid) -> Self {
        Self::NotFound {
            title: "Card not found.".into(),
            errors: vec![format!("Card with id of {id} could not be found.")],
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (title, errors) = match self {
            Self::Validation { errors } => ("Validation error.".to_string(), errors),
            Self::NotFound { title, errors } => (title, errors),
            Self::Unauthorized { errors } => ("Unauthorized".to_string(), errors),
            Self::Conflict { errors } => ("Conflict".to_string(), errors),
            Self::Database(e) => {
                error!(error = %e, "database failure");
                (
                    "Internal server error.".to_string(),
                    vec!["An unexpected error occurred.".to_string()],
                )
            }
            Self::Internal(e) => {
                error!(error = %e, "internal failure");
                (
                    "Internal server error.".to_string(),
                    vec!["An unexpected error occurred.".to_string()],
                )
            }
        };

        let body = ErrorBody {
            status: status.as_u16(),
            title,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            ApiError::validation(vec!["name: must not be empty".into()]).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::deck_not_found(Uuid::new_v4()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::unauthorized("nope").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::conflict("taken").status(), StatusCode::CONFLICT);
    }

    #[test]
    fn deck_not_found_keeps_id_in_message() {
        let id = Uuid::new_v4();
        let err = ApiError::deck_not_found(id);
        let ApiError::NotFound { title, errors } = err else {
            panic!("expected NotFound");
        };
        assert_eq!(title, "Deck not found.");
        assert_eq!(errors, vec![format!("Deck with id of {id} could not be found.")]);
    }

    #[test]
    fn error_body_serializes_status_title_errors() {
        let body = ErrorBody {
            status: 422,
            title: "Validation error.".into(),
            errors: vec!["front: must not be empty".into()],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], 422);
        assert_eq!(json["title"], "Validation error.");
        assert_eq!(json["errors"][0], "front: must not be empty");
    }

    #[test]
    fn database_errors_render_as_generic_500() {
        let err = ApiError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
