use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use domain::services::LifecycleError;
use persistence::repositories::LifecycleRepoError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg.clone(),
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<LifecycleRepoError> for ApiError {
    fn from(err: LifecycleRepoError) -> Self {
        match err {
            LifecycleRepoError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            LifecycleRepoError::Lifecycle(e) => match e {
                LifecycleError::ReturnDateBeforeDelivery { .. } => {
                    ApiError::Validation(e.to_string())
                }
                other => ApiError::Conflict(other.to_string()),
            },
            LifecycleRepoError::Db(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
                })
            })
            .collect();

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use domain::models::DeviceStatus;
    use domain::services::TransitionError;
    use uuid::Uuid;

    #[test]
    fn test_api_error_not_found() {
        let error = ApiError::NotFound("resource not found".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_api_error_conflict() {
        let error = ApiError::Conflict("already exists".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_api_error_validation() {
        let error = ApiError::Validation("invalid field".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_lifecycle_not_found_maps_to_404() {
        let error: ApiError = LifecycleRepoError::NotFound("device").into();
        assert!(matches!(error, ApiError::NotFound(_)));
    }

    #[test]
    fn test_lifecycle_conflict_maps_to_409() {
        let error: ApiError = LifecycleRepoError::Lifecycle(LifecycleError::DeviceUnavailable {
            device_id: Uuid::new_v4(),
            status: DeviceStatus::Asignado,
        })
        .into();
        assert!(matches!(error, ApiError::Conflict(_)));
    }

    #[test]
    fn test_terminal_transition_maps_to_409() {
        let error: ApiError = LifecycleRepoError::Lifecycle(
            TransitionError::Terminal {
                current: DeviceStatus::Baja,
            }
            .into(),
        )
        .into();
        assert!(matches!(error, ApiError::Conflict(_)));
    }

    #[test]
    fn test_return_date_validation_maps_to_400() {
        use chrono::NaiveDate;
        let error: ApiError =
            LifecycleRepoError::Lifecycle(LifecycleError::ReturnDateBeforeDelivery {
                return_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                delivery_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            })
            .into();
        assert!(matches!(error, ApiError::Validation(_)));
    }
}
