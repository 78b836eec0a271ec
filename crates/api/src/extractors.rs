//! Request extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use domain::models::Actor;

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_LABEL_HEADER: &str = "x-actor-label";

/// Caller identity for audit attribution, taken from trusted gateway headers.
///
/// `X-Actor-Id` must be a UUID; `X-Actor-Label` is a human-readable name
/// (typically an email) and defaults to the id when absent.
#[derive(Debug, Clone)]
pub struct ActorIdentity(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for ActorIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id_header = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing X-Actor-Id header".into()))?;

        let id: Uuid = id_header
            .parse()
            .map_err(|_| ApiError::Unauthorized("X-Actor-Id is not a valid UUID".into()))?;

        let label = parts
            .headers
            .get(ACTOR_LABEL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string());

        Ok(ActorIdentity(Actor::new(id, label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<ActorIdentity, ApiError> {
        let (mut parts, _) = req.into_parts();
        ActorIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_actor_from_headers() {
        let id = Uuid::new_v4();
        let req = Request::builder()
            .header("X-Actor-Id", id.to_string())
            .header("X-Actor-Label", "ops@example.com")
            .body(())
            .unwrap();

        let ActorIdentity(actor) = extract(req).await.expect("extraction failed");
        assert_eq!(actor.id, id);
        assert_eq!(actor.label, "ops@example.com");
    }

    #[tokio::test]
    async fn test_label_defaults_to_id() {
        let id = Uuid::new_v4();
        let req = Request::builder()
            .header("X-Actor-Id", id.to_string())
            .body(())
            .unwrap();

        let ActorIdentity(actor) = extract(req).await.expect("extraction failed");
        assert_eq!(actor.label, id.to_string());
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let req = Request::builder().body(()).unwrap();
        let result = extract(req).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_invalid_uuid_is_unauthorized() {
        let req = Request::builder()
            .header("X-Actor-Id", "not-a-uuid")
            .body(())
            .unwrap();
        let result = extract(req).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }
}
