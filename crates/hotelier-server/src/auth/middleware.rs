use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};

use crate::auth::{Identity, TokenService};
use crate::error::{AppError, AppResult};
use crate::models::Role;
use crate::routes::AppState;

/// Resolves the bearer token to an [`Identity`] and attaches it to the request.
///
/// A missing or non-bearer `Authorization` header is rejected with 401; a token
/// that fails verification is rejected with 403.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = bearer.ok().map(|TypedHeader(Authorization(bearer))| bearer);
    let identity = authenticate(&state.tokens, bearer.as_ref())?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Must run inside [`require_auth`].
pub async fn require_admin(
    Extension(identity): Extension<Identity>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&identity, Role::Admin)?;
    Ok(next.run(request).await)
}

pub fn authenticate(tokens: &TokenService, bearer: Option<&Bearer>) -> AppResult<Identity> {
    let token = bearer
        .map(|b| b.token().trim())
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthenticated)?;

    tokens.verify(token).map_err(|_| {
        tracing::debug!("Rejected bearer token");
        AppError::Forbidden
    })
}

pub fn require_role(identity: &Identity, role: Role) -> AppResult<()> {
    if identity.role == role {
        Ok(())
    } else {
        tracing::debug!(user_id = %identity.user_id, required = role.as_str(), "Role check failed");
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use rstest::rstest;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::db;

    async fn whoami(Extension(identity): Extension<Identity>) -> String {
        identity.user_id
    }

    fn test_app() -> (Router, TokenService) {
        let config = Config::for_tests();
        let tokens = TokenService::new(&config.jwt_secret);
        let state = AppState {
            db: db::memory_pool(),
            config,
            tokens: tokens.clone(),
        };
        let app = Router::new()
            .route(
                "/admin-only",
                get(whoami).route_layer(middleware::from_fn(require_admin)),
            )
            .route("/me", get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state);
        (app, tokens)
    }

    async fn status_for(app: Router, uri: &str, authorization: Option<String>) -> StatusCode {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let request = builder.body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_missing_header_is_401() {
        let (app, _) = test_app();
        assert_eq!(status_for(app, "/me", None).await, StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case("Basic dXNlcjpwYXNz")]
    #[case("Bearer ")]
    #[case("Bearer")]
    #[case("Token abc")]
    #[tokio::test]
    async fn test_malformed_credential_is_401(#[case] header: &str) {
        let (app, _) = test_app();
        assert_eq!(
            status_for(app, "/me", Some(header.to_string())).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_invalid_token_is_403() {
        let (app, _) = test_app();
        assert_eq!(
            status_for(app, "/me", Some("Bearer invalid.token.here".into())).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_valid_token_attaches_identity() {
        let (app, tokens) = test_app();
        let token = tokens.issue("user-7", Role::User).unwrap();
        let request = Request::builder()
            .uri("/me")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"user-7");
    }

    #[rstest]
    #[case(Role::User, StatusCode::FORBIDDEN)]
    #[case(Role::Admin, StatusCode::OK)]
    #[tokio::test]
    async fn test_admin_route_requires_exact_admin_role(
        #[case] role: Role,
        #[case] expected: StatusCode,
    ) {
        let (app, tokens) = test_app();
        let token = tokens.issue("someone", role).unwrap();
        assert_eq!(
            status_for(app, "/admin-only", Some(format!("Bearer {token}"))).await,
            expected
        );
    }

    #[test]
    fn test_require_role_is_exact_match() {
        let user = Identity {
            user_id: "u1".into(),
            role: Role::User,
        };
        assert!(matches!(
            require_role(&user, Role::Admin),
            Err(AppError::Forbidden)
        ));
        assert!(require_role(&user, Role::User).is_ok());
    }
}
