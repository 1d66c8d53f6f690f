use axum::{
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use wave_types::api::Claims;

/// Signing secret for session tokens. Falls back to a development value so
/// a bare checkout still runs; deployments set `WAVE_JWT_SECRET`.
pub fn jwt_secret() -> String {
    std::env::var("WAVE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into())
}

/// Bearer-token guard for the profile and assist routes. Decodes the JWT
/// and stashes the claims in request extensions for handlers to pick up.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret().as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_token;
    use uuid::Uuid;

    #[test]
    fn issued_tokens_decode_with_the_same_secret() {
        let user_id = Uuid::new_v4();
        let token = create_token("test-secret", user_id, "+15551234567").unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, user_id);
        assert_eq!(decoded.claims.phone_number, "+15551234567");
        assert!(decoded.claims.is_verified);

        assert!(
            decode::<Claims>(
                &token,
                &DecodingKey::from_secret(b"wrong-secret"),
                &Validation::default(),
            )
            .is_err()
        );
    }
}
