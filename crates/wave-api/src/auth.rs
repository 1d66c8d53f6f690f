use std::sync::Arc;

use anyhow::Context;
use axum::{Json, extract::State};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use wave_assist::AssistClient;
use wave_db::Database;
use wave_db::models::UserRow;
use wave_types::api::{
    Claims, CodeSentResponse, LoginRequest, RegisterRequest, UserProfile, VerifyRequest,
    VerifyResponse,
};

use crate::error::ApiError;
use crate::phone::{format_phone_number, validate_phone_number};
use crate::sms::generate_verification_code;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub sms: crate::sms::SmsClient,
    pub assist: AssistClient,
    /// Outside production mode the issued code is echoed in responses so
    /// the flow can be exercised without a provisioned SMS provider.
    pub dev_mode: bool,
}

const CODE_TTL_MINUTES: i64 = 10;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<CodeSentResponse>, ApiError> {
    if req.phone_number.trim().is_empty() || req.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Phone number and name are required".into(),
        ));
    }

    let phone = format_phone_number(&req.phone_number);
    if !validate_phone_number(&phone) {
        return Err(ApiError::BadRequest(
            "Invalid phone number format. Please enter a valid 10-digit phone number.".into(),
        ));
    }

    let existing = state.db.get_user_by_phone(&phone)?;

    if let Some(user) = &existing {
        if user.is_verified {
            return Err(ApiError::Conflict(
                "Phone number already registered. Please use the login option instead.".into(),
            ));
        }
    }

    let code = generate_verification_code();
    let expires = (Utc::now() + Duration::minutes(CODE_TTL_MINUTES)).to_rfc3339();

    let user_id = match existing {
        Some(user) => {
            // Re-registration of an unverified number: refresh the name and
            // supersede the previous code.
            state.db.update_registration(&user.id, req.name.trim(), &code, &expires)?;
            user.id.parse::<Uuid>().context("corrupt user id")?
        }
        None => {
            let user_id = Uuid::new_v4();
            state
                .db
                .create_user(&user_id.to_string(), &phone, req.name.trim(), &code, &expires)?;
            info!(%user_id, "registered new user");
            user_id
        }
    };

    state
        .sms
        .send_verification(&phone, &code)
        .await
        .map_err(|e| {
            tracing::error!("SMS dispatch failed: {:#}", e);
            ApiError::Upstream("Failed to send verification code".into())
        })?;

    Ok(Json(CodeSentResponse {
        message: "Verification code sent successfully".into(),
        user_id,
        verification_code: state.dev_mode.then_some(code),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<CodeSentResponse>, ApiError> {
    if req.phone_number.trim().is_empty() {
        return Err(ApiError::BadRequest("Phone number is required".into()));
    }

    let phone = format_phone_number(&req.phone_number);
    if !validate_phone_number(&phone) {
        return Err(ApiError::BadRequest(
            "Invalid phone number format. Please enter a valid 10-digit phone number.".into(),
        ));
    }

    let user = state
        .db
        .get_user_by_phone(&phone)?
        .ok_or_else(|| ApiError::NotFound("Phone number not registered. Please sign up first.".into()))?;

    if !user.is_verified {
        return Err(ApiError::NotFound(
            "Phone number not verified. Please complete registration first.".into(),
        ));
    }

    // Resend: the new pair overwrites the old, invalidating it immediately.
    let code = generate_verification_code();
    let expires = (Utc::now() + Duration::minutes(CODE_TTL_MINUTES)).to_rfc3339();
    state.db.issue_code(&user.id, &code, &expires)?;

    state
        .sms
        .send_verification(&phone, &code)
        .await
        .map_err(|e| {
            tracing::error!("SMS dispatch failed: {:#}", e);
            ApiError::Upstream("Failed to send verification code".into())
        })?;

    Ok(Json(CodeSentResponse {
        message: "Verification code sent successfully".into(),
        user_id: user.id.parse().context("corrupt user id")?,
        verification_code: state.dev_mode.then_some(code),
    }))
}

pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    if req.verification_code.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "User ID and verification code are required".into(),
        ));
    }

    let user = state
        .db
        .get_user_by_id(&req.user_id.to_string())?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if user.is_verified {
        return Err(ApiError::Conflict("Phone number already verified".into()));
    }

    match check_code(
        user.verification_code.as_deref(),
        user.verification_expires.as_deref(),
        &req.verification_code,
        Utc::now(),
    ) {
        CodeCheck::Mismatch => {
            return Err(ApiError::BadRequest("Invalid verification code".into()));
        }
        CodeCheck::Expired => {
            return Err(ApiError::BadRequest("Verification code has expired".into()));
        }
        CodeCheck::Valid => {}
    }

    state.db.mark_verified(&user.id)?;
    info!(user_id = %user.id, "phone number verified");

    let token = create_token(&state.jwt_secret, req.user_id, &user.phone_number)?;

    Ok(Json(VerifyResponse {
        message: "Phone number verified successfully".into(),
        token,
        user: UserProfile {
            id: req.user_id,
            name: user.name,
            phone_number: user.phone_number,
            avatar: user.avatar,
            online: true,
            last_seen: None,
        },
    }))
}

#[derive(Debug, PartialEq, Eq)]
enum CodeCheck {
    Valid,
    Mismatch,
    Expired,
}

/// Mismatch is reported before expiry: the caller's remedy differs (retype
/// vs. resend), and a wrong guess should not leak whether the window is
/// still open.
fn check_code(
    stored: Option<&str>,
    expires: Option<&str>,
    supplied: &str,
    now: DateTime<Utc>,
) -> CodeCheck {
    match stored {
        Some(code) if code == supplied => {}
        _ => return CodeCheck::Mismatch,
    }

    let Some(expires) = expires.and_then(|e| DateTime::parse_from_rfc3339(e).ok()) else {
        return CodeCheck::Expired;
    };
    if expires.with_timezone(&Utc) < now {
        return CodeCheck::Expired;
    }

    CodeCheck::Valid
}

pub fn create_token(secret: &str, user_id: Uuid, phone_number: &str) -> anyhow::Result<String> {
    sign_token(secret, user_id, phone_number, Duration::days(7))
}

/// Longer-lived variant for refresh flows.
pub fn create_refresh_token(secret: &str, user_id: Uuid, phone_number: &str) -> anyhow::Result<String> {
    sign_token(secret, user_id, phone_number, Duration::days(30))
}

fn sign_token(
    secret: &str,
    user_id: Uuid,
    phone_number: &str,
    lifetime: Duration,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        phone_number: phone_number.to_string(),
        is_verified: true,
        exp: (Utc::now() + lifetime).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Sanitized projection of a stored user row. Code and expiry never leave
/// the server.
pub fn profile_from_row(row: &UserRow) -> anyhow::Result<UserProfile> {
    Ok(UserProfile {
        id: row.id.parse().context("corrupt user id")?,
        name: row.name.clone(),
        phone_number: row.phone_number.clone(),
        avatar: row.avatar.clone(),
        online: row.online,
        last_seen: parse_db_timestamp(&row.last_seen),
    })
}

/// SQLite default timestamps are "YYYY-MM-DD HH:MM:SS" without a timezone;
/// values written by this crate are RFC 3339. Accept both.
pub(crate) fn parse_db_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
                .ok()
        })
}
