// ABOUTME: Identity service: email OTP issuance, verification, session resolution, sign-out
// ABOUTME: OTP dispatch and verification errors are surfaced; resolution errors degrade to absent

use axum::{
    extract::State,
    response::{Json, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use crate::appwrite::{self, Query};
use crate::config::{Config, AVATAR_PLACEHOLDER};
use crate::error::{AppError, Result};
use crate::session;
use crate::types::{
    AccountResponse, CreateAccountRequest, SendOtpRequest, SignInRequest, UserDoc,
    VerifySecretRequest, VerifySecretResponse,
};
use crate::AppState;

/// Outcome of resolving the request's session to a user document. The HTTP
/// boundary collapses every absent case to "no current user"; the cases stay
/// distinct here so each one is logged for what it is.
#[derive(Debug)]
pub enum Resolution {
    Found(UserDoc),
    NoSession,
    SessionRejected,
    NoRecord,
}

async fn send_email_otp(config: &Config, email: &str) -> Result<String> {
    let admin = appwrite::create_admin_client(config);
    let token = admin
        .create_email_token(email)
        .await
        .map_err(|e| AppError::OtpDispatch(e.to_string()))?;
    if token.user_id.is_empty() {
        return Err(AppError::OtpDispatch(
            "platform returned an empty account id".to_string(),
        ));
    }
    Ok(token.user_id)
}

async fn get_user_by_email(config: &Config, email: &str) -> Result<Option<UserDoc>> {
    let admin = appwrite::create_admin_client(config);
    let result = admin
        .list_documents::<UserDoc>(
            &config.database_id,
            &config.users_collection_id,
            &[Query::equal("email", email)],
        )
        .await
        .map_err(|e| AppError::Lookup(e.to_string()))?;
    Ok(result.documents.into_iter().next())
}

pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<AccountResponse>> {
    let account_id = send_email_otp(&state.config, &req.email).await?;
    Ok(Json(AccountResponse {
        account_id: Some(account_id),
        error: None,
    }))
}

/// Sign-up: look the email up, send the OTP either way, and create the user
/// document only when none existed. A uniqueness conflict from the platform
/// means a concurrent sign-up won the race; proceed as already-exists.
pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>> {
    let config = &state.config;
    let existing = get_user_by_email(config, &req.email).await?;
    let account_id = send_email_otp(config, &req.email).await?;

    if existing.is_none() {
        let admin = appwrite::create_admin_client(config);
        let data = json!({
            "fullName": req.full_name,
            "email": req.email,
            "avatar": AVATAR_PLACEHOLDER,
            "accountId": account_id,
        });
        match admin
            .create_document::<UserDoc>(&config.database_id, &config.users_collection_id, &data)
            .await
        {
            Ok(_) => {}
            Err(err) if err.is_conflict() => {
                tracing::debug!("user document for {} already exists", req.email);
            }
            Err(err) => return Err(AppError::Platform(err)),
        }
    }

    Ok(Json(AccountResponse {
        account_id: Some(account_id),
        error: None,
    }))
}

/// Exchange the emailed passcode for a session and set the session cookie.
/// A rejected passcode is logged and answered with an absent session id; the
/// caller treats that absence as verification failure.
pub async fn verify_secret(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<VerifySecretRequest>,
) -> (CookieJar, Json<VerifySecretResponse>) {
    let admin = appwrite::create_admin_client(&state.config);
    let result = admin
        .create_session(&req.account_id, &req.password)
        .await
        .map_err(|e| AppError::SessionCreation(e.to_string()));

    match result {
        Ok(session) => {
            let jar = jar.add(session::create_session_cookie(session.secret));
            (
                jar,
                Json(VerifySecretResponse {
                    session_id: Some(session.id),
                }),
            )
        }
        Err(err) => {
            tracing::warn!("{}", err);
            (jar, Json(VerifySecretResponse { session_id: None }))
        }
    }
}

pub async fn resolve_current_user(config: &Config, jar: &CookieJar) -> Resolution {
    let Some(secret) = session::session_secret(jar) else {
        return Resolution::NoSession;
    };

    let client = appwrite::create_session_client(config, &secret);
    let account = match client.get_account().await {
        Ok(account) => account,
        Err(err) => {
            tracing::debug!("session rejected by platform: {}", err);
            return Resolution::SessionRejected;
        }
    };

    let result = match client
        .list_documents::<UserDoc>(
            &config.database_id,
            &config.users_collection_id,
            &[Query::equal("accountId", &account.id)],
        )
        .await
    {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!("user lookup for {} failed: {}", account.email, err);
            return Resolution::NoRecord;
        }
    };

    if result.total == 0 {
        return Resolution::NoRecord;
    }
    match result.documents.into_iter().next() {
        Some(user) => Resolution::Found(user),
        None => Resolution::NoRecord,
    }
}

/// `null` whenever there is no usable session or no matching user document;
/// the cases are indistinguishable to the caller on purpose.
pub async fn current_user(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Json<Option<UserDoc>> {
    match resolve_current_user(&state.config, &jar).await {
        Resolution::Found(user) => Json(Some(user)),
        absent => {
            tracing::debug!("no current user: {:?}", absent);
            Json(None)
        }
    }
}

/// Delete the remote session and clear the cookie. The redirect to the
/// sign-in page happens whether or not the remote deletion worked.
pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(secret) = session::session_secret(&jar) {
        let client = appwrite::create_session_client(&state.config, &secret);
        if let Err(err) = client.delete_current_session().await {
            tracing::warn!("failed to delete remote session: {}", err);
        }
    }

    let jar = jar.remove(session::clear_session_cookie());
    (jar, Redirect::to("/sign-in"))
}

/// Sign-in: re-send the OTP for a known email; an unknown email is not an
/// error, just an absent account id.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<AccountResponse>> {
    match get_user_by_email(&state.config, &req.email).await? {
        Some(user) => {
            send_email_otp(&state.config, &req.email).await?;
            Ok(Json(AccountResponse {
                account_id: Some(user.account_id),
                error: None,
            }))
        }
        None => Ok(Json(AccountResponse {
            account_id: None,
            error: Some("User not found".to_string()),
        })),
    }
}
