//! Social login redirects. State and the PKCE verifier travel in short-lived
//! http-only cookies between the two legs.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service_core::error::AppError;

use crate::{dtos::auth::OAuthCallbackQuery, models::AuthProvider, AppState};

const STATE_COOKIE: &str = "oauth_state";
const VERIFIER_COOKIE: &str = "oauth_code_verifier";

pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    start(&state, jar, AuthProvider::Google)
}

pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<(CookieJar, Response), AppError> {
    finish(&state, jar, query, AuthProvider::Google).await
}

pub async fn facebook_login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    start(&state, jar, AuthProvider::Facebook)
}

pub async fn facebook_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<(CookieJar, Response), AppError> {
    finish(&state, jar, query, AuthProvider::Facebook).await
}

fn short_lived(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(10))
        .build()
}

fn start(
    state: &AppState,
    jar: CookieJar,
    provider: AuthProvider,
) -> Result<(CookieJar, Response), AppError> {
    if !state.oauth.is_enabled(provider) {
        return Err(AppError::not_found(format!(
            "{} login is not enabled",
            provider.as_str()
        )));
    }

    let request = state
        .oauth
        .authorization_url(provider)
        .map_err(AppError::InternalError)?;

    let secure = state.config.environment == crate::config::Environment::Prod;
    let jar = jar
        .add(short_lived(STATE_COOKIE, request.state, secure))
        .add(short_lived(VERIFIER_COOKIE, request.code_verifier, secure));

    Ok((jar, Redirect::to(&request.url).into_response()))
}

async fn finish(
    state: &AppState,
    jar: CookieJar,
    query: OAuthCallbackQuery,
    provider: AuthProvider,
) -> Result<(CookieJar, Response), AppError> {
    if !state.oauth.is_enabled(provider) {
        return Err(AppError::not_found(format!(
            "{} login is not enabled",
            provider.as_str()
        )));
    }

    if let Some(error) = &query.error {
        tracing::warn!(provider = provider.as_str(), error = %error, "OAuth provider returned an error");
        return Err(AppError::bad_request("OAuth Authentication Failed"));
    }

    let stored_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    match (&stored_state, &query.state) {
        (Some(stored), Some(received)) if stored == received => {}
        _ => return Err(AppError::bad_request("Invalid OAuth state")),
    }

    let code = query
        .code
        .as_deref()
        .ok_or_else(|| AppError::bad_request("Missing authorization code"))?;
    let code_verifier = jar
        .get(VERIFIER_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::bad_request("Missing code verifier"))?;

    let profile = state
        .oauth
        .fetch_profile(provider, code, &code_verifier)
        .await
        .map_err(|e| {
            tracing::error!(provider = provider.as_str(), error = %e, "OAuth sign-in failed");
            AppError::bad_request("OAuth Authentication Failed")
        })?;

    let auth = state.accounts.oauth_sign_in(provider, profile).await?;

    let redirect_url = format!(
        "{}?token={}",
        state.oauth.frontend_url(),
        urlencoding::encode(&auth.token)
    );

    let jar = jar
        .remove(Cookie::from(STATE_COOKIE))
        .remove(Cookie::from(VERIFIER_COOKIE));

    Ok((jar, Redirect::to(&redirect_url).into_response()))
}
