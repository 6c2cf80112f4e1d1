//! Caller identity.
//!
//! Handlers never talk to the identity provider directly: they ask for a
//! [`CurrentUser`] or [`AdminUser`] extractor, which resolves the bearer token
//! through whatever [`Authenticator`] the application state carries.

use std::{collections::HashMap, sync::Arc};

use anyhow::anyhow;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn user(user_id: impl Into<String>) -> Self {
        Caller {
            user_id: user_id.into(),
            role: Role::User,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Caller {
            user_id: user_id.into(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resolves a bearer token to the caller it belongs to.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<Caller, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ClaimsMetadata {
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: usize,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    metadata: Option<ClaimsMetadata>,
}

impl Claims {
    fn role(&self) -> Role {
        let role = self
            .role
            .as_deref()
            .or_else(|| self.metadata.as_ref().and_then(|m| m.role.as_deref()));
        match role {
            Some("admin") => Role::Admin,
            _ => Role::User,
        }
    }
}

/// HS256 session tokens issued by the identity provider.
pub struct JwtAuthenticator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        JwtAuthenticator {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, token: &str) -> Result<Caller, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            ApiError::Unauthorized("Invalid or expired session".to_string())
        })?;
        let role = data.claims.role();
        Ok(Caller {
            user_id: data.claims.sub,
            role,
        })
    }
}

/// Fixed token table, for local runs and tests.
#[derive(Default)]
pub struct StaticAuthenticator {
    callers: HashMap<String, Caller>,
}

impl StaticAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caller(mut self, token: impl Into<String>, caller: Caller) -> Self {
        self.callers.insert(token.into(), caller);
        self
    }
}

impl Authenticator for StaticAuthenticator {
    fn authenticate(&self, token: &str) -> Result<Caller, ApiError> {
        self.callers
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".to_string()))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn caller_from_parts(parts: &Parts) -> Result<Caller, ApiError> {
    let state = parts
        .extensions
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::Internal(anyhow!("application state is not installed")))?;
    let token = bearer_token(&parts.headers)
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, login required".to_string()))?;
    state.auth.authenticate(token)
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Caller);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_parts(parts).map(CurrentUser)
    }
}

/// An authenticated caller holding the admin role. Always enforced.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Caller);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = caller_from_parts(parts)?;
        if !caller.is_admin() {
            tracing::warn!(user_id = %caller.user_id, "non-admin caller hit an admin route");
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(caller))
    }
}
