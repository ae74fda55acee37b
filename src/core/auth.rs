//! Authentication and role-based authorization
//!
//! Every core operation receives a verified [`Principal`]. How a bearer token
//! becomes a principal is the job of an [`AuthProvider`]:
//! - [`JwtAuthProvider`]: HS256 JSON Web Tokens carrying `{id, role, exp}`
//! - [`StaticTokenProvider`]: a fixed token table (development and tests)
//!
//! Route-level role checks use [`AuthPolicy`].

use crate::core::error::{MarketError, MarketResult};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Role of an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Role::Buyer),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(MarketError::unauthorized(format!("unknown role '{}'", other))),
        }
    }
}

/// The verified caller of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn buyer(id: Uuid) -> Self {
        Self::new(id, Role::Buyer)
    }

    pub fn seller(id: Uuid) -> Self {
        Self::new(id, Role::Seller)
    }

    pub fn admin(id: Uuid) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Forbidden` unless `policy` accepts this principal
    pub fn require(&self, policy: &AuthPolicy) -> MarketResult<()> {
        if policy.check(self) {
            Ok(())
        } else {
            tracing::warn!(user = %self.id, role = %self.role, "policy rejected caller");
            Err(MarketError::forbidden(format!(
                "role '{}' may not access this resource",
                self.role
            )))
        }
    }
}

/// Authorization policy for a group of routes
#[derive(Debug, Clone)]
pub enum AuthPolicy {
    /// Principal must have one of these roles
    HasRole(Vec<Role>),

    /// Admin only
    AdminOnly,
}

impl AuthPolicy {
    /// Sellers, plus admins acting on their behalf
    pub fn seller_or_admin() -> Self {
        AuthPolicy::HasRole(vec![Role::Seller, Role::Admin])
    }

    pub fn check(&self, principal: &Principal) -> bool {
        match self {
            AuthPolicy::HasRole(roles) => roles.contains(&principal.role),
            AuthPolicy::AdminOnly => principal.is_admin(),
        }
    }
}

/// Turns a bearer token into a [`Principal`]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify `token` (without the `Bearer ` prefix).
    ///
    /// Any failure must be reported as an `Unauthorized` error.
    async fn authenticate(&self, token: &str) -> MarketResult<Principal>;
}

/// JWT claims as issued by the marketplace backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub role: String,
    pub exp: usize,
}

/// HS256 JWT verification (and issuing, for tooling and tests)
pub struct JwtAuthProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl_secs: i64,
}

impl JwtAuthProvider {
    /// Tokens issued by this provider expire after 30 days by default
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            token_ttl_secs: 30 * 24 * 3600,
        }
    }

    pub fn with_ttl(mut self, seconds: i64) -> Self {
        self.token_ttl_secs = seconds;
        self
    }

    /// Issue a signed token for `principal`
    pub fn issue_token(&self, principal: &Principal) -> MarketResult<String> {
        let exp = (Utc::now().timestamp() + self.token_ttl_secs).max(0) as usize;
        let claims = Claims {
            id: principal.id,
            role: principal.role.to_string(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| MarketError::Internal(format!("failed to sign token: {}", e)))
    }

    fn verify(&self, token: &str) -> MarketResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    async fn authenticate(&self, token: &str) -> MarketResult<Principal> {
        let claims = self.verify(token)?;
        let role = claims.role.parse::<Role>()?;
        Ok(Principal::new(claims.id, role))
    }
}

/// Fixed token table, optionally falling back to another provider
#[derive(Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, Principal>,
    fallback: Option<Arc<dyn AuthProvider>>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }

    /// Tokens not in the table are handed to `provider`
    pub fn with_fallback(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.fallback = Some(provider);
        self
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn authenticate(&self, token: &str) -> MarketResult<Principal> {
        if let Some(principal) = self.tokens.get(token) {
            return Ok(*principal);
        }
        match &self.fallback {
            Some(provider) => provider.authenticate(token).await,
            None => Err(MarketError::unauthorized("unknown token")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("Seller".parse::<Role>().unwrap(), Role::Seller);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        let err = "guest".parse::<Role>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_policy_check() {
        let buyer = Principal::buyer(Uuid::new_v4());
        let seller = Principal::seller(Uuid::new_v4());
        let admin = Principal::admin(Uuid::new_v4());

        assert!(!AuthPolicy::seller_or_admin().check(&buyer));
        assert!(AuthPolicy::seller_or_admin().check(&seller));
        assert!(AuthPolicy::seller_or_admin().check(&admin));
        assert!(!AuthPolicy::AdminOnly.check(&seller));
        assert!(AuthPolicy::AdminOnly.check(&admin));
        assert!(AuthPolicy::HasRole(vec![Role::Buyer]).check(&buyer));
    }

    #[test]
    fn test_require_maps_to_forbidden() {
        let buyer = Principal::buyer(Uuid::new_v4());
        let err = buyer.require(&AuthPolicy::AdminOnly).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_jwt_round_trip() {
        let provider = JwtAuthProvider::new("secret");
        let principal = Principal::seller(Uuid::new_v4());

        let token = provider.issue_token(&principal).unwrap();
        let verified = provider.authenticate(&token).await.unwrap();

        assert_eq!(verified, principal);
    }

    #[tokio::test]
    async fn test_jwt_rejects_wrong_secret() {
        let issuer = JwtAuthProvider::new("one");
        let verifier = JwtAuthProvider::new("two");
        let token = issuer.issue_token(&Principal::buyer(Uuid::new_v4())).unwrap();

        let err = verifier.authenticate(&token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_jwt_rejects_expired_token() {
        let provider = JwtAuthProvider::new("secret").with_ttl(-3600);
        let token = provider.issue_token(&Principal::buyer(Uuid::new_v4())).unwrap();

        let err = provider.authenticate(&token).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_static_tokens_with_fallback() {
        let buyer = Principal::buyer(Uuid::new_v4());
        let jwt = Arc::new(JwtAuthProvider::new("secret"));
        let admin = Principal::admin(Uuid::new_v4());
        let admin_token = jwt.issue_token(&admin).unwrap();

        let provider = StaticTokenProvider::new()
            .with_token("buyer-token", buyer)
            .with_fallback(jwt);

        assert_eq!(provider.authenticate("buyer-token").await.unwrap(), buyer);
        assert_eq!(provider.authenticate(&admin_token).await.unwrap(), admin);
        assert!(provider.authenticate("nope").await.is_err());
    }
}
