//! JWT authentication and the capability policy.
//!
//! Tokens are issued elsewhere; this module validates them, turns the
//! `role` claim into a capability set and checks branch scope.
//!
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! JwtManager::validate_token ──► Claims{sub, role, branch_id?}
//!        │
//!        ▼
//! Policy::capabilities(role) ──► Caller{capabilities, branch_id}
//!        │
//!        ▼
//! handler: caller.require(PlaceOrders)?  caller.require_branch("centro")?
//! ```

use std::collections::{HashMap, HashSet};

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (staff member id)
    pub sub: String,

    /// Role name, mapped to capabilities by [`Policy`]
    pub role: String,

    /// Home branch for branch-scoped roles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

/// JWT token manager (HS256).
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Mint a token. Used by `issue-token` and tests.
    pub fn issue(&self, sub: &str, role: &str, branch_id: Option<&str>) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            branch_id: branch_id.map(str::to_string),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Unauthorized(format!("Failed to generate token: {}", e)))
    }

    /// Validate signature and expiry, then decode.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

// =============================================================================
// Policy
// =============================================================================

/// A permission checked at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    PlaceOrders,
    ViewOrders,
    MoveStock,
    AdjustStock,
    ViewInventory,
    /// Act on any branch, not only the caller's own.
    AnyBranch,
}

const ALL_BRANCH_SCOPED: &[Capability] = &[
    Capability::PlaceOrders,
    Capability::ViewOrders,
    Capability::MoveStock,
    Capability::AdjustStock,
    Capability::ViewInventory,
];

/// Role name → capability set.
#[derive(Debug, Clone)]
pub struct Policy {
    roles: HashMap<String, HashSet<Capability>>,
}

impl Default for Policy {
    fn default() -> Self {
        let mut admin: HashSet<_> = ALL_BRANCH_SCOPED.iter().copied().collect();
        admin.insert(Capability::AnyBranch);

        Policy::empty()
            .with_role("admin", admin)
            .with_role("branch_manager", ALL_BRANCH_SCOPED.iter().copied())
            .with_role(
                "seller",
                [
                    Capability::PlaceOrders,
                    Capability::ViewOrders,
                    Capability::ViewInventory,
                ],
            )
    }
}

impl Policy {
    pub fn empty() -> Self {
        Policy {
            roles: HashMap::new(),
        }
    }

    pub fn with_role(
        mut self,
        role: &str,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        self.roles
            .insert(role.to_string(), capabilities.into_iter().collect());
        self
    }

    /// Unknown roles get no capabilities.
    pub fn capabilities(&self, role: &str) -> HashSet<Capability> {
        self.roles.get(role).cloned().unwrap_or_default()
    }
}

// =============================================================================
// Caller
// =============================================================================

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub staff_id: String,
    pub role: String,
    pub branch_id: Option<String>,
    capabilities: HashSet<Capability>,
}

impl Caller {
    pub fn new(claims: Claims, policy: &Policy) -> Self {
        Caller {
            capabilities: policy.capabilities(&claims.role),
            staff_id: claims.sub,
            role: claims.role,
            branch_id: claims.branch_id,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.has(capability) {
            Ok(())
        } else {
            warn!(staff_id = %self.staff_id, role = %self.role, ?capability, "Capability missing");
            Err(ApiError::Forbidden(format!(
                "role '{}' lacks {:?}",
                self.role, capability
            )))
        }
    }

    /// The caller may act on `branch_id`.
    pub fn require_branch(&self, branch_id: &str) -> Result<(), ApiError> {
        if self.has(Capability::AnyBranch) || self.branch_id.as_deref() == Some(branch_id) {
            Ok(())
        } else {
            warn!(staff_id = %self.staff_id, branch_id = %branch_id, "Branch outside caller scope");
            Err(ApiError::Forbidden(format!(
                "not allowed to act on branch {}",
                branch_id
            )))
        }
    }

    /// Capability plus branch scope in one check.
    pub fn require_at(&self, capability: Capability, branch_id: &str) -> Result<(), ApiError> {
        self.require(capability)?;
        self.require_branch(branch_id)
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".to_string()))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::Unauthorized("expected a Bearer token".to_string()))?;

        let claims = state.jwt.validate_token(token)?;
        debug!(staff_id = %claims.sub, role = %claims.role, "Token validated");

        Ok(Caller::new(claims, &state.policy))
    }
}
