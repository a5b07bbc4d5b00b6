//! Authentication: password login, sessions, remember-me and bootstrap

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use validator::Validate;

use super::{
    activity::ActivityService,
    sessions::{generate_token, token_digest, SessionManager},
};
use crate::{
    config::{BootstrapConfig, SessionConfig},
    error::{AppError, AppResult},
    models::{
        admin::{Admin, ChangePassword, CreateAdmin},
        auth::{LoginRequest, LoginResponse, MeResponse},
        AdminRole, AuthContext, Permission, RecordStatus,
    },
    repository::Repository,
};

/// Hash a password using Argon2
pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored Argon2 hash
pub(crate) fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Permissions an admin actually holds; super-admins hold all of them
pub fn effective_permissions(admin: &Admin) -> Vec<Permission> {
    match admin.role {
        AdminRole::SuperAdmin => Permission::ALL.to_vec(),
        _ => admin.granted_permissions(),
    }
}

fn context_for(admin: &Admin, session_token: Option<String>) -> AuthContext {
    AuthContext {
        admin_id: admin.id,
        username: admin.username.clone(),
        role: admin.role,
        permissions: admin.granted_permissions(),
        session_token,
    }
}

/// Outcome of resolving request credentials
#[derive(Debug)]
pub struct Authenticated {
    pub context: AuthContext,
    /// Set when a remember-me token opened a fresh session
    pub renewed_session: Option<(String, DateTime<Utc>)>,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: SessionConfig,
    sessions: SessionManager,
    activity: ActivityService,
}

impl AuthService {
    pub fn new(
        repository: Repository,
        config: SessionConfig,
        sessions: SessionManager,
        activity: ActivityService,
    ) -> Self {
        Self {
            repository,
            config,
            sessions,
            activity,
        }
    }

    /// Authenticate by username or email and open a session
    pub async fn login(&self, request: &LoginRequest) -> AppResult<LoginResponse> {
        let admin = self
            .repository
            .admins_find_by_login(request.login.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !verify_password(&admin.password_hash, &request.password)? {
            tracing::info!(admin_id = admin.id, "Rejected login: wrong password");
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }
        if admin.status != RecordStatus::Active {
            return Err(AppError::Authentication("Account is inactive".to_string()));
        }

        let (token, session) = self.sessions.create(&admin).await?;
        self.repository.admins_touch_last_login(admin.id).await?;

        let remember_token = if request.remember_me {
            let raw = generate_token();
            let expires_at = Utc::now() + Duration::days(self.config.remember_days.max(1));
            self.repository
                .admins_set_remember_token(admin.id, &token_digest(&raw), expires_at)
                .await?;
            Some((raw, expires_at))
        } else {
            None
        };

        let context = context_for(&admin, Some(token.clone()));
        self.activity
            .record(&context, "login", "admin", Some(admin.id), Some(json!({ "remember_me": request.remember_me })))
            .await;
        tracing::info!(admin_id = admin.id, "Admin logged in");

        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_at: session.expires_at,
            permissions: effective_permissions(&admin),
            admin,
            remember_token,
        })
    }

    /// Destroy the current session and forget the remember-me token
    pub async fn logout(&self, ctx: &AuthContext) -> AppResult<()> {
        if let Some(token) = &ctx.session_token {
            self.sessions.destroy(token).await?;
        }
        self.repository.admins_clear_remember_token(ctx.admin_id).await?;
        self.activity
            .record(ctx, "logout", "admin", Some(ctx.admin_id), None)
            .await;
        Ok(())
    }

    /// Resolve a session token, falling back to a remember-me token.
    /// The admin row is reloaded so role, permission and status changes
    /// take effect immediately.
    pub async fn authenticate(
        &self,
        session_token: Option<&str>,
        remember_token: Option<&str>,
    ) -> AppResult<Option<Authenticated>> {
        if let Some(token) = session_token {
            if let Some(session) = self.sessions.resolve(token).await? {
                match self.active_admin(session.admin_id).await? {
                    Some(admin) => {
                        return Ok(Some(Authenticated {
                            context: context_for(&admin, Some(token.to_string())),
                            renewed_session: None,
                        }))
                    }
                    None => self.sessions.destroy(token).await?,
                }
            }
        }

        let Some(raw) = remember_token else {
            return Ok(None);
        };
        let Some(admin) = self
            .repository
            .admins_find_by_remember_hash(&token_digest(raw))
            .await?
        else {
            return Ok(None);
        };
        if !admin.remember_token_live(Utc::now()) {
            tracing::debug!(admin_id = admin.id, "Expired remember-me token");
            self.repository.admins_clear_remember_token(admin.id).await?;
            return Ok(None);
        }
        if admin.status != RecordStatus::Active {
            return Ok(None);
        }

        let (token, session) = self.sessions.create(&admin).await?;
        tracing::debug!(admin_id = admin.id, "Session re-established from remember-me token");
        Ok(Some(Authenticated {
            context: context_for(&admin, Some(token.clone())),
            renewed_session: Some((token, session.expires_at)),
        }))
    }

    async fn active_admin(&self, id: i32) -> AppResult<Option<Admin>> {
        match self.repository.admins_get_by_id(id).await {
            Ok(admin) if admin.status == RecordStatus::Active => Ok(Some(admin)),
            Ok(_) | Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Current admin profile with effective permissions
    pub async fn me(&self, ctx: &AuthContext) -> AppResult<MeResponse> {
        let admin = self.repository.admins_get_by_id(ctx.admin_id).await?;
        Ok(MeResponse {
            permissions: effective_permissions(&admin),
            admin,
        })
    }

    /// Change own password after checking the current one
    pub async fn change_password(&self, ctx: &AuthContext, data: &ChangePassword) -> AppResult<()> {
        data.validate()?;
        let admin = self.repository.admins_get_by_id(ctx.admin_id).await?;
        if !verify_password(&admin.password_hash, &data.current_password)? {
            return Err(AppError::Authentication("Current password is incorrect".to_string()));
        }
        let hash = hash_password(&data.new_password)?;
        self.repository.admins_set_password(admin.id, &hash).await?;
        self.activity
            .record(ctx, "change_password", "admin", Some(admin.id), None)
            .await;
        Ok(())
    }

    /// Create the first super-admin when the admins table is empty
    pub async fn bootstrap(&self, config: &BootstrapConfig) -> AppResult<Option<Admin>> {
        if self.repository.admins_exist().await? {
            return Ok(None);
        }

        let data = CreateAdmin {
            username: config.username.clone(),
            email: config.email.clone(),
            password: config.password.clone(),
            full_name: None,
            role: Some(AdminRole::SuperAdmin),
            permissions: Some(Permission::ALL.to_vec()),
            status: Some(RecordStatus::Active),
        };
        data.validate()?;

        let hash = hash_password(&data.password)?;
        let admin = self.repository.admins_create(&data, &hash).await?;
        if let Err(e) = self
            .repository
            .activity_insert(None, "bootstrap", "admin", Some(admin.id), None)
            .await
        {
            tracing::warn!("Failed to write activity log: {}", e);
        }
        tracing::info!(username = %admin.username, "Bootstrapped initial super-admin");
        Ok(Some(admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(role: AdminRole, permissions: &[&str]) -> Admin {
        Admin {
            id: 1,
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password_hash: String::new(),
            full_name: None,
            role,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            status: RecordStatus::Active,
            remember_token_hash: None,
            remember_token_expires_at: None,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "wrong horse").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("not-a-hash", "anything"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_effective_permissions() {
        let root = admin(AdminRole::SuperAdmin, &[]);
        assert_eq!(effective_permissions(&root).len(), Permission::ALL.len());

        let clerk = admin(AdminRole::Operator, &["borrowing.view", "unknown.slug"]);
        assert_eq!(effective_permissions(&clerk), vec![Permission::ViewBorrowing]);
    }
}
