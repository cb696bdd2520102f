//! User service.
//!
//! Registration, login, bearer-token auth and the admin user
//! management operations.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use hearth_common::{AppError, AppResult, Config, IdGenerator};
use hearth_db::{
    entities::user,
    repositories::{UserFilter, UserRepository},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Bearer token claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User ID.
    sub: String,
    /// Issued at (unix seconds).
    iat: i64,
    /// Expiry (unix seconds).
    exp: i64,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
    jwt_secret: String,
    token_expiry_hours: i64,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 64))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 128))]
    pub full_name: Option<String>,
}

/// Input for logging in.
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    /// Username or email address.
    pub username: String,
    pub password: String,
}

/// Input for updating one's own profile.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 3, max = 64))]
    pub username: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 128))]
    pub full_name: Option<String>,

    #[validate(length(max = 512))]
    pub avatar_url: Option<String>,
}

/// Input for changing one's own password.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordInput {
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Input for the admin user update operation.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserInput {
    #[validate(length(min = 3, max = 64))]
    pub username: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub role: Option<user::Role>,
    pub status: Option<user::Status>,

    #[validate(length(max = 128))]
    pub full_name: Option<String>,

    pub email_verified: Option<bool>,
}

/// Aggregate user counts for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub admins: u64,
    pub new_today: u64,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository, config: &Config) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
            jwt_secret: config.auth.jwt_secret.clone(),
            token_expiry_hours: config.auth.token_expiry_hours,
        }
    }

    /// Register a new account.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(password_hash),
            full_name: Set(input.full_name),
            role: Set(user::Role::User),
            status: Set(user::Status::Active),
            email_verified: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        self.user_repo.create(model).await
    }

    /// Authenticate by username (or email) and password.
    ///
    /// Returns the user together with a freshly issued bearer token.
    /// Inactive and banned accounts are rejected even with correct
    /// credentials.
    pub async fn authenticate(&self, input: LoginInput) -> AppResult<(user::Model, String)> {
        let user = if input.username.contains('@') {
            self.user_repo.find_by_email(&input.username).await?
        } else {
            self.user_repo.find_by_username(&input.username).await?
        }
        .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if !user.is_active() {
            return Err(AppError::Forbidden("Account is not active".to_string()));
        }

        let now = Utc::now();
        if let Err(e) = self.user_repo.touch_last_login(&user.id, now).await {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to record last login");
        }

        let token = self.issue_token(&user.id)?;
        Ok((user, token))
    }

    /// Authenticate by bearer token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized)?;

        let user = self
            .user_repo
            .find_by_id(&data.claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active() {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Issue a signed bearer token for a user.
    pub fn issue_token(&self, user_id: &str) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(self.token_expiry_hours)).timestamp(),
        };

        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Update one's own profile. Username and email changes re-check
    /// uniqueness.
    pub async fn update_profile(
        &self,
        id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(id).await?;

        if let Some(username) = &input.username {
            if *username != user.username {
                self.ensure_username_free(username).await?;
            }
        }
        if let Some(email) = &input.email {
            if *email != user.email {
                self.ensure_email_free(email).await?;
            }
        }

        let mut active: user::ActiveModel = user.into();

        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(full_name) = input.full_name {
            active.full_name = Set(Some(full_name));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }

        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    async fn ensure_username_free(&self, username: &str) -> AppResult<()> {
        if self.user_repo.find_by_username(username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str) -> AppResult<()> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        Ok(())
    }

    /// Change one's own password, verifying the current one first.
    pub async fn change_password(&self, id: &str, input: ChangePasswordInput) -> AppResult<()> {
        input.validate()?;

        let user = self.user_repo.get_by_id(id).await?;

        if !verify_password(&input.current_password, &user.password_hash)? {
            return Err(AppError::BadRequest(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = hash_password(&input.new_password)?;

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await?;
        Ok(())
    }

    // ==================== Admin Operations ====================

    /// List users (admin), newest first, narrowed by the given filter.
    pub async fn list(
        &self,
        filter: &UserFilter,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<user::Model>, u64)> {
        let (limit, offset) = super::page_window(page, limit);
        self.user_repo.find_paged(filter, limit, offset).await
    }

    /// Update any user's role, status or profile fields (admin).
    pub async fn admin_update(
        &self,
        id: &str,
        input: AdminUpdateUserInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(id).await?;

        if let Some(username) = &input.username {
            if *username != user.username {
                self.ensure_username_free(username).await?;
            }
        }
        if let Some(email) = &input.email {
            if *email != user.email {
                self.ensure_email_free(email).await?;
            }
        }

        let mut active: user::ActiveModel = user.into();

        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(role) = input.role {
            active.role = Set(role);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(full_name) = input.full_name {
            active.full_name = Set(Some(full_name));
        }
        if let Some(verified) = input.email_verified {
            active.email_verified = Set(verified);
        }

        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Deactivate a user account (admin).
    ///
    /// This is a soft delete: the row stays and historical content
    /// remains attributed, but the account can no longer log in.
    /// Admins cannot deactivate themselves.
    pub async fn admin_deactivate(&self, id: &str, acting_admin_id: &str) -> AppResult<()> {
        if id == acting_admin_id {
            return Err(AppError::BadRequest(
                "Cannot deactivate your own account".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();
        active.status = Set(user::Status::Inactive);
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await?;
        Ok(())
    }

    /// Aggregate user counts for the admin dashboard.
    pub async fn stats(&self) -> AppResult<UserStats> {
        let total = self.user_repo.count_all().await?;
        let active = self.user_repo.count_active().await?;
        let admins = self.user_repo.count_admins().await?;
        let new_today = self
            .user_repo
            .count_created_since(super::interaction::start_of_today())
            .await?;

        Ok(UserStats {
            total,
            active,
            admins,
            new_today,
        })
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hearth_common::config::{AuthConfig, DatabaseConfig, ServerConfig};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-do-not-use".to_string(),
                token_expiry_hours: 24,
            },
        }
    }

    fn create_test_user(id: &str, username: &str, password: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: hash_password(password).unwrap(),
            full_name: None,
            avatar_url: None,
            role: user::Role::User,
            status: user::Status::Active,
            email_verified: false,
            last_login: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_service(db: Arc<sea_orm::DatabaseConnection>) -> UserService {
        UserService::new(UserRepository::new(db), &create_test_config())
    }

    // Unit tests for password functions
    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(verify_password("test_password_123", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("test", "invalid_hash").is_err());
    }

    #[test]
    fn test_register_input_validation() {
        let input = RegisterInput {
            username: "ab".to_string(),
            email: "a@example.com".to_string(),
            password: "password123".to_string(),
            full_name: None,
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
            full_name: None,
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "short".to_string(),
            full_name: None,
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
            full_name: Some("Alice".to_string()),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_issue_and_decode_token() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(db);

        let token = service.issue_token("u1").unwrap();

        let data = jsonwebtoken::decode::<Claims>(
            &token,
            &DecodingKey::from_secret("test-secret-do-not-use".as_bytes()),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(data.claims.sub, "u1");
        assert!(data.claims.exp > data.claims.iat);
    }

    #[tokio::test]
    async fn test_register_username_taken() {
        let existing = create_test_user("u1", "alice", "password123");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = create_test_service(db);

        let result = service
            .register(RegisterInput {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                password: "password123".to_string(),
                full_name: None,
            })
            .await;

        match result {
            Err(AppError::Conflict(msg)) => assert!(msg.contains("Username")),
            _ => panic!("Expected Conflict error"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let user = create_test_user("u1", "alice", "password123");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = create_test_service(db);

        let result = service
            .authenticate(LoginInput {
                username: "alice".to_string(),
                password: "wrong".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_inactive_account_rejected() {
        let mut user = create_test_user("u1", "alice", "password123");
        user.status = user::Status::Inactive;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = create_test_service(db);

        let result = service
            .authenticate(LoginInput {
                username: "alice".to_string(),
                password: "password123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_authenticate_by_token_round_trip() {
        let user = create_test_user("u1", "alice", "password123");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let token = service.issue_token("u1").unwrap();

        let found = service.authenticate_by_token(&token).await.unwrap();
        assert_eq!(found.id, "u1");
    }

    #[tokio::test]
    async fn test_authenticate_by_token_garbage_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(db);

        let result = service.authenticate_by_token("not-a-token").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_update_profile_username_conflict() {
        let user = create_test_user("u1", "alice", "password123");
        let other = create_test_user("u2", "bob", "password123");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[other]])
                .into_connection(),
        );

        let service = create_test_service(db);

        let result = service
            .update_profile(
                "u1",
                UpdateProfileInput {
                    username: Some("bob".to_string()),
                    email: None,
                    full_name: None,
                    avatar_url: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_admin_deactivate_self_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = create_test_service(db);

        let result = service.admin_deactivate("admin1", "admin1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
