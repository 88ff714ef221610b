//! Staff accounts: login, admin registration, bootstrap admin

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{LoginResponse, NewUser, RegisterRequest, User, UserType};

use crate::auth::JwtService;
use crate::db::{RepoError, UserStore};
use crate::error::{ServiceError, ServiceResult};
use crate::mail::{MailMessage, MailQueue};
use crate::security_log;
use crate::util::{generate_password, hash_password, normalize_email, verify_password};

/// Length of passwords generated for accounts registered without one
const GENERATED_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    jwt: Arc<JwtService>,
    mail: MailQueue,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, jwt: Arc<JwtService>, mail: MailQueue) -> Self {
        Self { store, jwt, mail }
    }

    /// Authenticate staff and issue a token
    ///
    /// Customers never need a token and are refused with a 400.
    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> ServiceResult<LoginResponse> {
        let (Some(email), Some(password)) = (
            email.filter(|s| !s.trim().is_empty()),
            password.filter(|s| !s.is_empty()),
        ) else {
            return Err(AppError::with_message(
                ErrorCode::RequiredField,
                "Email and password are required.",
            )
            .into());
        };

        let email = normalize_email(email);
        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) if verify_password(password, &user.hashed_password) => user,
            _ => {
                security_log!("WARN", "login_failed", email = email.as_str());
                return Err(AppError::invalid_credentials().into());
            }
        };

        if !user.is_active {
            security_log!("WARN", "login_disabled", user_id = user.id);
            return Err(AppError::new(ErrorCode::AccountDisabled).into());
        }
        if user.user_type == UserType::Customer {
            return Err(AppError::new(ErrorCode::CustomerLoginNotAllowed).into());
        }

        let auth_token = self.jwt.generate_token(&user).map_err(|e| {
            tracing::error!(error = %e, "Token generation failed");
            AppError::internal("Token generation failed")
        })?;

        tracing::info!(user_id = user.id, role = %user.user_type, "User logged in");
        Ok(LoginResponse {
            auth_token,
            user_id: user.id,
            first_name: user.first_name,
            email: user.email,
            user_type: user.user_type,
        })
    }

    /// Create an account; without a password one is generated and mailed
    pub async fn register(&self, req: RegisterRequest) -> ServiceResult<User> {
        let email = req
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::required("email"))?;
        if !email.contains('@') {
            return Err(AppError::validation("Enter a valid email address.")
                .with_detail("field", "email")
                .into());
        }

        let (password, generated) = match req.password.filter(|p| !p.is_empty()) {
            Some(password) => (password, false),
            None => (generate_password(GENERATED_PASSWORD_LEN), true),
        };
        let hashed_password = hash_password(&password)
            .map_err(|e| ServiceError::Db(format!("password hashing failed: {e}").into()))?;

        let user = self
            .store
            .create_user(NewUser {
                email: email.clone(),
                hashed_password,
                first_name: req.first_name.filter(|n| !n.trim().is_empty()),
                user_type: req.user_type.unwrap_or_default(),
            })
            .await
            .map_err(|e| match e {
                RepoError::Duplicate(_) => ServiceError::App(
                    AppError::new(ErrorCode::EmailExists).with_detail("email", email.clone()),
                ),
                other => other.into(),
            })?;

        if generated {
            self.mail
                .enqueue(MailMessage::account_password(&user.email, &password));
        }

        tracing::info!(user_id = user.id, role = %user.user_type, generated, "User registered");
        Ok(user)
    }

    /// Create the bootstrap admin unless the email is already registered
    pub async fn ensure_admin(&self, email: &str, password: &str) -> ServiceResult<()> {
        let email = normalize_email(email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Ok(());
        }
        self.register(RegisterRequest {
            email: Some(email),
            password: Some(password.to_string()),
            user_type: Some(UserType::Admin),
            first_name: None,
        })
        .await?;
        tracing::info!("Bootstrap admin created");
        Ok(())
    }
}
