use crate::{
    auth::{
        hash_password, normalize_email, role_for_registration, verify_password, AuthResponse,
        AuthenticatedUser, LoginRequest, ProfileUpdateRequest, RegisterRequest,
    },
    error::AppError,
    models::{NewUser, UserChanges},
    response,
    state::AppState,
};
use actix_web::{get, patch, post, web, HttpResponse};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// Creates a new account. The account is a `member` unless `adminToken` matches the
/// configured bootstrap-admin secret. No token is issued; the client logs in next.
///
/// ## Responses:
/// - `201 Created`: `{ user }`
/// - `409 Conflict`: If the email is already registered.
/// - `422 Unprocessable Entity`: If name, email or password fail validation.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    register_data.validate()?;
    let register_data = register_data.into_inner();
    let email = normalize_email(&register_data.email);

    if state.users.find_by_email(&email).await?.is_some() {
        log::warn!("Registration rejected, email already registered: {}", email);
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let role = role_for_registration(
        register_data.admin_token.as_deref(),
        state.admin_invite_token.as_deref(),
    );
    let password_hash = hash_password(&register_data.password, state.bcrypt_cost)?;

    let user = state
        .users
        .create(NewUser {
            name: register_data.name.trim().to_string(),
            email,
            password_hash,
            role,
            image_url: register_data.image_url,
        })
        .await?;
    log::info!("Registered user {} as {:?}", user.id, user.role);

    Ok(response::created(
        "User registered successfully",
        json!({ "user": user }),
    ))
}

/// Login user
///
/// Verifies the credentials and returns the user together with a signed token.
///
/// ## Responses:
/// - `200 OK`: `{ user, token }`
/// - `401 Unauthorized`: Unknown email or wrong password (indistinguishable).
/// - `422 Unprocessable Entity`: Malformed email or empty password.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    login_data.validate()?;
    let email = normalize_email(&login_data.email);

    let user = match state.users.find_by_email(&email).await? {
        Some(user) if verify_password(&login_data.password, &user.password_hash)? => user,
        _ => {
            log::warn!("Failed login attempt for {}", email);
            return Err(AppError::Unauthorized("Invalid email or password".into()));
        }
    };

    let token = state.tokens.issue(user.id, user.role)?;
    Ok(response::ok("Login successful", AuthResponse { user, token }))
}

/// Returns the caller's own account.
#[get("/profile")]
pub async fn get_profile(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state
        .users
        .find(caller.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(response::ok("Profile retrieved", json!({ "user": user })))
}

/// Edit the caller's own account
///
/// Any of `name`, `email`, `password` and `imageUrl` may be supplied; the others are
/// left untouched. The role cannot be changed here.
///
/// ## Responses:
/// - `200 OK`: `{ user }`
/// - `404 Not Found`: If the account was deleted after the token was issued.
/// - `409 Conflict`: If the new email belongs to another account.
/// - `422 Unprocessable Entity`: If a supplied field fails validation.
#[patch("/profile")]
pub async fn update_profile(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    profile_data: web::Json<ProfileUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    profile_data.validate()?;
    let profile_data = profile_data.into_inner();

    let password_hash = profile_data
        .password
        .as_deref()
        .map(|password| hash_password(password, state.bcrypt_cost))
        .transpose()?;

    let changes = UserChanges {
        name: profile_data.name.map(|name| name.trim().to_string()),
        email: profile_data.email.as_deref().map(normalize_email),
        password_hash,
        image_url: profile_data.image_url,
    };

    let user = state
        .users
        .update(caller.id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    log::info!("User {} updated their profile", user.id);

    Ok(response::ok("Profile updated", json!({ "user": user })))
}
