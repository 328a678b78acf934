use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::password::verify_password;
use crate::auth::{generate_jwt, Claims};
use crate::database::manager::DatabaseManager;
use crate::database::models::{User, UserSummary};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default, alias = "saveLoginInfo")]
    pub save_login_info: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserSummary,
    pub redirect_to: String,
}

/// Compute the consecutive-login-day streak for a login happening at `now`:
/// +1 if the previous login was yesterday, unchanged if already today,
/// otherwise back to 1.
pub fn next_login_streak(
    last_login: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    current_streak: i32,
) -> i32 {
    match last_login {
        None => 1,
        Some(last) => {
            let diff_days = (now.date_naive() - last.date_naive()).num_days();
            match diff_days {
                0 => current_streak.max(1),
                1 => current_streak + 1,
                _ => 1,
            }
        }
    }
}

/// POST /api/auth/login
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<Json<LoginResponse>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let now = Utc::now();
    let streak = next_login_streak(user.last_login, now, user.consecutive_login_days);

    sqlx::query(
        "UPDATE users SET last_login = $1, consecutive_login_days = $2, save_login_info = $3 \
         WHERE id = $4",
    )
    .bind(now)
    .bind(streak)
    .bind(payload.save_login_info)
    .bind(user.id)
    .execute(&pool)
    .await?;

    let claims = Claims::new(user.id, user.email.clone(), user.role.clone(), user.token_version);
    let access_token = generate_jwt(&claims).map_err(|e| {
        tracing::error!("JWT generation failed: {}", e);
        ApiError::internal_server_error("Failed to issue access token")
    })?;

    let redirect_to = if user.is_admin() { "/admin" } else { "/" }.to_string();

    Ok(Json(LoginResponse {
        access_token,
        user: user.summary(),
        redirect_to,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn first_login_starts_streak_at_one() {
        assert_eq!(next_login_streak(None, at(2025, 3, 10, 9), 0), 1);
    }

    #[test]
    fn same_day_login_keeps_streak() {
        let last = at(2025, 3, 10, 1);
        assert_eq!(next_login_streak(Some(last), at(2025, 3, 10, 23), 4), 4);
    }

    #[test]
    fn next_day_login_extends_streak() {
        // Calendar-day boundary counts, not 24 hours
        let last = at(2025, 3, 10, 23);
        assert_eq!(next_login_streak(Some(last), at(2025, 3, 11, 1), 4), 5);
    }

    #[test]
    fn gap_resets_streak() {
        let last = at(2025, 3, 10, 12);
        assert_eq!(next_login_streak(Some(last), at(2025, 3, 13, 12), 9), 1);
    }
}
