use super::DBClient;
use crate::models::User;

const USER_COLUMNS: &str = "id, first_name, last_name, username, email, password, token, role_id";

/// User database operations trait
pub trait UserExt {
    /// Get all users, oldest first
    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error>;

    /// Get single user by ID. Returns Some(user) if found, None if not found
    async fn get_user(&self, user_id: i32) -> Result<Option<User>, sqlx::Error>;

    /// Find user by email (login and duplicate-email checks)
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    /// Find user by username (duplicate-username check)
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;

    /// Create a new user with an already-hashed password
    #[allow(clippy::too_many_arguments)]
    async fn save_user(
        &self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        username: &str,
        email: &str,
        password: &str,
        role_id: i32,
    ) -> Result<User, sqlx::Error>;

    /// Replace the user's names, username and email. Password, token and role
    /// are never touched through this path.
    async fn update_user(
        &self,
        user_id: i32,
        first_name: Option<&str>,
        last_name: Option<&str>,
        username: Option<&str>,
        email: &str,
    ) -> Result<User, sqlx::Error>;

    /// Store the last-issued bearer token on the user row
    async fn update_user_token(&self, user_id: i32, token: &str) -> Result<(), sqlx::Error>;

    /// Delete user by ID. Dependent reviews are removed by the FK cascade.
    async fn delete_user(&self, user_id: i32) -> Result<(), sqlx::Error>;
}

#[allow(clippy::too_many_arguments)]
impl UserExt for DBClient {
    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_user(&self, user_id: i32) -> Result<Option<User>, sqlx::Error> {
        // fetch_optional returns Option<T>, fetch_one returns T or RowNotFound
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save_user(
        &self,
        first_name: Option<&str>,
        last_name: Option<&str>,
        username: &str,
        email: &str,
        password: &str,
        role_id: i32,
    ) -> Result<User, sqlx::Error> {
        // The stored token starts out empty; authenticate fills it in later.
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (first_name, last_name, username, email, password, token, role_id)
             VALUES ($1, $2, $3, $4, $5, '', $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(first_name)
        .bind(last_name)
        .bind(username)
        .bind(email)
        .bind(password)
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: i32,
        first_name: Option<&str>,
        last_name: Option<&str>,
        username: Option<&str>,
        email: &str,
    ) -> Result<User, sqlx::Error> {
        // fetch_one surfaces RowNotFound when the row vanished between the
        // handler's existence check and this write.
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET first_name = $1, last_name = $2, username = $3, email = $4
             WHERE id = $5
             RETURNING {USER_COLUMNS}"
        ))
        .bind(first_name)
        .bind(last_name)
        .bind(username)
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user_token(&self, user_id: i32, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET token = $1 WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_user(&self, user_id: i32) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        // Check if user actually existed
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
