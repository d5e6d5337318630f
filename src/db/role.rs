use super::DBClient;
use crate::models::Role;

/// Role database operations trait
pub trait RoleExt {
    async fn get_roles(&self) -> Result<Vec<Role>, sqlx::Error>;

    async fn get_role(&self, role_id: i32) -> Result<Option<Role>, sqlx::Error>;

    /// Find role by name (registration looks up the seeded "user" role)
    async fn get_role_by_name(&self, name_role: &str) -> Result<Option<Role>, sqlx::Error>;

    async fn save_role(&self, name_role: &str) -> Result<Role, sqlx::Error>;

    /// Replace the role's name. Surfaces RowNotFound when no row matched,
    /// which the handler treats as a concurrent-update conflict.
    async fn update_role(&self, role_id: i32, name_role: &str) -> Result<(), sqlx::Error>;

    /// Delete role by ID. The users.role_id FK is ON DELETE RESTRICT, so the
    /// store rejects this while any user still references the role.
    async fn delete_role(&self, role_id: i32) -> Result<(), sqlx::Error>;
}

impl RoleExt for DBClient {
    async fn get_roles(&self) -> Result<Vec<Role>, sqlx::Error> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name_role FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn get_role(&self, role_id: i32) -> Result<Option<Role>, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name_role FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn get_role_by_name(&self, name_role: &str) -> Result<Option<Role>, sqlx::Error> {
        let role =
            sqlx::query_as::<_, Role>("SELECT id, name_role FROM roles WHERE name_role = $1")
                .bind(name_role)
                .fetch_optional(&self.pool)
                .await?;

        Ok(role)
    }

    async fn save_role(&self, name_role: &str) -> Result<Role, sqlx::Error> {
        let role = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name_role) VALUES ($1) RETURNING id, name_role",
        )
        .bind(name_role)
        .fetch_one(&self.pool)
        .await?;

        Ok(role)
    }

    async fn update_role(&self, role_id: i32, name_role: &str) -> Result<(), sqlx::Error> {
        let result = sqlx::query("UPDATE roles SET name_role = $1 WHERE id = $2")
            .bind(name_role)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn delete_role(&self, role_id: i32) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
