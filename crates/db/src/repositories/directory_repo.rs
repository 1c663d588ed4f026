//! Read access to `employee`, `organization` and `organization_responsible`.
//!
//! The write methods exist for seeding and tests; the service itself only
//! reads the directory.

use sqlx::PgExecutor;
use tenders_core::directory::{Employee, Organization};
use tenders_core::types::DbId;

use crate::models::directory::EmployeeRow;

const EMPLOYEE_COLUMNS: &str = "id, username, first_name, last_name, created_at";

pub struct DirectoryRepo;

impl DirectoryRepo {
    pub async fn find_employee_by_username<'e>(
        executor: impl PgExecutor<'e>,
        username: &str,
    ) -> Result<Option<EmployeeRow>, sqlx::Error> {
        let query = format!("SELECT {EMPLOYEE_COLUMNS} FROM employee WHERE username = $1");
        sqlx::query_as::<_, EmployeeRow>(&query)
            .bind(username)
            .fetch_optional(executor)
            .await
    }

    /// Ids of the organizations the employee is responsible for.
    pub async fn responsible_organization_ids<'e>(
        executor: impl PgExecutor<'e>,
        employee_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT organization_id FROM organization_responsible
             WHERE employee_id = $1
             ORDER BY organization_id",
        )
        .bind(employee_id)
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn create_employee<'e>(
        executor: impl PgExecutor<'e>,
        employee: &Employee,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO employee (id, username, first_name, last_name, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(employee.id)
        .bind(&employee.username)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(employee.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn create_organization<'e>(
        executor: impl PgExecutor<'e>,
        organization: &Organization,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO organization (id, name, description, organization_type, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(&organization.description)
        .bind(organization.organization_type.as_str())
        .bind(organization.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn assign_responsible<'e>(
        executor: impl PgExecutor<'e>,
        organization_id: DbId,
        employee_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO organization_responsible (organization_id, employee_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(organization_id)
        .bind(employee_id)
        .execute(executor)
        .await?;
        Ok(())
    }
}
