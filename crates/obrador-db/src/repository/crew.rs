//! # Crew Repository
//!
//! Field crews ("cuadrillas") and their rosters.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use obrador_core::{Crew, CrewMember, CrewRole};

/// Repository for crews.
#[derive(Debug, Clone)]
pub struct CrewRepository {
    pool: SqlitePool,
}

impl CrewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CrewRepository { pool }
    }

    pub async fn create(&self, name: &str, customer_id: i64) -> DbResult<Crew> {
        let id = sqlx::query("INSERT INTO crews (name, customer_id) VALUES (?1, ?2)")
            .bind(name)
            .bind(customer_id)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        debug!(crew_id = id, customer_id, "Created crew");
        Ok(Crew {
            id,
            name: name.to_string(),
            customer_id,
        })
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Crew>> {
        let crew = sqlx::query_as::<_, Crew>("SELECT id, name, customer_id FROM crews WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(crew)
    }

    /// Adds a person to a crew, or changes their role if already a member.
    pub async fn add_member(&self, crew_id: i64, personnel_id: i64, role: CrewRole) -> DbResult<CrewMember> {
        sqlx::query(
            r#"
            INSERT INTO crew_members (crew_id, personnel_id, role) VALUES (?1, ?2, ?3)
            ON CONFLICT (crew_id, personnel_id) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(crew_id)
        .bind(personnel_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(CrewMember {
            crew_id,
            personnel_id,
            role,
        })
    }

    /// Returns the crew roster, lead first.
    pub async fn roster(&self, crew_id: i64) -> DbResult<Vec<CrewMember>> {
        let members = sqlx::query_as::<_, CrewMember>(
            r#"
            SELECT crew_id, personnel_id, role
            FROM crew_members
            WHERE crew_id = ?1
            ORDER BY CASE role WHEN 'CREW_LEAD' THEN 0 ELSE 1 END, personnel_id
            "#,
        )
        .bind(crew_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    /// Loads a crew inside an open unit of work.
    pub async fn fetch(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Crew>> {
        let crew = sqlx::query_as::<_, Crew>("SELECT id, name, customer_id FROM crews WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(crew)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use obrador_core::CrewRole;

    #[tokio::test]
    async fn test_roster_lists_lead_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db.catalog().create_customer("Utility Co").await.unwrap();
        let crew = db.crews().create("Cuadrilla 1", customer.id).await.unwrap();
        let ana = db.catalog().create_personnel("Ana").await.unwrap();
        let luis = db.catalog().create_personnel("Luis").await.unwrap();

        db.crews().add_member(crew.id, ana.id, CrewRole::Helper).await.unwrap();
        db.crews().add_member(crew.id, luis.id, CrewRole::CrewLead).await.unwrap();

        let roster = db.crews().roster(crew.id).await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].personnel_id, luis.id);
        assert_eq!(roster[0].role, CrewRole::CrewLead);

        // Re-adding updates the role instead of duplicating.
        db.crews().add_member(crew.id, ana.id, CrewRole::CrewLead).await.unwrap();
        assert_eq!(db.crews().roster(crew.id).await.unwrap().len(), 2);
    }
}
