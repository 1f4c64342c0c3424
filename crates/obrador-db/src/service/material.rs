//! # Material Service
//!
//! Material catalog operations that touch more than the materials table.
//!
//! ## Serialized Toggle
//! ```text
//! false ──► true    refused while any stock cell holds the material
//! true  ──► false   every serial unit of the material is deleted;
//!                   movement lines and history keep their snapshots
//! same  ──► same    no-op
//! ```

use tracing::{debug, info, warn};

use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::material::MaterialRepository;
use obrador_core::validation::{validate_material_code, validate_name};
use obrador_core::{CoreError, Material};

#[derive(Debug, Clone)]
pub struct MaterialService {
    db: Database,
}

impl MaterialService {
    pub fn new(db: Database) -> Self {
        MaterialService { db }
    }

    /// Validates and inserts a material.
    pub async fn create_material(
        &self,
        code: &str,
        name: &str,
        unit_id: i64,
        serialized: bool,
    ) -> ServiceResult<Material> {
        let code = code.trim();
        let name = name.trim();
        validate_material_code(code)?;
        validate_name(name)?;

        if self.db.catalog().get_unit(unit_id).await?.is_none() {
            return Err(CoreError::not_found("Unit of measure", unit_id).into());
        }
        Ok(self.db.materials().create(code, name, unit_id, serialized).await?)
    }

    /// Switches a material between bulk and serialized tracking.
    pub async fn set_serialized(&self, material_id: i64, serialized: bool) -> ServiceResult<Material> {
        let mut uow = self.db.begin_immediate().await?;

        let material = MaterialRepository::fetch(uow.conn(), material_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Material", material_id))?;
        if material.serialized == serialized {
            debug!(material_id, serialized, "Serialized flag unchanged");
            return Ok(material);
        }

        if serialized {
            if MaterialRepository::has_stock(uow.conn(), material_id).await? {
                warn!(material_id, code = %material.code, "Cannot serialize a material with stock");
                return Err(CoreError::MaterialHasStock {
                    code: material.code,
                }
                .into());
            }
        } else {
            let removed = MaterialRepository::delete_serial_units(uow.conn(), material_id).await?;
            info!(material_id, removed, "Deleted serial units of de-serialized material");
        }

        MaterialRepository::update_serialized(uow.conn(), material_id, serialized).await?;
        uow.commit().await?;

        info!(material_id, serialized, "Material tracking changed");
        Ok(Material {
            serialized,
            ..material
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::pool::DbConfig;
    use obrador_core::ValidationError;

    #[tokio::test]
    async fn test_create_material_validates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let unit = db.catalog().create_unit("M", "Meter").await.unwrap();
        let service = MaterialService::new(db.clone());

        let cable = service
            .create_material(" CABLE-10 ", "Cable 10mm", unit.id, false)
            .await
            .unwrap();
        assert_eq!(cable.code, "CABLE-10");

        let err = service
            .create_material("CABLE 10", "Cable", unit.id, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::Validation(ValidationError::InvalidFormat { .. }))
        ));

        let err = service
            .create_material("CABLE-20", "Cable", unit.id + 99, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_set_serialized_missing_material() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = MaterialService::new(db).set_serialized(42, true).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_set_serialized_same_value_is_noop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let unit = db.catalog().create_unit("U", "Unit").await.unwrap();
        let meter = db.materials().create("METER-1", "Meter", unit.id, true).await.unwrap();

        let same = MaterialService::new(db).set_serialized(meter.id, true).await.unwrap();
        assert_eq!(same, meter);
    }
}
