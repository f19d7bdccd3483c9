//! Tenants.

use async_trait::async_trait;

use history_types::{EngineTenant, EntityType, TenantDocument};

use crate::context::EngineContext;
use crate::service::ImportStrategy;
use crate::stats::PageStats;

pub struct TenantImport {
    context: EngineContext,
}

impl TenantImport {
    pub fn new(context: EngineContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl ImportStrategy for TenantImport {
    type Record = EngineTenant;
    type Document = TenantDocument;

    fn entity_type(&self) -> EntityType {
        EntityType::Tenant
    }

    fn engine_alias(&self) -> &str {
        self.context.alias()
    }

    async fn map_page(&self, page: Vec<EngineTenant>, _stats: &mut PageStats) -> Vec<TenantDocument> {
        page.into_iter()
            .map(|tenant| TenantDocument {
                id: tenant.id,
                name: tenant.name,
                engine: self.context.alias().to_string(),
            })
            .collect()
    }
}
