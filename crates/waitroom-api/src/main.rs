use chrono::Utc;
use clap::Parser;
use waitroom_api::config::Config;
use waitroom_core::ids::TenantId;
use waitroom_core::model::Tenant;
use waitroom_store::TenantRegistry;

/// Tenant signup/auth lives outside this engine; the process seeds one
/// tenant from the environment so there is something to resolve requests
/// against out of the box.
fn seed_tenant() -> Tenant {
	Tenant {
		id: TenantId::new(),
		name: std::env::var("SEED_TENANT_NAME").unwrap_or_else(|_| "default".to_string()),
		tenant_key: std::env::var("SEED_TENANT_KEY").unwrap_or_else(|_| "dev-tenant-key".to_string()),
		domain: std::env::var("SEED_TENANT_DOMAIN").ok(),
		active: true,
		created_at: Utc::now(),
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let config = Config::parse();
	waitroom_api::init_tracing(&config);

	let tenants = TenantRegistry::new();
	let tenant = seed_tenant();
	tracing::info!(tenant_id = %tenant.id, tenant_key = %tenant.tenant_key, "seeded tenant");
	tenants.insert(tenant);

	waitroom_api::run(config, tenants).await
}
