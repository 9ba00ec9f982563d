pub mod admin;
pub mod claims;
mod config;
pub mod entities;
pub mod error;
pub mod guilds;
pub mod persistence;
pub mod sync;
pub mod telemetry;
pub mod world;

pub use claims::authorizer::{ActionAuthorizer, Authorization, ClaimAtPosition, ClaimStores};
pub use claims::engine::ClaimEngine;
pub use claims::grants::{
    GrantAllResult, GrantManager, GrantResult, GuildShareResult, RevokeAllResult, RevokeResult,
};
pub use claims::lifecycle::{
    ClaimLifecycleManager, ConvertClaimResult, CreateClaimResult, LifecycleDeps, MoveAnchorResult,
};
pub use config::{AppConfig, ClaimsConfig, RolePermissionsConfig};
pub use entities::claim::{Claim, Partition};
pub use entities::ids::{ClaimId, GuildId, PartitionId, PlayerId, RoleId, WorldId};
pub use entities::permission::{ActionType, CategorySet, PermissionCategory};
pub use error::{ConfigError, OutcomeKind, StorageError};
pub use world::position::{Area, Position2D, Position3D};

/// Loads and validates the configuration named on the command line and
/// prints what the engine would run with.
pub fn run(args: &[String]) -> Result<(), String> {
    let app = AppConfig::from_args(args)?;
    telemetry::logging::init(&app.log_level)?;
    let loaded =
        ClaimsConfig::load(&app.config_path).map_err(|err| format!("claimguard: {}", err))?;
    let unknown = loaded.unknown_categories();
    let config = loaded
        .validated()
        .map_err(|err| format!("claimguard: {}", err))?;
    tracing::info!(path = %app.config_path.display(), "configuration loaded");

    let roles = &config.team_role_permissions;
    println!("claimguard: config summary");
    println!("- config: {}", app.config_path.display());
    println!("- claim limit: {}", config.claim_limit);
    println!("- initial claim size: {}", config.initial_claim_size);
    println!(
        "- role cache ttl: {}s",
        roles.cache_invalidation_delay_seconds
    );
    println!("- roles: {}", roles.roles.len());
    for role in roles.roles.keys() {
        let categories: Vec<&str> = roles
            .role_categories(role)
            .map(|set| set.iter().map(PermissionCategory::as_str).collect())
            .unwrap_or_default();
        println!("  - {}: {}", role, categories.join(", "));
    }
    let defaults: Vec<&str> = roles
        .default_categories()
        .iter()
        .map(PermissionCategory::as_str)
        .collect();
    println!("- default permissions: {}", defaults.join(", "));

    if !unknown.is_empty() {
        for (role, name) in &unknown {
            eprintln!("claimguard: unknown category '{}' in role '{}'", name, role);
        }
        return Err(format!(
            "claimguard: {} unknown permission categories in config",
            unknown.len()
        ));
    }
    Ok(())
}
