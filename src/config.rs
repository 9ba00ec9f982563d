use crate::entities::permission::{CategorySet, PermissionCategory};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const MIN_INITIAL_CLAIM_SIZE: i32 = 3;
pub const MIN_CACHE_TTL_SECONDS: u64 = 1;

/// Operator settings for the claim engine, loaded from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Maximum claims a player may own. Zero disables creation.
    pub claim_limit: usize,
    /// Side length of the partition created with a new claim.
    pub initial_claim_size: i32,
    pub team_role_permissions: RolePermissionsConfig,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            claim_limit: 3,
            initial_claim_size: 10,
            team_role_permissions: RolePermissionsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolePermissionsConfig {
    /// Guild role name to category names. Role names match exactly, category
    /// names case-insensitively.
    pub roles: BTreeMap<String, Vec<String>>,
    pub default_permissions: Vec<String>,
    pub cache_invalidation_delay_seconds: u64,
}

impl Default for RolePermissionsConfig {
    fn default() -> Self {
        Self {
            roles: default_role_mappings(),
            default_permissions: vec!["VIEW".to_string()],
            cache_invalidation_delay_seconds: 5,
        }
    }
}

fn names(categories: &[PermissionCategory]) -> Vec<String> {
    categories.iter().map(|category| category.as_str().to_string()).collect()
}

fn default_role_mappings() -> BTreeMap<String, Vec<String>> {
    use PermissionCategory as P;
    let everything = names(&PermissionCategory::ALL);
    let admin: Vec<PermissionCategory> = PermissionCategory::ALL
        .into_iter()
        .filter(|category| !matches!(category, P::Detonate | P::Event | P::Sleep))
        .collect();
    BTreeMap::from([
        ("Owner".to_string(), everything.clone()),
        ("Co-Owner".to_string(), everything),
        ("Admin".to_string(), names(&admin)),
        (
            "Mod".to_string(),
            names(&[
                P::Build,
                P::Harvest,
                P::Container,
                P::Display,
                P::Vehicle,
                P::Sign,
                P::View,
            ]),
        ),
        (
            "Member".to_string(),
            names(&[P::Harvest, P::Container, P::View]),
        ),
    ])
}

fn view_only() -> CategorySet {
    [PermissionCategory::View].into_iter().collect()
}

/// Parses category names, skipping and logging the ones that do not exist.
fn parse_categories<'a>(
    context: &str,
    entries: impl IntoIterator<Item = &'a String>,
) -> CategorySet {
    entries
        .into_iter()
        .filter_map(|name| {
            let parsed = PermissionCategory::parse(name);
            if parsed.is_none() {
                warn!(context, name = name.as_str(), "unknown permission category skipped");
            }
            parsed
        })
        .collect()
}

impl RolePermissionsConfig {
    /// Mapped categories for a role, or `None` when the role has no entry.
    /// A role whose entries name no real category is narrowed to `{View}`.
    pub fn role_categories(&self, role_name: &str) -> Option<CategorySet> {
        let entries = self.roles.get(role_name)?;
        let set = parse_categories(role_name, entries);
        if set.is_empty() {
            return Some(view_only());
        }
        Some(set)
    }

    /// Categories for members without a role or with an unmapped one. Falls
    /// back to `{View}` when no configured name is a real category.
    pub fn default_categories(&self) -> CategorySet {
        let set = parse_categories("default_permissions", &self.default_permissions);
        if set.is_empty() {
            return view_only();
        }
        set
    }

    /// Snapshot TTL, never below [`MIN_CACHE_TTL_SECONDS`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_invalidation_delay_seconds.max(MIN_CACHE_TTL_SECONDS))
    }
}

impl ClaimsConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Applies the startup corrections:
    ///
    /// - `initial_claim_size` of at least [`MIN_INITIAL_CLAIM_SIZE`]
    /// - the default role table when none is configured
    /// - unknown category names removed, and `[VIEW]` for any role or default
    ///   list left with nothing valid
    /// - a cache TTL of at least [`MIN_CACHE_TTL_SECONDS`]
    ///
    /// Call [`ClaimsConfig::unknown_categories`] before this to report the
    /// names that were dropped.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.initial_claim_size < MIN_INITIAL_CLAIM_SIZE {
            warn!(
                configured = self.initial_claim_size,
                minimum = MIN_INITIAL_CLAIM_SIZE,
                "initial_claim_size raised to minimum"
            );
            self.initial_claim_size = MIN_INITIAL_CLAIM_SIZE;
        }
        let roles = &mut self.team_role_permissions;
        if roles.roles.is_empty() {
            warn!("no team role permissions configured, using defaults");
            roles.roles = default_role_mappings();
        }
        for (role, entries) in roles.roles.iter_mut() {
            *entries = known_names(role, entries);
        }
        roles.default_permissions = known_names("default_permissions", &roles.default_permissions);
        if roles.cache_invalidation_delay_seconds < MIN_CACHE_TTL_SECONDS {
            warn!(
                configured = roles.cache_invalidation_delay_seconds,
                minimum = MIN_CACHE_TTL_SECONDS,
                "cache_invalidation_delay_seconds raised to minimum"
            );
            roles.cache_invalidation_delay_seconds = MIN_CACHE_TTL_SECONDS;
        }
        if let Some(blank) = roles.roles.keys().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                message: format!("role name {:?} is blank", blank),
            });
        }
        Ok(self)
    }

    /// `(role, name)` pairs whose name is not a permission category. Default
    /// permissions are reported under the role `default_permissions`.
    pub fn unknown_categories(&self) -> Vec<(String, String)> {
        let roles = &self.team_role_permissions;
        let role_entries = roles
            .roles
            .iter()
            .flat_map(|(role, entries)| entries.iter().map(move |name| (role.as_str(), name)));
        let default_entries = roles
            .default_permissions
            .iter()
            .map(|name| ("default_permissions", name));
        role_entries
            .chain(default_entries)
            .filter(|(_, name)| PermissionCategory::parse(name).is_none())
            .map(|(role, name)| (role.to_string(), name.clone()))
            .collect()
    }
}

/// Canonical names of the valid entries, or `["VIEW"]` when none are valid.
fn known_names(context: &str, entries: &[String]) -> Vec<String> {
    let set = parse_categories(context, entries);
    if set.is_empty() {
        warn!(context, "no valid permission categories, using VIEW");
        return vec![PermissionCategory::View.as_str().to_string()];
    }
    set.iter().map(|category| category.as_str().to_string()).collect()
}

#[derive(Debug)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() < 2 {
            return Err("usage: claimguard <config.yaml> [log_level]".to_string());
        }

        let config_path = Path::new(&args[1]).to_path_buf();
        let log_level = if args.len() > 2 {
            args[2].clone()
        } else {
            std::env::var("CLAIMGUARD_LOG")
                .ok()
                .and_then(|value| {
                    let trimmed = value.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                })
                .unwrap_or_else(|| "info".to_string())
        };
        Ok(Self {
            config_path,
            log_level,
        })
    }
}
