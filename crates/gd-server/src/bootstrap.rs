use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::ensure;
use gd_core::domain::{
    ApiKey, DepartmentDirectory, DepartmentId, ModelId, Profile, ProfileId, ProfileRegistry, Role,
};

use crate::classifier::ClassifierSettings;
use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// RuntimeConfig — fully validated runtime configuration
// ---------------------------------------------------------------------------

pub struct RuntimeConfig {
    pub registry: ProfileRegistry,
    pub directory: DepartmentDirectory,
    pub classifier: ClassifierSettings,
    pub listen_addr: String,
    pub storage_path: PathBuf,
    pub log_level: String,
    pub log_format: String,
}

// ---------------------------------------------------------------------------
// into_runtime — converts raw AppConfig into validated RuntimeConfig
// ---------------------------------------------------------------------------

pub fn into_runtime(config: AppConfig) -> Result<RuntimeConfig, anyhow::Error> {
    ensure!(!config.profiles.is_empty(), "at least one profile required");
    ensure!(!config.routes.is_empty(), "at least one route required");
    ensure!(
        !config.classifier.base_url.is_empty(),
        "classifier base_url required"
    );
    ensure!(!config.classifier.model.is_empty(), "classifier model required");

    // Detect duplicate profile ids
    let mut seen_profiles = HashSet::with_capacity(config.profiles.len());
    for profile in &config.profiles {
        ensure!(
            seen_profiles.insert(&profile.id),
            "duplicate profile id: {}",
            profile.id
        );
    }

    // Officers triage by department scope; a scopeless officer can act on
    // nothing, which is a config mistake rather than a runtime state.
    for profile in &config.profiles {
        if profile.role == Role::Officer {
            ensure!(
                profile.department.is_some(),
                "officer {} requires a department",
                profile.id
            );
        }
    }

    for route in &config.routes {
        ensure!(
            route.category.is_routable(),
            "category {} cannot be routed",
            route.category
        );
        ensure!(
            !route.department.is_empty(),
            "route for {} has an empty department",
            route.category
        );
    }

    // Convert routes → DepartmentDirectory (checks completeness + duplicates)
    let routes = config
        .routes
        .into_iter()
        .map(|r| (r.category, DepartmentId::new(r.department)))
        .collect();
    let directory = DepartmentDirectory::new(routes)?;

    // Convert profiles → ProfileRegistry
    let profile_entries: Vec<(ApiKey, Profile)> = config
        .profiles
        .into_iter()
        .map(|p| {
            let key = ApiKey::new(p.api_key);
            let profile = Profile {
                id: ProfileId::new(p.id),
                role: p.role,
                department: p.department.map(DepartmentId::new),
                active: p.active,
            };
            (key, profile)
        })
        .collect();
    let registry = ProfileRegistry::new(profile_entries);

    let classifier = ClassifierSettings {
        base_url: config.classifier.base_url.trim_end_matches('/').to_owned(),
        api_key: config.classifier.api_key.map(ApiKey::new),
        model: ModelId::new(config.classifier.model),
        timeout: Duration::from_millis(config.classifier.timeout_ms),
    };

    Ok(RuntimeConfig {
        registry,
        directory,
        classifier,
        listen_addr: config.server.listen,
        storage_path: PathBuf::from(config.storage.path),
        log_level: config.logging.level,
        log_format: config.logging.format,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
