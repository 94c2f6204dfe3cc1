use serde::{Deserialize, Serialize};

use crate::domain::{AccessError, ApiKey, DepartmentId, ProfileId};

// ---------------------------------------------------------------------------
// Role and Profile
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Absent or unknown roles resolve to citizen.
    #[default]
    Citizen,
    Officer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Officer => "officer",
            Role::Admin => "admin",
        }
    }
}

/// An authenticated user as the authentication collaborator hands it over.
/// Read-only to the intake pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentId>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// ---------------------------------------------------------------------------
// AccessView — pure authorization view over a profile
// ---------------------------------------------------------------------------

/// Total function over a profile; no state, no side effects, no failure
/// modes. Inactive profiles hold no powers at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessView {
    role: Role,
    department: Option<DepartmentId>,
    active: bool,
}

impl AccessView {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            role: profile.role,
            department: profile.department.clone(),
            active: profile.active,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the profile may file new grievances.
    pub fn can_file(&self) -> bool {
        self.active
    }

    pub fn can_access_admin(&self) -> bool {
        self.active && self.role == Role::Admin
    }

    pub fn can_access_officer(&self) -> bool {
        self.active && matches!(self.role, Role::Officer | Role::Admin)
    }

    /// Admins update anything; officers only their own department; citizens
    /// nothing.
    pub fn can_update_grievance(&self, target_department: &DepartmentId) -> bool {
        if !self.active {
            return false;
        }
        match self.role {
            Role::Admin => true,
            Role::Officer => self.department.as_ref() == Some(target_department),
            Role::Citizen => false,
        }
    }
}

// ---------------------------------------------------------------------------
// ProfileRegistry — authenticates bearer API keys against known profiles
// ---------------------------------------------------------------------------

/// Maps bearer API keys to profiles.
///
/// Uses `Vec<(ApiKey, Profile)>` instead of `HashMap` because `ApiKey`
/// intentionally does not implement `Hash` (constant-time `PartialEq` only).
/// Linear scan is acceptable: the number of profiles is small, and iterating
/// all entries prevents early-exit timing leaks across keys.
pub struct ProfileRegistry {
    profiles: Vec<(ApiKey, Profile)>,
}

impl ProfileRegistry {
    pub fn new(profiles: Vec<(ApiKey, Profile)>) -> Self {
        Self { profiles }
    }

    /// Authenticate an API key, returning the associated `Profile`.
    ///
    /// Iterates **all** entries regardless of match position to prevent
    /// timing side-channels that would reveal how many keys exist or
    /// where a valid key sits in the list.
    pub fn validate(&self, key: &ApiKey) -> Result<&Profile, AccessError> {
        let mut matched: Option<&Profile> = None;
        for (stored_key, profile) in &self.profiles {
            if stored_key == key {
                matched = Some(profile);
            }
        }
        matched.ok_or(AccessError::InvalidApiKey)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, role: Role, department: Option<&str>) -> Profile {
        Profile {
            id: ProfileId::new(id),
            role,
            department: department.map(DepartmentId::new),
            active: true,
        }
    }

    #[test]
    fn test_role_defaults_to_citizen() {
        let profile: Profile = serde_json::from_str(r#"{"id": "walk-in"}"#).unwrap();
        assert_eq!(profile.role, Role::Citizen);
        assert!(profile.active);
        assert_eq!(profile.department, None);
    }

    #[test]
    fn test_admin_updates_any_department() {
        let view = AccessView::from_profile(&profile("admin-1", Role::Admin, None));
        assert!(view.can_update_grievance(&DepartmentId::new("water-board")));
        assert!(view.can_update_grievance(&DepartmentId::new("public-works")));
        assert!(view.can_access_admin());
        assert!(view.can_access_officer());
    }

    #[test]
    fn test_officer_updates_only_matching_department() {
        let view = AccessView::from_profile(&profile(
            "officer-pw",
            Role::Officer,
            Some("public-works"),
        ));
        assert!(view.can_update_grievance(&DepartmentId::new("public-works")));
        assert!(!view.can_update_grievance(&DepartmentId::new("water-board")));
        assert!(!view.can_access_admin());
        assert!(view.can_access_officer());
    }

    #[test]
    fn test_officer_without_department_updates_nothing() {
        let view = AccessView::from_profile(&profile("officer-0", Role::Officer, None));
        assert!(!view.can_update_grievance(&DepartmentId::new("public-works")));
    }

    #[test]
    fn test_citizen_updates_nothing() {
        let view = AccessView::from_profile(&profile(
            "citizen-1",
            Role::Citizen,
            Some("public-works"),
        ));
        assert!(!view.can_update_grievance(&DepartmentId::new("public-works")));
        assert!(!view.can_access_admin());
        assert!(!view.can_access_officer());
        assert!(view.can_file());
    }

    #[test]
    fn test_inactive_profile_holds_no_powers() {
        let mut p = profile("admin-gone", Role::Admin, None);
        p.active = false;
        let view = AccessView::from_profile(&p);
        assert!(!view.can_file());
        assert!(!view.can_access_admin());
        assert!(!view.can_access_officer());
        assert!(!view.can_update_grievance(&DepartmentId::new("public-works")));
    }

    #[test]
    fn test_registry_valid_key() {
        let key = ApiKey::new("gd-sk-valid000000000000000000000000");
        let registry = ProfileRegistry::new(vec![(
            key.clone(),
            profile("citizen-1", Role::Citizen, None),
        )]);

        let result = registry.validate(&ApiKey::new("gd-sk-valid000000000000000000000000"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().id.as_str(), "citizen-1");
    }

    #[test]
    fn test_registry_invalid_key() {
        let key = ApiKey::new("gd-sk-valid000000000000000000000000");
        let registry =
            ProfileRegistry::new(vec![(key, profile("citizen-1", Role::Citizen, None))]);

        let result = registry.validate(&ApiKey::new("gd-sk-wrong000000000000000000000000"));
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AccessError::InvalidApiKey));
    }

    #[test]
    fn test_registry_last_duplicate_wins() {
        let key = ApiKey::new("gd-sk-shared00000000000000000000000");
        let registry = ProfileRegistry::new(vec![
            (key.clone(), profile("first", Role::Citizen, None)),
            (key.clone(), profile("second", Role::Officer, Some("public-works"))),
        ]);

        let matched = registry.validate(&key).unwrap();
        assert_eq!(matched.id.as_str(), "second");
    }
}
