use std::collections::HashMap;

use crate::domain::{Category, DepartmentId, RoutingError};

// ---------------------------------------------------------------------------
// DepartmentDirectory — validated category -> department routing table
// ---------------------------------------------------------------------------

/// Static routing table from grievance category to the responsible
/// department.
///
/// Construction requires exactly one route per routable category, so `route`
/// is total over everything the intake pipeline can ask for. `Irrelevant`
/// never routes.
#[derive(Clone, Debug)]
pub struct DepartmentDirectory {
    routes: HashMap<Category, DepartmentId>,
}

impl DepartmentDirectory {
    pub fn new(routes: Vec<(Category, DepartmentId)>) -> Result<Self, RoutingError> {
        let mut map = HashMap::with_capacity(routes.len());
        for (category, department) in routes {
            if map.insert(category, department).is_some() {
                return Err(RoutingError::DuplicateRoute { category });
            }
        }
        for category in Category::ROUTABLE {
            if !map.contains_key(&category) {
                return Err(RoutingError::UnroutedCategory { category });
            }
        }
        Ok(Self { routes: map })
    }

    pub fn route(&self, category: Category) -> Option<&DepartmentId> {
        if !category.is_routable() {
            return None;
        }
        self.routes.get(&category)
    }

    pub fn departments(&self) -> impl Iterator<Item = &DepartmentId> {
        self.routes.values()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
