//! Request-scoped authorization descriptor.
//!
//! Produced once per request by the auth middleware and injected into
//! handlers, so the role/ownership/geography predicate lives in one place
//! instead of being re-derived at every call site. All checks are pure.

use serde::Serialize;
use uuid::Uuid;

use crate::models::enums::Role;
use crate::models::User;

/// The caller's permitted scope: who they are, what tier they review at,
/// and where in the province/district/sector hierarchy they sit.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeDescriptor {
    pub user_id: Uuid,
    pub role: Role,
    pub province: String,
    pub district: String,
    pub sector: String,
}

impl ScopeDescriptor {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            province: user.province.clone(),
            district: user.district.clone(),
            sector: user.sector.clone(),
        }
    }

    /// Ownership: the caller created the resource.
    pub fn owns(&self, owner_id: &Uuid) -> bool {
        self.user_id == *owner_id
    }

    /// Owner-or-district-admin, the delete rule for owned resources.
    pub fn owns_or_administers(&self, owner_id: &Uuid) -> bool {
        self.owns(owner_id) || self.role == Role::DistrictVet
    }

    /// Tier-1 review authority over resources tagged with `sector`.
    pub fn reviews_sector(&self, sector: &str) -> bool {
        self.role == Role::SectorVet && !sector.is_empty() && self.sector == sector
    }

    /// Tier-2 review authority over resources tagged with `district`.
    pub fn reviews_district(&self, district: &str) -> bool {
        self.role == Role::DistrictVet && !district.is_empty() && self.district == district
    }

    /// Whether the caller may read a sector-scoped listing for `sector`.
    /// Sector listing is the tier-1 view. District reviewers read whole
    /// districts through `can_view_district`; a sector name alone does not
    /// say which district it sits in, so granting it here would let a
    /// reviewer reach sectors outside their own district.
    pub fn can_view_sector(&self, sector: &str) -> bool {
        self.reviews_sector(sector)
    }

    pub fn can_view_district(&self, district: &str) -> bool {
        self.reviews_district(district)
    }
}
