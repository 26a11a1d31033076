//! Capability flags derived purely from the session role.
//!
//! Recomputed on every call; callers re-invoke at each decision point
//! instead of subscribing to identity changes.

use crate::session::{Role, User};

/// Boolean capabilities for one identity snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionFlags {
    /// `role == admin`
    pub is_admin: bool,
    /// `role == traveler`
    pub is_traveler: bool,
    /// `role == entrepreneur`
    pub is_entrepreneur: bool,
    /// `role == event_organizer`
    pub is_event_organizer: bool,
    /// `role == event_participant`
    pub is_event_participant: bool,
    /// Admins, entrepreneurs and organizers may manage events.
    pub can_manage_events: bool,
    /// Intentionally role-independent; anonymous visitors included.
    pub can_view_events: bool,
    /// Travelers and participants may register for events.
    pub can_register_for_events: bool,
}

impl PermissionFlags {
    /// Derive flags from a role. `None` (no identity) yields no role
    /// capabilities while `can_view_events` stays true.
    pub fn for_role(role: Option<Role>) -> Self {
        let is_admin = matches!(role, Some(Role::Admin));
        let is_traveler = matches!(role, Some(Role::Traveler));
        let is_entrepreneur = matches!(role, Some(Role::Entrepreneur));
        let is_event_organizer = matches!(role, Some(Role::EventOrganizer));
        let is_event_participant = matches!(role, Some(Role::EventParticipant));
        Self {
            is_admin,
            is_traveler,
            is_entrepreneur,
            is_event_organizer,
            is_event_participant,
            can_manage_events: is_admin || is_entrepreneur || is_event_organizer,
            can_view_events: true,
            can_register_for_events: is_traveler || is_event_participant,
        }
    }

    /// Derive flags from an identity snapshot.
    pub fn for_user(user: Option<&User>) -> Self {
        Self::for_role(user.map(|user| user.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 6] = [
        Role::Admin,
        Role::Traveler,
        Role::Entrepreneur,
        Role::EventOrganizer,
        Role::EventParticipant,
        Role::Unknown,
    ];

    #[test]
    fn derived_flags_follow_boolean_algebra() {
        for role in ALL_ROLES {
            let flags = PermissionFlags::for_role(Some(role));
            assert_eq!(
                flags.can_manage_events,
                flags.is_admin || flags.is_entrepreneur || flags.is_event_organizer,
                "manage mismatch for {role:?}"
            );
            assert_eq!(
                flags.can_register_for_events,
                flags.is_traveler || flags.is_event_participant,
                "register mismatch for {role:?}"
            );
            assert!(flags.can_view_events, "view must hold for {role:?}");
        }
    }

    #[test]
    fn absent_identity_keeps_only_view_capability() {
        let flags = PermissionFlags::for_role(None);
        assert!(!flags.is_admin);
        assert!(!flags.is_traveler);
        assert!(!flags.is_entrepreneur);
        assert!(!flags.is_event_organizer);
        assert!(!flags.is_event_participant);
        assert!(!flags.can_manage_events);
        assert!(!flags.can_register_for_events);
        assert!(flags.can_view_events);
    }

    #[test]
    fn manage_and_register_are_disjoint_by_role() {
        assert!(PermissionFlags::for_role(Some(Role::Admin)).can_manage_events);
        assert!(PermissionFlags::for_role(Some(Role::Entrepreneur)).can_manage_events);
        assert!(PermissionFlags::for_role(Some(Role::EventOrganizer)).can_manage_events);
        assert!(!PermissionFlags::for_role(Some(Role::Traveler)).can_manage_events);

        assert!(PermissionFlags::for_role(Some(Role::Traveler)).can_register_for_events);
        assert!(PermissionFlags::for_role(Some(Role::EventParticipant)).can_register_for_events);
        assert!(!PermissionFlags::for_role(Some(Role::Admin)).can_register_for_events);

        let unknown = PermissionFlags::for_role(Some(Role::Unknown));
        assert!(!unknown.can_manage_events);
        assert!(!unknown.can_register_for_events);
    }
}
