/// Project authorization policy
///
/// Pure decision logic: given a project's owner and member roles, a user and
/// a capability, decide whether the action is allowed. Nothing here touches a
/// store, so every rule is testable in isolation.
///
/// # Capability Table
///
/// | Capability      | Owner | Admin | Editor | Viewer | System admin |
/// |-----------------|-------|-------|--------|--------|--------------|
/// | `ViewProject`   | yes   | yes   | yes    | yes    | yes          |
/// | `ViewBoard`     | yes   | yes   | yes    | yes    | no           |
/// | `EditBoard`     | yes   | yes   | yes    | yes    | no           |
/// | `ManageInvites` | yes   | yes   | no     | no     | no           |
/// | `KickMembers`   | yes   | yes   | no     | no     | no           |
/// | `AddMembers`    | yes   | no    | no     | no     | no           |
/// | `ManageProject` | yes   | no    | no     | no     | yes          |
///
/// Precedence: the project owner is always allowed; otherwise the member's
/// role decides; otherwise a system admin gets the system admin column;
/// otherwise the action is denied. The owner can never be kicked.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::authorization::{authorize, Capability, ProjectRoster};
/// use taskboard_shared::models::project::ProjectRole;
/// use taskboard_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// struct Roster { owner: Uuid, editor: Uuid }
///
/// impl ProjectRoster for Roster {
///     fn project_id(&self) -> Uuid { Uuid::nil() }
///     fn owner_id(&self) -> Uuid { self.owner }
///     fn member_role(&self, user_id: Uuid) -> Option<ProjectRole> {
///         (user_id == self.editor).then_some(ProjectRole::Editor)
///     }
/// }
///
/// let roster = Roster { owner: Uuid::new_v4(), editor: Uuid::new_v4() };
///
/// assert!(authorize(&roster, roster.editor, UserRole::Member, Capability::EditBoard).is_ok());
/// assert!(authorize(&roster, roster.editor, UserRole::Member, Capability::ManageInvites).is_err());
/// ```

use uuid::Uuid;

use crate::models::project::{Project, ProjectRole};
use crate::models::user::UserRole;

/// Actions guarded by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read the project detail view
    ViewProject,

    /// Read the board: columns, tasks and comments
    ViewBoard,

    /// Create, move, update and delete tasks; comment
    EditBoard,

    /// Issue invite tokens and see the active one
    ManageInvites,

    /// Remove members from the project
    KickMembers,

    /// Add a user directly, bypassing invites
    AddMembers,

    /// Rename, describe or delete the project
    ManageProject,
}

impl Capability {
    /// Short description used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Capability::ViewProject => "view this project",
            Capability::ViewBoard => "view this board",
            Capability::EditBoard => "edit this board",
            Capability::ManageInvites => "manage invites for this project",
            Capability::KickMembers => "remove members from this project",
            Capability::AddMembers => "add members to this project",
            Capability::ManageProject => "manage this project",
        }
    }
}

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// User is neither owner nor member, and no system role applies
    #[error("Not a member of project {0}")]
    NotMember(Uuid),

    /// Member role doesn't grant the capability
    #[error("Role {} is not allowed to {}", .role.as_str(), .capability.describe())]
    InsufficientRole {
        role: ProjectRole,
        capability: Capability,
    },

    /// The project owner can't be removed
    #[error("The project owner cannot be removed")]
    OwnerNotRemovable,
}

/// Owner and member-role data a decision is made from
///
/// Implementations must compare users by stable identifier.
pub trait ProjectRoster {
    /// Project being checked
    fn project_id(&self) -> Uuid;

    /// Owning user
    fn owner_id(&self) -> Uuid;

    /// Role of the user in the member list, if present
    fn member_role(&self, user_id: Uuid) -> Option<ProjectRole>;
}

impl ProjectRoster for Project {
    fn project_id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.owner.id()
    }

    fn member_role(&self, user_id: Uuid) -> Option<ProjectRole> {
        self.members
            .iter()
            .find(|m| m.user.refers_to(user_id))
            .map(|m| m.role)
    }
}

/// Effective project role of a user
///
/// The owner is reported as `Owner` whatever the member list says.
pub fn effective_role<R: ProjectRoster + ?Sized>(roster: &R, user_id: Uuid) -> Option<ProjectRole> {
    if roster.owner_id() == user_id {
        return Some(ProjectRole::Owner);
    }
    roster.member_role(user_id)
}

/// Whether a project role grants a capability
pub fn role_grants(role: ProjectRole, capability: Capability) -> bool {
    match role {
        ProjectRole::Owner => true,
        ProjectRole::Admin => !matches!(
            capability,
            Capability::AddMembers | Capability::ManageProject
        ),
        ProjectRole::Editor | ProjectRole::Viewer => matches!(
            capability,
            Capability::ViewProject | Capability::ViewBoard | Capability::EditBoard
        ),
    }
}

/// Whether the system-wide role grants a capability on any project
fn system_role_grants(role: UserRole, capability: Capability) -> bool {
    role.is_admin() && matches!(capability, Capability::ViewProject | Capability::ManageProject)
}

/// Decides whether a user may exercise a capability on a project
///
/// # Errors
///
/// - `AuthzError::InsufficientRole` if the user is a member whose role
///   doesn't grant the capability
/// - `AuthzError::NotMember` if the user isn't involved in the project
pub fn authorize<R: ProjectRoster + ?Sized>(
    roster: &R,
    user_id: Uuid,
    system_role: UserRole,
    capability: Capability,
) -> Result<(), AuthzError> {
    match effective_role(roster, user_id) {
        Some(role) if role_grants(role, capability) => Ok(()),
        _ if system_role_grants(system_role, capability) => Ok(()),
        Some(role) => Err(AuthzError::InsufficientRole { role, capability }),
        None => Err(AuthzError::NotMember(roster.project_id())),
    }
}

/// Decides whether a user may remove `target` from a project
///
/// Requires `KickMembers`, and the target must not be the owner. The owner
/// therefore can't kick themselves either.
pub fn authorize_kick<R: ProjectRoster + ?Sized>(
    roster: &R,
    user_id: Uuid,
    system_role: UserRole,
    target: Uuid,
) -> Result<(), AuthzError> {
    authorize(roster, user_id, system_role, Capability::KickMembers)?;

    if roster.owner_id() == target {
        return Err(AuthzError::OwnerNotRemovable);
    }

    Ok(())
}

/// Whether the user may see the project's active invite token
pub fn can_see_invite<R: ProjectRoster + ?Sized>(roster: &R, user_id: Uuid) -> bool {
    effective_role(roster, user_id).is_some_and(|role| role_grants(role, Capability::ManageInvites))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ProjectMember;
    use crate::models::reference::Ref;
    use crate::models::user::UserSummary;
    use chrono::Utc;

    const ALL: [Capability; 7] = [
        Capability::ViewProject,
        Capability::ViewBoard,
        Capability::EditBoard,
        Capability::ManageInvites,
        Capability::KickMembers,
        Capability::AddMembers,
        Capability::ManageProject,
    ];

    struct Fixture {
        project: Project,
        owner: Uuid,
        admin: Uuid,
        editor: Uuid,
        viewer: Uuid,
    }

    fn member(user: Ref<UserSummary>, role: ProjectRole) -> ProjectMember {
        ProjectMember {
            user,
            role,
            joined_at: Utc::now(),
        }
    }

    fn fixture() -> Fixture {
        let (owner, admin, editor, viewer) =
            (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        // Mix of bare and resolved references
        let project = Project {
            id: Uuid::new_v4(),
            name: "Launch".to_string(),
            description: None,
            owner: Ref::Resolved(UserSummary {
                id: owner,
                name: "Owner".to_string(),
                email: "owner@example.com".to_string(),
            }),
            members: vec![
                member(Ref::Id(owner), ProjectRole::Owner),
                member(Ref::Id(admin), ProjectRole::Admin),
                member(
                    Ref::Resolved(UserSummary {
                        id: editor,
                        name: "Editor".to_string(),
                        email: "editor@example.com".to_string(),
                    }),
                    ProjectRole::Editor,
                ),
                member(Ref::Id(viewer), ProjectRole::Viewer),
            ],
            invite_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        Fixture {
            project,
            owner,
            admin,
            editor,
            viewer,
        }
    }

    #[test]
    fn test_owner_has_every_capability() {
        let f = fixture();
        for capability in ALL {
            assert!(authorize(&f.project, f.owner, UserRole::Member, capability).is_ok());
        }
    }

    #[test]
    fn test_admin_capabilities() {
        let f = fixture();
        let allowed = |c| authorize(&f.project, f.admin, UserRole::Member, c).is_ok();

        assert!(allowed(Capability::ViewBoard));
        assert!(allowed(Capability::EditBoard));
        assert!(allowed(Capability::ManageInvites));
        assert!(allowed(Capability::KickMembers));
        assert!(!allowed(Capability::AddMembers));
        assert!(!allowed(Capability::ManageProject));
    }

    #[test]
    fn test_editor_and_viewer_get_board_access_only() {
        let f = fixture();
        for user in [f.editor, f.viewer] {
            let allowed = |c| authorize(&f.project, user, UserRole::Member, c).is_ok();
            assert!(allowed(Capability::ViewProject));
            assert!(allowed(Capability::ViewBoard));
            assert!(allowed(Capability::EditBoard));
            assert!(!allowed(Capability::ManageInvites));
            assert!(!allowed(Capability::KickMembers));
        }

        assert_eq!(
            authorize(&f.project, f.editor, UserRole::Member, Capability::ManageInvites),
            Err(AuthzError::InsufficientRole {
                role: ProjectRole::Editor,
                capability: Capability::ManageInvites,
            })
        );
    }

    #[test]
    fn test_outsider_is_denied() {
        let f = fixture();
        let outsider = Uuid::new_v4();

        assert_eq!(
            authorize(&f.project, outsider, UserRole::Member, Capability::ViewBoard),
            Err(AuthzError::NotMember(f.project.id))
        );
    }

    #[test]
    fn test_system_admin_outside_project() {
        let f = fixture();
        let sysadmin = Uuid::new_v4();
        let allowed = |c| authorize(&f.project, sysadmin, UserRole::Admin, c).is_ok();

        assert!(allowed(Capability::ViewProject));
        assert!(allowed(Capability::ManageProject));
        assert!(!allowed(Capability::ViewBoard));
        assert!(!allowed(Capability::EditBoard));
        assert!(!allowed(Capability::ManageInvites));
    }

    #[test]
    fn test_system_admin_lifts_member_role() {
        let f = fixture();
        assert!(authorize(&f.project, f.editor, UserRole::Admin, Capability::ManageProject).is_ok());
    }

    #[test]
    fn test_owner_cannot_be_kicked() {
        let f = fixture();

        assert_eq!(
            authorize_kick(&f.project, f.owner, UserRole::Member, f.owner),
            Err(AuthzError::OwnerNotRemovable)
        );
        assert_eq!(
            authorize_kick(&f.project, f.admin, UserRole::Member, f.owner),
            Err(AuthzError::OwnerNotRemovable)
        );
        assert!(authorize_kick(&f.project, f.admin, UserRole::Member, f.editor).is_ok());
        assert!(authorize_kick(&f.project, f.owner, UserRole::Member, f.admin).is_ok());
        assert!(authorize_kick(&f.project, f.editor, UserRole::Member, f.viewer).is_err());
    }

    #[test]
    fn test_owner_is_owner_regardless_of_member_entry() {
        let mut f = fixture();
        f.project.members.retain(|m| !m.user.refers_to(f.owner));

        assert_eq!(effective_role(&f.project, f.owner), Some(ProjectRole::Owner));
    }

    #[test]
    fn test_invite_visibility() {
        let f = fixture();
        assert!(can_see_invite(&f.project, f.owner));
        assert!(can_see_invite(&f.project, f.admin));
        assert!(!can_see_invite(&f.project, f.editor));
        assert!(!can_see_invite(&f.project, Uuid::new_v4()));
    }
}
