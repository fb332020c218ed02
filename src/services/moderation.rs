/// Shared authorization predicate for destructive board operations.
///
/// Post deletion and comment deletion use exactly the same rule; it is
/// total and side-effect-free, so every call site gets the same answer
/// for the same inputs.
use uuid::Uuid;

use crate::domain::models::{Actor, Role};

/// Whether the actor may moderate (soft-delete) content authored by
/// `author_member_id` in a club with the given moderator list.
pub fn can_moderate(actor: &Actor, author_member_id: Uuid, moderators: &[Uuid]) -> bool {
    matches!(actor.role, Role::Faculty | Role::Admin)
        || actor.member_id == Some(author_member_id)
        || moderators.contains(&actor.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, member_id: Option<Uuid>) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            member_id,
            role,
            club_id: None,
        }
    }

    #[test]
    fn faculty_and_admin_can_always_moderate() {
        let author = Uuid::new_v4();
        assert!(can_moderate(&actor(Role::Faculty, None), author, &[]));
        assert!(can_moderate(&actor(Role::Admin, None), author, &[]));
    }

    #[test]
    fn authors_can_moderate_their_own_content() {
        let author = Uuid::new_v4();
        assert!(can_moderate(&actor(Role::Student, Some(author)), author, &[]));
    }

    #[test]
    fn moderators_can_moderate_club_content() {
        let author = Uuid::new_v4();
        let mut acting = actor(Role::Student, None);
        let moderators = vec![Uuid::new_v4(), acting.user_id];
        assert!(can_moderate(&acting, author, &moderators));

        acting.user_id = Uuid::new_v4();
        assert!(!can_moderate(&acting, author, &moderators));
    }

    #[test]
    fn plain_members_cannot_moderate_others_content() {
        let author = Uuid::new_v4();
        let other = actor(Role::Student, Some(Uuid::new_v4()));
        assert!(!can_moderate(&other, author, &[]));
    }
}
