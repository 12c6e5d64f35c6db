//! Authorization rules.
//!
//! Every rule is a pure function of the acting user, the action and the user
//! that owns the resource (a group's master, or the account itself).

use thiserror::Error;

use super::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    UpdateUser,
    CreateGroup,
    UpdateGroup,
    DeleteGroup,
    /// Removing a player; the player may always remove themself.
    RemovePlayer { player: UserId },
    AcceptRequest,
    /// Deleting a request; the requester may withdraw their own.
    RejectRequest { requester: UserId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("user {actor} is not allowed to perform {action:?}")]
pub struct Forbidden {
    pub actor: UserId,
    pub action: Action,
}

/// Signature services accept so the rules can be swapped in tests.
pub type Authorizer = fn(UserId, Action, UserId) -> Result<(), Forbidden>;

/// Default rule set: only the owner may act, except where the action names
/// another user who is allowed to act on their own behalf.
pub fn authorize(actor: UserId, action: Action, owner: UserId) -> Result<(), Forbidden> {
    let allowed = match action {
        Action::UpdateUser
        | Action::CreateGroup
        | Action::UpdateGroup
        | Action::DeleteGroup
        | Action::AcceptRequest => actor == owner,
        Action::RemovePlayer { player } => actor == owner || actor == player,
        Action::RejectRequest { requester } => actor == owner || actor == requester,
    };

    if allowed {
        Ok(())
    } else {
        Err(Forbidden { actor, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: UserId = UserId::new(1);
    const PLAYER: UserId = UserId::new(2);
    const STRANGER: UserId = UserId::new(3);

    #[test]
    fn only_master_manages_group() {
        assert!(authorize(MASTER, Action::UpdateGroup, MASTER).is_ok());
        assert!(authorize(PLAYER, Action::UpdateGroup, MASTER).is_err());
        assert!(authorize(PLAYER, Action::DeleteGroup, MASTER).is_err());
        assert!(authorize(PLAYER, Action::AcceptRequest, MASTER).is_err());
    }

    #[test]
    fn player_may_leave_but_not_kick() {
        let leave = Action::RemovePlayer { player: PLAYER };
        assert!(authorize(PLAYER, leave, MASTER).is_ok());
        assert!(authorize(MASTER, leave, MASTER).is_ok());
        assert!(authorize(STRANGER, leave, MASTER).is_err());
    }

    #[test]
    fn requester_may_withdraw() {
        let reject = Action::RejectRequest { requester: PLAYER };
        assert!(authorize(PLAYER, reject, MASTER).is_ok());
        assert!(authorize(MASTER, reject, MASTER).is_ok());

        let err = authorize(STRANGER, reject, MASTER).unwrap_err();
        assert_eq!(err.actor, STRANGER);
    }

    #[test]
    fn users_edit_only_themselves() {
        assert!(authorize(PLAYER, Action::UpdateUser, PLAYER).is_ok());
        assert!(authorize(STRANGER, Action::UpdateUser, PLAYER).is_err());
    }
}
