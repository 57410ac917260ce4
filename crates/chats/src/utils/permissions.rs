//! Membership-based access control.

use huddle_database::{ConversationId, MemberRepository, UserId};
use tracing::debug;

use crate::types::{ChatError, ChatResult};

/// Message shared by every denial, so a missing conversation and a
/// conversation the caller is not in are indistinguishable.
pub const NOT_A_MEMBER: &str = "caller is not a member of this conversation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(DenyReason),
}

/// Decides whether a caller may read or write a conversation.
///
/// Membership is immutable after creation, so read and write currently
/// share the same rule.
#[derive(Clone)]
pub struct MembershipGuard {
    members: MemberRepository,
}

impl MembershipGuard {
    pub fn new(members: MemberRepository) -> Self {
        Self { members }
    }

    pub async fn authorize(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
        access: Access,
    ) -> ChatResult<Decision> {
        let member = self.members.is_member(caller, conversation_id).await?;

        if member {
            Ok(Decision::Allowed)
        } else {
            debug!(
                caller = %caller,
                conversation_id = %conversation_id,
                ?access,
                "membership guard denied access"
            );
            Ok(Decision::Denied(DenyReason::NotAMember))
        }
    }

    /// Like [`authorize`](Self::authorize), turning a denial into `Forbidden`.
    pub async fn require(
        &self,
        caller: &UserId,
        conversation_id: &ConversationId,
        access: Access,
    ) -> ChatResult<()> {
        match self.authorize(caller, conversation_id, access).await? {
            Decision::Allowed => Ok(()),
            Decision::Denied(DenyReason::NotAMember) => Err(ChatError::forbidden(NOT_A_MEMBER)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_database::{
        test_support::TestDatabase, ConversationRepository, NewConversation,
    };

    #[tokio::test]
    async fn test_members_are_allowed_and_others_denied() {
        let db = TestDatabase::with_users(&["ann", "ben", "cal"]).await.unwrap();
        let conversation = ConversationRepository::new(db.pool.clone())
            .create(NewConversation::group("Lab", vec!["ann".into(), "ben".into()]))
            .await
            .unwrap();
        let guard = MembershipGuard::new(MemberRepository::new(db.pool.clone()));

        for access in [Access::Read, Access::Write] {
            let decision = guard
                .authorize(&"ann".into(), &conversation.id, access)
                .await
                .unwrap();
            assert_eq!(decision, Decision::Allowed);

            let decision = guard
                .authorize(&"cal".into(), &conversation.id, access)
                .await
                .unwrap();
            assert_eq!(decision, Decision::Denied(DenyReason::NotAMember));
        }
    }

    #[tokio::test]
    async fn test_unknown_conversation_denial_matches_non_member_denial() {
        let db = TestDatabase::with_users(&["ann", "ben", "cal"]).await.unwrap();
        let conversation = ConversationRepository::new(db.pool.clone())
            .create(NewConversation::group("Lab", vec!["ann".into(), "ben".into()]))
            .await
            .unwrap();
        let guard = MembershipGuard::new(MemberRepository::new(db.pool.clone()));

        let not_member = guard
            .require(&"cal".into(), &conversation.id, Access::Read)
            .await
            .unwrap_err();
        let missing = guard
            .require(&"cal".into(), &"no-such-conversation".into(), Access::Read)
            .await
            .unwrap_err();

        assert_eq!(not_member.code(), "forbidden");
        assert_eq!(not_member.to_string(), missing.to_string());
    }
}
