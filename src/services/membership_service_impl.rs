//! `SeaORM` implementation of the `MembershipService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{Group, GroupRequest, GroupRequestDetails, Store};
use crate::domain::policy::{Action, Authorizer, authorize};
use crate::domain::{GroupId, RequestId, RequestStatus, UserId};
use crate::services::membership_service::{MembershipError, MembershipService};

pub struct SeaOrmMembershipService {
    store: Store,
    authorize: Authorizer,
}

impl SeaOrmMembershipService {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store, authorize }
    }

    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Authorizer) -> Self {
        self.authorize = authorizer;
        self
    }

    async fn find_group(&self, group_id: GroupId) -> Result<Group, MembershipError> {
        self.store
            .groups()
            .get(group_id)
            .await?
            .ok_or(MembershipError::GroupNotFound)
    }

    /// Request must exist and belong to the group.
    async fn find_request(
        &self,
        group_id: GroupId,
        request_id: RequestId,
    ) -> Result<GroupRequest, MembershipError> {
        self.store
            .group_requests()
            .get(request_id)
            .await?
            .filter(|r| r.group_id == group_id)
            .ok_or(MembershipError::RequestNotFound)
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!("mesa_group_requests_total", "outcome" => outcome).increment(1);
}

#[async_trait]
impl MembershipService for SeaOrmMembershipService {
    async fn create_request(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<GroupRequest, MembershipError> {
        self.find_group(group_id).await?;

        let requests = self.store.group_requests();
        let duplicate =
            || MembershipError::Conflict("a pending request for this group already exists".into());

        if requests.find_pending(user_id, group_id).await?.is_some() {
            return Err(duplicate());
        }

        if self.store.groups().is_player(group_id, user_id).await? {
            return Err(MembershipError::AlreadyMember);
        }

        let request = requests
            .create_pending(user_id, group_id)
            .await?
            .ok_or_else(duplicate)?;

        record_outcome("created");
        info!(request_id = %request.id, group_id = %group_id, user_id = %user_id, "Group request created");

        Ok(request)
    }

    async fn list_requests(
        &self,
        group_id: GroupId,
        master: UserId,
    ) -> Result<Vec<GroupRequestDetails>, MembershipError> {
        Ok(self
            .store
            .group_requests()
            .list_for_master(group_id, master)
            .await?)
    }

    async fn accept_request(
        &self,
        group_id: GroupId,
        request_id: RequestId,
        actor: UserId,
    ) -> Result<GroupRequest, MembershipError> {
        let group = self.find_group(group_id).await?;
        let request = self.find_request(group_id, request_id).await?;

        (self.authorize)(actor, Action::AcceptRequest, group.master)?;

        if request.status == RequestStatus::Accepted {
            return Err(MembershipError::Conflict(
                "request already accepted".to_string(),
            ));
        }

        let accepted = self
            .store
            .group_requests()
            .accept(&request)
            .await?
            .ok_or_else(|| MembershipError::Conflict("request already accepted".to_string()))?;

        record_outcome("accepted");
        info!(request_id = %request_id, group_id = %group_id, user_id = %accepted.user_id, "Group request accepted");

        Ok(accepted)
    }

    async fn reject_request(
        &self,
        group_id: GroupId,
        request_id: RequestId,
        actor: UserId,
    ) -> Result<(), MembershipError> {
        let group = self.find_group(group_id).await?;
        let request = self.find_request(group_id, request_id).await?;

        (self.authorize)(
            actor,
            Action::RejectRequest {
                requester: request.user_id,
            },
            group.master,
        )?;

        if request.status == RequestStatus::Accepted {
            return Err(MembershipError::Conflict(
                "request already accepted".to_string(),
            ));
        }

        if !self.store.group_requests().delete(request_id).await? {
            return Err(MembershipError::RequestNotFound);
        }

        let outcome = if actor == request.user_id && actor != group.master {
            "withdrawn"
        } else {
            "rejected"
        };
        record_outcome(outcome);
        info!(request_id = %request_id, group_id = %group_id, outcome, "Group request removed");

        Ok(())
    }
}
