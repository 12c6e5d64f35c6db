//! Services take their authorization rules as an injected function.

mod common;

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse};
use mesa::api::ApiError;
use mesa::config::{MailConfig, PaginationConfig, SecurityConfig};
use mesa::db::{GroupPatch, NewGroup};
use mesa::domain::policy::{Action, Forbidden};
use mesa::domain::{GroupId, RequestId, UserId};
use mesa::services::{
    GroupError, GroupService, IdentityError, IdentityService, LogMailer, MailQueue,
    MembershipService, SeaOrmGroupService, SeaOrmIdentityService, SeaOrmMembershipService,
};

use common::spawn_app;

fn deny_all(actor: UserId, action: Action, _owner: UserId) -> Result<(), Forbidden> {
    Err(Forbidden { actor, action })
}

fn allow_all(_actor: UserId, _action: Action, _owner: UserId) -> Result<(), Forbidden> {
    Ok(())
}

fn id(value: i64) -> i32 {
    i32::try_from(value).unwrap()
}

fn new_group(name: &str) -> NewGroup {
    NewGroup {
        name: name.to_string(),
        description: "one shot".to_string(),
        schedule: "Sundays".to_string(),
        location: "Online".to_string(),
        chronic: String::new(),
    }
}

#[tokio::test]
async fn denying_rules_block_the_master() {
    let app = spawn_app().await;
    let (alice, token) = app.user("alice").await;
    let group_id = GroupId::new(id(app.create_group(&token, "Dungeon").await));
    let master = UserId::new(id(alice));

    let groups = SeaOrmGroupService::new(app.store.clone(), PaginationConfig::default())
        .with_authorizer(deny_all);

    let err = groups
        .create(master, None, new_group("Keep"))
        .await
        .unwrap_err();
    assert!(matches!(err, GroupError::Forbidden(_)), "{err:?}");

    let patch = GroupPatch {
        name: Some("Renamed".to_string()),
        ..GroupPatch::default()
    };
    let err = groups.update(group_id, master, patch).await.unwrap_err();
    assert_eq!(
        ApiError::from(err).into_response().status(),
        StatusCode::FORBIDDEN
    );

    // Nothing was written.
    let details = groups.get(group_id).await.unwrap();
    assert_eq!(details.group.name, "Dungeon");
}

#[tokio::test]
async fn permissive_rules_let_a_non_master_accept() {
    let app = spawn_app().await;
    let (alice, master_token) = app.user("alice").await;
    let (bob, bob_token) = app.user("bob").await;
    let (carol, _) = app.user("carol").await;
    let group_id = app.create_group(&master_token, "Dungeon").await;

    let (_, body) = app
        .post(
            &format!("/groups/{group_id}/requests"),
            Some(&bob_token),
            serde_json::json!({}),
        )
        .await;
    let request_id = RequestId::new(id(body["groupRequest"]["id"].as_i64().unwrap()));

    let membership =
        SeaOrmMembershipService::new(app.store.clone()).with_authorizer(allow_all);
    let accepted = membership
        .accept_request(GroupId::new(id(group_id)), request_id, UserId::new(id(carol)))
        .await
        .unwrap();
    assert_eq!(accepted.user_id, UserId::new(id(bob)));

    assert_eq!(app.roster(group_id, &master_token).await, vec![alice, bob]);
}

#[tokio::test]
async fn denying_rules_block_self_service_account_updates() {
    let app = spawn_app().await;
    let (alice, _) = app.user("alice").await;

    let security = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        ..SecurityConfig::default()
    };
    let mail = Arc::new(MailQueue::start(Arc::new(LogMailer), &MailConfig::default()));
    let identity =
        SeaOrmIdentityService::new(app.store.clone(), security, mail).with_authorizer(deny_all);

    let user = UserId::new(id(alice));
    let err = identity
        .update_user(user, user, "new@mesa.test", "changed")
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::Forbidden(_)), "{err:?}");
    assert_eq!(
        ApiError::from(err).into_response().status(),
        StatusCode::FORBIDDEN
    );
}
