mod common;

use axum::http::StatusCode;
use mesa::domain::{GroupId, RequestStatus, UserId};
use serde_json::{Value, json};

use common::{TestApp, spawn_app};

async fn request_join(app: &TestApp, group_id: i64, token: &str) -> (StatusCode, Value) {
    app.post(&format!("/groups/{group_id}/requests"), Some(token), json!({}))
        .await
}

async fn accept(app: &TestApp, group_id: i64, request_id: i64, token: &str) -> StatusCode {
    app.post(
        &format!("/groups/{group_id}/requests/{request_id}/accept"),
        Some(token),
        json!({}),
    )
    .await
    .0
}

#[tokio::test]
async fn join_workflow_adds_player() {
    let app = spawn_app().await;
    let (alice, master) = app.user("alice").await;
    let (bob, bob_token) = app.user("bob").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    let (status, body) = request_join(&app, group_id, &bob_token).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["groupRequest"]["status"], "PENDING");
    assert_eq!(body["groupRequest"]["userId"], bob);
    assert_eq!(body["groupRequest"]["groupId"], group_id);
    let request_id = body["groupRequest"]["id"].as_i64().unwrap();

    let (status, body) = app
        .get(&format!("/groups/{group_id}/requests?master={alice}"), &master)
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["groupRequests"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], request_id);
    assert_eq!(listed[0]["user"]["username"], "bob");
    assert_eq!(listed[0]["group"]["name"], "Dungeon");

    let (status, body) = app
        .post(
            &format!("/groups/{group_id}/requests/{request_id}/accept"),
            Some(&master),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groupRequest"]["status"], "ACCEPTED");
    assert_eq!(app.roster(group_id, &master).await, vec![alice, bob]);

    // Accepted requests stay visible to the master.
    let (_, body) = app
        .get(&format!("/groups/{group_id}/requests?master={alice}"), &master)
        .await;
    assert_eq!(body["groupRequests"][0]["status"], "ACCEPTED");
}

#[tokio::test]
async fn duplicate_pending_request_conflicts() {
    let app = spawn_app().await;
    let (_, master) = app.user("alice").await;
    let (_, bob_token) = app.user("bob").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    assert_eq!(request_join(&app, group_id, &bob_token).await.0, StatusCode::CREATED);
    assert_eq!(request_join(&app, group_id, &bob_token).await.0, StatusCode::CONFLICT);
}

#[tokio::test]
async fn members_cannot_request_again() {
    let app = spawn_app().await;
    let (_, master) = app.user("alice").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    let (status, body) = request_join(&app, group_id, &master).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
}

#[tokio::test]
async fn request_for_missing_group_is_not_found() {
    let app = spawn_app().await;
    let (_, token) = app.user("bob").await;

    assert_eq!(request_join(&app, 404, &token).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_is_empty_for_anyone_but_the_master() {
    let app = spawn_app().await;
    let (_, master) = app.user("alice").await;
    let (bob, bob_token) = app.user("bob").await;
    let group_id = app.create_group(&master, "Dungeon").await;
    request_join(&app, group_id, &bob_token).await;

    let (status, body) = app
        .get(&format!("/groups/{group_id}/requests?master={bob}"), &bob_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["groupRequests"], json!([]));
}

#[tokio::test]
async fn list_requires_master_parameter() {
    let app = spawn_app().await;
    let (_, master) = app.user("alice").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    for query in ["", "?master=0", "?master=abc"] {
        let (status, _) = app
            .get(&format!("/groups/{group_id}/requests{query}"), &master)
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{query}");
    }
}

#[tokio::test]
async fn only_master_accepts_and_only_once() {
    let app = spawn_app().await;
    let (_, master) = app.user("alice").await;
    let (_, bob_token) = app.user("bob").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    let (_, body) = request_join(&app, group_id, &bob_token).await;
    let request_id = body["groupRequest"]["id"].as_i64().unwrap();

    assert_eq!(
        accept(&app, group_id, request_id, &bob_token).await,
        StatusCode::FORBIDDEN
    );
    assert_eq!(accept(&app, group_id, request_id, &master).await, StatusCode::OK);
    assert_eq!(
        accept(&app, group_id, request_id, &master).await,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn accept_checks_request_belongs_to_group() {
    let app = spawn_app().await;
    let (_, master) = app.user("alice").await;
    let (_, bob_token) = app.user("bob").await;
    let first = app.create_group(&master, "Dungeon").await;
    let second = app.create_group(&master, "Keep").await;

    let (_, body) = request_join(&app, first, &bob_token).await;
    let request_id = body["groupRequest"]["id"].as_i64().unwrap();

    assert_eq!(
        accept(&app, second, request_id, &master).await,
        StatusCode::NOT_FOUND
    );
    assert_eq!(accept(&app, first, 999, &master).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reject_deletes_request_and_allows_new_one() {
    let app = spawn_app().await;
    let (alice, master) = app.user("alice").await;
    let (_, bob_token) = app.user("bob").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    let (_, body) = request_join(&app, group_id, &bob_token).await;
    let request_id = body["groupRequest"]["id"].as_i64().unwrap();

    let (status, body) = app
        .delete(&format!("/groups/{group_id}/requests/{request_id}"), &master)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (_, body) = app
        .get(&format!("/groups/{group_id}/requests?master={alice}"), &master)
        .await;
    assert_eq!(body["groupRequests"], json!([]));
    assert_eq!(app.roster(group_id, &master).await, vec![alice]);

    assert_eq!(request_join(&app, group_id, &bob_token).await.0, StatusCode::CREATED);
}

#[tokio::test]
async fn requester_may_withdraw_but_stranger_may_not_reject() {
    let app = spawn_app().await;
    let (_, master) = app.user("alice").await;
    let (_, bob_token) = app.user("bob").await;
    let (_, carol_token) = app.user("carol").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    let (_, body) = request_join(&app, group_id, &bob_token).await;
    let request_id = body["groupRequest"]["id"].as_i64().unwrap();
    let uri = format!("/groups/{group_id}/requests/{request_id}");

    assert_eq!(app.delete(&uri, &carol_token).await.0, StatusCode::FORBIDDEN);
    assert_eq!(app.delete(&uri, &bob_token).await.0, StatusCode::OK);
    assert_eq!(app.delete(&uri, &bob_token).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn accepted_request_cannot_be_rejected() {
    let app = spawn_app().await;
    let (_, master) = app.user("alice").await;
    let (_, bob_token) = app.user("bob").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    let (_, body) = request_join(&app, group_id, &bob_token).await;
    let request_id = body["groupRequest"]["id"].as_i64().unwrap();
    accept(&app, group_id, request_id, &master).await;

    let (status, _) = app
        .delete(&format!("/groups/{group_id}/requests/{request_id}"), &master)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn pending_pair_index_rejects_second_insert() {
    let app = spawn_app().await;
    let (_, master) = app.user("alice").await;
    let bob = app.register("bob").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    let requests = app.store.group_requests();
    let user = UserId::new(i32::try_from(bob).unwrap());
    let group = GroupId::new(i32::try_from(group_id).unwrap());

    let first = requests.create_pending(user, group).await.unwrap().unwrap();
    assert_eq!(first.status, RequestStatus::Pending);
    assert!(requests.create_pending(user, group).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_requests_for_one_pair_yield_one_pending_row() {
    let app = spawn_app().await;
    let (alice, master) = app.user("alice").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    for round in 0..4 {
        let (_, token) = app.user(&format!("racer{round}")).await;

        let (first, second) = tokio::join!(
            request_join(&app, group_id, &token),
            request_join(&app, group_id, &token),
        );

        let mut statuses = [first.0, second.0];
        statuses.sort();
        assert_eq!(
            statuses,
            [StatusCode::CREATED, StatusCode::CONFLICT],
            "round {round}: {first:?} {second:?}"
        );
    }

    let (_, body) = app
        .get(&format!("/groups/{group_id}/requests?master={alice}"), &master)
        .await;
    let listed = body["groupRequests"].as_array().unwrap();
    assert_eq!(listed.len(), 4);
    assert!(listed.iter().all(|r| r["status"] == "PENDING"));
}

#[tokio::test]
async fn blank_master_parameter_is_unprocessable() {
    let app = spawn_app().await;
    let (_, master) = app.user("alice").await;
    let group_id = app.create_group(&master, "Dungeon").await;

    let (status, body) = app
        .get(&format!("/groups/{group_id}/requests?master="), &master)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "master must be a positive integer");
}
