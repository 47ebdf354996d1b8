use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use planboard::api::middleware::SecurityConfig;
use planboard::api::{create_router, create_router_with_security};
use planboard::db::Database;
use planboard::models::*;
use serde_json::{json, Value};
use uuid::Uuid;

const ALICE: &str = "alice";
const BOB: &str = "bob";

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

fn as_user(request: TestRequest, user: &str) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(user).expect("Invalid header value"),
    )
}

async fn create_test_project(server: &TestServer, owner: &str) -> Project {
    as_user(server.post("/api/projects"), owner)
        .json(&CreateProjectInput {
            name: "Test Project".to_string(),
            description: None,
        })
        .await
        .json::<Project>()
}

async fn create_feature(server: &TestServer, project_id: Uuid, title: &str) -> Feature {
    as_user(
        server.post(&format!("/api/projects/{}/features", project_id)),
        ALICE,
    )
    .json(&CreateFeatureInput {
        title: title.to_string(),
        ..Default::default()
    })
    .await
    .json::<Feature>()
}

async fn list_features(server: &TestServer, project_id: Uuid) -> Vec<Feature> {
    as_user(
        server.get(&format!("/api/projects/{}/features", project_id)),
        ALICE,
    )
    .await
    .json::<Vec<Feature>>()
}

async fn feature_titles(server: &TestServer, project_id: Uuid) -> Vec<String> {
    list_features(server, project_id)
        .await
        .into_iter()
        .map(|f| f.title)
        .collect()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn needs_no_identity() {
        let server = setup();

        let response = server.get("/api/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod projects {
    use super::*;

    #[tokio::test]
    async fn requires_identity() {
        let server = setup();

        server
            .get("/api/projects")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn creates_and_lists_for_the_caller_only() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        create_test_project(&server, BOB).await;

        let response = as_user(server.get("/api/projects"), ALICE).await;

        response.assert_status_ok();
        let projects: Vec<Project> = response.json();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, project.id);
    }

    #[tokio::test]
    async fn malformed_body_uses_the_error_shape() {
        let server = setup();

        let response = as_user(server.post("/api/projects"), ALICE)
            .json(&json!({ "description": "no name" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid request body");
        assert_eq!(body["details"][0]["path"], "");
    }

    #[tokio::test]
    async fn non_json_body_uses_the_error_shape() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;

        let response = as_user(server.post(&format!("/api/projects/{}/tasks", project.id)), ALICE)
            .text("title=Plain text")
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn rejects_blank_name() {
        let server = setup();

        let response = as_user(server.post("/api/projects"), ALICE)
            .json(&json!({ "name": "  " }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["details"][0]["path"], "name");
    }

    #[tokio::test]
    async fn hides_projects_from_non_members() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;

        as_user(server.get(&format!("/api/projects/{}", project.id)), BOB)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        as_user(server.get(&format!("/api/projects/{}", Uuid::new_v4())), ALICE)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn only_owner_deletes() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        as_user(server.post(&format!("/api/projects/{}/members", project.id)), ALICE)
            .json(&json!({ "user_id": BOB }))
            .await
            .assert_status(StatusCode::CREATED);

        as_user(server.delete(&format!("/api/projects/{}", project.id)), BOB)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        as_user(server.delete(&format!("/api/projects/{}", project.id)), ALICE)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        as_user(server.get(&format!("/api/projects/{}", project.id)), ALICE)
            .await
            .assert_status_not_found();
    }
}

mod members {
    use super::*;

    #[tokio::test]
    async fn owner_adds_member() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;

        let response = as_user(server.post(&format!("/api/projects/{}/members", project.id)), ALICE)
            .json(&AddMemberInput {
                user_id: BOB.to_string(),
                role: None,
            })
            .await;

        response.assert_status(StatusCode::CREATED);
        let member: ProjectMember = response.json();
        assert_eq!(member.role, MemberRole::Member);

        let members = as_user(server.get(&format!("/api/projects/{}/members", project.id)), BOB)
            .await
            .json::<Vec<ProjectMember>>();
        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_member_conflicts() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;

        let response = as_user(server.post(&format!("/api/projects/{}/members", project.id)), ALICE)
            .json(&json!({ "user_id": ALICE }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn members_cannot_add_members() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        as_user(server.post(&format!("/api/projects/{}/members", project.id)), ALICE)
            .json(&json!({ "user_id": BOB }))
            .await;

        as_user(server.post(&format!("/api/projects/{}/members", project.id)), BOB)
            .json(&json!({ "user_id": "carol" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}

mod orderable_resources {
    use super::*;

    #[tokio::test]
    async fn features_append_in_creation_order() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;

        create_feature(&server, project.id, "First").await;
        create_feature(&server, project.id, "Second").await;

        let features = list_features(&server, project.id).await;
        let orders: Vec<_> = features.iter().map(|f| f.order).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[tokio::test]
    async fn feature_json_uses_order_field() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        create_feature(&server, project.id, "Only").await;

        let body: Value = as_user(
            server.get(&format!("/api/projects/{}/features", project.id)),
            ALICE,
        )
        .await
        .json();

        assert_eq!(body[0]["order"], 0);
        assert!(body[0].get("sort_order").is_none());
    }

    #[tokio::test]
    async fn rejects_negative_create_order() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;

        as_user(server.post(&format!("/api/projects/{}/features", project.id)), ALICE)
            .json(&json!({ "title": "Bad", "order": -1 }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn comments_are_scoped_to_their_feature() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        let feature = create_feature(&server, project.id, "Thread").await;

        let response = as_user(server.post(&format!("/api/features/{}/comments", feature.id)), ALICE)
            .json(&CreateCommentInput {
                body: "Looks good".to_string(),
                order: None,
            })
            .await;

        response.assert_status(StatusCode::CREATED);
        let comment: Comment = response.json();
        assert_eq!(comment.author, ALICE);
        assert_eq!(comment.feature_id, feature.id);

        as_user(server.get(&format!("/api/features/{}/comments", feature.id)), BOB)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        as_user(server.get(&format!("/api/features/{}/comments", Uuid::new_v4())), ALICE)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn sprint_dates_must_be_ordered() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;

        let response = as_user(server.post(&format!("/api/projects/{}/sprints", project.id)), ALICE)
            .json(&json!({
                "name": "Backwards",
                "starts_on": "2026-10-20",
                "ends_on": "2026-10-10"
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["details"][0]["path"], "ends_on");
    }

    #[tokio::test]
    async fn tasks_filter_by_sprint() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        let sprint = as_user(server.post(&format!("/api/projects/{}/sprints", project.id)), ALICE)
            .json(&json!({ "name": "Sprint 1" }))
            .await
            .json::<Sprint>();

        for (title, sprint_id) in [("Planned", Some(sprint.id)), ("Backlog", None)] {
            as_user(server.post(&format!("/api/projects/{}/tasks", project.id)), ALICE)
                .json(&CreateTaskInput {
                    title: title.to_string(),
                    sprint_id,
                    status: None,
                    order: None,
                })
                .await
                .assert_status(StatusCode::CREATED);
        }

        let tasks = as_user(server.get(&format!("/api/projects/{}/tasks", project.id)), ALICE)
            .add_query_param("sprint_id", sprint.id)
            .await
            .json::<Vec<Task>>();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Planned");
        assert_eq!(tasks[0].status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn tasks_reject_sprints_from_other_projects() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        let other = create_test_project(&server, ALICE).await;
        let sprint = as_user(server.post(&format!("/api/projects/{}/sprints", other.id)), ALICE)
            .json(&json!({ "name": "Elsewhere" }))
            .await
            .json::<Sprint>();

        as_user(server.post(&format!("/api/projects/{}/tasks", project.id)), ALICE)
            .json(&json!({ "title": "Misplaced", "sprint_id": sprint.id }))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn roadmap_items_keep_target_dates() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;

        as_user(server.post(&format!("/api/projects/{}/roadmap-items", project.id)), ALICE)
            .json(&json!({ "title": "Launch", "target_date": "2026-12-01" }))
            .await
            .assert_status(StatusCode::CREATED);

        let items = as_user(
            server.get(&format!("/api/projects/{}/roadmap-items", project.id)),
            ALICE,
        )
        .await
        .json::<Vec<RoadmapItem>>();
        assert_eq!(items[0].target_date.map(|d| d.to_string()).as_deref(), Some("2026-12-01"));
    }
}

mod reorder {
    use super::*;

    #[tokio::test]
    async fn applies_the_batch() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        let a = create_feature(&server, project.id, "a").await;
        let b = create_feature(&server, project.id, "b").await;
        let c = create_feature(&server, project.id, "c").await;

        let response = as_user(server.patch("/api/features/order"), ALICE)
            .json(&json!({
                "items": [
                    { "id": a.id, "order": 2 },
                    { "id": b.id, "order": 0 },
                    { "id": c.id, "order": 1 }
                ]
            }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Order updated successfully" }));
        assert_eq!(feature_titles(&server, project.id).await, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let server = setup();

        as_user(server.patch("/api/sprints/order"), ALICE)
            .json(&json!({ "items": [] }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn rejects_invalid_orders_without_writing() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        let a = create_feature(&server, project.id, "a").await;
        let b = create_feature(&server, project.id, "b").await;

        let response = as_user(server.patch("/api/features/order"), ALICE)
            .json(&json!({
                "items": [
                    { "id": a.id, "order": 5 },
                    { "id": b.id, "order": -1 }
                ]
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid request body");
        assert_eq!(body["details"][0]["path"], "items[1].order");

        let orders: Vec<_> = list_features(&server, project.id)
            .await
            .iter()
            .map(|f| f.order)
            .collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[tokio::test]
    async fn rejects_orders_above_the_maximum() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        let a = create_feature(&server, project.id, "a").await;

        let response = as_user(server.patch("/api/features/order"), ALICE)
            .json(&json!({ "items": [{ "id": a.id, "order": i64::MAX }] }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["details"][0]["message"], "Out of range");

        as_user(server.post(&format!("/api/projects/{}/features", project.id)), ALICE)
            .json(&json!({ "title": "Too far", "order": MAX_ORDER + 1 }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn appends_after_the_maximum_order() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        let a = create_feature(&server, project.id, "a").await;

        as_user(server.patch("/api/features/order"), ALICE)
            .json(&json!({ "items": [{ "id": a.id, "order": MAX_ORDER }] }))
            .await
            .assert_status_ok();

        let response = as_user(server.post(&format!("/api/projects/{}/features", project.id)), ALICE)
            .json(&json!({ "title": "b" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Feature>().order, MAX_ORDER + 1);
        assert_eq!(feature_titles(&server, project.id).await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn reorders_every_project_scoped_resource() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;

        for resource in [Resource::RoadmapItems, Resource::Sprints, Resource::Tasks] {
            let list_path = format!("/api{}", resource.list_path(project.id));
            let label = if resource == Resource::Sprints { "name" } else { "title" };

            let mut ids = Vec::new();
            for name in ["first", "second", "third"] {
                let item = as_user(server.post(&list_path), ALICE)
                    .json(&json!({ label: name }))
                    .await
                    .json::<ItemSummary>();
                ids.push(item.id);
            }

            as_user(server.patch(&format!("/api{}", resource.order_path())), ALICE)
                .json(&json!({
                    "items": [
                        { "id": ids[0], "order": 2 },
                        { "id": ids[1], "order": 0 },
                        { "id": ids[2], "order": 1 }
                    ]
                }))
                .await
                .assert_status_ok();

            let labels: Vec<String> = as_user(server.get(&list_path), ALICE)
                .await
                .json::<Vec<ItemSummary>>()
                .iter()
                .map(|item| item.label().to_string())
                .collect();
            assert_eq!(labels, vec!["second", "third", "first"], "{}", resource);
        }
    }

    #[tokio::test]
    async fn rejects_non_integer_orders() {
        let server = setup();

        let response = as_user(server.patch("/api/tasks/order"), ALICE)
            .json(&json!({ "items": [{ "id": "x", "order": "first" }] }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let server = setup();

        let response = as_user(server.patch("/api/tasks/order"), ALICE)
            .content_type("application/json")
            .text("{ not json")
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn rejects_duplicate_ids() {
        let server = setup();

        let response = as_user(server.patch("/api/features/order"), ALICE)
            .json(&json!({
                "items": [{ "id": "same", "order": 0 }, { "id": "same", "order": 1 }]
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["details"][0]["message"], "Duplicate id in batch");
    }

    #[tokio::test]
    async fn requires_identity() {
        let server = setup();

        server
            .patch("/api/features/order")
            .json(&json!({ "items": [] }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forbids_non_members_and_writes_nothing() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        let a = create_feature(&server, project.id, "a").await;

        as_user(server.patch("/api/features/order"), BOB)
            .json(&json!({ "items": [{ "id": a.id, "order": 9 }] }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        assert_eq!(list_features(&server, project.id).await[0].order, 0);
    }

    #[tokio::test]
    async fn unknown_id_fails_the_whole_batch() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        let a = create_feature(&server, project.id, "a").await;
        let b = create_feature(&server, project.id, "b").await;

        let response = as_user(server.patch("/api/features/order"), ALICE)
            .json(&json!({
                "items": [
                    { "id": a.id, "order": 1 },
                    { "id": Uuid::new_v4(), "order": 2 },
                    { "id": b.id, "order": 0 }
                ]
            }))
            .await;

        response.assert_status_not_found();
        assert_eq!(feature_titles(&server, project.id).await, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn reorders_comments() {
        let server = setup();
        let project = create_test_project(&server, ALICE).await;
        let feature = create_feature(&server, project.id, "Thread").await;
        let mut ids = Vec::new();
        for body in ["one", "two"] {
            let comment = as_user(server.post(&format!("/api/features/{}/comments", feature.id)), ALICE)
                .json(&json!({ "body": body }))
                .await
                .json::<Comment>();
            ids.push(comment.id);
        }

        as_user(server.patch("/api/comments/order"), ALICE)
            .json(&json!({
                "items": [{ "id": ids[0], "order": 1 }, { "id": ids[1], "order": 0 }]
            }))
            .await
            .assert_status_ok();

        let bodies: Vec<_> = as_user(server.get(&format!("/api/features/{}/comments", feature.id)), ALICE)
            .await
            .json::<Vec<Comment>>()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(bodies, vec!["two", "one"]);
    }
}

mod security {
    use super::*;

    fn secured(config: SecurityConfig) -> TestServer {
        let db = Database::open_memory().expect("Failed to create database");
        db.migrate().expect("Failed to migrate");
        TestServer::new(create_router_with_security(db, config)).expect("Failed to create test server")
    }

    #[tokio::test]
    async fn api_key_is_required_when_configured() {
        let server = secured(SecurityConfig::with_api_key("secret"));

        as_user(server.get("/api/projects"), ALICE)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        as_user(server.get("/api/projects"), ALICE)
            .authorization_bearer("secret")
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn health_skips_the_api_key() {
        let server = secured(SecurityConfig::with_api_key("secret"));

        server.get("/api/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn rate_limit_rejects_excess_requests() {
        let server = secured(SecurityConfig::with_rate_limit(2));

        for _ in 0..2 {
            as_user(server.get("/api/projects"), ALICE)
                .await
                .assert_status_ok();
        }
        as_user(server.get("/api/projects"), ALICE)
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);
    }
}
