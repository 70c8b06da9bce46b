mod common;

use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{rt, test, web, App, HttpServer};
use chrono::{Duration, Utc};
use common::{bearer, create_task, init_app, register_and_login, send, test_config};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::TcpListener;
use taskdesk::auth::AuthMiddleware;
use taskdesk::models::{TaskPriority, TaskStatus};
use taskdesk::routes::{self, health};
use taskdesk::AppState;

fn due_in(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339()
}

fn checklist(flags: &[bool]) -> Value {
    Value::Array(
        flags
            .iter()
            .enumerate()
            .map(|(i, done)| json!({ "text": format!("step {}", i + 1), "completed": done }))
            .collect(),
    )
}

#[test_log::test(actix_rt::test)]
async fn test_task_crud_as_admin() {
    let app = init_app().await;
    let admin = register_and_login(&app, "Admin", "admin@example.com", true).await;
    let member = register_and_login(&app, "Member", "member@example.com", false).await;

    let task = create_task(
        &app,
        &admin,
        json!({
            "title": "Prepare quarterly report",
            "description": "Numbers for Q3",
            "priority": TaskPriority::High,
            "dueDate": "2030-06-30",
            "assignedTo": [member.id, member.id],
            "attachments": ["https://files.example.com/q3.xlsx"],
            "todoChecklist": checklist(&[true, false, false])
        }),
    )
    .await;

    assert_eq!(task["progress"], 33);
    assert_eq!(task["status"], "In Progress");
    assert_eq!(task["priority"], "High");
    assert_eq!(task["todoCount"], 3);
    assert_eq!(task["completedTodos"], 1);
    assert_eq!(task["dueDate"], "2030-06-30T00:00:00Z");
    assert_eq!(task["assignedTo"].as_array().unwrap().len(), 1);
    assert_eq!(task["assignedTo"][0]["name"], "Member");
    assert_eq!(task["createdBy"]["email"], "admin@example.com");
    let task_id = task["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/tasks/{}", task_id))
            .append_header(bearer(&member.token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["task"]["title"], "Prepare quarterly report");

    let (status, body) = send(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/tasks/{}", task_id))
            .append_header(bearer(&admin.token))
            .set_json(&json!({ "title": "Prepare annual report", "priority": "Low" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Body: {}", body);
    let updated = &body["data"]["task"];
    assert_eq!(updated["title"], "Prepare annual report");
    assert_eq!(updated["priority"], "Low");
    assert_eq!(updated["progress"], 33);
    assert_eq!(updated["description"], "Numbers for Q3");

    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/tasks/{}", task_id))
            .append_header(bearer(&admin.token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for req in [
        test::TestRequest::get().uri(&format!("/api/tasks/{}", task_id)),
        test::TestRequest::delete().uri(&format!("/api/tasks/{}", task_id)),
    ] {
        let (status, body) = send(&app, req.append_header(bearer(&admin.token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Task not found");
    }
}

#[actix_rt::test]
async fn test_members_cannot_use_admin_task_routes() {
    let app = init_app().await;
    let admin = register_and_login(&app, "Admin", "admin@example.com", true).await;
    let member = register_and_login(&app, "Member", "member@example.com", false).await;
    let task = create_task(
        &app,
        &admin,
        json!({ "title": "Admin owned", "dueDate": due_in(3), "assignedTo": [member.id] }),
    )
    .await;
    let task_uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let requests = [
        test::TestRequest::post()
            .uri("/api/tasks")
            .set_json(&json!({ "title": "Sneaky", "dueDate": due_in(1) })),
        test::TestRequest::patch()
            .uri(&task_uri)
            .set_json(&json!({ "title": "Renamed by member" })),
        test::TestRequest::delete().uri(&task_uri),
        test::TestRequest::get().uri("/api/tasks/dashboard-data"),
    ];
    for req in requests {
        let (status, body) = send(&app, req.append_header(bearer(&member.token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "Body: {}", body);
        assert_eq!(body["status"], "fail");
    }
}

#[actix_rt::test]
async fn test_status_update_requires_assignment() {
    let app = init_app().await;
    let admin = register_and_login(&app, "Admin", "admin@example.com", true).await;
    let member = register_and_login(&app, "Member", "member@example.com", false).await;
    let task = create_task(
        &app,
        &admin,
        json!({
            "title": "Migrate database",
            "dueDate": due_in(5),
            "todoChecklist": checklist(&[true, false, false])
        }),
    )
    .await;
    let task_id = task["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/tasks/status/{}", task_id);

    let (status, _) = send(
        &app,
        test::TestRequest::patch()
            .uri(&status_uri)
            .append_header(bearer(&member.token))
            .set_json(&json!({ "status": TaskStatus::Completed })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/tasks/{}", task_id))
            .append_header(bearer(&admin.token))
            .set_json(&json!({ "assignedTo": [member.id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        test::TestRequest::patch()
            .uri(&status_uri)
            .append_header(bearer(&member.token))
            .set_json(&json!({ "status": TaskStatus::Completed })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Body: {}", body);
    let completed = &body["data"]["task"];
    assert_eq!(completed["status"], "Completed");
    assert_eq!(completed["progress"], 100);
    assert_eq!(completed["completedTodos"], 3);

    let (_, body) = send(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/tasks/{}", task_id))
            .append_header(bearer(&member.token)),
    )
    .await;
    let stored = &body["data"]["task"];
    assert_eq!(stored["progress"], 100);
    assert!(stored["todoChecklist"]
        .as_array()
        .unwrap()
        .iter()
        .all(|item| item["completed"] == true));

    // a non-Completed status keeps the checklist as it is
    let (_, body) = send(
        &app,
        test::TestRequest::patch()
            .uri(&status_uri)
            .append_header(bearer(&admin.token))
            .set_json(&json!({ "status": "Pending" })),
    )
    .await;
    assert_eq!(body["data"]["task"]["status"], "Pending");
    assert_eq!(body["data"]["task"]["progress"], 100);
}

#[actix_rt::test]
async fn test_checklist_update_derives_progress() {
    let app = init_app().await;
    let admin = register_and_login(&app, "Admin", "admin@example.com", true).await;
    let member = register_and_login(&app, "Member", "member@example.com", false).await;
    let task = create_task(
        &app,
        &admin,
        json!({ "title": "Onboard new hire", "dueDate": due_in(2), "assignedTo": [member.id] }),
    )
    .await;
    assert_eq!(task["status"], "Pending");
    let checklist_uri = format!("/api/tasks/checklist/{}", task["id"].as_str().unwrap());

    let cases = [
        (vec![true, false, false], 33, "In Progress"),
        (vec![true, true], 100, "Completed"),
        (vec![], 0, "Pending"),
        (vec![true, false], 50, "In Progress"),
    ];
    for (flags, progress, expected_status) in cases {
        let (status, body) = send(
            &app,
            test::TestRequest::patch()
                .uri(&checklist_uri)
                .append_header(bearer(&member.token))
                .set_json(&json!({ "todoChecklist": checklist(&flags) })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "Body: {}", body);
        assert_eq!(body["data"]["task"]["progress"], progress, "{flags:?}");
        assert_eq!(body["data"]["task"]["status"], expected_status, "{flags:?}");
    }

    let (status, _) = send(
        &app,
        test::TestRequest::patch()
            .uri(&checklist_uri)
            .append_header(bearer(&member.token))
            .set_json(&json!({ "todoChecklist": [{ "text": "   ", "completed": false }] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_rt::test]
async fn test_checklist_update_requires_assignment() {
    let app = init_app().await;
    let admin = register_and_login(&app, "Admin", "admin@example.com", true).await;
    let member = register_and_login(&app, "Member", "member@example.com", false).await;
    let task = create_task(
        &app,
        &admin,
        json!({ "title": "Prepare release notes", "dueDate": due_in(3) }),
    )
    .await;
    let task_id = task["id"].as_str().unwrap().to_string();
    let checklist_uri = format!("/api/tasks/checklist/{}", task_id);
    let payload = json!({ "todoChecklist": checklist(&[true, false]) });

    let (status, body) = send(
        &app,
        test::TestRequest::patch()
            .uri(&checklist_uri)
            .append_header(bearer(&member.token))
            .set_json(&payload),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "Body: {}", body);
    assert_eq!(body["message"], "Not authorized to update this task");

    let (_, body) = send(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/tasks/{}", task_id))
            .append_header(bearer(&admin.token)),
    )
    .await;
    assert_eq!(body["data"]["task"]["todoChecklist"], json!([]));

    let (status, _) = send(
        &app,
        test::TestRequest::patch()
            .uri(&format!("/api/tasks/{}", task_id))
            .append_header(bearer(&admin.token))
            .set_json(&json!({ "assignedTo": [member.id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        test::TestRequest::patch()
            .uri(&checklist_uri)
            .append_header(bearer(&member.token))
            .set_json(&payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Body: {}", body);
    assert_eq!(body["data"]["task"]["progress"], 50);
    assert_eq!(body["data"]["task"]["status"], "In Progress");
}

#[actix_rt::test]
async fn test_huge_page_number_returns_empty_page() {
    let app = init_app().await;
    let admin = register_and_login(&app, "Admin", "admin@example.com", true).await;
    create_task(
        &app,
        &admin,
        json!({ "title": "Only task", "dueDate": due_in(1) }),
    )
    .await;

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/tasks?page={}&limit=100", i64::MAX))
            .append_header(bearer(&admin.token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Body: {}", body);
    assert_eq!(body["data"]["tasks"], json!([]));
    assert_eq!(body["data"]["totalTasks"], 1);
}

#[actix_rt::test]
async fn test_task_creation_validation() {
    let app = init_app().await;
    let admin = register_and_login(&app, "Admin", "admin@example.com", true).await;

    let test_cases = vec![
        (
            json!({ "title": "No due date" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "missing dueDate",
        ),
        (
            json!({ "title": "ab", "dueDate": "2030-01-01" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "title too short",
        ),
        (
            json!({ "title": "Long text", "description": "x".repeat(501), "dueDate": "2030-01-01" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "description too long",
        ),
        (
            json!({ "title": "Bad date", "dueDate": "someday" }),
            StatusCode::BAD_REQUEST,
            "unparsable dueDate",
        ),
        (
            json!({ "title": "Bad priority", "dueDate": "2030-01-01", "priority": "Urgent" }),
            StatusCode::BAD_REQUEST,
            "unknown priority",
        ),
        (
            json!({ "dueDate": "2030-01-01" }),
            StatusCode::BAD_REQUEST,
            "missing title",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let (status, body) = send(
            &app,
            test::TestRequest::post()
                .uri("/api/tasks")
                .append_header(bearer(&admin.token))
                .set_json(&payload),
        )
        .await;
        assert_eq!(
            status, expected_status,
            "Test case failed: {}. Body: {}",
            description, body
        );
    }

    let (status, _) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/tasks/not-a-uuid")
            .append_header(bearer(&admin.token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_explicit_status_on_create_goes_through_override() {
    let app = init_app().await;
    let admin = register_and_login(&app, "Admin", "admin@example.com", true).await;

    let task = create_task(
        &app,
        &admin,
        json!({
            "title": "Already done",
            "dueDate": due_in(1),
            "status": "Completed",
            "todoChecklist": checklist(&[false, false])
        }),
    )
    .await;

    assert_eq!(task["status"], "Completed");
    assert_eq!(task["progress"], 100);
    assert_eq!(task["completedTodos"], 2);
}

#[actix_rt::test]
async fn test_list_tasks_scoping_filtering_and_pagination() {
    let app = init_app().await;
    let admin = register_and_login(&app, "Admin", "admin@example.com", true).await;
    let member = register_and_login(&app, "Member", "member@example.com", false).await;

    let mut member_task_ids = Vec::new();
    for n in 1..=7 {
        let assigned = if n % 2 == 1 { json!([member.id]) } else { json!([]) };
        let flags: &[bool] = if n == 7 { &[true] } else { &[] };
        let task = create_task(
            &app,
            &admin,
            json!({
                "title": format!("Task number {}", n),
                "dueDate": due_in(n),
                "assignedTo": assigned,
                "todoChecklist": checklist(flags)
            }),
        )
        .await;
        if n % 2 == 1 {
            member_task_ids.push(task["id"].clone());
        }
    }

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/tasks")
            .append_header(bearer(&admin.token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["page"], 1);
    assert_eq!(data["limit"], 5);
    assert_eq!(data["totalTasks"], 7);
    assert_eq!(data["tasksCount"], 7);
    assert_eq!(data["tasks"].as_array().unwrap().len(), 5);
    assert_eq!(data["tasks"][0]["title"], "Task number 7");
    assert_eq!(
        data["statusSummary"],
        json!({ "Pending": 6, "In Progress": 0, "Completed": 1 })
    );

    let (_, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/tasks?page=2&limit=5")
            .append_header(bearer(&admin.token)),
    )
    .await;
    let titles: Vec<_> = body["data"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Task number 2", "Task number 1"]);

    let (_, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/tasks?limit=10")
            .append_header(bearer(&member.token)),
    )
    .await;
    let data = &body["data"];
    assert_eq!(data["totalTasks"], 4);
    let ids: Vec<_> = data["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].clone())
        .collect();
    assert_eq!(ids.len(), 4);
    assert!(ids.iter().all(|id| member_task_ids.contains(id)));

    let (_, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/tasks?status=Completed")
            .append_header(bearer(&member.token)),
    )
    .await;
    let data = &body["data"];
    assert_eq!(data["totalTasks"], 1);
    assert_eq!(data["tasksCount"], 4);
    assert_eq!(data["statusSummary"]["Completed"], 1);
    assert_eq!(data["tasks"][0]["title"], "Task number 7");

    let (_, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/tasks?status=In%20Progress")
            .append_header(bearer(&member.token)),
    )
    .await;
    assert_eq!(body["data"]["totalTasks"], 0);

    for (uri, expected_status) in [
        ("/api/tasks?limit=0", StatusCode::UNPROCESSABLE_ENTITY),
        ("/api/tasks?limit=101", StatusCode::UNPROCESSABLE_ENTITY),
        ("/api/tasks?page=0", StatusCode::UNPROCESSABLE_ENTITY),
        ("/api/tasks?limit=abc", StatusCode::BAD_REQUEST),
        ("/api/tasks?status=Done", StatusCode::BAD_REQUEST),
    ] {
        let (status, _) = send(
            &app,
            test::TestRequest::get()
                .uri(uri)
                .append_header(bearer(&admin.token)),
        )
        .await;
        assert_eq!(status, expected_status, "{uri}");
    }
}

#[actix_rt::test]
async fn test_dashboards_count_overdue_until_completed() {
    let app = init_app().await;
    let admin = register_and_login(&app, "Admin", "admin@example.com", true).await;
    let member = register_and_login(&app, "Member", "member@example.com", false).await;

    let overdue = create_task(
        &app,
        &admin,
        json!({
            "title": "Late filing",
            "dueDate": due_in(-2),
            "assignedTo": [member.id],
            "todoChecklist": checklist(&[true, false])
        }),
    )
    .await;
    create_task(
        &app,
        &admin,
        json!({ "title": "Future planning", "dueDate": due_in(10) }),
    )
    .await;

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/tasks/dashboard-data")
            .append_header(bearer(&admin.token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Body: {}", body);
    let data = &body["data"];
    assert_eq!(data["totalTasks"], 2);
    assert_eq!(data["pendingTasks"], 1);
    assert_eq!(data["inProgressTasks"], 1);
    assert_eq!(data["completedTasks"], 0);
    assert_eq!(data["overdueTasks"], 1);
    assert_eq!(data["recentTasks"][0]["title"], "Future planning");
    let recent_due = data["recentTasks"][1]["dueDate"].as_str().unwrap();
    assert_eq!(recent_due.len(), "YYYY-MM-DD".len());

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/tasks/user-data")
            .append_header(bearer(&member.token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalTasks"], 1);
    assert_eq!(body["data"]["overdueTasks"], 1);
    assert_eq!(body["data"]["recentTasks"][0]["title"], "Late filing");

    let (status, _) = send(
        &app,
        test::TestRequest::patch()
            .uri(&format!(
                "/api/tasks/status/{}",
                overdue["id"].as_str().unwrap()
            ))
            .append_header(bearer(&member.token))
            .set_json(&json!({ "status": "Completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/tasks/dashboard-data")
            .append_header(bearer(&admin.token)),
    )
    .await;
    assert_eq!(body["data"]["overdueTasks"], 0);
    assert_eq!(body["data"]["completedTasks"], 1);
}

#[actix_rt::test]
async fn test_create_task_unauthorized() {
    let config = test_config();
    let state = web::Data::new(AppState::in_memory(&config));
    let tokens = state.tokens.clone();

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let server_handle = rt::spawn(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .service(health::health)
                .service(
                    web::scope("/api")
                        .wrap(AuthMiddleware::new(tokens.clone()))
                        .configure(routes::config),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", port))
        .unwrap_or_else(|_| panic!("Failed to bind to port {}", port))
        .run()
        .await
    });

    // Give the server a moment to start
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://127.0.0.1:{}/api/tasks", port))
        .json(&json!({ "title": "Unauthorized Task", "dueDate": "2030-01-01" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("error envelope is JSON");
    assert_eq!(body["status"], "fail");

    let health = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(health.status(), reqwest::StatusCode::OK);

    server_handle.abort();
}
