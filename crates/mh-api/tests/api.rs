//! End-to-end tests: real routes, real SQLite (in memory).

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use mh_api::handlers::AppState;
use mh_api::{configure_pages, configure_routes};
use mh_core::events::AdminGate;
use mh_db_sqlite::SqliteRepo;
use secrecy::SecretString;
use serde_json::{json, Value};

const ADMIN_CODE: &str = "letmein";

async fn state() -> web::Data<AppState> {
    let repo = SqliteRepo::new("sqlite::memory:").await.expect("in-memory database");
    web::Data::new(AppState {
        community: Box::new(repo.clone()),
        events: Box::new(repo.clone()),
        projects: Box::new(repo),
        admin: AdminGate::new(Some(SecretString::from(ADMIN_CODE.to_string()))),
    })
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .configure(configure_routes)
                .configure(configure_pages),
        )
        .await
    };
}

macro_rules! post_json {
    ($app:expr, $uri:expr, $body:expr) => {
        test::call_service(&$app, test::TestRequest::post().uri($uri).set_json($body).to_request()).await
    };
}

macro_rules! create_thread {
    ($app:expr, $body:expr) => {{
        let resp = post_json!($app, "/api/community", $body);
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        created
    }};
}

#[actix_web::test]
async fn new_thread_is_listed_first_with_its_attributes() {
    let state = state().await;
    let app = app!(state);

    create_thread!(app, json!({ "title": "Older question", "body": "...", "tag": "Q&A" }));
    let created = create_thread!(
        app,
        json!({ "title": "Water reuse pilot", "body": "...", "tag": "Case Study", "country": "Germany" })
    );
    assert_eq!(created["tag"], "Case Study");

    let list: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/community").to_request()).await;
    let first = &list[0];
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert_eq!(first["title"], "Water reuse pilot");
    assert_eq!(first["tag"], "Case Study");
    assert_eq!(first["country"], "Germany");
    assert_eq!(first["likes"], 0);
    assert_eq!(first["replies"], 0);
    assert_eq!(first["author"], "Demo User");
    assert!(first.get("mine").is_none());
}

#[actix_web::test]
async fn thread_without_title_is_a_client_error() {
    let state = state().await;
    let app = app!(state);

    let resp = post_json!(app, "/api/community", json!({ "body": "no title" }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Title and body are required");

    let resp = post_json!(app, "/api/community", json!({ "title": "t", "body": "b", "tag": "Gossip" }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn likes_go_up_by_one_each_time() {
    let state = state().await;
    let app = app!(state);
    let thread = create_thread!(app, json!({ "title": "Pump sizing", "body": "..." }));
    let uri = format!("/api/community/{}/like", thread["id"].as_str().unwrap());

    let first: Value = test::call_and_read_body_json(&app, test::TestRequest::post().uri(&uri).to_request()).await;
    let second: Value = test::call_and_read_body_json(&app, test::TestRequest::post().uri(&uri).to_request()).await;
    assert_eq!(first, json!({ "likes": 1 }));
    assert_eq!(second, json!({ "likes": 2 }));
}

#[actix_web::test]
async fn liking_a_missing_thread_is_not_found() {
    let state = state().await;
    let app = app!(state);

    for id in ["018f7c1e-0000-7000-8000-000000000000", "not-a-uuid"] {
        let req = test::TestRequest::post().uri(&format!("/api/community/{id}/like")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

#[actix_web::test]
async fn replies_are_counted_and_blank_ones_rejected() {
    let state = state().await;
    let app = app!(state);
    let thread = create_thread!(app, json!({ "title": "Grout curtain", "body": "..." }));
    let id = thread["id"].as_str().unwrap();
    let reply_uri = format!("/api/community/{id}/reply");

    let resp = post_json!(app, &reply_uri, json!({ "body": "   " }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = post_json!(app, &reply_uri, json!({ "body": "We used a double row." }));
    assert_eq!(resp.status(), StatusCode::OK);
    let reply: Value = test::read_body_json(resp).await;
    assert_eq!(reply["author"], "You");
    assert_eq!(reply["role"], "Community member");
    assert!(reply["createdAt"].as_str().unwrap().ends_with('Z'));

    let detail: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri(&format!("/api/community/{id}")).to_request()).await;
    assert_eq!(detail["thread"]["replies"], 1);
    assert_eq!(detail["replies"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn event_with_wrong_code_is_rejected_and_not_stored() {
    let state = state().await;
    let app = app!(state);

    let resp = post_json!(
        app,
        "/api/events",
        json!({ "adminCode": "guess", "title": "Mine Water Congress", "date": "2099-06-01" })
    );
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let schedule: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/events").to_request()).await;
    assert_eq!(schedule, json!({ "upcoming": [], "past": [] }));
}

#[actix_web::test]
async fn admin_can_create_events() {
    let state = state().await;
    let app = app!(state);

    let resp = post_json!(app, "/api/events", json!({ "adminCode": ADMIN_CODE, "title": "No date" }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = post_json!(
        app,
        "/api/events",
        json!({ "adminCode": ADMIN_CODE, "title": "Mine Water Congress", "date": "2099-06-01", "country": "Poland" })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["event"]["country"], "Poland");

    let schedule: Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/events").to_request()).await;
    assert_eq!(schedule["upcoming"][0]["title"], "Mine Water Congress");

    let resp = post_json!(
        app,
        "/api/events",
        json!({ "adminCode": ADMIN_CODE, "title": "Site visit", "date": "2099-06-02T09:30" })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert!(created["event"]["date"].as_str().unwrap().starts_with("2099-06-02T09:30:00"));
}

#[actix_web::test]
async fn project_lifecycle() {
    let state = state().await;
    let app = app!(state);

    let resp = post_json!(app, "/api/projects", json!({ "title": "ab" }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Title must be at least 3 characters");

    let resp = post_json!(app, "/api/projects", json!({ "title": " Pit lake closure ", "tags": ["closure"] }));
    assert_eq!(resp.status(), StatusCode::CREATED);
    let project: Value = test::read_body_json(resp).await;
    assert_eq!(project["title"], "Pit lake closure");
    assert_eq!(project["owner"]["email"], "demo@mininghub.local");
    let uri = format!("/api/projects/{}", project["id"].as_str().unwrap());

    let req = test::TestRequest::patch().uri(&uri).set_json(json!({ "summary": "Backfill study" })).to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["summary"], "Backfill study");
    assert_eq!(updated["tags"], json!(["closure"]));

    let req = test::TestRequest::patch().uri(&uri).set_json(json!({ "title": "x" })).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let deleted: Value = test::call_and_read_body_json(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
    assert_eq!(deleted, json!({ "ok": true }));

    let resp = test::call_service(&app, test::TestRequest::delete().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ok"], false);
}

#[actix_web::test]
async fn pages_render_and_unknown_ids_are_404() {
    let state = state().await;
    let app = app!(state);
    let thread = create_thread!(app, json!({ "title": "Seepage <modelling>", "body": "line 1\nline 2" }));

    for uri in ["/", "/community", "/events", "/projects", "/projects?page=oops", "/projects?page=9223372036854775807"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }

    let uri = format!("/community/{}", thread["id"].as_str().unwrap());
    let html = test::call_and_read_body(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    let html = String::from_utf8(html.to_vec()).unwrap();
    assert!(html.contains("Seepage &lt;modelling&gt;"));
    assert!(html.contains("line 1<br />line 2"));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/events/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
