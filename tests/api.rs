// HTTP-level tests: drive the router with tower's oneshot

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rusqlite::Connection;
use serde_json::{json, Value};
use tower::ServiceExt;

use team_scoreboard::server::{router, AppState};
use team_scoreboard::{default_roster, initialize_if_empty, setup_database, Config};

fn app_with(config: Config) -> Router {
    let mut conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    initialize_if_empty(&mut conn, &default_roster(), &config.seed_teacher()).unwrap();
    router(AppState::new(conn, config))
}

fn app() -> Router {
    app_with(Config::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

async fn login(app: &Router) -> Value {
    let (status, body) = post(
        app,
        "/api/login",
        json!({"teacherId": "ENS001", "password": "password123"}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

async fn team_id(app: &Router, name: &str) -> String {
    let (_, teams) = get(app, "/api/teams").await;
    teams
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == name)
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string()
}

fn team_row<'a>(teams: &'a Value, name: &str) -> &'a Value {
    teams
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == name)
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(&app(), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_teams_listing_shape() {
    let (status, body) = get(&app(), "/api/teams").await;
    assert_eq!(status, StatusCode::OK);

    let teams = body.as_array().unwrap();
    assert_eq!(teams.len(), 4);
    assert_eq!(teams[0]["name"], "Les Aigles");
    assert_eq!(teams[0]["members"], json!(["Emma", "Lucas", "Chloé", "Antoine"]));
    assert_eq!(teams[0]["icon"], "fas fa-eagle");
    assert_eq!(teams[0]["color"], "blue");
    assert_eq!(teams[0]["totalScore"], 0);
    assert_eq!(teams[0]["recentChange"], 0);
}

#[tokio::test]
async fn test_login_success_and_failures() {
    let app = app();

    let body = login(&app).await;
    assert_eq!(body["message"], "Connexion réussie");
    assert_eq!(body["teacher"]["teacherId"], "ENS001");
    assert!(body["teacher"]["id"].is_string());
    assert!(body["teacher"].get("password").is_none());
    assert!(body["token"].is_string());

    let (status, wrong) = post(
        &app,
        "/api/login",
        json!({"teacherId": "ENS001", "password": "wrong"}),
        None,
    )
    .await;
    let (_, unknown) = post(
        &app,
        "/api/login",
        json!({"teacherId": "ENS999", "password": "password123"}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
    assert_eq!(wrong["message"], "Identifiant ou mot de passe incorrect");

    let (status, body) = post(&app, "/api/login", json!({"teacherId": "ENS001"}), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Le mot de passe est requis");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/score-entries")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_score_entry_scenario() {
    let app = app();
    let teacher_id = login(&app).await["teacher"]["id"].as_str().unwrap().to_string();
    let aigles = team_id(&app, "Les Aigles").await;

    let (status, body) = post(
        &app,
        "/api/score-entries",
        json!({"teamId": aigles, "teacherId": teacher_id, "action": "emprunter un livre au CDI", "points": 50}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Score bien saisi !");
    assert_eq!(body["scoreEntry"]["points"], 50);
    assert_eq!(body["scoreEntry"]["teamId"], aigles.as_str());

    let (_, teams) = get(&app, "/api/teams").await;
    assert_eq!(team_row(&teams, "Les Aigles")["totalScore"], 50);
    assert_eq!(team_row(&teams, "Les Aigles")["recentChange"], 50);

    let (status, _) = post(
        &app,
        "/api/score-entries",
        json!({"teamId": aigles, "teacherId": teacher_id, "action": "oubli", "points": -50}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, teams) = get(&app, "/api/teams").await;
    assert_eq!(team_row(&teams, "Les Aigles")["totalScore"], 0);
    assert_eq!(team_row(&teams, "Les Aigles")["recentChange"], 0);

    let (status, feed) = get(&app, "/api/recent-activities").await;
    assert_eq!(status, StatusCode::OK);
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0]["action"], "oubli");
    assert_eq!(feed[0]["team"]["name"], "Les Aigles");
}

#[tokio::test]
async fn test_score_entry_errors() {
    let app = app();
    let teacher_id = login(&app).await["teacher"]["id"].as_str().unwrap().to_string();
    let lions = team_id(&app, "Les Lions").await;

    let (status, body) = post(
        &app,
        "/api/score-entries",
        json!({"teamId": "nope", "teacherId": teacher_id, "action": "x", "points": 10}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Équipe non trouvée");

    let (status, body) = post(
        &app,
        "/api/score-entries",
        json!({"teamId": lions, "teacherId": "nope", "action": "x", "points": 10}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Enseignant non trouvé");

    let (status, _) = post(
        &app,
        "/api/score-entries",
        json!({"teamId": lions, "teacherId": teacher_id, "action": "x", "points": "ten"}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, teams) = get(&app, "/api/teams").await;
    assert!(teams
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["totalScore"] == 0));
}

#[tokio::test]
async fn test_feed_capped_at_ten() {
    let app = app();
    let teacher_id = login(&app).await["teacher"]["id"].as_str().unwrap().to_string();
    let tigres = team_id(&app, "Les Tigres").await;

    for i in 0..12 {
        let (status, _) = post(
            &app,
            "/api/score-entries",
            json!({"teamId": tigres, "teacherId": teacher_id, "action": format!("entry {i}"), "points": 10}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, feed) = get(&app, "/api/recent-activities").await;
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 10);
    assert_eq!(feed[0]["action"], "entry 11");
}

#[tokio::test]
async fn test_invalid_body_wins_over_bad_token() {
    let app = app();

    let (status, body) = post(&app, "/api/score-entries", json!({}), Some("bogus-token")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "L'équipe est requise");
}

#[tokio::test]
async fn test_feed_never_exceeds_ten_whatever_the_config() {
    let mut config = Config::default();
    config.activity.feed_limit = 50;
    let app = app_with(config);
    let teacher_id = login(&app).await["teacher"]["id"].as_str().unwrap().to_string();
    let lions = team_id(&app, "Les Lions").await;

    for i in 0..15 {
        let (status, _) = post(
            &app,
            "/api/score-entries",
            json!({"teamId": lions, "teacherId": teacher_id, "action": format!("entry {i}"), "points": 1}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, feed) = get(&app, "/api/recent-activities").await;
    assert_eq!(feed.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_huge_session_ttl_does_not_break_the_server() {
    let mut config = Config::default();
    config.auth.session_ttl_hours = 2_000_000_000_000;
    let app = app_with(config);

    let body = login(&app).await;
    assert!(body["token"].is_string());

    let (status, teams) = get(&app, "/api/teams").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(teams.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_whitespace_password_is_a_failed_login() {
    let (status, body) = post(
        &app(),
        "/api/login",
        json!({"teacherId": "ENS001", "password": "   "}),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Identifiant ou mot de passe incorrect");
}

#[tokio::test]
async fn test_required_session_mode() {
    let mut config = Config::default();
    config.auth.require_session = true;
    let app = app_with(config);

    let login_body = login(&app).await;
    let teacher_id = login_body["teacher"]["id"].as_str().unwrap().to_string();
    let token = login_body["token"].as_str().unwrap().to_string();
    let dauphins = team_id(&app, "Les Dauphins").await;
    let entry = json!({"teamId": dauphins, "teacherId": teacher_id, "action": "violence", "points": -100});

    let (status, _) = post(&app, "/api/score-entries", entry.clone(), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&app, "/api/score-entries", entry.clone(), Some("forged")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = post(&app, "/api/score-entries", entry.clone(), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scoreEntry"]["points"], -100);

    let (status, _) = post(&app, "/api/logout", json!({}), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(&app, "/api/score-entries", entry, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_actions_catalog() {
    let (status, body) = get(&app(), "/api/actions").await;
    assert_eq!(status, StatusCode::OK);

    let actions = body.as_array().unwrap();
    assert_eq!(actions.len(), 18);
    assert_eq!(actions[0]["action"], "emprunter un livre au CDI");
    assert_eq!(actions[0]["points"], 50);
}
