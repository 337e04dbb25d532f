use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use super::configure_routes;
use crate::cache::ObjectCache;
use crate::cache::object_cache::moka::MokaCacheWrapper;
use crate::models::{AppStartTime, ErrorCode};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::storage::sea_orm_storage::SeaOrmStorage;
use crate::utils::password::hash_password;

const PASSWORD: &str = "Passw0rd!";

async fn backends() -> (Arc<dyn Storage>, Arc<dyn ObjectCache>) {
    let storage = SeaOrmStorage::connect("sqlite::memory:", 1).await.unwrap();
    let cache = MokaCacheWrapper::with_settings(100, 60);
    (Arc::new(storage), Arc::new(cache))
}

async fn seed_user(
    storage: &Arc<dyn Storage>,
    email: &str,
    role: UserRole,
    program_id: Option<i64>,
) {
    storage
        .create_user(CreateUserRequest {
            email: email.to_string(),
            password: hash_password(PASSWORD).unwrap(),
            display_name: email.to_string(),
            role,
            program_id,
        })
        .await
        .unwrap();
}

macro_rules! test_app {
    ($storage:expr, $cache:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($storage.clone()))
                .app_data(web::Data::new($cache.clone()))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: chrono::Utc::now(),
                }))
                .configure(configure_routes),
        )
        .await
    };
}

// 每个测试使用不同的来源 IP，避免共享登录限流计数
macro_rules! login {
    ($app:expr, $email:expr, $client_ip:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .insert_header(("X-Forwarded-For", $client_ip))
            .set_json(json!({ "email": $email, "password": PASSWORD }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["data"]["access_token"]
            .as_str()
            .expect("login should return an access token")
            .to_string()
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

// 发送 JSON 请求，返回状态码与响应体
macro_rules! send_json {
    ($app:expr, $method:ident, $uri:expr, $token:expr, $body:expr) => {{
        let req = test::TestRequest::$method()
            .uri(&$uri)
            .insert_header(bearer(&$token))
            .set_json($body)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

// 建立一个专业和一名该专业的学生，返回 (program_id, student_id)
macro_rules! seed_student {
    ($app:expr, $token:expr, $enrollment_id:expr) => {{
        let (status, body) = send_json!(
            $app,
            post,
            "/api/v1/programs",
            $token,
            json!({ "name": "Sistemas" })
        );
        assert_eq!(status, StatusCode::CREATED);
        let program_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send_json!(
            $app,
            post,
            "/api/v1/students",
            $token,
            json!({
                "enrollment_id": $enrollment_id,
                "paternal_surname": "García",
                "maternal_surname": "López",
                "given_names": "Ana",
                "program_id": program_id,
                "semester": 2
            })
        );
        assert_eq!(status, StatusCode::CREATED);
        (program_id, body["data"]["student"]["id"].as_i64().unwrap())
    }};
}

const BOUNDARY: &str = "----edustats-test-boundary";

/// 以 multipart 的 `file` 字段包装上传内容
fn multipart_file(file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

macro_rules! upload {
    ($app:expr, $token:expr, $client_ip:expr, $file_name:expr, $content:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/v1/imports")
            .insert_header(bearer(&$token))
            .insert_header(("X-Forwarded-For", $client_ip))
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_file($file_name, $content))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

#[actix_web::test]
async fn test_health_is_public() {
    let (storage, cache) = backends().await;
    let app = test_app!(storage, cache);

    let req = test::TestRequest::get()
        .uri("/api/v1/system/health")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["system_name"], "EduStats");
}

#[actix_web::test]
async fn test_protected_routes_require_session() {
    let (storage, cache) = backends().await;
    let app = test_app!(storage, cache);

    for uri in [
        "/api/v1/students",
        "/api/v1/subjects",
        "/api/v1/charts/dashboard",
        "/api/v1/users",
        "/api/v1/audit-logs",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }

    // 专业列表供注册页使用
    let req = test::TestRequest::get().uri("/api/v1/programs").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_admin_records_student_grades() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);
    let token = login!(app, "admin@localhost", "10.0.0.1");

    let req = test::TestRequest::post()
        .uri("/api/v1/programs")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Sistemas", "code": "sis" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let program_id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/students")
        .insert_header(bearer(&token))
        .set_json(json!({
            "enrollment_id": "A001",
            "paternal_surname": "García",
            "maternal_surname": "López",
            "given_names": "Ana",
            "program_id": program_id,
            "semester": 2
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let student_id = body["data"]["student"]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/subjects")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Cálculo", "semester": 2, "program_id": program_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let subject_id = body["data"]["subject"]["id"].as_i64().unwrap();

    let grade = json!({
        "subject_id": subject_id,
        "score": 55.0,
        "attendance": 80.0,
        "period": "2024-1"
    });
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/students/{student_id}/grades"))
        .insert_header(bearer(&token))
        .set_json(&grade)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // 同一学期重复录入
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/students/{student_id}/grades"))
        .insert_header(bearer(&token))
        .set_json(&grade)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri("/api/v1/charts/dashboard")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total_students"], 1);
    assert_eq!(body["data"]["total_grades"], 1);
    assert_eq!(body["data"]["failing_rate"], 100.0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/audit-logs/student/{student_id}"))
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["action"], "create");
}

#[actix_web::test]
async fn test_teacher_is_scoped_to_own_program() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);
    let admin = login!(app, "admin@localhost", "10.0.0.2");

    let mut program_ids = Vec::new();
    for name in ["Sistemas", "Contabilidad"] {
        let req = test::TestRequest::post()
            .uri("/api/v1/programs")
            .insert_header(bearer(&admin))
            .set_json(json!({ "name": name }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        program_ids.push(body["data"]["id"].as_i64().unwrap());
    }

    seed_user(
        &storage,
        "teacher@example.com",
        UserRole::Teacher,
        Some(program_ids[0]),
    )
    .await;
    let teacher = login!(app, "teacher@example.com", "10.0.0.3");

    // 教师创建的学生强制归属其专业
    let req = test::TestRequest::post()
        .uri("/api/v1/students")
        .insert_header(bearer(&teacher))
        .set_json(json!({
            "enrollment_id": "B001",
            "paternal_surname": "Pérez",
            "maternal_surname": "Ruiz",
            "given_names": "Luis",
            "program_id": program_ids[1],
            "semester": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["student"]["program"], "Sistemas");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/students?program_id={}", program_ids[1]))
        .insert_header(bearer(&teacher))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    for uri in ["/api/v1/users", "/api/v1/audit-logs", "/api/v1/imports/template"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(&teacher))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[actix_web::test]
async fn test_logout_clears_refresh_cookie() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);
    let token = login!(app, "admin@localhost", "10.0.0.4");

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["user"]["role"], "admin");

    // 会话过期后也能登出
    let req = test::TestRequest::post().uri("/api/v1/auth/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "refresh_token")
        .expect("logout should reset the refresh cookie");
    assert_eq!(cookie.value(), "");
}

#[actix_web::test]
async fn test_logout_revokes_session_tokens() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header(("X-Forwarded-For", "10.0.0.6"))
        .set_json(json!({ "email": "admin@localhost", "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let refresh_cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "refresh_token")
        .expect("login should set the refresh cookie")
        .into_owned();
    let body: Value = test::read_body_json(resp).await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/v1/students")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(bearer(&token))
        .cookie(refresh_cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // 令牌仍在有效期内，但会话已结束
    let req = test::TestRequest::get()
        .uri("/api/v1/students")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .insert_header(("X-Forwarded-For", "10.0.0.6"))
        .cookie(refresh_cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_login_failures_share_generic_message() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);

    for (email, password) in [
        ("nobody@example.com", PASSWORD),
        ("admin@localhost", "WrongPass1!"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .insert_header(("X-Forwarded-For", "10.0.0.7"))
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{email}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], ErrorCode::AuthFailed as i32);
        assert_eq!(body["message"], "Invalid credentials");
    }
}

#[actix_web::test]
async fn test_admin_registration_closed_once_admin_exists() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .insert_header(("X-Forwarded-For", "10.0.0.8"))
        .set_json(json!({
            "email": "second-admin@example.com",
            "password": PASSWORD,
            "display_name": "Second Admin",
            "role": "admin"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::AdminRegistrationClosed as i32);

    // 教师仍可自助注册
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .insert_header(("X-Forwarded-For", "10.0.0.8"))
        .set_json(json!({
            "email": "teacher@example.com",
            "password": PASSWORD,
            "display_name": "Teacher"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["user"]["role"], "teacher");
    assert_eq!(body["message"], "Registration successful");
}

#[actix_web::test]
async fn test_risk_factors_follow_dropout_status() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);
    let token = login!(app, "admin@localhost", "10.0.0.9");
    let (_, student_id) = seed_student!(app, token, "R001");

    let factor = json!({ "kind": "economic", "label": "Trabaja", "period": "2024-1" });
    let uri = format!("/api/v1/students/{student_id}/risk-factors");

    let (status, body) = send_json!(app, post, uri, token, &factor);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], ErrorCode::StudentNotDropout as i32);

    let (status, body) = send_json!(
        app,
        put,
        format!("/api/v1/students/{student_id}"),
        token,
        json!({ "status": "dropout" })
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["student"]["status"], "dropout");
    assert_eq!(body["data"]["requires_risk_factor"], true);

    let (status, _) = send_json!(app, post, uri, token, &factor);
    assert_eq!(status, StatusCode::CREATED);

    // 同一学生、学期、类别只能登记一次
    let (status, body) = send_json!(app, post, uri, token, &factor);
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::RiskFactorAlreadyExists as i32);

    // 已有风险因素后不再提示
    let (status, body) = send_json!(
        app,
        put,
        format!("/api/v1/students/{student_id}"),
        token,
        json!({ "semester": 3 })
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["requires_risk_factor"], false);
}

#[actix_web::test]
async fn test_import_rejects_missing_columns() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);
    let token = login!(app, "admin@localhost", "10.0.0.10");

    let csv = b"matricula,materia,nota\nC001,Algebra,80\n";
    let (status, body) = upload!(app, token, "10.0.0.10", "grades.csv", csv);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], ErrorCode::ImportFileMissingColumn as i32);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("carrera"), "{message}");
    assert!(message.contains("asistencia"), "{message}");
}

#[actix_web::test]
async fn test_import_reports_invalid_rows() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);
    let token = login!(app, "admin@localhost", "10.0.0.11");

    let csv = "matricula,carrera,semestre,materia,nota,asistencia,periodo\n\
               C001,Sistemas,1,Algebra,150,90,2024-1\n\
               C002,Sistemas,1,Algebra,85,90,2024-1\n";
    let (status, body) = upload!(app, token, "10.0.0.11", "grades.csv", csv.as_bytes());
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["imported"], 1);
    assert_eq!(body["data"]["invalid"], 1);
    assert_eq!(body["data"]["errors"][0]["row"], 2);
    assert_eq!(body["data"]["errors"][0]["field"], "nota");

    let req = test::TestRequest::get()
        .uri("/api/v1/students?search=C002")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["items"][0]["enrollment_id"], "C002");
}

#[actix_web::test]
async fn test_exported_grades_reimport_as_duplicates() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);
    let token = login!(app, "admin@localhost", "10.0.0.12");
    let (program_id, student_id) = seed_student!(app, token, "E001");

    let (status, body) = send_json!(
        app,
        post,
        "/api/v1/subjects",
        token,
        json!({ "name": "Cálculo", "semester": 2, "program_id": program_id })
    );
    assert_eq!(status, StatusCode::CREATED);
    let subject_id = body["data"]["subject"]["id"].as_i64().unwrap();

    let (status, _) = send_json!(
        app,
        post,
        format!("/api/v1/students/{student_id}/grades"),
        token,
        json!({ "subject_id": subject_id, "score": 88.0, "attendance": 95.0, "period": "2024-1" })
    );
    assert_eq!(status, StatusCode::CREATED);

    for format in ["csv", "xlsx"] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/exports/grades?format={format}"))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{format}");
        let exported = test::read_body(resp).await;

        let file_name = format!("grades.{format}");
        let (status, body) = upload!(app, token, "10.0.0.12", &file_name, &exported);
        assert_eq!(status, StatusCode::OK, "{format}: {body}");
        let data = &body["data"];
        assert_eq!(data["total"], 1, "{format}");
        assert_eq!(data["imported"], 0, "{format}");
        assert_eq!(data["duplicates"], 1, "{format}");
        assert_eq!(data["invalid"], 0, "{format}");
        assert_eq!(data["errors"], json!([]), "{format}");
    }
}

#[actix_web::test]
async fn test_chart_export_returns_png() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);
    let token = login!(app, "admin@localhost", "10.0.0.13");

    for chart in ["pareto", "histograma", "dispersion", "ishikawa"] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/charts/export/{chart}?semester=2"))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{chart}");
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "image/png",
            "{chart}"
        );
        let disposition = resp.headers().get("Content-Disposition").unwrap();
        assert!(
            disposition
                .to_str()
                .unwrap()
                .contains(&format!("{chart}.png")),
            "{chart}"
        );
        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"\x89PNG\r\n\x1a\n"), "{chart}");
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/charts/export/radar")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], ErrorCode::ChartTypeInvalid as i32);

    let req = test::TestRequest::get()
        .uri("/api/v1/charts/export/pareto")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_import_template_download() {
    let (storage, cache) = backends().await;
    seed_user(&storage, "admin@localhost", UserRole::Admin, None).await;
    let app = test_app!(storage, cache);
    let token = login!(app, "admin@localhost", "10.0.0.5");

    let req = test::TestRequest::get()
        .uri("/api/v1/imports/template?format=csv")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("matricula"));
}
