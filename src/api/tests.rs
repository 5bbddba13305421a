//! Client tests against an in-process mock backend

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use data_encoding::BASE64URL_NOPAD;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::app::AppState;
use crate::cache::QueryKey;
use crate::cli::{Command, CourseCommand, Workspace};
use crate::config::Config;
use crate::models::{Course, CourseModule, ImageFile, Lesson, LessonKind, Student, Visibility};
use crate::services::{
    guard, AccountDetails, CourseEditor, FlowError, LessonForm, LoginForm, MemoryTokenStore, ModuleForm,
    NewPasswordForm, NoticeLevel, ProfileDetails, RegistrationState, ResetState, Route, RouteDecision,
    ServiceError, TokenStore, UploadError,
};

const EMAIL: &str = "creator@example.com";
const PASSWORD: &str = "secret123";

#[derive(Debug, Clone)]
struct Upload {
    content_type: Option<String>,
    authorization: Option<String>,
    size: usize,
}

#[derive(Clone, Default)]
struct Backend {
    hits: Arc<AtomicUsize>,
    origin: Arc<Mutex<String>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
    bodies: Arc<Mutex<Vec<(String, Value)>>>,
    uploads: Arc<Mutex<Vec<Upload>>>,
    failing: Arc<Mutex<Vec<&'static str>>>,
}

impl Backend {
    fn hit(&self, headers: &HeaderMap) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.auth.lock().unwrap().push(header(headers, AUTHORIZATION.as_str()));
    }

    fn record(&self, path: &str, body: Value) {
        self.bodies.lock().unwrap().push((path.to_string(), body));
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn body(&self, path: &str) -> Option<Value> {
        self.bodies
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
    }

    fn last_auth(&self) -> Option<String> {
        self.auth.lock().unwrap().last().cloned().flatten()
    }

    /// Make the route answer with 403 from now on
    fn fail(&self, path: &'static str) {
        self.failing.lock().unwrap().push(path);
    }

    fn fails(&self, path: &str) -> bool {
        self.failing.lock().unwrap().iter().any(|p| *p == path)
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn token() -> String {
    let header = BASE64URL_NOPAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = json!({
        "exp": Utc::now().timestamp() + 3600,
        "id": 1,
        "name": "Jone Dow",
        "email": EMAIL,
        "roles": ["creator"]
    });
    format!("{}.{}.signature", header, BASE64URL_NOPAD.encode(payload.to_string().as_bytes()))
}

fn course_json(id: i64, title: &str, order: i32, image: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "Containers from scratch",
        "price": 0,
        "duration": 12,
        "image": image,
        "highlights": "h",
        "outcomes": "o",
        "prerequisites": "p",
        "status": false,
        "order": order,
        "creatorId": 1,
        "createdAt": "2024-12-01T10:00:00Z",
        "updatedAt": "2024-12-01T10:00:00Z"
    })
}

async fn login(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    backend.hit(&headers);
    if body["email"] == EMAIL && body["password"] == PASSWORD {
        (StatusCode::OK, Json(json!({"message": "Login successful", "token": token()})))
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"message": "User not found"})))
    }
}

async fn own_courses(State(backend): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    backend.hit(&headers);
    match header(&headers, AUTHORIZATION.as_str()).as_deref() {
        None => return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))),
        Some("Bearer expired") => return (StatusCode::UNAUTHORIZED, Json(json!({"message": "jwt expired"}))),
        Some(_) => {}
    }
    let courses = json!([
        course_json(11, "Kubernetes", 2, "1-Kubernetes.png"),
        course_json(10, "Docker", 1, "1-Docker.png"),
    ]);
    (StatusCode::OK, Json(json!({ "courses": courses })))
}

async fn create_course(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    backend.hit(&headers);
    backend.record("/course", body.clone());
    let title = body["title"].as_str().unwrap_or_default();
    let image = body["image"].as_str().unwrap_or_default();
    Json(json!({
        "message": "Course created successfully",
        "course": course_json(12, title, 3, image)
    }))
}

async fn course_order(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    backend.hit(&headers);
    backend.record("/course/order", body);
    Json(json!({"message": "Order updated"}))
}

async fn delete_course(State(backend): State<Backend>, Path(id): Path<i64>, headers: HeaderMap) -> Json<Value> {
    backend.hit(&headers);
    Json(json!({
        "message": "Course deleted successfully",
        "course": course_json(id, "Docker", 1, "1-Docker.png")
    }))
}

async fn presign(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend.hit(&headers);
    if backend.fails("/s3/putObject") {
        return (StatusCode::FORBIDDEN, Json(json!({"message": "Bucket not allowed"})));
    }
    backend.record("/s3/putObject", body);
    let origin = backend.origin.lock().unwrap().clone();
    (StatusCode::OK, Json(json!({ "url": format!("{}/upload/cover", origin) })))
}

async fn upload(State(backend): State<Backend>, headers: HeaderMap, body: Bytes) -> StatusCode {
    backend.hit(&headers);
    if backend.fails("/upload/cover") {
        return StatusCode::FORBIDDEN;
    }
    backend.uploads.lock().unwrap().push(Upload {
        content_type: header(&headers, CONTENT_TYPE.as_str()),
        authorization: header(&headers, AUTHORIZATION.as_str()),
        size: body.len(),
    });
    StatusCode::OK
}

async fn send_otp(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    backend.hit(&headers);
    backend.record("/auth/creator/send-verify-email", body.clone());
    Json(json!({"message": "OTP sent to your email", "email": body["email"]}))
}

async fn forgot_password_otp(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    backend.hit(&headers);
    backend.record("/auth/creator/forgot-password/send-verify-email", body.clone());
    Json(json!({"message": "OTP sent to your email", "email": body["email"]}))
}

async fn verify_otp(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend.hit(&headers);
    if body["otp"] != "123456" {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "Invalid OTP"})));
    }
    (StatusCode::OK, Json(json!({"message": "Email verified", "email": body["email"]})))
}

async fn register(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    backend.hit(&headers);
    backend.record("/auth/creator/register", body);
    Json(json!({"message": "Account created", "token": token()}))
}

async fn reset_password(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    backend.hit(&headers);
    backend.record("/auth/creator/reset-password", body.clone());
    Json(json!({"message": "Password updated", "email": body["email"]}))
}

fn lesson_json(id: i64, title: &str, order: i32, module_id: i64, is_video: bool, url: &str) -> Value {
    let public = if url.is_empty() {
        Value::Null
    } else {
        json!({"id": id + 100, "lessonId": id, "url": url})
    };
    json!({
        "id": id,
        "title": title,
        "order": order,
        "moduleId": module_id,
        "isVideo": is_video,
        "public": public
    })
}

async fn course_modules(State(backend): State<Backend>, Path(course_id): Path<i64>, headers: HeaderMap) -> Json<Value> {
    backend.hit(&headers);
    if course_id != 10 {
        return Json(json!({"modules": []}));
    }
    Json(json!({"modules": [
        {"id": 21, "title": "Images", "order": 2, "courseId": 10},
        {
            "id": 20,
            "title": "Intro",
            "order": 1,
            "courseId": 10,
            "lessons": [lesson_json(30, "Why docker?", 1, 20, true, "https://youtu.be/abc")]
        }
    ]}))
}

async fn create_module(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    backend.hit(&headers);
    backend.record("/course/module", body.clone());
    Json(json!({
        "message": "Module created",
        "module": {"id": 22, "title": body["title"], "courseId": body["courseId"]}
    }))
}

async fn update_module(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.hit(&headers);
    backend.record(&format!("/course/module/{}", id), body.clone());
    Json(json!({
        "message": "Module updated",
        "module": {"id": id, "title": body["title"], "courseId": body["courseId"]}
    }))
}

async fn delete_module(State(backend): State<Backend>, Path(id): Path<i64>, headers: HeaderMap) -> Json<Value> {
    backend.hit(&headers);
    Json(json!({
        "message": "Module deleted",
        "module": {"id": id, "title": "Images", "courseId": 10}
    }))
}

async fn module_lessons(State(backend): State<Backend>, Path(module_id): Path<i64>, headers: HeaderMap) -> Json<Value> {
    backend.hit(&headers);
    if module_id != 20 {
        return Json(json!({"lessons": []}));
    }
    Json(json!({"lessons": [
        lesson_json(31, "Homework", 2, 20, false, ""),
        lesson_json(30, "Why docker?", 1, 20, true, "https://youtu.be/abc"),
    ]}))
}

fn lesson_from_body(id: i64, body: &Value) -> Value {
    lesson_json(
        id,
        body["title"].as_str().unwrap_or_default(),
        3,
        body["moduleId"].as_i64().unwrap_or_default(),
        body["isVideo"].as_bool().unwrap_or_default(),
        body["url"].as_str().unwrap_or_default(),
    )
}

async fn create_lesson(State(backend): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    backend.hit(&headers);
    backend.record("/course/lesson", body.clone());
    Json(json!({"message": "Lesson created", "lesson": lesson_from_body(32, &body)}))
}

async fn update_lesson(
    State(backend): State<Backend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    backend.hit(&headers);
    backend.record(&format!("/course/lesson/{}", id), body.clone());
    Json(json!({"message": "Lesson updated", "lesson": lesson_from_body(id, &body)}))
}

async fn delete_lesson(State(backend): State<Backend>, Path(id): Path<i64>, headers: HeaderMap) -> Json<Value> {
    backend.hit(&headers);
    Json(json!({"message": "Lesson deleted", "lesson": lesson_json(id, "Homework", 2, 20, false, "")}))
}

async fn students(State(backend): State<Backend>, headers: HeaderMap) -> Json<Value> {
    backend.hit(&headers);
    Json(json!({"users": [
        {"id": 5, "name": "Asha Rao", "email": "asha@example.com", "mobile": "9000000000"},
        {"id": 6, "name": "Ravi Kumar", "email": "ravi@example.com"}
    ]}))
}

async fn fallback(State(backend): State<Backend>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    backend.hit(&headers);
    (StatusCode::NOT_FOUND, Json(json!({"message": "Not found"})))
}

/// Start the mock backend; returns the API base URL
async fn serve(backend: Backend) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    *backend.origin.lock().unwrap() = origin.clone();

    let app = Router::new()
        .route("/api/auth/creator/login", post(login))
        .route("/api/auth/creator/send-verify-email", post(send_otp))
        .route("/api/auth/verify-email-otp", post(verify_otp))
        .route("/api/auth/creator/register", post(register))
        .route("/api/auth/creator/forgot-password/send-verify-email", post(forgot_password_otp))
        .route("/api/auth/creator/reset-password", post(reset_password))
        .route("/api/auth/user", get(students))
        .route("/api/course/own", get(own_courses))
        .route("/api/course", post(create_course))
        .route("/api/course/{id}", delete(delete_course))
        .route("/api/course/order", put(course_order))
        .route("/api/course/module", post(create_module))
        .route("/api/course/module/{id}", get(course_modules).put(update_module).delete(delete_module))
        .route("/api/course/lessons/{id}", get(module_lessons))
        .route("/api/course/lesson", post(create_lesson))
        .route("/api/course/lesson/{id}", put(update_lesson).delete(delete_lesson))
        .route("/api/s3/putObject", post(presign))
        .route("/upload/cover", put(upload))
        .fallback(fallback)
        .with_state(backend);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("{}/api", origin)
}

async fn app(backend: &Backend) -> AppState {
    app_with_store(backend, Arc::new(MemoryTokenStore::new())).await
}

async fn app_with_store(backend: &Backend, store: Arc<dyn TokenStore>) -> AppState {
    let mut config = Config::default();
    config.api.base_url = serve(backend.clone()).await;
    config.api.timeout_seconds = 5;

    let state = AppState::build(config, store).unwrap();
    state.session.init().await.unwrap();
    state
}

async fn signed_in(backend: &Backend) -> AppState {
    let state = app(backend).await;
    let form = LoginForm {
        email: EMAIL.to_string(),
        password: PASSWORD.to_string(),
    };
    state.session.sign_in(&form).await.unwrap();
    state
}

#[tokio::test]
async fn test_login_unknown_email_surfaces_server_message() {
    let backend = Backend::default();
    let state = app(&backend).await;

    let form = LoginForm {
        email: "nobody@example.com".to_string(),
        password: PASSWORD.to_string(),
    };
    let err = state.session.sign_in(&form).await.unwrap_err();

    assert_eq!(err.user_message(), "User not found");
    let notice = state.notifier.last().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "User not found");

    let session = state.session.state().await;
    assert!(!session.is_authenticated);
    assert_eq!(guard(&session, &Route::Login), RouteDecision::Render);
    assert!(state.api.token().is_none());
}

#[tokio::test]
async fn test_invalid_login_form_sends_nothing() {
    let backend = Backend::default();
    let state = app(&backend).await;

    let form = LoginForm {
        email: "not-an-email".to_string(),
        password: "123".to_string(),
    };
    assert!(matches!(
        state.session.sign_in(&form).await,
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn test_login_installs_bearer_token() {
    let backend = Backend::default();
    let state = signed_in(&backend).await;

    let user = state.session.user().await.unwrap();
    assert_eq!(user.email, EMAIL);
    assert_eq!(state.notifier.last().unwrap().message, "Login successful");

    let courses = state.courses.list().await.unwrap();
    let ids: Vec<i64> = courses.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert_eq!(backend.last_auth(), Some(format!("Bearer {}", state.api.token().unwrap())));

    // Second read comes from the cache
    let hits = backend.hits();
    state.courses.list().await.unwrap();
    assert_eq!(backend.hits(), hits);
}

#[tokio::test]
async fn test_unauthorized_list_becomes_error_notice() {
    let backend = Backend::default();
    let state = app(&backend).await;

    let err = state.courses.list().await.unwrap_err();
    assert_eq!(err.user_message(), "Unauthorized");
    assert_eq!(state.notifier.last().unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_logout_clears_session_and_cache() {
    let backend = Backend::default();
    let state = signed_in(&backend).await;
    state.courses.list().await.unwrap();

    state.session.logout().await.unwrap();

    assert!(state.api.token().is_none());
    assert!(state.cache.get::<Vec<Course>>(&QueryKey::Courses).await.unwrap().is_none());
    let session = state.session.state().await;
    assert_eq!(guard(&session, &Route::Courses), RouteDecision::Redirect(Route::Login));
}

#[tokio::test]
async fn test_reorder_sends_one_batch() {
    let backend = Backend::default();
    let state = signed_in(&backend).await;

    let mut board = state.courses.board().await.unwrap();
    assert!(board.move_item(2, 1).await.unwrap());

    let ids: Vec<i64> = board.items().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![11, 10]);

    let cached = state.cache.get::<Vec<Course>>(&QueryKey::Courses).await.unwrap().unwrap();
    assert_eq!(cached[0].id, 11);
    assert_eq!(cached[0].order, 1);

    let hits = backend.hits();
    let response = board.persist().await.unwrap().unwrap();
    assert_eq!(response.message, "Order updated");
    assert_eq!(backend.hits(), hits + 1);
    assert_eq!(
        backend.body("/course/order").unwrap(),
        json!([{"id": 10, "order": 2}, {"id": 11, "order": 1}])
    );

    // Nothing pending: no request
    assert!(board.persist().await.unwrap().is_none());
    assert_eq!(backend.hits(), hits + 1);
}

/// A complete create-mode editor with a 3-byte PNG cover
async fn course_editor(state: &AppState) -> CourseEditor {
    let mut editor = state.courses.editor(None).await.unwrap();
    editor.draft.title = "Docker".into();
    editor.draft.description = "Containers from scratch".into();
    editor.draft.duration = "12".into();
    editor.draft.highlights = "h".into();
    editor.draft.outcomes = "o".into();
    editor.draft.prerequisites = "p".into();
    editor
        .set_image(ImageFile::new("cover.png", "image/png", vec![1, 2, 3]))
        .unwrap();
    editor
}

#[tokio::test]
async fn test_create_course_presigns_uploads_then_creates() {
    let backend = Backend::default();
    let state = signed_in(&backend).await;
    let mut editor = course_editor(&state).await;

    let course = state.courses.submit(&mut editor).await.unwrap();

    let presigned = backend.body("/s3/putObject").unwrap();
    let object_name = presigned["fileName"].as_str().unwrap().to_string();
    assert!(object_name.ends_with("-Docker.png"));
    assert_eq!(presigned["fileType"], "image/png");
    assert_eq!(presigned["bucket"], "vpc-public");

    let uploads = backend.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(uploads[0].size, 3);
    assert!(uploads[0].authorization.is_none());

    let created = backend.body("/course").unwrap();
    assert_eq!(created["image"], object_name.as_str());
    assert_eq!(created["price"], json!(0.0));
    assert_eq!(course.id, 12);
    assert_eq!(course.image, object_name);

    // Editor is reset after a successful submit
    assert!(editor.draft.title.is_empty());
    assert!(editor.image().is_none());
}

#[tokio::test]
async fn test_oversized_image_sends_nothing() {
    let backend = Backend::default();
    let state = app(&backend).await;
    let max = state.config.storage.max_image_size as usize;

    let mut editor = state.courses.editor(None).await.unwrap();
    editor.draft.title = "Docker".into();
    editor.draft.description = "d".into();
    editor.draft.highlights = "h".into();
    editor.draft.outcomes = "o".into();
    editor.draft.prerequisites = "p".into();
    editor
        .set_image(ImageFile::new("cover.png", "image/png", vec![0; max + 1]))
        .unwrap();

    let err = state.courses.submit(&mut editor).await.unwrap_err();
    assert!(matches!(err, ServiceError::Upload(UploadError::TooLarge { .. })));
    assert_eq!(backend.hits(), 0);
}

fn account() -> AccountDetails {
    AccountDetails {
        first_name: "Jone".into(),
        last_name: "Dow".into(),
        email: EMAIL.into(),
        mobile: "9876543210".into(),
        password: "password1".into(),
    }
}

fn profile() -> ProfileDetails {
    ProfileDetails {
        domain: "devops".into(),
        bio: "Ten years of shipping containers".into(),
        role: "Engineer".into(),
    }
}

#[tokio::test]
async fn test_registration_before_verification_sends_nothing() {
    let backend = Backend::default();
    let state = app(&backend).await;
    let mut flow = state.registration();

    let err = flow.next_step(account()).unwrap_err();
    assert!(matches!(err, ServiceError::Flow(FlowError::EmailNotVerified)));

    assert!(flow.submit(profile()).await.is_err());
    assert!(matches!(
        flow.verify_otp("123456").await,
        Err(ServiceError::Flow(FlowError::OtpNotRequested))
    ));

    assert_eq!(backend.hits(), 0);
    assert!(!state.session.is_authenticated().await);
}

#[tokio::test]
async fn test_presign_failure_stops_before_upload() {
    let backend = Backend::default();
    let state = signed_in(&backend).await;
    backend.fail("/s3/putObject");
    let mut editor = course_editor(&state).await;

    let err = state.courses.submit(&mut editor).await.unwrap_err();

    assert!(matches!(err, ServiceError::Upload(UploadError::Presign(_))));
    assert!(backend.uploads.lock().unwrap().is_empty());
    assert!(backend.body("/course").is_none());

    let notice = state.notifier.last().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Bucket not allowed");

    assert_eq!(editor.draft.title, "Docker");
    assert!(editor.image().is_some());
}

#[tokio::test]
async fn test_transfer_failure_keeps_draft_and_creates_nothing() {
    let backend = Backend::default();
    let state = signed_in(&backend).await;
    backend.fail("/upload/cover");
    let mut editor = course_editor(&state).await;

    let err = state.courses.submit(&mut editor).await.unwrap_err();

    assert!(matches!(err, ServiceError::Upload(UploadError::Transfer(_))));
    assert!(backend.body("/s3/putObject").is_some());
    assert!(backend.body("/course").is_none());

    let notice = state.notifier.last().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "try again file not uploaded.");

    assert_eq!(editor.draft.title, "Docker");
    assert!(editor.image().is_some());
    let cached = state.cache.get::<Vec<Course>>(&QueryKey::Courses).await.unwrap();
    assert!(cached.is_none());
}

#[tokio::test]
async fn test_registration_creates_account_and_signs_in() {
    let backend = Backend::default();
    let store = Arc::new(MemoryTokenStore::new());
    let state = app_with_store(&backend, store.clone()).await;
    let mut flow = state.registration();

    flow.request_otp(EMAIL).await.unwrap();
    assert_eq!(flow.state(), &RegistrationState::OtpSent { email: EMAIL.into() });

    assert!(flow.verify_otp("000000").await.is_err());
    assert_eq!(state.notifier.last().unwrap().message, "Invalid OTP");
    assert_eq!(flow.state(), &RegistrationState::OtpSent { email: EMAIL.into() });

    flow.verify_otp("123456").await.unwrap();
    flow.next_step(account()).unwrap();
    flow.submit(profile()).await.unwrap();

    assert_eq!(flow.state(), &RegistrationState::AccountCreated);
    assert_eq!(state.notifier.last().unwrap().message, "Account created");

    let body = backend.body("/auth/creator/register").unwrap();
    assert_eq!(body["name"], "Jone Dow");
    assert_eq!(body["email"], EMAIL);
    assert_eq!(body["mobile"], "9876543210");
    assert_eq!(body["role"], "Engineer");
    assert!(body.get("first_name").is_none());

    assert!(state.session.is_authenticated().await);
    let saved = store.load().await.unwrap();
    assert!(saved.is_some());
    assert_eq!(state.api.token(), saved);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let backend = Backend::default();
    let state = app(&backend).await;
    let mut flow = state.password_reset();

    flow.send_otp(EMAIL).await.unwrap();
    assert_eq!(
        backend.body("/auth/creator/forgot-password/send-verify-email").unwrap(),
        json!({"email": EMAIL})
    );
    flow.verify_otp("123456").await.unwrap();
    assert_eq!(flow.state(), &ResetState::Verified { email: EMAIL.into() });

    let hits = backend.hits();
    let mismatched = NewPasswordForm {
        password: "new-password".into(),
        repeat_password: "new-passw0rd".into(),
    };
    assert!(matches!(flow.reset(&mismatched).await, Err(ServiceError::Validation(_))));
    assert_eq!(backend.hits(), hits);

    let form = NewPasswordForm {
        password: "new-password".into(),
        repeat_password: "new-password".into(),
    };
    flow.reset(&form).await.unwrap();

    assert_eq!(flow.state(), &ResetState::Done);
    assert_eq!(
        backend.body("/auth/creator/reset-password").unwrap(),
        json!({"email": EMAIL, "password": "new-password"})
    );
    assert_eq!(state.notifier.last().unwrap().message, "Password updated");
}

#[tokio::test]
async fn test_module_crud_patches_cached_list() {
    let backend = Backend::default();
    let state = signed_in(&backend).await;

    let modules = state.modules.list(10).await.unwrap();
    let ids: Vec<i64> = modules.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![20, 21]);

    // The server leaves the position out; the new module goes last
    let created = state
        .modules
        .create(10, &ModuleForm { title: " Networking ".into() })
        .await
        .unwrap();
    assert_eq!(created.order, 3);
    assert_eq!(
        backend.body("/course/module").unwrap(),
        json!({"courseId": 10, "title": "Networking"})
    );

    // Order and embedded lessons survive an update that omits them
    let updated = state
        .modules
        .update(10, 20, &ModuleForm { title: "Intro to Docker".into() })
        .await
        .unwrap();
    assert_eq!(updated.order, 1);
    assert_eq!(updated.lessons.len(), 1);

    state.modules.delete(10, 21).await.unwrap();

    let hits = backend.hits();
    let cached = state.modules.list(10).await.unwrap();
    assert_eq!(backend.hits(), hits);
    let summary: Vec<(i64, i32, &str)> = cached.iter().map(|m| (m.id, m.order, m.title.as_str())).collect();
    assert_eq!(summary, vec![(20, 1, "Intro to Docker"), (22, 3, "Networking")]);
}

#[tokio::test]
async fn test_lesson_crud_patches_cached_list() {
    let backend = Backend::default();
    let state = signed_in(&backend).await;

    let lessons = state.lessons.list(20).await.unwrap();
    let ids: Vec<i64> = lessons.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![30, 31]);
    assert_eq!(lessons[0].public_url(), Some("https://youtu.be/abc"));

    let form = LessonForm {
        title: "Compose".into(),
        kind: LessonKind::Video,
        visibility: Visibility::Unlock,
        url: "https://youtu.be/xyz".into(),
    };
    let created = state.lessons.create(20, &form).await.unwrap();
    assert_eq!(created.visibility(), Visibility::Unlock);
    assert_eq!(
        backend.body("/course/lesson").unwrap(),
        json!({"title": "Compose", "isVideo": true, "moduleId": 20, "url": "https://youtu.be/xyz"})
    );

    let locked = LessonForm {
        visibility: Visibility::Lock,
        url: String::new(),
        ..form.clone()
    };
    let updated = state.lessons.update(20, 32, &locked).await.unwrap();
    assert_eq!(updated.visibility(), Visibility::Lock);
    assert_eq!(backend.body("/course/lesson/32").unwrap()["url"], "");

    state.lessons.delete(20, 31).await.unwrap();
    let cached: Vec<Lesson> = state.cache.get(&QueryKey::Lessons(20)).await.unwrap().unwrap();
    let ids: Vec<i64> = cached.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![30, 32]);
    assert!(cached[1].public_url().is_none());

    // A video with a Drive link never reaches the server
    let hits = backend.hits();
    let mismatched = LessonForm {
        url: "https://drive.google.com/file/d/1".into(),
        ..form
    };
    assert!(state.lessons.create(20, &mismatched).await.is_err());
    assert_eq!(backend.hits(), hits);
}

#[tokio::test]
async fn test_student_roster_is_cached() {
    let backend = Backend::default();
    let state = signed_in(&backend).await;

    let students: Vec<Student> = state.students.list().await.unwrap();
    assert_eq!(students.len(), 2);
    assert_eq!(students[0].name, "Asha Rao");
    assert_eq!(students[1].mobile, "");

    let hits = backend.hits();
    state.students.list().await.unwrap();
    assert_eq!(backend.hits(), hits);
}

#[tokio::test]
async fn test_course_delete_drops_module_and_lesson_queries() {
    let backend = Backend::default();
    let state = signed_in(&backend).await;

    state.courses.list().await.unwrap();
    state.modules.list(10).await.unwrap();
    state.modules.list(11).await.unwrap();
    state.lessons.list(20).await.unwrap();
    state.lessons.list(21).await.unwrap();

    state.courses.delete(10).await.unwrap();

    let courses: Vec<Course> = state.cache.get(&QueryKey::Courses).await.unwrap().unwrap();
    let ids: Vec<i64> = courses.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![11]);

    assert!(state.cache.get::<Vec<CourseModule>>(&QueryKey::Modules(10)).await.unwrap().is_none());
    assert!(state.cache.get::<Vec<Lesson>>(&QueryKey::Lessons(20)).await.unwrap().is_none());
    assert!(state.cache.get::<Vec<Lesson>>(&QueryKey::Lessons(21)).await.unwrap().is_none());
    assert!(state.cache.get::<Vec<CourseModule>>(&QueryKey::Modules(11)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_rejected_token_ends_session() {
    let backend = Backend::default();
    let state = app(&backend).await;
    state.session.login("expired").await.unwrap();
    let mut workspace = Workspace::new(state.clone());

    let result = workspace.execute(Command::Course(CourseCommand::List)).await;

    assert!(result.is_err());
    assert!(!state.session.is_authenticated().await);
    assert!(state.api.token().is_none());
    let notices = state.notifier.drain();
    assert_eq!(notices[0].message, "jwt expired");
    assert_eq!(notices.last().unwrap().message, "Your session has expired. Please log in again.");

    let session = state.session.state().await;
    assert_eq!(guard(&session, &Route::Courses), RouteDecision::Redirect(Route::Login));
}

#[tokio::test]
async fn test_move_is_sent_only_with_save() {
    let backend = Backend::default();

    let state = signed_in(&backend).await;
    let mut workspace = Workspace::new(state);
    workspace
        .execute(Command::Course(CourseCommand::Move { active: 2, over: 1, save: false }))
        .await
        .unwrap();
    assert!(workspace.has_pending());
    assert!(backend.body("/course/order").is_none());

    let state = signed_in(&backend).await;
    let mut workspace = Workspace::new(state);
    workspace
        .execute(Command::Course(CourseCommand::Move { active: 2, over: 1, save: true }))
        .await
        .unwrap();
    assert!(!workspace.has_pending());
    assert_eq!(
        backend.body("/course/order").unwrap(),
        json!([{"id": 10, "order": 2}, {"id": 11, "order": 1}])
    );
}
