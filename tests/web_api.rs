use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};

use support_timetable::timetable::{StaffCategory, StaffMember, Student};
use support_timetable::web::{configure, AppState};
use support_timetable::workspace::Workspace;

fn seeded_workspace() -> Workspace {
    let students = vec![
        Student {
            id: 1,
            name: "Han".into(),
            grade: 3,
            class_number: 2,
            severity: 1,
            target_subjects: vec!["Math".into()],
        },
        Student {
            id: 2,
            name: "Yoon".into(),
            grade: 3,
            class_number: 1,
            severity: 2,
            target_subjects: vec![],
        },
    ];
    let staff = vec![StaffMember {
        id: 10,
        name: "Seo".into(),
        category: StaffCategory::Practical,
        fixed_assignees: vec![2],
    }];
    Workspace::new(students, staff)
}

macro_rules! app {
    ($workspace:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new($workspace, None)))
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn lists_and_creates_students() {
    let app = app!(seeded_workspace());

    let req = test::TestRequest::post()
        .uri("/api/students")
        .set_json(json!({"name": "Kim", "grade": 4, "severity": 3, "target_subjects": ["Korean"]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["id"], 3);
    assert_eq!(created["class_number"], 1);

    let req = test::TestRequest::get().uri("/api/students").to_request();
    let students: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(students.as_array().map(Vec::len), Some(3));
}

#[actix_web::test]
async fn rejects_invalid_student() {
    let app = app!(seeded_workspace());

    let req = test::TestRequest::post()
        .uri("/api/students")
        .set_json(json!({"name": "Kim", "grade": 9, "severity": 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn deleting_a_student_clears_fixed_assignments() {
    let app = app!(seeded_workspace());

    let req = test::TestRequest::delete().uri("/api/students/2").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/staff").to_request();
    let staff: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(staff[0]["fixed_assignees"], json!([]));

    let req = test::TestRequest::delete().uri("/api/students/2").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn staff_with_unknown_fixed_student_is_refused() {
    let app = app!(seeded_workspace());

    let req = test::TestRequest::post()
        .uri("/api/staff")
        .set_json(json!({"name": "Ko", "category": "social_service", "fixed_assignees": [42]}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn auto_assign_honours_fixed_staff() {
    let app = app!(seeded_workspace());

    let req = test::TestRequest::post()
        .uri("/api/timetable/1/assign")
        .set_json(json!({"heuristic": "severity"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(
        body["slots"]["Mon-1"],
        json!([{"type": "support", "student_id": 2, "staff_id": 10}])
    );

    let req = test::TestRequest::get().uri("/api/timetable/1/stats").to_request();
    let stats: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stats["support_counts"]["10"], 30);
    assert_eq!(stats["student_support_counts"]["1"], 0);

    // The other semester is independent
    let req = test::TestRequest::get().uri("/api/timetable/2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["slots"], json!({}));
    assert_eq!(body["unsupported"].as_array().map(Vec::len), Some(30));
}

#[actix_web::test]
async fn auto_assign_without_staff_conflicts() {
    let mut workspace = seeded_workspace();
    workspace.staff.clear();
    let app = app!(workspace);

    let req = test::TestRequest::post()
        .uri("/api/timetable/1/assign")
        .set_json(json!({}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn manual_edits_and_blocking() {
    let app = app!(seeded_workspace());

    let req = test::TestRequest::post()
        .uri("/api/timetable/1/slots/Tue-2/special")
        .set_json(json!({"student_id": 1, "subject": "Math"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["present"], true);

    let req = test::TestRequest::post()
        .uri("/api/timetable/1/slots/Tue-2/support")
        .set_json(json!({"student_id": 2, "staff_id": 10}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["entries"].as_array().map(Vec::len), Some(2));

    let req = test::TestRequest::post().uri("/api/timetable/1/slots/Tue-2/blocked").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["present"], true);
    assert_eq!(
        body["entries"],
        json!([{"type": "special", "student_id": 1, "subject": "Math"}, {"type": "blocked"}])
    );

    let req = test::TestRequest::post()
        .uri("/api/timetable/1/slots/Tue-2/support")
        .set_json(json!({"student_id": 2, "staff_id": 10}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn rejects_bad_semester_and_slot() {
    let app = app!(seeded_workspace());

    let req = test::TestRequest::get().uri("/api/timetable/3").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post().uri("/api/timetable/1/slots/Sat-1/blocked").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn attendance_toggle_gates_the_next_run() {
    let app = app!(seeded_workspace());

    let req = test::TestRequest::post().uri("/api/attendance/3/Mon/1/toggle").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["present"], false);

    let req = test::TestRequest::post()
        .uri("/api/timetable/1/assign")
        .set_json(json!({"heuristic": "equal"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["slots"].get("Mon-1").is_none());
    assert_eq!(body["slots"]["Mon-2"].as_array().map(Vec::len), Some(1));
}
