mod common;

use axum::http::StatusCode;
use common::TestApp;
use curenet::admin::provision::{provision_admin, NewAdmin};
use serde_json::json;

async fn staff_token(app: &TestApp) -> String {
    provision_admin(
        app.state.store.as_ref(),
        NewAdmin {
            username: "root".into(),
            email: "root@example.com".into(),
            password: "admin-pass-1".into(),
        },
    )
    .await
    .unwrap();
    let reply = app.login("root", "admin-pass-1").await;
    assert!(reply.redirected_to("/dashboard"));
    reply.token().unwrap()
}

#[tokio::test]
async fn health_endpoint_works() {
    let app = TestApp::new();
    let reply = app.get("/health", None).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn doctor_needs_clinic_before_approval() {
    let app = TestApp::new();
    let admin = staff_token(&app).await;

    let token = app.register("drsmith", "DOCTOR").await;
    let reply = app
        .post(
            "/profile/create/doctor",
            Some(&token),
            json!({ "specialization": "Cardiology", "qualification": "MD", "experience_years": 7 }),
        )
        .await;
    assert!(reply.redirected_to("/login"));
    assert!(reply.flash_message().unwrap().contains("pending admin approval"));

    // profile submission ends the session
    assert!(app.get("/dashboard", Some(&token)).await.redirected_to("/login"));

    let reply = app.login("drsmith", "correct-horse").await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(reply.token().is_none());

    let pending = app.get("/admin/doctors?approved=false", Some(&admin)).await;
    assert_eq!(pending.status, StatusCode::OK);
    let profile_id = pending.json[0]["id"].as_str().unwrap().to_string();

    let reply = app
        .post("/admin/doctors/approve", Some(&admin), json!({ "ids": [profile_id] }))
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(
        reply.json["message"],
        "Warning: 1 doctor(s) do not have a clinic assigned. \
         Please assign clinics individually before approving."
    );
    assert_eq!(app.login("drsmith", "correct-horse").await.status, StatusCode::FORBIDDEN);

    let clinic = app
        .post("/admin/clinics", Some(&admin), json!({ "name": "Central Clinic" }))
        .await;
    assert_eq!(clinic.status, StatusCode::CREATED);
    let clinic_id = clinic.json["id"].as_str().unwrap().to_string();

    let assigned = app
        .put(
            &format!("/admin/doctors/{profile_id}/clinic"),
            Some(&admin),
            json!({ "clinic_id": clinic_id }),
        )
        .await;
    assert_eq!(assigned.status, StatusCode::OK);

    let reply = app
        .post("/admin/doctors/approve", Some(&admin), json!({ "ids": [profile_id] }))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["message"], "1 doctor(s) approved successfully.");

    let reply = app.login("drsmith", "correct-horse").await;
    assert!(reply.redirected_to("/dashboard"));
    let token = reply.token().unwrap();

    let dash = app.get("/dashboard", Some(&token)).await;
    assert_eq!(dash.status, StatusCode::OK);
    assert_eq!(dash.json["dashboard"], "doctor");
    assert_eq!(dash.json["profile"]["clinic_id"], clinic_id.as_str());

    // wrong role for the patient dashboard
    let reply = app.get("/dashboard/patient", Some(&token)).await;
    assert!(reply.redirected_to("/dashboard"));
    assert_eq!(reply.flash_message(), Some("Access denied."));
}

#[tokio::test]
async fn patient_completes_profile_then_reaches_dashboard() {
    let app = TestApp::new();
    let token = app.register("jane", "PATIENT").await;

    assert!(app
        .get("/dashboard", Some(&token))
        .await
        .redirected_to("/profile/create/patient"));

    let reply = app
        .post(
            "/profile/create/patient",
            Some(&token),
            json!({ "date_of_birth": "1990-05-01", "gender": "F", "phone_number": "555-0100" }),
        )
        .await;
    assert!(reply.redirected_to("/dashboard"));
    assert_eq!(reply.flash_message(), Some("Profile created successfully!"));

    let dash = app.get("/dashboard/patient", Some(&token)).await;
    assert_eq!(dash.status, StatusCode::OK);
    assert_eq!(dash.json["dashboard"], "patient");
    assert_eq!(dash.json["user"]["username"], "jane");

    // a second profile is refused
    let again = app.get("/profile/create/patient", Some(&token)).await;
    assert!(again.redirected_to("/dashboard"));
    assert_eq!(again.flash_message(), Some("Profile already exists."));

    // and a patient cannot open the doctor form
    let other = app.get("/profile/create/doctor", Some(&token)).await;
    assert!(other.redirected_to("/dashboard"));
}

#[tokio::test]
async fn deactivated_patient_is_turned_away() {
    let app = TestApp::new();
    let admin = staff_token(&app).await;
    let token = app.register("jane", "PATIENT").await;
    app.post("/profile/create/patient", Some(&token), json!({}))
        .await;
    let dash = app.get("/dashboard", Some(&token)).await;
    let profile_id = dash.json["profile"]["id"].as_str().unwrap().to_string();

    let reply = app
        .put(
            &format!("/admin/patients/{profile_id}/active"),
            Some(&admin),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);

    assert_eq!(app.get("/dashboard", Some(&token)).await.status, StatusCode::FORBIDDEN);
    let reply = app.login("jane", "correct-horse").await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(
        reply.json["error"],
        "Your account has been deactivated. Please contact admin."
    );
}

#[tokio::test]
async fn doctor_without_profile_is_sent_to_profile_form_on_login() {
    let app = TestApp::new();
    app.register("bob", "DOCTOR").await;

    let reply = app.login("bob", "correct-horse").await;
    assert!(reply.redirected_to("/profile/create/doctor"));
    assert!(reply.token().is_none());
}

#[tokio::test]
async fn registration_reports_field_errors() {
    let app = TestApp::new();
    app.register("alice", "PATIENT").await;

    let reply = app
        .post(
            "/register",
            None,
            json!({
                "username": "alice2",
                "email": "ALICE@example.com",
                "password1": "correct-horse",
                "password2": "correct-horse",
                "role": "PATIENT",
            }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        reply.json["errors"]["email"][0],
        "A user with this email already exists."
    );

    let reply = app
        .post(
            "/register",
            None,
            json!({
                "username": "carol",
                "email": "carol@example.com",
                "password1": "correct-horse",
                "password2": "different-horse",
            }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.json["errors"]["password2"].is_array());
    assert!(reply.json["errors"]["role"].is_array());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new();
    app.register("alice", "PATIENT").await;
    let reply = app.login("alice", "not-the-password").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json["error"], "Invalid username or password.");
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = TestApp::new();
    let token = app.register("alice", "PATIENT").await;

    let reply = app.post("/logout", Some(&token), json!({})).await;
    assert!(reply.redirected_to("/login"));
    assert_eq!(
        reply.flash_message(),
        Some("You have been logged out successfully.")
    );

    assert!(app.get("/dashboard", Some(&token)).await.redirected_to("/login"));
}

#[tokio::test]
async fn signed_in_user_skips_login_form() {
    let app = TestApp::new();
    let token = app.register("alice", "PATIENT").await;
    assert!(app.get("/login", Some(&token)).await.redirected_to("/dashboard"));
    assert_eq!(app.get("/login", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_api_requires_staff() {
    let app = TestApp::new();
    let patient = app.register("alice", "PATIENT").await;
    let self_made_admin = app.register("mallory", "ADMIN").await;

    assert!(app.get("/admin", None).await.redirected_to("/login"));
    for token in [&patient, &self_made_admin] {
        let reply = app.get("/admin", Some(token)).await;
        assert!(reply.redirected_to("/dashboard"));
        assert_eq!(reply.flash_message(), Some("Access denied."));
    }

    // no bounce between /dashboard and /admin for non-staff admins
    let dash = app.get("/dashboard", Some(&self_made_admin)).await;
    assert_eq!(dash.status, StatusCode::FORBIDDEN);
    assert_eq!(dash.json["dashboard"], "admin");

    let admin = staff_token(&app).await;
    let overview = app.get("/admin", Some(&admin)).await;
    assert_eq!(overview.status, StatusCode::OK);
    assert_eq!(overview.json["users"], 3);

    // staff admins land on the console from the dashboard
    assert!(app.get("/dashboard", Some(&admin)).await.redirected_to("/admin"));
}

#[tokio::test]
async fn bulk_reject_and_empty_selection() {
    let app = TestApp::new();
    let admin = staff_token(&app).await;

    let reply = app
        .post("/admin/doctors/reject", Some(&admin), json!({ "ids": [] }))
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

    let token = app.register("drjones", "DOCTOR").await;
    app.post(
        "/profile/create/doctor",
        Some(&token),
        json!({ "specialization": "Oncology", "qualification": "MBBS" }),
    )
    .await;
    let listed = app.get("/admin/doctors", Some(&admin)).await;
    let id = listed.json[0]["id"].as_str().unwrap().to_string();

    let reply = app
        .post("/admin/doctors/reject", Some(&admin), json!({ "ids": [id] }))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["message"], "1 doctor(s) rejected.");
    assert_eq!(app.login("drjones", "correct-horse").await.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn mistyped_bodies_answer_with_form_errors() {
    let app = TestApp::new();
    let admin = staff_token(&app).await;
    let token = app.register("drlee", "DOCTOR").await;

    let reply = app
        .post(
            "/profile/create/doctor",
            Some(&token),
            json!({ "specialization": "Cardiology", "qualification": "MD", "experience_years": "seven" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let message = reply.json["errors"]["non_field_errors"][0].as_str().unwrap();
    assert!(message.contains("experience_years"), "{message}");
    // nothing was created and the session is still usable
    assert!(app
        .get("/dashboard", Some(&token))
        .await
        .redirected_to("/profile/create/doctor"));

    let reply = app
        .post("/admin/doctors/approve", Some(&admin), json!({ "ids": ["not-a-uuid"] }))
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.json["errors"]["non_field_errors"].is_array());

    let reply = app
        .post("/login", None, json!({ "username": null, "password": "x" }))
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.json["errors"]["non_field_errors"].is_array());
}

#[tokio::test]
async fn overlong_email_is_rejected_at_registration() {
    let app = TestApp::new();
    let reply = app
        .post(
            "/register",
            None,
            json!({
                "username": "longmail",
                "email": format!("{}@example.com", "a".repeat(300)),
                "password1": "correct-horse",
                "password2": "correct-horse",
                "role": "PATIENT",
            }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        reply.json["errors"]["email"][0],
        "Ensure this value has at most 254 characters."
    );
}
