use std::time::Duration;

use claimd::applications::ApplicationFilter;
use claimd::config::{ClientOptions, SESSION_TTL_WEEK};
use claimd::error::Error;
use claimd::fixture::Fixture;
use claimd::identity::{Role, UserIdentity};
use claimd::models::Recommendation;
use claimd::view::{DashboardView, Route};
use claimd::Claimd;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn strict(server: &MockServer) -> Claimd {
    Claimd::new_with_options(
        &server.uri(),
        ClientOptions::default().with_fallback_to_fixture(false),
    )
}

async fn mount_jane(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Jane Doe", "ssn": "123-45-6789" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/applications/123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "applications": [{
                "application_id": "A1",
                "confidence_level": 0.92,
                "recommendation": "approve",
                "summary": "..."
            }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sign_in_shows_applications() {
    let server = MockServer::start().await;
    mount_jane(&server).await;

    let claimd = strict(&server);
    let dashboard = claimd.dashboard(None);
    let view = dashboard.sign_in("jane doe", "123456789").await.unwrap();

    let rows = view.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].application_id, "A1");
    assert_eq!(rows[0].confidence, "92%");
    assert_eq!(rows[0].badge, "approve");
    assert_eq!(rows[0].recommendation, Recommendation::Approve);
    assert_eq!(view.route(), Route::UserDashboard);

    let stored = claimd.session().load().await.unwrap().unwrap();
    assert_eq!(stored.name, "jane doe");
    assert_eq!(stored.identifier, "123456789");
    assert_eq!(stored.role, Some(Role::User));
}

#[tokio::test]
async fn test_reload_uses_stored_session() {
    let server = MockServer::start().await;
    mount_jane(&server).await;

    let claimd = strict(&server);
    claimd
        .session()
        .save(&UserIdentity::new("Jane Doe", "123-45-6789"))
        .await
        .unwrap();

    let view = claimd.dashboard(None).load().await.unwrap();
    assert!(matches!(view, DashboardView::Applications { ref rows, .. } if rows.len() == 1));
}

#[tokio::test]
async fn test_known_user_without_applications_shows_empty_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Jane Doe", "ssn": "123-45-6789" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/applications/123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "applications": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let view = strict(&server)
        .dashboard(None)
        .sign_in("Jane Doe", "123-45-6789")
        .await
        .unwrap();
    match view {
        DashboardView::NoApplications { identity } => assert_eq!(identity.name, "Jane Doe"),
        other => panic!("unexpected view {other:?}"),
    }
}

#[tokio::test]
async fn test_custom_fixture_serves_offline_reads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fixture = Fixture::from_json(
        r#"[{"name":"Jane Doe","ssn":"123-45-6789","applications":[
            {"application_id":"F1","confidence_level":0.5,"recommendation":"further_review"}
        ]}]"#,
    )
    .unwrap();
    let claimd = Claimd::with_fixture(&server.uri(), ClientOptions::default(), fixture);
    let view = claimd
        .dashboard(None)
        .sign_in("Jane Doe", "123456789")
        .await
        .unwrap();
    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.rows()[0].application_id, "F1");
    assert_eq!(view.rows()[0].confidence, "50%");
}

#[tokio::test]
async fn test_empty_candidate_list_shows_empty_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let view = strict(&server)
        .dashboard(None)
        .sign_in("Jane Doe", "123456789")
        .await
        .unwrap();
    match view {
        DashboardView::NoApplications { identity } => assert_eq!(identity.name, "Jane Doe"),
        other => panic!("unexpected view {other:?}"),
    }
}

#[tokio::test]
async fn test_load_without_session_is_signed_out() {
    let server = MockServer::start().await;
    let view = strict(&server).dashboard(None).load().await.unwrap();
    assert_eq!(view, DashboardView::SignedOut);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sign_out_clears_session() {
    let server = MockServer::start().await;
    mount_jane(&server).await;

    let claimd = strict(&server);
    let dashboard = claimd.dashboard(None);
    dashboard.sign_in("Jane Doe", "123456789").await.unwrap();
    assert_eq!(dashboard.sign_out().await.unwrap(), DashboardView::SignedOut);
    assert!(claimd.session().load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_blank_sign_in_is_rejected_without_requests() {
    let server = MockServer::start().await;
    let err = strict(&server)
        .dashboard(None)
        .sign_in("  ", "123456789")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_sign_in_opens_reviewer_dashboard() {
    let server = MockServer::start().await;
    let claimd = Claimd::new_with_options(
        &server.uri(),
        ClientOptions::default()
            .with_fallback_to_fixture(false)
            .with_admin_identifier("s3cret"),
    );

    let dashboard = claimd.dashboard(None);
    let view = dashboard.sign_in("admin", "s3cret").await.unwrap();
    assert!(matches!(view, DashboardView::Reviewer { .. }));
    assert_eq!(view.route(), Route::AdminDashboard);

    let reloaded = dashboard.load().await.unwrap();
    assert!(matches!(reloaded, DashboardView::Reviewer { .. }));
}

#[tokio::test]
async fn test_admin_dashboard_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "application_id": "A1", "applicant_name": "Jane Doe", "recommendation": "approve", "confidence_level": 0.92 },
            { "application_id": "B2", "applicant_name": "John Roe", "recommendation": "deny", "confidence_level": 0.31 }
        ])))
        .mount(&server)
        .await;

    let dashboard = strict(&server).dashboard(None);
    let all = dashboard.admin(&ApplicationFilter::new()).await.unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.rows.len(), 2);
    assert_eq!(all.rows[1].route, Route::AdminDetail("B2".into()));

    let none = dashboard
        .admin(&ApplicationFilter::new().with_search("nobody"))
        .await
        .unwrap();
    assert!(none.rows.is_empty());
    assert_eq!(none.empty_message(), "Try adjusting your search or filter criteria.");
}

#[tokio::test]
async fn test_deny_failure_leaves_view_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/applications/A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "application_id": "A1",
            "recommendation": "further_review"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/applications/A1/deny"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Could not deny application"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = strict(&server).dashboard(None);
    let before = dashboard.detail("A1").await.unwrap();

    let err = dashboard.deny("A1").await.unwrap_err();
    assert!(matches!(err, Error::Review(ref msg) if msg == "Could not deny application"));

    let after = dashboard.detail("A1").await.unwrap();
    assert_eq!(before, after);
    assert_eq!(after.admin_status, None);
}

#[tokio::test]
async fn test_approve_returns_to_reviewer_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/applications/A1/approve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Application approved"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let dashboard = strict(&server).dashboard(None);
    let notice = dashboard.approve("A1").await.unwrap();
    assert_eq!(notice.message, "Application approved");
    assert_eq!(notice.next, Route::AdminDashboard);
    dashboard.approve("A1").await.unwrap();
}

#[tokio::test]
async fn test_cancelling_dashboard_aborts_load() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let claimd = Claimd::new(&server.uri());
    claimd
        .session()
        .save(&UserIdentity::new("Jane Doe", "123456789"))
        .await
        .unwrap();

    let dashboard = claimd.dashboard(None);
    let cancel = dashboard.cancel_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let err = dashboard.load().await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_dropping_dashboard_cancels_its_token() {
    let server = MockServer::start().await;
    let claimd = strict(&server);
    let dashboard = claimd.dashboard(None);
    let token = dashboard.cancel_handle();
    assert!(!token.is_cancelled());
    drop(dashboard);
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn test_parent_token_cancels_dashboard() {
    let server = MockServer::start().await;
    let parent = tokio_util::sync::CancellationToken::new();
    let dashboard = strict(&server).dashboard(Some(&parent));
    parent.cancel();

    let err = dashboard.detail("A1").await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_offline_dashboard_uses_bundled_fixture() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let view = Claimd::new(&server.uri())
        .dashboard(None)
        .sign_in("James Whitfield", "987-65-4321")
        .await
        .unwrap();
    let rows = view.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].confidence, "64%");
    assert_eq!(rows[1].badge, "deny");
}

#[tokio::test]
async fn test_session_survives_in_file_jar() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("nested").join("session.json");
    let server = MockServer::start().await;
    mount_jane(&server).await;

    let options = ClientOptions::default()
        .with_fallback_to_fixture(false)
        .with_session_path(&jar);
    let first = Claimd::new_with_options(&server.uri(), options.clone());
    first
        .dashboard(None)
        .sign_in("Jane Doe", "123-45-6789")
        .await
        .unwrap();
    assert!(jar.exists());

    let second = Claimd::new_with_options(&server.uri(), options);
    assert_eq!(second.session().ttl(), SESSION_TTL_WEEK);
    let view = second.dashboard(None).load().await.unwrap();
    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.identity().map(|i| i.name.as_str()), Some("Jane Doe"));
}
