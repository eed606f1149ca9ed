//! Breeze adapter tests against a local mock HTTP server

use serde_json::json;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use checkin::{AttendanceGateway, BreezeClient, CheckinError, CheckinService, LabelLayout, RosterDirectory};
use shared::{BatchCheckinRequest, InstanceId, PersonId};

mod common;
use common::{RecordingSink, TestFixtures};

fn client(server: &MockServer) -> BreezeClient {
    BreezeClient::with_base_urls(
        format!("{}/api", server.uri()),
        format!("{}/ajax", server.uri()),
        TestFixtures::API_KEY,
        Duration::from_secs(5),
    )
    .unwrap()
}

async fn mount_add(server: &MockServer, person_id: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/events/attendance/add"))
        .and(query_param("instance_id", "7"))
        .and(query_param("person_id", person_id))
        .and(header("Api-Key", TestFixtures::API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_add_attendance_truthy_answers() {
    let server = MockServer::start().await;
    mount_add(&server, "1", json!(true)).await;
    mount_add(&server, "2", json!("true")).await;
    mount_add(&server, "3", json!(false)).await;
    mount_add(&server, "4", json!({"errors": ["already checked in"]})).await;

    let breeze = client(&server);
    let instance = InstanceId::new(7);

    assert!(breeze.add_attendance(instance, PersonId::new(1)).await.unwrap());
    assert!(breeze.add_attendance(instance, PersonId::new(2)).await.unwrap());
    assert!(!breeze.add_attendance(instance, PersonId::new(3)).await.unwrap());
    assert!(!breeze.add_attendance(instance, PersonId::new(4)).await.unwrap());
}

#[tokio::test]
async fn test_remove_attendance_uses_delete_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/attendance/delete"))
        .and(query_param("instance_id", "7"))
        .and(query_param("person_id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("true")))
        .expect(1)
        .mount(&server)
        .await;

    let removed = assert_ok!(
        client(&server)
            .remove_attendance(InstanceId::new(7), PersonId::new(42))
            .await
    );
    assert!(removed);
}

#[tokio::test]
async fn test_error_status_is_gateway_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/attendance/add"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = assert_err!(
        client(&server)
            .add_attendance(InstanceId::new(7), PersonId::new(1))
            .await
    );

    assert!(matches!(err, CheckinError::Gateway { .. }));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_list_and_eligible() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/attendance/list"))
        .and(query_param("instance_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"person_id": "1"}, {"person_id": "2"}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/events/attendance/eligible"))
        .and(query_param("instance_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "3"}])))
        .mount(&server)
        .await;

    let breeze = client(&server);
    assert_eq!(breeze.list_attendance(InstanceId::new(7)).await.unwrap().len(), 2);
    assert_eq!(breeze.eligible_people(InstanceId::new(7)).await.unwrap(), vec![json!({"id": "3"})]);
}

#[tokio::test]
async fn test_events_and_instances() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(query_param("event_id", "55"))
        .and(query_param("details", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "700"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .and(query_param("start", "2024-03-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "1"}, {"id": "2"}])))
        .mount(&server)
        .await;

    let breeze = client(&server);
    let instances = breeze.event_instances("55").await.unwrap();
    assert_eq!(instances, vec![json!({"id": "700"})]);

    let events = breeze.events(Some("2024-03-01".to_string()), None).await.unwrap();
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_person_family_and_combined_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/people"))
        .and(query_param("details", "1"))
        .and(query_param("filter_json", r#"{"id":"42"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "42", "first_name": "Ada"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/people/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "family": [
                {"person_id": "43", "role_name": "Parent", "details": {"first_name": "Ann", "last_name": "Lovelace"}}
            ]
        })))
        .mount(&server)
        .await;

    let breeze = client(&server);

    let person = breeze.person(PersonId::new(42)).await.unwrap();
    assert_eq!(person["first_name"], "Ada");

    let family = breeze.family(PersonId::new(42)).await.unwrap();
    assert_eq!(family.len(), 1);
    assert_eq!(family[0].id, "43");
    assert_eq!(family[0].first_name, "Ann");
    assert_eq!(family[0].role_name, "Parent");

    let combined = breeze.person_with_family(PersonId::new(42)).await.unwrap();
    assert_eq!(combined["first_name"], "Ada");
    assert_eq!(combined["family"][0]["person_id"], "43");
}

#[tokio::test]
async fn test_search_uses_checkin_search() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ajax/search_checkin_people"))
        .and(body_string_contains("query=Ada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "42"}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/people"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let people = client(&server).search_people("Ada").await.unwrap();
    assert_eq!(people, vec![json!({"id": "42"})]);
}

#[tokio::test]
async fn test_search_falls_back_to_people_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ajax/search_checkin_people"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/people"))
        .and(query_param("details", "0"))
        .and(query_param("filter_json", r#"{"name":"Ada"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "42"}, {"id": "77"}])))
        .expect(1)
        .mount(&server)
        .await;

    let people = client(&server).search_people("Ada").await.unwrap();
    assert_eq!(people.len(), 2);
}

#[tokio::test]
async fn test_batch_against_roster_server() {
    let server = MockServer::start().await;
    mount_add(&server, &TestFixtures::ADA.to_string(), json!(true)).await;
    mount_add(&server, &TestFixtures::BO.to_string(), json!(false)).await;
    Mock::given(method("POST"))
        .and(path("/api/events/attendance/add"))
        .and(query_param("person_id", TestFixtures::CY.to_string()))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let service = CheckinService::new(client(&server), LabelLayout::new(), RecordingSink::new());
    let response = service
        .batch_check_in(&BatchCheckinRequest::new(TestFixtures::INSTANCE, TestFixtures::family()))
        .await
        .unwrap();

    let successes: Vec<bool> = response.results.iter().map(|r| r.success).collect();
    assert_eq!(successes, vec![true, false, false]);
    assert_eq!(response.results[1].error.as_deref(), Some("Failed"));
    assert!(response.results[2].error.as_deref().unwrap().contains("500"));
    assert_eq!(response.labels_printed, 1);
}
