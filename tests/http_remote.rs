use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use petcare_offline::cache::EntityStore;
use petcare_offline::catalog::{Animal, Shelter, Species, User};
use petcare_offline::{HttpRemote, Lookup, RemoteError, RemoteSource, Repository, Source, SqliteStorage};

fn remote(server: &MockServer) -> HttpRemote {
  HttpRemote::new(&server.uri(), Duration::from_secs(2), None).unwrap()
}

// ── Lists ───────────────────────────────────────────────────────

#[tokio::test]
async fn list_sends_paging_query() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/animals"))
    .and(query_param("page", "2"))
    .and(query_param("pageSize", "5"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([
      { "id": "a1", "slug": "fido", "name": "Fido", "status": "available" },
      { "id": "a2", "slug": "rex", "name": "Rex", "status": "adopted", "breedId": "b1" }
    ])))
    .expect(1)
    .mount(&server)
    .await;

  let animals = remote(&server).list::<Animal>(2, 5).await.unwrap();
  assert_eq!(animals.len(), 2);
  assert_eq!(animals[0].slug, "fido");
  assert_eq!(animals[1].breed_id.as_deref(), Some("b1"));
  assert!(!animals[1].is_available());
}

#[tokio::test]
async fn list_server_failure_keeps_status() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/shelters"))
    .respond_with(ResponseTemplate::new(500))
    .mount(&server)
    .await;

  let err = remote(&server).list::<Shelter>(1, 10).await.unwrap_err();
  assert!(matches!(err, RemoteError::Server { status: 500 }));
}

#[tokio::test]
async fn undecodable_body_is_decode_error() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/species"))
    .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
    .mount(&server)
    .await;

  let err = remote(&server).list::<Species>(1, 10).await.unwrap_err();
  assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn refused_connection_is_network_error() {
  let remote = HttpRemote::new("http://127.0.0.1:9", Duration::from_secs(2), None).unwrap();
  let err = remote.list::<Animal>(1, 10).await.unwrap_err();
  assert!(matches!(err, RemoteError::Network(_)));
}

#[tokio::test]
async fn base_path_is_kept() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/v1/users"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
    .expect(1)
    .mount(&server)
    .await;

  let remote =
    HttpRemote::new(&format!("{}/api/v1/", server.uri()), Duration::from_secs(2), None).unwrap();
  assert!(remote.list::<User>(1, 10).await.unwrap().is_empty());
}

// ── Keyed reads ─────────────────────────────────────────────────

#[tokio::test]
async fn get_by_id_hits_item_path() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/users/u1"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(json!({ "id": "u1", "firstName": "Ana", "role": "ShelterManager" })),
    )
    .mount(&server)
    .await;

  let user = remote(&server)
    .get::<User>(&Lookup::Id("u1".into()))
    .await
    .unwrap();
  assert_eq!(user.first_name, "Ana");
  assert_eq!(user.role, "ShelterManager");
}

#[tokio::test]
async fn missing_id_is_not_found() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/users/u404"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;

  let err = remote(&server)
    .get::<User>(&Lookup::Id("u404".into()))
    .await
    .unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn get_by_slug_queries_collection() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/shelters"))
    .and(query_param("slug", "happy-paws"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([
      { "id": "s1", "slug": "happy-paws", "name": "Happy Paws", "capacity": 30 }
    ])))
    .mount(&server)
    .await;

  let shelter = remote(&server)
    .get::<Shelter>(&Lookup::Slug("happy-paws".into()))
    .await
    .unwrap();
  assert_eq!(shelter.id, "s1");
  assert_eq!(shelter.free_places(), 30);
}

#[tokio::test]
async fn empty_slug_match_is_not_found() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/animals"))
    .and(query_param("slug", "ghost"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
    .mount(&server)
    .await;

  let err = remote(&server)
    .get::<Animal>(&Lookup::Slug("ghost".into()))
    .await
    .unwrap_err();
  assert!(matches!(err, RemoteError::NotFound { entity_type: "animal", .. }));
}

#[tokio::test]
async fn server_error_on_keyed_read_is_not_not_found() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/species/sp1"))
    .respond_with(ResponseTemplate::new(502))
    .mount(&server)
    .await;

  let err = remote(&server)
    .get::<Species>(&Lookup::Id("sp1".into()))
    .await
    .unwrap_err();
  assert!(matches!(err, RemoteError::Server { status: 502 }));
}

#[tokio::test]
async fn token_is_sent_as_bearer() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/species"))
    .and(header("authorization", "Bearer s3cret"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "sp1", "name": "Dog" }])))
    .expect(1)
    .mount(&server)
    .await;

  let remote =
    HttpRemote::new(&server.uri(), Duration::from_secs(2), Some("s3cret".to_string())).unwrap();
  let species = remote.list::<Species>(1, 10).await.unwrap();
  assert_eq!(species[0].name, "Dog");
}

// ── Through the repository ──────────────────────────────────────

#[tokio::test]
async fn repository_falls_back_when_server_fails() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/animals"))
    .and(query_param("page", "1"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([
      { "id": "a1", "slug": "fido", "name": "Fido", "status": "available" }
    ])))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/animals"))
    .and(query_param("page", "2"))
    .respond_with(ResponseTemplate::new(503))
    .mount(&server)
    .await;

  let repo = Repository::new(SqliteStorage::open_in_memory().unwrap(), remote(&server));

  let first = repo.animals(1, 10).await.settled().await.unwrap();
  assert_eq!(first.source, Source::Network);

  let second = repo.animals(2, 10).await.settled().await.unwrap();
  assert_eq!(second.source, Source::Offline);
  assert_eq!(second.data.len(), 1);
  assert_eq!(second.data[0].id, "a1");

  // keyed read of a cached record does not reach the server
  let requests_before = server.received_requests().await.unwrap().len();
  assert!(repo.animal("fido").await.is_some());
  assert_eq!(server.received_requests().await.unwrap().len(), requests_before);
}

#[tokio::test]
async fn repository_caches_keyed_fetch() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/species/sp1"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "sp1", "name": "Dog" })))
    .expect(1)
    .mount(&server)
    .await;

  let storage = std::sync::Arc::new(SqliteStorage::open_in_memory().unwrap());
  let repo = Repository::from_shared(
    std::sync::Arc::clone(&storage),
    std::sync::Arc::new(remote(&server)),
  );

  assert_eq!(repo.species("sp1").await.unwrap().name, "Dog");
  assert_eq!(repo.species("sp1").await.unwrap().name, "Dog");
  assert_eq!(storage.count::<Species>().unwrap(), 1);
}
