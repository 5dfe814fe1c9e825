use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use healthgate_auth::StaticAuthorizer;
use healthgate_backend::build_router;
use healthgate_backend::state::AppState;

async fn spawn_server() -> (String, tokio::task::JoinHandle<()>) {
    let state = Arc::new(AppState::new(
        Arc::new(StaticAuthorizer::admin()),
        Duration::from_secs(5),
    ));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local_addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .unwrap();
    });

    (format!("http://{}:{}", addr.ip(), addr.port()), handle)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
        .expect("client")
}

#[tokio::test]
async fn health_over_tcp() {
    let (base, handle) = spawn_server().await;
    let client = client();

    let res = client
        .get(format!("{base}/health"))
        .header("X-Username", "admin")
        .header("X-Password", "admin")
        .send()
        .await
        .expect("request");
    assert_eq!(res.status().as_u16(), 204);

    let res = client
        .get(format!("{base}/health?X-Username=admin&X-Password=nope"))
        .send()
        .await
        .expect("request");
    assert_eq!(res.status().as_u16(), 403);

    handle.abort();
}

#[tokio::test]
async fn post_health_over_tcp() {
    let (base, handle) = spawn_server().await;
    let client = client();
    let url = format!("{base}/post-health");
    let body = r#"{"X-Username":"admin", "X-Password":"admin"}"#;

    let res = client
        .post(&url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("X-Username=admin&X-Password=admin")
        .send()
        .await
        .expect("request");
    assert_eq!(res.status().as_u16(), 204);

    let res = client
        .post(&url)
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .expect("request");
    assert_eq!(res.status().as_u16(), 204);

    // Same payload without a content type.
    let res = client.post(&url).body(body).send().await.expect("request");
    assert_eq!(res.status().as_u16(), 403);

    let res = client
        .post(&url)
        .header("Content-Type", "application/json")
        .send()
        .await
        .expect("request");
    assert_eq!(res.status().as_u16(), 403);

    let res = client
        .post(&url)
        .header("Content-Type", "application/json")
        .body("not-json")
        .send()
        .await
        .expect("request");
    assert_eq!(res.status().as_u16(), 403);
    let text = res.text().await.expect("body");
    assert!(text.contains("not authorized"));

    handle.abort();
}
