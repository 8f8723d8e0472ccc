use ministry_records::{GalleryUpload, NewRecord, PartnershipStatus, RecordId, RecordKind};
use ministry_store::{ErrorKind, RecordStore, RestStore, StoreConfig, StoreOp};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Local HTTP endpoint answering each connection with the next canned reply
struct Backend {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl Backend {
    async fn start(replies: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind backend");
        let addr = listener.local_addr().expect("backend addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            for (status, body) in replies {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut stream).await;
                seen.lock().push(request);
                let response = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream
                    .write_all(response.as_bytes())
                    .await
                    .expect("write response");
                stream.shutdown().await.ok();
            }
        });
        Self { addr, requests }
    }

    fn store(&self, kind: RecordKind) -> RestStore {
        let config = StoreConfig {
            base_url: format!("http://{}", self.addr),
            api_key: "anon-key".to_string(),
            ..StoreConfig::default()
        };
        RestStore::new(&config, kind).expect("build store")
    }

    /// Raw request text, header names lowercased
    fn request(&self, index: usize) -> String {
        self.requests.lock()[index].clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&raw);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= end + 4 + length {
                break;
            }
        }
    }
    let text = String::from_utf8_lossy(&raw).into_owned();
    match text.split_once("\r\n\r\n") {
        Some((head, body)) => format!("{}\r\n\r\n{body}", head.to_lowercase()),
        None => text.to_lowercase(),
    }
}

fn partnership_row(id: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": id,
        "created_at": created_at,
        "full_name": format!("Partner {id}"),
        "email": format!("{id}@example.org"),
        "partnership_types": ["prayer"],
        "status": "pending",
    })
}

#[tokio::test]
async fn fetch_sends_credentials_and_skips_unreadable_rows() {
    let rows = json!([
        partnership_row("p1", "2024-01-01T09:00:00Z"),
        { "full_name": "No id", "email": "x@example.org", "created_at": "2024-02-01T09:00:00Z" },
        partnership_row("p2", "2024-03-01T09:00:00Z"),
    ]);
    let backend = Backend::start(vec![(200, rows.to_string())]).await;
    let store = backend.store(RecordKind::Partnership);

    let fetched = store.fetch_all().await.unwrap();
    let ids: Vec<&str> = fetched.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["p2", "p1"]);
    assert_eq!(fetched.skipped, 1);

    let request = backend.request(0);
    let line = request.lines().next().unwrap();
    assert!(line.starts_with("get /rest/v1/partnership_requests?"), "{line}");
    assert!(line.contains("select="), "{line}");
    assert!(line.contains("order=created_at.desc"), "{line}");
    assert!(request.contains("\r\napikey: anon-key\r\n"), "{request}");
    assert!(request.contains("\r\nauthorization: bearer anon-key\r\n"), "{request}");
}

#[tokio::test]
async fn mutations_touching_no_rows_are_not_found() {
    let backend = Backend::start(vec![(200, "[]".to_string()), (200, "[]".to_string())]).await;
    let store = backend.store(RecordKind::Partnership);
    let id = RecordId::new("p9");

    let err = store
        .update_status(&id, PartnershipStatus::Approved.into())
        .await
        .unwrap_err();
    assert_eq!((err.op, err.kind), (StoreOp::Update, ErrorKind::NotFound));

    let err = store.remove(&id).await.unwrap_err();
    assert_eq!((err.op, err.kind), (StoreOp::Delete, ErrorKind::NotFound));

    let patch = backend.request(0);
    assert!(patch.starts_with("patch /rest/v1/partnership_requests?id=eq.p9 "), "{patch}");
    assert!(patch.contains("\r\nprefer: return=representation\r\n"), "{patch}");
    assert!(patch.ends_with(r#"{"status":"approved"}"#), "{patch}");

    let delete = backend.request(1);
    assert!(delete.starts_with("delete /rest/v1/partnership_requests?id=eq.p9 "), "{delete}");
}

#[tokio::test]
async fn http_failures_map_to_error_kinds() {
    let cases = [
        (401, ErrorKind::Forbidden),
        (404, ErrorKind::NotFound),
        (409, ErrorKind::Conflict),
        (422, ErrorKind::Invalid),
        (500, ErrorKind::Network),
    ];
    let replies = cases
        .iter()
        .map(|(status, _)| (*status, json!({ "message": "denied" }).to_string()))
        .collect();
    let backend = Backend::start(replies).await;
    let store = backend.store(RecordKind::Gallery);

    for (status, kind) in cases {
        let err = store.fetch_all().await.unwrap_err();
        assert_eq!(err.kind, kind, "HTTP {status}");
        assert_eq!(err.op, StoreOp::Fetch);
        assert!(err.detail.starts_with(&format!("HTTP {status}: ")), "{}", err.detail);
        assert!(err.detail.contains("denied"), "{}", err.detail);
        assert_eq!(err.is_retryable(), kind == ErrorKind::Network);
    }
}

#[tokio::test]
async fn create_returns_the_stored_row() {
    let stored = json!([{
        "id": "g9",
        "created_at": "2024-06-01T10:00:00Z",
        "title": "Harvest thanksgiving",
        "category": "Events",
        "image_url": "https://cdn.example.org/gallery/harvest.jpg",
    }]);
    let backend = Backend::start(vec![(201, stored.to_string()), (201, "[]".to_string())]).await;
    let store = backend.store(RecordKind::Gallery);
    let upload = GalleryUpload {
        title: "Harvest thanksgiving".to_string(),
        category: "events".to_string(),
        image_url: "https://cdn.example.org/gallery/harvest.jpg".to_string(),
        ..GalleryUpload::default()
    };

    let record = store.create(NewRecord::Gallery(upload.clone())).await.unwrap();
    assert_eq!(record.id.as_str(), "g9");
    assert_eq!(record.category().as_deref(), Some("events"));

    let post = backend.request(0);
    assert!(post.starts_with("post /rest/v1/gallery_images "), "{post}");
    assert!(post.contains("\r\nprefer: return=representation\r\n"), "{post}");
    assert!(post.contains("\"title\":\"Harvest thanksgiving\""), "{post}");

    let err = store.create(NewRecord::Gallery(upload)).await.unwrap_err();
    assert_eq!((err.op, err.kind), (StoreOp::Create, ErrorKind::Network));
}

#[tokio::test]
async fn unreachable_backend_is_a_retryable_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = StoreConfig {
        base_url: format!("http://{addr}"),
        api_key: "anon-key".to_string(),
        ..StoreConfig::default()
    };
    let store = RestStore::new(&config, RecordKind::Donation).unwrap();
    let err = store.fetch_all().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Network);
    assert!(err.is_retryable());
}
