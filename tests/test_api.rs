use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use reconquest_games::api::{ApiClient, Status};
use reconquest_games::reward::{RewardReceipt, RewardSubmitter, SubmitError};

/// Serve one canned response on a local port.  Returns the API base URL and
/// a receiver for the request line the client sent.
fn serve_once(status: &str, body: &str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let text = String::from_utf8_lossy(&request);
        let line = text.lines().next().unwrap_or_default().to_string();
        stream.write_all(response.as_bytes()).unwrap();
        tx.send(line).unwrap();
    });
    (format!("http://{addr}/api"), rx)
}

fn client(base: &str) -> ApiClient {
    ApiClient::new(base, Duration::from_secs(5)).unwrap()
}

fn request_line(rx: &mpsc::Receiver<String>) -> String {
    rx.recv_timeout(Duration::from_secs(5)).unwrap()
}

// ── completar-juego ──────────────────────────────────────────────────────────

#[test]
fn completion_posts_and_reads_the_receipt() {
    let (base, rx) = serve_once("200 OK", r#"{"mensaje":"bien hecho","estrellas":15}"#);
    let receipt = client(&base).complete_game().unwrap();
    assert_eq!(
        receipt,
        RewardReceipt {
            message: Some("bien hecho".to_string()),
            stars: Some(15),
        }
    );
    assert!(request_line(&rx).starts_with("POST /api/completar-juego "));
}

#[test]
fn rejected_completion_carries_the_server_detail() {
    let (base, rx) = serve_once(
        "400 Bad Request",
        r#"{"detail":"game already completed today"}"#,
    );
    let err = client(&base).complete_game().unwrap_err();
    assert_eq!(
        err,
        SubmitError::Rejected {
            status: 400,
            detail: "game already completed today".to_string(),
        }
    );
    request_line(&rx);
}

#[test]
fn unexpected_completion_body_still_counts_as_granted() {
    let (base, rx) = serve_once("200 OK", "ok");
    let mut api = client(&base);
    assert_eq!(api.submit_match_completion(), Ok(RewardReceipt::default()));
    request_line(&rx);
}

#[test]
fn unreachable_service_is_a_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let err = client(&format!("http://127.0.0.1:{port}/api"))
        .complete_game()
        .unwrap_err();
    assert!(matches!(err, SubmitError::Transport(_)));
}

// ── estado ───────────────────────────────────────────────────────────────────

#[test]
fn status_reads_points_and_stars() {
    let (base, rx) = serve_once("200 OK", r#"{"puntos_consideracion":40,"estrellas":3}"#);
    let status = client(&format!("{base}/")).status().unwrap();
    assert_eq!(
        status,
        Status {
            consideration_points: 40,
            stars: 3,
        }
    );
    assert!(request_line(&rx).starts_with("GET /api/estado "));
}

#[test]
fn malformed_status_is_a_decode_error() {
    let (base, rx) = serve_once("200 OK", "[1, 2");
    let err = client(&base).status().unwrap_err();
    assert!(matches!(err, SubmitError::Decode(_)));
    request_line(&rx);
}
