use std::thread::JoinHandle;
use tiny_http::{Header, Response, Server};

#[derive(Debug)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Answer exactly one HTTP request with `status` and a JSON `body`.
///
/// Returns the base URL to point a client at and a handle yielding the
/// request that was received.
pub(crate) fn serve_once(status: u16, body: &str) -> (String, JoinHandle<RecordedRequest>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let body = body.to_string();

    let handle = std::thread::spawn(move || {
        let mut request = server.recv().unwrap();

        let mut received = String::new();
        request.as_reader().read_to_string(&mut received).unwrap();
        let recorded = RecordedRequest {
            method: request.method().to_string(),
            url: request.url().to_string(),
            authorization: request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.to_string()),
            body: received,
        };

        let content_type = Header::from_bytes("Content-Type", "application/json").unwrap();
        let response = Response::from_string(body)
            .with_status_code(status)
            .with_header(content_type);
        request.respond(response).unwrap();

        recorded
    });

    (format!("http://127.0.0.1:{}", port), handle)
}
