use crate::config::ProbeConfig;
use crate::transport::{ProbeError, ProbeResult, Transport};
use crate::types::{MultipartPart, Payload, ProbeRequest, ProbeResponse};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::CONTENT_TYPE;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Blocking HTTP/1.1 client; one request in flight at a time, no retries.
pub struct HttpClient {
    client: reqwest::blocking::Client,
    config: ProbeConfig,
}

impl HttpClient {
    pub fn new(config: ProbeConfig) -> ProbeResult<Self> {
        config
            .validate()
            .map_err(|msg| ProbeError::InvalidConfig { message: msg })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProbeError::InvalidConfig {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    pub fn with_default_config() -> ProbeResult<Self> {
        Self::new(ProbeConfig::default())
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    fn build_multipart(parts: &[MultipartPart]) -> ProbeResult<Form> {
        let mut form = Form::new();
        for part in parts {
            let mut body = Part::bytes(part.data.clone());
            if let Some(file_name) = &part.file_name {
                body = body.file_name(file_name.clone());
            }
            if let Some(content_type) = &part.content_type {
                body = body.mime_str(content_type)?;
            }
            form = form.part(part.field.clone(), body);
        }
        Ok(form)
    }

    fn handle_http_error(err: reqwest::Error) -> ProbeError {
        if err.is_connect() {
            ProbeError::Unreachable {
                message: err.to_string(),
            }
        } else {
            ProbeError::Network(err)
        }
    }

    fn collect_headers(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
        let mut collected: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            collected
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        collected
    }
}

impl Transport for HttpClient {
    fn send(&self, request: &ProbeRequest) -> ProbeResult<ProbeResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes()).map_err(
            |e| ProbeError::InvalidRequest {
                message: format!("Invalid method '{}': {}", request.method, e),
            },
        )?;
        let url = self.config.url_for(&request.path);

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.payload {
            None => builder,
            Some(Payload::Json(value)) => builder.json(value),
            Some(Payload::Form(pairs)) => builder.form(pairs),
            Some(Payload::Multipart(parts)) => builder.multipart(Self::build_multipart(parts)?),
            Some(Payload::Raw { content_type, body }) => {
                let builder = match content_type {
                    Some(content_type) => builder.header(CONTENT_TYPE, content_type.as_str()),
                    None => builder,
                };
                builder.body(body.clone())
            }
        };

        debug!(
            "Sending {} {} (payload: {})",
            request.method,
            url,
            request.payload.as_ref().map(|p| p.kind()).unwrap_or("none")
        );
        let start = Instant::now();

        let response = builder.send().map_err(|e| {
            warn!("{} failed: {}", request.label(), e);
            Self::handle_http_error(e)
        })?;

        let status = response.status().as_u16();
        let headers = Self::collect_headers(response.headers());
        let body = response.bytes()?.to_vec();

        debug!(
            "{} -> {} ({} bytes, {:?})",
            request.label(),
            status,
            body.len(),
            start.elapsed()
        );

        Ok(ProbeResponse {
            status,
            headers,
            body,
        })
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn transport_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Method;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::Server) -> HttpClient {
        HttpClient::new(ProbeConfig::default().with_base_url(server.url())).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = HttpClient::new(ProbeConfig::default().with_base_url("ftp://example.com"));
        assert!(matches!(result, Err(ProbeError::InvalidConfig { .. })));
    }

    #[test]
    fn test_get_returns_status_headers_and_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/test.txt")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("Hello, World!")
            .create();

        let client = client_for(&server);
        let response = client.send(&ProbeRequest::get("/test.txt")).unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.text(), "Hello, World!");
    }

    #[test]
    fn test_not_found_is_not_an_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/nonexistent.txt")
            .with_status(404)
            .expect(1)
            .create();

        let client = client_for(&server);
        let response = client.send(&ProbeRequest::get("/nonexistent.txt")).unwrap();

        mock.assert();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn test_head_has_empty_body() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("HEAD", "/test.txt")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .create();

        let client = client_for(&server);
        let response = client.send(&ProbeRequest::head("/test.txt")).unwrap();

        assert_eq!(response.status, 200);
        assert!(response.has_header("content-type"));
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_post_json_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/test")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"name": "John", "age": 30})))
            .with_status(200)
            .create();

        let client = client_for(&server);
        let request = ProbeRequest::post("/api/test").with_json(json!({"name": "John", "age": 30}));
        let response = client.send(&request).unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_post_form_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/login")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("username".into(), "john".into()),
                Matcher::UrlEncoded("password".into(), "secret".into()),
            ]))
            .with_status(200)
            .create();

        let client = client_for(&server);
        let request = ProbeRequest::post("/api/login")
            .with_payload(Payload::form([("username", "john"), ("password", "secret")]));
        let response = client.send(&request).unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_post_multipart_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/api/upload")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="file"; filename="test.txt""#.to_string()),
                Matcher::Regex("Hello, World!".to_string()),
            ]))
            .with_status(200)
            .create();

        let client = client_for(&server);
        let request = ProbeRequest::post("/api/upload").with_payload(Payload::Multipart(vec![
            MultipartPart::file("file", "test.txt", "Hello, World!"),
        ]));
        let response = client.send(&request).unwrap();

        mock.assert();
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_put_raw_body_and_delete() {
        let mut server = mockito::Server::new();
        let put = server
            .mock("PUT", "/uploaded.txt")
            .match_header("content-type", "text/plain")
            .match_body("This is a test file content")
            .with_status(201)
            .with_body(r#"{"status":201,"message":"Created"}"#)
            .create();
        let delete = server.mock("DELETE", "/uploaded.txt").with_status(200).create();

        let client = client_for(&server);
        let request = ProbeRequest::put("/uploaded.txt")
            .with_payload(Payload::text("text/plain", "This is a test file content"));
        let response = client.send(&request).unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.json().unwrap()["status"], 201);

        let response = client.send(&ProbeRequest::delete("/uploaded.txt")).unwrap();
        assert_eq!(response.status, 200);

        put.assert();
        delete.assert();
    }

    #[test]
    fn test_custom_method_is_sent_verbatim() {
        let mut server = mockito::Server::new();
        let mock = server.mock("PATCH", "/test.txt").with_status(405).create();

        let client = client_for(&server);
        let request = ProbeRequest::new(Method::Other("PATCH".to_string()), "/test.txt");
        let response = client.send(&request).unwrap();

        mock.assert();
        assert_eq!(response.status, 405);
    }

    #[test]
    fn test_invalid_method_is_rejected_before_sending() {
        let client = HttpClient::with_default_config().unwrap();
        let request = ProbeRequest::new(Method::Other("BAD METHOD".to_string()), "/");
        let result = client.send(&request);
        assert!(matches!(result, Err(ProbeError::InvalidRequest { .. })));
    }

    #[test]
    fn test_connection_refused_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ProbeConfig::default().with_base_url(format!("http://127.0.0.1:{}", port));
        let client = HttpClient::new(config).unwrap();
        let result = client.send(&ProbeRequest::get("/"));
        assert!(matches!(result, Err(ProbeError::Unreachable { .. })));
    }
}
