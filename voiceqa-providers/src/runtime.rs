use crate::request::{Body, HttpRequest};
use anyhow::{Context, anyhow};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

pub async fn execute(req: &HttpRequest) -> anyhow::Result<HttpResponse> {
    // Important: without an explicit timeout, an unreachable backend can hang
    // an exchange indefinitely while the UI shows a spinner.
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .context("build http client")?;

    let mut headers = HeaderMap::new();
    for (k, v) in &req.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .with_context(|| format!("invalid header name: {k}"))?;
        let value =
            HeaderValue::from_str(v).with_context(|| format!("invalid header value for {k}"))?;
        headers.insert(name, value);
    }

    let builder = match req.method.as_str() {
        "GET" => client.get(&req.url),
        "POST" => client.post(&req.url),
        other => return Err(anyhow!("unsupported method: {other}")),
    }
    .headers(headers);

    let builder = match &req.body {
        Body::Empty => builder,
        Body::Json(s) => builder.body(s.clone()),
        Body::MultipartFormData { bytes, .. } => builder.body(bytes.clone()),
    };

    let resp = builder.send().await.context("http request failed")?;
    let status = resp.status().as_u16();
    let body = resp
        .bytes()
        .await
        .context("failed reading response body")?
        .to_vec();

    Ok(HttpResponse { status, body })
}

pub fn ensure_success(resp: &HttpResponse) -> anyhow::Result<()> {
    if (200..=299).contains(&resp.status) {
        return Ok(());
    }
    Err(anyhow!(
        "backend request failed: status={} body={}",
        resp.status,
        String::from_utf8_lossy(&resp.body)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn executes_json_post_with_headers() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/ask"))
            .and(body_string_contains("\"question\""))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let req = HttpRequest {
            method: "POST".into(),
            url: format!("{}/api/ask", server.uri()),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Body::Json(r#"{"question":"why?"}"#.into()),
        };

        let resp = execute(&req).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"ok");
    }

    #[tokio::test]
    async fn rejects_unsupported_methods() {
        let req = HttpRequest {
            method: "PATCH".into(),
            url: "http://localhost:1/".into(),
            headers: vec![],
            body: Body::Empty,
        };
        let err = execute(&req).await.unwrap_err();
        assert!(err.to_string().contains("unsupported method"));
    }

    #[test]
    fn success_statuses_pass_the_check() {
        assert!(ensure_success(&HttpResponse { status: 200, body: vec![] }).is_ok());
        assert!(ensure_success(&HttpResponse { status: 204, body: vec![] }).is_ok());
    }

    #[test]
    fn failure_statuses_carry_the_body() {
        let err = ensure_success(&HttpResponse {
            status: 500,
            body: b"boom".to_vec(),
        })
        .unwrap_err();
        let s = err.to_string();
        assert!(s.contains("500"));
        assert!(s.contains("boom"));
    }
}
