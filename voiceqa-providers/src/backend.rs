use crate::request::{Body, HttpRequest};
use anyhow::{Context, anyhow};
use url::Url;
use voiceqa_core::types::SessionId;

fn api_url(base_url: &str, path: &str) -> String {
    format!("{}/api/{}", base_url.trim_end_matches('/'), path)
}

fn json_headers() -> Vec<(String, String)> {
    vec![
        ("Content-Type".into(), "application/json".into()),
        ("Accept".into(), "application/json".into()),
    ]
}

fn post_json(url: String, body: serde_json::Value) -> HttpRequest {
    HttpRequest {
        method: "POST".into(),
        url,
        headers: json_headers(),
        body: Body::Json(body.to_string()),
    }
}

fn get(url: String) -> HttpRequest {
    HttpRequest {
        method: "GET".into(),
        url,
        headers: vec![("Accept".into(), "application/json".into())],
        body: Body::Empty,
    }
}

/// Accepts only absolute http(s) URLs as content sources; everything else is
/// rejected before it reaches the extraction backend.
pub fn validate_source_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid URL: {raw}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!("unsupported URL scheme: {other}")),
    }
}

/// Resolves a TTS `audio_url` against the backend base URL. The backend may
/// return either an absolute URL or a path like `/api/audio/<file>`.
pub fn resolve_audio_url(base_url: &str, audio_url: &str) -> anyhow::Result<String> {
    if audio_url.starts_with("http://") || audio_url.starts_with("https://") {
        return Ok(audio_url.to_string());
    }

    let base = Url::parse(base_url).with_context(|| format!("invalid base URL: {base_url}"))?;
    let joined = base
        .join(audio_url)
        .with_context(|| format!("invalid audio URL: {audio_url}"))?;
    Ok(joined.to_string())
}

pub fn build_extract_request(base_url: &str, urls: &[String]) -> HttpRequest {
    post_json(
        api_url(base_url, "links"),
        serde_json::json!({ "urls": urls }),
    )
}

pub fn build_ask_request(
    base_url: &str,
    question: &str,
    session_id: Option<&SessionId>,
) -> HttpRequest {
    let mut body = serde_json::json!({ "question": question });
    if let Some(sid) = session_id {
        if let Some(map) = body.as_object_mut() {
            map.insert(
                "session_id".into(),
                serde_json::Value::String(sid.as_str().to_string()),
            );
        }
    }
    post_json(api_url(base_url, "ask"), body)
}

pub fn build_tts_request(base_url: &str, text: &str, voice_id: Option<&str>) -> HttpRequest {
    let mut body = serde_json::json!({ "text": text });
    if let Some(voice) = voice_id.map(str::trim).filter(|v| !v.is_empty()) {
        if let Some(map) = body.as_object_mut() {
            map.insert(
                "voice_id".into(),
                serde_json::Value::String(voice.to_string()),
            );
        }
    }
    post_json(api_url(base_url, "tts"), body)
}

pub fn build_upload_audio_request(base_url: &str, wav_bytes: &[u8]) -> HttpRequest {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::new();
    append_file(&mut body, &boundary, "audio", "recording.wav", "audio/wav", wav_bytes);
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    HttpRequest {
        method: "POST".into(),
        url: api_url(base_url, "upload-audio"),
        headers: vec![
            (
                "Content-Type".into(),
                format!("multipart/form-data; boundary={}", boundary),
            ),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::MultipartFormData { boundary, bytes: body },
    }
}

pub fn build_voices_request(base_url: &str) -> HttpRequest {
    get(api_url(base_url, "voices"))
}

pub fn build_health_request(base_url: &str) -> HttpRequest {
    get(api_url(base_url, "health"))
}

pub fn build_audio_fetch_request(resolved_audio_url: &str) -> HttpRequest {
    HttpRequest {
        method: "GET".into(),
        url: resolved_audio_url.to_string(),
        headers: vec![("Accept".into(), "audio/mpeg, audio/*".into())],
        body: Body::Empty,
    }
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_source_urls() {
        assert!(validate_source_url("https://example.com/post").is_ok());
        assert!(validate_source_url(" http://example.com ").is_ok());
        assert!(validate_source_url("ftp://example.com").is_err());
        assert!(validate_source_url("not a url").is_err());
    }

    #[test]
    fn resolves_relative_and_absolute_audio_urls() {
        let abs = resolve_audio_url("http://localhost:8000", "https://cdn.example/a.mp3").unwrap();
        assert_eq!(abs, "https://cdn.example/a.mp3");

        let rel = resolve_audio_url("http://localhost:8000", "/api/audio/a.mp3").unwrap();
        assert_eq!(rel, "http://localhost:8000/api/audio/a.mp3");

        assert!(resolve_audio_url("not-a-base", "/api/audio/a.mp3").is_err());
    }

    #[test]
    fn builds_extract_request() {
        let req = build_extract_request("http://localhost:8000/", &["https://a.example".into()]);
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "http://localhost:8000/api/links");
        match &req.body {
            Body::Json(s) => assert!(s.contains("https://a.example")),
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn ask_request_includes_session_only_when_present() {
        let without = build_ask_request("http://h", "why?", None);
        match &without.body {
            Body::Json(s) => assert!(!s.contains("session_id")),
            other => panic!("expected JSON body, got {other:?}"),
        }

        let sid = SessionId::new("s-1");
        let with = build_ask_request("http://h", "why?", Some(&sid));
        match &with.body {
            Body::Json(s) => {
                assert!(s.contains("\"session_id\":\"s-1\""));
                assert!(s.contains("\"question\":\"why?\""));
            }
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn tts_request_skips_blank_voice() {
        let req = build_tts_request("http://h", "hello", Some("  "));
        match &req.body {
            Body::Json(s) => assert!(!s.contains("voice_id")),
            other => panic!("expected JSON body, got {other:?}"),
        }

        let req = build_tts_request("http://h", "hello", Some("nova"));
        match &req.body {
            Body::Json(s) => assert!(s.contains("\"voice_id\":\"nova\"")),
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn builds_multipart_audio_upload() {
        let req = build_upload_audio_request("http://h", &[1, 2, 3]);
        assert_eq!(req.url, "http://h/api/upload-audio");
        assert!(
            req.header("content-type")
                .unwrap()
                .starts_with("multipart/form-data; boundary=")
        );

        match &req.body {
            Body::MultipartFormData { bytes, .. } => {
                let s = String::from_utf8_lossy(bytes);
                assert!(s.contains("name=\"audio\""));
                assert!(s.contains("filename=\"recording.wav\""));
                assert!(s.contains("Content-Type: audio/wav"));
            }
            other => panic!("expected multipart body, got {other:?}"),
        }
    }
}
