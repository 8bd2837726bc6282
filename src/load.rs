//! Obtain a schema registry from a URL or a local file.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::document::Document;
use crate::error::LoadError;
use crate::ir::SchemaRegistry;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl DocumentFormat {
    /// Decide from the name's extension, else from the first non-blank byte.
    pub fn detect(name: &str, text: &str) -> Self {
        let name = name.split(['?', '#']).next().unwrap_or(name);
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => DocumentFormat::Json,
            Some("yaml" | "yml") => DocumentFormat::Yaml,
            _ => {
                if text.trim_start().starts_with('{') {
                    DocumentFormat::Json
                } else {
                    DocumentFormat::Yaml
                }
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOADING
// ————————————————————————————————————————————————————————————————————————————

/// Fetch or read, parse, and lower the document behind `source`.
pub fn load_registry(source: &Source, settings: &SourceConfig) -> Result<SchemaRegistry, LoadError> {
    let text = read_source(source, settings)?;
    let origin = source.to_string();
    let format = DocumentFormat::detect(&origin, &text);
    debug!(%origin, ?format, bytes = text.len(), "parsing schema document");
    let registry = parse_registry(&text, format, &origin)?;
    info!(%origin, schemas = registry.len(), "loaded schema registry");
    Ok(registry)
}

/// Parse document text and lower its top-level schemas.
pub fn parse_registry(text: &str, format: DocumentFormat, origin: &str) -> Result<SchemaRegistry, LoadError> {
    let document: Document = match format {
        DocumentFormat::Json => crate::path_de::from_json_with_path(text),
        DocumentFormat::Yaml => crate::path_de::from_yaml_with_path(text),
    }
    .map_err(|message| LoadError::Parse { origin: origin.to_owned(), message })?;

    let schemas = document
        .into_schemas()
        .ok_or_else(|| LoadError::MissingRegistry { origin: origin.to_owned() })?;
    crate::lower::lower_registry(&schemas)
}

fn read_source(source: &Source, settings: &SourceConfig) -> Result<String, LoadError> {
    match source {
        Source::Url(url) => fetch(url, settings),
        Source::File(path) => {
            info!(path = %path.display(), "reading schema document");
            std::fs::read_to_string(path).map_err(|source| LoadError::Read {
                path: path.clone(),
                source,
            })
        }
    }
}

fn fetch(url: &str, settings: &SourceConfig) -> Result<String, LoadError> {
    info!(%url, timeout_secs = settings.timeout_secs, "fetching schema document");
    let wrap = |source| LoadError::Fetch { url: url.to_owned(), source };

    let client = reqwest::blocking::Client::builder()
        .timeout(settings.timeout())
        .user_agent(USER_AGENT)
        .build()
        .map_err(wrap)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(wrap)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;
    use crate::descriptor::convert;

    const YAML: &str = "\
openapi: 3.0.3
info: {title: pets, version: '1'}
components:
  schemas:
    pet:
      type: object
      properties:
        id: {type: integer, format: int64}
        born: {type: string, format: date}
        tags:
          type: array
          items: {type: string}
";

    #[test]
    fn detects_by_extension_then_content() {
        assert_eq!(DocumentFormat::detect("api.json", "openapi: 3"), DocumentFormat::Json);
        assert_eq!(DocumentFormat::detect("api.YML", "{}"), DocumentFormat::Yaml);
        assert_eq!(
            DocumentFormat::detect("https://host/api.yaml?raw=true", "{}"),
            DocumentFormat::Yaml
        );
        assert_eq!(DocumentFormat::detect("https://host/spec", "  \n{\"a\":1}"), DocumentFormat::Json);
        assert_eq!(DocumentFormat::detect("https://host/spec", "openapi: 3"), DocumentFormat::Yaml);
    }

    #[test]
    fn parses_yaml_registry() {
        let reg = parse_registry(YAML, DocumentFormat::Yaml, "inline").unwrap();
        assert_eq!(
            convert(&reg["pet"]).as_str(),
            r#"{"born":"DATE","id":"INT64","tags":["STRING"]}"#
        );
    }

    #[test]
    fn missing_registry_is_an_error() {
        let err = parse_registry("openapi: 3.0.3\npaths: {}\n", DocumentFormat::Yaml, "inline").unwrap_err();
        assert!(matches!(err, LoadError::MissingRegistry { ref origin } if origin == "inline"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_registry("{\"components\": ", DocumentFormat::Json, "broken.json").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let source = Source::File(PathBuf::from("/definitely/not/here.json"));
        let err = load_registry(&source, &SourceConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[test]
    fn source_displays_its_origin() {
        assert_eq!(Source::Url("https://h/a.yaml".into()).to_string(), "https://h/a.yaml");
        assert_eq!(Source::File(PathBuf::from("a/b.json")).to_string(), "a/b.json");
    }

    // -------------------------- HTTP source ------------------------------- //

    /// Answer one connection per canned response, in order. The handle
    /// yields each request head as received.
    fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            responses
                .into_iter()
                .map(|response| {
                    let (mut stream, _) = listener.accept().unwrap();
                    let mut head = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        let n = stream.read(&mut buf).unwrap();
                        if n == 0 {
                            break;
                        }
                        head.extend_from_slice(&buf[..n]);
                    }
                    stream.write_all(response.as_bytes()).unwrap();
                    String::from_utf8_lossy(&head).into_owned()
                })
                .collect()
        });
        (base, handle)
    }

    fn response(status: &str, headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n{headers}\r\n{body}",
            body.len()
        )
    }

    fn quick() -> SourceConfig {
        SourceConfig { timeout_secs: 10, ..SourceConfig::default() }
    }

    #[test]
    fn url_source_loads_registry() {
        let (base, server) = serve(vec![response("200 OK", "Content-Type: application/yaml\r\n", YAML)]);
        let source = Source::Url(format!("{base}/ghec.yaml"));
        let reg = load_registry(&source, &quick()).unwrap();
        assert_eq!(
            convert(&reg["pet"]).as_str(),
            r#"{"born":"DATE","id":"INT64","tags":["STRING"]}"#
        );

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("GET /ghec.yaml "));
    }

    #[test]
    fn url_source_sends_user_agent() {
        let (base, server) = serve(vec![response("200 OK", "", YAML)]);
        load_registry(&Source::Url(format!("{base}/api.yaml")), &quick()).unwrap();

        let head = server.join().unwrap().remove(0).to_ascii_lowercase();
        let expected = format!("user-agent: openapi-descriptor/{}", env!("CARGO_PKG_VERSION"));
        assert!(head.contains(&expected), "request was: {head}");
    }

    #[test]
    fn url_source_follows_redirects() {
        let (base, server) = serve(vec![
            response("302 Found", "Location: /moved/api.yaml\r\n", ""),
            response("200 OK", "", YAML),
        ]);
        let reg = load_registry(&Source::Url(format!("{base}/api.yaml")), &quick()).unwrap();
        assert!(reg.contains_key("pet"));

        let requests = server.join().unwrap();
        assert!(requests[1].starts_with("GET /moved/api.yaml "));
    }

    #[test]
    fn url_source_json_by_extension() {
        let body = r#"{"components": {"schemas": {"flag": {"type": "boolean"}}}}"#;
        let (base, server) = serve(vec![response("200 OK", "", body)]);
        let reg = load_registry(&Source::Url(format!("{base}/api.json?ref=main")), &quick()).unwrap();
        assert_eq!(convert(&reg["flag"]).as_str(), r#""BOOLEAN""#);
        server.join().unwrap();
    }

    #[test]
    fn url_error_status_is_a_fetch_error() {
        let (base, server) = serve(vec![response("404 Not Found", "", "missing")]);
        let url = format!("{base}/ghec.yaml");
        let err = load_registry(&Source::Url(url.clone()), &quick()).unwrap_err();
        server.join().unwrap();

        assert!(matches!(err, LoadError::Fetch { url: ref u, .. } if u == &url));
        let report = format!("{:#}", anyhow::Error::new(err));
        assert!(report.starts_with(&format!("failed to fetch schema document from {url}: ")));
        assert_eq!(report.matches("404 Not Found").count(), 1, "{report}");
    }
}
