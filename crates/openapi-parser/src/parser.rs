//! Main OpenAPI parser

use crate::error::{ParseError, ParseResult};
use crate::operations::OperationExtractor;
use crate::types::*;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};

/// Timeout for document fetches
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenAPI 3.x parser
pub struct OpenApiParser;

impl OpenApiParser {
    /// Parse an OpenAPI document from a string (auto-detects JSON/YAML)
    pub fn parse(content: &str) -> ParseResult<ApiDocument> {
        if content.trim().is_empty() {
            return Err(ParseError::InvalidFormat("document is empty".to_string()));
        }

        if content.trim_start().starts_with('{') {
            Self::parse_json(content)
        } else {
            Self::parse_yaml(content)
        }
    }

    /// Parse an OpenAPI document from JSON
    pub fn parse_json(content: &str) -> ParseResult<ApiDocument> {
        let raw_spec: RawOpenApiSpec = serde_json::from_str(content)?;
        Self::convert_spec(raw_spec)
    }

    /// Parse an OpenAPI document from YAML
    pub fn parse_yaml(content: &str) -> ParseResult<ApiDocument> {
        let content = Self::sanitize_large_numbers(content);
        let raw_spec: RawOpenApiSpec = serde_yaml::from_str(&content)?;
        Self::convert_spec(raw_spec)
    }

    /// Read and parse a document from disk
    pub fn parse_file(path: &Path) -> ParseResult<ApiDocument> {
        info!("Loading OpenAPI document from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");

        if is_yaml {
            Self::parse_yaml(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Clamp integer bounds too large for serde_yaml.
    ///
    /// Some generators write 64-bit extremes for min/max values, which makes
    /// serde_yaml fail with "number out of range".
    fn sanitize_large_numbers(content: &str) -> String {
        static LARGE_BOUND: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = LARGE_BOUND.get_or_init(|| {
            Regex::new(
                r"(?m)^(\s*(?:minimum|maximum|exclusiveMinimum|exclusiveMaximum):\s*)(-?\d{16,})",
            )
            .ok()
        });

        let Some(pattern) = pattern else {
            return content.to_string();
        };

        pattern
            .replace_all(content, |caps: &regex::Captures| {
                let prefix = &caps[1];
                if caps[2].starts_with('-') {
                    format!("{}-2147483648", prefix)
                } else {
                    format!("{}2147483647", prefix)
                }
            })
            .into_owned()
    }

    /// Fetch and parse an OpenAPI document from a URL
    pub async fn fetch_and_parse(url: &str) -> ParseResult<ApiDocument> {
        url::Url::parse(url).map_err(|e| ParseError::InvalidUrl(format!("{}: {}", url, e)))?;

        info!("Fetching OpenAPI document from: {}", url);

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ParseError::HttpError(e.to_string()))?;

        let response = client
            .get(url)
            .header("Accept", "application/json, application/yaml, text/yaml")
            .send()
            .await
            .map_err(|e| ParseError::FetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ParseError::FetchError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let content = response
            .text()
            .await
            .map_err(|e| ParseError::FetchError(e.to_string()))?;

        // Parse based on content type or file extension
        if content_type.contains("yaml") || url.ends_with(".yaml") || url.ends_with(".yml") {
            Self::parse_yaml(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Convert a raw OpenAPI document to our internal format
    fn convert_spec(raw: RawOpenApiSpec) -> ParseResult<ApiDocument> {
        if !raw.openapi.starts_with("3.") {
            return Err(ParseError::UnsupportedVersion(raw.openapi));
        }

        debug!("Parsing OpenAPI {} document: {}", raw.openapi, raw.info.title);

        let endpoints = OperationExtractor::extract(&raw);

        debug!("Extracted {} endpoints", endpoints.len());

        let servers = raw
            .servers
            .iter()
            .map(|s| ServerInfo {
                url: s.url.clone(),
                description: s.description.clone(),
            })
            .collect();

        let components = raw
            .components
            .map(|c| ComponentRegistry::new(c.schemas))
            .unwrap_or_default();

        Ok(ApiDocument {
            openapi: raw.openapi,
            title: raw.info.title,
            description: raw.info.description,
            version: raw.info.version,
            servers,
            endpoints,
            components,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_SPEC: &str = r#"
openapi: "3.0.1"
info:
  title: Comlink Integração
  version: "v1"
servers:
  - url: https://sonora-dev.comlink.com.br/integracao
paths:
  /pedido/enviar:
    post:
      operationId: enviarPedido
      summary: Publica o pedido
      tags: [Pedido]
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Pedido'
      responses:
        '201':
          description: Created
  /pedido/pedidoweb/{numeroPedido}:
    get:
      summary: Obtém dados do pedido publicado na web
      tags: [Pedido]
      parameters:
        - name: numeroPedido
          in: path
          schema:
            type: string
      responses:
        '200':
          description: OK
components:
  schemas:
    Pedido:
      type: object
      properties:
        NumeroCliente:
          type: string
"#;

    #[test]
    fn test_parse_yaml() {
        let doc = OpenApiParser::parse_yaml(SAMPLE_SPEC).unwrap();

        assert_eq!(doc.title, "Comlink Integração");
        assert_eq!(doc.version, "v1");
        assert_eq!(doc.endpoints.len(), 2);
        assert_eq!(
            doc.default_server_url(),
            Some("https://sonora-dev.comlink.com.br/integracao")
        );
        assert!(doc.components.get("Pedido").is_some());
    }

    #[test]
    fn test_parse_extracts_endpoints() {
        let doc = OpenApiParser::parse(SAMPLE_SPEC).unwrap();

        let enviar = doc.endpoints.iter().find(|e| e.id == "enviarPedido").unwrap();
        assert_eq!(enviar.method, HttpMethod::Post);
        assert_eq!(enviar.tag(), "Pedido");
        let schema = enviar.request_body.as_ref().unwrap().schema.as_ref().unwrap();
        assert_eq!(schema.reference.as_deref(), Some("#/components/schemas/Pedido"));

        let web = doc
            .endpoints
            .iter()
            .find(|e| e.path == "/pedido/pedidoweb/{numeroPedido}")
            .unwrap();
        assert_eq!(web.id, "get_pedido_pedidoweb_numeroPedido");
        assert!(web.parameters[0].required);
    }

    #[test]
    fn test_parse_json_autodetect() {
        let doc = OpenApiParser::parse(
            r#"{"openapi": "3.1.0", "info": {"title": "t", "version": "1"}, "paths": {}}"#,
        )
        .unwrap();
        assert!(doc.endpoints.is_empty());
        assert!(doc.components.is_empty());
    }

    #[test]
    fn test_rejects_swagger_2() {
        let result = OpenApiParser::parse(
            r#"{"openapi": "2.0", "info": {"title": "t", "version": "1"}, "paths": {}}"#,
        );
        assert!(matches!(result, Err(ParseError::UnsupportedVersion(v)) if v == "2.0"));
    }

    #[test]
    fn test_rejects_empty_document() {
        assert!(matches!(
            OpenApiParser::parse("  \n"),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_sanitize_large_numbers() {
        let yaml_with_large_nums = r#"
openapi: "3.0.0"
info:
  title: Test API
  version: "1.0.0"
paths: {}
components:
  schemas:
    TestSchema:
      type: object
      properties:
        seed:
          type: integer
          minimum: -9223372036854776000
          maximum: 9223372036854776000
"#;

        let result = OpenApiParser::parse_yaml(yaml_with_large_nums);
        assert!(result.is_ok(), "Failed to parse: {:?}", result.err());
    }

    #[tokio::test]
    async fn test_fetch_and_parse() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/swagger/v1/swagger.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    r#"{"openapi": "3.0.1", "info": {"title": "Remote", "version": "1"}, "paths": {}}"#,
                    "application/json",
                ),
            )
            .mount(&mock_server)
            .await;

        let url = format!("{}/swagger/v1/swagger.json", mock_server.uri());
        let doc = OpenApiParser::fetch_and_parse(&url).await.unwrap();

        assert_eq!(doc.title, "Remote");
    }

    #[tokio::test]
    async fn test_fetch_reports_http_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let url = format!("{}/v3/api-docs", mock_server.uri());
        let err = OpenApiParser::fetch_and_parse(&url).await.unwrap_err();

        assert!(matches!(err, ParseError::FetchError(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let err = OpenApiParser::fetch_and_parse("not a url").await.unwrap_err();
        assert!(matches!(err, ParseError::InvalidUrl(_)));
    }
}
