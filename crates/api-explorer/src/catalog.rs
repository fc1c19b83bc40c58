//! Endpoint catalog backed by a live OpenAPI document or the built-in one

use indexmap::IndexMap;
use openapi_parser::{
    ApiDocument, Endpoint, ExampleSynthesizer, FieldIntrospector, HttpMethod, OpenApiParser,
    ResponseSpec, SchemaResolver,
};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{ExplorerError, Result};

/// Static catalog of the Comlink integration API, used when no live
/// document is configured
const BUILTIN_CATALOG: &str = include_str!("../catalog/comlink.json");

/// Where a catalog's document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Builtin,
    Remote(String),
    File(PathBuf),
}

impl CatalogSource {
    /// `http(s)://` locations are fetched, anything else is a file path;
    /// no location means the built-in catalog
    pub fn from_location(location: Option<&str>) -> Self {
        match location {
            None => CatalogSource::Builtin,
            Some(loc) if loc.starts_with("http://") || loc.starts_with("https://") => {
                CatalogSource::Remote(loc.to_string())
            }
            Some(loc) => CatalogSource::File(PathBuf::from(loc)),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Builtin => f.write_str("built-in catalog"),
            CatalogSource::Remote(url) => f.write_str(url),
            CatalogSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A loaded API document with lookup helpers
#[derive(Debug, Clone)]
pub struct EndpointCatalog {
    document: ApiDocument,
}

impl EndpointCatalog {
    pub fn from_document(document: ApiDocument) -> Self {
        Self { document }
    }

    /// Parse the embedded static catalog
    pub fn builtin() -> Result<Self> {
        let document = OpenApiParser::parse_json(BUILTIN_CATALOG)?;
        debug!("Loaded built-in catalog with {} endpoints", document.endpoints.len());
        Ok(Self::from_document(document))
    }

    /// Fetch and parse a live document
    pub async fn fetch(url: &str) -> Result<Self> {
        let document = OpenApiParser::fetch_and_parse(url).await?;
        info!(
            "Loaded {} endpoints from {} ({} {})",
            document.endpoints.len(),
            url,
            document.title,
            document.version
        );
        Ok(Self::from_document(document))
    }

    /// Load from any source
    pub async fn load(source: &CatalogSource) -> Result<Self> {
        match source {
            CatalogSource::Builtin => Self::builtin(),
            CatalogSource::Remote(url) => Self::fetch(url).await,
            CatalogSource::File(path) => Ok(Self::from_document(OpenApiParser::parse_file(path)?)),
        }
    }

    pub fn document(&self) -> &ApiDocument {
        &self.document
    }

    /// First server declared by the document
    pub fn base_url(&self) -> Option<&str> {
        self.document.default_server_url()
    }

    /// Endpoints grouped by their first tag, groups in first-seen order
    pub fn groups(&self) -> IndexMap<&str, Vec<&Endpoint>> {
        let mut groups: IndexMap<&str, Vec<&Endpoint>> = IndexMap::new();
        for endpoint in &self.document.endpoints {
            groups.entry(endpoint.tag()).or_default().push(endpoint);
        }
        groups
    }

    /// Endpoints in listing order (group by group); list numbers index this
    pub fn ordered(&self) -> Vec<&Endpoint> {
        self.groups().into_values().flatten().collect()
    }

    /// Find an endpoint by id, by `METHOD /path`, or by its 1-based list number
    pub fn find(&self, key: &str) -> Result<&Endpoint> {
        let key = key.trim();
        let endpoints = &self.document.endpoints;

        if let Some(endpoint) = endpoints.iter().find(|e| e.id == key) {
            return Ok(endpoint);
        }

        if let Some((method, path)) = key.split_once(' ') {
            if let Ok(method) = method.parse::<HttpMethod>() {
                let path = path.trim();
                if let Some(endpoint) = endpoints.iter().find(|e| e.method == method && e.path == path) {
                    return Ok(endpoint);
                }
            }
        }

        if let Ok(number) = key.parse::<usize>() {
            if let Some(endpoint) = number.checked_sub(1).and_then(|i| self.ordered().get(i).copied()) {
                return Ok(endpoint);
            }
        }

        Err(ExplorerError::EndpointNotFound(key.to_string()))
    }

    pub fn resolver(&self) -> SchemaResolver<'_> {
        SchemaResolver::new(&self.document.components)
    }

    pub fn synthesizer(&self) -> ExampleSynthesizer<'_> {
        ExampleSynthesizer::with_resolver(self.resolver())
    }

    pub fn introspector(&self) -> FieldIntrospector<'_> {
        FieldIntrospector::with_resolver(self.resolver())
    }

    /// Example request body: the documented one, else synthesized.
    /// `None` when the endpoint takes no body.
    pub fn request_example(&self, endpoint: &Endpoint) -> Option<Value> {
        let body = endpoint.request_body.as_ref()?;
        Some(
            body.example
                .clone()
                .unwrap_or_else(|| self.synthesizer().synthesize_opt(body.schema.as_ref())),
        )
    }

    /// Example response payload, `None` when the response has no content
    pub fn response_example(&self, response: &ResponseSpec) -> Option<Value> {
        if let Some(example) = &response.example {
            return Some(example.clone());
        }
        response
            .schema
            .as_ref()
            .map(|schema| self.synthesizer().synthesize(schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_builtin_catalog_groups() {
        let catalog = EndpointCatalog::builtin().unwrap();
        let groups = catalog.groups();

        assert_eq!(
            groups.keys().copied().collect::<Vec<_>>(),
            vec!["CartaConvite", "CondicaoPagamento", "Cotacao", "Pedido", "OrdemServico"]
        );
        assert_eq!(groups["Pedido"].len(), 4);
        assert_eq!(
            catalog.base_url(),
            Some("https://sonora-dev.comlink.com.br/integracao")
        );
    }

    #[test]
    fn test_untagged_endpoints_go_to_other() {
        let document = OpenApiParser::parse_json(
            r#"{
                "openapi": "3.0.1",
                "info": {"title": "t", "version": "1"},
                "paths": {
                    "/a": {"get": {"tags": ["Pedido"], "responses": {}}},
                    "/b": {"get": {"responses": {}}},
                    "/c": {"get": {"tags": ["Pedido"], "responses": {}}}
                }
            }"#,
        )
        .unwrap();
        let catalog = EndpointCatalog::from_document(document);
        let groups = catalog.groups();

        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["Pedido", "Other"]);
        let ordered: Vec<&str> = catalog.ordered().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(ordered, vec!["/a", "/c", "/b"]);
        assert_eq!(catalog.find("3").unwrap().path, "/b");
    }

    #[test]
    fn test_find_by_id_label_and_number() {
        let catalog = EndpointCatalog::builtin().unwrap();

        let by_id = catalog.find("obter-pedido-web").unwrap();
        assert_eq!(by_id.path, "/pedido/pedidoweb/{numeroPedido}");

        let by_label = catalog.find("get /pedido/pedidoweb/{numeroPedido}").unwrap();
        assert_eq!(by_label.id, "obter-pedido-web");

        assert_eq!(catalog.find("1").unwrap().id, "get-cartas-convite");
        assert!(matches!(
            catalog.find("0"),
            Err(ExplorerError::EndpointNotFound(_))
        ));
        assert!(matches!(
            catalog.find("DELETE /pedido/enviar"),
            Err(ExplorerError::EndpointNotFound(_))
        ));
    }

    #[test]
    fn test_shared_parameter_refs_resolve() {
        let catalog = EndpointCatalog::builtin().unwrap();
        let endpoint = catalog.find("get-carta-convite").unwrap();

        assert_eq!(endpoint.parameters.len(), 1);
        assert_eq!(endpoint.parameters[0].name, "cartaConvite");
        assert_eq!(endpoint.parameters[0].type_name(), "integer");
    }

    #[test]
    fn test_request_example_merges_all_of() {
        let catalog = EndpointCatalog::builtin().unwrap();
        let endpoint = catalog.find("enviar-pedido").unwrap();
        let example = catalog.request_example(endpoint).unwrap();

        let cabecalho = &example["Cabecalho"];
        assert_eq!(cabecalho["CNPJ"], json!("string"));
        assert_eq!(cabecalho["NumeroCliente"], json!("string"));
        assert_eq!(cabecalho["SimboloMoeda"], json!("BRL"));
        assert_eq!(cabecalho["EmailComprador"], json!("user@example.com"));
        assert_eq!(example["Itens"][0]["Quantidade"], json!(1));
        assert_eq!(example["Itens"][0]["Unidade"], json!("str"));
        assert_eq!(example["CondicoesPagamento"][0]["PercentualParcela"], json!(100));
    }

    #[test]
    fn test_endpoints_without_body_have_no_example() {
        let catalog = EndpointCatalog::builtin().unwrap();
        let endpoint = catalog.find("pedidos-cancelados").unwrap();

        assert!(catalog.request_example(endpoint).is_none());

        let ok = endpoint.response("200").unwrap();
        let example = catalog.response_example(ok).unwrap();
        assert_eq!(example[0]["NumeroCliente"], json!("string"));
        assert!(catalog.response_example(endpoint.response("204").unwrap()).is_none());
    }

    #[test]
    fn test_request_fields() {
        let catalog = EndpointCatalog::builtin().unwrap();
        let endpoint = catalog.find("enviar-pedido").unwrap();
        let schema = endpoint.request_body.as_ref().unwrap().schema.as_ref().unwrap();
        let fields = catalog.introspector().fields(schema);
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names[0], "Cabecalho");
        assert!(fields[0].required);
        assert!(names.contains(&"Cabecalho.CNPJ"));
        assert!(names.contains(&"Itens[0].Quantidade"));
        assert!(names.contains(&"Fornecedor.Email"));

        let numero = fields.iter().find(|f| f.name == "Cabecalho.NumeroCliente").unwrap();
        assert!(numero.required);
        assert!(numero.is_nested);
    }

    #[test]
    fn test_source_from_location() {
        assert_eq!(CatalogSource::from_location(None), CatalogSource::Builtin);
        assert_eq!(
            CatalogSource::from_location(Some("https://api.example.com/v3/api-docs")),
            CatalogSource::Remote("https://api.example.com/v3/api-docs".to_string())
        );
        assert_eq!(
            CatalogSource::from_location(Some("docs/openapi.yaml")),
            CatalogSource::File(PathBuf::from("docs/openapi.yaml"))
        );
    }

    #[tokio::test]
    async fn test_load_remote() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/swagger/v1/swagger.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"openapi": "3.0.1", "info": {"title": "Live", "version": "2"}, "paths": {"/ping": {"get": {"responses": {}}}}}"#,
                "application/json",
            ))
            .mount(&mock_server)
            .await;

        let source = CatalogSource::Remote(format!("{}/swagger/v1/swagger.json", mock_server.uri()));
        let catalog = EndpointCatalog::load(&source).await.unwrap();

        assert_eq!(catalog.document().title, "Live");
        assert_eq!(catalog.find("get_ping").unwrap().path, "/ping");
    }

    #[tokio::test]
    async fn test_load_remote_failure_is_document_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let source = CatalogSource::Remote(format!("{}/missing.json", mock_server.uri()));
        let err = EndpointCatalog::load(&source).await.unwrap_err();

        assert!(matches!(err, ExplorerError::Document(_)));
    }
}
