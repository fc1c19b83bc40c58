//! Endpoint extraction from OpenAPI documents

use crate::types::*;
use indexmap::IndexMap;
use tracing::debug;

/// Extracts endpoints from raw OpenAPI document structures
pub struct OperationExtractor;

impl OperationExtractor {
    /// Extract all endpoints from a raw OpenAPI document, in document order
    pub fn extract(spec: &RawOpenApiSpec) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();

        let empty_parameters = IndexMap::new();
        let shared_parameters = spec
            .components
            .as_ref()
            .map(|c| &c.parameters)
            .unwrap_or(&empty_parameters);

        for (path, path_item) in &spec.paths {
            // Extract path-level parameters
            let path_params: Vec<Parameter> = path_item
                .parameters
                .iter()
                .filter_map(|p| Self::convert_parameter(p, shared_parameters))
                .collect();

            let methods = [
                (HttpMethod::Get, &path_item.get),
                (HttpMethod::Post, &path_item.post),
                (HttpMethod::Put, &path_item.put),
                (HttpMethod::Patch, &path_item.patch),
                (HttpMethod::Delete, &path_item.delete),
                (HttpMethod::Head, &path_item.head),
                (HttpMethod::Options, &path_item.options),
                (HttpMethod::Trace, &path_item.trace),
            ];

            for (method, operation) in methods {
                if let Some(op) = operation {
                    endpoints.push(Self::extract_endpoint(
                        path,
                        method,
                        op,
                        &path_params,
                        shared_parameters,
                    ));
                }
            }
        }

        endpoints
    }

    /// Extract a single endpoint
    fn extract_endpoint(
        path: &str,
        method: HttpMethod,
        operation: &RawOperation,
        path_params: &[Parameter],
        shared_parameters: &IndexMap<String, RawParameter>,
    ) -> Endpoint {
        let id = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| Self::generate_operation_id(path, method));

        // Combine path-level and operation-level parameters
        let mut parameters = path_params.to_vec();
        for param in &operation.parameters {
            if let Some(p) = Self::convert_parameter(param, shared_parameters) {
                // Remove any path-level param with the same name
                parameters.retain(|existing| existing.name != p.name);
                parameters.push(p);
            }
        }

        let request_body = operation
            .request_body
            .as_ref()
            .and_then(Self::extract_request_body);

        Endpoint {
            id,
            method,
            path: path.to_string(),
            summary: operation.summary.clone(),
            description: operation.description.clone(),
            tags: operation.tags.clone(),
            deprecated: operation.deprecated,
            parameters,
            request_body,
            responses: Self::extract_responses(&operation.responses),
        }
    }

    /// Generate an operation ID from path and method
    fn generate_operation_id(path: &str, method: HttpMethod) -> String {
        // /pedido/pedidoweb/{numeroPedido} -> get_pedido_pedidoweb_numeroPedido
        let path_part = path
            .trim_start_matches('/')
            .replace('/', "_")
            .replace(['{', '}'], "");

        format!("{}_{}", method.as_str().to_lowercase(), path_part)
    }

    /// Convert a raw parameter, following a `components.parameters` reference
    fn convert_parameter(
        param: &RawParameter,
        shared_parameters: &IndexMap<String, RawParameter>,
    ) -> Option<Parameter> {
        let param = match &param.reference {
            Some(reference) => {
                let target = reference
                    .strip_prefix(PARAMETER_REF_PREFIX)
                    .and_then(|name| shared_parameters.get(name));
                match target {
                    Some(target) => target,
                    None => {
                        debug!("Skipping unresolvable parameter reference {}", reference);
                        return None;
                    }
                }
            }
            None => param,
        };

        let location = match param.location.as_str() {
            "path" => ParameterLocation::Path,
            "query" => ParameterLocation::Query,
            "header" => ParameterLocation::Header,
            "cookie" => ParameterLocation::Cookie,
            _ => return None,
        };

        Some(Parameter {
            name: param.name.clone(),
            location,
            required: param.required || location == ParameterLocation::Path,
            description: param.description.clone(),
            schema: param.schema.clone(),
            example: param.example.clone(),
            deprecated: param.deprecated,
        })
    }

    /// Extract request body information
    fn extract_request_body(body: &RawRequestBody) -> Option<RequestBody> {
        let (content_type, media) = Self::preferred_media(&body.content)?;

        Some(RequestBody {
            required: body.required,
            content_type: content_type.clone(),
            schema: media.schema.clone(),
            example: media.example.clone(),
            description: body.description.clone(),
        })
    }

    /// Extract response information
    fn extract_responses(responses: &IndexMap<String, RawResponse>) -> Vec<ResponseSpec> {
        responses
            .iter()
            .map(|(status, response)| {
                let media = response.content.as_ref().and_then(Self::preferred_media);

                ResponseSpec {
                    status_code: status.clone(),
                    description: response.description.clone(),
                    content_type: media.map(|(ct, _)| ct.clone()),
                    schema: media.and_then(|(_, m)| m.schema.clone()),
                    example: media.and_then(|(_, m)| m.example.clone()),
                }
            })
            .collect()
    }

    /// Prefer a JSON media type, else the first one declared
    fn preferred_media(
        content: &IndexMap<String, RawMediaType>,
    ) -> Option<(&String, &RawMediaType)> {
        content
            .iter()
            .find(|(ct, _)| ct.contains("json"))
            .or_else(|| content.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_spec(value: serde_json::Value) -> RawOpenApiSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_generate_operation_id() {
        assert_eq!(
            OperationExtractor::generate_operation_id("/pedido/pedidoweb/{numeroPedido}", HttpMethod::Get),
            "get_pedido_pedidoweb_numeroPedido"
        );
    }

    #[test]
    fn test_operation_params_override_path_params() {
        let spec = raw_spec(json!({
            "openapi": "3.0.1",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/cotacao/retorno/{cotacao}": {
                    "parameters": [
                        {"name": "cotacao", "in": "path", "schema": {"type": "string"}},
                        {"name": "usuario", "in": "query", "schema": {"type": "string"}}
                    ],
                    "get": {
                        "parameters": [
                            {"name": "cotacao", "in": "path", "schema": {"type": "integer"}}
                        ],
                        "responses": {"200": {"description": "OK"}}
                    }
                }
            }
        }));

        let endpoints = OperationExtractor::extract(&spec);
        let params = &endpoints[0].parameters;

        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "usuario");
        assert_eq!(params[1].name, "cotacao");
        assert!(params[1].required);
        assert_eq!(params[1].type_name(), "integer");
    }

    #[test]
    fn test_parameter_refs_are_resolved() {
        let spec = raw_spec(json!({
            "openapi": "3.0.1",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/pedido/cancelados": {
                    "get": {
                        "parameters": [
                            {"$ref": "#/components/parameters/Pagina"},
                            {"$ref": "#/components/parameters/Inexistente"}
                        ],
                        "responses": {}
                    }
                }
            },
            "components": {
                "parameters": {
                    "Pagina": {"name": "pagina", "in": "query", "schema": {"type": "integer"}}
                }
            }
        }));

        let endpoints = OperationExtractor::extract(&spec);
        let params = &endpoints[0].parameters;

        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "pagina");
        assert_eq!(params[0].location, ParameterLocation::Query);
        assert!(!params[0].required);
    }

    #[test]
    fn test_prefers_json_media() {
        let spec = raw_spec(json!({
            "openapi": "3.0.1",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/condicaopagamento/carga": {
                    "post": {
                        "requestBody": {
                            "content": {
                                "text/plain": {"schema": {"type": "string"}},
                                "application/json": {
                                    "schema": {"type": "array", "items": {"type": "object"}},
                                    "example": [{"CodigoCondicao": 0}]
                                }
                            }
                        },
                        "responses": {
                            "201": {"description": "Created"},
                            "400": {
                                "description": "Bad Request",
                                "content": {"text/plain": {"schema": {"type": "string"}}}
                            }
                        }
                    }
                }
            }
        }));

        let endpoint = &OperationExtractor::extract(&spec)[0];
        let body = endpoint.request_body.as_ref().unwrap();

        assert_eq!(body.content_type, "application/json");
        assert_eq!(body.example, Some(json!([{"CodigoCondicao": 0}])));
        assert_eq!(endpoint.responses.len(), 2);
        assert!(endpoint.response("201").unwrap().content_type.is_none());
        assert_eq!(
            endpoint.response("400").unwrap().content_type.as_deref(),
            Some("text/plain")
        );
    }
}
