//! Plain-text views of catalogs, endpoints, examples and responses

use openapi_parser::{Endpoint, FieldDescriptor};
use serde_json::Value;
use std::fmt::{self, Write};

use crate::catalog::EndpointCatalog;
use crate::executor::{ExecutedResponse, ResponseBody};
use crate::history::RequestHistory;

/// Numbered endpoint listing, grouped by tag
pub fn catalog(catalog: &EndpointCatalog) -> String {
    let mut out = String::new();
    write_catalog(&mut out, catalog).ok();
    out
}

/// Everything known about one endpoint
pub fn endpoint(catalog: &EndpointCatalog, endpoint: &Endpoint) -> String {
    let mut out = String::new();
    write_endpoint(&mut out, catalog, endpoint).ok();
    out
}

/// Field table for a request or response body
pub fn fields(fields: &[FieldDescriptor]) -> String {
    let mut out = String::new();
    write_fields(&mut out, fields).ok();
    out
}

/// Pretty-printed JSON
pub fn example(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Status line, timing, headers and body of an executed request
pub fn response(url: &str, response: &ExecutedResponse) -> String {
    let mut out = String::new();
    write_response(&mut out, url, response).ok();
    out
}

pub fn history(history: &RequestHistory) -> String {
    let mut out = String::new();
    write_history(&mut out, history).ok();
    out
}

fn write_catalog(out: &mut String, catalog: &EndpointCatalog) -> fmt::Result {
    let document = catalog.document();
    writeln!(out, "{} {}", document.title, document.version)?;
    if let Some(base_url) = catalog.base_url() {
        writeln!(out, "Server: {}", base_url)?;
    }

    let mut number = 0;
    for (tag, endpoints) in catalog.groups() {
        writeln!(out)?;
        writeln!(out, "{}", tag)?;
        for endpoint in endpoints {
            number += 1;
            write!(out, "  {:>3}. {:<7} {}", number, endpoint.method, endpoint.path)?;
            if let Some(summary) = &endpoint.summary {
                write!(out, "  {}", summary)?;
            }
            if endpoint.deprecated {
                write!(out, "  (deprecated)")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_endpoint(out: &mut String, catalog: &EndpointCatalog, endpoint: &Endpoint) -> fmt::Result {
    writeln!(out, "{}  [{}]", endpoint.label(), endpoint.id)?;
    if endpoint.deprecated {
        writeln!(out, "DEPRECATED")?;
    }
    if let Some(summary) = &endpoint.summary {
        writeln!(out, "{}", summary)?;
    }
    if let Some(description) = &endpoint.description {
        writeln!(out)?;
        writeln!(out, "{}", description)?;
    }

    if !endpoint.parameters.is_empty() {
        writeln!(out)?;
        writeln!(out, "Parameters:")?;
        for param in &endpoint.parameters {
            write!(
                out,
                "  {}{} ({}, {})",
                param.name,
                if param.required { "*" } else { "" },
                param.location,
                param.type_name()
            )?;
            if let Some(description) = &param.description {
                write!(out, "  {}", description)?;
            }
            if let Some(example) = param.example() {
                write!(out, "  e.g. {}", example)?;
            }
            writeln!(out)?;
        }
    }

    if let Some(body) = &endpoint.request_body {
        writeln!(out)?;
        writeln!(
            out,
            "Request body ({}{}):",
            body.content_type,
            if body.required { ", required" } else { "" }
        )?;
        if let Some(description) = &body.description {
            writeln!(out, "  {}", description)?;
        }
        if let Some(schema) = &body.schema {
            write_fields(out, &catalog.introspector().fields(schema))?;
        }
        if let Some(example) = catalog.request_example(endpoint) {
            writeln!(out, "Example:")?;
            write_indented(out, &self::example(&example))?;
        }
    }

    if !endpoint.responses.is_empty() {
        writeln!(out)?;
        writeln!(out, "Responses:")?;
        for response in &endpoint.responses {
            writeln!(
                out,
                "  {}  {}",
                response.status_code,
                response.description.as_deref().unwrap_or("")
            )?;
            if let Some(example) = catalog.response_example(response) {
                write_indented(out, &self::example(&example))?;
            }
        }
    }

    Ok(())
}

fn write_fields(out: &mut String, fields: &[FieldDescriptor]) -> fmt::Result {
    if fields.is_empty() {
        return Ok(());
    }

    let width = fields.iter().map(|f| f.name.len() + 1).max().unwrap_or(0);
    for field in fields {
        let name = if field.required {
            format!("{}*", field.name)
        } else {
            field.name.clone()
        };
        let field_type = match &field.format {
            Some(format) => format!("{}({})", field.field_type, format),
            None => field.field_type.clone(),
        };
        write!(out, "  {:<width$}  {:<18}", name, field_type, width = width)?;

        let constraints = constraints(field);
        if !constraints.is_empty() {
            write!(out, "  [{}]", constraints.join(", "))?;
        }
        if let Some(description) = &field.description {
            write!(out, "  {}", description)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn constraints(field: &FieldDescriptor) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(min) = &field.minimum {
        parts.push(format!("min {}", min));
    }
    if let Some(max) = &field.maximum {
        parts.push(format!("max {}", max));
    }
    if let Some(min) = field.min_length {
        parts.push(format!("minLength {}", min));
    }
    if let Some(max) = field.max_length {
        parts.push(format!("maxLength {}", max));
    }
    if let Some(pattern) = &field.pattern {
        parts.push(format!("pattern {}", pattern));
    }
    if !field.enum_values.is_empty() {
        let values: Vec<String> = field.enum_values.iter().map(Value::to_string).collect();
        parts.push(format!("one of {}", values.join("|")));
    }
    parts
}

fn write_response(out: &mut String, url: &str, response: &ExecutedResponse) -> fmt::Result {
    writeln!(out, "{}", url)?;
    writeln!(
        out,
        "{} {}  ({} ms)",
        response.status, response.status_text, response.elapsed_ms
    )?;
    for (name, value) in &response.headers {
        writeln!(out, "{}: {}", name, value)?;
    }
    writeln!(out)?;
    match &response.body {
        ResponseBody::Json(value) => writeln!(out, "{}", example(value)),
        ResponseBody::Text(text) => writeln!(out, "{}", text),
    }
}

fn write_history(out: &mut String, history: &RequestHistory) -> fmt::Result {
    if history.is_empty() {
        return writeln!(out, "No requests yet");
    }

    for entry in history.iter() {
        let status = entry
            .status
            .map_or_else(|| "ERR".to_string(), |s| s.to_string());
        let time = entry
            .response_time_ms
            .map_or_else(|| "-".to_string(), |ms| format!("{} ms", ms));
        writeln!(
            out,
            "{}  {:<7} {:<4} {:>8}  {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.method,
            status,
            time,
            entry.url
        )?;
    }
    Ok(())
}

fn write_indented(out: &mut String, text: &str) -> fmt::Result {
    for line in text.lines() {
        writeln!(out, "    {}", line)?;
    }
    Ok(())
}
