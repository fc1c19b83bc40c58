//! Explorer session: the loaded catalog, the executor and request history,
//! driven by one-line commands

use openapi_parser::HttpMethod;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::catalog::{CatalogSource, EndpointCatalog};
use crate::error::{ExplorerError, Result};
use crate::executor::{RequestExecutor, TestRequest};
use crate::history::{HistoryEntry, RequestHistory};
use crate::render;
use crate::settings::ExplorerSettings;

const HELP: &str = "\
Commands:
  list                               list endpoints by group
  show <endpoint>                    parameters, body fields and responses
  example <endpoint>                 example request body
  fields <endpoint>                  request body fields
  call <endpoint> [name=value ...] [--body JSON]
                                     send a test request
  history                            the last 10 requests
  reload                             load the API document again
  help                               this text
  quit                               leave the shell

<endpoint> is an operation id, `METHOD /path`, or a number from `list`.";

/// One shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Show(String),
    Example(String),
    Fields(String),
    Call {
        endpoint: String,
        params: Vec<(String, String)>,
        body: Option<String>,
    },
    History,
    Reload,
    Help,
    Quit,
}

impl Command {
    /// Parse a command line. `--body` takes the rest of the line verbatim.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "list" | "ls" => Command::List,
            "show" => Command::Show(required_endpoint(name, rest)?),
            "example" => Command::Example(required_endpoint(name, rest)?),
            "fields" => Command::Fields(required_endpoint(name, rest)?),
            "call" => Self::parse_call(rest)?,
            "history" => Command::History,
            "reload" => Command::Reload,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(ExplorerError::InvalidArgument(format!(
                    "unknown command '{}', try `help`",
                    other
                )))
            }
        };
        Ok(command)
    }

    fn parse_call(rest: &str) -> Result<Self> {
        let (args, body) = match split_body_flag(rest) {
            Some((args, body)) => (args, Some(body.trim().to_string())),
            None => (rest, None),
        };

        let mut tokens = args.split_whitespace().peekable();
        let mut endpoint = tokens
            .next()
            .ok_or_else(|| ExplorerError::InvalidArgument("call needs an endpoint".to_string()))?
            .to_string();

        // `METHOD /path` spans two tokens
        if endpoint.parse::<HttpMethod>().is_ok() {
            if let Some(path) = tokens.next_if(|t| t.starts_with('/')) {
                endpoint = format!("{} {}", endpoint, path);
            }
        }

        let params = tokens.map(parse_pair).collect::<Result<Vec<_>>>()?;

        Ok(Command::Call {
            endpoint,
            params,
            body,
        })
    }
}

/// Split at the first `--body` that stands alone as a word, so values such
/// as `obs=a--body` stay intact
fn split_body_flag(rest: &str) -> Option<(&str, &str)> {
    const FLAG: &str = "--body";
    rest.match_indices(FLAG).find_map(|(at, _)| {
        let (args, tail) = (&rest[..at], &rest[at + FLAG.len()..]);
        let starts_word = args.chars().next_back().map_or(true, char::is_whitespace);
        let ends_word = tail.chars().next().map_or(true, char::is_whitespace);
        (starts_word && ends_word).then_some((args, tail))
    })
}

fn required_endpoint(command: &str, rest: &str) -> Result<String> {
    if rest.is_empty() {
        return Err(ExplorerError::InvalidArgument(format!(
            "{} needs an endpoint",
            command
        )));
    }
    Ok(rest.to_string())
}

/// Split `name=value`
pub fn parse_pair(pair: &str) -> Result<(String, String)> {
    pair.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| ExplorerError::InvalidArgument(format!("expected name=value, got '{}'", pair)))
}

/// State for one run of the explorer
pub struct Session {
    settings: ExplorerSettings,
    source: CatalogSource,
    catalog: Option<EndpointCatalog>,
    executor: RequestExecutor,
    history: RequestHistory,
}

impl Session {
    pub fn new(settings: ExplorerSettings) -> Result<Self> {
        let source = CatalogSource::from_location(settings.docs_url.as_deref());
        let executor = RequestExecutor::new(settings.timeout())?
            .with_bearer_token(settings.bearer_token.clone());

        Ok(Self {
            settings,
            source,
            catalog: None,
            executor,
            history: RequestHistory::new(),
        })
    }

    /// Start with an already loaded catalog
    pub fn with_catalog(mut self, catalog: EndpointCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub fn history(&self) -> &RequestHistory {
        &self.history
    }

    /// (Re)load the catalog. On failure the session stays usable but empty.
    pub async fn load(&mut self) -> Result<()> {
        info!("Loading API document from {}", self.source);
        match EndpointCatalog::load(&self.source).await {
            Ok(catalog) => {
                self.catalog = Some(catalog);
                Ok(())
            }
            Err(e) => {
                // A previously loaded catalog stays in use
                error!("Failed to load {}: {}", self.source, e);
                Err(e)
            }
        }
    }

    pub fn catalog(&self) -> Result<&EndpointCatalog> {
        self.catalog.as_ref().ok_or(ExplorerError::NotLoaded)
    }

    /// Configured base URL, else the document's first server
    pub fn base_url(&self) -> Result<String> {
        if let Some(base_url) = &self.settings.base_url {
            return Ok(base_url.clone());
        }
        self.catalog()?
            .base_url()
            .map(str::to_string)
            .ok_or(ExplorerError::MissingBaseUrl)
    }

    /// Run one command and return its rendered output
    pub async fn execute(&mut self, command: Command) -> Result<String> {
        debug!("Executing command: {:?}", command);

        match command {
            Command::List => Ok(render::catalog(self.catalog()?)),
            Command::Show(key) => {
                let catalog = self.catalog()?;
                Ok(render::endpoint(catalog, catalog.find(&key)?))
            }
            Command::Example(key) => {
                let catalog = self.catalog()?;
                let endpoint = catalog.find(&key)?;
                match catalog.request_example(endpoint) {
                    Some(example) => Ok(render::example(&example)),
                    None => Ok(format!("{} takes no request body", endpoint.label())),
                }
            }
            Command::Fields(key) => {
                let catalog = self.catalog()?;
                let endpoint = catalog.find(&key)?;
                let schema = endpoint.request_body.as_ref().and_then(|b| b.schema.as_ref());
                match schema {
                    Some(schema) => Ok(render::fields(&catalog.introspector().fields(schema))),
                    None => Ok(format!("{} takes no request body", endpoint.label())),
                }
            }
            Command::Call {
                endpoint,
                params,
                body,
            } => self.call(&endpoint, params, body).await,
            Command::History => Ok(render::history(&self.history)),
            Command::Reload => {
                self.load().await?;
                let count = self.catalog()?.document().endpoints.len();
                Ok(format!("Loaded {} endpoints from {}", count, self.source))
            }
            Command::Help => Ok(HELP.to_string()),
            // The shell stops before executing `quit`; elsewhere it is a no-op
            Command::Quit => Ok(String::new()),
        }
    }

    async fn call(
        &mut self,
        key: &str,
        params: Vec<(String, String)>,
        body: Option<String>,
    ) -> Result<String> {
        let base_url = self.base_url()?;
        let catalog = self.catalog()?;
        let endpoint = catalog.find(key)?.clone();

        let mut request = TestRequest::from_pairs(&endpoint, params)?;
        // An omitted body falls back to the example, as a pre-filled editor would
        request.body = match body {
            Some(body) => Some(body),
            None if endpoint.method.has_body() => catalog
                .request_example(&endpoint)
                .map(|example| example.to_string()),
            None => None,
        };

        let prepared = self.executor.prepare(&base_url, &endpoint, &request)?;
        let entry = HistoryEntry::new(prepared.method, prepared.url.clone());

        match self.executor.send(&prepared).await {
            Ok(response) => {
                self.history
                    .record(entry.with_response(response.status, response.elapsed_ms));
                Ok(render::response(&prepared.url, &response))
            }
            Err(e) => {
                self.history.record(entry);
                Err(e)
            }
        }
    }

    /// Interactive loop over stdin until `quit` or EOF
    pub async fn run_shell(&mut self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        if self.catalog.is_none() {
            if let Err(e) = self.load().await {
                let message = format!("error: {}\nType `reload` to retry.\n", e);
                stdout.write_all(message.as_bytes()).await?;
            }
        }
        if let Ok(catalog) = self.catalog() {
            let banner = format!(
                "{} {} - {} endpoints. Type `help` for commands.\n",
                catalog.document().title,
                catalog.document().version,
                catalog.document().endpoints.len()
            );
            stdout.write_all(banner.as_bytes()).await?;
        }

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                info!("EOF received, leaving shell");
                break;
            }

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            let output = match Command::parse(input) {
                Ok(Command::Quit) => break,
                Ok(command) => self.execute(command).await,
                Err(e) => Err(e),
            };

            let text = match output {
                Ok(text) => text,
                Err(e @ ExplorerError::Document(_)) => {
                    format!("error: {}\nType `reload` to retry.", e)
                }
                Err(e) => format!("error: {}", e),
            };
            stdout.write_all(text.trim_end().as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        Ok(())
    }
}
