//! Command-line interface: argument parsing, env resolution, output fan-out.
//!
//! This is the only layer that reads the process environment. Flags win
//! over env vars; everything is resolved here into plain values before the
//! library is called.

use crate::config::{
  MCP_AUTH_TOKEN_ENV, MCP_ENDPOINT_URL_ENV, MCP_TIMEOUT_MS_ENV, McpEndpointConfig,
};
use crate::error::{OutputError, SourceError};
use crate::layout::{LayoutPreset, layout_config};
use crate::output::{OutputFormat, sanitize_filename, write_diagram_output};
use crate::payload::FormatHint;
use crate::pipeline::{RenderedPage, RunOptions, run_pipeline};
use crate::render::Direction;
use crate::sources::SourceMode;
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Env var holding the Figma API token.
pub const FIGMA_TOKEN_ENV: &str = "FIGMA_API_TOKEN";

/// A failure surfaced to the user as a one-line message.
#[derive(Debug, Error)]
pub enum CliError {
  /// Ingestion or configuration failure.
  #[error("{0}")]
  Source(#[from] SourceError),
  /// Output or rasterizer failure.
  #[error("{0}")]
  Output(#[from] OutputError),
  /// Bad flag combination or selection.
  #[error("{0}")]
  Usage(String),
}

fn parse_source_mode(value: &str) -> Result<SourceMode, String> {
  value.parse()
}

fn parse_format_hint(value: &str) -> Result<FormatHint, String> {
  value.parse()
}

fn parse_direction(value: &str) -> Result<Direction, String> {
  value.parse()
}

fn parse_layout(value: &str) -> Result<LayoutPreset, String> {
  value.parse()
}

/// Convert FigJam flow diagrams into Mermaid flowcharts.
#[derive(Debug, Parser)]
#[command(name = "jamflow", version, about)]
pub struct Cli {
  /// FigJam URL/file key, Mermaid file (.mmd/.mermaid), or payload file
  /// path (depends on --source).
  pub input: Option<String>,

  /// Write output to this path (single page only).
  #[arg(short, long)]
  pub output: Option<PathBuf>,

  /// Figma API token (overrides FIGMA_API_TOKEN).
  #[arg(long)]
  pub token: Option<String>,

  /// Source mode: tree, structured, file, stdin, auto.
  #[arg(long, value_parser = parse_source_mode)]
  pub source: Option<SourceMode>,

  /// Payload shape for --source file|stdin: auto, tree, pages.
  #[arg(long, default_value = "auto", value_parser = parse_format_hint)]
  pub format: FormatHint,

  /// Export only one page, by 1-based index or name.
  #[arg(long)]
  pub page: Option<String>,

  /// Flow direction override: TD, LR, TB, BT, RL.
  #[arg(short = 'd', long, value_parser = parse_direction)]
  pub direction: Option<Direction>,

  /// Layout preset: auto, default, compact, elk, organic, tree.
  #[arg(long, default_value = "auto", value_parser = parse_layout)]
  pub layout: LayoutPreset,

  /// Output as Markdown with a fenced mermaid block.
  #[arg(long, conflicts_with_all = ["png", "svg"])]
  pub markdown: bool,

  /// Output as PNG (requires mmdc/mermaid-cli).
  #[arg(long, conflicts_with = "svg")]
  pub png: bool,

  /// Output as SVG (requires mmdc/mermaid-cli).
  #[arg(long)]
  pub svg: bool,

  /// Structured endpoint URL (overrides JAMFLOW_MCP_ENDPOINT_URL).
  #[arg(long)]
  pub mcp_endpoint: Option<String>,

  /// Structured endpoint timeout in milliseconds (overrides
  /// JAMFLOW_MCP_TIMEOUT_MS).
  #[arg(long)]
  pub mcp_timeout_ms: Option<u64>,
}

impl Cli {
  fn output_format(&self) -> OutputFormat {
    if self.markdown {
      OutputFormat::Markdown
    } else if self.png {
      OutputFormat::Png
    } else if self.svg {
      OutputFormat::Svg
    } else {
      OutputFormat::Mermaid
    }
  }

  /// True when no output destination or format flag was given, so a single
  /// page goes straight to stdout.
  fn prints_to_stdout(&self) -> bool {
    self.output.is_none() && !self.markdown && !self.png && !self.svg
  }
}

/// Resolves the Figma API token: flag first, then the environment.
pub fn resolve_token(flag: Option<&str>) -> Result<String, SourceError> {
  if let Some(token) = flag.map(str::trim).filter(|token| !token.is_empty()) {
    return Ok(token.to_string());
  }
  std::env::var(FIGMA_TOKEN_ENV)
    .ok()
    .map(|token| token.trim().to_string())
    .filter(|token| !token.is_empty())
    .ok_or_else(|| {
      SourceError::Config(
        "Figma API token not found. Pass --token or set FIGMA_API_TOKEN.".to_string(),
      )
    })
}

/// Resolves structured-endpoint settings from flags and env vars.
pub fn resolve_mcp_config(
  endpoint_flag: Option<&str>,
  timeout_flag_ms: Option<u64>,
) -> Result<McpEndpointConfig, SourceError> {
  let mut config = McpEndpointConfig::default();

  let endpoint = endpoint_flag
    .map(str::to_string)
    .or_else(|| std::env::var(MCP_ENDPOINT_URL_ENV).ok())
    .map(|url| url.trim().to_string())
    .filter(|url| !url.is_empty());
  if let Some(url) = endpoint {
    config = config.with_endpoint_url(url);
  }

  if let Some(token) = std::env::var(MCP_AUTH_TOKEN_ENV)
    .ok()
    .map(|token| token.trim().to_string())
    .filter(|token| !token.is_empty())
  {
    config = config.with_auth_token(token);
  }

  match timeout_flag_ms {
    Some(0) => {
      return Err(SourceError::Config(
        "invalid timeout \"0\". Expected a positive integer of milliseconds.".to_string(),
      ));
    }
    Some(millis) => config = config.with_timeout(Duration::from_millis(millis)),
    None => {
      if let Ok(raw) = std::env::var(MCP_TIMEOUT_MS_ENV) {
        config = config.with_timeout(McpEndpointConfig::parse_timeout_ms(&raw)?);
      }
    }
  }

  Ok(config)
}

/// Input that is already Mermaid text and skips ingestion entirely.
#[derive(Debug, PartialEq)]
enum DirectInput {
  File(PathBuf),
  Stdin,
}

fn has_mermaid_extension(input: &str) -> bool {
  let normalized = input.trim().to_lowercase();
  normalized.ends_with(".mmd") || normalized.ends_with(".mermaid")
}

/// Detects Mermaid passthrough input. An explicit `--source file|stdin`
/// claims the input for payload ingestion and disables passthrough.
fn detect_direct_input(
  input: Option<&str>,
  explicit_source: Option<SourceMode>,
  stdin_is_tty: bool,
) -> Option<DirectInput> {
  if matches!(explicit_source, Some(SourceMode::File) | Some(SourceMode::Stdin)) {
    return None;
  }

  let input = input.map(str::trim).unwrap_or_default();
  if !input.is_empty() {
    if has_mermaid_extension(input) || Path::new(input).is_file() {
      return Some(DirectInput::File(PathBuf::from(input)));
    }
    return None;
  }

  if !stdin_is_tty {
    return Some(DirectInput::Stdin);
  }
  None
}

/// Narrows the rendered pages to the `--page` selection.
fn select_pages(
  pages: Vec<RenderedPage>,
  requested: Option<&str>,
) -> Result<Vec<RenderedPage>, CliError> {
  let Some(selector) = requested.map(str::trim).filter(|selector| !selector.is_empty()) else {
    return Ok(pages);
  };

  if selector.chars().all(|character| character.is_ascii_digit()) {
    let index: usize = selector
      .parse()
      .map_err(|_| CliError::Usage(format!("Page index {selector} is out of range.")))?;
    let total = pages.len();
    return pages
      .into_iter()
      .nth(index.wrapping_sub(1))
      .map(|page| vec![page])
      .ok_or_else(|| {
        CliError::Usage(format!(
          "Page index {index} is out of range. Found {total} page(s)."
        ))
      });
  }

  let lowered = selector.to_lowercase();
  let available: Vec<String> = pages
    .iter()
    .enumerate()
    .map(|(index, page)| format!("{}:{}", index + 1, page.page_name))
    .collect();
  pages
    .into_iter()
    .find(|page| page.page_name.to_lowercase() == lowered)
    .map(|page| vec![page])
    .ok_or_else(|| {
      CliError::Usage(format!(
        "Page \"{selector}\" not found. Available pages: {}",
        available.join(", ")
      ))
    })
}

async fn read_direct_input(input: &DirectInput) -> Result<String, CliError> {
  match input {
    DirectInput::File(path) => {
      tokio::fs::read_to_string(path)
        .await
        .map_err(|error| SourceError::Read {
          origin: format!("file \"{}\"", path.display()),
          detail: error.to_string(),
        })
        .map_err(CliError::from)
    }
    DirectInput::Stdin => {
      use tokio::io::AsyncReadExt;
      let mut raw = String::new();
      tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .map_err(|error| SourceError::Read {
          origin: "stdin".to_string(),
          detail: error.to_string(),
        })?;
      Ok(raw)
    }
  }
}

/// Emits already-rendered Mermaid text: stdout when no destination was
/// asked for, otherwise through the output collaborator.
async fn run_passthrough(cli: &Cli, direct: DirectInput) -> Result<(), CliError> {
  let mermaid = read_direct_input(&direct).await?;
  if mermaid.trim().is_empty() {
    return Err(CliError::Usage("Mermaid input is empty.".to_string()));
  }

  if cli.prints_to_stdout() {
    if mermaid.ends_with('\n') {
      print!("{mermaid}");
    } else {
      println!("{mermaid}");
    }
    return Ok(());
  }

  let base_name = match &direct {
    DirectInput::File(path) => sanitize_filename(
      path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
        .as_str(),
    ),
    DirectInput::Stdin => "stdin".to_string(),
  };
  let format = cli.output_format();
  let out_path = cli
    .output
    .clone()
    .unwrap_or_else(|| PathBuf::from(format!("{base_name}{}", format.extension())));

  let config = layout_config(cli.layout);
  write_diagram_output(mermaid.trim_end(), &out_path, format, config.as_ref()).await?;
  eprintln!("Written to {}", out_path.display());
  Ok(())
}

/// Runs the tool end to end for parsed arguments.
pub async fn run(cli: Cli) -> Result<(), CliError> {
  let stdin_is_tty = std::io::stdin().is_terminal();
  if let Some(direct) = detect_direct_input(cli.input.as_deref(), cli.source, stdin_is_tty) {
    return run_passthrough(&cli, direct).await;
  }

  let mode = cli.source.unwrap_or_default();
  let token = match mode {
    SourceMode::Tree | SourceMode::Structured | SourceMode::Auto => {
      Some(resolve_token(cli.token.as_deref())?)
    }
    SourceMode::File | SourceMode::Stdin => None,
  };
  let mcp = resolve_mcp_config(cli.mcp_endpoint.as_deref(), cli.mcp_timeout_ms)?;

  let outcome = run_pipeline(RunOptions {
    input: cli.input.clone().unwrap_or_default(),
    token,
    mode,
    format: cli.format,
    mcp,
    direction: cli.direction,
    layout: cli.layout,
  })
  .await?;

  if outcome.fallback_used {
    tracing::warn!(selected = %outcome.selected_source,
      "auto mode fell back: structured endpoint failed, using the file tree");
  }

  let file_base = sanitize_filename(
    outcome
      .file_name
      .as_deref()
      .unwrap_or(outcome.file_key.as_str()),
  );
  let pages = select_pages(outcome.pages, cli.page.as_deref())?;
  if pages.is_empty() {
    return Err(CliError::Usage("No pages found to export.".to_string()));
  }

  let format = cli.output_format();
  if pages.len() == 1 {
    let page = &pages[0];
    if cli.prints_to_stdout() {
      println!("{}", page.mermaid);
      return Ok(());
    }
    let out_path = cli.output.clone().unwrap_or_else(|| {
      PathBuf::from(format!(
        "{file_base}-{}{}",
        sanitize_filename(&page.page_name),
        format.extension()
      ))
    });
    write_diagram_output(&page.mermaid, &out_path, format, page.mermaid_config.as_ref()).await?;
    eprintln!("Written to {}", out_path.display());
    return Ok(());
  }

  if cli.output.is_some() {
    return Err(CliError::Usage(
      "--output can only be used with a single page. Use --page to select one page, or omit \
       --output to export all pages automatically."
        .to_string(),
    ));
  }

  for page in &pages {
    let out_path = PathBuf::from(format!(
      "{file_base}-{}{}",
      sanitize_filename(&page.page_name),
      format.extension()
    ));
    write_diagram_output(&page.mermaid, &out_path, format, page.mermaid_config.as_ref()).await?;
    eprintln!("Written to {}", out_path.display());
  }
  Ok(())
}
