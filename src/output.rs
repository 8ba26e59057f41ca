//! Output writing and the external rasterizer boundary.
//!
//! Mermaid and markdown outputs are written directly; PNG and SVG go
//! through the `mmdc` binary (mermaid-cli). The rasterizer works from a
//! temporary directory that is removed on every path, success or failure.

use crate::error::OutputError;
use std::path::Path;
use tokio::process::Command;

/// Supported output surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
  /// Plain Mermaid text.
  #[default]
  Mermaid,
  /// Mermaid inside a fenced markdown block.
  Markdown,
  /// Rasterized PNG via `mmdc`.
  Png,
  /// Rasterized SVG via `mmdc`.
  Svg,
}

impl OutputFormat {
  /// File extension for this format, dot included.
  pub fn extension(self) -> &'static str {
    match self {
      OutputFormat::Mermaid => ".mmd",
      OutputFormat::Markdown => ".md",
      OutputFormat::Png => ".png",
      OutputFormat::Svg => ".svg",
    }
  }
}

/// Makes a display name safe as a filename: strip everything but word
/// characters, whitespace, and hyphens, turn whitespace runs into hyphens,
/// and lowercase. Falls back to `output` when nothing survives.
pub fn sanitize_filename(name: &str) -> String {
  let kept: String = name
    .chars()
    .filter(|character| {
      character.is_alphanumeric() || *character == '_' || *character == '-'
        || character.is_whitespace()
    })
    .collect();
  let joined = kept.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase();
  if joined.is_empty() {
    "output".to_string()
  } else {
    joined
  }
}

/// Wraps Mermaid text in a fenced markdown block.
pub fn fenced_markdown(mermaid: &str) -> String {
  format!("```mermaid\n{mermaid}\n```\n")
}

/// Writes one rendered page to `out_path` in the requested format.
pub async fn write_diagram_output(
  mermaid: &str,
  out_path: &Path,
  format: OutputFormat,
  mermaid_config: Option<&serde_json::Value>,
) -> Result<(), OutputError> {
  match format {
    OutputFormat::Png => rasterize(mermaid, out_path, "png", "PNG", mermaid_config).await,
    OutputFormat::Svg => rasterize(mermaid, out_path, "svg", "SVG", mermaid_config).await,
    OutputFormat::Markdown => {
      tokio::fs::write(out_path, fenced_markdown(mermaid)).await?;
      Ok(())
    }
    OutputFormat::Mermaid => {
      tokio::fs::write(out_path, format!("{mermaid}\n")).await?;
      Ok(())
    }
  }
}

/// Invokes `mmdc` on a temp `.mmd` file (plus an optional layout config).
async fn rasterize(
  mermaid: &str,
  out_path: &Path,
  engine_format: &str,
  format_name: &'static str,
  mermaid_config: Option<&serde_json::Value>,
) -> Result<(), OutputError> {
  let workdir = tempfile::tempdir()?;
  let input_path = workdir.path().join("diagram.mmd");
  tokio::fs::write(&input_path, format!("{mermaid}\n")).await?;

  let mut command = Command::new("mmdc");
  command
    .arg("-i")
    .arg(&input_path)
    .arg("-o")
    .arg(out_path)
    .arg("-e")
    .arg(engine_format)
    .arg("-b")
    .arg("transparent");

  if let Some(config) = mermaid_config {
    let config_path = workdir.path().join("mermaid.config.json");
    tokio::fs::write(&config_path, format!("{config}\n")).await?;
    command.arg("-c").arg(&config_path);
  }

  let output = command.output().await.map_err(|error| {
    if error.kind() == std::io::ErrorKind::NotFound {
      OutputError::RasterizerMissing
    } else {
      OutputError::RasterizerFailed {
        format: format_name,
        detail: error.to_string(),
      }
    }
  })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    return Err(OutputError::RasterizerFailed {
      format: format_name,
      detail: if stderr.is_empty() {
        format!("mmdc exited with {}", output.status)
      } else {
        stderr
      },
    });
  }

  Ok(())
}
