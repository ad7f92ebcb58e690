// src/plot/save.rs

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use log::info;

use super::Chart;
use crate::error::{Result, SpectraError};

/// Saves `chart` to `path`, asking on stdin before creating a missing directory.
///
/// See [`save_plot_with`].
pub fn save_plot<P: AsRef<Path>>(chart: &Chart, path: P) -> Result<Option<PathBuf>> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    save_plot_with(chart, path, stdin.lock(), stdout.lock())
}

/// Saves `chart` to `path`, prompting through `input`/`output` when the target
/// directory does not exist.
///
/// The prompt `[y]es/[n]o: ` repeats until a line reading `y` or `n` arrives.
/// On `y` the directory tree is created; on `n` nothing is written and
/// `Ok(None)` is returned. The file format follows the extension: `.svg`
/// renders the chart, `.json` stores the chart model.
///
/// # Errors
/// `InvalidInput` for any other extension, `Io` with kind `UnexpectedEof` if
/// `input` ends before an answer, and any I/O or rendering failure.
pub fn save_plot_with<P, R, W>(chart: &Chart, path: P, mut input: R, mut output: W) -> Result<Option<PathBuf>>
where
    P: AsRef<Path>,
    R: BufRead,
    W: Write,
{
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .ok_or_else(|| SpectraError::invalid(format!("'{}' does not name a file", path.display())))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let format = OutputFormat::from_path(path)?;

    if !directory.exists() {
        writeln!(
            output,
            "{} does not exist. Do you want to create it?",
            directory.display()
        )?;
        loop {
            write!(output, "[y]es/[n]o: ")?;
            output.flush()?;
            let mut answer = String::new();
            if input.read_line(&mut answer)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input ended before answering the directory prompt",
                )
                .into());
            }
            match answer.trim_end_matches(['\r', '\n']) {
                "y" => {
                    fs::create_dir_all(directory)?;
                    break;
                }
                "n" => {
                    writeln!(output, "Plot not saved.")?;
                    return Ok(None);
                }
                _ => continue,
            }
        }
    }

    let target = directory.join(file_name);
    match format {
        OutputFormat::Svg => fs::write(&target, chart.to_svg()?)?,
        OutputFormat::Json => fs::write(&target, chart.to_json()?)?,
    }

    writeln!(output, "Plot saved as: {}", target.display())?;
    info!("Saved chart '{}' to {}", chart.title, target.display());
    Ok(Some(target))
}

enum OutputFormat {
    Svg,
    Json,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("svg") => Ok(OutputFormat::Svg),
            Some("json") => Ok(OutputFormat::Json),
            other => Err(SpectraError::invalid(format!(
                "unsupported figure format {:?}; use a '.svg' or '.json' file name",
                other.unwrap_or("")
            ))),
        }
    }
}
