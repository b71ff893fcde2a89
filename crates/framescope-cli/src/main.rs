use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use framescope_core::{BatchTable, FrameConfig, FrameDecoder, FrameReport, FrameSpec, RawInput};
use glob::glob;

#[derive(Parser, Debug)]
#[command(name = "framescope")]
#[command(version)]
#[command(
    about = "Decode fixed-layout binary frames into per-field reports.",
    long_about = None,
    after_help = "Examples:\n  framescope decode -l frame.json 5A0064FF\n  framescope decode -l frame.json -i 'dumps/*.hex' --batch\n  framescope layout -l frame.json"
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode frames given as hex arguments or read from files.
    Decode {
        /// Frame layout (JSON)
        #[arg(short, long)]
        layout: PathBuf,

        /// Hex-encoded frames (whitespace between bytes allowed when quoted)
        frames: Vec<String>,

        /// Input file or glob pattern; one hex frame per line
        #[arg(short, long)]
        input: Option<String>,

        /// Treat each input file as one raw binary frame
        #[arg(long, requires = "input")]
        binary: bool,

        /// One row per frame, one column per field
        #[arg(long)]
        batch: bool,

        /// Drop a field from batch output (repeatable)
        #[arg(long, requires = "batch")]
        exclude: Vec<String>,

        /// Emit JSON instead of text tables
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(long, requires = "json")]
        pretty: bool,

        /// Exit with a non-zero code if any field or bit fails validation
        #[arg(long)]
        strict: bool,
    },
    /// Print the field layout (label, size, offset).
    Layout {
        /// Frame layout (JSON)
        #[arg(short, long)]
        layout: PathBuf,

        /// Emit JSON instead of a text table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Decode {
            layout,
            frames,
            input,
            binary,
            batch,
            exclude,
            json,
            pretty,
            strict,
        } => cmd_decode(DecodeArgs {
            layout,
            frames,
            input,
            binary,
            batch,
            exclude,
            json,
            pretty,
            strict,
        }),
        Commands::Layout { layout, json } => cmd_layout(&layout, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

#[derive(Debug)]
struct DecodeArgs {
    layout: PathBuf,
    frames: Vec<String>,
    input: Option<String>,
    binary: bool,
    batch: bool,
    exclude: Vec<String>,
    json: bool,
    pretty: bool,
    strict: bool,
}

/// One frame to decode and where it came from.
#[derive(Debug)]
struct FrameInput {
    source: String,
    data: FrameData,
}

#[derive(Debug)]
enum FrameData {
    Hex(String),
    Bytes(Vec<u8>),
}

impl FrameInput {
    fn raw(&self) -> RawInput<'_> {
        match &self.data {
            FrameData::Hex(text) => RawInput::from(text),
            FrameData::Bytes(bytes) => RawInput::from(bytes),
        }
    }
}

fn cmd_decode(args: DecodeArgs) -> Result<(), CliError> {
    let frame = load_layout(&args.layout)?;
    let inputs = collect_inputs(&args)?;
    if inputs.is_empty() {
        return Err(CliError::new(
            "no frames to decode",
            Some("pass hex frames as arguments or use -i/--input".to_string()),
        ));
    }

    let all_valid = if args.batch {
        decode_batch(&frame, &inputs, &args)?
    } else {
        decode_each(&frame, &inputs, &args)?
    };

    if args.strict && !all_valid {
        return Err(CliError::new(
            "validation failures detected",
            Some("inspect the IsOK/ErrCnt columns".to_string()),
        ));
    }
    Ok(())
}

fn decode_each(frame: &FrameSpec, inputs: &[FrameInput], args: &DecodeArgs) -> Result<bool, CliError> {
    let mut decoder = FrameDecoder::new(frame);
    let mut reports = Vec::with_capacity(inputs.len());
    let mut all_valid = true;

    for input in inputs {
        let decoded = decoder
            .decode_frame(input.raw())
            .with_context(|| format!("failed to decode {}", input.source))?;
        for diagnostic in &decoded.diagnostics {
            tracing::warn!(input = %input.source, "{diagnostic}");
        }
        all_valid &= decoded.is_valid();
        let report = decoder.report(&decoded);
        if args.json {
            reports.push(report);
        } else {
            println!("{}", render_report(&input.source, &report));
        }
    }

    if args.json {
        println!("{}", to_json(&reports, args.pretty)?);
    }
    Ok(all_valid)
}

fn decode_batch(frame: &FrameSpec, inputs: &[FrameInput], args: &DecodeArgs) -> Result<bool, CliError> {
    let unknown: Vec<&str> = args
        .exclude
        .iter()
        .map(String::as_str)
        .filter(|label| frame.index_of(label).is_none())
        .collect();
    if !unknown.is_empty() {
        return Err(CliError::new(
            format!("unknown field label(s): {}", unknown.join(", ")),
            Some("run `framescope layout` to list labels".to_string()),
        ));
    }

    let table = frame
        .decode_many(inputs.iter().map(FrameInput::raw), &args.exclude)
        .context("batch decode failed")?;
    for entry in &table.diagnostics {
        tracing::warn!(input = %inputs[entry.row].source, "{}", entry.diagnostic);
    }

    if args.json {
        println!("{}", to_json(&table, args.pretty)?);
    } else {
        println!("{}", render_batch(inputs, &table));
    }
    Ok(table.validity.iter().flatten().all(|ok| *ok))
}

fn cmd_layout(layout: &Path, json: bool) -> Result<(), CliError> {
    let frame = load_layout(layout)?;
    if json {
        println!("{}", to_json(&frame.layout(), true)?);
    } else {
        println!("{frame}");
    }
    Ok(())
}

fn load_layout(path: &Path) -> Result<FrameSpec, CliError> {
    if !path.is_file() {
        return Err(CliError::new(
            format!("layout file not found: {}", path.display()),
            Some("expected a JSON frame layout".to_string()),
        ));
    }
    let config = FrameConfig::from_path(path)
        .with_context(|| format!("failed to read layout {}", path.display()))?;
    let frame = config
        .build()
        .with_context(|| format!("invalid layout {}", path.display()))?;
    tracing::debug!(frame = frame.type_name(), size = frame.full_size(), "layout loaded");
    Ok(frame)
}

fn collect_inputs(args: &DecodeArgs) -> Result<Vec<FrameInput>, CliError> {
    let mut inputs: Vec<FrameInput> = args
        .frames
        .iter()
        .enumerate()
        .map(|(i, hex)| FrameInput {
            source: format!("arg[{i}]"),
            data: FrameData::Hex(hex.clone()),
        })
        .collect();

    let Some(pattern) = args.input.as_deref() else {
        return Ok(inputs);
    };
    for path in resolve_input_paths(pattern)? {
        if args.binary {
            let bytes = fs::read(&path)
                .with_context(|| format!("failed to read input file: {}", path.display()))?;
            inputs.push(FrameInput {
                source: path.display().to_string(),
                data: FrameData::Bytes(bytes),
            });
            continue;
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read input file: {}", path.display()))?;
        inputs.extend(hex_lines(&path, &text));
    }
    Ok(inputs)
}

/// Non-empty lines not starting with `#`, labeled `path:line`.
fn hex_lines(path: &Path, text: &str) -> Vec<FrameInput> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| FrameInput {
            source: format!("{}:{}", path.display(), number),
            data: FrameData::Hex(line.to_string()),
        })
        .collect()
}

fn resolve_input_paths(pattern: &str) -> Result<Vec<PathBuf>, CliError> {
    if !is_glob_pattern(pattern) {
        let path = PathBuf::from(pattern);
        if !path.is_file() {
            return Err(CliError::new(
                format!("input file not found: {}", path.display()),
                Some("check the path or quote the pattern".to_string()),
            ));
        }
        return Ok(vec![path]);
    }

    let paths = glob(pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    matches.sort();
    Ok(matches)
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn render_report(source: &str, report: &FrameReport) -> String {
    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| {
            vec![
                row.label.clone(),
                row.value.clone(),
                row.is_ok.to_string(),
                row.err_cnt.to_string(),
            ]
        })
        .collect();
    format!("# {source}\n{}", render_table(&report.header, &rows))
}

fn render_batch(inputs: &[FrameInput], table: &BatchTable) -> String {
    let mut header = vec!["Input".to_string()];
    header.extend(table.columns.iter().cloned());
    let rows: Vec<Vec<String>> = table
        .values
        .iter()
        .zip(&table.validity)
        .zip(inputs)
        .map(|((values, validity), input)| {
            let mut row = vec![input.source.clone()];
            row.extend(
                values
                    .iter()
                    .zip(validity)
                    .map(|(value, ok)| if *ok { value.clone() } else { format!("{value}!") }),
            );
            row
        })
        .collect();
    render_table(&header, &rows)
}

fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }
    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    let mut out = vec![line(header)];
    out.extend(rows.iter().map(|row| line(row.as_slice())));
    out.join("\n")
}
