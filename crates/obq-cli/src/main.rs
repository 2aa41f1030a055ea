// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use obq_cli::{Method, run_quantizer};
use obq_core::{BucketPartition, ObqError, ScoreSeries};
use serde::Serialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;

#[derive(Debug)]
struct Cli {
    command: Command,
}

#[derive(Debug)]
enum Command {
    Quantize(QuantizeArgs),
    Compare(CompareArgs),
}

#[derive(Debug)]
struct QuantizeArgs {
    method: Method,
    buckets: usize,
    column: Option<usize>,
    strict: bool,
    input: PathBuf,
    output: Option<PathBuf>,
}

#[derive(Debug)]
struct CompareArgs {
    buckets: usize,
    column: Option<usize>,
    input: PathBuf,
    output: Option<PathBuf>,
}

#[derive(Debug)]
enum CliError {
    Obq(ObqError),
    Io {
        context: String,
        source: std::io::Error,
    },
    Json {
        context: String,
        source: serde_json::Error,
    },
    InvalidInput(String),
}

impl CliError {
    fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Obq(ObqError::InvalidArgument(_)) | Self::InvalidInput(_) => "invalid_argument",
            Self::Obq(ObqError::ResourceLimit(_)) => "resource_limit",
            Self::Obq(ObqError::NumericalIssue(_)) => "numerical_issue",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Obq(err) => write!(f, "{err}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Json { context, source } => write!(f, "{context}: {source}"),
            Self::InvalidInput(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Obq(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<ObqError> for CliError {
    fn from(value: ObqError) -> Self {
        Self::Obq(value)
    }
}

#[derive(Serialize)]
struct QuantizeOutput {
    command: &'static str,
    method: &'static str,
    input: String,
    n: usize,
    requested_buckets: usize,
    effective_buckets: usize,
    objective: Option<f64>,
    runtime_ms: Option<u64>,
    boundaries: Vec<f64>,
    labels: Vec<usize>,
    buckets: Vec<BucketSummaryOutput>,
    notes: Vec<String>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct BucketSummaryOutput {
    index: usize,
    count: usize,
    min: Option<f64>,
    max: Option<f64>,
    mean: Option<f64>,
    sse: f64,
}

#[derive(Serialize)]
struct CompareOutput {
    command: &'static str,
    input: String,
    n: usize,
    requested_buckets: usize,
    methods: Vec<MethodReportOutput>,
}

#[derive(Serialize)]
struct MethodReportOutput {
    method: &'static str,
    effective_buckets: usize,
    total_sse: Option<f64>,
    boundaries: Vec<f64>,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        emit_structured_error(&err);
        process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), CliError> {
    let Some(cli) = parse_cli_from_env()? else {
        return Ok(());
    };

    match cli.command {
        Command::Quantize(args) => handle_quantize(args),
        Command::Compare(args) => handle_compare(args),
    }
}

fn parse_cli_from_env() -> Result<Option<Cli>, CliError> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    parse_cli(&args)
}

fn parse_cli(args: &[String]) -> Result<Option<Cli>, CliError> {
    if args.is_empty() {
        print_root_help();
        return Ok(None);
    }

    if matches!(args[0].as_str(), "-h" | "--help") {
        print_root_help();
        return Ok(None);
    }
    if matches!(args[0].as_str(), "-V" | "--version") {
        print_version();
        return Ok(None);
    }

    let command_name = args[0].as_str();
    let rest = &args[1..];

    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print_command_help(command_name)?;
        return Ok(None);
    }
    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        print_version();
        return Ok(None);
    }

    let command = match command_name {
        "quantize" => Command::Quantize(parse_quantize_args(rest)?),
        "compare" => Command::Compare(parse_compare_args(rest)?),
        _ => {
            return Err(CliError::invalid_input(format!(
                "unknown command '{command_name}'; expected one of: quantize, compare"
            )));
        }
    };

    Ok(Some(Cli { command }))
}

fn flag_value<'a>(tokens: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, CliError> {
    let value_idx = *idx + 1;
    let value = tokens
        .get(value_idx)
        .ok_or_else(|| CliError::invalid_input(format!("{flag} expects a value")))?;
    *idx += 2;
    Ok(value.as_str())
}

fn parse_usize_flag(raw: &str, flag: &str) -> Result<usize, CliError> {
    raw.parse::<usize>().map_err(|_| {
        CliError::invalid_input(format!("{flag} expects a non-negative integer, got '{raw}'"))
    })
}

fn parse_method(raw: &str) -> Result<Method, CliError> {
    match raw {
        "mse" => Ok(Method::Mse),
        "width" => Ok(Method::EqualWidth),
        "freq" => Ok(Method::EqualFrequency),
        _ => Err(CliError::invalid_input(format!(
            "unknown method '{raw}'; expected one of: mse, width, freq"
        ))),
    }
}

fn parse_quantize_args(tokens: &[String]) -> Result<QuantizeArgs, CliError> {
    let mut method = Method::Mse;
    let mut buckets = None;
    let mut column = None;
    let mut strict = false;
    let mut input = None;
    let mut output = None;

    let mut idx = 0;
    while idx < tokens.len() {
        let token = tokens[idx].as_str();
        match token {
            "--method" => method = parse_method(flag_value(tokens, &mut idx, "--method")?)?,
            "--buckets" => {
                buckets = Some(parse_usize_flag(
                    flag_value(tokens, &mut idx, "--buckets")?,
                    "--buckets",
                )?);
            }
            "--column" => {
                column = Some(parse_usize_flag(
                    flag_value(tokens, &mut idx, "--column")?,
                    "--column",
                )?);
            }
            "--strict" => {
                strict = true;
                idx += 1;
            }
            "--input" => {
                input = Some(PathBuf::from(flag_value(tokens, &mut idx, "--input")?));
            }
            "--output" => {
                output = Some(PathBuf::from(flag_value(tokens, &mut idx, "--output")?));
            }
            _ => {
                return Err(CliError::invalid_input(format!(
                    "unknown flag '{token}' for 'quantize'"
                )));
            }
        }
    }

    Ok(QuantizeArgs {
        method,
        buckets: buckets
            .ok_or_else(|| CliError::invalid_input("--buckets is required for 'quantize'"))?,
        column,
        strict,
        input: input
            .ok_or_else(|| CliError::invalid_input("--input is required for 'quantize'"))?,
        output,
    })
}

fn parse_compare_args(tokens: &[String]) -> Result<CompareArgs, CliError> {
    let mut buckets = None;
    let mut column = None;
    let mut input = None;
    let mut output = None;

    let mut idx = 0;
    while idx < tokens.len() {
        let token = tokens[idx].as_str();
        match token {
            "--buckets" => {
                buckets = Some(parse_usize_flag(
                    flag_value(tokens, &mut idx, "--buckets")?,
                    "--buckets",
                )?);
            }
            "--column" => {
                column = Some(parse_usize_flag(
                    flag_value(tokens, &mut idx, "--column")?,
                    "--column",
                )?);
            }
            "--input" => {
                input = Some(PathBuf::from(flag_value(tokens, &mut idx, "--input")?));
            }
            "--output" => {
                output = Some(PathBuf::from(flag_value(tokens, &mut idx, "--output")?));
            }
            _ => {
                return Err(CliError::invalid_input(format!(
                    "unknown flag '{token}' for 'compare'"
                )));
            }
        }
    }

    Ok(CompareArgs {
        buckets: buckets
            .ok_or_else(|| CliError::invalid_input("--buckets is required for 'compare'"))?,
        column,
        input: input
            .ok_or_else(|| CliError::invalid_input("--input is required for 'compare'"))?,
        output,
    })
}

fn print_version() {
    println!("obq {}", env!("CARGO_PKG_VERSION"));
}

fn print_root_help() {
    println!(
        "obq {}\n\nUSAGE:\n  obq <COMMAND> [OPTIONS]\n\nCOMMANDS:\n  quantize   Bucket one CSV column with a single method\n  compare    Run every method on one CSV column and compare total MSE\n\nGLOBAL OPTIONS:\n  -h, --help      Show help\n  -V, --version   Show version\n\nRun 'obq <COMMAND> --help' for subcommand options.",
        env!("CARGO_PKG_VERSION")
    );
}

fn print_command_help(command: &str) -> Result<(), CliError> {
    match command {
        "quantize" => {
            println!(
                "USAGE:\n  obq quantize --input <path.csv> --buckets <K> [OPTIONS]\n\nOPTIONS:\n  --method <mse|width|freq>   Default: mse\n  --buckets <usize>           Required bucket count\n  --column <usize>            Column index for multi-column CSV (default: 0)\n  --strict                    Compensated accumulation for the mse method\n  --input <path>              Required CSV input\n  --output <path>             Write JSON output to file"
            );
            Ok(())
        }
        "compare" => {
            println!(
                "USAGE:\n  obq compare --input <path.csv> --buckets <K> [OPTIONS]\n\nOPTIONS:\n  --buckets <usize>           Required bucket count\n  --column <usize>            Column index for multi-column CSV (default: 0)\n  --input <path>              Required CSV input\n  --output <path>             Write JSON output to file"
            );
            Ok(())
        }
        _ => Err(CliError::invalid_input(format!(
            "unknown command '{command}'; expected one of: quantize, compare"
        ))),
    }
}

fn load_scores(path: &Path, column: Option<usize>) -> Result<Vec<f64>, CliError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            CliError::invalid_input(format!(
                "unable to infer input format for '{}'; expected .csv",
                path.display()
            ))
        })?;
    if extension != "csv" {
        return Err(CliError::invalid_input(format!(
            "unsupported input format '{extension}'; expected .csv"
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    let (values, n, d) = parse_csv_data(raw.as_str())?;
    select_column(&values, n, d, column)
}

fn parse_csv_data(raw: &str) -> Result<(Vec<f64>, usize, usize), CliError> {
    let rows = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    if rows.is_empty() {
        return Err(CliError::invalid_input("CSV input is empty"));
    }

    match parse_csv_rows(rows.as_slice()) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            if rows.len() > 1 && first_row_looks_like_header(rows[0], rows[1]) {
                if let Ok(without_header) = parse_csv_rows(&rows[1..]) {
                    return Ok(without_header);
                }
            }
            Err(err)
        }
    }
}

fn parse_csv_rows(rows: &[&str]) -> Result<(Vec<f64>, usize, usize), CliError> {
    let mut values = Vec::<f64>::new();
    let mut expected_cols: Option<usize> = None;

    for (row_idx, row) in rows.iter().enumerate() {
        let cells = row.split(',').map(str::trim).collect::<Vec<_>>();

        if let Some(cols) = expected_cols {
            if cells.len() != cols {
                return Err(CliError::invalid_input(format!(
                    "CSV row {} has {} columns but expected {}",
                    row_idx + 1,
                    cells.len(),
                    cols
                )));
            }
        } else {
            expected_cols = Some(cells.len());
        }

        for (col_idx, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                return Err(CliError::invalid_input(format!(
                    "CSV row {} column {} is empty",
                    row_idx + 1,
                    col_idx + 1
                )));
            }

            let value = cell.parse::<f64>().map_err(|_| {
                CliError::invalid_input(format!(
                    "CSV row {} column {} is not a valid float: '{}'",
                    row_idx + 1,
                    col_idx + 1,
                    cell
                ))
            })?;
            values.push(value);
        }
    }

    let d = expected_cols.ok_or_else(|| CliError::invalid_input("CSV input is empty"))?;
    let n = rows.len();
    Ok((values, n, d))
}

fn first_row_looks_like_header(first_row: &str, second_row: &str) -> bool {
    let first_cells = first_row.split(',').map(str::trim).collect::<Vec<_>>();
    let second_cells = second_row.split(',').map(str::trim).collect::<Vec<_>>();

    if first_cells.is_empty()
        || first_cells.len() != second_cells.len()
        || first_cells.iter().any(|cell| cell.is_empty())
        || second_cells.iter().any(|cell| cell.is_empty())
    {
        return false;
    }

    let first_all_non_numeric = first_cells.iter().all(|cell| cell.parse::<f64>().is_err());
    let second_all_numeric = second_cells.iter().all(|cell| cell.parse::<f64>().is_ok());

    first_all_non_numeric && second_all_numeric
}

fn select_column(
    values: &[f64],
    n: usize,
    d: usize,
    column: Option<usize>,
) -> Result<Vec<f64>, CliError> {
    let column = column.unwrap_or(0);
    if column >= d {
        return Err(CliError::invalid_input(format!(
            "--column {column} is out of range for a CSV with {d} column(s)"
        )));
    }
    Ok((0..n).map(|row| values[row * d + column]).collect())
}

fn summarize_buckets(scores: &[f64], partition: &BucketPartition) -> Vec<BucketSummaryOutput> {
    let bucket_count = partition.bucket_count();
    let mut counts = vec![0usize; bucket_count];
    let mut sums = vec![0.0_f64; bucket_count];
    let mut sums_sq = vec![0.0_f64; bucket_count];
    let mut mins = vec![f64::INFINITY; bucket_count];
    let mut maxs = vec![f64::NEG_INFINITY; bucket_count];

    for (&score, &label) in scores.iter().zip(&partition.labels) {
        counts[label] += 1;
        sums[label] += score;
        sums_sq[label] += score * score;
        mins[label] = mins[label].min(score);
        maxs[label] = maxs[label].max(score);
    }

    (0..bucket_count)
        .map(|index| {
            let count = counts[index];
            if count == 0 {
                BucketSummaryOutput {
                    index,
                    count,
                    min: None,
                    max: None,
                    mean: None,
                    sse: 0.0,
                }
            } else {
                let count_f = count as f64;
                let mean = sums[index] / count_f;
                BucketSummaryOutput {
                    index,
                    count,
                    min: Some(mins[index]),
                    max: Some(maxs[index]),
                    mean: Some(mean),
                    sse: (sums_sq[index] - sums[index] * sums[index] / count_f).max(0.0),
                }
            }
        })
        .collect()
}

fn handle_quantize(args: QuantizeArgs) -> Result<(), CliError> {
    let scores = load_scores(args.input.as_path(), args.column)?;
    info!(
        n = scores.len(),
        input = %args.input.display(),
        "loaded score column"
    );

    let series = ScoreSeries::from_f64(&scores)?;
    let partition = run_quantizer(&series, args.method, args.buckets, args.strict)?;
    info!(
        method = args.method.as_str(),
        effective_buckets = partition.bucket_count(),
        "quantization finished"
    );

    let payload = QuantizeOutput {
        command: "quantize",
        method: args.method.as_str(),
        input: args.input.display().to_string(),
        n: partition.diagnostics.n,
        requested_buckets: partition.diagnostics.requested_buckets,
        effective_buckets: partition.diagnostics.effective_buckets,
        objective: partition.diagnostics.objective,
        runtime_ms: partition.diagnostics.runtime_ms,
        buckets: summarize_buckets(&scores, &partition),
        notes: partition.diagnostics.notes.clone(),
        warnings: partition.diagnostics.warnings.clone(),
        boundaries: partition.boundaries,
        labels: partition.labels,
    };

    write_json_output(&payload, args.output.as_deref())
}

fn handle_compare(args: CompareArgs) -> Result<(), CliError> {
    let scores = load_scores(args.input.as_path(), args.column)?;
    info!(
        n = scores.len(),
        input = %args.input.display(),
        "loaded score column"
    );

    let series = ScoreSeries::from_f64(&scores)?;
    let mut methods = Vec::with_capacity(Method::ALL.len());
    for method in Method::ALL {
        let partition = run_quantizer(&series, method, args.buckets, false)?;
        info!(
            method = method.as_str(),
            total_sse = partition.diagnostics.objective,
            "method finished"
        );
        methods.push(MethodReportOutput {
            method: method.as_str(),
            effective_buckets: partition.diagnostics.effective_buckets,
            total_sse: partition.diagnostics.objective,
            boundaries: partition.boundaries,
        });
    }

    let payload = CompareOutput {
        command: "compare",
        input: args.input.display().to_string(),
        n: scores.len(),
        requested_buckets: args.buckets,
        methods,
    };

    write_json_output(&payload, args.output.as_deref())
}

fn write_json_output<T: Serialize>(payload: &T, output_path: Option<&Path>) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(payload)
        .map_err(|source| CliError::json("failed to serialize JSON output", source))?;

    if let Some(path) = output_path {
        fs::write(path, format!("{encoded}\n"))
            .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
    } else {
        println!("{encoded}");
        Ok(())
    }
}

fn emit_structured_error(err: &CliError) {
    let envelope = ErrorEnvelope {
        error: ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    };

    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!(
            "{{\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
            err.code(),
            err
        ),
    }
}
