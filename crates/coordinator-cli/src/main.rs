use coordinator::dms::{self, Axis};
use coordinator::fs::{DirectoryStore, FsError, HtmlDirectory, StaticRedirects};
use coordinator::params::build_parameters_with_precision;
use coordinator::{
    CoordinateIndicator, CoordinateState, Coordinator, CoordinatorConfig, DmsText, DocumentTree,
    Hemisphere, PageMetadata, ParsoidDocument,
};
use futures::executor::block_on;
use serde::Serialize;
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Input(String),
    Io(std::io::Error),
    Coordinator(coordinator::Error),
    Fs(FsError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Input(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Coordinator(err) => write!(f, "{err}"),
            CliError::Fs(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<coordinator::Error> for CliError {
    fn from(value: coordinator::Error) -> Self {
        Self::Coordinator(value)
    }
}

impl From<FsError> for CliError {
    fn from(value: FsError) -> Self {
        match value {
            FsError::Core(err) => Self::Coordinator(err),
            other => Self::Fs(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Dms,
    Decimal,
    Params,
    Locate,
    Apply,
    Commit,
}

#[derive(Debug, Default)]
struct Args {
    command: Option<Command>,
    positional: Vec<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    use_dms: Option<bool>,
    inline: bool,
    no_title: bool,
    name: Option<String>,
    extra: Option<String>,
    notes: Option<String>,
    qid: Option<String>,
    pretty: bool,
    missing: bool,
    redirects: Option<String>,
    config: Option<String>,
    out: Option<String>,
    dir: Option<String>,
    page: Option<String>,
}

#[derive(Serialize)]
struct DmsOut {
    negative: bool,
    degrees: f64,
    minutes: f64,
    seconds: f64,
    latitude: Hemisphere,
    longitude: Hemisphere,
}

fn usage() -> &'static str {
    "coordinator-cli\n\
\n\
USAGE:\n\
  coordinator-cli dms <decimal>\n\
  coordinator-cli decimal <degrees> [<minutes> [<seconds>]] [N|S|E|W]\n\
  coordinator-cli params [--lat <v> --lon <v>] [STATE FLAGS] [--config <file>] [--pretty]\n\
  coordinator-cli locate [--missing] [--redirects <file>] [--config <file>] [--pretty] [<page.html>|-]\n\
  coordinator-cli apply [--lat <v> --lon <v>] [STATE FLAGS] [--missing] [--redirects <file>] [--config <file>] [--out <path>] [<page.html>|-]\n\
  coordinator-cli commit --dir <snapshots> --page <title> [--lat <v> --lon <v>] [STATE FLAGS] [--missing] [--redirects <file>] [--config <file>] [--out <dir>] [--pretty]\n\
\n\
STATE FLAGS:\n\
  --dms | --decimal   parameter format\n\
  --inline            show the coordinate inline\n\
  --no-title          do not show the coordinate next to the title\n\
  --name <s> --extra <s> --notes <s> --qid <s>\n\
\n\
NOTES:\n\
  - If <page.html> is omitted or '-', the document is read from stdin.\n\
  - The coordinate indicator (present, missing, absent) is read off the document; --missing forces the placeholder branch.\n\
  - apply prints the rewritten HTML to stdout unless --out is given.\n\
  - commit reads <snapshots>/<title>.html and writes the result (plus edits.jsonl) to --out, defaulting to <snapshots>.\n\
  - Set COORDINATOR_LOG (e.g. debug) to see locator decisions on stderr.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn parse_number(raw: &str) -> Result<f64, CliError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| CliError::Input(format!("not a number: {raw}")))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "dms" if args.command.is_none() => args.command = Some(Command::Dms),
            "decimal" if args.command.is_none() => args.command = Some(Command::Decimal),
            "params" if args.command.is_none() => args.command = Some(Command::Params),
            "locate" if args.command.is_none() => args.command = Some(Command::Locate),
            "apply" if args.command.is_none() => args.command = Some(Command::Apply),
            "commit" if args.command.is_none() => args.command = Some(Command::Commit),
            "--lat" => args.lat = Some(parse_number(next_value(&mut it)?)?),
            "--lon" => args.lon = Some(parse_number(next_value(&mut it)?)?),
            "--dms" => args.use_dms = Some(true),
            "--decimal" => args.use_dms = Some(false),
            "--inline" => args.inline = true,
            "--no-title" => args.no_title = true,
            "--name" => args.name = Some(next_value(&mut it)?.clone()),
            "--extra" => args.extra = Some(next_value(&mut it)?.clone()),
            "--notes" => args.notes = Some(next_value(&mut it)?.clone()),
            "--qid" => args.qid = Some(next_value(&mut it)?.clone()),
            "--pretty" => args.pretty = true,
            "--missing" => args.missing = true,
            "--redirects" => args.redirects = Some(next_value(&mut it)?.clone()),
            "--config" => args.config = Some(next_value(&mut it)?.clone()),
            "--out" => args.out = Some(next_value(&mut it)?.clone()),
            "--dir" => args.dir = Some(next_value(&mut it)?.clone()),
            "--page" => args.page = Some(next_value(&mut it)?.clone()),
            "--" => args.positional.extend(it.by_ref().cloned()),
            // Negative numbers are positional values, not flags.
            other if other.len() > 1 && other.starts_with('-') && other.parse::<f64>().is_err() => {
                return Err(CliError::Usage(usage()));
            }
            value => args.positional.push(value.to_string()),
        }
    }

    if args.command.is_none() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            tracing::info!(path, "wrote document");
            Ok(())
        }
    }
}

fn single_input(args: &Args) -> Result<Option<&str>, CliError> {
    match args.positional.as_slice() {
        [] => Ok(None),
        [path] => Ok(Some(path.as_str())),
        _ => Err(CliError::Usage(usage())),
    }
}

fn load_config(args: &Args) -> Result<CoordinatorConfig, CliError> {
    match &args.config {
        None => Ok(CoordinatorConfig::default()),
        Some(path) => Ok(CoordinatorConfig::from_json_str(&std::fs::read_to_string(
            path,
        )?)?),
    }
}

fn load_redirects(args: &Args) -> Result<StaticRedirects, CliError> {
    match &args.redirects {
        None => Ok(StaticRedirects::default()),
        Some(path) => Ok(StaticRedirects::from_path(path)?),
    }
}

/// Applies the state flags on top of `state`.
fn apply_state_flags(state: &mut CoordinateState, args: &Args) -> Result<(), CliError> {
    match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => state.set_decimal(lat, lon)?,
        (None, None) => {}
        _ => {
            return Err(CliError::Input(
                "--lat and --lon must be given together".to_string(),
            ));
        }
    }
    if let Some(use_dms) = args.use_dms {
        state.set_use_dms(use_dms);
    }
    if args.inline {
        state.inline = true;
    }
    if args.no_title {
        state.title = false;
    }
    if let Some(name) = &args.name {
        state.set_name(Some(name));
    }
    if let Some(extra) = &args.extra {
        state.set_extra_parameters(Some(extra));
    }
    if let Some(notes) = &args.notes {
        state.set_notes(Some(notes));
    }
    if let Some(qid) = &args.qid {
        state.set_qid(Some(qid));
    }
    Ok(())
}

fn indicator(doc: &ParsoidDocument, args: &Args) -> Result<CoordinateIndicator, CliError> {
    if args.missing {
        return Ok(CoordinateIndicator::Missing);
    }
    Ok(CoordinateIndicator::detect(doc)?)
}

/// Opens an editing session on `doc` and applies the state flags to it.
fn prepare_state(
    coordinator: &Coordinator,
    doc: &ParsoidDocument,
    page: &str,
    args: &Args,
) -> Result<CoordinateState, CliError> {
    let meta = PageMetadata {
        page: page.to_string(),
        indicator: indicator(doc, args)?,
        ..PageMetadata::default()
    };
    let mut state = coordinator.open(&meta, doc)?;
    apply_state_flags(&mut state, args)?;
    Ok(state)
}

fn run_dms(args: &Args) -> Result<(), CliError> {
    let [value] = args.positional.as_slice() else {
        return Err(CliError::Usage(usage()));
    };
    let decimal = parse_number(value)?;
    let out = dms::to_dms(decimal).map(|dms| DmsOut {
        negative: dms.sign == dms::Sign::Negative,
        degrees: dms.degrees,
        minutes: dms.minutes,
        seconds: dms.seconds,
        latitude: dms.hemisphere(Axis::Latitude),
        longitude: dms.hemisphere(Axis::Longitude),
    });
    write_json(&out, args.pretty)
}

fn run_decimal(args: &Args) -> Result<(), CliError> {
    let mut fields: Vec<&str> = args.positional.iter().map(String::as_str).collect();
    let hemisphere = match fields.last() {
        Some(last) if Hemisphere::from_letter(last).is_some() => fields.pop(),
        _ => None,
    };
    if fields.is_empty() || fields.len() > 3 {
        return Err(CliError::Usage(usage()));
    }
    let axis = hemisphere
        .and_then(Hemisphere::from_letter)
        .map_or(Axis::Latitude, Hemisphere::axis);
    let text = DmsText {
        degrees: fields[0],
        minutes: fields.get(1).copied().unwrap_or_default(),
        seconds: fields.get(2).copied().unwrap_or_default(),
        hemisphere: hemisphere.unwrap_or_default(),
    };
    let Some(value) = text.parse(axis) else {
        return Err(CliError::Input(format!(
            "invalid DMS input: {}",
            args.positional.join(" ")
        )));
    };
    println!("{}", dms::format_js_number(value.to_decimal()));
    Ok(())
}

fn run_params(args: &Args) -> Result<(), CliError> {
    let config = load_config(args)?;
    let mut state = CoordinateState::placeholder(false);
    state.set_use_dms(config.default_dms);
    apply_state_flags(&mut state, args)?;
    let params = build_parameters_with_precision(&state, config.decimal_precision);
    write_json(&params, args.pretty)
}

fn offline_coordinator(args: &Args) -> Result<Coordinator, CliError> {
    let config = load_config(args)?;
    let aliases = load_redirects(args)?.to_aliases();
    Ok(Coordinator::new(config, aliases))
}

fn run_locate(args: &Args) -> Result<(), CliError> {
    let html = read_input(single_input(args)?)?;
    let doc = ParsoidDocument::parse(html)?;
    let coordinator = offline_coordinator(args)?;
    let from_missing = indicator(&doc, args)? == CoordinateIndicator::Missing;
    let target = coordinator.locator().locate(&doc, from_missing)?;
    write_json(&target, args.pretty)
}

fn run_apply(args: &Args) -> Result<(), CliError> {
    let input = single_input(args)?;
    let html = read_input(input)?;
    let mut doc = ParsoidDocument::parse(html)?;
    let coordinator = offline_coordinator(args)?;
    let state = prepare_state(&coordinator, &doc, input.unwrap_or("-"), args)?;
    let target = coordinator.apply(&state, &mut doc)?;
    tracing::debug!(?target, "applied coordinates");
    write_text(&doc.serialize(), args.out.as_deref())
}

fn run_commit(args: &Args) -> Result<(), CliError> {
    let (Some(dir), Some(page)) = (args.dir.as_deref(), args.page.as_deref()) else {
        return Err(CliError::Usage(usage()));
    };
    if !args.positional.is_empty() {
        return Err(CliError::Usage(usage()));
    }
    let provider = HtmlDirectory::new(dir);
    let store = DirectoryStore::new(args.out.as_deref().unwrap_or(dir));
    let resolver = load_redirects(args)?;
    let coordinator = block_on(Coordinator::with_resolver(load_config(args)?, &resolver))?;

    let doc = provider.load_sync(page)?;
    let state = prepare_state(&coordinator, &doc, page, args)?;
    let outcome = block_on(coordinator.commit(page, state, &provider, &store))?;
    write_json(&outcome, args.pretty)
}

fn run(args: Args) -> Result<(), CliError> {
    tracing::debug!(command = ?args.command, "running");
    match args.command {
        Some(Command::Dms) => run_dms(&args),
        Some(Command::Decimal) => run_decimal(&args),
        Some(Command::Params) => run_params(&args),
        Some(Command::Locate) => run_locate(&args),
        Some(Command::Apply) => run_apply(&args),
        Some(Command::Commit) => run_commit(&args),
        None => Err(CliError::Usage(usage())),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("COORDINATOR_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err @ CliError::Coordinator(coordinator::Error::TemplateNotFound { .. })) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
