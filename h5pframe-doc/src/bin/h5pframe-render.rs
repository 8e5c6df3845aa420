use h5pframe_doc::{extract_boot_data, parse_settings, DocError, DocumentBuilder, Mode};
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

struct Args {
    path: String,
    mode: Mode,
    locale: String,
    inspect: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(env::args().skip(1).collect()) {
        Some(args) => args,
        None => {
            print_usage();
            process::exit(1);
        }
    };

    match render(&args) {
        Ok(out) => print!("{}", out),
        Err(e) => {
            eprintln!("✗ {} could not be rendered:", args.path);
            print_error(&e);
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: h5pframe-render <settings.json|settings.yaml> [--editor] [--locale <tag>] [--inspect]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  h5pframe-render settings.json > player.html");
    eprintln!("  h5pframe-render settings.yaml --editor --locale nb");
    eprintln!("  h5pframe-render settings.json --inspect");
}

fn parse_args(raw: Vec<String>) -> Option<Args> {
    let mut path = None;
    let mut mode = Mode::Player;
    let mut locale = "en".to_string();
    let mut inspect = false;

    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--editor" => mode = Mode::Editor,
            "--player" => mode = Mode::Player,
            "--inspect" => inspect = true,
            "--locale" => locale = iter.next()?,
            s if s.starts_with("--") => return None,
            _ if path.is_none() => path = Some(arg),
            _ => return None,
        }
    }

    Some(Args {
        path: path?,
        mode,
        locale,
        inspect,
    })
}

fn render(args: &Args) -> Result<String, DocError> {
    let content = fs::read_to_string(&args.path)
        .map_err(|e| DocError::Deserialization(format!("Failed to read file: {}", e)))?;
    let settings = parse_settings(&content)?;
    let doc = DocumentBuilder::new(&settings)
        .mode(args.mode)
        .locale(args.locale.as_str())
        .build()?;

    if args.inspect {
        let boot = extract_boot_data(&doc.html)?;
        return serde_json::to_string_pretty(&boot)
            .map(|s| s + "\n")
            .map_err(DocError::from);
    }
    Ok(doc.html)
}

fn print_error(error: &DocError) {
    match error {
        DocError::MissingContent => {
            eprintln!("  Settings contain no content entries");
            eprintln!("    Add at least one entry under 'contents'");
        }
        DocError::MalformedContent { key, reason } => {
            eprintln!("  Content '{}' has malformed jsonContent:", key);
            eprintln!("    {}", reason);
        }
        DocError::Deserialization(msg) => {
            eprintln!("  Deserialization error:");
            eprintln!("    {}", msg);
        }
        DocError::YamlError(msg) => {
            eprintln!("  YAML error:");
            eprintln!("    {}", msg);
        }
        e => {
            eprintln!("  {}", e);
        }
    }
}
