//! `renpy-grammar`: inspect grammar artifacts or pack a `grammar.json` into one.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use facet::Facet;
use renpy_grammar::{artifact, parse_grammar, validate, FileArtifact, GrammarLoader, LoaderConfig};
use tracing::Level;

#[derive(Debug, Facet)]
struct Args {
    /// Artifact to inspect, or `grammar.json` to pack with `--pack`.
    #[facet(positional)]
    input: String,

    /// Pack `input` into an artifact instead of inspecting it.
    #[facet(named, default)]
    pack: bool,

    /// Where `--pack` writes the artifact (default: `input` with a `.grammar` extension).
    #[facet(named, short = 'o', default)]
    output: Option<String>,

    /// Treat validation warnings as errors.
    #[facet(named, default)]
    strict: bool,

    /// JSON loader configuration file.
    #[facet(named, default)]
    config: Option<String>,

    /// Log at debug level.
    #[facet(named, short = 'v', default)]
    verbose: bool,
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
    let args: Args = match facet_args::from_slice(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let result = if args.pack { pack(&args) } else { inspect(&args) };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn loader_config(args: &Args) -> Result<LoaderConfig, Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => LoaderConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => LoaderConfig::default(),
    };
    Ok(if args.strict { config.strict(true) } else { config })
}

fn inspect(args: &Args) -> Result<(), Box<dyn Error>> {
    let loader = GrammarLoader::with_config(FileArtifact::new(&args.input), loader_config(args)?);
    let language = loader.load_grammar()?;

    println!("name: {}", language.name());
    println!("abi version: {}", language.abi_version());
    println!("start rule: {}", language.start_rule());
    println!("rules: {}", language.grammar().rules.len());
    println!("symbols: {}", language.symbol_count());
    println!("fields: {}", language.field_count());
    Ok(())
}

fn pack(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = loader_config(args)?;
    let json = std::fs::read_to_string(&args.input)?;
    let grammar = parse_grammar(&json)?;

    let report = validate(&grammar)?;
    for warning in &report.warnings {
        tracing::warn!(grammar = %grammar.name, "{warning}");
    }
    if config.strict && !report.is_clean() {
        return Err(format!(
            "refusing to pack '{}' with {} warning(s) in strict mode",
            grammar.name,
            report.warnings.len()
        )
        .into());
    }

    let output = args
        .output
        .as_ref()
        .map_or_else(|| Path::new(&args.input).with_extension("grammar"), PathBuf::from);
    let bytes = artifact::encode(json.as_bytes())?;
    std::fs::write(&output, &bytes)?;

    println!("wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}
