use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde_json::Value;

use pitchcopy::{Config, Document, Error, PagePayload, SubstitutionMap, Token};

#[derive(Parser)]
#[command(name = "pitchcopy")]
#[command(about = "Render personalized rich-text marketing copy")]
struct Cli {
    /// Input file: a page payload or Portable Text array (JSON), or Markdown (.md)
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rendering config (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Name substituted for %THIS_TOOL%
    #[arg(long)]
    this_tool: Option<String>,

    /// Name substituted for %COMPETITOR_TOOL%
    #[arg(long)]
    competitor_tool: Option<String>,

    #[arg(short, long, value_enum, default_value_t = Format::Html)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Json,
}

enum Input {
    Page(PagePayload),
    Document(Document),
}

fn read_input(path: &Path) -> pitchcopy::Result<Input> {
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if path.extension().is_some_and(|ext| ext == "md") {
        return Ok(Input::Document(pitchcopy::parse_markdown(&content)));
    }

    let value: Value = serde_json::from_str(&content)?;
    if value.get("tool").is_some() {
        Ok(Input::Page(serde_json::from_value(value)?))
    } else {
        Ok(Input::Document(pitchcopy::portable_text::decode(&value)))
    }
}

/// Flags win over names found in the input.
fn substitutions(cli: &Cli, base: SubstitutionMap) -> SubstitutionMap {
    let mut map = base;
    if let Some(name) = &cli.this_tool {
        map = map.with(Token::ThisTool, name);
    }
    if let Some(name) = &cli.competitor_tool {
        map = map.with(Token::CompetitorTool, name);
    }
    map
}

fn run(cli: &Cli) -> pitchcopy::Result<String> {
    let config = Config::load(&cli.config)?;

    let output = match read_input(&cli.input)? {
        Input::Page(payload) => {
            let map = substitutions(cli, payload.substitutions());
            let page = payload.personalize_with(&map)?;
            match cli.format {
                Format::Html => pitchcopy::to_html(&page.sections, &config),
                Format::Json => serde_json::to_string_pretty(&page)?,
            }
        }
        Input::Document(document) => {
            let map = substitutions(cli, SubstitutionMap::default());
            match cli.format {
                Format::Html => pitchcopy::render_html_with_config(Some(&document), &map, &config),
                Format::Json => {
                    serde_json::to_string_pretty(&pitchcopy::render(Some(&document), &map))?
                }
            }
        }
    };

    Ok(output)
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let rendered = match run(&cli) {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match &cli.output {
        Some(output) => {
            if let Err(e) = fs::write(output, rendered) {
                eprintln!("Error writing {}: {}", output.display(), e);
                std::process::exit(1);
            }
            eprintln!("Created {}", output.display());
        }
        None => print!("{}", rendered),
    }
}
