use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use spel_lite::Config;
use spel_lite::cli::{self, CliError, EvalOptions, EvalOutcome, Fixture};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "spel")]
#[command(about = "spel - Evaluate expressions against object graphs")]
#[command(version)]
struct Cli {
    /// TOML file with [parser], [logging], and [properties] tables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FixtureArg {
    Tesla,
    Ieee,
}

impl From<FixtureArg> for Fixture {
    fn from(arg: FixtureArg) -> Self {
        match arg {
            FixtureArg::Tesla => Fixture::Tesla,
            FixtureArg::Ieee => Fixture::Ieee,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression
    Eval {
        /// The expression to evaluate
        expression: String,

        /// JSON root object (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Use a sample object graph as the root object
        #[arg(short, long, value_enum)]
        fixture: Option<FixtureArg>,

        /// Bind a variable, e.g. --var limit=10
        #[arg(long = "var", value_name = "NAME=VALUE")]
        variables: Vec<String>,

        /// Set an application property, e.g. --property app.region=eu
        #[arg(long = "property", value_name = "KEY=VALUE")]
        properties: Vec<String>,

        /// Treat the expression as #{...} template text
        #[arg(short, long)]
        template: bool,

        /// Reject every assignment
        #[arg(long)]
        read_only: bool,

        /// Convert the result to this type (Integer, Float, Boolean, String, List, Map)
        #[arg(long)]
        target: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'spel docs' to list categories)
        category: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = load_config(cli.config.as_ref()).and_then(|config| {
        init_logging(&config);
        match cli.command {
            Commands::Eval {
                expression,
                input,
                fixture,
                variables,
                properties,
                template,
                read_only,
                target,
                pretty,
                syntax_only,
            } => {
                let options = EvalOptions {
                    expression,
                    input,
                    fixture: fixture.map(Fixture::from),
                    variables,
                    properties,
                    template,
                    read_only,
                    target,
                    syntax_only,
                    parser: config.parser.clone(),
                    base_properties: config.properties.into_iter().collect(),
                };
                run_eval(options, pretty)
            }
            Commands::Docs => {
                print!("{}", cli::get_docs_overview());
                Ok(())
            }
            Commands::Doc { category } => cli::get_doc_category(&category).map(|content| {
                print!("{}", content);
            }),
        }
    });

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, CliError> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::default()),
    }
}

fn init_logging(config: &Config) {
    use spel_lite::LogFormat;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_writer(io::stderr))
                .init();
        }
    }
}

fn run_eval(mut options: EvalOptions, pretty: bool) -> Result<(), CliError> {
    let needs_input = options.input.is_none() && options.fixture.is_none() && !options.syntax_only;
    if needs_input && !atty::is(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        if !buffer.trim().is_empty() {
            options.input = Some(buffer);
        }
    }

    match cli::execute_eval(&options)? {
        EvalOutcome::SyntaxValid => println!("Syntax is valid"),
        EvalOutcome::Success(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}
