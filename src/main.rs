use clap::{Parser, Subcommand};
use ora_site::config::{self, SiteConfig};
use ora_site::output;
use ora_site::paths::ProjectRoot;
use ora_site::pipeline::{self, Builder};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ORA_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("ORA_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "ora-site")]
#[command(about = "Static site builder for include-based HTML templates")]
#[command(long_about = "\
Static site builder for include-based HTML templates

Pages in templates/pages/*.src.html are expanded and written to dist/.
Any page or partial can pull in another file with:

  <!-- ORA:include templates/partials/header.html -->

Output routing:

  index.src.html            → dist/index.html
  personalisation.src.html  → dist/personalisation.html
  about.src.html            → dist/about/index.html

Static items (assets/, favicon.ico, robots.txt, sitemap.xml, CNAME) are
copied as-is when present. The output directory is wiped on every build.

Run 'ora-site gen-config' to generate a documented site.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Output directory (overrides paths.output in site.toml)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Log build internals to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate, clear the output directory, copy static files, build pages
    Build,
    /// Validate and expand every page without writing output
    Check,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("ora_site=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Build => {
            let config = load_config(&cli.root, cli.output.as_deref())?;
            let root = ProjectRoot::new(&cli.root);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = output::EventPrinter::spawn(rx);

            let mut builder = Builder::new(&config, root).with_events(tx);
            let result = builder.run();
            // Dropping the builder closes the channel so the printer drains and exits
            drop(builder);
            let printed = printer.finish();
            result?;
            printed?;
        }
        Command::Check => {
            let config = load_config(&cli.root, cli.output.as_deref())?;
            println!("==> Checking {}", cli.root.display());
            let report = pipeline::check(&config, &ProjectRoot::new(&cli.root))?;
            output::print_check_output(&report);
            println!("==> Project is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

/// Load `site.toml` and apply the `--output` override.
fn load_config(root: &Path, output: Option<&Path>) -> Result<SiteConfig, config::ConfigError> {
    let mut config = config::load_config(root)?;
    if let Some(output) = output {
        config.paths.output = output.to_string_lossy().into_owned();
        config.validate()?;
    }
    Ok(config)
}
