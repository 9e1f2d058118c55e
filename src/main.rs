use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zenith_site::{
    build_site, discover_routes, serve, FallbackPolicy, PassthroughComposer, RouteResolver,
    SiteConfig, CONFIG_FILE_NAME,
};

#[derive(Parser)]
#[command(name = "zenith")]
#[command(version)]
#[command(about = "Compile .zen page trees into a static multi-page site", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Path to the site config
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every page into the output directory
    Build {
        /// Pages directory
        #[arg(long)]
        pages: Option<PathBuf>,
        /// Output directory (cleared first)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// URL prefix for asset references
        #[arg(long)]
        base_path: Option<String>,
        /// Compile pages in parallel
        #[arg(long)]
        parallel: bool,
    },
    /// Print the discovered route table as JSON
    Routes {
        /// Pages directory
        #[arg(long)]
        pages: Option<PathBuf>,
    },
    /// Serve a built output directory
    Serve {
        /// Output directory to serve
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Port to run the server on
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// URL prefix the site was built with
        #[arg(long)]
        base_path: Option<String>,
        /// Answer 404 for unknown pages instead of the root document
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = SiteConfig::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Build {
            pages,
            out,
            base_path,
            parallel,
        } => {
            if let Some(pages) = pages {
                config.build.pages_dir = pages;
            }
            if let Some(out) = out {
                config.build.out_dir = out;
            }
            if let Some(base_path) = base_path {
                config.build.base_path = base_path;
            }
            config.build.parallel |= parallel;

            let report = build_site(&config.build, &PassthroughComposer)?;
            for warning in &report.warnings {
                tracing::warn!("{}", warning);
            }
            if !report.is_success() {
                anyhow::bail!(
                    "{} of {} pages failed to compile",
                    report.failed.len(),
                    report.routes.len()
                );
            }
            Ok(())
        }
        Commands::Routes { pages } => {
            let pages = pages.unwrap_or(config.build.pages_dir);
            let table = discover_routes(&pages);
            println!("{}", serde_json::to_string_pretty(&table)?);
            Ok(())
        }
        Commands::Serve {
            out,
            port,
            host,
            base_path,
            strict,
        } => {
            let out = out.unwrap_or(config.build.out_dir);
            let host = host.unwrap_or(config.serve.host);
            let port = port.unwrap_or(config.serve.port);
            let policy = if strict || config.serve.strict {
                FallbackPolicy::NotFound
            } else {
                FallbackPolicy::RootDocument
            };

            let base_path = base_path.unwrap_or(config.build.base_path);

            let resolver = RouteResolver::new(out)
                .with_base_path(&base_path)
                .with_policy(policy);
            serve(resolver, &format!("{}:{}", host, port)).await?;
            Ok(())
        }
    }
}
