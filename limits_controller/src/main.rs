//! Entrypoint of the thanos-limits-controller binary
use dotenvy::dotenv;

mod commands {
    pub(crate) mod run;
}

enum ReturnCode {
    Failure = 1,
}

#[derive(Debug, clap::Parser)]
#[clap(
name = "thanos-limits-controller",
version,
about = "Keeps the Thanos receive head series limit in step with the ready receivers",
long_about = r#"Keeps the Thanos receive head series limit in step with the ready receivers

Reads the limits configuration from --configmap-name, sets the default tenant's
head_series_limit to (ready receive replicas x --active-series-max) and writes the result
to --configmap-generated-name.

Examples:
    # Reconcile once and exit
    thanos-limits-controller --configmap-name thanos-limits \
        --configmap-generated-name thanos-limits-generated --active-series-max 1000000

    # Reconcile every 30 seconds until SIGTERM
    thanos-limits-controller --configmap-name thanos-limits \
        --configmap-generated-name thanos-limits-generated --active-series-max 1000000 \
        --interval 30s

    # Same, with debug logging as JSON
    LOG_LEVEL=debug LOG_FORMAT=json thanos-limits-controller ...
"#
)]
#[group(skip)]
struct Config {
    #[clap(flatten)]
    run_config: commands::run::Config,
}

fn main() -> Result<(), std::io::Error> {
    // load all environment variables from .env before doing anything
    load_dotenv();

    let config: Config = clap::Parser::parse();
    let config = config.run_config;

    // bad flags are reported before any cluster request is made
    if let Err(e) = config.controller_config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(ReturnCode::Failure as _);
    }

    if let Err(e) = config.logging_config.install_global() {
        eprintln!("Initializing logs failed: {e}");
        std::process::exit(ReturnCode::Failure as _);
    }

    let tokio_runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    tokio_runtime.block_on(async move {
        if let Err(e) = commands::run::command(config).await {
            tracing::error!(%e, "reconciliation failed");
            eprintln!("Reconciliation failed: {e}");
            std::process::exit(ReturnCode::Failure as _)
        }
    });

    Ok(())
}

/// Source the .env file before initialising the Config struct - this sets
/// any envs in the file, which the Config struct then uses.
///
/// Precedence is given to existing env variables.
fn load_dotenv() {
    match dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            // a missing env file is not an error
        }
        Err(e) => {
            eprintln!("FATAL Error loading config from: {e}");
            eprintln!("Aborting");
            std::process::exit(ReturnCode::Failure as _);
        }
    };
}
