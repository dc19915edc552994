use titlegate::{GitHub, TriggerEvent, parse_args, run_title_check};
use tracing::info;

fn handle_clap_help_version(clap_err: &clap::Error) -> ! {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            std::process::exit(0);
        }
        _ => {
            eprint!("{clap_err}");
            std::process::exit(2);
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run() -> anyhow::Result<()> {
    let options = match parse_args(std::env::args()) {
        Ok(options) => options,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                handle_clap_help_version(clap_err);
            } else {
                return Err(err);
            }
        }
    };

    let trigger = TriggerEvent::load(&options.event_name, &options.event_path)?;
    let github = GitHub::from_env()?;
    let summary = run_title_check(&trigger, &options.config, &github).await?;

    info!(
        state = %summary.report.state,
        status_written = summary.status_written,
        link_appended = summary.link_appended,
        approved = summary.approved,
        "run complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        // Workflow error annotation; the exit code marks the run failed.
        println!("::error::{err:#}");
        std::process::exit(1);
    }
}
