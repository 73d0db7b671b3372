use std::path::PathBuf;

use anyhow::ensure;
use clap::{ArgAction, Parser};
use color_eyre::{eyre::eyre, Result};
use envsnap_core::{
    apply_torch_index_patch, create_snapshot, load_base_document, read_requirements_file,
    write_snapshot, UvProbe,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Pin the active Python environment into a pyproject.toml snapshot"
)]
struct EnvsnapCli {
    #[arg(help = "Base pyproject.toml the snapshot is layered on")]
    base_toml: PathBuf,
    #[arg(help = "requirements.txt whose packages are forced into [project.dependencies]")]
    requirements: PathBuf,
    #[arg(
        short,
        long,
        default_value = "pyproject.snapshot.toml",
        help = "Output file path"
    )]
    output: PathBuf,
    #[arg(
        short,
        long,
        help = "Suppress human output (errors still print to stderr)"
    )]
    quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q")]
    trace: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = EnvsnapCli::parse();
    init_tracing(cli.trace, cli.verbose);

    run(&cli).map_err(|err| eyre!("{err:?}"))
}

fn init_tracing(trace: bool, verbose: u8) {
    let level = if trace {
        "trace"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("envsnap={level},envsnap_cli={level},envsnap_core={level},envsnap_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: &EnvsnapCli) -> anyhow::Result<()> {
    ensure!(
        cli.base_toml.is_file(),
        "base pyproject not found: {}",
        cli.base_toml.display()
    );
    ensure!(
        cli.requirements.is_file(),
        "requirements file not found: {}",
        cli.requirements.display()
    );

    let mut doc = load_base_document(&cli.base_toml)?;
    let requirements = read_requirements_file(&cli.requirements)?;
    let probe = UvProbe::locate()?;

    let summary = create_snapshot(&mut doc, &probe, &requirements)?;
    apply_torch_index_patch(&mut doc, &summary.registry);
    write_snapshot(&doc, &cli.output)?;

    if !cli.quiet {
        let resolved = cli
            .output
            .canonicalize()
            .unwrap_or_else(|_| cli.output.clone());
        println!(
            "Snapshot written to {} ({} of {} installed packages pinned)",
            resolved.display(),
            summary.pinned,
            summary.installed
        );
    }
    Ok(())
}
