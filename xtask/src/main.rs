use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use xshell::{Shell, cmd};

/// Publish order: every crate after the crates it depends on.
const PUBLISH_ORDER: &[&str] = &[
    "crates/baglease-core",
    "crates/baglease-notify",
    "crates/baglease-lease",
    "crates/baglease",
];

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "baglease development automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all crates in the workspace
    Build,
    /// Run test suite for all crates
    Test,
    /// rustfmt check and clippy with warnings denied
    Lint,
    /// Run the criterion benchmarks
    Bench,
    /// Run all verification steps (build + lint + test)
    Verify,
    /// Publish all crates to crates.io in dependency order
    Publish {
        /// Perform a dry-run (check packaging without uploading)
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    match cli.command {
        Commands::Build => {
            println!("{}", "🚀 Building workspace...".green().bold());
            cmd!(sh, "cargo build --workspace --all-targets").run()?;
            println!("{}", "✅ Build successful".green().bold());
        }
        Commands::Test => {
            println!("{}", "🧪 Running tests...".green().bold());
            cmd!(sh, "cargo test --workspace").run()?;
            println!("{}", "✅ All tests passed".green().bold());
        }
        Commands::Lint => run_lint(&sh)?,
        Commands::Bench => {
            println!("{}", "📈 Running benchmarks...".green().bold());
            cmd!(sh, "cargo bench -p baglease").run()?;
        }
        Commands::Verify => run_verify(&sh)?,
        Commands::Publish { dry_run } => run_publish(&sh, dry_run)?,
    }

    Ok(())
}

fn run_lint(sh: &Shell) -> Result<()> {
    println!("{}", "🔎 Linting...".green().bold());
    cmd!(sh, "cargo fmt --all -- --check").run()?;
    cmd!(sh, "cargo clippy --workspace --all-targets -- -D warnings").run()?;
    println!("{}", "✅ Lint clean".green().bold());
    Ok(())
}

fn run_verify(sh: &Shell) -> Result<()> {
    println!("{}", "🛡️ Verifying project integrity...".green().bold());

    let steps: [(&str, fn(&Shell) -> Result<()>); 3] = [
        ("build", |sh| Ok(cmd!(sh, "cargo build --workspace --all-targets").run()?)),
        ("lint", run_lint),
        ("test", |sh| Ok(cmd!(sh, "cargo test --workspace").run()?)),
    ];

    let pb = ProgressBar::new(steps.len() as u64);
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {msg}")?);
    for (name, step) in steps {
        pb.set_message(name);
        pb.suspend(|| step(sh)).with_context(|| format!("verify step `{name}` failed"))?;
        pb.inc(1);
    }
    pb.finish_with_message("done");

    println!("{}", "✅ Verification complete".green().bold());
    Ok(())
}

fn run_publish(sh: &Shell, dry_run: bool) -> Result<()> {
    println!("{}", "📦 Starting Publish Workflow...".magenta().bold());
    if dry_run {
        println!("{}", "ℹ️  DRY RUN MODE".yellow());
    }

    let version = workspace_version(sh)?;
    let mut published = 0;
    let mut skipped = 0;

    for crate_path in PUBLISH_ORDER {
        let crate_name = crate_path.rsplit('/').next().unwrap_or(crate_path);
        let _guard = sh.push_dir(crate_path);

        println!("{}", format!("\n🔍 Checking {crate_name}@{version}...").cyan());
        if !dry_run {
            let search = cmd!(sh, "cargo search {crate_name} --limit 1")
                .read()
                .unwrap_or_default();
            if search.contains(&format!("{crate_name} = \"{version}\"")) {
                let note = format!("⏭️  {crate_name} v{version} already exists, skipping");
                println!("{}", note.yellow());
                skipped += 1;
                continue;
            }
        }

        if dry_run {
            cmd!(sh, "cargo publish --dry-run --allow-dirty").run()?;
        } else {
            cmd!(sh, "cargo publish").run()?;
            wait_for_index_propagation(sh, crate_name, &version)?;
        }
        println!("{}", format!("✅ Published {crate_name} v{version}").green());
        published += 1;
    }

    println!("\n{}", "═".repeat(50).dimmed());
    println!("   ✅ Published: {}", published.to_string().green());
    println!("   ⏭️  Skipped:   {}", skipped.to_string().yellow());
    Ok(())
}

/// Reads `workspace.package.version` from the root manifest.
fn workspace_version(sh: &Shell) -> Result<String> {
    let manifest: toml_edit::DocumentMut = sh.read_file("Cargo.toml")?.parse()?;
    manifest
        .get("workspace")
        .and_then(|ws| ws.get("package"))
        .and_then(|pkg| pkg.get("version"))
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .context("workspace.package.version missing from Cargo.toml")
}

/// Wait for crates.io index to propagate the new version
fn wait_for_index_propagation(sh: &Shell, crate_name: &str, version: &str) -> Result<()> {
    let pb = ProgressBar::new(30);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}",
        )?
        .progress_chars("#>-"),
    );
    pb.set_message(format!("Waiting for {crate_name} v{version} to propagate..."));

    for _ in 0..15 {
        pb.inc(2);
        std::thread::sleep(Duration::from_secs(2));

        let search = cmd!(sh, "cargo search {crate_name} --limit 1")
            .read()
            .unwrap_or_default();
        if search.contains(version) {
            pb.finish_with_message(format!("✓ {crate_name} v{version} available on crates.io"));
            return Ok(());
        }
    }

    pb.finish_with_message(format!("Timeout - {crate_name} may take longer to appear"));
    Ok(())
}
