use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use atlas_gen_core::prelude::*;
use clap::{ArgAction, Args, Parser, Subcommand};
use globset::Glob;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "atlas-gen",
    about = "Keep sprite atlas bundles in sync with JSON pack rules",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Project root; rule, image and output paths are relative to it
    #[arg(long, default_value = ".", global = true, help_heading = "Project")]
    root: PathBuf,
    /// Settings file (YAML), relative to the project root
    #[arg(long, default_value = "atlas-gen.yaml", global = true, help_heading = "Project")]
    settings: PathBuf,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update every bundle described by the pack rules
    Generate(GenerateArgs),
    /// Parse every pack rule and report diagnostics without touching bundles
    Check,
    /// Show or change the generator settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    /// Compute the changes but do not write bundles
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Write the per-document report (JSON) to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Print the settings in effect
    Show {
        /// Output format: json|yaml
        #[arg(long, default_value = "yaml", value_parser = ["json", "yaml"])]
        format: String,
    },
    /// Write a settings file with default values
    Init {
        /// Overwrite an existing settings file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Change individual settings and save them
    Set(SetArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct SetArgs {
    #[arg(long, help_heading = "Directories")]
    rules_dir: Option<PathBuf>,
    #[arg(long, help_heading = "Directories")]
    output_dir: Option<PathBuf>,
    /// File-name glob a rule document must match
    #[arg(long, help_heading = "Directories")]
    rule_pattern: Option<String>,
    #[arg(long, help_heading = "Atlas Defaults")]
    include_in_build: Option<bool>,
    #[arg(long, help_heading = "Atlas Defaults")]
    padding: Option<i32>,
    #[arg(long, help_heading = "Atlas Defaults")]
    enable_rotation: Option<bool>,
    #[arg(long, help_heading = "Atlas Defaults")]
    enable_tight_packing: Option<bool>,
    #[arg(long, help_heading = "Atlas Defaults")]
    enable_alpha_dilation: Option<bool>,
    /// Maximum page size (clamped to 256..=4096)
    #[arg(long, help_heading = "Atlas Defaults")]
    max_size: Option<i32>,
}

impl SetArgs {
    fn into_patch(self) -> SettingsPatch {
        SettingsPatch {
            rules_dir: self.rules_dir,
            output_dir: self.output_dir,
            rule_pattern: self.rule_pattern,
            include_in_build: self.include_in_build,
            padding: self.padding,
            enable_rotation: self.enable_rotation,
            enable_tight_packing: self.enable_tight_packing,
            enable_alpha_dilation: self.enable_alpha_dilation,
            max_size: self.max_size,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let settings_path = cli.root.join(&cli.settings);
    match &cli.command {
        Commands::Generate(args) => {
            let settings = load_settings(&settings_path)?;
            run_generate(&cli.root, &settings, args, cli.progress && !cli.quiet)
        }
        Commands::Check => {
            let settings = load_settings(&settings_path)?;
            run_check(&cli.root, &settings)
        }
        Commands::Settings(cmd) => run_settings(&settings_path, cmd),
    }
}

fn run_generate(
    root: &Path,
    settings: &GeneratorSettings,
    args: &GenerateArgs,
    show_progress: bool,
) -> anyhow::Result<()> {
    let rules_dir = root.join(&settings.rules_dir);
    if !rules_dir.is_dir() {
        warn!(?rules_dir, "no pack rules found");
        return Ok(());
    }
    let out_dir = root.join(&settings.output_dir);
    let store = if args.dry_run {
        FsBundleStore::open(&out_dir)
    } else {
        FsBundleStore::new(&out_dir)
    };
    let mut store =
        store.with_context(|| format!("open atlas output dir {}", out_dir.display()))?;
    let host = FsAssetHost::new(root);

    let rule_files = collect_rule_files(&rules_dir, &settings.rule_pattern)?;
    info!(count = rule_files.len(), "found rule files");

    let bar = progress_bar(rule_files.len(), show_progress)?;
    let report = Generator::new(settings, &host, &mut store)
        .dry_run(args.dry_run)
        .run(&rule_files, |_, _, path| {
            if let Some(b) = &bar {
                let msg = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
                b.set_message(msg.to_string());
                b.inc(1);
            }
        });
    if let Some(b) = &bar {
        b.finish_and_clear();
    }

    for doc in &report.documents {
        print_outcome(&doc.outcome, args.dry_run);
    }
    if let Some(report_path) = &args.report {
        fs::write(report_path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("write {}", report_path.display()))?;
        info!(?report_path, "report written");
    }
    println!("{}", report.summary());
    Ok(())
}

/// Prints the per-bundle line. Diagnostics and failures are already logged
/// by the generator.
fn print_outcome(outcome: &Outcome, dry_run: bool) {
    let Outcome::Updated(u) = outcome else {
        return;
    };
    println!(
        "{}{}: +{} -{} ({} members{})",
        if dry_run { "[dry-run] " } else { "" },
        u.name,
        u.added.len(),
        u.removed.len(),
        u.members,
        if u.dropped > 0 {
            format!(", {} skipped", u.dropped)
        } else {
            String::new()
        }
    );
}

fn run_check(root: &Path, settings: &GeneratorSettings) -> anyhow::Result<()> {
    let rules_dir = root.join(&settings.rules_dir);
    if !rules_dir.is_dir() {
        warn!(?rules_dir, "no pack rules found");
        return Ok(());
    }
    let mut broken = 0;
    for path in collect_rule_files(&rules_dir, &settings.rule_pattern)? {
        let rule = read_rule_file(&path);
        if rule.has_format_error() {
            broken += 1;
            println!("{}: format error", path.display());
        } else if rule.is_empty() {
            println!("{}: not a rule document", path.display());
            continue;
        } else {
            println!(
                "{}: {}",
                path.display(),
                rule.atlas_name.as_deref().unwrap_or_default()
            );
        }
        for e in &rule.errors {
            println!("    {e}");
        }
    }
    if broken > 0 {
        anyhow::bail!("{} rule document(s) could not be read", broken);
    }
    Ok(())
}

fn run_settings(path: &Path, cmd: &SettingsCommand) -> anyhow::Result<()> {
    match cmd {
        SettingsCommand::Show { format } => {
            let settings = load_settings(path)?;
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&settings)?),
                _ => print!("{}", serde_yaml::to_string(&settings)?),
            }
        }
        SettingsCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            save_settings(path, &GeneratorSettings::default())?;
        }
        SettingsCommand::Set(args) => {
            let patch = args.clone().into_patch();
            if patch.is_empty() {
                anyhow::bail!("nothing to change");
            }
            let mut settings = load_settings(path)?;
            settings.apply(patch);
            settings.validate()?;
            save_settings(path, &settings)?;
        }
    }
    Ok(())
}

/// Loads the settings file, falling back to defaults when it does not exist.
fn load_settings(path: &Path) -> anyhow::Result<GeneratorSettings> {
    if !path.exists() {
        warn!(?path, "settings file not found, using defaults");
        return Ok(GeneratorSettings::default());
    }
    let file = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: GeneratorSettings =
        serde_yaml::from_str(&file).with_context(|| format!("parse {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    info!(?path, "loaded settings");
    Ok(settings)
}

fn save_settings(path: &Path, settings: &GeneratorSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_yaml::to_string(settings)?)
        .with_context(|| format!("write {}", path.display()))?;
    info!(?path, "saved settings");
    Ok(())
}

/// Rule documents under `dir` (recursive) whose file name matches `pattern`,
/// sorted by path.
fn collect_rule_files(dir: &Path, pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("bad rule pattern {pattern}"))?
        .compile_matcher();
    let mut list: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && matcher.is_match(e.file_name()))
        .map(|e| e.into_path())
        .collect();
    list.sort();
    Ok(list)
}

fn progress_bar(len: usize, show: bool) -> anyhow::Result<Option<indicatif::ProgressBar>> {
    use indicatif::{ProgressBar, ProgressStyle};
    if !show {
        return Ok(None);
    }
    let b = ProgressBar::new(len as u64);
    b.set_style(ProgressStyle::with_template(
        "{spinner:.green} generating {pos}/{len} [{elapsed_precise}] {wide_msg}",
    )?);
    Ok(Some(b))
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
