//! `roadmap-sync` command line client

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use roadmap_model::RoadmapDocument;
use roadmap_sync::{
    DocumentStore, GitHubConfig, GitHubRemote, RemoteStore, SaveOutcome, SnapshotManager,
    SyncConfig,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Exit code when the save retry lost a race and the user must reload
const EXIT_RELOAD_REQUIRED: u8 = 2;

fn cli() -> Command {
    Command::new("roadmap-sync")
        .version(roadmap_sync::VERSION)
        .about("Load, save and snapshot the roadmap document stored in a GitHub repository")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("owner")
                .long("owner")
                .env("ROADMAP_GITHUB_OWNER")
                .global(true)
                .help("Repository owner"),
        )
        .arg(
            Arg::new("repo")
                .long("repo")
                .env("ROADMAP_GITHUB_REPO")
                .global(true)
                .help("Repository name"),
        )
        .arg(
            Arg::new("branch")
                .long("branch")
                .env("ROADMAP_GITHUB_BRANCH")
                .global(true)
                .help("Branch to read and commit to (default branch if unset)"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .env("ROADMAP_GITHUB_TOKEN")
                .hide_env_values(true)
                .global(true)
                .help("Access token"),
        )
        .arg(
            Arg::new("api-base")
                .long("api-base")
                .default_value(roadmap_sync::github::DEFAULT_API_BASE)
                .global(true)
                .help("API base URL"),
        )
        .arg(
            Arg::new("document-path")
                .long("document-path")
                .default_value("roadmap.json")
                .global(true)
                .help("Path of the roadmap document in the repository"),
        )
        .arg(
            Arg::new("snapshot-dir")
                .long("snapshot-dir")
                .default_value("snapshots")
                .global(true)
                .help("Directory holding snapshots"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Debug logging"),
        )
        .subcommand(
            Command::new("pull")
                .about("Print the current document")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write to this file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("push")
                .about("Save a local document file")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Document to save"),
                ),
        )
        .subcommand(Command::new("status").about("Show version and pending remote changes"))
        .subcommand(
            Command::new("snapshot")
                .about("Manage snapshots")
                .subcommand_required(true)
                .subcommand(
                    Command::new("create").about("Snapshot the remote head").arg(
                        Arg::new("name").help("Snapshot name (default: today's UTC date)"),
                    ),
                )
                .subcommand(Command::new("list").about("List snapshots"))
                .subcommand(
                    Command::new("show")
                        .about("Print a snapshot")
                        .arg(Arg::new("path").required(true).help("Snapshot path")),
                ),
        )
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn github_config(args: &ArgMatches) -> Result<GitHubConfig> {
    let owner = args.get_one::<String>("owner").context("missing --owner (or ROADMAP_GITHUB_OWNER)")?;
    let repo = args.get_one::<String>("repo").context("missing --repo (or ROADMAP_GITHUB_REPO)")?;
    let mut config = GitHubConfig::new(owner, repo);
    if let Some(branch) = args.get_one::<String>("branch") {
        config = config.with_branch(branch);
    }
    if let Some(token) = args.get_one::<String>("token") {
        config = config.with_token(token);
    }
    if let Some(api_base) = args.get_one::<String>("api-base") {
        config = config.with_api_base(api_base);
    }
    Ok(config)
}

fn sync_config(args: &ArgMatches) -> SyncConfig {
    let mut config = SyncConfig::new();
    if let Some(path) = args.get_one::<String>("document-path") {
        config = config.with_document_path(path);
    }
    if let Some(dir) = args.get_one::<String>("snapshot-dir") {
        config = config.with_snapshot_dir(dir);
    }
    config
}

fn read_document(path: &Path) -> Result<RoadmapDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    RoadmapDocument::from_json(&text)
        .with_context(|| format!("{} is not a roadmap document", path.display()))
}

fn default_snapshot_name() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn exit_status(outcome: &SaveOutcome) -> u8 {
    match outcome {
        SaveOutcome::Saved { .. } => 0,
        SaveOutcome::ConflictRetryFailed { .. } => EXIT_RELOAD_REQUIRED,
        SaveOutcome::Unavailable { .. } => 1,
    }
}

async fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let remote: Arc<dyn RemoteStore> = Arc::new(
        GitHubRemote::new(github_config(matches)?).context("cannot set up GitHub client")?,
    );
    let config = sync_config(matches);
    tracing::debug!(document = %config.document_path, snapshots = config.snapshot_dir(), "configured");

    match matches.subcommand() {
        Some(("pull", args)) => {
            let mut store = DocumentStore::new(remote, config);
            let document = store.load().await.context("load failed")?;
            let text = document.to_json_pretty()?;
            match args.get_one::<PathBuf>("out") {
                Some(out) => {
                    std::fs::write(out, text)
                        .with_context(|| format!("cannot write {}", out.display()))?;
                    println!("Wrote {} projects to {}", document.projects.len(), out.display());
                }
                None => println!("{text}"),
            }
        }
        Some(("push", args)) => {
            let file = args.get_one::<PathBuf>("file").context("missing --file")?;
            let document = read_document(file)?;
            let mut store = DocumentStore::new(remote, config);
            store.load().await.context("load failed")?;

            let outcome = store.save(&document).await.context("save failed")?;
            match &outcome {
                SaveOutcome::Saved { version, retried } => {
                    if *retried {
                        println!("Saved at {version} (overwrote a concurrent change)");
                    } else {
                        println!("Saved at {version}");
                    }
                }
                SaveOutcome::ConflictRetryFailed { path, cause } => {
                    eprintln!("{path} changed again while saving ({cause}); pull and re-apply");
                }
                SaveOutcome::Unavailable { cause } => {
                    eprintln!("Remote unavailable: {cause}");
                }
            }
            return Ok(ExitCode::from(exit_status(&outcome)));
        }
        Some(("status", _)) => {
            let mut store = DocumentStore::new(remote, config);
            let document = store.load().await.context("load failed")?;
            let pending = store.check_for_remote_update().await;

            println!("Document: {}", store.config().document_path);
            match store.current_version() {
                Some(version) => println!("Version:  {version}"),
                None => println!("Version:  (not saved yet)"),
            }
            println!("Projects: {}", document.projects.len());
            println!("Remote update pending: {}", if pending { "yes" } else { "no" });
        }
        Some(("snapshot", args)) => {
            let snapshots = SnapshotManager::new(remote, config);
            match args.subcommand() {
                Some(("create", create)) => {
                    let name = create
                        .get_one::<String>("name")
                        .cloned()
                        .unwrap_or_else(default_snapshot_name);
                    let created = snapshots.create_snapshot(&name).await?;
                    println!("Created snapshot {} at {}", created.name, created.path);
                }
                Some(("list", _)) => {
                    let listed = snapshots.list_snapshots().await?;
                    if listed.is_empty() {
                        println!("No snapshots");
                    }
                    for snapshot in listed {
                        println!("{}\t{}\t{}", snapshot.name, snapshot.path, snapshot.version.short());
                    }
                }
                Some(("show", show)) => {
                    let path = show.get_one::<String>("path").context("missing snapshot path")?;
                    let document = snapshots.load_snapshot(path).await?;
                    println!("{}", document.to_json_pretty()?);
                }
                _ => anyhow::bail!("unknown snapshot command"),
            }
        }
        _ => anyhow::bail!("unknown command"),
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match run(&matches).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["roadmap-sync", "--owner", "acme", "--repo", "plans"];
        argv.extend_from_slice(args);
        cli().try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn global_flags_map_to_configs() {
        let matches = parse(&[
            "--branch",
            "planning",
            "--document-path",
            "data/roadmap.json",
            "--snapshot-dir",
            "history",
            "status",
        ]);

        let github = github_config(&matches).unwrap();
        assert_eq!(github.owner, "acme");
        assert_eq!(github.repo, "plans");
        assert_eq!(github.branch.as_deref(), Some("planning"));

        let sync = sync_config(&matches);
        assert_eq!(sync.document_path, "data/roadmap.json");
        assert_eq!(sync.snapshot_path("x"), "history/roadmap_x.json");
    }

    #[test]
    fn push_requires_file() {
        let result = cli().try_get_matches_from([
            "roadmap-sync", "--owner", "acme", "--repo", "plans", "push",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn snapshot_create_name_is_optional() {
        let matches = parse(&["snapshot", "create"]);
        let Some(("snapshot", snapshot)) = matches.subcommand() else {
            panic!("expected snapshot subcommand");
        };
        let Some(("create", create)) = snapshot.subcommand() else {
            panic!("expected create subcommand");
        };
        assert!(create.get_one::<String>("name").is_none());
    }

    #[test]
    fn default_snapshot_name_is_a_date() {
        let name = default_snapshot_name();
        assert!(chrono::NaiveDate::parse_from_str(&name, "%Y-%m-%d").is_ok(), "{name}");
    }

    #[test]
    fn read_document_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"projects": [{{"id": "p-1"}}], "settings": {{"theme": "dark"}}}}"#).unwrap();

        let document = read_document(file.path()).unwrap();

        assert_eq!(document.projects.len(), 1);
        assert_eq!(document.settings.theme, "dark");
        assert!(!document.settings.categories.is_empty());
    }

    #[test]
    fn read_document_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = read_document(&path).unwrap_err();

        assert!(format!("{err:#}").contains("missing.json"));
    }

    #[test]
    fn exit_codes_follow_outcome() {
        use roadmap_sync::{RemoteError, VersionToken};

        let saved = SaveOutcome::Saved {
            version: VersionToken::new("abc"),
            retried: false,
        };
        let failed = SaveOutcome::ConflictRetryFailed {
            path: "roadmap.json".to_string(),
            cause: RemoteError::conflict("roadmap.json"),
        };
        let down = SaveOutcome::Unavailable {
            cause: RemoteError::unavailable("down"),
        };

        assert_eq!(exit_status(&saved), 0);
        assert_eq!(exit_status(&failed), 2);
        assert_eq!(exit_status(&down), 1);
    }
}
