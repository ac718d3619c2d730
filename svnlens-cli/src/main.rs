//! SvnLens command-line front end

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use svnlens_core::{Changeset, Commit, NodeKind, QueryConfig, Repository};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "svnlens")]
#[command(author = "SvnLens Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Query revisions, trees, contents and diffs of an svnlens repository")]
struct Cli {
    /// Repository directory
    #[arg(short, long, global = true, env = "SVNLENS_REPO")]
    repo: Option<PathBuf>,

    /// Query configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty repository
    Create { path: PathBuf },

    /// Print the youngest revision
    Youngest,

    /// Show commit metadata of a revision
    Info {
        rev: u64,
        #[arg(long)]
        json: bool,
    },

    /// Show commits of a revision range
    Log {
        from: u64,
        to: u64,
        #[arg(long)]
        json: bool,
    },

    /// Last revision at or below BOUND that changed PATH
    LastRev { path: String, bound: u64 },

    /// Commits that touched PATH within a revision range
    History {
        path: String,
        from: u64,
        to: u64,
        /// Maximum number of commits (0 = unbounded)
        #[arg(short, long, default_value_t = 0)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },

    /// List a directory
    Ls {
        path: String,
        rev: u64,
        #[arg(long)]
        json: bool,
    },

    /// Write file contents to stdout
    Cat { path: String, rev: u64 },

    /// Print file size in bytes
    Size { path: String, rev: u64 },

    /// Print MIME type
    Mime { path: String, rev: u64 },

    /// Print one property value
    Propget { path: String, rev: u64, key: String },

    /// List all properties
    Proplist {
        path: String,
        rev: u64,
        #[arg(long)]
        json: bool,
    },

    /// Unified diff of PATH at REV
    Diff { path: String, rev: u64 },

    /// Commit metadata and changed paths of a revision
    Changeset {
        rev: u64,
        /// Omit content diffs
        #[arg(long)]
        no_diff: bool,
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(debug: bool) {
    let env_filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn open_repository(cli: &Cli) -> Result<Repository> {
    let location = cli
        .repo
        .as_ref()
        .ok_or_else(|| anyhow!("No repository given (use --repo or SVNLENS_REPO)"))?;
    let config = match &cli.config {
        Some(path) => QueryConfig::load(path)?,
        None => QueryConfig::default(),
    };
    Ok(Repository::open_with_config(location, config)?)
}

fn print_json<T: serde::Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn print_commit(out: &mut impl Write, commit: &Commit) -> Result<()> {
    writeln!(out, "------------------------------------------------------------------------")?;
    writeln!(
        out,
        "r{} | {} | {}",
        commit.revision,
        commit.author,
        commit.timestamp.format("%Y-%m-%d %H:%M:%S %z")
    )?;
    writeln!(out)?;
    writeln!(out, "{}", commit.log)?;
    Ok(())
}

fn print_changeset(out: &mut impl Write, changeset: &Changeset) -> Result<()> {
    print_commit(out, &changeset.commit)?;
    writeln!(out, "Changed paths:")?;
    for (code, change) in changeset.summary() {
        match &change.copy_from {
            Some(source) => writeln!(
                out,
                "   {} /{} (from /{}:{})",
                code, change.path, source.path, source.rev
            )?,
            None => writeln!(out, "   {} /{}", code, change.path)?,
        }
    }
    for change in changeset.changed_paths.values() {
        if !change.diff.is_empty() {
            writeln!(out)?;
            write!(out, "{}", change.diff)?;
        }
    }
    Ok(())
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    if let Commands::Create { path } = &cli.command {
        let repo = Repository::create(path)?;
        writeln!(out, "Created repository at {} (UUID: {})", path.display(), repo.uuid()?)?;
        return Ok(());
    }

    let mut repo = open_repository(&cli)?;
    match cli.command {
        Commands::Create { .. } => {}

        Commands::Youngest => writeln!(out, "{}", repo.latest_revision()?)?,

        Commands::Info { rev, json } => {
            let commit = repo.commit_info(rev)?;
            if json {
                print_json(out, &commit)?;
            } else {
                print_commit(out, &commit)?;
            }
        }

        Commands::Log { from, to, json } => {
            let commits = repo.commits(from, to)?;
            if json {
                print_json(out, &commits)?;
            } else {
                for commit in &commits {
                    print_commit(out, commit)?;
                }
            }
        }

        Commands::LastRev { path, bound } => {
            writeln!(out, "{}", repo.last_path_rev(&path, bound)?)?
        }

        Commands::History { path, from, to, limit, json } => {
            let commits = repo.history(&path, from, to, limit)?;
            if json {
                print_json(out, &commits)?;
            } else {
                for commit in &commits {
                    print_commit(out, commit)?;
                }
            }
        }

        Commands::Ls { path, rev, json } => {
            let entries = repo.tree(&path, rev)?;
            if json {
                print_json(out, &entries)?;
            } else {
                for entry in &entries {
                    let suffix = match entry.kind {
                        NodeKind::Directory => "/",
                        NodeKind::File => "",
                    };
                    writeln!(
                        out,
                        "{:>7} {:>10} {}{}",
                        entry.created_rev, entry.size, entry.name, suffix
                    )?;
                }
            }
        }

        Commands::Cat { path, rev } => {
            let mut stream = repo.file_content(&path, rev)?;
            io::copy(&mut stream, out).context("Failed to write file contents")?;
            stream.close();
        }

        Commands::Size { path, rev } => writeln!(out, "{}", repo.file_size(&path, rev)?)?,

        Commands::Mime { path, rev } => writeln!(out, "{}", repo.mime_type(&path, rev)?)?,

        Commands::Propget { path, rev, key } => {
            writeln!(out, "{}", repo.prop_get(&path, rev, &key)?)?
        }

        Commands::Proplist { path, rev, json } => {
            let props = repo.prop_list(&path, rev)?;
            if json {
                print_json(out, &props)?;
            } else {
                writeln!(out, "Properties on '{}':", path)?;
                for (key, value) in &props {
                    writeln!(out, "  {} : {}", key, value)?;
                }
            }
        }

        Commands::Diff { path, rev } => write!(out, "{}", repo.diff(&path, rev)?)?,

        Commands::Changeset { rev, no_diff, json } => {
            let changeset = repo.changeset(rev, no_diff)?;
            if json {
                print_json(out, &changeset)?;
            } else {
                print_changeset(out, &changeset)?;
            }
        }
    }

    repo.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    info!("svnlens {}", env!("CARGO_PKG_VERSION"));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn run_args(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(args)?;
        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_changeset_flags() {
        let args = ["svnlens", "--repo", "/tmp/r", "changeset", "9", "--no-diff", "--json"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.repo, Some(PathBuf::from("/tmp/r")));
        assert!(matches!(cli.command, Commands::Changeset { rev: 9, no_diff: true, json: true }));
    }

    #[test]
    fn test_create_then_query() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        let repo = repo.to_str().unwrap();

        let created = run_args(&["svnlens", "create", repo]).unwrap();
        assert!(created.starts_with("Created repository at"));

        assert_eq!(run_args(&["svnlens", "--repo", repo, "youngest"]).unwrap(), "0\n");
        assert_eq!(run_args(&["svnlens", "--repo", repo, "ls", "/", "0"]).unwrap(), "");

        let json = run_args(&["svnlens", "--repo", repo, "info", "0", "--json"]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["revision"], 0);

        assert!(run_args(&["svnlens", "--repo", repo, "info", "1"]).is_err());
    }

    #[test]
    fn test_missing_repo_is_an_error() {
        let cli = Cli::try_parse_from(["svnlens", "youngest"]).unwrap();
        if cli.repo.is_none() {
            let mut out = Vec::new();
            assert!(run(cli, &mut out).is_err());
        }
    }
}
