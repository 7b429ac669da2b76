use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use skillgate_agent::{Agent, AgentEvent, SessionStore};
use skillgate_core::logging::{self, LoggingConfig};
use skillgate_core::{Config, SessionConfig, SessionId, TransitionMode};
use skillgate_middleware::{ActivationInterceptor, Interception, ToolOrigin, ToolSurface, ToolSurfaceResolver};
use skillgate_providers::{MockProvider, ToolCall};
use skillgate_skills::{
    IssueSeverity, LoadReport, PermissionContext, SessionSkillState, SkillCatalog, SkillLoader, activation_tool_name,
    validate_bundle,
};
use skillgate_tools::{base_tool_specs, default_registry};

/// skillgate - on-demand skill activation for tool-calling agents
#[derive(Parser, Debug)]
#[command(name = "skillgate")]
#[command(about = "Inspect skill bundles and preview per-session tool surfaces", long_about = None)]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to skillgate.toml (default: ./skillgate.toml, defaults if missing)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skill bundle directory, replacing the configured list and the global directory
    #[arg(short, long, value_name = "DIR")]
    skills_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every skill in the catalog
    List {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search skills by name, description and tags
    Search {
        /// Substring to match against ids and descriptions
        #[arg(value_name = "QUERY", default_value = "")]
        query: String,

        /// Only skills carrying at least one of these tags
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Check one bundle, or every bundle under a directory
    Validate {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
    /// Show configuration, loaded skills and executor coverage
    Status,
    /// Replay activations and print the resulting tool surface
    Surface(SessionArgs),
    /// Drive one turn with a scripted mock model
    Replay {
        /// TOML script of model responses
        #[arg(long, value_name = "PATH")]
        script: PathBuf,

        /// User message for the turn
        #[arg(short, long, default_value = "Hello")]
        message: String,

        #[command(flatten)]
        session: SessionArgs,
    },
    /// Write an example skillgate.toml
    Init {
        #[arg(value_name = "PATH", default_value = "skillgate.toml")]
        path: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Per-session overrides shared by `surface` and `replay`
#[derive(clap::Args, Debug, Default)]
struct SessionArgs {
    /// Transition policy: replace, accumulate or fifo
    #[arg(long, value_parser = parse_mode)]
    mode: Option<TransitionMode>,

    /// FIFO capacity
    #[arg(long)]
    capacity: Option<usize>,

    /// Grant a restricted skill (repeatable)
    #[arg(short, long = "grant", value_name = "SKILL")]
    grants: Vec<String>,

    /// Grant every restricted skill
    #[arg(long)]
    wildcard: bool,

    /// Activate a skill before printing (repeatable, applied in order)
    #[arg(short, long = "activate", value_name = "SKILL")]
    activate: Vec<String>,

    /// Machine-readable output
    #[arg(long)]
    json: bool,
}

impl SessionArgs {
    fn session_config(&self, config: &Config) -> SessionConfig {
        SessionConfig {
            mode: self.mode.unwrap_or(config.session.mode),
            capacity: self.capacity.unwrap_or(config.session.capacity),
        }
    }

    fn permissions(&self, config: &Config) -> PermissionContext {
        if self.wildcard || config.permissions.wildcard {
            return PermissionContext::all();
        }
        PermissionContext::granting(config.permissions.grants.iter().chain(&self.grants).cloned())
    }
}

fn parse_mode(s: &str) -> std::result::Result<TransitionMode, String> {
    s.parse().map_err(|e: skillgate_core::Error| e.to_string())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from("skillgate.toml"));
    let mut config = Config::load(Some(&config_path)).context("Failed to load config")?;
    if let Some(dir) = &cli.skills_dir {
        config.skills.dirs = vec![dir.clone()];
        config.skills.include_global = false;
    }

    let mut logging_config = LoggingConfig::from(config.logging.clone());
    if cli.verbose {
        logging_config = logging_config.with_level("info");
    }
    let _guard = logging::init_logging(Some(logging_config)).context("Failed to initialize logging")?;

    if cli.verbose {
        println!("{} Using config: {}", "Info:".blue().bold(), config_path.display());
    }

    match cli.command {
        Commands::List { json } => cmd_list(&config, json)?,
        Commands::Search { query, tags } => cmd_search(&config, &query, &tags)?,
        Commands::Validate { dir } => cmd_validate(&dir)?,
        Commands::Status => cmd_status(&config, &config_path)?,
        Commands::Surface(args) => cmd_surface(&config, &args)?,
        Commands::Replay { script, message, session } => cmd_replay(&config, &script, &message, &session)?,
        Commands::Init { path } => cmd_init(&path)?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "skillgate", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Discover bundles and build the catalog. A catalog error aborts the command.
fn load_catalog(config: &Config) -> Result<(Arc<SkillCatalog>, LoadReport)> {
    let mut report = SkillLoader::from_config(&config.skills).load_all();
    for failure in &report.failures {
        eprintln!("{} {}: {}", "Warning:".yellow().bold(), failure.path.display(), failure.error);
    }

    let skills = std::mem::take(&mut report.skills);
    let catalog = SkillCatalog::new(base_tool_specs(), skills).context("Failed to build skill catalog")?;
    Ok((Arc::new(catalog), report))
}

fn cmd_list(config: &Config, json: bool) -> Result<()> {
    let (catalog, _) = load_catalog(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(catalog.list())?);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("{} No skills found in {:?}", "Info:".yellow().bold(), config.skills.dirs);
        return Ok(());
    }

    println!("{}", "Skills".green().bold().underline());
    for skill in catalog.list() {
        let visibility = if skill.is_restricted() {
            skill.visibility.to_string().red().to_string()
        } else {
            skill.visibility.to_string().green().to_string()
        };
        println!("  {} v{} [{}]", skill.id.cyan().bold(), skill.version, visibility);
        println!("    {}", skill.description);
        println!("    tools: {}", skill.tool_names().collect::<Vec<_>>().join(", "));
    }
    Ok(())
}

fn cmd_search(config: &Config, query: &str, tags: &[String]) -> Result<()> {
    let (catalog, _) = load_catalog(config)?;
    let matches = catalog.search(query, tags);

    if matches.is_empty() {
        println!("{} No skills match", "Info:".yellow().bold());
        return Ok(());
    }

    for skill in matches {
        let tags = if skill.tags.is_empty() { String::new() } else { format!(" ({})", skill.tags.join(", ")) };
        println!("  {}{} - {}", skill.id.cyan(), tags.dimmed(), skill.description);
    }
    Ok(())
}

fn cmd_validate(dir: &Path) -> Result<()> {
    let bundles = if dir.join("SKILL.md").exists() { vec![dir.to_path_buf()] } else { SkillLoader::discover_in_dir(dir) };
    if bundles.is_empty() {
        anyhow::bail!("No skill bundles found under {}", dir.display());
    }

    let mut errors = 0;
    for bundle in &bundles {
        let issues = validate_bundle(bundle);
        if issues.is_empty() {
            println!("{} {}", "ok".green().bold(), bundle.display());
            continue;
        }

        println!("{} {}", "..".yellow().bold(), bundle.display());
        for issue in issues {
            match issue.severity {
                IssueSeverity::Error => {
                    errors += 1;
                    println!("    {} {}", "error:".red().bold(), issue.message);
                }
                IssueSeverity::Warning => println!("    {} {}", "warning:".yellow(), issue.message),
            }
        }
    }

    if errors > 0 {
        anyhow::bail!("{} error(s) in {} bundle(s)", errors, bundles.len());
    }
    Ok(())
}

fn cmd_status(config: &Config, config_path: &Path) -> Result<()> {
    let (catalog, report) = load_catalog(config)?;
    let registry = default_registry().context("Failed to build tool registry")?;

    println!("{}", "skillgate Status".green().bold().underline());
    println!();
    println!("{} Configuration", "Info:".blue().bold());
    let source = if config_path.exists() { config_path.display().to_string() } else { "defaults".to_string() };
    println!("  Source: {}", source.cyan());
    println!("  Mode: {}", config.session.mode.cyan());
    if config.session.mode == TransitionMode::Fifo {
        println!("  Capacity: {}", config.session.capacity.to_string().cyan());
    }
    println!("  Skill dirs:");
    for dir in SkillLoader::from_config(&config.skills).dirs() {
        println!("    - {}", dir.display().cyan());
    }

    println!();
    println!("{} Catalog", "Info:".blue().bold());
    println!("  Base tools: {}", catalog.base_tools().len().to_string().cyan());
    println!("  Skills: {}", catalog.len().to_string().cyan());
    for id in &report.disabled {
        println!("    - {} {}", id, "(disabled)".dimmed());
    }
    for path in &report.shadowed {
        println!("    - {} {}", path.display(), "(shadowed)".dimmed());
    }
    if !report.is_clean() {
        println!("  Load failures: {}", report.failures.len().to_string().red());
    }

    let missing = registry.missing_executors(&catalog);
    println!();
    println!("{} Executors", "Info:".blue().bold());
    println!("  Registered: {}", registry.list().join(", "));
    if missing.is_empty() {
        println!("  {}", "Every catalog tool has an executor".green());
    } else {
        println!("  {} {}", "Missing:".red().bold(), missing.join(", "));
    }
    Ok(())
}

fn cmd_surface(config: &Config, args: &SessionArgs) -> Result<()> {
    let (catalog, _) = load_catalog(config)?;
    let interceptor = ActivationInterceptor::new(ToolSurfaceResolver::new(catalog));
    let permissions = args.permissions(config);
    let mut state =
        SessionSkillState::from_config(&args.session_config(config)).context("Invalid session settings")?;

    for (index, id) in args.activate.iter().enumerate() {
        let call = ToolCall::new(format!("cli_{index}"), activation_tool_name(id), serde_json::json!({}));
        match interceptor.handle(&mut state, &permissions, &call) {
            Interception::Activated(result) if !args.json => {
                let dropped = result.transition.dropped();
                if dropped.is_empty() {
                    println!("{} activated {}", "+".green().bold(), id.cyan());
                } else {
                    println!("{} activated {} (dropped {})", "+".green().bold(), id.cyan(), dropped.join(", "));
                }
            }
            Interception::Rejected(rejection) if !args.json => {
                println!("{} {}", "x".red().bold(), rejection.message());
            }
            _ => {}
        }
    }

    let surface = interceptor.resolver().resolve(&state, &permissions);
    if args.json {
        let output = serde_json::json!({
            "mode": state.mode().as_str(),
            "active": state.active(),
            "surface": surface,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_surface(&state, &surface);
    }
    Ok(())
}

fn print_surface(state: &SessionSkillState, surface: &ToolSurface) {
    println!();
    println!("{} {} [{}]", "Active:".blue().bold(), state.active().join(", "), state.mode());
    println!("{}", "Tool surface".green().bold().underline());
    for entry in surface.entries() {
        let origin = match &entry.origin {
            ToolOrigin::Base => "base".dimmed().to_string(),
            ToolOrigin::Skill(id) => format!("skill {id}").cyan().to_string(),
            ToolOrigin::Activation(id) => format!("activates {id}").yellow().to_string(),
        };
        println!("  {:<28} {}", entry.spec.name(), origin);
    }
}

fn cmd_replay(config: &Config, script: &Path, message: &str, args: &SessionArgs) -> Result<()> {
    let provider = MockProvider::from_file(script).with_context(|| format!("Failed to load {}", script.display()))?;
    let (catalog, _) = load_catalog(config)?;
    let registry = default_registry().context("Failed to build tool registry")?;
    let sessions = Arc::new(SessionStore::new(args.session_config(config), args.permissions(config)));
    let privacy = LoggingConfig::from(config.logging.clone()).privacy;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let agent = Agent::new(Arc::new(provider), catalog, registry, sessions, config.agent.clone())
        .context("Failed to start orchestrator")?
        .with_privacy(privacy)
        .with_event_sender(tx);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let outcome = runtime.block_on(async {
        let id = SessionId::generate();
        agent.sessions().open(id.clone()).await?;
        for skill in &args.activate {
            if let Interception::Rejected(rejection) = agent.activate(&id, skill).await? {
                eprintln!("{} {}", "Warning:".yellow().bold(), rejection.message());
            }
        }
        agent.run_turn(&id, message).await
    })?;

    while let Ok(event) = rx.try_recv() {
        if args.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            print_event(&event);
        }
    }

    if args.json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        println!();
        println!("{} {:?} after {} model call(s)", "Done:".green().bold(), outcome.stop, outcome.iterations);
        println!("  Active: {}", outcome.active.join(", "));
    }
    Ok(())
}

fn print_event(event: &AgentEvent) {
    match event {
        AgentEvent::ModelRequest { iteration, tools } => {
            println!("{} #{} tools: {}", "model".blue().bold(), iteration, tools.join(", "));
        }
        AgentEvent::SkillActivated { skill_id, dropped, .. } if dropped.is_empty() => {
            println!("  {} activated {}", "+".green().bold(), skill_id.cyan());
        }
        AgentEvent::SkillActivated { skill_id, dropped, .. } => {
            println!("  {} activated {} (dropped {})", "+".green().bold(), skill_id.cyan(), dropped.join(", "));
        }
        AgentEvent::ActivationRejected { skill_id } => {
            println!("  {} activation of {} rejected", "x".red().bold(), skill_id);
        }
        AgentEvent::ToolBlocked { name } => {
            println!("  {} {} is not on the surface", "x".red().bold(), name);
        }
        AgentEvent::ToolResult { name, success, content } => {
            let marker = if *success { "ok".green().to_string() } else { "err".red().to_string() };
            let first_line = content.lines().next().unwrap_or_default();
            println!("  {} {} {}", marker, name.cyan(), first_line.dimmed());
        }
        AgentEvent::Reply { content } => println!("{} {}", "reply".green().bold(), content),
        AgentEvent::IterationLimit { limit } => {
            println!("{} stopped after {} model calls", "Warning:".yellow().bold(), limit);
        }
    }
}

fn cmd_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, Config::example()).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} Created {}", "Success:".green().bold(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO: &str = "---\nname: hello_world\ndescription: Greetings\ntools:\n  - name: say_hello\n    description: Greet\n---\nSay hello.\n";

    const VAULT: &str = "---\nname: vault\ndescription: Secrets\nvisibility: restricted\ntools:\n  - name: open_vault\n    description: Open\n---\n";

    fn skills_dir() -> TempDir {
        let temp = TempDir::new().unwrap();
        for (name, content) in [("hello_world", HELLO), ("vault", VAULT)] {
            let dir = temp.path().join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("SKILL.md"), content).unwrap();
        }
        temp
    }

    fn config_for(dir: &Path) -> Config {
        let mut config = Config::default();
        config.skills.dirs = vec![dir.to_path_buf()];
        config.skills.include_global = false;
        config
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["skillgate", "status"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.skills_dir.is_none());
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_cli_surface_args() {
        let cli = Cli::try_parse_from([
            "skillgate", "surface", "--mode", "fifo", "--capacity", "2", "-a", "a", "-a", "b", "--grant", "vault",
        ])
        .unwrap();
        let Commands::Surface(args) = cli.command else {
            panic!("Expected Surface command");
        };
        assert_eq!(args.mode, Some(TransitionMode::Fifo));
        assert_eq!(args.capacity, Some(2));
        assert_eq!(args.activate, vec!["a", "b"]);
        assert_eq!(args.grants, vec!["vault"]);
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["skillgate", "surface", "--mode", "lru"]).is_err());
    }

    #[test]
    fn test_cli_replay_command() {
        let cli = Cli::try_parse_from(["skillgate", "replay", "--script", "demo.toml", "-m", "hi"]).unwrap();
        let Commands::Replay { script, message, .. } = cli.command else {
            panic!("Expected Replay command");
        };
        assert_eq!(script, PathBuf::from("demo.toml"));
        assert_eq!(message, "hi");
    }

    #[test]
    fn test_session_args_permissions() {
        let mut config = Config::default();
        config.permissions.grants = vec!["vault".to_string()];

        let args = SessionArgs { grants: vec!["files".to_string()], ..SessionArgs::default() };
        let permissions = args.permissions(&config);
        assert!(permissions.is_granted("vault"));
        assert!(permissions.is_granted("files"));
        assert!(!permissions.is_granted("other"));

        let args = SessionArgs { wildcard: true, ..SessionArgs::default() };
        assert!(args.permissions(&config).is_wildcard());
    }

    #[test]
    fn test_session_args_override_config() {
        let config = Config::default();
        let args = SessionArgs { mode: Some(TransitionMode::Accumulate), ..SessionArgs::default() };
        let session = args.session_config(&config);
        assert_eq!(session.mode, TransitionMode::Accumulate);
        assert_eq!(session.capacity, config.session.capacity);
    }

    #[test]
    fn test_load_catalog() {
        let temp = skills_dir();
        let (catalog, report) = load_catalog(&config_for(temp.path())).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(report.is_clean());
        assert!(catalog.contains("vault"));
    }

    #[test]
    fn test_load_catalog_duplicate_tool_fails() {
        let temp = skills_dir();
        let dir = temp.path().join("hello_again");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("SKILL.md"), HELLO.replace("name: hello_world", "name: hello_again")).unwrap();

        assert!(load_catalog(&config_for(temp.path())).is_err());
    }

    #[test]
    fn test_cmd_surface() {
        let temp = skills_dir();
        let args = SessionArgs { activate: vec!["hello_world".to_string(), "vault".to_string()], ..SessionArgs::default() };
        assert!(cmd_surface(&config_for(temp.path()), &args).is_ok());

        let args = SessionArgs { json: true, ..args };
        assert!(cmd_surface(&config_for(temp.path()), &args).is_ok());
    }

    #[test]
    fn test_cmd_surface_rejects_zero_capacity() {
        let temp = skills_dir();
        let args = SessionArgs { mode: Some(TransitionMode::Fifo), capacity: Some(0), ..SessionArgs::default() };
        assert!(cmd_surface(&config_for(temp.path()), &args).is_err());
    }

    #[test]
    fn test_cmd_validate() {
        let temp = skills_dir();
        assert!(cmd_validate(temp.path()).is_ok());
        assert!(cmd_validate(&temp.path().join("hello_world")).is_ok());

        let broken = temp.path().join("broken");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join("SKILL.md"), "no frontmatter").unwrap();
        assert!(cmd_validate(temp.path()).is_err());
    }

    #[test]
    fn test_cmd_validate_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(cmd_validate(temp.path()).is_err());
    }

    #[test]
    fn test_cmd_replay() {
        let temp = skills_dir();
        let script = temp.path().join("script.toml");
        std::fs::write(
            &script,
            "[[responses]]\ntype = \"toolcall\"\nname = \"skill_hello_world\"\n\n[[responses]]\ntype = \"text\"\ncontent = \"hi\"\n",
        )
        .unwrap();

        let mut config = config_for(temp.path());
        config.agent.require_executors = false;
        assert!(cmd_replay(&config, &script, "hello", &SessionArgs::default()).is_ok());
    }

    #[test]
    fn test_cmd_replay_missing_executor() {
        let temp = skills_dir();
        let script = temp.path().join("script.toml");
        std::fs::write(&script, "responses = []\n").unwrap();

        assert!(cmd_replay(&config_for(temp.path()), &script, "hello", &SessionArgs::default()).is_err());
    }

    #[test]
    fn test_cmd_init() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("skillgate.toml");

        assert!(cmd_init(&path).is_ok());
        assert!(Config::from_file(&path).is_ok());
        assert!(cmd_init(&path).is_err());
    }

    #[test]
    fn test_cmd_status() {
        let temp = skills_dir();
        assert!(cmd_status(&config_for(temp.path()), Path::new("missing.toml")).is_ok());
    }
}
