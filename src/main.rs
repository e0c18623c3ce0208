use anyhow::{bail, Context, Result};
use practice_core::api::{PracticeApi, TopicList};
use practice_core::bus::{AppEvent, BroadcastBus, EventBus};
use practice_core::config::Config;
use practice_core::editor::{EditorSession, Language};
use practice_core::fetch::http::ReqwestTransport;
use practice_core::practice::ProblemLoader;
use practice_core::prefs::{
    AppTheme, EditorTheme, FileStore, Preferences, EDITOR_AUTO_SUGGEST_KEY, EDITOR_FONT_KEY,
    EDITOR_LANG_KEY, EDITOR_THEME_KEY, THEME_KEY,
};
use practice_core::sidebar::{Display, Sidebar};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const USAGE: &str = "\
usage:
  practice-core recent|all [--search TEXT] [--category NAME] [--difficulty LEVEL] [--refresh]
  practice-core practice <topic>
  practice-core convert <file> <javascript|python|java|cpp>
  practice-core prefs
  practice-core prefs set <key> <value>";

struct App {
    config: Config,
    api: Arc<PracticeApi>,
    bus: Arc<BroadcastBus>,
    prefs: Preferences,
}

impl App {
    fn build(config: Config) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        let api = Arc::new(PracticeApi::new(
            transport,
            &config.api.base_url,
            config.retry.clone(),
        )?);
        let bus = Arc::new(BroadcastBus::new());
        let store = Arc::new(FileStore::open(&config.preferences.path)?);
        let prefs = Preferences::new(store, bus.clone());
        Ok(Self {
            config,
            api,
            bus,
            prefs,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    Config::load_env_file();
    let config = Config::load(Path::new("config.toml"))?;

    let log_file = std::fs::File::create(&config.logging.file).with_context(|| {
        format!("Failed to create log file: {}", config.logging.file.display())
    })?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let app = App::build(config)?;
    tracing::info!(command = %command, base_url = %app.api.base_url(), "starting");

    match command.as_str() {
        "recent" => list_topics(&app, TopicList::Recent, &args[1..]).await,
        "all" => list_topics(&app, TopicList::All, &args[1..]).await,
        "practice" => match args.get(1) {
            Some(topic) => practice(&app, topic).await,
            None => bail!("practice needs a topic\n{}", USAGE),
        },
        "convert" => match (args.get(1), args.get(2)) {
            (Some(file), Some(lang)) => convert(&app, Path::new(file), lang.parse()?).await,
            _ => bail!("convert needs a file and a language\n{}", USAGE),
        },
        "prefs" => match (args.get(1).map(String::as_str), args.get(2), args.get(3)) {
            (None, _, _) => {
                show_prefs(&app.prefs);
                Ok(())
            }
            (Some("set"), Some(key), Some(value)) => set_pref(&app.prefs, key, value),
            _ => bail!("unknown prefs command\n{}", USAGE),
        },
        other => bail!("unknown command: {}\n{}", other, USAGE),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn sidebar(app: &App) -> Sidebar {
    Sidebar::new(
        app.api.clone(),
        app.config.sidebar.cache_ttl(),
        app.prefs.app_theme(),
        app.bus.as_ref(),
    )
}

async fn list_topics(app: &App, list: TopicList, args: &[String]) -> Result<()> {
    let mut sidebar = sidebar(app);
    if let Some(search) = flag_value(args, "--search") {
        sidebar.set_search(search);
    }
    if let Some(category) = flag_value(args, "--category") {
        sidebar.set_category(category);
    }
    if let Some(difficulty) = flag_value(args, "--difficulty") {
        sidebar.set_difficulty(difficulty);
    }

    sidebar.set_view(list);
    sidebar.open();
    if args.iter().any(|a| a == "--refresh") && !sidebar.has_pending() {
        sidebar.refresh(list);
    }
    sidebar.settle().await;

    let now = chrono::Utc::now();
    match sidebar.display(list) {
        Display::Loading => println!("  Loading..."),
        Display::Error(msg) => println!("  {}", msg),
        Display::NoData => match list {
            TopicList::Recent => println!("  No recent topics yet."),
            TopicList::All => println!("  No topics available."),
        },
        Display::NoMatches { filters_active } => {
            println!("  No topics match your filters.");
            if filters_active {
                println!("  (drop --search/--category/--difficulty to see everything)");
            }
        }
        Display::Topics(topics) => {
            for topic in topics {
                let mut line = format!("  {:<32}", topic.display_name());
                if let Some(category) = &topic.category {
                    line.push_str(&format!(" {:<20}", category));
                }
                if let Some(difficulty) = &topic.difficulty {
                    line.push_str(&format!(" {:<8}", difficulty));
                }
                if let Some(label) = topic.last_used_label(now) {
                    line.push_str(&format!(" {}", label));
                }
                println!("{}", line.trim_end());
            }
        }
    }
    if list == TopicList::All {
        println!();
        println!("  categories: {}", sidebar.available_categories().join(", "));
        println!("  difficulties: {}", sidebar.available_difficulties().join(", "));
    }
    Ok(())
}

async fn practice(app: &App, topic: &str) -> Result<()> {
    let loader = ProblemLoader::new(app.api.clone(), app.bus.clone());
    let mut events = app.bus.subscribe(&[]);
    let mut sidebar = sidebar(app);
    let result = sidebar
        .practice(&loader, topic, &CancellationToken::new())
        .await;

    while let Some(event) = events.try_recv() {
        match event {
            AppEvent::ShowLoading(on) => tracing::debug!(on, "loading"),
            AppEvent::ShowError(msg) => println!("  {}", msg),
            AppEvent::UpdateProblemData(problem) => {
                println!("  {} [{}]", problem.title, problem.difficulty);
                println!(
                    "  time {}  space {}",
                    problem.time_complexity, problem.space_complexity
                );
                println!();
                println!("{}", problem.description);
            }
            AppEvent::ThemeChanged { .. } => {}
        }
    }
    result.map(|_| ()).map_err(Into::into)
}

async fn convert(app: &App, file: &Path, target: Language) -> Result<()> {
    let code = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut session = EditorSession::new(app.prefs.clone());
    session.set_code(code);
    let from = session.language();

    if !session
        .change_language(&app.api, target, &CancellationToken::new())
        .await
    {
        match session.error() {
            Some(err) => bail!("{}", err),
            None => bail!("already using {}", from.label()),
        }
    }
    println!("{}", session.code());
    Ok(())
}

fn show_prefs(prefs: &Preferences) {
    let editor = prefs.editor();
    println!("  {:<22} {}", EDITOR_LANG_KEY, editor.language);
    println!("  {:<22} {}", EDITOR_FONT_KEY, editor.font_size);
    println!("  {:<22} {}", EDITOR_THEME_KEY, editor.editor_theme.as_str());
    println!("  {:<22} {}", EDITOR_AUTO_SUGGEST_KEY, editor.auto_suggest);
    println!("  {:<22} {}", THEME_KEY, prefs.app_theme());
}

fn set_pref(prefs: &Preferences, key: &str, value: &str) -> Result<()> {
    match key {
        EDITOR_LANG_KEY => prefs.set_language(value.parse()?)?,
        EDITOR_FONT_KEY => {
            let requested: i64 = value
                .parse()
                .with_context(|| format!("font size must be a number: {}", value))?;
            let stored = prefs.set_font_size(requested)?;
            if stored as i64 != requested {
                println!("  font size clamped to {}", stored);
            }
        }
        EDITOR_THEME_KEY => match EditorTheme::parse(value) {
            Some(theme) => prefs.set_editor_theme(theme)?,
            None => bail!("editor theme must be vs-dark or light"),
        },
        EDITOR_AUTO_SUGGEST_KEY => match value {
            "true" => prefs.set_auto_suggest(true)?,
            "false" => prefs.set_auto_suggest(false)?,
            _ => bail!("auto-suggest must be true or false"),
        },
        THEME_KEY => match AppTheme::parse(value) {
            Some(theme) => prefs.set_app_theme(theme)?,
            None => bail!("theme must be light or dark"),
        },
        other => bail!("unknown preference: {}", other),
    }
    show_prefs(prefs);
    Ok(())
}
