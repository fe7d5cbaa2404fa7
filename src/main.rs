use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use article_composer::api::{HttpArticleService, RouteTable};
use article_composer::cache::ReferenceDataCache;
use article_composer::compose::{
    ArticleDraftController, Collaborators, ComposeError, ComposerSettings,
};
use article_composer::config::Config;
use article_composer::editor::MarkdownEditorHost;
use article_composer::model::DraftForm;
use article_composer::navigation::{BrowserNavigator, Destination, Navigator, RecordingNavigator};
use article_composer::picker::ListingPicker;

/// Get the config file path (~/.config/article-composer/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("article-composer")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "article-composer", about = "Compose and submit articles to the admin API")]
struct Cli {
    /// Config file (defaults to ~/.config/article-composer/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose an article and submit it
    Compose(ComposeArgs),
}

#[derive(Args, Debug)]
struct ComposeArgs {
    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    sub_title: String,

    #[arg(long)]
    slug: String,

    /// Language id
    #[arg(long, value_name = "ID")]
    language: i64,

    /// Category id to tag the article with (repeatable)
    #[arg(long = "category", value_name = "ID")]
    categories: Vec<i64>,

    /// Keyword (repeatable)
    #[arg(long = "keyword", value_name = "TEXT")]
    keywords: Vec<String>,

    /// Markdown file with the article body
    #[arg(long, value_name = "FILE")]
    body: Option<PathBuf>,

    /// Image id to use as the cover
    #[arg(long, value_name = "ID")]
    cover_image: Option<String>,

    /// Image id to append to the body (repeatable)
    #[arg(long = "inline-image", value_name = "ID")]
    inline_images: Vec<String>,

    #[arg(long)]
    published: bool,

    /// Start a discussion thread after publishing
    #[arg(long)]
    forum_published: bool,

    /// Open the discussion URL in the browser
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    match cli.command {
        Command::Compose(args) => compose(&config, args).await,
    }
}

async fn compose(config: &Config, args: ComposeArgs) -> Result<()> {
    let body = match &args.body {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read body file: {}", path.display()))?,
        None => String::new(),
    };

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let http_client = reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let routes = RouteTable::new(&config.api_base_url, &config.routes)
        .context("Invalid API base URL")?;
    let service = HttpArticleService::new(http_client, routes, timeout);

    let picker = ListingPicker::new(service.clone());
    let navigator: Arc<dyn Navigator> = if args.open {
        Arc::new(BrowserNavigator)
    } else {
        Arc::new(RecordingNavigator::new())
    };

    let collaborators = Collaborators {
        service: Arc::new(service),
        cache: ReferenceDataCache::new(config.cache_capacity),
        picker: Arc::new(picker.clone()),
        navigator,
        editor_host: Arc::new(MarkdownEditorHost::new(body)),
    };
    let settings = ComposerSettings {
        discuss_url: config.discuss_url.clone(),
        editor: config.editor.clone(),
    };

    let (mut controller, mut events) = ArticleDraftController::new(collaborators, settings)
        .context("Failed to set up composer")?;
    controller.load_reference_data();
    controller
        .wait_until_ready(&mut events)
        .await
        .context("Failed to load reference data")?;

    for id in &args.categories {
        if controller.toggle_category(*id).is_none() {
            anyhow::bail!("Unknown category id {id}");
        }
    }
    for keyword in &args.keywords {
        controller.keywords_mut().push(keyword);
    }

    for id in &args.inline_images {
        picker.enqueue(Some(id.clone()));
        if !controller.insert_inline_image().await? {
            anyhow::bail!("Image {id} not found in the image listing");
        }
    }
    if let Some(id) = &args.cover_image {
        picker.enqueue(Some(id.clone()));
        if !controller.choose_cover_image().await {
            anyhow::bail!("Cover image {id} not found in the image listing");
        }
    }

    let form = DraftForm {
        title: args.title,
        sub_title: args.sub_title,
        published: args.published,
        language_id: args.language,
        slug: args.slug,
        forum_published: args.forum_published,
    };

    let destination = match controller.submit(&form).await {
        Ok(destination) => destination,
        Err(ComposeError::Navigation(e)) => {
            // Stored; only the browser hand-off failed
            eprintln!("Article saved, but navigation failed: {e}");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to submit article"),
    };

    match &destination {
        Destination::Discussion(url) => println!("Article saved. Start the discussion at {url}"),
        Destination::ArticleList => println!("Article saved. Back to {destination}"),
    }

    controller.teardown();
    Ok(())
}
