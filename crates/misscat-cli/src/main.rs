use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use misscat_core::models::{DisplayItem, FeedEvent, TimelineKind, TimelineQuery};
use misscat_core::timeline::HistoryLoader;
use misscat_core::{CoreConfig, Credential, HttpApi, MessageHistoryLoader, MisskeyApi, SessionCache};
use tokio::sync::mpsc;
use tracing::debug;

mod tracing_setup;

#[derive(Parser)]
#[command(name = "misscat")]
#[command(about = "Fetch Misskey timelines and message history")]
struct Cli {
    /// Path to JSON config file (instance_url, page_size, ...)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load one page of a timeline
    Timeline {
        /// home, local, social, global, user, list or search
        kind: TimelineKind,
        #[arg(long, short = 'n')]
        limit: Option<u32>,
        /// Only posts older than this id
        #[arg(long)]
        until: Option<String>,
        /// Reload newer posts down to this already-seen id
        #[arg(long)]
        reload_from: Option<String>,
        /// Target user id for the user timeline
        #[arg(long)]
        user: Option<String>,
        /// Target list id for the list timeline
        #[arg(long)]
        list: Option<String>,
        /// Search text
        #[arg(long, short = 'q')]
        query: Option<String>,
        /// User timeline: leave out replies
        #[arg(long)]
        no_replies: bool,
        /// User timeline: only posts with files
        #[arg(long)]
        only_files: bool,
    },

    /// List direct-message conversations
    Messages,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_setup::init_tracing()?;
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    let token = std::env::var("MISSCAT_TOKEN").context("MISSCAT_TOKEN is not set")?;
    let api: Arc<dyn MisskeyApi> = Arc::new(HttpApi::new(&config, Credential::new(token))?);
    debug!(instance = %config.instance_url, "using instance");

    match cli.command {
        Commands::Timeline {
            kind,
            limit,
            until,
            reload_from,
            user,
            list,
            query,
            no_replies,
            only_files,
        } => {
            let mut request = TimelineQuery::new(kind)
                .with_replies(!no_replies)
                .only_files(only_files);
            request.user_id = user;
            request.list_id = list;
            request.search = query;
            if let Some(limit) = limit {
                request = request.with_limit(limit);
            }
            if let Some(until) = until {
                request = request.until(until);
            }
            if let Some(last_seen) = reload_from {
                request = request.reloading_from(last_seen);
            }
            print_timeline(&config, api, request).await
        }
        Commands::Messages => print_messages(&config, api).await,
    }
}

/// `--config` wins, then the per-user config file, then the environment
fn load_config(path: Option<&PathBuf>) -> Result<CoreConfig> {
    if let Some(path) = path {
        return CoreConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()));
    }

    if let Some(default_path) = dirs::config_dir().map(|dir| dir.join("misscat").join("config.json")) {
        if default_path.exists() {
            return CoreConfig::from_file(&default_path)
                .with_context(|| format!("loading config from {}", default_path.display()));
        }
    }

    Ok(CoreConfig::from_env()?)
}

async fn print_timeline(
    config: &CoreConfig,
    api: Arc<dyn MisskeyApi>,
    query: TimelineQuery,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(config.feed_capacity);
    let loader = HistoryLoader::new(api).with_page_size(config.page_size);
    tokio::spawn(async move {
        loader.run(&query, &tx).await;
    });

    while let Some(event) = rx.recv().await {
        match event {
            FeedEvent::Item(item) => println!("{}", describe(&item)),
            FeedEvent::EmptyPage => println!("(no more posts)"),
            FeedEvent::Completed => break,
            FeedEvent::Failed(e) => bail!(e),
        }
    }
    Ok(())
}

async fn print_messages(config: &CoreConfig, api: Arc<dyn MisskeyApi>) -> Result<()> {
    let loader = MessageHistoryLoader::new(config, api, SessionCache::new());
    let mut rx = loader.load_history();

    while let Some(event) = rx.recv().await {
        match event {
            FeedEvent::Item(summary) => println!(
                "{} {}{}: {}",
                summary.created_at.format("%Y-%m-%d %H:%M"),
                summary.display_name,
                if summary.is_read { "" } else { " *" },
                summary.latest_message.as_deref().unwrap_or("")
            ),
            FeedEvent::EmptyPage => {}
            FeedEvent::Completed => break,
            FeedEvent::Failed(e) => bail!(e),
        }
    }
    Ok(())
}

fn describe(item: &DisplayItem) -> String {
    match item {
        DisplayItem::Post(cell) => {
            let prefix = if cell.is_reply_target { "  in reply to " } else { "" };
            let quote = cell
                .quoted
                .as_ref()
                .map(|q| format!(" [quoting {}]", q.post_id))
                .unwrap_or_default();
            let poll = cell
                .poll
                .as_ref()
                .map(|p| format!(" [poll, {} votes]", p.total_votes()))
                .unwrap_or_default();
            format!(
                "{}{} {} {}: {}{}{}",
                prefix,
                cell.created_at.format("%Y-%m-%d %H:%M"),
                cell.post_id,
                cell.author.acct(),
                cell.content_warning.as_deref().unwrap_or(&cell.text),
                quote,
                poll
            )
        }
        DisplayItem::BoostHeader {
            booster,
            boosted_post_id,
        } => format!("{} boosted {}", booster.acct(), boosted_post_id),
        DisplayItem::PromotionHeader { post_id } => format!("[promoted] {}", post_id),
    }
}
