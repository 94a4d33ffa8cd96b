use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use comfy_table::{Table, presets::UTF8_FULL};
use dialoguer::{Confirm, Editor as ExternalEditor, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use owo_colors::OwoColorize;
use termimad::MadSkin;
use tokio::io::{AsyncBufReadExt, BufReader};

use wyper::api::{PostsClient, TalkClient};
use wyper::cli::{Args, Command};
use wyper::models::{PostInput, SaveOutcome, SendOutcome};
use wyper::services::editor::preview;
use wyper::services::{ChatClient, DataService, Draft, Editor};
use wyper::settings::{self, Settings};
use wyper::storage::FileStorage;
use wyper::store::{AUTHOR_MARKER, LocalStore, Theme};

use crate::terminal::{TerminalChatView, skin_for};

pub async fn run(args: Args) -> Result<()> {
    let settings = settings::merge_settings_with_args(&args)?;

    let storage = FileStorage::new(settings.data_dir.clone())?;
    let store = Arc::new(
        LocalStore::new(Arc::new(storage)).with_image_base(settings.image_base.clone()),
    );
    if !store.initialize_or_warn() {
        eprintln!(
            "{} Local store in {} is not writable, offline copies are unavailable",
            "⚠".yellow(),
            settings.data_dir.display()
        );
    }

    match args.command {
        Command::Posts => list_posts(&data_service(&settings, &store)?).await,
        Command::Show { slug } => {
            show_post(&data_service(&settings, &store)?, &slug, &skin_for(store.theme())).await
        }
        Command::Edit { slug, no_publish } => {
            require_author(&store)?;
            edit(&data_service(&settings, &store)?, slug, no_publish).await
        }
        Command::Publish { path, slug } => {
            require_author(&store)?;
            publish_file(&data_service(&settings, &store)?, &path, slug).await
        }
        Command::Chat => chat(&settings, store).await,
        Command::Say { message } => say(&settings, store, &message).await,
        Command::Theme { theme } => theme_command(&store, theme),
        Command::Login => {
            store.set_session_user(Some(AUTHOR_MARKER))?;
            println!("{} Authoring unlocked", "✓".bright_green());
            Ok(())
        }
        Command::Logout => {
            store.set_session_user(None)?;
            println!("{} Authoring locked", "✓".bright_green());
            Ok(())
        }
    }
}

fn data_service(settings: &Settings, store: &Arc<LocalStore>) -> Result<DataService<PostsClient>> {
    let api = PostsClient::new(&settings.api_url, settings.request_timeout)?;
    Ok(DataService::new(api, Arc::clone(store)))
}

fn require_author(store: &LocalStore) -> Result<()> {
    if !store.is_author() {
        bail!("Authoring is locked, run `wyper login` first");
    }
    Ok(())
}

async fn list_posts(service: &DataService<PostsClient>) -> Result<()> {
    let posts = service.get_all_posts().await;
    if posts.is_empty() {
        println!("{} No posts yet", "ℹ".blue());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Slug", "Title", "Date", "Tags"]);
    for post in &posts {
        table.add_row(vec![
            post.slug.clone(),
            post.title.clone(),
            post.date.clone(),
            post.tags.join(", "),
        ]);
    }
    println!("{table}");

    Ok(())
}

async fn show_post(service: &DataService<PostsClient>, slug: &str, skin: &MadSkin) -> Result<()> {
    let Some(post) = service.get_post_by_slug(slug).await else {
        println!("{} Post {} not found", "⚠".yellow(), slug.bright_cyan());
        return Ok(());
    };

    println!("{}", post.title.bold());
    println!("{}  {}\n", post.date.dimmed(), post.tags.join(" · ").bright_cyan());
    skin.print_text(&post.content);

    Ok(())
}

async fn edit(
    service: &DataService<PostsClient>,
    slug: Option<String>,
    no_publish: bool,
) -> Result<()> {
    let editor = Editor::new(service);

    let draft = match slug {
        Some(slug) => {
            let post = service
                .get_post_by_slug(&slug)
                .await
                .with_context(|| format!("Post {slug} not found"))?;
            editor.start_editing(&post)?
        }
        None => editor.open_draft(),
    };
    if draft.restored {
        info!("continuing the saved draft");
    }

    let Some(content) = ExternalEditor::new().extension(".md").edit(&draft.content)? else {
        println!("{} Editor closed without saving, draft unchanged", "ℹ".blue());
        return Ok(());
    };

    let draft = Draft { content, ..draft };
    let saved_at = editor.autosave(&draft.content)?;
    println!(
        "{} Draft saved at {}",
        "✓".bright_green(),
        saved_at.format("%H:%M:%S")
    );

    if no_publish {
        return Ok(());
    }

    println!("\n{}\n", preview(&draft.content).dimmed());

    let updating = draft.is_edit_mode();
    let confirmed = Confirm::new()
        .with_prompt(if updating { "Update this post?" } else { "Publish this post?" })
        .default(true)
        .interact()?;
    if !confirmed {
        println!("{} Not published, the draft is kept", "ℹ".blue());
        return Ok(());
    }

    let spinner = spinner("Publishing...");
    let outcome = editor.publish(&draft.content).await;
    spinner.finish_and_clear();

    report_save(outcome?)
}

async fn publish_file(
    service: &DataService<PostsClient>,
    path: &Path,
    slug: Option<String>,
) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut input = PostInput::new(content);
    input.slug = slug;

    let spinner = spinner("Publishing...");
    let outcome = service.save_post(input).await;
    spinner.finish_and_clear();

    report_save(outcome?)
}

fn report_save(outcome: SaveOutcome) -> Result<()> {
    match outcome {
        SaveOutcome::Published(post) => {
            println!(
                "{} Published {}",
                "✓".bright_green(),
                post.slug.bright_cyan()
            );
        }
        SaveOutcome::SavedLocally(post) => {
            let message = format!(
                "Publishing failed. {} is saved locally only and will not be visible to readers.",
                post.slug
            );
            Select::new()
                .with_prompt(message.bright_red().bold().to_string())
                .items(&["OK"])
                .default(0)
                .interact()?;
        }
    }
    Ok(())
}

async fn chat(settings: &Settings, store: Arc<LocalStore>) -> Result<()> {
    let api = TalkClient::new(&settings.api_url, settings.request_timeout)?;
    let session =
        ChatClient::new(api, store).open(Arc::new(TerminalChatView::new()), settings.poll_interval);

    println!(
        "{} Chat open, type a message and press Enter (/quit to leave)",
        "ℹ".blue()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim() == "/quit" {
                    break;
                }
                if let Err(e) = session.send(&line).await {
                    eprintln!("{} {:#}", "⚠".yellow(), e);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.close();
    Ok(())
}

async fn say(settings: &Settings, store: Arc<LocalStore>, message: &str) -> Result<()> {
    let api = TalkClient::new(&settings.api_url, settings.request_timeout)?;
    let session = ChatClient::new(api, store).session(Arc::new(TerminalChatView::new()));

    match session.send(message).await? {
        Some(SendOutcome::Delivered { .. }) => println!("{} Sent", "✓".bright_green()),
        Some(SendOutcome::LocalOnly { .. }) => println!(
            "{} Chat is offline, the message was kept locally",
            "⚠".yellow()
        ),
        None => println!("{} Nothing to send", "ℹ".blue()),
    }

    Ok(())
}

fn theme_command(store: &LocalStore, theme: Option<Theme>) -> Result<()> {
    match theme {
        Some(theme) => {
            store.set_theme(theme)?;
            println!("{} Theme set to {}", "✓".bright_green(), theme);
        }
        None => println!("{}", store.theme()),
    }
    Ok(())
}

fn spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
