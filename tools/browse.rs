mod config;

use std::collections::BTreeSet;
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use collection::{
    Browser, FilterField, FilterSpec, HttpTrackService, RedbBackend, ScanSource, SettingsStore,
    SortField, SortKey,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{config_path_from_env, load_or_create_config, resolve_path};

enum Action {
    Filter(FilterSpec),
    ResetFilter,
    Sort(SortKey),
    ResetOrder,
    Next,
    Prev,
    PageSize(usize),
    TogglePanel,
    AddGenre(String),
    Select(BTreeSet<String>),
    Tag {
        track_id: String,
        genre: String,
        included: bool,
    },
}

fn usage() -> &'static str {
    "usage: browse [--fresh] [--filter FIELD:KEYWORD] [--reset-filter] [--sort FIELD] \
     [--reset-order] [--next] [--prev] [--page-size N] [--toggle-genres] \
     [--add-genre NAME] [--select G1,G2] [--tag ID GENRE] [--untag ID GENRE]"
}

type ParsedArgs = (bool, Vec<Action>);

fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<ParsedArgs, Box<dyn std::error::Error>> {
    let mut fresh = false;
    let mut actions = Vec::new();
    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| format!("{} needs a value", name))
        };
        match arg.as_str() {
            "--fresh" => fresh = true,
            "--filter" => {
                let raw = value("--filter")?;
                let (field, keyword) = raw.split_once(':').unwrap_or(("any", raw.as_str()));
                actions.push(Action::Filter(FilterSpec::new(
                    FilterField::parse(field)?,
                    keyword,
                )));
            }
            "--reset-filter" => actions.push(Action::ResetFilter),
            "--sort" => {
                let field = SortField::parse(&value("--sort")?)?;
                actions.push(Action::Sort(SortKey::new(field, field.default_kind())));
            }
            "--reset-order" => actions.push(Action::ResetOrder),
            "--next" => actions.push(Action::Next),
            "--prev" => actions.push(Action::Prev),
            "--page-size" => actions.push(Action::PageSize(value("--page-size")?.parse()?)),
            "--toggle-genres" => actions.push(Action::TogglePanel),
            "--add-genre" => actions.push(Action::AddGenre(value("--add-genre")?)),
            "--select" => {
                let genres = value("--select")?
                    .split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(str::to_string)
                    .collect();
                actions.push(Action::Select(genres));
            }
            "--tag" | "--untag" => {
                let track_id = value(&arg)?;
                let genre = value(&arg)?;
                actions.push(Action::Tag {
                    track_id,
                    genre,
                    included: arg == "--tag",
                });
            }
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument {}\n{}", other, usage()).into()),
        }
    }
    Ok((fresh, actions))
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (fresh, actions) = parse_args(env::args().skip(1))?;

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let settings_path = resolve_path(&config_path, config.settings_path.trim());
    let settings = SettingsStore::new(Arc::new(RedbBackend::open(&settings_path)?));
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.trim())
        .build()?;
    let service = Arc::new(HttpTrackService::new(client, config.api_url.trim()));

    let source = if fresh || !config.cached_scan {
        ScanSource::Fresh
    } else {
        ScanSource::Cached
    };
    let mut browser = Browser::new(service, settings);
    browser.open(source).await?;

    for action in actions {
        match action {
            Action::Filter(spec) => {
                if !browser.apply_filter(spec, confirm)? {
                    info!("Filter unchanged");
                }
            }
            Action::ResetFilter => {
                browser.reset_filter(confirm)?;
            }
            Action::Sort(key) => {
                browser.push_sort_key(key, confirm)?;
            }
            Action::ResetOrder => {
                browser.reset_order(confirm)?;
            }
            Action::Next => {
                if !browser.next_page()? {
                    warn!("Already on the last page");
                }
            }
            Action::Prev => {
                if !browser.prev_page()? {
                    warn!("Already on the first page");
                }
            }
            Action::PageSize(size) => browser.set_page_size(size)?,
            Action::TogglePanel => {
                browser.toggle_genres_panel()?;
            }
            Action::AddGenre(name) => browser.add_genre(&name)?,
            Action::Select(genres) => browser.select_genres(genres)?,
            Action::Tag {
                track_id,
                genre,
                included,
            } => {
                browser.toggle_genre(&track_id, &genre, included).await?;
            }
        }
    }

    let status = browser.status()?;
    println!("{}", status);
    println!("Order: {}", status.order);
    let filter = &browser.settings().filter;
    if !filter.is_empty() {
        println!("Filter: {} contains {:?}", filter.field.as_str(), filter.keyword);
    }
    if browser.settings().genres_visible {
        let selected = &browser.settings().selected_genres;
        let genres: Vec<String> = browser
            .genres()
            .into_iter()
            .map(|g| if selected.contains(&g) { format!("*{}", g) } else { g })
            .collect();
        println!("Genres: {}", genres.join(", "));
    }
    for track in browser.page()?.tracks {
        let summary = browser
            .genre_summary(&track.id)
            .unwrap_or_else(|| track.genre_summary());
        println!(
            "{:>3}  {}  {} - {} ({}) [{}]",
            track.track_number,
            track.id,
            track.artist,
            track.display_title(),
            track.year,
            summary
        );
    }

    Ok(())
}
