use catz::breeds::usecase::{filter_breeds_by_name, get_breeds_page, toggle_favorite};
use catz::breeds::{Breed, BreedRepository, CatApiClient, SyncError};
use catz::cache::SqliteStore;
use catz::config::Config;
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use color_eyre::Result;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

type Repository = BreedRepository<CatApiClient, SqliteStore>;

/// How often `favorites --watch` rechecks the database for changes made by
/// other `catz` processes.
const FAVORITES_POLL: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "catz")]
#[command(about = "Browse cat breeds, online or off")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/catz/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List one page of breeds
  List {
    #[arg(short, long, default_value_t = 0)]
    page: u32,
    /// Breeds per page (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    page_size: Option<u32>,
    /// Only show breeds whose name contains this text
    #[arg(short, long)]
    filter: Option<String>,
  },
  /// Refetch the first page, ignoring the cache
  Refresh {
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    page_size: Option<u32>,
  },
  /// Show a cached breed
  Show { id: String },
  /// List favorite breeds
  Favorites {
    /// Keep printing as favorites change
    #[arg(short, long)]
    watch: bool,
  },
  /// Manage favorites
  Fav {
    #[command(subcommand)]
    action: FavAction,
  },
}

#[derive(Subcommand, Debug)]
enum FavAction {
  Add { id: String },
  Remove { id: String },
  Toggle { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;

  let db_path = config.cache.database_path()?;
  let log_dir = db_path
    .parent()
    .map(|p| p.join("logs"))
    .unwrap_or_else(|| PathBuf::from("logs"));
  let _guard = catz::logging::init(&log_dir)?;

  let remote = CatApiClient::new(&config.api)?;
  let store = SqliteStore::open(&db_path)?;
  let repository = BreedRepository::new(Arc::new(remote), Arc::new(store))
    .with_ttl(Duration::hours(config.cache.ttl_hours));

  let default_page_size = config.page_size;

  match args.command {
    Command::List {
      page,
      page_size,
      filter,
    } => {
      let page_size = page_size.unwrap_or(default_page_size);
      let result = get_breeds_page(&repository, page, page_size).await?;
      let shown = match filter {
        Some(query) => filter_breeds_by_name(&result.items, &query),
        None => result.items.clone(),
      };
      print_list(&shown);
      if result.is_offline() {
        match result.cached_at {
          Some(at) => println!(
            "-- offline, cached at {}",
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
          ),
          None => println!("-- offline"),
        }
      }
      if result.has_more_pages {
        println!("-- more: catz list --page {}", page + 1);
      }
    }
    Command::Refresh { page_size } => {
      let breeds = repository
        .refresh(page_size.unwrap_or(default_page_size))
        .await?;
      println!("Refreshed {} breeds", breeds.len());
    }
    Command::Show { id } => show(&repository, &id).await?,
    Command::Favorites { watch } => favorites(&repository, watch).await?,
    Command::Fav { action } => match action {
      FavAction::Add { id } => {
        repository.add_favorite(&id).await?;
        println!("★ {}", id);
      }
      FavAction::Remove { id } => {
        repository.remove_favorite(&id).await?;
        println!("☆ {}", id);
      }
      FavAction::Toggle { id } => {
        let current = repository.is_favorite(&id).await?;
        let now = toggle_favorite(&repository, &id, current).await?;
        println!("{} {}", if now { "★" } else { "☆" }, id);
      }
    },
  }

  Ok(())
}

async fn show(repository: &Repository, id: &str) -> Result<()> {
  match repository.get_by_id(id).await {
    Ok(breed) => {
      print_detail(&breed);
      Ok(())
    }
    Err(SyncError::NotFound { id }) => {
      println!("Breed '{}' is not cached yet. Run `catz list` first.", id);
      Ok(())
    }
    Err(e) => Err(e.into()),
  }
}

async fn favorites(repository: &Repository, watch: bool) -> Result<()> {
  if !watch {
    print_list(&repository.favorites_snapshot().await?);
    return Ok(());
  }

  // Other processes only write SQLite, so recheck it on a timer.
  let poller = repository.clone();
  let reload = tokio::spawn(async move {
    let mut tick = tokio::time::interval(FAVORITES_POLL);
    loop {
      tick.tick().await;
      if let Err(e) = poller.reload_favorites().await {
        warn!(error = %e, "failed to reload favorites");
      }
    }
  });

  let mut stream = repository.observe_favorites();
  loop {
    tokio::select! {
      next = stream.next() => match next {
        Some(Ok(breeds)) => {
          println!("-- {} favorites", breeds.len());
          print_list(&breeds);
        }
        Some(Err(e)) => eprintln!("error: {}", e),
        None => break,
      },
      _ = tokio::signal::ctrl_c() => break,
    }
  }

  reload.abort();
  Ok(())
}

fn print_list(breeds: &[Breed]) {
  if breeds.is_empty() {
    println!("(no breeds)");
    return;
  }

  for breed in breeds {
    let star = if breed.is_favorite { "★" } else { " " };
    println!("{} {:<6} {:<28} {}", star, breed.id, breed.name, breed.origin);
  }
}

fn print_detail(breed: &Breed) {
  let star = if breed.is_favorite { " ★" } else { "" };
  println!("{}{} ({})", breed.name, star, breed.id);
  println!("Origin:      {}", breed.origin);
  println!("Temperament: {}", breed.temperament);
  println!(
    "Lifespan:    {} - {} years",
    breed.lifespan.low(),
    breed.lifespan.high()
  );
  if !breed.image_url.is_empty() {
    println!("Image:       {}", breed.image_url);
  }
  println!();
  println!("{}", breed.description);
}
