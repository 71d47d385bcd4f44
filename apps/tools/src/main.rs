use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use curation::{PaginationEngine, PaginationOptions, RankedList};
use shared::{
    domain::{CollectionKind, MovieId, NewMovie},
    protocol::PageToken,
};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/fcinema.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    AddMovie {
        title: String,
        #[arg(long)]
        duration: i64,
        #[arg(long)]
        genre: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        release_date: Option<NaiveDate>,
    },
    ListMovies {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 10)]
        page_size: i64,
        #[arg(long, default_value_t = 5)]
        max_visible_pages: usize,
    },
    ShowCollection {
        kind: CollectionKind,
    },
    /// Replaces a collection with the given movies, ranked in argument order.
    RankCollection {
        kind: CollectionKind,
        movie_ids: Vec<i64>,
    },
    RemoveMovie {
        movie_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::AddMovie {
            title,
            duration,
            genre,
            release_date,
        } => {
            let movie = storage
                .create_movie(&NewMovie {
                    title,
                    genre,
                    duration_minutes: duration,
                    release_date,
                })
                .await?;
            println!("created movie_id={}", movie.movie_id);
        }
        Command::ListMovies {
            page,
            page_size,
            max_visible_pages,
        } => {
            let total_count = storage.count_movies().await?;
            let engine = PaginationEngine::new(
                PaginationOptions::new(total_count, page_size)
                    .initial_page(page)
                    .max_visible_pages(max_visible_pages),
            )?;
            let movies = storage
                .list_movies(engine.start_index(), engine.page_size())
                .await?;
            for movie in &movies {
                println!(
                    "{:>6}  {:<40} {:>4} min  {}",
                    movie.movie_id.0,
                    movie.title,
                    movie.duration_minutes,
                    movie.genre.as_deref().unwrap_or("-")
                );
            }
            println!(
                "{}  (page {} of {}, {} movies)",
                render_strip(&engine.visible_pages(), engine.current_page()),
                engine.current_page(),
                engine.total_pages(),
                engine.total_count()
            );
        }
        Command::ShowCollection { kind } => {
            let entries = storage.load_collection(kind).await?;
            if entries.is_empty() {
                println!("{kind} is empty");
            }
            for entry in entries {
                println!(
                    "{:>3}. {} (movie_id={})",
                    entry.rank, entry.movie.title, entry.movie.movie_id
                );
            }
        }
        Command::RankCollection { kind, movie_ids } => {
            let list = RankedList::from_items(movie_ids.into_iter().map(MovieId))?;
            let ordered = list.to_ordered();
            let ids: Vec<MovieId> = ordered.iter().map(|item| item.id).collect();
            let missing = storage.missing_movies(&ids).await?;
            if !missing.is_empty() {
                bail!("unknown movie ids: {missing:?}");
            }
            storage.replace_collection(kind, &ordered).await?;
            info!(%kind, items = ordered.len(), "collection replaced");
            println!("ranked {} movies in {kind}", ordered.len());
        }
        Command::RemoveMovie { movie_id } => {
            if !storage.delete_movie(MovieId(movie_id)).await? {
                bail!("movie_id={movie_id} not found");
            }
            println!("removed movie_id={movie_id}");
        }
    }

    Ok(())
}

/// `1 … 4 [5] 6 … 10`: the current page is bracketed.
fn render_strip(tokens: &[PageToken], current_page: i64) -> String {
    tokens
        .iter()
        .map(|token| match token {
            PageToken::Page(page) if *page == current_page => format!("[{page}]"),
            PageToken::Page(page) => page.to_string(),
            PageToken::Ellipsis => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
