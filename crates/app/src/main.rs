//! `cook` - command-line front end for the recipe catalog and cooking tracker.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use cook_core::model::{Category, GeoPoint, RecipeId};
use services::{
    AppServices, Clock, Completion, CookingError, SessionUser, StaticLocation,
    filter_by_category,
};
use storage::repository::Storage;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod seed;

use config::{AppConfig, CliOverrides, FileConfig};

/// Command-line arguments for cook
#[derive(Parser, Debug)]
#[command(name = "cook")]
#[command(about = "Browse recipes and track what you are cooking")]
#[command(version)]
struct Args {
    /// SQLite database URL
    #[arg(long, global = true)]
    db: Option<String>,

    /// TOML config file (default: ./cook.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Width of one step page, in scroll units
    #[arg(long, global = true)]
    page_width: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct Credentials {
    #[arg(long, env = "COOK_EMAIL")]
    email: String,

    #[arg(long, env = "COOK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import recipes and supermarkets from a JSON file
    Seed { file: PathBuf },
    /// List recipes, optionally filtered by category
    Recipes {
        #[arg(long)]
        category: Option<String>,
    },
    /// List supermarkets
    Supermarkets,
    /// Create an account
    Signup {
        #[arg(long)]
        username: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Show whether a recipe is being cooked (all recipes if none given)
    Status {
        recipe: Option<String>,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Start cooking a recipe
    Start {
        recipe: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Finish cooking a recipe
    Finish {
        recipe: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Walk through a recipe's steps, finishing it at the last one
    Walk {
        recipe: String,
        /// Stop at this step (0-based) instead of walking to the end
        #[arg(long)]
        stop_at: Option<usize>,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Show supermarkets around a position
    Map {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file = FileConfig::load(args.config.as_deref())?;
    let config = AppConfig::resolve(
        &CliOverrides {
            db_url: args.db.clone(),
            page_width: args.page_width,
        },
        file,
    )?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Using database {}", config.db_url);
    run(args.command, &config).await
}

async fn run(command: Command, config: &AppConfig) -> Result<()> {
    let storage = Storage::sqlite(&config.db_url)
        .await
        .with_context(|| format!("failed to open {}", config.db_url))?;
    let app = AppServices::from_storage(&storage, Clock::system(), config.walker);

    match command {
        Command::Seed { file } => {
            let catalog = seed::read_catalog(&file)?;
            let report = seed::seed_catalog(&storage, catalog).await?;
            println!(
                "Seeded {} recipes and {} supermarkets into {}",
                report.recipes, report.supermarkets, config.db_url
            );
        }
        Command::Recipes { category } => {
            let recipes = app
                .catalog()
                .list_recipes()
                .await
                .map_err(|e| notice_error(&e.notice().message, &e))?;
            let filter = category.map_or(Category::All, |raw| Category::filter(&raw));
            for recipe in filter_by_category(&recipes, &filter) {
                println!(
                    "{}\t{}\t{}\t{} steps",
                    recipe.id(),
                    recipe.name(),
                    recipe.category(),
                    recipe.steps().len()
                );
            }
        }
        Command::Supermarkets => {
            let markets = app
                .catalog()
                .list_supermarkets()
                .await
                .map_err(|e| notice_error(&e.notice().message, &e))?;
            for market in markets {
                println!(
                    "{}\t{}\t{}\t{:.5},{:.5}",
                    market.id,
                    market.name,
                    market.location,
                    market.geopoint.latitude(),
                    market.geopoint.longitude()
                );
            }
        }
        Command::Signup {
            username,
            credentials,
        } => {
            let me = app
                .auth()
                .sign_up(&credentials.email, &username, &credentials.password)
                .await
                .map_err(|e| notice_error(&e.notice().message, &e))?;
            println!("Signed up as {} ({})", me.display_name, me.id);
        }
        Command::Status {
            recipe,
            credentials,
        } => {
            let me = sign_in(&app, &credentials).await?;
            let tracker = app.tracker();
            match recipe {
                Some(raw) => {
                    let recipe = RecipeId::new(raw)?;
                    let cooking = tracker
                        .query_status(&me.id, &recipe)
                        .await
                        .map_err(cooking_error)?;
                    println!("{recipe}\t{}", status_label(cooking));
                }
                None => {
                    let recipes = app
                        .catalog()
                        .list_recipes()
                        .await
                        .map_err(|e| notice_error(&e.notice().message, &e))?;
                    let ids: Vec<RecipeId> = recipes.iter().map(|r| r.id().clone()).collect();
                    let statuses = tracker
                        .statuses(&me.id, &ids)
                        .await
                        .map_err(cooking_error)?;
                    for recipe in &recipes {
                        let cooking = statuses.get(recipe.id()).copied().unwrap_or(false);
                        println!("{}\t{}\t{}", recipe.id(), recipe.name(), status_label(cooking));
                    }
                }
            }
        }
        Command::Start {
            recipe,
            credentials,
        } => {
            let me = sign_in(&app, &credentials).await?;
            let recipe = RecipeId::new(recipe)?;
            let cooking = app
                .tracker()
                .start(&me.id, &recipe)
                .await
                .map_err(cooking_error)?;
            println!("{recipe}\t{}", status_label(cooking));
        }
        Command::Finish {
            recipe,
            credentials,
        } => {
            let me = sign_in(&app, &credentials).await?;
            let recipe = RecipeId::new(recipe)?;
            let cooking = app
                .tracker()
                .finish(&me.id, &recipe)
                .await
                .map_err(cooking_error)?;
            println!("{recipe}\t{}", status_label(cooking));
        }
        Command::Walk {
            recipe,
            stop_at,
            credentials,
        } => {
            sign_in(&app, &credentials).await?;
            let recipe = RecipeId::new(recipe)?;
            walk(&app, &recipe, stop_at).await?;
        }
        Command::Map { lat, lon } => {
            let here = GeoPoint::new(lat, lon)?;
            let view = app
                .map(Arc::new(StaticLocation::at(here)))
                .load()
                .await
                .map_err(|e| notice_error(&e.notice().message, &e))?;
            println!(
                "Centered on {:.5},{:.5} (+/- {})",
                view.region.center.latitude(),
                view.region.center.longitude(),
                view.region.latitude_delta
            );
            for market in view.supermarkets {
                println!("{}\t{}", market.name, market.location);
            }
        }
    }

    Ok(())
}

async fn walk(app: &AppServices, recipe: &RecipeId, stop_at: Option<usize>) -> Result<()> {
    let mut walker = app.open_walker(recipe).await.map_err(cooking_error)?;
    let page_width = app.settings().page_width;

    walker.show();
    let total = walker.view().total;
    let last = stop_at.map_or(total - 1, |step| step.min(total - 1));
    for step in 0..=last {
        #[allow(clippy::cast_precision_loss)]
        let offset = step as f64 * page_width;
        walker.advance_to(offset);
        let view = walker.view();
        println!(
            "[{}/{}] {:>3.0}%  {}",
            view.step + 1,
            view.total,
            view.progress * 100.0,
            view.text
        );
    }

    match walker.complete().await.map_err(cooking_error)? {
        Completion::Finished { cooking } => {
            println!("Done! {recipe} is now {}", status_label(cooking));
        }
        Completion::NotAtLastStep { step } => {
            println!("Stopped at step {}; {recipe} is still in progress", step + 1);
        }
    }
    Ok(())
}

async fn sign_in(app: &AppServices, credentials: &Credentials) -> Result<SessionUser> {
    app.auth()
        .sign_in(&credentials.email, &credentials.password)
        .await
        .map_err(|e| notice_error(&e.notice().message, &e))
}

fn cooking_error(err: CookingError) -> anyhow::Error {
    notice_error(&err.notice().message, &err)
}

fn notice_error(message: &str, err: &dyn std::error::Error) -> anyhow::Error {
    anyhow::anyhow!("{message} ({err})")
}

fn status_label(cooking: bool) -> &'static str {
    if cooking { "cooking" } else { "not cooking" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_walk_with_credentials() {
        let args = Args::try_parse_from([
            "cook",
            "--page-width",
            "300",
            "walk",
            "abc123",
            "--stop-at",
            "2",
            "--email",
            "a@b.co",
            "--password",
            "secret1",
        ])
        .unwrap();
        assert_eq!(args.page_width, Some(300.0));
        match args.command {
            Command::Walk {
                recipe, stop_at, ..
            } => {
                assert_eq!(recipe, "abc123");
                assert_eq!(stop_at, Some(2));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn map_accepts_negative_latitude() {
        let args =
            Args::try_parse_from(["cook", "map", "--lat", "-6.89", "--lon", "107.61"]).unwrap();
        assert!(matches!(args.command, Command::Map { lat, .. } if lat < 0.0));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[tokio::test]
    async fn walk_to_the_end_finishes_the_recipe() {
        let storage = Storage::in_memory();
        let catalog: seed::CatalogFile = serde_json::from_str(
            r#"{ "recipes": [{ "id": "abc123", "name": "Soto", "steps": ["a", "b", "c"] }] }"#,
        )
        .unwrap();
        seed::seed_catalog(&storage, catalog).await.unwrap();

        let app = AppServices::from_storage(
            &storage,
            Clock::system(),
            services::WalkerSettings::default(),
        );
        let me = app
            .auth()
            .sign_up("a@b.co", "A", "secret1")
            .await
            .unwrap();
        let recipe = RecipeId::new("abc123").unwrap();
        app.tracker().start(&me.id, &recipe).await.unwrap();

        walk(&app, &recipe, Some(1)).await.unwrap();
        assert!(app.tracker().query_status(&me.id, &recipe).await.unwrap());

        walk(&app, &recipe, None).await.unwrap();
        assert!(!app.tracker().query_status(&me.id, &recipe).await.unwrap());
    }
}
