use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use cinelog_models::{MovieSort, WatchlistStatus};
use commands::{config, movies, reviews, session, watchlist, AppContext};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cinelog")]
#[command(about = "Cinelog - Browse movies, write reviews and keep a watchlist")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        /// Account email (if not provided, will prompt)
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored session token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Browse the movie catalog
    Movies {
        #[command(subcommand)]
        cmd: MovieCommands,
    },
    /// Read and write reviews
    Reviews {
        #[command(subcommand)]
        cmd: ReviewCommands,
    },
    /// Manage your watchlist
    Watchlist {
        #[command(subcommand)]
        cmd: WatchlistCommands,
    },
    /// Show or change configuration
    #[command(long_about = "Display or modify the configuration file. Use 'config set <key> <value>' with dotted keys such as api.base_url or catalog.default_watchlist_status.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Rating,
    Year,
    Title,
    Reviews,
}

impl From<SortArg> for MovieSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Rating => MovieSort::AverageRating,
            SortArg::Year => MovieSort::ReleaseYear,
            SortArg::Title => MovieSort::Title,
            SortArg::Reviews => MovieSort::TotalReviews,
        }
    }
}

#[derive(Subcommand)]
enum MovieCommands {
    /// List one page of the catalog
    List {
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        year: Option<u32>,
        /// Minimum average rating (0-5)
        #[arg(long)]
        min_rating: Option<f32>,
        #[arg(long, value_enum, default_value = "rating")]
        sort: SortArg,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one movie with its first page of reviews
    Show { id: String },
    Featured,
    Trending,
    Search { query: String },
}

#[derive(Subcommand)]
enum ReviewCommands {
    /// Reviews of a movie
    List {
        movie_id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Your own reviews
    Mine {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Reviews written by another user
    User {
        user_id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Review a movie
    Submit {
        movie_id: String,
        /// Rating from 1 to 5
        #[arg(long)]
        rating: u8,
        /// Review text (if not provided, will prompt)
        #[arg(long)]
        text: Option<String>,
    },
    /// Change the rating or text of one of your reviews
    Edit {
        review_id: String,
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long)]
        text: Option<String>,
    },
    Delete {
        review_id: String,
        /// Skip the confirmation prompt
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Mark a review as helpful
    Helpful { review_id: String },
}

#[derive(Subcommand)]
enum WatchlistCommands {
    /// List one page of the watchlist with per-status totals
    List {
        #[arg(long)]
        status: Option<WatchlistStatus>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Add {
        movie_id: String,
        /// Defaults to catalog.default_watchlist_status
        #[arg(long)]
        status: Option<WatchlistStatus>,
    },
    Remove { movie_id: String },
    /// Add the movie if it is not on the watchlist, otherwise remove it
    Toggle { movie_id: String },
    /// Move a watchlist entry to another status
    Status {
        movie_id: String,
        status: WatchlistStatus,
    },
    /// Per-status totals
    Stats,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set { key: String, value: String },
    /// Print the configuration file location
    Path,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let context = AppContext::load()?;

    logging::init_logging(cli.verbose, cli.quiet, &context.config.logging)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    let result = match cli.command {
        Commands::Login { email } => session::run_login(context, email, &output).await,
        Commands::Register { username, email } => session::run_register(context, username, email, &output).await,
        Commands::Logout => session::run_logout(context, &output),
        Commands::Whoami => session::run_whoami(context, &output).await,
        Commands::Movies { cmd } => match cmd {
            MovieCommands::List { genre, year, min_rating, sort, page } => {
                let filters = cinelog_models::MovieFilters {
                    genre,
                    year,
                    min_rating,
                    sort: sort.into(),
                    search: None,
                };
                movies::run_list(&context, filters, page, &output).await
            }
            MovieCommands::Show { id } => movies::run_show(&context, &id, &output).await,
            MovieCommands::Featured => movies::run_featured(&context, &output).await,
            MovieCommands::Trending => movies::run_trending(&context, &output).await,
            MovieCommands::Search { query } => movies::run_search(&context, &query, &output).await,
        },
        Commands::Reviews { cmd } => match cmd {
            ReviewCommands::List { movie_id, page } => reviews::run_list(&context, &movie_id, page, &output).await,
            ReviewCommands::Mine { page } => reviews::run_mine(&context, page, &output).await,
            ReviewCommands::User { user_id, page } => reviews::run_user(&context, &user_id, page, &output).await,
            ReviewCommands::Submit { movie_id, rating, text } => {
                reviews::run_submit(&context, &movie_id, rating, text, &output).await
            }
            ReviewCommands::Edit { review_id, rating, text } => {
                reviews::run_edit(&context, &review_id, rating, text, &output).await
            }
            ReviewCommands::Delete { review_id, yes } => reviews::run_delete(&context, &review_id, yes, &output).await,
            ReviewCommands::Helpful { review_id } => reviews::run_helpful(&context, &review_id, &output).await,
        },
        Commands::Watchlist { cmd } => match cmd {
            WatchlistCommands::List { status, page } => watchlist::run_list(&context, status, page, &output).await,
            WatchlistCommands::Add { movie_id, status } => watchlist::run_add(&context, &movie_id, status, &output).await,
            WatchlistCommands::Remove { movie_id } => watchlist::run_remove(&context, &movie_id, &output).await,
            WatchlistCommands::Toggle { movie_id } => watchlist::run_toggle(&context, &movie_id, &output).await,
            WatchlistCommands::Status { movie_id, status } => {
                watchlist::run_status(&context, &movie_id, status, &output).await
            }
            WatchlistCommands::Stats => watchlist::run_stats(&context, &output).await,
        },
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show);
            config::run_config(context, cmd, &output)
        }
    };

    if let Err(e) = result {
        output.error(format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
