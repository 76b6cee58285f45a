//! reelscope - movie and TV discovery CLI.

/// Application configuration (TOML).
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use futures::future::join_all;
use reelscope_api::{
    AlertFrequency, ApiClient, FavoriteKey, LocalBackendApi, MediaType, NewFavorite, SortKey,
    TrendWindow, genres_for,
};
use reelscope_core::{
    AlertsController, Decorated, DetailController, FavoriteSet, FavoritesView, FilterSet, Locale,
    MediaIdentity, PageView, ProfileController, QueryOutcome, SaveOutcome, SearchController,
    SectionId, SessionContext, StaticIdentityProvider, TrendingController, decorate,
};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, ID_TOKEN_ENV, resolve_config_path};

/// CLI argument parser.
#[derive(Parser)]
#[command(name = "reelscope", about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Response language (overrides `[locale] language`).
    #[arg(long, global = true)]
    language: Option<String>,

    /// Region (overrides `[locale] region`).
    #[arg(long, global = true)]
    region: Option<String>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Search movies or TV shows by keyword.
    Search(SearchArgs),
    /// Browse movies or TV shows by filters.
    Discover(DiscoverArgs),
    /// Show trending sections.
    Trending(TrendingArgs),
    /// Show details, trailers, images and comments of one title.
    Details(DetailsArgs),
    /// Manage favorites.
    Favorites(FavoritesCommand),
    /// Show or update the profile.
    Profile(ProfileCommand),
    /// Show or update alert preferences.
    Alerts(AlertsCommand),
    /// List or post comments.
    Comments(CommentsCommand),
    /// List selectable genres.
    Genres(GenresArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search keyword.
    #[arg(long, required = true)]
    query: String,
    /// Media type: "movie" or "tv".
    #[arg(long = "type", default_value = "movie")]
    media_type: MediaType,
    /// Filter by year.
    #[arg(long)]
    year: Option<u32>,
    /// Page to show (1-based).
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `discover` subcommand.
#[derive(clap::Args)]
struct DiscoverArgs {
    /// Media type: "movie" or "tv".
    #[arg(long = "type", default_value = "movie")]
    media_type: MediaType,
    /// Comma-separated genre IDs (see `reelscope genres`).
    #[arg(long, value_delimiter = ',')]
    genres: Vec<u32>,
    /// Sort order (e.g. "popularity.desc", "vote_average.asc", "date.desc").
    #[arg(long, default_value = "popularity.desc")]
    sort_by: SortKey,
    /// Release year (movies) or first-air year (TV).
    #[arg(long)]
    year: Option<u32>,
    /// Earliest release date (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Latest release date (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Page to show (1-based).
    #[arg(long, default_value_t = 1)]
    page: u32,
}

/// Arguments for the `trending` subcommand.
#[derive(clap::Args)]
struct TrendingArgs {
    /// Only sections of this media type.
    #[arg(long = "type")]
    media_type: Option<MediaType>,
    /// Only sections of this window: "day" or "week".
    #[arg(long)]
    window: Option<TrendWindow>,
    /// Page to show in every selected section.
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Save the listed title with this TMDB ID as a favorite.
    /// Requires a single section (both --type and --window).
    #[arg(long)]
    favorite: Option<u64>,
}

/// Arguments for the `details` subcommand.
#[derive(clap::Args)]
struct DetailsArgs {
    /// Media type: "movie" or "tv".
    #[arg(long = "type", default_value = "movie")]
    media_type: MediaType,
    /// TMDB ID.
    #[arg(long, required = true)]
    id: u64,
    /// Trailer page (one trailer per page).
    #[arg(long, default_value_t = 1)]
    trailer_page: usize,
    /// Image page (two backdrops per page).
    #[arg(long, default_value_t = 1)]
    image_page: usize,
}

/// Arguments for the `favorites` subcommand.
#[derive(clap::Args)]
struct FavoritesCommand {
    /// Favorites subcommand to run.
    #[command(subcommand)]
    command: FavoritesSubcommands,
}

/// Available favorites subcommands.
#[derive(Subcommand)]
enum FavoritesSubcommands {
    /// List favorites.
    List,
    /// Add a favorite.
    Add(FavoriteAddArgs),
    /// Remove a favorite.
    Remove(MediaRefArgs),
}

/// Arguments identifying one title.
#[derive(clap::Args)]
struct MediaRefArgs {
    /// Media type: "movie" or "tv".
    #[arg(long = "type", default_value = "movie")]
    media_type: MediaType,
    /// TMDB ID.
    #[arg(long, required = true)]
    id: u64,
}

/// Arguments for the `favorites add` subcommand.
#[derive(clap::Args)]
struct FavoriteAddArgs {
    /// Title to add.
    #[command(flatten)]
    target: MediaRefArgs,
    /// Title stored with the favorite.
    #[arg(long)]
    title: Option<String>,
    /// Poster path stored with the favorite.
    #[arg(long)]
    poster_path: Option<String>,
}

/// Arguments for the `profile` subcommand.
#[derive(clap::Args)]
struct ProfileCommand {
    /// Profile subcommand to run.
    #[command(subcommand)]
    command: ProfileSubcommands,
}

/// Available profile subcommands.
#[derive(Subcommand)]
enum ProfileSubcommands {
    /// Show the profile.
    Show,
    /// Update display name and avatar.
    Update(ProfileUpdateArgs),
}

/// Arguments for the `profile update` subcommand.
#[derive(clap::Args)]
struct ProfileUpdateArgs {
    /// New display name. An empty value clears it.
    #[arg(long)]
    display_name: Option<String>,
    /// New avatar URL. An empty value clears it.
    #[arg(long)]
    photo_url: Option<String>,
}

/// Arguments for the `alerts` subcommand.
#[derive(clap::Args)]
struct AlertsCommand {
    /// Alerts subcommand to run.
    #[command(subcommand)]
    command: AlertsSubcommands,
}

/// Available alerts subcommands.
#[derive(Subcommand)]
enum AlertsSubcommands {
    /// Show alert preferences.
    Show,
    /// Replace alert preferences.
    Update(AlertsUpdateArgs),
}

/// Arguments for the `alerts update` subcommand.
#[derive(clap::Args)]
struct AlertsUpdateArgs {
    /// "daily", "weekly" or "monthly".
    #[arg(long, default_value = "weekly")]
    frequency: AlertFrequency,
    /// Comma-separated keywords.
    #[arg(long, default_value = "")]
    keywords: String,
    /// Comma-separated channels (e.g. "email,push").
    #[arg(long, default_value = "")]
    channels: String,
}

/// Arguments for the `comments` subcommand.
#[derive(clap::Args)]
struct CommentsCommand {
    /// Comments subcommand to run.
    #[command(subcommand)]
    command: CommentsSubcommands,
}

/// Available comments subcommands.
#[derive(Subcommand)]
enum CommentsSubcommands {
    /// List comments on a title.
    List(MediaRefArgs),
    /// Post a comment on a title.
    Add(CommentAddArgs),
}

/// Arguments for the `comments add` subcommand.
#[derive(clap::Args)]
struct CommentAddArgs {
    /// Title to comment on.
    #[command(flatten)]
    target: MediaRefArgs,
    /// Comment body.
    #[arg(long, required = true)]
    content: String,
}

/// Arguments for the `genres` subcommand.
#[derive(clap::Args)]
struct GenresArgs {
    /// Media type: "movie" or "tv".
    #[arg(long = "type", default_value = "movie")]
    media_type: MediaType,
}

/// Arguments for the `completions` subcommand.
#[derive(clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    shell: Shell,
}

/// Shared state for one invocation.
struct App {
    config: AppConfig,
    client: Arc<ApiClient>,
    locale: Locale,
    bearer: Option<String>,
}

impl App {
    /// Loads config, builds the client and resolves the session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or the client fails to build.
    #[instrument(skip_all)]
    async fn load(cli: &Cli) -> Result<Self> {
        let config_path =
            resolve_config_path(cli.dir.as_deref()).context("failed to resolve config path")?;
        let config = AppConfig::load(&config_path).context("failed to load config")?;

        let mut builder = ApiClient::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(url) = config.base_url()? {
            builder = builder.base_url(url);
        }
        let client = builder.build().context("failed to build API client")?;

        let mut locale = config.locale.clone();
        if let Some(language) = &cli.language {
            locale.language.clone_from(language);
        }
        if let Some(region) = &cli.region {
            locale.region.clone_from(region);
        }

        let provider =
            StaticIdentityProvider::new(config.id_token(std::env::var(ID_TOKEN_ENV).ok()));
        let session = SessionContext::start(Arc::new(provider));
        let bearer = session.ready().await.token;
        session.shutdown().await;

        Ok(Self {
            config,
            client: Arc::new(client),
            locale,
            bearer,
        })
    }

    /// Bearer token for commands that need a signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is configured.
    fn require_bearer(&self) -> Result<&str> {
        self.bearer.as_deref().with_context(|| {
            format!("sign-in required: set {ID_TOKEN_ENV} or [auth] id_token in config.toml")
        })
    }

    /// Favorite set for decorating listings. Empty when signed out.
    async fn favorites(&self) -> FavoriteSet {
        let favorites = FavoriteSet::new();
        if let Some(bearer) = self.bearer.as_deref()
            && let Err(err) = favorites.load(self.client.as_ref(), bearer).await
        {
            tracing::warn!(error = %err, "failed to load favorites");
        }
        favorites
    }
}

/// Maps a non-applied outcome to an error.
fn ensure_applied(outcome: QueryOutcome, what: &str) -> Result<()> {
    match outcome {
        QueryOutcome::Applied => Ok(()),
        QueryOutcome::Failed(message) | QueryOutcome::Rejected(message) => {
            bail!("{what}: {message}")
        }
        QueryOutcome::Stale | QueryOutcome::Aborted => bail!("{what}: request was superseded"),
    }
}

/// Logs the outcome of a favorite save.
fn report_save(outcome: SaveOutcome, key: FavoriteKey) -> Result<()> {
    match outcome {
        SaveOutcome::Saved => tracing::info!("Saved {key} to favorites"),
        SaveOutcome::AlreadyFavorite => tracing::info!("{key} is already a favorite"),
        SaveOutcome::InFlight => tracing::info!("{key} is already being saved"),
        SaveOutcome::Failed {
            notice: Some(notice),
        } => bail!("failed to save favorite {key}: {notice}"),
        SaveOutcome::Failed { notice: None } => bail!("failed to save favorite {key}"),
    }
    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// Prints decorated listing rows followed by the page footer.
fn print_listing<T>(rows: &[Decorated], view: &PageView<T>) {
    tracing::info!("ID\tFav\tDate\t\tRating\tTitle");
    for row in rows {
        tracing::info!(
            "{}\t{}\t{}\t{}\t{}",
            row.key.tmdb_id,
            if row.is_favorite { "*" } else { "-" },
            or_dash(row.item.date()),
            row.item
                .vote_average
                .map_or_else(|| String::from("-"), |v| format!("{v:.1}")),
            row.item.display_title(),
        );
    }
    tracing::info!(
        "Page {} of {} ({} results)",
        view.page,
        view.total_pages,
        view.total_results
    );
}

/// Prints the results of a search/discover controller.
async fn print_search_results<A: LocalBackendApi>(
    app: &App,
    ctrl: &SearchController<A>,
    media_type: MediaType,
) {
    let Some(view) = ctrl.results() else {
        return;
    };
    let favorites = app.favorites().await;
    let rows = decorate(&view.items, media_type, &favorites);
    print_listing(&rows, &view);
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the keyword is blank or the request fails.
#[instrument(skip_all)]
async fn run_search(app: &App, args: &SearchArgs) -> Result<()> {
    let ctrl = SearchController::new(Arc::clone(&app.client), args.media_type, app.locale.clone());
    let mut outcome = ctrl.submit_search(&args.query, args.year).await;
    if args.page != 1 && outcome.is_applied() {
        outcome = ctrl.go_to_page(args.page).await;
    }
    ensure_applied(outcome, "search failed")?;
    print_search_results(app, &ctrl, args.media_type).await;
    Ok(())
}

/// Runs the `discover` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails.
#[instrument(skip_all)]
async fn run_discover(app: &App, args: &DiscoverArgs) -> Result<()> {
    let catalogue = genres_for(args.media_type);
    for id in &args.genres {
        if !catalogue.iter().any(|g| g.id == *id) {
            tracing::warn!(genre = *id, media_type = %args.media_type, "unknown genre id");
        }
    }

    let ctrl = SearchController::new(Arc::clone(&app.client), args.media_type, app.locale.clone());
    let filters = FilterSet {
        genre_ids: args.genres.iter().copied().collect(),
        sort_key: args.sort_by,
        year: args.year,
        date_from: args.from,
        date_to: args.to,
    };
    let mut outcome = ctrl.apply_filters(filters).await;
    if args.page != 1 && outcome.is_applied() {
        outcome = ctrl.go_to_page(args.page).await;
    }
    ensure_applied(outcome, "discover failed")?;
    print_search_results(app, &ctrl, args.media_type).await;
    Ok(())
}

/// Sections selected by `--type` and `--window`.
fn select_sections(media_type: Option<MediaType>, window: Option<TrendWindow>) -> Vec<SectionId> {
    SectionId::ALL
        .into_iter()
        .filter(|id| media_type.is_none_or(|m| id.media_type() == m))
        .filter(|id| window.is_none_or(|w| id.window() == w))
        .collect()
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if `--favorite` is used with several sections, the
/// title is not listed, or the save fails.
#[instrument(skip_all)]
async fn run_trending(app: &App, args: &TrendingArgs) -> Result<()> {
    let sections = select_sections(args.media_type, args.window);
    let ctrl = TrendingController::new(
        Arc::clone(&app.client),
        app.locale.clone(),
        app.favorites().await,
        app.config.favorites.on_save_failure,
    );

    let outcomes = if sections.len() == SectionId::ALL.len() && args.page == 1 {
        ctrl.load_all().await
    } else {
        let (ctrl, page) = (&ctrl, args.page);
        join_all(
            sections
                .iter()
                .map(|&id| async move { (id, ctrl.load_section(id, page).await) }),
        )
        .await
    };

    for (id, outcome) in outcomes {
        tracing::info!("== {} ==", id.title());
        if let Some(message) = outcome.message() {
            tracing::warn!(section = %id, "{message}");
            continue;
        }
        if let Some(view) = ctrl.view(id) {
            print_listing(&ctrl.decorated(id), &view);
        }
    }

    if let Some(tmdb_id) = args.favorite {
        let [id] = sections.as_slice() else {
            bail!("--favorite requires a single section: pass both --type and --window");
        };
        let bearer = app.require_bearer()?;
        let item = ctrl
            .view(*id)
            .and_then(|v| v.items.into_iter().find(|i| i.id == tmdb_id))
            .with_context(|| format!("{tmdb_id} is not listed in {id}"))?;
        let key = item.key(id.media_type());
        report_save(ctrl.save_favorite(bearer, *id, &item).await, key)?;
    }
    Ok(())
}

/// Advances a local pager to the 1-based `page`.
fn seek(page: usize, mut next: impl FnMut() -> bool) {
    for _ in 1..page {
        if !next() {
            break;
        }
    }
}

/// Runs the `details` subcommand.
///
/// # Errors
///
/// Returns an error if the detail record cannot be loaded.
#[instrument(skip_all)]
async fn run_details(app: &App, args: &DetailsArgs) -> Result<()> {
    let ctrl = DetailController::new(Arc::clone(&app.client), app.locale.language.clone());
    let (details, assets, comments) = ctrl
        .open(MediaIdentity::new(args.media_type, args.id))
        .await;
    ensure_applied(details, "failed to load details")?;

    if let Some(d) = ctrl.details().value() {
        tracing::info!("{} ({})", d.display_title(), or_dash(d.year()));
        let genres: Vec<&str> = d.genres.iter().map(|g| g.name.as_str()).collect();
        tracing::info!("Genres:  {}", genres.join(", "));
        tracing::info!(
            "Runtime: {}",
            d.runtime_minutes(args.media_type)
                .map_or_else(|| String::from("-"), |m| format!("{m}min"))
        );
        tracing::info!(
            "Rating:  {}",
            d.vote_average
                .map_or_else(|| String::from("-"), |v| format!("{v:.1}"))
        );
        if let Some(season) = d.latest_season() {
            tracing::info!(
                "Latest season: {} ({} episodes)",
                season.season_number,
                season.episode_count
            );
        }
        tracing::info!("{}", or_dash(d.overview.as_deref()));
        for member in d.cast() {
            tracing::info!(
                "  Cast: {} as {}",
                member.name,
                or_dash(member.character.as_deref())
            );
        }
        for member in d.main_crew() {
            tracing::info!("  Crew: {} ({})", member.name, or_dash(member.job.as_deref()));
        }
    }

    if let Some(message) = assets.message() {
        tracing::warn!("trailers and images unavailable: {message}");
    } else {
        seek(args.trailer_page, || ctrl.next_trailers());
        seek(args.image_page, || ctrl.next_images());
        let (trailer_page, trailer_pages) = ctrl.trailer_page();
        tracing::info!("Trailers (page {trailer_page} of {trailer_pages}):");
        for trailer in ctrl.visible_trailers() {
            tracing::info!(
                "  {} {}",
                trailer.name,
                trailer.watch_url().as_deref().unwrap_or("-")
            );
        }
        let (image_page, image_pages) = ctrl.image_page();
        tracing::info!("Images (page {image_page} of {image_pages}):");
        for image in ctrl.visible_images() {
            tracing::info!("  {}", image.file_path);
        }
    }

    if let Some(message) = comments.message() {
        tracing::warn!("comments unavailable: {message}");
    } else {
        print_comments(&ctrl.comments().value().unwrap_or_default());
    }
    Ok(())
}

fn print_comments(comments: &[reelscope_api::Comment]) {
    tracing::info!("Comments ({}):", comments.len());
    for comment in comments {
        tracing::info!(
            "  [{}] {}: {}",
            or_dash(comment.created_at.as_deref()),
            comment
                .author_name
                .as_deref()
                .or(comment.uid.as_deref())
                .unwrap_or("anonymous"),
            comment.content
        );
    }
}

/// Runs the `favorites` subcommands.
///
/// # Errors
///
/// Returns an error if not signed in or a request fails.
#[instrument(skip_all)]
async fn run_favorites(app: &App, command: &FavoritesSubcommands) -> Result<()> {
    let bearer = app.require_bearer()?;
    let favorites = FavoriteSet::new();
    match command {
        FavoritesSubcommands::List => {
            let view = FavoritesView::new(Arc::clone(&app.client), favorites);
            ensure_applied(view.load(bearer).await, "failed to load favorites")?;
            let items = view.items();
            tracing::info!("Type\tID\tTitle\t\t\tAdded");
            for item in &items {
                tracing::info!(
                    "{}\t{}\t{}\t{}",
                    item.media_type,
                    item.tmdb_id,
                    or_dash(item.title.as_deref()),
                    or_dash(item.created_at.as_deref()),
                );
            }
            tracing::info!("Total: {} favorites", items.len());
        }
        FavoritesSubcommands::Add(args) => {
            favorites
                .load(app.client.as_ref(), bearer)
                .await
                .context("failed to load favorites")?;
            let favorite = NewFavorite {
                media_type: args.target.media_type,
                tmdb_id: args.target.id,
                title: args.title.clone(),
                poster_path: args.poster_path.clone(),
            };
            let outcome = favorites
                .save(
                    app.client.as_ref(),
                    bearer,
                    &favorite,
                    app.config.favorites.on_save_failure,
                )
                .await;
            report_save(outcome, favorite.key())?;
        }
        FavoritesSubcommands::Remove(args) => {
            let view = FavoritesView::new(Arc::clone(&app.client), favorites);
            let key = FavoriteKey::new(args.media_type, args.id);
            ensure_applied(view.remove(bearer, key).await, "failed to remove favorite")?;
            tracing::info!("Removed {key}; {} favorites left", view.items().len());
        }
    }
    Ok(())
}

/// Runs the `profile` subcommands.
///
/// # Errors
///
/// Returns an error if not signed in or a request fails.
#[instrument(skip_all)]
async fn run_profile(app: &App, command: &ProfileSubcommands) -> Result<()> {
    let bearer = app.require_bearer()?;
    let ctrl = ProfileController::new(Arc::clone(&app.client));
    let profile = ctrl.load(bearer).await.context("failed to load profile")?;
    match command {
        ProfileSubcommands::Show => {
            tracing::info!("UID:          {}", profile.uid);
            tracing::info!("Email:        {}", or_dash(profile.email.as_deref()));
            tracing::info!("Display name: {}", or_dash(profile.display_name.as_deref()));
            tracing::info!("Photo URL:    {}", or_dash(profile.photo_url.as_deref()));
            tracing::info!("Created:      {}", or_dash(profile.created_at.as_deref()));
        }
        ProfileSubcommands::Update(args) => {
            ctrl.save(
                bearer,
                args.display_name.as_deref(),
                args.photo_url.as_deref(),
            )
            .await
            .context("failed to save profile")?;
            if let Some(notice) = ctrl.state().notice {
                tracing::info!("{notice}");
            }
        }
    }
    Ok(())
}

/// Runs the `alerts` subcommands.
///
/// # Errors
///
/// Returns an error if not signed in or saving fails.
#[instrument(skip_all)]
async fn run_alerts(app: &App, command: &AlertsSubcommands) -> Result<()> {
    let bearer = app.require_bearer()?;
    let ctrl = AlertsController::new(Arc::clone(&app.client));
    match command {
        AlertsSubcommands::Show => {
            let prefs = ctrl.load(bearer).await;
            if let Some(error) = ctrl.state().error {
                tracing::warn!("{error}; showing defaults");
            }
            tracing::info!("Frequency: {}", prefs.frequency);
            tracing::info!("Keywords:  {}", prefs.keywords);
            tracing::info!("Channels:  {}", prefs.channels);
            tracing::info!("Updated:   {}", or_dash(prefs.updated_at.as_deref()));
        }
        AlertsSubcommands::Update(args) => {
            ctrl.save(bearer, args.frequency, &args.keywords, &args.channels)
                .await
                .context("failed to save alert preferences")?;
            if let Some(notice) = ctrl.state().notice {
                tracing::info!("{notice}");
            }
        }
    }
    Ok(())
}

/// Runs the `comments` subcommands.
///
/// # Errors
///
/// Returns an error if loading fails, or posting is rejected.
#[instrument(skip_all)]
async fn run_comments(app: &App, command: &CommentsSubcommands) -> Result<()> {
    let ctrl = DetailController::new(Arc::clone(&app.client), app.locale.language.clone());
    match command {
        CommentsSubcommands::List(args) => {
            let outcome = ctrl
                .open_comments(MediaIdentity::new(args.media_type, args.id))
                .await;
            ensure_applied(outcome, "failed to load comments")?;
            print_comments(&ctrl.comments().value().unwrap_or_default());
        }
        CommentsSubcommands::Add(args) => {
            let identity = MediaIdentity::new(args.target.media_type, args.target.id);
            ctrl.open_comments(identity).await;
            let comment = ctrl
                .post_comment(app.bearer.as_deref(), &args.content)
                .await
                .context("failed to post comment")?;
            tracing::info!("Posted comment #{}", comment.id);
            print_comments(&ctrl.comments().value().unwrap_or_default());
        }
    }
    Ok(())
}

/// Runs the `genres` subcommand.
fn run_genres(args: &GenresArgs) {
    tracing::info!("ID\tName");
    for genre in genres_for(args.media_type) {
        tracing::info!("{}\t{}", genre.id, genre.name);
    }
}

/// Runs the `completions` subcommand.
fn run_completions(args: &CompletionsArgs) {
    let mut command = Cli::command();
    let name = command.get_name().to_owned();
    clap_complete::generate(args.shell, &mut command, name, &mut std::io::stdout());
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match &cli.command {
        Commands::Genres(args) => {
            run_genres(args);
            return Ok(());
        }
        Commands::Completions(args) => {
            run_completions(args);
            return Ok(());
        }
        _ => {}
    }

    let app = App::load(&cli).await?;
    match &cli.command {
        Commands::Search(args) => run_search(&app, args).await,
        Commands::Discover(args) => run_discover(&app, args).await,
        Commands::Trending(args) => run_trending(&app, args).await,
        Commands::Details(args) => run_details(&app, args).await,
        Commands::Favorites(cmd) => run_favorites(&app, &cmd.command).await,
        Commands::Profile(cmd) => run_profile(&app, &cmd.command).await,
        Commands::Alerts(cmd) => run_alerts(&app, &cmd.command).await,
        Commands::Comments(cmd) => run_comments(&app, &cmd.command).await,
        Commands::Genres(_) | Commands::Completions(_) => Ok(()),
    }
}
