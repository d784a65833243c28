//! RagClass CLI - a terminal client for the RagClass education platform.
//!
//! This binary is the composition root: it builds the token store, HTTP
//! client, and session controller, bootstraps the session from stored
//! credentials, and dispatches one command per invocation.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ragclass_core::api::auth::LoginRequest;
use ragclass_core::models::UserProfile;
use ragclass_core::{
    ApiError, CacheManager, ClassesApi, Config, HttpClient, ProfileApi, SessionController,
    TokenStore,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_usage() {
    eprintln!("Usage: ragclass <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  login [--session]   Sign in (--session: do not remember past this run)");
    eprintln!("  logout              Sign out and clear stored credentials");
    eprintln!("  whoami              Show the current session");
    eprintln!("  profile [--fresh]   Show the signed-in user's profile (--fresh: bypass the cache)");
    eprintln!("  classes [--fresh]   List your classes (--fresh: bypass the cache)");
}

struct App {
    config: Config,
    controller: SessionController,
    classes: ClassesApi,
    profile: ProfileApi,
    cache: CacheManager,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let tokens = Arc::new(TokenStore::new(config.state_dir()?));
        let http = HttpClient::new(config.api_base_url.as_str(), tokens)
            .context("Failed to build HTTP client")?;
        let cache = CacheManager::new(config.cache_dir()?)?;
        Ok(Self {
            controller: SessionController::new(http.clone()),
            classes: ClassesApi::new(http.clone()),
            profile: ProfileApi::new(http),
            cache,
            config,
        })
    }

    async fn login(&self, session_only: bool) -> Result<()> {
        let email = prompt_email(self.config.last_email.as_deref())?;
        let password = rpassword::prompt_password("Password: ")?;

        let request = LoginRequest {
            email: email.clone(),
            password,
        };
        // An explicit --session overrides the sticky preference; otherwise
        // the previous choice is reused.
        let persist = if session_only { Some(false) } else { None };
        let outcome = self.controller.login(&request, persist).await;

        if let Some(error) = outcome.error() {
            bail!("Sign-in failed: {}", error);
        }

        let mut config = self.config.clone();
        config.last_email = Some(email);
        if let Err(error) = config.save() {
            warn!(%error, "Failed to save configuration");
        }

        let user = self.controller.current_user();
        println!(
            "Signed in as {} ({})",
            user.email.as_deref().unwrap_or("<unknown>"),
            user.roles.join(", ")
        );
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        self.controller.logout().await;
        if let Err(error) = self.cache.clear() {
            warn!(%error, "Failed to clear cache");
        }
        println!("Signed out.");
        Ok(())
    }

    fn whoami(&self) -> Result<()> {
        let state = self.controller.state();
        if !self.controller.is_authenticated() {
            println!("Not signed in.");
            if let Some(error) = state.error {
                println!("Last error: {}", error);
            }
            return Ok(());
        }
        let user = state.user;
        println!("User ID: {}", user.user_id.as_deref().unwrap_or("<unknown>"));
        println!("Email:   {}", user.email.as_deref().unwrap_or("<unknown>"));
        println!("Roles:   {}", user.roles.join(", "));
        Ok(())
    }

    async fn profile(&self, fresh: bool) -> Result<()> {
        self.require_signed_in()?;

        if !fresh {
            let cached = self.cache.load_profile().unwrap_or_else(|error| {
                warn!(%error, "Failed to read profile cache");
                None
            });
            if let Some(cached) = cached {
                if !cached.is_stale() {
                    print_profile(&cached.data, Some(cached.age_display().as_str()));
                    return Ok(());
                }
            }
        }

        let profile = self.profile.fetch().await.map_err(report_api_error)?;
        if let Err(error) = self.cache.save_profile(&profile) {
            warn!(%error, "Failed to cache profile");
        }
        print_profile(&profile, None);
        Ok(())
    }

    async fn classes(&self, fresh: bool) -> Result<()> {
        self.require_signed_in()?;

        if !fresh {
            let cached = self.cache.load_classes().unwrap_or_else(|error| {
                warn!(%error, "Failed to read class cache");
                None
            });
            if let Some(cached) = cached {
                if !cached.is_stale() {
                    println!("Classes (cached {}):", cached.age_display());
                    for class in &cached.data {
                        println!("  {} ({} students)", class.name, class.student_count);
                    }
                    return Ok(());
                }
            }
        }

        let classes = self.classes.list().await.map_err(report_api_error)?;
        if let Err(error) = self.cache.save_classes(&classes) {
            warn!(%error, "Failed to cache class list");
        }

        let rosters = self.classes.fetch_all_members(&classes).await;
        println!("Classes:");
        for class in &classes {
            match rosters.get(&class.class_id) {
                Some(members) => {
                    println!("  {} ({} students)", class.name, members.len());
                    for member in members {
                        println!("    - {}", member.display_name());
                    }
                }
                None => println!("  {} ({} students)", class.name, class.student_count),
            }
        }
        Ok(())
    }

    fn require_signed_in(&self) -> Result<()> {
        if !self.controller.is_authenticated() {
            bail!("Not signed in. Run `ragclass login` first.");
        }
        Ok(())
    }
}

fn print_profile(profile: &UserProfile, cached_age: Option<&str>) {
    match cached_age {
        Some(age) => println!("{} <{}> (cached {})", profile.display_name(), profile.email, age),
        None => println!("{} <{}>", profile.display_name(), profile.email),
    }
    if !profile.roles.is_empty() {
        println!("Roles: {}", profile.roles.join(", "));
    }
}

/// Turn an API failure into the message the terminal shows; an expired
/// session gets a sign-in hint instead of a raw error chain.
fn report_api_error(error: ApiError) -> anyhow::Error {
    if error.is_session_expired() {
        anyhow::anyhow!("Session expired. Run `ragclass login` to sign in again.")
    } else {
        error.into()
    }
}

fn prompt_email(last_email: Option<&str>) -> Result<String> {
    match last_email {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    if input.is_empty() {
        match last_email {
            Some(last) => Ok(last.to_string()),
            None => bail!("Email is required"),
        }
    } else {
        Ok(input.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    if matches!(command, "help" | "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let config = Config::load().context("Failed to load configuration")?;
    info!(api_base_url = %config.api_base_url, "RagClass CLI starting");

    let app = App::new(config)?;
    app.controller.bootstrap().await;

    match command {
        "login" => app.login(args.iter().any(|a| a == "--session")).await,
        "logout" => app.logout().await,
        "whoami" => app.whoami(),
        "profile" => app.profile(args.iter().any(|a| a == "--fresh")).await,
        "classes" => app.classes(args.iter().any(|a| a == "--fresh")).await,
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    }
}
