//! Command definitions and handlers.
//!
//! Each command plays the part of one view: login and register are for
//! guests only, everything that reads the catalog or the profile needs a
//! signed-in user.

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use catsapp_core::models::{BreedFilter, BreedQuery, CatBreed, ImageQuery, ImageSize};
use catsapp_core::{ApiClient, GuardOutcome, Navigator, Route, RouteGuard};

use crate::navigator::TerminalNavigator;

/// Minimum password length accepted by the backend
const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum display name length
const MIN_NAME_LENGTH: usize = 2;

/// Width of the description column in breed listings
const DESCRIPTION_WIDTH: usize = 60;

#[derive(Debug, Parser)]
#[command(name = "catsapp", version, about = "Browse cat breeds and images")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user from the local session
    Whoami,
    /// Show session and token expiry details
    Status,
    /// Fetch the profile from the server
    Profile,
    /// List breeds
    Breeds {
        #[arg(long, short)]
        query: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one breed
    Breed { id: String },
    /// Search breeds by name and narrow by traits.
    /// A term shorter than two characters filters every breed.
    Search {
        #[arg(default_value = "")]
        term: String,
        /// Exact affection level (1-5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        affection: Option<u8>,
        /// Exact energy level (1-5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        energy: Option<u8>,
        /// Exact child friendliness (1-5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        child_friendly: Option<u8>,
        #[arg(long)]
        hypoallergenic: bool,
        #[arg(long)]
        hairless: bool,
        #[arg(long)]
        natural: bool,
        #[arg(long)]
        rare: bool,
    },
    /// Summary figures over all breeds
    Stats {
        /// Print the figures as JSON
        #[arg(long)]
        json: bool,
    },
    /// List images, optionally for one breed
    Images {
        #[arg(long)]
        breed: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
}

impl Command {
    fn guard(&self) -> Option<RouteGuard> {
        match self {
            Command::Login { .. } | Command::Register { .. } => Some(RouteGuard::Guest),
            Command::Logout | Command::Status => None,
            _ => Some(RouteGuard::Authenticated),
        }
    }
}

pub async fn run(command: Command, client: &ApiClient) -> Result<()> {
    if let Some(guard) = command.guard() {
        enforce(guard, client)?;
    }

    match command {
        Command::Login { email } => login(client, email).await,
        Command::Register { name, email } => register(client, &name, &email).await,
        Command::Logout => {
            client.session().logout();
            Ok(())
        }
        Command::Whoami => whoami(client),
        Command::Status => status(client),
        Command::Profile => {
            let profile = client.fetch_profile().await?;
            println!("{} <{}>", profile.name, profile.email);
            println!("id: {}", profile.user_id);
            Ok(())
        }
        Command::Breeds { query, page, limit } => {
            let query = BreedQuery { q: query, page, limit };
            let breeds = client.breeds(&query).await?;
            print_breeds(&breeds);
            Ok(())
        }
        Command::Breed { id } => {
            let breed = client.breed(&id).await?;
            print_breed(&breed);
            Ok(())
        }
        Command::Search {
            term,
            affection,
            energy,
            child_friendly,
            hypoallergenic,
            hairless,
            natural,
            rare,
        } => {
            let filter = BreedFilter {
                affection_level: affection,
                energy_level: energy,
                child_friendly,
                hypoallergenic,
                hairless,
                natural,
                rare,
            };
            let breeds = client.find_breeds(&term, &filter).await?;
            print_breeds(&breeds);
            Ok(())
        }
        Command::Stats { json } => {
            let stats = client.breed_statistics().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            println!("Breeds:             {}", stats.total_breeds);
            println!("Hypoallergenic:     {}", stats.hypoallergenic_breeds);
            println!("Average weight:     {} kg", stats.average_weight);
            println!("Most common origin: {}", stats.most_common_origin);
            Ok(())
        }
        Command::Images { breed, limit } => {
            let images = match breed {
                Some(breed_id) => client.images_by_breed(&breed_id, limit).await?,
                None => {
                    let query = ImageQuery {
                        limit,
                        size: Some(ImageSize::Medium),
                        ..Default::default()
                    };
                    client.images(&query).await?
                }
            };
            for image in &images {
                println!("{}  {}x{}  {}  {}", image.id, image.width, image.height, image.breed_names(), image.url);
            }
            Ok(())
        }
    }
}

/// Apply a view guard, ending expired sessions first.
fn enforce(guard: RouteGuard, client: &ApiClient) -> Result<()> {
    let session = client.session();
    if session.is_authenticated() {
        session.refresh_token_if_needed();
    }

    match guard.check(session) {
        GuardOutcome::Allow => Ok(()),
        GuardOutcome::Redirect(Route::Login) => {
            bail!("Not signed in. Run `catsapp login` first.")
        }
        GuardOutcome::Redirect(Route::Dashboard) => {
            let name = session
                .snapshot()
                .profile()
                .map(|p| p.name.clone())
                .unwrap_or_default();
            bail!("Already signed in as {}. Run `catsapp logout` first.", name)
        }
    }
}

async fn login(client: &ApiClient, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    validate_email(&email)?;
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    validate_password(&password)?;

    let session = client.login(email.trim(), &password).await?;
    if let Some(profile) = session.profile() {
        println!("Welcome back, {}!", profile.name);
    }
    TerminalNavigator.navigate(Route::Dashboard);
    Ok(())
}

async fn register(client: &ApiClient, name: &str, email: &str) -> Result<()> {
    validate_name(name)?;
    validate_email(email)?;
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    validate_password(&password)?;
    let confirm = rpassword::prompt_password("Confirm password: ").context("Failed to read password")?;
    if confirm != password {
        bail!("Passwords do not match");
    }

    let session = client.register(name.trim(), email.trim(), &password).await?;
    if let Some(profile) = session.profile() {
        println!("Welcome, {}!", profile.name);
    }
    TerminalNavigator.navigate(Route::Dashboard);
    Ok(())
}

fn whoami(client: &ApiClient) -> Result<()> {
    let snapshot = client.session().snapshot();
    let profile = snapshot
        .profile()
        .ok_or_else(|| anyhow!("Not signed in"))?;
    println!("{} <{}>", profile.name, profile.email);
    Ok(())
}

fn status(client: &ApiClient) -> Result<()> {
    let session = client.session();
    let snapshot = session.snapshot();
    match snapshot.profile() {
        Some(profile) => println!("Signed in as {} <{}>", profile.name, profile.email),
        None => println!("Signed out"),
    }

    if snapshot.is_authenticated() {
        match session.token_expiry() {
            Some(expiry) if !session.is_token_expired() => {
                let remaining = expiry - chrono::Utc::now();
                println!(
                    "Token expires {} ({} minutes left)",
                    expiry.format("%Y-%m-%d %H:%M UTC"),
                    remaining.num_minutes().max(0)
                );
            }
            Some(expiry) => println!("Token expired {}", expiry.format("%Y-%m-%d %H:%M UTC")),
            None => println!("Token expiry unknown; it will be treated as expired"),
        }
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().chars().count() < MIN_NAME_LENGTH {
        bail!("Name must be at least {} characters", MIN_NAME_LENGTH);
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        bail!("'{}' is not a valid email address", email);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        bail!("Password must be at least {} characters", MIN_PASSWORD_LENGTH);
    }
    Ok(())
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn print_breeds(breeds: &[CatBreed]) {
    if breeds.is_empty() {
        println!("No breeds found");
        return;
    }
    for breed in breeds {
        let description = breed.description.as_deref().unwrap_or("");
        println!(
            "{:<6} {:<24} {:<16} {}",
            breed.id,
            breed.name,
            breed.origin_display(),
            truncate(description, DESCRIPTION_WIDTH)
        );
    }
}

fn print_breed(breed: &CatBreed) {
    println!("{} ({})", breed.name, breed.id);
    println!("Origin:       {}", breed.origin_display());
    if let Some(ref temperament) = breed.temperament {
        println!("Temperament:  {}", temperament);
    }
    if let Some(ref life_span) = breed.life_span {
        println!("Life span:    {} years", life_span);
    }
    if let Some(ref weight) = breed.weight {
        println!("Weight:       {} kg", weight.metric);
    }
    println!("Hypoallergenic: {}", if breed.is_hypoallergenic() { "yes" } else { "no" });
    if let Some(ref description) = breed.description {
        println!();
        println!("{}", description);
    }
}
