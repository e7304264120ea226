use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use secret_sauce::achievements::{self, Progress};
use secret_sauce::catalog::Catalog;
use secret_sauce::celebration::TerminalConfetti;
use secret_sauce::chat::{ASSISTANT_NAME, ChatSession, QUICK_PROMPTS, Sender};
use secret_sauce::cli::{Cli, Command, ServingsChange, to_index};
use secret_sauce::config::Settings;
use secret_sauce::error::{ServiceError, ServiceResult};
use secret_sauce::metadata::{PKG_NAME, PKG_VERSION};
use secret_sauce::random;
use secret_sauce::roulette::Roulette;
use secret_sauce::search::{facet_options, filter_recipes};
use secret_sauce::storage::{CompletionOutcome, StateStore};
use secret_sauce::types::{Recipe, scale_ingredient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ServiceResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    cli.settings.validate().map_err(ServiceError::FromString)?;

    if let Command::Version = cli.command {
        println!("{PKG_NAME} {PKG_VERSION}");
        return Ok(());
    }

    let app = App::open(cli.settings)?;
    app.run(cli.command).await
}

struct App {
    settings: Settings,
    catalog: Arc<Catalog>,
    state: StateStore,
}

impl App {
    fn open(settings: Settings) -> ServiceResult<Self> {
        let catalog = Catalog::load_or_builtin(settings.catalog.as_deref())?;
        let state = StateStore::open(settings.data_dir())?.with_celebration(Arc::new(TerminalConfetti));
        tracing::debug!(data_dir = %settings.data_dir().display(), "opened state store");
        Ok(Self {
            settings,
            catalog: Arc::new(catalog),
            state,
        })
    }

    fn recipe(&self, id: &str) -> ServiceResult<&Recipe> {
        self.catalog
            .recipe(id)
            .ok_or_else(|| ServiceError::UnknownRecipe(id.to_string()))
    }

    async fn run(&self, command: Command) -> ServiceResult<()> {
        match command {
            Command::Search { query, filters } => self.search(&query, &filters),
            Command::Facets => {
                for (family, options) in facet_options() {
                    println!("{:<12} {}", family.as_str().bold(), options.join(", "));
                }
                Ok(())
            }
            Command::Show { id } => self.show(&id),
            Command::Favorite { id } => {
                let recipe = self.recipe(&id)?;
                if self.state.toggle_favorite(&recipe.id)? {
                    println!("{} {}", "♥".red(), format!("Saved {} to favorites", recipe.title));
                } else {
                    println!("Removed {} from favorites", recipe.title);
                }
                Ok(())
            }
            Command::Ingredient { id, number } => {
                let recipe = self.recipe(&id)?;
                let index = to_index(number).map_err(ServiceError::FromString)?;
                match self.state.toggle_ingredient(recipe, index)? {
                    Some(checked) => {
                        let servings = self.state.servings(&recipe.id);
                        let item = recipe.scaled_ingredient(index, servings).unwrap_or_default();
                        println!("{} {item}", checkbox(checked));
                    }
                    None => println!("{}", format!("{} has no ingredient {number}", recipe.title).yellow()),
                }
                Ok(())
            }
            Command::Step { id, number } => {
                let recipe = self.recipe(&id)?;
                let index = to_index(number).map_err(ServiceError::FromString)?;
                match self.state.toggle_step(recipe, index)? {
                    Some(checked) => {
                        println!("{} {}", checkbox(checked), recipe.steps[index]);
                        let percent = self.state.progress(recipe).step_percent(recipe);
                        println!("{}", format!("{percent}% of steps done").dimmed());
                    }
                    None => println!("{}", format!("{} has no step {number}", recipe.title).yellow()),
                }
                Ok(())
            }
            Command::Note { id, text } => {
                let recipe = self.recipe(&id)?;
                match text {
                    Some(text) => {
                        let stored = self.state.set_note(&recipe.id, &text)?;
                        if stored.chars().count() < text.chars().count() {
                            println!("{}", "Note trimmed to 500 characters".yellow());
                        }
                        println!("Saved note for {}", recipe.title);
                    }
                    None => {
                        let note = self.state.note(&recipe.id);
                        if note.is_empty() {
                            println!("{}", "No kitchen notes yet".dimmed());
                        } else {
                            println!("{note}");
                        }
                    }
                }
                Ok(())
            }
            Command::Servings { id, amount } => {
                let recipe = self.recipe(&id)?;
                let servings = match amount.parse().map_err(ServiceError::FromString)? {
                    ServingsChange::Set(n) => self.state.set_servings(&recipe.id, n)?,
                    ServingsChange::Adjust(delta) => self.state.adjust_servings(&recipe.id, delta)?,
                };
                println!("{}: {servings} serving(s)", recipe.title);
                Ok(())
            }
            Command::Complete { id } => {
                let recipe = self.recipe(&id)?;
                match self.state.mark_completed(recipe)? {
                    CompletionOutcome::Completed => {
                        println!("{}", format!("Recipe completed! {} is in the books.", recipe.title).green().bold())
                    }
                    CompletionOutcome::AlreadyCompleted => println!("You've already cooked {}", recipe.title),
                    CompletionOutcome::StepsRemaining(n) => {
                        println!("{}", format!("{n} step(s) left before {} is done", recipe.title).yellow())
                    }
                }
                Ok(())
            }
            Command::Profile => {
                self.profile();
                Ok(())
            }
            Command::Roulette => self.roulette().await,
            Command::Chat { message } => self.chat(message).await,
            Command::Pantry => {
                for product in self.catalog.products() {
                    let price = match (product.original_price, product.savings()) {
                        (Some(original), Some(saved)) => format!(
                            "{} {} {}",
                            product.price.to_string().bold(),
                            original.to_string().strikethrough().dimmed(),
                            format!("save {saved}").green()
                        ),
                        _ => product.price.to_string().bold().to_string(),
                    };
                    println!("{}  {price}", product.name.bold());
                    println!("  {}", product.description.dimmed());
                }
                Ok(())
            }
            Command::Reset { yes } => {
                let confirmed = yes
                    || Confirm::with_theme(&ColorfulTheme::default())
                        .with_prompt("Forget all favorites and completed recipes?")
                        .default(false)
                        .interact()
                        .map_err(|e| ServiceError::Other(e.to_string()))?;
                if confirmed {
                    self.state.reset()?;
                    println!("Progress reset");
                }
                Ok(())
            }
            Command::Version => {
                println!("{PKG_NAME} {PKG_VERSION}");
                Ok(())
            }
        }
    }

    fn search(&self, query: &str, filters: &[String]) -> ServiceResult<()> {
        let results = filter_recipes(&self.catalog, query, filters);
        if let Some(reason) = &results.empty_reason {
            println!("{}", reason.to_string().yellow());
            return Ok(());
        }
        for recipe in &results.recipes {
            let marker = if self.state.is_favorite(&recipe.id) { "♥".red() } else { " ".normal() };
            println!(
                "{marker} {:>3}  {}  {}",
                recipe.id,
                recipe.title.bold(),
                format!("{} · {} · {}", recipe.category, recipe.difficulty, recipe.prep_time).dimmed()
            );
        }
        println!("{}", format!("{} recipe(s)", results.len()).dimmed());
        Ok(())
    }

    fn show(&self, id: &str) -> ServiceResult<()> {
        let recipe = self.recipe(id)?;
        let progress = self.state.progress(recipe);

        let mut badges = Vec::new();
        if self.state.is_favorite(&recipe.id) {
            badges.push("♥ favorite".red().to_string());
        }
        if self.state.is_completed(&recipe.id) {
            badges.push("✓ cooked".green().to_string());
        }
        println!("{} {}", recipe.title.bold().underline(), badges.join(" "));
        println!(
            "{}",
            format!(
                "{} · {} · {} · taste match {}/5",
                recipe.category, recipe.difficulty, recipe.prep_time, recipe.taste_match
            )
            .dimmed()
        );
        if !recipe.dietary_tags.is_empty() {
            println!("{}", recipe.dietary_tags.join(", ").cyan());
        }
        println!("\n{}", recipe.description);

        println!("\n{} ({} serving(s))", "Ingredients".bold(), progress.servings);
        for (i, item) in recipe.ingredients.iter().enumerate() {
            let item = scale_ingredient(item, progress.servings);
            println!("  {} {}. {item}", checkbox(progress.checked_ingredients.contains(&i)), i + 1);
        }

        println!("\n{} ({}% done)", "Steps".bold(), progress.step_percent(recipe));
        for (i, step) in recipe.steps.iter().enumerate() {
            println!("  {} {}. {step}", checkbox(progress.checked_steps.contains(&i)), i + 1);
        }

        if !progress.note.is_empty() {
            println!("\n{}\n{}", "Kitchen notes".bold(), progress.note);
        }
        if !recipe.wisdom.is_empty() {
            println!("\n{}\n{}", "Momma's wisdom".bold(), recipe.wisdom.italic());
        }
        if !recipe.pairings.is_empty() {
            println!("\n{}\n{}", "Perfect pairings".bold(), recipe.pairings);
        }
        if !recipe.story.is_empty() {
            println!("\n{}\n{}", "The story".bold(), recipe.story);
        }
        if let Some(similar) = recipe.similar_summary() {
            println!("\n{} {similar}", "Similar to:".bold());
        }
        println!("\n{}", recipe.share_text().dimmed());
        Ok(())
    }

    fn profile(&self) {
        let snapshot = self.state.snapshot();
        let stats = achievements::profile_stats(&self.catalog, &snapshot);
        println!("{}", "Your kitchen".bold().underline());
        println!("  Favorites      {}", stats.favorites);
        println!("  Cooked         {}", stats.completed);
        println!("  Cooking time   {} min", stats.cooking_minutes);
        println!(
            "  Achievements   {}/{}",
            stats.achievements_unlocked, stats.achievements_total
        );

        println!();
        let progress = Progress::from_snapshot(&self.catalog, &snapshot);
        for status in achievements::evaluate(&progress) {
            let a = status.achievement;
            if status.unlocked {
                println!("  {} {}  {}", a.icon, a.name.bold(), a.description);
            } else {
                println!("  {}", format!("🔒 {}  {}", a.name, a.description).dimmed());
            }
        }
    }

    async fn roulette(&self) -> ServiceResult<()> {
        let wheel = Roulette::new(random::source(self.settings.seed))
            .with_settle(self.settings.spin_duration())
            .with_celebration(Arc::new(TerminalConfetti));
        println!("{}", "Spinning the wheel...".dimmed());
        let recipe = wheel.spin(&self.catalog).await?;
        println!("Tonight you're making {}!", recipe.title.bold());
        println!("{}", format!("secret-sauce show {}", recipe.id).dimmed());
        Ok(())
    }

    async fn chat(&self, message: Option<String>) -> ServiceResult<()> {
        let session = ChatSession::new(self.catalog.clone(), random::source(self.settings.seed))
            .with_typing_delay(self.settings.typing_delay());
        for greeting in session.transcript() {
            print_message(greeting.sender, &greeting.text);
        }

        if let Some(message) = message {
            let reply = send(&session, &message).await?;
            print_message(reply.sender, &reply.text);
            return Ok(());
        }

        println!("{}", format!("Try: {}", QUICK_PROMPTS.join(" | ")).dimmed());
        println!("{}", "Leave the line blank to finish.".dimmed());
        let theme = ColorfulTheme::default();
        loop {
            let line: String = Input::with_theme(&theme)
                .with_prompt("You")
                .allow_empty(true)
                .interact_text()
                .map_err(|e| ServiceError::Other(e.to_string()))?;
            if line.trim().is_empty() {
                return Ok(());
            }
            let reply = send(&session, &line).await?;
            print_message(reply.sender, &reply.text);
        }
    }
}

async fn send(session: &ChatSession, text: &str) -> ServiceResult<secret_sauce::chat::ChatMessage> {
    eprintln!("{}", format!("{ASSISTANT_NAME} is typing...").dimmed());
    Ok(session.send(text).await?)
}

fn print_message(sender: Sender, text: &str) {
    match sender {
        Sender::Assistant => println!("{} {text}", format!("{ASSISTANT_NAME}:").magenta().bold()),
        Sender::User => println!("{} {text}", "You:".bold()),
    }
}

fn checkbox(checked: bool) -> colored::ColoredString {
    if checked { "[x]".green() } else { "[ ]".normal() }
}
