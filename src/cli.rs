use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search the recipe vault by text and filters
    Search {
        /// Matched case-insensitively against titles and descriptions
        #[arg(default_value = "")]
        query: String,
        /// Filter value such as "Easy", "Vegan" or "<15 min" (repeatable, all must match)
        #[arg(short = 'f', long = "filter")]
        filters: Vec<String>,
    },
    /// List the available filter values by family
    Facets,
    /// Show a recipe with your progress on it
    Show { id: String },
    /// Add or remove a recipe from your favorites
    Favorite { id: String },
    /// Tick or untick an ingredient (numbered from 1)
    Ingredient { id: String, number: usize },
    /// Tick or untick a step (numbered from 1)
    Step { id: String, number: usize },
    /// Show or replace your kitchen note for a recipe
    Note {
        id: String,
        /// New note text (at most 500 characters are kept)
        text: Option<String>,
    },
    /// Set servings ("4") or adjust them ("+1", "-1")
    Servings {
        id: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// Mark a recipe as cooked once every step is ticked
    Complete { id: String },
    /// Show stats and achievements
    Profile,
    /// Spin for a random recipe
    Roulette,
    /// Chat with Momma Marinade (interactive when no message is given)
    Chat { message: Option<String> },
    /// List sauces and bundles in the pantry
    Pantry,
    /// Forget all favorites and completed recipes
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print version information
    Version,
}

/// How a `servings` amount should be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServingsChange {
    Set(u32),
    Adjust(i32),
}

impl std::str::FromStr for ServingsChange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('+') || s.starts_with('-') {
            s.parse::<i32>()
                .map(ServingsChange::Adjust)
                .map_err(|e| format!("Invalid servings adjustment '{s}': {e}"))
        } else {
            s.parse::<u32>()
                .map(ServingsChange::Set)
                .map_err(|e| format!("Invalid servings '{s}': {e}"))
        }
    }
}

/// Turns a 1-based number from the command line into an index.
pub fn to_index(number: usize) -> Result<usize, String> {
    number
        .checked_sub(1)
        .ok_or_else(|| "Numbers start at 1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_filters() {
        let cli = Cli::try_parse_from(["secret-sauce", "search", "sauce", "-f", "Easy", "-f", "Vegan"])
            .unwrap();
        match cli.command {
            Command::Search { query, filters } => {
                assert_eq!(query, "sauce");
                assert_eq!(filters, vec!["Easy", "Vegan"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_settings_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["secret-sauce", "roulette", "--seed", "9", "--spin-ms", "10"]).unwrap();
        assert_eq!(cli.settings.seed, Some(9));
        assert_eq!(cli.settings.spin_ms, 10);
    }

    #[test]
    fn servings_amounts() {
        assert_eq!("4".parse(), Ok(ServingsChange::Set(4)));
        assert_eq!("+2".parse(), Ok(ServingsChange::Adjust(2)));
        assert_eq!("-1".parse(), Ok(ServingsChange::Adjust(-1)));
        assert!("lots".parse::<ServingsChange>().is_err());

        let cli = Cli::try_parse_from(["secret-sauce", "servings", "1", "-1"]).unwrap();
        assert!(matches!(cli.command, Command::Servings { amount, .. } if amount == "-1"));
    }

    #[test]
    fn numbers_start_at_one() {
        assert_eq!(to_index(1), Ok(0));
        assert!(to_index(0).is_err());
    }
}
