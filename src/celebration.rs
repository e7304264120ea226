//! Milestone notifications (the confetti burst in a graphical front end).
//!
//! Sinks are optional and fire-and-forget: the core calls `celebrate` and moves
//! on, whatever the sink does with it.

use colored::Colorize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Celebration {
    RecipeCompleted { recipe_id: String },
    RouletteLanded { recipe_id: String },
}

impl Celebration {
    pub fn recipe_id(&self) -> &str {
        match self {
            Celebration::RecipeCompleted { recipe_id } | Celebration::RouletteLanded { recipe_id } => {
                recipe_id
            }
        }
    }

    /// How big the burst should be.
    pub fn particle_count(&self) -> u32 {
        match self {
            Celebration::RecipeCompleted { .. } => 100,
            Celebration::RouletteLanded { .. } => 50,
        }
    }
}

pub trait CelebrationSink: Send + Sync {
    fn celebrate(&self, event: &Celebration);
}

/// Records celebrations in the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCelebration;

impl CelebrationSink for LogCelebration {
    fn celebrate(&self, event: &Celebration) {
        tracing::info!(
            recipe_id = event.recipe_id(),
            particles = event.particle_count(),
            "celebration"
        );
    }
}

/// Prints a small burst of sparkles to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalConfetti;

impl CelebrationSink for TerminalConfetti {
    fn celebrate(&self, event: &Celebration) {
        let width = (event.particle_count() / 5) as usize;
        eprintln!("{}", "*".repeat(width).bright_yellow());
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<Celebration>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn events(&self) -> Vec<Celebration> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl CelebrationSink for RecordingSink {
    fn celebrate(&self, event: &Celebration) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_bursts_are_bigger_than_roulette_bursts() {
        let done = Celebration::RecipeCompleted {
            recipe_id: "1".to_string(),
        };
        let spun = Celebration::RouletteLanded {
            recipe_id: "2".to_string(),
        };
        assert_eq!(done.particle_count(), 100);
        assert_eq!(spun.particle_count(), 50);
        assert_eq!(spun.recipe_id(), "2");
    }
}
