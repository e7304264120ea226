//! Momma Marinade, the scripted kitchen assistant
//!
//! Replies come from a fixed rule table, not a language model:
//!
//! 1. anything mentioning "recipe" or "cook" gets a random recipe suggestion;
//! 2. otherwise the first keyword found picks one of that keyword's responses;
//! 3. otherwise one of the default responses.
//!
//! [`ChatSession`] wraps the matcher with a transcript and a simulated typing
//! delay. While a reply is being composed further messages are turned away.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use ulid::Ulid;

use crate::catalog::Catalog;
use crate::random::{RandomSource, delay_between, pick_one};

pub const ASSISTANT_NAME: &str = "Momma Marinade";

pub const GREETING: &str = "Hey there, sugar! I'm Momma Marinade, your culinary confidante. Ready to whip up something delicious?";

pub const QUICK_PROMPTS: [&str; 4] = [
    "What should I cook today?",
    "Give me a cooking tip",
    "I don't have an ingredient",
    "Help me with this step",
];

const RECIPE_TRIGGERS: [&str; 2] = ["recipe", "cook"];

#[derive(Debug)]
pub struct ResponseRule {
    pub keyword: &'static str,
    /// Other phrases that select the same responses.
    pub synonyms: &'static [&'static str],
    pub responses: &'static [&'static str],
}

impl ResponseRule {
    fn matches(&self, input: &str) -> bool {
        input.contains(self.keyword) || self.synonyms.iter().any(|s| input.contains(s))
    }
}

/// Checked in order; the first hit wins.
pub static RESPONSE_TABLE: [ResponseRule; 4] = [
    ResponseRule {
        keyword: "what should i cook today",
        synonyms: &[],
        responses: &[
            "Well honey, how about trying that Double-Decker Burger Sauce? It's a crowd-pleaser and easy as pie!",
            "Sugar, I'm thinking some 11-Spice Crispy Chicken would hit the spot today. What do you say?",
            "Darlin', why don't you give that Sweet Tangy Dipping Sauce a whirl? Perfect for snackin'!",
        ],
    },
    ResponseRule {
        keyword: "give me a cooking tip",
        synonyms: &[],
        responses: &[
            "Remember sugar, taste as you go! Your tongue is your best friend in the kitchen.",
            "Honey, always let your sauces rest for 10 minutes before serving - it lets all them flavors get acquainted!",
            "Pro tip from Momma: Room temperature ingredients mix better than cold ones straight from the fridge!",
        ],
    },
    ResponseRule {
        keyword: "i don't have",
        synonyms: &["don't have", "missing"],
        responses: &[
            "No worries, sugar! For buttermilk, just add 1 tbsp of vinegar to regular milk. Works like a charm!",
            "Out of an ingredient? Honey, cooking is all about improvising! Tell me what you're missing and I'll help you find a swap.",
            "Don't you fret, darlin'! Most ingredients have perfect substitutes. What are you looking to replace?",
        ],
    },
    ResponseRule {
        keyword: "help me",
        synonyms: &[],
        responses: &[
            "Of course, honey! Momma's here to help. What step are you stuck on?",
            "Sugar, don't worry - we've all been there! What's giving you trouble?",
            "That's what I'm here for, darlin'! Walk me through what's happening in your kitchen.",
        ],
    },
];

pub static DEFAULT_RESPONSES: [&str; 3] = [
    "Well bless your heart! I'm here to help with all your cooking questions, sugar.",
    "Hmm darlin', try asking me about a recipe or a cooking tip! I'm full of kitchen wisdom.",
    "Honey, I'm your culinary confidante! Ask me about ingredients, recipes, or cooking techniques.",
];

/// Which rule produced a reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchedRule {
    RecipeSuggestion { recipe_id: String },
    Keyword(&'static str),
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub rule: MatchedRule,
}

pub fn recipe_suggestion(title: &str) -> String {
    format!("How about trying the {title}? It's one of my favorites! Want me to show you the recipe?")
}

/// Matches one utterance against the rule table. With an empty catalog the
/// recipe rule is skipped and matching continues down the table.
pub fn reply(utterance: &str, catalog: &Catalog, rng: &mut dyn RandomSource) -> Reply {
    let input = utterance.trim().to_lowercase();

    if RECIPE_TRIGGERS.iter().any(|t| input.contains(t)) {
        if let Some(recipe) = pick_one(catalog.recipes(), rng) {
            return Reply {
                text: recipe_suggestion(&recipe.title),
                rule: MatchedRule::RecipeSuggestion {
                    recipe_id: recipe.id.clone(),
                },
            };
        }
    }

    if let Some(rule) = RESPONSE_TABLE.iter().find(|rule| rule.matches(&input)) {
        if let Some(text) = pick_one(rule.responses, rng) {
            return Reply {
                text: text.to_string(),
                rule: MatchedRule::Keyword(rule.keyword),
            };
        }
    }

    let text = pick_one(&DEFAULT_RESPONSES, rng).copied().unwrap_or(DEFAULT_RESPONSES[0]);
    Reply {
        text: text.to_string(),
        rule: MatchedRule::Fallback,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("{ASSISTANT_NAME} is still typing")]
    Composing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Composing,
}

/// How long the assistant "types" before a reply appears.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypingDelay {
    pub min: Duration,
    pub max: Duration,
}

impl Default for TypingDelay {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(1000),
            max: Duration::from_millis(2000),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Puts the session back to idle when a send finishes or its future is dropped.
struct ComposingGuard<'a> {
    state: &'a Mutex<ChatState>,
}

impl Drop for ComposingGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = ChatState::Idle;
    }
}

pub struct ChatSession {
    catalog: Arc<Catalog>,
    rng: Mutex<Box<dyn RandomSource>>,
    typing: TypingDelay,
    state: Mutex<ChatState>,
    transcript: Mutex<Vec<ChatMessage>>,
}

impl ChatSession {
    /// A new session whose transcript opens with the assistant's greeting.
    pub fn new(catalog: Arc<Catalog>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            catalog,
            rng: Mutex::new(rng),
            typing: TypingDelay::default(),
            state: Mutex::new(ChatState::Idle),
            transcript: Mutex::new(vec![ChatMessage::new(Sender::Assistant, GREETING)]),
        }
    }

    pub fn with_typing_delay(mut self, typing: TypingDelay) -> Self {
        self.typing = typing;
        self
    }

    pub fn state(&self) -> ChatState {
        *lock(&self.state)
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        lock(&self.transcript).clone()
    }

    /// Appends the user's message, waits out the typing delay, then appends
    /// and returns the assistant's reply.
    pub async fn send(&self, text: &str) -> Result<ChatMessage, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let delay = {
            let mut state = lock(&self.state);
            if *state == ChatState::Composing {
                tracing::debug!("rejecting message while a reply is pending");
                return Err(ChatError::Composing);
            }
            *state = ChatState::Composing;
            lock(&self.transcript).push(ChatMessage::new(Sender::User, text));
            let mut rng = lock(&self.rng);
            delay_between(self.typing.min, self.typing.max, rng.as_mut())
        };
        let _composing = ComposingGuard { state: &self.state };

        tokio::time::sleep(delay).await;

        let reply = {
            let mut rng = lock(&self.rng);
            reply(text, &self.catalog, rng.as_mut())
        };
        tracing::debug!(rule = ?reply.rule, "assistant replied");

        let message = ChatMessage::new(Sender::Assistant, reply.text);
        lock(&self.transcript).push(message.clone());
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::testing::Scripted;
    use crate::random::seeded;

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn recipe_keyword_wins_over_the_table() {
        let catalog = catalog();
        let mut rng = Scripted::new([4]);
        let reply = reply("recipe please, help me", &catalog, &mut rng);
        assert_eq!(
            reply.rule,
            MatchedRule::RecipeSuggestion {
                recipe_id: "5".to_string()
            }
        );
        assert_eq!(reply.text, recipe_suggestion("Layered Iced Coffee"));
    }

    #[test]
    fn recipe_please_always_suggests_a_recipe() {
        let catalog = catalog();
        let mut rng = seeded(11);
        for _ in 0..50 {
            let reply = reply("recipe please", &catalog, &mut *rng);
            assert!(matches!(reply.rule, MatchedRule::RecipeSuggestion { .. }));
        }
    }

    #[test]
    fn cook_inside_a_quick_prompt_triggers_a_suggestion() {
        let catalog = catalog();
        let mut rng = seeded(1);
        for prompt in ["What should I cook today?", "Give me a cooking tip"] {
            let reply = reply(prompt, &catalog, &mut *rng);
            assert!(matches!(reply.rule, MatchedRule::RecipeSuggestion { .. }));
        }
    }

    #[test]
    fn table_keywords_match_in_order() {
        let catalog = catalog();
        let mut rng = seeded(2);
        let cases = [
            ("I don't have eggs", "i don't have"),
            ("We don't have milk", "i don't have"),
            ("I'm missing the paprika", "i don't have"),
            ("Help me with this step", "help me"),
            ("  HELP ME  ", "help me"),
        ];
        for (input, keyword) in cases {
            let reply = reply(input, &catalog, &mut *rng);
            assert_eq!(reply.rule, MatchedRule::Keyword(keyword), "{input}");
            let rule = RESPONSE_TABLE.iter().find(|r| r.keyword == keyword).unwrap();
            assert!(rule.responses.contains(&reply.text.as_str()));
        }
    }

    #[test]
    fn every_table_response_is_reachable() {
        let empty = Catalog::default();
        for rule in RESPONSE_TABLE.iter() {
            for (index, expected) in rule.responses.iter().enumerate() {
                let mut rng = Scripted::new([index]);
                let reply = reply(rule.keyword, &empty, &mut rng);
                assert_eq!(reply.rule, MatchedRule::Keyword(rule.keyword));
                assert_eq!(reply.text, *expected);
            }
        }
        for (index, expected) in DEFAULT_RESPONSES.iter().enumerate() {
            let mut rng = Scripted::new([index]);
            let reply = reply("good morning", &empty, &mut rng);
            assert_eq!(reply.rule, MatchedRule::Fallback);
            assert_eq!(reply.text, *expected);
        }
    }

    #[test]
    fn empty_catalog_skips_the_recipe_rule() {
        let empty = Catalog::default();
        let mut rng = Scripted::new([0]);
        let reply = reply("what should i cook today", &empty, &mut rng);
        assert_eq!(reply.rule, MatchedRule::Keyword("what should i cook today"));
    }

    #[test]
    fn unmatched_input_falls_back() {
        let catalog = catalog();
        let mut rng = seeded(5);
        let reply = reply("hello there", &catalog, &mut *rng);
        assert_eq!(reply.rule, MatchedRule::Fallback);
        assert!(DEFAULT_RESPONSES.contains(&reply.text.as_str()));
    }

    fn session() -> ChatSession {
        ChatSession::new(
            Arc::new(catalog()),
            Box::new(Scripted::new([0]).with_fraction(0.5)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn reply_lands_after_the_typing_delay() {
        let session = session();
        let started = tokio::time::Instant::now();
        let message = session.send("  help me  ").await.unwrap();
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(1500) && waited < Duration::from_millis(2000));

        assert_eq!(message.sender, Sender::Assistant);
        assert_eq!(message.text, RESPONSE_TABLE[3].responses[0]);
        assert_eq!(session.state(), ChatState::Idle);

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].text, GREETING);
        assert_eq!(transcript[1].sender, Sender::User);
        assert_eq!(transcript[1].text, "help me");
        assert_eq!(transcript[2], message);
    }

    #[tokio::test(start_paused = true)]
    async fn messages_while_composing_are_rejected() {
        let session = session();
        let (first, second) = tokio::join!(session.send("hi"), session.send("again"));
        assert!(first.is_ok());
        assert_eq!(second, Err(ChatError::Composing));

        let senders: Vec<Sender> = session.transcript().iter().map(|m| m.sender).collect();
        assert_eq!(
            senders,
            vec![Sender::Assistant, Sender::User, Sender::Assistant]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn replies_follow_their_messages_in_order() {
        let session = session();
        for text in ["one", "two", "three"] {
            session.send(text).await.unwrap();
        }
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 7);
        for (pair, text) in transcript[1..].chunks(2).zip(["one", "two", "three"]) {
            assert_eq!(pair[0].sender, Sender::User);
            assert_eq!(pair[0].text, text);
            assert_eq!(pair[1].sender, Sender::Assistant);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn blank_messages_are_ignored() {
        let session = session();
        assert_eq!(session.send("   ").await, Err(ChatError::EmptyMessage));
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_pending_reply_returns_to_idle() {
        let session = session();
        let pending = tokio::time::timeout(Duration::from_millis(10), session.send("hi")).await;
        assert!(pending.is_err());
        assert_eq!(session.state(), ChatState::Idle);
        assert_eq!(session.transcript().len(), 2);
        assert!(session.send("hi again").await.is_ok());
    }
}
