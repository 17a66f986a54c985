//! Rule-based intent matcher for the monument chatbot.
//!
//! Input is lower-cased and tested against each rule's trigger substrings in
//! order; the first rule with any trigger contained in the input wins. The
//! default order is greeting, gratitude, farewell, history, architecture,
//! religious, visiting, nearby, identity, and unmatched input falls back to a
//! random "general" response.
//!
//! Matching is plain substring containment, so short triggers fire inside
//! longer words ("hi" in "history", "old" in "hold"). The default order keeps
//! that behaviour; callers wanting a different precedence build the matcher
//! with [`IntentMatcher::with_order`].

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use super::responses::{Category, ResponseTable};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Gratitude,
    Farewell,
    History,
    Architecture,
    Religious,
    Visiting,
    Nearby,
    Identity,
    /// Nothing matched.
    General,
}

impl Intent {
    /// Rule order used by [`IntentMatcher::new`].
    pub const DEFAULT_ORDER: [Intent; 9] = [
        Intent::Greeting,
        Intent::Gratitude,
        Intent::Farewell,
        Intent::History,
        Intent::Architecture,
        Intent::Religious,
        Intent::Visiting,
        Intent::Nearby,
        Intent::Identity,
    ];

    pub fn triggers(&self) -> &'static [&'static str] {
        match self {
            Intent::Greeting => &["hello", "hi", "hey", "namaste"],
            Intent::Gratitude => &["thank", "thanks"],
            Intent::Farewell => &["bye", "goodbye"],
            Intent::History => &["history", "past", "old"],
            Intent::Architecture => &["architect", "built", "structure", "design"],
            Intent::Religious => &["religious", "spiritual", "sacred", "holy", "jyotirlinga"],
            Intent::Visiting => &["visit", "timing", "ticket", "entry", "open"],
            Intent::Nearby => &["nearby", "around", "close", "attraction"],
            Intent::Identity => &["who are you", "what are you", "about you"],
            Intent::General => &[],
        }
    }

    /// Category the reply is drawn from, or `None` for the fixed replies.
    pub fn category(&self) -> Option<Category> {
        match self {
            Intent::History => Some(Category::History),
            Intent::Architecture => Some(Category::Architecture),
            Intent::Religious => Some(Category::ReligiousSignificance),
            Intent::Visiting => Some(Category::Visiting),
            Intent::Nearby => Some(Category::NearbyAttractions),
            Intent::General => Some(Category::General),
            Intent::Greeting | Intent::Gratitude | Intent::Farewell | Intent::Identity => None,
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.triggers().iter().any(|t| lowered.contains(t))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub intent: Intent,
    pub reply: String,
}

#[derive(Debug, Clone)]
pub struct IntentMatcher {
    order: Vec<Intent>,
    table: Arc<ResponseTable>,
}

impl IntentMatcher {
    pub fn new(table: Arc<ResponseTable>) -> Self {
        Self {
            order: Intent::DEFAULT_ORDER.to_vec(),
            table,
        }
    }

    /// Matcher with a caller-chosen rule precedence.
    ///
    /// `order` must list each of the nine matchable intents exactly once;
    /// `General` is always the implicit last resort and may not appear.
    pub fn with_order(table: Arc<ResponseTable>, order: &[Intent]) -> Result<Self, AppError> {
        if order.contains(&Intent::General) {
            return Err(AppError::Validation(
                "General is the fallback and cannot be ordered".into(),
            ));
        }
        for intent in Intent::DEFAULT_ORDER {
            let n = order.iter().filter(|i| **i == intent).count();
            if n != 1 {
                return Err(AppError::Validation(format!(
                    "intent {:?} must appear exactly once in the rule order (found {n})",
                    intent
                )));
            }
        }
        Ok(Self {
            order: order.to_vec(),
            table,
        })
    }

    pub fn order(&self) -> &[Intent] {
        &self.order
    }

    pub fn table(&self) -> &ResponseTable {
        &self.table
    }

    /// First matching intent for `input`, or `General`.
    pub fn classify(&self, input: &str) -> Intent {
        let lowered = input.to_lowercase();
        self.order
            .iter()
            .copied()
            .find(|intent| intent.matches(&lowered))
            .unwrap_or(Intent::General)
    }

    /// Classify `input` and pick the reply, drawing from `rng` for list categories.
    pub fn respond<R: Rng + ?Sized>(&self, input: &str, rng: &mut R) -> MatchResult {
        let intent = self.classify(input);
        let fixed = &self.table.fixed;
        let reply = match intent {
            Intent::Greeting => fixed.greeting.clone(),
            Intent::Gratitude => fixed.thanks.clone(),
            Intent::Farewell => fixed.farewell.clone(),
            Intent::Identity => fixed.identity.clone(),
            other => {
                // Every intent without a fixed reply has a category.
                let category = other.category().unwrap_or(Category::General);
                self.table
                    .candidates(category)
                    .choose(rng)
                    .cloned()
                    .unwrap_or_else(|| fixed.greeting.clone())
            }
        };

        tracing::trace!(?intent, "Chat input matched");
        MatchResult { intent, reply }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn matcher() -> IntentMatcher {
        IntentMatcher::new(Arc::new(ResponseTable::somnath()))
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_fixed_replies_are_exact() {
        let m = matcher();
        let table = ResponseTable::somnath();
        assert_eq!(m.respond("Namaste!", &mut rng()).reply, table.fixed.greeting);
        assert_eq!(m.respond("Thank you so much", &mut rng()).reply, table.fixed.thanks);
        assert_eq!(m.respond("ok bye", &mut rng()).reply, table.fixed.farewell);
        assert_eq!(m.respond("Who are you?", &mut rng()).reply, table.fixed.identity);
    }

    #[test]
    fn test_categories_draw_from_their_list() {
        let m = matcher();
        let table = ResponseTable::somnath();
        let cases = [
            ("How old is the temple", Category::History),
            ("describe the structure", Category::Architecture),
            ("is it a sacred place", Category::ReligiousSignificance),
            ("what are the timings", Category::Visiting),
            ("any attractions nearby?", Category::NearbyAttractions),
            ("mango", Category::General),
        ];
        for (input, category) in cases {
            let result = m.respond(input, &mut rng());
            assert!(
                table.candidates(category).contains(&result.reply),
                "{input:?} -> {:?}",
                result.intent
            );
        }
    }

    #[test]
    fn test_first_match_wins() {
        let m = matcher();
        // history before architecture
        assert_eq!(m.classify("what is the past design"), Intent::History);
        // greeting before everything; "hi" hides inside "history"
        assert_eq!(m.classify("HISTORY please"), Intent::Greeting);
        // identity is checked after the category rules
        assert_eq!(m.classify("what are you, an old spirit?"), Intent::History);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(matcher().classify("JYOTIRLINGA"), Intent::Religious);
    }

    #[test]
    fn test_custom_order() {
        let mut order = Intent::DEFAULT_ORDER.to_vec();
        // Move greeting to the end so "history" is no longer captured by "hi".
        order.rotate_left(1);
        let m = IntentMatcher::with_order(Arc::new(ResponseTable::somnath()), &order).unwrap();
        assert_eq!(m.classify("history please"), Intent::History);
        assert_eq!(m.classify("hello"), Intent::Greeting);
    }

    #[test]
    fn test_custom_order_validation() {
        let table = Arc::new(ResponseTable::somnath());
        assert!(IntentMatcher::with_order(table.clone(), &[Intent::History]).is_err());

        let mut dup = Intent::DEFAULT_ORDER.to_vec();
        dup[0] = Intent::History;
        assert!(IntentMatcher::with_order(table.clone(), &dup).is_err());

        let mut with_general = Intent::DEFAULT_ORDER.to_vec();
        with_general.push(Intent::General);
        assert!(IntentMatcher::with_order(table, &with_general).is_err());
    }
}
