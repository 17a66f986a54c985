//! Canned chatbot responses.
//!
//! A `ResponseTable` holds the fixed replies (greeting, thanks, farewell,
//! identity) and the candidate lists the matcher draws from at random.
//! The builtin table is the Somnath Temple guide.

use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    General,
    History,
    Architecture,
    ReligiousSignificance,
    Visiting,
    NearbyAttractions,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::General,
        Category::History,
        Category::Architecture,
        Category::ReligiousSignificance,
        Category::Visiting,
        Category::NearbyAttractions,
    ];
}

#[derive(Debug, Clone)]
pub struct FixedReplies {
    pub greeting: String,
    pub thanks: String,
    pub farewell: String,
    pub identity: String,
}

#[derive(Debug, Clone)]
pub struct ResponseTable {
    /// First bot message of every conversation.
    pub seed_greeting: String,
    /// Auto-suggestion offered to a visitor who hasn't typed anything yet.
    pub welcome_prompt: String,
    pub fixed: FixedReplies,
    general: Vec<String>,
    history: Vec<String>,
    architecture: Vec<String>,
    religious_significance: Vec<String>,
    visiting: Vec<String>,
    nearby_attractions: Vec<String>,
}

impl ResponseTable {
    /// Build a table; every category must have at least one candidate.
    pub fn new(
        seed_greeting: String,
        welcome_prompt: String,
        fixed: FixedReplies,
        categories: impl IntoIterator<Item = (Category, Vec<String>)>,
    ) -> Result<Self, AppError> {
        let mut table = Self {
            seed_greeting,
            welcome_prompt,
            fixed,
            general: Vec::new(),
            history: Vec::new(),
            architecture: Vec::new(),
            religious_significance: Vec::new(),
            visiting: Vec::new(),
            nearby_attractions: Vec::new(),
        };
        for (category, responses) in categories {
            *table.slot_mut(category) = responses;
        }
        for category in Category::ALL {
            if table.candidates(category).is_empty() {
                return Err(AppError::Validation(format!(
                    "response category {:?} has no candidates",
                    category
                )));
            }
        }
        Ok(table)
    }

    pub fn candidates(&self, category: Category) -> &[String] {
        match category {
            Category::General => &self.general,
            Category::History => &self.history,
            Category::Architecture => &self.architecture,
            Category::ReligiousSignificance => &self.religious_significance,
            Category::Visiting => &self.visiting,
            Category::NearbyAttractions => &self.nearby_attractions,
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::General => &mut self.general,
            Category::History => &mut self.history,
            Category::Architecture => &mut self.architecture,
            Category::ReligiousSignificance => &mut self.religious_significance,
            Category::Visiting => &mut self.visiting,
            Category::NearbyAttractions => &mut self.nearby_attractions,
        }
    }

    /// The Somnath Temple guide.
    pub fn somnath() -> Self {
        fn owned(lines: &[&str]) -> Vec<String> {
            lines.iter().map(|s| s.to_string()).collect()
        }

        Self {
            seed_greeting: "Namaste! I am the divine voice of Somnath Temple. I see you're exploring this sacred shrine. Feel free to ask me about its history, architecture, or spiritual significance.".into(),
            welcome_prompt: "Welcome to the Somnath Temple virtual tour! I notice you're exploring this sacred shrine. Would you like me to tell you about its fascinating spiritual significance or architectural marvels?".into(),
            fixed: FixedReplies {
                greeting: "Namaste! I am the divine voice of Somnath Temple. How can I help you today?".into(),
                thanks: "You're welcome! It's my blessing to share the divine knowledge of Somnath Temple with you.".into(),
                farewell: "May Lord Shiva bless you. Farewell, and I hope to see you at Somnath Temple soon! Om Namah Shivaya.".into(),
                identity: "I am the divine AI avatar of Somnath Temple, here to share the rich history, spiritual significance, and cultural heritage of this sacred shrine with you.".into(),
            },
            general: owned(&[
                "Somnath Temple is one of the most sacred Hindu temples, dedicated to Lord Shiva and located in Prabhas Patan, Gujarat, India.",
                "The temple is known as 'the Shrine Eternal', as it has been destroyed and reconstructed several times in history.",
                "The current temple was reconstructed in the Chalukya style of Hindu temple architecture and completed in 1951.",
                "The temple is situated at the shore of the Arabian sea on the western coast of Gujarat.",
            ]),
            history: owned(&[
                "The original Somnath temple is believed to have been built in gold by the Moon God Soma.",
                "According to historical records, the temple has been destroyed and rebuilt at least 17 times.",
                "The first temple is said to have existed before the beginning of the Common Era.",
                "The temple was repeatedly destroyed by various Islamic invaders and rulers, including Mahmud of Ghazni in 1026, Allauddin Khilji in 1296, and Aurangzeb in 1706.",
                "After India's independence, Sardar Vallabhbhai Patel pledged to rebuild the temple, which was completed in 1951.",
            ]),
            architecture: owned(&[
                "The current temple is built in the Chalukya style of temple architecture or 'Kailash Mahameru Prasad' style.",
                "The temple's shikhara (spire) is 155 feet tall and adorned with 84 intricate sculptures.",
                "The temple has intricate carvings and silver doors.",
                "The main spire houses a Jyotirlinga, which is one of the twelve sacred Jyotirlingas in India.",
                "The temple has a flag post (dhwaja) 37 feet long, which is changed three times a day.",
            ]),
            religious_significance: owned(&[
                "Somnath is one of the 12 Jyotirlingas (lingams of light) of Lord Shiva, holding special significance in Hindu mythology.",
                "According to mythology, this is the place where Lord Krishna completed his earthly journey.",
                "The Somnath Jyotirlinga is believed to be the first among the twelve Jyotirlinga shrines of Shiva.",
                "It's mentioned in ancient texts like the Shiv Purana, Skanda Purana, and Shreemad Bhagavad.",
            ]),
            visiting: owned(&[
                "The temple is open for visitors from 6:00 AM to 9:30 PM every day.",
                "There is a magnificent Sound and Light show in the evening which narrates the history of the temple.",
                "Mahashivaratri is celebrated with great enthusiasm at the temple.",
                "The Somnath beach offers a beautiful view and is in close proximity to the temple.",
                "Photography is not allowed inside the main temple.",
            ]),
            nearby_attractions: owned(&[
                "Bhalka Tirth, where Lord Krishna was mistakenly shot by an arrow.",
                "Triveni Sangam, the confluence of three rivers - Kapila, Hiran, and Saraswati.",
                "Gita Mandir, a temple dedicated to Lord Krishna.",
                "Somnath Museum, which houses artifacts from the old temple.",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_somnath_has_every_category() {
        let table = ResponseTable::somnath();
        for category in Category::ALL {
            assert!(!table.candidates(category).is_empty(), "{:?}", category);
        }
        assert_eq!(table.candidates(Category::History).len(), 5);
    }

    #[test]
    fn test_new_rejects_empty_category() {
        let somnath = ResponseTable::somnath();
        let categories = Category::ALL
            .into_iter()
            .filter(|c| *c != Category::Visiting)
            .map(|c| (c, somnath.candidates(c).to_vec()))
            .collect::<Vec<_>>();
        let err = ResponseTable::new(
            somnath.seed_greeting.clone(),
            somnath.welcome_prompt.clone(),
            somnath.fixed.clone(),
            categories,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Visiting"));
    }
}
