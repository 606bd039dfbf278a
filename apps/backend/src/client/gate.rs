//! Classifier verdict interpretation for a submitted drawing.

use std::sync::Arc;

use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use super::archive::{Archive, ArchiveRecord};
use super::classifier::Classifier;
use super::drawing::Drawing;

/// Outcome of one classification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Match { guess: String },
    Miss { guess: String },
    /// No usable answer; the attempt is discarded.
    Unavailable,
}

/// Who submitted what, for the archive record.
#[derive(Debug, Clone, Copy)]
pub struct Attempt<'a> {
    pub game_id: &'a str,
    pub round: u32,
    pub address: &'a str,
}

pub struct ClassificationGate {
    classifier: Arc<dyn Classifier>,
    archive: Arc<dyn Archive>,
}

impl ClassificationGate {
    pub fn new(classifier: Arc<dyn Classifier>, archive: Arc<dyn Archive>) -> Self {
        Self {
            classifier,
            archive,
        }
    }

    /// Classify `drawing` against `target`. Never retries. Every attempt
    /// that produced a guess is archived in the background.
    pub async fn evaluate(&self, drawing: &Drawing, target: &str, attempt: Attempt<'_>) -> Verdict {
        let guess = match self.classifier.classify(drawing).await {
            Ok(guess) => guess,
            Err(e) => {
                warn!(
                    game_id = attempt.game_id,
                    round = attempt.round,
                    address = attempt.address,
                    error = %e,
                    "classification unavailable, attempt discarded"
                );
                return Verdict::Unavailable;
            }
        };

        self.archive_in_background(ArchiveRecord::new(
            attempt.game_id,
            attempt.round,
            target,
            &guess,
            attempt.address,
            drawing,
        ));

        let matched = guess_matches(&guess, target);
        debug!(game_id = attempt.game_id, round = attempt.round, %guess, matched, "drawing classified");
        if matched {
            Verdict::Match { guess }
        } else {
            Verdict::Miss { guess }
        }
    }

    fn archive_in_background(&self, record: ArchiveRecord) {
        let archive = Arc::clone(&self.archive);
        tokio::spawn(async move {
            let digest = record.digest.clone();
            if let Err(e) = archive.store(record).await {
                warn!(%digest, error = %e, "archiving attempt failed");
            }
        });
    }
}

/// Case-insensitive exact comparison after NFC normalization. No trimming.
pub fn guess_matches(guess: &str, target: &str) -> bool {
    fold(guess) == fold(target)
}

fn fold(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_ignores_case_only() {
        assert!(guess_matches("Cat", "cat"));
        assert!(guess_matches("CAT", "cat"));
        assert!(!guess_matches("Cats", "cat"));
        assert!(!guess_matches(" cat", "cat"));
        assert!(!guess_matches("", "cat"));
    }

    #[test]
    fn composed_and_decomposed_forms_match() {
        // "café" precomposed vs. "cafe" + combining acute accent
        assert!(guess_matches("Caf\u{e9}", "cafe\u{301}"));
        assert!(guess_matches("\u{c9}CLAIR", "\u{e9}clair"));
    }
}
