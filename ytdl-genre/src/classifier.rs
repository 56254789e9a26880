//! Genre classification pipeline
//!
//! Runs every model variant over the same audio, then votes.

use crate::tagger::{AudioInput, AudioTagger, ModelVariant, TaggerError};
use crate::vote::{compute_genre_detailed, GenreDecision, GenreVoteConfig, RankedTagList, VoteError, LIST_COUNT};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Classification errors
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// One model invocation failed
    #[error("Tagging with {variant} failed: {source}")]
    Tagger {
        variant: ModelVariant,
        #[source]
        source: TaggerError,
    },

    /// The audio could not be readied for tagging
    #[error("Preparing audio failed: {0}")]
    Input(#[source] TaggerError),

    /// Voting rejected the collected lists
    #[error(transparent)]
    Vote(#[from] VoteError),

    /// Concurrency limiter closed (service shutting down)
    #[error("Classifier unavailable")]
    Unavailable,
}

/// Tags audio with all model variants and votes on the genre
#[derive(Clone)]
pub struct GenreClassifier {
    tagger: Arc<dyn AudioTagger>,
    vote: Arc<GenreVoteConfig>,
    permits: Arc<Semaphore>,
}

impl GenreClassifier {
    /// `max_concurrent` bounds how many classifications run at once
    pub fn new(tagger: Arc<dyn AudioTagger>, vote: GenreVoteConfig, max_concurrent: usize) -> Self {
        Self {
            tagger,
            vote: Arc::new(vote),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Collect the ranked list of every variant, in voting order
    pub async fn collect_tags(
        &self,
        input: &AudioInput,
    ) -> Result<[RankedTagList; LIST_COUNT], ClassifyError> {
        let mut lists: [RankedTagList; LIST_COUNT] = Default::default();

        for (slot, variant) in lists.iter_mut().zip(ModelVariant::ALL) {
            let list = self
                .tagger
                .top_tags(input, variant, self.vote.top_n)
                .await
                .map_err(|source| ClassifyError::Tagger { variant, source })?;
            debug!(model = %variant, tags = ?list.tags(), "Model tags");
            *slot = list;
        }

        Ok(lists)
    }

    /// Classify one audio input
    pub async fn classify(&self, input: &AudioInput) -> Result<GenreDecision, ClassifyError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ClassifyError::Unavailable)?;

        let prepared = self.tagger.prepare(input).await.map_err(ClassifyError::Input)?;
        let lists = self.collect_tags(prepared.input()).await;
        prepared.release().await;

        let decision = compute_genre_detailed(&self.vote, &lists?)?;

        debug!(scores = ?decision.scores, "Genre vote");
        info!(
            input = %input.describe(),
            tagger = self.tagger.name(),
            genre = %decision.genre,
            source = ?decision.source,
            "Genre classified"
        );

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vote::SelectionSource;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedTagger {
        lists: HashMap<ModelVariant, Vec<&'static str>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AudioTagger for FixedTagger {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn top_tags(
            &self,
            _input: &AudioInput,
            variant: ModelVariant,
            _top_n: usize,
        ) -> Result<RankedTagList, TaggerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.lists.get(&variant) {
                Some(tags) => Ok(tags.clone().into()),
                None => Err(TaggerError::ExecutionError(format!("no output for {}", variant))),
            }
        }
    }

    fn classifier(lists: Vec<(ModelVariant, Vec<&'static str>)>) -> (GenreClassifier, Arc<FixedTagger>) {
        let tagger = Arc::new(FixedTagger {
            lists: lists.into_iter().collect(),
            calls: AtomicUsize::new(0),
        });
        let vote = GenreVoteConfig {
            top_n: 2,
            ..GenreVoteConfig::default()
        };
        (GenreClassifier::new(tagger.clone(), vote, 1), tagger)
    }

    #[tokio::test]
    async fn test_lists_are_voted_in_variant_order() {
        let (classifier, tagger) = classifier(vec![
            (ModelVariant::MsdMusicnn, vec!["rock", "pop"]),
            (ModelVariant::MsdVgg, vec!["pop", "rock"]),
            (ModelVariant::MttMusicnn, vec!["jazz"]),
            (ModelVariant::MttVgg, vec![]),
        ]);

        let decision = classifier
            .classify(&AudioInput::from_bytes(vec![0u8; 4]))
            .await
            .unwrap();

        assert_eq!(decision.genre, "Rock");
        assert_eq!(decision.source, SelectionSource::Preferred);
        assert_eq!(tagger.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_tagger_failure_names_variant() {
        let (classifier, _) = classifier(vec![
            (ModelVariant::MsdMusicnn, vec!["rock"]),
            (ModelVariant::MsdVgg, vec!["rock"]),
        ]);

        let err = classifier
            .classify(&AudioInput::from_path("/tmp/song.mp3"))
            .await
            .unwrap_err();

        match err {
            ClassifyError::Tagger { variant, .. } => assert_eq!(variant, ModelVariant::MttMusicnn),
            other => panic!("expected tagger error, got {:?}", other),
        }
    }

    /// Every variant reports the file it was handed; one distinct tag means
    /// the upload was written once and shared.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_upload_spooled_once_for_all_variants() {
        use crate::tagger::CommandTagger;

        let spool = tempfile::TempDir::new().unwrap();
        let tagger = CommandTagger::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"printf '["%s"]' "$5""#.to_string(),
                "tagger".to_string(),
            ],
            std::time::Duration::from_secs(10),
        )
        .with_spool_dir(spool.path());
        let classifier = GenreClassifier::new(Arc::new(tagger), GenreVoteConfig::default(), 1);

        let decision = classifier
            .classify(&AudioInput::from_bytes(vec![7u8; 64]))
            .await
            .unwrap();

        assert_eq!(decision.scores.len(), 1);
        assert_eq!(decision.scores[0].1, 4 * 5);
        assert!(decision.tag.starts_with(spool.path().to_str().unwrap()));
        assert_eq!(std::fs::read_dir(spool.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_output_everywhere_is_no_tags() {
        let (classifier, _) = classifier(ModelVariant::ALL.iter().map(|v| (*v, vec![])).collect());

        let err = classifier
            .classify(&AudioInput::from_bytes(vec![1u8]))
            .await
            .unwrap_err();

        assert!(matches!(err, ClassifyError::Vote(VoteError::NoTags)));
    }
}
