use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use steam_reviews_sources::{IdentitySource, SourceError};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Batching and pacing for identity lookups
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Identifiers per lookup request (the Web API accepts at most 100)
    pub batch_size: usize,

    /// Pause between consecutive batches
    pub batch_delay: Duration,

    /// Upper bound for a single batch request
    pub timeout: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            batch_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Maps author identifiers to display labels.
///
/// Never fails: a batch that cannot be looked up maps each of its ids to
/// itself, and so does any id the lookup did not return a label for.
pub struct IdentityResolver {
    source: Option<Arc<dyn IdentitySource>>,
    options: ResolverOptions,
}

impl IdentityResolver {
    pub fn new(source: Arc<dyn IdentitySource>, options: ResolverOptions) -> Self {
        Self {
            source: Some(source),
            options,
        }
    }

    /// Resolver that never calls out; every id is its own label
    pub fn disabled() -> Self {
        Self {
            source: None,
            options: ResolverOptions::default(),
        }
    }

    pub fn from_optional(source: Option<Arc<dyn IdentitySource>>, options: ResolverOptions) -> Self {
        match source {
            Some(source) => Self::new(source, options),
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// Resolve a set of identifiers. Duplicates and empty ids are ignored.
    pub async fn resolve<I>(&self, ids: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let ids: Vec<String> = ids
            .into_iter()
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();

        if ids.is_empty() {
            return HashMap::new();
        }

        let Some(source) = self.source.as_ref() else {
            debug!("Identity lookups disabled; {} ids keep their raw value", ids.len());
            return ids.into_iter().map(|id| (id.clone(), id)).collect();
        };

        let batch_size = self.options.batch_size.max(1);
        let mut labels = HashMap::with_capacity(ids.len());
        let mut degraded_batches = 0;

        for (index, batch) in ids.chunks(batch_size).enumerate() {
            if index > 0 {
                sleep(self.options.batch_delay).await;
            }

            match self.lookup_batch(source.as_ref(), batch).await {
                Ok(names) => {
                    for id in batch {
                        let label = names.get(id).cloned().unwrap_or_else(|| id.clone());
                        labels.insert(id.clone(), label);
                    }
                }
                Err(e) => {
                    warn!(
                        "Identity lookup batch {} ({} ids) via {} failed: {}. Using ids as labels",
                        index + 1,
                        batch.len(),
                        source.source_name(),
                        e
                    );
                    degraded_batches += 1;
                    labels.extend(batch.iter().map(|id| (id.clone(), id.clone())));
                }
            }
        }

        let named = labels.iter().filter(|(id, label)| id != label).count();
        info!(
            "Resolved {}/{} author names ({} degraded batch(es))",
            named,
            labels.len(),
            degraded_batches
        );

        labels
    }

    async fn lookup_batch(
        &self,
        source: &dyn IdentitySource,
        batch: &[String],
    ) -> Result<HashMap<String, String>, SourceError> {
        match timeout(self.options.timeout, source.lookup(batch)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(self.options.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Names every id "name-<id>" except those in `unnamed`; fails listed batch numbers
    struct FakeIdentity {
        batches: Mutex<Vec<usize>>,
        failing_batches: Vec<usize>,
        unnamed: Vec<String>,
    }

    impl FakeIdentity {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                failing_batches: Vec::new(),
                unnamed: Vec::new(),
            }
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IdentitySource for FakeIdentity {
        fn source_name(&self) -> &str {
            "fake"
        }

        async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, String>, SourceError> {
            let batch_number = {
                let mut batches = self.batches.lock().unwrap();
                batches.push(ids.len());
                batches.len()
            };
            if self.failing_batches.contains(&batch_number) {
                return Err(SourceError::Status {
                    status: 503,
                    url: "https://api.example/players".to_string(),
                });
            }
            Ok(ids
                .iter()
                .filter(|id| !self.unnamed.contains(id))
                .map(|id| (id.clone(), format!("name-{}", id)))
                .collect())
        }
    }

    fn options() -> ResolverOptions {
        ResolverOptions {
            batch_size: 100,
            batch_delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
        }
    }

    fn ids(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("7656119{:010}", i)).collect()
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let fake = Arc::new(FakeIdentity::new());
        let resolver = IdentityResolver::new(fake.clone(), options());
        let labels = resolver.resolve(Vec::new()).await;
        assert!(labels.is_empty());
        assert!(fake.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_batches_of_one_hundred() {
        let fake = Arc::new(FakeIdentity::new());
        let resolver = IdentityResolver::new(fake.clone(), options());
        let labels = resolver.resolve(ids(250)).await;
        assert_eq!(fake.batch_sizes(), vec![100, 100, 50]);
        assert_eq!(labels.len(), 250);
        assert!(labels.iter().all(|(id, label)| *label == format!("name-{}", id)));
    }

    #[tokio::test]
    async fn test_failed_batch_falls_back_to_ids() {
        let fake = Arc::new(FakeIdentity {
            failing_batches: vec![2],
            ..FakeIdentity::new()
        });
        let resolver = IdentityResolver::new(fake.clone(), options());
        let all = ids(250);
        let labels = resolver.resolve(all.clone()).await;

        // The failure does not stop the third batch
        assert_eq!(fake.batch_sizes(), vec![100, 100, 50]);
        for id in &all[0..100] {
            assert_eq!(labels[id], format!("name-{}", id));
        }
        for id in &all[100..200] {
            assert_eq!(&labels[id], id);
        }
        for id in &all[200..250] {
            assert_eq!(labels[id], format!("name-{}", id));
        }
    }

    #[tokio::test]
    async fn test_missing_label_falls_back_per_record() {
        let fake = Arc::new(FakeIdentity {
            unnamed: vec!["b".to_string()],
            ..FakeIdentity::new()
        });
        let resolver = IdentityResolver::new(fake, options());
        let labels = resolver.resolve(vec!["a".to_string(), "b".to_string()]).await;
        assert_eq!(labels["a"], "name-a");
        assert_eq!(labels["b"], "b");
    }

    #[tokio::test]
    async fn test_duplicates_and_empty_ids_are_dropped() {
        let fake = Arc::new(FakeIdentity::new());
        let resolver = IdentityResolver::new(fake.clone(), options());
        let labels = resolver
            .resolve(vec!["a".to_string(), String::new(), "a".to_string(), "b".to_string()])
            .await;
        assert_eq!(fake.batch_sizes(), vec![2]);
        assert_eq!(labels.len(), 2);
        assert!(!labels.contains_key(""));
    }

    #[tokio::test]
    async fn test_disabled_resolver_maps_ids_to_themselves() {
        let resolver = IdentityResolver::disabled();
        assert!(!resolver.is_enabled());
        let labels = resolver.resolve(vec!["x".to_string()]).await;
        assert_eq!(labels["x"], "x");
    }

    struct SlowIdentity;

    #[async_trait]
    impl IdentitySource for SlowIdentity {
        fn source_name(&self) -> &str {
            "slow"
        }

        async fn lookup(&self, _ids: &[String]) -> Result<HashMap<String, String>, SourceError> {
            sleep(Duration::from_secs(60)).await;
            Ok(HashMap::new())
        }
    }

    #[tokio::test]
    async fn test_timed_out_batch_falls_back() {
        let resolver = IdentityResolver::new(
            Arc::new(SlowIdentity),
            ResolverOptions {
                timeout: Duration::from_millis(20),
                ..options()
            },
        );
        let labels = resolver.resolve(vec!["slowpoke".to_string()]).await;
        assert_eq!(labels["slowpoke"], "slowpoke");
    }
}
