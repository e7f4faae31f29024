//! Bounded-concurrency acquisition over identifier lists and identifier pairs.
//!
//! Every identifier becomes one task that fetches and extracts its page. Tasks are
//! all submitted up front and consumed in completion order; each carries its input
//! position so results land back in input order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};

use crate::aggregator;
use crate::app::ports::{Sleeper, TokioSleeper};
use crate::config::{CatalogsConfig, Config, OrchestratorConfig, PairStrategy};
use crate::error::Result;
use crate::extract::Extractor;
use crate::infra::http_client::ReqwestHttp;
use crate::observability::metrics;
use crate::transport::retry::{jitter, RetryPolicy};
use crate::transport::TransportClient;
use crate::types::{CatalogKind, ComparisonRecord, Identifier, ProductRecord};

/// Outcome of one catalog pass: one record per input identifier, in input order.
#[derive(Debug, Clone)]
pub struct CatalogRun {
    pub catalog: CatalogKind,
    pub records: Vec<ProductRecord>,
    pub failed_fetches: usize,
    pub elapsed: Duration,
}

impl CatalogRun {
    /// Identifier → record view. Duplicate identifiers map to their first record.
    pub fn by_identifier(&self) -> HashMap<&Identifier, &ProductRecord> {
        let mut map = HashMap::with_capacity(self.records.len());
        for record in &self.records {
            map.entry(record.identifier()).or_insert(record);
        }
        map
    }
}

struct TaskResult {
    index: usize,
    record: ProductRecord,
    fetch_failed: bool,
}

pub struct Orchestrator {
    transport: Arc<TransportClient>,
    extractor: Arc<Extractor>,
    pacer: Arc<dyn Sleeper>,
    search_urls: HashMap<CatalogKind, String>,
    settings: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        transport: TransportClient,
        settings: OrchestratorConfig,
        catalogs: &CatalogsConfig,
        pacer: Arc<dyn Sleeper>,
    ) -> Self {
        let search_urls = CatalogKind::ALL
            .iter()
            .map(|kind| (*kind, catalogs.search_url(*kind).to_string()))
            .collect();
        let settings = OrchestratorConfig {
            concurrency: settings.concurrency.max(1),
            ..settings
        };
        Self {
            transport: Arc::new(transport),
            extractor: Arc::new(Extractor::new()),
            pacer,
            search_urls,
            settings,
        }
    }

    /// Production wiring: reqwest transport and real sleeps.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let http = Arc::new(ReqwestHttp::new(config.transport.timeout())?);
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
        let transport = TransportClient::new(http, RetryPolicy::from_config(&config.transport), sleeper.clone());
        Ok(Self::new(
            transport,
            config.orchestrator.clone(),
            &config.catalogs,
            sleeper,
        ))
    }

    pub fn concurrency(&self) -> usize {
        self.settings.concurrency
    }

    pub fn search_url(&self, kind: CatalogKind, identifier: &Identifier) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(identifier.as_str().as_bytes()).collect();
        let template = self
            .search_urls
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_search_url());
        template.replacen("{}", &encoded, 1)
    }

    /// Fetches and extracts every identifier from one catalog.
    pub async fn run<S: AsRef<str>>(&self, identifiers: &[S], kind: CatalogKind) -> Result<CatalogRun> {
        let ids = identifiers
            .iter()
            .enumerate()
            .map(|(i, raw)| Identifier::parse_at(raw.as_ref(), kind, i))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.run_validated(ids, kind).await)
    }

    /// Looks each pair up in Praktis (left) and Praktiker (right).
    pub async fn run_pairs<A: AsRef<str>, B: AsRef<str>>(&self, pairs: &[(A, B)]) -> Result<Vec<ComparisonRecord>> {
        self.run_pairs_between(pairs, CatalogKind::Praktis, CatalogKind::Praktiker)
            .await
    }

    pub async fn run_pairs_between<A: AsRef<str>, B: AsRef<str>>(
        &self,
        pairs: &[(A, B)],
        left: CatalogKind,
        right: CatalogKind,
    ) -> Result<Vec<ComparisonRecord>> {
        let mut left_ids = Vec::with_capacity(pairs.len());
        let mut right_ids = Vec::with_capacity(pairs.len());
        for (i, (a, b)) in pairs.iter().enumerate() {
            left_ids.push(Identifier::parse_at(a.as_ref(), left, i)?);
            right_ids.push(Identifier::parse_at(b.as_ref(), right, i)?);
        }

        let (left_run, right_run) = match self.settings.pair_strategy {
            PairStrategy::Sequential => {
                let l = self.run_validated(left_ids, left).await;
                let r = self.run_validated(right_ids, right).await;
                (l, r)
            }
            PairStrategy::Concurrent => {
                tokio::join!(
                    self.run_validated(left_ids, left),
                    self.run_validated(right_ids, right)
                )
            }
        };

        info!(
            rows = pairs.len(),
            left_failed = left_run.failed_fetches,
            right_failed = right_run.failed_fetches,
            "paired run finished"
        );
        aggregator::merge(left_run.records, right_run.records)
    }

    async fn run_validated(&self, ids: Vec<Identifier>, kind: CatalogKind) -> CatalogRun {
        let started = Instant::now();
        let total = ids.len();
        info!(catalog = %kind, total, concurrency = self.settings.concurrency, "starting catalog pass");

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        let mut tasks = JoinSet::new();

        for (index, identifier) in ids.iter().cloned().enumerate() {
            let url = self.search_url(kind, &identifier);
            let semaphore = semaphore.clone();
            let transport = self.transport.clone();
            let extractor = self.extractor.clone();
            let span = info_span!("product", catalog = %kind, index, identifier = %identifier);

            tasks.spawn(
                async move {
                    let permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            error!("concurrency limiter closed");
                            return TaskResult {
                                index,
                                record: ProductRecord::unavailable(identifier, kind),
                                fetch_failed: true,
                            };
                        }
                    };
                    let outcome = transport.fetch(&url).await;
                    drop(permit);

                    let fetch_failed = !outcome.is_document();
                    if fetch_failed {
                        warn!(url = %url, "no document, recording sentinels");
                    }
                    TaskResult {
                        index,
                        record: extractor.record_for(&outcome, kind, identifier),
                        fetch_failed,
                    }
                }
                .instrument(span),
            );
        }

        let mut slots: Vec<Option<ProductRecord>> = vec![None; total];
        let mut failed_fetches = 0;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    if result.fetch_failed {
                        failed_fetches += 1;
                    }
                    metrics::orchestrator::task_completed(kind.name());
                    slots[result.index] = Some(result.record);
                }
                Err(e) => {
                    metrics::orchestrator::task_panicked(kind.name());
                    error!(catalog = %kind, "product task aborted: {}", e);
                }
            }

            if !tasks.is_empty() {
                let pause = jitter(
                    Duration::from_millis(self.settings.pacing_min_ms),
                    Duration::from_millis(self.settings.pacing_max_ms),
                    &mut rand::thread_rng(),
                );
                self.pacer.sleep(pause).await;
            }
        }

        // A slot is only empty if its task panicked
        let records: Vec<ProductRecord> = slots
            .into_iter()
            .zip(ids)
            .map(|(slot, id)| {
                slot.unwrap_or_else(|| {
                    failed_fetches += 1;
                    ProductRecord::unavailable(id, kind)
                })
            })
            .collect();

        let elapsed = started.elapsed();
        metrics::orchestrator::run_duration(kind.name(), elapsed.as_secs_f64());
        info!(
            catalog = %kind,
            total,
            failed = failed_fetches,
            elapsed_secs = elapsed.as_secs_f64(),
            "catalog pass finished"
        );

        CatalogRun {
            catalog: kind,
            records,
            failed_fetches,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::{HttpClientPort, HttpGetResult};
    use crate::error::{EngineError, FetchError};
    use crate::transport::identity::RequestIdentity;
    use async_trait::async_trait;

    struct EchoHttp;

    #[async_trait]
    impl HttpClientPort for EchoHttp {
        async fn get(&self, url: &str, _identity: &RequestIdentity) -> std::result::Result<HttpGetResult, FetchError> {
            let code = url.rsplit('=').next().unwrap_or_default();
            let body = format!(r#"<p class="product-name h4">Item {code}</p><span class="price">{code}.00 лв.</span>"#);
            Ok(HttpGetResult {
                status: 200,
                bytes: body.into_bytes(),
                content_type: "text/html".into(),
            })
        }
    }

    struct NoSleep;

    #[async_trait]
    impl Sleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn orchestrator() -> Orchestrator {
        let transport = TransportClient::new(Arc::new(EchoHttp), RetryPolicy::default(), Arc::new(NoSleep));
        Orchestrator::new(
            transport,
            OrchestratorConfig::default(),
            &CatalogsConfig::default(),
            Arc::new(NoSleep),
        )
    }

    #[test]
    fn search_urls_are_templated_and_encoded() {
        let orch = orchestrator();
        let id = Identifier::parse("AB 12/3").unwrap();
        assert_eq!(
            orch.search_url(CatalogKind::Praktis, &id),
            "https://praktis.bg/catalogsearch/result/?q=AB+12%2F3"
        );
        let id = Identifier::parse("555").unwrap();
        assert_eq!(orch.search_url(CatalogKind::Praktiker, &id), "https://praktiker.bg/search/555");
    }

    #[tokio::test]
    async fn run_keeps_input_order_and_length() {
        let run = orchestrator()
            .run(&["3", " 1 ", "2", "1"], CatalogKind::Praktis)
            .await
            .unwrap();
        let codes: Vec<&str> = run.records.iter().map(|r| r.identifier().as_str()).collect();
        assert_eq!(codes, vec!["3", "1", "2", "1"]);
        assert_eq!(run.failed_fetches, 0);
        assert_eq!(run.catalog, CatalogKind::Praktis);
        assert_eq!(run.records[0].regular_price().as_found(), Some("3.00"));
        assert_eq!(run.by_identifier().len(), 3);
    }

    #[tokio::test]
    async fn empty_identifier_aborts_before_any_fetch() {
        let err = orchestrator()
            .run(&["1", "  "], CatalogKind::Praktis)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::EmptyIdentifier { catalog: CatalogKind::Praktis, index: 1 }
        ));
    }

    #[tokio::test]
    async fn zero_concurrency_is_clamped() {
        let transport = TransportClient::new(Arc::new(EchoHttp), RetryPolicy::default(), Arc::new(NoSleep));
        let settings = OrchestratorConfig {
            concurrency: 0,
            ..OrchestratorConfig::default()
        };
        let orch = Orchestrator::new(transport, settings, &CatalogsConfig::default(), Arc::new(NoSleep));
        assert_eq!(orch.concurrency(), 1);
        let run = orch.run(&["7"], CatalogKind::Praktis).await.unwrap();
        assert_eq!(run.records.len(), 1);
    }
}
