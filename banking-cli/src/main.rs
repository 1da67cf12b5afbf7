//! `banking-cli run` — interactive REPL harness for the turn driver.
//!
//! Loads one scenario (and matching knowledge-base document) per
//! product from disk, wires them into a [`TurnDriver`], and drives
//! turns from a readline loop. With no `--scenarios`/`--corpus` given,
//! falls back to a single embedded demo product so the binary runs
//! with zero configuration.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use banking_config::corpus_loader::CorpusDocument;
use banking_driver::TurnDriver;
use banking_hooks::LoggingHook;
use banking_llm::provider::{Provider, ProviderError};
use banking_llm::MockProvider;
use banking_llm_anthropic::Anthropic;
use banking_protocol::id::SessionId;
use banking_protocol::state::StateStore;
use banking_retrieval::dense::{EmbeddingError, EmbeddingProvider, InMemoryCosineIndex};
use banking_retrieval::{chunk_corpus, RetrievalWorker};
use banking_router::ProductDescriptor;
use banking_state::{MemoryStore, SessionStore};
use banking_types::{ConversationState, ProductType, Scenario};
use clap::Parser;

const DEMO_PRODUCT_JSON: &str = include_str!("demo/didimdol.json");
const DEMO_CORPUS_MD: &str = include_str!("demo/didimdol.md");

/// Demo-only answer returned whenever no live provider key is given.
const MOCK_DEMO_RESPONSE: &str =
    r#"{"action_plan": [{"tool": "answer_directly_chit_chat", "tool_input": {"direct_response": "안녕하세요. 무엇을 도와드릴까요?"}}]}"#;

#[derive(Parser)]
#[command(name = "banking-cli", about = "Interactive REPL for the banking dialogue engine")]
struct Cli {
    /// Directory containing `<product>.json` scenario files (e.g. `didimdol.json`).
    /// Falls back to a single embedded demo scenario when omitted.
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// Directory containing `<product>.md` knowledge-base documents,
    /// one per scenario file.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Anthropic API key. Falls back to `ANTHROPIC_API_KEY`, then to a
    /// canned mock provider when neither is set.
    #[arg(long)]
    anthropic_key: Option<String>,

    /// Session id to resume/persist under (in-memory only; gone on exit).
    #[arg(long, default_value = "demo")]
    session: String,

    /// `tracing-subscriber` env-filter directive.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// A no-op embedder: every call returns an empty vector. Hybrid
/// retrieval's dense half then contributes nothing and ranking falls
/// back to BM25 alone — there is no embedding backend in this
/// repository (§5 "vector store opened read-only, built out of scope"),
/// and this harness has no product one to call out to either.
struct NullEmbedder;

impl EmbeddingProvider for NullEmbedder {
    fn embed(&self, _text: &str) -> impl Future<Output = Result<Vec<f32>, EmbeddingError>> + Send {
        async move { Ok(Vec::new()) }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run(cli).await {
        eprintln!("banking-cli error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (scenarios, corpora) = load_products(cli.scenarios.as_deref(), cli.corpus.as_deref())?;

    let products: Vec<ProductDescriptor> = scenarios
        .values()
        .map(|s| ProductDescriptor {
            product_type: s.product_id,
            description: product_description(s.product_id),
        })
        .collect();

    let session = SessionId::new(cli.session);
    let store = MemoryStore::new();

    let api_key = cli.anthropic_key.or_else(|| std::env::var("ANTHROPIC_API_KEY").ok());
    match api_key {
        Some(key) => {
            eprintln!("banking-cli: using the live Anthropic provider");
            let provider = Arc::new(Anthropic::new(key));
            let driver = build_driver(provider, products, scenarios, corpora);
            repl(driver, session, store).await
        }
        None => {
            eprintln!("banking-cli: no API key given, running against a fixed mock response");
            let provider = Arc::new(MockProvider::with_text(MOCK_DEMO_RESPONSE));
            let driver = build_driver(provider, products, scenarios, corpora);
            repl(driver, session, store).await
        }
    }
}

fn product_description(product: ProductType) -> String {
    match product {
        ProductType::Didimdol => "디딤돌 대출: 생애 최초 주택 구입자를 위한 정부 지원 주택담보대출".into(),
        ProductType::Jeonse => "전세자금대출: 전세 보증금 마련을 위한 대출".into(),
        ProductType::DepositAccount => "입출금 통장 개설".into(),
    }
}

/// Load every `<product>.json`/`<product>.md` pair from the given
/// directories, or the single embedded demo product when both are
/// omitted.
fn load_products(
    scenarios_dir: Option<&Path>,
    corpus_dir: Option<&Path>,
) -> Result<(HashMap<ProductType, Arc<Scenario>>, HashMap<ProductType, Vec<CorpusDocument>>), Box<dyn std::error::Error>> {
    let (scenarios_dir, corpus_dir) = match (scenarios_dir, corpus_dir) {
        (Some(s), Some(c)) => (s.to_path_buf(), c.to_path_buf()),
        (None, None) => return Ok(load_demo_product()),
        _ => return Err("--scenarios and --corpus must be given together".into()),
    };

    let mut scenarios = HashMap::new();
    let mut corpora = HashMap::new();

    for entry in std::fs::read_dir(&scenarios_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let scenario = banking_config::scenario_loader::load(&path)?;
        let product = scenario.product_id;

        let doc_path = corpus_dir.join(format!("{}.md", product.as_str()));
        let text = std::fs::read_to_string(&doc_path)
            .map_err(|e| format!("reading knowledge-base document {}: {e}", doc_path.display()))?;
        corpora.insert(
            product,
            vec![CorpusDocument {
                id: product.as_str().to_string(),
                text,
            }],
        );
        scenarios.insert(product, scenario);
    }

    if scenarios.is_empty() {
        return Err(format!("no scenario JSON files found under {}", scenarios_dir.display()).into());
    }

    Ok((scenarios, corpora))
}

fn load_demo_product() -> (HashMap<ProductType, Arc<Scenario>>, HashMap<ProductType, Vec<CorpusDocument>>) {
    let scenario: Scenario = serde_json::from_str(DEMO_PRODUCT_JSON).expect("embedded demo scenario is well-formed");
    scenario.validate().expect("embedded demo scenario passes validation");
    let scenario = Arc::new(scenario);
    let product = scenario.product_id;

    let mut scenarios = HashMap::new();
    scenarios.insert(product, scenario);

    let mut corpora = HashMap::new();
    corpora.insert(
        product,
        vec![CorpusDocument {
            id: product.as_str().to_string(),
            text: DEMO_CORPUS_MD.to_string(),
        }],
    );

    (scenarios, corpora)
}

fn build_driver<P: Provider + Send + Sync + 'static>(
    provider: Arc<P>,
    products: Vec<ProductDescriptor>,
    scenarios: HashMap<ProductType, Arc<Scenario>>,
    corpora: HashMap<ProductType, Vec<CorpusDocument>>,
) -> TurnDriver<Arc<P>> {
    let mut driver = TurnDriver::new(provider.clone(), products);
    driver.add_hook(Arc::new(LoggingHook::all_points()));

    for (product, scenario) in scenarios {
        let docs = corpora.get(&product).cloned().unwrap_or_default();
        let chunks = chunk_corpus(&docs);
        let manual = docs.first().map(|d| d.text.clone()).unwrap_or_default();

        let qa_agent = RetrievalWorker::new(provider.clone(), NullEmbedder, product.as_str(), chunks, InMemoryCosineIndex::new());
        driver.register_product(scenario, Arc::new(qa_agent), manual);
    }

    driver
}

async fn repl<P: Provider + Clone + Send + Sync + 'static>(
    driver: TurnDriver<P>,
    session: SessionId,
    store: MemoryStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rl = rustyline::DefaultEditor::new()?;

    eprintln!("banking-cli: interactive REPL, session '{}'. Ctrl+D to exit.", session.as_str());

    loop {
        let readline = rl.readline("you> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                let state = match store.get(&session).await {
                    Ok(state) => state,
                    Err(err) => {
                        eprintln!("failed to load session state: {err}");
                        ConversationState::new()
                    }
                };

                let outcome = driver.run_turn(&session, state, trimmed).await;
                println!("bot> {}", outcome.reply);
                if let Some(projection) = &outcome.projection {
                    eprintln!(
                        "\x1B[2m[slot-filling {:.0}% complete, {} fields]\x1B[0m",
                        projection.completion_rate * 100.0,
                        projection.fields.len()
                    );
                }

                if let Err(err) = store.put(&session, &outcome.state).await {
                    eprintln!("failed to persist session state: {err}");
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Ctrl+D to exit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("readline error: {err}");
                break;
            }
        }
    }

    eprintln!("goodbye");
    Ok(())
}

#[allow(dead_code)]
fn _assert_provider_error_bound<P: Provider>(_: &P) -> Option<ProviderError> {
    None
}
