//! End-to-end pipeline scenarios over a temp file store, with the embedding
//! and LLM backends left unconfigured so no network is touched.

use std::sync::Arc;

use faqbot::chat::ChatService;
use faqbot::chat::Greeter;
use faqbot::config::AppConfig;
use faqbot::embeddings::EmbeddingConfig;
use faqbot::embeddings::EmbeddingIndex;
use faqbot::embeddings::EmbeddingProvider;
use faqbot::fallback::FallbackService;
use faqbot::llm::LlmService;
use faqbot::models::FaqInput;
use faqbot::models::ResponseSource;
use faqbot::store::FaqStore;

const DIM: usize = 4;

struct Fixture {
    store: Arc<FaqStore>,
    index: Arc<EmbeddingIndex>,
    service: ChatService,
    _dir: tempfile::TempDir,
}

fn fixture_with_config(mut mutate: impl FnMut(&mut AppConfig)) -> Fixture {
    let dir = tempfile::tempdir().unwrap();

    let mut config = AppConfig::default();
    config.chat.fallback_message = "no answer yet".to_string();
    mutate(&mut config);

    let store = Arc::new(FaqStore::file(dir.path().join("faq.json")));
    // OpenAI provider without an API key: every embed degrades to a zero
    // vector locally, unless the cache is primed.
    let index = Arc::new(
        EmbeddingIndex::new(EmbeddingConfig {
            provider: EmbeddingProvider::OpenAI,
            model: "text-embedding-ada-002".to_string(),
            dimension: DIM,
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            cache_ttl_secs: 3600,
            timeout_secs: 1,
        })
        .unwrap(),
    );
    let llm = LlmService::from_config(&config.llm).unwrap();
    let fallback = FallbackService::new(
        dir.path().join("fallback_logs.txt"),
        config.chat.fallback_message.as_str(),
    );

    let service = ChatService::from_parts(
        Arc::clone(&store),
        Arc::clone(&index),
        llm,
        fallback,
        &config,
    );

    Fixture {
        store,
        index,
        service,
        _dir: dir,
    }
}

fn fixture() -> Fixture {
    fixture_with_config(|_| {})
}

#[tokio::test]
async fn test_exact_match_answers_from_the_corpus() {
    let f = fixture();
    f.store
        .upsert(FaqInput::new("What is your name?", "ChatBot"))
        .await
        .unwrap();

    let reply = f.service.respond("what is your name?").await.unwrap();
    assert_eq!(reply.response, "ChatBot");
    assert_eq!(reply.source, ResponseSource::Faq);
}

#[tokio::test]
async fn test_greeting_precedes_everything() {
    let f = fixture();
    let reply = f.service.respond("سلام").await.unwrap();
    assert_eq!(reply.source, ResponseSource::Greeting);

    let allowed: Vec<String> = Greeter::default().responses().to_vec();
    assert!(allowed.contains(&reply.response));
}

#[tokio::test]
async fn test_greeting_skips_embedding_backfill() {
    let f = fixture();
    f.store
        .upsert(FaqInput::new("What is your name?", "ChatBot"))
        .await
        .unwrap();

    let reply = f.service.respond("سلام").await.unwrap();
    assert_eq!(reply.source, ResponseSource::Greeting);

    // A greeting never pays for the corpus: the record must keep its
    // unset embedding, only the semantic stage may backfill and persist.
    let records = f.store.get_all().await;
    assert_eq!(records.len(), 1);
    assert!(records[0].embedding.is_none());
}

#[tokio::test]
async fn test_unanswerable_message_falls_back_and_logs() {
    let f = fixture();
    f.store
        .upsert(FaqInput::new("What is your name?", "ChatBot"))
        .await
        .unwrap();

    let before = f.service.recent_fallbacks(None).await.len();
    let reply = f
        .service
        .respond("xyzzy unrelated gibberish")
        .await
        .unwrap();

    assert_eq!(reply.source, ResponseSource::Fallback);
    assert_eq!(reply.response, "no answer yet");

    let logs = f.service.recent_fallbacks(None).await;
    assert_eq!(logs.len(), before + 1);
    assert!(logs
        .last()
        .unwrap()
        .contains("Question: xyzzy unrelated gibberish"));
}

#[tokio::test]
async fn test_empty_message_is_a_validation_error() {
    let f = fixture();
    let err = f.service.respond("   ").await.unwrap_err();
    assert!(err.is_validation());
    // Validation failures never reach the fallback log
    assert!(f.service.recent_fallbacks(None).await.is_empty());
}

#[tokio::test]
async fn test_semantic_match_wins_with_score_above_threshold() {
    let f = fixture();
    let mut input = FaqInput::new("How do I reset my password?", "Use the reset link.");
    input.embedding = Some(vec![1.0, 0.0, 0.0, 0.0]);
    f.store.upsert(input).await.unwrap();

    // Identical direction: cosine similarity 1.0 >= 0.82
    f.index
        .prime_cache("forgot my password help", vec![2.0, 0.0, 0.0, 0.0]);

    let reply = f.service.respond("forgot my password help").await.unwrap();
    assert_eq!(reply.source, ResponseSource::FaqSemantic);
    assert_eq!(reply.response, "Use the reset link.");

    let metadata = reply.metadata.unwrap();
    assert_eq!(
        metadata["matched_question"],
        "How do I reset my password?"
    );
    assert!(metadata["score"].as_f64().unwrap() >= 0.82);
}

#[tokio::test]
async fn test_score_exactly_at_threshold_matches() {
    // inclusive comparison: threshold raised to 1.0 and the score pinned there
    let f = fixture_with_config(|config| config.chat.semantic_threshold = 1.0);

    let mut input = FaqInput::new("Where is the office?", "Main street 1");
    input.embedding = Some(vec![0.0, 1.0, 0.0, 0.0]);
    f.store.upsert(input).await.unwrap();
    f.index.prime_cache("office location", vec![0.0, 3.0, 0.0, 0.0]);

    let reply = f.service.respond("office location").await.unwrap();
    assert_eq!(reply.source, ResponseSource::FaqSemantic);
}

#[tokio::test]
async fn test_score_below_threshold_falls_through() {
    let f = fixture();
    let mut input = FaqInput::new("Where is the office?", "Main street 1");
    input.embedding = Some(vec![1.0, 0.0, 0.0, 0.0]);
    f.store.upsert(input).await.unwrap();

    // cosine([3,4,0,0], [1,0,0,0]) = 0.6 < 0.82, and no lexical relation
    // to the stored question either; the LLM is unavailable.
    f.index.prime_cache("zzqp vvkk", vec![3.0, 4.0, 0.0, 0.0]);

    let reply = f.service.respond("zzqp vvkk").await.unwrap();
    assert_eq!(reply.source, ResponseSource::Fallback);
}

#[tokio::test]
async fn test_partial_match_on_substring() {
    let f = fixture();
    f.store
        .upsert(FaqInput::new("opening hours", "9 to 5"))
        .await
        .unwrap();

    let reply = f
        .service
        .respond("tell me the opening hours please")
        .await
        .unwrap();
    assert_eq!(reply.source, ResponseSource::Faq);
    assert_eq!(reply.response, "9 to 5");
}

#[tokio::test]
async fn test_mutation_is_visible_to_later_requests() {
    let f = fixture();
    let record = f
        .service
        .add_faq(FaqInput::new("What is your name?", "ChatBot"))
        .await
        .unwrap();

    let reply = f.service.respond("what is your name?").await.unwrap();
    assert_eq!(reply.response, "ChatBot");

    // an update through the admin surface is observed immediately,
    // well inside the snapshot TTL window.
    f.service
        .update_faq(&record.id, FaqInput::new("What is your name?", "HelpBot"))
        .await
        .unwrap();
    let reply = f.service.respond("what is your name?").await.unwrap();
    assert_eq!(reply.response, "HelpBot");

    assert!(f.service.delete_faq(&record.id).await.unwrap());
    let reply = f.service.respond("what is your name?").await.unwrap();
    assert_eq!(reply.source, ResponseSource::Fallback);
}

#[tokio::test]
async fn test_missing_embeddings_are_backfilled_and_persisted() {
    let f = fixture();
    f.store
        .upsert(FaqInput::new("What is your name?", "ChatBot"))
        .await
        .unwrap();

    // First request triggers the backfill (zero vectors with the backend
    // unconfigured) and persists the result through the store.
    f.service.respond("what is your name?").await.unwrap();

    let records = f.store.get_all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].embedding.as_deref(), Some(&[0.0; DIM][..]));

    let stats = f.service.stats().await;
    assert_eq!(stats.total_faqs, 1);
    assert_eq!(stats.faqs_with_embeddings, 1);
    assert_eq!(stats.backend_type, "file");
}
