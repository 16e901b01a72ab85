//! End-to-end pipeline tests on the in-process backends.

use std::io::{Cursor, Write};
use std::sync::Arc;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use ndarray::Array1;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use podium_core::{
    AnswerStatus, DocumentType, Embedding, Error, PipelineConfig, Result, UnitKind,
};
use podium_index::{ScoredId, VectorIndex};
use podium_infer::{CannedGenerator, HashEmbedder, MOCK_MODEL_VERSION};
use podium_runtime::IngestionPipeline;
use podium_store::{ChunkStore, MemoryStore, SqliteStore};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("podium=debug")
        .with_test_writer()
        .try_init();
}

/// Mock-backend config: small vectors, small batches so multi-batch
/// embedding is exercised, and a score floor low enough for
/// bag-of-words token overlap.
fn test_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.embedding.dimension = 128;
    config.embedding.batch_size = 2;
    config.retrieval.min_score = 0.05;
    config
}

fn pipeline(store: Arc<dyn ChunkStore>) -> IngestionPipeline {
    IngestionPipeline::from_config(test_config(), store).unwrap()
}

/// Minimal valid PDF with one text line per page.
fn build_pdf(page_texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Minimal `.pptx`-shaped archive with one text run per slide.
fn build_pptx(slide_texts: &[&str]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut writer = ZipWriter::new(Cursor::new(&mut buf));
        let opts = SimpleFileOptions::default();
        writer.start_file("[Content_Types].xml", opts).unwrap();
        writer.write_all(b"<Types/>").unwrap();
        for (i, text) in slide_texts.iter().enumerate() {
            writer
                .start_file(format!("ppt/slides/slide{}.xml", i + 1), opts)
                .unwrap();
            writer
                .write_all(
                    format!("<p:sld><p:txBody><a:t>{text}</a:t></p:txBody></p:sld>").as_bytes(),
                )
                .unwrap();
        }
        writer.finish().unwrap();
    }
    buf
}

#[tokio::test]
async fn test_pdf_question_attributes_answer_to_page() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store);

    let pdf = build_pdf(&[
        "Welcome and agenda for the annual summit",
        "Revenue grew forty percent year over year",
        "Thank you and closing remarks",
    ]);
    let result = pipeline
        .ingest("talk-1", &pdf, DocumentType::Pdf)
        .await
        .unwrap();
    assert_eq!(result.segment_count, 3);
    assert!(result.chunk_count >= 3);
    assert_eq!(result.model_version, MOCK_MODEL_VERSION);

    let answer = pipeline
        .answer_question("how much did revenue grow year over year", None, None)
        .await
        .unwrap();
    assert_eq!(answer.status, AnswerStatus::Answered);
    assert!(answer.answer_text.is_some());
    assert!(!answer.passages.is_empty());
    assert!(answer.confidence > 0.0);

    let top = &answer.passages[0];
    assert_eq!(top.unit_kind, UnitKind::Page);
    assert_eq!(top.unit_number, 2);
    assert!(top.text.contains("Revenue"));
}

#[tokio::test]
async fn test_question_against_empty_corpus() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store);

    let answer = pipeline
        .answer_question("how much did revenue grow", None, None)
        .await
        .unwrap();
    assert_eq!(answer.status, AnswerStatus::NoRelevantContent);
    assert!(answer.answer_text.is_none());
    assert!(answer.passages.is_empty());
}

#[tokio::test]
async fn test_delete_document_clears_store_and_index() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store.clone());

    let deck = build_pptx(&[
        "Kickoff and introductions",
        "Pricing tiers for the enterprise plan",
        "Roadmap for next year",
        "Hiring plans across regions",
        "Questions and answers",
    ]);
    pipeline
        .ingest("deck-1", &deck, DocumentType::Slides)
        .await
        .unwrap();
    assert!(store.count_for_document("deck-1").await.unwrap() > 0);

    pipeline.delete_document("deck-1").await.unwrap();
    assert_eq!(store.count_for_document("deck-1").await.unwrap(), 0);

    let answer = pipeline
        .answer_question("what are the pricing tiers", None, None)
        .await
        .unwrap();
    assert_eq!(answer.status, AnswerStatus::NoRelevantContent);

    // Deleting again is a no-op.
    pipeline.delete_document("deck-1").await.unwrap();
}

#[tokio::test]
async fn test_reingest_replaces_previous_chunks() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store.clone());

    let first = build_pptx(&[
        "Original opening slide with the old agenda",
        "Original budget figures for the fiscal year",
        "Original closing slide",
    ]);
    pipeline
        .ingest("deck-1", &first, DocumentType::Slides)
        .await
        .unwrap();
    let old_ids = store.chunk_ids_for_document("deck-1").await.unwrap();
    assert_eq!(old_ids.len(), 3);

    let second = build_pptx(&["Revised agenda", "Revised budget and headcount"]);
    let result = pipeline
        .ingest("deck-1", &second, DocumentType::Slides)
        .await
        .unwrap();
    assert_eq!(result.chunk_count, 2);
    assert_eq!(store.count_for_document("deck-1").await.unwrap(), 2);

    // Every chunk from the first ingestion is gone, not merged.
    let resolved = store.get_many(&old_ids).await.unwrap();
    assert!(resolved.iter().all(Option::is_none));
}

#[tokio::test]
async fn test_scope_restricts_results_to_named_documents() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store);

    let deck_a = build_pptx(&["Pricing tiers with enterprise discounts"]);
    let deck_b = build_pptx(&["Pricing model for the subscription service"]);
    pipeline
        .ingest("deck-a", &deck_a, DocumentType::Slides)
        .await
        .unwrap();
    pipeline
        .ingest("deck-b", &deck_b, DocumentType::Slides)
        .await
        .unwrap();

    let unscoped = pipeline
        .answer_question("tell me about pricing", None, None)
        .await
        .unwrap();
    let docs: Vec<&str> = unscoped
        .passages
        .iter()
        .map(|p| p.document_id.as_str())
        .collect();
    assert!(docs.contains(&"deck-a"));
    assert!(docs.contains(&"deck-b"));

    let scope = vec!["deck-b".to_string()];
    let scoped = pipeline
        .answer_question("tell me about pricing", Some(&scope), None)
        .await
        .unwrap();
    assert_eq!(scoped.status, AnswerStatus::Answered);
    assert!(!scoped.passages.is_empty());
    assert!(scoped.passages.iter().all(|p| p.document_id == "deck-b"));
}

#[tokio::test]
async fn test_corrupt_pdf_is_extraction_error() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store.clone());

    let err = pipeline
        .ingest("bad-doc", b"%PDF-1.5 truncated garbage", DocumentType::Pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Extraction { .. }));
    assert_eq!(store.count_for_document("bad-doc").await.unwrap(), 0);
}

#[tokio::test]
async fn test_textless_pdf_ingests_with_zero_chunks() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store.clone());

    let pdf = build_pdf(&["", ""]);
    let result = pipeline
        .ingest("blank-doc", &pdf, DocumentType::Pdf)
        .await
        .unwrap();
    assert_eq!(result.segment_count, 2);
    assert_eq!(result.chunk_count, 0);
    assert_eq!(store.count_for_document("blank-doc").await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_document_id_rejected() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = pipeline(store);

    let pdf = build_pdf(&["some text"]);
    let err = pipeline
        .ingest("  ", &pdf, DocumentType::Pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

/// Index whose writes always fail, for the rollback path.
struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn upsert(&self, _embeddings: &[Embedding]) -> Result<()> {
        Err(Error::IndexUnavailable("index offline".into()))
    }

    async fn query(
        &self,
        _vector: &Array1<f32>,
        _model_version: &str,
        _k: usize,
    ) -> Result<Vec<ScoredId>> {
        Ok(Vec::new())
    }

    async fn delete(&self, _chunk_ids: &[String]) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failed_index_upsert_rolls_back_store() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = IngestionPipeline::new(
        Arc::new(HashEmbedder::new(128)),
        Arc::new(FailingIndex),
        store.clone(),
        Arc::new(CannedGenerator::default()),
        test_config(),
    )
    .unwrap();

    let pdf = build_pdf(&["content that will not survive"]);
    let err = pipeline
        .ingest("doc-1", &pdf, DocumentType::Pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IndexUnavailable(_)));
    // Partial writes were rolled back.
    assert_eq!(store.count_for_document("doc-1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_sqlite_store_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path()).unwrap());
    let pipeline = pipeline(store.clone());

    let deck = build_pptx(&[
        "Conference welcome",
        "Attendance doubled compared to last year",
    ]);
    pipeline
        .ingest("deck-1", &deck, DocumentType::Slides)
        .await
        .unwrap();

    let answer = pipeline
        .answer_question("how did attendance change compared to last year", None, Some(3))
        .await
        .unwrap();
    assert_eq!(answer.status, AnswerStatus::Answered);
    assert_eq!(answer.passages[0].unit_kind, UnitKind::Slide);
    assert_eq!(answer.passages[0].unit_number, 2);

    pipeline.delete_document("deck-1").await.unwrap();
    assert_eq!(store.count_for_document("deck-1").await.unwrap(), 0);
}
