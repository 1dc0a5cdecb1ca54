// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Task dispatcher — routes one request through extraction, a single model
// invocation, and post-processing, then packs the outcome into an envelope.
//
// Each dispatch is sequential and stateless. Input validation (payload
// presence, extension allow-list, empty text) always runs before any model
// is touched. Model calls run on the blocking pool behind a semaphore that
// bounds concurrent invocations, under an optional timeout. There are no
// retries and no fallback between models; any failure discards all partial
// results.

use std::sync::Arc;

use docmask_core::config::PipelineConfig;
use docmask_core::error::{DocmaskError, Result};
use docmask_core::labels::{MaskTable, TagVocabulary};
use docmask_core::types::{DocumentFormat, Operation, Upload};
use docmask_document::{
    Extracted, ExtractionMode, FormatExtractor, ImageProcessor, RegionMaskRenderer,
};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::envelope::{Banner, Envelope, Health, TaskOutput};
use crate::models::{DocumentClassifier, RegionDetector, SummaryGenerator, TokenTagger};
use crate::ner::{MaskSubstitution, decode_spans};

/// The model collaborators available to the dispatcher. Any of them may be
/// absent; requests for a missing model fail with `ModelUnavailable`.
#[derive(Clone, Default)]
pub struct ModelSuite {
    pub classifier: Option<Arc<dyn DocumentClassifier>>,
    pub detector: Option<Arc<dyn RegionDetector>>,
    pub tagger: Option<Arc<dyn TokenTagger>>,
    pub summarizer: Option<Arc<dyn SummaryGenerator>>,
}

impl ModelSuite {
    pub fn with_classifier(mut self, model: Arc<dyn DocumentClassifier>) -> Self {
        self.classifier = Some(model);
        self
    }

    pub fn with_detector(mut self, model: Arc<dyn RegionDetector>) -> Self {
        self.detector = Some(model);
        self
    }

    pub fn with_tagger(mut self, model: Arc<dyn TokenTagger>) -> Self {
        self.tagger = Some(model);
        self
    }

    pub fn with_summarizer(mut self, model: Arc<dyn SummaryGenerator>) -> Self {
        self.summarizer = Some(model);
        self
    }
}

/// Request body: an uploaded file, or raw text for text masking.
#[derive(Debug, Clone)]
pub enum Payload {
    File(Upload),
    Text(String),
}

/// A request for one operation. `payload` is `None` when the caller sent
/// neither a file nor a text field.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub operation: Operation,
    pub payload: Option<Payload>,
}

impl TaskRequest {
    pub fn file(operation: Operation, upload: Upload) -> Self {
        Self {
            operation,
            payload: Some(Payload::File(upload)),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            operation: Operation::TextMask,
            payload: Some(Payload::Text(text.into())),
        }
    }

    pub fn empty(operation: Operation) -> Self {
        Self {
            operation,
            payload: None,
        }
    }
}

/// Routes requests to models. Cheap to clone; clones share the invocation
/// permits.
#[derive(Clone)]
pub struct TaskDispatcher {
    config: Arc<PipelineConfig>,
    extractor: FormatExtractor,
    models: ModelSuite,
    mask_table: Arc<MaskTable>,
    vocabulary: Arc<TagVocabulary>,
    renderer: RegionMaskRenderer,
    permits: Arc<Semaphore>,
}

impl TaskDispatcher {
    /// Validate `config` and build a dispatcher around `models`.
    pub fn new(config: PipelineConfig, models: ModelSuite) -> Result<Self> {
        config.validate()?;
        let mask_table = MaskTable::with_overrides(&config.placeholder_overrides)?;
        let extractor = FormatExtractor::new(config.canvas);
        let renderer = RegionMaskRenderer::new(config.fill_color);
        let permits = Arc::new(Semaphore::new(config.max_concurrent_invocations));

        info!(
            classifier = models.classifier.is_some(),
            detector = models.detector.is_some(),
            tagger = models.tagger.is_some(),
            summarizer = models.summarizer.is_some(),
            max_concurrent = config.max_concurrent_invocations,
            timeout_secs = ?config.model_timeout_secs,
            "Dispatcher ready"
        );

        Ok(Self {
            config: Arc::new(config),
            extractor,
            models,
            mask_table: Arc::new(mask_table),
            vocabulary: Arc::new(TagVocabulary::standard().clone()),
            renderer,
            permits,
        })
    }

    /// Replace the extractor, e.g. with one that carries an OCR backend.
    pub fn with_extractor(mut self, extractor: FormatExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the tag vocabulary of the token classifier.
    pub fn with_vocabulary(mut self, vocabulary: TagVocabulary) -> Self {
        self.vocabulary = Arc::new(vocabulary);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn root(&self) -> Banner {
        Banner {
            message: "docmask document pipeline".into(),
        }
    }

    pub fn health(&self) -> Health {
        Health::ok()
    }

    /// Run one request to completion. Never panics on bad input; every
    /// failure becomes an `{error}` envelope.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4(), operation = %request.operation))]
    pub async fn dispatch(&self, request: TaskRequest) -> Envelope {
        match self.run(request).await {
            Ok(output) => {
                info!("Task completed");
                Envelope::success(output)
            }
            Err(err) => {
                warn!(error = %err, "Task failed");
                Envelope::failure(&err)
            }
        }
    }

    async fn run(&self, request: TaskRequest) -> Result<TaskOutput> {
        let operation = request.operation;
        match operation {
            Operation::TextMask => self.mask_text(require_text(request.payload)?).await,
            Operation::Classification => {
                let (format, upload) = accept_file(operation, request.payload)?;
                self.classify(format, upload).await
            }
            Operation::RegionMask => {
                let (format, upload) = accept_file(operation, request.payload)?;
                self.mask_regions(format, upload).await
            }
            Operation::Summarization => {
                let (format, upload) = accept_file(operation, request.payload)?;
                self.summarize(format, upload).await
            }
        }
    }

    // -- Operations -----------------------------------------------------------

    async fn classify(&self, format: DocumentFormat, upload: Upload) -> Result<TaskOutput> {
        let classifier = available(&self.models.classifier, "classifier")?;
        let image = self
            .extract(format, upload.bytes, ExtractionMode::Visual)
            .await?
            .into_image()
            .ok_or_else(|| DocmaskError::Image("extractor returned text for a visual request".into()))?;

        let size = self.config.classifier_input_size;
        let scores = self
            .invoke("classifier", move || {
                let tensor = ImageProcessor::from_rgb(image).to_tensor(size);
                classifier.classify(&tensor)
            })
            .await?;

        let probabilities = scores.probabilities();
        let labels = &self.config.class_labels;
        if probabilities.len() != labels.len() {
            return Err(DocmaskError::model(
                "classifier",
                format!(
                    "{} scores for {} class labels",
                    probabilities.len(),
                    labels.len()
                ),
            ));
        }
        let (best, probability) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |acc, (i, p)| if p > acc.1 { (i, p) } else { acc });
        if !probability.is_finite() {
            return Err(DocmaskError::model("classifier", "non-finite scores"));
        }

        Ok(TaskOutput::Classification {
            prediction: labels[best].clone(),
            confidence: round2(probability),
        })
    }

    async fn mask_regions(&self, format: DocumentFormat, upload: Upload) -> Result<TaskOutput> {
        let detector = available(&self.models.detector, "detector")?;
        let image = self
            .extract(format, upload.bytes, ExtractionMode::Visual)
            .await?
            .into_image()
            .ok_or_else(|| DocmaskError::Image("extractor returned text for a visual request".into()))?;

        let threshold = self.config.detection_threshold;
        let model = Arc::clone(&detector);
        let (image, detections) = self
            .invoke("detector", move || {
                let mut detections = model.detect(&image)?;
                detections.validate()?;
                detections.retain_confident(threshold);
                Ok((image, detections))
            })
            .await?;
        info!(regions = detections.len(), threshold, "Regions detected");

        let renderer = self.renderer;
        let boxes = detections.boxes.clone();
        let masked_image = blocking("renderer", move || {
            let masked = renderer.render(&image, &boxes);
            ImageProcessor::from_rgb(masked).to_png_data_uri()
        })
        .await?;

        let labels = detections
            .labels
            .iter()
            .map(|id| detector.label_name(*id).unwrap_or_else(|| format!("Class {id}")))
            .collect();

        Ok(TaskOutput::RegionMask {
            boxes: detections.boxes,
            labels,
            scores: detections.scores,
            masked_image,
        })
    }

    async fn mask_text(&self, text: String) -> Result<TaskOutput> {
        if text.trim().is_empty() {
            return Err(DocmaskError::EmptyContent);
        }
        let tagger = available(&self.models.tagger, "token tagger")?;

        let max_tokens = self.config.max_tokens;
        let (text, tags) = self
            .invoke("token tagger", move || {
                let tags = tagger.tag(&text, max_tokens)?;
                Ok((text, tags))
            })
            .await?;

        let tokens = tags.into_tagged(&self.vocabulary)?;
        let groups = decode_spans(&text, &tokens)?;
        let masked_text =
            MaskSubstitution::new(&self.mask_table, self.config.substitution).apply(&text, &groups);

        Ok(TaskOutput::TextMask { masked_text })
    }

    async fn summarize(&self, format: DocumentFormat, upload: Upload) -> Result<TaskOutput> {
        let summarizer = available(&self.models.summarizer, "summarizer")?;
        let text = self
            .extract(format, upload.bytes, ExtractionMode::Text)
            .await?
            .into_text()
            .ok_or_else(|| DocmaskError::decode("document", "extractor returned an image for a text request"))?;
        if text.trim().is_empty() {
            return Err(DocmaskError::EmptyContent);
        }

        let params = self.config.generation;
        let summary = self
            .invoke("summarizer", move || summarizer.summarize(&text, &params))
            .await?;

        Ok(TaskOutput::Summary { summary })
    }

    // -- Plumbing -------------------------------------------------------------

    async fn extract(
        &self,
        format: DocumentFormat,
        bytes: Vec<u8>,
        mode: ExtractionMode,
    ) -> Result<Extracted> {
        let extractor = self.extractor.clone();
        blocking("extractor", move || extractor.extract(format, &bytes, mode)).await
    }

    /// Make exactly one model call on the blocking pool.
    ///
    /// The timeout covers both the wait for a permit and the call itself. On
    /// expiry the request fails, but the blocking call keeps its permit until
    /// it returns, so a stuck model still counts against the bound.
    async fn invoke<T, F>(&self, model: &'static str, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let attempt = async move {
            let permit = permits.acquire_owned().await.map_err(|_| {
                DocmaskError::model(model, "invocation pool is closed")
            })?;
            debug!(model, "Invoking model");
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                call()
            })
            .await
            .map_err(|err| DocmaskError::model(model, format!("invocation aborted: {err}")))?
        };

        match self.config.model_timeout() {
            Some(limit) => tokio::time::timeout(limit, attempt).await.map_err(|_| {
                DocmaskError::ModelTimeout {
                    model: model.into(),
                    seconds: limit.as_secs(),
                }
            })?,
            None => attempt.await,
        }
    }
}

/// Run non-model CPU work on the blocking pool.
async fn blocking<T, F>(stage: &'static str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| DocmaskError::model(stage, format!("worker aborted: {err}")))?
}

fn available<M: ?Sized>(slot: &Option<Arc<M>>, model: &str) -> Result<Arc<M>> {
    slot.clone()
        .ok_or_else(|| DocmaskError::ModelUnavailable(model.into()))
}

/// Require an uploaded file and resolve its format against the operation's
/// allow-list.
fn accept_file(operation: Operation, payload: Option<Payload>) -> Result<(DocumentFormat, Upload)> {
    let upload = match payload {
        Some(Payload::File(upload)) => upload,
        _ => return Err(DocmaskError::MissingInput("No file provided".into())),
    };
    let format = operation.check_upload(&upload.filename)?;
    debug!(filename = %upload.filename, ?format, bytes = upload.bytes.len(), "Upload accepted");
    Ok((format, upload))
}

fn require_text(payload: Option<Payload>) -> Result<String> {
    match payload {
        Some(Payload::Text(text)) => Ok(text),
        Some(Payload::File(upload)) => {
            Operation::TextMask.check_upload(&upload.filename)?;
            Err(DocmaskError::MissingInput("No text provided".into()))
        }
        None => Err(DocmaskError::MissingInput("No text provided".into())),
    }
}

fn round2(value: f32) -> f64 {
    (f64::from(value) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use docmask_core::config::{GenerationParams, SubstitutionStrategy};
    use docmask_core::types::BoundingBox;
    use docmask_document::ImageTensor;
    use image::{Rgb, RgbImage};

    use crate::models::{ClassScores, Detections, TokenTags};

    // -- Fakes ----------------------------------------------------------------

    struct FixedClassifier {
        scores: ClassScores,
        calls: AtomicUsize,
        shapes: Mutex<Vec<[usize; 4]>>,
    }

    impl FixedClassifier {
        fn new(scores: ClassScores) -> Arc<Self> {
            Arc::new(Self {
                scores,
                calls: AtomicUsize::new(0),
                shapes: Mutex::new(Vec::new()),
            })
        }
    }

    impl DocumentClassifier for FixedClassifier {
        fn classify(&self, tensor: &ImageTensor) -> Result<ClassScores> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.shapes.lock().unwrap().push(tensor.shape);
            Ok(self.scores.clone())
        }
    }

    struct FixedDetector {
        detections: Detections,
        names: bool,
        calls: AtomicUsize,
    }

    impl RegionDetector for FixedDetector {
        fn detect(&self, _image: &RgbImage) -> Result<Detections> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.detections.clone())
        }

        fn label_name(&self, id: i64) -> Option<String> {
            (self.names && id == 3).then(|| "signature".to_string())
        }
    }

    /// Tags every whitespace-separated word containing '@' as an email.
    struct EmailTagger {
        calls: AtomicUsize,
    }

    impl EmailTagger {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl TokenTagger for EmailTagger {
        fn tag(&self, text: &str, _max_tokens: usize) -> Result<TokenTags> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut tags = TokenTags::default();
            // Leading structural token, as a real tokenizer emits.
            tags.offsets.push((0, 0));
            tags.tag_ids.push(0);
            let mut cursor = 0;
            for word in text.split_whitespace() {
                let start = cursor + text[cursor..].find(word).unwrap_or(0);
                let end = start + word.len();
                let word = word.trim_end_matches(['.', ',']);
                tags.offsets.push((start, start + word.len()));
                tags.tag_ids.push(if word.contains('@') { 25 } else { 0 });
                cursor = end;
            }
            Ok(tags)
        }
    }

    struct FailingTagger;

    impl TokenTagger for FailingTagger {
        fn tag(&self, _text: &str, _max_tokens: usize) -> Result<TokenTags> {
            Err(DocmaskError::model("token tagger", "tensor shape mismatch"))
        }
    }

    struct EchoSummarizer {
        calls: AtomicUsize,
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl EchoSummarizer {
        fn new() -> Arc<Self> {
            Self::slow(Duration::ZERO)
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }
    }

    impl SummaryGenerator for EchoSummarizer {
        fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let first = text.split('.').next().unwrap_or_default().trim();
            Ok(format!("{first} ({} beams)", params.num_beams))
        }
    }

    // -- Helpers --------------------------------------------------------------

    fn dispatcher(models: ModelSuite) -> TaskDispatcher {
        TaskDispatcher::new(PipelineConfig::default(), models).unwrap()
    }

    fn png_upload(name: &str, width: u32, height: u32) -> Upload {
        let image = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
        let bytes = ImageProcessor::from_rgb(image).to_png_bytes().unwrap();
        Upload::new(name, bytes)
    }

    fn text_upload(name: &str, text: &str) -> Upload {
        Upload::new(name, text.as_bytes().to_vec())
    }

    // -- Classification -------------------------------------------------------

    #[tokio::test]
    async fn classification_reports_argmax_rounded() {
        let classifier = FixedClassifier::new(ClassScores::Probabilities(vec![0.1, 0.2, 0.7]));
        let d = dispatcher(ModelSuite::default().with_classifier(classifier.clone()));

        let env = d
            .dispatch(TaskRequest::file(
                Operation::Classification,
                text_upload("q3.txt", "Q3 budget"),
            ))
            .await;

        assert_eq!(
            env.payload(),
            Some(&TaskOutput::Classification {
                prediction: "invoice".into(),
                confidence: 0.7,
            })
        );
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(classifier.shapes.lock().unwrap()[0], [1, 3, 224, 224]);
    }

    #[tokio::test]
    async fn classification_applies_softmax_to_logits() {
        let classifier = FixedClassifier::new(ClassScores::Logits(vec![2.0, 0.0, 0.0]));
        let d = dispatcher(ModelSuite::default().with_classifier(classifier));

        let env = d
            .dispatch(TaskRequest::file(
                Operation::Classification,
                png_upload("scan.png", 30, 20),
            ))
            .await;

        assert_eq!(
            env.payload(),
            Some(&TaskOutput::Classification {
                prediction: "budget".into(),
                confidence: 0.79,
            })
        );
    }

    #[tokio::test]
    async fn classification_rejects_wrong_score_count() {
        let classifier = FixedClassifier::new(ClassScores::Probabilities(vec![0.4, 0.6]));
        let d = dispatcher(ModelSuite::default().with_classifier(classifier));

        let env = d
            .dispatch(TaskRequest::file(
                Operation::Classification,
                text_upload("a.txt", "x"),
            ))
            .await;
        assert_eq!(env.http_status(), 500);
        assert!(env.payload().is_none());
    }

    #[tokio::test]
    async fn classification_rejects_non_finite_scores() {
        let classifier =
            FixedClassifier::new(ClassScores::Probabilities(vec![f32::NAN, f32::NAN, f32::NAN]));
        let d = dispatcher(ModelSuite::default().with_classifier(classifier));

        let env = d
            .dispatch(TaskRequest::file(
                Operation::Classification,
                text_upload("a.txt", "x"),
            ))
            .await;
        assert_eq!(env.http_status(), 500);
        assert!(env.error().unwrap_or_default().contains("non-finite scores"));
    }

    // -- Input validation -----------------------------------------------------

    #[tokio::test]
    async fn unsupported_extension_never_reaches_a_model() {
        let classifier = FixedClassifier::new(ClassScores::Probabilities(vec![1.0, 0.0, 0.0]));
        let detector = Arc::new(FixedDetector {
            detections: Detections::default(),
            names: false,
            calls: AtomicUsize::new(0),
        });
        let summarizer = EchoSummarizer::new();
        let tagger = EmailTagger::new();
        let d = dispatcher(
            ModelSuite::default()
                .with_classifier(classifier.clone())
                .with_detector(detector.clone())
                .with_tagger(tagger.clone())
                .with_summarizer(summarizer.clone()),
        );

        for operation in Operation::all() {
            let env = d
                .dispatch(TaskRequest::file(operation, text_upload("notes.xyz", "hello")))
                .await;
            assert_eq!(env.http_status(), 400, "{operation}");
            assert!(env.error().unwrap_or_default().contains("xyz"), "{operation}");
        }

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
        assert_eq!(tagger.calls.load(Ordering::SeqCst), 0);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn region_mask_rejects_documents() {
        let d = dispatcher(ModelSuite::default());
        let env = d
            .dispatch(TaskRequest::file(
                Operation::RegionMask,
                text_upload("contract.pdf", "%PDF-1.5"),
            ))
            .await;
        assert_eq!(env.http_status(), 400);
    }

    #[tokio::test]
    async fn missing_payload_is_reported() {
        let d = dispatcher(ModelSuite::default());

        let env = d.dispatch(TaskRequest::empty(Operation::Summarization)).await;
        assert_eq!(env.error(), Some("No file provided"));

        let env = d.dispatch(TaskRequest::empty(Operation::TextMask)).await;
        assert_eq!(env.error(), Some("No text provided"));
    }

    #[tokio::test]
    async fn missing_model_is_unavailable() {
        let d = dispatcher(ModelSuite::default());
        let env = d
            .dispatch(TaskRequest::file(
                Operation::Summarization,
                text_upload("r.txt", "Revenue rose."),
            ))
            .await;
        assert_eq!(env.http_status(), 503);
        assert_eq!(env.error(), Some("no summarizer model is configured"));
    }

    #[tokio::test]
    async fn invalid_utf8_text_is_a_decode_error() {
        let summarizer = EchoSummarizer::new();
        let d = dispatcher(ModelSuite::default().with_summarizer(summarizer.clone()));
        let env = d
            .dispatch(TaskRequest::file(
                Operation::Summarization,
                Upload::new("r.txt", vec![0x66, 0xff, 0xfe]),
            ))
            .await;
        assert_eq!(env.http_status(), 400);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    // -- Region masking -------------------------------------------------------

    #[tokio::test]
    async fn region_mask_filters_by_threshold_and_names_labels() {
        let detector = Arc::new(FixedDetector {
            detections: Detections {
                boxes: vec![
                    BoundingBox::new(10.0, 10.0, 20.0, 20.0),
                    BoundingBox::new(0.0, 0.0, 5.0, 5.0),
                    BoundingBox::new(25.0, 25.0, 30.0, 30.0),
                    BoundingBox::new(32.0, 32.0, 36.0, 36.0),
                ],
                labels: vec![3, 1, 7, 9],
                scores: vec![0.95, 0.5, 0.91, 0.9],
            },
            names: true,
            calls: AtomicUsize::new(0),
        });
        let d = dispatcher(ModelSuite::default().with_detector(detector.clone()));

        let env = d
            .dispatch(TaskRequest::file(
                Operation::RegionMask,
                png_upload("page.png", 40, 40),
            ))
            .await;

        let Some(TaskOutput::RegionMask {
            boxes,
            labels,
            scores,
            masked_image,
        }) = env.payload()
        else {
            panic!("expected a region mask, got {env:?}");
        };
        assert_eq!(boxes.len(), 2);
        assert_eq!(labels, &["signature".to_string(), "Class 7".to_string()]);
        assert_eq!(scores, &vec![0.95f32, 0.91]);
        assert!(masked_image.starts_with("data:image/png;base64,"));
        assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_detections_fail_whole_request() {
        let detector = Arc::new(FixedDetector {
            detections: Detections {
                boxes: vec![BoundingBox::new(0.0, 0.0, 1.0, 1.0)],
                labels: vec![],
                scores: vec![0.99],
            },
            names: false,
            calls: AtomicUsize::new(0),
        });
        let d = dispatcher(ModelSuite::default().with_detector(detector));
        let env = d
            .dispatch(TaskRequest::file(
                Operation::RegionMask,
                png_upload("page.png", 8, 8),
            ))
            .await;
        assert_eq!(env.http_status(), 500);
        assert!(env.payload().is_none());
    }

    // -- Text masking ---------------------------------------------------------

    #[tokio::test]
    async fn text_mask_replaces_detected_entities() {
        let d = dispatcher(ModelSuite::default().with_tagger(EmailTagger::new()));
        let env = d
            .dispatch(TaskRequest::text("Write to ana@corp.io today."))
            .await;
        assert_eq!(
            env.payload(),
            Some(&TaskOutput::TextMask {
                masked_text: "Write to {E-Mail} today.".into(),
            })
        );
    }

    #[tokio::test]
    async fn whitespace_text_never_reaches_the_tagger() {
        let tagger = EmailTagger::new();
        let d = dispatcher(ModelSuite::default().with_tagger(tagger.clone()));

        let env = d.dispatch(TaskRequest::text("   ")).await;
        assert_eq!(env.http_status(), 400);
        assert_eq!(tagger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn text_mask_honours_overrides_and_strategy() {
        let mut config = PipelineConfig::default();
        config
            .placeholder_overrides
            .insert("EMAIL".into(), "[email]".into());
        config.substitution = SubstitutionStrategy::ByOffset;
        let d = TaskDispatcher::new(config, ModelSuite::default().with_tagger(EmailTagger::new()))
            .unwrap();

        let env = d.dispatch(TaskRequest::text("a@b.c and a@b.c")).await;
        assert_eq!(
            env.payload(),
            Some(&TaskOutput::TextMask {
                masked_text: "[email] and [email]".into(),
            })
        );
    }

    #[tokio::test]
    async fn tagger_failure_is_all_or_nothing() {
        let d = dispatcher(ModelSuite::default().with_tagger(Arc::new(FailingTagger)));
        let env = d.dispatch(TaskRequest::text("ana@corp.io")).await;

        assert_eq!(env.http_status(), 500);
        assert!(env.payload().is_none());
        assert!(env.error().unwrap_or_default().contains("tensor shape mismatch"));
    }

    #[tokio::test]
    async fn file_sent_to_text_mask_is_rejected() {
        let d = dispatcher(ModelSuite::default().with_tagger(EmailTagger::new()));
        let env = d
            .dispatch(TaskRequest::file(Operation::TextMask, text_upload("a.txt", "x")))
            .await;
        assert_eq!(env.http_status(), 400);
    }

    // -- Summarisation --------------------------------------------------------

    #[tokio::test]
    async fn summary_uses_generation_params() {
        let d = dispatcher(ModelSuite::default().with_summarizer(EchoSummarizer::new()));
        let env = d
            .dispatch(TaskRequest::file(
                Operation::Summarization,
                text_upload("report.txt", "Revenue rose. Costs fell."),
            ))
            .await;
        assert_eq!(
            env.payload(),
            Some(&TaskOutput::Summary {
                summary: "Revenue rose (5 beams)".into(),
            })
        );
    }

    #[tokio::test]
    async fn blank_document_is_not_summarised() {
        let summarizer = EchoSummarizer::new();
        let d = dispatcher(ModelSuite::default().with_summarizer(summarizer.clone()));
        let env = d
            .dispatch(TaskRequest::file(
                Operation::Summarization,
                text_upload("blank.txt", " \n\t "),
            ))
            .await;
        assert_eq!(env.error(), Some("No readable text found in the input."));
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn raster_summary_without_ocr_fails_cleanly() {
        let summarizer = EchoSummarizer::new();
        let d = dispatcher(ModelSuite::default().with_summarizer(summarizer.clone()));
        let env = d
            .dispatch(TaskRequest::file(
                Operation::Summarization,
                png_upload("scan.png", 10, 10),
            ))
            .await;
        assert_eq!(env.http_status(), 500);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    // -- Resource bounds ------------------------------------------------------

    #[tokio::test]
    async fn slow_model_times_out() {
        let config = PipelineConfig {
            model_timeout_secs: Some(1),
            ..PipelineConfig::default()
        };
        let summarizer = EchoSummarizer::slow(Duration::from_millis(1800));
        let d = TaskDispatcher::new(config, ModelSuite::default().with_summarizer(summarizer))
            .unwrap();

        let env = d
            .dispatch(TaskRequest::file(
                Operation::Summarization,
                text_upload("r.txt", "Revenue rose."),
            ))
            .await;
        assert_eq!(env.http_status(), 504);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_invocations_are_bounded() {
        let config = PipelineConfig {
            max_concurrent_invocations: 1,
            ..PipelineConfig::default()
        };
        let summarizer = EchoSummarizer::slow(Duration::from_millis(40));
        let d = TaskDispatcher::new(
            config,
            ModelSuite::default().with_summarizer(summarizer.clone()),
        )
        .unwrap();

        let mut handles = Vec::new();
        for i in 0..4 {
            let d = d.clone();
            handles.push(tokio::spawn(async move {
                d.dispatch(TaskRequest::file(
                    Operation::Summarization,
                    text_upload(&format!("r{i}.txt"), "Revenue rose."),
                ))
                .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_success());
        }
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 4);
        assert_eq!(summarizer.peak.load(Ordering::SeqCst), 1);
    }

    // -- Metadata -------------------------------------------------------------

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            max_concurrent_invocations: 0,
            ..PipelineConfig::default()
        };
        assert!(TaskDispatcher::new(config, ModelSuite::default()).is_err());
    }

    #[test]
    fn health_and_root() {
        let d = dispatcher(ModelSuite::default());
        assert_eq!(d.health().tasks.len(), 4);
        assert!(!d.root().message.is_empty());
    }
}
