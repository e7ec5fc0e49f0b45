//! Background assessment worker.
//!
//! Loading an artifact can take a while on a cold start, so prediction runs
//! on a separate thread and reports progress back to the TUI main loop.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::application::{Assessment, AssessmentService};
use crate::domain::{FeatureRecord, Horizon};
use crate::ports::ArtifactSource;

/// Progress updates from the assessment worker.
#[derive(Debug, Clone)]
pub enum AssessmentProgress {
    /// Artifact for this horizon is not resident yet and is being loaded
    LoadingModel(Horizon),
    /// Classifier ready, scoring the record
    Predicting,
    /// Finished with a result
    Complete(Box<Assessment>),
    /// Prediction failed
    Error(String),
}

/// Handle to a running assessment worker.
pub struct AssessmentWorkerHandle {
    pub progress_rx: Receiver<AssessmentProgress>,
    _handle: JoinHandle<()>,
}

impl AssessmentWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<AssessmentProgress> {
        self.progress_rx.try_recv().ok()
    }
}

/// Worker that runs one prediction in the background.
pub struct AssessmentWorker;

impl AssessmentWorker {
    /// Spawn a background prediction for an already validated record.
    pub fn spawn<S>(service: Arc<AssessmentService<S>>, record: FeatureRecord) -> AssessmentWorkerHandle
    where
        S: ArtifactSource + 'static,
    {
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::run_with_progress(&service, record, &tx);
        });

        AssessmentWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run_with_progress<S>(
        service: &AssessmentService<S>,
        record: FeatureRecord,
        tx: &Sender<AssessmentProgress>,
    ) where
        S: ArtifactSource,
    {
        let horizon = record.horizon();
        if !service.gateway().is_loaded(horizon) {
            let _ = tx.send(AssessmentProgress::LoadingModel(horizon));
        }
        let classifier = match service.load_classifier(horizon) {
            Ok(classifier) => classifier,
            Err(e) => {
                let _ = tx.send(AssessmentProgress::Error(e.to_string()));
                return;
            }
        };

        let _ = tx.send(AssessmentProgress::Predicting);
        let message = match service.run_prediction_with(classifier.as_ref(), &record) {
            Ok(prediction) => {
                AssessmentProgress::Complete(Box::new(Assessment::new(record, prediction)))
            }
            Err(e) => AssessmentProgress::Error(e.to_string()),
        };
        let _ = tx.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::predictor::tests::CountingSource;
    use crate::application::PredictorGateway;
    use crate::domain::{encode, OutputMode, Submission};
    use std::time::Duration;

    fn drain(handle: &AssessmentWorkerHandle) -> Vec<AssessmentProgress> {
        let mut seen = Vec::new();
        while let Ok(progress) = handle.progress_rx.recv_timeout(Duration::from_secs(5)) {
            let done = matches!(
                progress,
                AssessmentProgress::Complete(_) | AssessmentProgress::Error(_)
            );
            seen.push(progress);
            if done {
                break;
            }
        }
        seen
    }

    #[test]
    fn test_worker_reports_load_then_result() {
        let service = Arc::new(AssessmentService::with_source(
            Arc::new(CountingSource::new(0.9, 0.1)),
            OutputMode::Probability,
        ));
        let record = encode(&Submission::example()).expect("example");

        let first = drain(&AssessmentWorker::spawn(Arc::clone(&service), record));
        assert!(matches!(first[0], AssessmentProgress::LoadingModel(Horizon::OneYear)));
        assert!(matches!(first[1], AssessmentProgress::Predicting));
        match &first[2] {
            AssessmentProgress::Complete(assessment) => {
                assert_eq!(assessment.horizon(), Horizon::OneYear);
            }
            other => panic!("unexpected progress: {other:?}"),
        }

        // Cached now: no load step.
        let second = drain(&AssessmentWorker::spawn(Arc::clone(&service), record));
        assert!(matches!(second[0], AssessmentProgress::Predicting));
        assert_eq!(service.gateway().source().loads(Horizon::OneYear), 1);
    }

    #[test]
    fn test_uncached_submission_loads_once() {
        let gateway =
            PredictorGateway::new(Arc::new(CountingSource::new(0.9, 0.1))).with_cache(false);
        let service = Arc::new(AssessmentService::new(gateway, OutputMode::Probability));
        let record = encode(&Submission::example()).expect("example");

        let progress = drain(&AssessmentWorker::spawn(Arc::clone(&service), record));
        assert!(matches!(progress.last(), Some(AssessmentProgress::Complete(_))));
        assert_eq!(service.gateway().source().loads(Horizon::OneYear), 1);
    }

    #[test]
    fn test_worker_reports_load_failure() {
        let mut source = CountingSource::new(0.9, 0.1);
        source.fail = true;
        let service = Arc::new(AssessmentService::with_source(
            Arc::new(source),
            OutputMode::Probability,
        ));
        let record = encode(&Submission::example()).expect("example");

        let progress = drain(&AssessmentWorker::spawn(service, record));
        match progress.last() {
            Some(AssessmentProgress::Error(message)) => {
                assert!(message.contains("unavailable"), "{message}");
            }
            other => panic!("unexpected progress: {other:?}"),
        }
    }
}
