/// Classification request flow
///
/// Ties the media host, the classifier and the session together:
/// picking an image immediately starts its classification, and each
/// request settles exactly once into the session.
///
/// The flow is split into steps so the UI loop can run the slow parts
/// (picker, upload) as background tasks without borrowing the flow:
/// `pick()` -> `apply_pick()` -> `PendingRequest::finish()` -> `settle()`.
/// `select_image()` runs the same steps in sequence.
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{info, warn};

use crate::classify::Classifier;
use crate::error::FlowError;
use crate::host::{MediaHost, Permission};
use crate::state::data::{Classification, ImageHandle};
use crate::state::session::{RequestTicket, Session};

/// What the host gave back for a selection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickResult {
    Denied,
    Cancelled,
    Picked(ImageHandle),
}

/// A started request whose response has not settled yet
pub struct PendingRequest {
    ticket: RequestTicket,
    response: BoxFuture<'static, Result<Classification, FlowError>>,
}

impl PendingRequest {
    /// Wait for the response, tagged with the ticket it belongs to
    pub async fn finish(self) -> (RequestTicket, Result<Classification, FlowError>) {
        let result = self.response.await;
        (self.ticket, result)
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("ticket", &self.ticket)
            .finish()
    }
}

pub struct ClassificationFlow {
    session: Session,
    host: Arc<dyn MediaHost>,
    classifier: Arc<dyn Classifier>,
}

impl ClassificationFlow {
    pub fn new(host: Arc<dyn MediaHost>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            session: Session::new(),
            host,
            classifier,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Ask for permission, then for an image
    pub fn pick(&self) -> BoxFuture<'static, PickResult> {
        let host = self.host.clone();
        async move {
            if host.request_permission().await == Permission::Denied {
                return PickResult::Denied;
            }
            match host.pick_image().await {
                Some(image) => PickResult::Picked(image),
                None => PickResult::Cancelled,
            }
        }
        .boxed()
    }

    /// Record the pick. A new image starts its classification right away.
    pub fn apply_pick(&mut self, pick: PickResult) -> Option<PendingRequest> {
        match pick {
            // Also drops a request still in flight for the current image
            PickResult::Denied => {
                warn!("Media library permission denied");
                self.session.fail(FlowError::PermissionDenied);
                None
            }
            PickResult::Cancelled => {
                info!("Image selection cancelled");
                if self.session.clear_failure() {
                    info!("Cleared the previous error");
                }
                None
            }
            PickResult::Picked(image) => {
                self.session.select(image.clone());
                self.classify(image)
            }
        }
    }

    /// Enter `Pending` and build the upload for `image`.
    /// Fails straight away, without a request, if the classifier is not ready.
    pub fn classify(&mut self, image: ImageHandle) -> Option<PendingRequest> {
        if let Err(err) = self.classifier.check_ready() {
            warn!("Not classifying {}: {}", image.file_name(), err);
            self.session.fail(err);
            return None;
        }

        let ticket = self.session.begin_request();
        info!("⏳ Classifying {} ({:?})", image.file_name(), ticket);

        let classifier = self.classifier.clone();
        let response = async move {
            let bytes = tokio::fs::read(image.path()).await.map_err(|e| {
                FlowError::Transport(format!("Failed to read {}: {}", image.path().display(), e))
            })?;
            classifier.classify(bytes).await
        }
        .boxed();

        Some(PendingRequest { ticket, response })
    }

    /// Store a settled response. Returns false if it was superseded.
    pub fn settle(
        &mut self,
        ticket: RequestTicket,
        result: Result<Classification, FlowError>,
    ) -> bool {
        match &result {
            Ok(classification) => info!(
                "✅ Classified as {}",
                classification.label().unwrap_or("<unrecognized>")
            ),
            Err(err) => warn!("❌ Classification failed: {}", err),
        }
        self.session.settle(ticket, result)
    }

    /// Pick an image and classify it, start to finish
    pub async fn select_image(&mut self) {
        let pick = self.pick().await;
        if let Some(pending) = self.apply_pick(pick) {
            let (ticket, result) = pending.finish().await;
            self.settle(ticket, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{Outcome, ScoredLabel, TopPrediction};
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    struct FakeHost {
        permission: Permission,
        image: Option<ImageHandle>,
        picks: AtomicUsize,
    }

    impl FakeHost {
        fn new(permission: Permission, image: Option<ImageHandle>) -> Arc<Self> {
            Arc::new(Self {
                permission,
                image,
                picks: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MediaHost for FakeHost {
        async fn request_permission(&self) -> Permission {
            self.permission
        }

        async fn pick_image(&self) -> Option<ImageHandle> {
            self.picks.fetch_add(1, Ordering::SeqCst);
            self.image.clone()
        }
    }

    /// Answers with the uploaded bytes as the label, or a fixed error
    struct FakeClassifier {
        ready: Result<(), FlowError>,
        failure: Option<FlowError>,
        uploads: Mutex<Vec<Vec<u8>>>,
    }

    impl FakeClassifier {
        fn echo() -> Arc<Self> {
            Arc::new(Self {
                ready: Ok(()),
                failure: None,
                uploads: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: FlowError) -> Arc<Self> {
            Arc::new(Self {
                ready: Ok(()),
                failure: Some(err),
                uploads: Mutex::new(Vec::new()),
            })
        }

        fn without_credential() -> Arc<Self> {
            Arc::new(Self {
                ready: Err(FlowError::MissingCredential),
                failure: None,
                uploads: Mutex::new(Vec::new()),
            })
        }

        fn upload_count(&self) -> usize {
            self.uploads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Classifier for FakeClassifier {
        fn check_ready(&self) -> Result<(), FlowError> {
            self.ready.clone()
        }

        async fn classify(&self, image: Vec<u8>) -> Result<Classification, FlowError> {
            self.uploads.lock().unwrap().push(image.clone());
            if let Some(err) = &self.failure {
                return Err(err.clone());
            }
            let label = String::from_utf8_lossy(&image).to_string();
            Ok(Classification {
                top: TopPrediction::Label(ScoredLabel::new(label.as_str())),
                ranked: Vec::new(),
                raw: serde_json::json!({ "top": label }),
            })
        }
    }

    fn leaf_photo(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_pick_classifies_automatically() {
        let photo = leaf_photo("Tomato Bacterial Spot");
        let image = ImageHandle::new(photo.path());
        let host = FakeHost::new(Permission::Granted, Some(image.clone()));
        let classifier = FakeClassifier::echo();
        let mut flow = ClassificationFlow::new(host, classifier.clone());

        flow.select_image().await;

        assert_eq!(flow.session().selected(), Some(&image));
        match flow.session().outcome() {
            Outcome::Success(c) => {
                assert_eq!(c.label(), Some("Tomato Bacterial Spot"));
                assert_eq!(c.advice(), "Use copper-based bactericide; remove infected leaves");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(
            classifier.uploads.lock().unwrap()[0],
            b"Tomato Bacterial Spot".to_vec()
        );
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let host = FakeHost::new(Permission::Denied, Some(ImageHandle::new("unused.jpg")));
        let classifier = FakeClassifier::echo();
        let mut flow = ClassificationFlow::new(host.clone(), classifier.clone());

        flow.select_image().await;

        assert_eq!(
            flow.session().outcome(),
            &Outcome::Failure(FlowError::PermissionDenied)
        );
        assert!(flow.session().selected().is_none());
        assert_eq!(host.picks.load(Ordering::SeqCst), 0);
        assert_eq!(classifier.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_on_fresh_session() {
        let host = FakeHost::new(Permission::Granted, None);
        let classifier = FakeClassifier::echo();
        let mut flow = ClassificationFlow::new(host, classifier.clone());

        flow.select_image().await;

        assert!(flow.session().selected().is_none());
        assert_eq!(flow.session().outcome(), &Outcome::Unset);
        assert_eq!(classifier.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_clears_previous_error() {
        let photo = leaf_photo("Leaf Rust");
        let image = ImageHandle::new(photo.path());
        let host = FakeHost::new(Permission::Granted, None);
        let classifier = FakeClassifier::failing(FlowError::Service {
            service: "Roboflow",
            status: 500,
        });
        let mut flow = ClassificationFlow::new(host, classifier);

        let pending = flow.apply_pick(PickResult::Picked(image.clone())).unwrap();
        let (ticket, result) = pending.finish().await;
        flow.settle(ticket, result);
        assert!(flow.session().outcome().error_message().is_some());

        assert!(flow.apply_pick(PickResult::Cancelled).is_none());
        assert_eq!(flow.session().outcome(), &Outcome::Unset);
        assert_eq!(flow.session().selected(), Some(&image));

        flow.apply_pick(PickResult::Denied);
        flow.apply_pick(PickResult::Cancelled);
        assert_eq!(flow.session().outcome(), &Outcome::Unset);
    }

    #[tokio::test]
    async fn test_cancel_keeps_previous_result() {
        let photo = leaf_photo("Apple Scab");
        let image = ImageHandle::new(photo.path());
        let host = FakeHost::new(Permission::Granted, None);
        let mut flow = ClassificationFlow::new(host, FakeClassifier::echo());

        let pending = flow.apply_pick(PickResult::Picked(image)).unwrap();
        let (ticket, result) = pending.finish().await;
        assert!(flow.settle(ticket, result));

        flow.apply_pick(PickResult::Cancelled);
        match flow.session().outcome() {
            Outcome::Success(c) => assert_eq!(c.label(), Some("Apple Scab")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_credential_never_uploads() {
        let photo = leaf_photo("Early Blight");
        let image = ImageHandle::new(photo.path());
        let host = FakeHost::new(Permission::Granted, Some(image.clone()));
        let classifier = FakeClassifier::without_credential();
        let mut flow = ClassificationFlow::new(host, classifier.clone());

        let pending = flow.apply_pick(PickResult::Picked(image.clone()));
        assert!(pending.is_none());
        assert_eq!(flow.session().selected(), Some(&image));
        assert_eq!(
            flow.session().outcome().error_message().as_deref(),
            Some("missing credential")
        );
        assert_eq!(classifier.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_pending_before_response() {
        let photo = leaf_photo("Powdery Mildew");
        let host = FakeHost::new(Permission::Granted, None);
        let classifier = FakeClassifier::echo();
        let mut flow = ClassificationFlow::new(host, classifier.clone());

        let pending = flow.classify(ImageHandle::new(photo.path())).unwrap();
        assert_eq!(flow.session().outcome(), &Outcome::Pending);
        assert_eq!(classifier.upload_count(), 0);

        let (ticket, result) = pending.finish().await;
        assert!(flow.settle(ticket, result));
        assert!(matches!(flow.session().outcome(), Outcome::Success(_)));
    }

    #[tokio::test]
    async fn test_new_pick_supersedes_pending_request() {
        let first = leaf_photo("Early Blight");
        let second = leaf_photo("Apple Rust");
        let host = FakeHost::new(Permission::Granted, None);
        let mut flow = ClassificationFlow::new(host, FakeClassifier::echo());

        let stale = flow
            .apply_pick(PickResult::Picked(ImageHandle::new(first.path())))
            .unwrap();
        let fresh = flow
            .apply_pick(PickResult::Picked(ImageHandle::new(second.path())))
            .unwrap();
        assert_ne!(stale.ticket, fresh.ticket);

        // The fresh response lands first, the stale one after it
        let (ticket, result) = fresh.finish().await;
        assert!(flow.settle(ticket, result));
        let (ticket, result) = stale.finish().await;
        assert!(!flow.settle(ticket, result));

        match flow.session().outcome() {
            Outcome::Success(c) => assert_eq!(c.label(), Some("Apple Rust")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_response_after_reselect_is_ignored() {
        let first = leaf_photo("Early Blight");
        let host = FakeHost::new(Permission::Granted, None);
        let mut flow = ClassificationFlow::new(host, FakeClassifier::without_credential());

        // Force a request in flight, then select again without credentials
        flow.session.select(ImageHandle::new(first.path()));
        let ticket = flow.session.begin_request();
        flow.session.select(ImageHandle::new("other.jpg"));
        assert_eq!(flow.session().outcome(), &Outcome::Unset);

        let late = Err(FlowError::Transport("connection reset".into()));
        assert!(!flow.settle(ticket, late));
        assert_eq!(flow.session().outcome(), &Outcome::Unset);
    }

    #[tokio::test]
    async fn test_service_error_is_failure() {
        let photo = leaf_photo("anything");
        let image = ImageHandle::new(photo.path());
        let host = FakeHost::new(Permission::Granted, Some(image));
        let classifier = FakeClassifier::failing(FlowError::Service {
            service: "Roboflow",
            status: 403,
        });
        let mut flow = ClassificationFlow::new(host, classifier);

        flow.select_image().await;

        assert_eq!(
            flow.session().outcome().error_message().as_deref(),
            Some("Roboflow error: 403")
        );
    }

    #[tokio::test]
    async fn test_unreadable_image_is_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.jpg");
        let host = FakeHost::new(Permission::Granted, Some(ImageHandle::new(&missing)));
        let classifier = FakeClassifier::echo();
        let mut flow = ClassificationFlow::new(host, classifier.clone());

        flow.select_image().await;

        match flow.session().outcome() {
            Outcome::Failure(FlowError::Transport(message)) => {
                assert!(message.contains("gone.jpg"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(classifier.upload_count(), 0);
    }
}
