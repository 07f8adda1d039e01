use crate::tests::support::stubs::StubDispatchUseCase;
use crate::verification::adapter::incoming::delivery_dedup::DeliveryDeduplicator;
use crate::verification::application::use_cases::dispatch_verification_email::IDispatchVerificationEmailUseCase;
use crate::AppState;
use actix_web::web;
use std::sync::Arc;
use std::time::Duration;

pub struct TestAppStateBuilder {
    dispatch: Option<Arc<dyn IDispatchVerificationEmailUseCase + Send + Sync>>,
    dedup_window: Duration,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self {
            dispatch: Some(Arc::new(StubDispatchUseCase)),
            dedup_window: Duration::ZERO,
        }
    }
}

impl TestAppStateBuilder {
    pub fn with_dispatch(
        mut self,
        uc: impl IDispatchVerificationEmailUseCase + Send + Sync + 'static,
    ) -> Self {
        self.dispatch = Some(Arc::new(uc));
        self
    }

    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    pub fn build(self) -> web::Data<AppState> {
        web::Data::new(AppState {
            dispatch_verification_email_use_case: self.dispatch.unwrap(),
            delivery_deduplicator: Arc::new(DeliveryDeduplicator::new(self.dedup_window)),
        })
    }
}
