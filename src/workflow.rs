// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylink Contributors

//! # Link-Creation Workflow
//!
//! Stateful orchestrator for the payment-link creation flow. It gates access
//! to the creation form and drives the submit-to-redirect or submit-to-error
//! transition:
//!
//! ```text
//! CheckingEligibility -> Editable -> Submitting -> Redirecting
//!                                              \-> EditableWithError -> Editable
//! ```
//!
//! All collaborators are injected as trait objects so the machine can be
//! driven deterministically in tests: the aggregator subset it needs
//! ([`LinkedAddressApi`]), the session/auth provider, the read-only token
//! store, the router and the user-notification sink.
//!
//! ## Eligibility
//!
//! Eligibility re-runs whenever session readiness, authentication or link
//! status changes. Each run supersedes the previous one by logical order,
//! not arrival order: [`LinkWorkflow::begin_eligibility_check`] hands out an
//! epoch ticket and [`LinkWorkflow::apply_eligibility`] ignores results
//! carrying a stale ticket, so a slow lookup can never overwrite a fresher
//! outcome. [`LinkWorkflow::refresh_eligibility`] composes the two around
//! one `get_linked_address` call.
//!
//! ## Submission
//!
//! `Submitting` suppresses further submits: at most one link request is in
//! flight per workflow instance, and a second submit while one is pending or
//! after a redirect is a no-op rather than a second network call.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    error::AggregatorError,
    models::{LinkAddressRequest, LinkedAddress, LinkedAddressLookup},
};

/// The aggregator operations the workflow depends on.
///
/// [`crate::aggregator::AggregatorClient`] implements this; tests substitute
/// a fake.
#[async_trait]
pub trait LinkedAddressApi: Send + Sync {
    /// Look up the link status for an owning address. `404` maps to
    /// [`LinkedAddressLookup::NotLinked`], never to an error.
    async fn get_linked_address(
        &self,
        owner_address: &str,
    ) -> Result<LinkedAddressLookup, AggregatorError>;

    /// Submit a new address link under the given bearer token.
    async fn link_address(
        &self,
        bearer_token: &str,
        payload: &LinkAddressRequest,
    ) -> Result<LinkedAddress, AggregatorError>;
}

/// Read-only view of the external wallet session.
pub trait SessionProvider: Send + Sync {
    fn snapshot(&self) -> SessionSnapshot;
}

/// Point-in-time session state, owned by the external auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Whether the session provider has finished initializing.
    pub ready: bool,
    /// Whether the user is authenticated.
    pub authenticated: bool,
    /// Resolved display identity (name or address), once available.
    pub identity: Option<String>,
}

/// Read-only bearer-token lookup, owned externally. The workflow reads the
/// token per request and never persists or refreshes it.
pub trait TokenStore: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Navigate-to-path primitive exposed by the routing layer.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Sink for user-visible notices. Rendering is the UI layer's problem.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A user-visible notification. Messages are generic by design: underlying
/// causes are logged, never shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Workflow states. `Redirecting` is terminal for this workflow;
/// `EditableWithError` is recoverable via [`LinkWorkflow::acknowledge_error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    /// Initial state: session or link status not yet established. The form
    /// is not shown.
    CheckingEligibility,
    /// The creation form is shown and accepts input.
    Editable,
    /// A link submission is in flight. Further submits are no-ops.
    Submitting,
    /// The workflow is done; the UI should navigate to `target`.
    Redirecting { target: String },
    /// The last submission failed; the form keeps its values and the user
    /// must acknowledge before editing resumes.
    EditableWithError,
}

/// Opaque token tying an eligibility result to the check that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityTicket(u64);

/// The link-creation orchestrator. One instance per workflow; the state is
/// owned exclusively here and never shared across instances.
pub struct LinkWorkflow {
    api: Arc<dyn LinkedAddressApi>,
    session: Arc<dyn SessionProvider>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    state: WorkflowState,
    eligibility_epoch: u64,
}

impl LinkWorkflow {
    pub fn new(
        api: Arc<dyn LinkedAddressApi>,
        session: Arc<dyn SessionProvider>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            session,
            tokens,
            navigator,
            notifier,
            state: WorkflowState::CheckingEligibility,
            eligibility_epoch: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Start a new eligibility check, superseding any check still in flight.
    pub fn begin_eligibility_check(&mut self) -> EligibilityTicket {
        self.eligibility_epoch += 1;
        EligibilityTicket(self.eligibility_epoch)
    }

    /// Apply the outcome of one eligibility check.
    ///
    /// Synchronous and side-effect-free apart from navigation/notices, so it
    /// can be unit-tested without a UI harness. A stale ticket (a newer
    /// check has begun since) is discarded; a result arriving after the form
    /// has moved on to submission or redirect is discarded too.
    pub fn apply_eligibility(
        &mut self,
        ticket: EligibilityTicket,
        snapshot: &SessionSnapshot,
        lookup: &LinkedAddressLookup,
    ) {
        if ticket.0 != self.eligibility_epoch {
            info!(ticket = ticket.0, "Discarding superseded eligibility result");
            return;
        }
        if matches!(
            self.state,
            WorkflowState::Submitting | WorkflowState::Redirecting { .. }
        ) {
            return;
        }

        // Without a resolved identity there is nowhere to redirect to yet;
        // redirecting on first render would be premature.
        let Some(identity) = snapshot.identity.as_deref() else {
            self.state = WorkflowState::CheckingEligibility;
            return;
        };

        let already_linked = matches!(lookup, LinkedAddressLookup::Linked(_));
        if !snapshot.ready || !snapshot.authenticated || already_linked {
            if already_linked {
                self.notifier.notify(Notice::warning(
                    "Your address is already linked. Redirecting to your dashboard...",
                ));
            }
            self.redirect_to(profile_route(identity));
            return;
        }

        if self.state == WorkflowState::CheckingEligibility {
            self.state = WorkflowState::Editable;
        }
    }

    /// Re-evaluate eligibility against the current session and link status.
    ///
    /// Call whenever readiness, authentication or link status may have
    /// changed. Short-circuits before any network call when the display
    /// identity is unresolved, and when the session alone already decides
    /// the outcome. A failed status lookup leaves the workflow in
    /// `CheckingEligibility`: the form must not appear, and a redirect on
    /// unknown status would be just as wrong.
    pub async fn refresh_eligibility(&mut self) {
        let snapshot = self.session.snapshot();
        let Some(identity) = snapshot.identity.clone() else {
            return;
        };

        let ticket = self.begin_eligibility_check();

        if !snapshot.ready || !snapshot.authenticated {
            self.apply_eligibility(ticket, &snapshot, &LinkedAddressLookup::NotLinked);
            return;
        }

        match self.api.get_linked_address(&identity).await {
            Ok(lookup) => self.apply_eligibility(ticket, &snapshot, &lookup),
            Err(e) => {
                warn!(identity = %identity, error = %e, "Eligibility lookup failed; staying in checking state");
            }
        }
    }

    /// Submit the link-creation form.
    ///
    /// A no-op unless the form is editable: the `Submitting` guard keeps at
    /// most one link request in flight, and a submit after redirect does
    /// nothing. The form is borrowed, not consumed, so entered values
    /// survive a failed attempt.
    pub async fn submit(&mut self, form: &LinkAddressRequest) {
        match self.state {
            WorkflowState::Editable | WorkflowState::EditableWithError => {}
            _ => return,
        }

        let token = self
            .tokens
            .bearer_token()
            .filter(|t| !t.trim().is_empty());
        let Some(token) = token else {
            self.notifier.notify(Notice::error(
                "Session token not found, please sign in again.",
            ));
            self.state = WorkflowState::Editable;
            return;
        };

        self.state = WorkflowState::Submitting;
        match self.api.link_address(&token, form).await {
            Ok(linked) => {
                let identity = self
                    .session
                    .snapshot()
                    .identity
                    .unwrap_or_else(|| linked.address.clone());
                info!(address = %linked.address, institution = %linked.institution, "Address linked");
                self.redirect_to(profile_route(&identity));
            }
            Err(e) => {
                // Transport detail stays in the logs; the user gets a
                // generic, recoverable failure.
                warn!(error = %e, "Linking address failed");
                self.notifier
                    .notify(Notice::error("Something went wrong, please try again."));
                self.state = WorkflowState::EditableWithError;
            }
        }
    }

    /// Acknowledge a failed submission, returning the form to `Editable`.
    pub fn acknowledge_error(&mut self) {
        if self.state == WorkflowState::EditableWithError {
            self.state = WorkflowState::Editable;
        }
    }

    fn redirect_to(&mut self, target: String) {
        self.navigator.navigate(&target);
        self.state = WorkflowState::Redirecting { target };
    }
}

fn profile_route(identity: &str) -> String {
    format!("/{identity}")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    enum LookupBehavior {
        Linked,
        NotLinked,
        Fail,
    }

    enum LinkBehavior {
        Succeed,
        Fail,
    }

    struct FakeApi {
        lookup: LookupBehavior,
        link: LinkBehavior,
        lookup_calls: AtomicUsize,
        link_calls: AtomicUsize,
    }

    impl FakeApi {
        fn new(lookup: LookupBehavior, link: LinkBehavior) -> Self {
            Self {
                lookup,
                link,
                lookup_calls: AtomicUsize::new(0),
                link_calls: AtomicUsize::new(0),
            }
        }

        fn linked_record() -> LinkedAddress {
            LinkedAddress {
                address: "0xabc".to_string(),
                institution: "GTB".to_string(),
                account_identifier: "0123456789".to_string(),
                created_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl LinkedAddressApi for FakeApi {
        async fn get_linked_address(
            &self,
            _owner_address: &str,
        ) -> Result<LinkedAddressLookup, AggregatorError> {
            self.lookup_calls.fetch_add(1, Ordering::SeqCst);
            match self.lookup {
                LookupBehavior::Linked => {
                    Ok(LinkedAddressLookup::Linked(Self::linked_record()))
                }
                LookupBehavior::NotLinked => Ok(LinkedAddressLookup::NotLinked),
                LookupBehavior::Fail => Err(AggregatorError::Remote {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".to_string(),
                }),
            }
        }

        async fn link_address(
            &self,
            _bearer_token: &str,
            _payload: &LinkAddressRequest,
        ) -> Result<LinkedAddress, AggregatorError> {
            self.link_calls.fetch_add(1, Ordering::SeqCst);
            match self.link {
                LinkBehavior::Succeed => Ok(Self::linked_record()),
                LinkBehavior::Fail => Err(AggregatorError::Remote {
                    status: reqwest::StatusCode::BAD_REQUEST,
                    body: "unsupported institution".to_string(),
                }),
            }
        }
    }

    struct FakeSession(SessionSnapshot);

    impl SessionProvider for FakeSession {
        fn snapshot(&self) -> SessionSnapshot {
            self.0.clone()
        }
    }

    struct FakeTokens(Option<String>);

    impl TokenStore for FakeTokens {
        fn bearer_token(&self) -> Option<String> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct RecordingNavigator(Mutex<Vec<String>>);

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.0.lock().unwrap().push(path.to_string());
        }
    }

    #[derive(Default)]
    struct RecordingNotifier(Mutex<Vec<Notice>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    struct Harness {
        api: Arc<FakeApi>,
        navigator: Arc<RecordingNavigator>,
        notifier: Arc<RecordingNotifier>,
        workflow: LinkWorkflow,
    }

    fn harness(
        lookup: LookupBehavior,
        link: LinkBehavior,
        snapshot: SessionSnapshot,
        token: Option<&str>,
    ) -> Harness {
        let api = Arc::new(FakeApi::new(lookup, link));
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let workflow = LinkWorkflow::new(
            api.clone(),
            Arc::new(FakeSession(snapshot)),
            Arc::new(FakeTokens(token.map(str::to_string))),
            navigator.clone(),
            notifier.clone(),
        );
        Harness {
            api,
            navigator,
            notifier,
            workflow,
        }
    }

    fn ready_session() -> SessionSnapshot {
        SessionSnapshot {
            ready: true,
            authenticated: true,
            identity: Some("ada.base.eth".to_string()),
        }
    }

    fn form() -> LinkAddressRequest {
        LinkAddressRequest {
            institution: "GTB".to_string(),
            account_identifier: "0123456789".to_string(),
            account_name: "ADA OBI".to_string(),
            currency: "NGN".to_string(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn already_linked_user_is_redirected_without_seeing_the_form() {
        let mut h = harness(
            LookupBehavior::Linked,
            LinkBehavior::Succeed,
            ready_session(),
            Some("token"),
        );

        h.workflow.refresh_eligibility().await;

        assert_eq!(
            *h.workflow.state(),
            WorkflowState::Redirecting {
                target: "/ada.base.eth".to_string()
            }
        );
        assert_eq!(h.navigator.0.lock().unwrap().as_slice(), ["/ada.base.eth"]);
        let notices = h.notifier.0.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn unresolved_identity_short_circuits_before_any_lookup() {
        let snapshot = SessionSnapshot {
            identity: None,
            ..ready_session()
        };
        let mut h = harness(
            LookupBehavior::Linked,
            LinkBehavior::Succeed,
            snapshot,
            Some("token"),
        );

        h.workflow.refresh_eligibility().await;

        assert_eq!(*h.workflow.state(), WorkflowState::CheckingEligibility);
        assert_eq!(h.api.lookup_calls.load(Ordering::SeqCst), 0);
        assert!(h.navigator.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unauthenticated_user_is_redirected_without_a_lookup() {
        let snapshot = SessionSnapshot {
            authenticated: false,
            ..ready_session()
        };
        let mut h = harness(
            LookupBehavior::NotLinked,
            LinkBehavior::Succeed,
            snapshot,
            Some("token"),
        );

        h.workflow.refresh_eligibility().await;

        assert!(matches!(
            h.workflow.state(),
            WorkflowState::Redirecting { .. }
        ));
        assert_eq!(h.api.lookup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn eligible_user_reaches_the_editable_form() {
        let mut h = harness(
            LookupBehavior::NotLinked,
            LinkBehavior::Succeed,
            ready_session(),
            Some("token"),
        );

        h.workflow.refresh_eligibility().await;

        assert_eq!(*h.workflow.state(), WorkflowState::Editable);
        assert!(h.navigator.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_lookup_stays_in_checking_state_instead_of_guessing() {
        let mut h = harness(
            LookupBehavior::Fail,
            LinkBehavior::Succeed,
            ready_session(),
            Some("token"),
        );

        h.workflow.refresh_eligibility().await;

        assert_eq!(*h.workflow.state(), WorkflowState::CheckingEligibility);
        assert!(h.navigator.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_eligibility_results_are_discarded() {
        let mut h = harness(
            LookupBehavior::NotLinked,
            LinkBehavior::Succeed,
            ready_session(),
            Some("token"),
        );
        let snapshot = ready_session();

        let stale = h.workflow.begin_eligibility_check();
        let fresh = h.workflow.begin_eligibility_check();

        // Fresh result lands first and wins; the slow stale one must not
        // overwrite it, even though it reports "already linked".
        h.workflow
            .apply_eligibility(fresh, &snapshot, &LinkedAddressLookup::NotLinked);
        assert_eq!(*h.workflow.state(), WorkflowState::Editable);

        h.workflow.apply_eligibility(
            stale,
            &snapshot,
            &LinkedAddressLookup::Linked(FakeApi::linked_record()),
        );
        assert_eq!(*h.workflow.state(), WorkflowState::Editable);
        assert!(h.navigator.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_without_a_token_never_reaches_the_network() {
        let mut h = harness(
            LookupBehavior::NotLinked,
            LinkBehavior::Succeed,
            ready_session(),
            None,
        );
        h.workflow.refresh_eligibility().await;

        h.workflow.submit(&form()).await;

        assert_eq!(*h.workflow.state(), WorkflowState::Editable);
        assert_eq!(h.api.link_calls.load(Ordering::SeqCst), 0);
        let notices = h.notifier.0.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn successful_submit_redirects_exactly_once() {
        let mut h = harness(
            LookupBehavior::NotLinked,
            LinkBehavior::Succeed,
            ready_session(),
            Some("token"),
        );
        h.workflow.refresh_eligibility().await;

        let payload = form();
        h.workflow.submit(&payload).await;
        h.workflow.submit(&payload).await;

        assert_eq!(
            *h.workflow.state(),
            WorkflowState::Redirecting {
                target: "/ada.base.eth".to_string()
            }
        );
        assert_eq!(h.api.link_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.navigator.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_submit_is_recoverable_and_keeps_the_form() {
        let mut h = harness(
            LookupBehavior::NotLinked,
            LinkBehavior::Fail,
            ready_session(),
            Some("token"),
        );
        h.workflow.refresh_eligibility().await;

        let payload = form();
        h.workflow.submit(&payload).await;

        assert_eq!(*h.workflow.state(), WorkflowState::EditableWithError);
        // The form was only borrowed; the caller still holds its values.
        assert_eq!(payload, form());
        let notices = h.notifier.0.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        drop(notices);

        h.workflow.acknowledge_error();
        assert_eq!(*h.workflow.state(), WorkflowState::Editable);
        assert!(h.navigator.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_is_ignored_while_still_checking_eligibility() {
        let mut h = harness(
            LookupBehavior::NotLinked,
            LinkBehavior::Succeed,
            ready_session(),
            Some("token"),
        );

        h.workflow.submit(&form()).await;

        assert_eq!(*h.workflow.state(), WorkflowState::CheckingEligibility);
        assert_eq!(h.api.link_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn late_eligibility_result_cannot_undo_a_redirect() {
        let mut h = harness(
            LookupBehavior::NotLinked,
            LinkBehavior::Succeed,
            ready_session(),
            Some("token"),
        );
        h.workflow.refresh_eligibility().await;
        let ticket = h.workflow.begin_eligibility_check();
        h.workflow.submit(&form()).await;
        assert!(matches!(
            h.workflow.state(),
            WorkflowState::Redirecting { .. }
        ));

        h.workflow
            .apply_eligibility(ticket, &ready_session(), &LinkedAddressLookup::NotLinked);

        assert!(matches!(
            h.workflow.state(),
            WorkflowState::Redirecting { .. }
        ));
    }
}
