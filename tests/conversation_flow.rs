//! End-to-end conversation scenarios against in-process adapters.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;

use flightdesk::adapters::ai::MockLanguageModel;
use flightdesk::adapters::flights::CannedFlightProvider;
use flightdesk::adapters::locations::StaticLocationResolver;
use flightdesk::adapters::memory::InMemorySessionStore;
use flightdesk::adapters::outbound::RecordingMessageSender;
use flightdesk::application::{ConversationService, ExecutorOutcome, ResultCache, SearchExecutor};
use flightdesk::config::DialogConfig;
use flightdesk::domain::dialog::{DialogPhase, DialogState, Slot, TripType};
use flightdesk::domain::extract::{Extractor, CONFIDENCE_LLM, CONFIDENCE_LLM_DATE};
use flightdesk::domain::foundation::SessionKey;
use flightdesk::domain::search::ProviderError;
use flightdesk::ports::{LanguageModel, MessageSender, SessionStore};

const TODAY: &str = "2025-06-02";

fn today() -> NaiveDate {
    TODAY.parse().unwrap()
}

struct Harness {
    service: ConversationService,
    provider: Arc<CannedFlightProvider>,
    store: Arc<InMemorySessionStore>,
    session: SessionKey,
}

impl Harness {
    fn new() -> Self {
        Self::with_model(None)
    }

    fn with_model(model: Option<Arc<dyn LanguageModel>>) -> Self {
        let provider = Arc::new(CannedFlightProvider::new());
        let store = Arc::new(InMemorySessionStore::new());
        let executor = SearchExecutor::new(
            Arc::new(StaticLocationResolver::new()),
            provider.clone(),
            Arc::new(ResultCache::new(Duration::from_secs(3600))),
            Duration::from_secs(5),
            Duration::from_millis(1),
        );
        let service = ConversationService::new(
            Extractor::new(model),
            executor,
            store.clone(),
            &DialogConfig::default(),
        )
        .with_today(today());
        Self {
            service,
            provider,
            store,
            session: SessionKey::new("test-session"),
        }
    }

    async fn say(&self, text: &str) -> String {
        self.service
            .handle_turn(&self.session, text)
            .await
            .expect("turn should not fail")
    }

    async fn state(&self) -> DialogState {
        self.store
            .get(&self.session)
            .await
            .expect("store read")
            .expect("session exists")
    }
}

#[tokio::test]
async fn multi_turn_happy_path_reaches_results() {
    let h = Harness::new();

    let reply = h.say("hi").await;
    assert!(reply.contains("flights"));
    assert!(h.state().await.pending_question.is_none());

    let reply = h.say("I want to fly from New York to London").await;
    assert!(reply.to_lowercase().contains("date"));

    let reply = h.say("on December 15").await;
    assert!(reply.to_lowercase().contains("one way"));

    let reply = h.say("one way").await;
    assert!(reply.contains("Fastest:"));
    assert_eq!(h.provider.call_count(), 1);

    let state = h.state().await;
    assert_eq!(state.phase, DialogPhase::Presenting);
    assert_eq!(state.departure_date, Some("2025-12-15".parse().unwrap()));
    assert!(state.ready_for_api);
    assert!(!state.search_cached);
}

#[tokio::test]
async fn one_shot_request_searches_after_one_confirmation() {
    let h = Harness::new();

    let reply = h.say("NYC to London on 2025-12-15, 2 adults").await;
    assert!(reply.to_lowercase().contains("one way"));

    let reply = h.say("one way").await;
    assert!(reply.contains("NYC to LON"));
    assert_eq!(h.provider.call_count(), 1);

    let state = h.state().await;
    assert_eq!(state.passengers, Some(2));
    assert_eq!(state.origin.as_deref(), Some("NYC"));
    assert!(state.return_date.is_none());
}

#[tokio::test]
async fn identical_request_is_served_from_cache() {
    let h = Harness::new();
    h.say("NYC to London on 2025-12-15, 2 adults").await;
    h.say("one way").await;
    assert_eq!(h.provider.call_count(), 1);

    let reply = h.say("search again").await;
    assert!(reply.contains("a few minutes ago"));
    assert_eq!(h.provider.call_count(), 1);
    assert!(h.state().await.search_cached);
}

#[tokio::test]
async fn bare_city_is_ignored_after_a_greeting() {
    let h = Harness::new();
    h.say("hello").await;
    h.say("Paris").await;

    let state = h.state().await;
    assert!(state.origin.is_none());
    assert!(state.destination.is_none());
}

#[tokio::test]
async fn bare_city_answers_the_pending_origin_question() {
    let h = Harness::new();
    let reply = h.say("I'm flying to London").await;
    assert!(reply.to_lowercase().contains("flying from"));

    h.say("Paris").await;
    let state = h.state().await;
    assert_eq!(state.origin.as_deref(), Some("PARIS"));
    assert_eq!(state.destination.as_deref(), Some("LONDON"));
}

#[tokio::test]
async fn correction_overwrites_the_destination_mid_flow() {
    let h = Harness::new();
    h.say("from NYC to London on December 15").await;
    h.say("actually, to Paris instead").await;

    let state = h.state().await;
    assert_eq!(state.destination.as_deref(), Some("PARIS"));
    assert_eq!(state.origin.as_deref(), Some("NYC"));
    assert_eq!(state.clarification_attempts, 0);
}

#[tokio::test]
async fn round_trip_without_return_fails_validation_then_recovers() {
    let h = Harness::new();
    let reply = h.say("from NYC to London on December 15, round trip").await;
    assert!(reply.contains("return date"));
    // One problem per reply, never a bulleted list.
    assert!(!reply.contains("\n- "));
    assert_eq!(h.provider.call_count(), 0);

    let reply = h.say("returning December 22").await;
    assert!(reply.contains("Fastest:"));
    let state = h.state().await;
    assert_eq!(state.return_date, Some("2025-12-22".parse().unwrap()));
    assert_eq!(state.trip_type, TripType::RoundTrip);
}

#[tokio::test]
async fn unresolved_turns_end_the_conversation_at_the_cap() {
    let h = Harness::new();
    h.say("fly from Boston to Miami").await;

    h.say("asdf qwerty zxcv").await;
    h.say("qwerty zxcv asdf").await;
    let reply = h.say("zxcv asdf qwerty").await;
    assert!(reply.contains("start over"));
    assert_eq!(h.state().await.phase, DialogPhase::Done);

    let reply = h.say("what about tuesday?").await;
    assert!(reply.contains("ended"));

    let reply = h.say("start over").await;
    assert!(reply.contains("flights"));
    let state = h.state().await;
    assert_eq!(state.phase, DialogPhase::Collecting);
    assert!(state.is_empty());
    assert_eq!(state.clarification_attempts, 0);
}

#[tokio::test]
async fn provider_failure_apologizes_without_burning_attempts() {
    let h = Harness::new();
    h.provider.push_failure(ProviderError::Timeout);
    h.provider.push_failure(ProviderError::Timeout);

    let reply = h.say("NYC to London on 2025-12-15, one way").await;
    assert!(reply.contains("saved"));
    // One call plus the single transient retry.
    assert_eq!(h.provider.call_count(), 2);
    assert_eq!(h.state().await.clarification_attempts, 0);

    let reply = h.say("try again").await;
    assert!(reply.contains("Fastest:"));
    assert_eq!(h.provider.call_count(), 3);
}

#[tokio::test]
async fn non_transient_failure_is_not_retried() {
    let h = Harness::new();
    h.provider
        .push_failure(ProviderError::InvalidLocation("NYC".into()));

    let reply = h.say("NYC to London on 2025-12-15, one way").await;
    assert!(reply.contains("didn't accept"));
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn cancel_clears_captured_fields_but_keeps_the_transcript() {
    let h = Harness::new();
    h.say("from NYC to London on December 15").await;
    let reply = h.say("never mind").await;
    assert!(reply.contains("cleared"));

    let state = h.state().await;
    assert!(state.is_empty());
    assert!(state.conversation_history.len() >= 2);
}

#[tokio::test]
async fn one_way_flip_drops_the_captured_return_date() {
    let h = Harness::new();
    h.say("from NYC to London on December 15 returning December 22")
        .await;
    let state = h.state().await;
    assert_eq!(state.trip_type, TripType::RoundTrip);
    assert!(!state.trip_type_confirmed);

    h.say("actually make it one way").await;
    let state = h.state().await;
    assert_eq!(state.trip_type, TripType::OneWay);
    assert!(state.return_date.is_none());
}

#[tokio::test]
async fn yes_confirms_the_implied_round_trip() {
    let h = Harness::new();
    let reply = h
        .say("from NYC to London on December 15 returning December 22")
        .await;
    assert!(reply.to_lowercase().contains("round trip"));

    let reply = h.say("yes").await;
    assert!(reply.contains("Fastest:"));
    let state = h.state().await;
    assert_eq!(state.trip_type, TripType::RoundTrip);
    assert!(state.trip_type_confirmed);
}

#[tokio::test]
async fn ambiguous_location_asks_for_disambiguation() {
    let h = Harness::new();
    let reply = h.say("from San Jose to London on December 15, one way").await;
    assert!(reply.contains("SJC"));
    assert!(reply.contains("SJO"));
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn empty_results_reply_shows_the_searched_trip() {
    let h = Harness::new();
    h.provider.set_empty(true);
    let reply = h.say("NYC to London on 2025-12-15, one way").await;
    assert!(reply.contains("couldn't find any flights"));
    assert!(reply.contains("2025-12-15"));
}

fn authorized_one_way_state() -> DialogState {
    let mut state = DialogState::new();
    state.origin = Some("NYC".into());
    state.destination = Some("LONDON".into());
    state.departure_date = Some("2025-12-15".parse().unwrap());
    state.passengers = Some(1);
    state.trip_type = TripType::OneWay;
    state.trip_type_confirmed = true;
    state.ready_for_api = true;
    state
}

fn bare_executor(provider: Arc<CannedFlightProvider>, freshness: Duration) -> SearchExecutor {
    SearchExecutor::new(
        Arc::new(StaticLocationResolver::new()),
        provider,
        Arc::new(ResultCache::new(freshness)),
        Duration::from_secs(5),
        Duration::from_millis(1),
    )
}

#[tokio::test]
async fn cache_expires_outside_the_freshness_window() {
    let provider = Arc::new(CannedFlightProvider::new());
    let executor = bare_executor(provider.clone(), Duration::from_secs(60));
    let state = authorized_one_way_state();

    let t0 = Utc::now();
    assert!(matches!(
        executor.execute(&state, t0).await,
        ExecutorOutcome::Results { .. }
    ));
    // Within the window: served from cache, no provider call.
    match executor.execute(&state, t0 + chrono::Duration::seconds(30)).await {
        ExecutorOutcome::Results { results, .. } => assert!(results.cached),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(provider.call_count(), 1);
    // Past the window: a fresh provider call.
    match executor.execute(&state, t0 + chrono::Duration::seconds(61)).await {
        ExecutorOutcome::Results { results, .. } => assert!(!results.cached),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn empty_result_sets_are_not_cached() {
    let provider = Arc::new(CannedFlightProvider::new());
    provider.set_empty(true);
    let executor = bare_executor(provider.clone(), Duration::from_secs(3600));
    let state = authorized_one_way_state();

    let t0 = Utc::now();
    match executor.execute(&state, t0).await {
        ExecutorOutcome::Results { results, .. } => assert!(results.offers.is_empty()),
        other => panic!("unexpected outcome: {other:?}"),
    }
    // Inventory appears; the earlier empty answer must not mask it.
    provider.set_empty(false);
    match executor.execute(&state, t0 + chrono::Duration::seconds(1)).await {
        ExecutorOutcome::Results { results, .. } => {
            assert!(!results.cached);
            assert_eq!(results.offers.len(), 3);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn model_is_not_consulted_when_deterministic_passes_succeed() {
    let model = Arc::new(MockLanguageModel::new());
    let h = Harness::with_model(Some(model.clone()));

    // Pattern pass handles the structured opener.
    h.say("I'm flying to London").await;
    // Context fallback handles the bare city answering the origin question.
    h.say("Paris").await;

    assert_eq!(model.call_count(), 0);
    assert_eq!(h.state().await.origin.as_deref(), Some("PARIS"));
}

#[tokio::test]
async fn model_reply_fills_slots_at_probabilistic_confidence() {
    let model = Arc::new(MockLanguageModel::new());
    model.push_reply(r#"{"destination":"Tokyo","departure_date":"2025-12-15"}"#);
    let h = Harness::with_model(Some(model.clone()));

    h.say("thinking about visiting tokyo mid december").await;

    assert_eq!(model.call_count(), 1);
    let state = h.state().await;
    assert_eq!(state.destination.as_deref(), Some("TOKYO"));
    assert_eq!(state.departure_date, Some("2025-12-15".parse().unwrap()));
    assert_eq!(
        state.field_confidence.get(&Slot::Destination),
        Some(&CONFIDENCE_LLM)
    );
    assert_eq!(
        state.field_confidence.get(&Slot::DepartureDate),
        Some(&CONFIDENCE_LLM_DATE)
    );
}

#[tokio::test]
async fn model_prompt_carries_the_pending_question_as_context() {
    let model = Arc::new(MockLanguageModel::new());
    model.push_reply(r#"{"departure_date":"2025-12-20"}"#);
    let h = Harness::with_model(Some(model.clone()));

    h.say("from Boston to Miami").await;
    h.say("around the winter holidays I guess").await;

    let calls = model.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].user.contains("Assistant asked:"));
    assert!(calls[0].user.to_lowercase().contains("date"));
    assert_eq!(
        h.state().await.departure_date,
        Some("2025-12-20".parse().unwrap())
    );
}

#[tokio::test]
async fn replies_are_relayed_through_the_outbound_sender() {
    let h = Harness::new();
    let sender = RecordingMessageSender::new();

    let reply = h.say("hi").await;
    assert!(sender.send(h.session.as_str(), &reply).await);

    assert_eq!(sender.sent(), vec![("test-session".to_string(), reply)]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// No state the validator never authorized can reach the provider.
    #[test]
    fn executor_refuses_every_unauthorized_state(
        has_origin in any::<bool>(),
        has_destination in any::<bool>(),
        has_date in any::<bool>(),
        pax in 0u8..=4,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");

        let provider = Arc::new(CannedFlightProvider::new());
        let executor = SearchExecutor::new(
            Arc::new(StaticLocationResolver::new()),
            provider.clone(),
            Arc::new(ResultCache::new(Duration::from_secs(60))),
            Duration::from_secs(1),
            Duration::from_millis(1),
        );

        let mut state = DialogState::new();
        if has_origin { state.origin = Some("NYC".into()); }
        if has_destination { state.destination = Some("LONDON".into()); }
        if has_date { state.departure_date = Some("2025-12-15".parse().unwrap()); }
        if pax > 0 { state.passengers = Some(pax); }
        // ready_for_api deliberately left false.

        let outcome = runtime.block_on(executor.execute(&state, Utc::now()));
        prop_assert!(matches!(outcome, ExecutorOutcome::GateViolation));
        prop_assert_eq!(provider.call_count(), 0);
    }
}
