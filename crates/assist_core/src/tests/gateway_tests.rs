use super::*;

use shared::domain::ProfileRole;

use crate::{
    sequence::SequenceToken,
    test_support::{
        gateway_with, keyed_settings, sample_catalog, text_reply, transport_reply, ScriptedModel,
    },
};

fn ids(raw: &[&str]) -> Vec<CreatorId> {
    raw.iter().map(|id| CreatorId::new(*id)).collect()
}

fn match_request(query: &str) -> GenerationRequest {
    GenerationRequest::new(
        GenerationPayload::SemanticMatch {
            query: query.to_string(),
            catalog: Arc::new(sample_catalog()),
        },
        SequenceToken(1),
    )
}

fn bio_request() -> GenerationRequest {
    GenerationRequest::new(
        GenerationPayload::BioDraft {
            role: ProfileRole::Creator,
            keywords: "fitness, vegan".to_string(),
            tone: "professional".to_string(),
        },
        SequenceToken(1),
    )
}

fn reply_request() -> GenerationRequest {
    GenerationRequest::new(
        GenerationPayload::ReplySuggestion {
            viewer_role: ProfileRole::Brand,
            last_message: "Could you send over the brief?".to_string(),
        },
        SequenceToken(3),
    )
}

#[tokio::test]
async fn missing_credential_fails_fast_without_a_model_call() {
    let model = ScriptedModel::with_replies([text_reply("unused")]);
    let gateway = gateway_with(model.clone(), &Settings::default());

    for request in [bio_request(), match_request("fashion"), reply_request()] {
        assert_eq!(
            gateway.generate(&request).await,
            GenerationResult::Failed(GenerationFailure::NoCredential)
        );
    }
    assert!(!gateway.has_credential());
    assert_eq!(model.calls().await, 0);
}

#[tokio::test]
async fn bio_text_is_trimmed_and_unquoted() {
    let model = ScriptedModel::with_replies([text_reply("  \"Plant-based chef sharing recipes.\"\n")]);
    let gateway = gateway_with(model.clone(), &keyed_settings());

    assert_eq!(
        gateway.generate(&bio_request()).await,
        GenerationResult::text("Plant-based chef sharing recipes.")
    );
    let prompts = model.prompts().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].text.contains("fitness, vegan"));
}

#[tokio::test]
async fn bio_text_is_capped_at_configured_length() {
    let model = ScriptedModel::with_replies([text_reply(&"é".repeat(40))]);
    let settings = Settings {
        bio_max_chars: 10,
        ..keyed_settings()
    };
    let gateway = gateway_with(model, &settings);

    let text = gateway
        .generate(&bio_request())
        .await
        .into_text()
        .expect("text result");
    assert_eq!(text.chars().count(), 10);
}

#[tokio::test]
async fn blank_or_missing_text_is_empty() {
    let model = ScriptedModel::with_replies([text_reply("   \n"), Ok(None)]);
    let gateway = gateway_with(model, &keyed_settings());

    assert_eq!(gateway.generate(&reply_request()).await, GenerationResult::Empty);
    assert_eq!(gateway.generate(&reply_request()).await, GenerationResult::Empty);
}

#[tokio::test]
async fn transport_errors_are_translated() {
    let model = ScriptedModel::with_replies([transport_reply("connection refused")]);
    let gateway = gateway_with(model, &keyed_settings());

    let result = gateway.generate(&reply_request()).await;
    match result {
        GenerationResult::Failed(GenerationFailure::Transport(message)) => {
            assert!(message.contains("connection refused"), "{message}")
        }
        other => panic!("expected transport failure, got {other:?}"),
    }
}

#[tokio::test]
async fn envelope_errors_are_malformed_responses() {
    let model =
        ScriptedModel::with_replies([Err(RemoteModelError::Envelope("missing field".into()))]);
    let gateway = gateway_with(model, &keyed_settings());

    assert!(matches!(
        gateway.generate(&bio_request()).await,
        GenerationResult::Failed(GenerationFailure::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn hallucinated_match_ids_are_dropped_and_order_kept() {
    let model =
        ScriptedModel::with_replies([text_reply(r#"{"matchIds":["inf_1","inf_9","inf_3"]}"#)]);
    let gateway = gateway_with(model.clone(), &keyed_settings());

    assert_eq!(
        gateway.generate(&match_request("eco food")).await,
        GenerationResult::match_ids(ids(&["inf_1", "inf_3"]))
    );
    let prompts = model.prompts().await;
    assert!(prompts[0].response_schema.is_some());
}

#[tokio::test]
async fn not_json_match_response_is_malformed() {
    let model = ScriptedModel::with_replies([text_reply("not-json")]);
    let gateway = gateway_with(model, &keyed_settings());

    assert!(matches!(
        gateway.generate(&match_request("fashion")).await,
        GenerationResult::Failed(GenerationFailure::MalformedResponse(_))
    ));
}

#[test]
fn match_ids_must_be_an_object_with_a_string_list() {
    let catalog = sample_catalog();
    for raw in [
        r#"["inf_1"]"#,
        r#"{"ids":["inf_1"]}"#,
        r#"{"matchIds":"inf_1"}"#,
        r#"{"matchIds":[1,2]}"#,
    ] {
        assert!(
            matches!(
                normalize_match_ids(raw, &catalog),
                GenerationResult::Failed(GenerationFailure::MalformedResponse(_))
            ),
            "{raw} should be malformed"
        );
    }
}

#[test]
fn extra_keys_beside_match_ids_are_ignored() {
    let catalog = sample_catalog();
    assert_eq!(
        normalize_match_ids(
            r#"{"matchIds":["inf_1","inf_9","inf_3"],"reasoning":"eco"}"#,
            &catalog
        ),
        GenerationResult::match_ids(ids(&["inf_1", "inf_3"]))
    );
}

#[test]
fn empty_or_fully_unknown_match_lists_are_empty() {
    let catalog = sample_catalog();
    assert_eq!(
        normalize_match_ids(r#"{"matchIds":[]}"#, &catalog),
        GenerationResult::Empty
    );
    assert_eq!(
        normalize_match_ids(r#"{"matchIds":["inf_7","ghost"]}"#, &catalog),
        GenerationResult::Empty
    );
    assert_eq!(normalize_match_ids("  ", &catalog), GenerationResult::Empty);
}

#[test]
fn repeated_match_ids_keep_first_occurrence() {
    let catalog = sample_catalog();
    assert_eq!(
        normalize_match_ids(r#"{"matchIds":["inf_4","inf_2","inf_4"]}"#, &catalog),
        GenerationResult::match_ids(ids(&["inf_4", "inf_2"]))
    );
}

#[test]
fn typographic_quotes_are_stripped() {
    assert_eq!(
        normalize_text("\u{201c}Sounds great, sending it now!\u{201d}", None),
        GenerationResult::text("Sounds great, sending it now!")
    );
    assert_eq!(
        normalize_text("\"unbalanced", None),
        GenerationResult::text("\"unbalanced")
    );
}
