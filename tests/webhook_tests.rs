mod common;

use axum::http::{StatusCode, header};
use tower::util::ServiceExt;

use common::{app, body_string, form_post, test_state};
use voxcall::core::calls::CallStatus;

#[tokio::test]
async fn test_incoming_call_returns_consent_document() {
    let state = test_state();

    let response = app(state.clone())
        .oneshot(form_post(
            "/webhook",
            "CallSid=CA100&From=%2B5215550001&To=%2B15550002",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/xml");

    let xml = body_string(response).await;
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>"));
    assert!(xml.contains(
        "<Say language=\"es-MX\">Esta llamada puede grabarse para calidad. ¿Deseas continuar?</Say>"
    ));
    assert!(xml.contains("action=\"/consent-response\""));
    assert!(xml.contains("<Say language=\"es-MX\">Por favor responde sí o no.</Say></Gather>"));

    // Registry, monitor and conversation all know the call
    let core = &state.core_state;
    let session = core.registry.get_call_info("CA100").unwrap();
    assert_eq!(session.status, CallStatus::Active);
    assert_eq!(session.phone_number, "+5215550001");
    assert!(core.monitor.call_summary("CA100").is_some());
    assert!(core.conversations.get("CA100").is_some());
}

#[tokio::test]
async fn test_incoming_call_without_call_sid_fails() {
    let response = app(test_state())
        .oneshot(form_post("/webhook", "From=%2B15550001"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "Error");
}

#[tokio::test]
async fn test_consent_given_returns_greeting() {
    let state = test_state();
    let router = app(state.clone());

    router
        .clone()
        .oneshot(form_post("/webhook", "CallSid=CA200&From=%2B15550001&To=%2B15550002"))
        .await
        .unwrap();

    let response = router
        .oneshot(form_post(
            "/consent-response",
            "CallSid=CA200&SpeechResult=s%C3%AD%2C+claro",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let xml = body_string(response).await;
    assert!(xml.contains(
        "<Say language=\"es-MX\">Hola, soy tu agente AI para LATAM. ¿En qué puedo ayudarte?</Say>"
    ));
    assert!(xml.contains("<Connect><Stream url=\"wss://agent.test/voice-stream\" /></Connect>"));
    assert!(!xml.contains("<Hangup"));
    assert_eq!(state.core_state.registry.active_call_count(), 1);
}

#[tokio::test]
async fn test_consent_declined_says_goodbye_and_hangs_up() {
    let state = test_state();
    let router = app(state.clone());

    router
        .clone()
        .oneshot(form_post("/webhook", "CallSid=CA300&From=%2B15550001&To=%2B15550002"))
        .await
        .unwrap();

    let response = router
        .oneshot(form_post(
            "/consent-response",
            "CallSid=CA300&SpeechResult=no+gracias",
        ))
        .await
        .unwrap();

    let xml = body_string(response).await;
    assert!(xml.contains("Entendido. Llamada terminada."));
    assert!(xml.ends_with("<Hangup /></Response>"));

    let core = &state.core_state;
    assert_eq!(core.registry.active_call_count(), 0);
    let history = core.registry.recent_history(10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].end_reason.as_deref(), Some("consent_declined"));
}

#[tokio::test]
async fn test_consent_for_unknown_call_uses_primary_profile() {
    let response = app(test_state())
        .oneshot(form_post("/consent-response", "SpeechResult=YES"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let xml = body_string(response).await;
    assert!(xml.contains("<Say language=\"es-MX\">Hola, soy tu agente AI"));
}

#[tokio::test]
async fn test_voice_stream_placeholder() {
    let response = app(test_state())
        .oneshot(form_post("/voice-stream", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Voice stream endpoint");
}
