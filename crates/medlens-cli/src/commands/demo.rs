//! Scripted agents driven through the tracking adapters.

use anyhow::Result;
use async_trait::async_trait;
use medlens_core::CommunicationTracker;
use medlens_core::communication::{
    AgentFramework, FunctionCall, LlmProvider, MessageDraft, Role, ToolCall,
};
use medlens_core::tracker::{Completion, SessionStart};
use medlens_core::view::{CommunicationSummaryView, CommunicationView};
use medlens_interaction::{
    AgentIdentity, ChatMessage, LlmCall, LlmCallError, Reply, ReplyAgent, TrackedLlm,
    TrackedReplyAgent,
};
use medlens_telemetry::LifecycleEvent;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

const DEMO_PATIENT: &str = "patient-1001";

struct Cardiologist;

#[async_trait]
impl ReplyAgent for Cardiologist {
    fn model(&self) -> Option<&str> {
        Some("gpt-4")
    }

    fn system_message(&self) -> Option<&str> {
        Some("You are a cardiologist reviewing FHIR patient records.")
    }

    async fn generate_reply(&self, messages: &[ChatMessage]) -> Result<Reply, LlmCallError> {
        Ok(Reply {
            content: Some(format!(
                "Reviewed {} messages. Recommend ECG and lipid panel.",
                messages.len()
            )),
            function_call: None,
            tool_calls: Some(vec![ToolCall::function("search_observations")]),
        })
    }
}

struct Pharmacist;

#[async_trait]
impl ReplyAgent for Pharmacist {
    fn model(&self) -> Option<&str> {
        Some("gpt-4-turbo")
    }

    async fn generate_reply(&self, _messages: &[ChatMessage]) -> Result<Reply, LlmCallError> {
        Err(LlmCallError::api(Some(429), "Rate limit reached for gpt-4-turbo").with_retry_count(3))
    }
}

struct TriageLlm;

#[async_trait]
impl LlmCall for TriageLlm {
    fn model_name(&self) -> Option<&str> {
        Some("gpt-3.5-turbo")
    }

    async fn call(&self, prompt: &str) -> Result<String, LlmCallError> {
        Ok(format!("Priority 2 (urgent). Reason: {prompt}"))
    }
}

struct BillingLlm;

#[async_trait]
impl LlmCall for BillingLlm {
    async fn call(&self, _prompt: &str) -> Result<String, LlmCallError> {
        Err(LlmCallError::api(
            Some(429),
            "You exceeded your current quota, please check your plan and billing details. (insufficient_quota)",
        ))
    }
}

pub async fn run(
    tracker: Arc<CommunicationTracker>,
    events: Option<UnboundedReceiver<LifecycleEvent>>,
) -> Result<()> {
    println!("🩺 Running scripted agents...");

    let cardiologist = TrackedReplyAgent::new(
        Cardiologist,
        Arc::clone(&tracker),
        AgentIdentity::new("cardio-01", "Dr. Heart", "cardiology"),
    );
    let pharmacist = TrackedReplyAgent::new(
        Pharmacist,
        Arc::clone(&tracker),
        AgentIdentity::new("pharm-01", "PharmD Bot", "pharmacy"),
    );
    let triage = TrackedLlm::new(
        TriageLlm,
        Arc::clone(&tracker),
        AgentIdentity::new("triage-01", "Triage Nurse", "triage"),
    );
    let billing = TrackedLlm::new(
        BillingLlm,
        Arc::clone(&tracker),
        AgentIdentity::new("billing-01", "Billing Assistant", "billing"),
    );

    let conversation = [
        ChatMessage::new(Role::System, "Patient context loaded."),
        ChatMessage::user("58M with exertional chest pain and LDL 190."),
    ];
    cardiologist.generate_reply(&conversation).await?;

    if let Err(err) = pharmacist.generate_reply(&conversation).await {
        println!("  ⚠️  {} failed: {}", pharmacist.identity().agent_name, err);
    }

    triage.call("Shortness of breath, SpO2 91%").await?;

    if let Err(err) = billing.call("Estimate out-of-pocket cost for ECG").await {
        println!("  ⚠️  {} failed: {}", billing.identity().agent_name, err);
    }

    let chart_review = run_custom_session(&tracker);

    print_section("Statistics", &tracker.stats())?;
    print_section("Quota", &tracker.quota_exceeded_details())?;
    print_section("Health", &tracker.health())?;

    let recent: Vec<CommunicationSummaryView> = tracker
        .recent_communications(3)
        .iter()
        .map(CommunicationSummaryView::from)
        .collect();
    print_section("Recent", &recent)?;

    let patient: Vec<CommunicationView> = tracker
        .patient_communications(DEMO_PATIENT)
        .iter()
        .map(CommunicationView::from)
        .collect();
    print_section(&format!("Patient {}", DEMO_PATIENT), &patient)?;

    let pharmacy: Vec<CommunicationSummaryView> = tracker
        .agent_communications(&pharmacist.identity().agent_id)
        .iter()
        .map(CommunicationSummaryView::from)
        .collect();
    print_section("Pharmacy agent", &pharmacy)?;

    let review = tracker.communication(&chart_review)?;
    print_section("Chart review", &CommunicationView::from(&review))?;

    println!("\n== Export ==");
    println!("{}", tracker.export("json")?);

    tracker.shutdown_notifications().await;

    if let Some(mut receiver) = events {
        println!("\n== Lifecycle events ==");
        while let Ok(event) = receiver.try_recv() {
            println!(
                "  [{}] {} {}",
                event.level,
                event.message,
                event.communication_id.as_deref().unwrap_or("-")
            );
        }
    }

    println!("\n✅ Demo complete");
    Ok(())
}

/// A session recorded directly against the tracker, without an adapter.
fn run_custom_session(tracker: &CommunicationTracker) -> String {
    let comm_id = tracker.start(
        SessionStart::new(
            "fhir-01",
            "FHIR Summarizer",
            "records",
            AgentFramework::Custom,
            LlmProvider::OpenAi,
            "gpt-4",
        )
        .patient_id(DEMO_PATIENT)
        .patient_name("John Doe")
        .scenario_type("chart_review"),
    );
    tracker.add_message(&comm_id, MessageDraft::user("Summarize recent encounters.").tokens(120));
    tracker.add_message(
        &comm_id,
        MessageDraft::assistant("")
            .tokens(18)
            .function_call(FunctionCall::named("get_encounters").with_arguments(r#"{"limit":5}"#)),
    );
    tracker.add_message(
        &comm_id,
        MessageDraft::new(Role::Function, r#"[{"type":"ambulatory"}]"#).tokens(40),
    );
    tracker.add_message(
        &comm_id,
        MessageDraft::assistant("One ambulatory visit in the last month.").tokens(25),
    );
    tracker.complete(
        &comm_id,
        Completion::success("One ambulatory visit in the last month.", 850).with_confidence(0.92),
    );
    comm_id
}

fn print_section<T: Serialize + ?Sized>(title: &str, value: &T) -> Result<()> {
    println!("\n== {} ==", title);
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
