//! Console walkthrough of the hiring funnel: seeds an application, drives it
//! stage by stage through the workflow engine, and prints the scheduling and
//! notification activity each transition produced.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;

use hireflow::config::WorkflowConfig;
use hireflow::error::AppError;
use hireflow::workflows::hiring::{
    ApplicationId, EventStore, HiringWorkflowEngine, StageOutcome, WorkflowError, WorkflowStage,
};

use crate::infra::{
    seed_sample_data, InMemoryApplicationStore, InMemoryEventStore, InMemoryInterviewStore,
    InMemoryOfferStore, InMemoryPipelineStore, InMemoryTestStore, LoggingNotifier,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Run every transition as of this date (YYYY-MM-DD) instead of today.
    /// Weekdays give the interview scheduler business-hour slots to pick.
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Stop the walkthrough after the offer stage instead of hiring.
    #[arg(long)]
    pub(crate) stop_at_offer: bool,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = match args.as_of {
        Some(date) => date
            .and_hms_opt(8, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or_else(Utc::now),
        None => Utc::now(),
    };

    let applications = Arc::new(InMemoryApplicationStore::default());
    let tests = Arc::new(InMemoryTestStore::default());
    seed_sample_data(&applications, &tests);
    let events = Arc::new(InMemoryEventStore::default());
    let notifier = Arc::new(LoggingNotifier::default());

    let engine = HiringWorkflowEngine::new(
        Arc::new(InMemoryPipelineStore::default()),
        applications,
        events.clone(),
        tests,
        Arc::new(InMemoryInterviewStore::default()),
        Arc::new(InMemoryOfferStore::default()),
        notifier.clone(),
        WorkflowConfig::default(),
    );

    let application_id = ApplicationId("app-1001".to_string());

    println!("Hiring funnel walkthrough (as of {})", now.format("%Y-%m-%d %H:%M UTC"));
    println!("\n== Initiate ==");
    let outcome = engine.initiate_at(&application_id, now)?;
    render_outcome(&outcome, now);

    let mut stages = vec![
        WorkflowStage::Screening,
        WorkflowStage::Test,
        WorkflowStage::Interview,
        WorkflowStage::Offer,
    ];
    if !args.stop_at_offer {
        stages.push(WorkflowStage::Hired);
    }

    for stage in stages {
        println!("\n== Advance to {} ==", stage.label());
        let outcome = engine.advance_at(&application_id, stage, None, true, now)?;
        render_outcome(&outcome, now);
    }

    println!("\n== Scheduled events ==");
    for event in events.scheduled(None).map_err(WorkflowError::from)? {
        println!(
            "  {} | {} | {}",
            event.scheduled_at.format("%Y-%m-%d %H:%M"),
            event.title,
            event.description
        );
    }

    println!("\n== Notifications ==");
    for notification in notifier.sent() {
        println!("  {} -> {}", notification.email, notification.subject);
    }

    let overview = engine.overview(None)?;
    println!(
        "\nFunnel: {} candidate(s) tracked, current stages: {:?}",
        overview.total_candidates, overview.by_stage
    );

    Ok(())
}

fn render_outcome(outcome: &StageOutcome, now: DateTime<Utc>) {
    println!("  stage: {}", outcome.pipeline.current_stage.label());
    if let Some(record) = outcome.pipeline.stage_history.last() {
        println!("  note:  {}", record.notes);
    }
    if let Some(event) = &outcome.scheduled {
        let lead = event.scheduled_at - now;
        println!(
            "  auto-scheduled: {} at {} (+{}h)",
            event.title,
            event.scheduled_at.format("%Y-%m-%d %H:%M"),
            lead.num_hours()
        );
    }
    for failure in &outcome.side_effects {
        println!("  side effect failed: {failure:?}");
    }
}
