use crate::infra::in_memory_backends;
use clap::Args;
use talent_ats::config::AppConfig;
use talent_ats::error::AppError;
use talent_ats::workflows::hiring::{
    Actor, BulkMode, Candidate, HiringPipelineService, JobApplication, JobPosting, NewJob,
    PipelineBoard, Stage, SubStage,
};

const DEMO_CANDIDATES: [&str; 4] = ["Ada", "Grace", "Linus", "Margaret"];

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Headcount for the demo job; every seat is filled before the demo ends.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=3))]
    pub(crate) vacancies: u32,
    /// Validate bulk moves like single moves regardless of ATS_BULK_MODE.
    #[arg(long)]
    pub(crate) strict_bulk: bool,
    /// Print the pipeline board as JSON instead of a table.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        vacancies,
        strict_bulk,
        json,
    } = args;

    let mut settings = AppConfig::load()?.pipeline;
    if strict_bulk {
        settings.bulk_mode = BulkMode::Strict;
    }
    let backends = in_memory_backends(&settings);
    let service = HiringPipelineService::new(backends.collaborators, &settings);
    let recruiter = Actor::new("demo-recruiter", "demo-co");

    println!("Hiring pipeline demo ({:?} bulk moves)", settings.bulk_mode);
    let job = service.post_job(
        NewJob {
            title: "Backend Engineer".to_string(),
            total_vacancies: vacancies,
            pipeline: None,
        },
        &recruiter,
    )?;
    println!(
        "- Posted {} '{}' with {} vacancies",
        job.id, job.title, job.total_vacancies
    );

    let mut applications = Vec::with_capacity(DEMO_CANDIDATES.len());
    for name in DEMO_CANDIDATES {
        let application = service.submit_application(
            &job.id,
            Candidate {
                name: name.to_string(),
                email: format!("{}@candidates.example", name.to_ascii_lowercase()),
            },
        )?;
        println!("- {} applied -> {}", name, application.id);
        applications.push(application);
    }

    let ids: Vec<_> = applications.iter().map(|app| app.id.clone()).collect();
    let report = service.bulk_move(&ids, Stage::Shortlisted, &recruiter);
    println!(
        "\nBulk shortlist: {} updated, {} failed",
        report.updated, report.failed
    );

    for application in applications.iter().take(vacancies as usize + 1) {
        service.move_stage(&application.id, Stage::Interview, None, &recruiter)?;
        let scheduled =
            service.update_sub_stage(&application.id, SubStage::Scheduled, &recruiter)?;
        print_position("Interview booked", &scheduled);
    }

    match service.move_stage(&applications[0].id, Stage::InReview, None, &recruiter) {
        Ok(_) => println!("  Unexpected: backward move accepted"),
        Err(err) => println!("  Backward move refused: {err}"),
    }

    print_board(&service.pipeline_board(&job.id, &recruiter)?, json);

    println!("\nHiring");
    let mut closed_job: Option<JobPosting> = None;
    for application in applications.iter().take(vacancies as usize) {
        service.move_stage(&application.id, Stage::Offer, Some(SubStage::OfferSent), &recruiter)?;
        let outcome = service.mark_hired(&application.id, &recruiter)?;
        println!(
            "- Hired {} ({} of {} seats filled)",
            application.candidate.name, outcome.job.filled_vacancies, outcome.job.total_vacancies
        );
        if outcome.auto_closed {
            if let Some(rejections) = outcome.rejections {
                println!(
                    "  Job auto-closed; rejection mail sent to {} candidate(s), {} failed",
                    rejections.sent, rejections.failed
                );
            }
            closed_job = Some(outcome.job);
        }
    }

    let outbox = backends.mailer.outbox();
    if outbox.is_empty() {
        println!("  Outbox: empty");
    } else {
        println!("  Outbox:");
        for mail in outbox {
            println!("    - {} -> {} ({})", mail.from, mail.to, mail.subject);
        }
    }

    if let Some(job) = closed_job {
        let reopened = service.reopen_job(&job.id, 1, &recruiter)?;
        println!(
            "\nReopened {} with {} open vacancy",
            reopened.id,
            reopened.open_vacancies()
        );
    }

    println!(
        "\nActivity log recorded {} stage change(s)",
        backends.activity.stage_changes().len()
    );
    print_board(&service.pipeline_board(&job.id, &recruiter)?, json);

    Ok(())
}

fn print_position(label: &str, application: &JobApplication) {
    let sub_stage = application
        .sub_stage
        .map(|sub_stage| sub_stage.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {label}: {} at {} / {}",
        application.candidate.name, application.stage, sub_stage
    );
}

fn print_board(board: &PipelineBoard, json: bool) {
    if json {
        match serde_json::to_string_pretty(board) {
            Ok(payload) => println!("\n{payload}"),
            Err(err) => println!("\nBoard payload unavailable: {err}"),
        }
        return;
    }

    println!(
        "\nBoard for {} ({}, {} open)",
        board.job_id, board.status, board.open_vacancies
    );
    for column in &board.columns {
        println!("  {:<24} {}", column.label, column.count);
    }
}
