use std::sync::Arc;

use super::common::*;
use crate::workflows::hiring::catalog::{Stage, SubStage};
use crate::workflows::hiring::config::PipelineConfig;
use crate::workflows::hiring::domain::ApplicationId;
use crate::workflows::hiring::error::{PipelineError, ValidationError};
use crate::workflows::hiring::repository::Collaborators;
use crate::workflows::hiring::transition::{plan_stage_move, StageTransitionEngine};

#[test]
fn forward_moves_succeed_and_backward_moves_fail() {
    let harness = harness();
    let job = post_job(&harness, 2, compact_pipeline());
    let application = apply(&harness, &job, "Ada");
    place(&harness, &application, Stage::Interview, Some(SubStage::Scheduled));

    match harness
        .service
        .move_stage(&application.id, Stage::Shortlisted, None, &recruiter())
    {
        Err(PipelineError::Validation(ValidationError::BackwardMove { from, to })) => {
            assert_eq!(from, Stage::Interview);
            assert_eq!(to, Stage::Shortlisted);
        }
        other => panic!("expected backward move rejection, got {other:?}"),
    }

    let moved = harness
        .service
        .move_stage(&application.id, Stage::Offer, None, &recruiter())
        .expect("forward move succeeds");
    assert_eq!(moved.stage, Stage::Offer);
    assert_eq!(moved.sub_stage, Some(SubStage::NotSent));
}

#[test]
fn staying_in_the_current_stage_is_allowed() {
    let harness = harness();
    let job = post_job(&harness, 1, compact_pipeline());
    let application = apply(&harness, &job, "Grace");

    let moved = harness
        .service
        .move_stage(
            &application.id,
            Stage::InReview,
            Some(SubStage::Reviewed),
            &recruiter(),
        )
        .expect("same-stage move succeeds");
    assert_eq!(moved.sub_stage, Some(SubStage::Reviewed));
}

#[test]
fn disabled_stage_is_rejected() {
    let harness = harness();
    let job = post_job(&harness, 1, compact_pipeline());
    let application = apply(&harness, &job, "Linus");

    let err = harness
        .service
        .move_stage(&application.id, Stage::TechnicalTask, None, &recruiter())
        .expect_err("technical task not enabled");
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::StageNotEnabled {
            stage: Stage::TechnicalTask
        })
    ));
    assert_eq!(stored(&harness, &application).stage, Stage::InReview);
}

#[test]
fn sub_stage_checks_catalog_before_job_configuration() {
    let harness = harness();
    let job = post_job(&harness, 1, compact_pipeline());
    let application = apply(&harness, &job, "Barbara");

    let foreign = harness
        .service
        .move_stage(
            &application.id,
            Stage::Offer,
            Some(SubStage::Scheduled),
            &recruiter(),
        )
        .expect_err("interview sub-stage under offer");
    assert!(matches!(
        foreign,
        PipelineError::Validation(ValidationError::SubStageNotInCatalog { .. })
    ));

    let excluded = harness
        .service
        .move_stage(
            &application.id,
            Stage::Offer,
            Some(SubStage::OfferAccepted),
            &recruiter(),
        )
        .expect_err("offer accepted excluded by job");
    assert!(matches!(
        excluded,
        PipelineError::Validation(ValidationError::SubStageNotAllowed { .. })
    ));
}

#[test]
fn recovery_path_allows_moves_from_a_stage_no_longer_enabled() {
    let harness = harness();
    let job = post_job(&harness, 1, compact_pipeline());
    let application = apply(&harness, &job, "Ken");
    place(
        &harness,
        &application,
        Stage::Compensation,
        Some(SubStage::Negotiating),
    );

    let moved = harness
        .service
        .move_stage(&application.id, Stage::InReview, None, &recruiter())
        .expect("recovery move succeeds");
    assert_eq!(moved.stage, Stage::InReview);
}

#[test]
fn omitted_sub_stage_falls_back_to_first_configured_entry() {
    let mut config = std::collections::BTreeMap::new();
    config.insert(Stage::Offer, vec![SubStage::OfferSent, SubStage::OfferDeclined]);
    let pipeline = PipelineConfig::new([Stage::InReview, Stage::Offer], config);

    let harness = harness();
    let job = post_job(&harness, 1, pipeline);
    let application = apply(&harness, &job, "Margaret");

    let moved = harness
        .service
        .move_stage(&application.id, Stage::Offer, None, &recruiter())
        .expect("move succeeds");
    assert_eq!(moved.sub_stage, Some(SubStage::OfferSent));
}

#[test]
fn hired_is_terminal_for_move_stage() {
    let harness = harness();
    let job = post_job(&harness, 3, PipelineConfig::standard());
    let application = apply(&harness, &job, "Edsger");
    harness
        .service
        .mark_hired(&application.id, &recruiter())
        .expect("hire succeeds");

    for stage in Stage::ordered() {
        let result = harness
            .service
            .move_stage(&application.id, stage, None, &recruiter());
        assert!(
            matches!(
                result,
                Err(PipelineError::Validation(ValidationError::AlreadyHired))
            ),
            "move to {stage} should fail after hire"
        );
    }
}

#[test]
fn hired_target_is_reserved_for_the_vacancy_lifecycle() {
    let harness = harness();
    let job = post_job(&harness, 1, PipelineConfig::standard());
    let application = apply(&harness, &job, "Alan");

    let err = harness
        .service
        .move_stage(&application.id, Stage::Hired, None, &recruiter())
        .expect_err("hire via move rejected");
    assert!(matches!(
        err,
        PipelineError::Validation(ValidationError::HireRequiresLifecycle)
    ));
    assert_eq!(harness.jobs.get(&job.id).filled_vacancies, 0);
}

#[test]
fn missing_application_and_foreign_company_are_rejected() {
    let harness = harness();
    let job = post_job(&harness, 1, compact_pipeline());
    let application = apply(&harness, &job, "Radia");

    let missing = harness
        .service
        .move_stage(
            &ApplicationId("app-missing".to_string()),
            Stage::Offer,
            None,
            &recruiter(),
        )
        .expect_err("missing application");
    assert!(matches!(missing, PipelineError::NotFound { entity: "application", .. }));

    let foreign = harness
        .service
        .move_stage(&application.id, Stage::Offer, None, &outsider())
        .expect_err("foreign company");
    assert!(matches!(foreign, PipelineError::Authorization { .. }));
}

#[test]
fn moves_are_logged_with_previous_and_next_positions() {
    let harness = harness();
    let job = post_job(&harness, 1, compact_pipeline());
    let application = apply(&harness, &job, "Frances");

    harness
        .service
        .move_stage(
            &application.id,
            Stage::Interview,
            Some(SubStage::Scheduled),
            &recruiter(),
        )
        .expect("move succeeds");

    let entries = harness.activity.stage_changes();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.previous_stage, Stage::InReview);
    assert_eq!(entry.previous_sub_stage, Some(SubStage::PendingReview));
    assert_eq!(entry.next_stage, Stage::Interview);
    assert_eq!(entry.next_sub_stage, Some(SubStage::Scheduled));
    assert_eq!(entry.actor, recruiter());

    let events = harness.notifications.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].stage, Stage::Interview);
}

#[test]
fn side_effect_failures_do_not_undo_the_move() {
    let harness = harness();
    let job = post_job(&harness, 1, compact_pipeline());
    let application = apply(&harness, &job, "Donald");

    let collaborators = Collaborators {
        activity: Arc::new(OfflineActivity),
        notifications: Arc::new(OfflineNotifications),
        ..harness.collaborators.clone()
    };
    let engine = StageTransitionEngine::new(collaborators);

    let moved = engine
        .move_stage(&application.id, Stage::Shortlisted, None, &recruiter())
        .expect("move survives side-effect failures");
    assert_eq!(moved.stage, Stage::Shortlisted);
    assert_eq!(stored(&harness, &application).stage, Stage::Shortlisted);
}

#[test]
fn plan_reports_the_first_broken_rule() {
    let harness = harness();
    let job = post_job(&harness, 1, compact_pipeline());
    let application = place(
        &harness,
        &apply(&harness, &job, "Hedy"),
        Stage::Interview,
        Some(SubStage::NotScheduled),
    );

    let err = plan_stage_move(
        &job.pipeline,
        &application,
        Stage::InReview,
        Some(SubStage::OfferSent),
    )
    .expect_err("backward and foreign");
    assert!(matches!(err, ValidationError::BackwardMove { .. }));
}
