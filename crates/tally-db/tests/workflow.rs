//! Status workflow and tally, exercised through the public service API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pretty_assertions::assert_eq;
use tally_core::entities::ResultSubmission;
use tally_core::enums::EventStatus;
use tally_db::{DatabaseError, TallyService};

const TAB_HEAD: &str = "usr-tab";
const COMMITTEE: &str = "usr-com";

async fn service() -> TallyService {
    TallyService::new_local(":memory:").await.unwrap()
}

fn medal(team_id: &str, rank: u32, gold: u32, silver: u32, bronze: u32) -> ResultSubmission {
    ResultSubmission {
        team_id: team_id.into(),
        rank,
        gold_awarded: gold,
        silver_awarded: silver,
        bronze_awarded: bronze,
    }
}

#[tokio::test]
async fn results_count_only_after_publication() {
    let svc = service().await;
    let cat = svc.create_category(TAB_HEAD, "Music").await.unwrap();
    let a = svc.create_team(TAB_HEAD, "Arts", "CAS", None).await.unwrap();
    let b = svc.create_team(TAB_HEAD, "Business", "CBA", None).await.unwrap();
    let event = svc.create_event(TAB_HEAD, "Choir", &cat.id, 1).await.unwrap();

    svc.submit_results(
        COMMITTEE,
        &event.id,
        vec![medal(&a.id, 1, 1, 0, 0), medal(&b.id, 2, 0, 1, 0)],
    )
    .await
    .unwrap();
    assert_eq!(
        svc.get_event(&event.id).await.unwrap().status,
        EventStatus::ForReview
    );
    assert!(svc.medal_tally().await.unwrap().iter().all(|e| e.total == 0));

    svc.set_status(TAB_HEAD, &event.id, EventStatus::Approved)
        .await
        .unwrap();
    assert!(svc.medal_tally().await.unwrap().iter().all(|e| e.total == 0));

    svc.set_status(TAB_HEAD, &event.id, EventStatus::Published)
        .await
        .unwrap();
    let tally = svc.medal_tally().await.unwrap();
    let rows: Vec<_> = tally
        .iter()
        .map(|e| (e.team.acronym.as_str(), e.gold, e.silver, e.total))
        .collect();
    assert_eq!(rows, vec![("CAS", 1, 0, 1), ("CBA", 0, 1, 1)]);

    // Pulling back to review removes the medals again.
    svc.set_status(TAB_HEAD, &event.id, EventStatus::ForReview)
        .await
        .unwrap();
    assert!(svc.medal_tally().await.unwrap().iter().all(|e| e.total == 0));
}

#[tokio::test]
async fn gold_outranks_total_medals() {
    let svc = service().await;
    let cat = svc.create_category(TAB_HEAD, "Sports").await.unwrap();
    let a = svc.create_team(TAB_HEAD, "Alpha", "A", None).await.unwrap();
    let b = svc.create_team(TAB_HEAD, "Bravo", "B", None).await.unwrap();
    let event = svc.create_event(TAB_HEAD, "Decathlon", &cat.id, 1).await.unwrap();

    svc.submit_results(
        COMMITTEE,
        &event.id,
        vec![medal(&a.id, 1, 2, 0, 1), medal(&b.id, 2, 1, 3, 0)],
    )
    .await
    .unwrap();
    svc.set_status(TAB_HEAD, &event.id, EventStatus::Approved)
        .await
        .unwrap();
    svc.set_status(TAB_HEAD, &event.id, EventStatus::Published)
        .await
        .unwrap();

    let tally = svc.medal_tally().await.unwrap();
    assert_eq!(tally[0].team.id, a.id);
    assert_eq!((tally[0].total, tally[1].total), (3, 4));
}

#[tokio::test]
async fn rejected_operations_leave_state_alone() {
    let svc = service().await;
    let cat = svc.create_category(TAB_HEAD, "Music").await.unwrap();
    let event = svc.create_event(TAB_HEAD, "Choir", &cat.id, 1).await.unwrap();

    let err = svc
        .submit_results(COMMITTEE, &event.id, vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Validation(_)));

    let err = svc
        .set_status(TAB_HEAD, &event.id, EventStatus::Published)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidTransition(_)));
    assert_eq!(
        err.to_string(),
        format!(
            "Invalid state transition: event {} from ongoing to published",
            event.id
        )
    );

    assert_eq!(
        svc.get_event(&event.id).await.unwrap().status,
        EventStatus::Ongoing
    );
    assert!(svc.list_results(&event.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_resubmission_keeps_the_prior_result_set() {
    let svc = service().await;
    let cat = svc.create_category(TAB_HEAD, "Music").await.unwrap();
    let a = svc.create_team(TAB_HEAD, "Arts", "CAS", None).await.unwrap();
    let b = svc.create_team(TAB_HEAD, "Business", "CBA", None).await.unwrap();
    let event = svc.create_event(TAB_HEAD, "Choir", &cat.id, 1).await.unwrap();
    svc.submit_results(
        COMMITTEE,
        &event.id,
        vec![medal(&a.id, 1, 1, 0, 0), medal(&b.id, 2, 0, 1, 0)],
    )
    .await
    .unwrap();
    let before = svc.list_results(&event.id).await.unwrap();

    let err = svc
        .submit_results(COMMITTEE, &event.id, vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Validation(_)));

    assert_eq!(svc.list_results(&event.id).await.unwrap(), before);
    assert_eq!(
        svc.get_event(&event.id).await.unwrap().status,
        EventStatus::ForReview
    );
}

#[tokio::test]
async fn locked_event_can_be_unlocked() {
    let svc = service().await;
    let cat = svc.create_category(TAB_HEAD, "Music").await.unwrap();
    let a = svc.create_team(TAB_HEAD, "Arts", "CAS", None).await.unwrap();
    let event = svc.create_event(TAB_HEAD, "Choir", &cat.id, 2).await.unwrap();
    svc.submit_ranking(COMMITTEE, &event.id, &[a.id.clone()], "")
        .await
        .unwrap();

    for status in [
        EventStatus::Approved,
        EventStatus::Published,
        EventStatus::Locked,
    ] {
        svc.set_status(TAB_HEAD, &event.id, status).await.unwrap();
    }
    assert_eq!(svc.medal_tally().await.unwrap()[0].gold, 0);

    svc.set_status(TAB_HEAD, &event.id, EventStatus::Published)
        .await
        .unwrap();
    assert_eq!(svc.medal_tally().await.unwrap()[0].gold, 2);
}

#[tokio::test]
async fn deleting_a_team_removes_its_medals() {
    let svc = service().await;
    let cat = svc.create_category(TAB_HEAD, "Music").await.unwrap();
    let a = svc.create_team(TAB_HEAD, "Arts", "CAS", None).await.unwrap();
    let b = svc.create_team(TAB_HEAD, "Business", "CBA", None).await.unwrap();
    let event = svc.create_event(TAB_HEAD, "Choir", &cat.id, 1).await.unwrap();
    svc.submit_ranking(COMMITTEE, &event.id, &[a.id.clone(), b.id.clone()], "")
        .await
        .unwrap();
    svc.set_status(TAB_HEAD, &event.id, EventStatus::Approved)
        .await
        .unwrap();
    svc.set_status(TAB_HEAD, &event.id, EventStatus::Published)
        .await
        .unwrap();

    svc.delete_team(TAB_HEAD, &a.id).await.unwrap();
    let tally = svc.medal_tally().await.unwrap();
    assert_eq!(tally.len(), 1);
    assert_eq!((tally[0].team.id.as_str(), tally[0].silver), (b.id.as_str(), 1));
}

#[tokio::test]
async fn file_backed_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.db");
    let path = path.to_str().unwrap();

    {
        let svc = TallyService::new_local(path).await.unwrap();
        svc.create_team(TAB_HEAD, "Arts", "CAS", None).await.unwrap();
    }

    let reopened = TallyService::new_local(path).await.unwrap();
    assert_eq!(reopened.list_teams().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn catalog_reflects_every_completed_mutation() {
    let svc = Arc::new(service().await);
    let cat = svc.create_category(TAB_HEAD, "Music").await.unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..3)
        .map(|_| {
            let svc = Arc::clone(&svc);
            let stop = Arc::clone(&stop);
            tokio::spawn(async move {
                while !stop.load(Ordering::Relaxed) {
                    svc.list_events_by_category().await.unwrap();
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for round in 0..150 {
        let event = svc
            .create_event(TAB_HEAD, &format!("Heat {round}"), &cat.id, 1)
            .await
            .unwrap();
        let catalog = svc.list_events_by_category().await.unwrap();
        assert!(
            catalog[0].events.iter().any(|e| e.id == event.id),
            "round {round}: catalog is missing {}",
            event.id
        );
    }

    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test]
async fn file_backed_reads_see_committed_rows_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.db");
    let svc = TallyService::new_local(path.to_str().unwrap()).await.unwrap();
    let cat = svc.create_category(TAB_HEAD, "Music").await.unwrap();
    let event = svc.create_event(TAB_HEAD, "Choir", &cat.id, 1).await.unwrap();

    let writer = svc.db().writer();
    writer.execute("BEGIN", ()).await.unwrap();
    writer
        .execute(
            "UPDATE events SET status = 'published' WHERE id = ?1",
            [event.id.as_str()],
        )
        .await
        .unwrap();

    assert_eq!(
        svc.get_event(&event.id).await.unwrap().status,
        EventStatus::Ongoing
    );
    writer.execute("ROLLBACK", ()).await.unwrap();
}
