pub(crate) mod helpers {
    use tally_core::entities::{Category, Team};
    use tally_core::enums::EventStatus;

    use crate::TallyService;

    pub async fn test_service() -> TallyService {
        TallyService::new_local(":memory:").await.unwrap()
    }

    pub async fn seed_category(svc: &TallyService, name: &str) -> Category {
        svc.create_category("usr-seed", name).await.unwrap()
    }

    pub async fn seed_team(svc: &TallyService, name: &str, acronym: &str) -> Team {
        svc.create_team("usr-seed", name, acronym, None).await.unwrap()
    }

    /// Submit `team_ids` in finishing order with one medal per podium place.
    pub async fn submit_simple(svc: &TallyService, event_id: &str, team_ids: &[&str]) {
        let ids: Vec<String> = team_ids.iter().map(|s| (*s).to_string()).collect();
        svc.submit_ranking("usr-seed", event_id, &ids, "")
            .await
            .unwrap();
    }

    /// for_review → approved → published.
    pub async fn publish(svc: &TallyService, event_id: &str) {
        for status in [EventStatus::Approved, EventStatus::Published] {
            svc.set_status("usr-seed", event_id, status).await.unwrap();
        }
    }
}
