//! 求职申请服务测试

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use domain::{DomainError, ListRequest, SortOrder, Timestamp, UserId};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::query_spec::APPLICATION_LIST;
use crate::services::{
    JobApplicationService, JobApplicationServiceDependencies, SaveApplicationRequest,
};
use crate::testing::InMemoryJobApplicationRepository;

/// 每次读取前进一秒
struct SteppingClock(Mutex<Timestamp>);

impl Clock for SteppingClock {
    fn now(&self) -> Timestamp {
        let mut now = self.0.lock().unwrap();
        *now += Duration::seconds(1);
        *now
    }
}

fn service() -> (JobApplicationService, Arc<InMemoryJobApplicationRepository>) {
    let repository = Arc::new(InMemoryJobApplicationRepository::new());
    let service = JobApplicationService::new(JobApplicationServiceDependencies {
        repository: repository.clone(),
        note_repository: repository.clone(),
        clock: Arc::new(SteppingClock(Mutex::new(Utc::now()))),
        list_config: APPLICATION_LIST,
    });
    (service, repository)
}

fn save(user_id: UserId, company: &str, role: &str, status: &str, date: &str) -> SaveApplicationRequest {
    SaveApplicationRequest {
        user_id,
        company_name: company.to_string(),
        role_title: role.to_string(),
        status: status.to_string(),
        date_applied: date.to_string(),
    }
}

#[tokio::test]
async fn create_reuses_company_by_normalized_name() {
    let (service, repository) = service();
    let user = UserId::generate();
    let cancel = CancellationToken::new();

    let first = service
        .create(save(user, "Acme", "Engineer", "Applied", "2024-01-02"), &cancel)
        .await
        .unwrap();
    let second = service
        .create(save(user, "  ACME ", "Manager", "Applied", "2024-01-03"), &cancel)
        .await
        .unwrap();

    assert_eq!(first.company_id, second.company_id);
    assert_ne!(first.role_id, second.role_id);
    assert_eq!(repository.company_count(), 1);
}

#[tokio::test]
async fn invalid_date_is_rejected_before_any_store_call() {
    let (service, repository) = service();
    let err = service
        .create(
            save(UserId::generate(), "Acme", "Engineer", "Applied", "yesterday"),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidArgument { .. })
    ));
    assert_eq!(repository.company_count(), 0);
}

#[tokio::test]
async fn other_users_cannot_read_or_delete() {
    let (service, _) = service();
    let owner = UserId::generate();
    let stranger = UserId::generate();
    let cancel = CancellationToken::new();

    let created = service
        .create(save(owner, "Acme", "Engineer", "Applied", "2024-01-02"), &cancel)
        .await
        .unwrap();

    assert_eq!(
        service.get(created.id, stranger, &cancel).await.unwrap_err(),
        ApplicationError::NotFound("job application")
    );
    assert_eq!(
        service.delete(created.id, stranger, &cancel).await.unwrap_err(),
        ApplicationError::NotFound("job application")
    );
    assert!(service.delete(created.id, owner, &cancel).await.is_ok());
}

#[tokio::test]
async fn update_changes_status_and_keeps_identity() {
    let (service, _) = service();
    let owner = UserId::generate();
    let cancel = CancellationToken::new();

    let created = service
        .create(save(owner, "Acme", "Engineer", "Applied", "2024-01-02"), &cancel)
        .await
        .unwrap();
    let updated = service
        .update(
            created.id,
            save(owner, "Acme", "Engineer", "Interviewing", "2024-01-02"),
            &cancel,
        )
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.status, "Interviewing");
}

#[tokio::test]
async fn list_is_scoped_searched_and_paged() {
    let (service, _) = service();
    let owner = UserId::generate();
    let cancel = CancellationToken::new();

    for day in 1..=12 {
        let company = if day % 2 == 0 { "Rustacean Labs" } else { "Gopher Inc" };
        service
            .create(
                save(owner, company, "Engineer", "Applied", &format!("2024-02-{day:02}")),
                &cancel,
            )
            .await
            .unwrap();
    }
    service
        .create(
            save(UserId::generate(), "Rustacean Labs", "Engineer", "Applied", "2024-02-01"),
            &cancel,
        )
        .await
        .unwrap();

    let request = ListRequest {
        limit: 4,
        search: Some("rustacean".into()),
        sort_order: SortOrder::Asc,
        ..ListRequest::default()
    };
    let page = service.list(owner, &request, &cancel).await.unwrap();

    assert_eq!(page.total_items, 6);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 4);
    assert!(page.items.iter().all(|a| a.user_id == owner));
    assert_eq!(page.items[0].date_applied.to_string(), "2024-02-02");
}

#[tokio::test]
async fn list_filters_by_status() {
    let (service, _) = service();
    let owner = UserId::generate();
    let cancel = CancellationToken::new();

    for status in ["Applied", "Offer", "Applied", "Rejected"] {
        service
            .create(save(owner, "Acme", "Engineer", status, "2024-03-01"), &cancel)
            .await
            .unwrap();
    }

    let request = ListRequest {
        filters: BTreeMap::from([("status".to_string(), "Applied".to_string())]),
        ..ListRequest::default()
    };
    let page = service.list(owner, &request, &cancel).await.unwrap();
    assert_eq!(page.total_items, 2);
    assert!(page.items.iter().all(|a| a.status == "Applied"));
}

#[tokio::test]
async fn cancelled_create_returns_canceled() {
    let (service, repository) = service();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = service
        .create(
            save(UserId::generate(), "Acme", "Engineer", "Applied", "2024-01-02"),
            &cancel,
        )
        .await
        .unwrap_err();

    assert_eq!(err, ApplicationError::Canceled);
    assert_eq!(repository.company_count(), 0);
}

#[tokio::test]
async fn notes_are_listed_newest_first() {
    let (service, _) = service();
    let owner = UserId::generate();
    let cancel = CancellationToken::new();
    let application = service
        .create(save(owner, "Acme", "Engineer", "Applied", "2024-01-02"), &cancel)
        .await
        .unwrap();

    for content in ["sent resume", "  phone screen booked "] {
        service
            .add_note(application.id, owner, content, &cancel)
            .await
            .unwrap();
    }

    let notes = service
        .list_notes(application.id, owner, &cancel)
        .await
        .unwrap();
    let contents: Vec<_> = notes.iter().map(|note| note.content.as_str()).collect();
    assert_eq!(contents, ["phone screen booked", "sent resume"]);
    assert!(notes.iter().all(|note| note.user_id == owner));
}

#[tokio::test]
async fn notes_on_someone_elses_application_are_not_found() {
    let (service, _) = service();
    let owner = UserId::generate();
    let stranger = UserId::generate();
    let cancel = CancellationToken::new();
    let application = service
        .create(save(owner, "Acme", "Engineer", "Applied", "2024-01-02"), &cancel)
        .await
        .unwrap();
    service
        .add_note(application.id, owner, "private", &cancel)
        .await
        .unwrap();

    assert_eq!(
        service
            .add_note(application.id, stranger, "sneaky", &cancel)
            .await
            .unwrap_err(),
        ApplicationError::NotFound("job application")
    );
    assert_eq!(
        service
            .list_notes(application.id, stranger, &cancel)
            .await
            .unwrap_err(),
        ApplicationError::NotFound("job application")
    );
}

#[tokio::test]
async fn blank_note_is_rejected() {
    let (service, _) = service();
    let owner = UserId::generate();
    let cancel = CancellationToken::new();
    let application = service
        .create(save(owner, "Acme", "Engineer", "Applied", "2024-01-02"), &cancel)
        .await
        .unwrap();

    let err = service
        .add_note(application.id, owner, "   ", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidArgument { .. })
    ));
    assert!(service
        .list_notes(application.id, owner, &cancel)
        .await
        .unwrap()
        .is_empty());
}
