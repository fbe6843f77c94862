use std::sync::Arc;

use domain::{
    ApplicationDetails, ApplicationId, ApplicationNote, JobApplication, ListRequest, Page, UserId,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    cancellation::cancellable,
    clock::Clock,
    error::ApplicationError,
    listing::list_page,
    query_spec::{EntityListConfig, Scope},
    repository::{ApplicationNoteRepository, JobApplicationRepository},
};

#[derive(Debug, Clone)]
pub struct SaveApplicationRequest {
    pub user_id: UserId,
    pub company_name: String,
    pub role_title: String,
    pub status: String,
    /// `YYYY-MM-DD`
    pub date_applied: String,
}

impl SaveApplicationRequest {
    fn details(&self) -> Result<ApplicationDetails, ApplicationError> {
        Ok(ApplicationDetails::parse(
            &self.company_name,
            &self.role_title,
            &self.status,
            &self.date_applied,
        )?)
    }
}

pub struct JobApplicationServiceDependencies {
    pub repository: Arc<dyn JobApplicationRepository>,
    pub note_repository: Arc<dyn ApplicationNoteRepository>,
    pub clock: Arc<dyn Clock>,
    pub list_config: EntityListConfig,
}

pub struct JobApplicationService {
    deps: JobApplicationServiceDependencies,
}

impl JobApplicationService {
    pub fn new(deps: JobApplicationServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create(
        &self,
        request: SaveApplicationRequest,
        cancel: &CancellationToken,
    ) -> Result<JobApplication, ApplicationError> {
        let details = request.details()?;
        let (company_id, role_id) = self.resolve_company_and_role(&details, cancel).await?;

        let application = JobApplication::new(
            request.user_id,
            company_id,
            role_id,
            details,
            self.deps.clock.now(),
        );
        let stored = cancellable(cancel, self.deps.repository.create(application)).await?;
        info!(application_id = %stored.id, user_id = %stored.user_id, "job application created");
        Ok(stored)
    }

    pub async fn update(
        &self,
        id: ApplicationId,
        request: SaveApplicationRequest,
        cancel: &CancellationToken,
    ) -> Result<JobApplication, ApplicationError> {
        let details = request.details()?;
        let mut application = self.get(id, request.user_id, cancel).await?;
        let (company_id, role_id) = self.resolve_company_and_role(&details, cancel).await?;

        application.apply(company_id, role_id, details, self.deps.clock.now());
        cancellable(cancel, self.deps.repository.update(application)).await
    }

    pub async fn get(
        &self,
        id: ApplicationId,
        owner: UserId,
        cancel: &CancellationToken,
    ) -> Result<JobApplication, ApplicationError> {
        cancellable(cancel, self.deps.repository.find_by_id(id, owner))
            .await?
            .ok_or(ApplicationError::NotFound("job application"))
    }

    pub async fn delete(
        &self,
        id: ApplicationId,
        owner: UserId,
        cancel: &CancellationToken,
    ) -> Result<(), ApplicationError> {
        let deleted = cancellable(cancel, self.deps.repository.delete(id, owner)).await?;
        if !deleted {
            return Err(ApplicationError::NotFound("job application"));
        }
        info!(application_id = %id, user_id = %owner, "job application deleted");
        Ok(())
    }

    /// 列出用户自己的申请
    pub async fn list(
        &self,
        owner: UserId,
        request: &ListRequest,
        cancel: &CancellationToken,
    ) -> Result<Page<JobApplication>, ApplicationError> {
        list_page(
            self.deps.repository.as_ref(),
            request,
            &self.deps.list_config,
            Scope::OwnedBy(owner),
            cancel,
        )
        .await
    }

    /// 为自己的申请添加备注
    pub async fn add_note(
        &self,
        application_id: ApplicationId,
        author: UserId,
        content: &str,
        cancel: &CancellationToken,
    ) -> Result<ApplicationNote, ApplicationError> {
        let note = ApplicationNote::new(application_id, author, content, self.deps.clock.now())?;
        self.get(application_id, author, cancel).await?;

        let stored = cancellable(cancel, self.deps.note_repository.create(note)).await?;
        info!(note_id = %stored.id, application_id = %application_id, "application note added");
        Ok(stored)
    }

    /// 申请的备注，最新的在前
    pub async fn list_notes(
        &self,
        application_id: ApplicationId,
        owner: UserId,
        cancel: &CancellationToken,
    ) -> Result<Vec<ApplicationNote>, ApplicationError> {
        self.get(application_id, owner, cancel).await?;
        cancellable(
            cancel,
            self.deps
                .note_repository
                .list_for_application(application_id, owner),
        )
        .await
    }

    async fn resolve_company_and_role(
        &self,
        details: &ApplicationDetails,
        cancel: &CancellationToken,
    ) -> Result<(domain::CompanyId, domain::RoleId), ApplicationError> {
        let company_id = cancellable(
            cancel,
            self.deps.repository.find_or_create_company(
                &details.company_name,
                &details.normalized_company_name(),
            ),
        )
        .await?;
        let role_id = cancellable(
            cancel,
            self.deps
                .repository
                .find_or_create_role(company_id, &details.role_title),
        )
        .await?;
        Ok((company_id, role_id))
    }
}
