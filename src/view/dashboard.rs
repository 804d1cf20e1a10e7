//! Screen state for the applicant and reviewer dashboards
//!
//! Each view is a plain value computed from the session, the resolver and
//! the application listing. Views never own authoritative state; they are
//! rebuilt from a fresh fetch after every mutation.

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::applications::{ApplicationFilter, ApplicationRepository};
use crate::document::DocumentSource;
use crate::error::Result;
use crate::identity::{Identifier, Role, UserIdentity};
use crate::models::{AdminStatus, Application, ConfidenceBand, Recommendation};
use crate::resolver::{IdentityResolver, Resolution};
use crate::review::{ReviewActions, ReviewDecision};
use crate::session::SessionContext;
use crate::view::Route;

/// One line of an application list
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationRow {
    /// 1-based position in the list
    pub ordinal: usize,
    pub application_id: String,
    pub short_id: String,
    pub applicant_name: Option<String>,
    pub summary: String,
    /// Whole-percent confidence, e.g. `92%`
    pub confidence: String,
    pub confidence_band: ConfidenceBand,
    pub recommendation: Recommendation,
    /// Recommendation badge text, e.g. `approve` or `further review`
    pub badge: String,
    /// Applicant-facing status line
    pub status: String,
    pub document_count: usize,
    pub route: Route,
}

impl ApplicationRow {
    fn build(ordinal: usize, app: &Application, route: Route) -> Self {
        Self {
            ordinal,
            application_id: app.application_id.clone(),
            short_id: app.short_id().to_string(),
            applicant_name: app.applicant_name.clone(),
            summary: app.summary.clone(),
            confidence: format!("{}%", app.confidence_percent()),
            confidence_band: app.confidence_band(),
            recommendation: app.recommendation,
            badge: app.recommendation.label(),
            status: status_line(app),
            document_count: app.documents.len(),
            route,
        }
    }

    /// Rows for an applicant's own list
    pub fn for_user(apps: &[Application]) -> Vec<Self> {
        apps.iter()
            .enumerate()
            .map(|(i, app)| Self::build(i + 1, app, Route::UserDetail(app.application_id.clone())))
            .collect()
    }

    /// Rows for the reviewer list
    pub fn for_admin<'a, I>(apps: I) -> Vec<Self>
    where
        I: IntoIterator<Item = &'a Application>,
    {
        apps.into_iter()
            .enumerate()
            .map(|(i, app)| Self::build(i + 1, app, Route::AdminDetail(app.application_id.clone())))
            .collect()
    }
}

fn status_line(app: &Application) -> String {
    match app.admin_status {
        Some(AdminStatus::Approved) => "Approved".to_string(),
        Some(AdminStatus::Denied) => "Denied".to_string(),
        Some(AdminStatus::Pending) => "Pending".to_string(),
        Some(AdminStatus::UnderReview) => "Under Review".to_string(),
        None if app.recommendation == Recommendation::Approve => "Approved".to_string(),
        None => "Under Review".to_string(),
    }
}

/// Applicant dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    /// No stored identity; show the sign-in form
    SignedOut,
    /// Signed in, nothing on file
    NoApplications { identity: UserIdentity },
    /// Signed in with at least one application
    Applications {
        identity: UserIdentity,
        rows: Vec<ApplicationRow>,
    },
    /// Signed in as a reviewer; the reviewer dashboard applies
    Reviewer { identity: UserIdentity },
}

impl DashboardView {
    pub const EMPTY_MESSAGE: &'static str =
        "No applications found in our system. Submit a new application to get started.";

    pub fn identity(&self) -> Option<&UserIdentity> {
        match self {
            DashboardView::SignedOut => None,
            DashboardView::NoApplications { identity }
            | DashboardView::Applications { identity, .. }
            | DashboardView::Reviewer { identity } => Some(identity),
        }
    }

    pub fn rows(&self) -> &[ApplicationRow] {
        match self {
            DashboardView::Applications { rows, .. } => rows,
            _ => &[],
        }
    }

    /// Where this view sends the user
    pub fn route(&self) -> Route {
        match self {
            DashboardView::Reviewer { .. } => Route::AdminDashboard,
            _ => Route::UserDashboard,
        }
    }
}

/// Reviewer dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct AdminDashboardView {
    /// All applications before filtering
    pub total: usize,
    pub rows: Vec<ApplicationRow>,
    pub filtered: bool,
}

impl AdminDashboardView {
    /// Message shown when `rows` is empty
    pub fn empty_message(&self) -> &'static str {
        if self.filtered {
            "Try adjusting your search or filter criteria."
        } else {
            "No applications are currently available."
        }
    }
}

/// Application detail screen
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub application_id: String,
    pub applicant_name: Option<String>,
    pub masked_identifier: String,
    pub summary: String,
    pub recommendation: Recommendation,
    /// One-decimal confidence, e.g. `92.0%`
    pub confidence: String,
    pub confidence_band: ConfidenceBand,
    pub admin_status: Option<AdminStatus>,
    pub documents: Vec<String>,
    pub document: Option<DocumentSource>,
    pub download_name: String,
}

impl DetailView {
    pub fn from_application(app: &Application) -> Self {
        Self {
            application_id: app.application_id.clone(),
            applicant_name: app.applicant_name.clone(),
            masked_identifier: app.masked_identifier(),
            summary: app.summary.clone(),
            recommendation: app.recommendation,
            confidence: format!("{:.1}%", app.confidence_level.clamp(0.0, 1.0) * 100.0),
            confidence_band: app.confidence_band(),
            admin_status: app.admin_status,
            documents: app.documents.clone(),
            document: app.document_source(),
            download_name: DocumentSource::file_name(&app.application_id),
        }
    }

    /// Placeholder text for the viewer when there is nothing to show
    pub fn document_message(&self) -> Option<&'static str> {
        self.document.is_none().then_some("No document available.")
    }
}

/// Result of a successful review action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewNotice {
    /// The service's message, shown verbatim
    pub message: String,
    /// Screen to go to next
    pub next: Route,
}

/// Drives the dashboard screens for one view lifetime.
///
/// All requests issued through a `Dashboard` share its cancellation token.
/// Dropping the dashboard cancels the token, so a response that arrives
/// after the view is gone is discarded instead of written anywhere.
pub struct Dashboard {
    session: SessionContext,
    resolver: IdentityResolver,
    applications: ApplicationRepository,
    review: ReviewActions,
    cancel: CancellationToken,
}

impl Dashboard {
    pub(crate) fn new(
        session: SessionContext,
        resolver: IdentityResolver,
        applications: ApplicationRepository,
        review: ReviewActions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            resolver,
            applications,
            review,
            cancel,
        }
    }

    /// A handle that cancels every in-flight request of this dashboard
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Build the applicant dashboard from the stored session
    pub async fn load(&self) -> Result<DashboardView> {
        match self.session.load().await? {
            Some(identity) => self.view_for(identity).await,
            None => Ok(DashboardView::SignedOut),
        }
    }

    /// Resolve submitted credentials, persist the identity and build the dashboard
    pub async fn sign_in(&self, name: &str, identifier: &str) -> Result<DashboardView> {
        let identity = UserIdentity::from_submission(name, identifier)?;
        let resolution = self
            .resolver
            .resolve_remote(&identity.name, &identity.identifier, Some(&self.cancel))
            .await?;

        let identity = identity.with_role(resolution.role());
        self.session.save(&identity).await?;
        info!("signed in {}", identity);

        self.view_for_resolution(identity, resolution).await
    }

    /// Forget the stored identity
    pub async fn sign_out(&self) -> Result<DashboardView> {
        self.session.clear().await?;
        Ok(DashboardView::SignedOut)
    }

    async fn view_for(&self, identity: UserIdentity) -> Result<DashboardView> {
        if identity.role == Some(Role::Admin) {
            return Ok(DashboardView::Reviewer { identity });
        }
        let resolution = self
            .resolver
            .resolve_remote(&identity.name, &identity.identifier, Some(&self.cancel))
            .await?;
        self.view_for_resolution(identity, resolution).await
    }

    async fn view_for_resolution(
        &self,
        identity: UserIdentity,
        resolution: Resolution,
    ) -> Result<DashboardView> {
        let user = match resolution {
            Resolution::Admin => return Ok(DashboardView::Reviewer { identity }),
            Resolution::Unregistered => {
                debug!("no user record for {}", identity);
                return Ok(DashboardView::NoApplications { identity });
            }
            Resolution::Applicant(user) => user,
        };

        let key = Identifier::normalize(&user.identifier);
        let key = if key.is_empty() { user.name.clone() } else { key };
        let apps = self.applications.list_for_user(&key, Some(&self.cancel)).await?;

        if apps.is_empty() {
            Ok(DashboardView::NoApplications { identity })
        } else {
            Ok(DashboardView::Applications {
                identity,
                rows: ApplicationRow::for_user(&apps),
            })
        }
    }

    /// Reviewer list, filtered
    pub async fn admin(&self, filter: &ApplicationFilter) -> Result<AdminDashboardView> {
        let apps = self.applications.list_all(Some(&self.cancel)).await?;
        Ok(AdminDashboardView {
            total: apps.len(),
            rows: ApplicationRow::for_admin(filter.apply(&apps)),
            filtered: filter.is_active(),
        })
    }

    /// Detail screen for one application
    pub async fn detail(&self, application_id: &str) -> Result<DetailView> {
        let app = self
            .applications
            .get_by_id(application_id, Some(&self.cancel))
            .await?;
        Ok(DetailView::from_application(&app))
    }

    /// Approve and, on success, head back to the reviewer list.
    ///
    /// On failure the error is returned and the caller stays where it is.
    pub async fn approve(&self, application_id: &str) -> Result<ReviewNotice> {
        self.decide(application_id, ReviewDecision::Approve).await
    }

    /// Deny and, on success, head back to the reviewer list
    pub async fn deny(&self, application_id: &str) -> Result<ReviewNotice> {
        self.decide(application_id, ReviewDecision::Deny).await
    }

    async fn decide(&self, application_id: &str, decision: ReviewDecision) -> Result<ReviewNotice> {
        let outcome = self
            .review
            .decide(application_id, decision, Some(&self.cancel))
            .await?;
        Ok(ReviewNotice {
            message: outcome.message,
            next: Route::AdminDashboard,
        })
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
