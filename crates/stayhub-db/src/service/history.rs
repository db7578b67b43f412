//! Paginated history for the admin pages. Read-only, role checked.

use chrono::{DateTime, Utc};

use crate::pool::Database;
use crate::repository::audit::AuditFilter;
use crate::repository::overrides::OverrideFilter;
use crate::repository::Page;
use crate::service::error::ServiceResult;
use stayhub_core::validation::validate_page;
use stayhub_core::{Actor, AdminOverride, AuditLogEntry, Capability, CheckoutConfirmation};

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

/// 1-based page request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct HistoryQueries {
    db: Database,
    default_per_page: i64,
    max_per_page: i64,
}

impl HistoryQueries {
    pub fn new(db: Database) -> Self {
        HistoryQueries {
            db,
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
        }
    }

    pub fn with_page_limits(mut self, default_per_page: i64, max_per_page: i64) -> Self {
        self.default_per_page = default_per_page;
        self.max_per_page = max_per_page;
        self
    }

    fn limits(&self, actor: &Actor, page: PageRequest) -> ServiceResult<(i64, i64)> {
        actor.require(Capability::ViewHistory)?;
        Ok(validate_page(page.page, page.per_page, self.default_per_page, self.max_per_page)?)
    }

    pub async fn list_overrides(
        &self,
        actor: &Actor,
        filter: &OverrideFilter,
        page: PageRequest,
    ) -> ServiceResult<Page<AdminOverride>> {
        let (limit, offset) = self.limits(actor, page)?;
        Ok(self.db.overrides().list(filter, limit, offset).await?)
    }

    pub async fn list_confirmations(
        &self,
        actor: &Actor,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        page: PageRequest,
    ) -> ServiceResult<Page<CheckoutConfirmation>> {
        let (limit, offset) = self.limits(actor, page)?;
        Ok(self.db.overrides().list_confirmations(from, to, limit, offset).await?)
    }

    pub async fn list_audit_logs(
        &self,
        actor: &Actor,
        filter: &AuditFilter,
        page: PageRequest,
    ) -> ServiceResult<Page<AuditLogEntry>> {
        let (limit, offset) = self.limits(actor, page)?;
        Ok(self.db.audit_logs().list(filter, limit, offset).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::overrides::{OverrideManager, OverrideRequest};
    use crate::service::testing::{date, Fixture};
    use stayhub_core::{BookingStatus, ErrorKind, Money, OverrideStatus, OverrideType, PaymentStatus};

    async fn overridden(fx: &Fixture, override_type: OverrideType) -> String {
        let id = fx
            .open_booking(date(6, 1), date(6, 3), BookingStatus::CheckedOut, PaymentStatus::Paid)
            .await;
        OverrideManager::new(fx.db.clone())
            .apply_override(
                &fx.admin,
                OverrideRequest {
                    booking_id: id,
                    final_amount: Money::from_minor(150_000),
                    reason: "adjusted".to_string(),
                    override_type,
                },
            )
            .await
            .unwrap()
            .override_id
    }

    #[tokio::test]
    async fn test_override_history_filters() {
        let fx = Fixture::new().await;
        let first = overridden(&fx, OverrideType::Discount).await;
        overridden(&fx, OverrideType::Surcharge).await;
        overridden(&fx, OverrideType::Discount).await;
        OverrideManager::new(fx.db.clone())
            .reverse_override(&fx.admin, &first, "wrong booking")
            .await
            .unwrap();

        let history = HistoryQueries::new(fx.db.clone());
        let all = history
            .list_overrides(&fx.accountant, &OverrideFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total, 3);

        let discounts = OverrideFilter {
            override_type: Some(OverrideType::Discount),
            status: Some(OverrideStatus::Applied),
            ..Default::default()
        };
        let page = history
            .list_overrides(&fx.admin, &discounts, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let small = PageRequest {
            page: Some(2),
            per_page: Some(2),
        };
        let page = history
            .list_overrides(&fx.admin, &OverrideFilter::default(), small)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.page, 2);

        let audit = history
            .list_audit_logs(
                &fx.admin,
                &AuditFilter {
                    action: Some("override.reverse".to_string()),
                    entity_id: None,
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(audit.total, 1);
    }

    #[tokio::test]
    async fn test_history_is_role_checked() {
        let fx = Fixture::new().await;
        let history = HistoryQueries::new(fx.db.clone());

        let err = history
            .list_confirmations(&fx.desk, None, None, PageRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = history
            .list_audit_logs(
                &fx.admin,
                &AuditFilter::default(),
                PageRequest {
                    page: Some(0),
                    per_page: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
