use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rust_decimal_macros::dec;

use crate::workflows::origination::applications::domain::{
    ApplicationFilter, ApplicationId, CreateApplicationRequest, CustomerId, CustomerSnapshot,
    LoanApplication, LoanType, ProductId, DEFAULT_PRIORITY,
};
use crate::workflows::origination::applications::lifecycle::ApplicationStatus;
use crate::workflows::origination::applications::product::LoanProduct;
use crate::workflows::origination::applications::repository::{
    ApplicationRepository, CustomerDirectory, NotificationError, NotificationPublisher,
    ProductCatalog, RepositoryError, StatusChangeNotice,
};
use crate::workflows::origination::applications::service::LoanApplicationService;
use crate::workflows::origination::applications::{UnderwritingConfig, STUB_CREDIT_SCORE};

pub(super) fn customer_id() -> CustomerId {
    CustomerId("cust-001".to_string())
}

pub(super) fn product_id() -> ProductId {
    ProductId("prod-personal".to_string())
}

pub(super) fn customer() -> CustomerSnapshot {
    CustomerSnapshot {
        id: customer_id(),
        full_name: "Amara Okafor".to_string(),
        kyc_complete: true,
        active: true,
    }
}

pub(super) fn product() -> LoanProduct {
    LoanProduct {
        id: product_id(),
        name: "Personal Flex".to_string(),
        min_amount: dec!(1000),
        max_amount: dec!(1000000),
        min_term_months: 6,
        max_term_months: 120,
        min_interest_rate: dec!(0.05),
        max_interest_rate: dec!(0.30),
        default_interest_rate: dec!(0.15),
        auto_approval_limit: Some(dec!(20000)),
        processing_fee_rate: Some(dec!(0.01)),
        requires_collateral: false,
        requires_guarantor: false,
        min_credit_score: Some(600),
        min_income: Some(dec!(2500)),
    }
}

pub(super) fn underwriting_config() -> UnderwritingConfig {
    UnderwritingConfig::default()
}

pub(super) fn create_request() -> CreateApplicationRequest {
    CreateApplicationRequest {
        customer_id: customer_id(),
        product_id: product_id(),
        loan_type: LoanType::Personal,
        requested_amount: dec!(8000),
        requested_term_months: 24,
        purpose: "working capital".to_string(),
        declared_income: dec!(5000),
        debt_to_income_ratio: Some(dec!(0.30)),
        save_as_draft: false,
        auto_submit: false,
    }
}

/// Build a stored record directly, bypassing intake validation, so lifecycle
/// edge cases (zero amounts, arbitrary statuses) can be staged.
pub(super) fn raw_application(suffix: &str, status: ApplicationStatus) -> LoanApplication {
    let now = Utc::now();
    LoanApplication {
        id: ApplicationId(format!("app-raw-{suffix}")),
        application_number: format!("LN-RAW-{suffix}"),
        customer_id: customer_id(),
        product_id: product_id(),
        loan_type: LoanType::Personal,
        requested_amount: dec!(8000),
        requested_term_months: 24,
        purpose: "working capital".to_string(),
        declared_income: dec!(5000),
        debt_to_income_ratio: Some(dec!(0.30)),
        credit_score: STUB_CREDIT_SCORE,
        risk_score: 0,
        status,
        current_step: "intake".to_string(),
        assigned_to: None,
        priority: DEFAULT_PRIORITY,
        approved_amount: None,
        approved_term_months: None,
        approved_rate: None,
        monthly_payment: None,
        decision_reason: None,
        decision_date: None,
        approved_by: None,
        approved_date: None,
        rejected_by: None,
        rejected_date: None,
        disbursed_by: None,
        disbursed_date: None,
        disbursed_amount: None,
        submitted_date: None,
        due_date: None,
        created_at: now,
        updated_at: now,
        is_deleted: false,
        version: 0,
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<ApplicationId, LoanApplication>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, application: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, mut application: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard
            .get(&application.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != application.version {
            return Err(RepositoryError::Conflict);
        }
        application.version += 1;
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn fetch_by_number(
        &self,
        application_number: &str,
    ) -> Result<Option<LoanApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|application| application.application_number == application_number)
            .cloned())
    }

    fn search(&self, filter: &ApplicationFilter) -> Result<Vec<LoanApplication>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut matches: Vec<LoanApplication> = guard
            .values()
            .filter(|application| filter.include_deleted || !application.is_deleted)
            .filter(|application| {
                filter
                    .status
                    .map_or(true, |status| application.status == status)
            })
            .filter(|application| {
                filter
                    .customer_id
                    .as_ref()
                    .map_or(true, |id| &application.customer_id == id)
            })
            .filter(|application| {
                filter
                    .loan_type
                    .map_or(true, |loan_type| application.loan_type == loan_type)
            })
            .filter(|application| {
                filter.assigned_to.as_ref().map_or(true, |assignee| {
                    application.assigned_to.as_deref() == Some(assignee.as_str())
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.application_number.cmp(&b.application_number));
        Ok(matches)
    }
}

#[derive(Default)]
pub(super) struct MemoryCustomers {
    customers: Mutex<HashMap<CustomerId, CustomerSnapshot>>,
}

impl MemoryCustomers {
    pub(super) fn with(snapshot: CustomerSnapshot) -> Self {
        let directory = Self::default();
        directory.put(snapshot);
        directory
    }

    pub(super) fn put(&self, snapshot: CustomerSnapshot) {
        self.customers
            .lock()
            .expect("customer mutex poisoned")
            .insert(snapshot.id.clone(), snapshot);
    }
}

impl CustomerDirectory for MemoryCustomers {
    fn fetch(&self, id: &CustomerId) -> Result<Option<CustomerSnapshot>, RepositoryError> {
        let guard = self.customers.lock().expect("customer mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryProducts {
    products: Mutex<HashMap<ProductId, LoanProduct>>,
}

impl MemoryProducts {
    pub(super) fn with(product: LoanProduct) -> Self {
        let catalog = Self::default();
        catalog.put(product);
        catalog
    }

    pub(super) fn put(&self, product: LoanProduct) {
        self.products
            .lock()
            .expect("product mutex poisoned")
            .insert(product.id.clone(), product);
    }
}

impl ProductCatalog for MemoryProducts {
    fn fetch(&self, id: &ProductId) -> Result<Option<LoanProduct>, RepositoryError> {
        let guard = self.products.lock().expect("product mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    notices: Mutex<Vec<StatusChangeNotice>>,
}

impl MemoryNotifications {
    pub(super) fn notices(&self) -> Vec<StatusChangeNotice> {
        self.notices.lock().expect("notice mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notice: StatusChangeNotice) -> Result<(), NotificationError> {
        self.notices
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Transport that always refuses, for proving dispatch is best-effort.
pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notice: StatusChangeNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("gateway offline".to_string()))
    }
}

/// Repository that answers `Conflict` for a configured number of updates
/// before delegating, with an attempt counter for retry assertions.
pub(super) struct FlakyRepository {
    inner: MemoryRepository,
    conflicts_remaining: AtomicU32,
    update_attempts: AtomicU32,
}

impl FlakyRepository {
    pub(super) fn conflicting(times: u32) -> Self {
        Self {
            inner: MemoryRepository::default(),
            conflicts_remaining: AtomicU32::new(times),
            update_attempts: AtomicU32::new(0),
        }
    }

    pub(super) fn update_attempts(&self) -> u32 {
        self.update_attempts.load(Ordering::SeqCst)
    }
}

impl ApplicationRepository for FlakyRepository {
    fn insert(&self, application: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        self.inner.insert(application)
    }

    fn update(&self, application: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        self.update_attempts.fetch_add(1, Ordering::SeqCst);
        if self.conflicts_remaining.load(Ordering::SeqCst) > 0 {
            self.conflicts_remaining.fetch_sub(1, Ordering::SeqCst);
            return Err(RepositoryError::Conflict);
        }
        self.inner.update(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn fetch_by_number(
        &self,
        application_number: &str,
    ) -> Result<Option<LoanApplication>, RepositoryError> {
        self.inner.fetch_by_number(application_number)
    }

    fn search(&self, filter: &ApplicationFilter) -> Result<Vec<LoanApplication>, RepositoryError> {
        self.inner.search(filter)
    }
}

pub(super) type MemoryService =
    LoanApplicationService<MemoryRepository, MemoryCustomers, MemoryProducts, MemoryNotifications>;

pub(super) fn build_service() -> (MemoryService, Arc<MemoryRepository>, Arc<MemoryNotifications>) {
    let repository = Arc::new(MemoryRepository::default());
    let customers = Arc::new(MemoryCustomers::with(customer()));
    let products = Arc::new(MemoryProducts::with(product()));
    let notifications = Arc::new(MemoryNotifications::default());
    let service = LoanApplicationService::new(
        repository.clone(),
        customers,
        products,
        notifications.clone(),
        underwriting_config(),
    );
    (service, repository, notifications)
}
