use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info, warn};

use super::amortization::{self, AmortizationError, ScheduleLine};
use super::domain::{
    ApplicationFilter, ApplicationId, ApplicationUpdate, ApprovalTerms, CreateApplicationRequest,
    CustomerId, LoanApplication, ProductId, DEFAULT_PRIORITY, MAX_PRIORITY, MIN_PRIORITY,
};
use super::evaluation::{
    UnderwritingConfig, UnderwritingEngine, UnderwritingRecommendation, STUB_CREDIT_SCORE,
};
use super::lifecycle::{transition, ApplicationStatus, IllegalTransition, WorkflowEvent};
use super::product::{LoanProduct, ProductPolicyError};
use super::repository::{
    ApplicationRepository, CustomerDirectory, NotificationPublisher, ProductCatalog,
    RepositoryError, StatusChangeNotice,
};

/// Actor recorded on decisions taken without a human operator.
pub const SYSTEM_ACTOR: &str = "system";

const APPLICATION_NUMBER_PREFIX: &str = "LN";
const MINIMUM_REQUESTED_AMOUNT: Decimal = dec!(1000);
const MIN_TERM_MONTHS: u32 = 1;
const MAX_TERM_MONTHS: u32 = 360;
const DISBURSEMENT_GRACE_DAYS: i64 = 30;

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_identity(now: chrono::DateTime<Utc>) -> (ApplicationId, String) {
    let sequence = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let number = format!(
        "{APPLICATION_NUMBER_PREFIX}-{}-{sequence:06}",
        now.format("%Y%m%d")
    );
    (ApplicationId(format!("app-{sequence:06}")), number)
}

/// Service composing the lifecycle table, product policy, underwriting rules,
/// and the external collaborators.
pub struct LoanApplicationService<R, C, P, N> {
    repository: Arc<R>,
    customers: Arc<C>,
    products: Arc<P>,
    notifications: Arc<N>,
    engine: Arc<UnderwritingEngine>,
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),
    #[error("loan product {0} not found")]
    ProductNotFound(ProductId),
    #[error("customer {id} is not eligible: {reason}")]
    CustomerNotEligible { id: CustomerId, reason: String },
    #[error("invalid {field}: {message}")]
    InvalidArgument { field: &'static str, message: String },
    #[error(transparent)]
    Transition(#[from] IllegalTransition),
    #[error(transparent)]
    Policy(#[from] ProductPolicyError),
    #[error(transparent)]
    Calculation(#[from] AmortizationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl<R, C, P, N> LoanApplicationService<R, C, P, N>
where
    R: ApplicationRepository + 'static,
    C: CustomerDirectory + 'static,
    P: ProductCatalog + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        customers: Arc<C>,
        products: Arc<P>,
        notifications: Arc<N>,
        config: UnderwritingConfig,
    ) -> Self {
        Self {
            repository,
            customers,
            products,
            notifications,
            engine: Arc::new(UnderwritingEngine::new(config)),
        }
    }

    /// Intake a new application, in `Draft` unless auto-submission is asked
    /// for (and not overridden by `save_as_draft`).
    pub fn create(
        &self,
        request: CreateApplicationRequest,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        if request.requested_amount < MINIMUM_REQUESTED_AMOUNT {
            return Err(ApplicationServiceError::InvalidArgument {
                field: "requested_amount",
                message: format!("must be at least {MINIMUM_REQUESTED_AMOUNT}"),
            });
        }
        if !(MIN_TERM_MONTHS..=MAX_TERM_MONTHS).contains(&request.requested_term_months) {
            return Err(ApplicationServiceError::InvalidArgument {
                field: "requested_term_months",
                message: format!("must be between {MIN_TERM_MONTHS} and {MAX_TERM_MONTHS}"),
            });
        }
        if request.declared_income.is_sign_negative() {
            return Err(ApplicationServiceError::InvalidArgument {
                field: "declared_income",
                message: "must not be negative".to_string(),
            });
        }
        if let Some(ratio) = request.debt_to_income_ratio {
            if ratio.is_sign_negative() {
                return Err(ApplicationServiceError::InvalidArgument {
                    field: "debt_to_income_ratio",
                    message: "must not be negative".to_string(),
                });
            }
        }

        let customer = self
            .customers
            .fetch(&request.customer_id)?
            .ok_or_else(|| ApplicationServiceError::CustomerNotFound(request.customer_id.clone()))?;
        if !customer.kyc_complete {
            return Err(ApplicationServiceError::CustomerNotEligible {
                id: customer.id,
                reason: "KYC verification incomplete".to_string(),
            });
        }
        if !customer.active {
            return Err(ApplicationServiceError::CustomerNotEligible {
                id: customer.id,
                reason: "customer account is inactive".to_string(),
            });
        }

        let product = self
            .products
            .fetch(&request.product_id)?
            .ok_or_else(|| ApplicationServiceError::ProductNotFound(request.product_id.clone()))?;
        product
            .ensure_within_limits(request.requested_amount, request.requested_term_months)
            .map_err(ProductPolicyError::from)?;

        let now = Utc::now();
        let submit_now = request.auto_submit && !request.save_as_draft;
        let (id, application_number) = next_application_identity(now);

        let mut application = LoanApplication {
            id,
            application_number,
            customer_id: request.customer_id,
            product_id: request.product_id,
            loan_type: request.loan_type,
            requested_amount: request.requested_amount,
            requested_term_months: request.requested_term_months,
            purpose: request.purpose,
            declared_income: request.declared_income,
            debt_to_income_ratio: request.debt_to_income_ratio,
            credit_score: STUB_CREDIT_SCORE,
            risk_score: 0,
            status: if submit_now {
                ApplicationStatus::Submitted
            } else {
                ApplicationStatus::Draft
            },
            current_step: if submit_now {
                "underwriting queue".to_string()
            } else {
                "intake".to_string()
            },
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
            submitted_date: submit_now.then_some(now),
            due_date: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            version: 0,
        };

        let assessment = self.engine.assess(&application, &product);
        application.risk_score = assessment.risk_score;

        let saved = self.repository.insert(application)?;
        info!(
            application_number = %saved.application_number,
            status = saved.status.label(),
            "application created"
        );
        if submit_now {
            self.notify(&saved, WorkflowEvent::Submit);
        }
        Ok(saved)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<LoanApplication, ApplicationServiceError> {
        self.load(id)
    }

    pub fn get_by_number(
        &self,
        application_number: &str,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        match self.repository.fetch_by_number(application_number)? {
            Some(application) if !application.is_deleted => Ok(application),
            _ => Err(ApplicationServiceError::ApplicationNotFound(ApplicationId(
                application_number.to_string(),
            ))),
        }
    }

    /// Work-queue search; soft-deleted records stay hidden unless the filter
    /// opts in.
    pub fn search(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<LoanApplication>, ApplicationServiceError> {
        Ok(self.repository.search(filter)?)
    }

    /// Submit a draft (or a resubmission after an information request).
    pub fn submit(&self, id: &ApplicationId) -> Result<LoanApplication, ApplicationServiceError> {
        self.apply(id, |application| {
            let next = transition(application.status, WorkflowEvent::Submit)?;
            if application.requested_amount <= Decimal::ZERO {
                return Err(ApplicationServiceError::InvalidArgument {
                    field: "requested_amount",
                    message: "required before submission".to_string(),
                });
            }
            if application.requested_term_months == 0 {
                return Err(ApplicationServiceError::InvalidArgument {
                    field: "requested_term_months",
                    message: "required before submission".to_string(),
                });
            }
            application.status = next;
            application.submitted_date = Some(Utc::now());
            application.current_step = "underwriting queue".to_string();
            Ok(Some(WorkflowEvent::Submit))
        })
    }

    /// Pull a submitted application onto a reviewer's desk.
    pub fn start_review(
        &self,
        id: &ApplicationId,
        reviewer: &str,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        if reviewer.trim().is_empty() {
            return Err(ApplicationServiceError::InvalidArgument {
                field: "reviewer",
                message: "must not be blank".to_string(),
            });
        }
        self.apply(id, |application| {
            application.status = transition(application.status, WorkflowEvent::StartReview)?;
            application.assigned_to = Some(reviewer.to_string());
            application.current_step = "underwriting review".to_string();
            Ok(Some(WorkflowEvent::StartReview))
        })
    }

    /// Approve with explicit terms; the monthly payment is derived, never
    /// caller-supplied.
    pub fn approve(
        &self,
        id: &ApplicationId,
        terms: ApprovalTerms,
        reason: &str,
        approver: &str,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        self.apply(id, |application| {
            let next = transition(application.status, WorkflowEvent::Approve)?;
            if terms.rate.is_sign_negative() || terms.rate > Decimal::ONE {
                return Err(ApplicationServiceError::InvalidArgument {
                    field: "approved_rate",
                    message: "must be a fraction between 0 and 1".to_string(),
                });
            }
            let product = self.product_for(application)?;
            let monthly_payment =
                product.monthly_payment_for(terms.amount, terms.term_months, Some(terms.rate))?;
            let assessment = self.engine.assess(application, &product);

            let now = Utc::now();
            application.risk_score = assessment.risk_score;
            application.status = next;
            application.approved_amount = Some(terms.amount);
            application.approved_term_months = Some(terms.term_months);
            application.approved_rate = Some(terms.rate);
            application.monthly_payment = Some(monthly_payment);
            application.approved_by = Some(approver.to_string());
            application.approved_date = Some(now);
            application.decision_reason = Some(reason.to_string());
            application.decision_date = Some(now);
            application.current_step = "awaiting disbursement".to_string();
            Ok(Some(WorkflowEvent::Approve))
        })
    }

    pub fn reject(
        &self,
        id: &ApplicationId,
        reason: &str,
        rejecter: &str,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        if reason.trim().is_empty() {
            return Err(ApplicationServiceError::InvalidArgument {
                field: "reason",
                message: "a rejection reason is required".to_string(),
            });
        }
        self.apply(id, |application| {
            application.status = transition(application.status, WorkflowEvent::Reject)?;
            let now = Utc::now();
            application.rejected_by = Some(rejecter.to_string());
            application.rejected_date = Some(now);
            application.decision_reason = Some(reason.to_string());
            application.decision_date = Some(now);
            application.current_step = "closed".to_string();
            Ok(Some(WorkflowEvent::Reject))
        })
    }

    /// Pay out an approved application.
    pub fn disburse(
        &self,
        id: &ApplicationId,
        disburser: &str,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        self.apply(id, |application| {
            let next = transition(application.status, WorkflowEvent::Disburse)?;
            let amount = application.approved_amount.ok_or_else(|| {
                ApplicationServiceError::InvalidArgument {
                    field: "approved_amount",
                    message: "approval terms missing; cannot disburse".to_string(),
                }
            })?;
            let now = Utc::now();
            application.status = next;
            application.disbursed_by = Some(disburser.to_string());
            application.disbursed_date = Some(now);
            application.disbursed_amount = Some(amount);
            application.due_date = Some(now + Duration::days(DISBURSEMENT_GRACE_DAYS));
            application.current_step = "servicing handoff".to_string();
            Ok(Some(WorkflowEvent::Disburse))
        })
    }

    pub fn cancel(
        &self,
        id: &ApplicationId,
        reason: &str,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        self.apply(id, |application| {
            application.status = transition(application.status, WorkflowEvent::Cancel)?;
            let now = Utc::now();
            application.decision_reason = Some(reason.to_string());
            application.decision_date = Some(now);
            application.current_step = "closed".to_string();
            Ok(Some(WorkflowEvent::Cancel))
        })
    }

    /// Park the application while the applicant gathers what was asked for.
    pub fn request_additional_info(
        &self,
        id: &ApplicationId,
        info: &str,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        if info.trim().is_empty() {
            return Err(ApplicationServiceError::InvalidArgument {
                field: "info",
                message: "describe the information being requested".to_string(),
            });
        }
        self.apply(id, |application| {
            application.status = transition(application.status, WorkflowEvent::RequestInfo)?;
            application.decision_reason = Some(info.to_string());
            application.decision_date = Some(Utc::now());
            application.current_step = "awaiting applicant info".to_string();
            Ok(Some(WorkflowEvent::RequestInfo))
        })
    }

    /// Field mutation while the application is still editable, re-validated
    /// against the product envelope.
    pub fn update_draft(
        &self,
        id: &ApplicationId,
        update: &ApplicationUpdate,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        self.apply(id, |application| {
            transition(application.status, WorkflowEvent::Edit)?;

            let amount = update
                .requested_amount
                .unwrap_or(application.requested_amount);
            let term = update
                .requested_term_months
                .unwrap_or(application.requested_term_months);
            if amount < MINIMUM_REQUESTED_AMOUNT {
                return Err(ApplicationServiceError::InvalidArgument {
                    field: "requested_amount",
                    message: format!("must be at least {MINIMUM_REQUESTED_AMOUNT}"),
                });
            }
            if !(MIN_TERM_MONTHS..=MAX_TERM_MONTHS).contains(&term) {
                return Err(ApplicationServiceError::InvalidArgument {
                    field: "requested_term_months",
                    message: format!("must be between {MIN_TERM_MONTHS} and {MAX_TERM_MONTHS}"),
                });
            }
            let product = self.product_for(application)?;
            product
                .ensure_within_limits(amount, term)
                .map_err(ProductPolicyError::from)?;

            if let Some(income) = update.declared_income {
                if income.is_sign_negative() {
                    return Err(ApplicationServiceError::InvalidArgument {
                        field: "declared_income",
                        message: "must not be negative".to_string(),
                    });
                }
                application.declared_income = income;
            }
            if let Some(ratio) = update.debt_to_income_ratio {
                if ratio.is_sign_negative() {
                    return Err(ApplicationServiceError::InvalidArgument {
                        field: "debt_to_income_ratio",
                        message: "must not be negative".to_string(),
                    });
                }
                application.debt_to_income_ratio = Some(ratio);
            }
            if let Some(purpose) = &update.purpose {
                application.purpose = purpose.clone();
            }
            application.requested_amount = amount;
            application.requested_term_months = term;
            Ok(None)
        })
    }

    /// Route work to an operator; no lifecycle involvement.
    pub fn assign(
        &self,
        id: &ApplicationId,
        assignee: &str,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        if assignee.trim().is_empty() {
            return Err(ApplicationServiceError::InvalidArgument {
                field: "assignee",
                message: "must not be blank".to_string(),
            });
        }
        self.apply(id, |application| {
            application.assigned_to = Some(assignee.to_string());
            Ok(None)
        })
    }

    pub fn bulk_assign(
        &self,
        ids: &[ApplicationId],
        assignee: &str,
    ) -> Result<Vec<LoanApplication>, ApplicationServiceError> {
        ids.iter().map(|id| self.assign(id, assignee)).collect()
    }

    pub fn update_priority(
        &self,
        id: &ApplicationId,
        priority: u8,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(ApplicationServiceError::InvalidArgument {
                field: "priority",
                message: format!("must be between {MIN_PRIORITY} and {MAX_PRIORITY}"),
            });
        }
        self.apply(id, |application| {
            application.priority = priority;
            Ok(None)
        })
    }

    /// Product ceiling plus a clear underwriting recommendation.
    pub fn check_auto_approval_eligibility(
        &self,
        id: &ApplicationId,
    ) -> Result<bool, ApplicationServiceError> {
        let application = self.load(id)?;
        let product = self.product_for(&application)?;
        if !product.eligible_for_auto_approval(application.requested_amount) {
            return Ok(false);
        }
        let assessment = self.engine.assess(&application, &product);
        Ok(matches!(
            assessment.recommendation,
            UnderwritingRecommendation::Clear
        ))
    }

    /// Approve on requested terms at the product's default rate when
    /// eligible; otherwise the application is returned untouched.
    pub fn process_auto_approval(
        &self,
        id: &ApplicationId,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        if !self.check_auto_approval_eligibility(id)? {
            let application = self.load(id)?;
            debug!(
                application_number = %application.application_number,
                "auto-approval skipped: application is not eligible"
            );
            return Ok(application);
        }

        let application = self.load(id)?;
        let product = self.product_for(&application)?;
        let terms = ApprovalTerms {
            amount: application.requested_amount,
            term_months: application.requested_term_months,
            rate: product.default_interest_rate,
        };
        self.approve(id, terms, "auto-approved within product limits", SYSTEM_ACTOR)
    }

    /// Flag a record out of the active queues; history is kept.
    pub fn soft_delete(
        &self,
        id: &ApplicationId,
    ) -> Result<LoanApplication, ApplicationServiceError> {
        let existing = self.load_any(id)?;
        if existing.is_deleted {
            return Ok(existing);
        }
        self.apply(id, |application| {
            application.is_deleted = true;
            Ok(None)
        })
    }

    pub fn restore(&self, id: &ApplicationId) -> Result<LoanApplication, ApplicationServiceError> {
        let existing = self.load_any(id)?;
        if !existing.is_deleted {
            return Ok(existing);
        }
        self.apply_any(id, |application| {
            application.is_deleted = false;
            Ok(None)
        })
    }

    /// The schedule contract exposed to the request layer; pure passthrough.
    pub fn payment_schedule(
        &self,
        principal: Decimal,
        term_months: u32,
        annual_rate: Decimal,
    ) -> Result<Vec<ScheduleLine>, ApplicationServiceError> {
        Ok(amortization::amortization_schedule(
            principal,
            term_months,
            annual_rate,
        )?)
    }

    fn load(&self, id: &ApplicationId) -> Result<LoanApplication, ApplicationServiceError> {
        match self.repository.fetch(id)? {
            Some(application) if !application.is_deleted => Ok(application),
            _ => Err(ApplicationServiceError::ApplicationNotFound(id.clone())),
        }
    }

    fn load_any(&self, id: &ApplicationId) -> Result<LoanApplication, ApplicationServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| ApplicationServiceError::ApplicationNotFound(id.clone()))
    }

    fn product_for(
        &self,
        application: &LoanApplication,
    ) -> Result<LoanProduct, ApplicationServiceError> {
        self.products
            .fetch(&application.product_id)?
            .ok_or_else(|| {
                ApplicationServiceError::ProductNotFound(application.product_id.clone())
            })
    }

    /// Load, mutate a copy, save optimistically; one retry against a fresh
    /// read when another operator got there first. Nothing is stored when
    /// the closure refuses, so failed operations leave the record untouched.
    fn apply<F>(
        &self,
        id: &ApplicationId,
        op: F,
    ) -> Result<LoanApplication, ApplicationServiceError>
    where
        F: Fn(&mut LoanApplication) -> Result<Option<WorkflowEvent>, ApplicationServiceError>,
    {
        self.apply_inner(id, false, op)
    }

    fn apply_any<F>(
        &self,
        id: &ApplicationId,
        op: F,
    ) -> Result<LoanApplication, ApplicationServiceError>
    where
        F: Fn(&mut LoanApplication) -> Result<Option<WorkflowEvent>, ApplicationServiceError>,
    {
        self.apply_inner(id, true, op)
    }

    fn apply_inner<F>(
        &self,
        id: &ApplicationId,
        include_deleted: bool,
        op: F,
    ) -> Result<LoanApplication, ApplicationServiceError>
    where
        F: Fn(&mut LoanApplication) -> Result<Option<WorkflowEvent>, ApplicationServiceError>,
    {
        let mut retried = false;
        loop {
            let mut application = if include_deleted {
                self.load_any(id)?
            } else {
                self.load(id)?
            };
            let event = op(&mut application)?;
            application.touch(Utc::now());

            match self.repository.update(application) {
                Ok(saved) => {
                    if let Some(event) = event {
                        info!(
                            application_number = %saved.application_number,
                            status = saved.status.label(),
                            event = event.label(),
                            "application transitioned"
                        );
                        self.notify(&saved, event);
                    }
                    return Ok(saved);
                }
                Err(RepositoryError::Conflict) if !retried => {
                    retried = true;
                    continue;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn notify(&self, application: &LoanApplication, event: WorkflowEvent) {
        let mut details = BTreeMap::new();
        if let Some(reason) = &application.decision_reason {
            details.insert("reason".to_string(), reason.clone());
        }
        if let Some(payment) = application.monthly_payment {
            details.insert("monthly_payment".to_string(), payment.to_string());
        }

        let notice = StatusChangeNotice {
            application_id: application.id.clone(),
            application_number: application.application_number.clone(),
            status: application.status,
            event: event.label(),
            details,
        };
        if let Err(error) = self.notifications.publish(notice) {
            warn!(
                application_number = %application.application_number,
                %error,
                "status change notification failed"
            );
        }
    }
}
