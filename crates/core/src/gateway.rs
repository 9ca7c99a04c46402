use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::line_item::{LineItem, PicklistOptions, SubstituteProduct};
use crate::domain::opportunity::{Opportunity, OpportunityId};
use crate::domain::request::{RemoteErrorBody, SubmissionRequest, SubmissionResult};
use crate::errors::{DraftStoreError, RemoteFailure};

/// Remote data and submission calls the wizard depends on.
#[async_trait]
pub trait ChangeOrderService: Send + Sync {
    async fn get_candidate_records(
        &self,
        account_key: &str,
    ) -> Result<Vec<Opportunity>, RemoteFailure>;
    async fn get_picklist_options(&self) -> Result<PicklistOptions, RemoteFailure>;
    async fn get_line_items(
        &self,
        opportunity_ids: &[OpportunityId],
    ) -> Result<Vec<LineItem>, RemoteFailure>;
    async fn get_substitute_products(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<SubstituteProduct>, RemoteFailure>;
    async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionResult, RemoteFailure>;
}

/// Opaque draft blobs keyed by account.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn load(&self, account_key: &str) -> Result<Option<String>, DraftStoreError>;
    async fn save(&self, account_key: &str, blob: &str) -> Result<(), DraftStoreError>;
    async fn discard(&self, account_key: &str) -> Result<(), DraftStoreError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SubmissionReply {
    Result(SubmissionResult),
    Reject(RemoteErrorBody),
}

impl Default for SubmissionReply {
    fn default() -> Self {
        Self::Result(SubmissionResult::default())
    }
}

/// Calls that should fail when served from a fixture.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixtureFailures {
    pub candidates: Option<RemoteErrorBody>,
    pub picklists: Option<RemoteErrorBody>,
    pub line_items: Option<RemoteErrorBody>,
    pub substitute_products: Vec<OpportunityId>,
}

/// Canned data for [`InMemoryChangeOrderService`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceFixture {
    pub account_key: Option<String>,
    pub candidates: Vec<Opportunity>,
    pub picklists: PicklistOptions,
    pub line_items: Vec<LineItem>,
    pub substitute_products: BTreeMap<OpportunityId, Vec<SubstituteProduct>>,
    pub submission: SubmissionReply,
    pub failures: FixtureFailures,
}

impl ServiceFixture {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Default)]
pub struct InMemoryChangeOrderService {
    fixture: RwLock<ServiceFixture>,
    submissions: RwLock<Vec<SubmissionRequest>>,
    line_item_requests: RwLock<Vec<Vec<OpportunityId>>>,
    substitute_requests: RwLock<Vec<OpportunityId>>,
}

impl InMemoryChangeOrderService {
    pub fn new(fixture: ServiceFixture) -> Self {
        Self { fixture: RwLock::new(fixture), ..Self::default() }
    }

    pub async fn set_submission_reply(&self, reply: SubmissionReply) {
        self.fixture.write().await.submission = reply;
    }

    pub async fn submissions(&self) -> Vec<SubmissionRequest> {
        self.submissions.read().await.clone()
    }

    pub async fn line_item_requests(&self) -> Vec<Vec<OpportunityId>> {
        self.line_item_requests.read().await.clone()
    }

    pub async fn substitute_requests(&self) -> Vec<OpportunityId> {
        self.substitute_requests.read().await.clone()
    }
}

fn reject_with(body: &Option<RemoteErrorBody>) -> Result<(), RemoteFailure> {
    match body {
        Some(body) => Err(RemoteFailure::with_body(body.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl ChangeOrderService for InMemoryChangeOrderService {
    async fn get_candidate_records(
        &self,
        _account_key: &str,
    ) -> Result<Vec<Opportunity>, RemoteFailure> {
        let fixture = self.fixture.read().await;
        reject_with(&fixture.failures.candidates)?;
        Ok(fixture.candidates.clone())
    }

    async fn get_picklist_options(&self) -> Result<PicklistOptions, RemoteFailure> {
        let fixture = self.fixture.read().await;
        reject_with(&fixture.failures.picklists)?;
        Ok(fixture.picklists.clone())
    }

    async fn get_line_items(
        &self,
        opportunity_ids: &[OpportunityId],
    ) -> Result<Vec<LineItem>, RemoteFailure> {
        self.line_item_requests.write().await.push(opportunity_ids.to_vec());
        let fixture = self.fixture.read().await;
        reject_with(&fixture.failures.line_items)?;
        Ok(fixture
            .line_items
            .iter()
            .filter(|item| opportunity_ids.contains(&item.opportunity_id))
            .cloned()
            .collect())
    }

    async fn get_substitute_products(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<SubstituteProduct>, RemoteFailure> {
        self.substitute_requests.write().await.push(opportunity_id.clone());
        let fixture = self.fixture.read().await;
        if fixture.failures.substitute_products.contains(opportunity_id) {
            return Err(RemoteFailure::with_message(format!(
                "product lookup failed for {opportunity_id}"
            )));
        }
        Ok(fixture.substitute_products.get(opportunity_id).cloned().unwrap_or_default())
    }

    async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionResult, RemoteFailure> {
        self.submissions.write().await.push(request);
        match &self.fixture.read().await.submission {
            SubmissionReply::Result(result) => Ok(result.clone()),
            SubmissionReply::Reject(body) => Err(RemoteFailure::with_body(body.clone())),
        }
    }
}

#[derive(Default)]
pub struct InMemoryDraftStore {
    drafts: RwLock<HashMap<String, String>>,
    unavailable: bool,
}

impl InMemoryDraftStore {
    /// A store whose every call fails, for exercising best-effort draft paths.
    pub fn unavailable() -> Self {
        Self { drafts: RwLock::new(HashMap::new()), unavailable: true }
    }

    pub async fn seed(&self, account_key: &str, blob: &str) {
        self.drafts.write().await.insert(account_key.to_owned(), blob.to_owned());
    }

    pub async fn get(&self, account_key: &str) -> Option<String> {
        self.drafts.read().await.get(account_key).cloned()
    }

    fn check_available(&self) -> Result<(), DraftStoreError> {
        if self.unavailable {
            return Err(DraftStoreError::Storage("draft store unavailable".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn load(&self, account_key: &str) -> Result<Option<String>, DraftStoreError> {
        self.check_available()?;
        Ok(self.drafts.read().await.get(account_key).cloned())
    }

    async fn save(&self, account_key: &str, blob: &str) -> Result<(), DraftStoreError> {
        self.check_available()?;
        self.drafts.write().await.insert(account_key.to_owned(), blob.to_owned());
        Ok(())
    }

    async fn discard(&self, account_key: &str) -> Result<(), DraftStoreError> {
        self.check_available()?;
        self.drafts.write().await.remove(account_key);
        Ok(())
    }
}
