use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;

use changeorder_core::config::WizardConfig;
use changeorder_core::domain::change::ChangeType;
use changeorder_core::domain::dates::FixedClock;
use changeorder_core::domain::opportunity::{Opportunity, OpportunityId};
use changeorder_core::flows::WizardStep;
use changeorder_core::gateway::{InMemoryChangeOrderService, ServiceFixture};
use changeorder_core::signals::InMemorySignalSink;
use changeorder_core::wizard::{WizardController, WizardServices, WizardSetup};
use changeorder_db::{connect_with_settings, migrations, SqlDraftStore};

const ACCOUNT: &str = "001000000000001AAA";
const OPPORTUNITY: &str = "006000000000001AAA";

fn fixture() -> ServiceFixture {
    ServiceFixture {
        candidates: vec![Opportunity {
            id: OpportunityId::new(OPPORTUNITY),
            name: "Acme Renewal".to_owned(),
            stage: "Closed Won".to_owned(),
            amount: None,
            close_date: None,
            quote_number: None,
        }],
        ..ServiceFixture::default()
    }
}

async fn controller(database_url: &str) -> (WizardController, SqlDraftStore) {
    let pool = connect_with_settings(database_url, 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    let drafts = SqlDraftStore::new(pool);
    let services = WizardServices::new(
        Arc::new(InMemoryChangeOrderService::new(fixture())),
        Arc::new(drafts.clone()),
        Arc::new(InMemorySignalSink::default()),
    )
    .with_clock(Arc::new(FixedClock(NaiveDate::from_ymd_opt(2026, 10, 19).expect("date"))));
    let setup = WizardSetup { account_id: Some(ACCOUNT.to_owned()), ..WizardSetup::default() };
    (WizardController::new(WizardConfig::default(), setup, services), drafts)
}

#[tokio::test]
async fn draft_survives_a_new_connection_pool() {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("drafts.db").display());

    let (mut first, _) = controller(&url).await;
    first.initialize().await;
    first.toggle_opportunity(&OpportunityId::new(OPPORTUNITY));
    first.toggle_change_type(ChangeType::CoTermContracts);
    first.next().await.expect("review");
    first.save_draft().await.expect("save draft");

    let (mut second, drafts) = controller(&url).await;
    let stored = drafts.find(ACCOUNT).await.expect("find").expect("stored draft");
    assert_eq!(stored.current_step, Some(3));

    second.initialize().await;
    assert_eq!(second.current_step(), WizardStep::Review);
    assert_eq!(second.state().selection, vec![OpportunityId::new(OPPORTUNITY)]);
}
