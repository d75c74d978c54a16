//! Full reads over the offset-paged list endpoints.

use wallarm_core::RuleRecord;

use crate::api::RulesApi;
use crate::error::Result;
use crate::models::{ActionRead, ActionSummary, HintRead};

/// Read every rule matching `query`, following offsets until a short page.
pub async fn read_all_rules<A>(api: &A, query: &HintRead) -> Result<Vec<RuleRecord>>
where
    A: RulesApi + ?Sized,
{
    let limit = query.limit.max(1);
    let mut all = Vec::new();
    let mut offset = query.offset;
    loop {
        let page = query.clone().page(limit, offset);
        let records = api.read_rules(&page).await?;
        let fetched = records.len();
        all.extend(records);
        tracing::trace!(offset, fetched, total = all.len(), "read rule page");
        if fetched < limit as usize {
            break;
        }
        offset += limit;
    }
    Ok(all)
}

/// Read every action matching `query`, following offsets until a short page.
pub async fn read_all_actions<A>(api: &A, query: &ActionRead) -> Result<Vec<ActionSummary>>
where
    A: RulesApi + ?Sized,
{
    let limit = query.limit.max(1);
    let mut all = Vec::new();
    let mut offset = query.offset;
    loop {
        let page = query.clone().page(limit, offset);
        let actions = api.read_actions(&page).await?;
        let fetched = actions.len();
        all.extend(actions);
        tracing::trace!(offset, fetched, total = all.len(), "read action page");
        if fetched < limit as usize {
            break;
        }
        offset += limit;
    }
    Ok(all)
}
