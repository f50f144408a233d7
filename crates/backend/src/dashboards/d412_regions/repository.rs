use contracts::dashboards::d412_regions::{
    RegionRow, RegionsMetricsRow, METRICS_RPC, PERFORMANCE_RPC,
};
use contracts::shared::filters::ReportFilters;

use crate::dashboards::rpc_params;
use crate::shared::data::{BackendError, PostgrestClient};

pub async fn performance(
    client: &PostgrestClient,
    filters: &ReportFilters,
) -> Result<Vec<RegionRow>, BackendError> {
    client.rpc(PERFORMANCE_RPC, &rpc_params(filters)).await
}

pub async fn metrics(
    client: &PostgrestClient,
    filters: &ReportFilters,
) -> Result<Option<RegionsMetricsRow>, BackendError> {
    let rows: Vec<RegionsMetricsRow> = client.rpc(METRICS_RPC, &rpc_params(filters)).await?;
    Ok(rows.into_iter().next())
}
