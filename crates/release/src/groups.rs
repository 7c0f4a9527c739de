//! Distribution group resolution and attachment.

use appdist_transport::Transport;
use tracing::{debug, info};

use crate::api::DistributionApi;
use crate::error::ReleaseError;
use crate::types::{DistributionGroup, EventSink, ReleaseEvent};

/// Looks up every target name, one call per name, in order.
///
/// All-or-nothing: the first failed lookup aborts and nothing is returned.
pub async fn resolve_groups<T: Transport>(
    api: &DistributionApi<T>,
    names: &[String],
) -> Result<Vec<DistributionGroup>, ReleaseError> {
    let mut groups = Vec::with_capacity(names.len());
    for name in names {
        let group = api.distribution_group(name).await?;
        debug!(name = %name, id = %group.id, "resolved distribution group");
        groups.push(DistributionGroup {
            name: name.clone(),
            id: group.id,
        });
    }
    Ok(groups)
}

/// Attaches each resolved group to `release_id`, returning the attached names.
pub async fn attach_groups<T: Transport>(
    api: &DistributionApi<T>,
    release_id: u64,
    groups: &[DistributionGroup],
    notify_testers: bool,
    events: &EventSink,
) -> Result<Vec<String>, ReleaseError> {
    let mut attached = Vec::with_capacity(groups.len());
    for group in groups {
        api.add_distribution_group(release_id, &group.id, notify_testers)
            .await?;
        info!(release_id, group = %group.name, notify_testers, "distributed release");
        events
            .emit(ReleaseEvent::GroupAttached {
                name: group.name.clone(),
            })
            .await;
        attached.push(group.name.clone());
    }
    Ok(attached)
}
