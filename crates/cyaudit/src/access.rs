//! Auditor access for a freshly provisioned repository.
//!
//! Runs after the repository has been populated, so a failed grant is
//! reported but never undoes the provisioning.

use log::{info, warn};

use crate::error::ProvisionError;
use crate::hosting::{Permission, RemoteHost, RemoteRepository};

/// Permission auditors get on the audit repository.
pub const AUDITOR_PERMISSION: Permission = Permission::Push;

/// Result of granting access to a list of auditors.
#[derive(Debug, Default)]
pub struct AccessReport {
    pub granted: Vec<String>,
    pub failed: Vec<(String, ProvisionError)>,
}

impl AccessReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Adds every auditor as a collaborator. Blank and duplicate names are skipped.
pub async fn grant_auditor_access(
    host: &dyn RemoteHost,
    repository: &RemoteRepository,
    auditors: &[String],
) -> AccessReport {
    let mut report = AccessReport::default();

    for auditor in auditors {
        let auditor = auditor.trim();
        if auditor.is_empty()
            || report.granted.iter().any(|g| g == auditor)
            || report.failed.iter().any(|(f, _)| f == auditor)
        {
            continue;
        }

        match host
            .add_collaborator(repository, auditor, AUDITOR_PERMISSION)
            .await
        {
            Ok(()) => {
                info!(
                    "Granted {} access on {} to {}",
                    AUDITOR_PERMISSION,
                    repository.full_name(),
                    auditor
                );
                report.granted.push(auditor.to_string());
            }
            Err(e) => {
                warn!("Could not add {} to {}: {}", auditor, repository.full_name(), e);
                report.failed.push((auditor.to_string(), e));
            }
        }
    }

    report
}
