//! Startup provisioning.

use sso_core::error::SsoResult;
use sso_core::models::app::CreateApp;
use sso_core::repository::AppRepository;

/// Create each listed application unless one with the same name exists.
///
/// Existing applications are left untouched, secrets included, so
/// restarting with the same list is a no-op. Returns how many were
/// created.
pub async fn provision_apps<A: AppRepository>(repo: &A, apps: &[CreateApp]) -> SsoResult<usize> {
    let mut created = 0;

    for input in apps {
        match repo.get_by_name(&input.name).await {
            Ok(existing) => {
                tracing::debug!(
                    app_id = existing.id,
                    name = %existing.name,
                    "App already provisioned"
                );
            }
            Err(e) if e.is_not_found() => {
                let app = repo.create(input.clone()).await?;
                tracing::info!(app_id = app.id, name = %app.name, "Provisioned app");
                created += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(created)
}
