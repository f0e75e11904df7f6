// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::auth::AuthContext;
use crate::config::ApiConfig;
use crate::error::CatalogError;
use crate::http::{ApiRequest, HttpClient, request_json};

use super::parse::{Batch, Subject, parse_batches, parse_subjects};

/// Filter parameters sent with batch listing and batch details requests
fn batch_filter(config: &ApiConfig) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "1".to_string()),
        ("filter", "false".to_string()),
        ("exam", String::new()),
        ("amount", String::new()),
        ("organisationId", config.organization_id.clone()),
        ("classes", String::new()),
        ("limit", "50".to_string()),
        ("page", "1".to_string()),
        ("programId", String::new()),
    ]
}

/// Fetch the batches the authenticated user is enrolled in
pub async fn list_batches<C: HttpClient + ?Sized>(
    client: &C,
    config: &ApiConfig,
    auth: &AuthContext,
) -> Result<Vec<Batch>, CatalogError> {
    let request = ApiRequest::get(config.v3("batches/my-batches"))
        .query(batch_filter(config))
        .headers(auth.headers())
        .timeout(config.timeout);

    let data = request_json(client, &request)
        .await
        .map_err(CatalogError::Batches)?;

    let batches = parse_batches(&data);
    if batches.is_empty() {
        return Err(CatalogError::NoBatchesFound);
    }

    tracing::debug!(count = batches.len(), "batches listed");
    Ok(batches)
}

/// Fetch the subjects of one batch
///
/// The id is used as given; it does not have to appear in a prior listing.
pub async fn list_subjects<C: HttpClient + ?Sized>(
    client: &C,
    config: &ApiConfig,
    auth: &AuthContext,
    batch_id: &str,
) -> Result<Vec<Subject>, CatalogError> {
    let request = ApiRequest::get(config.v3(&format!("batches/{batch_id}/details")))
        .query(batch_filter(config))
        .headers(auth.headers())
        .timeout(config.timeout);

    let data = request_json(client, &request)
        .await
        .map_err(CatalogError::Details)?;

    let subjects = parse_subjects(&data);
    if subjects.is_empty() {
        return Err(CatalogError::NoSubjectsFound);
    }

    tracing::debug!(batch_id, count = subjects.len(), "subjects listed");
    Ok(subjects)
}
