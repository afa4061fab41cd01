// Branch endpoints

use serde_json::json;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{BranchDto, CheckStatusResponse, CreateBranchRequest};

impl ApiClient {
    /// List every branch the operator can see.
    ///
    /// `GET /api/restaurants/branches/`
    pub async fn list_branches(&self) -> Result<Vec<BranchDto>, Error> {
        let url = self.api_url("restaurants/branches/")?;
        debug!("listing branches");
        self.get(url).await
    }

    /// Create a branch under an existing restaurant.
    ///
    /// `POST /api/restaurants/branches/`
    pub async fn create_branch(&self, request: &CreateBranchRequest) -> Result<BranchDto, Error> {
        let url = self.api_url("restaurants/branches/")?;
        debug!(restaurant = request.restaurant, name = %request.name, "creating branch");
        self.post(url, request).await
    }

    /// Delete a branch.
    ///
    /// `DELETE /api/restaurants/branches/{id}/`
    pub async fn delete_branch(&self, id: i64) -> Result<(), Error> {
        let url = self.api_url(&format!("restaurants/branches/{id}/"))?;
        debug!(id, "deleting branch");
        self.delete(url).await
    }

    /// Ask the backend to probe every platform for one branch.
    ///
    /// `POST /api/restaurants/branches/{id}/check_status/` with `{}`. The
    /// call blocks until the backend has finished scraping.
    pub async fn check_branch_status(&self, id: i64) -> Result<CheckStatusResponse, Error> {
        let url = self.api_url(&format!("restaurants/branches/{id}/check_status/"))?;
        debug!(id, "checking branch status");
        self.post(url, &json!({})).await
    }
}
