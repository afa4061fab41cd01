// Restaurant endpoints

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{CreateRestaurantRequest, RestaurantDto};

impl ApiClient {
    /// List every restaurant with its branches and online/offline counts.
    ///
    /// `GET /api/restaurants/restaurants/`
    pub async fn list_restaurants(&self) -> Result<Vec<RestaurantDto>, Error> {
        let url = self.api_url("restaurants/restaurants/")?;
        debug!("listing restaurants");
        self.get(url).await
    }

    /// Create a restaurant.
    ///
    /// `POST /api/restaurants/restaurants/` with `{"name": "..."}`
    pub async fn create_restaurant(&self, name: &str) -> Result<RestaurantDto, Error> {
        let url = self.api_url("restaurants/restaurants/")?;
        debug!(name, "creating restaurant");
        self.post(
            url,
            &CreateRestaurantRequest {
                name: name.to_owned(),
            },
        )
        .await
    }

    /// Delete a restaurant (the backend cascades to its branches).
    ///
    /// `DELETE /api/restaurants/restaurants/{id}/`
    pub async fn delete_restaurant(&self, id: i64) -> Result<(), Error> {
        let url = self.api_url(&format!("restaurants/restaurants/{id}/"))?;
        debug!(id, "deleting restaurant");
        self.delete(url).await
    }
}
