use serde::Deserialize;

use crate::auth::RequestContext;
use crate::database::{InventoryItem, NewInventoryItem};
use crate::error::RpcError;
use crate::rpc::{FieldErrors, NoInput, Validate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemInput {
    pub item_id: String,
    pub item_name: String,
    pub item_type: Option<String>,
    pub quantity: Option<i32>,
}

impl Validate for AddItemInput {
    fn validate(&self) -> Result<(), RpcError> {
        FieldErrors::new()
            .required("itemId", &self.item_id, 100)
            .required("itemName", &self.item_name, 255)
            .optional_max_len("itemType", self.item_type.as_deref(), 100)
            .at_least("quantity", self.quantity, 1)
            .finish()
    }
}

/// inventory.getItems
pub async fn get_items(state: AppState, ctx: RequestContext, _input: NoInput) -> Result<Vec<InventoryItem>, RpcError> {
    let user = ctx.require_user()?;
    Ok(state.store.inventory_for_user(user.id).await?)
}

/// inventory.addItem - always a new row for the caller
pub async fn add_item(state: AppState, ctx: RequestContext, input: AddItemInput) -> Result<InventoryItem, RpcError> {
    let user = ctx.require_user()?;
    let item = NewInventoryItem {
        item_id: input.item_id.trim().to_string(),
        item_name: input.item_name.trim().to_string(),
        item_type: input.item_type,
        quantity: input.quantity.unwrap_or(1),
    };
    Ok(state.store.add_inventory_item(user.id, item).await?)
}
