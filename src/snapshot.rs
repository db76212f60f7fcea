use crate::gateway::{GatewayError, NodeClient};
use crate::types::GameSnapshot;

/// One document fetching everything a screen renders. Reading it in a
/// single round trip is what makes a refresh atomic from the reconciler's
/// point of view.
pub const SNAPSHOT_QUERY: &str = "query { \
    room { roomId hostChainId status gameState \
           players { chainId name boardSubmitted } \
           currentAttacker pendingAttack { row col } winnerChainId } \
    myBoard { size cells { row col shipId attacked } ships { id cells { row col } } } \
    enemyView { size cells } \
    isMyTurn hasSubmittedBoard lastNotification }";

pub async fn fetch(client: &NodeClient, chain_id: &str) -> Result<GameSnapshot, GatewayError> {
    let data = client.query(chain_id, SNAPSHOT_QUERY).await?;
    serde_json::from_value(data)
        .map_err(|e| GatewayError::Remote(format!("malformed snapshot: {e}")))
}
