//! Client → server frames on the duplex connection.
//!
//! Every frame is a JSON object with a `type` discriminator. Outbound frames are produced
//! by whoever calls [`Hub::send_to_user`](crate::Hub::send_to_user) and are forwarded as-is.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundFrame {
    #[serde(rename_all = "camelCase")]
    Chat { to_user_id: Uuid, content: String },
    #[serde(rename_all = "camelCase")]
    Typing { to_user_id: Uuid },
}
