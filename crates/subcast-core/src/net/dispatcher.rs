//! Outbound notification dispatch
//!
//! Turns a notify decision into a best-effort datagram send over the
//! category's subscribe endpoint, with a retry policy differentiated by
//! failure class:
//!
//! - short send: logged, treated as success (no retry);
//! - disconnect-class failure: the endpoint is rebuilt and the same send is
//!   retried until it either completes or fails differently;
//! - anything else (including a send buffer that would block): logged, the
//!   notification is abandoned. UDP gives no delivery guarantee anyway.

use tracing::{error, info, warn};

use super::endpoint::Endpoint;
use super::is_disconnect;
use super::wire::encode_key;
use crate::category::Notification;

/// Sends notify decisions as UDP datagrams
#[derive(Debug, Default)]
pub struct Dispatcher;

impl Dispatcher {
    /// Create a dispatcher
    pub fn new() -> Self {
        Self
    }

    /// Send one notification over `endpoint`, best effort
    pub async fn dispatch(&self, endpoint: &mut Endpoint, notification: &Notification) {
        let payload = encode_key(&notification.key);

        loop {
            let Some(socket) = endpoint.socket() else {
                warn!(
                    target = %notification.target,
                    "Cannot send notification, endpoint is not bound"
                );
                return;
            };

            match socket.try_send_to(&payload, notification.target) {
                Ok(sent) if sent < payload.len() => {
                    warn!(
                        target = %notification.target,
                        sent,
                        expected = payload.len(),
                        "Short send on notification"
                    );
                    return;
                }
                Ok(_) => {
                    info!(
                        target = %notification.target,
                        key = %notification.key,
                        "Sent notification"
                    );
                    return;
                }
                Err(e) if is_disconnect(&e) => {
                    error!(
                        target = %notification.target,
                        "Socket is not connected/shut down, attempting to bind again"
                    );
                    endpoint.rebind().await;
                }
                Err(e) => {
                    warn!(target = %notification.target, error = %e, "Cannot send notification");
                    return;
                }
            }
        }
    }
}
