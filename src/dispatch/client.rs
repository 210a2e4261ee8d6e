use crate::dispatch::{DeviceEvent, DispatchError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::instrument;

/// Cloneable sending half of the event channel.
///
/// Handed to the button watchers and the signal handler. Sending never waits
/// for the session to run, only for channel capacity.
#[derive(Debug, Clone)]
pub struct EventClient {
    sender: mpsc::Sender<DeviceEvent>,
}

impl EventClient {
    pub fn new(sender: mpsc::Sender<DeviceEvent>) -> Self {
        Self { sender }
    }

    /// A client and the receiver it feeds.
    pub fn channel(buffer_size: usize) -> (Self, mpsc::Receiver<DeviceEvent>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self::new(sender), receiver)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn send(&self, event: DeviceEvent) -> Result<(), DispatchError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| DispatchError::ActorClosed)
    }

    pub async fn shutter_pressed(&self) -> Result<(), DispatchError> {
        self.send(DeviceEvent::ShutterPressed).await
    }

    pub async fn hold_confirmed(&self, held: Duration) -> Result<(), DispatchError> {
        self.send(DeviceEvent::HoldConfirmed { held }).await
    }

    pub async fn interrupt(&self) -> Result<(), DispatchError> {
        self.send(DeviceEvent::Interrupt).await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_order() {
        let (client, mut receiver) = EventClient::channel(4);
        client.shutter_pressed().await.unwrap();
        client.hold_confirmed(Duration::from_secs(2)).await.unwrap();
        client.interrupt().await.unwrap();

        assert_eq!(receiver.recv().await, Some(DeviceEvent::ShutterPressed));
        assert_eq!(
            receiver.recv().await,
            Some(DeviceEvent::HoldConfirmed {
                held: Duration::from_secs(2)
            })
        );
        assert_eq!(receiver.recv().await, Some(DeviceEvent::Interrupt));
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_fails() {
        let (client, receiver) = EventClient::channel(1);
        drop(receiver);
        assert!(client.is_closed());
        assert_eq!(client.shutter_pressed().await, Err(DispatchError::ActorClosed));
    }
}
