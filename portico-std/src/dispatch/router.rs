//! Driver-facing access to output devices.

use crate::registration::Registration;
use futures::future::join_all;
use portico_core::{
    BoxFuture, Context, DeliveryError, DynOutputDevice, OutputDeliverer, Packet,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes driver commands to output devices.
///
/// Each command is encoded with the target device's encoder, processed by the
/// device, and any reply frame is decoded with the device's decoder.
pub struct OutputRouter<'a> {
    registration: &'a Registration,
    ctx: &'a Context,
}

impl<'a> OutputRouter<'a> {
    /// A router over `registration`'s output devices.
    pub fn new(registration: &'a Registration, ctx: &'a Context) -> Self {
        Self { registration, ctx }
    }

    async fn send(
        &self,
        device: &Arc<dyn DynOutputDevice>,
        packet: Packet,
    ) -> Result<Option<Packet>, DeliveryError> {
        let base = device.base();
        let uuid = || base.address().uuid.clone();

        let encoder = base.encoder().ok_or_else(|| DeliveryError::Encode {
            uuid: uuid(),
            source: "no encoder bound".into(),
        })?;
        let frame = encoder
            .encode(packet)
            .map_err(|source| DeliveryError::Encode { uuid: uuid(), source })?;

        let response = device
            .process_dyn(frame, self.ctx)
            .await
            .map_err(|source| DeliveryError::Device { uuid: uuid(), source })?;

        let Some(response) = response else {
            return Ok(None);
        };
        let decoder = base.decoder().ok_or_else(|| DeliveryError::Decode {
            uuid: uuid(),
            source: "no decoder bound".into(),
        })?;
        decoder
            .decode(response)
            .map(Some)
            .map_err(|source| DeliveryError::Decode { uuid: uuid(), source })
    }
}

impl OutputDeliverer for OutputRouter<'_> {
    fn broadcast<'b>(&'b self, topic: &'b str, packet: Packet) -> BoxFuture<'b, usize> {
        Box::pin(async move {
            let sends = self.registration.outputs_matching(topic).map(move |device| {
                let packet = packet.clone();
                async move { (device, self.send(device, packet).await) }
            });

            let mut accepted = 0;
            for (device, result) in join_all(sends).await {
                match result {
                    Ok(_) => accepted += 1,
                    Err(error) => warn!(
                        topic,
                        uuid = %device.base().address().uuid,
                        %error,
                        "broadcast to output device failed"
                    ),
                }
            }
            debug!(topic, accepted, "broadcast finished");
            accepted
        })
    }

    fn deliver<'b>(
        &'b self,
        uuid: &'b str,
        packet: Packet,
    ) -> BoxFuture<'b, Result<Option<Packet>, DeliveryError>> {
        Box::pin(async move {
            let device = self
                .registration
                .output_device(uuid)
                .ok_or_else(|| DeliveryError::UnknownDevice(uuid.to_string()))?;
            self.send(device, packet).await
        })
    }
}
