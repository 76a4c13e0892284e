use futures::prelude::*;

use message::{
    Command,
    Environment,
    Orientation,
    Packet,
    Position,
};

/// Simulated microcontroller end of the link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Device {
    pub orientation: Orientation,
    pub environment: Environment,
    pub position:    Position,
}

impl Default for Device {
    fn default() -> Self {
        Device {
            orientation: Orientation::new(0.0, 0.0),
            environment: Environment::new(20.0, 50.0),
            position:    Position::new(40.972975, -76.886064),
        }
    }
}

impl Device {
    /// Reply to a single packet. Acks and nacks are never answered.
    pub fn respond(&mut self, packet: &Packet) -> Option<Packet> {
        let reply = match *packet {
            Packet::EstablishConnection => Packet::ack(Command::EstablishConnection),

            Packet::OrientationSet(o) if reachable(&o) => {
                self.orientation = o;
                Packet::ack(Command::OrientationSet)
            },

            Packet::OrientationRead => Packet::OrientationResponse(self.orientation),
            Packet::EnvRead => Packet::EnvResponse(self.environment),
            Packet::GpsRead => Packet::GpsResponse(self.position),

            Packet::Ack {
                ..
            }
            | Packet::Nack {
                ..
            } => return None,

            Packet::OrientationSet(_)
            | Packet::OrientationResponse(_)
            | Packet::EnvResponse(_)
            | Packet::GpsResponse(_) => Packet::nack(packet.command()),
        };

        Some(reply)
    }
}

fn reachable(o: &Orientation) -> bool {
    o.azimuth.is_finite() && (-90.0..=90.0).contains(&o.elevation)
}

/// Answer everything read from `reader` until it ends.
#[tracing::instrument(skip_all, err(Display))]
pub async fn serve<R, W>(device: &mut Device, mut reader: R, mut writer: W) -> Result<(), codec::Error>
where
    R: Stream<Item = Result<Packet, codec::Error>> + Unpin,
    W: Sink<Packet, Error = codec::Error> + Unpin,
{
    while let Some(packet) = reader.next().await {
        let packet = packet?;
        tracing::debug!(packet = %packet, "received");

        match device.respond(&packet) {
            Some(reply) => {
                tracing::debug!(reply = %reply, "replying");
                writer.send(reply).await?;
            },
            None => tracing::trace!("no reply"),
        }
    }

    tracing::info!("link closed");

    Ok(())
}

#[cfg(test)]
mod test {
    use futures::prelude::*;

    use super::*;

    #[test]
    fn test_handshake() {
        let mut device = Device::default();

        assert_eq!(
            device.respond(&Packet::EstablishConnection),
            Some(Packet::ack(Command::EstablishConnection))
        );
    }

    #[test]
    fn test_set_then_read() {
        let mut device = Device::default();
        let target = Orientation::new(45.0, 10.5);

        assert_eq!(
            device.respond(&Packet::OrientationSet(target)),
            Some(Packet::ack(Command::OrientationSet))
        );
        assert_eq!(
            device.respond(&Packet::OrientationRead),
            Some(Packet::OrientationResponse(target))
        );
    }

    #[test]
    fn test_unreachable_orientation() {
        let mut device = Device::default();

        for target in [Orientation::new(0.0, 91.0), Orientation::new(f64::NAN, 0.0)] {
            assert_eq!(
                device.respond(&Packet::OrientationSet(target)),
                Some(Packet::nack(Command::OrientationSet))
            );
        }

        assert_eq!(device.orientation, Device::default().orientation);
    }

    #[test]
    fn test_responses_are_rejected() {
        let mut device = Device::default();
        let packet = Packet::GpsResponse(Position::new(0.0, 0.0));

        assert_eq!(device.respond(&packet), Some(Packet::nack(Command::GpsResponse)));
    }

    #[test]
    fn test_acks_unanswered() {
        let mut device = Device::default();

        assert_eq!(device.respond(&Packet::ack(Command::GpsRead)), None);
        assert_eq!(device.respond(&Packet::nack(Command::GpsRead)), None);
    }

    #[tokio::test]
    async fn test_serve() -> eyre::Result<()> {
        let input = stream::iter([
            Ok(Packet::EnvRead),
            Ok(Packet::ack(Command::EnvResponse)),
            Ok(Packet::GpsRead),
        ]);

        let (tx, rx) = futures::channel::mpsc::unbounded();
        let sink = tx.sink_map_err(|_| {
            codec::Error::from(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        });

        let mut device = Device::default();
        serve(&mut device, input, sink).await?;

        let replies = rx.collect::<Vec<_>>().await;
        assert_eq!(replies, vec![
            Packet::EnvResponse(device.environment),
            Packet::GpsResponse(device.position),
        ]);

        Ok(())
    }
}
