use std::{
    sync::atomic::{
        AtomicUsize,
        Ordering,
    },
    time::Duration,
};

use futures::prelude::*;
use tokio::sync::Mutex;
use tokio_retry::{
    strategy::FixedInterval,
    Retry,
};

use message::{
    Command,
    Environment,
    Orientation,
    Packet,
    Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// How long [`Session::request`] waits for the matching reply.
    pub response_timeout:   Duration,
    /// Quiet period after the port opens, before the first handshake attempt.
    pub settle:             Duration,
    pub handshake_attempts: usize,
    pub retry_delay:        Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            response_timeout:   Duration::from_secs(2),
            settle:             Duration::from_secs(2),
            handshake_attempts: 5,
            retry_delay:        Duration::from_secs(2),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] codec::Error),

    #[error("serial link closed")]
    Closed,

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("device rejected {0}")]
    Nacked(Command),

    #[error("{0} has no reply to wait for")]
    NoReply(Command),

    #[error("unexpected reply: {0}")]
    Unexpected(Packet),

    #[error("no connection after {attempts} attempts")]
    HandshakeFailed { attempts: usize },
}

/// Host side of the serial link.
///
/// Reader and writer are locked independently, so a session can be shared by reference between
/// tasks. [`Session::request`] holds the reader for the whole exchange, which keeps concurrent
/// requests from consuming each other's replies.
pub struct Session<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
    config: Config,
}

impl<R, W> Session<R, W>
where
    R: Stream<Item = Result<Packet, codec::Error>> + Unpin,
    W: Sink<Packet, Error = codec::Error> + Unpin,
{
    pub fn new(reader: R, writer: W, config: Config) -> Self {
        Session {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[tracing::instrument(level = "debug", skip_all, fields(packet = %packet), err(Display))]
    pub async fn send(&self, packet: Packet) -> Result<(), Error> {
        let mut writer = self.writer.lock().await;
        writer.send(packet).await?;

        Ok(())
    }

    /// Wait for the next packet from the device, whatever it is.
    pub async fn recv(&self) -> Result<Packet, Error> {
        let wait = self.config.response_timeout;
        let mut reader = self.reader.lock().await;

        tokio::time::timeout(wait, next_packet(&mut *reader))
            .await
            .map_err(|_| Error::Timeout(wait))?
    }

    /// Send `packet` and wait for the reply its command calls for. The response timeout covers
    /// the write as well as the wait.
    ///
    /// Packets that don't answer this request are logged and dropped. A NACK naming this command
    /// fails the request immediately.
    #[tracing::instrument(level = "debug", skip_all, fields(packet = %packet), err(Display))]
    pub async fn request(&self, packet: Packet) -> Result<Packet, Error> {
        let command = packet.command();
        let expected = command.response().ok_or(Error::NoReply(command))?;

        let mut reader = self.reader.lock().await;

        let wait = self.config.response_timeout;
        let reply = tokio::time::timeout(wait, async {
            self.send(packet).await?;

            loop {
                let reply = next_packet(&mut *reader).await?;

                match reply {
                    Packet::Nack {
                        code,
                    } if code == command.code() => return Err(Error::Nacked(command)),

                    Packet::Ack {
                        code,
                    } if expected == Command::Ack && code == command.code() => return Ok(reply),

                    _ if expected != Command::Ack && reply.command() == expected => {
                        return Ok(reply)
                    },

                    other => tracing::warn!(packet = %other, "ignoring unsolicited packet"),
                }
            }
        })
        .await
        .map_err(|_| Error::Timeout(wait))??;

        tracing::debug!(reply = %reply, "request answered");

        Ok(reply)
    }

    /// Discard whatever the device has already sent. Returns the number of packets dropped.
    pub async fn drain(&self) -> usize {
        let mut reader = self.reader.lock().await;
        let mut count = 0;

        while let Some(Some(item)) = reader.next().now_or_never() {
            match item {
                Ok(packet) => tracing::debug!(packet = %packet, "drained"),
                Err(e) => tracing::warn!(error = %e, "drained"),
            }

            count += 1;
        }

        count
    }

    /// Handshake with the device.
    ///
    /// Waits out the settle period, then sends ESTABLISH_CONNECTION until it is acked or the
    /// attempts run out. Input is drained after every attempt.
    #[tracing::instrument(skip(self), err(Display))]
    pub async fn establish_connection(&self) -> Result<(), Error> {
        let Config {
            settle,
            handshake_attempts,
            retry_delay,
            ..
        } = self.config;

        if handshake_attempts == 0 {
            return Err(Error::HandshakeFailed {
                attempts: 0,
            });
        }

        tokio::time::sleep(settle).await;

        let attempts = AtomicUsize::new(0);
        let strategy = FixedInterval::new(retry_delay).take(handshake_attempts - 1);

        let this = self;
        let counter = &attempts;

        let result = Retry::spawn(strategy, move || async move {
            let attempt = counter.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::info!(attempt, "sending connection request");

            let result = this.request(Packet::EstablishConnection).await;

            let drained = this.drain().await;
            if drained > 0 {
                tracing::debug!(drained, "flushed input after handshake attempt");
            }

            crate::trace_catch!(result, attempt, "handshake attempt failed");
            result
        })
        .await;

        match result {
            Ok(_) => {
                tracing::info!("connection established");
                Ok(())
            },
            Err(_) => Err(Error::HandshakeFailed {
                attempts: attempts.into_inner(),
            }),
        }
    }

    pub async fn orientation(&self) -> Result<Orientation, Error> {
        match self.request(Packet::OrientationRead).await? {
            Packet::OrientationResponse(o) => Ok(o),
            other => Err(Error::Unexpected(other)),
        }
    }

    pub async fn environment(&self) -> Result<Environment, Error> {
        match self.request(Packet::EnvRead).await? {
            Packet::EnvResponse(e) => Ok(e),
            other => Err(Error::Unexpected(other)),
        }
    }

    pub async fn position(&self) -> Result<Position, Error> {
        match self.request(Packet::GpsRead).await? {
            Packet::GpsResponse(p) => Ok(p),
            other => Err(Error::Unexpected(other)),
        }
    }

    /// Command the motors to `orientation`. Resolves once the device acks.
    pub async fn point(&self, orientation: Orientation) -> Result<(), Error> {
        self.request(Packet::OrientationSet(orientation)).await?;
        Ok(())
    }
}

async fn next_packet<R>(reader: &mut R) -> Result<Packet, Error>
where
    R: Stream<Item = Result<Packet, codec::Error>> + Unpin,
{
    match reader.next().await {
        Some(packet) => Ok(packet?),
        None => Err(Error::Closed),
    }
}

#[cfg(test)]
mod test {
    use tokio_util::codec::{
        FramedRead,
        FramedWrite,
    };

    use super::*;

    fn quick() -> Config {
        Config {
            response_timeout:   Duration::from_millis(100),
            settle:             Duration::ZERO,
            handshake_attempts: 3,
            retry_delay:        Duration::from_millis(10),
        }
    }

    fn pair(
        config: Config,
    ) -> (
        Session<
            FramedRead<tokio::io::ReadHalf<tokio::io::DuplexStream>, codec::PacketCodec>,
            FramedWrite<tokio::io::WriteHalf<tokio::io::DuplexStream>, codec::PacketCodec>,
        >,
        FramedRead<tokio::io::ReadHalf<tokio::io::DuplexStream>, codec::PacketCodec>,
        FramedWrite<tokio::io::WriteHalf<tokio::io::DuplexStream>, codec::PacketCodec>,
    ) {
        let (host, device) = tokio::io::duplex(1024);

        let (host_r, host_w) = tokio::io::split(host);
        let (dev_r, dev_w) = tokio::io::split(device);

        let session = Session::new(
            FramedRead::new(host_r, codec::PacketCodec::new()),
            FramedWrite::new(host_w, codec::PacketCodec::new()),
            config,
        );

        (
            session,
            FramedRead::new(dev_r, codec::PacketCodec::new()),
            FramedWrite::new(dev_w, codec::PacketCodec::new()),
        )
    }

    #[tokio::test]
    async fn test_request_skips_unrelated_packets() -> eyre::Result<()> {
        let (session, mut dev_r, mut dev_w) = pair(quick());

        let device = tokio::spawn(async move {
            let req = dev_r.next().await.unwrap()?;
            assert_eq!(req, Packet::GpsRead);

            dev_w.send(Packet::ack(Command::OrientationSet)).await?;
            dev_w.send(Packet::EnvResponse(Environment::new(1.0, 2.0))).await?;
            dev_w.send(Packet::GpsResponse(Position::new(3.0, 4.0))).await?;

            Ok(()) as Result<(), codec::Error>
        });

        assert_eq!(session.position().await?, Position::new(3.0, 4.0));
        device.await??;

        Ok(())
    }

    #[tokio::test]
    async fn test_ack_must_name_command() -> eyre::Result<()> {
        let (session, mut dev_r, mut dev_w) = pair(quick());

        let device = tokio::spawn(async move {
            dev_r.next().await.unwrap()?;

            dev_w.send(Packet::ack(Command::EnvRead)).await?;
            dev_w.send(Packet::ack(Command::OrientationSet)).await?;

            Ok(()) as Result<(), codec::Error>
        });

        session.point(Orientation::new(90.0, 45.0)).await?;
        device.await??;

        Ok(())
    }

    #[tokio::test]
    async fn test_nack() -> eyre::Result<()> {
        let (session, mut dev_r, mut dev_w) = pair(quick());

        tokio::spawn(async move {
            let _ = dev_r.next().await;
            dev_w.send(Packet::nack(Command::EnvRead)).await
        });

        let result = session.environment().await;
        assert!(matches!(result, Err(Error::Nacked(Command::EnvRead))));

        Ok(())
    }

    #[tokio::test]
    async fn test_timeout() {
        let (session, _dev_r, _dev_w) = pair(quick());

        let result = session.orientation().await;
        assert!(matches!(result, Err(Error::Timeout(d)) if d == Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn test_timeout_covers_blocked_write() {
        // one byte of buffer and nobody reading: the frame can never be written out
        let (host, _device) = tokio::io::duplex(1);
        let (host_r, host_w) = tokio::io::split(host);

        let session = Session::new(
            FramedRead::new(host_r, codec::PacketCodec::new()),
            FramedWrite::new(host_w, codec::PacketCodec::new()),
            quick(),
        );

        let result = session.position().await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_closed() {
        let (session, dev_r, dev_w) = pair(quick());
        drop((dev_r, dev_w));

        assert!(matches!(session.recv().await, Err(Error::Closed)));
    }

    #[tokio::test]
    async fn test_no_reply_for_ack() {
        let (session, mut dev_r, _dev_w) = pair(quick());

        let result = session.request(Packet::ack(Command::GpsRead)).await;
        assert!(matches!(result, Err(Error::NoReply(Command::Ack))));

        let written = tokio::time::timeout(Duration::from_millis(50), dev_r.next()).await;
        assert!(written.is_err(), "nothing should reach the device");
    }

    #[tokio::test]
    async fn test_handshake_zero_attempts() {
        let (session, mut dev_r, _dev_w) = pair(Config {
            handshake_attempts: 0,
            ..quick()
        });

        let result = session.establish_connection().await;
        assert!(matches!(result, Err(Error::HandshakeFailed { attempts: 0 })));

        let written = tokio::time::timeout(Duration::from_millis(50), dev_r.next()).await;
        assert!(written.is_err(), "nothing should reach the device");
    }

    #[tokio::test]
    async fn test_handshake_drains_between_attempts() -> eyre::Result<()> {
        let (session, mut dev_r, mut dev_w) = pair(quick());

        let device = tokio::spawn(async move {
            dev_r.next().await.unwrap()?;
            dev_w.send(Packet::nack(Command::EstablishConnection)).await?;
            dev_w.send(Packet::GpsResponse(Position::new(1.0, 2.0))).await?;
            dev_w.send(Packet::EnvResponse(Environment::new(3.0, 4.0))).await?;

            dev_r.next().await.unwrap()?;
            dev_w.send(Packet::ack(Command::EstablishConnection)).await?;
            dev_w.send(Packet::OrientationResponse(Orientation::new(5.0, 6.0))).await?;
            dev_w.send(Packet::GpsResponse(Position::new(7.0, 8.0))).await?;

            Ok::<_, codec::Error>((dev_r, dev_w))
        });

        session.establish_connection().await?;
        let _link = device.await??;

        assert_eq!(session.drain().await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_handshake_gives_up() {
        let (session, _dev_r, _dev_w) = pair(quick());

        let result = session.establish_connection().await;
        assert!(matches!(result, Err(Error::HandshakeFailed { attempts: 3 })));
    }

    #[tokio::test]
    async fn test_handshake_retries() -> eyre::Result<()> {
        let (session, mut dev_r, mut dev_w) = pair(quick());

        let device = tokio::spawn(async move {
            dev_r.next().await.unwrap()?;
            dev_w.send(Packet::nack(Command::EstablishConnection)).await?;

            dev_r.next().await.unwrap()?;
            dev_w.send(Packet::ack(Command::EstablishConnection)).await?;

            Ok(()) as Result<(), codec::Error>
        });

        session.establish_connection().await?;
        device.await??;

        Ok(())
    }

    #[tokio::test]
    async fn test_drain() -> eyre::Result<()> {
        let (session, _dev_r, mut dev_w) = pair(quick());

        dev_w.send(Packet::GpsRead).await?;
        dev_w.send(Packet::EnvRead).await?;

        // let the bytes land in the duplex buffer
        tokio::task::yield_now().await;

        assert_eq!(session.drain().await, 2);
        assert_eq!(session.drain().await, 0);

        Ok(())
    }
}
