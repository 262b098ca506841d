use super::{Inbound, Outbound};
use crate::bounded::{async_trait, BoxError, BoxStream};

use std::collections::VecDeque;
use std::future::poll_fn;
use std::pin::Pin;

use futures_core::Stream;
use tokio::sync::mpsc;

/// The inbound half of a connection.
///
/// Every call is a suspension point; `None` means the channel is closed.
#[async_trait]
pub trait Receive: Send {
    async fn receive(&mut self) -> Option<Inbound>;
}

/// The outbound half of a connection.
#[async_trait]
pub trait Emit: Send {
    async fn emit(&mut self, message: Outbound) -> Result<(), BoxError>;
}

#[async_trait]
impl<R> Receive for &mut R
where
    R: Receive + ?Sized,
{
    async fn receive(&mut self) -> Option<Inbound> {
        (**self).receive().await
    }
}

#[async_trait]
impl<R> Receive for Box<R>
where
    R: Receive + ?Sized,
{
    async fn receive(&mut self) -> Option<Inbound> {
        (**self).receive().await
    }
}

#[async_trait]
impl Receive for mpsc::Receiver<Inbound> {
    async fn receive(&mut self) -> Option<Inbound> {
        self.recv().await
    }
}

#[async_trait]
impl Receive for mpsc::UnboundedReceiver<Inbound> {
    async fn receive(&mut self) -> Option<Inbound> {
        self.recv().await
    }
}

#[async_trait]
impl Receive for VecDeque<Inbound> {
    async fn receive(&mut self) -> Option<Inbound> {
        self.pop_front()
    }
}

#[async_trait]
impl<E> Emit for &mut E
where
    E: Emit + ?Sized,
{
    async fn emit(&mut self, message: Outbound) -> Result<(), BoxError> {
        (**self).emit(message).await
    }
}

#[async_trait]
impl<E> Emit for Box<E>
where
    E: Emit + ?Sized,
{
    async fn emit(&mut self, message: Outbound) -> Result<(), BoxError> {
        (**self).emit(message).await
    }
}

#[async_trait]
impl Emit for mpsc::Sender<Outbound> {
    async fn emit(&mut self, message: Outbound) -> Result<(), BoxError> {
        self.send(message).await.map_err(|err| Box::new(err) as _)
    }
}

#[async_trait]
impl Emit for mpsc::UnboundedSender<Outbound> {
    async fn emit(&mut self, message: Outbound) -> Result<(), BoxError> {
        self.send(message).map_err(|err| Box::new(err) as _)
    }
}

/// Collects every emitted message.
#[async_trait]
impl Emit for Vec<Outbound> {
    async fn emit(&mut self, message: Outbound) -> Result<(), BoxError> {
        self.push(message);
        Ok(())
    }
}

/// Adapts a [`Stream`] of inbound messages into a [`Receive`] capability.
pub struct StreamReceiver<S>(S);

impl<S> StreamReceiver<S>
where
    S: Stream<Item = Inbound> + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        StreamReceiver(stream)
    }
}

impl StreamReceiver<BoxStream<'static, Inbound>> {
    /// Box a stream that is not `Unpin`.
    pub fn boxed<S>(stream: S) -> Self
    where
        S: Stream<Item = Inbound> + Send + 'static,
    {
        StreamReceiver(Box::pin(stream))
    }
}

#[async_trait]
impl<S> Receive for StreamReceiver<S>
where
    S: Stream<Item = Inbound> + Unpin + Send,
{
    async fn receive(&mut self) -> Option<Inbound> {
        poll_fn(|cx| Pin::new(&mut self.0).poll_next(cx)).await
    }
}
