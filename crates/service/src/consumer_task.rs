//! Background task running the payment consumer.

use std::sync::Arc;

use booking_store::BookingStore;
use futures_core::Stream;
use lifecycle::{BookingService, EventPublisher, PaymentEventConsumer};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawns the payment consumer over `messages` on the runtime.
///
/// The task stops when `shutdown` is cancelled or the stream ends.
pub fn spawn_payment_consumer<S, P, M, B>(
    service: Arc<BookingService<S, P>>,
    messages: M,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    S: BookingStore + 'static,
    P: EventPublisher + 'static,
    M: Stream<Item = B> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let consumer = PaymentEventConsumer::new(service);
    tokio::spawn(async move { consumer.run(messages, shutdown).await })
}
