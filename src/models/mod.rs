pub mod barber;
pub mod queue_entry;

pub use barber::{Barber, BarberRow, BarberStatus};
pub use queue_entry::{QueueEntry, QueueEntryRow, QueueStatus};
