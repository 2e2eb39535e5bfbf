pub mod barber_dto;
pub mod queue_dto;

pub use barber_dto::{CreateBarberRequest, StatusQuery, UpdateBarberRequest};
pub use queue_dto::{CallNextQuery, EnqueueRequest, QueueEntryResponse, QueueStatsResponse};
