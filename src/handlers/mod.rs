pub mod barber_handler;
pub mod health_handler;
pub mod queue_handler;

pub use barber_handler::{
    create_barber, delete_barber, finish_service, get_barber, list_available_barbers,
    list_barbers, update_barber, update_barber_status,
};
pub use health_handler::health_check;
pub use queue_handler::{
    call_next, complete_entry, enqueue, get_entry, list_queue, queue_stats, remove_entry,
};
