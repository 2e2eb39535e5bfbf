use crate::config::AppState;
use crate::dto::{CreateBarberRequest, EnqueueRequest};
use crate::interceptors::AppResult;

const DEMO_BARBERS: [(&str, &str, i32); 3] = [
    ("Mike Johnson", "555-0101", 1),
    ("Sarah Williams", "555-0102", 2),
    ("James Brown", "555-0103", 3),
];

const DEMO_CUSTOMERS: [(&str, &str); 5] = [
    ("John Doe", "Haircut"),
    ("Jane Smith", "Haircut & Shave"),
    ("Bob Wilson", "Shave"),
    ("Alice Johnson", "Hair Coloring"),
    ("Charlie Brown", "Styling"),
];

/// Populate an empty shop with a few barbers and waiting customers
pub async fn seed_demo_data(state: &AppState) -> AppResult<()> {
    if !state.barbers.list_all().await?.is_empty() || state.queue.queue_size().await? > 0 {
        tracing::info!("Shop already has data, skipping demo seed");
        return Ok(());
    }

    for (name, phone, chair_no) in DEMO_BARBERS {
        state
            .barbers
            .create(CreateBarberRequest {
                name: name.to_string(),
                phone: Some(phone.to_string()),
                chair_no,
            })
            .await?;
    }

    for (customer_name, service_type) in DEMO_CUSTOMERS {
        state
            .queue
            .enqueue(EnqueueRequest {
                customer_name: customer_name.to_string(),
                service_type: service_type.to_string(),
            })
            .await?;
    }

    tracing::info!(
        "Seeded {} demo barbers and {} waiting customers",
        DEMO_BARBERS.len(),
        DEMO_CUSTOMERS.len()
    );
    Ok(())
}
