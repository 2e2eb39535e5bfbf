use crate::dto::{CreateBarberRequest, UpdateBarberRequest};
use crate::interceptors::{AppError, AppResult};
use crate::models::{Barber, BarberStatus};
use crate::store::{ShopStore, StoreGuard};
use crate::utils::{require_non_blank, validate_request};

/// Barber headcount at a single instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Headcount {
    pub total: u64,
    pub available: u64,
}

/// Owns barbers and their availability. Never calls back into the queue.
#[derive(Clone)]
pub struct ResourcePool {
    store: ShopStore,
}

impl ResourcePool {
    pub fn new(store: ShopStore) -> Self {
        Self { store }
    }

    /// Add a barber; new barbers always start available
    pub async fn create(&self, request: CreateBarberRequest) -> AppResult<Barber> {
        validate_request(&request)?;
        require_non_blank("name", &request.name)?;

        let barber = Barber::new(request.name.trim().to_string(), request.phone, request.chair_no);

        let _guard = self.store.lock().await;
        self.store.barbers().insert(&barber).await?;

        tracing::info!("Barber {} created at chair {}", barber.id, barber.chair_no);
        Ok(barber)
    }

    pub async fn get(&self, id: &str) -> AppResult<Barber> {
        self.store
            .barbers()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Barber {} not found", id)))
    }

    pub async fn list_all(&self) -> AppResult<Vec<Barber>> {
        self.store.barbers().find_all().await
    }

    pub async fn list_available(&self) -> AppResult<Vec<Barber>> {
        self.store.barbers().find_by_status(BarberStatus::Available).await
    }

    /// Partial update. Status and current entry change only when supplied.
    ///
    /// A current entry may only be set together with `busy`, and `available`
    /// always clears it, so a barber is busy exactly when it serves someone.
    pub async fn update(&self, id: &str, request: UpdateBarberRequest) -> AppResult<Barber> {
        validate_request(&request)?;
        if let Some(name) = &request.name {
            require_non_blank("name", name)?;
        }
        if request.current_entry_id.is_some() && request.status != Some(BarberStatus::Busy) {
            return Err(AppError::ValidationError(
                "currentEntryId can only be set together with status busy".to_string(),
            ));
        }

        let _guard = self.store.lock().await;
        let mut barber = self.get(id).await?;

        if let Some(name) = request.name {
            barber.name = name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            barber.phone = Some(phone);
        }
        if let Some(chair_no) = request.chair_no {
            barber.chair_no = chair_no;
        }
        match request.status {
            Some(BarberStatus::Available) => barber.free(),
            Some(BarberStatus::Busy) => barber.status = BarberStatus::Busy,
            None => {}
        }
        if let Some(entry_id) = request.current_entry_id {
            barber.current_entry_id = Some(entry_id);
        }

        self.store.barbers().update(&barber).await?;
        Ok(barber)
    }

    /// Remove a barber. Queue entries that still reference it are left as they are.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let _guard = self.store.lock().await;

        if let Some(barber) = self.store.barbers().find_by_id(id).await? {
            if let Some(entry_id) = &barber.current_entry_id {
                tracing::warn!(
                    "Deleting barber {} while entry {} is still assigned to it",
                    barber.id,
                    entry_id
                );
            }
        }

        if !self.store.barbers().delete(id).await? {
            return Err(AppError::NotFound(format!("Barber {} not found", id)));
        }

        tracing::info!("Barber {} deleted", id);
        Ok(())
    }

    /// Manual status override. Setting available also clears the current entry.
    pub async fn set_status(&self, id: &str, status: BarberStatus) -> AppResult<Barber> {
        let _guard = self.store.lock().await;
        let mut barber = self.get(id).await?;

        match status {
            BarberStatus::Available => barber.free(),
            BarberStatus::Busy => barber.status = BarberStatus::Busy,
        }

        self.store.barbers().update(&barber).await?;
        tracing::info!("Barber {} status set to {}", barber.id, barber.status);
        Ok(barber)
    }

    /// Mark a barber busy with the given entry
    pub async fn reserve(&self, id: &str, entry_id: &str) -> AppResult<Barber> {
        let guard = self.store.lock().await;
        self.reserve_locked(&guard, id, entry_id).await
    }

    /// Free a barber. Releasing an available barber is a no-op.
    pub async fn release(&self, id: &str) -> AppResult<Barber> {
        let guard = self.store.lock().await;
        self.release_locked(&guard, id, None).await.map(|(barber, _)| barber)
    }

    pub(crate) async fn reserve_locked(
        &self,
        _guard: &StoreGuard<'_>,
        id: &str,
        entry_id: &str,
    ) -> AppResult<Barber> {
        let mut barber = self
            .store
            .barbers()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceUnavailable(format!("Barber {} does not exist", id)))?;

        if !barber.is_available() {
            return Err(AppError::ResourceUnavailable(format!("Barber {} is busy", id)));
        }

        barber.assign(entry_id);
        self.store.barbers().update(&barber).await?;

        tracing::debug!("Barber {} reserved for entry {}", barber.id, entry_id);
        Ok(barber)
    }

    /// Free a barber. With `for_entry` set, a barber already serving some
    /// other entry is left alone. The flag is true only when this call
    /// changed the barber.
    pub(crate) async fn release_locked(
        &self,
        _guard: &StoreGuard<'_>,
        id: &str,
        for_entry: Option<&str>,
    ) -> AppResult<(Barber, bool)> {
        let mut barber = self.get(id).await?;

        if let (Some(expected), Some(current)) = (for_entry, barber.current_entry_id.as_deref()) {
            if expected != current {
                tracing::warn!(
                    "Barber {} is serving entry {}, not {}; leaving it busy",
                    barber.id,
                    current,
                    expected
                );
                return Ok((barber, false));
            }
        }

        if barber.is_available() && barber.current_entry_id.is_none() {
            return Ok((barber, false));
        }

        barber.free();
        self.store.barbers().update(&barber).await?;

        tracing::debug!("Barber {} released", barber.id);
        Ok((barber, true))
    }

    pub(crate) async fn headcount_locked(&self, _guard: &StoreGuard<'_>) -> AppResult<Headcount> {
        let barbers = self.store.barbers();
        Ok(Headcount {
            total: barbers.count_all().await?,
            available: barbers.count_by_status(BarberStatus::Available).await?,
        })
    }
}
