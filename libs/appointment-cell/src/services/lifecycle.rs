use tracing::{debug, warn};

use shared_models::AppointmentStatus;

use crate::models::AppointmentError;

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            // Terminal states
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::NoShow => vec![],
        }
    }

    /// Whether moving an appointment to `new_status` gives its slot back.
    pub fn releases_slot(&self, new_status: AppointmentStatus) -> bool {
        new_status == AppointmentStatus::Cancelled
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn scheduled_can_move_to_every_terminal_state() {
        let lifecycle = AppointmentLifecycleService::new();

        for next in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert!(lifecycle
                .validate_status_transition(AppointmentStatus::Scheduled, next)
                .is_ok());
        }
    }

    #[test]
    fn terminal_states_are_final() {
        let lifecycle = AppointmentLifecycleService::new();

        for current in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert!(lifecycle.get_valid_transitions(current).is_empty());
            assert_matches!(
                lifecycle.validate_status_transition(current, AppointmentStatus::Cancelled),
                Err(AppointmentError::InvalidStatusTransition { from, .. }) if from == current
            );
        }
    }

    #[test]
    fn only_cancellation_releases_the_slot() {
        let lifecycle = AppointmentLifecycleService::new();

        assert!(lifecycle.releases_slot(AppointmentStatus::Cancelled));
        assert!(!lifecycle.releases_slot(AppointmentStatus::Completed));
        assert!(!lifecycle.releases_slot(AppointmentStatus::NoShow));
    }
}
