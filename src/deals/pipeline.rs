//! Deal pipeline stage machine.
//!
//! Deals move freely among the five working stages. Closing moves a deal
//! into the terminal `Status` stage, which is only reachable from
//! `Revenue` and can never be left again.

use crate::shared::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealStage {
    Clients,
    Orders,
    Tasks,
    DueDate,
    Revenue,
    Status,
}

impl DealStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clients => "Clients",
            Self::Orders => "Orders",
            Self::Tasks => "Tasks",
            Self::DueDate => "Due Date",
            Self::Revenue => "Revenue",
            Self::Status => "Status",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "Clients" => Ok(Self::Clients),
            "Orders" => Ok(Self::Orders),
            "Tasks" => Ok(Self::Tasks),
            "Due Date" => Ok(Self::DueDate),
            "Revenue" => Ok(Self::Revenue),
            "Status" => Ok(Self::Status),
            other => Err(ApiError::validation(
                "stage",
                format!("\"{other}\" is not a valid deal stage."),
            )),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealStatus {
    Open,
    Won,
    Lost,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Won => "Won",
            Self::Lost => "Lost",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "Open" => Ok(Self::Open),
            "Won" => Ok(Self::Won),
            "Lost" => Ok(Self::Lost),
            other => Err(ApiError::validation(
                "status",
                format!("\"{other}\" is not a valid deal status."),
            )),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Validates a stage move requested through the pipeline endpoint.
pub fn validate_transition(current: DealStage, target: DealStage) -> Result<(), ApiError> {
    if current.is_closed() {
        return Err(ApiError::validation(
            "stage",
            "Closed deals cannot be moved back to the pipeline.",
        ));
    }
    if target.is_closed() && current != DealStage::Revenue {
        return Err(ApiError::validation(
            "stage",
            "Deals can only be closed from the 'Revenue' stage.",
        ));
    }
    Ok(())
}

/// Validates a close request and returns the terminal outcome.
pub fn validate_close(current: DealStage, outcome: &str) -> Result<DealStatus, ApiError> {
    if current.is_closed() {
        return Err(ApiError::validation("stage", "Deal is already closed."));
    }
    if current != DealStage::Revenue {
        return Err(ApiError::validation(
            "stage",
            "Deals can only be closed from the 'Revenue' stage.",
        ));
    }
    let status = DealStatus::parse(outcome)?;
    if !status.is_terminal() {
        return Err(ApiError::validation(
            "status",
            "Status must be \"Won\" or \"Lost\" when in Status stage.",
        ));
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_stages_move_freely() {
        let working = [
            DealStage::Clients,
            DealStage::Orders,
            DealStage::Tasks,
            DealStage::DueDate,
            DealStage::Revenue,
        ];
        for from in working {
            for to in working {
                assert!(validate_transition(from, to).is_ok());
            }
        }
    }

    #[test]
    fn closing_requires_revenue_stage() {
        assert!(validate_transition(DealStage::Revenue, DealStage::Status).is_ok());
        for from in [
            DealStage::Clients,
            DealStage::Orders,
            DealStage::Tasks,
            DealStage::DueDate,
        ] {
            assert!(validate_transition(from, DealStage::Status).is_err());
        }
    }

    #[test]
    fn closed_deals_are_immutable() {
        for to in [DealStage::Clients, DealStage::Revenue, DealStage::Status] {
            assert!(validate_transition(DealStage::Status, to).is_err());
        }
    }

    #[test]
    fn close_demands_terminal_outcome() {
        assert_eq!(
            validate_close(DealStage::Revenue, "Won").unwrap(),
            DealStatus::Won
        );
        assert_eq!(
            validate_close(DealStage::Revenue, "Lost").unwrap(),
            DealStatus::Lost
        );
        assert!(validate_close(DealStage::Revenue, "Open").is_err());
        assert!(validate_close(DealStage::Clients, "Won").is_err());
        assert!(validate_close(DealStage::Status, "Won").is_err());
    }

    #[test]
    fn status_parse_accepts_open_and_outcomes() {
        assert_eq!(DealStatus::parse("Open").unwrap(), DealStatus::Open);
        assert_eq!(DealStatus::parse("Won").unwrap(), DealStatus::Won);
        assert_eq!(DealStatus::parse("Lost").unwrap(), DealStatus::Lost);
        assert!(DealStatus::parse("In Progress").is_err());
        assert!(!DealStatus::Open.is_terminal());
    }

    #[test]
    fn due_date_stage_uses_spaced_wire_name() {
        assert_eq!(DealStage::DueDate.as_str(), "Due Date");
        assert_eq!(DealStage::parse("Due Date").unwrap(), DealStage::DueDate);
        assert!(DealStage::parse("DueDate").is_err());
    }
}
