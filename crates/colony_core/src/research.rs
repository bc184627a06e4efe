//! Research funding.
//!
//! A player funds at most one running research at a time. Each economy
//! tick moves money from the treasury into the research until its cost is
//! paid, limited by the player's active laboratories.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::ResearchType;
use crate::resources::LabAmounts;

/// Funding state of a research.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResearchState {
    /// Not being funded.
    #[default]
    Stopped,
    /// Funded normally.
    Running,
    /// Blocked because the treasury could not cover this tick's funding.
    Money,
    /// Blocked because progress reached the lab-capacity cap.
    Lab,
}

/// Result of one funding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingOutcome {
    /// Money was spent and the research is not finished.
    Progressed {
        /// Money spent this tick.
        spent: i64,
    },
    /// The research is paid off.
    Completed {
        /// Money spent this tick.
        spent: i64,
    },
    /// The treasury could not cover the full funding step.
    BlockedOnMoney {
        /// Money spent this tick (whatever the treasury had).
        spent: i64,
    },
    /// Progress is at the cap allowed by active labs.
    BlockedOnLabs,
    /// Nothing is assigned to the research.
    Idle,
}

/// A research in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Research {
    /// What is being researched.
    pub research_type: Arc<ResearchType>,
    /// Money still needed.
    pub remaining_money: i64,
    /// Funding the player assigned; drives the per-tick step.
    pub assigned_money: i64,
    /// Current funding state.
    pub state: ResearchState,
}

impl Research {
    /// Start tracking a research with half of its cost assigned.
    #[must_use]
    pub fn new(research_type: Arc<ResearchType>) -> Self {
        let cost = research_type.research_cost;
        Self {
            research_type,
            remaining_money: cost,
            assigned_money: cost / 2,
            state: ResearchState::Stopped,
        }
    }

    /// Percent of the cost already paid.
    #[must_use]
    pub fn percent_complete(&self) -> f64 {
        let cost = self.research_type.research_cost;
        if cost <= 0 {
            return 100.0;
        }
        (cost - self.remaining_money) as f64 * 100.0 / cost as f64
    }

    /// Whether the cost is fully paid.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.remaining_money <= 0
    }

    /// Fund one tick of research from `money`.
    ///
    /// The step is `assigned / remaining * rate` (at least 1 while any
    /// money is assigned), capped by what is left to pay. The treasury pays
    /// what it can; a short payment leaves the research in
    /// [`ResearchState::Money`], so an empty treasury changes nothing but
    /// the state.
    pub fn fund(&mut self, money: &mut i64, active_labs: &LabAmounts, rate: f64) -> FundingOutcome {
        if self.is_complete() {
            return FundingOutcome::Completed { spent: 0 };
        }

        let max_percent = self.research_type.labs.max_percent(active_labs);
        if self.percent_complete() >= max_percent {
            self.state = ResearchState::Lab;
            return FundingOutcome::BlockedOnLabs;
        }

        if self.assigned_money <= 0 {
            self.state = ResearchState::Running;
            return FundingOutcome::Idle;
        }

        let relative = self.assigned_money as f64 / self.remaining_money as f64;
        let step = ((relative * rate).floor() as i64)
            .max(1)
            .min(self.remaining_money);
        let spent = step.min((*money).max(0));

        self.remaining_money -= spent;
        *money -= spent;

        if self.is_complete() {
            self.state = ResearchState::Running;
            FundingOutcome::Completed { spent }
        } else if spent < step {
            self.state = ResearchState::Money;
            FundingOutcome::BlockedOnMoney { spent }
        } else {
            self.state = ResearchState::Running;
            FundingOutcome::Progressed { spent }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LabRequirements;
    use crate::resources::LabKind;

    fn research_type(cost: i64, civil: u32) -> Arc<ResearchType> {
        Arc::new(ResearchType {
            id: "r".into(),
            name: String::new(),
            category: String::new(),
            research_cost: cost,
            production_cost: 0,
            production: None,
            labs: LabRequirements {
                civil,
                ..Default::default()
            },
        })
    }

    #[test]
    fn test_funding_step() {
        let mut r = Research::new(research_type(100, 0));
        r.assigned_money = 50;
        let mut money = 1000;

        let outcome = r.fund(&mut money, &LabAmounts::default(), 40.0);
        assert_eq!(outcome, FundingOutcome::Progressed { spent: 20 });
        assert_eq!(r.remaining_money, 80);
        assert_eq!(money, 980);
        assert_eq!(r.state, ResearchState::Running);
    }

    #[test]
    fn test_empty_treasury_changes_only_state() {
        let mut r = Research::new(research_type(100, 0));
        r.assigned_money = 50;
        let mut money = 0;

        let outcome = r.fund(&mut money, &LabAmounts::default(), 40.0);
        assert_eq!(outcome, FundingOutcome::BlockedOnMoney { spent: 0 });
        assert_eq!(r.remaining_money, 100);
        assert_eq!(money, 0);
        assert_eq!(r.state, ResearchState::Money);
    }

    #[test]
    fn test_partial_payment() {
        let mut r = Research::new(research_type(100, 0));
        r.assigned_money = 50;
        let mut money = 5;

        let outcome = r.fund(&mut money, &LabAmounts::default(), 40.0);
        assert_eq!(outcome, FundingOutcome::BlockedOnMoney { spent: 5 });
        assert_eq!(r.remaining_money, 95);
        assert_eq!(money, 0);
    }

    #[test]
    fn test_lab_cap_blocks_funding() {
        let mut r = Research::new(research_type(100, 2));
        let mut money = 1000;
        let mut labs = LabAmounts::default();
        labs.add(LabKind::Civil, 1.0);

        // 50% cap: fund until blocked
        let mut guard = 0;
        while r.fund(&mut money, &labs, 40.0) != FundingOutcome::BlockedOnLabs {
            guard += 1;
            assert!(guard < 100);
        }
        assert_eq!(r.state, ResearchState::Lab);
        assert!(r.percent_complete() >= 50.0);
        assert!(r.remaining_money > 0);
    }

    #[test]
    fn test_no_labs_means_no_progress() {
        let mut r = Research::new(research_type(100, 1));
        let mut money = 1000;
        assert_eq!(
            r.fund(&mut money, &LabAmounts::default(), 40.0),
            FundingOutcome::BlockedOnLabs
        );
        assert_eq!(money, 1000);
    }

    #[test]
    fn test_completion() {
        let mut r = Research::new(research_type(30, 0));
        r.assigned_money = 30;
        let mut money = 1000;
        // relative = 1.0 -> step 40, capped at the remaining 30
        assert_eq!(
            r.fund(&mut money, &LabAmounts::default(), 40.0),
            FundingOutcome::Completed { spent: 30 }
        );
        assert!(r.is_complete());
        assert_eq!(r.percent_complete(), 100.0);
    }

    #[test]
    fn test_unassigned_research_is_idle() {
        let mut r = Research::new(research_type(100, 0));
        r.assigned_money = 0;
        let mut money = 1000;
        assert_eq!(
            r.fund(&mut money, &LabAmounts::default(), 40.0),
            FundingOutcome::Idle
        );
        assert_eq!(r.remaining_money, 100);
    }
}
