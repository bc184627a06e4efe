//! Player treasury, research portfolio and production queues.
//!
//! All money amounts are integers. The treasury may go negative only
//! through modeling errors; the tick simulator reports that as a fault
//! instead of aborting.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::ResearchType;
use crate::error::{EconomyError, Result};
use crate::production::ProductionQueue;
use crate::research::{Research, ResearchState};
use crate::resources::ProductionCategory;

/// Identifier of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Money flows of one in-game day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyLedger {
    /// Spent on research.
    pub research_cost: i64,
    /// Spent on production.
    pub production_cost: i64,
    /// Spent on repairs.
    pub repair_cost: i64,
    /// Spent on new buildings.
    pub build_cost: i64,
    /// Tax collected at the day rollover.
    pub tax_income: i64,
    /// Trade income collected at the day rollover.
    pub trade_income: i64,
    /// Units finished by production.
    pub units_produced: i64,
}

/// A player of the economy.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Race, inherited by colonies.
    pub race: String,
    /// Treasury.
    pub money: i64,
    /// Research in progress, keyed by type id.
    pub research: BTreeMap<String, Research>,
    /// The research currently being funded.
    pub running_research: Option<String>,
    /// Finished research.
    pub available_technologies: BTreeSet<String>,
    /// Production queues per category.
    pub production: BTreeMap<ProductionCategory, ProductionQueue>,
    /// Finished units in storage, keyed by type id.
    pub inventory: BTreeMap<String, i64>,
    /// Money flows so far today.
    pub today: DailyLedger,
    /// Money flows of the previous day.
    pub yesterday: DailyLedger,
}

impl Player {
    /// Create a player with an empty portfolio.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, race: impl Into<String>, money: i64) -> Self {
        Self {
            id,
            name: name.into(),
            race: race.into(),
            money,
            research: BTreeMap::new(),
            running_research: None,
            available_technologies: BTreeSet::new(),
            production: ProductionCategory::ALL
                .iter()
                .map(|&c| (c, ProductionQueue::new()))
                .collect(),
            inventory: BTreeMap::new(),
            today: DailyLedger::default(),
            yesterday: DailyLedger::default(),
        }
    }

    /// Check if player can afford a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: i64) -> bool {
        self.money >= cost
    }

    /// Spend money if available.
    ///
    /// Returns true if the transaction succeeded.
    pub fn spend(&mut self, amount: i64) -> bool {
        if self.can_afford(amount) {
            self.money -= amount;
            true
        } else {
            false
        }
    }

    /// Add money to the treasury.
    pub fn credit(&mut self, amount: i64) {
        self.money += amount;
    }

    /// Whether a technology has been researched.
    #[must_use]
    pub fn is_available(&self, id: &str) -> bool {
        self.available_technologies.contains(id)
    }

    /// Make `research_type` the single running research.
    ///
    /// A research already in progress keeps its funding; any other running
    /// research is stopped.
    pub fn start_research(&mut self, research_type: Arc<ResearchType>) {
        if self.is_available(&research_type.id) {
            return;
        }
        self.stop_research();
        let id = research_type.id.clone();
        let research = self
            .research
            .entry(id.clone())
            .or_insert_with(|| Research::new(research_type));
        research.state = ResearchState::Running;
        self.running_research = Some(id);
    }

    /// Stop the running research, keeping its progress.
    pub fn stop_research(&mut self) {
        if let Some(id) = self.running_research.take() {
            if let Some(research) = self.research.get_mut(&id) {
                research.state = ResearchState::Stopped;
            }
        }
    }

    /// Change the money assigned to a research in progress.
    pub fn assign_research_money(&mut self, id: &str, amount: i64) -> Result<()> {
        let research = self
            .research
            .get_mut(id)
            .ok_or_else(|| EconomyError::UnknownResearchType(id.to_string()))?;
        research.assigned_money = amount.max(0);
        Ok(())
    }

    /// The running research, if any.
    #[must_use]
    pub fn running(&self) -> Option<&Research> {
        self.running_research
            .as_ref()
            .and_then(|id| self.research.get(id))
    }

    /// Mark a research as finished.
    pub fn complete_research(&mut self, id: &str) {
        self.research.remove(id);
        if self.running_research.as_deref() == Some(id) {
            self.running_research = None;
        }
        self.available_technologies.insert(id.to_string());
    }

    /// Queue units of a researched, producible item.
    pub fn add_production(&mut self, research_type: Arc<ResearchType>, count: i32) -> Result<()> {
        let category = research_type
            .production
            .ok_or_else(|| EconomyError::NotProducible(research_type.id.clone()))?;
        if !self.is_available(&research_type.id) {
            return Err(EconomyError::TechnologyNotAvailable(research_type.id.clone()));
        }
        self.production
            .entry(category)
            .or_default()
            .add(research_type, count);
        Ok(())
    }

    /// Production queue of one category.
    #[must_use]
    pub fn production_queue(&self, category: ProductionCategory) -> Option<&ProductionQueue> {
        self.production.get(&category)
    }

    /// Mutable production queue of one category.
    pub fn production_queue_mut(&mut self, category: ProductionCategory) -> &mut ProductionQueue {
        self.production.entry(category).or_default()
    }

    /// Store finished units.
    pub fn add_inventory(&mut self, id: &str, count: i64) {
        *self.inventory.entry(id.to_string()).or_insert(0) += count;
    }

    /// Close the day: today's flows become yesterday's.
    pub fn roll_over_day(&mut self) {
        self.yesterday = std::mem::take(&mut self.today);
    }
}
