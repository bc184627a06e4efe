//! Production lines for researched items.
//!
//! Each production category has a queue of lines, one per item type. Every
//! economy tick the category's factory capacity is split across the lines
//! that still have units to build, in proportion to their priority, and
//! turned into money spent on those lines.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::ResearchType;

/// Priority given to newly added lines.
pub const DEFAULT_PRIORITY: u32 = 50;

/// A production line building units of one item type.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionLine {
    /// Item being produced.
    pub research_type: Arc<ResearchType>,
    /// Units still to build.
    pub count: i32,
    /// Money accumulated toward the current unit.
    pub progress: i64,
    /// Relative weight when sharing factory capacity.
    pub priority: u32,
}

impl ProductionLine {
    /// Create a line for `count` units.
    #[must_use]
    pub fn new(research_type: Arc<ResearchType>, count: i32) -> Self {
        Self {
            research_type,
            count,
            progress: 0,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Cost of one unit, never less than 1.
    #[must_use]
    pub fn unit_cost(&self) -> i64 {
        self.research_type.production_cost.max(1)
    }

    /// Money still needed to finish every queued unit.
    #[must_use]
    pub fn remaining_cost(&self) -> i64 {
        (i64::from(self.count) * self.unit_cost() - self.progress).max(0)
    }

    /// Get progress on the current unit as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        ((self.progress.clamp(0, self.unit_cost()) * 100) / self.unit_cost()) as u32
    }

    /// Whether the line has anything left to build.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.count > 0
    }

    /// Put `amount` of money into the line.
    ///
    /// Returns how many whole units were finished; the remainder is carried
    /// as progress.
    pub fn invest(&mut self, amount: i64) -> i32 {
        self.progress += amount;
        let unit = self.unit_cost();
        let finished = (self.progress / unit).min(i64::from(self.count)) as i32;
        self.count -= finished;
        self.progress -= i64::from(finished) * unit;
        if self.count == 0 {
            self.progress = 0;
        }
        finished
    }
}

/// Units finished on one line during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionComplete {
    /// Item type id.
    pub research_type: String,
    /// Units finished.
    pub count: i32,
}

/// Outcome of funding one category for a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionTick {
    /// Money taken from the treasury.
    pub spent: i64,
    /// Lines that finished units.
    pub completed: Vec<ProductionComplete>,
}

/// The production lines of one category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionQueue {
    lines: BTreeMap<String, ProductionLine>,
}

impl ProductionQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue more units of an item, creating its line if needed.
    pub fn add(&mut self, research_type: Arc<ResearchType>, count: i32) {
        self.lines
            .entry(research_type.id.clone())
            .and_modify(|line| line.count += count)
            .or_insert_with(|| ProductionLine::new(research_type, count));
    }

    /// Insert a fully specified line, replacing any existing one.
    pub fn insert(&mut self, line: ProductionLine) {
        self.lines.insert(line.research_type.id.clone(), line);
    }

    /// Remove an item's line.
    pub fn cancel(&mut self, id: &str) -> Option<ProductionLine> {
        self.lines.remove(id)
    }

    /// Change a line's priority. Returns `false` if there is no such line.
    pub fn set_priority(&mut self, id: &str, priority: u32) -> bool {
        match self.lines.get_mut(id) {
            Some(line) => {
                line.priority = priority;
                true
            }
            None => false,
        }
    }

    /// Look up a line.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ProductionLine> {
        self.lines.get(id)
    }

    /// All lines in id order.
    pub fn lines(&self) -> impl Iterator<Item = &ProductionLine> {
        self.lines.values()
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Spend this tick's factory `capacity` on the active lines.
    ///
    /// Each active line gets `floor(capacity * priority / Σpriority)`,
    /// further limited by the treasury and by what the line still needs.
    pub fn fund(&mut self, capacity: f64, money: &mut i64) -> ProductionTick {
        let mut tick = ProductionTick::default();
        let priority_sum: u64 = self
            .lines
            .values()
            .filter(|line| line.is_active())
            .map(|line| u64::from(line.priority))
            .sum();
        if capacity <= 0.0 || priority_sum == 0 {
            return tick;
        }

        for (id, line) in self.lines.iter_mut().filter(|(_, l)| l.is_active()) {
            let share = (capacity * f64::from(line.priority) / priority_sum as f64).floor() as i64;
            let spend = share.min((*money).max(0)).min(line.remaining_cost());
            if spend <= 0 {
                continue;
            }
            *money -= spend;
            tick.spent += spend;

            let finished = line.invest(spend);
            if finished > 0 {
                tick.completed.push(ProductionComplete {
                    research_type: id.clone(),
                    count: finished,
                });
            }
        }
        tick
    }
}
