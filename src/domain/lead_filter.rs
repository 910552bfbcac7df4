//! Serializable lead query state shared by the API and the client store.

use chrono::{Days, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{CountryName, SourceFolder, StatusLabel, UserId};

pub const DEFAULT_LEAD_PAGE_SIZE: usize = 50;
pub const MAX_LEAD_PAGE_SIZE: usize = 500;
/// Highest page honoured; anything above is read as this page, which is
/// always past the end of any real table.
pub const MAX_LEAD_PAGE: usize = u32::MAX as usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    #[default]
    All,
    Today,
    Yesterday,
}

impl DateRange {
    /// Half-open `[start, end)` window of creation times, in the same clock as `now`.
    pub fn bounds(&self, now: NaiveDateTime) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        let start_of_today = now.date().and_time(NaiveTime::MIN);
        match self {
            DateRange::All => (None, None),
            DateRange::Today => (Some(start_of_today), None),
            DateRange::Yesterday => (
                start_of_today.checked_sub_days(Days::new(1)),
                Some(start_of_today),
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadTab {
    #[default]
    All,
    /// Assigned to the viewer.
    Mine,
    /// Not assigned to anyone.
    Unassigned,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadFilter {
    pub statuses: Vec<StatusLabel>,
    pub search: String,
    pub date_range: DateRange,
    pub agents: Vec<UserId>,
    pub sources: Vec<SourceFolder>,
    pub countries: Vec<CountryName>,
    pub tab: LeadTab,
    pub page: usize,
    pub limit: usize,
}

impl Default for LeadFilter {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            search: String::new(),
            date_range: DateRange::All,
            agents: Vec::new(),
            sources: Vec::new(),
            countries: Vec::new(),
            tab: LeadTab::All,
            page: 1,
            limit: DEFAULT_LEAD_PAGE_SIZE,
        }
    }
}

impl LeadFilter {
    /// Adds the label when absent, removes it when present.
    pub fn toggle_status(&mut self, label: StatusLabel) {
        match self.statuses.iter().position(|existing| *existing == label) {
            Some(index) => {
                self.statuses.remove(index);
            }
            None => self.statuses.push(label),
        }
    }

    /// Trimmed search text, `None` when blank.
    pub fn effective_search(&self) -> Option<&str> {
        let search = self.search.trim();
        (!search.is_empty()).then_some(search)
    }

    pub fn effective_page(&self) -> usize {
        self.page.clamp(1, MAX_LEAD_PAGE)
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_LEAD_PAGE_SIZE)
    }

    pub fn offset(&self) -> usize {
        (self.effective_page() - 1).saturating_mul(self.effective_limit())
    }
}
