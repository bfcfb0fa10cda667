use crate::core::{Activity, DayGroup};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::validate_non_empty_string;
use chrono::{NaiveDate, NaiveTime};

/// Stable sort by `date`, then `time`. Both are compared as plain strings.
pub fn sort_activities(activities: &mut [Activity]) {
    activities.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
}

/// Groups activities by calendar day. Groups come out in ascending date
/// order and each group keeps its activities in ascending time order.
pub fn group_by_date(mut activities: Vec<Activity>) -> Vec<DayGroup> {
    sort_activities(&mut activities);

    let mut groups: Vec<DayGroup> = Vec::new();
    for activity in activities {
        match groups.last_mut() {
            Some(group) if group.date == activity.date => group.activities.push(activity),
            _ => groups.push(DayGroup {
                date: activity.date.clone(),
                activities: vec![activity],
            }),
        }
    }

    groups
}

fn check_activity(activity: &Activity) -> Result<()> {
    validate_non_empty_string("title", &activity.title).map_err(|_| MarketError::ItineraryError {
        message: "Activity title cannot be empty".to_string(),
    })?;

    // 只接受補零格式，字串排序才會等於時間排序
    let date_ok = activity.date.len() == 10
        && NaiveDate::parse_from_str(&activity.date, "%Y-%m-%d").is_ok();
    if !date_ok {
        return Err(MarketError::ItineraryError {
            message: format!("Invalid date '{}', expected YYYY-MM-DD", activity.date),
        });
    }

    let time_ok =
        activity.time.len() == 5 && NaiveTime::parse_from_str(&activity.time, "%H:%M").is_ok();
    if !time_ok {
        return Err(MarketError::ItineraryError {
            message: format!("Invalid time '{}', expected HH:MM", activity.time),
        });
    }

    Ok(())
}

/// Editable activity list backing the wizard's itinerary step.
#[derive(Debug, Clone, Default)]
pub struct Itinerary {
    activities: Vec<Activity>,
    next_id: usize,
}

impl Itinerary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_activities(activities: Vec<Activity>) -> Result<Self> {
        let mut itinerary = Self::new();
        for activity in activities {
            itinerary.add(activity)?;
        }
        Ok(itinerary)
    }

    /// Adds an activity and returns its id. Blank ids are assigned `act-<n>`.
    pub fn add(&mut self, mut activity: Activity) -> Result<String> {
        check_activity(&activity)?;

        if activity.id.trim().is_empty() {
            loop {
                self.next_id += 1;
                let candidate = format!("act-{}", self.next_id);
                if !self.activities.iter().any(|a| a.id == candidate) {
                    activity.id = candidate;
                    break;
                }
            }
        } else if self.activities.iter().any(|a| a.id == activity.id) {
            return Err(MarketError::ItineraryError {
                message: format!("Duplicate activity id '{}'", activity.id),
            });
        }

        tracing::debug!("Adding activity {} on {} {}", activity.id, activity.date, activity.time);
        let id = activity.id.clone();
        self.activities.push(activity);
        Ok(id)
    }

    pub fn update(&mut self, id: &str, mut activity: Activity) -> Result<()> {
        check_activity(&activity)?;

        let slot = self
            .activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| MarketError::ItineraryError {
                message: format!("No activity with id '{}'", id),
            })?;
        activity.id = id.to_string();
        *slot = activity;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Activity> {
        let index = self.activities.iter().position(|a| a.id == id)?;
        Some(self.activities.remove(index))
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Activities in display order.
    pub fn activities(&self) -> Vec<Activity> {
        let mut sorted = self.activities.clone();
        sort_activities(&mut sorted);
        sorted
    }

    pub fn grouped(&self) -> Vec<DayGroup> {
        group_by_date(self.activities.clone())
    }

    pub fn into_activities(self) -> Vec<Activity> {
        let mut activities = self.activities;
        sort_activities(&mut activities);
        activities
    }
}
